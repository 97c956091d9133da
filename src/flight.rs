//! Flight state machine: turns the smoothed signal into vehicle commands.
//!
//! While grounded, a raised y signal takes off. While airborne, a strongly lowered
//! y lands (always, even inside the cooldown), a raised y backs up, a moderately
//! lowered y (strictly inside the forward band) moves forward and z steers left or
//! right. The y band between the forward upper bound and the takeoff threshold is a
//! dead zone, as is anything between the land threshold and the forward lower bound.

use std::time::{Duration, Instant};

use crate::command::{Command, Direction};
use crate::config::PilotConfig;
use crate::smoother::SmoothedSignal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlightState {
    Grounded,
    Airborne,
}

impl FlightState {
    pub fn name(&self) -> &'static str {
        match self {
            FlightState::Grounded => "Grounded",
            FlightState::Airborne => "Airborne",
        }
    }

    /// Single character used in the flight recorder.
    pub fn as_char(&self) -> char {
        match self {
            FlightState::Grounded => 'G',
            FlightState::Airborne => 'A',
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Thresholds {
    pub takeoff: f32,
    pub land: f32,
    pub forward_lower: f32,
    pub forward_upper: f32,
    pub lateral: f32,
    pub cooldown: Duration,
    pub move_distance: u32,
}

impl From<&PilotConfig> for Thresholds {
    fn from(config: &PilotConfig) -> Self {
        Thresholds {
            takeoff: config.takeoff_threshold,
            land: config.land_threshold,
            forward_lower: config.forward_lower_threshold,
            forward_upper: config.forward_upper_threshold,
            lateral: config.lateral_threshold,
            cooldown: config.cooldown,
            move_distance: config.move_distance,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds::from(&PilotConfig::default())
    }
}

pub struct FlightStateMachine {
    state: FlightState,
    last_command: Option<Instant>,
    thresholds: Thresholds,
}

impl FlightStateMachine {
    pub fn new(thresholds: Thresholds) -> Self {
        FlightStateMachine {
            state: FlightState::Grounded,
            last_command: None,
            thresholds,
        }
    }

    pub fn state(&self) -> FlightState {
        self.state
    }

    pub fn last_command(&self) -> Option<Instant> {
        self.last_command
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Back to grounded with no command history.
    pub fn reset(&mut self) {
        self.state = FlightState::Grounded;
        self.last_command = None;
    }

    /// Decides which commands, if any, the signal calls for at `now`.
    ///
    /// The state and the last command timestamp are updated as soon as a command is
    /// chosen; the caller's dispatch result does not feed back. At most two commands
    /// come back, one from the y axis and one from the z axis.
    pub fn decide(&mut self, signal: &SmoothedSignal, now: Instant) -> Vec<Command> {
        match self.state {
            FlightState::Grounded => self.decide_grounded(signal, now),
            FlightState::Airborne => self.decide_airborne(signal, now),
        }
    }

    fn decide_grounded(&mut self, signal: &SmoothedSignal, now: Instant) -> Vec<Command> {
        if signal.y > self.thresholds.takeoff {
            self.state = FlightState::Airborne;
            self.stamp(now);
            return vec![Command::Takeoff];
        }
        Vec::new()
    }

    fn decide_airborne(&mut self, signal: &SmoothedSignal, now: Instant) -> Vec<Command> {
        let t = &self.thresholds;

        if signal.y < t.land {
            self.state = FlightState::Grounded;
            self.stamp(now);
            return vec![Command::Land];
        }

        // Both axis groups see the elapsed time from before this tick.
        let cooled_down = match self.last_command {
            Some(last) => now.saturating_duration_since(last) > t.cooldown,
            None => true,
        };
        if !cooled_down {
            return Vec::new();
        }

        let mut commands = Vec::with_capacity(2);

        if signal.y > t.takeoff {
            commands.push(Command::movement(Direction::Back, t.move_distance));
        } else if signal.y > t.forward_lower && signal.y < t.forward_upper {
            commands.push(Command::movement(Direction::Forward, t.move_distance));
        }

        if signal.z < -t.lateral {
            commands.push(Command::movement(Direction::Left, t.move_distance));
        } else if signal.z > t.lateral {
            commands.push(Command::movement(Direction::Right, t.move_distance));
        }

        if !commands.is_empty() {
            self.stamp(now);
        }
        commands
    }

    fn stamp(&mut self, now: Instant) {
        self.last_command = Some(match self.last_command {
            Some(last) if last > now => last,
            _ => now,
        });
    }
}
