//! The vehicle's command vocabulary.

use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Back,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Puts the vehicle into command mode. Sent once before anything else.
    Initialize,
    Takeoff,
    Land,
    Move { direction: Direction, distance: u32 },
}

impl Direction {
    pub fn name(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Back => "back",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl Command {
    pub fn movement(direction: Direction, distance: u32) -> Self {
        Command::Move {
            direction,
            distance,
        }
    }

    /// Directional commands are the ones subject to the cooldown.
    pub fn is_directional(&self) -> bool {
        matches!(self, Command::Move { .. })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Initialize => write!(f, "command"),
            Command::Takeoff => write!(f, "takeoff"),
            Command::Land => write!(f, "land"),
            Command::Move {
                direction,
                distance,
            } => write!(f, "{} {}", direction.name(), distance),
        }
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let head = parts.next().ok_or_else(|| "empty command".to_string())?;
        let command = match head {
            "command" => Command::Initialize,
            "takeoff" => Command::Takeoff,
            "land" => Command::Land,
            other => {
                let direction = match other {
                    "forward" => Direction::Forward,
                    "back" => Direction::Back,
                    "left" => Direction::Left,
                    "right" => Direction::Right,
                    _ => return Err(format!("unknown command: {}", other)),
                };
                let distance = parts
                    .next()
                    .ok_or_else(|| format!("{} needs a distance", other))?
                    .parse::<u32>()
                    .map_err(|e| e.to_string())?;
                Command::movement(direction, distance)
            }
        };
        match parts.next() {
            Some(extra) => Err(format!("unexpected argument: {}", extra)),
            None => Ok(command),
        }
    }
}
