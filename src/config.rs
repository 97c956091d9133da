//! Tunables for the smoother, the flight state machine and the vehicle link.

use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

use crate::constants::{
    ACK_TIMEOUT_MILLIS, COMMAND_COOLDOWN_MILLIS, FORWARD_LOWER_THRESHOLD, FORWARD_UPPER_THRESHOLD,
    FRAME_QUEUE_CAPACITY, LAND_THRESHOLD, LATERAL_THRESHOLD, MAX_FRAME_QUEUE_CAPACITY,
    MAX_ROUNDING_DECIMALS, MAX_WINDOW_CAPACITY, MOTION_AXIS_OFFSETS, MOVE_DISTANCE,
    ROUNDING_DECIMALS, SAMPLE_WINDOW_CAPACITY, SERIAL_BAUD_RATE, TAKEOFF_THRESHOLD,
    VEHICLE_UDP_ADDRESS,
};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PilotConfig {
    pub window_capacity: usize,
    pub rounding_decimals: u32,
    pub takeoff_threshold: f32,
    pub land_threshold: f32,
    pub forward_lower_threshold: f32,
    pub forward_upper_threshold: f32,
    pub lateral_threshold: f32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub cooldown: Duration,
    pub move_distance: u32,
    pub motion_offsets: [usize; 3],
    pub queue_capacity: usize,
    pub vehicle: VehicleConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VehicleConfig {
    pub address: String,
    pub baud_rate: u32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub ack_timeout: Duration,
}

impl Default for PilotConfig {
    fn default() -> Self {
        PilotConfig {
            window_capacity: SAMPLE_WINDOW_CAPACITY,
            rounding_decimals: ROUNDING_DECIMALS,
            takeoff_threshold: TAKEOFF_THRESHOLD,
            land_threshold: LAND_THRESHOLD,
            forward_lower_threshold: FORWARD_LOWER_THRESHOLD,
            forward_upper_threshold: FORWARD_UPPER_THRESHOLD,
            lateral_threshold: LATERAL_THRESHOLD,
            cooldown: Duration::from_millis(COMMAND_COOLDOWN_MILLIS),
            move_distance: MOVE_DISTANCE,
            motion_offsets: MOTION_AXIS_OFFSETS,
            queue_capacity: FRAME_QUEUE_CAPACITY,
            vehicle: VehicleConfig::default(),
        }
    }
}

impl Default for VehicleConfig {
    fn default() -> Self {
        VehicleConfig {
            address: VEHICLE_UDP_ADDRESS.to_string(),
            baud_rate: SERIAL_BAUD_RATE,
            ack_timeout: Duration::from_millis(ACK_TIMEOUT_MILLIS),
        }
    }
}

impl PilotConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: PilotConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the sizes are usable and that the thresholds still describe
    /// land <= forward band < dead zone < takeoff.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_WINDOW_CAPACITY).contains(&self.window_capacity) {
            return Err(ConfigError::Invalid(format!(
                "window_capacity must be between 1 and {}",
                MAX_WINDOW_CAPACITY
            )));
        }
        if self.rounding_decimals > MAX_ROUNDING_DECIMALS {
            return Err(ConfigError::Invalid(format!(
                "rounding_decimals must be at most {}",
                MAX_ROUNDING_DECIMALS
            )));
        }
        if !(1..=MAX_FRAME_QUEUE_CAPACITY).contains(&self.queue_capacity) {
            return Err(ConfigError::Invalid(format!(
                "queue_capacity must be between 1 and {}",
                MAX_FRAME_QUEUE_CAPACITY
            )));
        }
        if self.move_distance == 0 {
            return Err(invalid("move_distance must be positive"));
        }
        let thresholds = [
            self.takeoff_threshold,
            self.land_threshold,
            self.forward_lower_threshold,
            self.forward_upper_threshold,
            self.lateral_threshold,
        ];
        if thresholds.iter().any(|t| !t.is_finite()) {
            return Err(invalid("thresholds must be finite"));
        }
        if self.land_threshold > self.forward_lower_threshold {
            return Err(invalid(
                "land_threshold must not exceed forward_lower_threshold",
            ));
        }
        if self.forward_lower_threshold >= self.forward_upper_threshold {
            return Err(invalid(
                "forward_lower_threshold must be below forward_upper_threshold",
            ));
        }
        if self.forward_upper_threshold >= self.takeoff_threshold {
            return Err(invalid(
                "forward_upper_threshold must be below takeoff_threshold",
            ));
        }
        if self.lateral_threshold <= 0.0 {
            return Err(invalid("lateral_threshold must be positive"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid(reason.to_string())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = PilotConfig::from_yaml("{}").unwrap();
        assert_eq!(config, PilotConfig::default());
        assert_eq!(config.window_capacity, 30);
        assert_eq!(config.cooldown, Duration::from_millis(1500));
        assert_eq!(config.motion_offsets, [6, 7, 8]);
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let yaml = "cooldown: 2s\nmove_distance: 25\nvehicle:\n  address: 127.0.0.1:9000\n";
        let config = PilotConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.cooldown, Duration::from_secs(2));
        assert_eq!(config.move_distance, 25);
        assert_eq!(config.vehicle.address, "127.0.0.1:9000");
        assert_eq!(config.vehicle.baud_rate, SERIAL_BAUD_RATE);
        assert_eq!(config.takeoff_threshold, TAKEOFF_THRESHOLD);
    }

    #[test]
    fn rejects_land_above_forward_band() {
        let err = PilotConfig::from_yaml("land_threshold: -0.1").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_forward_band_reaching_below_land() {
        let err = PilotConfig::from_yaml("land_threshold: -0.5\nforward_lower_threshold: -0.6")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let config =
            PilotConfig::from_yaml("land_threshold: -0.8\nforward_lower_threshold: -0.6").unwrap();
        assert_eq!(config.land_threshold, -0.8);
        assert_eq!(config.forward_lower_threshold, -0.6);
    }

    #[test]
    fn rejects_empty_forward_band() {
        let yaml = "forward_lower_threshold: -0.3\nforward_upper_threshold: -0.3";
        assert!(matches!(
            PilotConfig::from_yaml(yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_rounding_beyond_f32_precision() {
        assert!(matches!(
            PilotConfig::from_yaml("rounding_decimals: 40"),
            Err(ConfigError::Invalid(_))
        ));
        let config = PilotConfig::from_yaml("rounding_decimals: 6").unwrap();
        assert_eq!(config.rounding_decimals, MAX_ROUNDING_DECIMALS);
    }

    #[test]
    fn rejects_oversized_buffers() {
        assert!(matches!(
            PilotConfig::from_yaml("queue_capacity: 18446744073709551615"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PilotConfig::from_yaml("window_capacity: 10001"),
            Err(ConfigError::Invalid(_))
        ));
        let config =
            PilotConfig::from_yaml("window_capacity: 10000\nqueue_capacity: 65536").unwrap();
        assert_eq!(config.window_capacity, MAX_WINDOW_CAPACITY);
        assert_eq!(config.queue_capacity, MAX_FRAME_QUEUE_CAPACITY);
    }

    #[test]
    fn rejects_overlapping_dead_zone() {
        let err = PilotConfig::from_yaml("forward_upper_threshold: 0.3").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_capacity_and_bad_durations() {
        assert!(matches!(
            PilotConfig::from_yaml("window_capacity: 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PilotConfig::from_yaml("cooldown: soon"),
            Err(ConfigError::Yaml(_))
        ));
        assert!(matches!(
            PilotConfig::from_yaml("cooldwn: 1s"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn example_config_spells_out_the_defaults() {
        let config = PilotConfig::from_yaml(include_str!("../config/pilot.example.yaml")).unwrap();
        assert_eq!(config, PilotConfig::default());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "lateral_threshold: 0.4\ncooldown: 1500ms").unwrap();
        let config = PilotConfig::from_file(file.path()).unwrap();
        assert_eq!(config.lateral_threshold, 0.4);
        assert_eq!(config.cooldown, Duration::from_millis(1500));
    }
}
