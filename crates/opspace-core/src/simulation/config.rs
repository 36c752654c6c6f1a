//! Simulation configuration

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Control and integration time step [s]
    pub dt: f64,
    /// Total simulated duration [s]
    pub duration: f64,
    /// Viscous joint friction [N·m·s/rad]
    pub joint_damping: f64,
    /// Record q at every step
    pub record_history: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.001, // 1 kHz control loop
            duration: 5.0,
            joint_damping: 0.0,
            record_history: true,
        }
    }
}

impl SimConfig {
    /// Number of ticks covering `duration`
    pub fn ticks(&self) -> usize {
        (self.duration / self.dt).round() as usize
    }

    pub fn validate(&self) -> ControlResult<()> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(ControlError::InvalidConfig(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if !(self.duration >= 0.0 && self.duration.is_finite()) {
            return Err(ControlError::InvalidConfig(format!(
                "duration must be non-negative, got {}",
                self.duration
            )));
        }
        if self.joint_damping < 0.0 {
            return Err(ControlError::InvalidConfig(format!(
                "joint_damping must be non-negative, got {}",
                self.joint_damping
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.ticks(), 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: SimConfig = toml::from_str("dt = 0.01\nduration = 2.0").unwrap();
        assert_eq!(config.ticks(), 200);
        assert_eq!(config.joint_damping, 0.0);
        assert!(config.record_history);
    }

    #[test]
    fn test_invalid_config() {
        let config = SimConfig {
            dt: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = SimConfig {
            joint_damping: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
