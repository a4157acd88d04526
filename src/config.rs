//! Run configuration.

use crate::time::VirtualTime;

/// Horizon used when nothing else is configured.
pub const DEFAULT_HORIZON: u64 = 1000;

/// Settings fixed at scheduler construction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct SimulationConfig {
    /// Maximum simulation time; the terminal event is seeded here.
    pub horizon: VirtualTime,
    /// Record a [`DeliveryRecord`](crate::scheduler::DeliveryRecord) per delivery.
    pub trace: bool,
}

impl SimulationConfig {
    pub fn new(horizon: u64) -> Self {
        SimulationConfig {
            horizon: VirtualTime::new(horizon),
            trace: false,
        }
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_horizon() {
        let cfg = SimulationConfig::default();
        assert_eq!(cfg.horizon, VirtualTime::new(1000));
        assert!(!cfg.trace);
    }

    #[test]
    fn test_with_trace() {
        let cfg = SimulationConfig::new(12).with_trace(true);
        assert_eq!(cfg.horizon.ticks(), 12);
        assert!(cfg.trace);
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_json_fills_defaults() {
        let cfg: SimulationConfig = serde_json::from_str(r#"{"horizon": 50}"#).unwrap();
        assert_eq!(cfg, SimulationConfig::new(50));
    }
}
