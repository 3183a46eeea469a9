//! Resource probes sampled once at benchmark finalization.

use crate::config::ProbeSettings;

/// Synchronous source of device resource readings.
pub trait ResourceProbe: Send + Sync + std::fmt::Debug {
    /// CPU usage as a percentage in `[0, 100]`.
    fn cpu_usage_percent(&self) -> f32;

    /// Battery temperature in degrees Celsius.
    fn battery_temp_celsius(&self) -> f32;
}

/// Probe that reports fixed, configured readings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FixedResourceProbe {
    pub cpu_usage_percent: f32,
    pub battery_temp_celsius: f32,
}

impl FixedResourceProbe {
    pub fn new(cpu_usage_percent: f32, battery_temp_celsius: f32) -> Self {
        Self {
            cpu_usage_percent,
            battery_temp_celsius,
        }
    }
}

impl From<&ProbeSettings> for FixedResourceProbe {
    fn from(settings: &ProbeSettings) -> Self {
        Self::new(settings.cpu_usage_percent, settings.battery_temp_celsius)
    }
}

impl ResourceProbe for FixedResourceProbe {
    fn cpu_usage_percent(&self) -> f32 {
        self.cpu_usage_percent.clamp(0.0, 100.0)
    }

    fn battery_temp_celsius(&self) -> f32 {
        self.battery_temp_celsius
    }
}
