//! Process memory-pressure monitoring, consulted between documents during
//! indexing and between merged terms during merging.

use sysinfo::System;

/// Default memory-pressure threshold when the caller does not configure one.
pub const DEFAULT_THRESHOLD: f32 = 0.8;

/// Reports whether resident memory pressure is above a threshold.
///
/// Modeled as a trait so the builder and merger stay testable without
/// depending on real OS memory probes — a fixed or scripted pressure
/// source can stand in during tests.
pub trait PressureSource {
    /// Current memory pressure as a fraction in `[0, 1]`.
    fn pressure(&mut self) -> f32;
}

/// Pressure source backed by `sysinfo`'s host memory counters.
pub struct SystemMemoryMonitor {
    system: System,
    unavailable: bool,
}

impl SystemMemoryMonitor {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        let unavailable = system.total_memory() == 0;
        if unavailable {
            tracing::warn!("memory monitor unavailable on this platform; mid-build flush disabled");
        }
        Self { system, unavailable }
    }
}

impl Default for SystemMemoryMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PressureSource for SystemMemoryMonitor {
    fn pressure(&mut self) -> f32 {
        if self.unavailable {
            return 0.0;
        }
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return 0.0;
        }
        self.system.used_memory() as f32 / total as f32
    }
}

/// A monitor that reports a threshold crossing based on a configured
/// threshold and a pressure source.
pub struct MemoryMonitor<P: PressureSource> {
    threshold: f32,
    source: P,
}

impl<P: PressureSource> MemoryMonitor<P> {
    pub fn new(source: P, threshold: f32) -> Self {
        Self { threshold, source }
    }

    /// Is resident memory pressure above the configured threshold?
    pub fn over_threshold(&mut self) -> bool {
        self.source.pressure() > self.threshold
    }
}

/// A pressure source that always reports a fixed value, for deterministic
/// tests of memory-triggered flush behavior (both in-crate and in
/// integration tests).
pub struct FixedPressure(pub f32);

impl PressureSource for FixedPressure {
    fn pressure(&mut self) -> f32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_over_threshold_when_pressure_exceeds_it() {
        let mut monitor = MemoryMonitor::new(FixedPressure(0.9), DEFAULT_THRESHOLD);
        assert!(monitor.over_threshold());
    }

    #[test]
    fn reports_under_threshold_when_pressure_is_low() {
        let mut monitor = MemoryMonitor::new(FixedPressure(0.1), DEFAULT_THRESHOLD);
        assert!(!monitor.over_threshold());
    }
}
