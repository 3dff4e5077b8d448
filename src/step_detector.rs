// src/step_detector.rs
//
// Gait detection from vertical acceleration.
//
// Walking produces a quasi-periodic vertical "bounce". Detecting the rising
// crest of each bounce above a threshold, once per bounce, approximates step
// cadence without counting noise; a timeout turns "no step recently" into
// "stopped walking" without an explicit stop signal.

use crate::types::GaitConfig;
use anyhow::{bail, Result};
use tracing::debug;

pub struct StepDetector {
    step_threshold: f32,
    step_delay_ms: u64,
    step_timeout_ms: u64,

    last_step_time_ms: u64,
    is_peak: bool,
    last_accel: f32,
    is_walking: bool,
}

impl StepDetector {
    pub fn new(config: &GaitConfig) -> Result<Self> {
        if config.step_threshold <= 0.0 {
            bail!(
                "gait.step_threshold must be positive, got {}",
                config.step_threshold
            );
        }
        if config.step_delay_ms == 0 {
            bail!("gait.step_delay_ms must be positive");
        }
        if config.step_timeout_ms == 0 {
            bail!("gait.step_timeout_ms must be positive");
        }

        Ok(Self {
            step_threshold: config.step_threshold,
            step_delay_ms: config.step_delay_ms,
            step_timeout_ms: config.step_timeout_ms,
            last_step_time_ms: 0,
            is_peak: false,
            last_accel: 0.0,
            is_walking: false,
        })
    }

    /// Feed one accelerometer sample. Timestamps must be non-decreasing;
    /// out-of-order samples are a caller contract violation.
    pub fn process(&mut self, timestamp_ms: u64, vertical_accel: f32) {
        // Rising edge crossing the threshold marks the apex of a bounce.
        if vertical_accel > self.last_accel
            && vertical_accel > self.step_threshold
            && !self.is_peak
        {
            self.is_peak = true;

            // Refractory window: one bounce is one step.
            if timestamp_ms.saturating_sub(self.last_step_time_ms) > self.step_delay_ms {
                self.last_step_time_ms = timestamp_ms;
                if !self.is_walking {
                    debug!("step accepted at {}ms, walking", timestamp_ms);
                }
                self.is_walking = true;
            }
        } else if vertical_accel < self.last_accel {
            // Descending side of the bounce, re-arm for the next rising edge.
            self.is_peak = false;
        }

        // Quiet for too long means the user has stopped.
        if self.is_walking
            && timestamp_ms.saturating_sub(self.last_step_time_ms) > self.step_timeout_ms
        {
            debug!("no step since {}ms, stopped", self.last_step_time_ms);
            self.is_walking = false;
        }

        self.last_accel = vertical_accel;
    }

    pub fn is_walking(&self) -> bool {
        self.is_walking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> StepDetector {
        StepDetector::new(&GaitConfig::default()).unwrap()
    }

    /// Walk the signal up and back down so the peak flag is re-armed.
    fn feed_bounce(detector: &mut StepDetector, apex_ms: u64, apex_accel: f32) {
        detector.process(apex_ms.saturating_sub(50), apex_accel * 0.5);
        detector.process(apex_ms, apex_accel);
        detector.process(apex_ms + 50, apex_accel * 0.3);
    }

    #[test]
    fn test_rejects_bad_config() {
        let mut config = GaitConfig::default();
        config.step_threshold = 0.0;
        assert!(StepDetector::new(&config).is_err());

        let mut config = GaitConfig::default();
        config.step_delay_ms = 0;
        assert!(StepDetector::new(&config).is_err());

        let mut config = GaitConfig::default();
        config.step_timeout_ms = 0;
        assert!(StepDetector::new(&config).is_err());
    }

    #[test]
    fn test_not_walking_initially() {
        assert!(!detector().is_walking());
    }

    #[test]
    fn test_walking_onset_on_qualifying_peak() {
        let mut d = detector();
        d.process(900, 1.0);
        d.process(1000, 0.5); // falling, arms peak detection
        d.process(2000, 2.0); // rising above 1.8, well past the delay window
        assert!(d.is_walking());
    }

    #[test]
    fn test_below_threshold_peak_is_ignored() {
        let mut d = detector();
        d.process(900, 0.5);
        d.process(1000, 0.2);
        d.process(2000, 1.5); // rising but under the 1.8 threshold
        assert!(!d.is_walking());
    }

    #[test]
    fn test_debounce_ignores_rapid_second_peak() {
        let mut d = detector();
        feed_bounce(&mut d, 2000, 2.0);
        assert!(d.is_walking());

        // A second qualifying peak 300ms later is inside the 500ms window:
        // the apex is marked but not counted, and walking is unaffected.
        feed_bounce(&mut d, 2300, 2.2);
        assert!(d.is_walking());

        // The un-counted peak must not have refreshed the step clock; with
        // the last accepted step at 2000ms, 4100ms is past the 2000ms timeout.
        d.process(4100, 0.1);
        assert!(!d.is_walking());
    }

    #[test]
    fn test_timeout_clears_walking() {
        let mut d = detector();
        feed_bounce(&mut d, 600, 2.0);
        assert!(d.is_walking());

        d.process(3000, 0.1); // 2400ms elapsed > 2000ms timeout
        assert!(!d.is_walking());
    }

    #[test]
    fn test_walking_persists_within_timeout() {
        let mut d = detector();
        feed_bounce(&mut d, 1000, 2.0);

        d.process(2900, 0.1); // 1900ms elapsed, still inside the window
        assert!(d.is_walking());
    }

    #[test]
    fn test_cadence_keeps_walking_alive() {
        let mut d = detector();
        let mut t = 1000;
        for _ in 0..6 {
            feed_bounce(&mut d, t, 2.1);
            assert!(d.is_walking());
            t += 700; // normal cadence, inside the timeout
        }
        assert!(d.is_walking());
    }

    #[test]
    fn test_flat_signal_leaves_peak_state_unchanged() {
        let mut d = detector();
        d.process(900, 1.0);
        d.process(1000, 2.5); // peak marked and counted
        assert!(d.is_walking());

        // Flat samples neither re-arm nor re-trigger; a second step needs a
        // falling edge first.
        d.process(1600, 2.5);
        d.process(1700, 2.5);
        d.process(1800, 2.6); // rising, but is_peak is still set
        d.process(4100, 2.6); // flat again, timeout path runs
        assert!(!d.is_walking());
    }

    #[test]
    fn test_deterministic_for_identical_input() {
        let samples: Vec<(u64, f32)> = vec![
            (900, 1.0),
            (1000, 0.5),
            (1100, 2.0),
            (1200, 0.3),
            (1800, 2.2),
            (2500, 0.1),
            (5000, 0.1),
        ];

        let mut a = detector();
        let mut b = detector();
        for (t, accel) in samples {
            a.process(t, accel);
            b.process(t, accel);
            assert_eq!(a.is_walking(), b.is_walking());
        }
    }
}
