// src/haptic_gate.rs
//
// Frame-level alert policy: many per-person risk assessments collapse into a
// single haptic command, and nothing fires while the user is standing still.
// The detection list itself is unaffected and stays available for rendering.

use crate::types::{DetectionResult, RiskLevel};

/// Worst risk across all detections in a frame, by the documented total
/// order NONE < WARNING < DANGER. An empty frame carries no risk.
pub fn worst_risk(results: &[DetectionResult]) -> RiskLevel {
    results
        .iter()
        .map(|r| r.risk)
        .max_by_key(|r| r.rank())
        .unwrap_or(RiskLevel::None)
}

/// Gate a frame's worst risk on gait state: haptics only fire while walking.
pub fn gate(worst: RiskLevel, is_walking: bool) -> RiskLevel {
    if is_walking {
        worst
    } else {
        RiskLevel::None
    }
}
