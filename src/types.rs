use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub gait: GaitConfig,
    pub risk: RiskConfig,
    pub haptics: HapticsConfig,
    pub replay: ReplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaitConfig {
    pub step_threshold: f32,
    pub step_delay_ms: u64,
    pub step_timeout_ms: u64,
}

impl Default for GaitConfig {
    fn default() -> Self {
        Self {
            step_threshold: 1.8,
            step_delay_ms: 500,
            step_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    pub danger_area_threshold: i32,
    pub center_tolerance_percent: f32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            danger_area_threshold: 60000,
            center_tolerance_percent: 0.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HapticsConfig {
    pub suppress_when_stationary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    pub input_dir: String,
    pub output_dir: String,
    pub save_decisions: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Collision risk for one detected person, per frame.
///
/// Totally ordered: NONE < WARNING < DANGER. Compare with `rank()`, never
/// with the enum discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    None,
    Warning,
    Danger,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::None => "NONE",
            RiskLevel::Warning => "WARNING",
            RiskLevel::Danger => "DANGER",
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            RiskLevel::None => 0,
            RiskLevel::Warning => 1,
            RiskLevel::Danger => 2,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Axis-aligned bounding box in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> i32 {
        self.width() * self.height()
    }

    pub fn center_x(&self) -> i32 {
        self.left + self.width() / 2
    }
}

/// Risk assessment paired with the box it was computed from, for rendering.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DetectionResult {
    pub bounding_box: BoundingBox,
    pub risk: RiskLevel,
}

/// One line of a recorded session trace: either an accelerometer sample or a
/// camera frame with the person boxes the detector reported for it.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceRecord {
    Accel {
        timestamp_ms: u64,
        vertical_accel: f32,
    },
    Frame {
        timestamp_ms: u64,
        image_width: i32,
        image_height: i32,
        persons: Vec<BoundingBox>,
    },
}
