// src/collision_logic.rs
//
// Collision risk classification for detected pedestrians.
//
// A person only matters when roughly centered in the walking path. DANGER is
// an absolute proximity test on bounding-box area, valid even with no prior
// frame; WARNING is relative, firing when the box outgrows the largest area
// seen during the current unbroken run of risky frames. Any off-center or
// harmless frame wipes that baseline.

use crate::types::{BoundingBox, DetectionResult, RiskConfig, RiskLevel};
use anyhow::{bail, Result};
use tracing::debug;

pub struct CollisionLogic {
    danger_area_threshold: i32,
    center_tolerance_percent: f32,
    // Bound from the first frame's width. The centering decision recomputes
    // the center from the per-call image width, which is authoritative.
    #[allow(dead_code)]
    screen_center_x: i32,

    // Largest area seen during the current run of risky frames. Shared by
    // every person fed to this instance; callers own per-frame ordering.
    previous_person_area: i32,
}

impl CollisionLogic {
    pub fn new(config: &RiskConfig, screen_center_x: i32) -> Result<Self> {
        if config.danger_area_threshold <= 0 {
            bail!(
                "risk.danger_area_threshold must be positive, got {}",
                config.danger_area_threshold
            );
        }
        if screen_center_x <= 0 {
            bail!("screen_center_x must be positive, got {}", screen_center_x);
        }

        Ok(Self {
            danger_area_threshold: config.danger_area_threshold,
            center_tolerance_percent: config.center_tolerance_percent,
            screen_center_x,
            previous_person_area: 0,
        })
    }

    /// Assess the collision risk for a single detected person.
    pub fn assess_risk(
        &mut self,
        bbox: BoundingBox,
        image_width: i32,
        image_height: i32,
    ) -> Result<DetectionResult> {
        if image_width <= 0 || image_height <= 0 {
            bail!(
                "image dimensions must be positive, got {}x{}",
                image_width,
                image_height
            );
        }

        let box_center_x = bbox.center_x();
        let box_area = bbox.area();

        let image_center_x = image_width / 2;
        let center_tolerance_px = image_center_x as f32 * self.center_tolerance_percent;
        let is_centered = ((box_center_x - image_center_x).abs() as f32) < center_tolerance_px;

        let mut risk = RiskLevel::None;
        if is_centered {
            let is_too_close = box_area > self.danger_area_threshold;
            let is_getting_closer =
                box_area > self.previous_person_area && self.previous_person_area > 0;

            if is_too_close {
                risk = RiskLevel::Danger;
            } else if is_getting_closer {
                risk = RiskLevel::Warning;
            }
        }

        // Track the largest (closest) area of the current risk episode; any
        // risk-free frame ends the episode and clears the baseline.
        if risk != RiskLevel::None && box_area > self.previous_person_area {
            self.previous_person_area = box_area;
        } else if risk == RiskLevel::None {
            self.previous_person_area = 0;
        }

        debug!(
            "area={}, centered={}, baseline={}, risk={}",
            box_area, is_centered, self.previous_person_area, risk
        );

        Ok(DetectionResult {
            bounding_box: bbox,
            risk,
        })
    }
}
