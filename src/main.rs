// src/main.rs

mod collision_logic;
mod config;
mod haptic_gate;
mod step_detector;
mod trace_replay;
mod types;

use anyhow::Result;
use collision_logic::CollisionLogic;
use haptic_gate::{gate, worst_risk};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use step_detector::StepDetector;
use trace_replay::TraceReplayer;
use tracing::{error, info, warn};
use types::{Config, DetectionResult, RiskLevel, TraceRecord};

fn main() -> Result<()> {
    let config = Config::load("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("collision_warning={}", config.logging.level))
        .init();

    info!("🚶 Pedestrian Collision Warning Replay Starting");
    info!("✓ Configuration loaded");

    info!(
        "Gait thresholds: accel={:.1}, delay={}ms, timeout={}ms",
        config.gait.step_threshold, config.gait.step_delay_ms, config.gait.step_timeout_ms
    );
    info!(
        "Risk thresholds: danger_area={}px², center_tolerance={:.0}%",
        config.risk.danger_area_threshold,
        config.risk.center_tolerance_percent * 100.0
    );

    let replayer = TraceReplayer::new(config.clone());
    let trace_files = replayer.find_trace_files()?;

    if trace_files.is_empty() {
        error!("No trace files found in {}", config.replay.input_dir);
        return Ok(());
    }

    info!("Found {} trace file(s) to process", trace_files.len());

    for (idx, trace_path) in trace_files.iter().enumerate() {
        info!(
            "Processing trace {}/{}: {}",
            idx + 1,
            trace_files.len(),
            trace_path.display()
        );

        match process_trace(trace_path, &replayer, &config) {
            Ok(stats) => {
                info!("✓ Trace processed successfully!");
                info!(
                    "  Records: {} ({} accel, {} frames, {} skipped)",
                    stats.total_records, stats.accel_samples, stats.frames, stats.skipped_lines
                );
                info!("  Persons assessed: {}", stats.persons_assessed);
                info!(
                    "  Risk frames: {} danger, {} warning",
                    stats.danger_frames, stats.warning_frames
                );
                info!(
                    "  Haptic commands: {} fired, {} suppressed while stationary",
                    stats.haptics_fired, stats.haptics_suppressed
                );
                info!(
                    "  Walking episodes: {} ({} stops)",
                    stats.walking_onsets, stats.walking_stops
                );
                info!("  Processing speed: {:.0} records/s", stats.records_per_sec);
            }
            Err(e) => {
                error!("Failed to process trace: {}", e);
            }
        }
    }

    Ok(())
}

struct ProcessingStats {
    total_records: u64,
    accel_samples: u64,
    frames: u64,
    persons_assessed: usize,
    danger_frames: u64,
    warning_frames: u64,
    haptics_fired: u64,
    haptics_suppressed: u64,
    walking_onsets: u32,
    walking_stops: u32,
    skipped_lines: usize,
    records_per_sec: f64,
}

fn process_trace(
    trace_path: &Path,
    replayer: &TraceReplayer,
    config: &Config,
) -> Result<ProcessingStats> {
    let start_time = Instant::now();

    let mut reader = replayer.open_trace(trace_path)?;
    let mut writer = replayer.create_decision_writer(trace_path)?;

    let mut step_detector = StepDetector::new(&config.gait)?;
    // The classifier needs the image geometry, which only the first frame
    // record carries, so it is bound lazily like the camera pipeline does.
    let mut collision_logic: Option<CollisionLogic> = None;

    let mut total_records: u64 = 0;
    let mut accel_samples: u64 = 0;
    let mut frames: u64 = 0;
    let mut persons_assessed: usize = 0;
    let mut danger_frames: u64 = 0;
    let mut warning_frames: u64 = 0;
    let mut haptics_fired: u64 = 0;
    let mut haptics_suppressed: u64 = 0;
    let mut walking_onsets: u32 = 0;
    let mut walking_stops: u32 = 0;

    let mut was_walking = false;
    let mut last_command = RiskLevel::None;

    while let Some(record) = reader.read_record() {
        total_records += 1;

        match record {
            TraceRecord::Accel {
                timestamp_ms,
                vertical_accel,
            } => {
                accel_samples += 1;
                step_detector.process(timestamp_ms, vertical_accel);

                if step_detector.is_walking() != was_walking {
                    was_walking = step_detector.is_walking();
                    if was_walking {
                        walking_onsets += 1;
                        info!("🚶 Walking started at {:.1}s", timestamp_ms as f64 / 1000.0);
                    } else {
                        walking_stops += 1;
                        info!("🧍 Walking stopped at {:.1}s", timestamp_ms as f64 / 1000.0);
                    }
                }
            }

            TraceRecord::Frame {
                timestamp_ms,
                image_width,
                image_height,
                persons,
            } => {
                frames += 1;

                let logic = match collision_logic.as_mut() {
                    Some(logic) => logic,
                    None => {
                        let logic = CollisionLogic::new(&config.risk, image_width / 2)?;
                        info!(
                            "✓ Risk classifier ready ({}x{} frames)",
                            image_width, image_height
                        );
                        collision_logic.insert(logic)
                    }
                };

                let mut results: Vec<DetectionResult> = Vec::with_capacity(persons.len());
                for bbox in persons {
                    results.push(logic.assess_risk(bbox, image_width, image_height)?);
                }
                persons_assessed += results.len();

                let worst = worst_risk(&results);
                match worst {
                    RiskLevel::Danger => danger_frames += 1,
                    RiskLevel::Warning => warning_frames += 1,
                    RiskLevel::None => {}
                }

                let walking = step_detector.is_walking();
                let command = if config.haptics.suppress_when_stationary {
                    gate(worst, walking)
                } else {
                    worst
                };

                if command != RiskLevel::None {
                    haptics_fired += 1;
                } else if worst != RiskLevel::None {
                    haptics_suppressed += 1;
                }

                if command != last_command {
                    match command {
                        RiskLevel::Danger => warn!(
                            "🚨 DANGER at {:.1}s ({} person(s) in path)",
                            timestamp_ms as f64 / 1000.0,
                            results.len()
                        ),
                        RiskLevel::Warning => warn!(
                            "⚠️  WARNING at {:.1}s (person approaching)",
                            timestamp_ms as f64 / 1000.0
                        ),
                        RiskLevel::None => {}
                    }
                }
                last_command = command;

                if let Some(ref mut file) = writer {
                    save_frame_decision(file, timestamp_ms, walking, worst, command, &results)?;
                }
            }
        }

        if total_records % 500 == 0 {
            info!(
                "Progress: {:.1}% ({}/{}) | Walking: {} | Danger frames: {}",
                reader.progress(),
                reader.current_line,
                reader.total_lines,
                if was_walking { "YES" } else { "NO" },
                danger_frames
            );
        }
    }

    if let Some(ref mut file) = writer {
        file.flush()?;
        info!("💾 Frame decisions saved");
    }

    if frames == 0 {
        warn!("Trace contained no camera frames");
    }

    let duration = start_time.elapsed();
    let records_per_sec = total_records as f64 / duration.as_secs_f64().max(1e-9);

    info!("📊 Final Report:");
    info!("  Total records: {}", total_records);
    info!("  Danger frames: {}", danger_frames);
    info!("  Warning frames: {}", warning_frames);
    info!(
        "  Haptics: {} fired, {} suppressed",
        haptics_fired, haptics_suppressed
    );

    Ok(ProcessingStats {
        total_records,
        accel_samples,
        frames,
        persons_assessed,
        danger_frames,
        warning_frames,
        haptics_fired,
        haptics_suppressed,
        walking_onsets,
        walking_stops,
        skipped_lines: reader.skipped_lines,
        records_per_sec,
    })
}

/// Append one frame's decision to the JSONL output.
fn save_frame_decision(
    file: &mut std::fs::File,
    timestamp_ms: u64,
    walking: bool,
    worst: RiskLevel,
    command: RiskLevel,
    results: &[DetectionResult],
) -> Result<()> {
    let detections: Vec<serde_json::Value> = results
        .iter()
        .map(|r| {
            serde_json::json!({
                "left": r.bounding_box.left,
                "top": r.bounding_box.top,
                "right": r.bounding_box.right,
                "bottom": r.bounding_box.bottom,
                "risk": r.risk.as_str(),
            })
        })
        .collect();

    let json_value = serde_json::json!({
        "timestamp_ms": timestamp_ms,
        "walking": walking,
        "worst_risk": worst.as_str(),
        "haptic": command.as_str(),
        "detections": detections,
    });

    writeln!(file, "{}", serde_json::to_string(&json_value)?)?;
    Ok(())
}
