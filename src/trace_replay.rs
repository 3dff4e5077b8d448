// src/trace_replay.rs

use crate::types::{Config, TraceRecord};
use anyhow::Result;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

pub struct TraceReplayer {
    config: Config,
}

impl TraceReplayer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn find_trace_files(&self) -> Result<Vec<PathBuf>> {
        let mut traces = Vec::new();

        let trace_extensions = vec!["jsonl", "JSONL"];

        for entry in WalkDir::new(&self.config.replay.input_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if let Some(ext) = path.extension() {
                if trace_extensions.contains(&ext.to_str().unwrap_or("")) {
                    traces.push(path.to_path_buf());
                }
            }
        }

        traces.sort();
        info!("Found {} trace files", traces.len());
        Ok(traces)
    }

    pub fn open_trace(&self, path: &Path) -> Result<TraceReader> {
        info!("Opening trace: {}", path.display());

        let contents = fs::read_to_string(path)?;
        let lines: Vec<String> = contents.lines().map(|l| l.to_string()).collect();

        info!("Trace length: {} records", lines.len());

        Ok(TraceReader::from_lines(lines))
    }

    /// Create the per-trace decision output file, unless disabled in config.
    pub fn create_decision_writer(&self, input_path: &Path) -> Result<Option<File>> {
        if !self.config.replay.save_decisions {
            return Ok(None);
        }

        fs::create_dir_all(&self.config.replay.output_dir)?;

        let input_name = input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("trace");
        let output_path = PathBuf::from(&self.config.replay.output_dir)
            .join(format!("{}_decisions.jsonl", input_name));

        info!("Decision output: {}", output_path.display());

        Ok(Some(File::create(output_path)?))
    }
}

pub struct TraceReader {
    lines: Vec<String>,
    pub total_lines: usize,
    pub current_line: usize,
    pub skipped_lines: usize,
}

impl TraceReader {
    pub fn from_lines(lines: Vec<String>) -> Self {
        let total_lines = lines.len();
        Self {
            lines,
            total_lines,
            current_line: 0,
            skipped_lines: 0,
        }
    }

    /// Next record in file order. Blank or malformed lines are skipped with
    /// a warning so one bad record doesn't abort a whole session.
    pub fn read_record(&mut self) -> Option<TraceRecord> {
        while self.current_line < self.lines.len() {
            let line = &self.lines[self.current_line];
            self.current_line += 1;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<TraceRecord>(line) {
                Ok(record) => return Some(record),
                Err(e) => {
                    warn!("Skipping malformed record on line {}: {}", self.current_line, e);
                    self.skipped_lines += 1;
                }
            }
        }
        None
    }

    pub fn progress(&self) -> f32 {
        if self.total_lines == 0 {
            return 0.0;
        }
        (self.current_line as f32 / self.total_lines as f32) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader_from(lines: &[&str]) -> TraceReader {
        TraceReader::from_lines(lines.iter().map(|l| l.to_string()).collect())
    }

    #[test]
    fn test_parses_accel_record() {
        let mut reader =
            reader_from(&[r#"{"type":"accel","timestamp_ms":1000,"vertical_accel":2.1}"#]);

        match reader.read_record() {
            Some(TraceRecord::Accel {
                timestamp_ms,
                vertical_accel,
            }) => {
                assert_eq!(timestamp_ms, 1000);
                assert!((vertical_accel - 2.1).abs() < 1e-6);
            }
            other => panic!("expected accel record, got {:?}", other),
        }
        assert!(reader.read_record().is_none());
    }

    #[test]
    fn test_parses_frame_record() {
        let mut reader = reader_from(&[
            r#"{"type":"frame","timestamp_ms":1033,"image_width":640,"image_height":480,"persons":[{"left":200,"top":50,"right":440,"bottom":420}]}"#,
        ]);

        match reader.read_record() {
            Some(TraceRecord::Frame {
                timestamp_ms,
                image_width,
                image_height,
                persons,
            }) => {
                assert_eq!(timestamp_ms, 1033);
                assert_eq!(image_width, 640);
                assert_eq!(image_height, 480);
                assert_eq!(persons.len(), 1);
                assert_eq!(persons[0].left, 200);
                assert_eq!(persons[0].bottom, 420);
            }
            other => panic!("expected frame record, got {:?}", other),
        }
    }

    #[test]
    fn test_skips_malformed_and_blank_lines() {
        let mut reader = reader_from(&[
            "",
            "not json",
            r#"{"type":"accel","timestamp_ms":1,"vertical_accel":0.5}"#,
            r#"{"type":"unknown","timestamp_ms":2}"#,
            r#"{"type":"frame","timestamp_ms":3,"image_width":640,"image_height":480,"persons":[]}"#,
        ]);

        assert!(matches!(
            reader.read_record(),
            Some(TraceRecord::Accel { timestamp_ms: 1, .. })
        ));
        assert!(matches!(
            reader.read_record(),
            Some(TraceRecord::Frame { timestamp_ms: 3, .. })
        ));
        assert!(reader.read_record().is_none());
        assert_eq!(reader.skipped_lines, 2);
    }

    #[test]
    fn test_progress_reaches_full() {
        let mut reader = reader_from(&[
            r#"{"type":"accel","timestamp_ms":1,"vertical_accel":0.5}"#,
            r#"{"type":"accel","timestamp_ms":2,"vertical_accel":0.6}"#,
        ]);
        assert_eq!(reader.progress(), 0.0);
        reader.read_record();
        assert!((reader.progress() - 50.0).abs() < 1e-3);
        reader.read_record();
        assert!((reader.progress() - 100.0).abs() < 1e-3);
    }
}
