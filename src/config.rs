// src/config.rs

use crate::types::Config;
use anyhow::{bail, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks that don't belong to any single component.
    /// Numeric thresholds are validated by the component constructors.
    fn validate(&self) -> Result<()> {
        if self.replay.input_dir.trim().is_empty() {
            bail!("replay.input_dir must not be empty");
        }
        if self.replay.output_dir.trim().is_empty() {
            bail!("replay.output_dir must not be empty");
        }
        if self.logging.level.trim().is_empty() {
            bail!("logging.level must not be empty");
        }
        Ok(())
    }
}
