use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_INSTRUCTIONS: usize = 65_536;

/// Knobs shared by the execution engine and the disassembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hard ceiling on instructions visited per top-level walk.
    pub max_instructions: usize,
    /// Gate `if` bodies on flag tests instead of walking both branches.
    pub evaluate_conditions: bool,
    /// Number of text languages rendered next to message opcodes.
    pub languages: usize,
    /// Prefix disassembly lines with the raw instruction bytes.
    pub show_bytes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_instructions: DEFAULT_MAX_INSTRUCTIONS,
            evaluate_conditions: false,
            languages: 2,
            show_bytes: false,
        }
    }
}

impl EngineConfig {
    /// Reads a JSON config; missing keys keep their defaults, and no path or
    /// a path that doesn't exist yields the defaults outright.
    pub fn from_json_file(path: Option<&Path>) -> Result<Self> {
        let mut config = EngineConfig::default();
        if let Some(p) = path {
            if p.exists() {
                let raw = fs::read_to_string(p)
                    .with_context(|| format!("failed to read engine config: {}", p.display()))?;
                config = serde_json::from_str(&raw)
                    .with_context(|| format!("failed to parse engine config json: {}", p.display()))?;
            } else {
                log::debug!("engine config {} not found; using defaults", p.display());
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.max_instructions > 0,
            "max_instructions must be at least 1"
        );
        Ok(())
    }
}
