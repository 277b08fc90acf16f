use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use teal_ir::program::{MAX_VERSION, MIN_VERSION};

use crate::error::RouterError;

/// Settings for [`crate::Router::compile_program`].
///
/// ```toml
/// version = 8
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// TEAL version written to the `#pragma` line.
    pub version: u8,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            version: Self::DEFAULT_VERSION,
        }
    }
}

impl CompileOptions {
    pub const DEFAULT_VERSION: u8 = 6;

    pub fn new(version: u8) -> Result<CompileOptions, RouterError> {
        let options = CompileOptions { version };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), RouterError> {
        if (MIN_VERSION..=MAX_VERSION).contains(&self.version) {
            Ok(())
        } else {
            Err(RouterError::InvalidVersion(self.version))
        }
    }

    /// Read and parse options from a TOML file.
    pub fn from_file(path: &Path) -> Result<CompileOptions, RouterError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RouterError::Options(format!("failed to read {}: {}", path.display(), e)))?;
        content.parse()
    }
}

impl FromStr for CompileOptions {
    type Err = RouterError;

    /// Parse options from a TOML string. Missing keys take their defaults.
    fn from_str(content: &str) -> Result<CompileOptions, RouterError> {
        let options: CompileOptions = toml::from_str(content)
            .map_err(|e| RouterError::Options(format!("failed to parse compile options: {}", e)))?;
        options.validate()?;
        Ok(options)
    }
}
