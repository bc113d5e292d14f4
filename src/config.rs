// Per-source decoding rules and report settings.
//
// Everything has a default so the binary runs without a config file; a JSON
// file passed with `--config` overrides individual fields.
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// How the first row of a source is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderPolicy {
    /// Every row is data.
    Absent,
    /// The first row is dropped when it does not decode as a record.
    Optional,
    /// The first row is always a header.
    Required,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceFormat {
    pub delimiter: char,
    /// Rewrite `,` to `.` in decimal fields before parsing.
    pub decimal_comma: bool,
    pub header: HeaderPolicy,
}

impl SourceFormat {
    pub fn reservations() -> Self {
        SourceFormat {
            delimiter: '|',
            decimal_comma: false,
            header: HeaderPolicy::Optional,
        }
    }

    pub fn energy() -> Self {
        SourceFormat {
            delimiter: ';',
            decimal_comma: true,
            header: HeaderPolicy::Required,
        }
    }

    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(|b| b.is_ascii())
            .ok_or(ConfigError::Delimiter(self.delimiter))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reservations: SourceFormat,
    pub energy: SourceFormat,
    pub report_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            reservations: SourceFormat::reservations(),
            energy: SourceFormat::energy(),
            report_file: PathBuf::from("report.txt"),
        }
    }
}

impl Settings {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(s)?;
        settings.reservations.delimiter_byte()?;
        settings.energy.delimiter_byte()?;
        Ok(settings)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}
