//! Cutter settings and order files.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::types::{CutterSettings, OrderLine, Strategy};

/// Version written into new settings files.
pub const SETTINGS_VERSION: u32 = 1;

fn current_version() -> u32 {
    SETTINGS_VERSION
}

/// Saved cutter setup: `{"version":1,"kerf":5,"maxHeight":2000,"maxWidth":1200,...}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsFile {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(flatten)]
    pub cutter: CutterSettings,
    #[serde(default)]
    pub strategy: Strategy,
}

impl SettingsFile {
    pub fn new(cutter: CutterSettings, strategy: Strategy) -> Self {
        Self {
            version: SETTINGS_VERSION,
            cutter,
            strategy,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: SettingsFile = serde_json::from_str(json)?;
        if file.version != SETTINGS_VERSION {
            return Err(Error::UnsupportedSettingsVersion {
                found: file.version,
                expected: SETTINGS_VERSION,
            });
        }
        Ok(file)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = Self::from_json(&fs::read_to_string(path)?)?;
        info!(path = %path.display(), "loaded cutter settings");
        Ok(file)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "saved cutter settings");
        Ok(())
    }
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self::new(CutterSettings::default(), Strategy::default())
    }
}

/// Reads a JSON array of order lines. Lines without an index are numbered
/// from 1 in file order.
pub fn read_orders(path: impl AsRef<Path>) -> Result<Vec<OrderLine>> {
    let mut lines: Vec<OrderLine> = serde_json::from_str(&fs::read_to_string(path)?)?;
    number_lines(&mut lines);
    Ok(lines)
}

pub fn number_lines(lines: &mut [OrderLine]) {
    for (i, line) in lines.iter_mut().enumerate() {
        if line.index == 0 {
            line.index = i + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_SPEED;

    #[test]
    fn test_settings_round_trip_through_disk() {
        let path = std::env::temp_dir().join(format!("steelcut-settings-{}.json", std::process::id()));
        let file = SettingsFile::new(CutterSettings::new(5.0, 2000.0, 1200.0), Strategy::Grouped);
        file.save(&path).unwrap();
        let loaded = SettingsFile::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, file);
    }

    #[test]
    fn test_settings_defaults() {
        let file = SettingsFile::from_json(r#"{"maxHeight":2000,"maxWidth":1200}"#).unwrap();
        assert_eq!(file.version, SETTINGS_VERSION);
        assert_eq!(file.cutter.kerf, 0.0);
        assert_eq!(file.cutter.speed, DEFAULT_SPEED);
        assert_eq!(file.strategy, Strategy::Sequence);
    }

    #[test]
    fn test_settings_rejects_unknown_version() {
        let err = SettingsFile::from_json(r#"{"version":2,"maxHeight":2000,"maxWidth":1200}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedSettingsVersion { found: 2, expected: 1 }
        ));
    }

    #[test]
    fn test_missing_settings_file() {
        let err = SettingsFile::load("/nonexistent/steelcut.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_number_lines_keeps_explicit_indices() {
        let mut lines = vec![
            OrderLine::new(0, "P", "S", 6000.0, 1000.0, 1),
            OrderLine::new(7, "P", "S", 6000.0, 1000.0, 1),
            OrderLine::new(0, "P", "S", 6000.0, 1000.0, 1),
        ];
        number_lines(&mut lines);
        assert_eq!(lines.iter().map(|l| l.index).collect::<Vec<_>>(), vec![1, 7, 3]);
    }
}
