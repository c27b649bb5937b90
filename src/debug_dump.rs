//! DEBUG dump files
//!
//! With `--debug` each feature test writes the intermediate values behind its
//! verdict to `DEBUG_<feature>.json` in the output folder.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Intermediate values collected during one feature test
#[derive(Debug, Clone, Serialize)]
pub struct DebugDump {
    /// Feature test name (e.g., "import-pressure")
    pub feature: String,
    /// Named values in insertion order of their keys
    pub values: Map<String, Value>,
    /// Per-step or per-event rows
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Value>,
}

impl DebugDump {
    pub fn new(feature: &str) -> Self {
        Self {
            feature: feature.to_string(),
            values: Map::new(),
            rows: Vec::new(),
        }
    }

    /// Record a named value; serialization failures become a string marker
    pub fn insert<T: Serialize>(&mut self, key: &str, value: &T) {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|e| Value::String(format!("<unserializable: {}>", e)));
        self.values.insert(key.to_string(), value);
    }

    pub fn add_row<T: Serialize>(&mut self, row: &T) {
        if let Ok(value) = serde_json::to_value(row) {
            self.rows.push(value);
        }
    }

    /// File name for this dump
    pub fn file_name(&self) -> String {
        format!("DEBUG_{}.json", self.feature)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the dump into `dir` when `enabled`
    pub fn write_if(&self, enabled: bool, dir: &Path) -> Result<Option<PathBuf>> {
        if !enabled {
            return Ok(None);
        }
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output folder {}", dir.display()))?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!("Wrote {}", path.display());
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dump_contents() {
        let mut dump = DebugDump::new("transmission");
        dump.insert("base_infectivity", &0.35);
        dump.add_row(&serde_json::json!({"step": 1, "expected": 2.5}));

        let json: Value = serde_json::from_str(&dump.to_json().unwrap()).unwrap();
        assert_eq!(json["feature"], "transmission");
        assert_eq!(json["values"]["base_infectivity"], 0.35);
        assert_eq!(json["rows"][0]["step"], 1);
    }

    #[test]
    fn test_rows_omitted_when_empty() {
        let dump = DebugDump::new("x");
        assert!(!dump.to_json().unwrap().contains("rows"));
    }

    #[test]
    fn test_write_only_when_enabled() {
        let temp_dir = TempDir::new().unwrap();
        let dump = DebugDump::new("import-pressure");

        assert_eq!(dump.write_if(false, temp_dir.path()).unwrap(), None);
        assert!(!temp_dir.path().join("DEBUG_import-pressure.json").exists());

        let path = dump.write_if(true, temp_dir.path()).unwrap().unwrap();
        assert_eq!(path, temp_dir.path().join("DEBUG_import-pressure.json"));
        assert!(path.exists());
    }
}
