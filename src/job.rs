use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::{BurninError, Result};
use crate::options::BurnOptionsPatch;

fn default_overwrite() -> bool {
    true
}

/// A burn-in request as handed over by the publishing pipeline.
///
/// ```json
/// {
///     "input": "/renders/sh0010.mov",
///     "output": "/review/sh0010_burnin.mov",
///     "burnin_data": {"frame_start": 1001, "shot": "sh0010"},
///     "values": {"TOP_LEFT": "static", "BOTTOM_RIGHT": "{frame_start}{current_frame}"}
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Substitution data; `frame_start`, `frame_end`, `frame_start_tc` and
    /// `duration` have special meaning
    #[serde(default)]
    pub burnin_data: Map<String, Value>,
    /// Encoder arguments replacing the ones derived from the source
    #[serde(default)]
    pub codec: Option<Vec<String>>,
    #[serde(default)]
    pub options: Option<BurnOptionsPatch>,
    /// Position name to template, in drawing order
    #[serde(default)]
    pub values: Map<String, Value>,
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
}

impl Job {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BurninError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Frame count substituted into sequence output patterns
    pub fn duration(&self) -> Option<i64> {
        match self.burnin_data.get("duration")? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
