use std::{fs, path::{Path, PathBuf}};
use serde::{Serialize, Deserialize};
use crate::config::SimConfig;
use crate::error::Result;
use crate::persist::RecordFormat;

/// Provenance for a results file: enough to rerun it bit-for-bit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub version: u32,
    pub crate_version: String,
    pub config: SimConfig,
    pub format: RecordFormat,
    pub output: PathBuf,
    pub build_flags: String,
}

impl RunManifest {
    pub fn new(config: SimConfig, format: RecordFormat, output: &Path) -> Self {
        let crate_version = env!("CARGO_PKG_VERSION").to_string();
        let build_flags = std::env::var("RUSTFLAGS").unwrap_or_default();
        Self { version: 1, crate_version, config, format, output: output.to_path_buf(), build_flags }
    }

    /// `<output>.json` next to the results file.
    pub fn path_for(output: &Path) -> PathBuf {
        let mut s = output.as_os_str().to_owned();
        s.push(".json");
        PathBuf::from(s)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }
}
