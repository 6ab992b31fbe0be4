//! Conversion job configuration, from CLI flags or a TOML job file.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

fn default_voxel_size() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("upload_dir")
}

fn default_n5_dataset() -> String {
    "volume".to_string()
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Source image: a TIFF stack or an N5 root.
    pub input: PathBuf,
    /// Local directory the precomputed tree is staged into.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
    /// Physical voxel spacing per axis, in nanometres.
    #[serde(default = "default_voxel_size")]
    pub voxel_size: [f64; 3],
    #[serde(default = "default_n5_dataset")]
    pub n5_dataset: String,
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Leave the staging tree on disk after a successful upload.
    #[serde(default)]
    pub keep_staging: bool,
    /// Stage locally and skip the upload entirely.
    #[serde(default)]
    pub skip_upload: bool,
}

impl JobConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let job: JobConfig = toml::from_str(toml_str)?;
        Ok(job)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}
