use std::collections::BTreeMap;
use std::path::Path;

use blobfs::{BlobFs, FileSystemBucket, MemoryBucket, V1};
use serde::Deserialize;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG: &str = "blobfs.toml";

/// Top-level configuration loaded from `blobfs.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub root: RootConfig,
    pub bucket: BucketConfig,
}

/// Where the filesystem view is rooted inside the bucket.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RootConfig {
    pub version: String,
    pub prefix: String,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            version: V1.into(),
            prefix: String::new(),
        }
    }
}

/// Bucket backend definition.
///
/// The `type` field selects the backend: `"filesystem"` (default) reads a
/// local directory at `path`; `"memory"` serves the inline `objects` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BucketConfig {
    /// `"filesystem"` (default) or `"memory"`.
    pub r#type: String,
    pub path: String,
    /// Inline objects for memory buckets (ignored for filesystem buckets).
    pub objects: BTreeMap<String, String>,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            r#type: "filesystem".into(),
            path: ".".into(),
            objects: BTreeMap::new(),
        }
    }
}

/// Load a config from a TOML file.
///
/// Returns `Err` with a human-readable message if the file cannot be read
/// or parsed.
pub fn load_config(path: &Path) -> Result<Config, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    parse_config(&content).map_err(|e| format!("failed to parse {}: {e}", path.display()))
}

fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

/// Load `path` if it exists, otherwise fall back to the defaults.
pub fn load_or_default(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        log::warn!("{} not found, using default configuration", path.display());
        return Ok(Config::default());
    }
    load_config(path)
}

/// Build a [`BlobFs`] from a config.
pub fn build_fs(config: &Config) -> Result<BlobFs, String> {
    let root = &config.root;
    let fs = match config.bucket.r#type.as_str() {
        "filesystem" => {
            log::info!(
                "bucket: filesystem {:?}, root {:?}/{:?}",
                config.bucket.path,
                root.version,
                root.prefix
            );
            BlobFs::new(
                &root.version,
                &root.prefix,
                FileSystemBucket::new(&config.bucket.path),
            )
        }
        "memory" => {
            log::info!(
                "bucket: memory with {} objects, root {:?}/{:?}",
                config.bucket.objects.len(),
                root.version,
                root.prefix
            );
            let bucket = MemoryBucket::new();
            for (key, data) in &config.bucket.objects {
                bucket.insert(key.as_str(), data.clone().into_bytes());
            }
            BlobFs::new(&root.version, &root.prefix, bucket)
        }
        other => return Err(format!("unknown bucket type {other:?}")),
    };
    fs.map_err(|e| e.to_string())
}
