//! Sequential S3 upload of a staged directory tree.
//!
//! Every regular file becomes an object at `{prefix}/{relative_path}`; every
//! directory, empty ones included, becomes a zero-byte marker object with a
//! trailing slash. One request is in flight at a time.
#![forbid(unsafe_code)]

use std::path::{Component, Path, PathBuf};

use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Clone, Debug)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Explicit upload destination. Components never read process environment;
/// absent credentials fall through to the SDK default provider chain.
#[derive(Clone, Debug)]
pub struct S3Target {
    pub bucket: String,
    pub prefix: String,
    pub credentials: Option<S3Credentials>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub files: usize,
    pub markers: usize,
    pub bytes: u64,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to start async runtime: {0}")]
    Runtime(std::io::Error),
    #[error("path {0} is not valid unicode")]
    NonUnicodePath(PathBuf),
    #[error("s3 put_object failed for key {key}: {message}")]
    Put { key: String, message: String },
}

/// One object to store: a file's bytes or an empty directory marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadEntry {
    File { key: String, path: PathBuf },
    Marker { key: String },
}

impl UploadEntry {
    pub fn key(&self) -> &str {
        match self {
            UploadEntry::File { key, .. } | UploadEntry::Marker { key } => key,
        }
    }
}

/// Object key for a relative path: components joined with `/` under the
/// prefix, regardless of the platform separator.
pub fn object_key(prefix: &str, rel: &Path) -> Result<String, UploadError> {
    let mut parts: Vec<&str> = Vec::new();
    for comp in rel.components() {
        match comp {
            Component::Normal(c) => parts.push(
                c.to_str()
                    .ok_or_else(|| UploadError::NonUnicodePath(rel.to_path_buf()))?,
            ),
            Component::CurDir => {}
            _ => return Err(UploadError::NonUnicodePath(rel.to_path_buf())),
        }
    }
    let joined = parts.join("/");
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        Ok(joined)
    } else {
        Ok(format!("{prefix}/{joined}"))
    }
}

/// Marker key for a directory: the object key with a trailing slash.
pub fn marker_key(prefix: &str, rel: &Path) -> Result<String, UploadError> {
    Ok(format!("{}/", object_key(prefix, rel)?))
}

/// Walks `dir` and plans one entry per file and per subdirectory.
/// Ordering follows the directory walk and is not part of the contract.
pub fn plan_tree(dir: &Path, prefix: &str) -> Result<Vec<UploadEntry>, UploadError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        let rel = match entry.path().strip_prefix(dir) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        if rel.as_os_str().is_empty() {
            continue;
        }
        if entry.file_type().is_dir() {
            entries.push(UploadEntry::Marker {
                key: marker_key(prefix, rel)?,
            });
        } else if entry.file_type().is_file() {
            entries.push(UploadEntry::File {
                key: object_key(prefix, rel)?,
                path: entry.path().to_path_buf(),
            });
        }
    }
    Ok(entries)
}

/// Blocking S3 client: a current-thread runtime drives one SDK future at a
/// time via `block_on`.
pub struct S3Uploader {
    target: S3Target,
    client: Client,
    runtime: tokio::runtime::Runtime,
}

impl S3Uploader {
    pub fn connect(target: S3Target) -> Result<Self, UploadError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(UploadError::Runtime)?;
        let config = runtime.block_on(async {
            let loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
            match &target.credentials {
                Some(creds) => {
                    loader
                        .credentials_provider(aws_sdk_s3::config::Credentials::new(
                            creds.access_key_id.clone(),
                            creds.secret_access_key.clone(),
                            None,
                            None,
                            "voxport",
                        ))
                        .load()
                        .await
                }
                None => loader.load().await,
            }
        });
        let client = Client::new(&config);
        Ok(Self {
            target,
            client,
            runtime,
        })
    }

    /// Mirrors `dir` into the target bucket. The staging tree is left on disk;
    /// removal is the caller's decision, gated on this returning `Ok`.
    pub fn upload_tree(&self, dir: &Path) -> Result<UploadReport, UploadError> {
        let mut report = UploadReport::default();
        for entry in plan_tree(dir, &self.target.prefix)? {
            match entry {
                UploadEntry::File { key, path } => {
                    let body = std::fs::read(&path)?;
                    report.bytes += body.len() as u64;
                    self.put(&key, body)?;
                    report.files += 1;
                }
                UploadEntry::Marker { key } => {
                    self.put(&key, Vec::new())?;
                    report.markers += 1;
                }
            }
        }
        log::info!(
            target: "s3",
            "uploaded {} files and {} directory markers ({} bytes) to s3://{}/{}",
            report.files,
            report.markers,
            report.bytes,
            self.target.bucket,
            self.target.prefix
        );
        Ok(report)
    }

    fn put(&self, key: &str, body: Vec<u8>) -> Result<(), UploadError> {
        log::debug!(target: "s3", "put s3://{}/{}", self.target.bucket, key);
        self.runtime
            .block_on(
                self.client
                    .put_object()
                    .bucket(&self.target.bucket)
                    .key(key)
                    .body(ByteStream::from(body))
                    .send(),
            )
            .map(|_| ())
            .map_err(|e| UploadError::Put {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_join_with_forward_slashes() {
        let rel = Path::new("a").join("b.txt");
        assert_eq!(object_key("p", &rel).unwrap(), "p/a/b.txt");
        assert_eq!(marker_key("p", Path::new("a")).unwrap(), "p/a/");
    }

    #[test]
    fn prefix_normalization() {
        assert_eq!(object_key("p/", Path::new("a")).unwrap(), "p/a");
        assert_eq!(object_key("", Path::new("a")).unwrap(), "a");
        assert_eq!(
            object_key("data/run1", Path::new("mesh/info")).unwrap(),
            "data/run1/mesh/info"
        );
    }
}
