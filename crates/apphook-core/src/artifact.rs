//! Failure artifacts on disk.
//!
//! Screenshots captured for failing tests are written to a single directory
//! as `screenshot-<test>-<timestamp>.png`. The timestamp is ISO 8601 with
//! millisecond precision and `:`/`.` replaced by `-` so the name is valid on
//! every filesystem. Files are never overwritten: if a name is taken, a
//! numeric suffix is appended.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

const SCREENSHOT_PREFIX: &str = "screenshot";

/// Upper bound on suffixes tried before giving up on a unique name.
const MAX_NAME_ATTEMPTS: usize = 1000;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("screenshot is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Formats `at` for use in a file name.
pub fn file_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Reduces a test name to a file-name-safe slug.
fn slug(test_name: &str) -> String {
    let mut out = String::with_capacity(test_name.len());
    for c in test_name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn screenshot_file_name(test_name: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}-{}.png", SCREENSHOT_PREFIX, slug(test_name), file_timestamp(at))
}

/// Directory receiving failure artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactSink {
    dir: PathBuf,
}

impl ArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decodes a base64 PNG and writes it under a fresh name, creating the
    /// directory if needed. Returns the path written.
    pub fn write_screenshot(&self, test_name: &str, base64_png: &str) -> Result<PathBuf, ArtifactError> {
        let cleaned: String = base64_png.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD.decode(cleaned)?;
        self.write(&screenshot_file_name(test_name, Utc::now()), &bytes)
    }

    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| ArtifactError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let (stem, ext) = file_name.rsplit_once('.').unwrap_or((file_name, "png"));
        let mut last_err = None;
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = if attempt == 0 {
                self.dir.join(file_name)
            } else {
                self.dir.join(format!("{}-{}.{}", stem, attempt, ext))
            };
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(bytes)
                        .map_err(|source| ArtifactError::Io { path: path.clone(), source })?;
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    last_err = Some(e);
                }
                Err(source) => return Err(ArtifactError::Io { path, source }),
            }
        }
        Err(ArtifactError::Io {
            path: self.dir.join(file_name),
            source: last_err.unwrap_or_else(|| std::io::Error::from(std::io::ErrorKind::AlreadyExists)),
        })
    }
}
