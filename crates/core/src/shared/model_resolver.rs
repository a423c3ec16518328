use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    Missing(PathBuf),
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Where model artifacts are fetched from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelBase {
    /// Local directory holding the artifacts by file name.
    Dir(PathBuf),
    /// URL prefix; artifacts are downloaded as `{prefix}/{name}` and cached.
    Url(String),
}

impl ModelBase {
    /// Interprets `http://` and `https://` prefixes as URLs, anything else as
    /// a directory path.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            ModelBase::Url(trimmed.trim_end_matches('/').to_string())
        } else {
            ModelBase::Dir(PathBuf::from(trimmed))
        }
    }

    pub fn artifact_url(&self, name: &str) -> Option<String> {
        match self {
            ModelBase::Url(prefix) => Some(format!("{prefix}/{name}")),
            ModelBase::Dir(_) => None,
        }
    }
}

impl std::fmt::Display for ModelBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelBase::Dir(dir) => write!(f, "{}", dir.display()),
            ModelBase::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve a model file by name from the configured base.
///
/// Directory bases must already contain the file. URL bases check the user
/// cache directory first and download into it on a miss.
pub fn resolve(
    name: &str,
    base: &ModelBase,
    progress: Option<&ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    match base {
        ModelBase::Dir(dir) => {
            let path = dir.join(name);
            if path.exists() {
                Ok(path)
            } else {
                Err(ModelResolveError::Missing(path))
            }
        }
        ModelBase::Url(prefix) => {
            let cache_dir = model_cache_dir()?;
            let cached_path = cache_dir.join(name);
            if cached_path.exists() {
                return Ok(cached_path);
            }
            fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
            fetch_to(&format!("{prefix}/{name}"), &cached_path, progress)?;
            Ok(cached_path)
        }
    }
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/MoodLens/models/`
/// - Linux: `$XDG_CACHE_HOME/MoodLens/models/` or `~/.cache/MoodLens/models/`
/// - Windows: `%LOCALAPPDATA%/MoodLens/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("MoodLens").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("MoodLens").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

/// Writes through to `inner`, reporting the running byte count.
struct ProgressWriter<'a, W> {
    inner: W,
    written: u64,
    total: u64,
    progress: Option<&'a ProgressFn>,
}

impl<W: Write> Write for ProgressWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        if let Some(cb) = self.progress {
            cb(self.written, self.total);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Downloads into a `.part` sibling and renames it into place, so `dest`
/// only ever holds a complete file.
fn fetch_to(url: &str, dest: &Path, progress: Option<&ProgressFn>) -> Result<(), ModelResolveError> {
    let partial = dest.with_extension("part");
    let fetched = stream_into(url, &partial, progress).and_then(|()| {
        fs::rename(&partial, dest).map_err(|source| ModelResolveError::Write {
            path: dest.to_path_buf(),
            source,
        })
    });
    if fetched.is_err() {
        let _ = fs::remove_file(&partial);
    }
    fetched
}

fn stream_into(
    url: &str,
    partial: &Path,
    progress: Option<&ProgressFn>,
) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|source| ModelResolveError::Download {
            url: url.to_string(),
            source,
        })?;

    let write_err = |source: io::Error| ModelResolveError::Write {
        path: partial.to_path_buf(),
        source,
    };
    let file = fs::File::create(partial).map_err(write_err)?;
    let mut writer = ProgressWriter {
        inner: io::BufWriter::new(file),
        written: 0,
        total: response.content_length().unwrap_or(0),
        progress,
    };
    io::copy(&mut response, &mut writer).map_err(write_err)?;
    writer.flush().map_err(write_err)
}
