//! Byte-range transports for BBI files

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::OpenError;

/// Largest buffer reserved up front for a single read
const MAX_PREALLOC: u64 = 1 << 20;

/// Random access to an immutable byte source.
///
/// Reads past the end return the bytes that exist; callers detect truncation.
#[async_trait]
pub trait RangeReader: Send + Sync + fmt::Debug {
    async fn read_range(&self, offset: u64, len: u64) -> io::Result<Vec<u8>>;

    /// Path or URL the bytes come from
    fn location(&self) -> &str;
}

/// Local file, read on tokio's blocking pool
#[derive(Debug, Clone)]
pub struct FileRangeReader {
    path: PathBuf,
    location: String,
}

impl FileRangeReader {
    /// Check that `path` is a readable file
    pub async fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        Ok(Self {
            location: path.display().to_string(),
            path,
        })
    }
}

#[async_trait]
impl RangeReader for FileRangeReader {
    async fn read_range(&self, offset: u64, len: u64) -> io::Result<Vec<u8>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut file = File::open(&path)?;
            file.seek(SeekFrom::Start(offset))?;
            let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC) as usize);
            file.take(len).read_to_end(&mut buf)?;
            Ok::<_, io::Error>(buf)
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?
    }

    fn location(&self) -> &str {
        &self.location
    }
}

/// Bytes already in memory
#[derive(Clone)]
pub struct MemoryRangeReader {
    data: Arc<[u8]>,
    location: String,
}

impl MemoryRangeReader {
    pub fn new<L: Into<String>>(location: L, data: Vec<u8>) -> Self {
        Self {
            data: data.into(),
            location: location.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for MemoryRangeReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRangeReader")
            .field("location", &self.location)
            .field("len", &self.data.len())
            .finish()
    }
}

#[async_trait]
impl RangeReader for MemoryRangeReader {
    async fn read_range(&self, offset: u64, len: u64) -> io::Result<Vec<u8>> {
        let size = self.data.len() as u64;
        let start = offset.min(size) as usize;
        let end = offset.saturating_add(len).min(size) as usize;
        Ok(self.data[start..end].to_vec())
    }

    fn location(&self) -> &str {
        &self.location
    }
}

/// HTTP(S) resource read with `Range` requests
#[cfg(feature = "remote")]
#[derive(Debug, Clone)]
pub struct HttpRangeReader {
    client: reqwest::Client,
    url: String,
}

#[cfg(feature = "remote")]
impl HttpRangeReader {
    pub fn new<U: Into<String>>(url: U) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[cfg(feature = "remote")]
#[async_trait]
impl RangeReader for HttpRangeReader {
    async fn read_range(&self, offset: u64, len: u64) -> io::Result<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let to_io = |e: reqwest::Error| io::Error::new(io::ErrorKind::Other, e.to_string());

        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::RANGE, format!("bytes={}-{}", offset, offset.saturating_add(len - 1)))
            .send()
            .await
            .map_err(to_io)?;

        let status = response.status();
        if status == reqwest::StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("HTTP {} for {}", status, self.url),
            ));
        }

        let partial = status == reqwest::StatusCode::PARTIAL_CONTENT;
        let body = response.bytes().await.map_err(to_io)?;
        if partial {
            return Ok(body.to_vec());
        }

        // server ignored the Range header and sent everything
        let start = (offset as usize).min(body.len());
        let end = (offset.saturating_add(len) as usize).min(body.len());
        Ok(body[start..end].to_vec())
    }

    fn location(&self) -> &str {
        &self.url
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[cfg(feature = "remote")]
fn open_remote(location: &str) -> Result<Box<dyn RangeReader>, OpenError> {
    Ok(Box::new(HttpRangeReader::new(location)))
}

#[cfg(not(feature = "remote"))]
fn open_remote(location: &str) -> Result<Box<dyn RangeReader>, OpenError> {
    Err(OpenError::new(
        location,
        "remote locations need the 'remote' feature",
    ))
}

/// Pick a transport for a track URL or path
pub async fn open_location(location: &str) -> Result<Box<dyn RangeReader>, OpenError> {
    if is_remote(location) {
        return open_remote(location);
    }

    let path = location.strip_prefix("file://").unwrap_or(location);
    let reader = FileRangeReader::open(path)
        .await
        .map_err(|e| OpenError::new(location, e.to_string()))?;
    Ok(Box::new(reader))
}
