//! Seekable HTTP media streams using blocking `reqwest`.
//!
//! A stream keeps one response body open and reads it sequentially. Seeking
//! drops the body; the next read reopens the resource with a `Range` header
//! starting at the new position. Dropped connections are reopened at the
//! current position a bounded number of times before the read fails.
//!
//! Everything here blocks. The blocking client must not be created or
//! dropped on an async executor thread.

use bridge_traits::{
    error::{BridgeError, Result},
    stream::{RemoteByteStream, StreamConnector},
};
use parking_lot::Mutex;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT_RANGES, CONTENT_RANGE, CONTENT_TYPE, RANGE};
use reqwest::StatusCode;
use std::io::{self, Read, Seek, SeekFrom};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const USER_AGENT: &str = concat!("playlistd/", env!("CARGO_PKG_VERSION"));

/// Opens [`HttpByteStream`]s.
#[derive(Debug, Clone)]
pub struct HttpStreamConnector {
    connect_timeout: Duration,
    max_reconnects: u32,
}

impl HttpStreamConnector {
    pub fn new(connect_timeout: Duration, max_reconnects: u32) -> Self {
        Self {
            connect_timeout,
            max_reconnects,
        }
    }
}

impl Default for HttpStreamConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), 3)
    }
}

impl StreamConnector for HttpStreamConnector {
    #[instrument(skip(self, url))]
    fn connect(&self, url: &str) -> Result<Box<dyn RemoteByteStream>> {
        let client = Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(None::<Duration>)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BridgeError::Network(format!("Failed to build HTTP client: {e}")))?;

        let stream = HttpByteStream::open(client, url.to_string(), self.max_reconnects)?;
        Ok(Box::new(stream))
    }
}

/// A remote resource read through HTTP range requests.
pub struct HttpByteStream {
    client: Client,
    url: String,
    position: u64,
    length: Option<u64>,
    content_type: Option<String>,
    accepts_ranges: bool,
    max_reconnects: u32,
    body: Mutex<Option<Response>>,
}

impl HttpByteStream {
    fn open(client: Client, url: String, max_reconnects: u32) -> Result<Self> {
        let response = request_from(&client, &url, 0)?;

        let status = response.status();
        let accepts_ranges = status == StatusCode::PARTIAL_CONTENT
            || response
                .headers()
                .get(ACCEPT_RANGES)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.eq_ignore_ascii_case("bytes"));

        let length = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .or_else(|| {
                (status == StatusCode::OK)
                    .then(|| response.content_length())
                    .flatten()
            });

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        debug!(
            status = status.as_u16(),
            length = ?length,
            accepts_ranges,
            content_type = ?content_type,
            "Opened media stream"
        );

        Ok(Self {
            client,
            url,
            position: 0,
            length,
            content_type,
            accepts_ranges,
            max_reconnects,
            body: Mutex::new(Some(response)),
        })
    }

    fn reopen(&mut self) -> io::Result<()> {
        let response = request_from(&self.client, &self.url, self.position)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        if self.position > 0 && response.status() != StatusCode::PARTIAL_CONTENT {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "server ignored the range request",
            ));
        }
        *self.body.get_mut() = Some(response);
        Ok(())
    }
}

fn request_from(client: &Client, url: &str, offset: u64) -> Result<Response> {
    let response = client
        .get(url)
        .header(RANGE, format!("bytes={offset}-"))
        .send()
        .map_err(|e| {
            if e.is_timeout() {
                BridgeError::Network("Request timed out".to_string())
            } else if e.is_connect() {
                BridgeError::Network(format!("Connection failed: {e}"))
            } else {
                BridgeError::Network(e.to_string())
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(BridgeError::Network(format!(
            "HTTP {} opening media stream",
            status.as_u16()
        )));
    }
    Ok(response)
}

/// Extracts the total size from `Content-Range: bytes 0-99/1234`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}

impl Read for HttpByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.length.is_some_and(|len| self.position >= len) {
            return Ok(0);
        }

        let mut reconnects = 0;
        loop {
            if self.body.get_mut().is_none() {
                self.reopen()?;
            }
            let Some(body) = self.body.get_mut().as_mut() else {
                continue;
            };

            match body.read(buf) {
                Ok(read) => {
                    self.position += read as u64;
                    return Ok(read);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if reconnects < self.max_reconnects => {
                    reconnects += 1;
                    warn!(
                        error = %e,
                        position = self.position,
                        attempt = reconnects,
                        "Media stream read failed, reconnecting"
                    );
                    *self.body.get_mut() = None;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Seek for HttpByteStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => {
                let len = self.length.ok_or_else(|| {
                    io::Error::new(io::ErrorKind::Unsupported, "stream length is unknown")
                })?;
                len.checked_add_signed(delta)
            }
        }
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "seek out of range"))?;

        if target == self.position {
            return Ok(target);
        }
        if !self.accepts_ranges {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "server does not support range requests",
            ));
        }

        self.position = target;
        *self.body.get_mut() = None;
        Ok(target)
    }
}

impl RemoteByteStream for HttpByteStream {
    fn byte_len(&self) -> Option<u64> {
        self.length
    }

    fn is_seekable(&self) -> bool {
        self.accepts_ranges
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}
