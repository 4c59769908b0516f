//! Remote media byte streams.
//!
//! The decoder reads media synchronously from its own thread, so these traits
//! are blocking by contract. Never call them from an async task without
//! moving to a blocking context first.

use std::io::{Cursor, Read, Seek};

use crate::error::Result;

/// A random-access view over a remote resource.
pub trait RemoteByteStream: Read + Seek + Send + Sync {
    /// Total length in bytes, when the server reported one.
    fn byte_len(&self) -> Option<u64>;

    /// Whether seeking away from the current position is supported.
    fn is_seekable(&self) -> bool {
        true
    }

    /// MIME type reported by the server, used as a demuxer hint.
    fn content_type(&self) -> Option<&str> {
        None
    }
}

/// Opens media URLs as [`RemoteByteStream`]s.
pub trait StreamConnector: Send + Sync {
    fn connect(&self, url: &str) -> Result<Box<dyn RemoteByteStream>>;
}

impl RemoteByteStream for Cursor<Vec<u8>> {
    fn byte_len(&self) -> Option<u64> {
        Some(self.get_ref().len() as u64)
    }
}
