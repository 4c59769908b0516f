//! Adapts a [`RemoteByteStream`] to Symphonia's `MediaSource`.

use bridge_traits::stream::RemoteByteStream;
use std::io::{self, Read, Seek, SeekFrom};
use symphonia::core::io::MediaSource;

pub struct RemoteMediaSource {
    inner: Box<dyn RemoteByteStream>,
}

impl RemoteMediaSource {
    pub fn new(inner: Box<dyn RemoteByteStream>) -> Self {
        Self { inner }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.inner.content_type()
    }
}

impl Read for RemoteMediaSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for RemoteMediaSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl MediaSource for RemoteMediaSource {
    fn is_seekable(&self) -> bool {
        self.inner.is_seekable()
    }

    fn byte_len(&self) -> Option<u64> {
        self.inner.byte_len()
    }
}
