//! Opens resolved media URLs as decoders over HTTP range reads.

use crate::config::StreamingConfig;
use crate::decoder::SymphoniaDecoder;
use crate::error::{PlaybackError, Result};
use crate::traits::{AudioDecoder, StreamOpener};
use bridge_traits::stream::StreamConnector;
use std::sync::Arc;

pub struct HttpStreamOpener {
    connector: Arc<dyn StreamConnector>,
}

impl HttpStreamOpener {
    pub fn new(connector: Arc<dyn StreamConnector>) -> Self {
        Self { connector }
    }
}

impl StreamOpener for HttpStreamOpener {
    fn open(&self, url: &str, config: &StreamingConfig) -> Result<Box<dyn AudioDecoder>> {
        let stream = self
            .connector
            .connect(url)
            .map_err(|e| PlaybackError::Network(e.to_string()))?;
        let decoder = SymphoniaDecoder::open(stream, url, config)?;
        Ok(Box::new(decoder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::stream::RemoteByteStream;
    use std::io::Cursor;

    struct FixedConnector(Option<Vec<u8>>);

    impl StreamConnector for FixedConnector {
        fn connect(&self, _url: &str) -> BridgeResult<Box<dyn RemoteByteStream>> {
            match &self.0 {
                Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
                None => Err(BridgeError::OperationFailed("HTTP 403 Forbidden".to_string())),
            }
        }
    }

    #[test]
    fn test_connect_failure_is_network_error() {
        let opener = HttpStreamOpener::new(Arc::new(FixedConnector(None)));
        let result = opener.open("https://cdn.example/x", &StreamingConfig::default());
        match result {
            Err(PlaybackError::Network(message)) => assert!(message.contains("403")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_unrecognized_payload_is_format_error() {
        let opener = HttpStreamOpener::new(Arc::new(FixedConnector(Some(vec![0u8; 256]))));
        let result = opener.open("https://cdn.example/x", &StreamingConfig::default());
        assert!(matches!(result, Err(PlaybackError::InvalidFormat(_))));
    }
}
