//! # Format Detection
//!
//! Builds probe hints from what the server and the URL say about a stream,
//! and maps Symphonia codec ids onto [`AudioCodec`].

use crate::error::{PlaybackError, Result};
use crate::traits::AudioCodec;
use symphonia::core::codecs::CodecType;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

pub struct FormatDetector;

impl FormatDetector {
    /// Creates a probe hint from a `Content-Type` value and the media URL.
    ///
    /// Signed media URLs rarely end in an extension, but often carry the
    /// MIME type as a `mime=` query parameter.
    pub fn hint_for(content_type: Option<&str>, url: &str) -> Hint {
        let mut hint = Hint::new();

        let mime = content_type
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty() && value != "application/octet-stream")
            .or_else(|| Self::mime_from_url(url));

        if let Some(mime) = mime {
            debug!(mime = %mime, "Setting probe hint MIME type");
            hint.mime_type(&mime);
            if let Some(extension) = Self::extension_for_mime(&mime) {
                hint.with_extension(extension);
            }
        } else if let Some(extension) = Self::extension_from_url(url) {
            debug!(extension = %extension, "Setting probe hint extension");
            hint.with_extension(&extension);
        } else {
            debug!("No format hint available, probe will auto-detect");
        }

        hint
    }

    fn extension_for_mime(mime: &str) -> Option<&'static str> {
        match mime {
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" | "audio/aac" => Some("m4a"),
            "audio/webm" | "video/webm" => Some("webm"),
            "audio/mpeg" | "audio/mp3" => Some("mp3"),
            "audio/ogg" | "application/ogg" => Some("ogg"),
            "audio/flac" | "audio/x-flac" => Some("flac"),
            "audio/wav" | "audio/x-wav" | "audio/wave" => Some("wav"),
            _ => None,
        }
    }

    fn mime_from_url(url: &str) -> Option<String> {
        let (_, query) = url.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "mime")
            .map(|(_, value)| value.replace("%2F", "/").replace("%2f", "/").to_ascii_lowercase())
    }

    fn extension_from_url(url: &str) -> Option<String> {
        let path = url.split(['?', '#']).next()?;
        let file = path.rsplit('/').next()?;
        let (_, extension) = file.rsplit_once('.')?;
        (!extension.is_empty() && extension.len() <= 4).then(|| extension.to_ascii_lowercase())
    }

    pub fn detect_codec(codec_type: CodecType) -> AudioCodec {
        use symphonia::core::codecs::*;

        if codec_type == CODEC_TYPE_MP3 {
            AudioCodec::Mp3
        } else if codec_type == CODEC_TYPE_AAC {
            AudioCodec::Aac
        } else if codec_type == CODEC_TYPE_FLAC {
            AudioCodec::Flac
        } else if codec_type == CODEC_TYPE_VORBIS {
            AudioCodec::Vorbis
        } else if codec_type == CODEC_TYPE_OPUS {
            AudioCodec::Opus
        } else if codec_type == CODEC_TYPE_ALAC {
            AudioCodec::Alac
        } else if codec_type == CODEC_TYPE_PCM_S16LE
            || codec_type == CODEC_TYPE_PCM_S16BE
            || codec_type == CODEC_TYPE_PCM_S24LE
            || codec_type == CODEC_TYPE_PCM_S24BE
            || codec_type == CODEC_TYPE_PCM_S32LE
            || codec_type == CODEC_TYPE_PCM_S32BE
            || codec_type == CODEC_TYPE_PCM_F32LE
            || codec_type == CODEC_TYPE_PCM_F32BE
            || codec_type == CODEC_TYPE_PCM_F64LE
            || codec_type == CODEC_TYPE_PCM_F64BE
        {
            AudioCodec::Pcm
        } else {
            warn!(codec = ?codec_type, "Unknown codec type");
            AudioCodec::Unknown
        }
    }

    /// Rejects codecs the decoder registry cannot handle, with a message
    /// that names the fix.
    pub fn validate_codec_support(codec: &AudioCodec) -> Result<()> {
        match codec {
            AudioCodec::Opus => Err(PlaybackError::UnsupportedCodec(
                "Opus streams cannot be decoded; request an AAC/M4A format instead".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
