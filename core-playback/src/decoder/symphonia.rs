//! # Symphonia Decoder
//!
//! [`AudioDecoder`] over a remote byte stream. Probing, demuxing and decoding
//! are delegated to Symphonia; this type selects the audio track, keeps the
//! output layout fixed and turns Symphonia's error model into
//! [`PlaybackError`]s.
//!
//! Corrupt packets are skipped rather than ending the stream, up to
//! [`StreamingConfig::max_consecutive_decode_errors`] in a row.

use crate::config::StreamingConfig;
use crate::decoder::format_detector::FormatDetector;
use crate::decoder::sample_converter::{clamp_samples, SampleConverter};
use crate::error::{PlaybackError, Result};
use crate::source::RemoteMediaSource;
use crate::traits::{AudioDecoder, AudioFormat};
use bridge_traits::stream::RemoteByteStream;
use core_runtime::logging::redact_url;
use std::io::ErrorKind as IoErrorKind;
use std::time::Duration;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::units::{Time, TimeBase};
use tracing::{debug, info, instrument, trace, warn};

pub struct SymphoniaDecoder {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    converter: SampleConverter,
    track_id: u32,
    time_base: Option<TimeBase>,
    format: AudioFormat,
    duration: Option<Duration>,
    /// Audio decoded while discovering the channel layout, served first.
    pending: Option<Vec<f32>>,
    consecutive_errors: usize,
    max_consecutive_errors: usize,
    eof: bool,
}

impl SymphoniaDecoder {
    /// Probes `stream` and prepares the first decodable audio track.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::InvalidFormat`] if the container is not recognized
    ///   or lacks a sample rate
    /// - [`PlaybackError::NoAudioTrack`] if no track carries a known codec
    /// - [`PlaybackError::UnsupportedCodec`] if the codec has no decoder
    #[instrument(skip(stream, url, config), fields(url = %redact_url(url)))]
    pub fn open(
        stream: Box<dyn RemoteByteStream>,
        url: &str,
        config: &StreamingConfig,
    ) -> Result<Self> {
        let hint = FormatDetector::hint_for(stream.content_type(), url);
        let source = RemoteMediaSource::new(stream);
        let mss = MediaSourceStream::new(Box::new(source), Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| PlaybackError::InvalidFormat(format!("Failed to probe stream: {e}")))?;
        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(PlaybackError::NoAudioTrack)?;

        let codec = FormatDetector::detect_codec(track.codec_params.codec);
        FormatDetector::validate_codec_support(&codec)?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| PlaybackError::InvalidFormat("Missing sample rate".to_string()))?;
        let declared_channels = track.codec_params.channels.map(|ch| ch.count() as u16);
        let duration = track
            .codec_params
            .n_frames
            .map(|frames| Duration::from_secs_f64(frames as f64 / sample_rate as f64));

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| PlaybackError::UnsupportedCodec(format!("{codec:?}: {e}")))?;

        let mut this = Self {
            track_id: track.id,
            time_base: track.codec_params.time_base,
            format_reader,
            decoder,
            converter: SampleConverter::new(),
            format: AudioFormat::new(codec, sample_rate, declared_channels.unwrap_or(2)),
            duration,
            pending: None,
            consecutive_errors: 0,
            max_consecutive_errors: config.max_consecutive_decode_errors.max(1),
            eof: false,
        };

        // Some containers (AAC in MP4 in particular) only reveal the channel
        // layout once a packet is decoded.
        if declared_channels.is_none() {
            this.discover_channels()?;
        }

        info!(
            codec = ?this.format.codec,
            sample_rate = this.format.sample_rate,
            channels = this.format.channels,
            duration = ?this.duration,
            "Decoder ready"
        );
        Ok(this)
    }

    fn discover_channels(&mut self) -> Result<()> {
        while let Some(packet) = self.next_packet()? {
            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let channels = decoded.spec().channels.count() as u16;
                    let samples = self.converter.to_interleaved_f32(decoded);
                    if samples.is_empty() {
                        continue;
                    }
                    debug!(channels, "Channel layout discovered from first packet");
                    self.format.channels = channels.max(1);
                    self.pending = Some(samples);
                    return Ok(());
                }
                Err(e) => self.note_decode_error(e)?,
            }
        }
        Ok(())
    }

    /// Next packet of the selected track, `None` at end of stream.
    fn next_packet(&mut self) -> Result<Option<symphonia::core::formats::Packet>> {
        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == IoErrorKind::UnexpectedEof => {
                    debug!("End of stream");
                    self.eof = true;
                    return Ok(None);
                }
                Err(SymphoniaError::IoError(e)) => {
                    return Err(PlaybackError::Network(format!("Stream read failed: {e}")));
                }
                Err(SymphoniaError::ResetRequired) => {
                    return Err(PlaybackError::DecodingError(
                        "Track list changed mid-stream".to_string(),
                    ));
                }
                Err(e) => {
                    return Err(PlaybackError::DecodingError(format!(
                        "Failed to read packet: {e}"
                    )));
                }
            };

            while !self.format_reader.metadata().is_latest() {
                self.format_reader.metadata().pop();
            }

            if packet.track_id() == self.track_id {
                return Ok(Some(packet));
            }
        }
    }

    /// Counts a skipped packet. Fails once too many were skipped in a row.
    fn note_decode_error(&mut self, err: SymphoniaError) -> Result<()> {
        match err {
            SymphoniaError::DecodeError(_) | SymphoniaError::IoError(_) => {
                self.consecutive_errors += 1;
                warn!(
                    attempt = self.consecutive_errors,
                    limit = self.max_consecutive_errors,
                    error = %err,
                    "Skipping undecodable packet"
                );
                if self.consecutive_errors >= self.max_consecutive_errors {
                    return Err(PlaybackError::DecodingError(format!(
                        "{} consecutive packets failed to decode: {err}",
                        self.consecutive_errors
                    )));
                }
                Ok(())
            }
            other => Err(PlaybackError::DecodingError(format!(
                "Failed to decode packet: {other}"
            ))),
        }
    }

    /// Fits samples decoded with `from` channels into the fixed output layout.
    fn remix(&self, samples: Vec<f32>, from: usize) -> Vec<f32> {
        let to = self.format.channels as usize;
        if from == to || from == 0 {
            return samples;
        }
        samples
            .chunks_exact(from)
            .flat_map(|frame| (0..to).map(move |ch| frame[ch.min(from - 1)]))
            .collect()
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn format(&self) -> &AudioFormat {
        &self.format
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn next_chunk(&mut self) -> Result<Option<Vec<f32>>> {
        if let Some(samples) = self.pending.take() {
            return Ok(Some(samples));
        }
        if self.eof {
            return Ok(None);
        }

        let Some(packet) = self.next_packet()? else {
            return Ok(None);
        };

        match self.decoder.decode(&packet) {
            Ok(decoded) => {
                self.consecutive_errors = 0;
                let channels = decoded.spec().channels.count();
                let samples = self.converter.to_interleaved_f32(decoded);
                let mut samples = self.remix(samples, channels);
                let clipped = clamp_samples(&mut samples);
                if clipped > 0 {
                    trace!(clipped, "Clamped out-of-range samples");
                }
                Ok(Some(samples))
            }
            Err(e) => {
                self.note_decode_error(e)?;
                Ok(Some(Vec::new()))
            }
        }
    }

    fn seek(&mut self, position: Duration) -> Result<Duration> {
        let time = Time {
            seconds: position.as_secs(),
            frac: position.subsec_nanos() as f64 / 1_000_000_000.0,
        };

        let seeked = self
            .format_reader
            .seek(
                SeekMode::Accurate,
                SeekTo::Time {
                    time,
                    track_id: Some(self.track_id),
                },
            )
            .map_err(|e| PlaybackError::SeekFailed(position, e.to_string()))?;

        self.decoder.reset();
        self.pending = None;
        self.consecutive_errors = 0;
        self.eof = false;

        let actual = self
            .time_base
            .map(|tb| {
                let t = tb.calc_time(seeked.actual_ts);
                Duration::from_secs(t.seconds) + Duration::from_secs_f64(t.frac)
            })
            .unwrap_or(position);

        debug!(requested = ?position, actual = ?actual, "Seek completed");
        Ok(actual)
    }
}
