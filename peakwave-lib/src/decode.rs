//! Asynchronous decoding of fetched bytes into [`DecodedAudio`].

use std::io::Cursor;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::DecodedAudio;
use crate::error::{Result, WaveError};

/// Decode an in-memory encoded asset.
///
/// Packets that fail to decode are skipped with a warning; a stream that
/// cannot be probed, or that produces no samples at all, is an error.
///
/// # Errors
/// Returns [`WaveError::Decode`] if the format is unrecognized, has no audio
/// track, or the decoder needs a reset mid-stream.
pub fn decode_bytes(bytes: Vec<u8>) -> Result<DecodedAudio> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let probed = symphonia::default::get_probe().format(
        &Hint::new(),
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| WaveError::Decode("no audio tracks found".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut channels: Vec<Vec<f32>> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(Error::ResetRequired) => {
                return Err(WaveError::Decode(
                    "decoder reset required while decoding".to_string(),
                ));
            }
            Err(err) => return Err(err.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let count = spec.channels.count().max(1);
                if channels.is_empty() {
                    channels = vec![Vec::new(); count];
                }
                if sample_rate.is_none() {
                    sample_rate = Some(spec.rate);
                }

                let frames = decoded.frames();
                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_planar_ref(decoded);
                let samples = buffer.samples();
                for (index, channel) in channels.iter_mut().enumerate().take(count) {
                    let start = index * frames;
                    channel.extend_from_slice(&samples[start..start + frames]);
                }
            }
            Err(Error::DecodeError(err)) => {
                warn!("skipping undecodable packet: {}", err);
            }
            Err(err) => return Err(err.into()),
        }
    }

    let sample_rate =
        sample_rate.ok_or_else(|| WaveError::Decode("missing sample rate".to_string()))?;
    if channels.is_empty() {
        return Err(WaveError::Decode("stream produced no audio".to_string()));
    }

    let audio = DecodedAudio::new(sample_rate, channels)?;
    debug!(
        "decoded {} channel(s), {} frames at {} Hz",
        audio.channel_count(),
        audio.frames(),
        audio.sample_rate()
    );
    Ok(audio)
}

/// Result delivered by a decode worker.
#[derive(Debug)]
pub enum DecodeReport {
    Decoded(DecodedAudio),
    Failed(WaveError),
    /// The fetched content had no bytes; nothing was decoded.
    Empty,
}

/// Handle to an in-flight decode.
///
/// Tagged with the generation of the load that started it, so a result that
/// arrives after a newer load or a teardown can be recognized and dropped.
#[derive(Debug)]
pub struct PendingLoad {
    generation: u64,
    receiver: Receiver<DecodeReport>,
    handle: Option<JoinHandle<()>>,
    finished: bool,
}

impl PendingLoad {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a report has already been taken from this handle.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Take the report if the worker has delivered it.
    pub fn try_report(&mut self) -> Option<DecodeReport> {
        if self.finished {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(report) => Some(self.finish(report)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.finish(DecodeReport::Failed(
                WaveError::Decode("decode worker exited without a result".to_string()),
            ))),
        }
    }

    /// Block until the worker delivers its report.
    pub fn wait_report(&mut self) -> DecodeReport {
        if self.finished {
            return DecodeReport::Failed(WaveError::InvalidState(
                "decode result already taken".to_string(),
            ));
        }
        let report = self.receiver.recv().unwrap_or_else(|_| {
            DecodeReport::Failed(WaveError::Decode(
                "decode worker exited without a result".to_string(),
            ))
        });
        self.finish(report)
    }

    fn finish(&mut self, report: DecodeReport) -> DecodeReport {
        self.finished = true;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("decode worker panicked");
            }
        }
        report
    }
}

/// Decode `bytes` on a worker thread.
///
/// Empty input is reported as [`DecodeReport::Empty`] without spawning.
pub fn spawn_decode(bytes: Vec<u8>, generation: u64) -> PendingLoad {
    let (sender, receiver) = mpsc::channel();

    if bytes.is_empty() {
        let _ = sender.send(DecodeReport::Empty);
        return PendingLoad {
            generation,
            receiver,
            handle: None,
            finished: false,
        };
    }

    let handle = thread::spawn(move || {
        let report = match decode_bytes(bytes) {
            Ok(audio) => DecodeReport::Decoded(audio),
            Err(err) => DecodeReport::Failed(err),
        };
        let _ = sender.send(report);
    });

    PendingLoad {
        generation,
        receiver,
        handle: Some(handle),
        finished: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data;

    fn wav_bytes(rate: u32, channels: u16, frames: usize) -> Vec<u8> {
        test_data::wav_bytes(rate, channels, frames, |frame, channel| {
            match (frame % 2, channel) {
                (0, 0) => 0.5,
                (0, _) => -0.5,
                _ => 0.0,
            }
        })
    }

    #[test]
    fn decodes_pcm_wav_into_planar_channels() {
        let audio = decode_bytes(wav_bytes(8_000, 2, 8_000)).unwrap();
        assert_eq!(audio.sample_rate(), 8_000);
        assert_eq!(audio.channel_count(), 2);
        assert_eq!(audio.frames(), 8_000);
        assert!((audio.duration() - 1.0).abs() < 1e-9);

        let left = audio.channel(0).unwrap();
        let right = audio.channel(1).unwrap();
        assert!((left[0] - 0.5).abs() < 1e-3);
        assert!((right[0] + 0.5).abs() < 1e-3);
        assert_eq!(left[1], 0.0);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let result = decode_bytes(vec![0x13; 2_048]);
        assert!(matches!(result, Err(WaveError::Decode(_))));
    }

    #[test]
    fn worker_reports_through_the_handle() {
        let mut pending = spawn_decode(wav_bytes(8_000, 1, 800), 7);
        assert_eq!(pending.generation(), 7);
        match pending.wait_report() {
            DecodeReport::Decoded(audio) => assert_eq!(audio.frames(), 800),
            other => panic!("unexpected report: {:?}", other),
        }
        assert!(pending.is_finished());
        assert!(pending.try_report().is_none());
    }

    #[test]
    fn empty_bytes_report_empty() {
        let mut pending = spawn_decode(Vec::new(), 1);
        assert!(matches!(pending.try_report(), Some(DecodeReport::Empty)));
    }
}
