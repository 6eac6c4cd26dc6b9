use std::io::Cursor;

use tokio::sync::mpsc;

use crate::client::{SpeechOptions, TtsClient, extract_audio};
use crate::error::{ClientError, Result};

/// Samples per chunk handed to the audio sink
pub const STREAM_CHUNK_SAMPLES: usize = 4096;

/// Consumer of decoded audio chunks, typically a local playback device
///
/// `play` runs on a blocking task so implementations may block on the
/// audio device.
pub trait AudioSink: Send + 'static {
    /// Play one chunk of mono f32 samples
    fn play(&mut self, chunk: &[f32], sample_rate: u32);
}

/// Sink that collects all chunks, for tests and silent runs
#[derive(Debug, Default)]
pub struct CollectSink {
    /// Every chunk received, in order
    pub chunks: Vec<Vec<f32>>,
    /// Sample rate reported with the first chunk
    pub sample_rate: Option<u32>,
}

impl AudioSink for CollectSink {
    fn play(&mut self, chunk: &[f32], sample_rate: u32) {
        self.sample_rate.get_or_insert(sample_rate);
        self.chunks.push(chunk.to_vec());
    }
}

impl TtsClient {
    /// Generate speech and feed the decoded audio to `sink` in chunks
    ///
    /// The submit/poll protocol is the same as [`TtsClient::generate_speech`];
    /// callers usually pair this with [`SpeechOptions::streaming`] for the
    /// faster poll interval. Once the job completes, the WAV payload is
    /// decoded into f32 samples, split into [`STREAM_CHUNK_SAMPLES`]-sample
    /// chunks, and drained through a bounded channel by a blocking task
    /// running the sink. Returns the complete WAV bytes and the sink.
    pub async fn stream_speech<S: AudioSink>(
        &self,
        text: &str,
        options: &SpeechOptions,
        mut sink: S,
    ) -> Result<(Vec<u8>, S)> {
        let input = self.build_input(text, options)?;
        let job_id = self.submit(&input).await?;

        tracing::info!(job_id, "job submitted, streaming on completion");

        let record = self.poll_until_terminal(&job_id, options).await?;
        let audio = extract_audio(&record)?;

        let (samples, sample_rate) = decode_wav_samples(&audio)?;

        let (tx, mut rx) = mpsc::channel::<Vec<f32>>(32);
        let drain = tokio::task::spawn_blocking(move || {
            while let Some(chunk) = rx.blocking_recv() {
                sink.play(&chunk, sample_rate);
            }
            sink
        });

        for chunk in samples.chunks(STREAM_CHUNK_SAMPLES) {
            if tx.send(chunk.to_vec()).await.is_err() {
                break;
            }
        }
        drop(tx);

        let sink = drain.await.map_err(|e| ClientError::Playback(e.to_string()))?;

        if let Some(path) = &options.save_path {
            tokio::fs::write(path, &audio)
                .await
                .map_err(|source| ClientError::Io { path: path.clone(), source })?;
            tracing::info!(path = %path.display(), "audio saved");
        }

        Ok((audio, sink))
    }
}

/// Decode a WAV byte stream into mono-interleaved f32 samples
///
/// Accepts both float and 16-bit integer sample formats.
pub(crate) fn decode_wav_samples(bytes: &[u8]) -> Result<(Vec<f32>, u32)> {
    let reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => reader
            .into_samples::<i16>()
            .map(|s| s.map(|v| f32::from(v) / f32::from(i16::MAX)))
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };

    Ok((samples, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn float_wav_round_trips() {
        let samples = vec![0.0f32, 0.5, -0.5, 1.0];
        let bytes = wav_bytes(&samples, 44_100);
        let (decoded, rate) = decode_wav_samples(&bytes).unwrap();
        assert_eq!(rate, 44_100);
        assert_eq!(decoded, samples);
    }

    #[test]
    fn int_wav_decodes_to_float() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        writer.write_sample(i16::MAX).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();

        let (decoded, rate) = decode_wav_samples(&cursor.into_inner()).unwrap();
        assert_eq!(rate, 22_050);
        assert!((decoded[0] - 1.0).abs() < 1e-4);
        assert!(decoded[1].abs() < 1e-6);
    }

    #[test]
    fn garbage_bytes_are_an_audio_error() {
        let err = decode_wav_samples(b"not a wav").unwrap_err();
        assert!(matches!(err, ClientError::Audio(_)));
    }

    #[test]
    fn collect_sink_preserves_chunk_order() {
        let mut sink = CollectSink::default();
        sink.play(&[0.1, 0.2], 44_100);
        sink.play(&[0.3], 44_100);
        assert_eq!(sink.chunks.len(), 2);
        assert_eq!(sink.sample_rate, Some(44_100));
        assert_eq!(sink.chunks[1], vec![0.3]);
    }
}
