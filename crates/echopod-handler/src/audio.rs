use std::io::Cursor;

use crate::model::Waveform;

/// Encode a waveform as a 32-bit float mono WAV byte stream
pub fn encode_wav(waveform: &Waveform) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
    for &sample in &waveform.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_wav_decodes_back() {
        let waveform = Waveform {
            samples: vec![0.0, 0.5, -0.5, 0.999],
            sample_rate: 44_100,
        };

        let bytes = encode_wav(&waveform).unwrap();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);

        let decoded: Vec<f32> = reader.into_samples::<f32>().map(Result::unwrap).collect();
        assert_eq!(decoded, waveform.samples);
    }

    #[test]
    fn empty_waveform_is_a_valid_wav() {
        let waveform = Waveform {
            samples: Vec::new(),
            sample_rate: 44_100,
        };
        let bytes = encode_wav(&waveform).unwrap();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.len(), 0);
    }
}
