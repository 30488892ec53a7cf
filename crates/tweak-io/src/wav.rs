//! WAV encoding, decoding and file helpers.
//!
//! [`encode`] produces the canonical 16-bit PCM RIFF/WAVE stream used for
//! exports: interleaved frames, samples clamped to `[-1, 1]`, negative values
//! scaled by 32768 and positive values by 32767, then truncated toward zero.
//! [`encode_with`] adds 24-bit PCM and 32-bit float output.

use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};
use tweak_core::AudioBuffer;

use crate::Result;

/// Output sample format for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WavFormat {
    /// 16-bit signed integer PCM.
    #[default]
    Pcm16,
    /// 24-bit signed integer PCM.
    Pcm24,
    /// 32-bit IEEE float.
    Float32,
}

impl WavFormat {
    /// Format for a bit depth of 16, 24 or 32.
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            16 => Some(Self::Pcm16),
            24 => Some(Self::Pcm24),
            32 => Some(Self::Float32),
            _ => None,
        }
    }

    /// Bits per sample.
    pub fn bits_per_sample(self) -> u16 {
        match self {
            Self::Pcm16 => 16,
            Self::Pcm24 => 24,
            Self::Float32 => 32,
        }
    }

    fn spec(self, buffer: &AudioBuffer) -> hound::WavSpec {
        hound::WavSpec {
            channels: buffer.channel_count() as u16,
            sample_rate: buffer.sample_rate(),
            bits_per_sample: self.bits_per_sample(),
            sample_format: match self {
                Self::Float32 => SampleFormat::Float,
                Self::Pcm16 | Self::Pcm24 => SampleFormat::Int,
            },
        }
    }
}

/// How samples are stored in a WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Sample encoding.
    pub encoding: SampleEncoding,
}

/// Encodes `buffer` as 16-bit PCM WAV bytes.
pub fn encode(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    encode_with(buffer, WavFormat::Pcm16)
}

/// Encodes `buffer` as WAV bytes in the given format.
pub fn encode_with(buffer: &AudioBuffer, format: WavFormat) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    write_buffer(&mut cursor, buffer, format)?;
    Ok(cursor.into_inner())
}

/// Decodes WAV bytes into a buffer, keeping every channel.
///
/// Integer samples are scaled by `2^(bits - 1)` into `[-1, 1)`.
pub fn decode(bytes: &[u8]) -> Result<AudioBuffer> {
    read_buffer(WavReader::new(Cursor::new(bytes))?)
}

/// Reads a WAV file into a buffer, keeping every channel.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    read_buffer(WavReader::open(path)?)
}

/// Writes `buffer` to a WAV file in the given format.
pub fn write_wav<P: AsRef<Path>>(path: P, buffer: &AudioBuffer, format: WavFormat) -> Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_buffer(&mut file, buffer, format)?;
    file.flush()?;
    Ok(())
}

/// Reads WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.duration());
    let duration_secs = num_frames as f64 / f64::from(spec.sample_rate);

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs,
        encoding: match spec.sample_format {
            SampleFormat::Float => SampleEncoding::IeeeFloat,
            SampleFormat::Int => SampleEncoding::Pcm,
        },
    })
}

fn read_buffer<R: Read>(reader: WavReader<R>) -> Result<AudioBuffer> {
    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };
    Ok(AudioBuffer::from_interleaved(
        &samples,
        usize::from(spec.channels),
        spec.sample_rate,
    )?)
}

fn write_buffer<W: Write + Seek>(
    sink: W,
    buffer: &AudioBuffer,
    format: WavFormat,
) -> Result<()> {
    let mut writer = WavWriter::new(sink, format.spec(buffer))?;
    for frame in 0..buffer.frame_count() {
        for channel in buffer.channels() {
            let s = channel[frame];
            match format {
                WavFormat::Pcm16 => writer.write_sample(pcm16(s))?,
                WavFormat::Pcm24 => writer.write_sample(pcm24(s))?,
                WavFormat::Float32 => writer.write_sample(s)?,
            }
        }
    }
    writer.finalize()?;
    Ok(())
}

/// Clamp, then scale asymmetrically so -1.0 maps to `i16::MIN` and 1.0 to `i16::MAX`.
fn pcm16(s: f32) -> i16 {
    let s = s.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

fn pcm24(s: f32) -> i32 {
    let s = f64::from(s.clamp(-1.0, 1.0));
    if s < 0.0 {
        (s * 8_388_608.0) as i32
    } else {
        (s * 8_388_607.0) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn ramp(frames: usize, channels: usize) -> AudioBuffer {
        let data = (0..channels)
            .map(|c| {
                (0..frames)
                    .map(|i| (((i + c * 13) % frames) as f32 / frames as f32) * 2.0 - 1.0)
                    .collect()
            })
            .collect();
        AudioBuffer::new(data, 22050).unwrap()
    }

    #[test]
    fn pcm16_scaling_is_asymmetric() {
        assert_eq!(pcm16(-1.0), i16::MIN);
        assert_eq!(pcm16(1.0), i16::MAX);
        assert_eq!(pcm16(0.0), 0);
        assert_eq!(pcm16(2.0), i16::MAX);
        assert_eq!(pcm16(-7.0), i16::MIN);
        // Truncation toward zero.
        assert_eq!(pcm16(0.5), 16383);
        assert_eq!(pcm16(-0.5), -16384);
        assert_eq!(pcm16(f32::NAN), 0);
    }

    #[test]
    fn pcm24_scaling_is_asymmetric() {
        assert_eq!(pcm24(-1.0), -8_388_608);
        assert_eq!(pcm24(1.0), 8_388_607);
    }

    #[test]
    fn encode_writes_canonical_header() {
        let buffer = ramp(100, 2);
        let bytes = encode(&buffer).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // 44-byte header plus 100 frames * 2 channels * 2 bytes.
        assert_eq!(bytes.len(), 44 + 400);
        let riff_len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        assert_eq!(riff_len as usize, bytes.len() - 8);
    }

    #[test]
    fn encode_is_deterministic() {
        let buffer = ramp(256, 1);
        assert_eq!(encode(&buffer).unwrap(), encode(&buffer).unwrap());
    }

    #[test]
    fn roundtrip_pcm16_within_quantization() {
        let buffer = ramp(1000, 2);
        let decoded = decode(&encode(&buffer).unwrap()).unwrap();
        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.sample_rate(), 22050);
        assert_eq!(decoded.frame_count(), 1000);
        for (a, b) in buffer.channels().iter().zip(decoded.channels()) {
            for (x, y) in a.iter().zip(b) {
                assert!((x - y).abs() < 1.0 / 16384.0, "{x} vs {y}");
            }
        }
    }

    #[test]
    fn roundtrip_float32_is_exact() {
        let buffer = ramp(300, 3);
        let decoded = decode(&encode_with(&buffer, WavFormat::Float32).unwrap()).unwrap();
        assert_eq!(decoded, buffer);
    }

    #[test]
    fn empty_buffer_encodes() {
        let buffer = AudioBuffer::silent(2, 0, 48000).unwrap();
        let decoded = decode(&encode(&buffer).unwrap()).unwrap();
        assert_eq!(decoded.frame_count(), 0);
        assert_eq!(decoded.channel_count(), 2);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(decode(b"not a wav file"), Err(crate::Error::Wav(_))));
    }

    #[test]
    fn file_roundtrip_and_info() {
        let buffer = ramp(2205, 2);
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &buffer, WavFormat::Pcm24).unwrap();

        let info = read_wav_info(file.path()).unwrap();
        assert_eq!(info.channels, 2);
        assert_eq!(info.sample_rate, 22050);
        assert_eq!(info.bits_per_sample, 24);
        assert_eq!(info.num_frames, 2205);
        assert_eq!(info.encoding, SampleEncoding::Pcm);
        assert!((info.duration_secs - 0.1).abs() < 1e-9);

        let loaded = read_wav(file.path()).unwrap();
        assert_eq!(loaded.frame_count(), 2205);
        for (a, b) in buffer.channels().iter().zip(loaded.channels()) {
            for (x, y) in a.iter().zip(b) {
                assert!((x - y).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn bit_depths() {
        assert_eq!(WavFormat::from_bits(16), Some(WavFormat::Pcm16));
        assert_eq!(WavFormat::from_bits(24), Some(WavFormat::Pcm24));
        assert_eq!(WavFormat::from_bits(32), Some(WavFormat::Float32));
        assert_eq!(WavFormat::from_bits(8), None);
        assert_eq!(WavFormat::default().bits_per_sample(), 16);
    }
}
