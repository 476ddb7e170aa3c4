//! # PCM Conversion
//!
//! Wire samples arrive as arbitrary JSON integers; the speaker wants 16-bit
//! signed little-endian PCM. Out-of-range values saturate instead of wrapping.

use byteorder::{LittleEndian, WriteBytesExt};

/// Saturate an integer into the `i16` range.
pub fn clamp_sample(sample: i64) -> i16 {
    sample.clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

/// Clamp each sample and serialize it as 16-bit little-endian PCM.
///
/// ## Example:
/// `[100, 40000]` becomes `[0x64, 0x00, 0xFF, 0x7F]`.
pub fn encode_samples(samples: &[i64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        // Writing into a Vec cannot fail
        let _ = bytes.write_i16::<LittleEndian>(clamp_sample(sample));
    }
    bytes
}

/// Synthesize a sine tone as 16-bit little-endian PCM.
///
/// Used as the audible stand-in for compressed payloads, which are not decoded.
pub fn synth_tone(frequency_hz: f32, duration_ms: u32, sample_rate: u32, amplitude: f32) -> Vec<u8> {
    let sample_count = (sample_rate as u64 * duration_ms as u64 / 1000) as usize;
    let mut bytes = Vec::with_capacity(sample_count * 2);
    for i in 0..sample_count {
        let t = i as f32 / sample_rate as f32;
        let value = amplitude * (2.0 * std::f32::consts::PI * frequency_hz * t).sin();
        let _ = bytes.write_i16::<LittleEndian>(value as i16);
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_sample() {
        assert_eq!(clamp_sample(40000), 32767);
        assert_eq!(clamp_sample(-40000), -32768);
        assert_eq!(clamp_sample(-200), -200);
    }

    #[test]
    fn test_encode_samples_little_endian() {
        let bytes = encode_samples(&[100, -200, 32767, -32768, 40000]);
        let mut expected = Vec::new();
        for s in [100i16, -200, 32767, -32768, 32767] {
            expected.extend_from_slice(&s.to_le_bytes());
        }
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_synth_tone_length_and_range() {
        let bytes = synth_tone(440.0, 100, 16000, 16000.0);
        assert_eq!(bytes.len(), 1600 * 2);
        // first sample of a sine is zero
        assert_eq!(&bytes[..2], &[0, 0]);
        let peak = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]).unsigned_abs())
            .max()
            .unwrap();
        assert!(peak > 15000 && peak <= 16000);
    }
}
