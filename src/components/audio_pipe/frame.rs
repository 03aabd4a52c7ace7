pub const SAMPLE_RATE: u32 = 48_000;
pub const CHANNELS: usize = 2;
pub const SAMPLES_PER_CHANNEL: usize = 960;
pub const BYTES_PER_SAMPLE: usize = 2;
pub const FRAME_BYTES: usize = SAMPLES_PER_CHANNEL * CHANNELS * BYTES_PER_SAMPLE;

/// 20ms of s16le stereo PCM at 48kHz.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame(pub(super) Vec<u8>);

impl Frame {
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        if bytes.len() != FRAME_BYTES {
            return None;
        }
        Some(Self(bytes))
    }
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.0
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame({} bytes)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_size_matches_twenty_millis_of_stereo_pcm() {
        assert_eq!(FRAME_BYTES, 3840);
        assert_eq!(SAMPLES_PER_CHANNEL as u32 * 1000 / SAMPLE_RATE, 20);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Frame::from_bytes(vec![0; FRAME_BYTES - 1]).is_none());
        assert!(Frame::from_bytes(vec![0; FRAME_BYTES + 1]).is_none());
        assert!(Frame::from_bytes(vec![0; FRAME_BYTES]).is_some());
    }

    #[test]
    fn samples_are_little_endian() {
        let mut bytes = vec![0; FRAME_BYTES];
        bytes[0] = 0x34;
        bytes[1] = 0x12;
        bytes[2] = 0xff;
        bytes[3] = 0xff;
        let frame = Frame::from_bytes(bytes).unwrap();
        let samples: Vec<i16> = frame.samples().take(2).collect();
        assert_eq!(samples, vec![0x1234, -1]);
        assert_eq!(frame.samples().count(), SAMPLES_PER_CHANNEL * CHANNELS);
    }
}
