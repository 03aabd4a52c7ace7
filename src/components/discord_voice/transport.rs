use super::super::audio_pipe::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("voice connection is closed")]
    Closed,
    #[error("voice connection is not speaking")]
    NotSpeaking,
}

/// Push side of a live voice connection. Frames are only accepted between
/// `set_speaking(true)` and `set_speaking(false)`.
#[async_trait]
pub trait VoiceTransport: Send + Sync + 'static {
    async fn set_speaking(&self, speaking: bool) -> Result<(), TransportError>;
    async fn send_frame(&self, frame: Frame) -> Result<(), TransportError>;
}
