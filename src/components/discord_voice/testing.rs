use super::super::audio_pipe::*;
use super::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct RecordingTransport {
    pub frames: Mutex<Vec<Frame>>,
    pub speaking: Mutex<Vec<bool>>,
    pub send_delay: Option<Duration>,
    pub close_after: Option<usize>,
    closed: AtomicBool,
}

impl RecordingTransport {
    pub fn slow(send_delay: Duration) -> Self {
        Self {
            send_delay: Some(send_delay),
            ..Default::default()
        }
    }
    pub fn closing_after(frames: usize) -> Self {
        Self {
            close_after: Some(frames),
            ..Default::default()
        }
    }
    pub fn speaking_events(&self) -> Vec<bool> {
        self.speaking.lock().unwrap().clone()
    }
    pub fn labels(&self) -> Vec<String> {
        self.frames
            .lock()
            .unwrap()
            .iter()
            .map(frame_label)
            .collect()
    }
}

#[async_trait]
impl VoiceTransport for RecordingTransport {
    async fn set_speaking(&self, speaking: bool) -> Result<(), TransportError> {
        self.speaking.lock().unwrap().push(speaking);
        Ok(())
    }
    async fn send_frame(&self, frame: Frame) -> Result<(), TransportError> {
        if let Some(send_delay) = self.send_delay {
            tokio::time::sleep(send_delay).await;
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        let mut frames = self.frames.lock().unwrap();
        if self.close_after == Some(frames.len()) {
            self.closed.store(true, Ordering::SeqCst);
            return Err(TransportError::Closed);
        }
        frames.push(frame);
        Ok(())
    }
}

pub const LABEL_BYTES: usize = 5;

/// Shell script writing `count` frames, each starting with `tag` and a
/// four digit sequence number.
pub fn labeled_frames_script(tag: char, count: usize) -> String {
    format!(
        "i=1; while [ $i -le {count} ]; do printf '{tag}%04d' $i; head -c {padding} /dev/zero; i=$((i+1)); done",
        count = count,
        tag = tag,
        padding = FRAME_BYTES - LABEL_BYTES,
    )
}

pub fn frame_label(frame: &Frame) -> String {
    String::from_utf8_lossy(&frame.as_bytes()[..LABEL_BYTES]).to_string()
}

pub fn expected_labels(tag: char, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{}{:04}", tag, i)).collect()
}

pub fn shell_pipe(script: &str) -> FramePipeConfiguration {
    FramePipeConfiguration {
        extractor: ProcessTemplate::new("sh", &["-c", script, "extractor", URL_PLACEHOLDER]),
        transcoder: ProcessTemplate::new("cat", &[]),
    }
}

pub async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..500 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
