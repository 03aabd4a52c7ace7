use super::super::audio_pipe::*;
use super::*;
use songbird::input::{Codec, Container, Input, Reader};
use songbird::{Call, CoreEvent, Event, EventContext, EventHandler as VoiceEventHandler};
use std::io::Read;
use std::sync::{Arc, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch, Mutex};

/// Frames queued in front of the mixer, about 80 ms of audio.
const TRACK_FEED_DEPTH: usize = 4;

struct FrameReader {
    frames: mpsc::Receiver<Frame>,
    pending: Vec<u8>,
    offset: usize,
}

impl FrameReader {
    fn new(frames: mpsc::Receiver<Frame>) -> Self {
        Self {
            frames,
            pending: vec![],
            offset: 0,
        }
    }
}

// Read by the songbird mixer thread, outside of the async runtime.
impl Read for FrameReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.offset >= self.pending.len() {
            let Some(frame) = self.frames.blocking_recv() else {
                return Ok(0);
            };
            self.pending = frame.into_bytes();
            self.offset = 0;
        }
        let available = &self.pending[self.offset..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.offset += count;
        Ok(count)
    }
}

// Required by songbird's `MediaSource`; the live stream cannot seek.
impl std::io::Seek for FrameReader {
    fn seek(&mut self, _pos: std::io::SeekFrom) -> std::io::Result<u64> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "source does not support seeking",
        ))
    }
}

impl songbird::input::reader::MediaSource for FrameReader {
    fn is_seekable(&self) -> bool {
        false
    }

    fn byte_len(&self) -> Option<u64> {
        None
    }
}

/// Channel feeding the current track. Once the driver disconnects the feed
/// refuses every frame, including sends already waiting for capacity.
struct TrackFeed {
    frames: std::sync::Mutex<Option<mpsc::Sender<Frame>>>,
    disconnected: watch::Sender<bool>,
}

impl TrackFeed {
    fn new() -> Self {
        let (disconnected, _) = watch::channel(false);
        Self {
            frames: std::sync::Mutex::new(None),
            disconnected,
        }
    }

    fn frames(&self) -> MutexGuard<'_, Option<mpsc::Sender<Frame>>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_disconnected(&self) -> bool {
        *self.disconnected.borrow()
    }

    fn open(&self) -> Result<mpsc::Receiver<Frame>, TransportError> {
        if self.is_disconnected() {
            return Err(TransportError::Closed);
        }
        let (sender, receiver) = mpsc::channel(TRACK_FEED_DEPTH);
        *self.frames() = Some(sender);
        Ok(receiver)
    }

    fn close(&self) {
        self.frames().take();
    }

    fn disconnect(&self) {
        self.disconnected.send_replace(true);
        self.close();
    }

    async fn send(&self, frame: Frame) -> Result<(), TransportError> {
        if self.is_disconnected() {
            return Err(TransportError::Closed);
        }
        let Some(sender) = self.frames().clone() else {
            return Err(TransportError::NotSpeaking);
        };
        let mut disconnected = self.disconnected.subscribe();
        tokio::select! {
            biased;
            _ = disconnected.wait_for(|disconnected| *disconnected) => Err(TransportError::Closed),
            sent = sender.send(frame) => sent.map_err(|_| TransportError::Closed),
        }
    }
}

struct DisconnectWatcher(Arc<TrackFeed>);

#[async_trait]
impl VoiceEventHandler for DisconnectWatcher {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let EventContext::DriverDisconnect(data) = ctx else {
            return None;
        };
        warn!(
            "Voice driver disconnected in {:?} from {:?}: {:?}.",
            data.guild_id, data.channel_id, data.reason
        );
        self.0.disconnect();
        Some(Event::Cancel)
    }
}

pub struct SongbirdTransport {
    call: Arc<Mutex<Call>>,
    feed: Arc<TrackFeed>,
}

impl SongbirdTransport {
    /// Subscribes to driver disconnects, so a lost connection fails pending
    /// frames instead of leaving them waiting on a mixer that stopped reading.
    pub async fn attach(call: Arc<Mutex<Call>>) -> Self {
        let feed = Arc::new(TrackFeed::new());
        call.lock().await.add_global_event(
            CoreEvent::DriverDisconnect.into(),
            DisconnectWatcher(feed.clone()),
        );
        Self { call, feed }
    }
}

#[async_trait]
impl VoiceTransport for SongbirdTransport {
    async fn set_speaking(&self, speaking: bool) -> Result<(), TransportError> {
        if !speaking {
            // The track plays out what is buffered and ends on the closed channel.
            self.feed.close();
            return Ok(());
        }
        let mut call = self.call.lock().await;
        if call.current_connection().is_none() {
            return Err(TransportError::Closed);
        }
        let receiver = self.feed.open()?;
        call.play_only_source(Input::new(
            true,
            Reader::Extension(Box::new(FrameReader::new(receiver))),
            Codec::Pcm,
            Container::Raw,
            None,
        ));
        Ok(())
    }

    async fn send_frame(&self, frame: Frame) -> Result<(), TransportError> {
        self.feed.send(frame).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(fill: u8) -> Frame {
        Frame::from_bytes(vec![fill; FRAME_BYTES]).unwrap()
    }

    #[test]
    fn reader_yields_frames_in_order_then_ends() {
        let (sender, receiver) = mpsc::channel(4);
        sender.try_send(frame(1)).unwrap();
        sender.try_send(frame(2)).unwrap();
        drop(sender);
        let mut reader = FrameReader::new(receiver);
        let mut bytes = vec![];
        reader.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 2 * FRAME_BYTES);
        assert!(bytes[..FRAME_BYTES].iter().all(|b| *b == 1));
        assert!(bytes[FRAME_BYTES..].iter().all(|b| *b == 2));
    }

    #[test]
    fn reader_serves_small_reads_across_frame_boundary() {
        let (sender, receiver) = mpsc::channel(4);
        sender.try_send(frame(7)).unwrap();
        sender.try_send(frame(8)).unwrap();
        drop(sender);
        let mut reader = FrameReader::new(receiver);
        let mut buf = [0u8; 1000];
        let mut total = 0;
        let mut last = 0;
        loop {
            let read = reader.read(&mut buf).unwrap();
            if read == 0 {
                break;
            }
            total += read;
            last = buf[read - 1];
        }
        assert_eq!(total, 2 * FRAME_BYTES);
        assert_eq!(last, 8);
    }

    #[tokio::test]
    async fn disconnect_fails_send_waiting_on_full_feed() {
        let feed = Arc::new(TrackFeed::new());
        let receiver = feed.open().unwrap();
        for fill in 0..TRACK_FEED_DEPTH {
            feed.send(frame(fill as u8)).await.unwrap();
        }
        let waiting = tokio::spawn({
            let feed = feed.clone();
            async move { feed.send(frame(9)).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!waiting.is_finished());

        feed.disconnect();

        let sent = tokio::time::timeout(std::time::Duration::from_secs(5), waiting)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(sent, Err(TransportError::Closed)));
        assert!(matches!(feed.send(frame(1)).await, Err(TransportError::Closed)));
        assert!(matches!(feed.open(), Err(TransportError::Closed)));
        drop(receiver);
    }

    #[tokio::test]
    async fn closed_feed_is_not_speaking() {
        let feed = TrackFeed::new();
        assert!(matches!(
            feed.send(frame(1)).await,
            Err(TransportError::NotSpeaking)
        ));
        let receiver = feed.open().unwrap();
        feed.send(frame(2)).await.unwrap();
        feed.close();
        assert!(matches!(
            feed.send(frame(3)).await,
            Err(TransportError::NotSpeaking)
        ));
        drop(receiver);
    }
}
