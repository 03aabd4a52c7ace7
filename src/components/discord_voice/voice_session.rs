use super::super::audio_pipe::*;
use super::*;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceSessionState {
    Idle,
    Streaming,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSessionConfiguration {
    pub frames_buffer: usize,
    pub pipe: FramePipeConfiguration,
}

impl Default for VoiceSessionConfiguration {
    fn default() -> Self {
        Self {
            frames_buffer: 100,
            pipe: Default::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("source url is empty")]
    InvalidSource,
    #[error("session is already streaming")]
    Busy,
    #[error("session is closed")]
    Closed,
    #[error("pipeline start failure: {0}")]
    PipelineStart(#[source] PipeError),
    #[error("stream read failure: {0}")]
    Read(#[source] PipeError),
    #[error("stream transport failure: {0}")]
    Transport(#[source] TransportError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Finished,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamReport {
    pub end: StreamEnd,
    pub frames: usize,
    pub trailing_bytes: usize,
    pub pipe_exit: PipeExit,
}

enum Produced {
    Finished { trailing_bytes: usize },
    Failed(PipeError),
    ForwarderGone,
    Stopped,
}

enum Forwarded {
    Drained { frames: usize },
    Failed(TransportError),
    Stopped { frames: usize },
}

struct SpeakingGuard<T: VoiceTransport> {
    transport: Arc<T>,
    released: bool,
}

impl<T: VoiceTransport> SpeakingGuard<T> {
    async fn acquire(transport: Arc<T>) -> Result<Self, TransportError> {
        transport.set_speaking(true).await?;
        Ok(Self {
            transport,
            released: false,
        })
    }
    async fn release(mut self) {
        self.released = true;
        if let Err(error) = self.transport.set_speaking(false).await {
            warn!("Failed to reset speaking state: {}.", error);
        }
    }
}

impl<T: VoiceTransport> Drop for SpeakingGuard<T> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let transport = self.transport.clone();
        runtime.spawn(async move {
            _ = transport.set_speaking(false).await;
        });
    }
}

struct ForwarderTask(JoinHandle<Forwarded>);

impl Drop for ForwarderTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct StreamingState<'a> {
    state: &'a Mutex<VoiceSessionState>,
    settled: bool,
}

impl StreamingState<'_> {
    fn settle(mut self, next: VoiceSessionState) {
        self.settled = true;
        settle_state(self.state, next);
    }
}

impl Drop for StreamingState<'_> {
    fn drop(&mut self) {
        if !self.settled {
            settle_state(self.state, VoiceSessionState::Idle);
        }
    }
}

fn lock_state(state: &Mutex<VoiceSessionState>) -> MutexGuard<'_, VoiceSessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn settle_state(state: &Mutex<VoiceSessionState>, next: VoiceSessionState) {
    let mut state = lock_state(state);
    if *state != VoiceSessionState::Closed {
        *state = next;
    }
}

async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    _ = stop.wait_for(|stopped| *stopped).await;
}

/// One guild's voice connection. Streams one source at a time; `close` is
/// terminal and interrupts an active stream.
pub struct VoiceSession<T: VoiceTransport> {
    guild_id: GuildId,
    channel_id: ChannelId,
    transport: Arc<T>,
    configuration: Arc<VoiceSessionConfiguration>,
    state: Mutex<VoiceSessionState>,
    stop: watch::Sender<bool>,
}

impl<T: VoiceTransport> VoiceSession<T> {
    pub fn new(
        guild_id: GuildId,
        channel_id: ChannelId,
        transport: Arc<T>,
        configuration: Arc<VoiceSessionConfiguration>,
    ) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            guild_id,
            channel_id,
            transport,
            configuration,
            state: Mutex::new(VoiceSessionState::Idle),
            stop,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn state(&self) -> VoiceSessionState {
        *lock_state(&self.state)
    }

    /// Returns the state the session was in before closing.
    pub fn close(&self) -> VoiceSessionState {
        let previous = {
            let mut state = lock_state(&self.state);
            std::mem::replace(&mut *state, VoiceSessionState::Closed)
        };
        self.stop.send_replace(true);
        previous
    }

    fn begin(&self) -> Result<StreamingState<'_>, StreamError> {
        let mut state = lock_state(&self.state);
        match *state {
            VoiceSessionState::Idle => {
                *state = VoiceSessionState::Streaming;
                Ok(StreamingState {
                    state: &self.state,
                    settled: false,
                })
            }
            VoiceSessionState::Streaming => Err(StreamError::Busy),
            VoiceSessionState::Closed => Err(StreamError::Closed),
        }
    }

    pub async fn stream(&self, source_url: &str) -> Result<StreamReport, StreamError> {
        if source_url.trim().is_empty() {
            return Err(StreamError::InvalidSource);
        }
        let streaming_state = self.begin()?;
        let stream_uuid = Uuid::new_v4();
        info!(
            "[{}] Stream ENTER guild {}: {}.",
            stream_uuid, self.guild_id, source_url
        );
        let pipe = match FramePipe::spawn(&self.configuration.pipe, source_url) {
            Ok(pipe) => pipe,
            Err(error) => {
                warn!("[{}] Stream pipeline start failure: {}.", stream_uuid, error);
                streaming_state.settle(VoiceSessionState::Idle);
                return Err(StreamError::PipelineStart(error));
            }
        };
        self.run(streaming_state, pipe, stream_uuid).await
    }

    async fn run(
        &self,
        streaming_state: StreamingState<'_>,
        mut pipe: FramePipe,
        stream_uuid: Uuid,
    ) -> Result<StreamReport, StreamError> {
        let speaking = match SpeakingGuard::acquire(self.transport.clone()).await {
            Ok(speaking) => speaking,
            Err(error) => {
                warn!("[{}] Stream speaking failure: {}.", stream_uuid, error);
                pipe.shutdown().await;
                streaming_state.settle(Self::state_after_transport_error(&error));
                return Err(StreamError::Transport(error));
            }
        };
        let (frames_sender, frames_receiver) =
            mpsc::channel(self.configuration.frames_buffer.max(1));
        let mut forwarder = ForwarderTask(tokio::spawn(Self::forward(
            self.transport.clone(),
            frames_receiver,
            self.stop.subscribe(),
        )));
        let produced = Self::produce(&mut pipe, frames_sender, self.stop.subscribe()).await;
        let pipe_exit = pipe.shutdown().await;
        let forwarded = match (&mut forwarder.0).await {
            Ok(forwarded) => forwarded,
            Err(error) => {
                error!("[{}] Stream forwarder crashed: {}.", stream_uuid, error);
                Forwarded::Failed(TransportError::Closed)
            }
        };
        speaking.release().await;
        debug!("[{}] Stream pipe exit: {:?}.", stream_uuid, pipe_exit);

        let (next_state, result) = match (produced, forwarded) {
            (_, Forwarded::Failed(error)) => (
                Self::state_after_transport_error(&error),
                Err(StreamError::Transport(error)),
            ),
            (Produced::Stopped, Forwarded::Drained { frames } | Forwarded::Stopped { frames })
            | (_, Forwarded::Stopped { frames }) => (
                VoiceSessionState::Closed,
                Ok(StreamReport {
                    end: StreamEnd::Stopped,
                    frames,
                    trailing_bytes: 0,
                    pipe_exit,
                }),
            ),
            (Produced::Failed(error), Forwarded::Drained { .. }) => {
                (VoiceSessionState::Idle, Err(StreamError::Read(error)))
            }
            (Produced::Finished { trailing_bytes }, Forwarded::Drained { frames }) => {
                if trailing_bytes > 0 || pipe_exit.extractor.is_failure() {
                    warn!(
                        "[{}] Stream ended with {} trailing bytes, extractor {:?}.",
                        stream_uuid, trailing_bytes, pipe_exit.extractor
                    );
                }
                (
                    VoiceSessionState::Idle,
                    Ok(StreamReport {
                        end: StreamEnd::Finished,
                        frames,
                        trailing_bytes,
                        pipe_exit,
                    }),
                )
            }
            // The producer only loses its receiver when the forwarder failed or stopped.
            (Produced::ForwarderGone, Forwarded::Drained { .. }) => (
                VoiceSessionState::Closed,
                Err(StreamError::Transport(TransportError::Closed)),
            ),
        };
        streaming_state.settle(next_state);
        match &result {
            Ok(report) => info!(
                "[{}] Stream EXIT {:?} after {} frames.",
                stream_uuid, report.end, report.frames
            ),
            Err(error) => warn!("[{}] Stream EXIT with error: {}.", stream_uuid, error),
        }
        result
    }

    fn state_after_transport_error(error: &TransportError) -> VoiceSessionState {
        match error {
            TransportError::Closed => VoiceSessionState::Closed,
            TransportError::NotSpeaking => VoiceSessionState::Idle,
        }
    }

    async fn produce(
        pipe: &mut FramePipe,
        frames: mpsc::Sender<Frame>,
        mut stop: watch::Receiver<bool>,
    ) -> Produced {
        loop {
            let read = tokio::select! {
                biased;
                _ = stop_requested(&mut stop) => return Produced::Stopped,
                read = pipe.next_frame() => read,
            };
            let frame = match read {
                Ok(PipeRead::Frame(frame)) => frame,
                Ok(PipeRead::EndOfStream { trailing_bytes }) => {
                    return Produced::Finished { trailing_bytes }
                }
                Err(error) => return Produced::Failed(error),
            };
            tokio::select! {
                biased;
                _ = stop_requested(&mut stop) => return Produced::Stopped,
                sent = frames.send(frame) => if sent.is_err() {
                    return Produced::ForwarderGone;
                },
            }
        }
    }

    async fn forward(
        transport: Arc<T>,
        mut frames: mpsc::Receiver<Frame>,
        mut stop: watch::Receiver<bool>,
    ) -> Forwarded {
        let mut forwarded = 0;
        loop {
            let frame = tokio::select! {
                biased;
                _ = stop_requested(&mut stop) => return Forwarded::Stopped { frames: forwarded },
                frame = frames.recv() => frame,
            };
            let Some(frame) = frame else {
                return Forwarded::Drained { frames: forwarded };
            };
            tokio::select! {
                biased;
                _ = stop_requested(&mut stop) => return Forwarded::Stopped { frames: forwarded },
                sent = transport.send_frame(frame) => if let Err(error) = sent {
                    return Forwarded::Failed(error);
                },
            }
            forwarded += 1;
        }
    }
}
