use super::*;
use serde::Deserialize;
use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

pub const URL_PLACEHOLDER: &str = "{url}";

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ProcessTemplate {
    pub program: String,
    pub args: Vec<String>,
}

impl ProcessTemplate {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
    fn command(&self, source_url: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.args(
            self.args
                .iter()
                .map(|a| a.replace(URL_PLACEHOLDER, source_url)),
        );
        command
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FramePipeConfiguration {
    pub extractor: ProcessTemplate,
    pub transcoder: ProcessTemplate,
}

impl Default for FramePipeConfiguration {
    fn default() -> Self {
        Self {
            extractor: ProcessTemplate::new("yt-dlp", &["-x", URL_PLACEHOLDER, "-o", "-"]),
            transcoder: ProcessTemplate::new(
                "ffmpeg",
                &[
                    "-re", "-i", "pipe:0", "-f", "s16le", "-ar", "48000", "-ac", "2", "pipe:1",
                ],
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipeError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} started without a piped stdout")]
    MissingOutput { program: String },
    #[error("failed to read transcoder output: {0}")]
    Read(#[source] std::io::Error),
}

#[derive(Debug)]
pub enum PipeRead {
    Frame(Frame),
    /// `trailing_bytes` is the size of an incomplete last frame, which is discarded.
    EndOfStream { trailing_bytes: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    Exited(ExitStatus),
    Killed,
    Unknown,
}

impl ChildExit {
    pub fn is_failure(&self) -> bool {
        match self {
            ChildExit::Exited(status) => !status.success(),
            ChildExit::Killed | ChildExit::Unknown => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeExit {
    pub extractor: ChildExit,
    pub transcoder: ChildExit,
}

/// Extractor stdout feeds transcoder stdin through an OS pipe; frames are
/// read from transcoder stdout. Both children are killed on drop.
pub struct FramePipe {
    extractor: Child,
    transcoder: Child,
    output: Box<dyn AsyncRead + Send + Unpin>,
    finished: bool,
}

impl FramePipe {
    pub fn spawn(
        configuration: &FramePipeConfiguration,
        source_url: &str,
    ) -> Result<Self, PipeError> {
        let extractor_program = &configuration.extractor.program;
        let mut extractor = configuration
            .extractor
            .command(source_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PipeError::Spawn {
                program: extractor_program.clone(),
                source,
            })?;
        let Some(extractor_output) = extractor.stdout.take() else {
            return Err(PipeError::MissingOutput {
                program: extractor_program.clone(),
            });
        };
        let transcoder_input: Stdio =
            extractor_output
                .try_into()
                .map_err(|source| PipeError::Spawn {
                    program: configuration.transcoder.program.clone(),
                    source,
                })?;
        let transcoder_program = &configuration.transcoder.program;
        let mut transcoder = configuration
            .transcoder
            .command(source_url)
            .stdin(transcoder_input)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PipeError::Spawn {
                program: transcoder_program.clone(),
                source,
            })?;
        let Some(output) = transcoder.stdout.take() else {
            return Err(PipeError::MissingOutput {
                program: transcoder_program.clone(),
            });
        };
        debug!(
            "FramePipe started {} ({:?}) -> {} ({:?}).",
            extractor_program,
            extractor.id(),
            transcoder_program,
            transcoder.id()
        );
        Ok(Self {
            extractor,
            transcoder,
            output: Box::new(output),
            finished: false,
        })
    }

    #[cfg(test)]
    pub fn replace_output<R: AsyncRead + Send + Unpin + 'static>(&mut self, output: R) {
        self.output = Box::new(output);
    }

    pub fn process_ids(&self) -> (Option<u32>, Option<u32>) {
        (self.extractor.id(), self.transcoder.id())
    }

    pub async fn next_frame(&mut self) -> Result<PipeRead, PipeError> {
        if self.finished {
            return Ok(PipeRead::EndOfStream { trailing_bytes: 0 });
        }
        let mut buffer = vec![0u8; FRAME_BYTES];
        let mut filled = 0;
        while filled < FRAME_BYTES {
            match self.output.read(&mut buffer[filled..]).await {
                Ok(0) => {
                    self.finished = true;
                    return Ok(PipeRead::EndOfStream {
                        trailing_bytes: filled,
                    });
                }
                Ok(read) => filled += read,
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(error) => {
                    self.finished = true;
                    return Err(PipeError::Read(error));
                }
            }
        }
        Ok(PipeRead::Frame(Frame(buffer)))
    }

    pub async fn shutdown(self) -> PipeExit {
        let FramePipe {
            mut extractor,
            mut transcoder,
            output,
            ..
        } = self;
        drop(output);
        let transcoder = Self::terminate(&mut transcoder).await;
        let extractor = Self::terminate(&mut extractor).await;
        PipeExit {
            extractor,
            transcoder,
        }
    }

    async fn terminate(child: &mut Child) -> ChildExit {
        if let Ok(Some(status)) = child.try_wait() {
            return ChildExit::Exited(status);
        }
        if let Err(error) = child.start_kill() {
            warn!("FramePipe failed to kill child {:?}: {}.", child.id(), error);
        }
        match child.wait().await {
            Ok(_) => ChildExit::Killed,
            Err(error) => {
                warn!("FramePipe failed to reap child: {}.", error);
                ChildExit::Unknown
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;

    fn shell_pipe(script: &str) -> FramePipeConfiguration {
        FramePipeConfiguration {
            extractor: ProcessTemplate::new("sh", &["-c", script, "extractor", URL_PLACEHOLDER]),
            transcoder: ProcessTemplate::new("cat", &[]),
        }
    }

    #[tokio::test]
    async fn partial_last_frame_ends_stream() {
        let configuration = shell_pipe("head -c 8000 /dev/zero");
        let mut pipe = FramePipe::spawn(&configuration, "https://example.com/a").unwrap();
        for _ in 0..2 {
            match pipe.next_frame().await.unwrap() {
                PipeRead::Frame(frame) => assert_eq!(frame.as_bytes().len(), FRAME_BYTES),
                other => panic!("expected frame, got {:?}", other),
            }
        }
        match pipe.next_frame().await.unwrap() {
            PipeRead::EndOfStream { trailing_bytes } => {
                assert_eq!(trailing_bytes, 8000 - 2 * FRAME_BYTES)
            }
            other => panic!("expected end of stream, got {:?}", other),
        }
        assert!(matches!(
            pipe.next_frame().await.unwrap(),
            PipeRead::EndOfStream { trailing_bytes: 0 }
        ));
        let exit = pipe.shutdown().await;
        assert!(!exit.extractor.is_failure());
    }

    #[tokio::test]
    async fn source_url_reaches_extractor() {
        let url = "https://www.youtube.com/watch?v=abc";
        let configuration = shell_pipe("printf '%s' \"$1\"");
        let mut pipe = FramePipe::spawn(&configuration, url).unwrap();
        match pipe.next_frame().await.unwrap() {
            PipeRead::EndOfStream { trailing_bytes } => assert_eq!(trailing_bytes, url.len()),
            other => panic!("expected end of stream, got {:?}", other),
        }
        pipe.shutdown().await;
    }

    #[tokio::test]
    async fn missing_extractor_is_spawn_error() {
        let configuration = FramePipeConfiguration {
            extractor: ProcessTemplate::new("gopal-no-such-extractor", &[]),
            transcoder: ProcessTemplate::new("cat", &[]),
        };
        match FramePipe::spawn(&configuration, "u") {
            Err(PipeError::Spawn { program, .. }) => {
                assert_eq!(program, "gopal-no-such-extractor")
            }
            _ => panic!("expected spawn error"),
        }
    }

    #[tokio::test]
    async fn missing_transcoder_is_spawn_error() {
        let configuration = FramePipeConfiguration {
            extractor: ProcessTemplate::new("sleep", &["30"]),
            transcoder: ProcessTemplate::new("gopal-no-such-transcoder", &[]),
        };
        match FramePipe::spawn(&configuration, "u") {
            Err(PipeError::Spawn { program, .. }) => {
                assert_eq!(program, "gopal-no-such-transcoder")
            }
            _ => panic!("expected spawn error"),
        }
    }

    #[tokio::test]
    async fn shutdown_kills_running_children() {
        let configuration = FramePipeConfiguration {
            extractor: ProcessTemplate::new("sleep", &["30"]),
            transcoder: ProcessTemplate::new("cat", &[]),
        };
        let pipe = FramePipe::spawn(&configuration, "u").unwrap();
        let (extractor_id, transcoder_id) = pipe.process_ids();
        let exit = tokio::time::timeout(Duration::from_secs(5), pipe.shutdown())
            .await
            .unwrap();
        assert_eq!(exit.extractor, ChildExit::Killed);
        assert!(!exit.extractor.is_failure());
        for id in [extractor_id.unwrap(), transcoder_id.unwrap()] {
            assert!(!Path::new(&format!("/proc/{}", id)).exists());
        }
    }
}
