use super::super::components::*;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

fn default_lang() -> String {
    "en".to_string()
}

fn default_frames_buffer() -> usize {
    100
}

fn default_history_size() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamingSettings {
    #[serde(default = "default_frames_buffer")]
    pub frames_buffer: usize,
    pub extractor: Option<ProcessTemplate>,
    pub transcoder: Option<ProcessTemplate>,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            frames_buffer: default_frames_buffer(),
            extractor: None,
            transcoder: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub discord_token: String,
    pub youtube_api_key: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(default)]
    pub streaming: StreamingSettings,
}

impl Settings {
    const CONFIG_NAME: &'static str = "config";
    const ENV_PREFIX: &'static str = "GOPAL";

    /// `config.{yaml,toml,json}` if present, overridden by `GOPAL_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name(Self::CONFIG_NAME).required(false))
                .add_source(
                    Environment::with_prefix(Self::ENV_PREFIX)
                        .prefix_separator("_")
                        .separator("__"),
                ),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Self = builder.build()?.try_deserialize()?;
        if settings.discord_token.trim().is_empty() {
            return Err(ConfigError::Message("discord_token is empty".to_string()));
        }
        if settings.youtube_api_key.trim().is_empty() {
            return Err(ConfigError::Message("youtube_api_key is empty".to_string()));
        }
        Ok(settings)
    }

    pub fn voice_session_configuration(&self) -> VoiceSessionConfiguration {
        let pipe = FramePipeConfiguration::default();
        VoiceSessionConfiguration {
            frames_buffer: self.streaming.frames_buffer.max(1),
            pipe: FramePipeConfiguration {
                extractor: self.streaming.extractor.clone().unwrap_or(pipe.extractor),
                transcoder: self
                    .streaming
                    .transcoder
                    .clone()
                    .unwrap_or(pipe.transcoder),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(yaml: &str) -> Result<Settings, ConfigError> {
        Settings::from_builder(Config::builder().add_source(File::from_str(yaml, FileFormat::Yaml)))
    }

    #[test]
    fn minimal_settings_use_defaults() {
        let settings = parse("discord_token: token\nyoutube_api_key: key\n").unwrap();
        assert_eq!(settings.lang, "en");
        assert_eq!(settings.history_size, 20);
        let configuration = settings.voice_session_configuration();
        assert_eq!(configuration, VoiceSessionConfiguration::default());
    }

    #[test]
    fn streaming_section_overrides_pipeline() {
        let settings = parse(
            "discord_token: token
youtube_api_key: key
streaming:
  frames_buffer: 0
  extractor:
    program: /opt/yt-dlp
    args: [\"-f\", \"bestaudio\", \"{url}\", \"-o\", \"-\"]
",
        )
        .unwrap();
        let configuration = settings.voice_session_configuration();
        assert_eq!(configuration.frames_buffer, 1);
        assert_eq!(configuration.pipe.extractor.program, "/opt/yt-dlp");
        assert_eq!(configuration.pipe.extractor.args[2], URL_PLACEHOLDER);
        assert_eq!(
            configuration.pipe.transcoder,
            FramePipeConfiguration::default().transcoder
        );
    }

    #[test]
    fn missing_credentials_are_rejected() {
        assert!(parse("lang: en\n").is_err());
        assert!(parse("discord_token: \"\"\nyoutube_api_key: key\n").is_err());
    }
}
