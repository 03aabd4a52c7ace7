use fluent::bundle::FluentBundle;
pub use fluent::fluent_args;
use fluent::{FluentArgs, FluentResource};
use intl_memoizer::concurrent::IntlLangMemoizer;
use std::sync::Arc;
use thiserror::Error;
use unic_langid::LanguageIdentifier;

#[derive(Debug, Error)]
pub enum L10nError {
    #[error("invalid language identifier {0}")]
    LanguageId(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse FTL for {0}")]
    Parse(String),
}

#[derive(Clone)]
pub struct L10n {
    bundle: Arc<FluentBundle<FluentResource, IntlLangMemoizer>>,
}

impl L10n {
    pub fn load(lang_id_string: &str) -> Result<Self, L10nError> {
        let path = lang_id_string.to_owned() + ".ftl";
        let ftl_string = std::fs::read_to_string(&path)
            .map_err(|source| L10nError::Read { path, source })?;
        Self::with_ftl(lang_id_string, ftl_string)
    }

    pub fn with_ftl(lang_id_string: &str, ftl_string: String) -> Result<Self, L10nError> {
        let lang_id: LanguageIdentifier = lang_id_string
            .parse()
            .map_err(|_| L10nError::LanguageId(lang_id_string.to_string()))?;
        let mut bundle = FluentBundle::new_concurrent(vec![lang_id]);
        // Discord renders the bidi isolation marks literally.
        bundle.set_use_isolating(false);
        let res = FluentResource::try_new(ftl_string)
            .map_err(|_| L10nError::Parse(lang_id_string.to_string()))?;
        bundle
            .add_resource(res)
            .map_err(|_| L10nError::Parse(lang_id_string.to_string()))?;
        Ok(Self {
            bundle: Arc::new(bundle),
        })
    }

    pub fn string(&self, msg_id: &str, args: FluentArgs) -> String {
        let Some(pattern) = self.bundle.get_message(msg_id).and_then(|m| m.value()) else {
            warn!("Missing localized message {}.", msg_id);
            return msg_id.to_string();
        };
        let mut errors = vec![];
        let value = self
            .bundle
            .format_pattern(pattern, Some(&args), &mut errors);
        if !errors.is_empty() {
            warn!("Localized message {} errors: {:?}.", msg_id, errors);
        }
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l10n() -> L10n {
        L10n::with_ftl(
            "en",
            "greeting = Hello, { $name }!\nplain = Plain text\n".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn formats_arguments_without_isolation_marks() {
        assert_eq!(
            l10n().string("greeting", fluent_args!["name" => "gopal"]),
            "Hello, gopal!"
        );
        assert_eq!(l10n().string("plain", fluent_args![]), "Plain text");
    }

    #[test]
    fn missing_message_falls_back_to_id() {
        assert_eq!(l10n().string("absent", fluent_args![]), "absent");
    }

    #[test]
    fn shipped_english_bundle_parses() {
        let ftl = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/en.ftl")).unwrap();
        let l10n = L10n::with_ftl("en", ftl).unwrap();
        assert_eq!(l10n.string("play-command-prefix-anchor", fluent_args![]), "?play");
    }
}
