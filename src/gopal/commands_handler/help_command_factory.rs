use super::*;

pub(super) struct GopalHelpCommandFactory {
    pub(super) l10n: L10n,
}

impl GopalHelpCommandFactory {
    fn command_help(&self, prefix_anchor: String, help_info: HelpInfo) -> String {
        let header = match help_info.header_suffix {
            Some(header_suffix) => self.l10n.string(
                "help-command-full-header",
                fluent_args![
                    "header" => prefix_anchor,
                    "suffix" => header_suffix
                ],
            ),
            None => self.l10n.string(
                "help-command-short-header",
                fluent_args![
                    "header" => prefix_anchor
                ],
            ),
        };
        let body = self.l10n.string(
            "help-command-body",
            fluent_args![
                "body" => help_info.description
            ],
        );
        [header, body].join(NEW_LINE)
    }
}

impl HelpCommandFactory for GopalHelpCommandFactory {
    fn help_command(
        &self,
        commands_info: Vec<(String, HelpInfo)>,
    ) -> Box<dyn Command + Send + Sync + 'static> {
        Box::new(PrintTextCommand {
            prefix_anchor: self
                .l10n
                .string("help-command-prefix-anchor", fluent_args![]),
            help_info: None,
            text: commands_info
                .into_iter()
                .map(|(prefix_anchor, help_info)| self.command_help(prefix_anchor, help_info))
                .collect::<Vec<String>>()
                .join(NEW_LINE),
        })
    }
}
