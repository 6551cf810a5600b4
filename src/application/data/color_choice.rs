use clap::ValueEnum;
use supports_color::Stream;

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Whether output written to stdout should be colored.
    pub fn should_colorize(self) -> bool {
        match self {
            ColorChoice::Auto => supports_color::on(Stream::Stdout).is_some(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_choices_ignore_terminal() {
        assert!(ColorChoice::Always.should_colorize());
        assert!(!ColorChoice::Never.should_colorize());
    }
}
