use std::path::PathBuf;

use clap::Parser;

use crate::application::data::{ColorChoice, LogLevel};

/// Mirror the files a task reads and list what the mirror holds.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// Task whose inputs (and whose dependencies' inputs) are mirrored.
    /// Every task when omitted.
    pub target: Option<String>,

    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// The root directory of the project
    #[clap(long, short, default_value = ".")]
    pub root: PathBuf,

    /// Path segment whose subtree is left out of the listing, may be repeated
    #[clap(long, short, value_name = "NAME")]
    pub skip: Vec<String>,

    #[clap(long, default_value = "auto", value_enum)]
    pub color: ColorChoice,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::RuntimeConfig;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["tessy-mirror"]).unwrap();

        assert_eq!(cli.target, None);
        assert_eq!(cli.log_level, LogLevel::Warn);
        assert_eq!(cli.root, PathBuf::from("."));
        assert!(cli.skip.is_empty());
        assert_eq!(cli.color, ColorChoice::Auto);
    }

    #[test]
    fn parses_target_and_repeated_skips() {
        let cli = Cli::try_parse_from([
            "tessy-mirror",
            "build",
            "-s",
            ".git",
            "--skip",
            "target",
            "--root",
            "/work",
            "-l",
            "debug",
            "--color",
            "never",
        ])
        .unwrap();

        let config = RuntimeConfig::from(cli);
        assert_eq!(config.target.as_deref(), Some("build"));
        assert_eq!(config.skip, [".git", "target"]);
        assert_eq!(config.root, PathBuf::from("/work"));
        assert_eq!(config.color, ColorChoice::Never);
    }

    #[test]
    fn rejects_unknown_log_level() {
        assert!(Cli::try_parse_from(["tessy-mirror", "-l", "loud"]).is_err());
    }

    #[test]
    fn command_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
