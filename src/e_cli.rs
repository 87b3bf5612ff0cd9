use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::e_config::CliOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    /// One JSON object per line; needs the `uses_serde` feature.
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Run cabal configure and build for Haskell modules and report ghc diagnostics.", long_about = None)]
pub struct Cli {
    /// Module content roots. Defaults to the workspace members of cabal-e.toml,
    /// or the current directory.
    pub modules: Vec<PathBuf>,

    #[arg(long = "cabal-path", value_name = "PATH")]
    pub cabal_path: Option<PathBuf>,

    /// Options file; `cabal-e.toml` is searched upward when not given.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long = "configure-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub configure_args: Vec<String>,

    #[arg(long = "build-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub build_args: Vec<String>,

    #[arg(long = "message-format", value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Cli {
    pub fn build_options(&self) -> CliOptions {
        CliOptions {
            cabal_path: self.cabal_path.clone(),
            configure_args: self.configure_args.clone(),
            build_args: self.build_args.clone(),
        }
    }
}
