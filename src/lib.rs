#![doc = include_str!("../README.md")]

// Re-export std common modules
pub mod prelude {
    pub use std::env;
    pub use std::io;
    pub use std::path::{Path, PathBuf};
    pub use std::process::exit;

    pub use log::{debug, error, info};
}

pub mod e_types;
pub use e_types::*;
pub mod e_lines;
pub use e_lines::{LineSource, NextLine};
pub mod e_classifier;
pub use e_classifier::{classify, classify_output, DiagnosticClassifier, LineClass};
pub mod e_sink;
pub use e_sink::{CollectingSink, ConsoleSink, MessageSink};
pub mod e_manifest;
pub use e_manifest::{collect_workspace_members, locate_cabal_file, CabalFileLocator};
pub mod e_config;
pub use e_config::BuildOptions;
pub mod e_command_builder;
pub use e_command_builder::{BuildTool, CabalTool, PhaseProcess};
pub mod e_runner;
pub use e_runner::run_phase;
pub mod e_driver;
pub use e_driver::BuildDriver;
pub mod e_cli;
pub use e_cli::Cli;
