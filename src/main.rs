//! # cabal-e
//!
//! `cabal-e` runs `cabal configure` and `cabal build` for each Haskell module
//! it is given and prints the ghc and cabal diagnostics found in the output.
//!
//! ## Quick Start
//! ```sh
//! cabal-e                 # the current directory, or the members of cabal-e.toml
//! cabal-e core app        # explicit module roots
//! RUST_LOG=cabal_e=debug cabal-e --message-format json
//! ```

use cabal_e::e_cli::MessageFormat;
use cabal_e::e_manifest::{find_workspace_file, WORKSPACE_FILE};
use cabal_e::prelude::*;
use cabal_e::{
    collect_workspace_members, BuildDriver, BuildExitCode, BuildOptions, CabalFileLocator,
    CabalTool, Cli, ConsoleSink, MessageSink,
};
use clap::Parser;

pub fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let cli = Cli::parse();
    debug!("CLI options: {:?}", cli);

    let cwd = env::current_dir()?;
    let options_file = match &cli.config {
        Some(path) => Some(path.clone()),
        None => find_workspace_file(&cwd),
    };
    let options = BuildOptions::load(&cli.build_options(), options_file.as_deref())?;
    let modules = module_roots(&cli, &cwd, options_file.as_deref())?;
    debug!("modules: {:?}", modules);

    let locator = CabalFileLocator;
    let tool = CabalTool::new(options);
    let driver = BuildDriver::new(&locator, &tool);

    let mut sink: Box<dyn MessageSink> = match cli.message_format {
        MessageFormat::Human => Box::new(ConsoleSink::stdout(!cli.no_color)),
        MessageFormat::Json => json_sink()?,
    };

    match driver.build(&modules, sink.as_mut()) {
        BuildExitCode::Ok => Ok(()),
        BuildExitCode::Abort => {
            error!("{} aborted", driver);
            exit(1);
        }
    }
}

/// Modules named on the command line, else the workspace members, else `cwd`.
fn module_roots(cli: &Cli, cwd: &Path, options_file: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
    if !cli.modules.is_empty() {
        return Ok(cli.modules.clone());
    }
    if let Some(file) = options_file {
        let members = collect_workspace_members(file)?;
        if !members.is_empty() {
            return Ok(members);
        }
        debug!("{} lists no workspace members", WORKSPACE_FILE);
    }
    Ok(vec![cwd.to_path_buf()])
}

#[cfg(feature = "uses_serde")]
fn json_sink() -> anyhow::Result<Box<dyn MessageSink>> {
    Ok(Box::new(cabal_e::e_sink::JsonSink::new(io::stdout())))
}

#[cfg(not(feature = "uses_serde"))]
fn json_sink() -> anyhow::Result<Box<dyn MessageSink>> {
    anyhow::bail!("--message-format json needs cabal-e built with the `uses_serde` feature")
}
