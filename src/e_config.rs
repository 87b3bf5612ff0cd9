//! Build options: where cabal lives and which extra arguments each phase gets.
//!
//! Resolution order, first hit wins for the executable:
//! command line, the `[build]` table of `cabal-e.toml`, `$CABAL`, `cabal`
//! on `PATH`, and finally the bare name `cabal`. Extra arguments from the file
//! come before the ones given on the command line.
//!
//! A relative executable path with a directory part is anchored where it was
//! written: command line values at the current directory, file values at the
//! directory holding `cabal-e.toml`. Cabal runs inside each module directory,
//! so leaving it relative would look it up there. A bare name stays a `PATH`
//! lookup.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use toml::Value;

pub const CABAL_ENV: &str = "CABAL";
const DEFAULT_CABAL: &str = "cabal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub cabal_path: PathBuf,
    pub configure_args: Vec<String>,
    pub build_args: Vec<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            cabal_path: PathBuf::from(DEFAULT_CABAL),
            configure_args: Vec::new(),
            build_args: Vec::new(),
        }
    }
}

/// Values read from the `[build]` table. Everything is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileOptions {
    pub cabal_path: Option<PathBuf>,
    pub configure_args: Vec<String>,
    pub build_args: Vec<String>,
}

impl FileOptions {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let mut options = Self::parse(&contents)
            .with_context(|| format!("invalid options in {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        options.cabal_path = options.cabal_path.map(|p| anchor_program(&p, base));
        Ok(options)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let value: Value = contents.parse::<Value>()?;
        let Some(build) = value.get("build") else {
            return Ok(FileOptions::default());
        };
        let cabal_path = match build.get("cabal-path") {
            Some(Value::String(s)) => Some(PathBuf::from(s)),
            Some(other) => bail!("build.cabal-path must be a string, found {}", other.type_str()),
            None => None,
        };
        Ok(FileOptions {
            cabal_path,
            configure_args: string_array(build, "configure-args")?,
            build_args: string_array(build, "build-args")?,
        })
    }
}

fn string_array(table: &Value, key: &str) -> Result<Vec<String>> {
    let Some(value) = table.get(key) else {
        return Ok(Vec::new());
    };
    let Some(items) = value.as_array() else {
        bail!("build.{} must be an array of strings", key);
    };
    items
        .iter()
        .map(|item| match item.as_str() {
            Some(s) => Ok(s.to_string()),
            None => bail!("build.{} must be an array of strings", key),
        })
        .collect()
}

/// `program` joined onto `base` when it is relative and names a directory,
/// like `./cabal` or `tools/cabal`. `cabal` and absolute paths are unchanged.
pub fn anchor_program(program: &Path, base: &Path) -> PathBuf {
    if program.is_relative() && program.components().count() > 1 {
        base.join(program)
    } else {
        program.to_path_buf()
    }
}

/// Options given on the command line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub cabal_path: Option<PathBuf>,
    pub configure_args: Vec<String>,
    pub build_args: Vec<String>,
}

impl BuildOptions {
    /// Merge command line, file and environment.
    pub fn resolve(cli: &CliOptions, file: Option<&FileOptions>, env_cabal: Option<String>) -> Self {
        let cabal_path = cli
            .cabal_path
            .clone()
            .or_else(|| file.and_then(|f| f.cabal_path.clone()))
            .or_else(|| env_cabal.filter(|s| !s.is_empty()).map(PathBuf::from))
            .or_else(|| which::which(DEFAULT_CABAL).ok())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CABAL));

        let mut configure_args = file.map(|f| f.configure_args.clone()).unwrap_or_default();
        configure_args.extend(cli.configure_args.iter().cloned());
        let mut build_args = file.map(|f| f.build_args.clone()).unwrap_or_default();
        build_args.extend(cli.build_args.iter().cloned());

        BuildOptions {
            cabal_path,
            configure_args,
            build_args,
        }
    }

    /// Resolve using the process environment and an optional options file.
    pub fn load(cli: &CliOptions, options_file: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().context("cannot determine the current directory")?;
        let file = options_file
            .map(|path| FileOptions::load(&cwd.join(path)))
            .transpose()?;
        let mut cli = cli.clone();
        cli.cabal_path = cli.cabal_path.map(|program| anchor_program(&program, &cwd));
        let options = Self::resolve(&cli, file.as_ref(), std::env::var(CABAL_ENV).ok());
        log::debug!("build options: {:?}", options);
        Ok(options)
    }
}
