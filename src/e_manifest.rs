use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use toml::Value;

/// Extension of the build descriptor cabal is configured with.
pub const DESCRIPTOR_EXTENSION: &str = "cabal";

/// Name of the optional workspace/options file at the project root.
pub const WORKSPACE_FILE: &str = "cabal-e.toml";

/// Source file extensions the compiler accepts.
pub fn compilable_file_extensions() -> &'static [&'static str] {
    &["hs", "lhs"]
}

/// Finds the build descriptor of a module.
pub trait DescriptorLocator {
    /// Zero or one descriptor for the module rooted at `content_root`.
    fn find_descriptor(&self, content_root: &Path) -> Result<Option<PathBuf>>;
}

/// Looks for a `*.cabal` file directly inside the content root.
#[derive(Debug, Default, Clone, Copy)]
pub struct CabalFileLocator;

impl DescriptorLocator for CabalFileLocator {
    fn find_descriptor(&self, content_root: &Path) -> Result<Option<PathBuf>> {
        locate_cabal_file(content_root)
    }
}

/// The first `*.cabal` file in `dir`, in file name order so the pick does not
/// depend on directory iteration order.
pub fn locate_cabal_file(dir: &Path) -> Result<Option<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("cannot list module directory {}", dir.display()))?;
    let mut candidates = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_descriptor = path.extension().and_then(|e| e.to_str()) == Some(DESCRIPTOR_EXTENSION);
        if is_descriptor && path.is_file() {
            candidates.push(path);
        }
    }
    candidates.sort();
    Ok(candidates.into_iter().next())
}

/// Parses the workspace file (in TOML format) and returns the content roots
/// listed in its `[workspace] members` array, joined with the directory the
/// file lives in. Members that are not directories are skipped.
pub fn collect_workspace_members(workspace_file: &Path) -> Result<Vec<PathBuf>> {
    let workspace_root = workspace_file.parent().unwrap_or_else(|| Path::new("."));
    let contents = fs::read_to_string(workspace_file)
        .with_context(|| format!("cannot read {}", workspace_file.display()))?;
    let value: Value = contents
        .parse::<Value>()
        .with_context(|| format!("invalid TOML in {}", workspace_file.display()))?;
    let mut members = Vec::new();

    if let Some(member_array) = value
        .get("workspace")
        .and_then(|ws| ws.get("members"))
        .and_then(|v| v.as_array())
    {
        for member in member_array {
            if let Some(member_str) = member.as_str() {
                let member_path = workspace_root.join(member_str);
                if member_path.is_dir() {
                    members.push(member_path);
                } else {
                    log::warn!(
                        "workspace member {} is not a directory, skipping",
                        member_path.display()
                    );
                }
            }
        }
    }
    Ok(members)
}

/// Search upward from `start` for the workspace file.
pub fn find_workspace_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(WORKSPACE_FILE))
        .find(|candidate| candidate.is_file())
}
