//! Configure and build every module in order, stopping at the first failure.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::e_command_builder::BuildTool;
use crate::e_manifest::{compilable_file_extensions, DescriptorLocator};
use crate::e_runner::run_phase;
use crate::e_sink::MessageSink;
use crate::e_types::{BuildExitCode, Diagnostic, ModuleJob, Phase, Severity};

pub struct BuildDriver<'a> {
    locator: &'a dyn DescriptorLocator,
    tool: &'a dyn BuildTool,
}

impl<'a> BuildDriver<'a> {
    pub fn new(locator: &'a dyn DescriptorLocator, tool: &'a dyn BuildTool) -> Self {
        BuildDriver { locator, tool }
    }

    pub fn presentable_name(&self) -> &'static str {
        "Cabal builder"
    }

    pub fn compilable_file_extensions(&self) -> &'static [&'static str] {
        compilable_file_extensions()
    }

    /// Build `modules` one at a time. Errors never escape: they are reported
    /// to the sink once and turn into [`BuildExitCode::Abort`].
    pub fn build(&self, modules: &[PathBuf], sink: &mut dyn MessageSink) -> BuildExitCode {
        match self.try_build(modules, sink) {
            Ok(code) => code,
            Err(e) => {
                log::debug!("build aborted: {:?}", e);
                sink.diagnostic(Diagnostic::tool(Severity::Error, format!("{:#}", e)));
                BuildExitCode::Abort
            }
        }
    }

    fn try_build(&self, modules: &[PathBuf], sink: &mut dyn MessageSink) -> Result<BuildExitCode> {
        for module_path in modules {
            let job = self.resolve(module_path)?;
            let Some(descriptor) = job.descriptor_file.as_deref() else {
                log::debug!("no .cabal file in {}, skipping", module_path.display());
                continue;
            };
            for phase in [Phase::Configure, Phase::Build] {
                let result = run_phase(self.tool, phase, descriptor, &job.module_path, sink)?;
                if !result.succeeded() {
                    return Ok(BuildExitCode::Abort);
                }
            }
        }
        Ok(BuildExitCode::Ok)
    }

    pub fn resolve(&self, module_path: &Path) -> Result<ModuleJob> {
        Ok(ModuleJob {
            module_path: module_path.to_path_buf(),
            descriptor_file: self.locator.find_descriptor(module_path)?,
        })
    }
}

impl fmt::Display for BuildDriver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.presentable_name())
    }
}
