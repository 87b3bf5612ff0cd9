use std::io::{self, PipeReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result};

use crate::e_config::BuildOptions;
use crate::e_types::Phase;

/// A running build tool process.
pub trait PhaseProcess {
    /// The merged stdout/stderr stream. Handed out once.
    fn take_output(&mut self) -> Option<Box<dyn Read + Send>>;

    /// Block until the process exits. No timeout.
    fn wait(&mut self) -> io::Result<i32>;

    fn kill(&mut self) -> io::Result<()>;
}

/// Starts build tool processes for a phase of a module.
pub trait BuildTool {
    fn launch(&self, phase: Phase, descriptor: &Path) -> Result<Box<dyn PhaseProcess>>;
}

/// A builder that constructs a cabal command for a phase.
#[derive(Debug, Clone)]
pub struct CabalCommandBuilder {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub execution_dir: Option<PathBuf>,
}

impl CabalCommandBuilder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CabalCommandBuilder {
            program: program.into(),
            args: Vec::new(),
            execution_dir: None,
        }
    }

    /// Add the phase subcommand and run it next to the descriptor.
    pub fn with_phase(mut self, phase: Phase, descriptor: &Path) -> Self {
        self.args.push(phase.subcommand().into());
        if let Some(dir) = descriptor.parent().filter(|d| !d.as_os_str().is_empty()) {
            self.execution_dir = Some(dir.to_path_buf());
        }
        self
    }

    /// Appends extra arguments to the command.
    pub fn with_extra_args(mut self, extra: &[String]) -> Self {
        self.args.extend(extra.iter().cloned());
        self
    }

    /// Builds the final vector of command-line arguments.
    pub fn build(&self) -> Vec<String> {
        self.args.clone()
    }

    pub fn display(&self) -> String {
        let mut s = self.program.display().to_string();
        for arg in &self.args {
            s.push(' ');
            s.push_str(arg);
        }
        s
    }

    pub fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.build());
        if let Some(dir) = &self.execution_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Spawn with stdout and stderr writing into one pipe, stdin closed.
    pub fn spawn_merged(&self) -> io::Result<CabalProcess> {
        let (reader, writer) = io::pipe()?;
        // `cmd` owns our copies of the write end and must be dropped before
        // reading, otherwise the reader never sees end of stream.
        let child = {
            let mut cmd = self.build_command();
            cmd.stdin(Stdio::null())
                .stdout(writer.try_clone()?)
                .stderr(writer);
            cmd.spawn()?
        };
        Ok(CabalProcess {
            child,
            output: Some(reader),
        })
    }
}

#[derive(Debug)]
pub struct CabalProcess {
    child: Child,
    output: Option<PipeReader>,
}

impl CabalProcess {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

impl PhaseProcess for CabalProcess {
    fn take_output(&mut self) -> Option<Box<dyn Read + Send>> {
        self.output
            .take()
            .map(|r| Box::new(r) as Box<dyn Read + Send>)
    }

    fn wait(&mut self) -> io::Result<i32> {
        let status = self.child.wait()?;
        // killed by a signal
        Ok(status.code().unwrap_or(1))
    }

    fn kill(&mut self) -> io::Result<()> {
        self.child.kill()
    }
}

/// cabal, driven with the configured executable and extra arguments.
#[derive(Debug, Clone)]
pub struct CabalTool {
    options: BuildOptions,
}

impl CabalTool {
    pub fn new(options: BuildOptions) -> Self {
        CabalTool { options }
    }

    pub fn command_for(&self, phase: Phase, descriptor: &Path) -> CabalCommandBuilder {
        let extra = match phase {
            Phase::Configure => &self.options.configure_args,
            Phase::Build => &self.options.build_args,
        };
        CabalCommandBuilder::new(&self.options.cabal_path)
            .with_phase(phase, descriptor)
            .with_extra_args(extra)
    }
}

impl BuildTool for CabalTool {
    fn launch(&self, phase: Phase, descriptor: &Path) -> Result<Box<dyn PhaseProcess>> {
        let builder = self.command_for(phase, descriptor);
        log::debug!("running: {}", builder.display());
        let process = builder
            .spawn_merged()
            .with_context(|| format!("failed to start `{}`", builder.display()))?;
        log::trace!("{} started with pid {}", phase, process.pid());
        Ok(Box::new(process))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder_phase() {
        let options = BuildOptions {
            cabal_path: PathBuf::from("/usr/bin/cabal"),
            configure_args: vec!["--enable-tests".to_string()],
            build_args: vec!["-j1".to_string()],
        };
        let tool = CabalTool::new(options);
        let descriptor = Path::new("/work/pkg/pkg.cabal");

        let configure = tool.command_for(Phase::Configure, descriptor);
        assert_eq!(configure.build(), vec!["configure", "--enable-tests"]);
        assert_eq!(configure.execution_dir, Some(PathBuf::from("/work/pkg")));
        assert_eq!(configure.display(), "/usr/bin/cabal configure --enable-tests");

        let cmd = configure.build_command();
        let args: Vec<&std::ffi::OsStr> = cmd.get_args().collect();
        assert_eq!(args, ["configure", "--enable-tests"]);
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/work/pkg")));

        let build = tool.command_for(Phase::Build, descriptor);
        assert_eq!(build.build(), vec!["build", "-j1"]);
    }

    #[test]
    fn bare_descriptor_keeps_current_dir() {
        let builder = CabalCommandBuilder::new("cabal").with_phase(Phase::Build, Path::new("pkg.cabal"));
        assert_eq!(builder.execution_dir, None);
    }

    #[test]
    fn missing_executable_fails_to_launch() {
        let tool = CabalTool::new(BuildOptions {
            cabal_path: PathBuf::from("/definitely/not/here/cabal"),
            ..BuildOptions::default()
        });
        let err = match tool.launch(Phase::Configure, Path::new("x.cabal")) {
            Ok(_) => panic!("launch should fail"),
            Err(e) => e,
        };
        assert!(format!("{:#}", err).contains("failed to start"));
    }

    #[cfg(unix)]
    #[test]
    fn merged_output_carries_stdout_and_stderr() {
        let mut process = CabalCommandBuilder::new("sh")
            .with_extra_args(&["-c".to_string(), "echo out; echo err 1>&2; exit 3".to_string()])
            .spawn_merged()
            .unwrap();
        let mut text = String::new();
        process.take_output().unwrap().read_to_string(&mut text).unwrap();
        assert!(process.take_output().is_none());
        assert_eq!(process.wait().unwrap(), 3);
        assert!(text.contains("out\n"));
        assert!(text.contains("err\n"));
    }
}
