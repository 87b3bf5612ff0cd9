use std::fmt;
use std::path::PathBuf;

#[cfg(feature = "uses_serde")]
use serde::Serialize;

/// Which grammar a diagnostic was recognized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "uses_serde", derive(Serialize))]
#[cfg_attr(feature = "uses_serde", serde(rename_all = "snake_case"))]
pub enum DiagnosticOrigin {
    /// A message printed by cabal itself (`Warning: ...`).
    ToolMessage,
    /// A `file:line:col: ...` message printed by the compiler.
    CompilerMessage,
}

impl DiagnosticOrigin {
    /// The label a build UI shows as the message source.
    pub fn source_name(&self) -> &'static str {
        match self {
            DiagnosticOrigin::ToolMessage => "cabal",
            DiagnosticOrigin::CompilerMessage => "ghc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "uses_serde", derive(Serialize))]
#[cfg_attr(feature = "uses_serde", serde(rename_all = "snake_case"))]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// A classified message derived from build tool output.
///
/// Tool messages never carry a location. Compiler messages always carry
/// `source_file`, `line` and `column`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "uses_serde", derive(Serialize))]
pub struct Diagnostic {
    pub origin: DiagnosticOrigin,
    pub severity: Severity,
    pub text: String,
    pub source_file: Option<PathBuf>,
    pub line: Option<u64>,
    pub column: Option<u64>,
}

impl Diagnostic {
    pub fn tool(severity: Severity, text: impl Into<String>) -> Self {
        Diagnostic {
            origin: DiagnosticOrigin::ToolMessage,
            severity,
            text: text.into(),
            source_file: None,
            line: None,
            column: None,
        }
    }

    pub fn compiler(
        severity: Severity,
        text: impl Into<String>,
        source_file: PathBuf,
        line: u64,
        column: u64,
    ) -> Self {
        Diagnostic {
            origin: DiagnosticOrigin::CompilerMessage,
            severity,
            text: text.into(),
            source_file: Some(source_file),
            line: Some(line),
            column: Some(column),
        }
    }

    /// `file:line:col` when the diagnostic has a location.
    pub fn lineref(&self) -> Option<String> {
        match (&self.source_file, self.line, self.column) {
            (Some(file), Some(line), Some(col)) => {
                Some(format!("{}:{}:{}", file.display(), line, col))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(lineref) = self.lineref() {
            write!(f, "{}: ", lineref)?;
        }
        write!(f, "{}: {}", self.severity, self.text)
    }
}

/// One external process invocation of the build tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "uses_serde", derive(Serialize))]
#[cfg_attr(feature = "uses_serde", serde(rename_all = "snake_case"))]
pub enum Phase {
    Configure,
    Build,
}

impl Phase {
    /// The cabal subcommand for this phase.
    pub fn subcommand(&self) -> &'static str {
        match self {
            Phase::Configure => "configure",
            Phase::Build => "build",
        }
    }

    /// Info message announced when the phase starts.
    pub fn start_message(&self) -> &'static str {
        match self {
            Phase::Configure => "Start configure",
            Phase::Build => "Start build",
        }
    }

    /// Error message emitted when the phase exits with a non-zero code.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Phase::Configure => "configure failed.",
            Phase::Build => "build errors.",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subcommand())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseResult {
    pub phase: Phase,
    pub exit_code: i32,
}

impl PhaseResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// A module to build: its content root and, if found, its `.cabal` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleJob {
    pub module_path: PathBuf,
    pub descriptor_file: Option<PathBuf>,
}

/// The unit handed to a [`MessageSink`](crate::e_sink::MessageSink).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "uses_serde", derive(Serialize))]
#[cfg_attr(feature = "uses_serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum BuildMessage {
    Progress { phase: String },
    Diagnostic(Diagnostic),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildExitCode {
    Ok,
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location_for_compiler_messages() {
        let d = Diagnostic::compiler(
            Severity::Warning,
            "unused",
            PathBuf::from("src/A.hs"),
            3,
            7,
        );
        assert_eq!(d.to_string(), "src/A.hs:3:7: warning: unused");
        let t = Diagnostic::tool(Severity::Error, "build errors.");
        assert_eq!(t.to_string(), "error: build errors.");
        assert!(t.lineref().is_none());
    }

    #[test]
    fn phase_result_success_is_exit_code_zero() {
        let ok = PhaseResult { phase: Phase::Build, exit_code: 0 };
        let failed = PhaseResult { phase: Phase::Build, exit_code: 1 };
        assert!(ok.succeeded());
        assert!(!failed.succeeded());
    }
}
