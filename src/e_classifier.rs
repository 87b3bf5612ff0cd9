//! Turns cabal/ghc output lines into [`Diagnostic`]s while the process runs.
//!
//! Two unrelated grammars show up in the same stream:
//!
//! ```text
//! Warning: The package list for 'hackage.haskell.org' is 41 days old.
//! Run 'cabal update' to get the latest list of available packages.
//! [74 of 92] Compiling Feldspar.Core.UntypedRepresentation ( src/Feldspar/Core/UntypedRepresentation.hs, ... )
//! src/Feldspar/Core/UntypedRepresentation.hs:483:5: Warning:
//!     Pattern match(es) are overlapped
//!     In an equation for `typeof': typeof e = ...
//! [74 of 92] Compiling Feldspar.Core.UntypedRepresentation ( ... )
//! ```
//!
//! The first two lines are a cabal message, always exactly two lines long. The
//! `file:line:col:` header starts a ghc message whose body runs until a blank
//! line, a `warning generated.` line, or the start of the next progress line
//! (`[` or `In-place`), which is pushed back and classified again.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::e_lines::{LineSource, NextLine};
use crate::e_sink::MessageSink;
use crate::e_types::{BuildMessage, Diagnostic, Severity};

pub const TOOL_WARNING_PREFIX: &str = "Warning: ";
const BODY_END_SUFFIX: &str = "warning generated.";
const NEXT_MESSAGE_PREFIXES: [&str; 2] = ["[", "In-place"];

#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

static COMPILER_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*):([0-9]+):([0-9]+):\s*([^:]*):(.*)$").expect("compiler header regex")
});

/// The `file:line:col: word:rest` header of a compiler message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerHeader {
    pub file: String,
    pub line: u64,
    pub column: u64,
    /// Only used to pick the severity.
    pub word: String,
    pub rest: String,
}

impl CompilerHeader {
    /// `Warning` when the word contains `arn` anywhere, `Error` otherwise.
    ///
    /// Heuristic: ghc's vocabulary here is not fixed, so `Warning`, `warning`
    /// and `Warnings` all count, while `WARN` does not.
    pub fn severity(&self) -> Severity {
        if self.word.contains("arn") {
            Severity::Warning
        } else {
            Severity::Error
        }
    }
}

/// What a single line starts, on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// A cabal message; carries the line with its prefix stripped.
    ToolMessage(String),
    CompilerMessage(CompilerHeader),
    Unrecognized,
}

/// Classify one line. The tool prefix is checked first; a line that has it is
/// never matched against the compiler grammar.
pub fn classify(line: &str) -> LineClass {
    if let Some(text) = line.strip_prefix(TOOL_WARNING_PREFIX) {
        return LineClass::ToolMessage(text.to_string());
    }
    let Some(caps) = COMPILER_HEADER.captures(line) else {
        return LineClass::Unrecognized;
    };
    // digit-only groups can still overflow
    let (Ok(line_num), Ok(col_num)) = (caps[2].parse::<u64>(), caps[3].parse::<u64>()) else {
        return LineClass::Unrecognized;
    };
    LineClass::CompilerMessage(CompilerHeader {
        file: caps[1].to_string(),
        line: line_num,
        column: col_num,
        word: caps[4].to_string(),
        rest: caps[5].to_string(),
    })
}

/// Join a file reported by the tool onto the module's content root, with the
/// tool's separators translated to the host's. Absolute paths are kept.
pub fn resolve_source_path(content_root: &Path, file: &str) -> PathBuf {
    let native: String = file
        .chars()
        .map(|c| if c == '\\' || c == '/' { MAIN_SEPARATOR } else { c })
        .collect();
    content_root.join(native)
}

/// State of the body accumulation after a compiler header.
#[derive(Debug, PartialEq, Eq)]
enum BodyState {
    ScanningBody,
    AwaitingPushbackReplay(String),
    Done,
}

/// Counters collected over one classification run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClassifierStats {
    pub lines_read: usize,
    pub tool_messages: usize,
    pub compiler_warnings: usize,
    pub compiler_errors: usize,
}

impl ClassifierStats {
    pub fn diagnostics(&self) -> usize {
        self.tool_messages + self.compiler_warnings + self.compiler_errors
    }
}

/// Streaming classifier for one phase's output.
pub struct DiagnosticClassifier<'a> {
    content_root: &'a Path,
    deferred: Option<String>,
    stats: ClassifierStats,
}

impl<'a> DiagnosticClassifier<'a> {
    pub fn new(content_root: &'a Path) -> Self {
        DiagnosticClassifier {
            content_root,
            deferred: None,
            stats: ClassifierStats::default(),
        }
    }

    /// Pull every line from `source`, emitting diagnostics to `sink` as soon
    /// as each one is complete.
    pub fn run<R: BufRead>(
        mut self,
        source: &mut LineSource<R>,
        sink: &mut dyn MessageSink,
    ) -> io::Result<ClassifierStats> {
        loop {
            let line = match self.deferred.take() {
                Some(line) => line,
                None => match source.advance()? {
                    NextLine::Line(line) => line,
                    NextLine::EndOfStream => break,
                },
            };
            match classify(&line) {
                LineClass::ToolMessage(first) => {
                    let diag = self.tool_message(first, source)?;
                    self.stats.tool_messages += 1;
                    sink.emit(BuildMessage::Diagnostic(diag));
                }
                LineClass::CompilerMessage(header) => {
                    let diag = self.compiler_message(header, source)?;
                    match diag.severity {
                        Severity::Warning => self.stats.compiler_warnings += 1,
                        _ => self.stats.compiler_errors += 1,
                    }
                    sink.emit(BuildMessage::Diagnostic(diag));
                }
                LineClass::Unrecognized => {
                    log::trace!("unrecognized: {}", line);
                }
            }
        }
        self.stats.lines_read = source.lines_read();
        Ok(self.stats)
    }

    fn tool_message<R: BufRead>(
        &mut self,
        first: String,
        source: &mut LineSource<R>,
    ) -> io::Result<Diagnostic> {
        let mut text = first;
        // the second line belongs to the message whatever it says
        if let NextLine::Line(second) = source.advance()? {
            text.push_str(LINE_SEPARATOR);
            text.push_str(&second);
        }
        Ok(Diagnostic::tool(Severity::Warning, text))
    }

    fn compiler_message<R: BufRead>(
        &mut self,
        header: CompilerHeader,
        source: &mut LineSource<R>,
    ) -> io::Result<Diagnostic> {
        let mut body = header.rest.clone();
        let mut state = BodyState::ScanningBody;
        while state == BodyState::ScanningBody {
            let line = match source.advance()? {
                NextLine::Line(line) => line,
                NextLine::EndOfStream => {
                    state = BodyState::Done;
                    continue;
                }
            };
            if line.ends_with(BODY_END_SUFFIX) || line.trim().is_empty() {
                state = BodyState::Done;
            } else if NEXT_MESSAGE_PREFIXES.iter().any(|p| line.starts_with(p)) {
                state = BodyState::AwaitingPushbackReplay(line);
            } else {
                if !body.is_empty() {
                    body.push_str(LINE_SEPARATOR);
                }
                body.push_str(&line);
            }
        }
        if let BodyState::AwaitingPushbackReplay(line) = state {
            self.deferred = Some(line);
        }

        let source_file = resolve_source_path(self.content_root, &header.file);
        Ok(Diagnostic::compiler(
            header.severity(),
            body.trim(),
            source_file,
            header.line,
            header.column,
        ))
    }
}

/// Classify everything readable from `reader`.
pub fn classify_output<R: BufRead>(
    reader: R,
    content_root: &Path,
    sink: &mut dyn MessageSink,
) -> io::Result<ClassifierStats> {
    let mut source = LineSource::new(reader);
    DiagnosticClassifier::new(content_root).run(&mut source, sink)
}
