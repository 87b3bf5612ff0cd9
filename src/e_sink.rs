use std::io::{self, Write};

use nu_ansi_term::{Color, Style};

use crate::e_types::{BuildMessage, Diagnostic, Severity};

/// Receives progress announcements and diagnostics in the order they are
/// resolved. Called from the build thread only.
pub trait MessageSink {
    fn emit(&mut self, message: BuildMessage);

    fn progress(&mut self, phase: &str) {
        self.emit(BuildMessage::Progress {
            phase: phase.to_string(),
        });
    }

    fn diagnostic(&mut self, diagnostic: Diagnostic) {
        self.emit(BuildMessage::Diagnostic(diagnostic));
    }
}

impl<S: MessageSink + ?Sized> MessageSink for &mut S {
    fn emit(&mut self, message: BuildMessage) {
        (**self).emit(message)
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub messages: Vec<BuildMessage>,
}

impl CollectingSink {
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter().filter_map(|m| match m {
            BuildMessage::Diagnostic(d) => Some(d),
            BuildMessage::Progress { .. } => None,
        })
    }

    pub fn progress_phases(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().filter_map(|m| match m {
            BuildMessage::Progress { phase } => Some(phase.as_str()),
            BuildMessage::Diagnostic(_) => None,
        })
    }
}

impl MessageSink for CollectingSink {
    fn emit(&mut self, message: BuildMessage) {
        self.messages.push(message);
    }
}

/// Human readable output, one diagnostic per block.
pub struct ConsoleSink<W: Write> {
    out: W,
    uses_color: bool,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout(uses_color: bool) -> Self {
        ConsoleSink::new(io::stdout(), uses_color)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, uses_color: bool) -> Self {
        ConsoleSink { out, uses_color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.uses_color {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn render(&self, message: &BuildMessage) -> String {
        match message {
            BuildMessage::Progress { phase } => {
                format!("{} {}", self.paint(Style::new().bold(), "==>"), phase)
            }
            BuildMessage::Diagnostic(diag) => {
                let level = format!("{}:", diag.severity);
                let color = match diag.severity {
                    Severity::Error => Color::Red,
                    Severity::Warning => Color::Yellow,
                    Severity::Info => Color::Green,
                };
                let mut rendered = format!(
                    "{} [{}]",
                    self.paint(color.bold(), &level),
                    diag.origin.source_name()
                );
                if let Some(lineref) = diag.lineref() {
                    rendered.push(' ');
                    rendered.push_str(&self.paint(Style::new().underline(), &lineref));
                }
                let mut lines = diag.text.lines();
                if let Some(first) = lines.next() {
                    rendered.push(' ');
                    rendered.push_str(first);
                }
                for line in lines {
                    rendered.push_str("\n    ");
                    rendered.push_str(line);
                }
                rendered
            }
        }
    }
}

impl<W: Write> MessageSink for ConsoleSink<W> {
    fn emit(&mut self, message: BuildMessage) {
        let rendered = self.render(&message);
        if let Err(e) = writeln!(self.out, "{}", rendered) {
            log::warn!("failed to write build message: {}", e);
        }
    }
}

/// One JSON object per line, for tools that consume the build output.
#[cfg(feature = "uses_serde")]
pub struct JsonSink<W: Write> {
    out: W,
}

#[cfg(feature = "uses_serde")]
impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        JsonSink { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(feature = "uses_serde")]
impl<W: Write> MessageSink for JsonSink<W> {
    fn emit(&mut self, message: BuildMessage) {
        let written = serde_json::to_writer(&mut self.out, &message)
            .map_err(io::Error::from)
            .and_then(|_| self.out.write_all(b"\n"));
        if let Err(e) = written {
            log::warn!("failed to write build message: {}", e);
        }
    }
}
