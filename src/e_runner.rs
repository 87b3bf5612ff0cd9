use std::io::BufReader;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::e_classifier::classify_output;
use crate::e_command_builder::BuildTool;
use crate::e_sink::MessageSink;
use crate::e_types::{Diagnostic, Phase, PhaseResult, Severity};

/// Runs one phase of a module: announce it, start the tool, classify its
/// output while it runs, and wait for it to exit.
///
/// A non-zero exit code is not an error here; it is reported to the sink
/// and returned in the [`PhaseResult`]. Launch and read failures are errors.
pub fn run_phase(
    tool: &dyn BuildTool,
    phase: Phase,
    descriptor: &Path,
    content_root: &Path,
    sink: &mut dyn MessageSink,
) -> Result<PhaseResult> {
    sink.progress(&format!("cabal {}", phase));
    sink.diagnostic(Diagnostic::tool(Severity::Info, phase.start_message()));

    let mut process = tool.launch(phase, descriptor)?;
    let output = process
        .take_output()
        .ok_or_else(|| anyhow!("cabal {} has no output stream", phase))?;

    let stats = match classify_output(BufReader::new(output), content_root, sink) {
        Ok(stats) => stats,
        Err(e) => {
            // don't leave the child behind
            let _ = process.kill();
            let _ = process.wait();
            return Err(e).with_context(|| format!("failed reading output of cabal {}", phase));
        }
    };
    log::debug!(
        "cabal {}: {} lines, {} diagnostics",
        phase,
        stats.lines_read,
        stats.diagnostics()
    );

    let exit_code = process
        .wait()
        .with_context(|| format!("failed waiting for cabal {}", phase))?;
    log::debug!("cabal {} exited with {}", phase, exit_code);

    let result = PhaseResult { phase, exit_code };
    if !result.succeeded() {
        sink.diagnostic(Diagnostic::tool(Severity::Error, phase.failure_message()));
    }
    Ok(result)
}
