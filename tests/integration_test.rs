// End-to-end runs against a shell script standing in for cabal.
#![cfg(unix)]

mod common;

use std::time::{Duration, Instant};

use cabal_e::{run_phase, BuildOptions, CabalTool, CollectingSink, Phase, Severity};
use common::test_prelude::*;
use common::test_utils::TestProject;

/// Logs `<subcommand> <cwd>` and prints what cabal/ghc would, on both streams.
fn script(log: &std::path::Path, fail_build_in: &str) -> String {
    format!(
        r#"echo "$1 $(pwd)" >> '{log}'
case "$1" in
  configure)
    echo "Resolving dependencies..."
    echo "Warning: The package list for 'hackage.haskell.org' is 41 days old." >&2
    echo "Run 'cabal update' to get the latest list of available packages." >&2
    ;;
  build)
    echo "[1 of 1] Compiling Main ( src/Main.hs, dist/build/Main.o )"
    case "$(pwd)" in
      */{fail})
        echo "src/Main.hs:3:1: error:" >&2
        echo "    Not in scope: \`foo'" >&2
        echo "" >&2
        exit 1
        ;;
    esac
    echo "src/Main.hs:1:1: Warning: Top-level binding with no type signature: main"
    echo "In-place registering main-0.1.0.0..."
    ;;
esac
exit 0"#,
        log = log.display(),
        fail = fail_build_in,
    )
}

fn project(fail_build_in: &str) -> TestProject {
    let project = TestProject::new("workspace").unwrap();
    project.add_cabal_module("core").unwrap();
    project.add_plain_module("docs").unwrap();
    project.add_cabal_module("app").unwrap();
    let cabal = project
        .fake_cabal(&script(&project.invocation_log(), fail_build_in))
        .unwrap();
    project
        .write_workspace_file(&format!(
            "[workspace]\nmembers = [\"core\", \"docs\", \"app\"]\n\n[build]\ncabal-path = \"{}\"\n",
            cabal.display()
        ))
        .unwrap();
    project
}

#[test]
fn builds_workspace_members_in_order() {
    let project = project("none");

    cabal_e()
        .current_dir(project.path())
        .assert()
        .success()
        .stdout(contains("==> cabal configure"))
        .stdout(contains(
            "warning: [cabal] The package list for 'hackage.haskell.org' is 41 days old.",
        ))
        .stdout(contains("Main.hs:1:1 Top-level binding with no type signature: main"));

    let calls = project.invocations();
    assert_eq!(calls.len(), 4, "{:?}", calls);
    assert!(calls[0].starts_with("configure ") && calls[0].ends_with("/core"));
    assert!(calls[1].starts_with("build ") && calls[1].ends_with("/core"));
    assert!(calls[2].starts_with("configure ") && calls[2].ends_with("/app"));
    assert!(calls[3].starts_with("build ") && calls[3].ends_with("/app"));
}

#[test]
fn build_failure_stops_and_exits_with_one() {
    let project = project("core");

    cabal_e()
        .current_dir(project.path())
        .assert()
        .code(1)
        .stdout(contains("error: [ghc]"))
        .stdout(contains("src/Main.hs:3:1 Not in scope: `foo'"))
        .stdout(contains("error: [cabal] build errors."));

    let calls = project.invocations();
    assert_eq!(calls.len(), 2, "{:?}", calls);
    assert!(calls.iter().all(|c| c.ends_with("/core")));
}

#[test]
fn explicit_modules_override_workspace() {
    let project = project("none");

    cabal_e()
        .current_dir(project.path())
        .arg("app")
        .assert()
        .success();

    let calls = project.invocations();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.ends_with("/app")));
}

#[cfg(feature = "uses_serde")]
#[test]
fn json_messages_one_per_line() {
    let project = project("app");

    let output = cabal_e()
        .current_dir(project.path())
        .args(["--message-format", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let values: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let ghc_error = values
        .iter()
        .find(|v| v["origin"] == "compiler_message" && v["severity"] == "error")
        .expect("compiler error in output");
    assert_eq!(ghc_error["line"], 3);
    assert_eq!(ghc_error["column"], 1);
    assert!(ghc_error["source_file"]
        .as_str()
        .unwrap()
        .ends_with("app/src/Main.hs"));
    assert_eq!(values.last().unwrap()["text"], "build errors.");
}

#[test]
fn missing_cabal_executable_aborts() {
    let project = TestProject::new("solo").unwrap();
    project.add_cabal_module("core").unwrap();

    cabal_e()
        .current_dir(project.path())
        .args(["--cabal-path", "/definitely/not/here/cabal", "core"])
        .assert()
        .code(1)
        .stdout(contains("error: [cabal] failed to start `/definitely/not/here/cabal configure`"));
}

/// Puts an executable copy of `body` at `<project>/tools/cabal`.
fn tools_cabal(project: &TestProject, body: &str) -> std::path::PathBuf {
    let script = project.fake_cabal(body).unwrap();
    let tools = project.path().join("tools");
    std::fs::create_dir_all(&tools).unwrap();
    let target = tools.join("cabal");
    std::fs::copy(&script, &target).unwrap();
    target
}

#[test]
fn relative_cabal_path_on_command_line_is_found_from_the_invocation_dir() {
    let project = TestProject::new("relative").unwrap();
    project.add_cabal_module("core").unwrap();
    let log = project.invocation_log();
    tools_cabal(&project, &format!("echo \"$1 $(pwd)\" >> '{}'", log.display()));

    cabal_e()
        .current_dir(project.path())
        .args(["--cabal-path", "./tools/cabal", "core"])
        .assert()
        .success()
        .stdout(contains("failed to start").not());

    let calls = project.invocations();
    assert_eq!(calls.len(), 2, "{:?}", calls);
    assert!(calls.iter().all(|c| c.ends_with("/core")));
}

#[test]
fn relative_cabal_path_in_workspace_file_is_found_from_the_file_dir() {
    let project = TestProject::new("relative-file").unwrap();
    project.add_cabal_module("core").unwrap();
    let log = project.invocation_log();
    tools_cabal(&project, &format!("echo \"$1 $(pwd)\" >> '{}'", log.display()));
    project
        .write_workspace_file("[workspace]\nmembers = [\"core\"]\n\n[build]\ncabal-path = \"tools/cabal\"\n")
        .unwrap();

    cabal_e()
        .current_dir(project.path())
        .args(["--config", "cabal-e.toml"])
        .assert()
        .success()
        .stdout(contains("failed to start").not());

    assert_eq!(project.invocations().len(), 2);
}

#[test]
fn directory_without_descriptor_is_a_no_op() {
    let project = TestProject::new("plain").unwrap();

    cabal_e()
        .current_dir(project.path())
        .args(["--cabal-path", "/definitely/not/here/cabal"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// Waiting for the tool has no timeout: the phase only ends when the process
// exits, even after it has closed its output. A hung tool hangs the build.
#[test]
fn phase_waits_for_exit_after_output_closes() {
    let project = TestProject::new("slow").unwrap();
    let module = project.add_cabal_module("core").unwrap();
    let cabal = project
        .fake_cabal("echo 'Warning: closing'\necho 'output now'\nexec >&- 2>&-\nsleep 1\nexit 3")
        .unwrap();
    let tool = CabalTool::new(BuildOptions {
        cabal_path: cabal,
        ..BuildOptions::default()
    });
    let mut sink = CollectingSink::default();

    let started = Instant::now();
    let result = run_phase(
        &tool,
        Phase::Build,
        &module.join("core.cabal"),
        &module,
        &mut sink,
    )
    .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(900));
    assert_eq!(result.exit_code, 3);
    assert!(!result.succeeded());
    let severities: Vec<Severity> = sink.diagnostics().map(|d| d.severity).collect();
    assert_eq!(
        severities,
        vec![Severity::Info, Severity::Warning, Severity::Error]
    );
}
