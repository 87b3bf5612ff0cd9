#![allow(unused_imports, dead_code)]
// common/test_prelude.rs

// Re-export commonly used items for integration tests.
pub use assert_cmd::Command;
pub use predicates::prelude::*;
pub use predicates::str::contains;

/// The `cabal-e` binary with logging off and colors disabled.
pub fn cabal_e() -> Command {
    let mut cmd = Command::cargo_bin("cabal-e").expect("cabal-e binary is built for tests");
    cmd.env_remove("RUST_LOG").env_remove("CABAL").arg("--no-color");
    cmd
}
