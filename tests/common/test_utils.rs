#![allow(dead_code)]
use std::fs;
use std::io::Result as IoResult;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// A wrapper around a temporary multi-module project directory.
pub struct TestProject {
    /// The temporary directory. When this is dropped, the directory and its contents are removed.
    pub temp_dir: TempDir,
    /// The root directory for the generated project.
    pub root: PathBuf,
}

impl TestProject {
    pub fn new(project_name: &str) -> IoResult<Self> {
        let temp_dir = tempdir()?;
        let root = temp_dir.path().join(project_name);
        fs::create_dir_all(&root)?;
        Ok(TestProject { temp_dir, root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Add a module directory with a `<name>.cabal` descriptor and a Main.hs.
    pub fn add_cabal_module(&self, name: &str) -> IoResult<PathBuf> {
        let dir = self.root.join(name);
        fs::create_dir_all(dir.join("src"))?;
        fs::write(
            dir.join(format!("{}.cabal", name)),
            format!(
                "name: {}\nversion: 0.1.0.0\nbuild-type: Simple\ncabal-version: >=1.10\n",
                name
            ),
        )?;
        fs::write(dir.join("src").join("Main.hs"), "main = putStrLn \"hi\"\n")?;
        Ok(dir)
    }

    /// Add a module directory without any descriptor.
    pub fn add_plain_module(&self, name: &str) -> IoResult<PathBuf> {
        let dir = self.root.join(name);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("Makefile"), "all:\n")?;
        Ok(dir)
    }

    pub fn write_workspace_file(&self, contents: &str) -> IoResult<PathBuf> {
        let file = self.root.join("cabal-e.toml");
        fs::write(&file, contents)?;
        Ok(file)
    }

    /// Write an executable shell script standing in for cabal.
    #[cfg(unix)]
    pub fn fake_cabal(&self, script_body: &str) -> IoResult<PathBuf> {
        use std::os::unix::fs::PermissionsExt;
        let path = self.temp_dir.path().join("fake-cabal");
        fs::write(&path, format!("#!/bin/sh\n{}\n", script_body))?;
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms)?;
        Ok(path)
    }

    /// Path of the log file fake cabal scripts append their invocations to.
    pub fn invocation_log(&self) -> PathBuf {
        self.temp_dir.path().join("invocations.log")
    }

    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(self.invocation_log())
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
