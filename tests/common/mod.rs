//! Shared fixtures for integration tests.
//!
//! [`FakeTool`] writes a small shell script that stands in for
//! AtomicParsley, so tagging can be exercised end to end without the real
//! binary installed.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A stand-in AtomicParsley executable living in its own temp directory.
pub struct FakeTool {
    dir: TempDir,
    pub path: PathBuf,
    pub args_file: PathBuf,
}

impl FakeTool {
    fn with_body(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("AtomicParsley");
        let args_file = dir.path().join("args.txt");

        let script = format!(
            "#!/bin/sh\n{}\n",
            body.replace("{args}", &args_file.display().to_string())
        );
        std::fs::write(&path, script).expect("failed to write fake tool");
        make_executable(&path);

        Self {
            dir,
            path,
            args_file,
        }
    }

    /// Records every argument, one per line, then exits 0.
    pub fn recording() -> Self {
        Self::with_body(
            r#": > "{args}"
for arg in "$@"; do
  printf '%s\n' "$arg" >> "{args}"
done
echo "Started writing to temp file."
echo "Finished writing to temp file."
exit 0"#,
        )
    }

    /// Records its arguments, complains on stderr and exits with `code`.
    pub fn failing(code: i32) -> Self {
        Self::with_body(&format!(
            r#"printf '%s\n' "$@" > "{{args}}"
echo "AtomicParsley error: unsupported file" >&2
exit {code}"#
        ))
    }

    /// Never exits on its own.
    pub fn hanging() -> Self {
        Self::with_body("exec sleep 30")
    }

    /// Never exits on its own, and leaves a child holding its output pipes.
    pub fn hanging_wrapper() -> Self {
        Self::with_body(
            r#"echo "Started writing to temp file."
sleep 30
echo "unreachable""#,
        )
    }

    /// Arguments the tool was last called with, if it ran.
    pub fn recorded_args(&self) -> Option<Vec<String>> {
        let content = std::fs::read_to_string(&self.args_file).ok()?;
        Some(content.lines().map(str::to_string).collect())
    }

    /// Directory holding the tool, handy for placing media files.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Create an empty "media" file inside `dir`.
pub fn media_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"\0\0\0\x20ftypM4V ").expect("failed to write media file");
    path
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o755);
    std::fs::set_permissions(path, perms).expect("failed to chmod fake tool");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}
