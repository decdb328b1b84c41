//! External tool detection and management.
//!
//! AtomicParsley is expected to ship next to the program that uses it, so
//! lookups check the running executable's directory before `PATH`.

use crate::{Error, Result, ToolCommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Base name of the tagging tool.
pub const ATOMICPARSLEY: &str = "AtomicParsley";

/// Base name of the duration query tool.
pub const MEDIAINFO: &str = "mediainfo";

/// How long a version check may take before the tool counts as unavailable.
const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Platform file name for a tool, e.g. `AtomicParsley.exe` on Windows.
pub fn executable_name(name: &str) -> String {
    format!("{}{}", name, std::env::consts::EXE_SUFFIX)
}

/// Path `name` would have if it sat next to the running executable.
///
/// # Errors
///
/// Returns an error if the current executable's location is unknown.
pub fn sibling_of_current_exe(name: &str) -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe
        .parent()
        .ok_or_else(|| Error::InvalidInput(format!("no parent directory for {:?}", exe)))?;
    Ok(dir.join(executable_name(name)))
}

/// Check if a tool is available and get its information.
///
/// `program` may be a bare name (looked up on `PATH`) or a full path.
///
/// # Example
///
/// ```no_run
/// use tagforged_av::check_tool;
/// use std::path::Path;
///
/// let info = check_tool(Path::new("AtomicParsley"), "--version");
/// if info.available {
///     println!("AtomicParsley version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(program: &Path, version_arg: &str) -> ToolInfo {
    check_tool_within(program, version_arg, VERSION_CHECK_TIMEOUT)
}

fn check_tool_within(program: &Path, version_arg: &str, timeout: Duration) -> ToolInfo {
    let name = program
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| program.to_string_lossy().to_string());

    let result = ToolCommand::new(program.to_path_buf())
        .arg(version_arg)
        .timeout(timeout)
        .execute();

    match result {
        Ok(output) if output.success() => {
            let version = output
                .stdout
                .lines()
                .find(|l| !l.trim().is_empty())
                .map(|s| s.trim().to_string());

            let path = if program.components().count() > 1 {
                Some(program.to_path_buf())
            } else {
                which::which(program).ok()
            };

            ToolInfo {
                name,
                available: true,
                version,
                path,
            }
        }
        Ok(output) => {
            tracing::debug!(
                "{} version check failed (exit {:?}, timed out: {})",
                name,
                output.exit_code,
                output.timed_out
            );
            ToolInfo::unavailable(name)
        }
        Err(e) => {
            tracing::debug!("{} version check failed: {}", name, e);
            ToolInfo::unavailable(name)
        }
    }
}

impl ToolInfo {
    fn unavailable(name: String) -> Self {
        Self {
            name,
            available: false,
            version: None,
            path: None,
        }
    }
}

/// Require that a tool is available on `PATH`, returning its path.
///
/// # Errors
///
/// Returns an error if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Decide where a tool lives.
///
/// Order: a configured path that exists, the executable's own directory,
/// then `PATH`. When none of those has it, the sibling location (or the bare
/// name) is returned so the eventual launch reports the tool as missing.
pub fn resolve_tool(name: &str, configured: Option<&Path>) -> PathBuf {
    if let Some(path) = configured {
        if path.exists() {
            return path.to_path_buf();
        }
        tracing::warn!(
            "Configured {} path {:?} does not exist, searching elsewhere",
            name,
            path
        );
    }

    let sibling = sibling_of_current_exe(name).ok();
    if let Some(ref path) = sibling {
        if path.exists() {
            return path.clone();
        }
    }

    if let Ok(path) = require_tool(name) {
        return path;
    }

    tracing::debug!("{} not found next to the executable or on PATH", name);
    sibling.unwrap_or_else(|| PathBuf::from(executable_name(name)))
}
