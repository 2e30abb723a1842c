//! External tool detection and management.

use std::path::{Path, PathBuf};
use std::process::Command;

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

/// Check if a tool is available and get its information.
///
/// `program` is either a bare name looked up on PATH or a path to the
/// executable itself. The tool counts as available when `-version` exits
/// successfully.
///
/// # Example
///
/// ```no_run
/// use repitch_av::check_tool;
///
/// let info = check_tool("ffmpeg");
/// if info.available {
///     println!("ffmpeg version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(program: impl AsRef<Path>) -> ToolInfo {
    let program = program.as_ref();
    let name = program
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());

    let result = Command::new(program).arg("-version").output();

    match result {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            let path = which::which(program).ok();

            ToolInfo {
                name,
                available: true,
                version,
                path,
            }
        }
        _ => ToolInfo {
            name,
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check the media tools repitch can use.
///
/// `ffmpeg` is the executable jobs will actually run (see [`resolve_tool`]).
/// Only ffmpeg is needed for processing; ffprobe is reported for diagnostics.
pub fn check_tools(ffmpeg: &Path) -> Vec<ToolInfo> {
    vec![check_tool(ffmpeg), check_tool("ffprobe")]
}

/// Executable file name for a tool on the current platform.
pub fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

/// Resolve a tool path without failing.
///
/// Order: explicit path, then a bundled copy in `bundled_dir`, then PATH.
/// When nothing is found the bare name is returned so the spawn error names
/// the missing tool.
pub fn resolve_tool(name: &str, explicit: Option<&Path>, bundled_dir: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        if path.exists() {
            return path.to_path_buf();
        }
        #[cfg(feature = "tracing")]
        tracing::warn!("Configured {} path does not exist: {:?}", name, path);
    }

    if let Some(dir) = bundled_dir {
        let bundled = dir.join(executable_name(name));
        if is_executable(&bundled) {
            return bundled;
        }
    }

    which::which(name).unwrap_or_else(|_| PathBuf::from(name))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
