//! Locates the default video folder and the bundled yt-dlp/FFmpeg binaries.
//!
//! Everything here takes the OS identifier and the environment as arguments so
//! the Windows and macOS branches can be exercised from any host.

use std::{
    env, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

pub const WINDOWS_OS: &str = "Windows";
pub const MACOS_OS: &str = "Darwin";

const FFMPEG_DIR: &str = "ffmpeg";
const FFMPEG_STEM: &str = "ffmpeg";
const YT_DLP_DIR: &str = "yt-dlp";
const YT_DLP_STEM: &str = "yt-dlp";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Unsupported operating system: {0}")]
    UnsupportedPlatform(String),
    #[error("{var} is not set, cannot locate the default video folder")]
    MissingEnvironment { var: &'static str },
    #[error("{tool} not found at {}", .path.display())]
    MissingExecutable { tool: &'static str, path: PathBuf },
    #[error("Could not determine the directory of the running executable: {0}")]
    BaseDirectory(#[source] io::Error),
}

/// The two host families this tool knows how to lay out. Everything else is
/// `Other`, which still gets Unix-style executable names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Other,
}

impl Platform {
    pub fn from_identifier(os: &str) -> Self {
        match os {
            WINDOWS_OS => Platform::Windows,
            MACOS_OS => Platform::MacOs,
            _ => Platform::Other,
        }
    }

    fn separator(self) -> char {
        match self {
            Platform::Windows => '\\',
            Platform::MacOs | Platform::Other => '/',
        }
    }

    fn executable_name(self, stem: &str) -> String {
        match self {
            Platform::Windows => format!("{stem}.exe"),
            Platform::MacOs | Platform::Other => stem.to_string(),
        }
    }

    /// Joins with this platform's separator rather than the host's, so a
    /// Windows profile path stays a Windows path when resolved elsewhere.
    /// Windows accepts `/` as well, so both are trimmed there.
    fn join(self, base: &str, child: &str) -> PathBuf {
        let sep = self.separator();
        let trimmed = match self {
            Platform::Windows => base.trim_end_matches(['\\', '/']),
            Platform::MacOs | Platform::Other => base.trim_end_matches(sep),
        };
        let mut joined = trimmed.to_string();
        joined.push(sep);
        joined.push_str(child);
        PathBuf::from(joined)
    }
}

/// Absolute locations of the two external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub yt_dlp: PathBuf,
    pub ffmpeg: PathBuf,
}

/// Maps the compile-time OS name onto the identifiers used throughout this
/// module (`Windows`, `Darwin`, `Linux`, ...).
pub fn host_os_identifier() -> &'static str {
    match env::consts::OS {
        "windows" => WINDOWS_OS,
        "macos" => MACOS_OS,
        "linux" => "Linux",
        "freebsd" => "FreeBSD",
        other => other,
    }
}

/// Returns `<USERPROFILE>\Videos` on Windows and `<HOME>/Movies` on macOS.
/// No directory is created here.
pub fn resolve_output_directory<F>(os: &str, env: F) -> Result<PathBuf, ResolveError>
where
    F: Fn(&str) -> Option<String>,
{
    let platform = Platform::from_identifier(os);
    let (var, folder) = match platform {
        Platform::Windows => ("USERPROFILE", "Videos"),
        Platform::MacOs => ("HOME", "Movies"),
        Platform::Other => return Err(ResolveError::UnsupportedPlatform(os.to_string())),
    };
    let base = env(var)
        .filter(|value| !value.is_empty())
        .ok_or(ResolveError::MissingEnvironment { var })?;
    let output_dir = platform.join(&base, folder);
    debug!(output_dir = %output_dir.display(), "resolved output directory");
    Ok(output_dir)
}

/// Directory holding the running binary; the tool subdirectories live next to it.
pub fn executable_dir() -> Result<PathBuf, ResolveError> {
    let exe = env::current_exe().map_err(ResolveError::BaseDirectory)?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        ResolveError::BaseDirectory(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} has no parent directory", exe.display()),
        ))
    })
}

/// Builds `<base>/ffmpeg/ffmpeg[.exe]` and `<base>/yt-dlp/yt-dlp[.exe]` and
/// checks both exist, FFmpeg first. Prints the resolved paths on success and
/// the missing one on failure.
pub fn resolve_executable_paths(base_dir: &Path, os: &str) -> Result<ToolPaths, ResolveError> {
    let platform = Platform::from_identifier(os);
    let ffmpeg = base_dir
        .join(FFMPEG_DIR)
        .join(platform.executable_name(FFMPEG_STEM));
    let yt_dlp = base_dir
        .join(YT_DLP_DIR)
        .join(platform.executable_name(YT_DLP_STEM));

    if let Err(err) =
        ensure_present("FFmpeg", &ffmpeg).and_then(|()| ensure_present("yt-dlp", &yt_dlp))
    {
        println!("Error: {err}");
        return Err(err);
    }

    println!("FFmpeg path: {}", ffmpeg.display());
    println!("yt-dlp path: {}", yt_dlp.display());

    Ok(ToolPaths { yt_dlp, ffmpeg })
}

fn ensure_present(tool: &'static str, path: &Path) -> Result<(), ResolveError> {
    if path.exists() {
        debug!(tool, path = %path.display(), "found bundled executable");
        return Ok(());
    }
    Err(ResolveError::MissingExecutable {
        tool,
        path: path.to_path_buf(),
    })
}
