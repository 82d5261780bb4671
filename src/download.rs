//! Runs yt-dlp for a single URL and reports how it went.
//!
//! yt-dlp does all of the fetching. FFmpeg is never started from here: its
//! path is handed to yt-dlp through `--ffmpeg-location` so it can merge the
//! separate audio and video streams into one MP4.

use crate::paths::ToolPaths;
use std::{
    fmt, fs,
    io::{self, Write},
    path::Path,
    process::{Command, ExitStatus},
};
use thiserror::Error;
use tracing::{debug, warn};

pub const IMPERSONATE_TARGET: &str = "Safari";
/// Best separate streams merged, else the best single file.
pub const FORMAT_SELECTOR: &str = "bestvideo+bestaudio/best";
pub const MERGE_OUTPUT_FORMAT: &str = "mp4";
/// Filled in by yt-dlp at runtime.
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchFailureKind {
    NotFound,
    PermissionDenied,
}

impl fmt::Display for LaunchFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchFailureKind::NotFound => f.write_str("yt-dlp could not be found"),
            LaunchFailureKind::PermissionDenied => {
                f.write_str("permission denied while starting yt-dlp")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("yt-dlp failed ({status})")]
    ChildProcessFailure { status: ExitStatus },
    #[error("{kind}: {source}")]
    LaunchFailure {
        kind: LaunchFailureKind,
        command: String,
        source: io::Error,
    },
    #[error("An unexpected error occurred while {action}: {source}")]
    Unexpected { action: String, source: io::Error },
}

/// Builds the yt-dlp invocation. The argument order is fixed and the URL is
/// always the final positional argument.
pub fn build_download_command(tools: &ToolPaths, url: &str, output_dir: &Path) -> Command {
    let mut command = Command::new(&tools.yt_dlp);
    command
        .arg("--impersonate")
        .arg(IMPERSONATE_TARGET)
        .arg("--format")
        .arg(FORMAT_SELECTOR)
        .arg("--merge-output-format")
        .arg(MERGE_OUTPUT_FORMAT)
        .arg("--ffmpeg-location")
        .arg(&tools.ffmpeg)
        .arg("--output")
        .arg(output_dir.join(OUTPUT_TEMPLATE))
        .arg(url);
    command
}

/// Renders a command the way it would be typed, for diagnostics only. No
/// shell quoting is applied.
pub fn format_command(command: &Command) -> String {
    let mut printable = command.get_program().to_string_lossy().into_owned();
    for arg in command.get_args() {
        printable.push(' ');
        printable.push_str(&arg.to_string_lossy());
    }
    printable
}

/// Creates `output_dir` if needed, then runs yt-dlp in the foreground with the
/// terminal attached so its progress output stays visible.
pub fn download_video(tools: &ToolPaths, url: &str, output_dir: &Path) -> Result<(), DownloadError> {
    fs::create_dir_all(output_dir).map_err(|source| DownloadError::Unexpected {
        action: format!("creating {}", output_dir.display()),
        source,
    })?;

    let mut command = build_download_command(tools, url, output_dir);
    let printable = format_command(&command);
    debug!(command = %printable, "starting yt-dlp");

    println!(
        "Video downloading now, and will be output to {}.",
        output_dir.display()
    );
    println!("The console will close automatically when the video is downloaded.");

    let status = command
        .status()
        .map_err(|err| classify_spawn_error(err, printable))?;
    if !status.success() {
        return Err(DownloadError::ChildProcessFailure { status });
    }

    println!(
        "Video downloaded and merged successfully to {}",
        output_dir.display()
    );
    Ok(())
}

fn classify_spawn_error(err: io::Error, command: String) -> DownloadError {
    let kind = match err.kind() {
        io::ErrorKind::NotFound => LaunchFailureKind::NotFound,
        io::ErrorKind::PermissionDenied => LaunchFailureKind::PermissionDenied,
        _ => {
            return DownloadError::Unexpected {
                action: "running yt-dlp".to_string(),
                source: err,
            };
        }
    };
    DownloadError::LaunchFailure {
        kind,
        command,
        source: err,
    }
}

/// Prints the failure report to stdout. Only launch failures echo the
/// attempted command line.
pub fn report_failure(err: &DownloadError) {
    debug!(error = %err, "download failed");
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(write_err) = write_failure_report(err, &mut out) {
        warn!(error = %write_err, "could not print failure report");
    }
}

pub fn write_failure_report<W: Write>(err: &DownloadError, out: &mut W) -> io::Result<()> {
    match err {
        DownloadError::ChildProcessFailure { .. } => writeln!(out, "Error: {err}"),
        DownloadError::LaunchFailure { command, .. } => {
            writeln!(out, "Error: {err}")?;
            writeln!(out, "Command attempted: {command}")
        }
        DownloadError::Unexpected { .. } => writeln!(out, "{err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::tempdir;

    // Writing a script and exec'ing it while another test forks can hit
    // ETXTBSY, so stub-based tests run one at a time.
    static STUB_LOCK: Mutex<()> = Mutex::new(());

    fn sample_tools() -> ToolPaths {
        ToolPaths {
            yt_dlp: PathBuf::from("/opt/vidfetch/yt-dlp/yt-dlp"),
            ffmpeg: PathBuf::from("/opt/vidfetch/ffmpeg/ffmpeg"),
        }
    }

    /// Installs a fake yt-dlp that records its arguments next to itself.
    #[cfg(unix)]
    fn install_ytdlp_stub(dir: &Path, exit_code: i32, mode: u32) -> PathBuf {
        let script_path = dir.join("yt-dlp");
        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > \"$(dirname \"$0\")/args.txt\"\nexit {exit_code}\n"
        );
        fs::write(&script_path, script).unwrap();
        let mut perms = fs::metadata(&script_path).unwrap().permissions();
        perms.set_mode(mode);
        fs::set_permissions(&script_path, perms).unwrap();
        script_path
    }

    #[test]
    fn command_has_fixed_shape() {
        let tools = sample_tools();
        let command = build_download_command(
            &tools,
            "https://vimeo.com/1",
            Path::new("/home/alice/Movies"),
        );
        assert_eq!(command.get_program(), tools.yt_dlp.as_os_str());
        let args: Vec<String> = command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        let template = Path::new("/home/alice/Movies")
            .join(OUTPUT_TEMPLATE)
            .to_string_lossy()
            .into_owned();
        assert_eq!(
            args,
            vec![
                "--impersonate",
                "Safari",
                "--format",
                "bestvideo+bestaudio/best",
                "--merge-output-format",
                "mp4",
                "--ffmpeg-location",
                "/opt/vidfetch/ffmpeg/ffmpeg",
                "--output",
                template.as_str(),
                "https://vimeo.com/1",
            ]
        );
    }

    #[test]
    fn format_command_joins_program_and_args() {
        let mut command = Command::new("yt-dlp");
        command.arg("--format").arg("best");
        assert_eq!(format_command(&command), "yt-dlp --format best");
        assert_eq!(format_command(&Command::new("yt-dlp")), "yt-dlp");
    }

    #[test]
    fn missing_downloader_is_a_not_found_launch_failure() {
        let dir = tempdir().unwrap();
        let tools = ToolPaths {
            yt_dlp: dir.path().join("yt-dlp").join("yt-dlp"),
            ffmpeg: dir.path().join("ffmpeg").join("ffmpeg"),
        };
        let err = download_video(&tools, "https://youtube.com/watch?v=a", &dir.path().join("out"))
            .unwrap_err();
        match &err {
            DownloadError::LaunchFailure { kind, command, .. } => {
                assert_eq!(*kind, LaunchFailureKind::NotFound);
                assert!(command.ends_with("https://youtube.com/watch?v=a"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(dir.path().join("out").is_dir());
    }

    #[test]
    fn unwritable_output_dir_is_unexpected() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a dir").unwrap();
        let err = download_video(&sample_tools(), "https://vimeo.com/1", &blocker.join("out"))
            .unwrap_err();
        assert!(matches!(err, DownloadError::Unexpected { .. }));
        assert!(err.to_string().starts_with("An unexpected error occurred while creating"));
    }

    #[test]
    fn launch_failure_report_echoes_command() {
        let err = DownloadError::LaunchFailure {
            kind: LaunchFailureKind::PermissionDenied,
            command: "yt-dlp --format best https://vimeo.com/1".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let mut out = Vec::new();
        write_failure_report(&err, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Error: permission denied while starting yt-dlp"));
        assert!(text.contains("Command attempted: yt-dlp --format best https://vimeo.com/1"));
    }

    #[test]
    fn unexpected_report_is_generic() {
        let err = DownloadError::Unexpected {
            action: "running yt-dlp".into(),
            source: io::Error::other("boom"),
        };
        let mut out = Vec::new();
        write_failure_report(&err, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "An unexpected error occurred while running yt-dlp: boom\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn successful_run_passes_arguments_and_creates_output_dir() {
        let _guard = STUB_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempdir().unwrap();
        let stub = install_ytdlp_stub(dir.path(), 0, 0o755);
        let tools = ToolPaths {
            yt_dlp: stub,
            ffmpeg: dir.path().join("ffmpeg"),
        };
        let output_dir = dir.path().join("Movies").join("nested");

        download_video(&tools, "https://youtube.com/watch?v=abc", &output_dir).unwrap();

        assert!(output_dir.is_dir());
        let recorded = fs::read_to_string(dir.path().join("args.txt")).unwrap();
        let args: Vec<&str> = recorded.lines().collect();
        assert_eq!(args.len(), 11);
        assert_eq!(args[7], dir.path().join("ffmpeg").to_string_lossy());
        assert_eq!(
            args[9],
            output_dir.join("%(title)s.%(ext)s").to_string_lossy()
        );
        assert_eq!(args.last(), Some(&"https://youtube.com/watch?v=abc"));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_a_child_failure() {
        let _guard = STUB_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempdir().unwrap();
        let stub = install_ytdlp_stub(dir.path(), 3, 0o755);
        let tools = ToolPaths {
            yt_dlp: stub,
            ffmpeg: dir.path().join("ffmpeg"),
        };

        let err = download_video(&tools, "https://vimeo.com/1", &dir.path().join("out"))
            .unwrap_err();
        match &err {
            DownloadError::ChildProcessFailure { status } => assert_eq!(status.code(), Some(3)),
            other => panic!("unexpected error: {other}"),
        }

        let mut out = Vec::new();
        write_failure_report(&err, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Error: yt-dlp failed"));
        assert!(!text.contains("Command attempted"));
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_downloader_is_permission_denied() {
        let _guard = STUB_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempdir().unwrap();
        let stub = install_ytdlp_stub(dir.path(), 0, 0o644);
        let tools = ToolPaths {
            yt_dlp: stub,
            ffmpeg: dir.path().join("ffmpeg"),
        };

        let err = download_video(&tools, "https://vimeo.com/1", &dir.path().join("out"))
            .unwrap_err();
        assert!(matches!(
            err,
            DownloadError::LaunchFailure {
                kind: LaunchFailureKind::PermissionDenied,
                ..
            }
        ));
    }
}
