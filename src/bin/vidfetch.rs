#![forbid(unsafe_code)]

//! Interactive downloader: asks for a YouTube or Vimeo link and saves the
//! video into the user's Videos (Windows) or Movies (macOS) folder using the
//! yt-dlp and FFmpeg builds shipped next to this binary.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{io, path::PathBuf};
use tracing_subscriber::EnvFilter;
use vidfetch::{
    config::{self, Overrides},
    download,
    paths::ResolveError,
    prompt,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Download a YouTube or Vimeo video with the bundled yt-dlp and FFmpeg."
)]
struct Cli {
    #[arg(
        long = "output-dir",
        value_name = "PATH",
        help = "Save into PATH instead of the platform Videos/Movies folder"
    )]
    output_dir: Option<PathBuf>,
    #[arg(
        long = "tools-dir",
        value_name = "PATH",
        help = "Directory holding ffmpeg/ and yt-dlp/ (default: next to this binary)"
    )]
    tools_dir: Option<PathBuf>,
    #[arg(
        long = "strict-exit",
        help = "Exit with a failure status when the download itself fails"
    )]
    strict_exit: bool,
    #[arg(short = 'v', long = "verbose", help = "Print debug diagnostics to stderr")]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            output_dir: self.output_dir.clone(),
            tools_dir: self.tools_dir.clone(),
            strict_exit: self.strict_exit,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let app = match config::load_app_config(&cli.overrides()) {
        Ok(app) => app,
        // The resolver has already printed which executable is missing.
        Err(ResolveError::MissingExecutable { .. }) => std::process::exit(1),
        Err(err) => return Err(err.into()),
    };

    let url = prompt::read_video_url(io::stdin().lock(), io::stdout())
        .context("reading the video url")?;

    if let Err(err) = download::download_video(&app.tools, &url, &app.output_dir) {
        download::report_failure(&err);
        if app.strict_exit {
            bail!("download of {url} failed: {err}");
        }
    }

    Ok(())
}

/// `RUST_LOG` wins when set; otherwise only warnings unless `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
