//! Interactive URL prompt.

use std::io::{self, BufRead, Write};
use tracing::debug;

pub const URL_PROMPT: &str = "Please paste the video url here. Youtube or Vimeo only: ";

const SUPPORTED_HOSTS: [&str; 2] = ["youtube.com", "vimeo.com"];

/// Case-insensitive substring check; no URL parsing is attempted.
pub fn is_supported_url(input: &str) -> bool {
    let lower = input.to_lowercase();
    SUPPORTED_HOSTS.iter().any(|host| lower.contains(host))
}

/// Prompts until a line mentions a supported host. Rejected lines are skipped
/// without comment. Running out of input first is an `UnexpectedEof` error.
pub fn read_video_url<R, W>(mut input: R, mut output: W) -> io::Result<String>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(output, "{URL_PROMPT}")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before a YouTube or Vimeo url was entered",
            ));
        }

        let candidate = line.trim();
        if is_supported_url(candidate) {
            return Ok(candidate.to_string());
        }
        debug!(input = candidate, "ignoring unsupported url");
    }
}
