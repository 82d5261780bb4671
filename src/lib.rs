#![forbid(unsafe_code)]

//! Public entry point for the vidfetch crate.
//!
//! The binary is a thin wrapper: it resolves an [`config::AppConfig`], asks
//! for a URL and hands everything to [`download::download_video`]. Each stage
//! lives in its own module so it can be tested without spawning the binary.

pub mod config;
pub mod download;
pub mod paths;
pub mod prompt;
pub mod sanitize;
