use crate::paths::{self, ResolveError, ToolPaths};
use std::{
    env,
    path::{Path, PathBuf},
};

/// Values the command line may supply in place of the resolved defaults.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
    pub tools_dir: Option<PathBuf>,
    pub strict_exit: bool,
}

/// Everything the download stage needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub tools: ToolPaths,
    pub strict_exit: bool,
}

pub fn load_app_config(overrides: &Overrides) -> Result<AppConfig, ResolveError> {
    let base_dir = match &overrides.tools_dir {
        Some(dir) => dir.clone(),
        None => paths::executable_dir()?,
    };
    load_app_config_from(overrides, paths::host_os_identifier(), &base_dir, |var| {
        env::var(var).ok()
    })
}

/// Executables are checked before the output directory so a missing tool is
/// reported even on hosts without a default video folder.
pub fn load_app_config_from<F>(
    overrides: &Overrides,
    os: &str,
    base_dir: &Path,
    env: F,
) -> Result<AppConfig, ResolveError>
where
    F: Fn(&str) -> Option<String>,
{
    let tools = paths::resolve_executable_paths(base_dir, os)?;
    let output_dir = match &overrides.output_dir {
        Some(dir) => dir.clone(),
        None => paths::resolve_output_directory(os, env)?,
    };
    Ok(AppConfig {
        output_dir,
        tools,
        strict_exit: overrides.strict_exit,
    })
}
