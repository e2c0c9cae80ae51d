use std::{
    path::{Path, PathBuf},
    process::Command,
};

use libherokubuildpack::log::log_info;
use upload_config::DispatchConfig;

use crate::errors::DispatchError;

/// `<binary> <subcommand> <file>...`, with the parent's stdout and stderr.
#[must_use]
pub fn upload_command(config: &DispatchConfig, binary: &Path, files: &[PathBuf]) -> Command {
    let mut cmd = Command::new(executable_path(binary));
    cmd.arg(&config.subcommand).args(files);
    cmd
}

/// Runs the uploader once for all files and waits for it to exit.
pub fn upload(
    config: &DispatchConfig,
    binary: &Path,
    files: &[PathBuf],
) -> Result<(), DispatchError> {
    if files.is_empty() {
        return Err(DispatchError::NothingToUpload);
    }
    log_info(format!(
        "Uploading files: {}",
        files
            .iter()
            .map(|f| f.display().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    ));

    let status = upload_command(config, binary, files)
        .status()
        .map_err(|e| DispatchError::Spawn(binary.to_path_buf(), e))?;
    if !status.success() {
        return Err(DispatchError::Exited(binary.to_path_buf(), status));
    }
    log_info("Upload completed successfully!");
    Ok(())
}

// A bare file name would be looked up on PATH; the uploader lives in the working directory.
fn executable_path(binary: &Path) -> PathBuf {
    if binary.is_relative() && binary.components().count() == 1 {
        Path::new(".").join(binary)
    } else {
        binary.to_path_buf()
    }
}
