mod errors;

use std::path::PathBuf;

use clap::Parser;
use libherokubuildpack::log::{log_header, log_info};
use release_artifacts::{is_ota_package, select_upload_set};
use upload_config::{load_config, Recency, UploadConfig};
use uploader_tool::{provision, upload, HttpFetcher};

use crate::errors::{on_error, ReleaseUploadError};

// Silence unused dependency warning for
// dependencies only used in tests
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use test_support as _;

const TOOL_NAME: &str = "Release Upload";

/// Uploads a device build's latest release package and partition images.
#[derive(Parser, Debug)]
#[command(name = "release-upload", version)]
struct Cli {
    /// Device name, files are taken from `<product-dir>/<DEVICE>`
    #[arg(
        value_name = "DEVICE",
        required_unless_present = "file",
        conflicts_with = "file"
    )]
    device: Option<String>,

    /// Upload this file instead of scanning a build directory
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Configuration file [default: release-upload.toml, when present]
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// How the latest package is recognised from its name
    #[arg(long, value_name = "timestamp|version")]
    recency: Option<Recency>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            // --help and --version also arrive here, on stdout.
            let code = i32::from(error.use_stderr());
            error.print().unwrap_or_default();
            std::process::exit(code);
        }
    };

    match run(&cli) {
        Ok(()) => std::process::exit(0),
        Err(error) => {
            on_error(&error);
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<(), ReleaseUploadError> {
    log_header(TOOL_NAME);
    let mut config = load_config(cli.config.as_deref()).map_err(ReleaseUploadError::Config)?;
    if let Some(recency) = cli.recency {
        config.selection.recency = recency;
    }
    log_info(config.to_string());

    provision(&config.provision, &HttpFetcher).map_err(ReleaseUploadError::Provision)?;

    let files = collect_files(cli, &config)?;
    if files.is_empty() {
        log_info("No files found for upload. Exiting.");
        return Ok(());
    }

    upload(&config.dispatch, &config.provision.binary, &files)
        .map_err(ReleaseUploadError::Dispatch)
}

fn collect_files(cli: &Cli, config: &UploadConfig) -> Result<Vec<PathBuf>, ReleaseUploadError> {
    if let Some(file) = &cli.file {
        if !file.is_file() {
            return Err(ReleaseUploadError::FileMissing(file.clone()));
        }
        let file_name = file.file_name().map(|n| n.to_string_lossy());
        if file_name.is_some_and(|n| is_ota_package(&n, &config.selection)) {
            log_info(format!("Ignoring OTA package: {}", file.display()));
            return Ok(vec![]);
        }
        return Ok(vec![file.clone()]);
    }

    let Some(device) = &cli.device else {
        return Ok(vec![]);
    };
    let build_dir = config.build_dir(device);
    log_info(format!("Scanning {}", build_dir.display()));
    let upload_set = select_upload_set(&build_dir, &config.selection);
    log_info(upload_set.to_string());
    Ok(upload_set.files())
}
