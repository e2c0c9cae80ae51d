use std::{env::consts::ARCH, fs::File, io, path::Path};

use flate2::read::GzDecoder;
use libherokubuildpack::log::log_info;
use tar::Archive;
use upload_config::ProvisionConfig;
use url::Url;

use crate::errors::ProvisionError;

/// Retrieves a remote archive into a local file.
pub trait Fetch {
    fn fetch(&self, url: &Url, destination: &Path) -> Result<(), ProvisionError>;
}

/// Plain HTTP GET, no retries and no checksum.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpFetcher;

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &Url, destination: &Path) -> Result<(), ProvisionError> {
        let response = ureq::get(url.as_str())
            .call()
            .map_err(|e| ProvisionError::DownloadError(url.to_string(), Box::new(e)))?;
        let mut output = File::create(destination)
            .map_err(|e| ProvisionError::DownloadWriteError(destination.to_path_buf(), e))?;
        io::copy(&mut response.into_reader(), &mut output)
            .map_err(|e| ProvisionError::DownloadWriteError(destination.to_path_buf(), e))?;
        Ok(())
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Provisioned {
    AlreadyPresent,
    Downloaded { url: Url },
}

/// Makes sure the uploader exists at `config.binary`, downloading it for this machine if not.
pub fn provision(
    config: &ProvisionConfig,
    fetcher: &impl Fetch,
) -> Result<Provisioned, ProvisionError> {
    provision_for_arch(config, ARCH, fetcher)
}

pub fn provision_for_arch(
    config: &ProvisionConfig,
    arch: &str,
    fetcher: &impl Fetch,
) -> Result<Provisioned, ProvisionError> {
    let binary_name = config
        .binary_name()
        .ok_or_else(|| ProvisionError::BinaryNameMissing(config.binary.clone()))?;

    // Presence is the only check; a stale binary is kept.
    if config.binary.is_file() {
        log_info(format!("{binary_name} binary found, skipping download."));
        return Ok(Provisioned::AlreadyPresent);
    }

    let url = resolve_download_url(config, arch)?;
    log_info(format!("Downloading {binary_name} for architecture {arch}: {url}"));
    fetcher.fetch(&url, &config.archive)?;

    log_info(format!("Extracting {binary_name} binary..."));
    extract_binary(&config.archive, &config.binary, binary_name)?;
    Ok(Provisioned::Downloaded { url })
}

pub fn resolve_download_url(config: &ProvisionConfig, arch: &str) -> Result<Url, ProvisionError> {
    let url = config
        .urls
        .get(arch)
        .ok_or_else(|| ProvisionError::UnsupportedArchitecture(arch.to_string()))?;
    Url::parse(url).map_err(|e| ProvisionError::DownloadUrlInvalid(arch.to_string(), e))
}

/// Decompresses a .tar.gz and writes its first regular file named
/// `binary_name` to `target`, marked executable.
pub fn extract_binary(
    source_file: &Path,
    target: &Path,
    binary_name: &str,
) -> Result<(), ProvisionError> {
    let source = File::open(source_file).map_err(|e| {
        ProvisionError::ArchiveError(e, format!("Cannot open `{}`", source_file.display()))
    })?;
    let read_error = |e| {
        ProvisionError::ArchiveError(e, format!("Cannot read `{}`", source_file.display()))
    };
    let mut archive = Archive::new(GzDecoder::new(source));
    for entry in archive.entries().map_err(read_error)? {
        let mut entry = entry.map_err(read_error)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let is_binary = entry
            .path()
            .map(|path| path.file_name().is_some_and(|name| name == binary_name))
            .map_err(read_error)?;
        if !is_binary {
            continue;
        }

        let mut output = File::create(target).map_err(|e| {
            ProvisionError::ArchiveError(e, format!("Cannot create `{}`", target.display()))
        })?;
        io::copy(&mut entry, &mut output).map_err(|e| {
            ProvisionError::ArchiveError(
                e,
                format!("Cannot extract `{binary_name}` to `{}`", target.display()),
            )
        })?;
        return make_executable(target);
    }
    Err(ProvisionError::BinaryNotInArchive(
        binary_name.to_string(),
        source_file.to_path_buf(),
    ))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), ProvisionError> {
    use std::{fs, os::unix::fs::PermissionsExt};

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| {
        ProvisionError::ArchiveError(e, format!("Cannot mark `{}` executable", path.display()))
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), ProvisionError> {
    Ok(())
}
