use std::{fmt, path::PathBuf, process::ExitStatus};

#[derive(Debug)]
pub enum ProvisionError {
    UnsupportedArchitecture(String),
    DownloadUrlInvalid(String, url::ParseError),
    DownloadError(String, Box<ureq::Error>),
    DownloadWriteError(PathBuf, std::io::Error),
    ArchiveError(std::io::Error, String),
    BinaryNameMissing(PathBuf),
    BinaryNotInArchive(String, PathBuf),
}

impl fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionError::UnsupportedArchitecture(arch) => {
                write!(f, "Unsupported architecture: {arch}")
            }
            ProvisionError::DownloadUrlInvalid(arch, error) => {
                write!(f, "Download URL for `{arch}` is invalid, {error}")
            }
            ProvisionError::DownloadError(url, error) => {
                write!(f, "Download of {url} failed, {error}")
            }
            ProvisionError::DownloadWriteError(path, error) => {
                write!(f, "Failure writing `{}`, {error}", path.display())
            }
            ProvisionError::ArchiveError(error, context) => {
                write!(f, "{context}, {error}")
            }
            ProvisionError::BinaryNameMissing(path) => {
                write!(f, "Uploader path `{}` has no file name", path.display())
            }
            ProvisionError::BinaryNotInArchive(name, archive) => {
                write!(
                    f,
                    "No `{name}` file found in archive `{}`",
                    archive.display()
                )
            }
        }
    }
}

#[derive(Debug)]
pub enum DispatchError {
    NothingToUpload,
    Spawn(PathBuf, std::io::Error),
    Exited(PathBuf, ExitStatus),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NothingToUpload => write!(f, "No files were given to upload"),
            DispatchError::Spawn(binary, error) => {
                write!(f, "Cannot run `{}`, {error}", binary.display())
            }
            DispatchError::Exited(binary, status) => {
                write!(f, "`{}` failed with {status}", binary.display())
            }
        }
    }
}
