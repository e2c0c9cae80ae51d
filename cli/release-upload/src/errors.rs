use std::fmt;
use std::path::PathBuf;

use indoc::formatdoc;
use libherokubuildpack::log::log_error;
use upload_config::DEFAULT_CONFIG_FILE;
use uploader_tool::{DispatchError, ProvisionError};

const RETRY_HINT: &str = "\
Nothing is retried automatically. Once the cause is fixed, run the same command again; \
files that already reached the host will simply be uploaded again.";

#[derive(Debug)]
pub(crate) enum ReleaseUploadError {
    Config(upload_config::Error),
    Provision(ProvisionError),
    FileMissing(PathBuf),
    Dispatch(DispatchError),
}

impl fmt::Display for ReleaseUploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseUploadError::Config(error) => write!(f, "{error}"),
            ReleaseUploadError::Provision(error) => write!(f, "{error}"),
            ReleaseUploadError::FileMissing(path) => {
                write!(f, "File `{}` does not exist.", path.display())
            }
            ReleaseUploadError::Dispatch(error) => write!(f, "{error}"),
        }
    }
}

pub(crate) fn on_error(error: &ReleaseUploadError) {
    match error {
        ReleaseUploadError::Config(_) => log_error(
            "Invalid configuration",
            formatdoc! {"
                {error}

                Settings are read from the file given with `--config`, or from \
                `{DEFAULT_CONFIG_FILE}` in the working directory when it exists.
            "},
        ),
        ReleaseUploadError::Provision(ProvisionError::UnsupportedArchitecture(arch)) => log_error(
            "Unsupported architecture",
            formatdoc! {"
                {error}

                No uploader download is configured for `{arch}`. Add one under \
                `[provision.urls]` in `{DEFAULT_CONFIG_FILE}`, or place a working \
                uploader binary at the configured path.
            "},
        ),
        ReleaseUploadError::Provision(_) => log_error(
            "Uploader download failed",
            formatdoc! {"
                {error}

                A partially written archive or binary may be left behind. Delete it \
                before retrying, since an existing binary is never downloaded again.
            "},
        ),
        ReleaseUploadError::FileMissing(_) => log_error(
            "File not found",
            formatdoc! {"
                {error}

                Check the path given with `--file`.
            "},
        ),
        ReleaseUploadError::Dispatch(_) => log_error(
            "Upload failed",
            formatdoc! {"
                {error}

                {RETRY_HINT}
            "},
        ),
    }
}
