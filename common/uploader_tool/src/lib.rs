mod dispatch;
mod errors;
mod provision;

pub use crate::dispatch::{upload, upload_command};
pub use crate::errors::{DispatchError, ProvisionError};
pub use crate::provision::{
    extract_binary, provision, provision_for_arch, resolve_download_url, Fetch, HttpFetcher,
    Provisioned,
};
