use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "release-upload.toml";

const PD_X86_64_URL: &str =
    "https://github.com/jkawamoto/go-pixeldrain/releases/download/v0.7.5/pd_0.7.5_linux_amd64.tar.gz";
const PD_AARCH64_URL: &str =
    "https://github.com/jkawamoto/go-pixeldrain/releases/download/v0.7.5/pd_0.7.5_linux_arm64.tar.gz";

#[derive(Deserialize, Eq, PartialEq, Debug, Default, Clone)]
#[serde(default)]
pub struct UploadConfig {
    pub selection: SelectionConfig,
    pub provision: ProvisionConfig,
    pub dispatch: DispatchConfig,
}

impl UploadConfig {
    /// Build output directory for a device, `<product-dir>/<device>`.
    #[must_use]
    pub fn build_dir(&self, device: &str) -> PathBuf {
        self.selection.product_dir.join(device)
    }
}

impl fmt::Display for UploadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "config:\n  packages: *.{} (excluding *{}.{}), latest by {}\n  images: {}\n  uploader: {} ({})\n  downloads:{}",
            self.selection.extension,
            self.selection.ota_marker,
            self.selection.extension,
            self.selection.recency,
            if self.selection.images.is_empty() {
                "None".to_string()
            } else {
                self.selection.images.join(", ")
            },
            self.provision.binary.display(),
            self.dispatch.subcommand,
            self.provision
                .urls
                .iter()
                .fold(String::new(), |r, (arch, url)| format!("{r}\n    {arch}: {url}")),
        )
    }
}

#[derive(Deserialize, Eq, PartialEq, Debug, Clone)]
#[serde(default, rename_all = "kebab-case")]
pub struct SelectionConfig {
    pub product_dir: PathBuf,
    pub extension: String,
    pub ota_marker: String,
    pub delimiter: String,
    pub recency: Recency,
    pub images: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            product_dir: PathBuf::from("out/target/product"),
            extension: "zip".to_string(),
            ota_marker: "-ota".to_string(),
            delimiter: "-".to_string(),
            recency: Recency::default(),
            images: ["dtbo.img", "vendor_boot.img", "boot.img", "vendor_dlkm.img"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// How the "latest" package is recognised from its file name.
#[derive(Deserialize, Eq, PartialEq, Debug, Default, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Recency {
    /// `<name>-<date>-<time>.zip`, the two trailing segments read as one number.
    #[default]
    Timestamp,
    /// `<name>-<version>.zip`, the trailing digits of the last segment.
    Version,
}

impl fmt::Display for Recency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recency::Timestamp => write!(f, "timestamp"),
            Recency::Version => write!(f, "version"),
        }
    }
}

impl FromStr for Recency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timestamp" => Ok(Recency::Timestamp),
            "version" => Ok(Recency::Version),
            other => Err(format!(
                "unknown recency `{other}`, expected `timestamp` or `version`"
            )),
        }
    }
}

#[derive(Deserialize, Eq, PartialEq, Debug, Clone)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProvisionConfig {
    pub binary: PathBuf,
    pub archive: PathBuf,
    /// Download URL per `std::env::consts::ARCH` value.
    pub urls: BTreeMap<String, String>,
}

impl ProvisionConfig {
    /// The name matched against archive entries when unpacking.
    #[must_use]
    pub fn binary_name(&self) -> Option<&str> {
        self.binary.file_name().and_then(|name| name.to_str())
    }
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("./pd"),
            archive: PathBuf::from("pd.tar.gz"),
            urls: BTreeMap::from([
                ("aarch64".to_string(), PD_AARCH64_URL.to_string()),
                ("x86_64".to_string(), PD_X86_64_URL.to_string()),
            ]),
        }
    }
}

#[derive(Deserialize, Eq, PartialEq, Debug, Clone)]
#[serde(default, rename_all = "kebab-case")]
pub struct DispatchConfig {
    pub subcommand: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            subcommand: "upload".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    ConfigFileMissing(PathBuf),
    ConfigFileError(PathBuf, std::io::Error),
    ConfigDeserializeError(PathBuf, toml::de::Error),
    DownloadUrlInvalid(String, url::ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigFileMissing(path) => {
                write!(f, "Configuration file `{}` does not exist.", path.display())
            }
            Error::ConfigFileError(path, error) => {
                write!(f, "Failure reading `{}`, {error}", path.display())
            }
            Error::ConfigDeserializeError(path, error) => {
                write!(f, "Configuration error in `{}`, {error}", path.display())
            }
            Error::DownloadUrlInvalid(arch, error) => {
                write!(f, "Download URL for `{arch}` is invalid, {error}")
            }
        }
    }
}

/// Reads the config at `config_path`, falling back to defaults when there is no such file.
pub fn read_config(config_path: &Path) -> Result<UploadConfig, Error> {
    if !config_path.is_file() {
        return Ok(UploadConfig::default());
    }
    let contents = fs::read_to_string(config_path)
        .map_err(|e| Error::ConfigFileError(config_path.to_path_buf(), e))?;
    let config = toml::from_str::<UploadConfig>(&contents)
        .map_err(|e| Error::ConfigDeserializeError(config_path.to_path_buf(), e))?;
    validate_urls(&config)?;
    Ok(config)
}

/// Reads an explicitly requested config, or `release-upload.toml` in the working directory.
pub fn load_config(explicit_path: Option<&Path>) -> Result<UploadConfig, Error> {
    match explicit_path {
        Some(path) if !path.is_file() => Err(Error::ConfigFileMissing(path.to_path_buf())),
        Some(path) => read_config(path),
        None => read_config(Path::new(DEFAULT_CONFIG_FILE)),
    }
}

fn validate_urls(config: &UploadConfig) -> Result<(), Error> {
    for (arch, url) in &config.provision.urls {
        Url::parse(url).map_err(|e| Error::DownloadUrlInvalid(arch.clone(), e))?;
    }
    Ok(())
}
