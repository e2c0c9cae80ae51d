mod recency;

use std::{
    fmt, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use libherokubuildpack::log::{log_info, log_warning};
use upload_config::SelectionConfig;

pub use crate::recency::{extractor_for, RecencyKeyExtractor, TimestampKey, VersionKey};

/// The files handed to the uploader: the latest package first, then the images.
#[derive(Eq, PartialEq, Debug, Default, Clone)]
pub struct UploadSet {
    pub package: Option<PathBuf>,
    pub images: Vec<PathBuf>,
}

impl UploadSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.package.is_none() && self.images.is_empty()
    }

    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        self.package
            .iter()
            .chain(self.images.iter())
            .cloned()
            .collect()
    }
}

impl fmt::Display for UploadSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "upload set:\n  package: {}\n  images:{}",
            self.package
                .as_ref()
                .map_or("None".to_string(), |p| p.display().to_string()),
            if self.images.is_empty() {
                " None".to_string()
            } else {
                self.images
                    .iter()
                    .fold(String::new(), |r, i| format!("{r}\n    {}", i.display()))
            },
        )
    }
}

/// Picks the latest release package in `build_dir` and the auxiliary images next to it.
#[must_use]
pub fn select_upload_set(build_dir: &Path, config: &SelectionConfig) -> UploadSet {
    let extractor = extractor_for(config);
    UploadSet {
        package: select_latest_package(build_dir, config, extractor.as_ref()),
        images: find_auxiliary_images(build_dir, &config.images),
    }
}

/// The non-OTA package with the greatest recency key. On equal keys the
/// first in file name order wins.
#[must_use]
pub fn select_latest_package(
    build_dir: &Path,
    config: &SelectionConfig,
    extractor: &dyn RecencyKeyExtractor,
) -> Option<PathBuf> {
    let mut latest: Option<(u64, PathBuf)> = None;
    for path in list_packages(build_dir, &config.extension) {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if is_ota_package(file_name, config) {
            log_info(format!("Ignoring OTA package: {}", path.display()));
            continue;
        }
        let Some(key) = extractor.extract(file_name) else {
            log_info(format!(
                "Ignoring package without a {} key: {}",
                config.recency,
                path.display()
            ));
            continue;
        };
        if latest.as_ref().map_or(true, |(latest_key, _)| key > *latest_key) {
            latest = Some((key, path));
        }
    }

    match latest {
        Some((_, path)) => {
            log_info(format!("Latest package found: {}", path.display()));
            Some(path)
        }
        None => {
            log_info("No release package found (OTA packages are ignored).");
            None
        }
    }
}

/// Whether the name ends with the OTA marker before the extension, ignoring case.
#[must_use]
pub fn is_ota_package(file_name: &str, config: &SelectionConfig) -> bool {
    let ota_suffix = format!("{}.{}", config.ota_marker, config.extension).to_lowercase();
    file_name.to_lowercase().ends_with(&ota_suffix)
}

/// Each named image present in `build_dir`, in the order given.
#[must_use]
pub fn find_auxiliary_images(build_dir: &Path, image_names: &[String]) -> Vec<PathBuf> {
    image_names
        .iter()
        .filter_map(|name| {
            let path = build_dir.join(name);
            if path.is_file() {
                Some(path)
            } else {
                log_warning(
                    "Image not found",
                    format!("No file found at {}, skipping.", path.display()),
                );
                None
            }
        })
        .collect()
}

// Regular files directly under `dir` named `*.<extension>`, sorted by name.
// A missing or unreadable directory has no packages.
fn list_packages(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == ErrorKind::NotFound => return vec![],
        Err(error) => {
            log_warning(
                "Build directory unreadable",
                format!("Cannot list {}: {error}", dir.display()),
            );
            return vec![];
        }
    };
    let suffix = format!(".{extension}");
    let mut packages: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(&suffix))
        })
        .collect();
    packages.sort();
    packages
}
