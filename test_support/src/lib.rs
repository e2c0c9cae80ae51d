// This module is only used for testing, where using unwrap() is acceptable.
#![allow(clippy::unwrap_used)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::{write::GzEncoder, Compression};
use tar::{Builder, EntryType, Header};
use tempfile::TempDir;

/// A fresh build output directory holding an empty-ish file for each name.
#[must_use]
pub fn build_dir_with(file_names: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), file_names);
    dir
}

pub fn write_files(dir: &Path, file_names: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    for name in file_names {
        fs::write(dir.join(name), name.as_bytes()).unwrap();
    }
}

/// Writes a .tar.gz at `destination` with one regular file per `(path, contents)`.
pub fn write_tarball(destination: &Path, entries: &[(&str, &[u8])]) {
    let output = File::create(destination).unwrap();
    let mut tar = Builder::new(GzEncoder::new(output, Compression::default()));
    for (path, contents) in entries {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        tar.append_data(&mut header, path, *contents).unwrap();
    }
    tar.into_inner().unwrap().finish().unwrap();
}

/// Log file the fake uploader at `uploader` appends its arguments to.
#[must_use]
pub fn uploader_log_path(uploader: &Path) -> PathBuf {
    uploader.with_extension("log")
}

/// Writes a shell script standing in for the uploader. Each invocation appends its
/// arguments, one per line, to [`uploader_log_path`] and exits with `exit_code`.
#[cfg(unix)]
pub fn write_fake_uploader(uploader: &Path, exit_code: i32) {
    use std::os::unix::fs::PermissionsExt;

    let log = uploader_log_path(uploader);
    let script = format!(
        "#!/bin/sh\nfor arg in \"$@\"; do printf '%s\\n' \"$arg\" >> '{}'; done\necho \"fake uploader: $*\"\nexit {exit_code}\n",
        log.display()
    );
    fs::write(uploader, script).unwrap();
    fs::set_permissions(uploader, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Arguments recorded by the fake uploader, or `None` if it never ran.
#[must_use]
pub fn read_uploader_log(uploader: &Path) -> Option<Vec<String>> {
    fs::read_to_string(uploader_log_path(uploader))
        .ok()
        .map(|log| log.lines().map(String::from).collect())
}
