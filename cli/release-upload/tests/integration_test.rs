// Required due to: https://github.com/rust-lang/rust/issues/95513
#![allow(unused_crate_dependencies)]
#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;
use test_support::{read_uploader_log, write_fake_uploader, write_files};

const BUILD_DIR: &str = "out/target/product/lynx";

// A working directory with a fake uploader already provisioned at `./pd`.
fn workspace(uploader_exit_code: i32, build_files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_fake_uploader(&dir.path().join("pd"), uploader_exit_code);
    write_files(&dir.path().join(BUILD_DIR), build_files);
    dir
}

fn release_upload(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_release-upload"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("release-upload runs")
}

fn combined_output(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn in_build_dir(name: &str) -> String {
    format!("{BUILD_DIR}/{name}")
}

#[test]
fn uploads_latest_package_and_present_images() {
    let dir = workspace(
        0,
        &[
            "rom-2024-0101-1200.zip",
            "rom-2024-0102-0900.zip",
            "rom-2024-0103-0000-ota.zip",
            "boot.img",
            "dtbo.img",
        ],
    );

    let output = release_upload(dir.path(), &["lynx"]);
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        read_uploader_log(&dir.path().join("pd")),
        Some(vec![
            "upload".to_string(),
            in_build_dir("rom-2024-0102-0900.zip"),
            in_build_dir("dtbo.img"),
            in_build_dir("boot.img"),
        ])
    );
    let log = combined_output(&output);
    assert!(log.contains("pd binary found, skipping download."));
    assert!(log.contains("Ignoring OTA package"));
    assert!(log.contains("Upload completed successfully!"));
    assert!(!dir.path().join("pd.tar.gz").exists());
}

#[test]
fn empty_build_dir_exits_cleanly_without_uploading() {
    let dir = workspace(0, &[]);

    let output = release_upload(dir.path(), &["lynx"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(read_uploader_log(&dir.path().join("pd")), None);
    assert!(combined_output(&output).contains("No files found for upload."));
}

#[test]
fn only_ota_package_is_not_uploaded() {
    let dir = workspace(0, &["rom-2024-0101-1200-ota.zip"]);

    let output = release_upload(dir.path(), &["lynx"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(read_uploader_log(&dir.path().join("pd")), None);
}

#[test]
fn unknown_device_has_nothing_to_upload() {
    let dir = workspace(0, &["boot.img"]);

    let output = release_upload(dir.path(), &["husky"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(read_uploader_log(&dir.path().join("pd")), None);
}

#[test]
fn uploader_failure_exits_with_error() {
    let dir = workspace(2, &["boot.img"]);

    let output = release_upload(dir.path(), &["lynx"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        read_uploader_log(&dir.path().join("pd")),
        Some(vec!["upload".to_string(), in_build_dir("boot.img")])
    );
    let log = combined_output(&output);
    assert!(log.contains("fake uploader: upload"));
    assert!(log.contains("Upload failed"));
}

#[test]
fn uploads_direct_file() {
    let dir = workspace(0, &["rom-2024-0101-1200.zip", "boot.img"]);
    fs::write(dir.path().join("notes.txt"), "release notes").unwrap();

    let output = release_upload(dir.path(), &["--file", "notes.txt"]);
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        read_uploader_log(&dir.path().join("pd")),
        Some(vec!["upload".to_string(), "notes.txt".to_string()])
    );
}

#[test]
fn direct_ota_file_is_not_uploaded() {
    let dir = workspace(0, &[]);
    fs::write(dir.path().join("rom-2024-0101-1200-OTA.zip"), "ota").unwrap();

    let output = release_upload(dir.path(), &["--file", "rom-2024-0101-1200-OTA.zip"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(read_uploader_log(&dir.path().join("pd")), None);
    let log = combined_output(&output);
    assert!(log.contains("Ignoring OTA package: rom-2024-0101-1200-OTA.zip"));
    assert!(log.contains("No files found for upload."));
}

#[test]
fn missing_direct_file_is_an_error() {
    let dir = workspace(0, &[]);

    let output = release_upload(dir.path(), &["--file", "missing.zip"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(read_uploader_log(&dir.path().join("pd")), None);
    assert!(combined_output(&output).contains("File `missing.zip` does not exist."));
}

#[test]
fn usage_errors_exit_with_one() {
    let dir = workspace(0, &[]);

    assert_eq!(release_upload(dir.path(), &[]).status.code(), Some(1));
    assert_eq!(
        release_upload(dir.path(), &["lynx", "--file", "rom.zip"])
            .status
            .code(),
        Some(1)
    );
    assert_eq!(
        release_upload(dir.path(), &["lynx", "husky"]).status.code(),
        Some(1)
    );

    let help = release_upload(dir.path(), &["--help"]);
    assert_eq!(help.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&help.stdout).contains("--recency"));
}

#[test]
fn config_file_changes_selection_and_dispatch() {
    let dir = workspace(0, &["rom-v9.zip", "rom-v10.zip", "rom-v11-OTA.zip", "init_boot.img"]);
    fs::write(
        dir.path().join("release-upload.toml"),
        indoc::indoc! {r#"
            [selection]
            recency = "version"
            images = ["init_boot.img", "boot.img"]

            [dispatch]
            subcommand = "put"
        "#},
    )
    .unwrap();

    let output = release_upload(dir.path(), &["lynx"]);
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        read_uploader_log(&dir.path().join("pd")),
        Some(vec![
            "put".to_string(),
            in_build_dir("rom-v10.zip"),
            in_build_dir("init_boot.img"),
        ])
    );
}

#[test]
fn recency_flag_overrides_config() {
    let dir = workspace(0, &["rom-2024-0101-1200.zip", "rom-2024-0102-0900.zip"]);
    fs::write(
        dir.path().join("ci.toml"),
        "[selection]\nrecency = \"version\"\nimages = []\n",
    )
    .unwrap();

    // By version the `1200` suffix wins; by timestamp the later date does.
    let output = release_upload(
        dir.path(),
        &["--config", "ci.toml", "--recency", "timestamp", "lynx"],
    );
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        read_uploader_log(&dir.path().join("pd")),
        Some(vec![
            "upload".to_string(),
            in_build_dir("rom-2024-0102-0900.zip"),
        ])
    );
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = workspace(0, &["boot.img"]);

    let output = release_upload(dir.path(), &["--config", "absent.toml", "lynx"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(read_uploader_log(&dir.path().join("pd")), None);
    assert!(combined_output(&output).contains("Configuration file `absent.toml` does not exist."));
}

#[test]
fn unsupported_architecture_fails_without_download() {
    let dir = tempfile::tempdir().unwrap();
    write_files(&dir.path().join(BUILD_DIR), &["boot.img"]);
    fs::write(
        dir.path().join("release-upload.toml"),
        "[provision]\nurls = {}\n",
    )
    .unwrap();

    let output = release_upload(dir.path(), &["lynx"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("Unsupported architecture"));
    assert!(!dir.path().join("pd.tar.gz").exists());
    assert!(!dir.path().join("pd").exists());
}
