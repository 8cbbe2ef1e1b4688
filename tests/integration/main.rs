//! Integration tests for Shipwright

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// `shipwright` isolated from the user's config and environment
    fn shipwright(dir: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("shipwright");
        cmd.current_dir(dir)
            .env_remove("SHIPWRIGHT_CONFIG")
            .env_remove("APPLE_SIGNING_IDENTITY")
            .env_remove("RUST_LOG")
            .env("HOME", dir.join("home"))
            .env("XDG_CONFIG_HOME", dir.join("home/.config"));
        cmd
    }

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    /// A project with the default fingerprint inputs in place
    fn project() -> TempDir {
        let temp = TempDir::new().unwrap();
        write(
            &temp.path().join("python/requirements.txt"),
            "torch==2.3.1\nsentence-transformers==3.0.1\n",
        );
        write(
            &temp.path().join("python/embedding_helper.py"),
            "import sys\nprint(sys.argv)\n",
        );
        temp
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        shipwright(temp.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("runtime provisioning"))
            .stdout(predicate::str::contains("cache"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        shipwright(temp.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("shipwright"));
    }

    #[test]
    fn config_path_without_file() {
        let temp = TempDir::new().unwrap();
        shipwright(temp.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("shipwright.toml"))
            .stdout(predicate::str::contains("not created yet"));
    }

    #[test]
    fn config_init_then_show() {
        let temp = TempDir::new().unwrap();
        shipwright(temp.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));
        assert!(temp.path().join("shipwright.toml").is_file());

        shipwright(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[runtime]"))
            .stdout(predicate::str::contains("python_version = \"3.11\""));

        shipwright(temp.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn explicit_config_must_exist() {
        let temp = TempDir::new().unwrap();
        shipwright(temp.path())
            .args(["-c", "missing.toml", "fingerprint"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Configuration file not found"))
            .stderr(predicate::str::contains("shipwright config init"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("shipwright.toml"), "[runtime\n");
        shipwright(temp.path())
            .arg("fingerprint")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn fingerprint_is_stable_and_tracks_inputs() {
        let temp = project();
        let hex = predicate::str::is_match("^[0-9a-f]{64}\n$").unwrap();

        let first = shipwright(temp.path())
            .arg("fingerprint")
            .assert()
            .success()
            .stdout(hex)
            .get_output()
            .stdout
            .clone();
        let second = shipwright(temp.path())
            .arg("fingerprint")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        assert_eq!(first, second);

        write(
            &temp.path().join("python/requirements.txt"),
            "torch==2.3.2\nsentence-transformers==3.0.1\n",
        );
        let third = shipwright(temp.path())
            .arg("fingerprint")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        assert_ne!(first, third);
    }

    #[test]
    fn fingerprint_names_missing_input() {
        let temp = TempDir::new().unwrap();
        shipwright(temp.path())
            .arg("fingerprint")
            .assert()
            .failure()
            .stderr(predicate::str::contains("requirements.txt"));
    }

    #[test]
    fn cache_list_empty() {
        let temp = TempDir::new().unwrap();
        shipwright(temp.path())
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache records found"));

        shipwright(temp.path())
            .args(["cache", "list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::diff("[]\n"));
    }

    #[test]
    fn vendored_runtime_builds_once_then_reuses() {
        let temp = project();
        write(
            &temp.path().join("shipwright.toml"),
            "[runtime]\nstrategy = \"vendored\"\n",
        );
        let vendored = temp.path().join("vendor/python/windows-x86_64");
        write(&vendored.join("python.exe"), "MZ");
        write(&vendored.join("pyvenv.cfg"), "home = .\nversion = 3.11.9\n");
        write(&vendored.join("Lib/site-packages/numpy/core/__pycache__/x.pyc"), "");
        write(&vendored.join("Lib/site-packages/numpy/core/include/numpy.h"), "");

        shipwright(temp.path())
            .args(["runtime", "--target", "windows-x86_64"])
            .assert()
            .success()
            .stdout(predicate::str::contains("runtime built"));

        let runtime = temp.path().join("src-tauri/resources/python/windows-x86_64");
        assert!(runtime.join("python.exe").is_file());
        assert!(runtime.join("embedding_helper.py").is_file());
        assert!(runtime.join(".shipwright-cache.json").is_file());
        assert!(!runtime.join("Lib/site-packages/numpy/core/__pycache__").exists());
        assert!(!runtime.join("Lib/site-packages/numpy/core/include").exists());

        shipwright(temp.path())
            .args(["runtime", "--target", "windows-x86_64"])
            .assert()
            .success()
            .stdout(predicate::str::contains("up to date"));

        shipwright(temp.path())
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("windows-x86_64"))
            .stdout(predicate::str::contains("3.11.9"));

        shipwright(temp.path())
            .args(["cache", "clear", "--target", "windows-x86_64", "--yes"])
            .assert()
            .success();
        assert!(!runtime.exists());
    }

    #[test]
    fn vendored_runtime_missing_tree_fails() {
        let temp = project();
        write(
            &temp.path().join("shipwright.toml"),
            "[runtime]\nstrategy = \"vendored\"\n",
        );
        shipwright(temp.path())
            .args(["runtime", "--target", "macos-aarch64"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Pre-vendored runtime tree missing"));
        assert!(!temp
            .path()
            .join("src-tauri/resources/python/macos-aarch64/.shipwright-cache.json")
            .exists());
    }

    #[test]
    fn package_without_bundle_is_skipped() {
        let temp = TempDir::new().unwrap();
        shipwright(temp.path())
            .args(["package", "--arch", "x64"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No app bundle"));
    }

    #[test]
    fn completions_bash() {
        let temp = TempDir::new().unwrap();
        shipwright(temp.path())
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("shipwright"));
    }
}

#[cfg(unix)]
mod setfile_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Stores the attribute as hex in `<path>.finderinfo`
    const FAKE_XATTR: &str = r#"#!/bin/sh
case "$1" in
  -px)
    if [ -f "$3.finderinfo" ]; then cat "$3.finderinfo"; else echo "No such xattr: $2" >&2; exit 1; fi ;;
  -wx)
    printf '%s' "$3" > "$4.finderinfo" ;;
  *)
    exit 2 ;;
esac
"#;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn setfile(xattr: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("SetFile");
        cmd.env("SHIPWRIGHT_SETFILE_XATTR", xattr)
            .env_remove("SHIPWRIGHT_SETFILE_MODE")
            .env_remove("SHIPWRIGHT_SETFILE_LOG");
        cmd
    }

    fn target(dir: &TempDir) -> PathBuf {
        let path = dir.path().join(".VolumeIcon.icns");
        fs::write(&path, b"icns").unwrap();
        path
    }

    fn stored(path: &Path) -> Option<String> {
        let mut store = path.as_os_str().to_owned();
        store.push(".finderinfo");
        fs::read_to_string(store).ok()
    }

    #[test]
    fn creator_and_custom_icon_flag_are_written() {
        let temp = TempDir::new().unwrap();
        let xattr = script(temp.path(), "xattr", FAKE_XATTR);
        let icon = target(&temp);

        setfile(&xattr)
            .args(["-c", "icnC", "-a", "C"])
            .arg(&icon)
            .assert()
            .success();

        let expected = format!("00000000{}0400{}", "69636E43", "00".repeat(22));
        assert_eq!(stored(&icon).as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn flags_merge_with_existing_value() {
        let temp = TempDir::new().unwrap();
        let xattr = script(temp.path(), "xattr", FAKE_XATTR);
        let icon = target(&temp);
        // type "icns", invisible flag already set
        let mut store = icon.as_os_str().to_owned();
        store.push(".finderinfo");
        fs::write(&store, format!("69636E73 00000000 4000 {}", "00".repeat(22))).unwrap();

        setfile(&xattr).args(["-aCv"]).arg(&icon).assert().success();

        let expected = format!("69636E73000000000400{}", "00".repeat(22));
        assert_eq!(stored(&icon).as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn status_one_is_a_warning() {
        let temp = TempDir::new().unwrap();
        let xattr = script(temp.path(), "xattr", "#!/bin/sh\necho 'xattr: unsupported' >&2\nexit 1\n");
        let icon = target(&temp);

        setfile(&xattr)
            .args(["-a", "C"])
            .arg(&icon)
            .assert()
            .success()
            .stderr(predicate::str::contains("skipped"));
    }

    #[test]
    fn other_status_is_fatal() {
        let temp = TempDir::new().unwrap();
        let xattr = script(temp.path(), "xattr", "#!/bin/sh\necho 'xattr: boom' >&2\nexit 2\n");
        let icon = target(&temp);

        setfile(&xattr)
            .args(["-c", "icnC"])
            .arg(&icon)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("SetFile:"))
            .stderr(predicate::str::contains("boom"));
    }

    #[test]
    fn missing_path_is_fatal_before_any_write() {
        let temp = TempDir::new().unwrap();
        let xattr = script(temp.path(), "xattr", FAKE_XATTR);
        let icon = target(&temp);

        setfile(&xattr)
            .args(["-c", "icnC"])
            .arg(&icon)
            .arg(temp.path().join("missing"))
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Path not found"));
        assert!(stored(&icon).is_none());
    }

    #[test]
    fn invalid_code_is_fatal() {
        let temp = TempDir::new().unwrap();
        let xattr = script(temp.path(), "xattr", FAKE_XATTR);
        let icon = target(&temp);

        setfile(&xattr)
            .args(["-c", "icon5"])
            .arg(&icon)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("four-character code"));
    }

    #[test]
    fn observe_mode_logs_without_writing() {
        let temp = TempDir::new().unwrap();
        let xattr = script(temp.path(), "xattr", FAKE_XATTR);
        let icon = target(&temp);
        let log = temp.path().join("setfile.log");

        setfile(&xattr)
            .env("SHIPWRIGHT_SETFILE_MODE", "observe")
            .env("SHIPWRIGHT_SETFILE_LOG", &log)
            .args(["-c", "icnC", "-d", "01/01/2024", "-a", "C"])
            .arg(&icon)
            .assert()
            .success();

        assert!(stored(&icon).is_none());
        let logged = fs::read_to_string(&log).unwrap();
        assert!(logged.contains("[observe] would set creator"));
        assert!(logged.contains("Ignoring unsupported option -d"));
    }

    #[test]
    fn no_paths_is_a_usage_error() {
        let temp = TempDir::new().unwrap();
        let xattr = script(temp.path(), "xattr", FAKE_XATTR);
        setfile(&xattr)
            .args(["-a", "C"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("usage: SetFile"));
    }
}
