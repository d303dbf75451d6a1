//! Manifest file loading and connection profile integration tests.

use assert_fs::prelude::*;
use predicates::prelude::*;
use prettysync_core::{config, manifest, ManifestError};
use rstest::rstest;

// ---------------------------------------------------------------------------
// 1. Manifest files
// ---------------------------------------------------------------------------

#[test]
fn load_manifest_from_disk() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("objects.txt");
    file.write_str(
        "type name url\n\
         PROG/P ZREPORT /sap/bc/adt/programs/programs/zreport\n\
         CLAS/OC ZCL_FOO /sap/bc/adt/oo/classes/zcl_foo\n",
    )
    .expect("write");

    let objects = manifest::load(file.path()).expect("load");
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0].object_type, "PROG/P");
    assert_eq!(objects[1].name, "ZCL_FOO");
    assert_eq!(
        objects[1].url.as_deref(),
        Some("/sap/bc/adt/oo/classes/zcl_foo")
    );
}

#[test]
fn missing_manifest_reports_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("nope.txt");
    let err = manifest::load(&path).unwrap_err();
    assert!(matches!(err, ManifestError::Io { .. }), "got: {err}");
    assert!(predicate::str::contains("nope.txt").eval(&err.to_string()));
}

#[rstest]
#[case("PROG/P", true)]
#[case("PROG", true)]
#[case("CLAS/OC", true)]
#[case("INTF/OI", true)]
#[case("FUGR/FF", true)]
#[case("DEVC/K", true)]
#[case("TABL/DT", false)]
#[case("DOMA", false)]
fn manifest_type_validation(#[case] object_type: &str, #[case] accepted: bool) {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("objects.txt");
    file.write_str(&format!("type name url\n{object_type} ZOBJ /x/zobj\n"))
        .expect("write");

    let result = manifest::load(file.path());
    assert_eq!(result.is_ok(), accepted, "{object_type}: {result:?}");
    if let Err(err) = result {
        let msg = err.to_string();
        assert!(msg.contains("objects.txt:2"), "must cite file and line, got: {msg}");
    }
}

// ---------------------------------------------------------------------------
// 2. Connection profiles
// ---------------------------------------------------------------------------

#[test]
fn load_connection_profiles() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".prettysync/connections.yaml")
        .write_str(
            "connections:\n  dev:\n    url: https://dev.example.com\n    user: DEVELOPER\n    client: \"001\"\n",
        )
        .expect("write");

    let config = config::load_at(home.path()).expect("load");
    let dev = config.profile("dev").expect("profile");
    assert_eq!(dev.url, "https://dev.example.com");
    assert_eq!(dev.user, "DEVELOPER");
    assert_eq!(dev.client.as_deref(), Some("001"));
    assert!(dev.password.is_none());
}

#[test]
fn corrupt_profiles_report_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".prettysync/connections.yaml")
        .write_str("connections: [unclosed")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(err.to_string().contains("connections.yaml"), "got: {err}");
}
