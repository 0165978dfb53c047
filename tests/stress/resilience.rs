//! Resilience tests: corrupted records, stray files, and unusable install
//! paths on the filesystem.

use std::path::Path;

use uefi_sigdb::{SigDbError, SignatureFormat, SignatureStore};

fn populate(path: &Path, contents: &[&str]) {
    let mut store = SignatureStore::open(path).unwrap();
    for content in contents {
        store.add(*content, SignatureFormat::Sha256).unwrap();
    }
}

#[test]
fn resilience_one_corrupt_record_among_valid_ones() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("db");
    populate(&path, &["one", "two", "three"]);

    // Corrupt the middle record by flipping bytes.
    {
        let file = path.join("2");
        let mut data = std::fs::read(&file).unwrap();
        for item in data.iter_mut().take(10) {
            *item ^= 0xFF;
        }
        std::fs::write(&file, data).unwrap();
    }

    let mut store = SignatureStore::open(&path).unwrap();
    assert_eq!(store.len(), 2);
    assert!(store.get(2).is_none());
    assert_eq!(store.restore_summary().failed, vec![2]);
    assert!(path.join("2.corrupt").is_file());
    assert!(!path.join("2").exists());

    // The corrupt record's id is handed out again.
    assert_eq!(store.add("two", SignatureFormat::Sha256).unwrap(), 2);
}

#[test]
fn resilience_truncated_record_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("db");
    populate(&path, &["alpha", "beta"]);

    let file = path.join("1");
    let data = std::fs::read(&file).unwrap();
    std::fs::write(&file, &data[..data.len() / 2]).unwrap();

    let store = SignatureStore::open(&path).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(2).unwrap().content(), "beta");
}

#[test]
fn resilience_corrupt_owner_quarantines_both_sub_records() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("db");
    populate(&path, &["alpha"]);
    std::fs::write(path.join("1.owner"), b"{\"version\":1,\"owner\":42}").unwrap();

    let store = SignatureStore::open(&path).unwrap();
    assert!(store.is_empty());
    assert!(path.join("1.corrupt").is_file());
    assert!(path.join("1.owner.corrupt").is_file());
}

#[test]
fn resilience_unknown_format_is_corrupt() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("db");
    std::fs::create_dir_all(&path).unwrap();
    std::fs::write(
        path.join("4"),
        br#"{"version":1,"signature":{"content":"x","format":"EFI_CERT_MD5_GUID"}}"#,
    )
    .unwrap();

    let store = SignatureStore::open(&path).unwrap();
    assert!(store.is_empty());
    assert_eq!(store.restore_summary().failed, vec![4]);
    assert!(store.allocator().is_free(4));
}

#[test]
fn resilience_stray_entries_ignored() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("db");
    populate(&path, &["alpha"]);

    std::fs::write(path.join("README"), b"notes").unwrap();
    std::fs::write(path.join("12.bak"), b"backup").unwrap();
    std::fs::write(path.join("0"), b"zero").unwrap();
    std::fs::create_dir(path.join("7")).unwrap();

    let store = SignatureStore::open(&path).unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.restore_summary().failed.is_empty());
    assert_eq!(store.allocator().next_counter(), 2);
}

#[test]
fn resilience_install_path_is_a_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("db");
    std::fs::write(&path, b"not a directory").unwrap();

    let result = SignatureStore::open(&path);
    assert!(matches!(result, Err(SigDbError::InternalFailure(_))));
}

#[test]
fn resilience_missing_parents_created() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("a").join("b").join("db");

    let store = SignatureStore::open(&path).unwrap();
    assert!(store.is_empty());
    assert!(path.is_dir());
}

#[test]
fn resilience_uncreatable_install_path_opens_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("file");
    std::fs::write(&blocker, b"regular file").unwrap();

    let mut store = SignatureStore::open(blocker.join("db")).unwrap();
    assert!(store.is_empty());
    assert!(store.restore_summary().failed.is_empty());
    assert!(matches!(
        store.add("alpha", SignatureFormat::Sha256),
        Err(SigDbError::StorageWrite(_))
    ));
}

#[test]
fn resilience_repeated_corruption_keeps_every_copy() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("db");

    for round in 0..3 {
        populate(&path, &["alpha"]);
        std::fs::write(path.join("1"), format!("garbage {round}")).unwrap();
        let store = SignatureStore::open(&path).unwrap();
        assert!(store.is_empty());
    }

    assert_eq!(std::fs::read_to_string(path.join("1.corrupt")).unwrap(), "garbage 0");
    assert_eq!(std::fs::read_to_string(path.join("1.corrupt.1")).unwrap(), "garbage 1");
    assert_eq!(std::fs::read_to_string(path.join("1.corrupt.2")).unwrap(), "garbage 2");
}
