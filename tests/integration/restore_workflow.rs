//! Integration test: full store lifecycle on the filesystem.
//!
//! Tests the complete lifecycle:
//! 1. Open a fresh database directory
//! 2. Add signatures with formats and owners
//! 3. Update fields through the write-through setters
//! 4. Restart and restore
//! 5. Delete, restart, and check id recycling
//! 6. Delete everything and start over at id 1

use std::collections::HashSet;

use uefi_sigdb::{
    Guid, NewSignature, SigDbError, SignatureDatabase, SignatureFormat, SignatureStore,
};

const OWNER: &str = "77fa9abd-0359-4d32-bd60-28f4e78f784b";

fn sha256_hex(seed: u8) -> String {
    hex::encode([seed; 32])
}

#[test]
fn full_workflow_add_restore_delete() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let owner: Guid = OWNER.parse().unwrap();

    // ── Step 1: Open a fresh database ───────────────────────────────────
    let mut store = SignatureStore::open_database(root, SignatureDatabase::Db).unwrap();
    assert!(store.is_empty());
    assert!(root.join("db").is_dir());

    // ── Step 2: Add signatures ──────────────────────────────────────────
    let a = store.add(sha256_hex(1), SignatureFormat::Sha256).unwrap();
    let b = store
        .add_signature(
            NewSignature::new("MIIBcertificate")
                .format(SignatureFormat::X509)
                .owner(owner),
        )
        .unwrap();
    let c = store.add(sha256_hex(3), SignatureFormat::Sha256).unwrap();
    assert_eq!((a, b, c), (1, 2, 3));

    // Duplicates are refused without side effects.
    let dup = store.add(sha256_hex(1), SignatureFormat::Sha256);
    assert!(matches!(dup, Err(SigDbError::AlreadyExists(_))));
    assert_eq!(store.len(), 3);

    // ── Step 3: Update fields ───────────────────────────────────────────
    let record = store.get_mut(c).unwrap();
    let previous = record.set_content(sha256_hex(4)).unwrap();
    assert_eq!(previous, sha256_hex(3));
    record.set_owner(owner).unwrap();
    drop(store);

    // ── Step 4: Restart ─────────────────────────────────────────────────
    let mut store = SignatureStore::open_database(root, SignatureDatabase::Db).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.restore_summary().restored, 3);

    let restored_b = store.get(b).unwrap();
    assert_eq!(restored_b.content(), "MIIBcertificate");
    assert_eq!(restored_b.format(), SignatureFormat::X509);
    assert_eq!(restored_b.owner(), owner);

    let restored_c = store.get(c).unwrap();
    assert_eq!(restored_c.content(), sha256_hex(4));
    assert_eq!(restored_c.owner(), owner);
    assert!(store.get(a).unwrap().owner().is_nil());

    // ── Step 5: Delete and recycle ──────────────────────────────────────
    store.delete(b).unwrap();
    assert!(!root.join("db").join("2").exists());
    assert!(!root.join("db").join("2.owner").exists());
    drop(store);

    let mut store = SignatureStore::open_database(root, SignatureDatabase::Db).unwrap();
    assert_eq!(store.len(), 2);
    assert!(store.allocator().is_free(2));
    assert_eq!(store.add(sha256_hex(5), SignatureFormat::Sha256).unwrap(), 2);

    // ── Step 6: Delete everything ───────────────────────────────────────
    store.delete_all().unwrap();
    assert!(store.is_empty());
    assert_eq!(std::fs::read_dir(root.join("db")).unwrap().count(), 0);
    assert_eq!(store.add(sha256_hex(6), SignatureFormat::Sha256).unwrap(), 1);
}

#[test]
fn databases_are_independent() {
    let tmp = tempfile::tempdir().unwrap();

    let mut db = SignatureStore::open_database(tmp.path(), SignatureDatabase::Db).unwrap();
    let mut dbx = SignatureStore::open_database(tmp.path(), SignatureDatabase::Dbx).unwrap();

    // The same content may be allowed in one database and forbidden in another.
    assert_eq!(db.add(sha256_hex(9), SignatureFormat::Sha256).unwrap(), 1);
    assert_eq!(dbx.add(sha256_hex(9), SignatureFormat::Sha256).unwrap(), 1);

    db.delete_all().unwrap();
    drop(db);
    drop(dbx);

    let db = SignatureStore::open_database(tmp.path(), SignatureDatabase::Db).unwrap();
    let dbx = SignatureStore::open_database(tmp.path(), SignatureDatabase::Dbx).unwrap();
    assert!(db.is_empty());
    assert_eq!(dbx.len(), 1);
}

#[test]
fn restored_ids_match_file_names() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("kek");

    {
        let mut store = SignatureStore::open(&path).unwrap();
        for seed in 0..10u8 {
            store.add(sha256_hex(seed), SignatureFormat::Sha256).unwrap();
        }
        for id in [2, 5, 9] {
            store.delete(id).unwrap();
        }
    }

    let store = SignatureStore::open(&path).unwrap();
    let ids: HashSet<u64> = store.iter().map(|r| r.id()).collect();
    let expected: HashSet<u64> = [1, 3, 4, 6, 7, 8, 10].into_iter().collect();
    assert_eq!(ids, expected);
    assert_eq!(store.allocator().free_ids().collect::<Vec<_>>(), vec![2, 5, 9]);
    assert_eq!(store.allocator().next_counter(), 11);

    for record in store.iter() {
        assert!(path.join(record.id().to_string()).is_file());
    }
}
