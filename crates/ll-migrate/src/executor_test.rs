//! Tests for the apply/repair executor against disposable stores.

use super::*;
use crate::checksum::{fingerprint, is_fingerprint};
use crate::error::ErrorKind;
use crate::repair::SchemaObject;
use crate::test_utils::{count, ledger_rows, units_with_ledger, write_unit};

const SETS_DDL: &str = "CREATE TABLE sets (id BIGINT, reps INTEGER);\n";
const LEGACY_TRACKING: &str = "ALTER TABLE sets ADD COLUMN band VARCHAR;\n";
const CURRENT_TRACKING: &str =
    "ALTER TABLE sets ADD COLUMN band VARCHAR;\nALTER TABLE sets ADD COLUMN rpe DOUBLE;\n";

fn tracking_repair() -> RepairRegistry {
    RepairRegistry::empty().register(LegacyRepair {
        id: "0003_tracking".to_string(),
        legacy_checksum: fingerprint(LEGACY_TRACKING),
        delta: vec![
            SchemaObject::column("sets", "band", "VARCHAR"),
            SchemaObject::column("sets", "rpe", "DOUBLE"),
        ],
    })
}

fn checksum_of(store: &Store, id: &str) -> String {
    store
        .conn()
        .query_row(
            "SELECT checksum FROM schema_migrations WHERE id = ?",
            [id],
            |row| row.get(0),
        )
        .unwrap()
}

// ── Happy path ─────────────────────────────────────────────────────────

#[test]
fn test_fresh_store_applies_every_unit() {
    let dir = tempfile::tempdir().unwrap();
    let units = units_with_ledger(
        dir.path(),
        &[("0002_sets", SETS_DDL), ("0003_tracking", CURRENT_TRACKING)],
    );
    let store = Store::open_memory().unwrap();

    let report = Migrator::new(&store, &units).run().unwrap();

    let applied: Vec<&str> = report.applied.iter().map(|id| id.as_str()).collect();
    assert_eq!(
        applied,
        vec!["0001_schema_migrations", "0002_sets", "0003_tracking"]
    );
    assert!(report.repaired.is_empty());
    assert!(report.changed());
    assert_eq!(ledger_rows(&store), 3);
    assert!(store.column_exists("sets", "rpe").unwrap());

    for entry in ledger::list_applied(store.conn()).unwrap().values() {
        assert!(is_fingerprint(&entry.checksum));
        assert!(!entry.down_sql.trim().is_empty());
    }
    assert_eq!(checksum_of(&store, "0003_tracking"), fingerprint(CURRENT_TRACKING));
}

#[test]
fn test_second_run_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let units = units_with_ledger(dir.path(), &[("0002_sets", SETS_DDL)]);
    let store = Store::open_memory().unwrap();
    Migrator::new(&store, &units).run().unwrap();
    let before = ledger::list_applied(store.conn()).unwrap();

    let report = Migrator::new(&store, &units).run().unwrap();

    assert!(!report.changed());
    assert_eq!(report.up_to_date.len(), 2);
    assert_eq!(ledger::list_applied(store.conn()).unwrap(), before);
}

#[test]
fn test_down_script_is_persisted_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(
        dir.path(),
        "0001_schema_migrations",
        crate::test_utils::LEDGER_DDL,
        "-- keep this comment\nDROP TABLE schema_migrations;\n",
    );
    let units = load_units(dir.path()).unwrap();
    let store = Store::open_memory().unwrap();
    Migrator::new(&store, &units).run().unwrap();

    let down: String = store
        .conn()
        .query_row("SELECT down_sql FROM schema_migrations", [], |row| row.get(0))
        .unwrap();
    assert_eq!(down, "-- keep this comment\nDROP TABLE schema_migrations;\n");
}

#[test]
fn test_run_migrations_entry_point() {
    let dir = tempfile::tempdir().unwrap();
    units_with_ledger(dir.path(), &[("0002_sets", SETS_DDL)]);
    let store = Store::open_memory().unwrap();

    let report = run_migrations(&store, dir.path()).unwrap();
    assert_eq!(report.applied.len(), 2);
}

// ── Failures during apply ──────────────────────────────────────────────

#[test]
fn test_failed_unit_is_rolled_back_and_run_resumes() {
    let dir = tempfile::tempdir().unwrap();
    let units = units_with_ledger(
        dir.path(),
        &[
            (
                "0002_sets",
                "CREATE TABLE sets (id BIGINT);\nINSERT INTO no_such_table VALUES (1);\n",
            ),
            ("0003_routines", "CREATE TABLE routines (id BIGINT);\n"),
        ],
    );
    let store = Store::open_memory().unwrap();

    let err = Migrator::new(&store, &units).run().unwrap_err();
    assert!(matches!(&err, MigrateError::Apply { id, .. } if id == "0002_sets"));
    assert_eq!(err.kind(), ErrorKind::Apply);
    assert_eq!(ledger_rows(&store), 1);
    assert!(!store.table_exists("sets").unwrap());
    assert!(!store.table_exists("routines").unwrap());

    write_unit(dir.path(), "0002_sets", SETS_DDL, "DROP TABLE sets;\n");
    let units = load_units(dir.path()).unwrap();
    let report = Migrator::new(&store, &units).run().unwrap();

    let applied: Vec<&str> = report.applied.iter().map(|id| id.as_str()).collect();
    assert_eq!(applied, vec!["0002_sets", "0003_routines"]);
    assert_eq!(ledger_rows(&store), 3);
}

#[test]
fn test_first_unit_must_create_the_ledger() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "0001_sets", SETS_DDL, "DROP TABLE sets;\n");
    let units = load_units(dir.path()).unwrap();
    let store = Store::open_memory().unwrap();

    let err = Migrator::new(&store, &units).run().unwrap_err();
    assert!(matches!(err, MigrateError::Apply { .. }));
    assert!(!store.table_exists("sets").unwrap());
}

#[test]
fn test_load_error_leaves_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    units_with_ledger(dir.path(), &[("0002_sets", SETS_DDL)]);
    std::fs::write(dir.path().join("0003_broken.sql"), "-- migrate:up\nSELECT 1;\n").unwrap();
    let store = Store::open_memory().unwrap();

    let err = run_migrations(&store, dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Load);
    assert!(!store.table_exists("schema_migrations").unwrap());
    assert!(!store.table_exists("sets").unwrap());
}

// ── Integrity ──────────────────────────────────────────────────────────

#[test]
fn test_unrecognised_drift_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let units = units_with_ledger(dir.path(), &[("0002_sets", SETS_DDL)]);
    let store = Store::open_memory().unwrap();
    Migrator::new(&store, &units).run().unwrap();

    // Edit an applied unit and add a new one after it.
    write_unit(
        dir.path(),
        "0002_sets",
        "CREATE TABLE sets (id BIGINT, reps INTEGER, rpe DOUBLE);\n",
        "SELECT 1;\n",
    );
    write_unit(dir.path(), "0003_routines", "CREATE TABLE routines (id BIGINT);\n", "SELECT 1;\n");
    let units = load_units(dir.path()).unwrap();

    let err = Migrator::new(&store, &units).run().unwrap_err();
    match &err {
        MigrateError::ChecksumMismatch {
            id,
            recorded,
            current,
        } => {
            assert_eq!(id, "0002_sets");
            assert_eq!(recorded, &fingerprint(SETS_DDL));
            assert_ne!(recorded, current);
        }
        other => panic!("expected checksum mismatch, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Integrity);
    assert_eq!(ledger_rows(&store), 2);
    assert!(!store.table_exists("routines").unwrap());
}

#[test]
fn test_orphaned_ledger_entry_stops_before_any_write() {
    let dir = tempfile::tempdir().unwrap();
    let units = units_with_ledger(
        dir.path(),
        &[("0002_sets", SETS_DDL), ("0003_routines", "CREATE TABLE routines (id BIGINT);\n")],
    );
    let store = Store::open_memory().unwrap();
    Migrator::new(&store, &units).run().unwrap();

    std::fs::remove_file(dir.path().join("0002_sets.sql")).unwrap();
    write_unit(dir.path(), "0004_weights", "CREATE TABLE weights (id BIGINT);\n", "SELECT 1;\n");
    let units = load_units(dir.path()).unwrap();

    let err = Migrator::new(&store, &units).run().unwrap_err();
    assert!(matches!(&err, MigrateError::OrphanedEntry { id } if id == "0002_sets"));
    assert_eq!(err.kind(), ErrorKind::Integrity);
    assert!(!store.table_exists("weights").unwrap());
    assert_eq!(ledger_rows(&store), 3);
}

// ── Legacy repair ──────────────────────────────────────────────────────

/// Store that applied the legacy form of `0003_tracking`, with the corrected
/// definition written to `dir` afterwards.
fn legacy_store(dir: &Path) -> Store {
    let units = units_with_ledger(
        dir,
        &[("0002_sets", SETS_DDL), ("0003_tracking", LEGACY_TRACKING)],
    );
    let store = Store::open_memory().unwrap();
    Migrator::new(&store, &units).run().unwrap();
    write_unit(dir, "0003_tracking", CURRENT_TRACKING, "ALTER TABLE sets DROP COLUMN rpe;\n");
    store
}

#[test]
fn test_recognised_legacy_checksum_is_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let store = legacy_store(dir.path());
    let units = load_units(dir.path()).unwrap();

    let report = Migrator::new(&store, &units)
        .with_repairs(tracking_repair())
        .run()
        .unwrap();

    let repaired: Vec<&str> = report.repaired.iter().map(|id| id.as_str()).collect();
    assert_eq!(repaired, vec!["0003_tracking"]);
    assert!(report.applied.is_empty());
    assert!(store.column_exists("sets", "rpe").unwrap());
    assert_eq!(checksum_of(&store, "0003_tracking"), fingerprint(CURRENT_TRACKING));
    assert_eq!(ledger_rows(&store), 3);

    let ledger = ledger::list_applied(store.conn()).unwrap();
    assert_eq!(
        ledger["0003_tracking"].down_sql,
        "ALTER TABLE sets DROP COLUMN rpe;\n"
    );

    let again = Migrator::new(&store, &units)
        .with_repairs(tracking_repair())
        .run()
        .unwrap();
    assert!(!again.changed());
}

#[test]
fn test_repair_when_legacy_effects_are_missing() {
    let dir = tempfile::tempdir().unwrap();
    let units = units_with_ledger(dir.path(), &[("0002_sets", SETS_DDL)]);
    let store = Store::open_memory().unwrap();
    Migrator::new(&store, &units).run().unwrap();

    // Ledger claims the legacy form ran, but none of its columns exist.
    store
        .conn()
        .execute(
            "INSERT INTO schema_migrations VALUES ('0003_tracking', ?, TIMESTAMP '2024-01-01 00:00:00', 'legacy')",
            [fingerprint(LEGACY_TRACKING)],
        )
        .unwrap();
    write_unit(dir.path(), "0003_tracking", CURRENT_TRACKING, "SELECT 1;\n");
    let units = load_units(dir.path()).unwrap();

    Migrator::new(&store, &units)
        .with_repairs(tracking_repair())
        .run()
        .unwrap();

    assert!(store.column_exists("sets", "band").unwrap());
    assert!(store.column_exists("sets", "rpe").unwrap());
}

#[test]
fn test_legacy_checksum_without_registry_entry_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = legacy_store(dir.path());
    let units = load_units(dir.path()).unwrap();

    let err = Migrator::new(&store, &units)
        .with_repairs(RepairRegistry::empty())
        .run()
        .unwrap_err();
    assert!(matches!(err, MigrateError::ChecksumMismatch { .. }));
    assert!(!store.column_exists("sets", "rpe").unwrap());
}

#[test]
fn test_failed_repair_keeps_legacy_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let store = legacy_store(dir.path());
    let units = load_units(dir.path()).unwrap();
    let broken = RepairRegistry::empty().register(LegacyRepair {
        id: "0003_tracking".to_string(),
        legacy_checksum: fingerprint(LEGACY_TRACKING),
        delta: vec![
            SchemaObject::column("sets", "rpe", "DOUBLE"),
            SchemaObject::column("no_such_table", "rpe", "DOUBLE"),
        ],
    });

    let err = Migrator::new(&store, &units)
        .with_repairs(broken)
        .run()
        .unwrap_err();

    assert!(matches!(&err, MigrateError::Repair { id, .. } if id == "0003_tracking"));
    assert_eq!(err.kind(), ErrorKind::Apply);
    assert_eq!(checksum_of(&store, "0003_tracking"), fingerprint(LEGACY_TRACKING));
    assert!(!store.column_exists("sets", "rpe").unwrap());
    assert_eq!(count(&store, "SELECT COUNT(*) FROM schema_migrations"), 3);
}
