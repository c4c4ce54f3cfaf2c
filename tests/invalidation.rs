//! Invalidation and Isolation Tests
//!
//! Handle validity across writes:
//! - Clearing a table invalidates every outstanding handle into it
//! - Deleting a row invalidates its handles and unlinks it everywhere
//! - Readers see committed state only; rollback discards staged edits
//! - Result-set deletion through a write transaction

use tabula::query::SortDirection;
use tabula::{ColumnType, Database, DatabaseConfig, ErrorCode, Object, SchemaRegistry, TableSchema};

// =============================================================================
// Helper Functions
// =============================================================================

fn open_db() -> Database {
    let schema = SchemaRegistry::new()
        .with_table(
            TableSchema::new("Owner")
                .column("name", ColumnType::String)
                .link("favorite", "Dog")
                .link_list("dogs", "Dog"),
        )
        .unwrap()
        .with_table(
            TableSchema::new("Dog")
                .column("name", ColumnType::String)
                .column("age", ColumnType::Int),
        )
        .unwrap();
    Database::open(DatabaseConfig::default(), schema).unwrap()
}

fn add_dogs(db: &Database, count: i64) -> Vec<Object> {
    let mut txn = db.begin_write().unwrap();
    let mut dogs = Vec::new();
    for i in 0..count {
        let dog = txn
            .create_object("Dog")
            .unwrap()
            .set_string("name", &format!("Dog {}", i))
            .unwrap()
            .set_long("age", i)
            .unwrap()
            .to_object()
            .unwrap();
        dogs.push(dog);
    }
    txn.commit().unwrap();
    dogs
}

fn add_owner(db: &Database, favorite: &Object, dogs: &[Object]) -> Object {
    let mut txn = db.begin_write().unwrap();
    let owner = txn
        .create_object("Owner")
        .unwrap()
        .set_string("name", "Owner")
        .unwrap()
        .set_object("favorite", Some(favorite))
        .unwrap()
        .set_list("dogs", dogs)
        .unwrap()
        .to_object()
        .unwrap();
    txn.commit().unwrap();
    owner
}

// =============================================================================
// Table Clear
// =============================================================================

/// Object handles into a cleared table fail with InvalidState
#[test]
fn test_clear_invalidates_objects() {
    let db = open_db();
    let dogs = add_dogs(&db, 3);
    assert!(dogs[0].is_valid());

    let mut txn = db.begin_write().unwrap();
    assert_eq!(txn.clear("Dog").unwrap(), 3);
    txn.commit().unwrap();

    assert!(!dogs[0].is_valid());
    let err = dogs[0].get_string("name").unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);
}

/// Results and their sub-queries fail after the table is cleared
#[test]
fn test_clear_invalidates_results() {
    let db = open_db();
    add_dogs(&db, 5);
    let results = db.all_objects("Dog").unwrap();
    let sub = results.where_().unwrap();

    let mut txn = db.begin_write().unwrap();
    txn.clear("Dog").unwrap();
    txn.commit().unwrap();
    add_dogs(&db, 5);

    assert!(results.get(0).unwrap_err().is_invalid_state());
    assert!(results.first().unwrap_err().is_invalid_state());
    assert!(results.where_().unwrap_err().is_invalid_state());
    assert!(results.sort("name").unwrap_err().is_invalid_state());
    assert!(sub.find_all().unwrap_err().is_invalid_state());

    assert_eq!(db.all_objects("Dog").unwrap().len(), 5);
}

/// A list read before its target table was cleared cannot be sub-queried
#[test]
fn test_clear_invalidates_link_lists() {
    let db = open_db();
    let dogs = add_dogs(&db, 3);
    let owner = add_owner(&db, &dogs[0], &dogs);
    let list = owner.get_list("dogs").unwrap();

    let mut txn = db.begin_write().unwrap();
    txn.clear("Dog").unwrap();
    txn.commit().unwrap();

    assert!(list.where_().unwrap_err().is_invalid_state());
    assert!(list.get(0).unwrap().get_string("name").unwrap_err().is_invalid_state());
    assert!(owner.is_valid());
    assert!(owner.get_list("dogs").unwrap().is_empty());
    assert!(owner.is_null("favorite").unwrap());
}

/// A handle from a cleared table cannot be edited or linked
#[test]
fn test_cleared_handles_rejected_by_writes() {
    let db = open_db();
    let dogs = add_dogs(&db, 1);
    let owner = add_owner(&db, &dogs[0], &[]);

    let mut txn = db.begin_write().unwrap();
    txn.clear("Dog").unwrap();
    assert!(txn.edit(&dogs[0]).map(|_| ()).unwrap_err().is_invalid_state());
    let err = txn
        .edit(&owner)
        .unwrap()
        .set_object("favorite", Some(&dogs[0]))
        .map(|_| ())
        .unwrap_err();
    assert!(err.is_invalid_state());
}

// =============================================================================
// Row Deletion
// =============================================================================

#[test]
fn test_delete_invalidates_object() {
    let db = open_db();
    let dogs = add_dogs(&db, 2);

    let mut txn = db.begin_write().unwrap();
    txn.delete(&dogs[0]).unwrap();
    assert!(txn.delete(&dogs[0]).unwrap_err().is_invalid_state());
    txn.commit().unwrap();

    assert!(!dogs[0].is_valid());
    assert!(dogs[1].is_valid());
    assert!(dogs[0].get_long("age").unwrap_err().is_invalid_state());
}

/// Deleting a row removes it from every link and link list
#[test]
fn test_delete_unlinks_everywhere() {
    let db = open_db();
    let dogs = add_dogs(&db, 3);
    let owner = add_owner(&db, &dogs[1], &[dogs[0].clone(), dogs[1].clone(), dogs[1].clone(), dogs[2].clone()]);

    let mut txn = db.begin_write().unwrap();
    txn.delete(&dogs[1]).unwrap();
    txn.commit().unwrap();

    assert!(owner.is_null("favorite").unwrap());
    let list = owner.get_list("dogs").unwrap();
    assert_eq!(list.row_ids(), &[dogs[0].row_id(), dogs[2].row_id()]);
}

/// Sub-queries skip members deleted after the scope was captured
#[test]
fn test_sub_query_skips_deleted_rows() {
    let db = open_db();
    let dogs = add_dogs(&db, 4);
    let results = db.all_objects("Dog").unwrap();
    let sub = results.where_().unwrap();

    let mut txn = db.begin_write().unwrap();
    txn.delete(&dogs[2]).unwrap();
    txn.commit().unwrap();

    let found = sub.find_all().unwrap();
    assert_eq!(found.row_ids(), &[dogs[0].row_id(), dogs[1].row_id(), dogs[3].row_id()]);
}

/// Sorting a result set that holds a deleted row is rejected
#[test]
fn test_sort_with_deleted_member() {
    let db = open_db();
    let dogs = add_dogs(&db, 3);
    let results = db.all_objects("Dog").unwrap();

    let mut txn = db.begin_write().unwrap();
    txn.delete(&dogs[0]).unwrap();
    txn.commit().unwrap();

    let err = results.sort_by("age", SortDirection::Desc).unwrap_err();
    assert!(err.is_invalid_state());
}

// =============================================================================
// Result-set Clear
// =============================================================================

#[test]
fn test_results_clear() {
    let db = open_db();
    add_dogs(&db, 10);
    let old = db
        .query("Dog")
        .unwrap()
        .greater_than_or_equal_to("age", 5)
        .unwrap()
        .find_all()
        .unwrap();

    let mut txn = db.begin_write().unwrap();
    assert_eq!(old.clear(&mut txn).unwrap(), 5);
    assert_eq!(old.clear(&mut txn).unwrap(), 0);
    txn.commit().unwrap();

    assert_eq!(db.all_objects("Dog").unwrap().len(), 5);
    assert_eq!(
        db.query("Dog")
            .unwrap()
            .greater_than_or_equal_to("age", 5)
            .unwrap()
            .count()
            .unwrap(),
        0
    );
}

#[test]
fn test_results_clear_after_table_clear() {
    let db = open_db();
    add_dogs(&db, 3);
    let results = db.all_objects("Dog").unwrap();

    let mut txn = db.begin_write().unwrap();
    txn.clear("Dog").unwrap();
    assert!(results.clear(&mut txn).unwrap_err().is_invalid_state());
}

#[test]
fn test_results_clear_rejects_foreign_transaction() {
    let db = open_db();
    let other = open_db();
    add_dogs(&db, 3);
    let results = db.all_objects("Dog").unwrap();

    let mut txn = other.begin_write().unwrap();
    assert!(results.clear(&mut txn).unwrap_err().is_invalid_argument());
}

// =============================================================================
// Snapshot Isolation
// =============================================================================

/// Staged edits are invisible until commit
#[test]
fn test_uncommitted_writes_are_invisible() {
    let db = open_db();
    let dogs = add_dogs(&db, 1);

    let mut txn = db.begin_write().unwrap();
    txn.edit(&dogs[0]).unwrap().set_long("age", 99).unwrap();
    txn.create_object("Dog").unwrap();

    assert_eq!(dogs[0].get_long("age").unwrap(), 0);
    assert_eq!(db.all_objects("Dog").unwrap().len(), 1);

    txn.commit().unwrap();
    assert_eq!(dogs[0].get_long("age").unwrap(), 99);
    assert_eq!(db.all_objects("Dog").unwrap().len(), 2);
}

#[test]
fn test_rollback_discards_changes() {
    let db = open_db();
    let dogs = add_dogs(&db, 2);

    let mut txn = db.begin_write().unwrap();
    txn.delete(&dogs[0]).unwrap();
    txn.clear("Owner").unwrap();
    txn.rollback();

    assert!(dogs[0].is_valid());

    {
        let mut txn = db.begin_write().unwrap();
        txn.edit(&dogs[1]).unwrap().set_long("age", 50).unwrap();
    }
    assert_eq!(dogs[1].get_long("age").unwrap(), 1);

    let metrics = db.metrics().snapshot();
    assert_eq!(metrics.rollbacks, 2);
}

/// A result set keeps its own membership while the table changes
#[test]
fn test_results_are_stable_across_commits() {
    let db = open_db();
    add_dogs(&db, 3);
    let results = db.all_objects("Dog").unwrap();
    add_dogs(&db, 3);

    assert_eq!(results.len(), 3);
    assert_eq!(results.last().unwrap().unwrap().get_long("age").unwrap(), 2);
    assert_eq!(db.all_objects("Dog").unwrap().len(), 6);
}

#[test]
fn test_snapshot_versions() {
    let db = open_db();
    let before = db.snapshot().unwrap();
    assert_eq!(before.version(), 0);

    let mut txn = db.begin_write().unwrap();
    txn.create_object("Dog").unwrap();
    assert_eq!(txn.commit().unwrap(), 1);

    let after = db.snapshot().unwrap();
    assert_eq!(after.version(), 1);
    assert_eq!(before.version(), 0);
}
