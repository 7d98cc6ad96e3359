//! 复制、共享视图与快照测试

mod common;

use std::rc::Rc;

use common::TestResult;
use rowset_domain::{ColumnMeta, DomainError, Handle, HandleKind, LiveObject, RowSetMetaData, SerialObject, Value};
use rowset_engine::test_support::{
  named_rows, names, people_options, people_store, populated, shared_connection, RecordingListener, PEOPLE,
};
use rowset_engine::{CachedRowSet, Concurrency, RowSetError, RowSetOptions, RowSetSnapshot};

fn abc() -> Result<CachedRowSet, RowSetError> {
  populated(named_rows(&["A", "B", "C"]), people_options())
}

// ===============================================
// 复制
// ===============================================

#[test]
fn test_create_copy_is_independent() -> TestResult {
  let mut set = abc()?;
  assert!(set.absolute(2)?);
  let mut copy = set.create_copy();

  assert_eq!(copy.get_string(2)?.as_deref(), Some("B"));
  copy.update_string(2, "changed")?;
  copy.update_row()?;
  assert!(copy.next()?);
  copy.delete_row()?;

  assert_eq!(names(&set)?, ["A", "B", "C"]);
  assert_eq!(names(&copy)?, ["A", "changed"]);
  assert_eq!(set.get_row(), 2);
  assert!(!set.row_updated()?);
  Ok(())
}

#[test]
fn test_copy_keeps_pending_state() -> TestResult {
  let mut set = abc()?;
  assert!(set.first()?);
  set.delete_row()?;
  let mut copy = set.create_copy();

  assert_eq!(copy.deleted_count(), 1);
  assert_eq!(copy.size(), 2);
  copy.restore_original()?;
  assert_eq!(names(&copy)?, ["A", "B", "C"]);
  assert_eq!(set.deleted_count(), 1);
  Ok(())
}

#[test]
fn test_create_copy_schema_has_no_rows() -> TestResult {
  let set = abc()?;
  let mut schema = set.create_copy_schema();
  assert!(schema.is_empty());
  assert_eq!(schema.column_count(), 3);
  assert_eq!(schema.table_name(), PEOPLE);

  schema.move_to_insert_row()?;
  schema.update_int(1, 1)?;
  schema.insert_row()?;
  schema.move_to_current_row();
  assert_eq!(schema.size(), 1);
  assert_eq!(set.size(), 3);
  Ok(())
}

#[test]
fn test_create_copy_no_constraints_clears_keys() -> TestResult {
  let options = RowSetOptions { match_columns: vec![2], ..people_options() };
  let set = populated(named_rows(&["A"]), options)?;
  let copy = set.create_copy_no_constraints();

  assert!(copy.key_columns().is_empty());
  assert!(copy.match_columns().is_empty());
  assert_eq!(set.key_columns(), [1]);
  assert_eq!(names(&copy)?, ["A"]);
  Ok(())
}

#[test]
fn test_copies_do_not_take_listeners() -> TestResult {
  let mut set = abc()?;
  let listener = RecordingListener::new();
  set.add_listener(listener.clone());

  let mut copy = set.create_copy();
  assert!(copy.first()?);
  assert_eq!(listener.count("cursor_moved"), 0);
  Ok(())
}

// ===============================================
// 共享视图
// ===============================================

#[test]
fn test_shared_views_see_each_others_edits() -> TestResult {
  let mut set = abc()?;
  let mut view = set.create_shared();

  assert!(view.absolute(2)?);
  view.update_string(2, "shared")?;
  view.update_row()?;
  assert!(set.is_before_first());

  assert!(set.absolute(2)?);
  assert_eq!(set.get_string(2)?.as_deref(), Some("shared"));
  assert!(set.row_updated()?);

  set.delete_row()?;
  assert_eq!(view.size(), 2);
  assert_eq!(view.deleted_count(), 1);
  Ok(())
}

#[test]
fn test_shared_view_shares_listeners() -> TestResult {
  let mut set = abc()?;
  let listener = RecordingListener::new();
  set.add_listener(listener.clone());

  let mut view = set.create_shared();
  assert!(view.last()?);
  assert_eq!(listener.count("cursor_moved"), 1);
  Ok(())
}

#[test]
fn test_release_affects_shared_views_but_close_does_not() -> TestResult {
  let mut set = abc()?;
  let mut view = set.create_shared();

  view.close();
  assert_eq!(set.size(), 3);

  let other = set.create_shared();
  set.release();
  assert!(other.is_empty());
  Ok(())
}

#[test]
fn test_sync_through_shared_view() -> TestResult {
  let store = people_store(named_rows(&["A", "B"]));
  let (_, shared) = shared_connection(&store);
  let mut set = CachedRowSet::with_options(people_options())?;
  set.execute(shared)?;

  let mut view = set.create_shared();
  assert!(view.first()?);
  view.update_string(2, "AA")?;
  view.update_row()?;

  set.accept_changes()?;
  assert_eq!(store.rows(PEOPLE).map(|rows| rows[0][1].clone()), Some(Value::from("AA")));
  assert!(!view.row_updated()?);
  Ok(())
}

// ===============================================
// 原始行视图
// ===============================================

#[test]
fn test_original_shows_values_before_edits() -> TestResult {
  let mut set = abc()?;
  assert!(set.first()?);
  set.update_string(2, "AA")?;
  set.update_row()?;
  set.move_to_insert_row()?;
  set.update_int(1, 9)?;
  set.insert_row()?;
  set.move_to_current_row();

  let mut original = set.original();
  assert_eq!(original.concurrency(), Concurrency::ReadOnly);
  assert_eq!(names(&original)?, ["A", "B", "C"]);
  assert!(original.first()?);
  assert!(matches!(original.update_string(2, "x"), Err(RowSetError::ReadOnlyViolation(_))));
  assert!(original.connection().is_none());
  Ok(())
}

// ===============================================
// 快照
// ===============================================

#[test]
fn test_snapshot_roundtrip_preserves_pending_changes() -> TestResult {
  let mut set = abc()?;
  assert!(set.first()?);
  set.update_string(2, "AA")?;
  set.update_row()?;
  assert!(set.next()?);
  set.delete_row()?;
  set.move_to_insert_row()?;
  set.update_int(1, 4)?;
  set.update_string(2, "D")?;
  set.insert_row()?;
  set.move_to_current_row();

  let bytes = bincode::serialize(&set.to_snapshot()?)?;
  let snapshot: RowSetSnapshot = bincode::deserialize(&bytes)?;
  assert_eq!(snapshot.rows.len(), 4);
  assert!(!snapshot.rows[2].has_original);

  let mut restored = CachedRowSet::from_snapshot(snapshot)?;
  assert_eq!(names(&restored)?, names(&set)?);
  assert_eq!(restored.deleted_count(), 1);
  assert_eq!(restored.table_name(), PEOPLE);
  assert!(restored.first()?);
  assert!(restored.row_updated()?);
  assert_eq!(restored.original_row()?[1], Value::from("A"));

  // 恢复后的行集可以正常回写
  let store = people_store(named_rows(&["A", "B", "C"]));
  let (_, shared) = shared_connection(&store);
  restored.accept_changes_with(shared)?;
  let stored: Vec<String> =
    store.rows(PEOPLE).unwrap_or_default().iter().map(|row| row[1].to_string()).collect();
  assert_eq!(stored, ["AA", "C", "D"]);
  Ok(())
}

#[test]
fn test_restored_row_set_can_restore_original() -> TestResult {
  let mut set = abc()?;
  set.after_last()?;
  set.move_to_insert_row()?;
  set.update_int(1, 4)?;
  set.insert_row()?;
  set.move_to_current_row();

  let mut restored = CachedRowSet::from_snapshot(set.to_snapshot()?)?;
  restored.restore_original()?;
  assert_eq!(names(&restored)?, ["A", "B", "C"]);
  Ok(())
}

#[derive(Debug)]
struct Cursor;

impl LiveObject for Cursor {
  fn kind(&self) -> HandleKind {
    HandleKind::Ref
  }

  fn materialize(&self) -> Result<SerialObject, DomainError> {
    Ok(SerialObject::Ref { base_type_name: "cursor".to_string(), target: Box::new(Value::Null) })
  }
}

#[test]
fn test_snapshot_rejects_live_handles() -> TestResult {
  let mut set = CachedRowSet::new();
  set.set_metadata(RowSetMetaData::new(vec![ColumnMeta::untyped("any")]))?;
  set.move_to_insert_row()?;
  set.update_value(1, Value::Handle(Handle::Live(Rc::new(Cursor))))?;
  set.insert_row()?;
  set.move_to_current_row();

  assert!(matches!(set.to_snapshot(), Err(RowSetError::Conversion(_))));
  Ok(())
}

#[test]
fn test_snapshot_rejects_ragged_rows() -> TestResult {
  let mut snapshot = abc()?.to_snapshot()?;
  snapshot.rows[0].values.pop();
  assert!(matches!(CachedRowSet::from_snapshot(snapshot), Err(RowSetError::Conversion(_))));
  Ok(())
}

#[test]
fn test_options_deserialize_with_defaults() -> TestResult {
  let options = RowSetOptions { table_name: "t".to_string(), page_size: 10, ..RowSetOptions::default() };
  let bytes = bincode::serialize(&options)?;
  let back: RowSetOptions = bincode::deserialize(&bytes)?;
  assert_eq!(back, options);
  assert_eq!(back.concurrency, Concurrency::Updatable);
  Ok(())
}
