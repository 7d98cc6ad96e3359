//! 编辑与插入行协议测试

mod common;

use std::rc::Rc;

use chrono::NaiveDate;
use common::{init_tracing, TestResult};
use rowset_domain::{ColumnMeta, DataType, Decimal, Handle, RowSetMetaData, SerialObject, Value};
use rowset_engine::test_support::{named_rows, names, people_meta, people_options, populated, RecordingListener};
use rowset_engine::{CachedRowSet, Concurrency, RowSetError, RowSetListener, RowSetOptions};

fn abc() -> Result<CachedRowSet, RowSetError> {
  populated(named_rows(&["A", "B", "C"]), people_options())
}

// ===============================================
// 读取与更新
// ===============================================

#[test]
fn test_typed_getters() -> TestResult {
  let mut set = abc()?;
  assert!(set.first()?);
  assert_eq!(set.get_int(1)?, Some(1));
  assert_eq!(set.get_long(1)?, Some(1));
  assert_eq!(set.get_string(1)?.as_deref(), Some("1"));
  assert_eq!(set.get_short(3)?, None);
  assert_eq!(set.get_by_name::<String>("NAME")?.as_deref(), Some("A"));
  assert_eq!(set.get_value_by_name("id")?, Value::Integer(1));
  assert!(matches!(set.get_by_name::<i32>("missing"), Err(RowSetError::ColumnNotFound(_))));
  assert!(matches!(set.get_date(2), Err(RowSetError::DataTypeMismatch { column: 2, .. })));
  Ok(())
}

#[test]
fn test_update_then_cancel_restores_value() -> TestResult {
  init_tracing();
  let mut set = abc()?;
  assert!(set.first()?);
  set.update_string(2, "Z")?;
  assert_eq!(set.get_string(2)?.as_deref(), Some("Z"));
  assert!(set.column_updated(2)?);
  assert!(!set.column_updated(1)?);

  set.cancel_row_updates()?;
  assert_eq!(set.get_string(2)?.as_deref(), Some("A"));
  assert!(!set.column_updated(2)?);
  Ok(())
}

#[test]
fn test_update_coerces_to_declared_type() -> TestResult {
  let mut set = abc()?;
  assert!(set.first()?);

  set.update_int(3, 30)?;
  assert_eq!(set.get_value(3)?, Value::SmallInt(30));
  assert_eq!(set.get_short(3)?, Some(30));

  let err = set.update_int(3, 100_000);
  assert!(matches!(err, Err(RowSetError::DataTypeMismatch { column: 3, .. })));
  assert!(matches!(set.update_double(1, 1.5), Err(RowSetError::DataTypeMismatch { .. })));
  assert!(matches!(set.update_int(4, 1), Err(RowSetError::ColumnIndex { index: 4, count: 3 })));

  // 字符串对所有标量列透传
  set.update_string(1, "7")?;
  assert_eq!(set.get_int(1)?, Some(7));
  Ok(())
}

#[test]
fn test_update_requires_current_row() -> TestResult {
  let mut set = abc()?;
  assert!(matches!(set.update_int(1, 1), Err(RowSetError::CursorState(_))));
  set.after_last()?;
  assert!(matches!(set.update_row(), Err(RowSetError::CursorState(_))));
  assert!(matches!(set.delete_row(), Err(RowSetError::CursorState(_))));
  Ok(())
}

#[test]
fn test_update_row_and_undo_update() -> TestResult {
  let mut set = abc()?;
  assert!(set.absolute(2)?);
  set.update_string(2, "BB")?;
  set.update_row()?;
  assert!(set.row_updated()?);
  set.update_row()?;
  assert!(set.row_updated()?);
  assert_eq!(set.original_row()?[1], Value::from("B"));

  set.undo_update()?;
  assert!(!set.row_updated()?);
  assert_eq!(set.get_string(2)?.as_deref(), Some("B"));
  assert!(matches!(set.undo_update(), Err(RowSetError::IllegalState(_))));
  Ok(())
}

#[test]
fn test_cancel_reverts_updated_row() -> TestResult {
  let mut set = abc()?;
  assert!(set.first()?);
  set.update_string(2, "AA")?;
  set.update_row()?;
  set.cancel_row_updates()?;
  assert!(!set.row_updated()?);
  assert_eq!(names(&set)?, ["A", "B", "C"]);
  Ok(())
}

#[test]
fn test_read_only_rejects_edits() -> TestResult {
  let options = RowSetOptions { concurrency: Concurrency::ReadOnly, ..people_options() };
  let mut set = populated(named_rows(&["A"]), options)?;
  assert!(set.first()?);

  assert!(matches!(set.update_int(1, 2), Err(RowSetError::ReadOnlyViolation(_))));
  assert!(matches!(set.update_row(), Err(RowSetError::ReadOnlyViolation(_))));
  assert!(matches!(set.delete_row(), Err(RowSetError::ReadOnlyViolation(_))));
  assert!(matches!(set.move_to_insert_row(), Err(RowSetError::ReadOnlyViolation(_))));
  assert_eq!(set.get_string(2)?.as_deref(), Some("A"));
  Ok(())
}

#[test]
fn test_decimal_and_temporal_columns() -> TestResult {
  let meta = RowSetMetaData::new(vec![
    ColumnMeta::new("price", DataType::Decimal),
    ColumnMeta::new("day", DataType::Date),
  ]);
  let mut set = CachedRowSet::new();
  set.set_metadata(meta)?;
  set.move_to_insert_row()?;

  let day = NaiveDate::from_ymd_opt(2024, 2, 29).ok_or("date")?;
  set.update_long(1, 12)?;
  set.update_timestamp(2, day.and_hms_opt(13, 0, 0).ok_or("time")?)?;
  assert_eq!(set.get_decimal(1)?, Some(Decimal::from_i64(12)));
  assert_eq!(set.get_date(2)?, Some(day));

  set.update_decimal(1, "9.95".parse()?)?;
  assert_eq!(set.get_double(1)?, Some(9.95));
  Ok(())
}

// ===============================================
// 删除与撤销
// ===============================================

#[test]
fn test_delete_and_undo_delete() -> TestResult {
  let mut set = abc()?;
  assert!(set.absolute(2)?);
  assert!(matches!(set.undo_delete(), Err(RowSetError::IllegalState(_))));

  set.delete_row()?;
  set.delete_row()?;
  assert_eq!(set.deleted_count(), 1);
  assert!(matches!(set.update_string(2, "x"), Err(RowSetError::IllegalState(_))));
  assert!(matches!(set.update_row(), Err(RowSetError::IllegalState(_))));

  set.undo_delete()?;
  assert_eq!(set.deleted_count(), 0);
  assert_eq!(set.size(), 3);
  assert!(!set.row_deleted()?);
  Ok(())
}

#[test]
fn test_restore_original_discards_everything() -> TestResult {
  let mut set = abc()?;
  assert!(set.first()?);
  set.update_string(2, "AA")?;
  set.update_row()?;
  assert!(set.next()?);
  set.delete_row()?;
  set.move_to_insert_row()?;
  set.update_int(1, 9)?;
  set.insert_row()?;
  set.move_to_current_row();

  set.restore_original()?;
  assert_eq!(names(&set)?, ["A", "B", "C"]);
  assert_eq!(set.deleted_count(), 0);
  assert_eq!(set.physical_len(), 3);
  assert!(set.is_before_first());
  Ok(())
}

// ===============================================
// 插入行协议
// ===============================================

#[test]
fn test_insert_row_without_updates_is_rejected() -> TestResult {
  let mut set = abc()?;
  assert!(matches!(set.insert_row(), Err(RowSetError::IllegalInsert(_))));

  set.move_to_insert_row()?;
  assert!(matches!(set.insert_row(), Err(RowSetError::IllegalInsert(_))));
  assert_eq!(set.physical_len(), 3);
  Ok(())
}

#[test]
fn test_insert_row_requires_not_null_columns() -> TestResult {
  let mut set = abc()?;
  set.move_to_insert_row()?;
  set.update_string(2, "N")?;
  assert!(matches!(set.insert_row(), Err(RowSetError::IllegalInsert(_))));

  set.update_null(1)?;
  assert!(matches!(set.insert_row(), Err(RowSetError::IllegalInsert(_))));

  set.update_int(1, 4)?;
  set.insert_row()?;
  assert_eq!(set.physical_len(), 4);
  Ok(())
}

#[test]
fn test_inserted_row_lands_after_remembered_row() -> TestResult {
  init_tracing();
  let mut set = abc()?;
  assert!(set.first()?);
  set.move_to_insert_row()?;
  assert_eq!(set.get_value(2)?, Value::Null);
  set.update_int(1, 10)?;
  set.update_string(2, "N")?;
  set.insert_row()?;

  // 仍在插入行上，暂存行已清空
  assert!(set.is_on_insert_row());
  assert_eq!(set.get_value(1)?, Value::Null);

  set.move_to_current_row();
  assert_eq!(set.get_string(2)?.as_deref(), Some("A"));
  assert!(set.next()?);
  assert_eq!(set.get_string(2)?.as_deref(), Some("N"));
  assert!(set.row_inserted()?);
  assert_eq!(names(&set)?, ["A", "N", "B", "C"]);
  Ok(())
}

#[test]
fn test_insert_from_after_last_appends() -> TestResult {
  let mut set = abc()?;
  set.after_last()?;
  set.move_to_insert_row()?;
  for (id, name) in [(4, "D"), (5, "E")] {
    set.update_int(1, id)?;
    set.update_string(2, name)?;
    set.insert_row()?;
  }
  set.move_to_current_row();
  assert!(set.is_after_last());
  assert_eq!(names(&set)?, ["A", "B", "C", "D", "E"]);
  Ok(())
}

#[test]
fn test_undo_insert_removes_row() -> TestResult {
  let mut set = abc()?;
  assert!(set.first()?);
  assert!(matches!(set.undo_insert(), Err(RowSetError::IllegalState(_))));

  set.move_to_insert_row()?;
  set.update_int(1, 10)?;
  set.insert_row()?;
  set.move_to_current_row();
  assert!(set.next()?);
  assert!(set.row_inserted()?);

  set.undo_insert()?;
  assert_eq!(set.physical_len(), 3);
  assert_eq!(set.get_string(2)?.as_deref(), Some("B"));
  Ok(())
}

#[test]
fn test_undo_insert_skips_hidden_deleted_row() -> TestResult {
  let mut set = abc()?;
  assert!(set.absolute(2)?);
  set.delete_row()?;

  assert!(set.first()?);
  set.move_to_insert_row()?;
  set.update_int(1, 10)?;
  set.insert_row()?;
  set.move_to_current_row();
  assert!(set.next()?);
  assert!(set.row_inserted()?);

  set.undo_insert()?;
  assert_eq!(set.get_row(), 2);
  assert_eq!(set.get_string(2)?.as_deref(), Some("C"));
  assert!(!set.row_deleted()?);
  Ok(())
}

#[test]
fn test_build_row_set_from_metadata() -> TestResult {
  let mut set = CachedRowSet::new();
  assert!(matches!(set.move_to_insert_row(), Err(RowSetError::IllegalInsert(_))));

  set.set_metadata(people_meta())?;
  set.move_to_insert_row()?;
  set.update_by_name("id", 1)?;
  set.update_by_name("name", "first")?;
  set.insert_row()?;
  set.move_to_current_row();

  assert!(set.is_before_first());
  assert!(set.next()?);
  assert_eq!(set.get_string(2)?.as_deref(), Some("first"));
  assert_eq!(set.size(), 1);
  Ok(())
}

#[test]
fn test_untyped_columns_pass_values_through() -> TestResult {
  let mut set = CachedRowSet::new();
  set.set_metadata(RowSetMetaData::new(vec![ColumnMeta::untyped("anything")]))?;
  set.move_to_insert_row()?;
  set.update_double(1, 2.5)?;
  assert_eq!(set.get_value(1)?, Value::Double(2.5));

  let clob = Value::Handle(Handle::Serial(SerialObject::Clob("c".into())));
  set.update_value(1, clob.clone())?;
  assert_eq!(set.get_value(1)?, clob);
  Ok(())
}

// ===============================================
// 批量访问与监听器
// ===============================================

#[test]
fn test_to_collection_respects_visibility() -> TestResult {
  let mut set = abc()?;
  assert!(set.absolute(1)?);
  set.delete_row()?;

  assert_eq!(set.to_collection().len(), 2);
  assert_eq!(set.to_column_by_name("id")?, vec![Value::Integer(2), Value::Integer(3)]);
  assert!(matches!(set.to_column(9), Err(RowSetError::ColumnIndex { .. })));
  Ok(())
}

#[test]
fn test_listeners_receive_events() -> TestResult {
  let mut set = abc()?;
  let listener = RecordingListener::new();
  let handle: Rc<dyn RowSetListener> = listener.clone();
  set.add_listener(Rc::clone(&handle));

  assert!(set.absolute(2)?);
  set.delete_row()?;

  let events = listener.events();
  assert_eq!(events.len(), 2);
  assert_eq!(events[0].0, "cursor_moved");
  assert_eq!(events[0].1.row, 2);
  assert_eq!(events[0].1.size, 3);
  assert_eq!(events[1].0, "row_changed");
  assert_eq!(events[1].1.size, 2);

  set.remove_listener(&handle);
  assert!(set.first()?);
  assert_eq!(listener.count("cursor_moved"), 1);
  Ok(())
}

#[test]
fn test_release_and_close() -> TestResult {
  let mut set = abc()?;
  let listener = RecordingListener::new();
  set.add_listener(listener.clone());

  set.release();
  assert_eq!(set.size(), 0);
  assert_eq!(set.column_count(), 3);
  assert_eq!(listener.count("row_set_changed"), 1);

  set.close();
  assert_eq!(set.column_count(), 0);
  assert!(set.connection().is_none());
  Ok(())
}
