//! 分页与读取测试

mod common;

use std::rc::Rc;

use common::{init_tracing, TestResult};
use rowset_domain::{DomainError, Handle, HandleKind, LiveObject, RowId, SerialObject, Value};
use rowset_engine::test_support::{
  names, people_options, people_rows, people_source, people_store, populated, shared_connection, RecordingListener,
};
use rowset_engine::{CachedRowSet, RowReader, RowSetError, RowSetOptions};

fn paged(page_size: usize, max_rows: usize) -> RowSetOptions {
  RowSetOptions { page_size, max_rows, ..people_options() }
}

// ===============================================
// 侧缓存分页
// ===============================================

#[test]
fn test_page_through_cached_source() -> TestResult {
  init_tracing();
  let mut set = populated(people_rows(5), paged(2, 0))?;
  assert!(set.is_paging());
  assert_eq!(names(&set)?, ["p1", "p2"]);

  assert!(set.next_page()?);
  assert_eq!(names(&set)?, ["p3", "p4"]);
  assert!(set.is_before_first());

  assert!(set.next_page()?);
  assert_eq!(names(&set)?, ["p5"]);

  assert!(!set.next_page()?);
  assert_eq!(names(&set)?, ["p5"]);

  assert!(set.previous_page()?);
  assert_eq!(names(&set)?, ["p3", "p4"]);
  assert!(set.previous_page()?);
  assert_eq!(names(&set)?, ["p1", "p2"]);
  assert!(!set.previous_page()?);
  assert_eq!(names(&set)?, ["p1", "p2"]);
  Ok(())
}

#[test]
fn test_max_rows_bounds_the_last_page() -> TestResult {
  let mut set = populated(people_rows(5), paged(2, 3))?;
  assert_eq!(names(&set)?, ["p1", "p2"]);
  assert!(set.next_page()?);
  assert_eq!(names(&set)?, ["p3"]);
  assert!(!set.next_page()?);
  assert_eq!(names(&set)?, ["p3"]);
  Ok(())
}

#[test]
fn test_paging_not_initialized() -> TestResult {
  let mut set = populated(people_rows(3), people_options())?;
  assert!(!set.is_paging());
  assert!(matches!(set.next_page(), Err(RowSetError::PagingNotInitialized)));
  assert!(matches!(set.previous_page(), Err(RowSetError::PagingNotInitialized)));
  Ok(())
}

#[test]
fn test_populate_from_start_row() -> TestResult {
  let mut set = CachedRowSet::with_options(people_options())?;
  set.populate_from(&mut people_source(people_rows(5)), 3)?;
  assert_eq!(names(&set)?, ["p3", "p4", "p5"]);

  set.populate_from(&mut people_source(people_rows(2)), 9)?;
  assert!(set.is_empty());
  assert_eq!(set.column_count(), 3);

  let err = set.populate_from(&mut people_source(people_rows(2)), 0);
  assert!(matches!(err, Err(RowSetError::InvalidArgument(_))));
  Ok(())
}

#[test]
fn test_paging_from_start_row_keeps_origin() -> TestResult {
  let mut set = CachedRowSet::with_options(paged(2, 0))?;
  set.populate_from(&mut people_source(people_rows(5)), 3)?;
  assert_eq!(names(&set)?, ["p3", "p4"]);

  assert!(set.next_page()?);
  assert_eq!(names(&set)?, ["p5"]);
  assert!(set.previous_page()?);
  assert_eq!(names(&set)?, ["p3", "p4"]);
  assert!(!set.previous_page()?);
  Ok(())
}

#[test]
fn test_max_rows_without_paging() -> TestResult {
  let set = populated(people_rows(5), RowSetOptions { max_rows: 2, ..people_options() })?;
  assert_eq!(names(&set)?, ["p1", "p2"]);
  assert!(!set.is_paging());
  Ok(())
}

#[test]
fn test_page_load_discards_pending_changes() -> TestResult {
  init_tracing();
  let mut set = populated(people_rows(4), paged(2, 0))?;
  let listener = RecordingListener::new();
  set.add_listener(listener.clone());

  assert!(set.first()?);
  set.update_string(2, "changed")?;
  set.update_row()?;
  assert!(set.next_page()?);
  assert!(set.previous_page()?);

  assert_eq!(names(&set)?, ["p1", "p2"]);
  assert!(set.first()?);
  assert!(!set.row_updated()?);
  assert_eq!(listener.count("row_set_changed"), 2);
  Ok(())
}

// ===============================================
// 按命令分页
// ===============================================

#[test]
fn test_page_by_reexecuting_command() -> TestResult {
  let store = people_store(people_rows(5));
  let (_, shared) = shared_connection(&store);
  let mut set = CachedRowSet::with_options(paged(2, 0))?;
  set.execute(shared)?;
  assert!(set.is_paging());
  assert_eq!(names(&set)?, ["p1", "p2"]);

  // 每次翻页都看到活动数据的最新内容
  store.modify("people", |rows| rows[2][1] = Value::from("fresh"));
  assert!(set.next_page()?);
  assert_eq!(names(&set)?, ["fresh", "p4"]);
  assert!(set.next_page()?);
  assert!(!set.next_page()?);
  assert!(set.previous_page()?);
  assert_eq!(names(&set)?, ["fresh", "p4"]);
  Ok(())
}

#[test]
fn test_close_ends_paging() -> TestResult {
  let store = people_store(people_rows(5));
  let (_, shared) = shared_connection(&store);
  let mut set = CachedRowSet::with_options(paged(2, 0))?;
  set.execute(shared)?;
  set.close();
  assert!(matches!(set.next_page(), Err(RowSetError::PagingNotInitialized)));
  Ok(())
}

// ===============================================
// 页大小与 max_rows 约束
// ===============================================

#[test]
fn test_page_size_and_max_rows_validation() -> TestResult {
  assert!(matches!(CachedRowSet::with_options(paged(5, 3)), Err(RowSetError::InvalidArgument(_))));

  let mut set = CachedRowSet::with_options(paged(2, 3))?;
  assert!(matches!(set.set_page_size(4), Err(RowSetError::InvalidArgument(_))));
  assert!(matches!(set.set_max_rows(1), Err(RowSetError::InvalidArgument(_))));
  set.set_max_rows(0)?;
  set.set_page_size(4)?;
  assert_eq!(set.page_size(), 4);
  assert_eq!(set.max_rows(), 0);
  Ok(())
}

// ===============================================
// 行读取器
// ===============================================

#[test]
fn test_reader_limits() {
  assert_eq!(RowReader::new(0, 0).limit(), None);
  assert_eq!(RowReader::new(3, 0).limit(), Some(3));
  assert_eq!(RowReader::new(0, 2).limit(), Some(2));
  assert_eq!(RowReader::new(3, 5).limit(), Some(3));
}

#[test]
fn test_reader_assigns_consecutive_ids() -> TestResult {
  let reader = RowReader::new(0, 0).skip(1);
  let (rows, next) = reader.read(&mut people_source(people_rows(3)), RowId::new(10))?;
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0].id(), RowId::new(10));
  assert_eq!(rows[1].id(), RowId::new(11));
  assert_eq!(next, RowId::new(12));
  assert_eq!(rows[0].get(2)?, &Value::from("p2"));
  Ok(())
}

#[test]
fn test_reader_rejects_ragged_rows() -> TestResult {
  let mut rows = people_rows(2);
  rows[1].pop();
  let mut set = CachedRowSet::new();
  let err = set.populate(&mut people_source(rows));
  assert!(matches!(err, Err(RowSetError::Conversion(_))));
  Ok(())
}

#[derive(Debug)]
struct ClosedClob;

impl LiveObject for ClosedClob {
  fn kind(&self) -> HandleKind {
    HandleKind::Clob
  }

  fn materialize(&self) -> Result<SerialObject, DomainError> {
    Err(DomainError::Conversion { message: "clob stream closed".to_string() })
  }
}

#[derive(Debug)]
struct OpenClob(&'static str);

impl LiveObject for OpenClob {
  fn kind(&self) -> HandleKind {
    HandleKind::Clob
  }

  fn materialize(&self) -> Result<SerialObject, DomainError> {
    Ok(SerialObject::Clob(self.0.to_string()))
  }
}

#[test]
fn test_reader_detaches_live_handles() -> TestResult {
  let mut rows = people_rows(1);
  rows[0][1] = Value::Handle(Handle::Live(Rc::new(OpenClob("long text"))));
  let set = populated(rows, people_options())?;
  assert_eq!(
    set.to_column(2)?,
    vec![Value::Handle(Handle::Serial(SerialObject::Clob("long text".to_string())))]
  );

  let mut rows = people_rows(1);
  rows[0][1] = Value::Handle(Handle::Live(Rc::new(ClosedClob)));
  assert!(matches!(populated(rows, people_options()), Err(RowSetError::Conversion(_))));
  Ok(())
}
