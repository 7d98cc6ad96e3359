//! 测试夹具
//!
//! 集成测试共用的元数据、数据源、内存存储与监听器。

use std::cell::RefCell;
use std::rc::Rc;

use rowset_domain::{ColumnMeta, DataType, RowSetMetaData, Value};

pub use crate::error::{Result, RowSetError};
use crate::listener::{RowSetEvent, RowSetListener};
use crate::memory::{MemoryConnection, MemoryStore};
use crate::options::RowSetOptions;
use crate::rowset::CachedRowSet;
use crate::source::{SharedConnection, VecSource};

pub const PEOPLE: &str = "people";

/// `people(id INTEGER NOT NULL, name VARCHAR, age SMALLINT)`
pub fn people_meta() -> RowSetMetaData {
  RowSetMetaData::new(vec![
    ColumnMeta::new("id", DataType::Integer).not_null().with_table(PEOPLE),
    ColumnMeta::new("name", DataType::Varchar).with_table(PEOPLE),
    ColumnMeta::new("age", DataType::SmallInt).with_table(PEOPLE),
  ])
}

/// `n` 行样例数据：`(i, "p{i}", 20 + i)`
pub fn people_rows(n: usize) -> Vec<Vec<Value>> {
  (1..=n)
    .map(|i| vec![Value::Integer(i as i32), Value::Text(format!("p{i}")), Value::SmallInt(20 + i as i16)])
    .collect()
}

/// 以 `names` 为姓名的数据：id 从 1 开始
pub fn named_rows(names: &[&str]) -> Vec<Vec<Value>> {
  names
    .iter()
    .enumerate()
    .map(|(i, name)| vec![Value::Integer(i as i32 + 1), Value::from(*name), Value::Null])
    .collect()
}

pub fn people_source(rows: Vec<Vec<Value>>) -> VecSource {
  VecSource::new(people_meta(), rows)
}

/// 只含 `people` 表的内存存储
pub fn people_store(rows: Vec<Vec<Value>>) -> MemoryStore {
  let store = MemoryStore::new();
  store.create_table(PEOPLE, people_meta(), rows);
  store
}

/// 连接及其 trait 对象形式（后者交给行集，前者留给测试检查与注入故障）
pub fn shared_connection(store: &MemoryStore) -> (Rc<RefCell<MemoryConnection>>, SharedConnection) {
  let connection = Rc::new(RefCell::new(store.connect()));
  let shared: SharedConnection = connection.clone();
  (connection, shared)
}

/// 回写到 `people` 表（键列 id）的选项
pub fn people_options() -> RowSetOptions {
  RowSetOptions {
    command: PEOPLE.to_string(),
    table_name: PEOPLE.to_string(),
    key_columns: vec![1],
    ..RowSetOptions::default()
  }
}

/// 从内存数据源填充的行集
pub fn populated(rows: Vec<Vec<Value>>, options: RowSetOptions) -> Result<CachedRowSet> {
  let mut set = CachedRowSet::with_options(options)?;
  set.populate(&mut people_source(rows))?;
  Ok(set)
}

/// 所有可见行的 name 列
pub fn names(set: &CachedRowSet) -> Result<Vec<String>> {
  Ok(set.to_column(2)?.iter().map(ToString::to_string).collect())
}

/// 记录收到的事件
#[derive(Debug, Default)]
pub struct RecordingListener {
  events: RefCell<Vec<(&'static str, RowSetEvent)>>,
}

impl RecordingListener {
  pub fn new() -> Rc<Self> {
    Rc::new(Self::default())
  }

  pub fn events(&self) -> Vec<(&'static str, RowSetEvent)> {
    self.events.borrow().clone()
  }

  pub fn count(&self, kind: &str) -> usize {
    self.events.borrow().iter().filter(|(k, _)| *k == kind).count()
  }

  pub fn clear(&self) {
    self.events.borrow_mut().clear();
  }
}

impl RowSetListener for RecordingListener {
  fn cursor_moved(&self, event: RowSetEvent) {
    self.events.borrow_mut().push(("cursor_moved", event));
  }

  fn row_changed(&self, event: RowSetEvent) {
    self.events.borrow_mut().push(("row_changed", event));
  }

  fn row_set_changed(&self, event: RowSetEvent) {
    self.events.borrow_mut().push(("row_set_changed", event));
  }
}
