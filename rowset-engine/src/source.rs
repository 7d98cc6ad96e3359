//! 外部协作者契约
//!
//! 行集本身不做任何 I/O。数据从 `RowSource`（“给我下一行”）读入，
//! 回写时通过 `Connection`（“你能持久化这一行吗”）写回活动存储。

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::rc::Rc;

use rowset_domain::{RowSetMetaData, Value};

use crate::error::Result;

/// 拉取式的表格数据源
pub trait RowSource {
  /// 结果的列元数据
  fn metadata(&self) -> &RowSetMetaData;

  /// 下一行；数据耗尽时返回 `Ok(None)`
  fn next_row(&mut self) -> Result<Option<Vec<Value>>>;
}

/// 定位活动行用的键：`(列索引, 值)`，列索引从 1 开始
pub type RowKey = [(usize, Value)];

/// 活动存储连接
///
/// 只暴露行级别的持久化能力，不生成也不解析 SQL。
pub trait Connection {
  /// 执行命令，返回结果数据源
  fn execute(&mut self, command: &str, params: &[Value]) -> Result<Box<dyn RowSource>>;

  /// 按键读取活动行的当前值
  fn fetch_row(&mut self, table: &str, key: &RowKey) -> Result<Option<Vec<Value>>>;

  fn insert_row(&mut self, table: &str, values: &[Value]) -> Result<()>;

  fn update_row(&mut self, table: &str, key: &RowKey, values: &[Value]) -> Result<()>;

  fn delete_row(&mut self, table: &str, key: &RowKey) -> Result<()>;

  fn commit(&mut self) -> Result<()>;

  fn rollback(&mut self) -> Result<()>;

  fn auto_commit(&self) -> bool;

  fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()>;
}

/// 单元格相等（用于比较活动行与原始值）
///
/// 两个 NULL 视为相等；数值跨宽度按值比较。
pub fn cells_match(a: &Value, b: &Value) -> bool {
  a == b || a.sql_compare(b) == Some(Ordering::Equal)
}

/// 两行的每一列都相等
pub fn rows_match(a: &[Value], b: &[Value]) -> bool {
  a.len() == b.len() && a.iter().zip(b).all(|(x, y)| cells_match(x, y))
}

/// 行集持有的连接引用（翻页、`accept_changes()` 时复用）
pub type SharedConnection = Rc<RefCell<dyn Connection>>;

/// 内存数据源
///
/// 按顺序产出预先给定的行。
#[derive(Debug, Clone)]
pub struct VecSource {
  meta: RowSetMetaData,
  rows: VecDeque<Vec<Value>>,
}

impl VecSource {
  pub fn new(meta: RowSetMetaData, rows: Vec<Vec<Value>>) -> Self {
    Self { meta, rows: rows.into() }
  }

  /// 剩余行数
  pub fn remaining(&self) -> usize {
    self.rows.len()
  }
}

impl RowSource for VecSource {
  fn metadata(&self) -> &RowSetMetaData {
    &self.meta
  }

  fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
    Ok(self.rows.pop_front())
  }
}

/// 在物化缓存上重新扫描的数据源（分页时使用）
pub(crate) struct CacheSource {
  meta: RowSetMetaData,
  rows: Rc<Vec<Vec<Value>>>,
  next: usize,
}

impl CacheSource {
  pub(crate) fn new(meta: RowSetMetaData, rows: Rc<Vec<Vec<Value>>>) -> Self {
    Self { meta, rows, next: 0 }
  }
}

impl RowSource for CacheSource {
  fn metadata(&self) -> &RowSetMetaData {
    &self.meta
  }

  fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
    let row = self.rows.get(self.next).cloned();
    if row.is_some() {
      self.next += 1;
    }
    Ok(row)
  }
}
