//! 内存活动存储
//!
//! `MemoryStore` 保存若干张命名表；`MemoryConnection` 在其上实现 `Connection`，
//! 带有事务暂存（非自动提交模式下第一次写入时保存快照，回滚时恢复）与故障注入。
//! 命令直接解析为表名，不解析 SQL。

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use rowset_domain::{RowSetMetaData, Value};
use tracing::trace;

use crate::error::{Result, RowSetError};
use crate::source::{cells_match, Connection, RowKey, RowSource, VecSource};

#[derive(Debug, Clone, PartialEq)]
struct MemoryTable {
  meta: RowSetMetaData,
  rows: Vec<Vec<Value>>,
}

type Tables = BTreeMap<String, MemoryTable>;

/// 共享的内存存储（克隆共享同一份数据）
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  tables: Rc<RefCell<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// 创建或替换一张表
  pub fn create_table(&self, name: impl Into<String>, meta: RowSetMetaData, rows: Vec<Vec<Value>>) {
    self.tables.borrow_mut().insert(name.into(), MemoryTable { meta, rows });
  }

  /// 表的当前内容
  pub fn rows(&self, table: &str) -> Option<Vec<Vec<Value>>> {
    self.tables.borrow().get(table).map(|t| t.rows.clone())
  }

  /// 绕过连接直接修改表（模拟其他写者）
  pub fn modify<R>(&self, table: &str, f: impl FnOnce(&mut Vec<Vec<Value>>) -> R) -> Option<R> {
    self.tables.borrow_mut().get_mut(table).map(|t| f(&mut t.rows))
  }

  pub fn connect(&self) -> MemoryConnection {
    MemoryConnection {
      store: self.clone(),
      auto_commit: true,
      staged: None,
      faults: Vec::new(),
      commits: 0,
      rollbacks: 0,
    }
  }
}

/// 可注入的故障
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
  Execute,
  Fetch,
  Write,
  Commit,
  Rollback,
}

/// 内存存储上的连接
#[derive(Debug)]
pub struct MemoryConnection {
  store: MemoryStore,
  auto_commit: bool,
  /// 事务开始时的快照
  staged: Option<Tables>,
  faults: Vec<Fault>,
  commits: usize,
  rollbacks: usize,
}

impl MemoryConnection {
  pub fn store(&self) -> &MemoryStore {
    &self.store
  }

  pub fn inject(&mut self, fault: Fault) {
    if !self.faults.contains(&fault) {
      self.faults.push(fault);
    }
  }

  pub fn clear_faults(&mut self) {
    self.faults.clear();
  }

  pub fn commits(&self) -> usize {
    self.commits
  }

  pub fn rollbacks(&self) -> usize {
    self.rollbacks
  }

  fn check(&self, fault: Fault) -> Result<()> {
    if self.faults.contains(&fault) {
      return Err(RowSetError::Connection(format!("injected {fault:?} failure")));
    }
    Ok(())
  }

  fn begin_write(&mut self) -> Result<()> {
    self.check(Fault::Write)?;
    if !self.auto_commit && self.staged.is_none() {
      self.staged = Some(self.store.tables.borrow().clone());
    }
    Ok(())
  }

  fn with_table<R>(&self, table: &str, f: impl FnOnce(&mut MemoryTable) -> Result<R>) -> Result<R> {
    let mut tables = self.store.tables.borrow_mut();
    let t = tables
      .get_mut(table)
      .ok_or_else(|| RowSetError::Connection(format!("table '{table}' does not exist")))?;
    f(t)
  }
}

fn position(rows: &[Vec<Value>], key: &RowKey) -> Option<usize> {
  rows.iter().position(|row| {
    key
      .iter()
      .all(|(c, v)| row.get(c.wrapping_sub(1)).is_some_and(|cell| cells_match(cell, v)))
  })
}

impl Connection for MemoryConnection {
  fn execute(&mut self, command: &str, params: &[Value]) -> Result<Box<dyn RowSource>> {
    self.check(Fault::Execute)?;
    let table = command.trim();
    trace!(table, params = params.len(), "execute");
    self.with_table(table, |t| Ok(Box::new(VecSource::new(t.meta.clone(), t.rows.clone())) as Box<dyn RowSource>))
  }

  fn fetch_row(&mut self, table: &str, key: &RowKey) -> Result<Option<Vec<Value>>> {
    self.check(Fault::Fetch)?;
    self.with_table(table, |t| Ok(position(&t.rows, key).map(|i| t.rows[i].clone())))
  }

  fn insert_row(&mut self, table: &str, values: &[Value]) -> Result<()> {
    self.begin_write()?;
    self.with_table(table, |t| {
      if values.len() != t.meta.column_count() {
        return Err(RowSetError::Connection(format!(
          "table '{table}' has {} columns, got {}",
          t.meta.column_count(),
          values.len()
        )));
      }
      t.rows.push(values.to_vec());
      Ok(())
    })
  }

  fn update_row(&mut self, table: &str, key: &RowKey, values: &[Value]) -> Result<()> {
    self.begin_write()?;
    self.with_table(table, |t| {
      let i = position(&t.rows, key).ok_or_else(|| RowSetError::Connection(format!("no row in '{table}' matches key")))?;
      t.rows[i] = values.to_vec();
      Ok(())
    })
  }

  fn delete_row(&mut self, table: &str, key: &RowKey) -> Result<()> {
    self.begin_write()?;
    self.with_table(table, |t| {
      let i = position(&t.rows, key).ok_or_else(|| RowSetError::Connection(format!("no row in '{table}' matches key")))?;
      t.rows.remove(i);
      Ok(())
    })
  }

  fn commit(&mut self) -> Result<()> {
    self.check(Fault::Commit)?;
    self.staged = None;
    self.commits += 1;
    Ok(())
  }

  fn rollback(&mut self) -> Result<()> {
    self.check(Fault::Rollback)?;
    if let Some(tables) = self.staged.take() {
      *self.store.tables.borrow_mut() = tables;
    }
    self.rollbacks += 1;
    Ok(())
  }

  fn auto_commit(&self) -> bool {
    self.auto_commit
  }

  fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
    if auto_commit && !self.auto_commit {
      // 切回自动提交时提交未决事务
      self.staged = None;
    }
    self.auto_commit = auto_commit;
    Ok(())
  }
}
