//! 复制
//!
//! - `create_copy`：深复制行、影子原始行、参数、元数据与选项，保留游标；写回器与连接共享引用
//! - `create_copy_schema`：只复制结构，没有行
//! - `create_copy_no_constraints`：深复制，键列与匹配列恢复默认
//! - `create_shared`：浅复制，与原行集共享同一份行序列，游标独立

use std::cell::RefCell;
use std::rc::Rc;

use rowset_domain::Row;

use crate::options::Concurrency;

use super::{CachedRowSet, RowStore};

impl CachedRowSet {
  fn copy_with_store(&self, store: Rc<RefCell<RowStore>>) -> CachedRowSet {
    CachedRowSet {
      store,
      meta: self.meta.clone(),
      options: self.options.clone(),
      pos: self.pos,
      insert: None,
      params: self.params.clone(),
      page: self.page.clone(),
      connection: self.connection.clone(),
      writer: Rc::clone(&self.writer),
      listeners: Vec::new(),
    }
  }

  /// 深复制（不复制监听器）
  pub fn create_copy(&self) -> CachedRowSet {
    let store = self.rows().clone();
    self.copy_with_store(Rc::new(RefCell::new(store)))
  }

  /// 只复制结构
  pub fn create_copy_schema(&self) -> CachedRowSet {
    let next_id = self.rows().next_id;
    let mut copy = self.copy_with_store(Rc::new(RefCell::new(RowStore { next_id, ..RowStore::default() })));
    copy.pos = 0;
    copy.page = None;
    copy
  }

  /// 深复制，去掉键列与匹配列约束
  pub fn create_copy_no_constraints(&self) -> CachedRowSet {
    let mut copy = self.create_copy();
    copy.options.key_columns.clear();
    copy.options.match_columns.clear();
    copy
  }

  /// 浅复制
  ///
  /// 两个视图共享行序列：在一个视图里修改行，另一个视图立即可见。监听器也一并共享。
  pub fn create_shared(&self) -> CachedRowSet {
    let mut shared = self.copy_with_store(Rc::clone(&self.store));
    shared.listeners = self.listeners.clone();
    shared
  }

  /// 影子原始行组成的只读行集
  pub fn original(&self) -> CachedRowSet {
    let originals: Vec<Row> = self
      .rows()
      .original
      .iter()
      .map(|r| Row::new(r.id(), r.original_values().to_vec()))
      .collect();
    let mut copy = self.copy_with_store(Rc::new(RefCell::new(RowStore::default())));
    copy.rows_mut().install(originals);
    copy.pos = 0;
    copy.page = None;
    copy.connection = None;
    copy.options.concurrency = Concurrency::ReadOnly;
    copy
  }
}
