//! 同步冲突解析器
//!
//! 回写时检测到的冲突行集合，带有独立于主行集的游标。
//! 游标 -1 表示第一个冲突之前，`conflicts.len()` 表示最后一个冲突之后。

use std::fmt;

use rowset_domain::{Row, Value};

use crate::error::{Result, RowSetError};

/// 冲突种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictStatus {
  /// 要更新的活动行不存在或已被其他写者修改
  UpdateRowConflict,
  /// 要删除的活动行不存在或已被其他写者修改
  DeleteRowConflict,
  /// 相同键的活动行已存在
  InsertRowConflict,
  NoRowConflict,
}

impl fmt::Display for ConflictStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ConflictStatus::UpdateRowConflict => "update row conflict",
      ConflictStatus::DeleteRowConflict => "delete row conflict",
      ConflictStatus::InsertRowConflict => "insert row conflict",
      ConflictStatus::NoRowConflict => "no row conflict",
    };
    f.write_str(s)
  }
}

/// 一条冲突
///
/// - `row`：活动存储中的当前值（活动行已不存在时为行集里的值）
/// - `row_index`：行在主行集中的物理位置（从 1 开始，包含已删除行）
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
  pub row: Row,
  pub row_index: usize,
  pub status: ConflictStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncResolver {
  conflicts: Vec<Conflict>,
  cursor: isize,
}

impl SyncResolver {
  pub fn new(conflicts: Vec<Conflict>) -> Self {
    Self { conflicts, cursor: -1 }
  }

  pub fn len(&self) -> usize {
    self.conflicts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.conflicts.is_empty()
  }

  pub fn conflicts(&self) -> &[Conflict] {
    &self.conflicts
  }

  /// 移到下一个冲突；越过最后一个时返回 `false`
  pub fn next_conflict(&mut self) -> bool {
    let end = self.conflicts.len() as isize;
    if self.cursor < end {
      self.cursor += 1;
    }
    self.cursor < end
  }

  /// 移到上一个冲突；越过第一个时返回 `false`
  pub fn previous_conflict(&mut self) -> bool {
    if self.cursor >= 0 {
      self.cursor -= 1;
    }
    self.cursor >= 0
  }

  fn current(&self) -> Option<&Conflict> {
    usize::try_from(self.cursor).ok().and_then(|i| self.conflicts.get(i))
  }

  /// 当前冲突第 `index` 列（从 1 开始）的值
  pub fn conflict_value(&self, index: usize) -> Result<&Value> {
    let conflict = self.current().ok_or(RowSetError::CursorState("not on a conflict"))?;
    Ok(conflict.row.get(index)?)
  }

  /// 当前冲突的种类
  ///
  /// 游标无效时返回 `RowSetError::Internal`，而不是 `CursorState`。
  pub fn status(&self) -> Result<ConflictStatus> {
    self
      .current()
      .map(|c| c.status)
      .ok_or_else(|| RowSetError::Internal(format!("resolver cursor {} is not on a conflict", self.cursor)))
  }

  /// 当前冲突在主行集中的物理行号
  pub fn row_index(&self) -> Result<usize> {
    self.current().map(|c| c.row_index).ok_or(RowSetError::CursorState("not on a conflict"))
  }

  pub fn set_resolved_value(&mut self, _index: usize, _value: Value) -> Result<()> {
    Err(RowSetError::NotImplemented("SyncResolver::set_resolved_value"))
  }
}
