//! 行数据
//!
//! 定义行集中可编辑的一行：当前值、原始值（上次提交为原始值时的快照）、
//! 每列的修改标记以及生命周期标签。

use serde::{Deserialize, Serialize};

use crate::ids::RowId;
use crate::value::Value;
use crate::DomainError;

/// 行生命周期标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RowState {
  #[default]
  Unchanged,
  Inserted,
  Updated,
  Deleted,
}

/// 行实体
///
/// 不变量：
/// - `values.len() == original.len() == update_mask.len() == column_count`
/// - 列更新只修改 `values` 与 `update_mask`，不改变生命周期
///
/// 生命周期: 'static
/// 线程安全: !Send（值里可能有活动句柄）
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
  id: RowId,
  values: Vec<Value>,
  original: Vec<Value>,
  update_mask: Vec<bool>,
  state: RowState,
}

impl Row {
  /// 创建新行
  ///
  /// 原始值与当前值相同，没有列被修改。
  ///
  /// # Examples
  ///
  /// use rowset_domain::{Row, RowId, RowState, Value};
  ///
  /// let row = Row::new(RowId::new(1), vec![Value::Integer(1), Value::from("Alice")]);
  /// assert_eq!(row.column_count(), 2);
  /// assert_eq!(row.state(), RowState::Unchanged);
  pub fn new(id: RowId, values: Vec<Value>) -> Self {
    let n = values.len();
    Self { id, original: values.clone(), values, update_mask: vec![false; n], state: RowState::Unchanged }
  }

  /// 创建全 NULL 的行（插入行暂存区）
  pub fn empty(id: RowId, column_count: usize) -> Self {
    Self::new(id, vec![Value::Null; column_count])
  }

  /// 从各组成部分重建行（快照恢复时使用）
  pub fn from_parts(
    id: RowId,
    values: Vec<Value>,
    original: Vec<Value>,
    update_mask: Vec<bool>,
    state: RowState,
  ) -> Result<Self, DomainError> {
    if values.len() != original.len() || values.len() != update_mask.len() {
      return Err(DomainError::IllegalState {
        message: format!(
          "row {id}: values/original/mask lengths differ ({}/{}/{})",
          values.len(),
          original.len(),
          update_mask.len()
        ),
      });
    }
    Ok(Self { id, values, original, update_mask, state })
  }

  #[inline]
  pub fn id(&self) -> RowId {
    self.id
  }

  #[inline]
  pub fn column_count(&self) -> usize {
    self.values.len()
  }

  #[inline]
  pub fn state(&self) -> RowState {
    self.state
  }

  #[inline]
  pub fn is_deleted(&self) -> bool {
    self.state == RowState::Deleted
  }

  pub fn values(&self) -> &[Value] {
    &self.values
  }

  pub fn original_values(&self) -> &[Value] {
    &self.original
  }

  pub fn update_mask(&self) -> &[bool] {
    &self.update_mask
  }

  fn slot(&self, index: usize) -> Result<usize, DomainError> {
    if index == 0 || index > self.values.len() {
      return Err(DomainError::ColumnIndex { index, count: self.values.len() });
    }
    Ok(index - 1)
  }

  /// 获取列值（从 1 开始）
  ///
  /// # Examples
  ///
  /// use rowset_domain::{Row, RowId, Value};
  ///
  /// let row = Row::new(RowId::new(1), vec![Value::Integer(1)]);
  /// assert_eq!(row.get(1)?, &Value::Integer(1));
  /// assert!(row.get(2).is_err());
  pub fn get(&self, index: usize) -> Result<&Value, DomainError> {
    let slot = self.slot(index)?;
    Ok(&self.values[slot])
  }

  /// 获取列的原始值（从 1 开始）
  pub fn original(&self, index: usize) -> Result<&Value, DomainError> {
    let slot = self.slot(index)?;
    Ok(&self.original[slot])
  }

  /// 列自上次提交为原始值以来是否被修改过
  pub fn is_column_updated(&self, index: usize) -> Result<bool, DomainError> {
    let slot = self.slot(index)?;
    Ok(self.update_mask[slot])
  }

  /// 是否有任意一列被修改过
  pub fn any_updated(&self) -> bool {
    self.update_mask.iter().any(|m| *m)
  }

  /// 更新列值并置修改标记（不改变生命周期）
  pub fn update(&mut self, index: usize, value: Value) -> Result<(), DomainError> {
    let slot = self.slot(index)?;
    self.values[slot] = value;
    self.update_mask[slot] = true;
    Ok(())
  }

  /// 标记为已删除（不改变值）
  pub fn mark_deleted(&mut self) {
    self.state = RowState::Deleted;
  }

  /// 撤销删除，回到 `Unchanged`
  pub fn undo_delete(&mut self) -> Result<(), DomainError> {
    if self.state != RowState::Deleted {
      return Err(DomainError::IllegalState {
        message: format!("row {} is {:?}, not Deleted", self.id, self.state),
      });
    }
    self.state = RowState::Unchanged;
    Ok(())
  }

  pub fn mark_inserted(&mut self) {
    self.state = RowState::Inserted;
  }

  /// 标记为已更新
  ///
  /// 只有 `Unchanged -> Updated` 会真正迁移，返回 `true`；
  /// `Updated` 与 `Inserted` 保持不变（幂等），返回 `false`；
  /// `Deleted` 行不能更新。
  pub fn mark_updated(&mut self) -> Result<bool, DomainError> {
    match self.state {
      RowState::Unchanged => {
        self.state = RowState::Updated;
        Ok(true)
      }
      RowState::Updated | RowState::Inserted => Ok(false),
      RowState::Deleted => Err(DomainError::IllegalState {
        message: format!("row {} is Deleted and cannot be updated", self.id),
      }),
    }
  }

  /// 把当前值提交为原始值
  ///
  /// 清空修改标记，生命周期回到 `Unchanged`。幂等。
  pub fn commit_to_original(&mut self) {
    self.original.clone_from(&self.values);
    self.update_mask.iter_mut().for_each(|m| *m = false);
    self.state = RowState::Unchanged;
  }

  /// 把原始值恢复为当前值
  ///
  /// 清空修改标记；`Updated` 回到 `Unchanged`，`Deleted` 与 `Inserted` 保持不变
  /// （删除需要调用方单独处理）。
  pub fn revert_to_original(&mut self) {
    self.values.clone_from(&self.original);
    self.update_mask.iter_mut().for_each(|m| *m = false);
    if self.state == RowState::Updated {
      self.state = RowState::Unchanged;
    }
  }

  /// 取出当前值
  pub fn into_values(self) -> Vec<Value> {
    self.values
  }
}
