//! 行编辑
//!
//! 读取 / 更新列值、插入行协议、删除与撤销。

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rowset_domain::{coerce, Decimal, FromValue, Nullability, Row, RowId, RowState, Value};
use tracing::{debug, trace};

use crate::error::{Result, RowSetError};

use super::{CachedRowSet, InsertSlot};

impl CachedRowSet {
  // ---- 读取 ----

  /// 当前行（或插入行）上第 `index` 列的值
  pub fn get_value(&self, index: usize) -> Result<Value> {
    self.meta.check_index(index)?;
    if let Some(slot) = &self.insert {
      return Ok(slot.staging.get(index)?.clone());
    }
    let i = self.current_index()?;
    Ok(self.rows().rows[i].get(index)?.clone())
  }

  pub fn get_value_by_name(&self, name: &str) -> Result<Value> {
    self.get_value(self.find_column(name)?)
  }

  /// 读取并转换为 `T`；SQL NULL 读取为 `None`
  pub fn get<T: FromValue>(&self, index: usize) -> Result<Option<T>> {
    let value = self.get_value(index)?;
    Ok(T::from_value(&value, index)?)
  }

  pub fn get_by_name<T: FromValue>(&self, name: &str) -> Result<Option<T>> {
    self.get(self.find_column(name)?)
  }

  pub fn get_boolean(&self, index: usize) -> Result<Option<bool>> {
    self.get(index)
  }

  pub fn get_byte(&self, index: usize) -> Result<Option<i8>> {
    self.get(index)
  }

  pub fn get_short(&self, index: usize) -> Result<Option<i16>> {
    self.get(index)
  }

  pub fn get_int(&self, index: usize) -> Result<Option<i32>> {
    self.get(index)
  }

  pub fn get_long(&self, index: usize) -> Result<Option<i64>> {
    self.get(index)
  }

  pub fn get_float(&self, index: usize) -> Result<Option<f32>> {
    self.get(index)
  }

  pub fn get_double(&self, index: usize) -> Result<Option<f64>> {
    self.get(index)
  }

  pub fn get_decimal(&self, index: usize) -> Result<Option<Decimal>> {
    self.get(index)
  }

  pub fn get_string(&self, index: usize) -> Result<Option<String>> {
    self.get(index)
  }

  pub fn get_bytes(&self, index: usize) -> Result<Option<Vec<u8>>> {
    self.get(index)
  }

  pub fn get_date(&self, index: usize) -> Result<Option<NaiveDate>> {
    self.get(index)
  }

  pub fn get_time(&self, index: usize) -> Result<Option<NaiveTime>> {
    self.get(index)
  }

  pub fn get_timestamp(&self, index: usize) -> Result<Option<NaiveDateTime>> {
    self.get(index)
  }

  // ---- 更新 ----

  /// 更新当前行（或插入行）第 `index` 列
  ///
  /// 值先按列的声明类型转换；只修改值与修改标记，不改变生命周期。
  pub fn update_value(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
    self.check_updatable("update")?;
    self.meta.check_index(index)?;
    let declared = self.meta.column_type(index)?;
    let value = coerce(value.into(), declared, index)?;

    if let Some(slot) = &mut self.insert {
      slot.staging.update(index, value)?;
      return Ok(());
    }

    let i = self.current_index()?;
    let mut store = self.rows_mut();
    let row = &mut store.rows[i];
    if row.is_deleted() {
      return Err(RowSetError::IllegalState(format!("row {} is deleted", row.id())));
    }
    row.update(index, value)?;
    Ok(())
  }

  pub fn update_by_name(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
    let index = self.find_column(name)?;
    self.update_value(index, value)
  }

  pub fn update_null(&mut self, index: usize) -> Result<()> {
    self.update_value(index, Value::Null)
  }

  pub fn update_boolean(&mut self, index: usize, value: bool) -> Result<()> {
    self.update_value(index, value)
  }

  pub fn update_byte(&mut self, index: usize, value: i8) -> Result<()> {
    self.update_value(index, value)
  }

  pub fn update_short(&mut self, index: usize, value: i16) -> Result<()> {
    self.update_value(index, value)
  }

  pub fn update_int(&mut self, index: usize, value: i32) -> Result<()> {
    self.update_value(index, value)
  }

  pub fn update_long(&mut self, index: usize, value: i64) -> Result<()> {
    self.update_value(index, value)
  }

  pub fn update_float(&mut self, index: usize, value: f32) -> Result<()> {
    self.update_value(index, value)
  }

  pub fn update_double(&mut self, index: usize, value: f64) -> Result<()> {
    self.update_value(index, value)
  }

  pub fn update_decimal(&mut self, index: usize, value: Decimal) -> Result<()> {
    self.update_value(index, value)
  }

  pub fn update_string(&mut self, index: usize, value: impl Into<String>) -> Result<()> {
    self.update_value(index, Value::Text(value.into()))
  }

  pub fn update_bytes(&mut self, index: usize, value: impl Into<Vec<u8>>) -> Result<()> {
    self.update_value(index, Value::Bytes(value.into()))
  }

  pub fn update_date(&mut self, index: usize, value: NaiveDate) -> Result<()> {
    self.update_value(index, value)
  }

  pub fn update_time(&mut self, index: usize, value: NaiveTime) -> Result<()> {
    self.update_value(index, value)
  }

  pub fn update_timestamp(&mut self, index: usize, value: NaiveDateTime) -> Result<()> {
    self.update_value(index, value)
  }

  // ---- 插入行协议 ----

  /// 进入插入行：记住当前位置，创建全 NULL 的暂存行
  pub fn move_to_insert_row(&mut self) -> Result<()> {
    self.check_updatable("move_to_insert_row")?;
    if self.meta.column_count() == 0 {
      return Err(RowSetError::IllegalInsert("row set has no metadata".to_string()));
    }
    let saved_pos = self.insert.as_ref().map_or(self.pos, |s| s.saved_pos);
    let staging = Row::empty(self.rows_mut().allocate_id(), self.meta.column_count());
    self.insert = Some(InsertSlot { saved_pos, staging });
    Ok(())
  }

  /// 离开插入行，回到进入前的位置；不在插入行上时什么都不做
  pub fn move_to_current_row(&mut self) {
    let Some(slot) = self.insert.take() else {
      return;
    };
    self.pos = slot.saved_pos.min(self.physical_len() + 1);
    self.notify_cursor_moved();
  }

  /// 提交插入行
  ///
  /// 至少更新过一列，且所有 NOT NULL 列都已赋值。新行标记为 `Inserted`，放在进入插入行时
  /// 的当前行之后（位置越界则追加）。之后仍在插入行上，暂存行重新置空。
  pub fn insert_row(&mut self) -> Result<()> {
    let count = self.meta.column_count();
    let slot = self
      .insert
      .as_mut()
      .ok_or_else(|| RowSetError::IllegalInsert("not on the insert row".to_string()))?;
    if !slot.staging.any_updated() {
      return Err(RowSetError::IllegalInsert("no column of the insert row has been set".to_string()));
    }
    for (i, column) in self.meta.columns().iter().enumerate() {
      if column.nullable == Nullability::NoNulls && !slot.staging.update_mask()[i] {
        return Err(RowSetError::IllegalInsert(format!("column '{}' has not been set", column.name)));
      }
      column.validate_value(&slot.staging.values()[i])?;
    }

    let mut store = self.store.borrow_mut();
    let fresh = Row::empty(store.allocate_id(), count);
    let mut row = std::mem::replace(&mut slot.staging, fresh);
    row.mark_inserted();

    let len = store.rows.len();
    let at = slot.saved_pos.min(len);
    if slot.saved_pos > len {
      slot.saved_pos += 1;
    }
    debug!(id = %row.id(), at, "row inserted");
    store.rows.insert(at, row);
    drop(store);

    self.notify_row_changed();
    Ok(())
  }

  // ---- 删除与撤销 ----

  /// 把当前行标记为已删除；已删除的行保持不变
  pub fn delete_row(&mut self) -> Result<()> {
    self.check_updatable("delete_row")?;
    let i = self.current_index()?;
    {
      let mut store = self.rows_mut();
      if store.rows[i].is_deleted() {
        return Ok(());
      }
      store.rows[i].mark_deleted();
      store.deleted += 1;
      trace!(row = i + 1, deleted = store.deleted, "row deleted");
    }
    self.notify_row_changed();
    Ok(())
  }

  /// 撤销当前行的删除
  pub fn undo_delete(&mut self) -> Result<()> {
    let i = self.current_index()?;
    {
      let mut store = self.rows_mut();
      store.rows[i].undo_delete()?;
      store.deleted -= 1;
    }
    self.notify_row_changed();
    Ok(())
  }

  /// 撤销当前行的插入：从行序列中移除
  ///
  /// 游标停在原位，即下一可见行（或最后一行之后）。
  pub fn undo_insert(&mut self) -> Result<()> {
    let i = self.current_index()?;
    {
      let mut store = self.rows_mut();
      let state = store.rows[i].state();
      if state != RowState::Inserted {
        return Err(RowSetError::IllegalState(format!("current row is {state:?}, not Inserted")));
      }
      store.rows.remove(i);
    }
    // 原位可能是隐藏的已删除行
    if !self.visible_at(self.pos) {
      self.step_forward();
    }
    self.notify_row_changed();
    Ok(())
  }

  /// 撤销当前行的更新：恢复原始值
  pub fn undo_update(&mut self) -> Result<()> {
    let i = self.current_index()?;
    {
      let mut store = self.rows_mut();
      let row = &mut store.rows[i];
      if row.state() != RowState::Updated {
        return Err(RowSetError::IllegalState(format!("current row is {:?}, not Updated", row.state())));
      }
      row.revert_to_original();
    }
    self.notify_row_changed();
    Ok(())
  }

  /// 把当前行标记为已更新（幂等）
  pub fn update_row(&mut self) -> Result<()> {
    self.check_updatable("update_row")?;
    let i = self.current_index()?;
    self.rows_mut().rows[i].mark_updated()?;
    self.notify_row_changed();
    Ok(())
  }

  /// 放弃当前行的修改
  ///
  /// 行为 `Updated`，或未标记更新但有列被修改时，恢复原始值；插入行不受影响。
  pub fn cancel_row_updates(&mut self) -> Result<()> {
    let i = self.current_index()?;
    let reverted = {
      let mut store = self.rows_mut();
      let row = &mut store.rows[i];
      let dirty = match row.state() {
        RowState::Updated => true,
        RowState::Unchanged => row.any_updated(),
        RowState::Inserted | RowState::Deleted => false,
      };
      if dirty {
        row.revert_to_original();
      }
      dirty
    };
    if reverted {
      self.notify_row_changed();
    }
    Ok(())
  }

  /// 放弃全部未同步的修改
  ///
  /// 没有影子原始行的行（插入后尚未同步）被移除，删除的行恢复，更新的行恢复原始值；
  /// 游标回到第一行之前。
  pub fn restore_original(&mut self) -> Result<()> {
    {
      let mut guard = self.rows_mut();
      let store = &mut *guard;
      let known: HashSet<RowId> = store.original.iter().map(Row::id).collect();
      store.rows.retain(|r| known.contains(&r.id()));
      for row in &mut store.rows {
        if row.is_deleted() {
          row.undo_delete()?;
        }
        row.revert_to_original();
      }
      store.deleted = 0;
    }
    self.insert = None;
    self.pos = 0;
    self.notify_row_set_changed();
    Ok(())
  }

  // ---- 行检查 ----

  fn current_row<R>(&self, f: impl FnOnce(&Row) -> R) -> Result<R> {
    if let Some(slot) = &self.insert {
      return Ok(f(&slot.staging));
    }
    let i = self.current_index()?;
    Ok(f(&self.rows().rows[i]))
  }

  pub fn row_updated(&self) -> Result<bool> {
    self.current_row(|r| r.state() == RowState::Updated)
  }

  pub fn row_inserted(&self) -> Result<bool> {
    self.current_row(|r| r.state() == RowState::Inserted)
  }

  pub fn row_deleted(&self) -> Result<bool> {
    self.current_row(Row::is_deleted)
  }

  /// 当前行第 `index` 列自上次提交以来是否被修改过
  pub fn column_updated(&self, index: usize) -> Result<bool> {
    self.meta.check_index(index)?;
    self.current_row(|r| r.is_column_updated(index))?.map_err(RowSetError::from)
  }

  /// 当前行的原始值
  pub fn original_row(&self) -> Result<Vec<Value>> {
    self.current_row(|r| r.original_values().to_vec())
  }
}
