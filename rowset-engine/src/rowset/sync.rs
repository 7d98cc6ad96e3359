//! 同步（写回）
//!
//! `accept_changes` 把脏行交给写回器写入活动连接。成功后逆序遍历行序列：
//! 删除的行被移除，插入 / 更新的行提交为原始值，然后重建影子原始行。
//! 失败时由写回器回滚连接，游标与显示已删除行的设置都恢复为调用前的状态。

use rowset_domain::RowState;
use tracing::{info, warn};

use crate::error::{Result, RowSetError};
use crate::source::SharedConnection;
use crate::writer::WriteContext;

use super::CachedRowSet;

impl CachedRowSet {
  /// 用行集持有的连接同步
  pub fn accept_changes(&mut self) -> Result<()> {
    let connection = self
      .connection
      .clone()
      .ok_or_else(|| RowSetError::sync("no connection to synchronize with"))?;
    self.synchronize(&connection)
  }

  /// 用给定连接同步，并记住该连接
  pub fn accept_changes_with(&mut self, connection: SharedConnection) -> Result<()> {
    self.connection = Some(connection.clone());
    self.synchronize(&connection)
  }

  fn synchronize(&mut self, connection: &SharedConnection) -> Result<()> {
    if self.insert.is_some() {
      return Err(RowSetError::IllegalInsert("cannot accept changes while on the insert row".to_string()));
    }

    let saved_pos = self.pos;
    let saved_show_deleted = self.options.show_deleted;
    self.options.show_deleted = true;
    info!(table = %self.options.table_name, rows = self.physical_len(), "synchronizing row set");

    let outcome = self.write_back(connection);
    self.options.show_deleted = saved_show_deleted;

    // 写回器已经回滚
    if let Err(err) = outcome {
      self.pos = saved_pos;
      warn!(error = %err, "synchronization failed");
      return Err(err);
    }

    let removed_before = self.reconcile(saved_pos);
    self.pos = (saved_pos - removed_before).min(self.physical_len() + 1);
    info!(rows = self.physical_len(), "synchronization complete");
    self.notify_row_set_changed();
    Ok(())
  }

  fn write_back(&self, connection: &SharedConnection) -> Result<()> {
    let store = self.rows();
    let mut writer = self.writer.borrow_mut();
    let mut connection = connection.borrow_mut();
    let ctx = WriteContext {
      rows: &store.rows,
      originals: &store.original,
      meta: &self.meta,
      table_name: &self.options.table_name,
      key_columns: &self.options.key_columns,
      connection: &mut *connection,
    };
    match writer.write_rows(ctx) {
      Ok(true) => Ok(()),
      Ok(false) => Err(
        writer
          .take_failure()
          .unwrap_or_else(|| RowSetError::sync("row writer reported a failure"))
          .into_sync(),
      ),
      Err(err) => Err(err.into_sync()),
    }
  }

  /// 提交写回结果；返回被移除的、位于 `saved_pos` 之前的行数
  fn reconcile(&mut self, saved_pos: usize) -> usize {
    let mut guard = self.rows_mut();
    let store = &mut *guard;
    let mut removed_before = 0;

    for i in (0..store.rows.len()).rev() {
      match store.rows[i].state() {
        RowState::Deleted => {
          store.rows.remove(i);
          if i + 1 < saved_pos {
            removed_before += 1;
          }
        }
        RowState::Inserted | RowState::Updated => store.rows[i].commit_to_original(),
        RowState::Unchanged => {}
      }
    }

    store.original = store.rows.clone();
    store.deleted = 0;
    removed_before
  }
}
