//! 行写回
//!
//! `RowWriter` 把行集中的脏行写回活动连接，并报告每行的冲突。
//! 默认实现 `OptimisticWriter` 使用乐观并发：先按原始值重新读取活动行，
//! 活动行与原始值一致时才写入。

use std::cell::RefCell;
use std::rc::Rc;

use rowset_domain::{Row, RowId, RowSetMetaData, RowState, Value};
use tracing::{debug, warn};

use crate::error::{Result, RowSetError};
use crate::resolver::{Conflict, ConflictStatus, SyncResolver};
use crate::source::{rows_match, Connection};

/// 一次写回的输入
///
/// - `rows`：行集的全部行（包括已删除行），物理顺序
/// - `originals`：影子原始行，按 `RowId` 与 `rows` 对应
/// - `key_columns`：定位活动行的列（从 1 开始）；为空时使用全部列
pub struct WriteContext<'a> {
  pub rows: &'a [Row],
  pub originals: &'a [Row],
  pub meta: &'a RowSetMetaData,
  pub table_name: &'a str,
  pub key_columns: &'a [usize],
  pub connection: &'a mut dyn Connection,
}

impl WriteContext<'_> {
  /// 行的影子原始行；插入后尚未同步的行没有原始行
  pub fn original_of(&self, id: RowId) -> Option<&Row> {
    self.originals.iter().find(|r| r.id() == id)
  }

  /// 按键列取出 `(列索引, 值)`
  pub fn key_of(&self, values: &[Value]) -> Vec<(usize, Value)> {
    if self.key_columns.is_empty() {
      return values.iter().cloned().enumerate().map(|(i, v)| (i + 1, v)).collect();
    }
    self
      .key_columns
      .iter()
      .filter_map(|&c| values.get(c.wrapping_sub(1)).map(|v| (c, v.clone())))
      .collect()
  }
}

/// 写回协作者
///
/// 写回失败（返回 `Ok(false)` 或 `Err`）时，写回器负责在返回前回滚连接，
/// 每次失败只回滚一次；调用方不再回滚。
pub trait RowWriter {
  /// 写回全部脏行；失败时返回 `Ok(false)`，失败原因通过 `take_failure` 取回
  fn write_rows(&mut self, ctx: WriteContext<'_>) -> Result<bool>;

  /// 取出上一次失败的原因
  fn take_failure(&mut self) -> Option<RowSetError>;
}

/// 行集持有的写回器引用
pub type SharedWriter = Rc<RefCell<dyn RowWriter>>;

/// 乐观并发写回器
#[derive(Debug, Default)]
pub struct OptimisticWriter {
  failure: Option<RowSetError>,
}

impl OptimisticWriter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn shared() -> SharedWriter {
    Rc::new(RefCell::new(Self::new()))
  }

  fn write_all(ctx: &mut WriteContext<'_>) -> Result<Vec<Conflict>> {
    let mut conflicts = Vec::new();
    let rows = ctx.rows;

    for (i, row) in rows.iter().enumerate() {
      let status = match row.state() {
        RowState::Unchanged => None,
        RowState::Deleted => Self::write_delete(ctx, row)?,
        RowState::Inserted => Self::write_insert(ctx, row)?,
        RowState::Updated => Self::write_update(ctx, row)?,
      };
      if let Some((status, live)) = status {
        debug!(row = i + 1, id = %row.id(), %status, "write-back conflict");
        let conflict_row = match live {
          Some(values) => Row::new(row.id(), values),
          None => row.clone(),
        };
        conflicts.push(Conflict { row: conflict_row, row_index: i + 1, status });
      }
    }

    Ok(conflicts)
  }

  fn write_delete(ctx: &mut WriteContext<'_>, row: &Row) -> Result<Option<(ConflictStatus, Option<Vec<Value>>)>> {
    let Some(original) = ctx.original_of(row.id()) else {
      // 插入后又删除，活动存储里没有这一行
      return Ok(None);
    };
    let key = ctx.key_of(original.original_values());
    let expected = original.original_values().to_vec();
    let table = ctx.table_name;
    match ctx.connection.fetch_row(table, &key)? {
      Some(live) if rows_match(&live, &expected) => {
        ctx.connection.delete_row(table, &key)?;
        Ok(None)
      }
      live => Ok(Some((ConflictStatus::DeleteRowConflict, live))),
    }
  }

  fn write_insert(ctx: &mut WriteContext<'_>, row: &Row) -> Result<Option<(ConflictStatus, Option<Vec<Value>>)>> {
    let key = ctx.key_of(row.values());
    let table = ctx.table_name;
    if let Some(live) = ctx.connection.fetch_row(table, &key)? {
      return Ok(Some((ConflictStatus::InsertRowConflict, Some(live))));
    }
    ctx.connection.insert_row(table, row.values())?;
    Ok(None)
  }

  fn write_update(ctx: &mut WriteContext<'_>, row: &Row) -> Result<Option<(ConflictStatus, Option<Vec<Value>>)>> {
    let Some(original) = ctx.original_of(row.id()) else {
      return Ok(Some((ConflictStatus::UpdateRowConflict, None)));
    };
    let key = ctx.key_of(original.original_values());
    let expected = original.original_values().to_vec();
    let table = ctx.table_name;
    match ctx.connection.fetch_row(table, &key)? {
      Some(live) if rows_match(&live, &expected) => {
        ctx.connection.update_row(table, &key, row.values())?;
        Ok(None)
      }
      live => Ok(Some((ConflictStatus::UpdateRowConflict, live))),
    }
  }
}

impl RowWriter for OptimisticWriter {
  fn write_rows(&mut self, mut ctx: WriteContext<'_>) -> Result<bool> {
    self.failure = None;
    if ctx.table_name.is_empty() {
      self.failure = Some(RowSetError::sync("table name is not set"));
      return Ok(false);
    }

    let auto_commit = ctx.connection.auto_commit();
    if auto_commit {
      ctx.connection.set_auto_commit(false)?;
    }

    let outcome = Self::write_all(&mut ctx).and_then(|conflicts| {
      if conflicts.is_empty() {
        ctx.connection.commit()?;
        return Ok(true);
      }
      self.failure = Some(RowSetError::SyncProvider {
        message: format!("{} row(s) conflict with the live store", conflicts.len()),
        resolver: Some(SyncResolver::new(conflicts)),
        source: None,
      });
      Ok(false)
    });

    // 恢复自动提交之前回滚，否则部分写入会被提交
    if !matches!(outcome, Ok(true)) {
      if let Err(err) = ctx.connection.rollback() {
        warn!(error = %err, "rollback after failed write-back failed");
      }
    }

    if auto_commit {
      if let Err(err) = ctx.connection.set_auto_commit(true) {
        warn!(error = %err, "failed to restore auto-commit after write-back");
      }
    }
    outcome
  }

  fn take_failure(&mut self) -> Option<RowSetError> {
    self.failure.take()
  }
}
