//! 行集快照
//!
//! 行集的可序列化形式：元数据、选项以及每一行的生命周期、当前值、原始值与修改标记。
//! 活动句柄不能序列化，生成快照前必须已经物化。

use std::collections::HashSet;

use rowset_domain::{Handle, Row, RowId, RowSetMetaData, RowState, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RowSetError};
use crate::options::RowSetOptions;
use crate::rowset::CachedRowSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSnapshot {
  pub id: RowId,
  pub state: RowState,
  pub values: Vec<Value>,
  pub original: Vec<Value>,
  pub update_mask: Vec<bool>,
  /// 是否有影子原始行（插入后尚未同步的行没有）
  pub has_original: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSetSnapshot {
  pub meta: RowSetMetaData,
  pub options: RowSetOptions,
  pub rows: Vec<RowSnapshot>,
}

fn check_serial(values: &[Value], id: RowId) -> Result<()> {
  if values.iter().any(|v| matches!(v, Value::Handle(Handle::Live(_)))) {
    return Err(RowSetError::Conversion(format!("row {id} holds a live handle")));
  }
  Ok(())
}

impl CachedRowSet {
  /// 生成快照（包括已删除行，物理顺序）
  pub fn to_snapshot(&self) -> Result<RowSetSnapshot> {
    let store = self.rows();
    let known: HashSet<RowId> = store.original.iter().map(Row::id).collect();
    let rows = store
      .rows
      .iter()
      .map(|r| {
        check_serial(r.values(), r.id())?;
        check_serial(r.original_values(), r.id())?;
        Ok(RowSnapshot {
          id: r.id(),
          state: r.state(),
          values: r.values().to_vec(),
          original: r.original_values().to_vec(),
          update_mask: r.update_mask().to_vec(),
          has_original: known.contains(&r.id()),
        })
      })
      .collect::<Result<Vec<_>>>()?;
    Ok(RowSetSnapshot { meta: self.meta.clone(), options: self.options.clone(), rows })
  }

  /// 从快照重建行集
  ///
  /// 有影子的行的原始值重新成为影子原始行；其余行同步时作为新行写入。
  pub fn from_snapshot(snapshot: RowSetSnapshot) -> Result<CachedRowSet> {
    let mut set = CachedRowSet::with_options(snapshot.options)?;
    set.set_metadata(snapshot.meta)?;

    let width = set.column_count();
    let mut rows = Vec::with_capacity(snapshot.rows.len());
    let mut originals = Vec::new();
    for r in snapshot.rows {
      if r.values.len() != width {
        return Err(RowSetError::Conversion(format!(
          "snapshot row {} has {} values, expected {width}",
          r.id,
          r.values.len()
        )));
      }
      let has_original = r.has_original;
      let row = Row::from_parts(r.id, r.values, r.original, r.update_mask, r.state)?;
      if has_original {
        originals.push(Row::new(row.id(), row.original_values().to_vec()));
      }
      rows.push(row);
    }

    debug!(rows = rows.len(), originals = originals.len(), "row set restored from snapshot");
    set.rows_mut().install(rows);
    set.rows_mut().original = originals;
    Ok(set)
  }
}
