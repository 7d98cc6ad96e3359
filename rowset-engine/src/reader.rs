//! 行读取器
//!
//! 从 `RowSource` 拉取行，转换为行集中的 `Row`。读取时把每个单元格的
//! 活动句柄物化为可序列化的替身，使行集与数据源断开。

use rowset_domain::{detach, Row, RowId, Value};
use tracing::{debug, trace};

use crate::error::{Result, RowSetError};
use crate::rowset::CachedRowSet;
use crate::source::RowSource;

/// 读取截断规则
///
/// - `skip`：先丢弃的行数（`populate_from(source, start_row)` 与翻页使用）
/// - `max_rows`：最多读取的行数（0 表示不限）
/// - `page_size`：每页行数（0 表示不分页），与 `max_rows` 独立生效
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowReader {
  pub skip: usize,
  pub max_rows: usize,
  pub page_size: usize,
}

impl RowReader {
  pub fn new(max_rows: usize, page_size: usize) -> Self {
    Self { skip: 0, max_rows, page_size }
  }

  pub fn skip(mut self, skip: usize) -> Self {
    self.skip = skip;
    self
  }

  /// 有效的读取上限；`None` 表示读到数据耗尽
  pub fn limit(&self) -> Option<usize> {
    match (self.max_rows, self.page_size) {
      (0, 0) => None,
      (0, p) => Some(p),
      (m, 0) => Some(m),
      (m, p) => Some(m.min(p)),
    }
  }

  /// 读取行，行号从 `first_id` 开始连续分配
  ///
  /// 返回读到的行以及下一个可用的行号。
  pub fn read(&self, source: &mut dyn RowSource, first_id: RowId) -> Result<(Vec<Row>, RowId)> {
    let width = source.metadata().column_count();
    let limit = self.limit();

    for _ in 0..self.skip {
      if source.next_row()?.is_none() {
        debug!(skip = self.skip, "source exhausted while skipping");
        return Ok((Vec::new(), first_id));
      }
    }

    let mut rows = Vec::new();
    let mut id = first_id;
    while limit.map_or(true, |l| rows.len() < l) {
      let Some(values) = source.next_row()? else {
        break;
      };
      rows.push(Row::new(id, detach_row(values, width, rows.len() + self.skip + 1)?));
      id = id.next();
    }

    trace!(read = rows.len(), skip = self.skip, ?limit, "rows read from source");
    Ok((rows, id))
  }

  /// 读取行并整体替换 `set` 中的行（元数据取自数据源）
  pub fn read_into(&self, set: &mut CachedRowSet, source: &mut dyn RowSource) -> Result<()> {
    let meta = source.metadata().clone();
    let (rows, _) = self.read(source, RowId::new(1))?;
    set.set_rows(meta, rows)
  }
}

fn detach_row(values: Vec<Value>, width: usize, position: usize) -> Result<Vec<Value>> {
  if values.len() != width {
    return Err(RowSetError::Conversion(format!(
      "source row {position} has {} values, expected {width}",
      values.len()
    )));
  }
  values
    .into_iter()
    .map(|v| detach(v).map_err(RowSetError::from))
    .collect()
}
