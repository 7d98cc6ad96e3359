//! 分页
//!
//! 页书签指向活动数据（命令结果或物化的侧缓存）中的位置，而不是缓存的行。
//! 翻页重新执行命令（或重新扫描侧缓存）取出新窗口，整体替换内存中的行。

use std::rc::Rc;

use rowset_domain::{RowSetMetaData, RowState, Value};
use tracing::{debug, warn};

use crate::error::{Result, RowSetError};
use crate::reader::RowReader;
use crate::source::{CacheSource, RowSource};

use super::CachedRowSet;

/// 翻页时重新读取的数据来源
#[derive(Debug, Clone)]
pub(crate) enum PageSource {
  /// 通过行集持有的连接重新执行命令
  Command,
  /// 填充时物化的侧缓存
  Cache { meta: RowSetMetaData, rows: Rc<Vec<Vec<Value>>> },
}

/// 分页书签
///
/// - `origin`：第一页在活动数据中的起始下标（从 0 开始）
/// - `start`：当前页的起始下标
/// - `len`：当前页读到的行数
#[derive(Debug, Clone)]
pub(crate) struct PageState {
  pub(crate) origin: usize,
  pub(crate) start: usize,
  pub(crate) len: usize,
  pub(crate) source: PageSource,
}

impl CachedRowSet {
  pub fn page_size(&self) -> usize {
    self.options.page_size
  }

  /// 设置页大小；不能超过非 0 的 `max_rows`
  ///
  /// 新的页大小在下一次填充时生效。
  pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
    if self.options.max_rows != 0 && page_size > self.options.max_rows {
      return Err(RowSetError::InvalidArgument(format!(
        "page size {page_size} cannot be greater than max rows {}",
        self.options.max_rows
      )));
    }
    self.options.page_size = page_size;
    Ok(())
  }

  pub fn is_paging(&self) -> bool {
    self.page.is_some()
  }

  /// 下一页；新窗口为空时返回 `false`，行集保持不变
  pub fn next_page(&mut self) -> Result<bool> {
    let page = self.page.as_ref().ok_or(RowSetError::PagingNotInitialized)?;
    let start = page.start + page.len;
    self.load_page(start)
  }

  /// 上一页；已经在第一页时返回 `false`
  pub fn previous_page(&mut self) -> Result<bool> {
    let page = self.page.as_ref().ok_or(RowSetError::PagingNotInitialized)?;
    if page.start <= page.origin {
      return Ok(false);
    }
    let start = page.start.saturating_sub(self.options.page_size).max(page.origin);
    self.load_page(start)
  }

  fn load_page(&mut self, start: usize) -> Result<bool> {
    let page = self.page.as_ref().ok_or(RowSetError::PagingNotInitialized)?;
    let page_size = self.options.page_size;
    if page_size == 0 {
      return Err(RowSetError::PagingNotInitialized);
    }

    // max_rows 相对第一页起点计数
    let mut max_rows = 0;
    if self.options.max_rows != 0 {
      let consumed = start - page.origin;
      if consumed >= self.options.max_rows {
        debug!(start, max_rows = self.options.max_rows, "page window beyond max rows");
        return Ok(false);
      }
      max_rows = self.options.max_rows - consumed;
    }

    let reader = RowReader { skip: start, max_rows, page_size };
    let first_id = self.rows().next_id;
    let (rows, _) = match &page.source {
      PageSource::Cache { meta, rows } => {
        let mut scan = CacheSource::new(meta.clone(), Rc::clone(rows));
        reader.read(&mut scan, first_id)?
      }
      PageSource::Command => {
        let connection = self.connection.clone().ok_or_else(|| {
          RowSetError::IllegalState("paging by command requires a connection".to_string())
        })?;
        let mut source: Box<dyn RowSource> =
          connection.borrow_mut().execute(&self.options.command, &self.params)?;
        reader.read(source.as_mut(), first_id)?
      }
    };

    if rows.is_empty() {
      debug!(start, "empty page window");
      return Ok(false);
    }

    let pending = self.rows().rows.iter().any(|r| r.state() != RowState::Unchanged || r.any_updated());
    if pending {
      warn!(start, "page replaced with pending changes; they are discarded");
    }

    debug!(start, rows = rows.len(), "page loaded");
    let len = rows.len();
    if let Some(page) = self.page.as_mut() {
      page.start = start;
      page.len = len;
    }
    self.replace_rows(rows);
    Ok(true)
  }
}
