//! 游标导航
//!
//! 所有可见行导航在不显示已删除行时跳过 `Deleted` 行。逻辑行号（只数可见行，从 1
//! 开始）与物理位置之间的换算通过重新遍历行序列完成。
//!
//! `next` / `previous` 不检查只进类型；其他滚动操作在只进行集上返回 `CursorState`。

use tracing::trace;

use crate::error::{Result, RowSetError};
use crate::options::ScrollType;

use super::CachedRowSet;

impl CachedRowSet {
  fn check_scrollable(&self) -> Result<()> {
    if self.options.scroll == ScrollType::ForwardOnly {
      return Err(RowSetError::CursorState("operation requires a scrollable row set"));
    }
    Ok(())
  }

  fn check_not_inserting(&self) -> Result<()> {
    if self.insert.is_some() {
      return Err(RowSetError::CursorState("cursor is on the insert row"));
    }
    Ok(())
  }

  /// 物理位置 `pos` 上是否有一行可见的行
  pub(super) fn visible_at(&self, pos: usize) -> bool {
    pos > 0 && self.rows().rows.get(pos - 1).is_some_and(|r| self.is_visible(r))
  }

  /// 第 `logical` 个可见行（从 1 开始）的物理位置
  pub(crate) fn physical_of(&self, logical: usize) -> Option<usize> {
    if logical == 0 {
      return None;
    }
    let store = self.rows();
    let mut seen = 0;
    for (i, row) in store.rows.iter().enumerate() {
      if self.is_visible(row) {
        seen += 1;
        if seen == logical {
          return Some(i + 1);
        }
      }
    }
    None
  }

  /// 向前移动到下一可见行；越过最后一行时停在之后并返回 `false`
  pub(super) fn step_forward(&mut self) -> bool {
    let len = self.physical_len();
    loop {
      if self.pos >= len {
        self.pos = len + 1;
        return false;
      }
      self.pos += 1;
      if self.visible_at(self.pos) {
        return true;
      }
    }
  }

  /// 向后移动到上一可见行；越过第一行时停在之前并返回 `false`
  pub(super) fn step_backward(&mut self) -> bool {
    loop {
      if self.pos <= 1 {
        self.pos = 0;
        return false;
      }
      self.pos -= 1;
      if self.visible_at(self.pos) {
        return true;
      }
    }
  }

  /// 移动到第 `n` 个可见行
  ///
  /// 负数从末尾倒数（`-1` 是最后一行）。`n` 为 0 或者倒数越过第一行时停在第一行之前，
  /// 超过可见行数时停在最后一行之后，二者都返回 `false`。
  pub fn absolute(&mut self, n: isize) -> Result<bool> {
    self.check_not_inserting()?;
    self.check_scrollable()?;

    let size = self.size() as isize;
    let logical = if n < 0 { size + n + 1 } else { n };

    let found = if logical <= 0 {
      self.pos = 0;
      false
    } else if logical > size {
      self.pos = self.physical_len() + 1;
      false
    } else {
      match self.physical_of(logical as usize) {
        Some(pos) => {
          self.pos = pos;
          true
        }
        None => {
          self.pos = self.physical_len() + 1;
          false
        }
      }
    };
    trace!(n, pos = self.pos, found, "absolute");
    self.notify_cursor_moved();
    Ok(found)
  }

  /// 相对当前行移动 `n` 个可见行
  ///
  /// 必须在某一行上。物理位置加 `n` 越过末尾（或开头）时直接停在之后（或之前）。
  pub fn relative(&mut self, n: isize) -> Result<bool> {
    self.check_not_inserting()?;
    self.check_scrollable()?;
    let len = self.physical_len();
    if len == 0 || self.pos == 0 || self.pos > len {
      return Err(RowSetError::CursorState("relative requires a current row"));
    }
    if n == 0 {
      return Ok(true);
    }

    let pos = self.pos as isize;
    if n > 0 {
      if pos.checked_add(n).map_or(true, |target| target > len as isize) {
        self.pos = len + 1;
      } else {
        for _ in 0..n {
          if !self.step_forward() {
            break;
          }
        }
      }
    } else if pos.checked_add(n).map_or(true, |target| target < 0) {
      self.pos = 0;
    } else {
      for _ in n..0 {
        if !self.step_backward() {
          break;
        }
      }
    }

    let found = self.pos > 0 && self.pos <= len;
    self.notify_cursor_moved();
    Ok(found)
  }

  pub fn first(&mut self) -> Result<bool> {
    self.absolute(1)
  }

  pub fn last(&mut self) -> Result<bool> {
    self.absolute(-1)
  }

  /// 下一可见行
  pub fn next(&mut self) -> Result<bool> {
    self.check_not_inserting()?;
    let found = self.step_forward();
    self.notify_cursor_moved();
    Ok(found)
  }

  /// 上一可见行
  pub fn previous(&mut self) -> Result<bool> {
    self.check_not_inserting()?;
    let found = self.step_backward();
    self.notify_cursor_moved();
    Ok(found)
  }

  pub fn before_first(&mut self) -> Result<()> {
    self.check_not_inserting()?;
    self.check_scrollable()?;
    self.pos = 0;
    self.notify_cursor_moved();
    Ok(())
  }

  pub fn after_last(&mut self) -> Result<()> {
    self.check_not_inserting()?;
    self.check_scrollable()?;
    self.pos = self.physical_len() + 1;
    self.notify_cursor_moved();
    Ok(())
  }

  /// 当前行的逻辑行号（只数可见行）；不在可见行上时返回 0
  ///
  /// 显示已删除行时逻辑行号就是物理位置。
  pub fn get_row(&self) -> usize {
    if self.insert.is_some() || !self.visible_at(self.pos) {
      return 0;
    }
    if self.options.show_deleted {
      return self.pos;
    }
    self.rows().rows[..self.pos].iter().filter(|r| !r.is_deleted()).count()
  }

  pub fn is_before_first(&self) -> bool {
    self.insert.is_none() && self.physical_len() > 0 && self.pos == 0
  }

  pub fn is_after_last(&self) -> bool {
    let len = self.physical_len();
    self.insert.is_none() && len > 0 && self.pos > len
  }

  /// 当前行是否是第一个可见行
  pub fn is_first(&self) -> bool {
    self.insert.is_none() && self.visible_at(self.pos) && self.physical_of(1) == Some(self.pos)
  }

  /// 当前行是否是最后一个可见行
  pub fn is_last(&self) -> bool {
    self.insert.is_none() && self.visible_at(self.pos) && self.physical_of(self.size()) == Some(self.pos)
  }

  /// 是否在插入行上
  pub fn is_on_insert_row(&self) -> bool {
    self.insert.is_some()
  }
}
