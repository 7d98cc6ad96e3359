//! 行集配置
//!
//! 行集的可配置属性（命令、表名、键列、游标类型、并发模式、分页等）。
//! 通过 serde 支持从任意配置格式反序列化，缺省字段取默认值。

use serde::{Deserialize, Serialize};

use crate::error::{Result, RowSetError};

/// 游标滚动类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScrollType {
  /// 只能向前（absolute / relative / first / last 等不可用）
  ForwardOnly,
  #[default]
  ScrollInsensitive,
  ScrollSensitive,
}

/// 并发模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Concurrency {
  ReadOnly,
  #[default]
  Updatable,
}

/// 行集选项
///
/// - `command`：填充 / 翻页时交给活动连接执行的命令
/// - `table_name`：回写的目标表
/// - `key_columns`：回写时用于定位活动行的列（从 1 开始）；为空时用全部列
/// - `match_columns`：联接匹配列（从 1 开始）
/// - `show_deleted`：导航时是否能看到已删除的行
/// - `max_rows`：读入行数上限（0 表示不限）
/// - `page_size`：每页行数（0 表示不分页）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowSetOptions {
  pub command: String,
  pub table_name: String,
  pub key_columns: Vec<usize>,
  pub match_columns: Vec<usize>,
  pub scroll: ScrollType,
  pub concurrency: Concurrency,
  pub show_deleted: bool,
  pub max_rows: usize,
  pub fetch_size: usize,
  pub page_size: usize,
  pub query_timeout_secs: u64,
}

impl Default for RowSetOptions {
  fn default() -> Self {
    Self {
      command: String::new(),
      table_name: String::new(),
      key_columns: Vec::new(),
      match_columns: Vec::new(),
      scroll: ScrollType::ScrollInsensitive,
      concurrency: Concurrency::Updatable,
      show_deleted: false,
      max_rows: 0,
      fetch_size: 0,
      page_size: 0,
      query_timeout_secs: 0,
    }
  }
}

impl RowSetOptions {
  /// 校验选项之间的约束
  ///
  /// 非 0 的 `max_rows` 不能小于 `page_size`。
  pub fn validate(&self) -> Result<()> {
    if self.max_rows != 0 && self.page_size > self.max_rows {
      return Err(RowSetError::InvalidArgument(format!(
        "page size {} cannot be greater than max rows {}",
        self.page_size, self.max_rows
      )));
    }
    if self.key_columns.contains(&0) || self.match_columns.contains(&0) {
      return Err(RowSetError::InvalidArgument("column indexes start at 1".to_string()));
    }
    Ok(())
  }
}
