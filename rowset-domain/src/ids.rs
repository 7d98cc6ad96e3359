//! ID 类型定义（newtype 模式）
//!
//! 使用 newtype 模式提供类型安全的 ID，防止行号（游标位置）与行身份混淆。

/// 行 ID
///
/// 行在所属集合中的稳定身份，与游标位置无关：插入、删除、翻页都不会改变已有行的 ID。
/// 影子原始集合（shadow original）通过 RowId 与当前行一一对应。
/// 底层类型：`u64`（单调递增，从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RowId(u64);

impl RowId {
  #[inline]
  pub fn new(id: u64) -> Self {
    Self(id)
  }

  #[inline]
  pub fn into_inner(self) -> u64 {
    self.0
  }

  /// 下一个 ID
  #[inline]
  pub fn next(self) -> Self {
    Self(self.0 + 1)
  }
}

impl Default for RowId {
  /// 第一个 ID
  fn default() -> Self {
    Self(1)
  }
}

impl From<u64> for RowId {
  #[inline]
  fn from(id: u64) -> Self {
    Self(id)
  }
}

impl From<RowId> for u64 {
  #[inline]
  fn from(id: RowId) -> Self {
    id.0
  }
}

impl std::fmt::Display for RowId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "#{}", self.0)
  }
}
