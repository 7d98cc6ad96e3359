//! 行集事件监听
//!
//! 通知是同步的，且不可重入：监听器不能在回调里修改触发通知的行集。

/// 事件快照
///
/// - `row`：当前可见行号（从 1 开始；0 表示不在任何行上）
/// - `size`：当前可见行数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSetEvent {
  pub row: usize,
  pub size: usize,
}

/// 行集监听器，所有方法默认什么都不做
pub trait RowSetListener {
  /// 游标移动
  fn cursor_moved(&self, _event: RowSetEvent) {}

  /// 当前行被插入 / 更新 / 删除 / 撤销
  fn row_changed(&self, _event: RowSetEvent) {}

  /// 整个行集被替换（填充、翻页、同步成功）
  fn row_set_changed(&self, _event: RowSetEvent) {}
}
