//! 领域错误类型
//!
//! 定义领域层可能出现的所有错误类型

use thiserror::Error;

/// 领域错误类型
///
/// 表示领域层操作中可能出现的错误：列越界、类型转换失败、行生命周期非法迁移等。
/// 列索引一律从 1 开始计数。
///
/// 线程安全: Send + Sync
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
  /// 列索引越界（行访问错误）
  #[error("column index {index} out of range (column count: {count})")]
  ColumnIndex { index: usize, count: usize },

  /// 约束违反：类型不匹配
  #[error("value for column {column} does not match declared type (expected: {expected}, got: {got})")]
  TypeMismatch { column: usize, expected: String, got: String },

  /// 行生命周期非法迁移
  #[error("illegal row state: {message}")]
  IllegalState { message: String },

  /// 大对象 / 数组 / 引用无法从活动数据源分离
  #[error("conversion failed: {message}")]
  Conversion { message: String },

  /// 约束违反：NOT NULL
  #[error("column '{name}' does not allow NULL values")]
  NotNullViolation { name: String },

  /// 十进制数无效（解析失败或超出精度）
  #[error("invalid decimal: {message}")]
  InvalidDecimal { message: String },
}
