//! 行集错误类型
//!
//! 所有行集操作的失败都同步返回给触发它的调用方，不自动重试。

use rowset_domain::DomainError;

use crate::resolver::SyncResolver;

#[derive(thiserror::Error, Debug)]
pub enum RowSetError {
  /// 没有当前行，或者游标模式不对（例如在插入行上调用 absolute）
  #[error("invalid cursor position: {0}")]
  CursorState(&'static str),

  #[error("column index {index} out of range (column count: {count})")]
  ColumnIndex { index: usize, count: usize },

  #[error("column '{0}' not found")]
  ColumnNotFound(String),

  #[error("data type mismatch on column {column} (expected: {expected}, got: {got})")]
  DataTypeMismatch { column: usize, expected: String, got: String },

  /// 行的生命周期与撤销操作不匹配
  #[error("illegal state: {0}")]
  IllegalState(String),

  /// 违反插入行协议
  #[error("illegal insert: {0}")]
  IllegalInsert(String),

  #[error("row set is read-only: {0} is not allowed")]
  ReadOnlyViolation(&'static str),

  #[error("paging has not been initialized")]
  PagingNotInitialized,

  /// 回写失败；冲突时附带冲突解析器
  #[error("synchronization failed: {message}")]
  SyncProvider {
    message: String,
    resolver: Option<SyncResolver>,
    #[source]
    source: Option<Box<RowSetError>>,
  },

  /// 读入时大对象 / 数组 / 引用无法从数据源分离
  #[error("conversion failed: {0}")]
  Conversion(String),

  #[error("not implemented: {0}")]
  NotImplemented(&'static str),

  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// 活动连接 / 数据源报告的失败
  #[error("connection error: {0}")]
  Connection(String),

  /// 没有结构化错误通道的调用点使用
  #[error("{0}")]
  Internal(String),
}

pub type Result<T> = std::result::Result<T, RowSetError>;

impl RowSetError {
  /// 不带冲突的同步失败
  pub fn sync(message: impl Into<String>) -> Self {
    RowSetError::SyncProvider { message: message.into(), resolver: None, source: None }
  }

  /// 把任意失败包装为同步失败；已经是同步失败的原样返回
  pub fn into_sync(self) -> Self {
    match self {
      sync @ RowSetError::SyncProvider { .. } => sync,
      other => RowSetError::SyncProvider {
        message: other.to_string(),
        resolver: None,
        source: Some(Box::new(other)),
      },
    }
  }

  /// 同步失败附带的冲突解析器
  pub fn resolver(&self) -> Option<&SyncResolver> {
    match self {
      RowSetError::SyncProvider { resolver, .. } => resolver.as_ref(),
      _ => None,
    }
  }
}

impl From<DomainError> for RowSetError {
  fn from(err: DomainError) -> Self {
    match err {
      DomainError::ColumnIndex { index, count } => RowSetError::ColumnIndex { index, count },
      DomainError::TypeMismatch { column, expected, got } => {
        RowSetError::DataTypeMismatch { column, expected, got }
      }
      DomainError::IllegalState { message } => RowSetError::IllegalState(message),
      DomainError::Conversion { message } => RowSetError::Conversion(message),
      DomainError::NotNullViolation { name } => {
        RowSetError::IllegalInsert(format!("column '{name}' does not allow NULL values"))
      }
      DomainError::InvalidDecimal { message } => RowSetError::InvalidArgument(message),
    }
  }
}
