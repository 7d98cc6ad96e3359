//! 数据类型定义
//!
//! 定义列的声明类型。行集的列类型表是 `Option<DataType>`：
//! 没有类型映射的列（`None` 或 `Other`）在更新时原样透传。

use serde::{Deserialize, Serialize};

use crate::Value;

/// 数据类型值对象
///
/// 生命周期: 'static
/// 线程安全: Send + Sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
  Boolean,
  TinyInt,
  SmallInt,
  Integer,
  BigInt,
  /// REAL / FLOAT（32-bit 浮点）
  Float,
  /// DOUBLE（64-bit 浮点）
  Double,
  /// DECIMAL / NUMERIC
  Decimal,
  Char,
  Varchar,
  LongVarchar,
  Binary,
  VarBinary,
  Date,
  Time,
  Timestamp,
  Blob,
  Clob,
  Array,
  Ref,
  Struct,
  /// 没有类型映射的列（JAVA_OBJECT、DISTINCT 等）
  Other,
}

impl DataType {
  /// 从 SQL 类型名解析
  ///
  /// # Examples
  ///
  /// use rowset_domain::DataType;
  ///
  /// assert_eq!(DataType::from_sql_type("INTEGER"), Some(DataType::Integer));
  /// assert_eq!(DataType::from_sql_type("double precision"), Some(DataType::Double));
  /// assert_eq!(DataType::from_sql_type("VARCHAR"), Some(DataType::Varchar));
  /// assert_eq!(DataType::from_sql_type("GEOMETRY"), None);
  ///
  pub fn from_sql_type(sql_type: &str) -> Option<Self> {
    match sql_type.to_uppercase().trim() {
      "BOOLEAN" | "BOOL" | "BIT" => Some(Self::Boolean),
      "TINYINT" => Some(Self::TinyInt),
      "SMALLINT" => Some(Self::SmallInt),
      "INTEGER" | "INT" => Some(Self::Integer),
      "BIGINT" => Some(Self::BigInt),
      "REAL" | "FLOAT" => Some(Self::Float),
      "DOUBLE" | "DOUBLE PRECISION" => Some(Self::Double),
      "DECIMAL" | "NUMERIC" => Some(Self::Decimal),
      "CHAR" => Some(Self::Char),
      "VARCHAR" | "TEXT" | "STRING" => Some(Self::Varchar),
      "LONGVARCHAR" => Some(Self::LongVarchar),
      "BINARY" => Some(Self::Binary),
      "VARBINARY" | "LONGVARBINARY" => Some(Self::VarBinary),
      "DATE" => Some(Self::Date),
      "TIME" => Some(Self::Time),
      "TIMESTAMP" | "DATETIME" => Some(Self::Timestamp),
      "BLOB" => Some(Self::Blob),
      "CLOB" => Some(Self::Clob),
      "ARRAY" => Some(Self::Array),
      "REF" => Some(Self::Ref),
      "STRUCT" => Some(Self::Struct),
      "OTHER" | "JAVA_OBJECT" | "DISTINCT" => Some(Self::Other),
      _ => None,
    }
  }

  /// 转换为 SQL 类型名（大写）
  pub fn to_sql_type(&self) -> &'static str {
    match self {
      DataType::Boolean => "BOOLEAN",
      DataType::TinyInt => "TINYINT",
      DataType::SmallInt => "SMALLINT",
      DataType::Integer => "INTEGER",
      DataType::BigInt => "BIGINT",
      DataType::Float => "REAL",
      DataType::Double => "DOUBLE",
      DataType::Decimal => "DECIMAL",
      DataType::Char => "CHAR",
      DataType::Varchar => "VARCHAR",
      DataType::LongVarchar => "LONGVARCHAR",
      DataType::Binary => "BINARY",
      DataType::VarBinary => "VARBINARY",
      DataType::Date => "DATE",
      DataType::Time => "TIME",
      DataType::Timestamp => "TIMESTAMP",
      DataType::Blob => "BLOB",
      DataType::Clob => "CLOB",
      DataType::Array => "ARRAY",
      DataType::Ref => "REF",
      DataType::Struct => "STRUCT",
      DataType::Other => "OTHER",
    }
  }

  pub fn is_integral(&self) -> bool {
    matches!(self, DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt)
  }

  pub fn is_numeric(&self) -> bool {
    self.is_integral() || matches!(self, DataType::Float | DataType::Double | DataType::Decimal)
  }

  pub fn is_string(&self) -> bool {
    matches!(self, DataType::Char | DataType::Varchar | DataType::LongVarchar)
  }

  pub fn is_binary(&self) -> bool {
    matches!(self, DataType::Binary | DataType::VarBinary)
  }

  pub fn is_temporal(&self) -> bool {
    matches!(self, DataType::Date | DataType::Time | DataType::Timestamp)
  }

  /// 是否为句柄类型（读入时需要物化）
  pub fn is_handle(&self) -> bool {
    matches!(self, DataType::Blob | DataType::Clob | DataType::Array | DataType::Ref | DataType::Struct)
  }

  /// 检查值是否已经是此类型（不做任何转换）
  ///
  /// NULL 匹配任意类型；`Other` 匹配任意值。
  ///
  /// # Examples
  ///
  /// use rowset_domain::{DataType, Value};
  ///
  /// assert!(DataType::Integer.matches(&Value::Integer(123)));
  /// assert!(!DataType::Integer.matches(&Value::BigInt(123)));
  ///
  pub fn matches(&self, value: &Value) -> bool {
    match value {
      Value::Null => true,
      Value::Text(_) => self.is_string() || *self == DataType::Other,
      Value::Bytes(_) => self.is_binary() || *self == DataType::Other,
      other => *self == DataType::Other || other.data_type() == Some(*self),
    }
  }
}
