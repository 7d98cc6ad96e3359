//! 值对象
//!
//! 定义行集中单元格的动态值，覆盖行集支持的全部种类:
//! - `Null`: NULL 值
//! - `Boolean`: 布尔
//! - `TinyInt` / `SmallInt` / `Integer` / `BigInt`: 8/16/32/64-bit 整数
//! - `Float` / `Double`: 32/64-bit 浮点数
//! - `Decimal`: 定点十进制数
//! - `Text`: UTF-8 字符串
//! - `Bytes`: 二进制数据
//! - `Date` / `Time` / `Timestamp`: 日期时间
//! - `Handle`: 大对象 / 数组 / 引用 / 结构体句柄

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::data_type::DataType;
use crate::decimal::Decimal;
use crate::handle::{Handle, SerialObject};

/// 值对象：单元格的值
///
/// 行集是断开连接的快照，所有值都拥有自己的数据（不借用数据源）。
///
/// 生命周期: 'static
/// 线程安全: !Send（`Handle::Live` 持有 `Rc`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
  /// NULL 值
  Null,
  Boolean(bool),
  TinyInt(i8),
  SmallInt(i16),
  Integer(i32),
  BigInt(i64),
  Float(f32),
  Double(f64),
  Decimal(Decimal),
  /// UTF-8 字符串
  Text(String),
  /// 二进制数据
  Bytes(Vec<u8>),
  Date(NaiveDate),
  Time(NaiveTime),
  Timestamp(NaiveDateTime),
  /// 句柄（活动句柄或可序列化替身）
  Handle(Handle),
}

impl Value {
  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  /// 值自身的类型
  ///
  /// NULL 没有类型，返回 `None`。
  ///
  /// # Examples
  ///
  /// use rowset_domain::{DataType, Value};
  ///
  /// assert_eq!(Value::Null.data_type(), None);
  /// assert_eq!(Value::Integer(123).data_type(), Some(DataType::Integer));
  /// assert_eq!(Value::Double(3.14).data_type(), Some(DataType::Double));
  ///
  pub fn data_type(&self) -> Option<DataType> {
    let data_type = match self {
      Value::Null => return None,
      Value::Boolean(_) => DataType::Boolean,
      Value::TinyInt(_) => DataType::TinyInt,
      Value::SmallInt(_) => DataType::SmallInt,
      Value::Integer(_) => DataType::Integer,
      Value::BigInt(_) => DataType::BigInt,
      Value::Float(_) => DataType::Float,
      Value::Double(_) => DataType::Double,
      Value::Decimal(_) => DataType::Decimal,
      Value::Text(_) => DataType::Varchar,
      Value::Bytes(_) => DataType::VarBinary,
      Value::Date(_) => DataType::Date,
      Value::Time(_) => DataType::Time,
      Value::Timestamp(_) => DataType::Timestamp,
      Value::Handle(h) => h.kind().data_type(),
    };
    Some(data_type)
  }

  /// 用于错误信息的种类名
  pub fn kind_name(&self) -> &'static str {
    match self {
      Value::Null => "NULL",
      Value::Text(_) => "TEXT",
      Value::Bytes(_) => "BYTES",
      other => other.data_type().map_or("NULL", |t| t.to_sql_type()),
    }
  }

  /// 是否为整数种类（TinyInt / SmallInt / Integer / BigInt）
  pub fn is_integral(&self) -> bool {
    matches!(self, Value::TinyInt(_) | Value::SmallInt(_) | Value::Integer(_) | Value::BigInt(_))
  }

  /// 是否为数值种类（整数、浮点、十进制）
  pub fn is_numeric(&self) -> bool {
    self.is_integral() || matches!(self, Value::Float(_) | Value::Double(_) | Value::Decimal(_))
  }

  /// 尝试转换为 i64
  ///
  /// 任意宽度的整数都会被放宽为 i64；其他种类返回 `None`。
  ///
  /// # Examples
  ///
  /// use rowset_domain::Value;
  ///
  /// assert_eq!(Value::SmallInt(7).as_i64(), Some(7));
  /// assert_eq!(Value::Double(3.14).as_i64(), None);
  ///
  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Value::TinyInt(v) => Some(i64::from(*v)),
      Value::SmallInt(v) => Some(i64::from(*v)),
      Value::Integer(v) => Some(i64::from(*v)),
      Value::BigInt(v) => Some(*v),
      _ => None,
    }
  }

  /// 尝试转换为 f64
  ///
  /// 任意数值种类都可以；十进制数可能丢失精度。
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Value::Float(v) => Some(f64::from(*v)),
      Value::Double(v) => Some(*v),
      Value::Decimal(d) => Some(d.to_f64()),
      other => other.as_i64().map(|v| v as f64),
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Boolean(b) => Some(*b),
      _ => None,
    }
  }

  /// 尝试转换为 &str
  ///
  /// `Text` 以及 CLOB 替身返回 `Some(&str)`，否则返回 `None`。
  pub fn as_text(&self) -> Option<&str> {
    match self {
      Value::Text(s) => Some(s.as_str()),
      Value::Handle(Handle::Serial(SerialObject::Clob(s))) => Some(s.as_str()),
      _ => None,
    }
  }

  /// 尝试转换为 &[u8]
  ///
  /// `Bytes` 以及 BLOB 替身返回 `Some(&[u8])`。
  pub fn as_bytes(&self) -> Option<&[u8]> {
    match self {
      Value::Bytes(b) => Some(b.as_slice()),
      Value::Handle(Handle::Serial(SerialObject::Blob(b))) => Some(b.as_slice()),
      _ => None,
    }
  }

  pub fn as_handle(&self) -> Option<&Handle> {
    match self {
      Value::Handle(h) => Some(h),
      _ => None,
    }
  }

  /// SQL 语义比较（NULL != NULL)
  ///
  /// - 如果任一值为 NULL，返回 `None`
  /// - 整数之间放宽到 i64 比较，数值之间放宽到 f64 比较
  /// - 其他跨种类比较返回 `None`
  ///
  /// # Examples
  ///
  /// use rowset_domain::Value;
  /// use std::cmp::Ordering;
  ///
  /// assert_eq!(Value::Integer(1).sql_compare(&Value::BigInt(2)), Some(Ordering::Less));
  /// assert_eq!(Value::Null.sql_compare(&Value::Integer(1)), None);
  ///
  pub fn sql_compare(&self, other: &Self) -> Option<Ordering> {
    match (self, other) {
      (Value::Null, _) | (_, Value::Null) => None,
      (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
      (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
      (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
      (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
      (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
      (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
      (a, b) if a.is_integral() && b.is_integral() => Some(a.as_i64()?.cmp(&b.as_i64()?)),
      (a, b) if a.is_numeric() && b.is_numeric() => a.as_f64()?.partial_cmp(&b.as_f64()?),
      _ => None,
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => write!(f, "NULL"),
      Value::Boolean(v) => write!(f, "{v}"),
      Value::TinyInt(v) => write!(f, "{v}"),
      Value::SmallInt(v) => write!(f, "{v}"),
      Value::Integer(v) => write!(f, "{v}"),
      Value::BigInt(v) => write!(f, "{v}"),
      Value::Float(v) => write!(f, "{v}"),
      Value::Double(v) => write!(f, "{v}"),
      Value::Decimal(v) => write!(f, "{v}"),
      Value::Text(v) => write!(f, "{v}"),
      Value::Bytes(v) => {
        for b in v {
          write!(f, "{b:02x}")?;
        }
        Ok(())
      }
      Value::Date(v) => write!(f, "{v}"),
      Value::Time(v) => write!(f, "{v}"),
      Value::Timestamp(v) => write!(f, "{v}"),
      Value::Handle(h) => write!(f, "{h}"),
    }
  }
}

impl From<bool> for Value {
  fn from(v: bool) -> Self {
    Value::Boolean(v)
  }
}

impl From<i8> for Value {
  fn from(v: i8) -> Self {
    Value::TinyInt(v)
  }
}

impl From<i16> for Value {
  fn from(v: i16) -> Self {
    Value::SmallInt(v)
  }
}

impl From<i32> for Value {
  fn from(v: i32) -> Self {
    Value::Integer(v)
  }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self {
    Value::BigInt(v)
  }
}

impl From<f32> for Value {
  fn from(v: f32) -> Self {
    Value::Float(v)
  }
}

impl From<f64> for Value {
  fn from(v: f64) -> Self {
    Value::Double(v)
  }
}

impl From<Decimal> for Value {
  fn from(v: Decimal) -> Self {
    Value::Decimal(v)
  }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self {
    Value::Text(v.to_string())
  }
}

impl From<String> for Value {
  fn from(v: String) -> Self {
    Value::Text(v)
  }
}

impl From<Vec<u8>> for Value {
  fn from(v: Vec<u8>) -> Self {
    Value::Bytes(v)
  }
}

impl From<NaiveDate> for Value {
  fn from(v: NaiveDate) -> Self {
    Value::Date(v)
  }
}

impl From<NaiveTime> for Value {
  fn from(v: NaiveTime) -> Self {
    Value::Time(v)
  }
}

impl From<NaiveDateTime> for Value {
  fn from(v: NaiveDateTime) -> Self {
    Value::Timestamp(v)
  }
}

impl From<Handle> for Value {
  fn from(v: Handle) -> Self {
    Value::Handle(v)
  }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self {
    v.map_or(Value::Null, Into::into)
  }
}
