//! 读取方向的值转换
//!
//! `get_int`、`get_string` 等读取方法把单元格中的动态值转换为调用方要求的 Rust 类型。
//! SQL NULL 读取为 `None`。

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::decimal::Decimal;
use crate::value::Value;
use crate::DomainError;

/// 可以从单元格读取的类型
pub trait FromValue: Sized {
  /// 目标类型名，用于错误信息
  const TYPE_NAME: &'static str;

  /// 转换非 NULL 值；无法转换时返回 `None`
  fn from_non_null(value: &Value) -> Option<Self>;

  /// 读取第 `column` 列的值
  fn from_value(value: &Value, column: usize) -> Result<Option<Self>, DomainError> {
    if value.is_null() {
      return Ok(None);
    }
    Self::from_non_null(value).map(Some).ok_or_else(|| DomainError::TypeMismatch {
      column,
      expected: Self::TYPE_NAME.to_string(),
      got: value.kind_name().to_string(),
    })
  }
}

impl FromValue for bool {
  const TYPE_NAME: &'static str = "BOOLEAN";

  fn from_non_null(value: &Value) -> Option<Self> {
    match value {
      Value::Boolean(b) => Some(*b),
      v if v.is_integral() => v.as_i64().map(|i| i != 0),
      Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
      },
      _ => None,
    }
  }
}

macro_rules! impl_from_value_int {
  ($($ty:ty => $name:literal),* $(,)?) => {
    $(
      impl FromValue for $ty {
        const TYPE_NAME: &'static str = $name;

        fn from_non_null(value: &Value) -> Option<Self> {
          match value {
            v if v.is_integral() => v.as_i64().and_then(|i| <$ty>::try_from(i).ok()),
            Value::Decimal(d) => d.to_i64_exact().and_then(|i| <$ty>::try_from(i).ok()),
            Value::Float(_) | Value::Double(_) => {
              let f = value.as_f64()?.trunc();
              (f.is_finite() && f >= <$ty>::MIN as f64 && f <= <$ty>::MAX as f64).then(|| f as $ty)
            }
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
          }
        }
      }
    )*
  };
}

impl_from_value_int! {
  i8 => "TINYINT",
  i16 => "SMALLINT",
  i32 => "INTEGER",
  i64 => "BIGINT",
}

impl FromValue for f32 {
  const TYPE_NAME: &'static str = "REAL";

  fn from_non_null(value: &Value) -> Option<Self> {
    match value {
      Value::Text(s) => s.trim().parse().ok(),
      v => v.as_f64().map(|f| f as f32),
    }
  }
}

impl FromValue for f64 {
  const TYPE_NAME: &'static str = "DOUBLE";

  fn from_non_null(value: &Value) -> Option<Self> {
    match value {
      Value::Text(s) => s.trim().parse().ok(),
      v => v.as_f64(),
    }
  }
}

impl FromValue for Decimal {
  const TYPE_NAME: &'static str = "DECIMAL";

  fn from_non_null(value: &Value) -> Option<Self> {
    match value {
      Value::Decimal(d) => Some(*d),
      Value::Float(_) | Value::Double(_) => value.as_f64().and_then(|f| Decimal::from_f64(f).ok()),
      Value::Text(s) => s.parse().ok(),
      v => v.as_i64().map(Decimal::from_i64),
    }
  }
}

impl FromValue for String {
  const TYPE_NAME: &'static str = "VARCHAR";

  fn from_non_null(value: &Value) -> Option<Self> {
    match value.as_text() {
      Some(s) => Some(s.to_string()),
      None => Some(value.to_string()),
    }
  }
}

impl FromValue for Vec<u8> {
  const TYPE_NAME: &'static str = "VARBINARY";

  fn from_non_null(value: &Value) -> Option<Self> {
    value.as_bytes().map(<[u8]>::to_vec)
  }
}

impl FromValue for NaiveDate {
  const TYPE_NAME: &'static str = "DATE";

  fn from_non_null(value: &Value) -> Option<Self> {
    match value {
      Value::Date(d) => Some(*d),
      Value::Timestamp(ts) => Some(ts.date()),
      Value::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
      _ => None,
    }
  }
}

impl FromValue for NaiveTime {
  const TYPE_NAME: &'static str = "TIME";

  fn from_non_null(value: &Value) -> Option<Self> {
    match value {
      Value::Time(t) => Some(*t),
      Value::Timestamp(ts) => Some(ts.time()),
      Value::Text(s) => NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f").ok(),
      _ => None,
    }
  }
}

impl FromValue for NaiveDateTime {
  const TYPE_NAME: &'static str = "TIMESTAMP";

  fn from_non_null(value: &Value) -> Option<Self> {
    match value {
      Value::Timestamp(ts) => Some(*ts),
      Value::Date(d) => d.and_hms_opt(0, 0, 0),
      Value::Text(s) => {
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
          .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
          .ok()
      }
      _ => None,
    }
  }
}
