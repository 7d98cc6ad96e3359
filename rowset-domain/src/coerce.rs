//! 声明类型转换
//!
//! 把调用方给出的动态值转换为列的声明类型。每个声明类型对应一个显式的转换函数，
//! 规则如下：
//!
//! | 声明类型 | 原样接受 | 检查后接受 | 拒绝 |
//! |---|---|---|---|
//! | 整数 | 同宽或更窄的整数 | 范围内的更宽整数、整数值的十进制数 | 越界、浮点 |
//! | 浮点 / 双精度 | 同种类 | 其他数值截断为整数值 | 布尔、日期、超出 i64 的值 |
//! | 十进制 | 同种类 | 任意数值 | 布尔、日期等 |
//! | 日期时间 | 同种类 | 时间戳与日期 / 时间互转 | 其他 |
//! | 字符串 | 字符串 | 非数组、非二进制值的文本化 | 二进制、数组 |
//! | 句柄 | 已物化的替身 | 活动句柄物化一次 | 无 |
//!
//! 字符串值对所有标量列原样透传；没有类型映射的列（`None` / `Other`）原样透传。

use chrono::{NaiveDate, NaiveTime};

use crate::data_type::DataType;
use crate::decimal::Decimal;
use crate::handle::{Handle, HandleKind, SerialObject};
use crate::value::Value;
use crate::DomainError;

/// 把 `value` 转换为第 `column` 列的声明类型
///
/// # Examples
///
/// use rowset_domain::{coerce, DataType, Value};
///
/// assert_eq!(coerce(Value::Integer(5), Some(DataType::SmallInt), 1)?, Value::SmallInt(5));
/// assert!(coerce(Value::Integer(100_000), Some(DataType::SmallInt), 1).is_err());
///
pub fn coerce(value: Value, declared: Option<DataType>, column: usize) -> Result<Value, DomainError> {
  let target = match declared {
    None | Some(DataType::Other) => return Ok(value),
    Some(t) => t,
  };

  match value {
    Value::Null => Ok(Value::Null),
    Value::Text(s) if target == DataType::Clob => Ok(Value::Handle(Handle::Serial(SerialObject::Clob(s)))),
    text @ Value::Text(_) => Ok(text),
    value => match target {
      DataType::Boolean => to_boolean(value, column),
      t if t.is_integral() => to_integral(value, t, column),
      DataType::Float | DataType::Double | DataType::Decimal => to_fractional(value, target, column),
      t if t.is_string() => to_text(value, t, column),
      t if t.is_binary() => to_binary(value, t, column),
      t if t.is_temporal() => to_temporal(value, t, column),
      _ => to_handle(value, target),
    },
  }
}

/// 把活动句柄物化为替身，其他值原样返回
///
/// 读入数据时对每个单元格调用，使行集与数据源断开。
pub fn detach(value: Value) -> Result<Value, DomainError> {
  match value {
    Value::Handle(h) => Ok(Value::Handle(h.detach()?)),
    other => Ok(other),
  }
}

fn mismatch(column: usize, target: DataType, value: &Value) -> DomainError {
  DomainError::TypeMismatch {
    column,
    expected: target.to_sql_type().to_string(),
    got: value.kind_name().to_string(),
  }
}

fn to_boolean(value: Value, column: usize) -> Result<Value, DomainError> {
  match &value {
    Value::Boolean(_) => Ok(value),
    v if v.is_integral() => Ok(Value::Boolean(v.as_i64() != Some(0))),
    _ => Err(mismatch(column, DataType::Boolean, &value)),
  }
}

fn to_integral(value: Value, target: DataType, column: usize) -> Result<Value, DomainError> {
  let wide = match &value {
    v if v.is_integral() => v.as_i64(),
    Value::Decimal(d) => d.to_i64_exact(),
    _ => None,
  };
  let Some(wide) = wide else {
    return Err(mismatch(column, target, &value));
  };

  let narrowed = match target {
    DataType::TinyInt => i8::try_from(wide).ok().map(Value::TinyInt),
    DataType::SmallInt => i16::try_from(wide).ok().map(Value::SmallInt),
    DataType::Integer => i32::try_from(wide).ok().map(Value::Integer),
    _ => Some(Value::BigInt(wide)),
  };
  narrowed.ok_or_else(|| mismatch(column, target, &value))
}

fn to_fractional(value: Value, target: DataType, column: usize) -> Result<Value, DomainError> {
  if !value.is_numeric() {
    return Err(mismatch(column, target, &value));
  }
  match (target, &value) {
    (DataType::Float, Value::Float(_)) | (DataType::Double, Value::Double(_)) => Ok(value),
    (DataType::Decimal, Value::Decimal(_)) => Ok(value),
    (DataType::Decimal, Value::Float(f)) => {
      Decimal::from_f64(f64::from(*f)).map(Value::Decimal).map_err(|_| mismatch(column, target, &value))
    }
    (DataType::Decimal, Value::Double(d)) => {
      Decimal::from_f64(*d).map(Value::Decimal).map_err(|_| mismatch(column, target, &value))
    }
    (DataType::Decimal, v) => match v.as_i64() {
      Some(i) => Ok(Value::Decimal(Decimal::from_i64(i))),
      None => Err(mismatch(column, target, &value)),
    },
    // 不同种类的数值先截断为 long
    (_, v) => {
      let long = truncate_to_long(v).ok_or_else(|| mismatch(column, target, &value))?;
      if target == DataType::Float {
        Ok(Value::Float(long as f32))
      } else {
        Ok(Value::Double(long as f64))
      }
    }
  }
}

/// 数值的 long 值：整数原样，浮点与十进制数截断小数；超出 i64 范围时为 `None`
fn truncate_to_long(value: &Value) -> Option<i64> {
  match value {
    Value::Decimal(d) => d.to_i64_trunc(),
    Value::Float(_) | Value::Double(_) => {
      let f = value.as_f64()?.trunc();
      (f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64).then(|| f as i64)
    }
    v => v.as_i64(),
  }
}

fn to_text(value: Value, target: DataType, column: usize) -> Result<Value, DomainError> {
  match value {
    Value::Bytes(_) => Err(mismatch(column, target, &value)),
    Value::Handle(h) => {
      let h = h.detach()?;
      match h.as_serial() {
        Some(SerialObject::Clob(s)) => Ok(Value::Text(s.clone())),
        Some(serial @ (SerialObject::Ref { .. } | SerialObject::Struct { .. })) => Ok(Value::Text(serial.to_string())),
        _ => Err(mismatch(column, target, &Value::Handle(h))),
      }
    }
    other => Ok(Value::Text(other.to_string())),
  }
}

fn to_binary(value: Value, target: DataType, column: usize) -> Result<Value, DomainError> {
  match value {
    Value::Bytes(_) => Ok(value),
    Value::Handle(h) if h.kind() == HandleKind::Blob => match h.detach()? {
      Handle::Serial(SerialObject::Blob(bytes)) => Ok(Value::Bytes(bytes)),
      other => Err(mismatch(column, target, &Value::Handle(other))),
    },
    other => Err(mismatch(column, target, &other)),
  }
}

fn to_temporal(value: Value, target: DataType, column: usize) -> Result<Value, DomainError> {
  let converted = match (target, &value) {
    (DataType::Date, Value::Date(_)) | (DataType::Time, Value::Time(_)) => Some(value.clone()),
    (DataType::Timestamp, Value::Timestamp(_)) => Some(value.clone()),
    (DataType::Date, Value::Timestamp(ts)) => Some(Value::Date(ts.date())),
    (DataType::Time, Value::Timestamp(ts)) => Some(Value::Time(ts.time())),
    (DataType::Timestamp, Value::Date(d)) => NaiveTime::from_hms_opt(0, 0, 0).map(|t| Value::Timestamp(d.and_time(t))),
    (DataType::Timestamp, Value::Time(t)) => NaiveDate::from_ymd_opt(1970, 1, 1).map(|d| Value::Timestamp(d.and_time(*t))),
    _ => None,
  };
  converted.ok_or_else(|| mismatch(column, target, &value))
}

fn to_handle(value: Value, target: DataType) -> Result<Value, DomainError> {
  match value {
    Value::Handle(h) => Ok(Value::Handle(h.detach()?)),
    Value::Bytes(bytes) if target == DataType::Blob => Ok(Value::Handle(Handle::Serial(SerialObject::Blob(bytes)))),
    other => Ok(other),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn untyped_columns_pass_through() {
    let v = Value::Double(1.25);
    assert_eq!(coerce(v.clone(), None, 1), Ok(v.clone()));
    assert_eq!(coerce(v.clone(), Some(DataType::Other), 1), Ok(v));
  }

  #[test]
  fn null_is_accepted_everywhere() {
    for t in [DataType::Integer, DataType::Date, DataType::Blob, DataType::Varchar] {
      assert_eq!(coerce(Value::Null, Some(t), 1), Ok(Value::Null));
    }
  }

  #[test]
  fn fractional_beyond_long_range_is_rejected() {
    assert!(coerce(Value::Double(1e300), Some(DataType::Float), 3).is_err());
    assert!(coerce(Value::Float(f32::NAN), Some(DataType::Double), 3).is_err());
    assert_eq!(coerce(Value::Double(-0.5), Some(DataType::Float), 3), Ok(Value::Float(0.0)));
  }
}
