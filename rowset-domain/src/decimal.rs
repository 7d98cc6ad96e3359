//! 十进制数
//!
//! 以 `i128` 保存未缩放值、以 `u8` 保存小数位数的定点十进制数，对应 SQL 的
//! `DECIMAL` / `NUMERIC`。只提供行集需要的转换能力，不做算术。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// 支持的最大小数位数（与 Decimal128 的 38 位精度对齐）
pub const MAX_DECIMAL_SCALE: u8 = 38;

/// 定点十进制数值对象
///
/// `value = unscaled / 10^scale`。相等比较区分小数位数：`5.0 != 5`。
///
/// 生命周期: 'static
/// 线程安全: Send + Sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decimal {
  unscaled: i128,
  scale: u8,
}

impl Decimal {
  /// 由未缩放值和小数位数创建
  ///
  /// # Examples
  ///
  /// use rowset_domain::Decimal;
  ///
  /// let d = Decimal::new(12345, 2)?;
  /// assert_eq!(d.to_string(), "123.45");
  ///
  pub fn new(unscaled: i128, scale: u8) -> Result<Self, DomainError> {
    if scale > MAX_DECIMAL_SCALE {
      return Err(DomainError::InvalidDecimal {
        message: format!("scale {scale} exceeds maximum {MAX_DECIMAL_SCALE}"),
      });
    }
    Ok(Self { unscaled, scale })
  }

  /// 由整数创建，小数位数为 0
  pub fn from_i64(value: i64) -> Self {
    Self { unscaled: i128::from(value), scale: 0 }
  }

  /// 由浮点数的十进制文本表示创建（无穷大 / NaN 返回错误）
  pub fn from_f64(value: f64) -> Result<Self, DomainError> {
    if !value.is_finite() {
      return Err(DomainError::InvalidDecimal { message: format!("non-finite value {value}") });
    }
    value.to_string().parse()
  }

  pub fn unscaled(&self) -> i128 {
    self.unscaled
  }

  pub fn scale(&self) -> u8 {
    self.scale
  }

  /// 精确转换为 i64
  ///
  /// 小数部分非零或者超出 i64 范围时返回 `None`。
  pub fn to_i64_exact(&self) -> Option<i64> {
    let divisor = 10i128.checked_pow(u32::from(self.scale))?;
    if self.unscaled % divisor != 0 {
      return None;
    }
    i64::try_from(self.unscaled / divisor).ok()
  }

  /// 截断小数部分后转换为 i64；超出 i64 范围时返回 `None`
  pub fn to_i64_trunc(&self) -> Option<i64> {
    let divisor = 10i128.checked_pow(u32::from(self.scale))?;
    i64::try_from(self.unscaled / divisor).ok()
  }

  /// 转换为 f64（可能丢失精度）
  pub fn to_f64(&self) -> f64 {
    // 走文本往返，避免 i128 -> f64 再除以 10^scale 时的二次舍入
    self.to_string().parse().unwrap_or(f64::NAN)
  }
}

impl fmt::Display for Decimal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let digits = self.unscaled.unsigned_abs().to_string();
    let sign = if self.unscaled < 0 { "-" } else { "" };
    let scale = usize::from(self.scale);
    if scale == 0 {
      return write!(f, "{sign}{digits}");
    }
    if digits.len() > scale {
      let (int_part, frac_part) = digits.split_at(digits.len() - scale);
      write!(f, "{sign}{int_part}.{frac_part}")
    } else {
      write!(f, "{sign}0.{}{digits}", "0".repeat(scale - digits.len()))
    }
  }
}

impl FromStr for Decimal {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || DomainError::InvalidDecimal { message: format!("cannot parse '{s}'") };

    let text = s.trim();
    let (negative, body) = match text.as_bytes().first() {
      Some(b'-') => (true, &text[1..]),
      Some(b'+') => (false, &text[1..]),
      _ => (false, text),
    };

    let (int_part, frac_part) = match body.split_once('.') {
      Some((i, f)) => (i, f),
      None => (body, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
      return Err(invalid());
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
      return Err(invalid());
    }

    let scale = u8::try_from(frac_part.len()).map_err(|_| invalid())?;
    let mut unscaled: i128 = 0;
    for b in int_part.bytes().chain(frac_part.bytes()) {
      unscaled = unscaled
        .checked_mul(10)
        .and_then(|v| v.checked_add(i128::from(b - b'0')))
        .ok_or_else(invalid)?;
    }
    if negative {
      unscaled = -unscaled;
    }
    Self::new(unscaled, scale)
  }
}
