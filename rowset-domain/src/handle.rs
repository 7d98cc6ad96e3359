//! 大对象 / 数组 / 引用 / 结构体句柄
//!
//! 活动数据源产出的 BLOB、CLOB、ARRAY、REF、STRUCT 列值只是指向源端的句柄，
//! 断开连接之后就不能再读取。行集在读入时立即把它们物化为可序列化的替身
//! （`SerialObject`），之后行集内部只保存替身。

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::data_type::DataType;
use crate::value::Value;
use crate::DomainError;

/// 句柄种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
  Blob,
  Clob,
  Array,
  Ref,
  Struct,
}

impl HandleKind {
  /// 对应的声明类型
  pub fn data_type(self) -> DataType {
    match self {
      HandleKind::Blob => DataType::Blob,
      HandleKind::Clob => DataType::Clob,
      HandleKind::Array => DataType::Array,
      HandleKind::Ref => DataType::Ref,
      HandleKind::Struct => DataType::Struct,
    }
  }
}

/// 活动数据源上的句柄
///
/// 由外部执行器实现。`materialize` 读取源端数据并生成替身；源端已关闭或读取失败时
/// 返回 `DomainError::Conversion`。
pub trait LiveObject: fmt::Debug {
  fn kind(&self) -> HandleKind;

  fn materialize(&self) -> Result<SerialObject, DomainError>;
}

/// 可序列化替身
///
/// 与活动源无关的自包含拷贝。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SerialObject {
  Blob(Vec<u8>),
  Clob(String),
  Array { base_type: DataType, elements: Vec<Value> },
  Ref { base_type_name: String, target: Box<Value> },
  Struct { type_name: String, attributes: Vec<Value> },
}

impl SerialObject {
  pub fn kind(&self) -> HandleKind {
    match self {
      SerialObject::Blob(_) => HandleKind::Blob,
      SerialObject::Clob(_) => HandleKind::Clob,
      SerialObject::Array { .. } => HandleKind::Array,
      SerialObject::Ref { .. } => HandleKind::Ref,
      SerialObject::Struct { .. } => HandleKind::Struct,
    }
  }
}

impl fmt::Display for SerialObject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SerialObject::Blob(bytes) => write!(f, "BLOB({} bytes)", bytes.len()),
      SerialObject::Clob(text) => write!(f, "{text}"),
      SerialObject::Array { base_type, elements } => {
        write!(f, "{}[", base_type.to_sql_type())?;
        for (i, e) in elements.iter().enumerate() {
          if i > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{e}")?;
        }
        write!(f, "]")
      }
      SerialObject::Ref { base_type_name, target } => write!(f, "REF {base_type_name}({target})"),
      SerialObject::Struct { type_name, attributes } => {
        write!(f, "{type_name}(")?;
        for (i, a) in attributes.iter().enumerate() {
          if i > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{a}")?;
        }
        write!(f, ")")
      }
    }
  }
}

/// 句柄值：活动句柄或者已物化的替身
///
/// 活动句柄不可序列化（序列化时报错），替身可以。
/// 活动句柄按指针相等比较，替身按内容比较。
///
/// 线程安全: !Send + !Sync（活动句柄绑定在单线程的数据源上）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Handle {
  Serial(SerialObject),
  #[serde(skip)]
  Live(Rc<dyn LiveObject>),
}

impl Handle {
  pub fn kind(&self) -> HandleKind {
    match self {
      Handle::Live(live) => live.kind(),
      Handle::Serial(serial) => serial.kind(),
    }
  }

  pub fn is_serial(&self) -> bool {
    matches!(self, Handle::Serial(_))
  }

  /// 物化为替身（幂等：已经是替身时原样返回）
  pub fn detach(self) -> Result<Handle, DomainError> {
    match self {
      Handle::Live(live) => Ok(Handle::Serial(live.materialize()?)),
      serial @ Handle::Serial(_) => Ok(serial),
    }
  }

  pub fn as_serial(&self) -> Option<&SerialObject> {
    match self {
      Handle::Serial(serial) => Some(serial),
      Handle::Live(_) => None,
    }
  }
}

impl PartialEq for Handle {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Handle::Live(a), Handle::Live(b)) => Rc::ptr_eq(a, b),
      (Handle::Serial(a), Handle::Serial(b)) => a == b,
      _ => false,
    }
  }
}

impl fmt::Display for Handle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Handle::Live(live) => write!(f, "<live {:?}>", live.kind()),
      Handle::Serial(serial) => write!(f, "{serial}"),
    }
  }
}
