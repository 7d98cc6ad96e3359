//! 行集领域模型
//!
//! 本模块包含断开连接行集的核心领域模型：动态值、列元数据、可编辑的行以及
//! 声明类型转换表。与游标、同步无关的部分都在这里。

pub mod coerce;
pub mod column;
pub mod data_type;
pub mod decimal;
pub mod error;
pub mod extract;
pub mod handle;
pub mod ids;
pub mod row;
pub mod value;

pub use coerce::{coerce, detach};
pub use column::{ColumnMeta, Nullability, RowSetMetaData};
pub use data_type::DataType;
pub use decimal::Decimal;
pub use error::DomainError;
pub use extract::FromValue;
pub use handle::{Handle, HandleKind, LiveObject, SerialObject};
pub use ids::RowId;
pub use row::{Row, RowState};
pub use value::Value;
