//! 列元数据
//!
//! 定义行集每一列的元数据（列名、声明类型、可空性等）以及整张结果的元数据容器。
//! 列索引一律从 1 开始。

use serde::{Deserialize, Serialize};

use crate::data_type::DataType;
use crate::value::Value;
use crate::DomainError;

/// 可空性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Nullability {
  /// NOT NULL
  NoNulls,
  #[default]
  Nullable,
  /// 数据源无法确定
  Unknown,
}

/// 列元数据
///
/// 不变量:
/// - name 非空
/// - `data_type == None` 表示没有类型映射，更新时原样透传
///
/// 声明周期: 'static
/// 线程安全: Send + Sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
  pub name: String,
  /// 显示用标签（默认与列名相同）
  pub label: String,
  pub data_type: Option<DataType>,
  pub nullable: Nullability,
  pub auto_increment: bool,
  pub precision: u32,
  pub scale: u32,
  /// 列所属的表（多表结果时可能不同）
  pub table_name: String,
}

impl ColumnMeta {
  /// 创建新列
  ///
  /// # Examples
  ///
  /// use rowset_domain::{ColumnMeta, DataType};
  ///
  /// let column = ColumnMeta::new("id", DataType::Integer);
  /// assert_eq!(column.name, "id");
  /// assert_eq!(column.data_type, Some(DataType::Integer));
  ///
  pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
    let name = name.into();
    Self {
      label: name.clone(),
      name,
      data_type: Some(data_type),
      nullable: Nullability::Nullable,
      auto_increment: false,
      precision: 0,
      scale: 0,
      table_name: String::new(),
    }
  }

  /// 创建没有类型映射的列
  pub fn untyped(name: impl Into<String>) -> Self {
    let mut column = Self::new(name, DataType::Other);
    column.data_type = None;
    column
  }

  /// 标记为 NOT NULL
  pub fn not_null(mut self) -> Self {
    self.nullable = Nullability::NoNulls;
    self
  }

  pub fn with_table(mut self, table_name: impl Into<String>) -> Self {
    self.table_name = table_name.into();
    self
  }

  /// 验证值是否满足 NOT NULL 约束
  ///
  /// 类型检查由 `coerce` 负责，这里只看可空性。
  pub fn validate_value(&self, value: &Value) -> Result<(), DomainError> {
    if self.nullable == Nullability::NoNulls && value.is_null() {
      return Err(DomainError::NotNullViolation { name: self.name.clone() });
    }
    Ok(())
  }
}

/// 行集元数据
///
/// 一旦填充，列数与列类型固定不变。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowSetMetaData {
  columns: Vec<ColumnMeta>,
}

impl RowSetMetaData {
  pub fn new(columns: Vec<ColumnMeta>) -> Self {
    Self { columns }
  }

  pub fn column_count(&self) -> usize {
    self.columns.len()
  }

  pub fn columns(&self) -> &[ColumnMeta] {
    &self.columns
  }

  /// 校验列索引（从 1 开始）
  pub fn check_index(&self, index: usize) -> Result<(), DomainError> {
    if index == 0 || index > self.columns.len() {
      return Err(DomainError::ColumnIndex { index, count: self.columns.len() });
    }
    Ok(())
  }

  /// 获取列元数据（按索引，从 1 开始）
  pub fn column(&self, index: usize) -> Result<&ColumnMeta, DomainError> {
    self.check_index(index)?;
    Ok(&self.columns[index - 1])
  }

  /// 列的声明类型；越界返回错误，没有类型映射返回 `Ok(None)`
  pub fn column_type(&self, index: usize) -> Result<Option<DataType>, DomainError> {
    Ok(self.column(index)?.data_type)
  }

  /// 按列名查找索引（忽略大小写，先匹配列名再匹配标签）
  ///
  /// # Examples
  ///
  /// use rowset_domain::{ColumnMeta, DataType, RowSetMetaData};
  ///
  /// let meta = RowSetMetaData::new(vec![ColumnMeta::new("ID", DataType::Integer)]);
  /// assert_eq!(meta.find("id"), Some(1));
  /// assert_eq!(meta.find("name"), None);
  ///
  pub fn find(&self, name: &str) -> Option<usize> {
    self
      .columns
      .iter()
      .position(|c| c.name.eq_ignore_ascii_case(name))
      .or_else(|| self.columns.iter().position(|c| c.label.eq_ignore_ascii_case(name)))
      .map(|i| i + 1)
  }
}
