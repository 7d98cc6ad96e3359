//! 缓存行集
//!
//! `CachedRowSet` 持有有序的行序列、游标、插入行暂存区、分页状态以及影子原始行，
//! 并提供全部滚动 / 编辑 / 同步操作。行集与数据源断开：只有填充、翻页与
//! `accept_changes` 会访问外部协作者。
//!
//! 游标用物理位置表示（包含已删除行，从 1 开始）：
//! - `0`：第一行之前
//! - `1..=len`：某一行
//! - `len + 1`：最后一行之后
//! - 插入行：`insert` 为 `Some`，`pos` 保留进入插入行前的位置
//!
//! 线程安全: !Send（行序列通过 `Rc<RefCell<_>>` 在共享视图之间共享）

mod copy;
mod cursor;
mod edit;
mod paging;
mod sync;

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use rowset_domain::{DomainError, Row, RowId, RowSetMetaData, Value};
use tracing::{debug, info};

use crate::error::{Result, RowSetError};
use crate::listener::{RowSetEvent, RowSetListener};
use crate::options::{Concurrency, RowSetOptions, ScrollType};
use crate::reader::RowReader;
use crate::source::{CacheSource, RowSource, SharedConnection};
use crate::writer::{OptimisticWriter, SharedWriter};

pub(crate) use paging::{PageSource, PageState};

/// 行序列及其影子原始行
///
/// 不变量: `deleted == rows 中 Deleted 行的数量`
#[derive(Debug, Clone, Default)]
pub(crate) struct RowStore {
  pub(crate) rows: Vec<Row>,
  /// 影子原始行，按 `RowId` 与 `rows` 对应；插入后尚未同步的行没有影子
  pub(crate) original: Vec<Row>,
  pub(crate) deleted: usize,
  pub(crate) next_id: RowId,
}

impl RowStore {
  fn allocate_id(&mut self) -> RowId {
    let id = self.next_id;
    self.next_id = id.next();
    id
  }

  pub(crate) fn install(&mut self, rows: Vec<Row>) {
    let next = rows.iter().map(|r| r.id().next()).max().unwrap_or_default();
    if next > self.next_id {
      self.next_id = next;
    }
    self.deleted = rows.iter().filter(|r| r.is_deleted()).count();
    self.original = rows.clone();
    self.rows = rows;
  }
}

/// 插入行状态
#[derive(Debug, Clone)]
pub(crate) struct InsertSlot {
  /// 进入插入行之前的游标位置
  pub(crate) saved_pos: usize,
  pub(crate) staging: Row,
}

pub struct CachedRowSet {
  pub(crate) store: Rc<RefCell<RowStore>>,
  pub(crate) meta: RowSetMetaData,
  pub(crate) options: RowSetOptions,
  pub(crate) pos: usize,
  pub(crate) insert: Option<InsertSlot>,
  pub(crate) params: Vec<Value>,
  pub(crate) page: Option<PageState>,
  pub(crate) connection: Option<SharedConnection>,
  pub(crate) writer: SharedWriter,
  pub(crate) listeners: Vec<Rc<dyn RowSetListener>>,
}

impl Default for CachedRowSet {
  fn default() -> Self {
    Self::new()
  }
}

impl std::fmt::Debug for CachedRowSet {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CachedRowSet")
      .field("columns", &self.meta.column_count())
      .field("rows", &self.physical_len())
      .field("pos", &self.pos)
      .field("on_insert_row", &self.insert.is_some())
      .field("options", &self.options)
      .finish()
  }
}

impl CachedRowSet {
  /// 创建空行集（默认选项，乐观写回器）
  pub fn new() -> Self {
    Self {
      store: Rc::new(RefCell::new(RowStore::default())),
      meta: RowSetMetaData::default(),
      options: RowSetOptions::default(),
      pos: 0,
      insert: None,
      params: Vec::new(),
      page: None,
      connection: None,
      writer: OptimisticWriter::shared(),
      listeners: Vec::new(),
    }
  }

  /// 用给定选项创建空行集
  pub fn with_options(options: RowSetOptions) -> Result<Self> {
    options.validate()?;
    let mut set = Self::new();
    set.options = options;
    Ok(set)
  }

  pub(crate) fn rows(&self) -> Ref<'_, RowStore> {
    self.store.borrow()
  }

  pub(crate) fn rows_mut(&self) -> RefMut<'_, RowStore> {
    self.store.borrow_mut()
  }

  /// 物理行数（包括已删除行）
  pub fn physical_len(&self) -> usize {
    self.rows().rows.len()
  }

  /// 已删除但尚未同步的行数
  pub fn deleted_count(&self) -> usize {
    self.rows().deleted
  }

  /// 可见行数
  ///
  /// 不显示已删除行时为 `physical_len() - deleted_count()`。
  pub fn size(&self) -> usize {
    let store = self.rows();
    if self.options.show_deleted {
      store.rows.len()
    } else {
      store.rows.len() - store.deleted
    }
  }

  pub fn is_empty(&self) -> bool {
    self.size() == 0
  }

  pub fn metadata(&self) -> &RowSetMetaData {
    &self.meta
  }

  pub fn column_count(&self) -> usize {
    self.meta.column_count()
  }

  /// 按列名查找列索引（从 1 开始）
  pub fn find_column(&self, name: &str) -> Result<usize> {
    self.meta.find(name).ok_or_else(|| RowSetError::ColumnNotFound(name.to_string()))
  }

  pub(crate) fn is_visible(&self, row: &Row) -> bool {
    self.options.show_deleted || !row.is_deleted()
  }

  pub(crate) fn check_updatable(&self, operation: &'static str) -> Result<()> {
    if self.options.concurrency == Concurrency::ReadOnly {
      return Err(RowSetError::ReadOnlyViolation(operation));
    }
    Ok(())
  }

  /// 当前行的下标（从 0 开始）；插入行或不在任何行上时返回错误
  pub(crate) fn current_index(&self) -> Result<usize> {
    if self.insert.is_some() {
      return Err(RowSetError::CursorState("operation is not allowed on the insert row"));
    }
    let len = self.physical_len();
    if self.pos == 0 || self.pos > len {
      return Err(RowSetError::CursorState("no current row"));
    }
    Ok(self.pos - 1)
  }

  // ---- 配置 ----

  pub fn options(&self) -> &RowSetOptions {
    &self.options
  }

  pub fn command(&self) -> &str {
    &self.options.command
  }

  pub fn set_command(&mut self, command: impl Into<String>) {
    self.options.command = command.into();
  }

  /// 设置命令参数；参数原样交给 `Connection::execute`
  pub fn set_params(&mut self, params: Vec<Value>) {
    self.params = params;
  }

  pub fn params(&self) -> &[Value] {
    &self.params
  }

  pub fn clear_params(&mut self) {
    self.params.clear();
  }

  pub fn table_name(&self) -> &str {
    &self.options.table_name
  }

  pub fn set_table_name(&mut self, table_name: impl Into<String>) {
    self.options.table_name = table_name.into();
  }

  pub fn key_columns(&self) -> &[usize] {
    &self.options.key_columns
  }

  /// 设置键列；已有元数据时列索引必须在 `1..=column_count` 内
  pub fn set_key_columns(&mut self, columns: Vec<usize>) -> Result<()> {
    self.check_columns(&columns)?;
    self.options.key_columns = columns;
    Ok(())
  }

  pub fn match_columns(&self) -> &[usize] {
    &self.options.match_columns
  }

  pub fn set_match_columns(&mut self, columns: Vec<usize>) -> Result<()> {
    self.check_columns(&columns)?;
    self.options.match_columns = columns;
    Ok(())
  }

  fn check_columns(&self, columns: &[usize]) -> Result<()> {
    let count = self.meta.column_count();
    for &c in columns {
      if c == 0 || (count > 0 && c > count) {
        return Err(RowSetError::ColumnIndex { index: c, count });
      }
    }
    Ok(())
  }

  pub fn show_deleted(&self) -> bool {
    self.options.show_deleted
  }

  pub fn set_show_deleted(&mut self, show_deleted: bool) {
    self.options.show_deleted = show_deleted;
  }

  pub fn max_rows(&self) -> usize {
    self.options.max_rows
  }

  /// 设置读取上限；非 0 时不能小于页大小
  pub fn set_max_rows(&mut self, max_rows: usize) -> Result<()> {
    if max_rows != 0 && max_rows < self.options.page_size {
      return Err(RowSetError::InvalidArgument(format!(
        "max rows {max_rows} cannot be less than page size {}",
        self.options.page_size
      )));
    }
    self.options.max_rows = max_rows;
    Ok(())
  }

  pub fn fetch_size(&self) -> usize {
    self.options.fetch_size
  }

  pub fn set_fetch_size(&mut self, fetch_size: usize) {
    self.options.fetch_size = fetch_size;
  }

  pub fn scroll_type(&self) -> ScrollType {
    self.options.scroll
  }

  pub fn set_scroll_type(&mut self, scroll: ScrollType) {
    self.options.scroll = scroll;
  }

  pub fn concurrency(&self) -> Concurrency {
    self.options.concurrency
  }

  pub fn set_concurrency(&mut self, concurrency: Concurrency) {
    self.options.concurrency = concurrency;
  }

  pub fn query_timeout_secs(&self) -> u64 {
    self.options.query_timeout_secs
  }

  pub fn set_query_timeout_secs(&mut self, secs: u64) {
    self.options.query_timeout_secs = secs;
  }

  /// 替换写回器
  pub fn set_writer(&mut self, writer: SharedWriter) {
    self.writer = writer;
  }

  pub fn connection(&self) -> Option<&SharedConnection> {
    self.connection.as_ref()
  }

  pub fn set_connection(&mut self, connection: SharedConnection) {
    self.connection = Some(connection);
  }

  // ---- 监听器 ----

  pub fn add_listener(&mut self, listener: Rc<dyn RowSetListener>) {
    self.listeners.push(listener);
  }

  pub fn remove_listener(&mut self, listener: &Rc<dyn RowSetListener>) {
    self.listeners.retain(|l| !Rc::ptr_eq(l, listener));
  }

  fn event(&self) -> RowSetEvent {
    RowSetEvent { row: self.get_row(), size: self.size() }
  }

  pub(crate) fn notify_cursor_moved(&self) {
    if self.listeners.is_empty() {
      return;
    }
    let event = self.event();
    self.listeners.iter().for_each(|l| l.cursor_moved(event));
  }

  pub(crate) fn notify_row_changed(&self) {
    if self.listeners.is_empty() {
      return;
    }
    let event = self.event();
    self.listeners.iter().for_each(|l| l.row_changed(event));
  }

  pub(crate) fn notify_row_set_changed(&self) {
    if self.listeners.is_empty() {
      return;
    }
    let event = self.event();
    self.listeners.iter().for_each(|l| l.row_set_changed(event));
  }

  // ---- 填充 ----

  /// 设置元数据，清空所有行
  ///
  /// 之后可以通过插入行协议逐行添加数据。
  pub fn set_metadata(&mut self, meta: RowSetMetaData) -> Result<()> {
    self.meta = meta;
    self.check_columns(&self.options.key_columns)?;
    self.page = None;
    self.replace_rows(Vec::new());
    Ok(())
  }

  /// 整体替换行与元数据（`RowReader::read_into` 使用）
  pub fn set_rows(&mut self, meta: RowSetMetaData, rows: Vec<Row>) -> Result<()> {
    if let Some(bad) = rows.iter().find(|r| r.column_count() != meta.column_count()) {
      return Err(RowSetError::from(DomainError::IllegalState {
        message: format!("row {} has {} columns, expected {}", bad.id(), bad.column_count(), meta.column_count()),
      }));
    }
    self.meta = meta;
    self.replace_rows(rows);
    Ok(())
  }

  /// 替换行序列，重建影子原始行，游标回到第一行之前
  pub(crate) fn replace_rows(&mut self, rows: Vec<Row>) {
    self.rows_mut().install(rows);
    self.pos = 0;
    self.insert = None;
    self.notify_row_set_changed();
  }

  /// 从数据源填充
  pub fn populate(&mut self, source: &mut dyn RowSource) -> Result<()> {
    self.populate_from(source, 1)
  }

  /// 从数据源的第 `start_row` 行（从 1 开始）开始填充
  ///
  /// 分页时先把数据源物化到侧缓存，之后的翻页在缓存上重新扫描。
  pub fn populate_from(&mut self, source: &mut dyn RowSource, start_row: usize) -> Result<()> {
    if start_row == 0 {
      return Err(RowSetError::InvalidArgument("start row must be at least 1".to_string()));
    }
    self.options.validate()?;
    let origin = start_row - 1;
    let reader = RowReader::new(self.options.max_rows, self.options.page_size).skip(origin);

    if self.options.page_size == 0 {
      self.page = None;
      reader.read_into(self, source)?;
      info!(rows = self.physical_len(), start_row, "row set populated");
      return Ok(());
    }

    let meta = source.metadata().clone();
    let mut cache = Vec::new();
    while let Some(values) = source.next_row()? {
      cache.push(values);
    }
    let cache = Rc::new(cache);
    debug!(cached = cache.len(), "source materialized for paging");

    let mut scan = CacheSource::new(meta.clone(), Rc::clone(&cache));
    reader.read_into(self, &mut scan)?;
    self.page = Some(PageState {
      origin,
      start: origin,
      len: self.physical_len(),
      source: PageSource::Cache { meta, rows: cache },
    });
    info!(rows = self.physical_len(), start_row, page_size = self.options.page_size, "row set populated (paged)");
    Ok(())
  }

  /// 通过连接执行命令并填充，记住连接供翻页与 `accept_changes` 使用
  pub fn execute(&mut self, connection: SharedConnection) -> Result<()> {
    if self.options.command.trim().is_empty() {
      return Err(RowSetError::IllegalState("command is not set".to_string()));
    }
    self.options.validate()?;
    let mut source = connection.borrow_mut().execute(&self.options.command, &self.params)?;

    let reader = RowReader::new(self.options.max_rows, self.options.page_size);
    reader.read_into(self, source.as_mut())?;
    self.page = (self.options.page_size > 0).then(|| PageState {
      origin: 0,
      start: 0,
      len: self.physical_len(),
      source: PageSource::Command,
    });
    self.connection = Some(connection);
    info!(command = %self.options.command, rows = self.physical_len(), "row set executed");
    Ok(())
  }

  // ---- 批量访问 ----

  /// 所有可见行的当前值
  pub fn to_collection(&self) -> Vec<Vec<Value>> {
    self
      .rows()
      .rows
      .iter()
      .filter(|r| self.is_visible(r))
      .map(|r| r.values().to_vec())
      .collect()
  }

  /// 所有可见行第 `index` 列（从 1 开始）的当前值
  pub fn to_column(&self, index: usize) -> Result<Vec<Value>> {
    self.meta.check_index(index)?;
    Ok(
      self
        .rows()
        .rows
        .iter()
        .filter(|r| self.is_visible(r))
        .map(|r| r.values()[index - 1].clone())
        .collect(),
    )
  }

  pub fn to_column_by_name(&self, name: &str) -> Result<Vec<Value>> {
    self.to_column(self.find_column(name)?)
  }

  // ---- 生命周期 ----

  /// 丢弃所有行（元数据、连接与监听器保留）
  pub fn release(&mut self) {
    {
      let mut store = self.rows_mut();
      store.rows.clear();
      store.original.clear();
      store.deleted = 0;
    }
    self.pos = 0;
    self.insert = None;
    self.page = None;
    self.notify_row_set_changed();
  }

  /// 关闭行集：丢弃行、元数据、监听器与连接
  ///
  /// 共享视图不受影响。
  pub fn close(&mut self) {
    self.store = Rc::new(RefCell::new(RowStore::default()));
    self.meta = RowSetMetaData::default();
    self.pos = 0;
    self.insert = None;
    self.page = None;
    self.params.clear();
    self.connection = None;
    self.listeners.clear();
  }
}
