//! 断开连接的缓存行集
//!
//! 本模块在领域模型之上实现行集引擎：游标状态机、编辑与插入行协议、分页、
//! 写回同步与冲突解析。外部协作者（数据源、活动连接、写回器）以 trait 给出。

pub mod error;
pub mod listener;
pub mod memory;
pub mod options;
pub mod reader;
pub mod resolver;
pub mod rowset;
pub mod snapshot;
pub mod source;
pub mod test_support;
pub mod writer;

pub use error::{Result, RowSetError};
pub use listener::{RowSetEvent, RowSetListener};
pub use memory::{Fault, MemoryConnection, MemoryStore};
pub use options::{Concurrency, RowSetOptions, ScrollType};
pub use reader::RowReader;
pub use resolver::{Conflict, ConflictStatus, SyncResolver};
pub use rowset::CachedRowSet;
pub use snapshot::{RowSetSnapshot, RowSnapshot};
pub use source::{cells_match, rows_match, Connection, RowKey, RowSource, SharedConnection, VecSource};
pub use writer::{OptimisticWriter, RowWriter, SharedWriter, WriteContext};
