#![allow(dead_code)]

use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// 每个测试进程只安装一次日志订阅者（`RUST_LOG` 可覆盖）
pub fn init_tracing() {
  static INIT: Once = Once::new();
  INIT.call_once(|| {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rowset_engine=debug"));
    let _ = tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(std::io::stderr)
      .with_ansi(false)
      .try_init();
  });
}
