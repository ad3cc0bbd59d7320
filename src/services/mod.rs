//! 服务层模块
//!
//! - file: 文件系统 Provider
//! - config: 配置加载
//! - runtime: owner 线程任务队列、tokio runtime
//! - transform: 保存前的外部格式化
//! - watcher: 磁盘变化监听

pub mod config;
pub mod file;
pub mod runtime;
pub mod transform;
pub mod watcher;

pub use config::{ConfigService, Settings, TransformRule};
pub use file::{DirEntry, FileError, FileMetadata, FileProvider, LocalFileProvider};
pub use runtime::{OwnerHandle, OwnerQueue};
pub use transform::{TransformError, TransformRunner};
pub use watcher::FileWatcherService;
