//! 文件服务模块
//!
//! 提供文件系统抽象，编辑器核心通过 FileProvider 访问磁盘

pub mod local;
pub mod provider;

pub use local::LocalFileProvider;
pub use provider::{DirEntry, FileError, FileMetadata, FileProvider};
