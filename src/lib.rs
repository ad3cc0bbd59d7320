//! coledit - 多列多行文本编辑器核心库
//!
//! 模块结构：
//! - models: 数据模型（TextBuffer, Cursor, EditHistory, TextEdit）
//! - services: 服务层（文件 Provider、配置、外部格式化、磁盘监听、owner 线程队列）
//! - editor: 编辑器层（FileInfo 对账、视图、布局、会话）
//! - logging: tracing 初始化

pub mod editor;
pub mod logging;
pub mod models;
pub mod services;
