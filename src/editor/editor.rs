//! 编辑器上下文
//!
//! 持有注册表、视图、布局与各项服务。所有状态只在 owner 线程上修改；
//! 其它线程通过 `EditorHandle` 投递闭包。内容编辑统一走 `edit`，
//! 以便变化后同步重复视图并刷新行状态。

use super::file_info::InfoKind;
use super::layout::Layout;
use super::registry::{normalize_name, FileRegistry};
use super::session::SessionError;
use super::toolbar::{self, escape_arg, HomeVars};
use super::view::{RowState, View, ViewId, Views};
use crate::models::{BufferError, TextEdit};
use crate::services::config::home_dir;
use crate::services::{
    ConfigService, FileError, FileProvider, FileWatcherService, LocalFileProvider, OwnerHandle,
    OwnerQueue, Settings, TransformRunner,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// 新行地址栏中名字之后的默认内容
pub const DEFAULT_TOOLBAR_SUFFIX: &str = " | Reload";

pub type EditorHandle = OwnerHandle<Editor>;

#[derive(Debug)]
pub enum EditorError {
    File(FileError),
    Buffer(BufferError),
    Session(SessionError),
    MissingArgument(&'static str),
    UnknownCommand(String),
    NoActiveRow,
    RowNotFound,
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorError::File(e) => write!(f, "{}", e),
            EditorError::Buffer(e) => write!(f, "{}", e),
            EditorError::Session(e) => write!(f, "{}", e),
            EditorError::MissingArgument(cmd) => write!(f, "{}: missing argument", cmd),
            EditorError::UnknownCommand(cmd) => write!(f, "unknown command: {}", cmd),
            EditorError::NoActiveRow => write!(f, "no active row"),
            EditorError::RowNotFound => write!(f, "row not found"),
        }
    }
}

impl std::error::Error for EditorError {}

impl From<FileError> for EditorError {
    fn from(e: FileError) -> Self {
        EditorError::File(e)
    }
}

impl From<BufferError> for EditorError {
    fn from(e: BufferError) -> Self {
        EditorError::Buffer(e)
    }
}

impl From<SessionError> for EditorError {
    fn from(e: SessionError) -> Self {
        EditorError::Session(e)
    }
}

pub struct Editor {
    config: ConfigService,
    provider: Box<dyn FileProvider>,
    transforms: TransformRunner,
    registry: FileRegistry,
    views: Views,
    layout: Layout,
    home_vars: HomeVars,
    cwd: PathBuf,
    queue: OwnerQueue<Editor>,
    watcher: Option<FileWatcherService>,
    messages: Vec<String>,
}

impl Editor {
    pub fn new(config: ConfigService) -> Self {
        Self::with_provider(config, Box::new(LocalFileProvider::new()))
    }

    pub fn with_provider(config: ConfigService, provider: Box<dyn FileProvider>) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self {
            config,
            provider,
            transforms: TransformRunner::new(),
            registry: FileRegistry::new(),
            views: Views::with_key(),
            layout: Layout::new(),
            home_vars: HomeVars::new(home_dir()),
            cwd,
            queue: OwnerQueue::new(),
            watcher: None,
            messages: Vec::new(),
        }
    }

    /// 开启磁盘监听；之后打开的文件会被自动关注
    pub fn enable_watcher(&mut self) -> Result<(), notify::Error> {
        let mut watcher = FileWatcherService::new()?;
        let names: Vec<String> = self
            .registry
            .names()
            .into_iter()
            .filter(|n| !super::file_info::is_special_name(n))
            .collect();
        watcher.sync_open_paths(names.iter().map(Path::new));
        self.watcher = Some(watcher);
        Ok(())
    }

    // ==================== 访问 ====================

    pub fn config(&self) -> &ConfigService {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        self.config.settings()
    }

    pub fn provider(&self) -> &dyn FileProvider {
        self.provider.as_ref()
    }

    pub fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut Layout {
        &mut self.layout
    }

    pub fn views(&self) -> &Views {
        &self.views
    }

    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(id)
    }

    /// 用于光标、滚动、地址栏等；内容编辑请走 `edit`
    pub fn view_mut(&mut self, id: ViewId) -> Option<&mut View> {
        self.views.get_mut(id)
    }

    pub fn home_vars(&self) -> &HomeVars {
        &self.home_vars
    }

    pub fn set_home_vars(&mut self, home_vars: HomeVars) {
        self.home_vars = home_vars;
    }

    pub fn set_cwd(&mut self, cwd: PathBuf) {
        self.cwd = cwd;
    }

    pub fn sessions_path(&self) -> Result<PathBuf, SessionError> {
        self.config
            .sessions_path()
            .ok_or(SessionError::NoSessionsFile)
    }

    // ==================== 消息 ====================

    /// 向用户报告错误并记录日志
    pub fn error(&mut self, err: impl std::fmt::Display) {
        let msg = err.to_string();
        tracing::error!(error = %msg, "editor error");
        self.messages.push(msg);
    }

    pub fn message(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::info!(message = %msg, "editor message");
        self.messages.push(msg);
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn take_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }

    // ==================== owner 线程 ====================

    pub fn handle(&self) -> EditorHandle {
        self.queue.handle()
    }

    /// 执行其它线程投递的任务，返回执行数量
    pub fn run_pending(&mut self) -> usize {
        let tasks = self.queue.drain();
        let n = tasks.len();
        for task in tasks {
            task(self);
        }
        n
    }

    // ==================== 布局 ====================

    pub fn new_column(&mut self) -> usize {
        self.layout.new_column()
    }

    fn target_column(&mut self, col: Option<usize>) -> usize {
        let len = self.layout.columns().len();
        match col {
            Some(c) if c < len => c,
            _ if len == 0 => self.layout.new_column(),
            _ => len - 1,
        }
    }

    /// 展开 `~` 并规范化为注册表使用的名字
    pub fn resolve_name(&self, name: &str) -> String {
        normalize_name(&self.home_vars.decode(name), &self.cwd)
    }

    pub fn find_row(&self, name: &str) -> Option<ViewId> {
        let name = self.resolve_name(name);
        self.registry.get(&name)?.first_view()
    }

    /// 同一文件的所有行，按界面顺序
    pub fn rows_of(&self, name: &str) -> Vec<ViewId> {
        let name = self.resolve_name(name);
        self.registry
            .get(&name)
            .map(|info| info.views_in_ui_order(&self.layout))
            .unwrap_or_default()
    }

    fn create_view(&mut self, name: &str, col: Option<usize>) -> ViewId {
        let col = self.target_column(col);
        let toolbar = format!(
            "{}{}",
            escape_arg(&self.home_vars.encode(name)),
            DEFAULT_TOOLBAR_SUFFIX
        );
        let id = self
            .views
            .insert(View::new(name, &toolbar, self.config.settings()));
        self.layout.insert_row(col, None, id);
        self.registry
            .get_or_insert(name, self.provider.as_ref())
            .add_view(id);
        id
    }

    fn load_view(&mut self, id: ViewId, name: &str) -> Result<(), FileError> {
        let Some(info) = self.registry.get_mut(name) else {
            return Ok(());
        };
        let result = info.load_view(id, self.provider.as_ref(), &mut self.views);
        info.update_exists_state(&mut self.views);
        info.update_duplicate_state(&mut self.views);
        info.update_duplicate_highlight_state(&mut self.views);
        result
    }

    /// 打开一行；加载失败时不保留该行
    pub fn open_row(&mut self, name: &str, col: Option<usize>) -> Result<ViewId, EditorError> {
        let name = self.resolve_name(name);
        let id = self.create_view(&name, col);
        if let Err(e) = self.load_view(id, &name) {
            self.close_row(id);
            return Err(e.into());
        }
        self.watch(&name);
        tracing::debug!(name = %name, "row opened");
        Ok(id)
    }

    /// 打开一行；加载失败时仍保留空行，并返回错误供报告
    pub fn open_row_create_on_err(
        &mut self,
        name: &str,
        col: Option<usize>,
    ) -> (ViewId, Option<EditorError>) {
        let name = self.resolve_name(name);
        let id = self.create_view(&name, col);
        let err = self.load_view(id, &name).err().map(EditorError::from);
        self.watch(&name);
        (id, err)
    }

    pub fn existing_or_new_row(&mut self, name: &str) -> Result<ViewId, EditorError> {
        match self.find_row(name) {
            Some(id) => Ok(id),
            None => self.open_row(name, None),
        }
    }

    pub fn close_row(&mut self, id: ViewId) -> bool {
        let Some(name) = self.views.get(id).map(|v| v.name().to_string()) else {
            return false;
        };
        self.layout.remove_row(id);
        if let Some(info) = self.registry.get_mut(&name) {
            info.remove_view(id);
        }
        self.views.remove(id);
        if let Some(info) = self.registry.get(&name) {
            info.update_duplicate_state(&mut self.views);
            info.update_duplicate_highlight_state(&mut self.views);
        }
        if self.registry.remove_if_unused(&name) {
            self.unwatch(&name);
        }
        true
    }

    pub fn close_column(&mut self, col: usize) {
        for id in self.layout.close_column(col) {
            self.close_row(id);
        }
    }

    pub fn clear_layout(&mut self) {
        for id in self.layout.clear() {
            self.close_row(id);
        }
    }

    pub fn set_highlight_duplicates(&mut self, id: ViewId, on: bool) {
        let Some(view) = self.views.get_mut(id) else {
            return;
        };
        view.set_highlight_duplicates(on);
        let name = view.name().to_string();
        if let Some(info) = self.registry.get(&name) {
            info.update_duplicate_highlight_state(&mut self.views);
        }
    }

    pub fn row_has_state(&self, id: ViewId, state: RowState) -> bool {
        self.views.get(id).is_some_and(|v| v.has_state(state))
    }

    // ==================== 编辑 ====================

    /// 在内容区上执行 f，之后同步重复视图并刷新 Edited
    pub fn edit<R>(&mut self, id: ViewId, f: impl FnOnce(&mut TextEdit) -> R) -> Option<R> {
        let view = self.views.get_mut(id)?;
        let result = f(&mut view.text_area);
        self.dispatch_changes(id);
        Some(result)
    }

    fn dispatch_changes(&mut self, id: ViewId) {
        let Some(view) = self.views.get_mut(id) else {
            return;
        };
        if !view.text_area.take_changed() {
            return;
        }
        let name = view.name().to_string();
        if let Some(info) = self.registry.get(&name) {
            info.on_view_changed(id, &mut self.views);
        }
    }

    pub fn undo(&mut self, id: ViewId) -> Result<bool, EditorError> {
        let done = self.edit(id, |ta| ta.undo()).ok_or(EditorError::RowNotFound)??;
        Ok(done)
    }

    pub fn redo(&mut self, id: ViewId) -> Result<bool, EditorError> {
        let done = self.edit(id, |ta| ta.redo()).ok_or(EditorError::RowNotFound)??;
        Ok(done)
    }

    // ==================== 文件 ====================

    fn info_name(&self, id: ViewId) -> Result<String, EditorError> {
        self.views
            .get(id)
            .map(|v| v.name().to_string())
            .ok_or(EditorError::RowNotFound)
    }

    pub fn save_row(&mut self, id: ViewId) -> Result<(), EditorError> {
        let name = self.info_name(id)?;
        let info = self
            .registry
            .get_mut(&name)
            .ok_or(EditorError::RowNotFound)?;
        let settings = self.config.settings();
        let transforms = &mut self.transforms;
        info.save_file(self.provider.as_ref(), &mut self.views, |path, bytes| {
            transforms.apply(settings, path, bytes)
        })?;
        tracing::info!(path = %name, "file saved");
        Ok(())
    }

    /// 保存所有文件；错误逐个报告，返回成功数量
    pub fn save_all(&mut self) -> usize {
        let targets: Vec<ViewId> = self
            .registry
            .iter()
            .filter(|info| info.kind() == Some(InfoKind::File))
            .filter_map(|info| info.first_view())
            .collect();

        let mut saved = 0;
        for id in targets {
            match self.save_row(id) {
                Ok(()) => saved += 1,
                Err(e) => self.error(e),
            }
        }
        saved
    }

    pub fn reload_row(&mut self, id: ViewId) -> Result<(), EditorError> {
        let name = self.info_name(id)?;
        let info = self
            .registry
            .get_mut(&name)
            .ok_or(EditorError::RowNotFound)?;
        let provider = self.provider.as_ref();
        match info.kind() {
            Some(InfoKind::File) => info.reload_file(provider, &mut self.views)?,
            Some(InfoKind::Directory) => info.reload_dir(id, provider, &mut self.views)?,
            Some(InfoKind::Special) => {}
            None => {
                let err = info
                    .stat_error()
                    .unwrap_or_else(|| FileError::NotFound(PathBuf::from(&name)));
                return Err(err.into());
            }
        }
        Ok(())
    }

    /// 磁盘上 path 发生变化：刷新 stat 与磁盘哈希，目录行重新列出
    pub fn handle_disk_event(&mut self, path: &Path) {
        let name = path.to_string_lossy().to_string();
        let Some(info) = self.registry.get_mut(&name) else {
            return;
        };
        let provider = self.provider.as_ref();
        info.update_disk_event(provider, &mut self.views);

        let mut errors = Vec::new();
        if info.is_dir() {
            for id in info.views().to_vec() {
                if let Err(e) = info.reload_dir(id, provider, &mut self.views) {
                    errors.push(e);
                }
            }
        }
        for e in errors {
            self.error(e);
        }
    }

    /// 处理监听器积累的事件，返回处理的路径数量
    pub fn poll_disk_events(&mut self) -> usize {
        let Some(watcher) = self.watcher.as_mut() else {
            return 0;
        };
        let paths = watcher.drain_events();
        for path in &paths {
            self.handle_disk_event(path);
        }
        paths.len()
    }

    fn watch(&mut self, name: &str) {
        if super::file_info::is_special_name(name) {
            return;
        }
        let Some(watcher) = self.watcher.as_mut() else {
            return;
        };
        if let Err(e) = watcher.watch_path(Path::new(name)) {
            tracing::warn!(path = %name, error = %e, "failed to watch path");
        }
    }

    fn unwatch(&mut self, name: &str) {
        if let Some(watcher) = self.watcher.as_mut() {
            watcher.unwatch_path(Path::new(name));
        }
    }

    // ==================== 闪烁 ====================

    pub fn flash_line(&mut self, id: ViewId, index: usize) {
        if let Some(view) = self.views.get_mut(id) {
            view.text_area.flash_line(index);
        }
    }

    pub fn flash_index_len(&mut self, id: ViewId, index: usize, len: usize) {
        if let Some(view) = self.views.get_mut(id) {
            view.text_area.flash_index_len(index, len);
        }
    }

    /// 推进所有闪烁动画，返回是否仍有进行中的
    pub fn iterate_flash(&mut self, now: Instant) -> bool {
        let mut active = false;
        for (_, view) in self.views.iter_mut() {
            active |= view.toolbar.iterate_flash(now);
            active |= view.text_area.iterate_flash(now);
        }
        active
    }

    // ==================== 命令 ====================

    /// 执行一条地址栏命令（只取第一个 part），target 为命令作用的行
    pub fn run_command(&mut self, target: Option<ViewId>, text: &str) -> Result<(), EditorError> {
        let data = toolbar::parse(text);
        let Some(part) = data.parts.first() else {
            return Ok(());
        };
        let Some(cmd) = part.arg_value(0) else {
            return Ok(());
        };
        let arg1 = part.arg_value(1);
        let row = || target.ok_or(EditorError::NoActiveRow);

        tracing::debug!(command = %cmd, "run command");
        match cmd.as_str() {
            "Save" => self.save_row(row()?),
            "SaveAllFiles" => {
                self.save_all();
                Ok(())
            }
            "Reload" => self.reload_row(row()?),
            "Undo" => self.undo(row()?).map(|_| ()),
            "Redo" => self.redo(row()?).map(|_| ()),
            "Close" => {
                self.close_row(row()?);
                Ok(())
            }
            "NewColumn" => {
                self.new_column();
                Ok(())
            }
            "Open" => {
                let name = arg1.ok_or(EditorError::MissingArgument("Open"))?;
                match self.open_row_create_on_err(&name, None) {
                    (_, Some(e)) => Err(e),
                    (_, None) => Ok(()),
                }
            }
            "SaveSession" => {
                let name = arg1.ok_or(EditorError::MissingArgument("SaveSession"))?;
                self.save_session(&name)
            }
            "ListSessions" => self.list_sessions(),
            "OpenSession" => {
                let name = arg1.ok_or(EditorError::MissingArgument("OpenSession"))?;
                self.open_session(&name)
            }
            "DeleteSession" => {
                let name = arg1.ok_or(EditorError::MissingArgument("DeleteSession"))?;
                self.delete_session(&name)
            }
            _ => Err(EditorError::UnknownCommand(cmd.clone())),
        }
    }

    /// 执行行地址栏中 index 所在 part 的命令
    pub fn run_toolbar_part(&mut self, id: ViewId, index: usize) -> Result<(), EditorError> {
        let text = self
            .views
            .get(id)
            .ok_or(EditorError::RowNotFound)?
            .toolbar
            .text();
        let data = toolbar::parse(&text);
        let Some(part) = data.part_at_index(index) else {
            return Ok(());
        };
        // 第一个 part 是名字，不是命令
        if part.start == 0 {
            return Ok(());
        }
        let cmd = text[part.start..part.end].to_string();
        self.run_command(Some(id), &cmd)
    }
}

impl OwnerHandle<Editor> {
    /// 可从任意线程调用；实际修改在 owner 线程执行
    pub fn flash_line(&self, id: ViewId, index: usize) -> bool {
        self.run_on_owner(move |ed| ed.flash_line(id, index))
    }

    pub fn flash_index_len(&self, id: ViewId, index: usize, len: usize) -> bool {
        self.run_on_owner(move |ed| ed.flash_index_len(id, index, len))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/editor.rs"]
mod tests;
