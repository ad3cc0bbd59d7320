//! 文件身份（ERowInfo）
//!
//! 每个文件路径或特殊名字（以 `+` 开头）对应一个 FileInfo，管理它的所有视图：
//! - stat 结果与错误
//! - 已保存哈希（saved）与磁盘哈希（fs），用于 Edited / FsDiffer 状态
//! - 重复视图之间的内容镜像，镜像期间通过 `MirrorGuard` 防止重入

use super::layout::Layout;
use super::view::{RowState, ViewId, Views};
use crate::services::{FileError, FileMetadata, FileProvider};
use sha2::{Digest, Sha256};
use std::cell::Cell;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const SPECIAL_PREFIX: char = '+';

pub type ContentHash = [u8; 32];

pub fn content_hash(bytes: &[u8]) -> ContentHash {
    Sha256::digest(bytes).into()
}

pub fn is_special_name(name: &str) -> bool {
    name.starts_with(SPECIAL_PREFIX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoKind {
    Special,
    Directory,
    File,
}

#[derive(Debug, Clone, Default)]
struct SavedHash {
    size: usize,
    hash: Option<ContentHash>,
}

#[derive(Debug, Clone, Default)]
struct FsHash {
    modified: Option<SystemTime>,
    hash: Option<ContentHash>,
}

#[derive(Debug, Clone)]
struct StatError {
    kind: io::ErrorKind,
    message: String,
}

/// 镜像期间持有；Drop 时复位标记
pub struct MirrorGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> MirrorGuard<'a> {
    /// 已在镜像中时返回 None
    pub fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        Some(Self { flag })
    }
}

impl Drop for MirrorGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

pub struct FileInfo {
    name: String,
    views: Vec<ViewId>,
    stat: Option<FileMetadata>,
    stat_error: Option<StatError>,
    saved: SavedHash,
    fs: FsHash,
    /// 最近一次读到的磁盘内容不是 UTF-8，行内容未载入
    undecodable: bool,
    mirroring: Cell<bool>,
}

impl FileInfo {
    /// 只应由 FileRegistry 创建，保证同名只有一个实例
    pub(super) fn new(name: &str, provider: &dyn FileProvider) -> Self {
        let mut info = Self {
            name: name.to_string(),
            views: Vec::new(),
            stat: None,
            stat_error: None,
            saved: SavedHash::default(),
            fs: FsHash::default(),
            undecodable: false,
            mirroring: Cell::new(false),
        };
        info.read_file_info(provider);
        info
    }

    /// 刷新 stat；失败时保留旧结果，以便仍能区分文件/目录
    fn read_file_info(&mut self, provider: &dyn FileProvider) {
        if self.is_special() {
            return;
        }
        match provider.metadata(Path::new(&self.name)) {
            Ok(meta) => {
                self.stat = Some(meta);
                self.stat_error = None;
            }
            Err(e) => {
                let kind = match &e {
                    FileError::NotFound(_) => io::ErrorKind::NotFound,
                    FileError::PermissionDenied(_) => io::ErrorKind::PermissionDenied,
                    FileError::Io(io) => io.kind(),
                    _ => io::ErrorKind::Other,
                };
                self.stat_error = Some(StatError {
                    kind,
                    message: e.to_string(),
                });
            }
        }
    }

    // ==================== 查询 ====================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.name)
    }

    pub fn is_special(&self) -> bool {
        is_special_name(&self.name)
    }

    pub fn has_stat(&self) -> bool {
        self.stat.is_some()
    }

    pub fn is_file(&self) -> bool {
        self.stat.is_some_and(|m| !m.is_dir)
    }

    pub fn is_dir(&self) -> bool {
        self.stat.is_some_and(|m| m.is_dir)
    }

    pub fn is_not_exist(&self) -> bool {
        self.stat_error
            .as_ref()
            .is_some_and(|e| e.kind == io::ErrorKind::NotFound)
    }

    pub fn kind(&self) -> Option<InfoKind> {
        if self.is_special() {
            Some(InfoKind::Special)
        } else if self.is_dir() {
            Some(InfoKind::Directory)
        } else if self.is_file() {
            Some(InfoKind::File)
        } else {
            None
        }
    }

    /// 最近一次 stat 的错误，重建为 FileError
    pub fn stat_error(&self) -> Option<FileError> {
        let e = self.stat_error.as_ref()?;
        let path = PathBuf::from(&self.name);
        Some(match e.kind {
            io::ErrorKind::NotFound => FileError::NotFound(path),
            io::ErrorKind::PermissionDenied => FileError::PermissionDenied(path),
            kind => FileError::Io(io::Error::new(kind, e.message.clone())),
        })
    }

    /// 目录行返回自身，文件返回所在目录，特殊行没有目录
    pub fn dir(&self) -> Option<PathBuf> {
        if self.is_special() {
            return None;
        }
        if self.is_dir() {
            return Some(PathBuf::from(&self.name));
        }
        self.path().parent().map(Path::to_path_buf)
    }

    // ==================== 视图 ====================

    pub fn views(&self) -> &[ViewId] {
        &self.views
    }

    pub fn first_view(&self) -> Option<ViewId> {
        self.views.first().copied()
    }

    pub fn add_view(&mut self, id: ViewId) {
        if self.views.contains(&id) {
            panic!("adding same view twice: {}", self.name);
        }
        self.views.push(id);
    }

    pub fn remove_view(&mut self, id: ViewId) {
        let Some(i) = self.views.iter().position(|v| *v == id) else {
            panic!("view not found: {}", self.name);
        };
        self.views.remove(i);
    }

    pub fn views_in_ui_order(&self, layout: &Layout) -> Vec<ViewId> {
        let ordered: Vec<ViewId> = layout
            .views_in_order()
            .into_iter()
            .filter(|id| self.views.contains(id))
            .collect();
        if ordered.len() != self.views.len() {
            panic!("not all views were found in layout: {}", self.name);
        }
        ordered
    }

    // ==================== 哈希 ====================

    fn set_saved_hash(&mut self, hash: Option<ContentHash>, size: usize, views: &mut Views) {
        self.saved = SavedHash { size, hash };
        self.update_fs_differ_state(views);
    }

    fn set_fs_hash(&mut self, hash: ContentHash, views: &mut Views) {
        let Some(meta) = self.stat else {
            return;
        };
        self.fs = FsHash {
            modified: meta.modified,
            hash: Some(hash),
        };
        self.update_fs_differ_state(views);
    }

    /// 只有 mtime 变化时才重新读取并计算磁盘哈希
    fn update_fs_hash_if_needed(&mut self, provider: &dyn FileProvider, views: &mut Views) {
        if !self.is_file() {
            return;
        }
        let Some(meta) = self.stat else {
            return;
        };
        if meta.modified != self.fs.modified {
            if let Err(e) = self.read_fs_file(provider, views) {
                tracing::debug!(path = %self.name, error = %e, "re-hash after disk event failed");
            }
        }
    }

    fn read_fs_file(
        &mut self,
        provider: &dyn FileProvider,
        views: &mut Views,
    ) -> Result<Vec<u8>, FileError> {
        let bytes = provider.read_file_bytes(self.path())?;
        let hash = content_hash(&bytes);
        self.read_file_info(provider);
        self.update_exists_state(views);
        self.set_fs_hash(hash, views);
        Ok(bytes)
    }

    fn save_fs_file(
        &mut self,
        provider: &dyn FileProvider,
        views: &mut Views,
        bytes: &[u8],
    ) -> Result<(), FileError> {
        provider.save_file_bytes(self.path(), bytes)?;

        let hash = content_hash(bytes);
        self.read_file_info(provider);
        self.update_exists_state(views);
        self.set_fs_hash(hash, views);
        self.set_saved_hash(Some(hash), bytes.len(), views);
        Ok(())
    }

    // ==================== 加载 / 保存 ====================

    /// 为刚注册的视图填充内容；文件已有其它视图时从第一个视图复制
    pub fn load_view(
        &mut self,
        id: ViewId,
        provider: &dyn FileProvider,
        views: &mut Views,
    ) -> Result<(), FileError> {
        match self.kind() {
            Some(InfoKind::Special) => Ok(()),
            Some(InfoKind::Directory) => self.reload_dir(id, provider, views),
            Some(InfoKind::File) => self.load_file_view(id, provider, views),
            None => Err(self
                .stat_error()
                .unwrap_or_else(|| FileError::NotFound(PathBuf::from(&self.name)))),
        }
    }

    fn load_file_view(
        &mut self,
        id: ViewId,
        provider: &dyn FileProvider,
        views: &mut Views,
    ) -> Result<(), FileError> {
        // 已有视图时从第一个视图复制内容并共享历史
        if let Some(master) = self.views.iter().copied().find(|v| *v != id) {
            self.on_view_changed(master, views);
            return Ok(());
        }

        let bytes = self.read_fs_file(provider, views)?;
        let text = self.decode(bytes)?;
        self.set_saved_hash(self.fs.hash, text.len(), views);
        if let Some(view) = views.get_mut(id) {
            view.text_area.set_text_clear_history(&text);
            view.text_area.take_changed();
        }
        self.update_edited_state(views);
        Ok(())
    }

    /// 目录行：每行一个条目，子目录带 `/` 后缀
    pub fn reload_dir(
        &mut self,
        id: ViewId,
        provider: &dyn FileProvider,
        views: &mut Views,
    ) -> Result<(), FileError> {
        if !self.is_dir() {
            return Err(FileError::NotADirectory(PathBuf::from(&self.name)));
        }
        let entries = provider.read_dir(self.path())?;
        let listing: String = entries
            .iter()
            .map(|e| format!("{}\n", e.display_name()))
            .collect();

        if let Some(view) = views.get_mut(id) {
            let ta = &mut view.text_area;
            let (index, offset) = (ta.cursor().index(), ta.offset_index());
            ta.set_text_clear_history(&listing);
            ta.set_cursor_index(index);
            ta.set_offset_index(offset);
            ta.take_changed();
        }
        Ok(())
    }

    pub fn reload_file(
        &mut self,
        provider: &dyn FileProvider,
        views: &mut Views,
    ) -> Result<(), FileError> {
        let bytes = self.read_fs_file(provider, views)?;
        let text = self.decode(bytes)?;
        self.set_saved_hash(self.fs.hash, text.len(), views);
        self.set_rows_text(&text, views);
        Ok(())
    }

    /// 缓冲区只保存 UTF-8 文本；解码失败时记下，之后拒绝用行内容覆盖磁盘文件
    fn decode(&mut self, bytes: Vec<u8>) -> Result<String, FileError> {
        match String::from_utf8(bytes) {
            Ok(text) => {
                self.undecodable = false;
                Ok(text)
            }
            Err(_) => {
                self.undecodable = true;
                tracing::warn!(path = %self.name, "file content is not valid UTF-8");
                Err(FileError::InvalidUtf8(PathBuf::from(&self.name)))
            }
        }
    }

    pub fn is_undecodable(&self) -> bool {
        self.undecodable
    }

    /// 取第一个视图的内容，经 transform（可选）后写盘，再同步到所有视图。
    /// 没有视图时什么都不做；写盘失败时内存状态不变。
    /// transform 输出不是 UTF-8 时按失败处理，保存原内容。
    pub fn save_file(
        &mut self,
        provider: &dyn FileProvider,
        views: &mut Views,
        transform: impl FnOnce(&Path, &[u8]) -> Option<Vec<u8>>,
    ) -> Result<(), FileError> {
        let Some(first) = self.first_view() else {
            return Ok(());
        };
        if !self.is_file() {
            return Err(FileError::NotAFile(PathBuf::from(&self.name)));
        }
        if self.undecodable {
            return Err(FileError::InvalidUtf8(PathBuf::from(&self.name)));
        }
        let Some(view) = views.get(first) else {
            return Ok(());
        };

        let text = view.text_area.text();
        let text = transform(self.path(), text.as_bytes())
            .and_then(|out| String::from_utf8(out).ok())
            .unwrap_or(text);

        self.save_fs_file(provider, views, text.as_bytes())?;
        self.set_rows_text(&text, views);
        Ok(())
    }

    /// 磁盘事件：刷新 stat，文件 mtime 变化时重新计算磁盘哈希。Edited 不受影响。
    pub fn update_disk_event(&mut self, provider: &dyn FileProvider, views: &mut Views) {
        self.read_file_info(provider);
        self.update_exists_state(views);
        if self.is_file() {
            self.update_fs_hash_if_needed(provider, views);
        }
    }

    // ==================== 内容同步 ====================

    /// 以可撤销的方式写入第一个视图，然后镜像到其它视图
    pub fn set_rows_text(&self, text: &str, views: &mut Views) {
        if !self.is_file() {
            return;
        }
        let Some(first) = self.first_view() else {
            return;
        };
        if let Some(view) = views.get_mut(first) {
            if let Err(e) = view.text_area.set_text(text) {
                tracing::error!(path = %self.name, error = %e, "failed to set row content");
            }
        }
        self.on_view_changed(first, views);
    }

    /// source 的内容变化后调用：复制到其它视图并重算 Edited。
    /// 镜像过程中的再次调用直接返回。
    pub fn on_view_changed(&self, source: ViewId, views: &mut Views) {
        let Some(_guard) = MirrorGuard::acquire(&self.mirroring) else {
            return;
        };

        if self.is_file() {
            if let Some((buffer, history)) = views
                .get(source)
                .map(|v| (v.text_area.buffer().clone(), v.text_area.history()))
            {
                for id in self.views.iter().copied().filter(|id| *id != source) {
                    if let Some(view) = views.get_mut(id) {
                        view.text_area.mirror(buffer.clone(), history.clone());
                    }
                }
            }
        }
        for id in &self.views {
            if let Some(view) = views.get_mut(*id) {
                view.text_area.take_changed();
            }
        }

        self.update_edited_state(views);
    }

    // ==================== 行状态 ====================

    fn update_row_state(&self, state: RowState, on: bool, views: &mut Views) {
        for id in &self.views {
            if let Some(view) = views.get_mut(*id) {
                view.set_state(state, on);
            }
        }
    }

    /// 先比较长度，长度相同再比较哈希
    pub fn update_edited_state(&self, views: &mut Views) {
        if !self.is_file() {
            return;
        }
        let Some(bytes) = self
            .first_view()
            .and_then(|id| views.get(id))
            .map(|v| v.text_area.bytes())
        else {
            return;
        };
        let edited = if bytes.len() != self.saved.size {
            true
        } else {
            Some(content_hash(&bytes)) != self.saved.hash
        };
        self.update_row_state(RowState::Edited, edited, views);
    }

    pub fn update_exists_state(&self, views: &mut Views) {
        self.update_row_state(RowState::NotExist, self.is_not_exist(), views);
    }

    pub fn update_fs_differ_state(&self, views: &mut Views) {
        if !self.is_file() {
            return;
        }
        let differ = self.fs.hash != self.saved.hash;
        self.update_row_state(RowState::FsDiffer, differ, views);
    }

    pub fn update_duplicate_state(&self, views: &mut Views) {
        let has_dups = self.views.len() >= 2;
        self.update_row_state(RowState::Duplicate, has_dups, views);
    }

    pub fn update_duplicate_highlight_state(&self, views: &mut Views) {
        let on = self
            .views
            .iter()
            .filter_map(|id| views.get(*id))
            .any(|v| v.highlight_duplicates());
        let has_dups = self.views.len() >= 2;
        self.update_row_state(RowState::DuplicateHighlight, has_dups && on, views);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/file_info.rs"]
mod tests;
