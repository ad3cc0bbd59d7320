//! FileInfo 注册表：名字 → FileInfo，同名只有一个实例

use super::file_info::{is_special_name, FileInfo};
use crate::services::FileProvider;
use rustc_hash::FxHashMap;
use std::path::{Component, Path, PathBuf};

#[derive(Default)]
pub struct FileRegistry {
    infos: FxHashMap<String, FileInfo>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FileInfo> {
        self.infos.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FileInfo> {
        self.infos.get_mut(name)
    }

    /// 已存在则复用，否则 stat 后新建
    pub fn get_or_insert(&mut self, name: &str, provider: &dyn FileProvider) -> &mut FileInfo {
        self.infos
            .entry(name.to_string())
            .or_insert_with(|| FileInfo::new(name, provider))
    }

    /// 没有视图的 FileInfo 被移除
    pub fn remove_if_unused(&mut self, name: &str) -> bool {
        if self.infos.get(name).is_some_and(|i| i.views().is_empty()) {
            self.infos.remove(name);
            return true;
        }
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileInfo> {
        self.infos.values()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.infos.keys().cloned().collect();
        names.sort();
        names
    }
}

/// 注册表使用的名字：特殊名字原样保留，路径转为绝对路径并做词法清理（不解析符号链接）
pub fn normalize_name(name: &str, cwd: &Path) -> String {
    if is_special_name(name) {
        return name.to_string();
    }
    let path = Path::new(name);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    clean_path(&joined).to_string_lossy().to_string()
}

fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    out.components().next_back(),
                    Some(Component::RootDir) | Some(Component::Prefix(_)) | None
                ) {
                    out.pop();
                }
            }
            c => out.push(c.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/editor/registry.rs"]
mod tests;
