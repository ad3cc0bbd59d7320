//! 磁盘变化监听
//!
//! 对每个打开文件的父目录做非递归监听（按引用计数共享），notify 的回调线程
//! 把原始事件送进 channel，由 owner 线程 `drain_events` 时归并成路径列表。

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

const WATCHER_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct FileWatcherService {
    watcher: RecommendedWatcher,
    raw_event_rx: mpsc::Receiver<notify::Event>,
    watched_dirs: FxHashMap<PathBuf, usize>,
    /// 打开的路径 → 打开时为它监听的目录
    open_paths: FxHashMap<PathBuf, Option<PathBuf>>,
}

impl FileWatcherService {
    pub fn new() -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                let Ok(event) = res else { return };
                let _ = tx.send(event);
            },
            Config::default().with_poll_interval(WATCHER_POLL_INTERVAL),
        )?;
        Ok(Self {
            watcher,
            raw_event_rx: rx,
            watched_dirs: FxHashMap::default(),
            open_paths: FxHashMap::default(),
        })
    }

    pub fn open_paths(&self) -> impl Iterator<Item = &Path> {
        self.open_paths.keys().map(PathBuf::as_path)
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.open_paths.contains_key(path)
    }

    /// 开始关注 path；目录本身也会被监听，用于刷新目录行
    pub fn watch_path(&mut self, path: &Path) -> Result<(), notify::Error> {
        if self.open_paths.contains_key(path) {
            return Ok(());
        }
        let Some(dir) = watch_dir_of(path) else {
            self.open_paths.insert(path.to_path_buf(), None);
            return Ok(());
        };
        let count = self.watched_dirs.entry(dir.clone()).or_insert(0);
        if *count == 0 {
            if let Err(e) = self.watcher.watch(&dir, RecursiveMode::NonRecursive) {
                self.watched_dirs.remove(&dir);
                return Err(e);
            }
        }
        *count += 1;
        self.open_paths.insert(path.to_path_buf(), Some(dir));
        Ok(())
    }

    /// 释放打开时记录的目录；不重新判断 path 的类型（它可能已被删除）
    pub fn unwatch_path(&mut self, path: &Path) {
        let Some(Some(dir)) = self.open_paths.remove(path) else {
            return;
        };
        let Some(count) = self.watched_dirs.get_mut(&dir) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.watched_dirs.remove(&dir);
            if let Err(e) = self.watcher.unwatch(&dir) {
                tracing::debug!(dir = %dir.display(), error = %e, "unwatch failed");
            }
        }
    }

    /// 与当前打开的路径集合对齐
    pub fn sync_open_paths<'a, I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let wanted: FxHashSet<PathBuf> = paths.into_iter().map(Path::to_path_buf).collect();
        let stale: Vec<PathBuf> = self
            .open_paths
            .keys()
            .filter(|p| !wanted.contains(*p))
            .cloned()
            .collect();
        for path in stale {
            self.unwatch_path(&path);
        }
        for path in wanted {
            if let Err(e) = self.watch_path(&path) {
                tracing::warn!(path = %path.display(), error = %e, "watch failed");
            }
        }
    }

    /// 归并自上次调用以来的事件，返回受影响的打开路径（已排序去重）
    pub fn drain_events(&mut self) -> Vec<PathBuf> {
        let mut changed = FxHashSet::default();
        while let Ok(event) = self.raw_event_rx.try_recv() {
            if !is_content_event(&event.kind) {
                continue;
            }
            for path in event.paths {
                if self.open_paths.contains_key(&path) {
                    changed.insert(path.clone());
                }
                // 目录行：子项的增删改都算目录变化
                if let Some(parent) = path.parent() {
                    if self.open_paths.contains_key(parent) {
                        changed.insert(parent.to_path_buf());
                    }
                }
            }
        }

        let mut changed: Vec<PathBuf> = changed.into_iter().collect();
        changed.sort_unstable();
        changed
    }
}

fn is_content_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(_) | EventKind::Any
    )
}

/// 文件监听其父目录（可感知删除后重建）；目录监听自身
fn watch_dir_of(path: &Path) -> Option<PathBuf> {
    if path.is_dir() {
        return Some(path.to_path_buf());
    }
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

#[cfg(test)]
#[path = "../../tests/unit/services/watcher.rs"]
mod tests;
