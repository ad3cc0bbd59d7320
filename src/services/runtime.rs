//! 运行时：owner 线程任务队列 + tokio runtime 构建
//!
//! 编辑器状态只在 owner 线程上修改；其它线程通过 `OwnerHandle`
//! 投递闭包，由 owner 在 `drain` 时依次执行。

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};

pub type OwnerTask<T> = Box<dyn FnOnce(&mut T) + Send>;

pub struct OwnerQueue<T> {
    tx: Sender<OwnerTask<T>>,
    rx: Receiver<OwnerTask<T>>,
}

impl<T> OwnerQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn handle(&self) -> OwnerHandle<T> {
        OwnerHandle {
            tx: self.tx.clone(),
        }
    }

    /// 取出当前排队的全部任务；执行中新投递的任务留到下一轮
    pub fn drain(&self) -> Vec<OwnerTask<T>> {
        self.rx.try_iter().collect()
    }
}

impl<T> Default for OwnerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct OwnerHandle<T> {
    tx: Sender<OwnerTask<T>>,
}

impl<T> OwnerHandle<T> {
    /// owner 已经退出时返回 false
    pub fn run_on_owner(&self, f: impl FnOnce(&mut T) + Send + 'static) -> bool {
        self.tx.send(Box::new(f)).is_ok()
    }
}

impl<T> Clone for OwnerHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

/// 多线程 runtime，失败时退回 current-thread
pub fn build_runtime() -> io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .or_else(|e| {
            tracing::error!(
                error = %e,
                "Failed to create multi-thread tokio runtime, falling back to current-thread"
            );
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
        })
}

#[cfg(test)]
#[path = "../../tests/unit/services/runtime.rs"]
mod tests;
