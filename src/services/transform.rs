//! 保存前的外部格式化（goimports、rustfmt 等）
//!
//! 子进程在 tokio runtime 中运行并受超时约束；超时后子进程随 future
//! 一起被丢弃并杀掉。失败只记录日志，调用方继续使用原始内容。

use super::config::{Settings, TransformRule};
use super::runtime::build_runtime;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug)]
pub enum TransformError {
    Runtime(io::Error),
    Spawn { command: String, error: io::Error },
    Io(io::Error),
    Timeout(Duration),
    Failed { status: Option<i32>, stderr: String },
}

impl std::fmt::Display for TransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformError::Runtime(e) => write!(f, "runtime error: {}", e),
            TransformError::Spawn { command, error } => {
                write!(f, "failed to run {}: {}", command, error)
            }
            TransformError::Io(e) => write!(f, "IO error: {}", e),
            TransformError::Timeout(d) => write!(f, "timed out after {}ms", d.as_millis()),
            TransformError::Failed { status, stderr } => match status {
                Some(code) => write!(f, "exit status {}: {}", code, stderr.trim()),
                None => write!(f, "terminated by signal: {}", stderr.trim()),
            },
        }
    }
}

impl std::error::Error for TransformError {}

pub struct TransformRunner {
    runtime: Option<tokio::runtime::Runtime>,
}

impl TransformRunner {
    pub fn new() -> Self {
        Self { runtime: None }
    }

    fn runtime(&mut self) -> Result<&tokio::runtime::Runtime, TransformError> {
        if self.runtime.is_none() {
            self.runtime = Some(build_runtime().map_err(TransformError::Runtime)?);
        }
        match self.runtime.as_ref() {
            Some(rt) => Ok(rt),
            None => Err(TransformError::Runtime(io::Error::other("runtime unavailable"))),
        }
    }

    /// 在 dir 下运行 rule，输入写入 stdin，返回 stdout
    pub fn run(
        &mut self,
        rule: &TransformRule,
        dir: &Path,
        input: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, TransformError> {
        let runtime = self.runtime()?;
        let fut = run_command(rule.command.clone(), rule.args.clone(), dir, input.to_vec());
        runtime.block_on(async {
            tokio::time::timeout(timeout, fut)
                .await
                .map_err(|_| TransformError::Timeout(timeout))?
        })
    }

    /// 尽力而为：没有匹配的规则或执行失败时返回 None
    pub fn apply(&mut self, settings: &Settings, path: &Path, input: &[u8]) -> Option<Vec<u8>> {
        let rule = settings.transform_for(path)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        match self.run(rule, dir, input, settings.transform_timeout()) {
            Ok(output) => Some(output),
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    command = %rule.command,
                    error = %e,
                    "pre-save transform failed, keeping original content"
                );
                None
            }
        }
    }
}

impl Default for TransformRunner {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_command(
    command: String,
    args: Vec<String>,
    dir: &Path,
    input: Vec<u8>,
) -> Result<Vec<u8>, TransformError> {
    let mut child = Command::new(&command)
        .args(&args)
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|error| TransformError::Spawn { command, error })?;

    // 单独的任务写 stdin，避免 stdout 管道写满时互相等待
    let stdin = child.stdin.take();
    let writer = tokio::spawn(async move {
        if let Some(mut stdin) = stdin {
            stdin.write_all(&input).await?;
            stdin.shutdown().await?;
        }
        Ok::<_, io::Error>(())
    });

    let output = child.wait_with_output().await.map_err(TransformError::Io)?;
    if let Ok(Err(e)) = writer.await {
        if e.kind() != io::ErrorKind::BrokenPipe {
            return Err(TransformError::Io(e));
        }
    }

    if !output.status.success() {
        return Err(TransformError::Failed {
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(output.stdout)
}

#[cfg(test)]
#[path = "../../tests/unit/services/transform.rs"]
mod tests;
