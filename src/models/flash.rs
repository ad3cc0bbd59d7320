//! 短暂高亮（闪烁）状态；由 owner 线程推进，过期后自动关闭

use super::decorations::Segment;
use std::time::{Duration, Instant};

pub const FLASH_DURATION: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct Flash {
    start: Instant,
    now: Instant,
    duration: Duration,
    segment: Option<Segment>,
    line: bool,
}

impl Flash {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            now,
            duration: FLASH_DURATION,
            segment: None,
            line: false,
        }
    }

    pub fn start(&mut self, segment: Segment, line: bool, now: Instant) {
        self.start = now;
        self.now = now;
        self.segment = Some(segment);
        self.line = line;
    }

    pub fn is_on(&self) -> bool {
        self.segment.is_some()
    }

    pub fn is_line(&self) -> bool {
        self.line && self.is_on()
    }

    pub fn segment(&self) -> Option<Segment> {
        self.segment
    }

    /// 推进动画时钟；返回 true 表示仍在闪烁、需要继续重绘
    pub fn iterate(&mut self, now: Instant) -> bool {
        if self.segment.is_none() {
            return false;
        }
        self.now = now;
        if now.saturating_duration_since(self.start) >= self.duration {
            self.segment = None;
            self.line = false;
            return false;
        }
        true
    }

    /// 剩余强度，1.0 刚开始，0.0 结束
    pub fn intensity(&self) -> f64 {
        if self.segment.is_none() {
            return 0.0;
        }
        let elapsed = self.now.saturating_duration_since(self.start);
        1.0 - (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }
}

impl Default for Flash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/flash.rs"]
mod tests;
