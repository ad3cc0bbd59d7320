//! 地址栏解析
//!
//! 文本按 `|` 分成若干 part，每个 part 按空白分成 arg；引号（`"` `'` `` ` ``）
//! 内的内容与反斜杠转义的字符不参与切分。第一个 part 的第一个 arg 是行的名字。

use std::path::{Path, PathBuf};

const QUOTES: [char; 3] = ['"', '\'', '`'];
const ESCAPE: char = '\\';
const PART_SEP: char = '|';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub start: usize,
    pub end: usize,
    pub raw: String,
}

impl Arg {
    /// 去掉引号、解开转义后的值
    pub fn value(&self) -> String {
        let mut out = String::with_capacity(self.raw.len());
        let mut quote: Option<char> = None;
        let mut escaped = false;
        for c in self.raw.chars() {
            if escaped {
                out.push(c);
                escaped = false;
                continue;
            }
            match c {
                ESCAPE => escaped = true,
                c if quote == Some(c) => quote = None,
                c if quote.is_none() && QUOTES.contains(&c) => quote = Some(c),
                c => out.push(c),
            }
        }
        if escaped {
            out.push(ESCAPE);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub start: usize,
    pub end: usize,
    pub args: Vec<Arg>,
}

impl Part {
    pub fn arg_value(&self, i: usize) -> Option<String> {
        self.args.get(i).map(Arg::value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarData {
    pub text: String,
    pub parts: Vec<Part>,
}

impl ToolbarData {
    pub fn part0_arg0(&self) -> Option<&Arg> {
        self.parts.first()?.args.first()
    }

    /// 名字之后的剩余文本（含前导分隔符）
    pub fn after_name(&self) -> &str {
        match self.part0_arg0() {
            Some(arg) => &self.text[arg.end..],
            None => "",
        }
    }

    pub fn part_at_index(&self, index: usize) -> Option<&Part> {
        self.parts
            .iter()
            .find(|p| index >= p.start && index <= p.end)
    }
}

pub fn parse(text: &str) -> ToolbarData {
    let mut parts = Vec::new();
    let mut part_start = 0;
    scan(text, 0, text.len(), |i, c| {
        if c == PART_SEP {
            parts.push(parse_part(text, part_start, i));
            part_start = i + c.len_utf8();
        }
    });
    parts.push(parse_part(text, part_start, text.len()));
    ToolbarData {
        text: text.to_string(),
        parts,
    }
}

fn parse_part(text: &str, start: usize, end: usize) -> Part {
    let mut args = Vec::new();
    let mut arg_start: Option<usize> = None;
    let push_arg = |args: &mut Vec<Arg>, s: usize, e: usize| {
        args.push(Arg {
            start: s,
            end: e,
            raw: text[s..e].to_string(),
        });
    };

    // scan 只回调未被引号/转义保护的字符，其余字符视为 arg 内容
    let mut last = start;
    scan(text, start, end, |i, c| {
        if arg_start.is_none() && i > last {
            arg_start = Some(last);
        }
        if c.is_whitespace() {
            if let Some(s) = arg_start.take() {
                push_arg(&mut args, s, i);
            }
        } else if arg_start.is_none() {
            arg_start = Some(i);
        }
        last = i + c.len_utf8();
    });
    if arg_start.is_none() && end > last {
        arg_start = Some(last);
    }
    if let Some(s) = arg_start {
        push_arg(&mut args, s, end);
    }

    Part { start, end, args }
}

/// 遍历 [start, end) 中不在引号内、未被转义的字符
fn scan(text: &str, start: usize, end: usize, mut f: impl FnMut(usize, char)) {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text[start..end].char_indices() {
        let i = start + i;
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            ESCAPE => escaped = true,
            c if quote == Some(c) => quote = None,
            c if quote.is_none() && QUOTES.contains(&c) => quote = Some(c),
            c if quote.is_none() => f(i, c),
            _ => {}
        }
    }
}

/// 把名字写成单个 arg：空白、分隔符、引号和反斜杠加转义
pub fn escape_arg(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_whitespace() || c == PART_SEP || c == ESCAPE || QUOTES.contains(&c) {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out
}

/// `~` 与 home 目录之间的相互转换
#[derive(Debug, Clone, Default)]
pub struct HomeVars {
    home: Option<String>,
}

impl HomeVars {
    pub fn new(home: Option<PathBuf>) -> Self {
        let home = home
            .map(|h| h.to_string_lossy().trim_end_matches('/').to_string())
            .filter(|h| !h.is_empty());
        Self { home }
    }

    pub fn encode(&self, name: &str) -> String {
        let Some(home) = self.home.as_deref() else {
            return name.to_string();
        };
        if name == home {
            return "~".to_string();
        }
        match name.strip_prefix(home) {
            Some(rest) if rest.starts_with('/') => format!("~{}", rest),
            _ => name.to_string(),
        }
    }

    pub fn decode(&self, name: &str) -> String {
        let Some(home) = self.home.as_deref() else {
            return name.to_string();
        };
        if name == "~" {
            return home.to_string();
        }
        match name.strip_prefix("~/") {
            Some(rest) => Path::new(home).join(rest).to_string_lossy().to_string(),
            None => name.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/toolbar.rs"]
mod tests;
