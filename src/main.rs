//! coledit 命令行：打开参数中的文件，从标准输入逐行读取命令。
//!
//! 命令形如 `Save`、`Open <name>`、`OpenSession <name>`；
//! 前缀 `@N ` 指定作用的行（按布局顺序，从 0 开始），默认是最后打开的行。
//! `Exit` 或 `Quit` 结束。

use std::io::{self, BufRead, Write};

use coledit::editor::{Editor, RowState, ViewId};
use coledit::services::ConfigService;

fn print_rows(ed: &Editor, out: &mut impl Write) -> io::Result<()> {
    for (i, id) in ed.layout().views_in_order().into_iter().enumerate() {
        let Some(view) = ed.view(id) else {
            continue;
        };
        let states: Vec<&str> = RowState::ALL
            .iter()
            .filter(|s| view.has_state(**s))
            .map(|s| s.label())
            .collect();
        writeln!(out, "@{} {} [{}]", i, view.name(), states.join(","))?;
    }
    Ok(())
}

/// 解析 `@N ` 前缀，返回 (行, 剩余命令)
fn split_target<'a>(
    ed: &Editor,
    line: &'a str,
    current: Option<ViewId>,
) -> (Option<ViewId>, &'a str) {
    let Some(rest) = line.strip_prefix('@') else {
        return (current, line);
    };
    let (num, cmd) = rest.split_once(' ').unwrap_or((rest, ""));
    match num.parse::<usize>() {
        Ok(n) => (ed.layout().views_in_order().get(n).copied(), cmd.trim_start()),
        Err(_) => (current, line),
    }
}

fn main() -> io::Result<()> {
    let _logging = coledit::logging::init(None);
    if let Err(e) = coledit::services::config::ensure_settings_file() {
        tracing::warn!(error = %e, "cannot create settings file");
    }

    let mut ed = Editor::new(ConfigService::load());
    if let Err(e) = ed.enable_watcher() {
        tracing::warn!(error = %e, "file watcher unavailable");
    }

    let mut current = None;
    for name in std::env::args().skip(1) {
        let (id, err) = ed.open_row_create_on_err(&name, None);
        if let Some(e) = err {
            ed.error(e);
        }
        current = Some(id);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_rows(&ed, &mut out)?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();

        ed.run_pending();
        ed.poll_disk_events();

        if line.is_empty() {
            continue;
        }
        if line == "Exit" || line == "Quit" {
            break;
        }

        let (target, cmd) = split_target(&ed, line, current);
        if let Err(e) = ed.run_command(target, cmd) {
            ed.error(e);
        }
        if current.is_some_and(|id| ed.view(id).is_none()) {
            current = ed.layout().views_in_order().last().copied();
        }
        if cmd.starts_with("Open") && !cmd.starts_with("OpenSession") {
            current = ed.layout().views_in_order().last().copied();
        }

        for msg in ed.take_messages() {
            eprintln!("{}", msg);
        }
        print_rows(&ed, &mut out)?;
    }

    tracing::info!("exit");
    Ok(())
}
