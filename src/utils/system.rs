//! 系统交互：命令探测、编辑器、剪贴板

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;

use super::text::strip_comment_lines;

/// 命令是否存在于 PATH 中
pub fn is_command_available(command: &str) -> bool {
    which::which(command).is_ok()
}

/// 编辑器候选列表
fn editor_candidates() -> &'static [&'static str] {
    if cfg!(windows) {
        &["notepad"]
    } else {
        &["nvim", "vim", "vi", "nano"]
    }
}

/// 选择可用的文本编辑器
///
/// 优先使用 `EDITOR` 环境变量，否则从候选列表中选择第一个存在的命令。
pub fn available_editor() -> io::Result<String> {
    if let Ok(editor) = std::env::var("EDITOR") {
        if !editor.trim().is_empty() {
            return Ok(editor);
        }
    }

    editor_candidates()
        .iter()
        .find(|editor| is_command_available(editor))
        .map(|editor| editor.to_string())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "No text editor found. Please set the EDITOR environment variable.",
            )
        })
}

/// 打开编辑器编辑临时文件，返回去掉注释行后的内容
pub async fn open_editor_and_read(title: &str, prefix: &str) -> io::Result<String> {
    let file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".txt")
        .tempfile()?;
    let path: PathBuf = file.path().to_path_buf();

    let header = if title.is_empty() {
        String::new()
    } else {
        format!("# {}\n", title)
    };
    tokio::fs::write(&path, header).await?;

    let editor = available_editor()?;
    // EDITOR 可能带参数，例如 "code --wait"
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vi");

    let status = tokio::process::Command::new(program)
        .args(parts)
        .arg(&path)
        .status()
        .await?;

    if !status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} exited with {}", editor, status),
        ));
    }

    let content = tokio::fs::read_to_string(&path).await?;
    Ok(strip_comment_lines(&content))
}

fn clipboard_command() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        ("pbcopy", &[])
    } else if cfg!(windows) {
        ("clip", &[])
    } else {
        ("xclip", &["-selection", "clipboard"])
    }
}

/// 复制文本到系统剪贴板
pub async fn copy_to_clipboard(text: &str) -> io::Result<()> {
    let (program, args) = clipboard_command();
    pipe_to_command(program, args, text).await
}

/// 把文本写入子进程的标准输入并等待其退出
async fn pipe_to_command(program: &str, args: &[&str], text: &str) -> io::Result<()> {
    let mut child = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).await?;
    }

    let status = child.wait().await?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} exited with {}", program, status),
        ))
    }
}
