//! 外部命令调用（blastn / usearch / gmap_build ...）
//!
//! All external primitives are synchronous: a nonzero exit status becomes
//! [`TrnaError::ExternalTool`] carrying the rendered command line.

use std::ffi::OsStr;
use std::fs::File;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use crate::error::{Result, TrnaError};

/// 把 Command 渲染成可读的命令行（仅用于日志与报错）
pub fn render(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(quote));
    parts.join(" ")
}

fn quote(arg: &OsStr) -> String {
    let s = arg.to_string_lossy();
    if s.contains(char::is_whitespace) {
        format!("'{}'", s)
    } else {
        s.into_owned()
    }
}

/// 运行命令并要求退出码为 0
pub fn run(cmd: &mut Command) -> Result<Output> {
    let rendered = render(cmd);
    log::debug!("running: {}", rendered);

    let output = cmd.output().map_err(|e| TrnaError::ExternalTool {
        command: rendered.clone(),
        code: None,
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(TrnaError::ExternalTool {
            command: rendered,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

/// 运行命令，stdout/stderr 追加写入日志文件，可选地把 `stdin` 文件作为输入
pub fn run_logged(cmd: &mut Command, log_path: &Path, stdin: Option<&Path>) -> Result<()> {
    let log = File::options()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| TrnaError::io(log_path, e))?;
    let log_err = log.try_clone().map_err(|e| TrnaError::io(log_path, e))?;
    cmd.stdout(Stdio::from(log)).stderr(Stdio::from(log_err));

    if let Some(input) = stdin {
        let fh = File::open(input).map_err(|e| TrnaError::io(input, e))?;
        cmd.stdin(Stdio::from(fh));
    }

    let rendered = render(cmd);
    log::debug!("running: {} (log: {})", rendered, log_path.display());

    let status = cmd.status().map_err(|e| TrnaError::ExternalTool {
        command: rendered.clone(),
        code: None,
        stderr: e.to_string(),
    })?;
    if !status.success() {
        return Err(TrnaError::ExternalTool {
            command: rendered,
            code: status.code(),
            stderr: format!("see {}", log_path.display()),
        });
    }
    Ok(())
}

/// 写一个可执行的 sh 脚本，用来在测试中替代外部工具
#[cfg(all(test, unix))]
pub(crate) fn write_stub_tool(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
