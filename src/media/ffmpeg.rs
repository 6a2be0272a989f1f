use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::MediaError;

/// Limit on captured stderr in error messages. ffmpeg can be very chatty
/// when a filter graph is wrong; keep the tail, which carries the cause.
const STDERR_LIMIT: usize = 2048;

/// Check that the ffmpeg binary is reachable.
pub fn require_ffmpeg() -> Result<PathBuf, MediaError> {
    which::which("ffmpeg").map_err(|_| MediaError::ToolMissing)
}

/// Run one ffmpeg invocation to completion.
///
/// The process owns its source files only while it runs; once it exits,
/// no decoder or file handle stays open.
pub async fn run(args: Vec<String>) -> Result<(), MediaError> {
    debug!("running ffmpeg {}", args.join(" "));

    let output = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(MediaError::Spawn)?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    let tail = if stderr.len() > STDERR_LIMIT {
        let mut start = stderr.len() - STDERR_LIMIT;
        while !stderr.is_char_boundary(start) {
            start += 1;
        }
        &stderr[start..]
    } else {
        stderr
    };

    Err(MediaError::CommandFailed {
        status: output.status.code().unwrap_or(-1),
        stderr: tail.to_string(),
    })
}

/// Write an ffmpeg concat-demuxer list file.
///
/// Paths are single-quoted; embedded quotes use the demuxer's
/// close-escape-reopen convention.
pub fn write_concat_list(entries: &[PathBuf], list_path: &Path) -> std::io::Result<()> {
    let mut file = std::fs::File::create(list_path)?;
    for entry in entries {
        writeln!(file, "file '{}'", concat_escape(entry))?;
    }
    Ok(())
}

fn concat_escape(path: &Path) -> String {
    path.display().to_string().replace('\'', "'\\''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_escape_plain() {
        assert_eq!(concat_escape(Path::new("/tmp/a.mp4")), "/tmp/a.mp4");
    }

    #[test]
    fn test_concat_escape_quote() {
        assert_eq!(
            concat_escape(Path::new("/tmp/it's.mp4")),
            "/tmp/it'\\''s.mp4"
        );
    }

    #[test]
    fn test_write_concat_list() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("list.txt");
        let entries = vec![PathBuf::from("/tmp/a.mp4"), PathBuf::from("/tmp/b.mp4")];

        write_concat_list(&entries, &list).unwrap();

        let content = std::fs::read_to_string(&list).unwrap();
        assert_eq!(content, "file '/tmp/a.mp4'\nfile '/tmp/b.mp4'\n");
    }
}
