//! Timestamped text logs of the delayed posts seen in a cycle.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{DelayError, Result};
use crate::post::Post;

/// `delays_<unix seconds>` inside `dir`.
pub fn log_file_path(dir: &Path, now: DateTime<Utc>) -> PathBuf {
    dir.join(format!("delays_{}", now.timestamp()))
}

pub fn render_delay_log(valid_count: usize, delayed: &[Post]) -> String {
    let mut out = format!(
        "Total tweets count: {}\nDelay tweets count: {}\n",
        valid_count,
        delayed.len()
    );
    for post in delayed {
        out.push_str(&post.text);
        out.push_str(" AT ");
        out.push_str(&post.created_at);
        out.push('\n');
    }
    out
}

/// Write the log for one cycle, creating `dir` if needed. Returns the file written.
pub async fn write_delay_log(
    dir: &Path,
    now: DateTime<Utc>,
    valid_count: usize,
    delayed: &[Post],
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DelayError::io(dir, e))?;

    let path = log_file_path(dir, now);
    info!(path = %path.display(), "writing delay log");
    tokio::fs::write(&path, render_delay_log(valid_count, delayed))
        .await
        .map_err(|e| DelayError::io(&path, e))?;
    Ok(path)
}
