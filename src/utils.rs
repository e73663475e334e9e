//! Utility functions for output directories, image naming and process cleanup.
//!
//! This module provides helpers used around the extraction loop:
//! - Output directory preparation with a write probe
//! - Collision-free, timestamp-based image file names
//! - Best-effort termination of spreadsheet applications holding the workbook
//! - String truncation for logging

use chrono::{DateTime, Duration, Local};
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tokio::process::Command;
use tracing::{info, instrument, warn};

/// `chrono` format of generated image names, e.g. `IMG_20240718_153012123456.jpg`.
pub const IMAGE_NAME_FORMAT: &str = "IMG_%Y%m%d_%H%M%S%6f.jpg";

/// Hands out unique, timestamp-based image file names for one run.
///
/// Names come from the local clock at microsecond precision. When the clock
/// has not advanced past the previously issued stamp, the stamp is bumped by
/// one microsecond, so names never repeat within a run.
#[derive(Debug, Default)]
pub struct ImageNamer {
    last: Option<DateTime<Local>>,
}

impl ImageNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for the next image, based on the current time.
    pub fn next_name(&mut self) -> String {
        self.name_at(Local::now())
    }

    /// Name for an image captured at `now`.
    pub fn name_at(&mut self, now: DateTime<Local>) -> String {
        let stamp = match self.last {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last = Some(stamp);
        stamp.format(IMAGE_NAME_FORMAT).to_string()
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes (backed off to a character boundary)
/// and suffixed with `"…(+N bytes)"`.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory (and parents) if needed, then creates and removes
/// a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or written to.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

/// Kill any running spreadsheet application so the workbook is not locked.
///
/// Best effort: failures are logged and otherwise ignored.
#[instrument(level = "info")]
pub async fn kill_spreadsheet_processes() {
    let (program, args): (&str, &[&str]) = if cfg!(windows) {
        ("taskkill", &["/F", "/IM", "EXCEL.EXE"][..])
    } else {
        ("pkill", &["-f", "Excel"][..])
    };

    match Command::new(program).args(args).output().await {
        Ok(output) => info!(
            program,
            code = ?output.status.code(),
            "Spreadsheet process cleanup finished"
        ),
        Err(e) => warn!(program, error = %e, "Spreadsheet process cleanup failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(h: u32, m: u32, s: u32, micros: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 7, 18, h, m, s)
            .unwrap()
            + Duration::microseconds(i64::from(micros))
    }

    #[test]
    fn test_image_name_format() {
        let mut namer = ImageNamer::new();
        assert_eq!(namer.name_at(at(15, 30, 12, 123_456)), "IMG_20240718_153012123456.jpg");
    }

    #[test]
    fn test_image_names_never_repeat() {
        let mut namer = ImageNamer::new();
        let t = at(15, 30, 12, 999_999);
        let a = namer.name_at(t);
        let b = namer.name_at(t);
        let c = namer.name_at(t - Duration::seconds(1));
        assert_eq!(a, "IMG_20240718_153012999999.jpg");
        assert_eq!(b, "IMG_20240718_153013000000.jpg");
        assert_eq!(c, "IMG_20240718_153013000001.jpg");
    }

    #[test]
    fn test_image_names_follow_clock() {
        let mut namer = ImageNamer::new();
        let first = namer.next_name();
        let second = namer.next_name();
        assert_ne!(first, second);
        assert!(second > first);
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_char_boundary() {
        assert_eq!(truncate_for_log("héllo", 2), "h…(+5 bytes)");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_nested() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("output").join("images");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());
    }
}
