//! Utility functions for the CLI.

use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix given to compressed files.
pub const HUF_EXTENSION: &str = "huf";

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template(
        "[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
    ) {
        pb.set_style(style.progress_chars("█▓▒░ "));
    }
    pb
}

/// Output path for compressing `input`: `input` with `.huf` appended.
pub fn compressed_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".");
    name.push(HUF_EXTENSION);
    PathBuf::from(name)
}

/// Output path for decompressing `input`: the `.huf` suffix removed, or
/// `.out` appended when there is none.
pub fn decompressed_path(input: &Path) -> PathBuf {
    match input.extension() {
        Some(ext) if ext == HUF_EXTENSION => input.with_extension(""),
        _ => {
            let mut name = OsString::from(input.as_os_str());
            name.push(".out");
            PathBuf::from(name)
        }
    }
}

/// Refuse an output path that names the input file.
///
/// Creating the output truncates it, so writing over the input would destroy
/// the data before it is read.
pub fn ensure_distinct(input: &Path, output: &Path) -> Result<(), String> {
    let same = output == input
        || matches!(
            (fs::canonicalize(input), fs::canonicalize(output)),
            (Ok(a), Ok(b)) if a == b
        );
    if same {
        return Err(format!("refusing to overwrite input {}", input.display()));
    }
    Ok(())
}

/// Compressed size as a percentage saved, guarding empty inputs.
pub fn savings_percent(plaintext: u64, compressed: u64) -> f64 {
    if plaintext == 0 {
        return 0.0;
    }
    (1.0 - compressed as f64 / plaintext as f64) * 100.0
}
