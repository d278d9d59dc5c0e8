use archivist_upload::{ProgressReporter, UploadResult};
use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};

/// Live "Uploading: N%" line, overwritten in place and erased when done
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let style = ProgressStyle::with_template("  Uploading: {pos}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        // Single puts never update the bar; dropping it must not leave a line behind
        let bar = ProgressBar::new(100)
            .with_style(style)
            .with_finish(ProgressFinish::AndClear);
        Self { bar }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn update(&self, percent: u8) {
        self.bar.set_position(u64::from(percent));
    }

    fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// `name  size  elapsed` in fixed columns
pub fn format_line(result: &UploadResult) -> String {
    format!(
        "{:<40}{:>12}{:>12.2}ms",
        result.file_name, result.size_display, result.elapsed_ms
    )
}

/// Console lines for one result, as `(stdout, stderr)`.
///
/// A file rejected before any transfer (missing, not a regular file) only
/// gets its error line.
pub fn console_lines(result: &UploadResult) -> (Vec<String>, Vec<String>) {
    if result.success {
        return (
            vec![format_line(result), "Upload successful!".to_string()],
            Vec::new(),
        );
    }

    let mut errors: Vec<String> = result.error.iter().cloned().collect();
    if result.strategy.is_some() {
        errors.push(format!("Failed to upload: {}", result.path.display()));
        errors.push("Upload failed!".to_string());
    }
    (Vec::new(), errors)
}

/// Print one result, as table lines or a JSON line on stdout
pub fn print_result(result: &UploadResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(result)?);
        return Ok(());
    }

    let (out, err) = console_lines(result);
    for line in out {
        println!("{}", line);
    }
    for line in err {
        eprintln!("{}", line);
    }
    Ok(())
}
