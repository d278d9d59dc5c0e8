const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Render a byte count in binary units with two decimals, e.g. `1.50MB`.
///
/// Stops at TB, so very large values print as e.g. `2048.00TB`.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;

    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.2}{}", size, UNITS[unit])
}
