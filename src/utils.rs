use colored::Colorize;

/// Format satoshis with thousands separators
pub fn format_sats(sats: u64) -> String {
    let digits = sats.to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{} sats", grouped)
}

/// Format a duration limit for display
pub fn format_limit(limit: std::time::Duration) -> String {
    format!("{}s", limit.as_secs()).yellow().to_string()
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (i, col) in columns.iter().enumerate() {
        if i < widths.len() {
            row.push_str(&format!("{:<width$}  ", col, width = widths[i]));
        }
    }
    println!("{}", row.trim_end());
}
