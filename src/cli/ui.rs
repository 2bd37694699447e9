//! Terminal output: status lines, the findings table and the spinner.

use nucleiview_reports::DisplayRow;

/// ANSI color codes for terminal styling
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const RED: &str = "\x1b[31m";
    pub const WHITE: &str = "\x1b[37m";

    pub const BRIGHT_GREEN: &str = "\x1b[92m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
    pub const BRIGHT_CYAN: &str = "\x1b[96m";
}

/// Check if colors should be enabled
pub fn colors_enabled() -> bool {
    // Respect NO_COLOR and TERM conventions
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
        return false;
    }
    atty::is(atty::Stream::Stderr)
}

/// Get terminal width, defaulting to 120
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(120)
}

/// Cut `text` to `max_chars` characters, marking the cut with `…`.
pub fn truncate_cell(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut cut: String = text.chars().take(max_chars - 1).collect();
    cut.push('…');
    cut
}

fn severity_color(label: &str) -> &'static str {
    match label {
        "Critical" => colors::RED,
        "High" => colors::BRIGHT_YELLOW,
        "Medium" => colors::YELLOW,
        "Low" => colors::CYAN,
        _ => colors::DIM,
    }
}

/// Status line printer with consistent formatting
/// Inspired by cargo's output style: `    Scanning https://example.com`
pub struct StatusPrinter {
    use_colors: bool,
}

impl StatusPrinter {
    pub fn new() -> Self {
        Self {
            use_colors: colors_enabled(),
        }
    }

    fn styled(&self, color: &str, bold: bool, text: &str) -> String {
        if self.use_colors {
            let bold_code = if bold { colors::BOLD } else { "" };
            format!("{}{}{}{}", bold_code, color, text, colors::RESET)
        } else {
            text.to_string()
        }
    }

    /// Print a status line: `    Scanning  target`
    pub fn status(&self, keyword: &str, message: &str) {
        let keyword_styled = self.styled(colors::BRIGHT_GREEN, true, &format!("{:>12}", keyword));
        eprintln!("{} {}", keyword_styled, message);
    }

    pub fn info(&self, keyword: &str, message: &str) {
        let keyword_styled = self.styled(colors::BRIGHT_CYAN, true, &format!("{:>12}", keyword));
        eprintln!("{} {}", keyword_styled, message);
    }

    pub fn warning(&self, keyword: &str, message: &str) {
        let keyword_styled = self.styled(colors::BRIGHT_YELLOW, true, &format!("{:>12}", keyword));
        eprintln!("{} {}", keyword_styled, message);
    }

    pub fn success(&self, keyword: &str, message: &str) {
        let keyword_styled = self.styled(colors::GREEN, true, &format!("{:>12}", keyword));
        eprintln!("{} {}", keyword_styled, message);
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        let key_styled = self.styled(colors::DIM, false, key);
        eprintln!("  {}: {}", key_styled, value);
    }
}

impl Default for StatusPrinter {
    fn default() -> Self {
        Self::new()
    }
}

/// Column widths for the findings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnWidths {
    severity: usize,
    name: usize,
    url: usize,
    template: usize,
    description: usize,
}

impl ColumnWidths {
    /// Fixed severity column, the rest shared out of the terminal width.
    fn for_width(term_width: usize) -> Self {
        let severity = 8;
        // two leading spaces plus two between each of the five columns
        let available = term_width.saturating_sub(2 + 4 * 2 + severity).max(40);
        let name = available * 20 / 100;
        let url = available * 25 / 100;
        let template = available * 15 / 100;
        let description = available - name - url - template;
        Self {
            severity,
            name,
            url,
            template,
            description,
        }
    }
}

/// Table of findings, printed to stdout.
pub struct FindingsTable<'a> {
    rows: &'a [DisplayRow],
    use_colors: bool,
    widths: ColumnWidths,
}

impl<'a> FindingsTable<'a> {
    pub fn new(rows: &'a [DisplayRow]) -> Self {
        Self {
            rows,
            use_colors: colors_enabled() && atty::is(atty::Stream::Stdout),
            widths: ColumnWidths::for_width(terminal_width()),
        }
    }

    /// Render the table without colors, one string per line.
    pub fn plain_lines(&self) -> Vec<String> {
        let mut lines = vec![self.format_line(
            "SEVERITY",
            "NAME",
            "MATCHED URL",
            "TEMPLATE ID",
            "DESCRIPTION",
        )];
        lines.push("-".repeat(self.total_width()));
        for row in self.rows {
            lines.push(self.format_line(
                &row.severity,
                &row.name,
                &row.matched_url,
                &row.template_id,
                &row.description,
            ));
        }
        lines
    }

    pub fn print(&self) {
        if self.rows.is_empty() {
            return;
        }

        if !self.use_colors {
            for line in self.plain_lines() {
                println!("{}", line);
            }
            return;
        }

        let header = self.format_line("SEVERITY", "NAME", "MATCHED URL", "TEMPLATE ID", "DESCRIPTION");
        println!("{}{}{}{}", colors::BOLD, colors::WHITE, header, colors::RESET);
        println!("{}{}{}", colors::DIM, "─".repeat(self.total_width()), colors::RESET);

        let w = self.widths;
        for row in self.rows {
            let severity = format!("{:w$}", truncate_cell(&row.severity, w.severity), w = w.severity);
            let rest = format!(
                "{:nw$}  {:uw$}  {:tw$}  {}",
                truncate_cell(&row.name, w.name),
                truncate_cell(&row.matched_url, w.url),
                truncate_cell(&row.template_id, w.template),
                truncate_cell(&row.description, w.description),
                nw = w.name,
                uw = w.url,
                tw = w.template,
            );
            println!(
                "  {}{}{}{}  {}",
                colors::BOLD,
                severity_color(&row.severity),
                severity,
                colors::RESET,
                rest
            );
        }
    }

    fn total_width(&self) -> usize {
        let w = self.widths;
        2 + w.severity + w.name + w.url + w.template + w.description + 4 * 2
    }

    fn format_line(
        &self,
        severity: &str,
        name: &str,
        url: &str,
        template: &str,
        description: &str,
    ) -> String {
        let w = self.widths;
        format!(
            "  {:sw$}  {:nw$}  {:uw$}  {:tw$}  {}",
            truncate_cell(severity, w.severity),
            truncate_cell(name, w.name),
            truncate_cell(url, w.url),
            truncate_cell(template, w.template),
            truncate_cell(description, w.description),
            sw = w.severity,
            nw = w.name,
            uw = w.url,
            tw = w.template,
        )
        .trim_end()
        .to_string()
    }
}

/// Progress indicator styles
pub mod progress {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::time::Duration;

    /// Create a spinner for indeterminate progress
    pub fn create_spinner(message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}
