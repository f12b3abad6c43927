use agentloom_core::{ChatRenderer, Source};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::White))
                .collect::<Vec<_>>(),
        );
    table
}

pub fn format_time(time: Option<DateTime<Utc>>, format: &str) -> String {
    time.map(|t| t.format(format).to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}

pub fn print_empty(what: &str, hint: &str) {
    println!("{}", format!("No {} found.", what).yellow());
    if !hint.is_empty() {
        println!("{}", hint.dimmed());
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_warning(message: &str) {
    println!("{} {}", "!".yellow().bold(), message.yellow());
}

pub fn print_sources(sources: &[Source]) {
    if sources.is_empty() {
        return;
    }
    println!("  {}", "Sources".dimmed());
    for (i, source) in sources.iter().enumerate() {
        match &source.url {
            Some(url) => println!("   [{}] {} {}", i + 1, source.display_name(), url.dimmed()),
            None => println!("   [{}] {}", i + 1, source.display_name()),
        }
    }
}

/// Renders a chat turn to the terminal, overwriting the thinking line in place.
pub struct TerminalRenderer<W: Write> {
    out: W,
    show_sources: bool,
    status_width: usize,
}

impl TerminalRenderer<std::io::Stdout> {
    pub fn stdout(show_sources: bool) -> Self {
        Self::new(std::io::stdout(), show_sources)
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, show_sources: bool) -> Self {
        Self {
            out,
            show_sources,
            status_width: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_status(&mut self, status: &str) {
        let line = format!("{} {}", "…".dimmed(), status.dimmed());
        let pad = self.status_width.saturating_sub(status.chars().count());
        // Terminal write errors are not actionable mid-stream.
        let _ = write!(self.out, "\r{}{}", line, " ".repeat(pad));
        let _ = self.out.flush();
        self.status_width = status.chars().count();
    }
}

impl<W: Write> ChatRenderer for TerminalRenderer<W> {
    fn show_thinking(&mut self) {
        self.write_status("Thinking...");
    }

    fn update_thinking(&mut self, status: &str) {
        self.write_status(status);
    }

    fn remove_thinking(&mut self) {
        let _ = write!(self.out, "\r{}\r", " ".repeat(self.status_width + 2));
        let _ = self.out.flush();
        self.status_width = 0;
    }

    fn render_response(&mut self, content: &str, sources: &[Source]) {
        let _ = writeln!(self.out, "{} {}", "agent>".cyan().bold(), content);
        if self.show_sources && !sources.is_empty() {
            let _ = writeln!(self.out, "  {}", "Sources".dimmed());
            for (i, source) in sources.iter().enumerate() {
                let _ = writeln!(self.out, "   [{}] {}", i + 1, source.display_name());
            }
        }
        let _ = self.out.flush();
    }

    fn render_error(&mut self, message: &str) {
        let _ = writeln!(self.out, "{} {}", "error>".red().bold(), message.red());
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer sentence", 8), "a longe…");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(None, "%Y"), "-");
        let t = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_time(Some(t), "%Y-%m-%d"), "2026-03-01");
    }

    #[test]
    fn test_terminal_renderer_overwrites_status_line() {
        plain();
        let mut renderer = TerminalRenderer::new(Vec::new(), true);
        renderer.show_thinking();
        renderer.update_thinking("Using search...");
        renderer.remove_thinking();
        renderer.render_response(
            "Hello",
            &[Source {
                title: "Handbook".into(),
                ..Default::default()
            }],
        );

        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(text.contains("\r… Thinking..."));
        assert!(text.contains("\r… Using search..."));
        assert!(text.contains("agent> Hello\n"));
        assert!(text.contains("[1] Handbook"));
    }

    #[test]
    fn test_terminal_renderer_error() {
        plain();
        let mut renderer = TerminalRenderer::new(Vec::new(), false);
        renderer.render_error("boom");
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(text, "error> boom\n");
    }
}
