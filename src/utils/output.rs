use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde_json::to_string_pretty;

use crate::models::ScrapeResult;

pub const NAME_COLUMN_WIDTH: usize = 40;

/// Destination for a finished scrape.
pub trait ResultSink {
    fn emit(&mut self, result: &ScrapeResult, verbose: bool) -> Result<()>;
}

/// Pads or truncates `text` to exactly `width` characters.
pub fn fit_column(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}

pub fn render_report(result: &ScrapeResult, verbose: bool) -> String {
    let mut out = String::new();
    for course in &result.courses {
        if verbose {
            out.push_str(&format!("{} ({})\n", course.name, course.id));
            for item in &course.items {
                out.push_str(&format!(
                    "  {} {} / {}\n",
                    fit_column(&item.name, NAME_COLUMN_WIDTH),
                    item.grade,
                    item.max
                ));
            }
            out.push('\n');
        } else {
            out.push_str(&format!("{} ({}): {} grade items\n", course.name, course.id, course.items.len()));
        }
    }
    out
}

/// Prints the report to stdout.
pub struct ConsoleSink;

impl ResultSink for ConsoleSink {
    fn emit(&mut self, result: &ScrapeResult, verbose: bool) -> Result<()> {
        print!("{}", render_report(result, verbose));
        Ok(())
    }
}

/// Appends `.json` unless the name already ends with it.
pub fn json_path(name: &str) -> PathBuf {
    let name = name.trim();
    if name.to_ascii_lowercase().ends_with(".json") {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{}.json", name))
    }
}

pub fn load_result(path: &Path) -> Result<ScrapeResult> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Writes the result as pretty-printed JSON.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(name: &str) -> Self {
        JsonFileSink { path: json_path(name) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for JsonFileSink {
    fn emit(&mut self, result: &ScrapeResult, _verbose: bool) -> Result<()> {
        let json = to_string_pretty(result).context("Failed to serialize grades")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        info!("Grades saved to {}", self.path.display());
        Ok(())
    }
}
