//! Printers: text and markdown (termimad), plus dataset rendering helpers.

use owo_colors::OwoColorize;
use serde_json::Value;
use termimad::MadSkin;

use crate::config::Config;
use crate::model::{sort_by_role, Variable};

pub struct TextPrinter {
    pub color: Option<&'static str>,
}

impl TextPrinter {
    pub fn from_config(cfg: &Config) -> Self {
        let color = match cfg.get("DEFAULT_COLOR").as_deref() {
            Some("green") => Some("green"),
            Some("cyan") => Some("cyan"),
            Some("magenta") => Some("magenta"),
            Some("yellow") => Some("yellow"),
            Some("red") => Some("red"),
            _ => None,
        };
        Self { color }
    }

    pub fn print(&self, text: &str) {
        if let Some(c) = self.color {
            match c {
                "green" => println!("{}", text.green()),
                "cyan" => println!("{}", text.cyan()),
                "magenta" => println!("{}", text.magenta()),
                "yellow" => println!("{}", text.yellow()),
                "red" => println!("{}", text.red()),
                _ => println!("{}", text),
            }
        } else {
            println!("{}", text);
        }
    }
}

pub struct MarkdownPrinter {
    pub skin: MadSkin,
    pub width: usize,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self { skin: MadSkin::default(), width: 100 }
    }
}

impl MarkdownPrinter {
    pub fn print(&self, text: &str) {
        let fmt = self.skin.text(text, Some(self.width));
        println!("{}", fmt);
    }
}

/// Markdown table of a dataset's variables, identifiers first.
pub fn structure_table(name: &str, variables: &[Variable]) -> String {
    let mut ordered = variables.to_vec();
    sort_by_role(&mut ordered);

    let mut md = format!("## {}\n\n", name);
    md.push_str("|:-|:-|:-|\n");
    md.push_str("|**variable**|**type**|**role**|\n");
    for v in &ordered {
        md.push_str(&format!(
            "|{}|{}|{}|\n",
            v.name,
            v.r#type.as_deref().unwrap_or("-"),
            v.role.as_str()
        ));
    }
    md.push_str("|-\n");
    md
}

/// Plain-text preview of a row payload. Arrays are cut at `limit` rows with a
/// trailer noting how many were held back; anything else is pretty-printed
/// whole.
pub fn data_preview(data: &Value, limit: usize) -> String {
    match data {
        Value::Array(rows) => {
            let mut out = String::new();
            for row in rows.iter().take(limit) {
                out.push_str(&row.to_string());
                out.push('\n');
            }
            if rows.len() > limit {
                out.push_str(&format!("... {} more rows\n", rows.len() - limit));
            }
            out
        }
        other => {
            let mut out =
                serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string());
            out.push('\n');
            out
        }
    }
}
