//! Terminal progress rendering for downloads.

use std::collections::HashMap;
use std::io::{self, Write};

use regex::{Captures, Regex};

const RESET: &str = "\x1b[0m";
const GRAY: &str = "\x1b[90m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CLEAR_LINE: &str = "\x1b[2K\r";

pub const DEFAULT_BAR_WIDTH: usize = 32;

lazy_static! {
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"\{([^{}]+)\}").unwrap();
}

pub fn gray(text: &str) -> String {
    format!("{GRAY}{text}{RESET}")
}

pub fn green(text: &str) -> String {
    format!("{GREEN}{text}{RESET}")
}

pub fn yellow(text: &str) -> String {
    format!("{YELLOW}{text}{RESET}")
}

/// A value substituted into a progress template.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressValue {
    Text(String),
    Number(f64),
}

impl From<&str> for ProgressValue {
    fn from(value: &str) -> Self {
        ProgressValue::Text(value.to_string())
    }
}

impl From<String> for ProgressValue {
    fn from(value: String) -> Self {
        ProgressValue::Text(value)
    }
}

impl From<f64> for ProgressValue {
    fn from(value: f64) -> Self {
        ProgressValue::Number(value)
    }
}

/// Replaces `{key}` placeholders in `template` with `props`.
///
/// A numeric `progress` prop renders as a percentage clamped to 0..=100 and
/// rounded up. Placeholders without a prop render as nothing.
pub fn render_template(template: &str, props: &HashMap<&str, ProgressValue>) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            match props.get(key) {
                Some(ProgressValue::Number(n)) if key == "progress" => {
                    format!("{}%", n.clamp(0.0, 100.0).ceil())
                }
                Some(ProgressValue::Number(n)) => n.to_string(),
                Some(ProgressValue::Text(text)) => text.clone(),
                None => String::new(),
            }
        })
        .into_owned()
}

/// Renders `[=====>     ]` for `percent`, with `width` cells between the brackets.
pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).floor() as usize;
    let bar = if filled == width {
        "=".repeat(filled)
    } else if filled > 1 {
        format!("{}>", "=".repeat(filled - 1))
    } else {
        ">".to_string()
    };
    // The lone `>` still occupies a cell when nothing is filled yet.
    let padding = width.saturating_sub(filled.max(1));
    format!(
        "{}{}{}{}",
        gray("["),
        yellow(&bar),
        " ".repeat(padding),
        gray("]")
    )
}

/// Formats a byte count with decimal units, e.g. `1.5 MB`.
pub fn format_size(bytes: f64) -> String {
    const UNITS: &[&str] = &["B", "kB", "MB", "GB", "TB"];
    let mut value = bytes.max(0.0);
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{value} {}", UNITS[unit])
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Overwrites the current terminal line with `text`.
pub fn write_progress_line(out: &mut impl Write, text: &str) -> io::Result<()> {
    write!(out, "{CLEAR_LINE}{text}")?;
    out.flush()
}
