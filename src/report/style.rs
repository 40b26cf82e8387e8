//! Terminal styling shared by the report and the CLI

use colored::*;

pub(crate) const RULE: usize = 56;

pub(crate) fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
pub(crate) fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
pub(crate) fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
pub(crate) fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
pub(crate) fn warn(s: &str) -> ColoredString   { s.truecolor(230, 180, 80) }

pub(crate) fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

pub(crate) fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

pub(crate) fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

pub(crate) fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

pub(crate) fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(RULE)));
}

/// Optional metric with fixed precision, `-` when undefined
pub(crate) fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

/// Horizontal bar scaled to `width` at `max`
pub(crate) fn bar(value: f64, max: f64, width: usize) -> String {
    if !(max > 0.0) || !value.is_finite() {
        return String::new();
    }
    let filled = ((value / max).clamp(0.0, 1.0) * width as f64).round() as usize;
    "█".repeat(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(0.5, 1.0, 10).chars().count(), 5);
        assert_eq!(bar(2.0, 1.0, 4).chars().count(), 4);
        assert_eq!(bar(1.0, 0.0, 4), "");
    }

    #[test]
    fn test_fmt_opt() {
        assert_eq!(fmt_opt(Some(1.23456), 2), "1.23");
        assert_eq!(fmt_opt(None, 2), "-");
    }
}
