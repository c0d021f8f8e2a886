//! Table and JSON rendering shared by every command.

use anyhow::{Context, Result};
use serde::Serialize;

const KEY_WIDTH: usize = 24;
const VALUE_WIDTH: usize = 60;

/// Two-column key/value box table.
pub fn kv_table(title: &str, rows: &[(&str, String)]) -> String {
    let inner = KEY_WIDTH + VALUE_WIDTH + 5;
    let mut out = String::new();
    out.push_str(&format!("┌{}┐\n", "─".repeat(inner)));
    out.push_str(&format!("│{:^inner$}│\n", truncate(title, inner)));
    out.push_str(&format!(
        "├{}┬{}┤\n",
        "─".repeat(KEY_WIDTH + 2),
        "─".repeat(VALUE_WIDTH + 2)
    ));
    for (key, value) in rows {
        out.push_str(&format!(
            "│ {:<kw$} │ {:<vw$} │\n",
            truncate(key, KEY_WIDTH),
            truncate(value, VALUE_WIDTH),
            kw = KEY_WIDTH,
            vw = VALUE_WIDTH,
        ));
    }
    out.push_str(&format!(
        "└{}┴{}┘\n",
        "─".repeat(KEY_WIDTH + 2),
        "─".repeat(VALUE_WIDTH + 2)
    ));
    out
}

/// Multi-column box table sized to its widest cell.
pub fn list_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let rule = |left: &str, mid: &str, right: &str| -> String {
        let parts: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}\n", left, parts.join(mid), right)
    };
    let line = |cells: &[String]| -> String {
        let parts: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| format!(" {:<w$} ", cells.get(i).map(String::as_str).unwrap_or(""), w = w))
            .collect();
        format!("│{}│\n", parts.join("│"))
    };

    let mut out = rule("┌", "┬", "┐");
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    out.push_str(&line(&header_cells));
    out.push_str(&rule("├", "┼", "┤"));
    for row in rows {
        out.push_str(&line(row));
    }
    out.push_str(&rule("└", "┴", "┘"));
    if rows.is_empty() {
        out.push_str("(none)\n");
    }
    out
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize output to JSON")
}

/// Truncate to `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max > 3 {
        let kept: String = s.chars().take(max - 3).collect();
        format!("{}...", kept)
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kv_table_rows_aligned() {
        let table = kv_table("Contract", &[("App ID", "42".to_string()), ("State", "Live".to_string())]);
        let widths: Vec<usize> = table.lines().map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
        assert!(table.contains("App ID"));
        assert!(table.contains("Live"));
    }

    #[test]
    fn test_list_table_widths_follow_content() {
        let rows = vec![
            vec!["1".to_string(), "a long value".to_string()],
            vec!["22".to_string(), "b".to_string()],
        ];
        let table = list_table(&["ID", "Value"], &rows);
        let widths: Vec<usize> = table.lines().map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
        assert!(table.contains("a long value"));
    }

    #[test]
    fn test_empty_list_marked() {
        assert!(list_table(&["ID"], &[]).ends_with("(none)\n"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }
}
