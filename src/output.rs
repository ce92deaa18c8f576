use log::info;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

use crate::error::Result;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    info!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    info!("wrote {}", path.display());
    Ok(())
}

/// Markdown rendering of the first `max_rows` rows, or `None` when empty.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    match render_table(rows, max_rows) {
        Some(table) => println!("{}\n", table),
        None => println!("(nothing to display)\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RankingFrameRow;

    fn row(label: &str) -> RankingFrameRow {
        RankingFrameRow {
            label: label.to_string(),
            value: "$1".to_string(),
            change: String::new(),
        }
    }

    #[test]
    fn renders_markdown_with_renamed_headers() {
        let table = render_table(&[row("1. A"), row("2. B"), row("3. C")], 2).unwrap();
        assert!(table.contains("Rank"));
        assert!(table.contains("1. A"));
        assert!(!table.contains("3. C"));
    }

    #[test]
    fn empty_rows_render_nothing() {
        assert!(render_table::<RankingFrameRow>(&[], 5).is_none());
    }

    #[test]
    fn writes_csv_and_json() {
        let dir = std::env::temp_dir().join(format!("claims_output_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let csv_path = dir.join("frame.csv");
        write_csv(&csv_path, &[row("1. A")]).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(text.starts_with("Rank,Value,Change"));

        let json_path = dir.join("frame.json");
        write_json(&json_path, &vec![1, 2, 3]).unwrap();
        let back: Vec<i32> = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
        std::fs::remove_dir_all(&dir).ok();
    }
}
