use serde::Serialize;

use crate::domain::models::JsonOut;

/// Print a slice as one pretty JSON document or one text row per item.
pub fn print_out<T: Serialize>(
    json: bool,
    data: &[T],
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        for item in data {
            println!("{}", row(item));
        }
    }
    Ok(())
}

/// Print a single value as one pretty JSON document or one text line.
pub fn print_one<T: Serialize>(json: bool, data: T, row: impl Fn(&T) -> String) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        println!("{}", row(&data));
    }
    Ok(())
}

/// Print pre-formatted lines in text mode, or the raw line list in JSON mode.
pub fn print_lines(json: bool, lines: &[String], empty_note: &str) -> anyhow::Result<()> {
    if json {
        return print_out(json, lines, |line| line.clone());
    }
    if lines.is_empty() {
        println!("{empty_note}");
        return Ok(());
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}
