use purge_core::RunReport;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Left-aligned columns sized to their widest cell, two spaces apart.
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let widths = rows.iter().fold(
        headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>(),
        |mut widths, row| {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
            widths
        },
    );
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();

    println!("{}", render_row(headers, &widths));
    println!("{}", render_row(&rule, &widths));
    for row in &rows {
        println!("{}", render_row(row, &widths));
    }
}

fn render_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let pad = widths.get(i).copied().unwrap_or(0);
            format!("{:pad$}", cell.as_ref())
        })
        .collect();
    padded.join("  ").trim_end().to_string()
}

/// Removed / failed listing followed by the one-line summary.
pub fn print_report(report: &RunReport) {
    let removed = report.removed();
    let failed = report.failed();

    if !removed.is_empty() {
        println!("{} ({}):", capitalise(report.action.past_tense()), removed.len());
        for handle in &removed {
            println!("  {handle}");
        }
    }
    if !failed.is_empty() {
        println!("Failed ({}):", failed.len());
        for line in &failed {
            println!("  {line}");
        }
    }
    println!("{}", report.summary());
}

fn capitalise(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
