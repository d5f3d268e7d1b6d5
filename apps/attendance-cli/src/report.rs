//! Preview listing output

use anyhow::Result;
use attendance_core::{PreviewRow, RunSummary, SplitPlan};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Serialize)]
struct JsonReport<'a> {
    rows: Vec<PreviewRow>,
    summary: &'a RunSummary,
}

pub fn print(plan: &SplitPlan, json: bool) -> Result<()> {
    if json {
        let report = JsonReport {
            rows: plan.preview(),
            summary: &plan.summary,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_table(&plan.preview(), &plan.summary));
    }
    Ok(())
}

fn render_table(rows: &[PreviewRow], summary: &RunSummary) -> String {
    const HEADERS: [&str; 6] = ["Page", "Month", "ID", "Name", "Conf.", "File"];

    let cells: Vec<[String; 6]> = rows
        .iter()
        .map(|row| {
            [
                row.start_page.to_string(),
                row.month.clone(),
                row.id_code.clone(),
                row.name.clone(),
                format!("{:?}", row.confidence).to_lowercase(),
                if row.renamed {
                    format!("{} (renamed)", row.filename)
                } else {
                    row.filename.clone()
                },
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    write_row(&mut out, &HEADERS.map(String::from), &widths);
    for row in &cells {
        write_row(&mut out, row, &widths);
    }

    let _ = writeln!(
        out,
        "\n{} records from {} pages ({} segments)",
        summary.records, summary.total_pages, summary.segments
    );
    if summary.skipped_empty > 0 {
        let _ = writeln!(out, "{} segments skipped: no text", summary.skipped_empty);
    }
    if !summary.skipped_strict.is_empty() {
        let pages: Vec<String> = summary.skipped_strict.iter().map(|p| p.to_string()).collect();
        let _ = writeln!(
            out,
            "{} segments skipped: no identification code (pages {})",
            pages.len(),
            pages.join(", ")
        );
    }
    if summary.collisions > 0 {
        let _ = writeln!(out, "{} filenames renamed to avoid collisions", summary.collisions);
    }
    out
}

fn write_row(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}
