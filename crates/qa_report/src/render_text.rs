//! Plain-text renderer: header, totals line, fixed-width cell table.

use std::fmt::Write as _;

use crate::{ReportError, ReportModel};

const HEADERS: [&str; 6] = ["ID", "NAME", "TARGET", "SHARE", "CURRENT", "STATUS"];

pub fn render_text(model: &ReportModel) -> Result<String, ReportError> {
    let mut out = String::new();
    write_report(model, &mut out).map_err(|_| ReportError::Render("text_write"))?;
    Ok(out)
}

fn write_report(m: &ReportModel, out: &mut String) -> std::fmt::Result {
    writeln!(out, "{}", m.header.title)?;
    match &m.header.mode {
        Some(mode) => writeln!(out, "operation: {} (mode: {mode})", m.header.operation)?,
        None => writeln!(out, "operation: {}", m.header.operation)?,
    }
    if !m.header.dimensions.is_empty() {
        writeln!(out, "dimensions: {}", m.header.dimensions.join(", "))?;
    }
    writeln!(out)?;

    let t = &m.totals;
    writeln!(
        out,
        "total target: {}  allocated: {}  delta: {:+}{}",
        t.total_target,
        t.allocated,
        t.delta,
        if t.reconciled { "" } else { "  (not reconciled)" }
    )?;
    writeln!(out, "cells: {}  completes: {} ({})", t.cell_count, t.completes, t.completion_pct_1dp)?;
    writeln!(out)?;

    let rows: Vec<[String; 6]> = m
        .cells
        .iter()
        .map(|c| {
            [
                c.id.clone(),
                c.name.clone(),
                c.target.to_string(),
                c.share_pct_1dp.clone(),
                c.current.to_string(),
                c.status.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for r in &rows {
        for (w, cell) in widths.iter_mut().zip(r) {
            *w = (*w).max(cell.chars().count());
        }
    }

    write_row(out, &HEADERS.map(str::to_string), &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", rule.join("  "))?;
    for r in &rows {
        write_row(out, r, &widths)?;
    }

    if !m.warnings.is_empty() {
        writeln!(out)?;
        for w in &m.warnings {
            writeln!(out, "warning: {w}")?;
        }
    }

    writeln!(out)?;
    writeln!(out, "allocation sha256: {}", m.integrity.allocation_sha256)?;
    writeln!(out, "engine: {}", m.integrity.engine)
}

/// Text columns left-aligned, numeric columns (target, share, current) right-aligned.
fn write_row(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) -> std::fmt::Result {
    let mut parts = Vec::with_capacity(6);
    for (i, (c, w)) in cells.iter().zip(widths).enumerate() {
        let pad = w.saturating_sub(c.chars().count());
        if matches!(i, 2..=4) {
            parts.push(format!("{}{c}", " ".repeat(pad)));
        } else {
            parts.push(format!("{c}{}", " ".repeat(pad)));
        }
    }
    writeln!(out, "{}", parts.join("  ").trim_end())
}
