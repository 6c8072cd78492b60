use std::io::{self, Write};

use traj_stitch::Summary;

use crate::util::text::{seconds, truncate};

const INDENT: &str = "      ";

const BOX_INNER_WIDTH: usize = 62;
const SAFE_TABLE_WIDTH: usize = BOX_INNER_WIDTH - INDENT.len();

/// One row of a per-unit result table.
pub struct UnitRow {
    pub unit: String,
    pub count: String,
    pub status: String,
}

pub fn print_summary(summary: &Summary) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let rows = [
        ("Processed", summary.processed.to_string()),
        ("Skipped", summary.skipped.to_string()),
        ("Incomplete", summary.incomplete.to_string()),
        ("NaN rows", summary.nan_rows.to_string()),
        ("Failed", summary.failed.to_string()),
        ("Elapsed", seconds(summary.elapsed())),
    ];

    print_table_kv(&mut out, "Summary", &rows);
}

pub fn print_kv_table<K: AsRef<str>>(title: &str, rows: &[(K, String)]) {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    print_table_kv(&mut out, title, rows);
}

pub fn print_unit_table(title: &str, count_header: &str, rows: &[UnitRow]) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let unit_w = 14usize;
    let count_w = 10usize;
    let sep_overhead = 6;
    let status_w = SAFE_TABLE_WIDTH.saturating_sub(unit_w + count_w + sep_overhead);

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(
        out,
        "{}┌{}┬{}┬{}┐",
        INDENT,
        "─".repeat(unit_w + 2),
        "─".repeat(count_w + 2),
        "─".repeat(status_w + 2)
    );
    let _ = writeln!(
        out,
        "{}│ {:<unit_w$} │ {:>count_w$} │ {:<status_w$} │",
        INDENT, "Unit", count_header, "Status"
    );
    let _ = writeln!(
        out,
        "{}├{}┼{}┼{}┤",
        INDENT,
        "─".repeat(unit_w + 2),
        "─".repeat(count_w + 2),
        "─".repeat(status_w + 2)
    );

    for row in rows {
        let _ = writeln!(
            out,
            "{}│ {:<unit_w$} │ {:>count_w$} │ {:<status_w$} │",
            INDENT,
            truncate(&row.unit, unit_w),
            truncate(&row.count, count_w),
            truncate(&row.status, status_w)
        );
    }

    let _ = writeln!(
        out,
        "{}└{}┴{}┴{}┘",
        INDENT,
        "─".repeat(unit_w + 2),
        "─".repeat(count_w + 2),
        "─".repeat(status_w + 2)
    );
}

fn print_table_kv<K: AsRef<str>>(out: &mut impl Write, title: &str, rows: &[(K, String)]) {
    let key_w = 16usize;
    let sep_overhead = 6;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(key_w + sep_overhead);

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(
        out,
        "{}┌{k_line}┬{v_line}┐",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );
    let _ = writeln!(
        out,
        "{}│ {:<key_w$} │ {:>val_w$} │",
        INDENT, "Metric", "Value"
    );
    let _ = writeln!(
        out,
        "{}├{k_line}┼{v_line}┤",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );

    for (key, val) in rows {
        let _ = writeln!(
            out,
            "{}│ {:<key_w$} │ {:>val_w$} │",
            INDENT,
            truncate(key.as_ref(), key_w),
            truncate(val, val_w)
        );
    }

    let _ = writeln!(
        out,
        "{}└{k_line}┴{v_line}┘",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );
}
