//! HTML rendering of results and reports.

use std::fmt::Write as _;

use crate::models::{ResultSet, TableReport};

/// Render a duration in seconds as `1d 2h 3m 4.567s`.
///
/// Seconds are printed with three decimals when at least one second,
/// otherwise as milliseconds with two decimals. Larger units are prepended
/// only when non-zero. Negative durations get a leading `-`.
pub fn format_duration(secs: f64) -> String {
    let negative = secs < 0.0;
    let total = secs.abs();

    let seconds = total % 60.0;
    let whole_minutes = (total / 60.0).floor() as u64;
    let minutes = whole_minutes % 60;
    let hours = (whole_minutes / 60) % 24;
    let days = whole_minutes / (60 * 24);

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds >= 1.0 {
        parts.push(format!("{seconds:.3}s"));
    } else {
        parts.push(format!("{:.2}ms", seconds * 1000.0));
    }

    let rendered = parts.join(" ");
    if negative {
        format!("-{rendered}")
    } else {
        rendered
    }
}

/// Escape text for inclusion in HTML element content or attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Render a result set as an HTML table. NULL renders as an empty cell.
pub fn render_result_table(result: &ResultSet) -> String {
    let mut html = String::from("<table><tr>");
    for column in &result.columns {
        let _ = write!(html, "<th>{}</th>", escape_html(column));
    }
    html.push_str("</tr>");

    for row in &result.rows {
        html.push_str("<tr>");
        for value in row {
            let _ = write!(html, "<td>{}</td>", escape_html(value.as_deref().unwrap_or("")));
        }
        html.push_str("</tr>");
    }

    html.push_str("</table>");
    html
}

/// Summary line printed after a statement: `<n> rows (took <duration>)`.
///
/// Statements with no row description and no affected rows (`BEGIN`, `SET`,
/// DDL, and DML that touched nothing) report `ok` instead of a count.
pub fn summary_line(result: Option<&ResultSet>, elapsed_secs: f64) -> String {
    let count = match result {
        Some(r) if r.has_columns() => Some(r.rows_affected.unwrap_or(r.row_count() as u64)),
        Some(r) => r.rows_affected.filter(|n| *n > 0),
        None => None,
    };

    let head = match count {
        Some(n) => format!("{n} rows"),
        None => "ok".to_string(),
    };
    format!("{head} (took {})", format_duration(elapsed_secs))
}

/// Render a `\d <table>` report: header, column grid, then each section.
pub fn render_table_report(report: &TableReport) -> String {
    let mut html = String::new();
    let _ = write!(html, "<h3>Table \"{}\"</h3>", escape_html(&report.table_name));

    html.push_str("<table><tr><th>Column</th><th>Type</th><th>Modifiers</th></tr>");
    for column in &report.columns {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&column.name),
            escape_html(&column.data_type),
            escape_html(&column.modifiers)
        );
    }
    html.push_str("</table>");

    for section in &report.sections {
        let _ = write!(html, "<h4>{}:</h4><ul>", section.title());
        for line in &section.lines {
            let _ = write!(html, "<li>{}</li>", escape_html(line));
        }
        html.push_str("</ul>");
    }

    html
}
