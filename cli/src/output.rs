//! Rendering records for the terminal and for export.

use std::borrow::Cow;

use jobtracker_core::Application;

const TABLE_HEADER: [&str; 6] = [
    "ID",
    "Company",
    "Position",
    "Status",
    "Created At",
    "Updated At",
];
const CSV_HEADER: &str = "ID,Company,Position,Status,CreatedAt,UpdatedAt";
const EMPTY_MESSAGE: &str = "No job applications found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

/// Formats accepted by `export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl From<ExportFormat> for OutputFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Csv => Self::Csv,
        }
    }
}

/// Renders records in the requested format. The result ends with a newline.
pub fn render(apps: &[Application], format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Table => Ok(render_table(apps)),
        OutputFormat::Json => {
            render_json(apps).map_err(|e| format!("failed to serialize applications: {e}"))
        }
        OutputFormat::Csv => Ok(render_csv(apps)),
    }
}

/// Left-aligned columns under a dashed rule.
pub fn render_table(apps: &[Application]) -> String {
    if apps.is_empty() {
        return format!("{EMPTY_MESSAGE}\n");
    }

    let rows: Vec<[String; 6]> = apps.iter().map(Application::to_row).collect();
    let mut widths = TABLE_HEADER.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_table_line(&mut out, &TABLE_HEADER, &widths);
    let rule = widths.map(|w| "-".repeat(w));
    push_table_line(&mut out, &rule, &widths);
    for row in &rows {
        push_table_line(&mut out, row, &widths);
    }
    out
}

fn push_table_line<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", cell.as_ref()))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Pretty-printed JSON array.
pub fn render_json(apps: &[Application]) -> serde_json::Result<String> {
    let mut json = serde_json::to_string_pretty(apps)?;
    json.push('\n');
    Ok(json)
}

/// CSV with a header line, quoting fields as RFC 4180 requires.
pub fn render_csv(apps: &[Application]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for app in apps {
        let row = app.to_row();
        let fields: Vec<Cow<'_, str>> = row.iter().map(|f| csv_field(f)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
