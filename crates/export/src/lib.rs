//! Export helpers for prediction tables.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use pass_predict::PredictionResult;

/// Output layout of an exported table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Space-aligned columns.
    #[default]
    Text,
    Csv,
    /// Header plus full rows, including designator and UTC AOS.
    Json,
}

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

pub fn write_result(
    writer: &mut dyn Write,
    result: &PredictionResult,
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Text => write_text(writer, result),
        Format::Csv => write_csv(writer, result),
        Format::Json => write_json(writer, result),
    }
}

pub fn write_csv(writer: &mut dyn Write, result: &PredictionResult) -> io::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(result.header)?;
    for row in &result.rows {
        csv.write_record(row.cells())?;
    }
    csv.flush()
}

pub fn write_json(writer: &mut dyn Write, result: &PredictionResult) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, result)?;
    writeln!(writer)
}

/// Columns padded to their widest cell, separated by two spaces.
pub fn write_text(writer: &mut dyn Write, result: &PredictionResult) -> io::Result<()> {
    let table = result.table();
    let mut widths = vec![0usize; result.header.len()];
    for line in &table {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }
    for line in &table {
        let mut rendered = String::new();
        for (i, (cell, width)) in line.iter().zip(&widths).enumerate() {
            if i > 0 {
                rendered.push_str("  ");
            }
            rendered.push_str(cell);
            let pad = width - cell.chars().count();
            rendered.extend(std::iter::repeat_n(' ', pad));
        }
        writeln!(writer, "{}", rendered.trim_end())?;
    }
    Ok(())
}
