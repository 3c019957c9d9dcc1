use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Spectrum, Table};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a spectrum table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – comma-separated numeric columns, optional header row
/// * `.json`         – `[[x, y, ..], ..]` or `{ "x": [...], "y": [...] }`
/// * `.parquet`      – numeric columns, the first one being x
///
/// Column 0 is always the x-axis, the remaining columns are intensities.
pub fn load_spectrum(path: &Path) -> Result<Spectrum> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let spectrum = match ext.as_str() {
        "csv" | "txt" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} rows × {} columns from {}",
        spectrum.baseline_table().row_count(),
        spectrum.baseline_table().column_count(),
        path.display()
    );
    Ok(spectrum)
}

fn attach_titles(table: Table, titles: Option<Vec<String>>) -> Spectrum {
    let spectrum = Spectrum::new(table);
    match titles {
        Some(titles) => spectrum.with_titles(titles),
        None => spectrum,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: one row per sample, `x,intensity[,intensity..]`.
/// A first row that does not parse as numbers is taken as column titles.
/// Lines starting with `#` are ignored.
fn load_csv(path: &Path) -> Result<Spectrum> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_path(path)
        .context("opening CSV")?;

    let mut titles = None;
    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        if row_no == 0 && record.iter().any(|cell| cell.parse::<f64>().is_err()) {
            titles = Some(record.iter().map(str::to_string).collect());
            continue;
        }
        let row = record
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                cell.parse::<f64>()
                    .with_context(|| format!("Row {row_no}, column {col}: '{cell}' is not a number"))
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    let table = Table::new(rows)?;
    Ok(attach_titles(table, titles))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Two accepted shapes:
///
/// ```json
/// [[0.0, 10.0], [1.0, 20.0], [2.0, 10.0]]
/// ```
///
/// ```json
/// { "x": [0.0, 1.0, 2.0], "y": [10.0, 20.0, 10.0] }
/// ```
fn load_json(path: &Path) -> Result<Spectrum> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub(crate) fn parse_json(text: &str) -> Result<Spectrum> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    match &root {
        JsonValue::Array(rows) => {
            let rows = rows
                .iter()
                .enumerate()
                .map(|(i, row)| json_array_to_f64(Some(row), i, "row"))
                .collect::<Result<Vec<_>>>()?;
            Ok(Spectrum::new(Table::new(rows)?))
        }
        JsonValue::Object(obj) => {
            let x = json_array_to_f64(obj.get("x"), 0, "x")?;
            let y = json_array_to_f64(obj.get("y"), 0, "y")?;
            let table = Table::from_xy(&x, &y)?;
            Ok(attach_titles(table, Some(vec!["x".into(), "y".into()])))
        }
        _ => bail!("Expected a JSON array of rows or an object with 'x' and 'y'"),
    }
}

fn json_array_to_f64(val: Option<&JsonValue>, row: usize, col: &str) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("Row {row}: missing or invalid '{col}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64()
                .with_context(|| format!("Row {row}, {col}[{j}]: not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding one sample per row.
///
/// Every column must be numeric (Float64, Float32, Int64 or Int32); the
/// first column is x. Column names become the spectrum titles.
fn load_parquet(path: &Path) -> Result<Spectrum> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let titles: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = batch
            .columns()
            .iter()
            .zip(&titles)
            .map(|(col, name)| {
                extract_f64_column(col).with_context(|| format!("column '{name}'"))
            })
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            rows.push(columns.iter().map(|c| c[row]).collect());
        }
    }

    let table = Table::new(rows)?;
    Ok(attach_titles(table, Some(titles)))
}

// -- Parquet / Arrow helpers --

/// Read a numeric Arrow column as `f64`. Nulls are an error.
fn extract_f64_column(col: &Arc<dyn Array>) -> Result<Vec<f64>> {
    let any = col.as_any();
    let values: Vec<Option<f64>> = match col.data_type() {
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .context("expected Float64Array")?
            .iter()
            .collect(),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .context("expected Float32Array")?
            .iter()
            .map(|v| v.map(f64::from))
            .collect(),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .iter()
            .map(|v| v.map(|i| i as f64))
            .collect(),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .iter()
            .map(|v| v.map(f64::from))
            .collect(),
        other => bail!("Expected a numeric column, got {other:?}"),
    };
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| v.with_context(|| format!("null value at row {i}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_rows_and_xy_objects() {
        let rows = parse_json("[[0, 10], [1, 20.5]]").unwrap();
        assert_eq!(rows.baseline_table().row(1), &[1.0, 20.5]);
        assert!(rows.titles().is_none());

        let xy = parse_json(r#"{ "x": [0, 1, 2], "y": [3, 4, 5] }"#).unwrap();
        assert_eq!(xy.baseline_table().row_count(), 3);
        assert_eq!(xy.titles(), Some(&["x".to_string(), "y".to_string()][..]));
    }

    #[test]
    fn json_shape_errors_are_reported() {
        assert!(parse_json(r#"{ "x": [0, 1], "y": [3] }"#).is_err());
        assert!(parse_json(r#"[[0, "a"]]"#).is_err());
        assert!(parse_json("42").is_err());
    }
}
