use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::types::{Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type};
use arrow::array::{Array, AsArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::DataError;
use super::model::{CellValue, Dataset};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one column per field, strings / ints / floats / bools
/// * `.json`    – `[{ "col": value, ... }, ...]` (records orientation)
/// * `.csv`     – header row, one column per field
///
/// Rows that are entirely empty are dropped, then columns that are
/// entirely empty.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => Err(DataError::UnsupportedExtension(other.to_string()).into()),
    }?;
    Ok(dataset.drop_all_missing())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Ojo": "Derecho", "% Natural": "40-60", "Escenarios": "Lectura" },
///   ...
/// ]
/// ```
///
/// Columns are taken in first-appearance order; keys absent from a record
/// are missing cells.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().ok_or(DataError::NotAnArray)?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or(DataError::RecordNotObject(i))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map_or(CellValue::Missing, json_to_cell))
                .collect()
        })
        .collect();

    Ok(Dataset::new(columns, rows)?)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => text_cell(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                float_cell(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Text(b.to_string()),
        JsonValue::Null => CellValue::Missing,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one field per column.
/// Short rows are padded with missing cells; extra fields are dropped.
fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row = (0..columns.len())
            .map(|i| record.get(i).map_or(CellValue::Missing, guess_cell_type))
            .collect();
        rows.push(row);
    }

    Ok(Dataset::new(columns, rows)?)
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.trim().is_empty() {
        return CellValue::Missing;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return float_cell(f);
    }
    CellValue::Text(s.to_string())
}

fn text_cell(s: &str) -> CellValue {
    if s.trim().is_empty() {
        CellValue::Missing
    } else {
        CellValue::text(s)
    }
}

/// Whole floats become integers (spreadsheets export `3` as `3.0`);
/// NaN is missing; anything else keeps its text form.
fn float_cell(f: f64) -> CellValue {
    if f.is_nan() {
        CellValue::Missing
    } else if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        CellValue::Integer(f as i64)
    } else {
        CellValue::Text(f.to_string())
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file. Every field becomes a column; works with files
/// written by both **Pandas** (`df.to_parquet()`) and **Polars**
/// (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_cell(col, row))
                .collect();
            rows.push(cells);
        }
    }

    Ok(Dataset::new(columns, rows)?)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Missing;
    }
    match col.data_type() {
        DataType::Utf8 => text_cell(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => text_cell(col.as_string::<i64>().value(row)),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => float_cell(col.as_primitive::<Float32Type>().value(row).into()),
        DataType::Float64 => float_cell(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Text(col.as_boolean().value(row).to_string()),
        other => {
            log::warn!("unsupported parquet column type {other:?}, reading as text");
            CellValue::Text(format!("{other:?}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn csv_cells_are_typed_and_empty_columns_dropped() {
        let file = write_temp(
            ".csv",
            "Ojo,% Natural,Vacia,Filmina\nDerecho,40-60,,3\n,,,\nIzquierdo,55,,4.0\n",
        );
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.columns(), ["Ojo", "% Natural", "Filmina"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds.rows()[1],
            vec![CellValue::text("Izquierdo"), CellValue::Integer(55), CellValue::Integer(4)]
        );
    }

    #[test]
    fn csv_short_rows_are_padded() {
        let file = write_temp(".csv", "a,b\nx\ny,z\n");
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.rows()[0], vec![CellValue::text("x"), CellValue::Missing]);
    }

    #[test]
    fn json_records_keep_first_appearance_order() {
        let file = write_temp(
            ".json",
            r#"[{"b": 1, "a": "x"}, {"a": null, "c": 2.5, "b": 3.0}]"#,
        );
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.columns(), ["b", "a", "c"]);
        assert_eq!(
            ds.rows()[1],
            vec![CellValue::Integer(3), CellValue::Missing, CellValue::text("2.5")]
        );
    }

    #[test]
    fn json_rejects_non_record_input() {
        let file = write_temp(".json", r#"{"a": 1}"#);
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err.downcast_ref::<DataError>(), Some(DataError::NotAnArray)));

        let file = write_temp(".json", r#"[{"a": 1}, 7]"#);
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::RecordNotObject(1))
        ));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let file = write_temp(".xlsx", "");
        let err = load_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported file extension"));
    }

    #[test]
    fn parquet_columns_are_read_in_schema_order() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Escenarios", DataType::Utf8, true),
            Field::new("Filmina", DataType::Int64, true),
            Field::new("Nota", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("Lectura"), None])),
                Arc::new(Int64Array::from(vec![Some(1), Some(2)])),
                Arc::new(Float64Array::from(vec![Some(7.0), Some(7.5)])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.columns(), ["Escenarios", "Filmina", "Nota"]);
        assert_eq!(
            ds.rows(),
            &[
                vec![CellValue::text("Lectura"), CellValue::Integer(1), CellValue::Integer(7)],
                vec![CellValue::Missing, CellValue::Integer(2), CellValue::text("7.5")],
            ]
        );
    }
}
