use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::Dataset;

/// Default file name offered when saving the final exercises.
pub const EXPORT_FILE_NAME: &str = "filtered_exercises.csv";

/// Write `dataset` as CSV: a header row, then one record per row in the
/// dataset's column order. Missing cells are empty fields.
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(dataset.columns())
        .context("writing CSV header")?;
    for (i, row) in dataset.rows().iter().enumerate() {
        out.write_record(row.iter().map(|c| c.to_string()))
            .with_context(|| format!("writing CSV row {i}"))?;
    }
    out.flush().context("flushing CSV output")?;
    Ok(())
}

pub fn export_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(dataset, file)?;
    log::info!("Exported {} rows to {}", dataset.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_file;
    use crate::data::model::CellValue;

    fn exercises() -> Dataset {
        Dataset::new(
            vec!["Ejercicio".into(), "Filmina".into(), "Escenario: A".into()],
            vec![
                vec![CellValue::text("Salto, doble"), CellValue::Integer(2), CellValue::Missing],
                vec![CellValue::text("Giro"), CellValue::Missing, CellValue::text("Lectura")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn writes_header_and_quotes_fields() {
        let mut buf = Vec::new();
        write_csv(&exercises(), &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Ejercicio,Filmina,Escenario: A\n\"Salto, doble\",2,\nGiro,,Lectura\n"
        );
    }

    #[test]
    fn exported_file_loads_back_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EXPORT_FILE_NAME);
        export_csv(&exercises(), &path).unwrap();
        assert_eq!(load_file(&path).unwrap(), exercises());
    }
}
