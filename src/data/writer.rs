use std::path::Path;
use std::sync::Arc;

use arrow::array::{Float64Builder, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use super::loader::{ID_COLUMN, INTENSITY_COLUMN, MZ_COLUMN, POLARITY_COLUMN};
use super::model::SpectrumCollection;
use super::table::{is_missing, IntensityTable};
use crate::error::Result;

/// Write a wide table: `id,<mass>,<mass>,...`, one row per spectrum.
/// Missing cells are written as empty fields.
pub fn write_table_csv(table: &IntensityTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = Vec::with_capacity(table.n_cols() + 1);
    header.push(ID_COLUMN.to_string());
    header.extend(table.masses().iter().map(|m| m.to_string()));
    writer.write_record(&header)?;

    for (id, row) in table.rows() {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(id.to_string());
        record.extend(row.iter().map(|v| {
            if is_missing(*v) {
                String::new()
            } else {
                v.to_string()
            }
        }));
        writer.write_record(&record)?;
    }
    writer.flush()?;

    log::info!(
        "Wrote {} x {} table to {}",
        table.n_rows(),
        table.n_cols(),
        path.display()
    );
    Ok(())
}

fn list_column<'a>(rows: impl Iterator<Item = &'a [f64]>) -> arrow::array::ListArray {
    let mut builder = ListBuilder::new(Float64Builder::new());
    for row in rows {
        let values = builder.values();
        for &v in row {
            if is_missing(v) {
                values.append_null();
            } else {
                values.append_value(v);
            }
        }
        builder.append(true);
    }
    builder.finish()
}

/// Write a collection as Parquet with `id`, `polarity`, `mz` and
/// `intensity` columns, the layout [`super::loader::load_file`] reads.
pub fn write_collection_parquet(collection: &SpectrumCollection, path: &Path) -> Result<()> {
    let item = Arc::new(Field::new("item", DataType::Float64, true));
    let schema = Arc::new(Schema::new(vec![
        Field::new(ID_COLUMN, DataType::Utf8, false),
        Field::new(POLARITY_COLUMN, DataType::Utf8, false),
        Field::new(MZ_COLUMN, DataType::List(item.clone()), false),
        Field::new(INTENSITY_COLUMN, DataType::List(item), false),
    ]));

    let ids = StringArray::from(collection.ids());
    let polarities = StringArray::from(
        collection
            .iter()
            .map(|sp| sp.polarity.to_string())
            .collect::<Vec<_>>(),
    );
    let mz = list_column(collection.iter().map(|sp| sp.masses.as_slice()));
    let intensity = list_column(collection.iter().map(|sp| sp.intensities.as_slice()));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(ids),
            Arc::new(polarities),
            Arc::new(mz),
            Arc::new(intensity),
        ],
    )?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    log::info!("Wrote {} spectra to {}", collection.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_file;
    use crate::data::model::{Polarity, Spectrum};
    use crate::data::table::MISSING;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("dims_align_writer_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_parquet_round_trip_through_loader() {
        let coll = SpectrumCollection::new(vec![
            Spectrum::new("a", vec![100.0, 101.0], vec![1.0, MISSING]).with_polarity(Polarity::Positive),
            Spectrum::new("b", vec![100.0, 101.0], vec![3.0, 4.0]).with_polarity(Polarity::Negative),
        ])
        .unwrap();

        let path = temp_path("round_trip.parquet");
        write_collection_parquet(&coll, &path).unwrap();
        let loaded = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.ids(), vec!["a", "b"]);
        let a = loaded.get("a").unwrap();
        assert_eq!(a.polarity, Polarity::Positive);
        assert_eq!(a.masses, vec![100.0, 101.0]);
        assert_eq!(a.intensities[0], 1.0);
        assert!(a.intensities[1].is_nan());
        assert_eq!(loaded.get("b").unwrap().intensities, vec![3.0, 4.0]);
    }

    #[test]
    fn test_table_csv_layout() {
        let table = IntensityTable::new(
            vec!["a".into(), "b".into()],
            vec![100.0, 100.5],
            vec![vec![1.0, MISSING], vec![2.0, 3.5]],
        )
        .unwrap();

        let path = temp_path("table.csv");
        write_table_csv(&table, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["id,100,100.5", "a,1,", "b,2,3.5"]);
    }
}
