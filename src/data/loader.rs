use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, Float32Array, Float64Array, LargeListArray, ListArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Polarity, Spectrum, SpectrumCollection};

pub const ID_COLUMN: &str = "id";
pub const POLARITY_COLUMN: &str = "polarity";
pub const MZ_COLUMN: &str = "mz";
pub const INTENSITY_COLUMN: &str = "intensity";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a spectrum collection from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – `mz` / `intensity` list columns plus `id`, `polarity` (recommended)
/// * `.json`    – `[{ "id": "...", "mz": [...], "intensity": [...] }, ...]`
/// * `.csv`     – `mz` and `intensity` columns holding semicolon-separated floats
///
/// A missing `id` falls back to `spectrum_<row>`, a missing `polarity`
/// to [`Polarity::Unknown`].
pub fn load_file(path: &Path) -> Result<SpectrumCollection> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let spectra = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    log::info!("Loaded {} spectra from {}", spectra.len(), path.display());
    SpectrumCollection::new(spectra).with_context(|| format!("validating {}", path.display()))
}

fn default_id(row: usize) -> String {
    format!("spectrum_{row}")
}

fn check_lengths(row: usize, mz: &[f64], intensity: &[f64]) -> Result<()> {
    if mz.len() != intensity.len() {
        bail!(
            "Row {row}: mz has {} values but intensity has {}",
            mz.len(),
            intensity.len()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON:
///
/// ```json
/// [
///   { "id": "S01", "polarity": "positive", "mz": [100.1, 100.2], "intensity": [5.0, 7.5] },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<Spectrum>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut spectra = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let masses = json_array_to_f64(obj.get(MZ_COLUMN), i, MZ_COLUMN)?;
        let intensities = json_array_to_f64(obj.get(INTENSITY_COLUMN), i, INTENSITY_COLUMN)?;
        check_lengths(i, &masses, &intensities)?;

        let id = match obj.get(ID_COLUMN) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            _ => default_id(i),
        };
        let polarity = obj
            .get(POLARITY_COLUMN)
            .and_then(|v| v.as_str())
            .map(parse_polarity)
            .unwrap_or_default();

        spectra.push(Spectrum { id, polarity, masses, intensities });
    }

    Ok(spectra)
}

fn json_array_to_f64(val: Option<&JsonValue>, row: usize, col: &str) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("Row {row}: missing or invalid '{col}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| match v {
            JsonValue::Null => Ok(f64::NAN),
            _ => v
                .as_f64()
                .with_context(|| format!("Row {row}, {col}[{j}]: not a number")),
        })
        .collect()
}

fn parse_polarity(s: &str) -> Polarity {
    s.parse().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names.
/// `mz` and `intensity` columns contain semicolon-separated floats:
///   `"100.1;100.2;100.3"`, `"5.0;7.5;2.0"`
/// `id` and `polarity` are optional; other columns are ignored.
fn load_csv(path: &Path) -> Result<Vec<Spectrum>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let mz_idx = column(MZ_COLUMN).context("CSV missing 'mz' column")?;
    let intensity_idx = column(INTENSITY_COLUMN).context("CSV missing 'intensity' column")?;
    let id_idx = column(ID_COLUMN);
    let polarity_idx = column(POLARITY_COLUMN);

    let mut spectra = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let masses = parse_semicolon_floats(record.get(mz_idx).unwrap_or(""), row_no, MZ_COLUMN)?;
        let intensities = parse_semicolon_floats(
            record.get(intensity_idx).unwrap_or(""),
            row_no,
            INTENSITY_COLUMN,
        )?;
        check_lengths(row_no, &masses, &intensities)?;

        let id = id_idx
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_id(row_no));
        let polarity = polarity_idx
            .and_then(|i| record.get(i))
            .map(parse_polarity)
            .unwrap_or_default();

        spectra.push(Spectrum { id, polarity, masses, intensities });
    }

    Ok(spectra)
}

fn parse_semicolon_floats(s: &str, row: usize, col: &str) -> Result<Vec<f64>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            let tok = tok.trim();
            if tok.is_empty() || tok.eq_ignore_ascii_case("nan") {
                return Ok(f64::NAN);
            }
            tok.parse::<f64>()
                .with_context(|| format!("Row {row}, {col}[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing spectra.
///
/// Expected schema:
/// - `mz`: List<Float64> or LargeList<Float64> (Float32 inner values accepted)
/// - `intensity`: same layout as `mz`
/// - `id`, `polarity`: optional Utf8 columns
///
/// [`super::writer::write_collection_parquet`] produces this layout.
fn load_parquet(path: &Path) -> Result<Vec<Spectrum>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut spectra = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        read_batch(&batch, &mut spectra)?;
    }

    Ok(spectra)
}

/// Append the spectra of one record batch. Row numbers in errors and
/// default ids count from the start of the file, not of the batch.
fn read_batch(batch: &RecordBatch, spectra: &mut Vec<Spectrum>) -> Result<()> {
    let schema = batch.schema();

    let mz_idx = schema
        .index_of(MZ_COLUMN)
        .map_err(|_| anyhow::anyhow!("Parquet file missing 'mz' column"))?;
    let intensity_idx = schema
        .index_of(INTENSITY_COLUMN)
        .map_err(|_| anyhow::anyhow!("Parquet file missing 'intensity' column"))?;
    let id_col = schema.index_of(ID_COLUMN).ok().map(|i| batch.column(i));
    let polarity_col = schema.index_of(POLARITY_COLUMN).ok().map(|i| batch.column(i));

    let mz_col = batch.column(mz_idx);
    let intensity_col = batch.column(intensity_idx);

    for row in 0..batch.num_rows() {
        let global_row = spectra.len();
        let masses = extract_f64_list(mz_col, row)
            .with_context(|| format!("Row {global_row}: failed to read 'mz'"))?;
        let intensities = extract_f64_list(intensity_col, row)
            .with_context(|| format!("Row {global_row}: failed to read 'intensity'"))?;
        check_lengths(global_row, &masses, &intensities)?;

        let id = id_col
            .and_then(|c| extract_string(c, row))
            .unwrap_or_else(|| default_id(global_row));
        let polarity = polarity_col
            .and_then(|c| extract_string(c, row))
            .map(|s| parse_polarity(&s))
            .unwrap_or_default();

        spectra.push(Spectrum { id, polarity, masses, intensities });
    }
    Ok(())
}

// -- Parquet / Arrow helpers --

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    // Null entries become the missing marker
    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

/// Read a string cell (Utf8 or LargeUtf8); `None` for nulls and other types.
fn extract_string(col: &Arc<dyn Array>, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => Some(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        _ => None,
    }
}
