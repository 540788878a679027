use statrs::statistics::Statistics;

use crate::config::ImputationMethod;
use crate::data::table::IntensityTable;
use crate::state::Notice;

/// Fill every missing cell with the mean of the observed values in its
/// column. Columns with nothing observed cannot be filled and are
/// removed; the count of such columns is returned.
fn fill_column_means(table: &mut IntensityTable) -> usize {
    let means: Vec<Option<f64>> = (0..table.n_cols())
        .map(|col| {
            let observed = table.observed(col);
            (!observed.is_empty()).then(|| observed.iter().mean())
        })
        .collect();

    for (col, mean) in means.iter().enumerate() {
        if let Some(mean) = mean {
            table.fill_column(col, *mean);
        }
    }

    let keep: Vec<bool> = means.iter().map(Option::is_some).collect();
    let empty = keep.iter().filter(|k| !**k).count();
    if empty > 0 {
        table.retain_columns(&keep);
    }
    empty
}

/// Drop columns observed in fewer than `occupancy_threshold` of the rows,
/// then fill the remaining gaps with `method`.
///
/// Returns notices describing what was dropped or could not be done.
pub fn impute_table(
    table: &mut IntensityTable,
    method: ImputationMethod,
    occupancy_threshold: f64,
) -> Vec<Notice> {
    let mut notices = Vec::new();

    let dropped = table.drop_sparse_columns(occupancy_threshold);
    log::debug!(
        "Occupancy filter at {occupancy_threshold}: kept {} columns, dropped {}",
        table.n_cols(),
        dropped.len()
    );
    if !dropped.is_empty() {
        notices.push(Notice::SparseColumnsDropped(dropped.len()));
    }

    match method {
        ImputationMethod::ColumnMean => {
            let empty = fill_column_means(table);
            if empty > 0 {
                notices.push(Notice::EmptyColumnsDropped(empty));
            }
        }
        ImputationMethod::HalfMinimum => match table.min_value() {
            Some(min) => table.fill_all(min / 2.0),
            None if table.has_missing() => notices.push(Notice::NothingToImpute),
            None => {}
        },
    }

    notices
}
