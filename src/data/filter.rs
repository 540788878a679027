use super::model::{Polarity, SpectrumCollection};

// ---------------------------------------------------------------------------
// Polarity selection
// ---------------------------------------------------------------------------

/// One flag per spectrum, in collection order: `true` when the spectrum
/// was acquired in `polarity`.
///
/// Spectra of unknown polarity never match.
pub fn usable_mask(collection: &SpectrumCollection, polarity: Polarity) -> Vec<bool> {
    collection
        .iter()
        .map(|sp| polarity != Polarity::Unknown && sp.polarity == polarity)
        .collect()
}

/// Indices of spectra matching `polarity`.
pub fn usable_indices(collection: &SpectrumCollection, polarity: Polarity) -> Vec<usize> {
    usable_mask(collection, polarity)
        .into_iter()
        .enumerate()
        .filter(|(_, usable)| *usable)
        .map(|(i, _)| i)
        .collect()
}

/// Drop every spectrum not acquired in `polarity`. Returns the removed ids.
pub fn limit_polarity(collection: &mut SpectrumCollection, polarity: Polarity) -> Vec<String> {
    let removed: Vec<String> = collection
        .iter()
        .zip(usable_mask(collection, polarity))
        .filter(|(_, usable)| !usable)
        .map(|(sp, _)| sp.id.clone())
        .collect();

    if !removed.is_empty() {
        log::info!(
            "Polarity filter ({polarity}) removed {} of {} spectra",
            removed.len(),
            collection.len()
        );
    }
    collection.retain(|sp| sp.polarity == polarity && polarity != Polarity::Unknown);
    removed
}
