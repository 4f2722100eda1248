//! Distance-weighted choice of a mosquito's next location.
//!
//! Every candidate of the target kind gets weight `exp(-decay * distance)` from the
//! mosquito's current location. Protected households get weight zero and so can never be
//! chosen.
use rand::Rng;

use crate::error::MalariaError;
use crate::world::{Location, LocationId, LocationIndex, LocationKind};

/// Selection weight of every location of `kind`, in id order, as seen from `from`.
#[must_use]
pub fn destination_weights(
    locations: &LocationIndex,
    from: &Location,
    kind: LocationKind,
    decay: f64,
) -> Vec<f64> {
    locations
        .locations(kind)
        .iter()
        .map(|candidate| {
            if candidate.is_protected() {
                0.0
            } else {
                (-decay * from.distance_to(candidate)).exp()
            }
        })
        .collect()
}

/// Inverse-CDF walk: the first index with positive weight whose cumulative weight reaches
/// `draw`. Falls back to the last positive-weight index when rounding leaves `draw` above
/// the final cumulative sum. `None` if every weight is zero.
#[must_use]
pub fn pick_cumulative(weights: &[f64], draw: f64) -> Option<usize> {
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (index, &weight) in weights.iter().enumerate() {
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = Some(index);
        if draw <= cumulative {
            return Some(index);
        }
    }
    last_positive
}

/// Samples a location of `kind` for an agent currently at `current`. Returns `current`
/// unchanged, without drawing, when no candidate has positive weight.
///
/// # Errors
///
/// `InvalidLocationId` if `current` does not exist.
pub fn select_destination<R: Rng + ?Sized>(
    locations: &LocationIndex,
    current: LocationId,
    kind: LocationKind,
    decay: f64,
    rng: &mut R,
) -> Result<LocationId, MalariaError> {
    let from = locations.lookup(current)?;
    let weights = destination_weights(locations, from, kind, decay);
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Ok(current);
    }
    let draw = rng.random::<f64>() * total;
    Ok(pick_cumulative(&weights, draw).map_or(current, |index| LocationId::new(kind, index)))
}

/// A location of `kind` chosen uniformly at random.
///
/// # Errors
///
/// `InvalidLocationId` if there are no locations of `kind`.
pub fn random_location<R: Rng + ?Sized>(
    locations: &LocationIndex,
    kind: LocationKind,
    rng: &mut R,
) -> Result<LocationId, MalariaError> {
    let count = locations.len(kind);
    if count == 0 {
        return Err(MalariaError::InvalidLocationId(format!("there is no {kind}")));
    }
    Ok(LocationId::new(kind, rng.random_range(0..count)))
}
