use crate::analysis::regions::Position;
use crate::analysis::scoring::PlacementOption;
use crate::analysis::PlacementMap;
use crate::error::{OverlayError, Result};

/// Pick one placement option from the analysis mapping.
///
/// A caller-preferred position with a valid option always wins,
/// regardless of score. Otherwise the highest score wins; strict ties go
/// to the position earliest in the canonical ordering, so repeated calls
/// with the same inputs always return the same choice.
pub fn select_placement<'a>(
    options: &'a PlacementMap,
    preferred: Option<Position>,
) -> Result<&'a PlacementOption> {
    if let Some(position) = preferred {
        return options
            .get(&position)
            .ok_or_else(|| OverlayError::PlacementNotFound(position.to_string()));
    }

    // BTreeMap iterates in canonical position order; only a strictly
    // greater score displaces the current best.
    let mut best: Option<&PlacementOption> = None;
    for option in options.values() {
        match best {
            Some(current) if option.score <= current.score => {}
            _ => best = Some(option),
        }
    }

    best.ok_or_else(|| OverlayError::PlacementNotFound("any".to_string()))
}
