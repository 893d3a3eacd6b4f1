use chrono::NaiveDate;

use crate::models::{CaseBundle, DimensionScore, Event};

use super::{ReferenceAnnotations, NEUTRAL_COMPONENT};

const RESOLVED_WEIGHT: f64 = 0.4;
const ACCURACY_WEIGHT: f64 = 0.3;
const SEQUENCE_WEIGHT: f64 = 0.3;

/// A date within this many days of a reference date counts as correct.
pub const DATE_TOLERANCE_DAYS: i64 = 1;

fn non_decreasing_fraction(dates: &[NaiveDate]) -> f64 {
    if dates.len() < 2 {
        return 1.0;
    }
    let ordered = dates.windows(2).filter(|w| w[0] <= w[1]).count();
    ordered as f64 / (dates.len() - 1) as f64
}

fn is_future(event: &Event) -> bool {
    event
        .attributes
        .get("future_date")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Accuracy against reference dates, or internal consistency without them.
pub fn accuracy(events: &[Event], reference: Option<&ReferenceAnnotations>) -> f64 {
    let dated: Vec<&Event> = events.iter().filter(|e| e.is_dated()).collect();
    if dated.is_empty() {
        return 0.0;
    }
    if let Some(reference) = reference.filter(|r| !r.dates.is_empty()) {
        let close = dated
            .iter()
            .filter_map(|e| e.normalized_date)
            .filter(|d| {
                reference
                    .dates
                    .iter()
                    .any(|r| (*d - *r).num_days().abs() <= DATE_TOLERANCE_DAYS)
            })
            .count();
        return close as f64 / dated.len() as f64;
    }
    if dated.len() < 2 {
        let plausible = dated.iter().filter(|e| !is_future(e)).count();
        return plausible as f64 / dated.len() as f64;
    }
    let mut by_position = dated.clone();
    by_position.sort_by_key(|e| e.position.start);
    let dates: Vec<NaiveDate> = by_position.iter().filter_map(|e| e.normalized_date).collect();
    non_decreasing_fraction(&dates)
}

/// Adjacent timeline pairs in order, undated events trailing.
pub fn sequence_consistency(events: &[Event]) -> f64 {
    if events.len() < 2 {
        return if events.is_empty() { 0.0 } else { NEUTRAL_COMPONENT };
    }
    let ordered = events
        .windows(2)
        .filter(|w| match (w[0].normalized_date, w[1].normalized_date) {
            (Some(a), Some(b)) => a <= b,
            (None, Some(_)) => false,
            _ => true,
        })
        .count();
    ordered as f64 / (events.len() - 1) as f64
}

pub fn score(bundle: &CaseBundle, reference: Option<&ReferenceAnnotations>) -> DimensionScore {
    let events = &bundle.events;
    let resolved = if events.is_empty() {
        0.0
    } else {
        events.iter().filter(|e| e.is_dated()).count() as f64 / events.len() as f64
    };
    DimensionScore::weighted(&[
        ("resolvedFraction", resolved, RESOLVED_WEIGHT),
        ("dateAccuracy", accuracy(events, reference), ACCURACY_WEIGHT),
        ("sequenceConsistency", sequence_consistency(events), SEQUENCE_WEIGHT),
    ])
}
