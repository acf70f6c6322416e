//! The `results` section: reference events and the tolerance comparison.

use serde::Deserialize;

use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::enums::EventType;
use actus_core::types::time::ActusDateTime;

/// Absolute tolerance of the cross-validation comparison.
pub const ABSOLUTE_TOLERANCE: f64 = 1.0;
/// Relative tolerance of the cross-validation comparison.
pub const RELATIVE_TOLERANCE: f64 = 1e-4;

/// One reference event from a cross-validation case.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceEvent {
    /// Event time.
    pub time: ActusDateTime,
    /// Event kind code.
    #[serde(rename = "type")]
    pub event_kind: EventType,
    /// Expected payoff.
    #[serde(default)]
    pub payoff: f64,
    /// Expected notional after the event.
    #[serde(rename = "notionalPrincipal")]
    pub notional_principal: Option<f64>,
    /// Expected nominal rate after the event.
    #[serde(rename = "nominalInterestRate")]
    pub nominal_interest_rate: Option<f64>,
    /// Expected accrued interest after the event.
    #[serde(rename = "accruedInterest")]
    pub accrued_interest: Option<f64>,
}

/// A divergence between a simulated event and its reference.
#[derive(Debug, Clone)]
pub struct Mismatch {
    /// Index in the reference list.
    pub index: usize,
    /// Event time of the reference entry.
    pub time: ActusDateTime,
    /// Which quantity diverged.
    pub field: &'static str,
    /// Simulated value (`NaN` for a missing event).
    pub actual: f64,
    /// Reference value.
    pub expected: f64,
}

/// True when `actual` matches `expected` within the suite tolerance:
/// the larger of the absolute and the relative bound.
pub fn within_tolerance(actual: f64, expected: f64) -> bool {
    let bound = ABSOLUTE_TOLERANCE.max(RELATIVE_TOLERANCE * expected.abs());
    (actual - expected).abs() <= bound
}

/// Compares simulated events against the reference list.
///
/// Reference entries are matched by `(time, kind)` in order; a reference
/// entry with no simulated counterpart reports a `missing event` mismatch.
/// Simulated events with no reference entry (analysis events, resets) are
/// not reported; the reference lists only the flows the suite checks.
pub fn compare(actual: &[ContractEvent], expected: &[ReferenceEvent]) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    for (index, reference) in expected.iter().enumerate() {
        let found = actual
            .iter()
            .find(|e| e.event_time == reference.time && e.event_kind == reference.event_kind);
        let Some(event) = found else {
            mismatches.push(Mismatch {
                index,
                time: reference.time,
                field: "missing event",
                actual: f64::NAN,
                expected: reference.payoff,
            });
            continue;
        };
        check(&mut mismatches, index, reference, "payoff", event.payoff, Some(reference.payoff));
        let post = event.state_post;
        check(
            &mut mismatches,
            index,
            reference,
            "notionalPrincipal",
            state_cell(post, |s| s.notional.abs()),
            reference.notional_principal.map(f64::abs),
        );
        check(
            &mut mismatches,
            index,
            reference,
            "nominalInterestRate",
            state_cell(post, |s| s.nominal_rate),
            reference.nominal_interest_rate,
        );
        check(
            &mut mismatches,
            index,
            reference,
            "accruedInterest",
            state_cell(post, |s| s.accrued_interest.abs()),
            reference.accrued_interest.map(f64::abs),
        );
    }
    mismatches
}

fn state_cell(state: Option<ContractState>, cell: impl Fn(&ContractState) -> f64) -> f64 {
    state.as_ref().map(cell).unwrap_or(f64::NAN)
}

fn check(
    mismatches: &mut Vec<Mismatch>,
    index: usize,
    reference: &ReferenceEvent,
    field: &'static str,
    actual: f64,
    expected: Option<f64>,
) {
    let Some(expected) = expected else {
        return;
    };
    if !within_tolerance(actual, expected) {
        mismatches.push(Mismatch {
            index,
            time: reference.time,
            field,
            actual,
            expected,
        });
    }
}
