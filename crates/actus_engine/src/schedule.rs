//! Schedule generation: cycle expansion and event construction.

use actus_core::attributes::ContractAttributes;
use actus_core::event::ContractEvent;
use actus_core::time::business_day::adjust_event;
use actus_core::types::cycle::{Cycle, StubConvention};
use actus_core::types::enums::{EndOfMonthConvention, EventType};
use actus_core::types::time::ActusDateTime;

/// Expands `anchor + k * cycle` up to `end`.
///
/// Dates are computed from the anchor directly, never by incrementing the
/// previous date, so month-end clamping cannot drift. `end` is included when
/// it lies on-cycle. Otherwise the stub convention decides: a short stub
/// appends `end` after the last on-cycle date, a long stub replaces the last
/// on-cycle date with `end`.
///
/// With no cycle the schedule is the anchor alone. An anchor after `end`
/// yields an empty schedule.
///
/// # Examples
///
/// ```
/// use actus_engine::schedule::expand_cycle;
/// use actus_core::types::cycle::Cycle;
/// use actus_core::types::enums::EndOfMonthConvention;
/// use actus_core::types::time::ActusDateTime;
///
/// let anchor = ActusDateTime::from_ymd(2024, 1, 15).unwrap();
/// let end = ActusDateTime::from_ymd(2025, 1, 15).unwrap();
/// let cycle: Cycle = "6M".parse().unwrap();
/// let dates = expand_cycle(anchor, Some(&cycle), end, EndOfMonthConvention::SameDay);
/// assert_eq!(dates.len(), 3); // Jan, Jul, Jan
/// ```
pub fn expand_cycle(
    anchor: ActusDateTime,
    cycle: Option<&Cycle>,
    end: ActusDateTime,
    eom: EndOfMonthConvention,
) -> Vec<ActusDateTime> {
    if anchor > end {
        return Vec::new();
    }
    let Some(cycle) = cycle else {
        return vec![anchor];
    };

    let mut dates = Vec::new();
    let mut k = 0u32;
    loop {
        let date = cycle.date_at(anchor, k, eom);
        if date > end {
            break;
        }
        dates.push(date);
        k += 1;
    }

    match dates.last().copied() {
        Some(last) if last == end => {}
        Some(_) => match cycle.stub() {
            StubConvention::Short => dates.push(end),
            StubConvention::Long => {
                if dates.len() > 1 {
                    let n = dates.len();
                    dates[n - 1] = end;
                } else {
                    dates.push(end);
                }
            }
        },
        None => {}
    }
    dates
}

/// Expands an array schedule: each `(anchor, cycle)` pair generates a
/// sub-schedule running to the next anchor (exclusive), the last one to
/// `end`; `end` itself is always included.
pub fn expand_array(
    anchors: &[ActusDateTime],
    cycles: &[Cycle],
    end: ActusDateTime,
    eom: EndOfMonthConvention,
) -> Vec<ActusDateTime> {
    let mut dates = Vec::new();
    for (i, &anchor) in anchors.iter().enumerate() {
        let sub_end = anchors.get(i + 1).copied().unwrap_or(end);
        let sub = expand_cycle(anchor, cycles.get(i), sub_end, eom);
        for date in sub {
            if date < sub_end || (i + 1 == anchors.len() && date <= end) {
                dates.push(date);
            }
        }
    }
    if !dates.contains(&end) && anchors.first().map(|&a| a <= end).unwrap_or(false) {
        dates.push(end);
    }
    dates.sort();
    dates.dedup();
    dates
}

/// Accumulates schedule events, applying the contract's business-day
/// convention and currency to each date.
pub(crate) struct EventBuilder<'a> {
    attrs: &'a ContractAttributes,
    events: Vec<ContractEvent>,
}

impl<'a> EventBuilder<'a> {
    pub(crate) fn new(attrs: &'a ContractAttributes) -> Self {
        EventBuilder {
            attrs,
            events: Vec::new(),
        }
    }

    /// Pushes an event at `date`, business-day adjusted. Under calculate/
    /// shift conventions the unshifted date is kept as calculation time.
    pub(crate) fn push(&mut self, kind: EventType, date: ActusDateTime) {
        let adjusted = adjust_event(date, self.attrs.business_day_convention, self.attrs.calendar);
        self.events.push(
            ContractEvent::scheduled(kind, adjusted.event_time, &self.attrs.currency)
                .with_calculation_time(adjusted.calculation_time),
        );
    }

    /// Pushes an event at `date` with no adjustment (purchase, termination
    /// and settlement dates are contractual, not cyclical).
    pub(crate) fn push_unadjusted(&mut self, kind: EventType, date: ActusDateTime) {
        self.events
            .push(ContractEvent::scheduled(kind, date, &self.attrs.currency));
    }

    /// Pushes an event with an explicit currency (FX legs).
    pub(crate) fn push_with_currency(
        &mut self,
        kind: EventType,
        date: ActusDateTime,
        currency: &str,
    ) {
        self.events
            .push(ContractEvent::scheduled(kind, date, currency));
    }

    pub(crate) fn into_events(self) -> Vec<ContractEvent> {
        self.events
    }
}
