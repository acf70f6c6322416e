//! Contract events and their ordering.

use crate::state::ContractState;
use crate::types::enums::EventType;
use crate::types::time::ActusDateTime;

/// A single contract event: a timestamp, an event kind, a payoff and the
/// pre/post state snapshots.
///
/// `calculation_time` equals `event_time` except under calculate/shift
/// business-day conventions, where accrual runs on the unshifted schedule
/// date while reporting and settlement use the shifted one.
///
/// Events are ordered by `(event_time, priority rank, sequence)`; the
/// sequence number breaks ties between events of equal time and priority.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContractEvent {
    /// Event kind.
    pub event_kind: EventType,
    /// Reporting/settlement time.
    pub event_time: ActusDateTime,
    /// Accrual time (unshifted schedule date under CS conventions).
    pub calculation_time: ActusDateTime,
    /// Tie-breaker for events with equal time and priority.
    pub sequence: u32,
    /// Cash flow generated by the event; zero in pre-simulation schedules.
    pub payoff: f64,
    /// Currency of the payoff.
    pub currency: String,
    /// State before the event.
    pub state_pre: Option<ContractState>,
    /// State after the event.
    pub state_post: Option<ContractState>,
}

impl ContractEvent {
    /// Creates a scheduled (not yet evaluated) event: zero payoff, no state
    /// snapshots, calculation time equal to event time.
    pub fn scheduled(event_kind: EventType, event_time: ActusDateTime, currency: &str) -> Self {
        ContractEvent {
            event_kind,
            event_time,
            calculation_time: event_time,
            sequence: 0,
            payoff: 0.0,
            currency: currency.to_string(),
            state_pre: None,
            state_post: None,
        }
    }

    /// Sets a calculation time differing from the event time.
    pub fn with_calculation_time(mut self, calculation_time: ActusDateTime) -> Self {
        self.calculation_time = calculation_time;
        self
    }

    /// The total-order key `(event_time, priority rank, sequence)`.
    pub fn order_key(&self) -> (ActusDateTime, u8, u32) {
        (self.event_time, self.event_kind.priority(), self.sequence)
    }
}

/// Sorts events into evaluation order and reassigns sequence numbers.
///
/// The sort is stable, so events of equal time and priority keep their
/// insertion order; sequence numbers then record the final position.
pub fn sort_events(events: &mut Vec<ContractEvent>) {
    events.sort_by_key(|e| e.order_key());
    for (i, event) in events.iter_mut().enumerate() {
        event.sequence = i as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> ActusDateTime {
        ActusDateTime::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_scheduled_event_defaults() {
        let ev = ContractEvent::scheduled(EventType::Ip, d(2024, 7, 15), "USD");
        assert_eq!(ev.payoff, 0.0);
        assert_eq!(ev.calculation_time, ev.event_time);
        assert!(ev.state_pre.is_none());
        assert!(ev.state_post.is_none());
    }

    #[test]
    fn test_sort_by_time_then_priority() {
        let mut events = vec![
            ContractEvent::scheduled(EventType::Md, d(2025, 1, 15), "USD"),
            ContractEvent::scheduled(EventType::Ip, d(2024, 7, 15), "USD"),
            ContractEvent::scheduled(EventType::Rr, d(2024, 7, 15), "USD"),
            ContractEvent::scheduled(EventType::Ied, d(2024, 1, 15), "USD"),
        ];
        sort_events(&mut events);
        let kinds: Vec<EventType> = events.iter().map(|e| e.event_kind).collect();
        assert_eq!(
            kinds,
            vec![EventType::Ied, EventType::Ip, EventType::Rr, EventType::Md]
        );
        // Sequence numbers follow the final order.
        assert_eq!(
            events.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_ip_runs_before_rr_at_same_time() {
        let mut events = vec![
            ContractEvent::scheduled(EventType::Rr, d(2024, 7, 15), "USD"),
            ContractEvent::scheduled(EventType::Ip, d(2024, 7, 15), "USD"),
        ];
        sort_events(&mut events);
        assert_eq!(events[0].event_kind, EventType::Ip);
        assert_eq!(events[1].event_kind, EventType::Rr);
    }

    #[test]
    fn test_stable_within_equal_priority() {
        let mut first = ContractEvent::scheduled(EventType::Std, d(2024, 7, 15), "EUR");
        first.payoff = 1.0;
        let mut second = ContractEvent::scheduled(EventType::Std, d(2024, 7, 15), "USD");
        second.payoff = 2.0;
        let mut events = vec![first, second];
        sort_events(&mut events);
        assert_eq!(events[0].currency, "EUR");
        assert_eq!(events[1].currency, "USD");
    }

    #[test]
    fn test_order_key_is_non_decreasing_after_sort() {
        let mut events = vec![
            ContractEvent::scheduled(EventType::Sc, d(2024, 3, 1), "USD"),
            ContractEvent::scheduled(EventType::Fp, d(2024, 3, 1), "USD"),
            ContractEvent::scheduled(EventType::Ad, d(2024, 3, 1), "USD"),
            ContractEvent::scheduled(EventType::Pr, d(2024, 2, 1), "USD"),
        ];
        sort_events(&mut events);
        for pair in events.windows(2) {
            assert!(pair[0].order_key() <= pair[1].order_key());
        }
    }
}
