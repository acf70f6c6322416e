//! Behavioral observers.
//!
//! A behavioral observer is a market observer that can additionally inject
//! *callout events* — prepayments, deposits, withdrawals, exercises, credit
//! events — into a contract's schedule before lifecycle evaluation begins.

use crate::attributes::ContractAttributes;
use crate::observers::market::MarketObserver;
use crate::types::enums::EventType;
use crate::types::error::ObserverError;
use crate::types::time::ActusDateTime;

/// An event a behavioral observer asks to merge into the schedule.
///
/// `payoff_hint` carries the observed amount (e.g. the prepaid principal or
/// the deposited amount). For credit events (kind CE) the hint encodes
/// severity: 1 → delayed, 2 → delinquent, anything else → default.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalloutEvent {
    /// When the event occurs.
    pub time: ActusDateTime,
    /// Which event kind is injected.
    pub event_kind: EventType,
    /// Observed amount (or severity for credit events).
    pub payoff_hint: f64,
}

/// A market observer that declares callout events at schedule-generation
/// time.
pub trait BehaviorObserver: MarketObserver {
    /// Callout events for the given contract, in any order.
    fn callout_events(&self, attributes: &ContractAttributes) -> Vec<CalloutEvent>;

    /// The observed amount for a specific injected event, if any.
    ///
    /// Payoff functions of behavioral events (PP, PR, PI, XD) use this to
    /// recover the amount the callout declared.
    fn event_amount(
        &self,
        _contract_id: &str,
        _event_kind: EventType,
        _at: ActusDateTime,
    ) -> Option<f64> {
        None
    }
}

/// Concrete behavioral observer: a wrapped market observer plus a per
/// contract list of callouts.
///
/// # Examples
///
/// ```
/// use actus_core::observers::behavior::{BehavioralOverlay, CalloutEvent, BehaviorObserver};
/// use actus_core::observers::market::ConstantObserver;
/// use actus_core::types::enums::EventType;
/// use actus_core::types::time::ActusDateTime;
///
/// let t = ActusDateTime::from_ymd(2024, 7, 1).unwrap();
/// let mut overlay = BehavioralOverlay::new(ConstantObserver::new(0.0));
/// overlay.add_callout("LOAN-1", CalloutEvent {
///     time: t,
///     event_kind: EventType::Pp,
///     payoff_hint: 10_000.0,
/// });
/// assert_eq!(overlay.event_amount("LOAN-1", EventType::Pp, t), Some(10_000.0));
/// ```
pub struct BehavioralOverlay<M: MarketObserver> {
    market: M,
    callouts: Vec<(String, CalloutEvent)>,
}

impl<M: MarketObserver> BehavioralOverlay<M> {
    /// Wraps a market observer with an empty callout list.
    pub fn new(market: M) -> Self {
        BehavioralOverlay {
            market,
            callouts: Vec::new(),
        }
    }

    /// Declares a callout for the given contract id.
    pub fn add_callout(&mut self, contract_id: impl Into<String>, callout: CalloutEvent) {
        self.callouts.push((contract_id.into(), callout));
    }
}

impl<M: MarketObserver> MarketObserver for BehavioralOverlay<M> {
    fn observe(&self, identifier: &str, at: ActusDateTime) -> Result<Option<f64>, ObserverError> {
        self.market.observe(identifier, at)
    }
}

impl<M: MarketObserver> BehaviorObserver for BehavioralOverlay<M> {
    fn callout_events(&self, attributes: &ContractAttributes) -> Vec<CalloutEvent> {
        self.callouts
            .iter()
            .filter(|(id, _)| id == &attributes.contract_id)
            .map(|(_, c)| *c)
            .collect()
    }

    fn event_amount(
        &self,
        contract_id: &str,
        event_kind: EventType,
        at: ActusDateTime,
    ) -> Option<f64> {
        self.callouts
            .iter()
            .find(|(id, c)| id == contract_id && c.event_kind == event_kind && c.time == at)
            .map(|(_, c)| c.payoff_hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observers::market::ConstantObserver;
    use crate::types::enums::{ContractRole, ContractType};

    fn d(y: i32, m: u32, day: u32) -> ActusDateTime {
        ActusDateTime::from_ymd(y, m, day).unwrap()
    }

    fn attrs(id: &str) -> ContractAttributes {
        ContractAttributes::new(
            id,
            ContractType::Ump,
            ContractRole::Rpa,
            d(2024, 1, 1),
            "USD",
        )
    }

    #[test]
    fn test_callouts_filtered_by_contract() {
        let mut overlay = BehavioralOverlay::new(ConstantObserver::new(0.0));
        overlay.add_callout(
            "UMP-1",
            CalloutEvent {
                time: d(2024, 3, 1),
                event_kind: EventType::Pr,
                payoff_hint: 500.0,
            },
        );
        overlay.add_callout(
            "UMP-2",
            CalloutEvent {
                time: d(2024, 4, 1),
                event_kind: EventType::Pi,
                payoff_hint: 900.0,
            },
        );
        let events = overlay.callout_events(&attrs("UMP-1"));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_kind, EventType::Pr);
        assert!(overlay.callout_events(&attrs("UMP-3")).is_empty());
    }

    #[test]
    fn test_event_amount_lookup() {
        let mut overlay = BehavioralOverlay::new(ConstantObserver::new(0.0));
        overlay.add_callout(
            "CLM-1",
            CalloutEvent {
                time: d(2024, 6, 1),
                event_kind: EventType::Xd,
                payoff_hint: 0.0,
            },
        );
        assert_eq!(overlay.event_amount("CLM-1", EventType::Xd, d(2024, 6, 1)), Some(0.0));
        assert_eq!(overlay.event_amount("CLM-1", EventType::Xd, d(2024, 6, 2)), None);
        assert_eq!(overlay.event_amount("CLM-1", EventType::Pp, d(2024, 6, 1)), None);
    }

    #[test]
    fn test_market_delegation() {
        let overlay = BehavioralOverlay::new(ConstantObserver::new(0.07));
        assert_eq!(overlay.get("ANY", d(2024, 1, 1)).unwrap(), 0.07);
    }
}
