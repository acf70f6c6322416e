//! The lifecycle engine: drive the event list in priority order, applying
//! payoff then state transition and threading state through the events.

use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;
use tracing::{debug, debug_span};

use crate::contracts::{SimContext, VariantLogic};

/// The materialized result of simulating one contract.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// The simulated contract.
    pub contract_id: String,
    /// The contract's settlement currency.
    pub currency: String,
    /// All events in evaluation order, with payoffs and state snapshots.
    pub events: Vec<ContractEvent>,
}

impl SimulationResult {
    /// Sum of all payoffs.
    pub fn total_payoff(&self) -> f64 {
        self.events.iter().map(|e| e.payoff).sum()
    }

    /// The cash-flow timeline `(time, payoff, currency)`.
    pub fn cashflows(&self) -> Vec<(ActusDateTime, f64, &str)> {
        self.events
            .iter()
            .map(|e| (e.event_time, e.payoff, e.currency.as_str()))
            .collect()
    }

    /// The state after the last event, if any event ran.
    pub fn final_state(&self) -> Option<&ContractState> {
        self.events.last().and_then(|e| e.state_post.as_ref())
    }
}

/// Runs the lifecycle over a sorted schedule.
///
/// For each event: compute the payoff from the pre-event state, compute the
/// post state, emit the materialized event, thread the state forward.
/// `state_pre` of each event equals `state_post` of its predecessor exactly;
/// accrual happens inside the transition functions.
pub(crate) fn run(
    variant: &dyn VariantLogic,
    ctx: &SimContext,
    schedule: Vec<ContractEvent>,
    initial_state: ContractState,
) -> Result<SimulationResult, EngineError> {
    let span = debug_span!("simulate", contract_id = %ctx.attrs.contract_id);
    let _guard = span.enter();

    let mut state = initial_state;
    let mut events = Vec::with_capacity(schedule.len());
    for mut event in schedule {
        let payoff = variant.payoff(&event, &state, ctx)?;
        let state_post = variant.transition(&event, &state, ctx)?;
        debug!(
            kind = %event.event_kind,
            time = %event.event_time,
            payoff,
            notional = state_post.notional,
            "event evaluated"
        );
        event.payoff = payoff;
        event.state_pre = Some(state);
        event.state_post = Some(state_post);
        events.push(event);
        state = state_post;
    }

    Ok(SimulationResult {
        contract_id: ctx.attrs.contract_id.clone(),
        currency: ctx.attrs.currency.clone(),
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actus_core::types::enums::EventType;

    fn d(y: i32, m: u32, day: u32) -> ActusDateTime {
        ActusDateTime::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_result_helpers() {
        let mut first = ContractEvent::scheduled(EventType::Ied, d(2024, 1, 15), "USD");
        first.payoff = -100.0;
        first.state_post = Some(ContractState::new(d(2024, 1, 15)));
        let mut second = ContractEvent::scheduled(EventType::Md, d(2025, 1, 15), "USD");
        second.payoff = 105.0;
        second.state_post = Some(ContractState::new(d(2025, 1, 15)));

        let result = SimulationResult {
            contract_id: "C-1".to_string(),
            currency: "USD".to_string(),
            events: vec![first, second],
        };
        assert_eq!(result.total_payoff(), 5.0);
        assert_eq!(result.cashflows().len(), 2);
        assert_eq!(
            result.final_state().unwrap().status_date,
            d(2025, 1, 15)
        );
    }
}
