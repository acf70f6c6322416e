//! Per-variant contract logic: schedules, payoff functions and state
//! transition functions.
//!
//! Each variant provides one record of four operations (schedule, state
//! initialisation, payoff, state transition). The registry is static:
//! [`variant_for`] maps a contract type to its record.

use actus_core::attributes::ContractAttributes;
use actus_core::event::ContractEvent;
use actus_core::observers::behavior::{BehaviorObserver, CalloutEvent};
use actus_core::observers::child::ChildContractObserver;
use actus_core::observers::market::MarketObserver;
use actus_core::state::ContractState;
use actus_core::types::enums::{ContractType, EventType, PenaltyType};
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

pub(crate) mod ann;
pub(crate) mod capfl;
pub(crate) mod cec;
pub(crate) mod ceg;
pub(crate) mod clm;
pub(crate) mod futur;
pub(crate) mod fxout;
pub(crate) mod lam;
pub(crate) mod lax;
pub(crate) mod nam;
pub(crate) mod optns;
pub(crate) mod pam;
pub(crate) mod positions;
pub(crate) mod swaps;
pub(crate) mod swppv;
pub(crate) mod ump;

/// Everything a payoff or state-transition function may consult.
pub struct SimContext<'a> {
    /// The contract terms.
    pub attrs: &'a ContractAttributes,
    /// Market data observer.
    pub market: &'a dyn MarketObserver,
    /// Behavioral observer, when one was attached.
    pub behavior: Option<&'a dyn BehaviorObserver>,
    /// Child-contract observer for composites.
    pub children: Option<&'a ChildContractObserver>,
}

impl SimContext<'_> {
    /// Observes a market identifier, total form (miss = 0.0).
    pub fn observe(&self, identifier: &str, at: ActusDateTime) -> Result<f64, EngineError> {
        Ok(self.market.get(identifier, at)?)
    }

    /// Observes a market identifier; `None` when no observer answers.
    pub fn observe_opt(
        &self,
        identifier: &str,
        at: ActusDateTime,
    ) -> Result<Option<f64>, EngineError> {
        Ok(self.market.observe(identifier, at)?)
    }

    /// The amount a behavioral callout declared for this event, if any.
    pub fn callout_amount(&self, kind: EventType, at: ActusDateTime) -> f64 {
        self.behavior
            .and_then(|b| b.event_amount(&self.attrs.contract_id, kind, at))
            .unwrap_or(0.0)
    }

    /// The behavioral callouts declared for this contract.
    pub fn callouts(&self) -> Vec<CalloutEvent> {
        self.behavior
            .map(|b| b.callout_events(self.attrs))
            .unwrap_or_default()
    }

    /// The child observer, or `MissingChild` naming the first referenced id.
    pub fn require_children(&self) -> Result<&ChildContractObserver, EngineError> {
        self.children.ok_or_else(|| EngineError::MissingChild {
            contract_id: self.attrs.contract_id.clone(),
            child_id: self
                .attrs
                .contract_structure
                .as_ref()
                .and_then(|s| s.referenced_ids().first().map(|id| id.to_string()))
                .unwrap_or_default(),
        })
    }

    /// A `NumericDomain` error carrying this event's context.
    pub fn numeric_domain(&self, event: &ContractEvent, reason: impl Into<String>) -> EngineError {
        EngineError::NumericDomain {
            contract_id: self.attrs.contract_id.clone(),
            event_kind: event.event_kind,
            event_time: event.event_time,
            reason: reason.into(),
        }
    }
}

/// The per-variant record of operations the factory resolves.
pub(crate) trait VariantLogic: Send + Sync {
    /// Type-specific attribute validation; factory stage.
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError>;

    /// Generates the scheduled events (payoffs zeroed, states unset).
    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError>;

    /// Initialises the state as of the status date.
    fn initial_state(&self, ctx: &SimContext) -> Result<ContractState, EngineError>;

    /// POF: the cash flow of `event` given the pre-event state.
    fn payoff(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        ctx: &SimContext,
    ) -> Result<f64, EngineError>;

    /// STF: the state after `event`.
    fn transition(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        ctx: &SimContext,
    ) -> Result<ContractState, EngineError>;
}

/// Static registry mapping a contract type to its variant record.
pub(crate) fn variant_for(contract_type: ContractType) -> &'static dyn VariantLogic {
    match contract_type {
        ContractType::Pam => &pam::Pam,
        ContractType::Lam => &lam::Lam,
        ContractType::Lax => &lax::Lax,
        ContractType::Nam => &nam::Nam,
        ContractType::Ann => &ann::Ann,
        ContractType::Clm => &clm::Clm,
        ContractType::Ump => &ump::Ump,
        ContractType::Csh => &positions::Csh,
        ContractType::Stk => &positions::Stk,
        ContractType::Com => &positions::Com,
        ContractType::Fxout => &fxout::Fxout,
        ContractType::Swppv => &swppv::Swppv,
        ContractType::Swaps => &swaps::Swaps,
        ContractType::Capfl => &capfl::Capfl,
        ContractType::Optns => &optns::Optns,
        ContractType::Futur => &futur::Futur,
        ContractType::Ceg => &ceg::Ceg,
        ContractType::Cec => &cec::Cec,
    }
}

/// Merges behavioral callouts of the allowed kinds into a variant's
/// schedule. A PP callout is followed by a PY event when the contract
/// carries penalty terms.
pub(crate) fn merge_callouts(
    events: &mut Vec<ContractEvent>,
    ctx: &SimContext,
    allowed: &[EventType],
) {
    for callout in ctx.callouts() {
        if !allowed.contains(&callout.event_kind) {
            continue;
        }
        if callout.time < ctx.attrs.status_date {
            continue;
        }
        events.push(ContractEvent::scheduled(
            callout.event_kind,
            callout.time,
            &ctx.attrs.currency,
        ));
        let has_penalty = ctx
            .attrs
            .penalty_type
            .map(|p| p != PenaltyType::NoPenalty)
            .unwrap_or(false);
        if callout.event_kind == EventType::Pp && has_penalty {
            events.push(ContractEvent::scheduled(
                EventType::Py,
                callout.time,
                &ctx.attrs.currency,
            ));
        }
    }
}

/// Applies the common schedule window: drops events before the status date,
/// applies the purchase cut (IED and anything before PRD disappears) and the
/// termination cut (nothing after TD).
pub(crate) fn apply_window(events: &mut Vec<ContractEvent>, attrs: &ContractAttributes) {
    let sd = attrs.status_date;
    events.retain(|e| e.event_time >= sd);
    if let Some(prd) = attrs.purchase_date {
        events.retain(|e| e.event_kind != EventType::Ied && e.event_time >= prd);
    }
    if let Some(td) = attrs.termination_date {
        events.retain(|e| e.event_time <= td);
    }
}
