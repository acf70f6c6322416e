//! Credit enhancement guarantee (CEG) contracts.
//!
//! A guarantee watches its covered contracts for a credit event. When one
//! occurs, the guarantor settles the covered exposure (scaled by the
//! coverage ratio and the guarantee extent) after the settlement period.
//! Until then the guarantee may collect fees.

use actus_core::attributes::{ContractAttributes, ContractStructure};
use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::enums::{ContractPerformance, EventType, GuaranteeExtent};
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

use crate::contracts::pam::pof_fee;
use crate::contracts::{apply_window, SimContext, VariantLogic};
use crate::schedule::{expand_cycle, EventBuilder};

/// Credit enhancement guarantee variant record.
pub(crate) struct Ceg;

impl VariantLogic for Ceg {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        if attrs.coverage.is_none() {
            return Err(attrs.invalid("coverage is required"));
        }
        match &attrs.contract_structure {
            Some(ContractStructure::Coverage { covered, .. }) if !covered.is_empty() => Ok(()),
            _ => Err(attrs.invalid("contract_structure with covered contracts is required")),
        }
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        let attrs = ctx.attrs;
        let trigger = credit_event(ctx)?;
        let fee_end = trigger
            .as_ref()
            .map(|t| t.time)
            .or(attrs.maturity_date)
            .unwrap_or(attrs.status_date);
        let mut builder = EventBuilder::new(attrs);

        if let Some(cycle) = attrs.fee_payment_cycle {
            let anchor = attrs.fee_payment_anchor.unwrap_or(attrs.status_date);
            for date in expand_cycle(anchor, Some(&cycle), fee_end, attrs.end_of_month_convention)
            {
                if date > attrs.status_date {
                    builder.push(EventType::Fp, date);
                }
            }
        }
        for &ad in &attrs.analysis_dates {
            builder.push_unadjusted(EventType::Ad, ad);
        }

        match trigger {
            Some(trigger) => {
                builder.push_unadjusted(EventType::Std, settlement_time(attrs, trigger.time));
            }
            None => {
                // No credit event: the guarantee expires unexercised.
                if let Some(md) = attrs.maturity_date {
                    builder.push_unadjusted(EventType::Md, md);
                }
            }
        }

        let mut events = builder.into_events();
        apply_window(&mut events, attrs);
        Ok(events)
    }

    fn initial_state(&self, ctx: &SimContext) -> Result<ContractState, EngineError> {
        let attrs = ctx.attrs;
        let children = ctx.require_children()?;
        let mut exposure = 0.0;
        for id in covered_ids(attrs)? {
            let notional = match children.state_at(&id, attrs.status_date)? {
                Some(state) => state.notional.abs(),
                None => children
                    .attributes(&id)
                    .map(|a| a.notional_principal.unwrap_or(0.0).abs())
                    .unwrap_or(0.0),
            };
            exposure += notional;
        }
        let mut state = ContractState::new(attrs.status_date);
        state.maturity_date = attrs.maturity_date;
        state.notional = attrs.role_sign() * attrs.coverage.unwrap_or(0.0) * exposure;
        Ok(state)
    }

    fn payoff(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        ctx: &SimContext,
    ) -> Result<f64, EngineError> {
        let attrs = ctx.attrs;
        Ok(match event.event_kind {
            EventType::Std => {
                let trigger = credit_event(ctx)?
                    .ok_or_else(|| ctx.numeric_domain(event, "settlement without credit event"))?;
                attrs.role_sign()
                    * attrs.coverage.unwrap_or(0.0)
                    * guaranteed_extent(ctx, &trigger)?
            }
            EventType::Fp => pof_fee(attrs, state, event.calculation_time),
            _ => 0.0,
        })
    }

    fn transition(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        _ctx: &SimContext,
    ) -> Result<ContractState, EngineError> {
        let t = event.event_time;
        Ok(match event.event_kind {
            EventType::Std | EventType::Md => ContractState {
                status_date: t,
                notional: 0.0,
                accrued_fees: 0.0,
                exercise_date: Some(t),
                ..*state
            },
            EventType::Fp => ContractState {
                status_date: t,
                accrued_fees: 0.0,
                ..*state
            },
            _ => ContractState {
                status_date: t,
                ..*state
            },
        })
    }
}

/// A credit event observed in a covered child.
struct CreditTrigger {
    time: ActusDateTime,
    child_state: Option<ContractState>,
    child_id: String,
}

/// The first credit event across the covered children whose severity reaches
/// the contract's trigger level (any non-performing status by default).
fn credit_event(ctx: &SimContext) -> Result<Option<CreditTrigger>, EngineError> {
    let attrs = ctx.attrs;
    let children = ctx.require_children()?;
    let threshold = attrs
        .credit_event_type
        .unwrap_or(ContractPerformance::Dl)
        .severity();
    let mut earliest: Option<CreditTrigger> = None;
    for id in covered_ids(attrs)? {
        let events = children.events(&id).map_err(|_| EngineError::MissingChild {
            contract_id: attrs.contract_id.clone(),
            child_id: id.clone(),
        })?;
        for event in events {
            if event.event_kind != EventType::Ce {
                continue;
            }
            let severity = event
                .state_post
                .map(|s| s.performance.severity())
                .unwrap_or(0);
            if severity < threshold {
                continue;
            }
            let replace = earliest
                .as_ref()
                .map(|t| event.event_time < t.time)
                .unwrap_or(true);
            if replace {
                earliest = Some(CreditTrigger {
                    time: event.event_time,
                    // The exposure at the event is the state before default
                    // processing wiped it.
                    child_state: event.state_pre.or(event.state_post),
                    child_id: id.clone(),
                });
            }
            break;
        }
    }
    Ok(earliest)
}

/// The covered exposure selected by the guarantee extent.
fn guaranteed_extent(ctx: &SimContext, trigger: &CreditTrigger) -> Result<f64, EngineError> {
    let attrs = ctx.attrs;
    let (notional, accrued) = match trigger.child_state {
        Some(state) => (state.notional.abs(), state.accrued_interest.abs()),
        None => (0.0, 0.0),
    };
    Ok(match attrs.guarantee_extent.unwrap_or(GuaranteeExtent::NominalOnly) {
        GuaranteeExtent::NominalOnly => notional,
        GuaranteeExtent::NominalWithInterest => notional + accrued,
        GuaranteeExtent::MarketValue => {
            let children = ctx.require_children()?;
            let market_object = children
                .attributes(&trigger.child_id)
                .ok()
                .and_then(|a| a.market_object_code.clone())
                .unwrap_or_default();
            notional + accrued + ctx.observe(&market_object, trigger.time)?
        }
    })
}

fn covered_ids(attrs: &ContractAttributes) -> Result<Vec<String>, EngineError> {
    match &attrs.contract_structure {
        Some(ContractStructure::Coverage { covered, .. }) => Ok(covered.clone()),
        _ => Err(attrs.invalid("contract_structure with covered contracts is required")),
    }
}

fn settlement_time(attrs: &ContractAttributes, trigger: ActusDateTime) -> ActusDateTime {
    match attrs.settlement_period {
        Some(cycle) => cycle.date_at(trigger, 1, attrs.end_of_month_convention),
        None => trigger,
    }
}
