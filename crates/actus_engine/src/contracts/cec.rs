//! Credit enhancement collateral (CEC) contracts.
//!
//! Collateral cover is monitored periodically: at each monitoring date the
//! covered exposure is compared against the covering contract's value scaled
//! by the coverage ratio. A shortfall raises a margin-call settlement for
//! the difference.

use actus_core::attributes::{ContractAttributes, ContractStructure};
use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::enums::EventType;
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

use crate::contracts::{apply_window, SimContext, VariantLogic};

/// Credit enhancement collateral variant record.
pub(crate) struct Cec;

impl VariantLogic for Cec {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        if attrs.coverage.is_none() {
            return Err(attrs.invalid("coverage is required"));
        }
        match &attrs.contract_structure {
            Some(ContractStructure::Coverage {
                covered, covering, ..
            }) if !covered.is_empty() && covering.is_some() => Ok(()),
            _ => Err(attrs.invalid(
                "contract_structure with covered contracts and a covering contract is required",
            )),
        }
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        let attrs = ctx.attrs;
        let mut events = Vec::new();
        for date in monitoring_dates(ctx)? {
            events.push(ContractEvent::scheduled(EventType::Ad, date, &attrs.currency));
            if shortfall(ctx, date)? > 0.0 {
                events.push(ContractEvent::scheduled(EventType::Std, date, &attrs.currency));
            }
        }
        if let Some(md) = attrs.maturity_date {
            events.push(ContractEvent::scheduled(EventType::Md, md, &attrs.currency));
        }
        apply_window(&mut events, attrs);
        Ok(events)
    }

    fn initial_state(&self, ctx: &SimContext) -> Result<ContractState, EngineError> {
        let mut state = ContractState::new(ctx.attrs.status_date);
        state.maturity_date = ctx.attrs.maturity_date;
        Ok(state)
    }

    fn payoff(
        &self,
        event: &ContractEvent,
        _state: &ContractState,
        ctx: &SimContext,
    ) -> Result<f64, EngineError> {
        Ok(match event.event_kind {
            EventType::Std => {
                ctx.attrs.role_sign() * shortfall(ctx, event.event_time)?
            }
            _ => 0.0,
        })
    }

    fn transition(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        ctx: &SimContext,
    ) -> Result<ContractState, EngineError> {
        let t = event.event_time;
        Ok(match event.event_kind {
            EventType::Ad | EventType::Std => ContractState {
                status_date: t,
                // Track the current shortfall for reporting.
                exercise_amount: shortfall(ctx, t)?,
                ..*state
            },
            EventType::Md => ContractState {
                status_date: t,
                notional: 0.0,
                exercise_amount: 0.0,
                ..*state
            },
            _ => ContractState {
                status_date: t,
                ..*state
            },
        })
    }
}

/// Monitoring dates: the contract's analysis dates, or the covered
/// children's redemption and interest dates when none are given.
fn monitoring_dates(ctx: &SimContext) -> Result<Vec<ActusDateTime>, EngineError> {
    let attrs = ctx.attrs;
    if !attrs.analysis_dates.is_empty() {
        let mut dates = attrs.analysis_dates.clone();
        dates.sort();
        return Ok(dates);
    }
    let children = ctx.require_children()?;
    let (covered, _) = structure(attrs)?;
    let mut dates = Vec::new();
    for id in covered {
        let events = children.events(&id).map_err(|_| EngineError::MissingChild {
            contract_id: attrs.contract_id.clone(),
            child_id: id.clone(),
        })?;
        for event in events {
            if matches!(event.event_kind, EventType::Pr | EventType::Ip)
                && event.event_time >= attrs.status_date
            {
                dates.push(event.event_time);
            }
        }
    }
    dates.sort();
    dates.dedup();
    Ok(dates)
}

/// The uncovered exposure at `at`: covered notional plus accrued, less the
/// covering value scaled by the coverage ratio. Positive means a margin call.
fn shortfall(ctx: &SimContext, at: ActusDateTime) -> Result<f64, EngineError> {
    let attrs = ctx.attrs;
    let children = ctx.require_children()?;
    let (covered, covering) = structure(attrs)?;

    let mut exposure = 0.0;
    for id in &covered {
        if let Some(state) = children.state_at(id, at)? {
            exposure += state.notional.abs() + state.accrued_interest.abs();
        }
    }
    let collateral = match children.state_at(&covering, at)? {
        Some(state) => state.notional.abs(),
        None => children
            .attributes(&covering)
            .map(|a| a.notional_principal.unwrap_or(0.0).abs())
            .unwrap_or(0.0),
    };
    Ok((exposure - attrs.coverage.unwrap_or(0.0) * collateral).max(0.0))
}

fn structure(attrs: &ContractAttributes) -> Result<(Vec<String>, String), EngineError> {
    match &attrs.contract_structure {
        Some(ContractStructure::Coverage { covered, covering }) => match covering {
            Some(covering) => Ok((covered.clone(), covering.clone())),
            None => Err(attrs.invalid("covering contract is required")),
        },
        _ => Err(attrs.invalid("contract_structure with coverage is required")),
    }
}
