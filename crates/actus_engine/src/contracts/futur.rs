//! Future (FUTUR) contracts.
//!
//! A future is marked against the agreed futures price. Analysis dates track
//! the running mark; the maturity event fixes the final difference between
//! the observed underlier price and the agreed price, and the settlement
//! event pays it.

use actus_core::attributes::ContractAttributes;
use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::enums::EventType;
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

use crate::contracts::optns::underlier_identifier;
use crate::contracts::{apply_window, SimContext, VariantLogic};
use crate::schedule::EventBuilder;

/// Future variant record.
pub(crate) struct Futur;

impl VariantLogic for Futur {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        if attrs.future_price.is_none() {
            return Err(attrs.invalid("future_price is required"));
        }
        if attrs.maturity_date.is_none() {
            return Err(attrs.invalid("maturity_date is required"));
        }
        Ok(())
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        let attrs = ctx.attrs;
        let md = attrs
            .maturity_date
            .ok_or_else(|| attrs.invalid("maturity_date is required"))?;
        let mut builder = EventBuilder::new(attrs);

        if let Some(prd) = attrs.purchase_date {
            builder.push_unadjusted(EventType::Prd, prd);
        }
        for &ad in &attrs.analysis_dates {
            builder.push_unadjusted(EventType::Ad, ad);
        }
        builder.push_unadjusted(EventType::Md, md);
        builder.push_unadjusted(EventType::Std, settlement_time(attrs, md));
        if let Some(td) = attrs.termination_date {
            builder.push_unadjusted(EventType::Td, td);
        }

        let mut events = builder.into_events();
        apply_window(&mut events, attrs);
        Ok(events)
    }

    fn initial_state(&self, ctx: &SimContext) -> Result<ContractState, EngineError> {
        let attrs = ctx.attrs;
        let mut state = ContractState::new(attrs.status_date);
        state.maturity_date = attrs.maturity_date;
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
            EventType::Prd => -attrs.role_sign() * attrs.price_at_purchase_date.unwrap_or(0.0),
            EventType::Td => attrs.role_sign() * attrs.price_at_termination_date.unwrap_or(0.0),
            EventType::Std => attrs.role_sign() * state.exercise_amount,
            _ => 0.0,
        })
    }

    fn transition(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        ctx: &SimContext,
    ) -> Result<ContractState, EngineError> {
        let attrs = ctx.attrs;
        let t = event.event_time;
        Ok(match event.event_kind {
            EventType::Ad => {
                // Running mark-to-market: track the current difference.
                let spot = ctx.observe(&underlier_identifier(attrs), t)?;
                ContractState {
                    status_date: t,
                    exercise_amount: spot - attrs.future_price.unwrap_or(0.0),
                    ..*state
                }
            }
            EventType::Md => {
                // Fix the final settlement amount; the difference may be of
                // either sign.
                let spot = ctx.observe(&underlier_identifier(attrs), t)?;
                ContractState {
                    status_date: t,
                    exercise_date: Some(t),
                    exercise_amount: spot - attrs.future_price.unwrap_or(0.0),
                    ..*state
                }
            }
            EventType::Std => ContractState {
                status_date: t,
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

fn settlement_time(attrs: &ContractAttributes, md: ActusDateTime) -> ActusDateTime {
    match attrs.settlement_period {
        Some(cycle) => cycle.date_at(md, 1, attrs.end_of_month_convention),
        None => md,
    }
}
