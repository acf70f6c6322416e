//! Non-principal position contracts: cash (CSH), stock (STK) and
//! commodity (COM).
//!
//! These variants carry no interest mechanics. Analysis dates track the
//! position; purchase and termination move it; STK additionally pays
//! dividends observed from the market.

use actus_core::attributes::ContractAttributes;
use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::enums::EventType;
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

use crate::contracts::{apply_window, SimContext, VariantLogic};
use crate::schedule::{expand_cycle, EventBuilder};

/// Cash position variant record.
pub(crate) struct Csh;

impl VariantLogic for Csh {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        if attrs.notional_principal.is_none() {
            return Err(attrs.invalid("notional_principal is required"));
        }
        Ok(())
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        let attrs = ctx.attrs;
        let mut builder = EventBuilder::new(attrs);
        for &ad in &attrs.analysis_dates {
            builder.push_unadjusted(EventType::Ad, ad);
        }
        if let Some(td) = attrs.termination_date {
            builder.push_unadjusted(EventType::Td, td);
        }
        let mut events = builder.into_events();
        apply_window(&mut events, attrs);
        if events.is_empty() {
            // A cash position with nothing to report still answers one
            // analysis at the status date.
            events.push(ContractEvent::scheduled(
                EventType::Ad,
                attrs.status_date,
                &attrs.currency,
            ));
        }
        Ok(events)
    }

    fn initial_state(&self, ctx: &SimContext) -> Result<ContractState, EngineError> {
        let attrs = ctx.attrs;
        let mut state = ContractState::new(attrs.status_date);
        state.notional = attrs.role_sign() * attrs.notional_principal.unwrap_or(0.0);
        Ok(state)
    }

    fn payoff(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        _ctx: &SimContext,
    ) -> Result<f64, EngineError> {
        Ok(match event.event_kind {
            // Termination liquidates the position.
            EventType::Td => state.notional,
            _ => 0.0,
        })
    }

    fn transition(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        _ctx: &SimContext,
    ) -> Result<ContractState, EngineError> {
        Ok(match event.event_kind {
            EventType::Td => ContractState {
                status_date: event.event_time,
                notional: 0.0,
                ..*state
            },
            _ => ContractState {
                status_date: event.event_time,
                ..*state
            },
        })
    }
}

/// Stock position variant record.
pub(crate) struct Stk;

impl VariantLogic for Stk {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        if attrs.quantity.is_none() && attrs.notional_principal.is_none() {
            return Err(attrs.invalid("quantity or notional_principal is required"));
        }
        Ok(())
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        let attrs = ctx.attrs;
        let mut builder = EventBuilder::new(attrs);
        if let Some(prd) = attrs.purchase_date {
            builder.push_unadjusted(EventType::Prd, prd);
        }
        for &ad in &attrs.analysis_dates {
            builder.push_unadjusted(EventType::Ad, ad);
        }
        push_dividend_events(&mut builder, attrs);
        if let Some(td) = attrs.termination_date {
            builder.push_unadjusted(EventType::Td, td);
        }

        let mut events = builder.into_events();
        let sd = attrs.status_date;
        events.retain(|e| e.event_time >= sd);
        if let Some(td) = attrs.termination_date {
            events.retain(|e| e.event_time <= td);
        }
        Ok(events)
    }

    fn initial_state(&self, ctx: &SimContext) -> Result<ContractState, EngineError> {
        let attrs = ctx.attrs;
        let mut state = ContractState::new(attrs.status_date);
        state.notional = attrs.role_sign()
            * attrs
                .notional_principal
                .or(attrs.price_at_purchase_date)
                .unwrap_or(0.0);
        Ok(state)
    }

    fn payoff(
        &self,
        event: &ContractEvent,
        _state: &ContractState,
        ctx: &SimContext,
    ) -> Result<f64, EngineError> {
        let attrs = ctx.attrs;
        Ok(match event.event_kind {
            EventType::Prd => {
                -attrs.role_sign() * attrs.price_at_purchase_date.unwrap_or(0.0)
            }
            EventType::Dv => {
                let market_object = attrs
                    .market_object_code_of_dividends
                    .as_deref()
                    .unwrap_or_default();
                let per_share = ctx.observe(market_object, event.event_time)?;
                attrs.role_sign() * attrs.quantity.unwrap_or(1.0) * per_share
            }
            EventType::Td => attrs.role_sign() * attrs.price_at_termination_date.unwrap_or(0.0),
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
        Ok(match event.event_kind {
            EventType::Prd => ContractState {
                status_date: event.event_time,
                notional: attrs.role_sign()
                    * attrs
                        .notional_principal
                        .or(attrs.price_at_purchase_date)
                        .unwrap_or(0.0),
                ..*state
            },
            EventType::Td => ContractState {
                status_date: event.event_time,
                notional: 0.0,
                ..*state
            },
            _ => ContractState {
                status_date: event.event_time,
                ..*state
            },
        })
    }
}

/// Commodity position variant record.
pub(crate) struct Com;

impl VariantLogic for Com {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        if attrs.quantity.is_none() {
            return Err(attrs.invalid("quantity is required"));
        }
        Ok(())
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        let attrs = ctx.attrs;
        let mut builder = EventBuilder::new(attrs);
        if let Some(prd) = attrs.purchase_date {
            builder.push_unadjusted(EventType::Prd, prd);
        }
        for &ad in &attrs.analysis_dates {
            builder.push_unadjusted(EventType::Ad, ad);
        }
        if let Some(td) = attrs.termination_date {
            builder.push_unadjusted(EventType::Td, td);
        }
        let mut events = builder.into_events();
        let sd = attrs.status_date;
        events.retain(|e| e.event_time >= sd);
        if events.is_empty() {
            events.push(ContractEvent::scheduled(
                EventType::Ad,
                attrs.status_date,
                &attrs.currency,
            ));
        }
        Ok(events)
    }

    fn initial_state(&self, ctx: &SimContext) -> Result<ContractState, EngineError> {
        let attrs = ctx.attrs;
        let mut state = ContractState::new(attrs.status_date);
        // The "notional" of a commodity position is its quantity.
        state.notional = attrs.role_sign() * attrs.quantity.unwrap_or(0.0);
        Ok(state)
    }

    fn payoff(
        &self,
        event: &ContractEvent,
        _state: &ContractState,
        ctx: &SimContext,
    ) -> Result<f64, EngineError> {
        let attrs = ctx.attrs;
        Ok(match event.event_kind {
            EventType::Prd => -attrs.role_sign() * attrs.price_at_purchase_date.unwrap_or(0.0),
            EventType::Td => attrs.role_sign() * attrs.price_at_termination_date.unwrap_or(0.0),
            _ => 0.0,
        })
    }

    fn transition(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        _ctx: &SimContext,
    ) -> Result<ContractState, EngineError> {
        Ok(match event.event_kind {
            EventType::Td => ContractState {
                status_date: event.event_time,
                notional: 0.0,
                ..*state
            },
            _ => ContractState {
                status_date: event.event_time,
                ..*state
            },
        })
    }
}

/// Dividend events on the dividend cycle, up to termination or horizon.
fn push_dividend_events(builder: &mut EventBuilder, attrs: &ContractAttributes) {
    let Some(cycle) = attrs.dividend_cycle else {
        return;
    };
    let Some(anchor) = attrs.dividend_anchor.or(attrs.purchase_date) else {
        return;
    };
    let Some(end) = attrs.termination_date.or(attrs.horizon_date) else {
        return;
    };
    for date in expand_cycle(anchor, Some(&cycle), end, attrs.end_of_month_convention) {
        builder.push(EventType::Dv, date);
    }
}
