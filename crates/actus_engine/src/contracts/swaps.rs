//! Generic swap (SWAPS) contracts.
//!
//! A SWAPS parent references two previously simulated legs through its
//! contract structure. The parent's events mirror the legs' events; under
//! cash settlement congruent interest payments net into one flow, under
//! delivery the legs keep separate events per currency.

use std::collections::BTreeSet;

use actus_core::attributes::{ContractAttributes, ContractStructure};
use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::enums::{DeliverySettlement, EventType};
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

use crate::contracts::{apply_window, SimContext, VariantLogic};

/// Generic swap variant record.
pub(crate) struct Swaps;

impl VariantLogic for Swaps {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        match &attrs.contract_structure {
            Some(ContractStructure::SwapLegs { .. }) => Ok(()),
            _ => Err(attrs.invalid("contract_structure with FirstLeg and SecondLeg is required")),
        }
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        let attrs = ctx.attrs;
        let children = ctx.require_children()?;
        let mut events = Vec::new();

        // One parent event per distinct (kind, time, currency) across the
        // legs; netting happens in the payoff, which sums the matching child
        // flows.
        let mut seen: BTreeSet<(ActusDateTime, String, String)> = BTreeSet::new();
        for leg_id in leg_ids(attrs)? {
            let leg_events = children.events(&leg_id).map_err(|_| missing(attrs, &leg_id))?;
            for child_event in leg_events {
                if child_event.event_kind == EventType::Ad {
                    continue;
                }
                let key = (
                    child_event.event_time,
                    child_event.event_kind.code().to_string(),
                    parent_currency(attrs, child_event),
                );
                if seen.insert(key.clone()) {
                    events.push(ContractEvent::scheduled(
                        child_event.event_kind,
                        child_event.event_time,
                        &key.2,
                    ));
                }
            }
        }

        for &ad in &attrs.analysis_dates {
            events.push(ContractEvent::scheduled(EventType::Ad, ad, &attrs.currency));
        }
        if let Some(prd) = attrs.purchase_date {
            events.push(ContractEvent::scheduled(EventType::Prd, prd, &attrs.currency));
        }
        if let Some(td) = attrs.termination_date {
            events.push(ContractEvent::scheduled(EventType::Td, td, &attrs.currency));
        }

        apply_window(&mut events, attrs);
        Ok(events)
    }

    fn initial_state(&self, ctx: &SimContext) -> Result<ContractState, EngineError> {
        Ok(ContractState::new(ctx.attrs.status_date))
    }

    fn payoff(
        &self,
        event: &ContractEvent,
        _state: &ContractState,
        ctx: &SimContext,
    ) -> Result<f64, EngineError> {
        let attrs = ctx.attrs;
        match event.event_kind {
            EventType::Prd => {
                return Ok(-attrs.role_sign() * attrs.price_at_purchase_date.unwrap_or(0.0))
            }
            EventType::Td => {
                return Ok(attrs.role_sign() * attrs.price_at_termination_date.unwrap_or(0.0))
            }
            EventType::Ad => return Ok(0.0),
            _ => {}
        }
        let children = ctx.require_children()?;
        let mut total = 0.0;
        for leg_id in leg_ids(attrs)? {
            let leg_events = children.events(&leg_id).map_err(|_| missing(attrs, &leg_id))?;
            for child_event in leg_events {
                if child_event.event_kind == event.event_kind
                    && child_event.event_time == event.event_time
                    && parent_currency(attrs, child_event) == event.currency
                {
                    total += child_event.payoff;
                }
            }
        }
        Ok(total)
    }

    fn transition(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        _ctx: &SimContext,
    ) -> Result<ContractState, EngineError> {
        Ok(ContractState {
            status_date: event.event_time,
            ..*state
        })
    }
}

fn leg_ids(attrs: &ContractAttributes) -> Result<[String; 2], EngineError> {
    match &attrs.contract_structure {
        Some(ContractStructure::SwapLegs {
            first_leg,
            second_leg,
        }) => Ok([first_leg.clone(), second_leg.clone()]),
        _ => Err(attrs.invalid("contract_structure with FirstLeg and SecondLeg is required")),
    }
}

/// Netting collapses same-currency interest events; gross keeps the legs'
/// own currencies apart.
fn parent_currency(attrs: &ContractAttributes, child_event: &ContractEvent) -> String {
    match attrs.delivery_settlement {
        // Cash settlement: everything nets in the parent currency.
        Some(DeliverySettlement::Settlement) | None => attrs.currency.clone(),
        Some(DeliverySettlement::Delivery) => child_event.currency.clone(),
    }
}

fn missing(attrs: &ContractAttributes, child_id: &str) -> EngineError {
    EngineError::MissingChild {
        contract_id: attrs.contract_id.clone(),
        child_id: child_id.to_string(),
    }
}
