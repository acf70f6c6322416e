//! Foreign exchange outright (FXOUT) contracts.
//!
//! An FXOUT exchanges two currency amounts at maturity. Net mode (DS = D)
//! settles the difference in the first currency at the observed FX rate;
//! gross mode emits one settlement leg per currency.

use actus_core::attributes::ContractAttributes;
use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::enums::{DeliverySettlement, EventType};
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

use crate::contracts::{apply_window, SimContext, VariantLogic};
use crate::schedule::EventBuilder;

/// FX outright variant record.
pub(crate) struct Fxout;

impl VariantLogic for Fxout {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        if attrs.maturity_date.is_none() {
            return Err(attrs.invalid("maturity_date is required"));
        }
        if attrs.notional_principal.is_none() || attrs.notional_principal_2.is_none() {
            return Err(attrs.invalid("both notional_principal and notional_principal_2 are required"));
        }
        if attrs.currency_2.is_none() {
            return Err(attrs.invalid("currency_2 is required"));
        }
        Ok(())
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        let attrs = ctx.attrs;
        let md = attrs
            .maturity_date
            .ok_or_else(|| attrs.invalid("maturity_date is required"))?;
        let settlement = settlement_time(attrs, md);
        let mut builder = EventBuilder::new(attrs);

        if let Some(prd) = attrs.purchase_date {
            builder.push_unadjusted(EventType::Prd, prd);
        }
        for &ad in &attrs.analysis_dates {
            builder.push_unadjusted(EventType::Ad, ad);
        }
        builder.push_unadjusted(EventType::Md, md);
        match netting(attrs) {
            DeliverySettlement::Delivery => {
                builder.push_unadjusted(EventType::Std, settlement);
            }
            DeliverySettlement::Settlement => {
                builder.push_unadjusted(EventType::Std, settlement);
                let second = attrs.currency_2.clone().unwrap_or_default();
                builder.push_with_currency(EventType::Std, settlement, &second);
            }
        }
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
        state.notional = attrs.role_sign() * attrs.notional_principal.unwrap_or(0.0);
        Ok(state)
    }

    fn payoff(
        &self,
        event: &ContractEvent,
        _state: &ContractState,
        ctx: &SimContext,
    ) -> Result<f64, EngineError> {
        let attrs = ctx.attrs;
        let sign = attrs.role_sign();
        let nt = attrs.notional_principal.unwrap_or(0.0);
        let nt2 = attrs.notional_principal_2.unwrap_or(0.0);
        Ok(match event.event_kind {
            EventType::Prd => -sign * attrs.price_at_purchase_date.unwrap_or(0.0),
            EventType::Td => sign * attrs.price_at_termination_date.unwrap_or(0.0),
            EventType::Std => match netting(attrs) {
                DeliverySettlement::Delivery => {
                    let rate = ctx.observe(&fx_identifier(attrs), event.event_time)?;
                    sign * (nt - rate * nt2)
                }
                DeliverySettlement::Settlement => {
                    if event.currency == attrs.currency {
                        sign * nt
                    } else {
                        -sign * nt2
                    }
                }
            },
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
            EventType::Std | EventType::Td => ContractState {
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

/// FXOUT nets under delivery mode; gross settlement is the explicit `S`.
fn netting(attrs: &ContractAttributes) -> DeliverySettlement {
    attrs
        .delivery_settlement
        .unwrap_or(DeliverySettlement::Delivery)
}

/// The observed FX identifier: the explicit market object, or the currency
/// pair.
fn fx_identifier(attrs: &ContractAttributes) -> String {
    attrs
        .market_object_code
        .clone()
        .unwrap_or_else(|| {
            format!(
                "{}/{}",
                attrs.currency,
                attrs.currency_2.as_deref().unwrap_or_default()
            )
        })
}

fn settlement_time(attrs: &ContractAttributes, md: ActusDateTime) -> ActusDateTime {
    match attrs.settlement_period {
        Some(cycle) => cycle.date_at(md, 1, attrs.end_of_month_convention),
        None => md,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actus_core::observers::market::DictObserver;
    use actus_core::types::enums::{ContractRole, ContractType};
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> ActusDateTime {
        ActusDateTime::from_ymd(y, m, day).unwrap()
    }

    fn fx_attrs() -> ContractAttributes {
        let mut attrs = ContractAttributes::new(
            "FX-1",
            ContractType::Fxout,
            ContractRole::Buy,
            d(2024, 1, 1),
            "USD",
        );
        attrs.maturity_date = Some(d(2024, 7, 1));
        attrs.notional_principal = Some(1_000_000.0);
        attrs.notional_principal_2 = Some(900_000.0);
        attrs.currency_2 = Some("EUR".to_string());
        attrs.market_object_code = Some("USD/EUR".to_string());
        attrs
    }

    fn market(rate: f64) -> DictObserver {
        let mut m = DictObserver::default();
        m.insert("USD/EUR", rate);
        m
    }

    #[test]
    fn test_net_settlement() {
        let attrs = fx_attrs();
        let m = market(1.10);
        let ctx = SimContext {
            attrs: &attrs,
            market: &m,
            behavior: None,
            children: None,
        };
        let events = Fxout.schedule(&ctx).unwrap();
        let std_events: Vec<&ContractEvent> = events
            .iter()
            .filter(|e| e.event_kind == EventType::Std)
            .collect();
        assert_eq!(std_events.len(), 1);

        let state = Fxout.initial_state(&ctx).unwrap();
        let payoff = Fxout.payoff(std_events[0], &state, &ctx).unwrap();
        // 1,000,000 USD against 900,000 EUR at 1.10: net +10,000 USD.
        assert_relative_eq!(payoff, 1_000_000.0 - 1.10 * 900_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_gross_settlement_two_legs() {
        let mut attrs = fx_attrs();
        attrs.delivery_settlement = Some(DeliverySettlement::Settlement);
        let m = market(1.10);
        let ctx = SimContext {
            attrs: &attrs,
            market: &m,
            behavior: None,
            children: None,
        };
        let events = Fxout.schedule(&ctx).unwrap();
        let std_events: Vec<&ContractEvent> = events
            .iter()
            .filter(|e| e.event_kind == EventType::Std)
            .collect();
        assert_eq!(std_events.len(), 2);

        let state = Fxout.initial_state(&ctx).unwrap();
        let usd_leg = std_events.iter().find(|e| e.currency == "USD").unwrap();
        let eur_leg = std_events.iter().find(|e| e.currency == "EUR").unwrap();
        assert_relative_eq!(Fxout.payoff(usd_leg, &state, &ctx).unwrap(), 1_000_000.0);
        assert_relative_eq!(Fxout.payoff(eur_leg, &state, &ctx).unwrap(), -900_000.0);
    }

    #[test]
    fn test_settlement_period_shifts_payment() {
        let mut attrs = fx_attrs();
        attrs.settlement_period = "2D".parse().ok();
        let m = market(1.0);
        let ctx = SimContext {
            attrs: &attrs,
            market: &m,
            behavior: None,
            children: None,
        };
        let events = Fxout.schedule(&ctx).unwrap();
        let std = events.iter().find(|e| e.event_kind == EventType::Std).unwrap();
        assert_eq!(std.event_time, d(2024, 7, 3));
    }
}
