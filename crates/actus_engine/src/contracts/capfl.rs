//! Cap / floor (CAPFL) contracts.
//!
//! A cap pays the excess of the floating rate over the cap level, a floor
//! the shortfall below the floor level, on the underlier's notional and
//! schedule. The rate paying at an IP date is the one fixed at the previous
//! reset: IP runs before RR at coincident timestamps.

use actus_core::attributes::{ContractAttributes, ContractStructure};
use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::enums::EventType;
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

use crate::contracts::{apply_window, SimContext, VariantLogic};
use crate::functions::yf;
use crate::schedule::{expand_cycle, EventBuilder};

/// Cap/floor variant record.
pub(crate) struct Capfl;

impl VariantLogic for Capfl {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        if attrs.rate_reset_cap.is_none() && attrs.rate_reset_floor.is_none() {
            return Err(attrs.invalid("rate_reset_cap or rate_reset_floor is required"));
        }
        Ok(())
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        let attrs = ctx.attrs;
        let terms = embedded_terms(ctx)?;
        let md = terms
            .maturity_date
            .ok_or_else(|| attrs.invalid("maturity_date is required (own or underlier's)"))?;
        let anchor_base = terms
            .initial_exchange_date
            .unwrap_or(attrs.status_date);
        let mut builder = EventBuilder::new(attrs);

        // Payment dates: period ends of the underlier's interest cycle.
        if let Some(cycle) = terms.interest_payment_cycle {
            let anchor = terms.interest_payment_anchor.unwrap_or(anchor_base);
            for date in expand_cycle(anchor, Some(&cycle), md, terms.end_of_month_convention) {
                if date > anchor_base {
                    builder.push(EventType::Ip, date);
                }
            }
        }
        // Reset dates fix the rate for the following period.
        if let Some(cycle) = terms.rate_reset_cycle.or(terms.interest_payment_cycle) {
            let anchor = terms
                .rate_reset_anchor
                .unwrap_or_else(|| cycle.date_at(anchor_base, 1, terms.end_of_month_convention));
            for date in expand_cycle(anchor, Some(&cycle), md, terms.end_of_month_convention) {
                if date > anchor_base && date < md {
                    builder.push(EventType::Rr, date);
                }
            }
        }
        builder.push_unadjusted(EventType::Md, md);
        if let Some(td) = attrs.termination_date {
            builder.push_unadjusted(EventType::Td, td);
        }

        let mut events = builder.into_events();
        apply_window(&mut events, attrs);
        Ok(events)
    }

    fn initial_state(&self, ctx: &SimContext) -> Result<ContractState, EngineError> {
        let attrs = ctx.attrs;
        let terms = embedded_terms(ctx)?;
        let mut state = ContractState::new(attrs.status_date);
        state.maturity_date = terms.maturity_date;
        state.notional = attrs.role_sign() * terms.notional_principal.unwrap_or(0.0);
        state.nominal_rate = terms
            .nominal_interest_rate_2
            .or(terms.nominal_interest_rate)
            .unwrap_or(0.0);
        Ok(state)
    }

    fn payoff(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        ctx: &SimContext,
    ) -> Result<f64, EngineError> {
        let attrs = ctx.attrs;
        let terms = embedded_terms(ctx)?;
        let t = event.calculation_time;
        Ok(match event.event_kind {
            EventType::Ip | EventType::Md => {
                let elapsed = yf(&terms, state.status_date, t);
                state.accrued_interest
                    + elapsed * excess_rate(attrs, state.nominal_rate) * state.notional
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
        let attrs = ctx.attrs;
        let terms = embedded_terms(ctx)?;
        let t = event.calculation_time;
        Ok(match event.event_kind {
            EventType::Ip => ContractState {
                status_date: t,
                accrued_interest: 0.0,
                ..*state
            },
            EventType::Rr => {
                // Accrue the running excess at the outgoing rate, then fix.
                let elapsed = yf(&terms, state.status_date, t);
                let accrued = state.accrued_interest
                    + elapsed * excess_rate(attrs, state.nominal_rate) * state.notional;
                let market_object = terms
                    .rate_reset_market_object
                    .as_deref()
                    .unwrap_or_default();
                let observed = ctx.observe(market_object, event.event_time)?;
                let multiplier = terms.rate_reset_multiplier.unwrap_or(1.0);
                let spread = terms.rate_reset_spread.unwrap_or(0.0);
                ContractState {
                    status_date: t,
                    accrued_interest: accrued,
                    nominal_rate: observed * multiplier + spread,
                    ..*state
                }
            }
            EventType::Md | EventType::Td => ContractState {
                status_date: t,
                notional: 0.0,
                accrued_interest: 0.0,
                ..*state
            },
            _ => ContractState {
                status_date: t,
                ..*state
            },
        })
    }
}

/// The rate in excess of the cap plus the shortfall below the floor.
///
/// The parent's cap/floor levels always apply; with both set the contract is
/// a collar.
fn excess_rate(attrs: &ContractAttributes, rate: f64) -> f64 {
    let mut excess = 0.0;
    if let Some(cap) = attrs.rate_reset_cap {
        excess += (rate - cap).max(0.0);
    }
    if let Some(floor) = attrs.rate_reset_floor {
        excess += (floor - rate).max(0.0);
    }
    excess
}

/// The terms the cap/floor runs on: the underlier's attributes when the
/// structure names one (and it is registered), the parent's own otherwise.
///
/// The parent's cap/floor levels stay authoritative either way.
fn embedded_terms(ctx: &SimContext) -> Result<ContractAttributes, EngineError> {
    let attrs = ctx.attrs;
    if let Some(ContractStructure::Underlier { id }) = &attrs.contract_structure {
        let children = ctx.require_children()?;
        let underlier = children
            .attributes(id)
            .map_err(|_| EngineError::MissingChild {
                contract_id: attrs.contract_id.clone(),
                child_id: id.clone(),
            })?;
        return Ok(underlier.clone());
    }
    Ok(attrs.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actus_core::observers::market::TimeSeriesObserver;
    use actus_core::types::enums::{ContractRole, ContractType, DayCountConvention};
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> ActusDateTime {
        ActusDateTime::from_ymd(y, m, day).unwrap()
    }

    fn cap_attrs() -> ContractAttributes {
        let mut attrs = ContractAttributes::new(
            "CAP-1",
            ContractType::Capfl,
            ContractRole::Buy,
            d(2024, 1, 1),
            "USD",
        );
        attrs.initial_exchange_date = Some(d(2024, 1, 15));
        attrs.maturity_date = Some(d(2025, 1, 15));
        attrs.notional_principal = Some(1_000_000.0);
        attrs.nominal_interest_rate = Some(0.055);
        attrs.day_count_convention = Some(DayCountConvention::ThirtyE360);
        attrs.interest_payment_cycle = "3M".parse().ok();
        attrs.rate_reset_cycle = "3M".parse().ok();
        attrs.rate_reset_market_object = Some("EURIBOR-3M".to_string());
        attrs.rate_reset_cap = Some(0.06);
        attrs
    }

    fn rising_market() -> TimeSeriesObserver {
        let mut m = TimeSeriesObserver::new();
        m.insert_series(
            "EURIBOR-3M",
            vec![(d(2024, 1, 1), 0.055), (d(2024, 4, 10), 0.07), (d(2024, 10, 10), 0.05)],
        )
        .unwrap();
        m
    }

    #[test]
    fn test_cap_pays_only_above_cap() {
        let attrs = cap_attrs();
        let market = rising_market();
        let ctx = SimContext {
            attrs: &attrs,
            market: &market,
            behavior: None,
            children: None,
        };
        let mut events = Capfl.schedule(&ctx).unwrap();
        actus_core::event::sort_events(&mut events);
        let mut state = Capfl.initial_state(&ctx).unwrap();
        let mut payments = Vec::new();
        for event in &events {
            let payoff = Capfl.payoff(event, &state, &ctx).unwrap();
            state = Capfl.transition(event, &state, &ctx).unwrap();
            if matches!(event.event_kind, EventType::Ip | EventType::Md) {
                payments.push((event.event_time, payoff));
            }
        }
        // First period at 5.5%: below the 6% cap, nothing paid.
        assert_relative_eq!(payments[0].1, 0.0, epsilon = 1e-9);
        // Second period after the reset observed 7%: 1% excess for a
        // quarter on 1M.
        assert_relative_eq!(payments[1].1, 1_000_000.0 * 0.01 * 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_coincident_payment_uses_previous_rate() {
        // At a date where IP and RR coincide, the payment must use the rate
        // fixed at the previous reset, not the newly observed one.
        let attrs = cap_attrs();
        let mut m = TimeSeriesObserver::new();
        m.insert_series(
            "EURIBOR-3M",
            vec![(d(2024, 1, 1), 0.055), (d(2024, 7, 15), 0.07)],
        )
        .unwrap();
        let ctx = SimContext {
            attrs: &attrs,
            market: &m,
            behavior: None,
            children: None,
        };
        let mut events = Capfl.schedule(&ctx).unwrap();
        actus_core::event::sort_events(&mut events);
        let mut state = Capfl.initial_state(&ctx).unwrap();
        for event in &events {
            let payoff = Capfl.payoff(event, &state, &ctx).unwrap();
            state = Capfl.transition(event, &state, &ctx).unwrap();
            if event.event_kind == EventType::Ip && event.event_time == d(2024, 7, 15) {
                // Previous period's rate was 5.5% (below cap): no payment,
                // even though 7% is being fixed at the same timestamp.
                assert_relative_eq!(payoff, 0.0, epsilon = 1e-9);
            }
            if event.event_kind == EventType::Ip && event.event_time == d(2024, 10, 15) {
                // Now the 7% fix from July applies.
                assert_relative_eq!(payoff, 1_000_000.0 * 0.01 * 0.25, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_floor_pays_below_floor() {
        let mut attrs = cap_attrs();
        attrs.rate_reset_cap = None;
        attrs.rate_reset_floor = Some(0.04);
        let mut m = TimeSeriesObserver::new();
        m.insert_series(
            "EURIBOR-3M",
            vec![(d(2024, 1, 1), 0.055), (d(2024, 4, 10), 0.03)],
        )
        .unwrap();
        let ctx = SimContext {
            attrs: &attrs,
            market: &m,
            behavior: None,
            children: None,
        };
        let mut events = Capfl.schedule(&ctx).unwrap();
        actus_core::event::sort_events(&mut events);
        let mut state = Capfl.initial_state(&ctx).unwrap();
        let mut second_payment = 0.0;
        for event in &events {
            let payoff = Capfl.payoff(event, &state, &ctx).unwrap();
            state = Capfl.transition(event, &state, &ctx).unwrap();
            if event.event_kind == EventType::Ip && event.event_time == d(2024, 7, 15) {
                second_payment = payoff;
            }
        }
        // 3% observed against a 4% floor: 1% shortfall for a quarter.
        assert_relative_eq!(second_payment, 1_000_000.0 * 0.01 * 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_validation_requires_a_bound() {
        let mut attrs = cap_attrs();
        attrs.rate_reset_cap = None;
        attrs.rate_reset_floor = None;
        assert!(Capfl.validate(&attrs).is_err());
    }
}
