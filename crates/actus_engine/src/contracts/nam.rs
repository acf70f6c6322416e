//! Negative amortizer (NAM) contracts.
//!
//! NAM pays a fixed total instalment (`Prnxt`) covering interest first; only
//! the remainder amortizes principal. When the instalment does not cover the
//! period's interest the notional grows. All cells involved are already
//! signed; applying the role sign again in the redemption transition is the
//! classic sign bug this module's tests pin down.

use actus_core::attributes::ContractAttributes;
use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::enums::EventType;
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

use crate::contracts::lam::{
    amortizer_initial_state, amortizer_payoff, amortizer_schedule, amortizer_transition,
    clamp_to_remaining, period_interest, refix_base_after_notional_change, validate_amortizer,
};
use crate::contracts::{SimContext, VariantLogic};

/// Negative amortizer variant record.
pub(crate) struct Nam;

impl VariantLogic for Nam {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        validate_amortizer(attrs)?;
        if attrs.next_principal_redemption_amount.is_none() {
            return Err(attrs.invalid("next_principal_redemption_amount is required"));
        }
        Ok(())
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        amortizer_schedule(ctx)
    }

    fn initial_state(&self, ctx: &SimContext) -> Result<ContractState, EngineError> {
        amortizer_initial_state(ctx.attrs)
    }

    fn payoff(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        ctx: &SimContext,
    ) -> Result<f64, EngineError> {
        if event.event_kind == EventType::Pr {
            return Ok(pof_net_redemption(ctx.attrs, state, event.calculation_time));
        }
        amortizer_payoff(event, state, ctx)
    }

    fn transition(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        ctx: &SimContext,
    ) -> Result<ContractState, EngineError> {
        if event.event_kind == EventType::Pr {
            return Ok(stf_net_redemption(ctx.attrs, state, event.calculation_time));
        }
        amortizer_transition(event, state, ctx)
    }
}

/// The principal part of the fixed instalment: `Nsc * (Prnxt - Ipac - Y *
/// Ipnr * Ipcb)`.
pub(crate) fn pof_net_redemption(
    attrs: &ContractAttributes,
    state: &ContractState,
    t: ActusDateTime,
) -> f64 {
    let principal = state.next_principal_payment - period_interest(attrs, state, t);
    state.notional_scaling * clamp_to_remaining(principal, state.notional)
}

/// `Nt <- Nt - (Prnxt - Ipac - Y * Ipnr * Ipcb)`.
///
/// The right-hand side is already signed; no role sign is applied.
pub(crate) fn stf_net_redemption(
    attrs: &ContractAttributes,
    state: &ContractState,
    t: ActusDateTime,
) -> ContractState {
    let interest = period_interest(attrs, state, t);
    let principal = clamp_to_remaining(state.next_principal_payment - interest, state.notional);
    let next = ContractState {
        status_date: t,
        notional: state.notional - principal,
        // Interest stays accrued for the coincident IP event to pay out.
        accrued_interest: interest,
        ..*state
    };
    refix_base_after_notional_change(attrs, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actus_core::types::enums::{ContractRole, ContractType, DayCountConvention};
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> ActusDateTime {
        ActusDateTime::from_ymd(y, m, day).unwrap()
    }

    fn nam_attrs(role: ContractRole) -> ContractAttributes {
        let mut attrs = ContractAttributes::new(
            "NAM-TEST",
            ContractType::Nam,
            role,
            d(2024, 1, 1),
            "USD",
        );
        attrs.initial_exchange_date = Some(d(2024, 1, 15));
        attrs.maturity_date = Some(d(2034, 1, 15));
        attrs.notional_principal = Some(100_000.0);
        attrs.nominal_interest_rate = Some(0.10);
        attrs.day_count_convention = Some(DayCountConvention::ThirtyE360);
        attrs.principal_redemption_cycle = "3M".parse().ok();
        attrs.next_principal_redemption_amount = Some(6_000.0);
        attrs
    }

    fn funded_state(attrs: &ContractAttributes) -> ContractState {
        let sign = attrs.role_sign();
        let mut state = ContractState::new(d(2024, 1, 15));
        state.notional = sign * 100_000.0;
        state.nominal_rate = 0.10;
        state.next_principal_payment = sign * 6_000.0;
        state.interest_calc_base = state.notional;
        state
    }

    #[test]
    fn test_redemption_net_of_interest_asset_side() {
        let attrs = nam_attrs(ContractRole::Rpa);
        let state = funded_state(&attrs);
        // Quarter at 10% on 100k: 2,500 interest; 3,500 principal.
        let next = stf_net_redemption(&attrs, &state, d(2024, 4, 15));
        assert_relative_eq!(next.notional, 96_500.0, epsilon = 1e-9);
        assert_relative_eq!(next.accrued_interest, 2_500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_redemption_sign_regression_liability_side() {
        // The signed cells make the liability case symmetric: re-applying
        // the role sign would produce |Nt| = 103,500 here.
        let attrs = nam_attrs(ContractRole::Rpl);
        let state = funded_state(&attrs);
        assert_eq!(state.notional, -100_000.0);
        let next = stf_net_redemption(&attrs, &state, d(2024, 4, 15));
        assert_relative_eq!(next.notional.abs(), 96_500.0, epsilon = 1e-9);
        assert!(next.notional.abs() < 100_000.0);
    }

    #[test]
    fn test_negative_amortization_grows_notional() {
        let mut attrs = nam_attrs(ContractRole::Rpa);
        attrs.next_principal_redemption_amount = Some(800.0);
        let mut state = funded_state(&attrs);
        state.next_principal_payment = 800.0;
        // Instalment below the 2,500 interest: notional grows by 1,700.
        let next = stf_net_redemption(&attrs, &state, d(2024, 4, 15));
        assert_relative_eq!(next.notional, 101_700.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pof_matches_stf_reduction() {
        let attrs = nam_attrs(ContractRole::Rpa);
        let state = funded_state(&attrs);
        let payoff = pof_net_redemption(&attrs, &state, d(2024, 4, 15));
        let next = stf_net_redemption(&attrs, &state, d(2024, 4, 15));
        assert_relative_eq!(payoff, state.notional - next.notional, epsilon = 1e-9);
    }
}
