//! Annuity (ANN) contracts.
//!
//! ANN is the negative amortizer with a level total instalment: at every
//! rate change the instalment is refit to the payment that amortizes the
//! current notional at the current rate over the remaining redemption
//! periods.

use actus_core::attributes::ContractAttributes;
use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::enums::EventType;
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

use crate::contracts::lam::{
    amortizer_payoff, amortizer_schedule, amortizer_transition, effective_maturity, initial_base,
    redemption_dates, validate_amortizer,
};
use crate::contracts::nam::{pof_net_redemption, stf_net_redemption};
use crate::contracts::pam::{initial_exchange, initial_principal_state};
use crate::contracts::{SimContext, VariantLogic};
use crate::functions::annuity_payment;

/// Annuity variant record.
pub(crate) struct Ann;

impl VariantLogic for Ann {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        validate_amortizer(attrs)?;
        if attrs.maturity_date.is_none() && attrs.amortization_date.is_none() {
            return Err(attrs.invalid("maturity_date is required"));
        }
        Ok(())
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        amortizer_schedule(ctx)
    }

    fn initial_state(&self, ctx: &SimContext) -> Result<ContractState, EngineError> {
        let attrs = ctx.attrs;
        let instalment = match attrs.next_principal_redemption_amount {
            Some(prnxt) => attrs.role_sign() * prnxt,
            None => {
                let ied = initial_exchange(attrs)?;
                let level = level_instalment(
                    attrs,
                    ied,
                    attrs.notional_principal.unwrap_or(0.0),
                    0.0,
                    attrs.nominal_interest_rate.unwrap_or(0.0),
                )?;
                attrs.role_sign() * level
            }
        };
        initial_principal_state(attrs, |state| {
            state.next_principal_payment = instalment;
            state.interest_calc_base = initial_base(attrs, state.notional);
        })
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
        let t = event.calculation_time;
        match event.event_kind {
            EventType::Pr => Ok(stf_net_redemption(ctx.attrs, state, t)),
            EventType::Ied => {
                let mut next = amortizer_transition(event, state, ctx)?;
                if ctx.attrs.next_principal_redemption_amount.is_none() {
                    next.next_principal_payment = ctx.attrs.role_sign()
                        * level_instalment(
                            ctx.attrs,
                            t,
                            next.notional.abs(),
                            0.0,
                            next.nominal_rate,
                        )?;
                }
                Ok(next)
            }
            EventType::Rr | EventType::Rrf => {
                // Accrue and reset through the shared machinery, then refit
                // the instalment to the new rate.
                let next = amortizer_transition(event, state, ctx)?;
                let refit = level_instalment(
                    ctx.attrs,
                    t,
                    next.notional.abs(),
                    next.accrued_interest.abs(),
                    next.nominal_rate,
                )?;
                Ok(ContractState {
                    next_principal_payment: ctx.attrs.role_sign() * refit,
                    ..next
                })
            }
            _ => amortizer_transition(event, state, ctx),
        }
    }
}

/// The level payment amortizing `notional + accrued` over the redemption
/// dates after `from` (maturity included as the final period).
fn level_instalment(
    attrs: &ContractAttributes,
    from: ActusDateTime,
    notional: f64,
    accrued: f64,
    rate: f64,
) -> Result<f64, EngineError> {
    let ied = initial_exchange(attrs)?;
    let md = effective_maturity(attrs)?;
    let mut dates: Vec<ActusDateTime> = redemption_dates(attrs, ied, md)
        .into_iter()
        .filter(|&d| d > from)
        .collect();
    dates.push(md);
    Ok(annuity_payment(attrs, from, &dates, notional, accrued, rate))
}
