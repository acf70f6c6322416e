//! Option (OPTNS) contracts.
//!
//! Exercise events depend on the style: European exercises at expiry,
//! Bermudan at the exercise end date, American on a monthly grid from the
//! status date to expiry. Exercise fixes the intrinsic value; the payment
//! follows at the settlement event.

use actus_core::attributes::ContractAttributes;
use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::cycle::{Cycle, CycleUnit};
use actus_core::types::enums::{EventType, OptionExerciseType, OptionType};
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

use crate::contracts::{apply_window, SimContext, VariantLogic};
use crate::schedule::{expand_cycle, EventBuilder};

/// Option variant record.
pub(crate) struct Optns;

impl VariantLogic for Optns {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        if attrs.option_type.is_none() {
            return Err(attrs.invalid("option_type is required"));
        }
        if attrs.option_strike_1.is_none() {
            return Err(attrs.invalid("option_strike_1 is required"));
        }
        if attrs.maturity_date.is_none() && attrs.option_exercise_end_date.is_none() {
            return Err(attrs.invalid("maturity_date or option_exercise_end_date is required"));
        }
        Ok(())
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        let attrs = ctx.attrs;
        let expiry = expiry(attrs)?;
        let mut builder = EventBuilder::new(attrs);

        if let Some(prd) = attrs.purchase_date {
            builder.push_unadjusted(EventType::Prd, prd);
        }
        for &ad in &attrs.analysis_dates {
            builder.push_unadjusted(EventType::Ad, ad);
        }

        let exercise_dates = match attrs
            .option_exercise_type
            .unwrap_or(OptionExerciseType::European)
        {
            OptionExerciseType::European => vec![expiry],
            OptionExerciseType::Bermudan => {
                vec![attrs.option_exercise_end_date.unwrap_or(expiry)]
            }
            OptionExerciseType::American => {
                let monthly = Cycle::new(1, CycleUnit::Month, None)
                    .map_err(|e| attrs.invalid(e.to_string()))?;
                expand_cycle(
                    attrs.status_date,
                    Some(&monthly),
                    expiry,
                    attrs.end_of_month_convention,
                )
                .into_iter()
                .filter(|&d| d > attrs.status_date)
                .collect()
            }
        };
        for date in &exercise_dates {
            builder.push_unadjusted(EventType::Xd, *date);
            // A settlement period defers the payment to a later STD event;
            // otherwise the exercise event itself pays.
            if attrs.settlement_period.is_some() {
                builder.push_unadjusted(EventType::Std, settlement_time(attrs, *date));
            }
        }
        builder.push_unadjusted(EventType::Md, expiry);
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
            EventType::Xd if attrs.settlement_period.is_none() => {
                if state.exercise_date.is_some() {
                    0.0
                } else {
                    let spot = ctx.observe(&underlier_identifier(attrs), event.event_time)?;
                    attrs.role_sign()
                        * intrinsic_value(
                            attrs.option_type.unwrap_or(OptionType::Call),
                            spot,
                            attrs.option_strike_1.unwrap_or(0.0),
                            attrs.option_strike_2,
                        )
                }
            }
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
            EventType::Xd if state.exercise_date.is_none() => {
                let spot = ctx.observe(&underlier_identifier(attrs), t)?;
                let intrinsic = intrinsic_value(
                    attrs.option_type.unwrap_or(OptionType::Call),
                    spot,
                    attrs.option_strike_1.unwrap_or(0.0),
                    attrs.option_strike_2,
                );
                if intrinsic > 0.0 {
                    ContractState {
                        status_date: t,
                        exercise_date: Some(t),
                        // Immediate settlement pays at the exercise itself;
                        // only a deferred settlement carries the amount.
                        exercise_amount: if attrs.settlement_period.is_some() {
                            intrinsic
                        } else {
                            0.0
                        },
                        ..*state
                    }
                } else {
                    ContractState {
                        status_date: t,
                        ..*state
                    }
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

/// Intrinsic value by option type: call, put, or the collar sum of both
/// legs.
pub(crate) fn intrinsic_value(
    option_type: OptionType,
    spot: f64,
    strike_1: f64,
    strike_2: Option<f64>,
) -> f64 {
    match option_type {
        OptionType::Call => (spot - strike_1).max(0.0),
        OptionType::Put => (strike_1 - spot).max(0.0),
        OptionType::CallPut => {
            (spot - strike_1).max(0.0) + (strike_2.unwrap_or(strike_1) - spot).max(0.0)
        }
    }
}

fn expiry(attrs: &ContractAttributes) -> Result<ActusDateTime, EngineError> {
    attrs
        .maturity_date
        .or(attrs.option_exercise_end_date)
        .ok_or_else(|| attrs.invalid("maturity_date or option_exercise_end_date is required"))
}

fn settlement_time(attrs: &ContractAttributes, exercise: ActusDateTime) -> ActusDateTime {
    match attrs.settlement_period {
        Some(cycle) => cycle.date_at(exercise, 1, attrs.end_of_month_convention),
        None => exercise,
    }
}

pub(crate) fn underlier_identifier(attrs: &ContractAttributes) -> String {
    attrs
        .market_object_code
        .clone()
        .unwrap_or_else(|| attrs.contract_id.clone())
}
