//! The `terms` map: camelCase attribute names round-tripping to the
//! engine's snake_case record.
//!
//! The primary key set is the camelCase form of the engine's field names
//! (`initialExchangeDate`, `interestPaymentCycle`, …). The dictionary-style
//! names used by the official test files (`cycleOfInterestPayment`,
//! `lifeCap`, …) are accepted as aliases on input. Unknown keys are
//! ignored, so richer term records load without modification.

use serde_json::{Map, Value};
use std::str::FromStr;

use actus_core::attributes::{ContractAttributes, ContractStructure};
use actus_core::types::cycle::Cycle;
use actus_core::types::time::ActusDateTime;

use crate::error::AdapterError;

/// Builds engine attributes from a camelCase `terms` map.
pub fn attributes_from_terms(terms: &Map<String, Value>) -> Result<ContractAttributes, AdapterError> {
    let contract_id = get_string(terms, &["contractID", "contractId"])
        .ok_or(AdapterError::MissingTerm("contractID"))?;
    let contract_type = get_parsed(terms, &["contractType"])?
        .ok_or(AdapterError::MissingTerm("contractType"))?;
    let contract_role = get_parsed(terms, &["contractRole"])?
        .ok_or(AdapterError::MissingTerm("contractRole"))?;
    let status_date = get_date(terms, &["statusDate"])?
        .ok_or(AdapterError::MissingTerm("statusDate"))?;
    let currency = get_string(terms, &["currency"])
        .ok_or(AdapterError::MissingTerm("currency"))?;

    let mut attrs = ContractAttributes::new(
        contract_id,
        contract_type,
        contract_role,
        status_date,
        currency,
    );

    // Calendar anchors.
    attrs.contract_deal_date = get_date(terms, &["contractDealDate"])?;
    attrs.initial_exchange_date = get_date(terms, &["initialExchangeDate"])?;
    attrs.maturity_date = get_date(terms, &["maturityDate"])?;
    attrs.amortization_date = get_date(terms, &["amortizationDate"])?;
    attrs.purchase_date = get_date(terms, &["purchaseDate"])?;
    attrs.termination_date = get_date(terms, &["terminationDate"])?;
    attrs.horizon_date = get_date(terms, &["horizonDate"])?;
    attrs.analysis_dates = get_date_array(terms, &["analysisDates"])?;

    // Notionals and rates.
    attrs.notional_principal = get_f64(terms, &["notionalPrincipal"])?;
    attrs.notional_principal_2 = get_f64(terms, &["notionalPrincipal2"])?;
    attrs.nominal_interest_rate = get_f64(terms, &["nominalInterestRate"])?;
    attrs.nominal_interest_rate_2 = get_f64(terms, &["nominalInterestRate2"])?;
    attrs.currency_2 = get_string(terms, &["currency2"]);
    attrs.settlement_currency = get_string(terms, &["settlementCurrency"]);
    attrs.accrued_interest = get_f64(terms, &["accruedInterest"])?;
    attrs.premium_discount_at_ied =
        get_f64(terms, &["premiumDiscountAtIED", "premiumDiscountAtIed"])?;
    attrs.price_at_purchase_date = get_f64(terms, &["priceAtPurchaseDate"])?;
    attrs.price_at_termination_date = get_f64(terms, &["priceAtTerminationDate"])?;

    // Conventions.
    attrs.day_count_convention = get_parsed(terms, &["dayCountConvention"])?;
    if let Some(bdc) = get_parsed(terms, &["businessDayConvention"])? {
        attrs.business_day_convention = bdc;
    }
    if let Some(eomc) = get_parsed(terms, &["endOfMonthConvention"])? {
        attrs.end_of_month_convention = eomc;
    }
    if let Some(calendar) = get_parsed(terms, &["calendar"])? {
        attrs.calendar = calendar;
    }

    // Interest schedule.
    attrs.interest_payment_cycle =
        get_cycle(terms, &["interestPaymentCycle", "cycleOfInterestPayment"])?;
    attrs.interest_payment_anchor = get_date(
        terms,
        &["interestPaymentAnchor", "cycleAnchorDateOfInterestPayment"],
    )?;
    attrs.interest_capitalization_end_date = get_date(
        terms,
        &["interestCapitalizationEndDate", "capitalizationEndDate"],
    )?;

    // Principal redemption.
    attrs.principal_redemption_cycle = get_cycle(
        terms,
        &["principalRedemptionCycle", "cycleOfPrincipalRedemption"],
    )?;
    attrs.principal_redemption_anchor = get_date(
        terms,
        &[
            "principalRedemptionAnchor",
            "cycleAnchorDateOfPrincipalRedemption",
        ],
    )?;
    attrs.next_principal_redemption_amount = get_f64(
        terms,
        &[
            "nextPrincipalRedemptionAmount",
            "nextPrincipalRedemptionPayment",
        ],
    )?;

    // Interest calculation base.
    attrs.interest_calculation_base = get_parsed(terms, &["interestCalculationBase"])?;
    attrs.interest_calculation_base_amount =
        get_f64(terms, &["interestCalculationBaseAmount"])?;
    attrs.interest_calculation_base_cycle = get_cycle(
        terms,
        &[
            "interestCalculationBaseCycle",
            "cycleOfInterestCalculationBase",
        ],
    )?;
    attrs.interest_calculation_base_anchor = get_date(
        terms,
        &[
            "interestCalculationBaseAnchor",
            "cycleAnchorDateOfInterestCalculationBase",
        ],
    )?;

    // Fees.
    attrs.fee_payment_cycle = get_cycle(terms, &["feePaymentCycle", "cycleOfFee"])?;
    attrs.fee_payment_anchor = get_date(terms, &["feePaymentAnchor", "cycleAnchorDateOfFee"])?;
    attrs.fee_rate = get_f64(terms, &["feeRate"])?;
    attrs.fee_basis = get_parsed(terms, &["feeBasis"])?;
    attrs.fee_accrued = get_f64(terms, &["feeAccrued"])?;

    // Rate resets.
    attrs.rate_reset_cycle = get_cycle(terms, &["rateResetCycle", "cycleOfRateReset"])?;
    attrs.rate_reset_anchor =
        get_date(terms, &["rateResetAnchor", "cycleAnchorDateOfRateReset"])?;
    attrs.rate_reset_market_object = get_string(
        terms,
        &["rateResetMarketObject", "marketObjectCodeOfRateReset"],
    );
    attrs.rate_reset_multiplier = get_f64(terms, &["rateResetMultiplier", "rateMultiplier"])?;
    attrs.rate_reset_spread = get_f64(terms, &["rateResetSpread", "rateSpread"])?;
    attrs.rate_reset_floor = get_f64(terms, &["rateResetFloor", "lifeFloor"])?;
    attrs.rate_reset_cap = get_f64(terms, &["rateResetCap", "lifeCap"])?;
    attrs.rate_reset_next = get_f64(terms, &["rateResetNext", "nextResetRate"])?;

    // Scaling.
    attrs.scaling_index_cycle = get_cycle(terms, &["scalingIndexCycle", "cycleOfScalingIndex"])?;
    attrs.scaling_index_anchor =
        get_date(terms, &["scalingIndexAnchor", "cycleAnchorDateOfScalingIndex"])?;
    if let Some(effect) = get_parsed(terms, &["scalingEffect"])? {
        attrs.scaling_effect = effect;
    }
    attrs.scaling_market_object = get_string(
        terms,
        &["scalingMarketObject", "marketObjectCodeOfScalingIndex"],
    );
    attrs.scaling_index_at_status_date = get_f64(terms, &["scalingIndexAtStatusDate"])?;

    // Prepayment and penalties.
    if let Some(effect) = get_parsed(terms, &["prepaymentEffect"])? {
        attrs.prepayment_effect = effect;
    }
    attrs.penalty_type = get_parsed(terms, &["penaltyType"])?;
    attrs.penalty_rate = get_f64(terms, &["penaltyRate"])?;

    // Derivative terms.
    attrs.option_type = get_parsed(terms, &["optionType"])?;
    attrs.option_strike_1 = get_f64(terms, &["optionStrike1"])?;
    attrs.option_strike_2 = get_f64(terms, &["optionStrike2"])?;
    attrs.option_exercise_type = get_parsed(terms, &["optionExerciseType"])?;
    attrs.option_exercise_end_date = get_date(terms, &["optionExerciseEndDate"])?;
    attrs.exercise_date = get_date(terms, &["exerciseDate"])?;
    attrs.exercise_amount = get_f64(terms, &["exerciseAmount"])?;
    attrs.settlement_period = get_cycle(terms, &["settlementPeriod"])?;
    attrs.delivery_settlement = get_parsed(terms, &["deliverySettlement"])?;
    attrs.future_price = get_f64(terms, &["futurePrice", "futuresPrice"])?;

    // Equity and commodity.
    attrs.quantity = get_f64(terms, &["quantity"])?;
    attrs.unit = get_string(terms, &["unit"]);
    attrs.market_object_code = get_string(terms, &["marketObjectCode"]);
    attrs.market_object_code_of_dividends =
        get_string(terms, &["marketObjectCodeOfDividends", "marketObjectCodeOfDividendRate"]);
    attrs.dividend_cycle = get_cycle(terms, &["dividendCycle", "cycleOfDividend"])?;
    attrs.dividend_anchor = get_date(terms, &["dividendAnchor", "cycleAnchorDateOfDividend"])?;

    // Credit enhancement.
    attrs.coverage = get_f64(terms, &["coverage", "coverageOfCreditEnhancement"])?;
    attrs.credit_event_type = get_parsed(terms, &["creditEventType", "creditEventTypeCovered"])?;
    attrs.guarantee_extent = get_parsed(terms, &["guaranteeExtent", "guaranteedExposure"])?;
    attrs.contract_structure = get_structure(terms, &["contractStructure"])?;

    if let Some(performance) = get_parsed(terms, &["contractPerformance"])? {
        attrs.contract_performance = performance;
    }

    Ok(attrs)
}

/// Emits the camelCase `terms` map for the attribute subset the format
/// carries. Unset fields are omitted.
pub fn terms_from_attributes(attrs: &ContractAttributes) -> Map<String, Value> {
    let mut terms = Map::new();
    let mut put = |key: &str, value: Value| {
        terms.insert(key.to_string(), value);
    };

    put("contractID", Value::String(attrs.contract_id.clone()));
    put("contractType", Value::String(attrs.contract_type.code().to_string()));
    put("contractRole", Value::String(attrs.contract_role.code().to_string()));
    put("statusDate", Value::String(attrs.status_date.to_string()));
    put("currency", Value::String(attrs.currency.clone()));

    let mut put_date = |key: &str, value: Option<ActusDateTime>| {
        if let Some(date) = value {
            terms.insert(key.to_string(), Value::String(date.to_string()));
        }
    };
    put_date("initialExchangeDate", attrs.initial_exchange_date);
    put_date("maturityDate", attrs.maturity_date);
    put_date("purchaseDate", attrs.purchase_date);
    put_date("terminationDate", attrs.termination_date);
    put_date("interestPaymentAnchor", attrs.interest_payment_anchor);
    put_date("rateResetAnchor", attrs.rate_reset_anchor);
    put_date("principalRedemptionAnchor", attrs.principal_redemption_anchor);

    let mut put_f64 = |key: &str, value: Option<f64>| {
        if let Some(number) = value.and_then(serde_json::Number::from_f64) {
            terms.insert(key.to_string(), Value::Number(number));
        }
    };
    put_f64("notionalPrincipal", attrs.notional_principal);
    put_f64("nominalInterestRate", attrs.nominal_interest_rate);
    put_f64("nominalInterestRate2", attrs.nominal_interest_rate_2);
    put_f64("notionalPrincipal2", attrs.notional_principal_2);
    put_f64("nextPrincipalRedemptionAmount", attrs.next_principal_redemption_amount);
    put_f64("rateResetSpread", attrs.rate_reset_spread);
    put_f64("rateResetMultiplier", attrs.rate_reset_multiplier);
    put_f64("rateResetCap", attrs.rate_reset_cap);
    put_f64("rateResetFloor", attrs.rate_reset_floor);
    put_f64("feeRate", attrs.fee_rate);
    put_f64("coverage", attrs.coverage);

    let mut put_cycle = |key: &str, value: Option<Cycle>| {
        if let Some(cycle) = value {
            terms.insert(key.to_string(), Value::String(cycle.to_string()));
        }
    };
    put_cycle("interestPaymentCycle", attrs.interest_payment_cycle);
    put_cycle("rateResetCycle", attrs.rate_reset_cycle);
    put_cycle("principalRedemptionCycle", attrs.principal_redemption_cycle);
    put_cycle("feePaymentCycle", attrs.fee_payment_cycle);

    if let Some(dcc) = attrs.day_count_convention {
        terms.insert(
            "dayCountConvention".to_string(),
            Value::String(dcc.code().to_string()),
        );
    }
    terms.insert(
        "businessDayConvention".to_string(),
        Value::String(attrs.business_day_convention.code().to_string()),
    );
    terms.insert(
        "endOfMonthConvention".to_string(),
        Value::String(attrs.end_of_month_convention.code().to_string()),
    );
    terms.insert(
        "calendar".to_string(),
        Value::String(attrs.calendar.code().to_string()),
    );
    if let Some(market_object) = &attrs.rate_reset_market_object {
        terms.insert(
            "rateResetMarketObject".to_string(),
            Value::String(market_object.clone()),
        );
    }
    terms
}

/// Normalises a cycle code: the native `nU[+-]` grammar passes through; the
/// ISO-prefixed dictionary form `PnUL0`/`PnUL1` maps to short/long stubs.
pub fn normalize_cycle_code(code: &str) -> String {
    let trimmed = code.trim();
    if let Some(rest) = trimmed.strip_prefix('P') {
        if let Some(body) = rest.strip_suffix("L0") {
            return format!("{}-", body);
        }
        if let Some(body) = rest.strip_suffix("L1") {
            return format!("{}+", body);
        }
        return rest.to_string();
    }
    trimmed.to_string()
}

fn get_value<'a>(terms: &'a Map<String, Value>, names: &[&str]) -> Option<(&'a Value, String)> {
    for name in names {
        if let Some(value) = terms.get(*name) {
            if !value.is_null() {
                return Some((value, name.to_string()));
            }
        }
    }
    None
}

fn get_string(terms: &Map<String, Value>, names: &[&str]) -> Option<String> {
    get_value(terms, names).and_then(|(v, _)| v.as_str().map(str::to_string))
}

fn get_f64(terms: &Map<String, Value>, names: &[&str]) -> Result<Option<f64>, AdapterError> {
    let Some((value, name)) = get_value(terms, names) else {
        return Ok(None);
    };
    match value {
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => s.parse::<f64>().map(Some).map_err(|_| {
            AdapterError::InvalidTerm {
                name,
                reason: format!("not a number: {}", s),
            }
        }),
        _ => Err(AdapterError::InvalidTerm {
            name,
            reason: "expected a number".to_string(),
        }),
    }
}

fn get_date(
    terms: &Map<String, Value>,
    names: &[&str],
) -> Result<Option<ActusDateTime>, AdapterError> {
    let Some((value, name)) = get_value(terms, names) else {
        return Ok(None);
    };
    let text = value.as_str().ok_or_else(|| AdapterError::InvalidTerm {
        name: name.clone(),
        reason: "expected a date string".to_string(),
    })?;
    ActusDateTime::parse(text)
        .map(Some)
        .map_err(|e| AdapterError::InvalidTerm {
            name,
            reason: e.to_string(),
        })
}

fn get_date_array(
    terms: &Map<String, Value>,
    names: &[&str],
) -> Result<Vec<ActusDateTime>, AdapterError> {
    let Some((value, name)) = get_value(terms, names) else {
        return Ok(Vec::new());
    };
    let items = value.as_array().ok_or_else(|| AdapterError::InvalidTerm {
        name: name.clone(),
        reason: "expected an array of dates".to_string(),
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| AdapterError::InvalidTerm {
                    name: name.clone(),
                    reason: "expected a date string".to_string(),
                })
                .and_then(|s| {
                    ActusDateTime::parse(s).map_err(|e| AdapterError::InvalidTerm {
                        name: name.clone(),
                        reason: e.to_string(),
                    })
                })
        })
        .collect()
}

fn get_cycle(terms: &Map<String, Value>, names: &[&str]) -> Result<Option<Cycle>, AdapterError> {
    let Some((value, name)) = get_value(terms, names) else {
        return Ok(None);
    };
    let text = value.as_str().ok_or_else(|| AdapterError::InvalidTerm {
        name: name.clone(),
        reason: "expected a cycle string".to_string(),
    })?;
    normalize_cycle_code(text)
        .parse()
        .map(Some)
        .map_err(|e: actus_core::types::error::CycleError| AdapterError::InvalidTerm {
            name,
            reason: e.to_string(),
        })
}

fn get_parsed<T>(terms: &Map<String, Value>, names: &[&str]) -> Result<Option<T>, AdapterError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(text) = get_string(terms, names) else {
        return Ok(None);
    };
    text.parse()
        .map(Some)
        .map_err(|e: T::Err| AdapterError::InvalidTerm {
            name: names[0].to_string(),
            reason: e.to_string(),
        })
}

fn get_structure(
    terms: &Map<String, Value>,
    names: &[&str],
) -> Result<Option<ContractStructure>, AdapterError> {
    let Some((value, name)) = get_value(terms, names) else {
        return Ok(None);
    };
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    ContractStructure::parse(&text)
        .map(Some)
        .map_err(|e| AdapterError::InvalidTerm {
            name,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actus_core::types::enums::{ContractRole, ContractType, DayCountConvention};

    fn sample_terms() -> Map<String, Value> {
        serde_json::from_str(
            r#"{
                "contractID": "pam01",
                "contractType": "PAM",
                "contractRole": "RPA",
                "statusDate": "2024-01-01T00:00:00",
                "currency": "USD",
                "initialExchangeDate": "2024-01-15",
                "maturityDate": "2025-01-15",
                "notionalPrincipal": 100000,
                "nominalInterestRate": "0.05",
                "dayCountConvention": "30E360",
                "cycleOfInterestPayment": "P6ML0",
                "unknownVendorField": 42
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_terms_load() {
        let attrs = attributes_from_terms(&sample_terms()).unwrap();
        assert_eq!(attrs.contract_id, "pam01");
        assert_eq!(attrs.contract_type, ContractType::Pam);
        assert_eq!(attrs.contract_role, ContractRole::Rpa);
        assert_eq!(attrs.notional_principal, Some(100_000.0));
        // Numeric strings coerce.
        assert_eq!(attrs.nominal_interest_rate, Some(0.05));
        assert_eq!(attrs.day_count_convention, Some(DayCountConvention::ThirtyE360));
        // Dictionary-style cycle alias and ISO-prefixed code.
        assert_eq!(attrs.interest_payment_cycle.unwrap().to_string(), "6M-");
    }

    #[test]
    fn test_missing_mandatory_term() {
        let mut terms = sample_terms();
        terms.remove("contractRole");
        assert!(matches!(
            attributes_from_terms(&terms),
            Err(AdapterError::MissingTerm("contractRole"))
        ));
    }

    #[test]
    fn test_normalize_cycle_codes() {
        assert_eq!(normalize_cycle_code("6M"), "6M");
        assert_eq!(normalize_cycle_code("6M+"), "6M+");
        assert_eq!(normalize_cycle_code("P6ML0"), "6M-");
        assert_eq!(normalize_cycle_code("P1YL1"), "1Y+");
        assert_eq!(normalize_cycle_code("P3M"), "3M");
    }

    #[test]
    fn test_roundtrip_on_used_subset() {
        let attrs = attributes_from_terms(&sample_terms()).unwrap();
        let emitted = terms_from_attributes(&attrs);
        let reloaded = attributes_from_terms(&emitted).unwrap();
        assert_eq!(reloaded, attrs);
    }

    #[test]
    fn test_contract_structure_accepts_string_and_object() {
        let mut terms = sample_terms();
        terms.insert(
            "contractStructure".to_string(),
            Value::String(r#"{"Underlying":"SWAP-1"}"#.to_string()),
        );
        let attrs = attributes_from_terms(&terms).unwrap();
        assert!(attrs.contract_structure.is_some());

        terms.insert(
            "contractStructure".to_string(),
            serde_json::json!({"FirstLeg": "A", "SecondLeg": "B"}),
        );
        let attrs = attributes_from_terms(&terms).unwrap();
        assert!(matches!(
            attrs.contract_structure,
            Some(ContractStructure::SwapLegs { .. })
        ));
    }
}
