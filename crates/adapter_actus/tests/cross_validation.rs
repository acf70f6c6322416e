//! Cross-validation cases run end-to-end through the adapter.

use adapter_actus::{load_case, run_case};

/// A one-year semi-annual PAM with hand-computed reference flows.
const PAM_CASE: &str = r#"{
    "identifier": "pam-semiannual-1y",
    "terms": {
        "contractID": "pam01",
        "contractType": "PAM",
        "contractRole": "RPA",
        "statusDate": "2024-01-01T00:00:00",
        "currency": "USD",
        "initialExchangeDate": "2024-01-15T00:00:00",
        "maturityDate": "2025-01-15T00:00:00",
        "notionalPrincipal": 100000,
        "nominalInterestRate": 0.05,
        "dayCountConvention": "30E360",
        "cycleOfInterestPayment": "P6ML0"
    },
    "dataObserved": [],
    "results": [
        {"time": "2024-01-15T00:00:00", "type": "IED", "payoff": -100000,
         "notionalPrincipal": 100000, "nominalInterestRate": 0.05, "accruedInterest": 0},
        {"time": "2024-07-15T00:00:00", "type": "IP", "payoff": 2500,
         "notionalPrincipal": 100000, "nominalInterestRate": 0.05, "accruedInterest": 0},
        {"time": "2025-01-15T00:00:00", "type": "MD", "payoff": 102500,
         "notionalPrincipal": 0, "nominalInterestRate": 0.05, "accruedInterest": 0}
    ]
}"#;

/// The same contract with a mid-life reset observing an 8% market rate.
const PAM_RESET_CASE: &str = r#"{
    "identifier": "pam-rate-reset",
    "terms": {
        "contractID": "pam02",
        "contractType": "PAM",
        "contractRole": "RPA",
        "statusDate": "2024-01-01T00:00:00",
        "currency": "USD",
        "initialExchangeDate": "2024-01-15T00:00:00",
        "maturityDate": "2025-01-15T00:00:00",
        "notionalPrincipal": 100000,
        "nominalInterestRate": 0.05,
        "dayCountConvention": "30E360",
        "cycleOfInterestPayment": "P6ML0",
        "cycleOfRateReset": "P6ML0",
        "cycleAnchorDateOfRateReset": "2024-07-15T00:00:00",
        "marketObjectCodeOfRateReset": "UST-1Y",
        "rateMultiplier": 1.0,
        "rateSpread": 0.0
    },
    "dataObserved": [
        {"marketObjectCode": "UST-1Y", "data": [
            {"timestamp": "2024-01-01T00:00:00", "value": 0.05},
            {"timestamp": "2024-07-01T00:00:00", "value": 0.08}
        ]}
    ],
    "results": [
        {"time": "2024-01-15T00:00:00", "type": "IED", "payoff": -100000},
        {"time": "2024-07-15T00:00:00", "type": "IP", "payoff": 2500},
        {"time": "2024-07-15T00:00:00", "type": "RR", "payoff": 0,
         "nominalInterestRate": 0.08},
        {"time": "2025-01-15T00:00:00", "type": "MD", "payoff": 104000}
    ]
}"#;

#[test]
fn pam_case_passes_within_tolerance() {
    let case = load_case(PAM_CASE).unwrap();
    let outcome = run_case(&case).unwrap();
    assert!(
        outcome.passed(),
        "mismatches: {:?}",
        outcome.mismatches
    );
    assert_eq!(outcome.contract_id, "pam01");
    assert_eq!(outcome.event_count, 3);
}

#[test]
fn pam_reset_case_passes_within_tolerance() {
    let case = load_case(PAM_RESET_CASE).unwrap();
    let outcome = run_case(&case).unwrap();
    assert!(
        outcome.passed(),
        "mismatches: {:?}",
        outcome.mismatches
    );
}

#[test]
fn divergent_reference_is_reported() {
    let mut case = load_case(PAM_CASE).unwrap();
    case.results[1].payoff = 9_999.0;
    let outcome = run_case(&case).unwrap();
    assert!(!outcome.passed());
    assert_eq!(outcome.mismatches.len(), 1);
    assert_eq!(outcome.mismatches[0].field, "payoff");
}
