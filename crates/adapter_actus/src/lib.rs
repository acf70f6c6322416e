//! # adapter_actus: ACTUS JSON Cross-Validation Adapter
//!
//! Loads the per-contract cross-validation records of the official test
//! suite and runs them against the engine:
//!
//! - `terms`: camelCase attribute map mapped onto the engine's snake_case
//!   [`ContractAttributes`](actus_core::attributes::ContractAttributes)
//! - `dataObserved`: market time series keyed by market object code
//! - `results`: the reference event list, compared at the suite tolerance
//!   (absolute 1.0, relative 1e-4, whichever is larger)

#![warn(missing_docs)]

pub mod error;
pub mod observed;
pub mod results;
pub mod terms;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use actus_engine::create_contract;

pub use error::AdapterError;
pub use observed::{observer_from_data, ObservedSeries};
pub use results::{compare, Mismatch, ReferenceEvent};
pub use terms::{attributes_from_terms, terms_from_attributes};

/// One cross-validation case as stored in the suite files.
#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    /// Case identifier, when the file carries one.
    #[serde(default)]
    pub identifier: Option<String>,
    /// The camelCase contract terms.
    pub terms: Map<String, Value>,
    /// Observed market data.
    #[serde(rename = "dataObserved", default)]
    pub data_observed: Vec<ObservedSeries>,
    /// The reference event list.
    #[serde(default)]
    pub results: Vec<ReferenceEvent>,
}

/// The outcome of running one case.
#[derive(Debug)]
pub struct CaseOutcome {
    /// The simulated contract id.
    pub contract_id: String,
    /// Number of simulated events.
    pub event_count: usize,
    /// Divergences against the reference list; empty on a pass.
    pub mismatches: Vec<Mismatch>,
}

impl CaseOutcome {
    /// True when every reference entry matched within tolerance.
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Parses a case document.
pub fn load_case(json: &str) -> Result<TestCase, AdapterError> {
    Ok(serde_json::from_str(json)?)
}

/// Simulates a case and compares against its reference results.
pub fn run_case(case: &TestCase) -> Result<CaseOutcome, AdapterError> {
    let attributes = attributes_from_terms(&case.terms)?;
    let observer = observer_from_data(&case.data_observed)?;
    let contract = create_contract(attributes, Arc::new(observer), None)?;
    let result = contract.simulate()?;
    let mismatches = compare(&result.events, &case.results);
    Ok(CaseOutcome {
        contract_id: result.contract_id,
        event_count: result.events.len(),
        mismatches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_case() {
        let case = load_case(
            r#"{
                "terms": {
                    "contractID": "pam01",
                    "contractType": "PAM",
                    "contractRole": "RPA",
                    "statusDate": "2024-01-01",
                    "currency": "USD",
                    "initialExchangeDate": "2024-01-15",
                    "maturityDate": "2025-01-15",
                    "notionalPrincipal": 1000,
                    "nominalInterestRate": 0.05
                }
            }"#,
        )
        .unwrap();
        assert!(case.results.is_empty());
        assert!(case.data_observed.is_empty());
        let outcome = run_case(&case).unwrap();
        assert!(outcome.passed());
        assert!(outcome.event_count >= 2);
    }
}
