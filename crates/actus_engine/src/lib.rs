//! # actus_engine: Contract Logic for the ACTUS Engine
//!
//! This crate drives declarative contract terms through their lifecycle:
//!
//! - `schedule`: cycle expansion into ordered, stub-handled, business-day
//!   adjusted date sequences
//! - `contracts`: the payoff (POF) and state-transition (STF) registries for
//!   the 18 contract variants
//! - `lifecycle`: the priority-ordered event loop threading state
//! - `factory`: `create_contract`, mapping a contract type to its variant
//!   record
//! - `composite`: child resolution for multi-leg, underlier and covered
//!   contracts, plus parallel portfolio simulation
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use actus_core::attributes::ContractAttributes;
//! use actus_core::observers::market::ConstantObserver;
//! use actus_core::types::enums::{ContractRole, ContractType, DayCountConvention};
//! use actus_core::types::time::ActusDateTime;
//! use actus_engine::create_contract;
//!
//! let mut attrs = ContractAttributes::new(
//!     "LOAN-001",
//!     ContractType::Pam,
//!     ContractRole::Rpa,
//!     ActusDateTime::from_ymd(2024, 1, 1).unwrap(),
//!     "USD",
//! );
//! attrs.initial_exchange_date = ActusDateTime::from_ymd(2024, 1, 15).ok();
//! attrs.maturity_date = ActusDateTime::from_ymd(2025, 1, 15).ok();
//! attrs.notional_principal = Some(100_000.0);
//! attrs.nominal_interest_rate = Some(0.05);
//! attrs.day_count_convention = Some(DayCountConvention::ThirtyE360);
//!
//! let contract = create_contract(attrs, Arc::new(ConstantObserver::new(0.0)), None).unwrap();
//! let result = contract.simulate().unwrap();
//! assert!(!result.events.is_empty());
//! ```

#![warn(missing_docs)]

pub mod composite;
pub mod contracts;
pub mod factory;
pub mod functions;
pub mod lifecycle;
pub mod schedule;

pub use composite::{Portfolio, Scenario};
pub use factory::{create_contract, Contract};
pub use lifecycle::SimulationResult;
