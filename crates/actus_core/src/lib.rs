//! # actus_core: Foundation for the ACTUS Contract Engine
//!
//! ## Layer 1 (Foundation) Role
//!
//! actus_core is the bottom layer of the workspace, providing:
//! - Temporal kernel: `ActusDateTime`, cycle notation, day count conventions,
//!   business day adjustment, holiday calendars (`types::time`, `time`)
//! - Data model: `ContractAttributes`, `ContractState`, `ContractEvent` and
//!   the ACTUS enumerations (`attributes`, `state`, `event`, `types::enums`)
//! - Observers: market data, behavioral and child-contract observers
//!   (`observers`)
//! - Error types: `DateError`, `CycleError`, `ObserverError`, `EngineError`
//!   (`types::error`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on the other actus_* crates, with minimal
//! external dependencies:
//! - chrono: date arithmetic
//! - thiserror: structured error types
//! - serde: serialisation support (optional)
//! - serde_json: the `contract_structure` descriptor format
//!
//! ## Usage Examples
//!
//! ```rust
//! use actus_core::types::time::ActusDateTime;
//! use actus_core::types::enums::DayCountConvention;
//! use actus_core::time::day_count::year_fraction;
//!
//! let start = ActusDateTime::from_ymd(2024, 1, 15).unwrap();
//! let end = ActusDateTime::from_ymd(2024, 7, 15).unwrap();
//! let yf = year_fraction(start, end, DayCountConvention::Thirty360Us);
//! assert!((yf - 0.5).abs() < 1e-12);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): enable serialisation for dates, cycles, enumerations
//!   and the data model records

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod attributes;
pub mod event;
pub mod observers;
pub mod state;
pub mod time;
pub mod types;

pub use attributes::{ContractAttributes, ContractStructure};
pub use event::ContractEvent;
pub use state::ContractState;
pub use types::time::ActusDateTime;
