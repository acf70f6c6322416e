//! Error types for structured error handling.
//!
//! This module provides:
//! - `DateError`: errors from date construction and parsing
//! - `CycleError`: errors from ACTUS cycle notation parsing
//! - `UnknownCode`: errors from enumeration code parsing
//! - `StructureError`: errors from `contract_structure` descriptor parsing
//! - `ObserverError`: errors reported by observer implementations
//! - `EngineError`: the engine-level error taxonomy

use thiserror::Error;

use crate::types::enums::EventType;
use crate::types::time::ActusDateTime;

/// Date-related errors.
///
/// # Examples
/// ```
/// use actus_core::types::error::DateError;
///
/// let err = DateError::InvalidDate { year: 2024, month: 2, day: 30 };
/// assert_eq!(format!("{}", err), "invalid date: 2024-02-30");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// Invalid calendar date components (e.g. February 30th).
    #[error("invalid date: {year:04}-{month:02}-{day:02}")]
    InvalidDate {
        /// Year component
        year: i32,
        /// Month component (1-12)
        month: u32,
        /// Day component (1-31)
        day: u32,
    },

    /// Invalid time-of-day components.
    #[error("invalid time: {hour:02}:{minute:02}:{second:02}")]
    InvalidTime {
        /// Hour component
        hour: u32,
        /// Minute component
        minute: u32,
        /// Second component
        second: u32,
    },

    /// Failed to parse an ISO 8601 date-time string.
    #[error("date parse error: {0}")]
    Parse(String),
}

/// Cycle-notation errors.
///
/// Raised when a string does not match the ACTUS cycle grammar
/// `[0-9]+[DWMQHY][+-]?`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    /// The string is not a valid cycle expression.
    #[error("invalid cycle: {0}")]
    InvalidCycle(String),
}

/// An enumeration code that is not part of the ACTUS dictionary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} code: {code}")]
pub struct UnknownCode {
    /// Which enumeration was being parsed (e.g. "contract type").
    pub kind: &'static str,
    /// The offending code.
    pub code: String,
}

/// Errors from parsing the `contract_structure` descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    /// The descriptor is not valid JSON.
    #[error("contract structure is not valid JSON: {0}")]
    Json(String),

    /// The descriptor parsed but does not match a known shape
    /// (swap legs, underlier, or coverage).
    #[error("unrecognised contract structure: {0}")]
    Unrecognised(String),
}

/// Errors reported by observer implementations.
///
/// Built-in market observers are total and never fail; these variants exist
/// for constructor validation, child lookups and custom implementations whose
/// internal failures must be surfaced unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObserverError {
    /// Not enough data points to construct the observer.
    #[error("insufficient data points: got {got}, need at least {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },

    /// Tenor or timestamp axis is not strictly increasing.
    #[error("data is not monotonic at index {index}")]
    NonMonotonicData {
        /// Index where the violation was detected
        index: usize,
    },

    /// A child contract id that was never registered.
    #[error("unknown child contract: {0}")]
    UnknownChild(String),

    /// The child registry was frozen before this registration.
    #[error("child observer is frozen; cannot register {0}")]
    Frozen(String),

    /// An observer implementation reported an internal failure.
    #[error("observer failure: {0}")]
    Failure(String),
}

/// Engine-level error taxonomy.
///
/// Factory-stage failures (`InvalidAttributes`) abort before any event is
/// emitted. Simulation-stage failures abort the current contract; previously
/// emitted events are kept by the caller for diagnostics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Required attribute missing, invalid combination, unparseable cycle or
    /// unknown enumeration value. Raised at factory time, never during
    /// simulation.
    #[error("invalid attributes for {contract_id}: {reason}")]
    InvalidAttributes {
        /// Contract being created
        contract_id: String,
        /// Human-readable cause
        reason: String,
    },

    /// A cycle expanded to an empty or non-monotonic date list.
    #[error("invalid schedule for {contract_id}: {reason}")]
    InvalidSchedule {
        /// Contract being scheduled
        contract_id: String,
        /// Human-readable cause
        reason: String,
    },

    /// The composite `contract_structure` graph contains a reference cycle.
    #[error("cyclic contract structure involving {contract_id}")]
    CyclicStructure {
        /// A contract on the cycle
        contract_id: String,
    },

    /// A composite references a child id not present in the child observer.
    #[error("missing child contract {child_id} referenced by {contract_id}")]
    MissingChild {
        /// The referencing parent
        contract_id: String,
        /// The dangling child id
        child_id: String,
    },

    /// Division by zero, log of a non-positive number, or a similar numeric
    /// domain violation, surfaced with event context.
    #[error("numeric domain error in {contract_id} at {event_time} ({event_kind}): {reason}")]
    NumericDomain {
        /// Contract being simulated
        contract_id: String,
        /// Event kind being evaluated
        event_kind: EventType,
        /// Event time being evaluated
        event_time: ActusDateTime,
        /// Human-readable cause
        reason: String,
    },

    /// An observer failure, surfaced unchanged.
    #[error(transparent)]
    Observer(#[from] ObserverError),

    /// A date error escaping schedule arithmetic.
    #[error(transparent)]
    Date(#[from] DateError),

    /// A cycle error escaping attribute interpretation.
    #[error(transparent)]
    Cycle(#[from] CycleError),
}
