//! Contract state variables.

use crate::types::enums::ContractPerformance;
use crate::types::time::ActusDateTime;

/// Immutable contract state at a point in time.
///
/// State cells follow the ACTUS naming (short codes in parentheses). Signed
/// cells — `notional`, `accrued_interest`, `next_principal_payment`,
/// `accrued_fees` — are stored already multiplied by the role sign; unsigned
/// contract attributes pick up `R(role)` inside the payoff functions.
///
/// State transition functions never mutate; they return a new value.
///
/// # Examples
///
/// ```
/// use actus_core::state::ContractState;
/// use actus_core::types::time::ActusDateTime;
///
/// let sd = ActusDateTime::from_ymd(2024, 1, 1).unwrap();
/// let state = ContractState::new(sd);
/// let funded = ContractState { notional: 100_000.0, ..state };
/// assert_eq!(state.notional, 0.0); // original untouched
/// assert_eq!(funded.notional, 100_000.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContractState {
    /// Current simulation time (Sd).
    pub status_date: ActusDateTime,
    /// Maturity date carried in state (Tmd); may differ from the attribute
    /// after maturity-changing events.
    pub maturity_date: Option<ActusDateTime>,
    /// Notional principal (Nt), signed.
    pub notional: f64,
    /// Nominal interest rate (Ipnr).
    pub nominal_rate: f64,
    /// Accrued interest (Ipac), signed. For SWPPV this is the fixed leg.
    pub accrued_interest: f64,
    /// Accrued interest of the floating leg (Ipac2), SWPPV only.
    pub accrued_interest_2: f64,
    /// Accrued fees (Feac), signed.
    pub accrued_fees: f64,
    /// Notional scaling multiplier (Nsc).
    pub notional_scaling: f64,
    /// Interest scaling multiplier (Isc).
    pub interest_scaling: f64,
    /// Next principal redemption payment (Prnxt), signed.
    pub next_principal_payment: f64,
    /// Interest calculation base (Ipcb), signed.
    pub interest_calc_base: f64,
    /// Performance status (Prf).
    pub performance: ContractPerformance,
    /// Exercise date (Xd), set once an exercise has happened.
    pub exercise_date: Option<ActusDateTime>,
    /// Exercise amount (Xa), fixed at exercise and paid at settlement.
    pub exercise_amount: f64,
}

impl ContractState {
    /// Creates an empty state at the given status date: zero amounts, unit
    /// scaling multipliers, performant.
    pub fn new(status_date: ActusDateTime) -> Self {
        ContractState {
            status_date,
            maturity_date: None,
            notional: 0.0,
            nominal_rate: 0.0,
            accrued_interest: 0.0,
            accrued_interest_2: 0.0,
            accrued_fees: 0.0,
            notional_scaling: 1.0,
            interest_scaling: 1.0,
            next_principal_payment: 0.0,
            interest_calc_base: 0.0,
            performance: ContractPerformance::Pf,
            exercise_date: None,
            exercise_amount: 0.0,
        }
    }
}
