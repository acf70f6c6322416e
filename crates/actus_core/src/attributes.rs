//! Contract attributes (terms and conditions).
//!
//! `ContractAttributes` is the immutable declarative description of a
//! contract. Five fields are mandatory; everything else is optional and only
//! meaningful for some contract types. The factory validates type-specific
//! requirements; [`ContractAttributes::validate`] checks the rules that hold
//! for every type.

use crate::types::cycle::Cycle;
use crate::types::enums::{
    BusinessDayConvention, Calendar, ContractPerformance, ContractRole, ContractType,
    DayCountConvention, DeliverySettlement, EndOfMonthConvention, FeeBasis, FixedVariable,
    GuaranteeExtent, IncreaseDecrease, InterestCalculationBase, OptionExerciseType, OptionType,
    PenaltyType, PrepaymentEffect, ScalingEffect,
};
use crate::types::error::{EngineError, StructureError};
use crate::types::time::ActusDateTime;
use crate::time::day_count::DayCount;

/// Typed form of the `contract_structure` descriptor linking a composite
/// contract to its children.
///
/// The JSON wire shapes accepted are those of the official test files:
/// `{"FirstLeg": …, "SecondLeg": …}`, `{"Underlying": …}` and
/// `{"CoveredContract(s)": …}` with an optional `"CoveringContract"`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContractStructure {
    /// Two swap legs (SWAPS).
    SwapLegs {
        /// First leg contract id.
        first_leg: String,
        /// Second leg contract id.
        second_leg: String,
    },
    /// A single underlier (CAPFL, OPTNS, FUTUR).
    Underlier {
        /// Underlier contract id.
        id: String,
    },
    /// Covered contracts plus an optional covering collateral contract
    /// (CEG, CEC).
    Coverage {
        /// Contracts whose exposure is covered.
        covered: Vec<String>,
        /// Collateral contract providing the cover (CEC).
        covering: Option<String>,
    },
}

impl ContractStructure {
    /// Parses the JSON descriptor format of the reference test files.
    pub fn parse(json: &str) -> Result<Self, StructureError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| StructureError::Json(e.to_string()))?;
        let obj = value
            .as_object()
            .ok_or_else(|| StructureError::Unrecognised(json.to_string()))?;

        let get_str = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(str::to_string);

        if let (Some(first_leg), Some(second_leg)) = (get_str("FirstLeg"), get_str("SecondLeg")) {
            return Ok(ContractStructure::SwapLegs {
                first_leg,
                second_leg,
            });
        }
        if let Some(id) = get_str("Underlying") {
            return Ok(ContractStructure::Underlier { id });
        }

        let covered = if let Some(single) = get_str("CoveredContract") {
            Some(vec![single])
        } else {
            match obj.get("CoveredContracts") {
                Some(serde_json::Value::String(s)) => Some(vec![s.clone()]),
                Some(serde_json::Value::Array(items)) => Some(
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                ),
                _ => None,
            }
        };
        if let Some(covered) = covered {
            return Ok(ContractStructure::Coverage {
                covered,
                covering: get_str("CoveringContract"),
            });
        }

        Err(StructureError::Unrecognised(json.to_string()))
    }

    /// All child contract ids referenced by this structure.
    pub fn referenced_ids(&self) -> Vec<&str> {
        match self {
            ContractStructure::SwapLegs {
                first_leg,
                second_leg,
            } => vec![first_leg, second_leg],
            ContractStructure::Underlier { id } => vec![id],
            ContractStructure::Coverage { covered, covering } => {
                let mut ids: Vec<&str> = covered.iter().map(String::as_str).collect();
                if let Some(c) = covering {
                    ids.push(c);
                }
                ids
            }
        }
    }
}

/// All possible contract terms.
///
/// Construct with [`ContractAttributes::new`] (the five mandatory fields)
/// and set the optional fields directly; the record is treated as immutable
/// once handed to the factory.
///
/// # Examples
///
/// ```
/// use actus_core::attributes::ContractAttributes;
/// use actus_core::types::enums::{ContractRole, ContractType};
/// use actus_core::types::time::ActusDateTime;
///
/// let mut attrs = ContractAttributes::new(
///     "LOAN-001",
///     ContractType::Pam,
///     ContractRole::Rpa,
///     ActusDateTime::from_ymd(2024, 1, 1).unwrap(),
///     "USD",
/// );
/// attrs.notional_principal = Some(100_000.0);
/// attrs.nominal_interest_rate = Some(0.05);
/// assert!(attrs.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContractAttributes {
    // ---- identification ----
    /// Unique contract identifier (CID).
    pub contract_id: String,
    /// Contract type (CT).
    pub contract_type: ContractType,
    /// Contract role (CNTRL); determines the cash-flow sign.
    pub contract_role: ContractRole,
    /// Status date (SD): the point the terms describe the contract at.
    pub status_date: ActusDateTime,
    /// Settlement currency ISO code (CUR).
    pub currency: String,

    // ---- calendar anchors ----
    /// Contract deal date (CDD).
    pub contract_deal_date: Option<ActusDateTime>,
    /// Initial exchange date (IED). May precede the status date for
    /// pre-existing contracts.
    pub initial_exchange_date: Option<ActusDateTime>,
    /// Maturity date (MD).
    pub maturity_date: Option<ActusDateTime>,
    /// Amortization end date (AMD).
    pub amortization_date: Option<ActusDateTime>,
    /// Purchase date (PRD).
    pub purchase_date: Option<ActusDateTime>,
    /// Termination date (TD); truncates the schedule.
    pub termination_date: Option<ActusDateTime>,
    /// Analysis (monitoring) dates (AD).
    pub analysis_dates: Vec<ActusDateTime>,
    /// Simulation horizon for open-ended contracts without a maturity date.
    pub horizon_date: Option<ActusDateTime>,

    // ---- notionals and rates ----
    /// Notional principal (NT), unsigned.
    pub notional_principal: Option<f64>,
    /// Second notional for FX and swaps (NT2), unsigned.
    pub notional_principal_2: Option<f64>,
    /// Nominal interest rate (IPNR). For SWPPV, the fixed-leg rate.
    pub nominal_interest_rate: Option<f64>,
    /// Second nominal rate (IPNR2). For SWPPV, the initial floating rate.
    pub nominal_interest_rate_2: Option<f64>,
    /// Second currency for FX contracts (CUR2).
    pub currency_2: Option<String>,
    /// Settlement currency when different from `currency` (CURS).
    pub settlement_currency: Option<String>,
    /// Accrued interest at status date (IPAC), unsigned.
    pub accrued_interest: Option<f64>,
    /// Premium/discount exchanged at IED (PDIED), unsigned.
    pub premium_discount_at_ied: Option<f64>,
    /// Price paid at the purchase date (PPRD), unsigned.
    pub price_at_purchase_date: Option<f64>,
    /// Price received at the termination date (PTD), unsigned.
    pub price_at_termination_date: Option<f64>,

    // ---- conventions ----
    /// Day count convention (DCC).
    pub day_count_convention: Option<DayCountConvention>,
    /// Business day convention (BDC).
    pub business_day_convention: BusinessDayConvention,
    /// End-of-month convention (EOMC).
    pub end_of_month_convention: EndOfMonthConvention,
    /// Business day calendar (CLDR).
    pub calendar: Calendar,

    // ---- interest schedule ----
    /// Interest payment cycle (IPCL).
    pub interest_payment_cycle: Option<Cycle>,
    /// Interest payment anchor (IPANX).
    pub interest_payment_anchor: Option<ActusDateTime>,
    /// Interest capitalization end date (IPCED); cycle dates before it
    /// capitalize instead of paying.
    pub interest_capitalization_end_date: Option<ActusDateTime>,

    // ---- principal redemption schedule ----
    /// Principal redemption cycle (PRCL).
    pub principal_redemption_cycle: Option<Cycle>,
    /// Principal redemption anchor (PRANX).
    pub principal_redemption_anchor: Option<ActusDateTime>,
    /// Next principal redemption amount (PRNXT), unsigned.
    pub next_principal_redemption_amount: Option<f64>,

    // ---- interest calculation base ----
    /// Interest calculation base selector (IPCB).
    pub interest_calculation_base: Option<InterestCalculationBase>,
    /// Fixed interest calculation base amount (IPCBA), unsigned.
    pub interest_calculation_base_amount: Option<f64>,
    /// IPCB refixing cycle (IPCBCL), NTL mode.
    pub interest_calculation_base_cycle: Option<Cycle>,
    /// IPCB refixing anchor (IPCBANX).
    pub interest_calculation_base_anchor: Option<ActusDateTime>,

    // ---- fees ----
    /// Fee payment cycle (FECL).
    pub fee_payment_cycle: Option<Cycle>,
    /// Fee payment anchor (FEANX).
    pub fee_payment_anchor: Option<ActusDateTime>,
    /// Fee rate (FER).
    pub fee_rate: Option<f64>,
    /// Fee basis (FEB).
    pub fee_basis: Option<FeeBasis>,
    /// Fees accrued at status date (FEAC), unsigned.
    pub fee_accrued: Option<f64>,

    // ---- rate resets ----
    /// Rate reset cycle (RRCL).
    pub rate_reset_cycle: Option<Cycle>,
    /// Rate reset anchor (RRANX).
    pub rate_reset_anchor: Option<ActusDateTime>,
    /// Market object observed at resets (RRMO).
    pub rate_reset_market_object: Option<String>,
    /// Multiplier applied to the observed rate (RRMLT).
    pub rate_reset_multiplier: Option<f64>,
    /// Spread added to the observed rate (RRSP).
    pub rate_reset_spread: Option<f64>,
    /// Life floor on the reset rate (RRLF).
    pub rate_reset_floor: Option<f64>,
    /// Life cap on the reset rate (RRLC).
    pub rate_reset_cap: Option<f64>,
    /// Rate fixed for the next reset (RRNXT); makes the first reset an RRF.
    pub rate_reset_next: Option<f64>,

    // ---- scaling ----
    /// Scaling index cycle (SCCL).
    pub scaling_index_cycle: Option<Cycle>,
    /// Scaling index anchor (SCANX).
    pub scaling_index_anchor: Option<ActusDateTime>,
    /// Scaling effect selector (SCEF).
    pub scaling_effect: ScalingEffect,
    /// Market object observed for scaling (SCMO).
    pub scaling_market_object: Option<String>,
    /// Scaling index baseline at status date (SCIXSD).
    pub scaling_index_at_status_date: Option<f64>,

    // ---- prepayment and penalties ----
    /// Prepayment effect on the schedule (PPEF).
    pub prepayment_effect: PrepaymentEffect,
    /// Penalty type (PYTP).
    pub penalty_type: Option<PenaltyType>,
    /// Penalty rate or amount (PYRT).
    pub penalty_rate: Option<f64>,

    // ---- derivative terms ----
    /// Option payoff type (OPTP).
    pub option_type: Option<OptionType>,
    /// Primary strike (OPS1).
    pub option_strike_1: Option<f64>,
    /// Secondary strike for collars (OPS2).
    pub option_strike_2: Option<f64>,
    /// Exercise style (OPXT).
    pub option_exercise_type: Option<OptionExerciseType>,
    /// Last exercise date (OPXED).
    pub option_exercise_end_date: Option<ActusDateTime>,
    /// Recorded exercise date (XD).
    pub exercise_date: Option<ActusDateTime>,
    /// Recorded exercise amount (XA), unsigned.
    pub exercise_amount: Option<f64>,
    /// Period between exercise and settlement (STPD).
    pub settlement_period: Option<Cycle>,
    /// Delivery/settlement mode (DS).
    pub delivery_settlement: Option<DeliverySettlement>,
    /// Agreed futures price (PFUT).
    pub future_price: Option<f64>,

    // ---- equity and commodity ----
    /// Quantity of the underlying asset (QT).
    pub quantity: Option<f64>,
    /// Unit of the quantity (UT).
    pub unit: Option<String>,
    /// Market object for price observation (MOC).
    pub market_object_code: Option<String>,
    /// Market object for dividend observation (DVMO).
    pub market_object_code_of_dividends: Option<String>,
    /// Dividend payment cycle (DVCL).
    pub dividend_cycle: Option<Cycle>,
    /// Dividend payment anchor (DVANX).
    pub dividend_anchor: Option<ActusDateTime>,

    // ---- credit enhancement ----
    /// Coverage ratio of the enhancement (CECV).
    pub coverage: Option<f64>,
    /// Performance level that counts as a credit event (CET).
    pub credit_event_type: Option<ContractPerformance>,
    /// Guarantee extent (CEGE).
    pub guarantee_extent: Option<GuaranteeExtent>,
    /// Child-contract linkage (CTST).
    pub contract_structure: Option<ContractStructure>,

    // ---- status ----
    /// Performance status at the status date (PRF).
    pub contract_performance: ContractPerformance,

    // ---- array schedules (LAX) ----
    /// Principal redemption anchors (ARPRANX).
    pub array_pr_anchor: Vec<ActusDateTime>,
    /// Principal redemption cycles per segment (ARPRCL).
    pub array_pr_cycle: Vec<Cycle>,
    /// Redemption amounts per segment (ARPRNXT), unsigned.
    pub array_pr_next: Vec<f64>,
    /// Increase/decrease indicators per segment (ARINCDEC).
    pub array_increase_decrease: Vec<IncreaseDecrease>,
    /// Interest payment anchors (ARIPANX).
    pub array_ip_anchor: Vec<ActusDateTime>,
    /// Interest payment cycles per segment (ARIPCL).
    pub array_ip_cycle: Vec<Cycle>,
    /// Rate reset anchors (ARRRANX).
    pub array_rr_anchor: Vec<ActusDateTime>,
    /// Rate reset cycles per segment (ARRRCL).
    pub array_rr_cycle: Vec<Cycle>,
    /// Rates or spreads per segment (ARRATE).
    pub array_rate: Vec<f64>,
    /// Fixed/variable indicators per segment (ARFIXVAR).
    pub array_fixed_variable: Vec<FixedVariable>,
}

impl ContractAttributes {
    /// Creates a record with the five mandatory fields; everything else
    /// starts empty.
    pub fn new(
        contract_id: impl Into<String>,
        contract_type: ContractType,
        contract_role: ContractRole,
        status_date: ActusDateTime,
        currency: impl Into<String>,
    ) -> Self {
        ContractAttributes {
            contract_id: contract_id.into(),
            contract_type,
            contract_role,
            status_date,
            currency: currency.into(),
            contract_deal_date: None,
            initial_exchange_date: None,
            maturity_date: None,
            amortization_date: None,
            purchase_date: None,
            termination_date: None,
            analysis_dates: Vec::new(),
            horizon_date: None,
            notional_principal: None,
            notional_principal_2: None,
            nominal_interest_rate: None,
            nominal_interest_rate_2: None,
            currency_2: None,
            settlement_currency: None,
            accrued_interest: None,
            premium_discount_at_ied: None,
            price_at_purchase_date: None,
            price_at_termination_date: None,
            day_count_convention: None,
            business_day_convention: BusinessDayConvention::Null,
            end_of_month_convention: EndOfMonthConvention::SameDay,
            calendar: Calendar::NoCalendar,
            interest_payment_cycle: None,
            interest_payment_anchor: None,
            interest_capitalization_end_date: None,
            principal_redemption_cycle: None,
            principal_redemption_anchor: None,
            next_principal_redemption_amount: None,
            interest_calculation_base: None,
            interest_calculation_base_amount: None,
            interest_calculation_base_cycle: None,
            interest_calculation_base_anchor: None,
            fee_payment_cycle: None,
            fee_payment_anchor: None,
            fee_rate: None,
            fee_basis: None,
            fee_accrued: None,
            rate_reset_cycle: None,
            rate_reset_anchor: None,
            rate_reset_market_object: None,
            rate_reset_multiplier: None,
            rate_reset_spread: None,
            rate_reset_floor: None,
            rate_reset_cap: None,
            rate_reset_next: None,
            scaling_index_cycle: None,
            scaling_index_anchor: None,
            scaling_effect: ScalingEffect::NoScaling,
            scaling_market_object: None,
            scaling_index_at_status_date: None,
            prepayment_effect: PrepaymentEffect::NoEffect,
            penalty_type: None,
            penalty_rate: None,
            option_type: None,
            option_strike_1: None,
            option_strike_2: None,
            option_exercise_type: None,
            option_exercise_end_date: None,
            exercise_date: None,
            exercise_amount: None,
            settlement_period: None,
            delivery_settlement: None,
            future_price: None,
            quantity: None,
            unit: None,
            market_object_code: None,
            market_object_code_of_dividends: None,
            dividend_cycle: None,
            dividend_anchor: None,
            coverage: None,
            credit_event_type: None,
            guarantee_extent: None,
            contract_structure: None,
            contract_performance: ContractPerformance::Pf,
            array_pr_anchor: Vec::new(),
            array_pr_cycle: Vec::new(),
            array_pr_next: Vec::new(),
            array_increase_decrease: Vec::new(),
            array_ip_anchor: Vec::new(),
            array_ip_cycle: Vec::new(),
            array_rr_anchor: Vec::new(),
            array_rr_cycle: Vec::new(),
            array_rate: Vec::new(),
            array_fixed_variable: Vec::new(),
        }
    }

    /// Sign convention `R(role)` of this contract.
    pub fn role_sign(&self) -> f64 {
        self.contract_role.sign()
    }

    /// Day count context with the contract's convention (A/360 when unset),
    /// maturity and calendar.
    pub fn day_count(&self) -> DayCount {
        DayCount {
            convention: self
                .day_count_convention
                .unwrap_or(DayCountConvention::Actual360),
            maturity: self.maturity_date,
            calendar: self.calendar,
        }
    }

    /// Builds an `InvalidAttributes` error for this contract.
    pub fn invalid(&self, reason: impl Into<String>) -> EngineError {
        EngineError::InvalidAttributes {
            contract_id: self.contract_id.clone(),
            reason: reason.into(),
        }
    }

    /// Validates the rules common to every contract type.
    ///
    /// Type-specific requirements (e.g. PAM needing a maturity date) are
    /// checked by the factory.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.contract_id.is_empty() {
            return Err(self.invalid("contract_id must not be empty"));
        }
        if self.currency.is_empty() {
            return Err(self.invalid("currency must not be empty"));
        }
        if let Some(nt) = self.notional_principal {
            if nt == 0.0 {
                return Err(self.invalid("notional_principal must be non-zero"));
            }
        }
        if let Some(rate) = self.nominal_interest_rate {
            if rate <= -1.0 {
                return Err(self.invalid("nominal_interest_rate must be greater than -1"));
            }
        }
        if let (Some(ied), Some(md)) = (self.initial_exchange_date, self.maturity_date) {
            if md <= ied {
                return Err(self.invalid("maturity_date must be after initial_exchange_date"));
            }
        }
        if let (Some(ied), Some(td)) = (self.initial_exchange_date, self.termination_date) {
            if td <= ied {
                return Err(self.invalid("termination_date must be after initial_exchange_date"));
            }
        }
        if let Some(coverage) = self.coverage {
            if coverage < 0.0 {
                return Err(self.invalid("coverage must be non-negative"));
            }
        }
        self.validate_array_lengths()?;
        Ok(())
    }

    fn validate_array_lengths(&self) -> Result<(), EngineError> {
        let pr_lengths = [
            self.array_pr_anchor.len(),
            self.array_pr_cycle.len(),
            self.array_pr_next.len(),
            self.array_increase_decrease.len(),
        ];
        if !all_equal_or_empty(&pr_lengths) {
            return Err(self.invalid("principal redemption arrays must have equal length"));
        }
        let ip_lengths = [self.array_ip_anchor.len(), self.array_ip_cycle.len()];
        if !all_equal_or_empty(&ip_lengths) {
            return Err(self.invalid("interest payment arrays must have equal length"));
        }
        let rr_lengths = [
            self.array_rr_anchor.len(),
            self.array_rr_cycle.len(),
            self.array_rate.len(),
            self.array_fixed_variable.len(),
        ];
        if !all_equal_or_empty(&rr_lengths) {
            return Err(self.invalid("rate reset arrays must have equal length"));
        }
        Ok(())
    }
}

fn all_equal_or_empty(lengths: &[usize]) -> bool {
    let non_empty: Vec<usize> = lengths.iter().copied().filter(|&l| l > 0).collect();
    non_empty.windows(2).all(|w| w[0] == w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> ActusDateTime {
        ActusDateTime::from_ymd(y, m, day).unwrap()
    }

    fn base_attrs() -> ContractAttributes {
        ContractAttributes::new(
            "PAM-001",
            ContractType::Pam,
            ContractRole::Rpa,
            d(2024, 1, 1),
            "USD",
        )
    }

    #[test]
    fn test_validate_ok() {
        let mut attrs = base_attrs();
        attrs.initial_exchange_date = Some(d(2024, 1, 15));
        attrs.maturity_date = Some(d(2025, 1, 15));
        attrs.notional_principal = Some(100_000.0);
        assert!(attrs.validate().is_ok());
    }

    #[test]
    fn test_validate_maturity_before_ied() {
        let mut attrs = base_attrs();
        attrs.initial_exchange_date = Some(d(2025, 1, 15));
        attrs.maturity_date = Some(d(2024, 1, 15));
        assert!(attrs.validate().is_err());
    }

    #[test]
    fn test_ied_before_status_date_is_legal() {
        // Pre-existing contract: the IED event is skipped but the terms are
        // valid.
        let mut attrs = base_attrs();
        attrs.initial_exchange_date = Some(d(2020, 1, 15));
        attrs.maturity_date = Some(d(2030, 1, 15));
        assert!(attrs.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_notional() {
        let mut attrs = base_attrs();
        attrs.notional_principal = Some(0.0);
        assert!(attrs.validate().is_err());
    }

    #[test]
    fn test_validate_array_lengths() {
        let mut attrs = base_attrs();
        attrs.array_pr_anchor = vec![d(2024, 2, 1), d(2025, 2, 1)];
        attrs.array_pr_next = vec![1_000.0];
        assert!(attrs.validate().is_err());
        attrs.array_pr_next = vec![1_000.0, 2_000.0];
        assert!(attrs.validate().is_ok());
    }

    #[test]
    fn test_role_sign_and_day_count() {
        let attrs = base_attrs();
        assert_eq!(attrs.role_sign(), 1.0);
        assert_eq!(
            attrs.day_count().convention,
            DayCountConvention::Actual360 // default
        );
    }

    #[test]
    fn test_structure_parse_swap_legs() {
        let s = ContractStructure::parse(r#"{"FirstLeg":"EUR-LEG","SecondLeg":"USD-LEG"}"#)
            .unwrap();
        assert_eq!(
            s,
            ContractStructure::SwapLegs {
                first_leg: "EUR-LEG".to_string(),
                second_leg: "USD-LEG".to_string(),
            }
        );
        assert_eq!(s.referenced_ids(), vec!["EUR-LEG", "USD-LEG"]);
    }

    #[test]
    fn test_structure_parse_underlier() {
        let s = ContractStructure::parse(r#"{"Underlying":"SWAP-001"}"#).unwrap();
        assert_eq!(s.referenced_ids(), vec!["SWAP-001"]);
    }

    #[test]
    fn test_structure_parse_coverage() {
        let s = ContractStructure::parse(
            r#"{"CoveredContracts":["LOAN-1","LOAN-2"],"CoveringContract":"COLL-1"}"#,
        )
        .unwrap();
        assert_eq!(s.referenced_ids(), vec!["LOAN-1", "LOAN-2", "COLL-1"]);

        let s = ContractStructure::parse(r#"{"CoveredContract":"LOAN-1"}"#).unwrap();
        assert_eq!(s.referenced_ids(), vec!["LOAN-1"]);
    }

    #[test]
    fn test_structure_parse_errors() {
        assert!(ContractStructure::parse("not json").is_err());
        assert!(ContractStructure::parse(r#"{"Unknown":"X"}"#).is_err());
        assert!(ContractStructure::parse(r#"[1,2,3]"#).is_err());
    }
}
