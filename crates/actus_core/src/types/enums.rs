//! ACTUS enumerations.
//!
//! Every enumeration carries its ACTUS dictionary code and parses from it
//! (with the common aliases accepted by the official test files). Display
//! always emits the canonical code, so parse/format round-trips.
//!
//! # Examples
//!
//! ```
//! use actus_core::types::enums::{ContractRole, ContractType, EventType};
//!
//! let role: ContractRole = "RPA".parse().unwrap();
//! assert_eq!(role.sign(), 1.0);
//! assert_eq!(ContractType::Pam.code(), "PAM");
//! assert!(EventType::Ied.priority() < EventType::Md.priority());
//! ```

/// Defines an enumeration with ACTUS codes, `Display`, `FromStr` and
/// (feature-gated) string-coded serde implementations.
macro_rules! actus_codes {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($kind:literal) {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $code:literal $(| $alias:literal)*
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// ACTUS dictionary code for this variant.
            pub fn code(&self) -> &'static str {
                match self { $( Self::$variant => $code, )+ }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.code())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::types::error::UnknownCode;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $code $(| $alias)* => Ok(Self::$variant), )+
                    _ => Err($crate::types::error::UnknownCode {
                        kind: $kind,
                        code: s.to_string(),
                    }),
                }
            }
        }

        #[cfg(feature = "serde")]
        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                serializer.serialize_str(self.code())
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let s = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                s.parse().map_err(::serde::de::Error::custom)
            }
        }
    };
}

actus_codes! {
    /// Contract event kinds.
    pub enum EventType ("event type") {
        /// Analysis (monitoring) date.
        Ad => "AD",
        /// Initial exchange.
        Ied => "IED",
        /// Principal redemption.
        Pr => "PR",
        /// Principal increase.
        Pi => "PI",
        /// Principal prepayment.
        Pp => "PP",
        /// Penalty payment.
        Py => "PY",
        /// Principal redemption amount fixing.
        Prf => "PRF",
        /// Fee payment.
        Fp => "FP",
        /// Purchase.
        Prd => "PRD",
        /// Termination.
        Td => "TD",
        /// Interest payment.
        Ip => "IP",
        /// Interest payment, fixed leg of a swap.
        Ipfx => "IPFX",
        /// Interest payment, floating leg of a swap.
        Ipfl => "IPFL",
        /// Interest capitalization.
        Ipci => "IPCI",
        /// Interest calculation base fixing.
        Ipcb => "IPCB",
        /// Rate reset with observation.
        Rr => "RR",
        /// Rate reset with a scheduled fixing.
        Rrf => "RRF",
        /// Dividend payment.
        Dv => "DV",
        /// Dividend fixing.
        Dvf => "DVF",
        /// Scaling index fixing.
        Sc => "SC",
        /// Settlement.
        Std => "STD",
        /// Exercise.
        Xd => "XD",
        /// Credit event.
        Ce => "CE",
        /// Maturity.
        Md => "MD",
    }
}

impl EventType {
    /// Priority rank for same-timestamp ordering; lower runs first.
    ///
    /// AD < IED < PR < IP < IPCI < RR < IPCB < SC < FP < PRD < TD < MD <
    /// STD < XD < DV. Kinds outside that core table take a rank adjacent to
    /// their family; ties are broken by the event sequence number.
    pub fn priority(&self) -> u8 {
        match self {
            EventType::Ad => 1,
            EventType::Ied => 2,
            EventType::Pr | EventType::Pi | EventType::Pp | EventType::Py => 3,
            EventType::Ip | EventType::Ipfx | EventType::Ipfl => 4,
            EventType::Ipci => 5,
            EventType::Rr | EventType::Rrf => 6,
            EventType::Ipcb => 7,
            EventType::Sc | EventType::Prf => 8,
            EventType::Fp => 9,
            EventType::Prd => 10,
            EventType::Td => 11,
            EventType::Md => 12,
            EventType::Std => 13,
            EventType::Xd => 14,
            EventType::Dv | EventType::Dvf => 15,
            EventType::Ce => 16,
        }
    }
}

actus_codes! {
    /// The 18 ACTUS contract variants implemented by the engine.
    pub enum ContractType ("contract type") {
        /// Principal at maturity.
        Pam => "PAM",
        /// Linear amortizer.
        Lam => "LAM",
        /// Exotic linear amortizer (array schedules).
        Lax => "LAX",
        /// Negative amortizer.
        Nam => "NAM",
        /// Annuity.
        Ann => "ANN",
        /// Call money.
        Clm => "CLM",
        /// Undefined maturity profile.
        Ump => "UMP",
        /// Cash position.
        Csh => "CSH",
        /// Stock position.
        Stk => "STK",
        /// Commodity position.
        Com => "COM",
        /// Foreign exchange outright.
        Fxout => "FXOUT",
        /// Plain vanilla interest rate swap.
        Swppv => "SWPPV",
        /// Generic swap over two legs.
        Swaps => "SWAPS",
        /// Cap / floor.
        Capfl => "CAPFL",
        /// Option.
        Optns => "OPTNS",
        /// Future.
        Futur => "FUTUR",
        /// Credit enhancement guarantee.
        Ceg => "CEG",
        /// Credit enhancement collateral.
        Cec => "CEC",
    }
}

impl ContractType {
    /// True for variants whose simulation requires previously simulated
    /// children (SWAPS, CAPFL with an underlier, CEG, CEC).
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            ContractType::Swaps | ContractType::Capfl | ContractType::Ceg | ContractType::Cec
        )
    }
}

actus_codes! {
    /// Contract role of the record creator; determines cash-flow signs.
    pub enum ContractRole ("contract role") {
        /// Real position asset.
        Rpa => "RPA",
        /// Real position liability.
        Rpl => "RPL",
        /// Long position.
        Lg => "LG",
        /// Short position.
        St => "ST",
        /// Protection buyer.
        Buy => "BUY",
        /// Protection seller.
        Sel => "SEL",
        /// Receive first leg.
        Rfl => "RFL",
        /// Pay first leg.
        Pfl => "PFL",
        /// Collateral instrument.
        Col => "COL",
        /// Close-out netting instrument.
        Cno => "CNO",
        /// Guarantor.
        Gua => "GUA",
        /// Obligee.
        Obl => "OBL",
        /// Underlying.
        Udl => "UDL",
        /// Underlying, positive exposure.
        Udlp => "UDLP",
        /// Underlying, negative exposure.
        Udlm => "UDLM",
    }
}

impl ContractRole {
    /// Sign convention `R(role)`: +1 for asset-side roles, -1 for
    /// liability-side roles, per ACTUS Table 1.
    pub fn sign(&self) -> f64 {
        match self {
            ContractRole::Rpa
            | ContractRole::Lg
            | ContractRole::Buy
            | ContractRole::Rfl
            | ContractRole::Col
            | ContractRole::Cno
            | ContractRole::Obl
            | ContractRole::Udl
            | ContractRole::Udlp => 1.0,
            ContractRole::Rpl
            | ContractRole::St
            | ContractRole::Sel
            | ContractRole::Pfl
            | ContractRole::Gua
            | ContractRole::Udlm => -1.0,
        }
    }
}

actus_codes! {
    /// Payment performance status of a contract.
    pub enum ContractPerformance ("contract performance") {
        /// Performant.
        Pf => "PF",
        /// Delayed.
        Dl => "DL",
        /// Delinquent.
        Dq => "DQ",
        /// Default.
        Df => "DF",
    }
}

impl ContractPerformance {
    /// Ordinal severity: PF(0) < DL(1) < DQ(2) < DF(3).
    pub fn severity(&self) -> u8 {
        match self {
            ContractPerformance::Pf => 0,
            ContractPerformance::Dl => 1,
            ContractPerformance::Dq => 2,
            ContractPerformance::Df => 3,
        }
    }

    /// True for any non-performant status.
    pub fn is_credit_event(&self) -> bool {
        *self != ContractPerformance::Pf
    }
}

actus_codes! {
    /// Day count conventions for year-fraction calculation.
    pub enum DayCountConvention ("day count convention") {
        /// Actual/actual ISDA.
        ActualActual => "AA" | "A/A" | "ACT/ACT" | "ACTACT",
        /// Actual/360.
        Actual360 => "A360" | "A/360" | "ACT/360",
        /// Actual/365 fixed.
        Actual365 => "A365" | "A/365" | "ACT/365",
        /// 30E/360 Eurobond basis.
        ThirtyE360 => "30E360" | "30E/360",
        /// 30E/360 ISDA (end-of-February adjusted).
        ThirtyE360Isda => "30E360ISDA" | "30E/360ISDA",
        /// 30/360 US bond basis.
        Thirty360Us => "30360" | "30/360",
        /// Business days / 252 over a named calendar.
        Business252 => "BUS252" | "B/252" | "BUS/252",
    }
}

actus_codes! {
    /// Business day adjustment conventions.
    ///
    /// `SC*` (shift/calculate) conventions shift both the event date and the
    /// calculation date; `CS*` (calculate/shift) conventions shift only the
    /// event date and keep the original date for year-fraction calculations.
    pub enum BusinessDayConvention ("business day convention") {
        /// No adjustment.
        Null => "NULL" | "NOS",
        /// Shift/calculate, following.
        Scf => "SCF",
        /// Shift/calculate, modified following.
        Scmf => "SCMF",
        /// Calculate/shift, following.
        Csf => "CSF",
        /// Calculate/shift, modified following.
        Csmf => "CSMF",
        /// Shift/calculate, preceding.
        Scp => "SCP",
        /// Shift/calculate, modified preceding.
        Scmp => "SCMP",
        /// Calculate/shift, preceding.
        Csp => "CSP",
        /// Calculate/shift, modified preceding.
        Csmp => "CSMP",
    }
}

impl BusinessDayConvention {
    /// True for the calculate/shift family, where the unshifted date is kept
    /// as the calculation time.
    pub fn keeps_calculation_date(&self) -> bool {
        matches!(
            self,
            BusinessDayConvention::Csf
                | BusinessDayConvention::Csmf
                | BusinessDayConvention::Csp
                | BusinessDayConvention::Csmp
        )
    }

    /// True when dates are shifted forward to the next business day.
    pub fn is_following(&self) -> bool {
        matches!(
            self,
            BusinessDayConvention::Scf
                | BusinessDayConvention::Scmf
                | BusinessDayConvention::Csf
                | BusinessDayConvention::Csmf
        )
    }

    /// True for the modified conventions, which must not cross a month
    /// boundary.
    pub fn is_modified(&self) -> bool {
        matches!(
            self,
            BusinessDayConvention::Scmf
                | BusinessDayConvention::Csmf
                | BusinessDayConvention::Scmp
                | BusinessDayConvention::Csmp
        )
    }
}

actus_codes! {
    /// End-of-month convention for month-based schedules.
    pub enum EndOfMonthConvention ("end of month convention") {
        /// Keep schedule dates at month end when the anchor is at month end.
        EndOfMonth => "EOM",
        /// Keep the anchor's day number (default).
        SameDay => "SD",
    }
}

actus_codes! {
    /// Business day calendars.
    pub enum Calendar ("calendar") {
        /// Every day is a business day.
        NoCalendar => "NC" | "NOCALENDAR" | "NO_CALENDAR",
        /// Saturdays and Sundays are holidays.
        MondayToFriday => "MF" | "MONDAYTOFRIDAY" | "MONDAY_TO_FRIDAY",
    }
}

actus_codes! {
    /// Fee calculation basis.
    pub enum FeeBasis ("fee basis") {
        /// Absolute amount.
        Absolute => "A",
        /// Rate applied to the notional.
        Notional => "N",
    }
}

actus_codes! {
    /// Penalty calculation type for prepayments.
    pub enum PenaltyType ("penalty type") {
        /// No penalty.
        NoPenalty => "O",
        /// Absolute amount.
        Absolute => "A",
        /// Rate applied to the notional over the elapsed period.
        RelativeToNotional => "N",
        /// Interest rate differential against a market observation.
        RateDifferential => "I",
    }
}

actus_codes! {
    /// Scaling effect selector: which contract cells follow the scaling
    /// index. Position 1 = interest, position 2 = notional, position 3 =
    /// maturity.
    pub enum ScalingEffect ("scaling effect") {
        /// No scaling.
        NoScaling => "000" | "OOO",
        /// Interest scaling only.
        InterestOnly => "I00" | "IOO",
        /// Notional scaling only.
        NotionalOnly => "0N0" | "ONO",
        /// Interest and notional scaling.
        InterestAndNotional => "IN0" | "INO",
        /// Maturity scaling only.
        MaturityOnly => "00M" | "OOM",
        /// Interest and maturity scaling.
        InterestAndMaturity => "I0M" | "IOM",
        /// Notional and maturity scaling.
        NotionalAndMaturity => "0NM" | "ONM",
        /// Interest, notional and maturity scaling.
        Full => "INM",
    }
}

impl ScalingEffect {
    /// True when the interest scaling multiplier follows the index.
    pub fn scales_interest(&self) -> bool {
        matches!(
            self,
            ScalingEffect::InterestOnly
                | ScalingEffect::InterestAndNotional
                | ScalingEffect::InterestAndMaturity
                | ScalingEffect::Full
        )
    }

    /// True when the notional scaling multiplier follows the index.
    pub fn scales_notional(&self) -> bool {
        matches!(
            self,
            ScalingEffect::NotionalOnly
                | ScalingEffect::InterestAndNotional
                | ScalingEffect::NotionalAndMaturity
                | ScalingEffect::Full
        )
    }
}

actus_codes! {
    /// Base for interest calculation in amortizing contracts.
    pub enum InterestCalculationBase ("interest calculation base") {
        /// Current notional.
        Nt => "NT",
        /// Notional fixed at initial exchange.
        NtIed => "NTIED",
        /// Notional lagged to the last IPCB fixing.
        NtLagged => "NTL",
    }
}

actus_codes! {
    /// Option payoff type.
    pub enum OptionType ("option type") {
        /// Call.
        Call => "C",
        /// Put.
        Put => "P",
        /// Collar (call and put legs).
        CallPut => "CP",
    }
}

actus_codes! {
    /// Option exercise style.
    pub enum OptionExerciseType ("option exercise type") {
        /// European: exercisable at expiry only.
        European => "E",
        /// Bermudan: exercisable at the exercise end date.
        Bermudan => "B",
        /// American: exercisable throughout the life.
        American => "A",
    }
}

actus_codes! {
    /// Delivery / settlement mode for derivatives and swaps.
    pub enum DeliverySettlement ("delivery settlement") {
        /// Delivery.
        Delivery => "D",
        /// Cash settlement.
        Settlement => "S",
    }
}

actus_codes! {
    /// Extent of a credit enhancement guarantee.
    pub enum GuaranteeExtent ("guarantee extent") {
        /// Nominal value only.
        NominalOnly => "NO",
        /// Nominal value plus accrued interest.
        NominalWithInterest => "NI",
        /// Nominal, accrued interest and market value.
        MarketValue => "MV",
    }
}

actus_codes! {
    /// Effect of a prepayment on the remaining schedule.
    pub enum PrepaymentEffect ("prepayment effect") {
        /// No effect on the schedule.
        NoEffect => "N",
        /// Prepayment shortens the contract (maturity adjusts).
        AdjustMaturity => "A",
        /// Prepayment lowers the next redemption amount.
        AdjustRedemption => "M",
    }
}

actus_codes! {
    /// Direction indicator for array principal schedules (LAX).
    pub enum IncreaseDecrease ("increase/decrease indicator") {
        /// Principal increase.
        Increase => "INC",
        /// Principal decrease.
        Decrease => "DEC",
    }
}

actus_codes! {
    /// Fixed/variable indicator for array rate schedules (LAX).
    pub enum FixedVariable ("fixed/variable indicator") {
        /// Fixed rate taken from the array.
        Fixed => "F",
        /// Variable rate observed from the market, array value as spread.
        Variable => "V",
    }
}
