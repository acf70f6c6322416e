//! Core type definitions: dates, cycles, enumerations and errors.

pub mod cycle;
pub mod enums;
pub mod error;
pub mod time;

pub use cycle::{Cycle, CycleUnit, StubConvention};
pub use enums::{
    BusinessDayConvention, Calendar, ContractPerformance, ContractRole, ContractType,
    DayCountConvention, DeliverySettlement, EndOfMonthConvention, EventType, FeeBasis,
    FixedVariable, GuaranteeExtent, IncreaseDecrease, InterestCalculationBase, OptionExerciseType,
    OptionType, PenaltyType, PrepaymentEffect, ScalingEffect,
};
pub use error::{CycleError, DateError, EngineError, ObserverError, StructureError, UnknownCode};
pub use time::ActusDateTime;
