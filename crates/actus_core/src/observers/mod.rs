//! Observers: market data, behavioral callouts and child-contract results.

pub mod behavior;
pub mod child;
pub mod market;

pub use behavior::{BehaviorObserver, BehavioralOverlay, CalloutEvent};
pub use child::ChildContractObserver;
pub use market::{
    CompositeObserver, ConstantObserver, CurveObserver, DictObserver, MarketObserver,
    TimeSeriesObserver,
};
