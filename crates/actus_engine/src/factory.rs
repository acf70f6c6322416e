//! Contract factory.
//!
//! `create_contract` validates the attributes, resolves the contract type to
//! its variant record and packages the observers. Validation failures abort
//! here, before any event exists.

use std::sync::Arc;

use actus_core::attributes::ContractAttributes;
use actus_core::event::{sort_events, ContractEvent};
use actus_core::observers::behavior::BehaviorObserver;
use actus_core::observers::child::ChildContractObserver;
use actus_core::observers::market::MarketObserver;
use actus_core::state::ContractState;
use actus_core::types::error::EngineError;
use tracing::info;

use crate::contracts::{variant_for, SimContext, VariantLogic};
use crate::lifecycle::{self, SimulationResult};

/// A contract ready for simulation: validated attributes plus observers.
pub struct Contract {
    attributes: ContractAttributes,
    market: Arc<dyn MarketObserver>,
    behavior: Option<Arc<dyn BehaviorObserver>>,
    children: Option<ChildContractObserver>,
    variant: &'static dyn VariantLogic,
}

impl std::fmt::Debug for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contract")
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

/// Creates a contract of the type named by the attributes.
///
/// Child observers are frozen on entry; composite parents therefore always
/// observe a fixed set of child results.
///
/// # Errors
///
/// `InvalidAttributes` when a required field is missing or a combination is
/// inconsistent. No events are emitted on failure.
pub fn create_contract(
    attributes: ContractAttributes,
    market: Arc<dyn MarketObserver>,
    children: Option<ChildContractObserver>,
) -> Result<Contract, EngineError> {
    attributes.validate()?;
    let variant = variant_for(attributes.contract_type);
    variant.validate(&attributes)?;

    let mut children = children;
    if let Some(children) = &mut children {
        children.freeze();
    }
    info!(
        contract_id = %attributes.contract_id,
        contract_type = %attributes.contract_type,
        "contract created"
    );
    Ok(Contract {
        attributes,
        market,
        behavior: None,
        children,
        variant,
    })
}

impl Contract {
    /// Attaches a behavioral observer (callout events and observed amounts).
    pub fn with_behavior(mut self, behavior: Arc<dyn BehaviorObserver>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// The contract's terms.
    pub fn attributes(&self) -> &ContractAttributes {
        &self.attributes
    }

    fn ctx(&self) -> SimContext<'_> {
        SimContext {
            attrs: &self.attributes,
            market: self.market.as_ref(),
            behavior: self.behavior.as_deref(),
            children: self.children.as_ref(),
        }
    }

    /// The pre-simulation event schedule: ordered events with zero payoffs
    /// and no state snapshots.
    ///
    /// # Errors
    ///
    /// `InvalidSchedule` when the schedule expands empty.
    pub fn schedule(&self) -> Result<Vec<ContractEvent>, EngineError> {
        let ctx = self.ctx();
        let mut events = self.variant.schedule(&ctx)?;
        if let Some(td) = self.attributes.termination_date {
            events.retain(|e| e.event_time <= td);
        }
        sort_events(&mut events);
        if events.is_empty() {
            return Err(EngineError::InvalidSchedule {
                contract_id: self.attributes.contract_id.clone(),
                reason: "schedule expanded to no events".to_string(),
            });
        }
        Ok(events)
    }

    /// The contract state as of the status date.
    pub fn initial_state(&self) -> Result<ContractState, EngineError> {
        self.variant.initial_state(&self.ctx())
    }

    /// Simulates the contract to completion.
    pub fn simulate(&self) -> Result<SimulationResult, EngineError> {
        let schedule = self.schedule()?;
        let initial_state = self.initial_state()?;
        lifecycle::run(self.variant, &self.ctx(), schedule, initial_state)
    }
}
