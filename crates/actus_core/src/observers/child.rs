//! Child-contract observer.
//!
//! Composite contracts (SWAPS, CAPFL, CEG, CEC) observe the results of
//! previously simulated children through this registry. The registry is
//! frozen before the parent runs; registration after freezing is an error.

use std::collections::HashMap;

use crate::attributes::ContractAttributes;
use crate::event::ContractEvent;
use crate::state::ContractState;
use crate::types::error::ObserverError;
use crate::types::time::ActusDateTime;

struct ChildRecord {
    attributes: ContractAttributes,
    events: Vec<ContractEvent>,
}

/// Registry of simulated child contracts.
#[derive(Default)]
pub struct ChildContractObserver {
    children: HashMap<String, ChildRecord>,
    frozen: bool,
}

impl ChildContractObserver {
    /// Creates an empty, unfrozen registry.
    pub fn new() -> Self {
        ChildContractObserver::default()
    }

    /// Registers a simulated child: its attributes and materialized events.
    ///
    /// # Errors
    ///
    /// `Frozen` after [`freeze`](ChildContractObserver::freeze) was called.
    pub fn register(
        &mut self,
        attributes: ContractAttributes,
        events: Vec<ContractEvent>,
    ) -> Result<(), ObserverError> {
        if self.frozen {
            return Err(ObserverError::Frozen(attributes.contract_id.clone()));
        }
        let id = attributes.contract_id.clone();
        self.children.insert(id, ChildRecord { attributes, events });
        Ok(())
    }

    /// Freezes the registry; all further registrations fail.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// True once [`freeze`](ChildContractObserver::freeze) has been called.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Registered child ids.
    pub fn ids(&self) -> Vec<&str> {
        self.children.keys().map(String::as_str).collect()
    }

    /// True when `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.children.contains_key(id)
    }

    /// The materialized events of child `id`.
    pub fn events(&self, id: &str) -> Result<&[ContractEvent], ObserverError> {
        self.children
            .get(id)
            .map(|r| r.events.as_slice())
            .ok_or_else(|| ObserverError::UnknownChild(id.to_string()))
    }

    /// The attributes of child `id`.
    pub fn attributes(&self, id: &str) -> Result<&ContractAttributes, ObserverError> {
        self.children
            .get(id)
            .map(|r| &r.attributes)
            .ok_or_else(|| ObserverError::UnknownChild(id.to_string()))
    }

    /// The state of child `id` as of `at`: the post-state of the last event
    /// at or before that time, or `None` before the first event.
    pub fn state_at(
        &self,
        id: &str,
        at: ActusDateTime,
    ) -> Result<Option<ContractState>, ObserverError> {
        let events = self.events(id)?;
        Ok(events
            .iter()
            .rev()
            .find(|e| e.event_time <= at)
            .and_then(|e| e.state_post))
    }
}
