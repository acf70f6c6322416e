//! Composite resolution and portfolio simulation.
//!
//! Composite contracts (SWAPS, CAPFL, CEG, CEC) depend on the results of
//! their children. The resolver walks `contract_structure` references in
//! topological order, simulates children first and installs their results in
//! a frozen child observer before the parent runs. Reference cycles and
//! dangling ids fail fast.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use actus_core::attributes::ContractAttributes;
use actus_core::observers::behavior::BehaviorObserver;
use actus_core::observers::child::ChildContractObserver;
use actus_core::observers::market::MarketObserver;
use actus_core::types::error::EngineError;
use rayon::prelude::*;
use tracing::info;

use crate::factory::{create_contract, Contract};
use crate::lifecycle::SimulationResult;

/// The scenario a portfolio is simulated under: shared market data plus
/// per-contract behavioral observers.
#[derive(Clone)]
pub struct Scenario {
    /// Market observer shared by all contracts.
    pub market: Arc<dyn MarketObserver>,
    /// Behavioral observers keyed by contract id.
    pub behaviors: HashMap<String, Arc<dyn BehaviorObserver>>,
}

impl Scenario {
    /// A scenario with the given market data and no behavioral observers.
    pub fn new(market: Arc<dyn MarketObserver>) -> Self {
        Scenario {
            market,
            behaviors: HashMap::new(),
        }
    }

    /// Attaches a behavioral observer for one contract.
    pub fn with_behavior(
        mut self,
        contract_id: impl Into<String>,
        behavior: Arc<dyn BehaviorObserver>,
    ) -> Self {
        self.behaviors.insert(contract_id.into(), behavior);
        self
    }

    fn build(&self, attrs: &ContractAttributes, children: Option<ChildContractObserver>)
        -> Result<Contract, EngineError>
    {
        let mut contract = create_contract(attrs.clone(), Arc::clone(&self.market), children)?;
        if let Some(behavior) = self.behaviors.get(&attrs.contract_id) {
            contract = contract.with_behavior(Arc::clone(behavior));
        }
        Ok(contract)
    }
}

/// A set of contract terms addressable by id, with composite references
/// between them.
#[derive(Default)]
pub struct Portfolio {
    contracts: HashMap<String, ContractAttributes>,
}

impl Portfolio {
    /// An empty portfolio.
    pub fn new() -> Self {
        Portfolio::default()
    }

    /// Adds a contract's terms.
    pub fn add(&mut self, attributes: ContractAttributes) {
        self.contracts
            .insert(attributes.contract_id.clone(), attributes);
    }

    /// The ids held by the portfolio.
    pub fn ids(&self) -> Vec<&str> {
        self.contracts.keys().map(String::as_str).collect()
    }

    /// Simulates one contract, resolving and simulating its children first.
    ///
    /// # Errors
    ///
    /// `MissingChild` when a referenced id is not in the portfolio,
    /// `CyclicStructure` when the reference graph contains a cycle.
    pub fn simulate(&self, id: &str, scenario: &Scenario) -> Result<SimulationResult, EngineError> {
        let attrs = self.lookup(id, id)?;
        let children = self.resolve_children(attrs, scenario)?;
        let contract = scenario.build(attrs, children)?;
        contract.simulate()
    }

    /// Simulates every contract that is not referenced as a child of
    /// another, in parallel. Independent contracts share nothing; each
    /// parent re-resolves its own children.
    pub fn simulate_all(&self, scenario: &Scenario) -> Vec<Result<SimulationResult, EngineError>> {
        let referenced: HashSet<String> = self
            .contracts
            .values()
            .filter_map(|a| a.contract_structure.as_ref())
            .flat_map(|s| s.referenced_ids().into_iter().map(str::to_string))
            .collect();
        let mut roots: Vec<&str> = self
            .contracts
            .keys()
            .filter(|id| !referenced.contains(*id))
            .map(String::as_str)
            .collect();
        roots.sort();
        info!(contracts = roots.len(), "simulating portfolio roots");
        roots
            .par_iter()
            .map(|id| self.simulate(id, scenario))
            .collect()
    }

    /// Simulates the children of `attrs` bottom-up and registers them in a
    /// child observer. Returns `None` for non-composite contracts.
    fn resolve_children(
        &self,
        attrs: &ContractAttributes,
        scenario: &Scenario,
    ) -> Result<Option<ChildContractObserver>, EngineError> {
        let Some(structure) = &attrs.contract_structure else {
            return Ok(None);
        };
        let mut order = Vec::new();
        let mut visiting = HashSet::new();
        let mut visited = HashSet::new();
        for child_id in structure.referenced_ids() {
            self.topological_sort(
                &attrs.contract_id,
                child_id,
                &mut visiting,
                &mut visited,
                &mut order,
            )?;
        }

        let mut observer = ChildContractObserver::new();
        for child_id in order {
            let child_attrs = self.lookup(&attrs.contract_id, &child_id)?;
            // Children deeper down were already simulated and registered;
            // hand the registry so far to this child if it needs one.
            let grandchildren = self.resolve_children(child_attrs, scenario)?;
            let contract = scenario.build(child_attrs, grandchildren)?;
            let result = contract.simulate()?;
            observer
                .register(child_attrs.clone(), result.events)
                .map_err(EngineError::from)?;
        }
        Ok(Some(observer))
    }

    fn topological_sort(
        &self,
        parent_id: &str,
        id: &str,
        visiting: &mut HashSet<String>,
        visited: &mut HashSet<String>,
        order: &mut Vec<String>,
    ) -> Result<(), EngineError> {
        if visited.contains(id) {
            return Ok(());
        }
        if !visiting.insert(id.to_string()) {
            return Err(EngineError::CyclicStructure {
                contract_id: id.to_string(),
            });
        }
        let attrs = self.lookup(parent_id, id)?;
        if let Some(structure) = &attrs.contract_structure {
            for child_id in structure.referenced_ids() {
                self.topological_sort(id, child_id, visiting, visited, order)?;
            }
        }
        visiting.remove(id);
        visited.insert(id.to_string());
        order.push(id.to_string());
        Ok(())
    }

    fn lookup(&self, parent_id: &str, id: &str) -> Result<&ContractAttributes, EngineError> {
        self.contracts.get(id).ok_or_else(|| EngineError::MissingChild {
            contract_id: parent_id.to_string(),
            child_id: id.to_string(),
        })
    }
}
