//! # Specification Loader
//!
//! Executes every target's data specification and writes the resulting
//! memory image into the machine: allocate, write regions, then write the
//! region table last. The table is the directory other readers trust, so it
//! never appears before the data it points at.

use crate::budget::{ChipBudget, CoreUsage};
use crate::error::HostError;
use crate::executor::SpecExecutor;
use crate::machine::Machine;
use crate::transport::Transport;
use gridload_spec::{Address, CoreCoordinate, PointerTable, CORE_DATA_BASE_TAG, TABLE_BYTES};
use tracing::{debug, info, warn};

/// One core's load state for the duration of a load pass and any reloads
/// that follow it
#[derive(Debug, Clone)]
pub struct LoadUnit<S> {
    pub core: CoreCoordinate,
    /// Label of the logical unit placed on this core, for diagnostics
    pub label: String,
    /// The opaque data specification the executor interprets
    pub spec: S,
    /// Planning-stage SDRAM estimate for this core
    pub estimated_bytes: u64,
    /// Base of the core's data allocation, recorded on load
    pub base_address: Option<Address>,
    /// Set by the governing logical unit when its state changed and its
    /// regions must be regenerated
    pub needs_reload: bool,
}

impl<S> LoadUnit<S> {
    pub fn new(
        core: CoreCoordinate,
        label: impl Into<String>,
        spec: S,
        estimated_bytes: u64,
    ) -> Self {
        Self {
            core,
            label: label.into(),
            spec,
            estimated_bytes,
            base_address: None,
            needs_reload: false,
        }
    }
}

/// Loader behavior switches
#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderConfig {
    /// Route bulk data through the auxiliary high-throughput path
    pub use_bulk_routing: bool,
}

/// Orchestrates one load pass over a set of core targets
pub struct SpecLoader<'a, E, T> {
    executor: &'a mut E,
    transport: &'a mut T,
    machine: &'a Machine,
    config: LoaderConfig,
}

impl<'a, E, T> SpecLoader<'a, E, T>
where
    E: SpecExecutor,
    T: Transport,
{
    pub fn new(executor: &'a mut E, transport: &'a mut T, machine: &'a Machine) -> Self {
        Self {
            executor,
            transport,
            machine,
            config: LoaderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute and load every unit in order. Any failure aborts the pass;
    /// bytes already written for earlier cores stay where they are, since
    /// the caller's remediation is to repeat the whole pass.
    pub fn load(
        &mut self,
        units: &mut [LoadUnit<E::Spec>],
        is_system: bool,
    ) -> Result<ChipBudget<'a>, HostError> {
        let pass = if is_system { "system" } else { "application" };
        info!(
            pass,
            n_cores = units.len(),
            "executing data specifications and loading data"
        );

        if self.config.use_bulk_routing {
            self.transport.enable_bulk_routing()?;
        }
        let result = self.load_all(units);
        if self.config.use_bulk_routing {
            if let Err(release) = self.transport.disable_bulk_routing() {
                match &result {
                    // a failed release must not vanish on the success path
                    Ok(_) => return Err(release.into()),
                    // but it must not mask the original failure either
                    Err(_) => warn!(%release, "could not restore default routing after failure"),
                }
            }
        }
        result
    }

    fn load_all(&mut self, units: &mut [LoadUnit<E::Spec>]) -> Result<ChipBudget<'a>, HostError> {
        let mut budget = ChipBudget::new(self.machine);
        for unit in units.iter_mut() {
            self.load_unit(unit, &mut budget)?;
        }
        Ok(budget)
    }

    fn load_unit(
        &mut self,
        unit: &mut LoadUnit<E::Spec>,
        budget: &mut ChipBudget<'_>,
    ) -> Result<(), HostError> {
        let executed = self.executor.execute(unit.core, &unit.spec)?;
        executed.validate(unit.core)?;

        // budget before any remote I/O: over-allocation is a planning error
        // and must not cost a single remote write
        let total_size = TABLE_BYTES as u64 + executed.total_data_bytes();
        budget.commit(CoreUsage {
            core: unit.core,
            label: unit.label.clone(),
            used_bytes: total_size,
            estimated_bytes: unit.estimated_bytes,
        })?;

        let base = self.transport.allocate(
            unit.core,
            total_size as u32,
            CORE_DATA_BASE_TAG + u32::from(unit.core.p),
        )?;
        self.transport.write_base_register(unit.core, base)?;
        unit.base_address = Some(base);
        debug!(core = %unit.core, base, total_size, "allocated region storage");

        // regions are laid out contiguously after the table; writes for one
        // core are order-insensitive among themselves
        let mut table = PointerTable::new();
        let mut pointer = base + TABLE_BYTES as Address;
        for region in &executed.regions {
            match &region.data {
                Some(data) => {
                    self.transport.write(unit.core, pointer, data)?;
                    table.set_region(region.region, pointer, data)?;
                }
                None => table.set_pointer(region.region, pointer)?,
            }
            pointer += region.size_bytes;
        }
        for reference in &executed.references {
            table.set_pointer(reference.region, reference.pointer)?;
        }

        // the directory goes in last, after every region it points at
        self.transport
            .write(unit.core, base, &table.to_device_bytes())?;
        debug!(core = %unit.core, regions = executed.regions.len(), "core loaded");
        Ok(())
    }
}
