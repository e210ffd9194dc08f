//! # gridload Host
//!
//! Host-side loading for a many-core grid machine: executes per-core data
//! specifications, writes the resulting memory images and region tables over
//! a remote transport, rewrites dirty regions in place between runs, and
//! drives core sets to agreed lifecycle states.
//!
//! ## Structure
//!
//! - [`SpecLoader`]: allocate, write regions, write the region table last
//! - [`ReloadEngine`]: regenerate and rewrite regions without moving them
//! - [`ConvergenceProtocol`]: bounded-retry wait/force loops over core sets
//! - [`ChipBudget`]: per-chip SDRAM totals checked before any remote I/O
//! - [`Transport`] / [`SpecExecutor`]: the machine connection and the data
//!   specification interpreter, supplied by the caller

pub mod budget;
pub mod converge;
pub mod error;
pub mod executor;
pub mod loader;
pub mod machine;
pub mod recovery;
pub mod reload;
pub mod transport;

pub use budget::{ChipBudget, ChipUsageReport, CoreUsage};
pub use converge::{ConvergenceConfig, ConvergenceProtocol};
pub use error::{CoreList, HostError};
pub use executor::{ExecuteError, ExecutedRegion, ExecutedSpec, RegionReference, SpecExecutor};
pub use loader::{LoadUnit, LoaderConfig, SpecLoader};
pub use machine::Machine;
pub use recovery::{EmergencyRecovery, NoRecovery};
pub use reload::{locate_region, ReloadEngine};
pub use transport::{Signal, Transport, TransportError};

/// Load the system targets: no bulk routing, failures propagate directly.
pub fn execute_system_pass<'a, E, T>(
    executor: &'a mut E,
    transport: &'a mut T,
    machine: &'a Machine,
    units: &mut [LoadUnit<E::Spec>],
) -> Result<ChipBudget<'a>, HostError>
where
    E: SpecExecutor,
    T: Transport,
{
    SpecLoader::new(executor, transport, machine).load(units, true)
}

/// Load the application targets. When the bulk routing path is in use, a
/// failure first captures diagnostic state through the recovery collaborator,
/// then propagates.
pub fn execute_application_pass<'a, E, T>(
    executor: &'a mut E,
    transport: &'a mut T,
    machine: &'a Machine,
    units: &mut [LoadUnit<E::Spec>],
    config: LoaderConfig,
    recovery: &mut dyn EmergencyRecovery,
) -> Result<ChipBudget<'a>, HostError>
where
    E: SpecExecutor,
    T: Transport,
{
    let cores: Vec<_> = units.iter().map(|unit| unit.core).collect();
    let result = SpecLoader::new(executor, transport, machine)
        .with_config(config)
        .load(units, false);
    if result.is_err() && config.use_bulk_routing {
        recovery.capture(&cores);
    }
    result
}
