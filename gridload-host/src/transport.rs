//! # Remote Transport Interface
//!
//! The single logical connection to the grid machine. All remote operations
//! go through one [`Transport`] handle, used by one orchestration routine at
//! a time; the connection is not thread-safe and nothing here assumes
//! otherwise.
//!
//! Transport failures are fatal wherever a one-shot read or write is issued.
//! Only the convergence protocol treats them as retryable, inside its bounded
//! round budget.

use gridload_spec::{Address, CoreCoordinate, CoreState};
use thiserror::Error;

/// Machine-wide signals and per-core one-shot commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Begin execution on cores waiting in ready state
    Start,
    /// Synchronization barrier 0
    Sync0,
    /// Synchronization barrier 1
    Sync1,
    /// Dump diagnostic state and exit; used to force stragglers out
    FlushProvenanceAndExit,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Core {core} is unreachable: {message}")]
    Unreachable {
        core: CoreCoordinate,
        message: String,
    },

    #[error("Allocation of {size_bytes} bytes (tag {tag}) failed on core {core}: {message}")]
    AllocationFailed {
        core: CoreCoordinate,
        size_bytes: u32,
        tag: u32,
        message: String,
    },

    #[error("Memory access failed on core {core} at {address:#010x}: {message}")]
    Io {
        core: CoreCoordinate,
        address: Address,
        message: String,
    },

    #[error("Routing reconfiguration failed: {message}")]
    Routing { message: String },
}

/// Word-addressed access to the remote machine's distributed memory plus the
/// state-query/signal primitives.
pub trait Transport {
    /// Reserve `size_bytes` of a core's shared memory, tagged so the block
    /// can be found again by tag lookup
    fn allocate(
        &mut self,
        core: CoreCoordinate,
        size_bytes: u32,
        tag: u32,
    ) -> Result<Address, TransportError>;

    fn write(
        &mut self,
        core: CoreCoordinate,
        address: Address,
        data: &[u8],
    ) -> Result<(), TransportError>;

    fn read(
        &mut self,
        core: CoreCoordinate,
        address: Address,
        length: usize,
    ) -> Result<Vec<u8>, TransportError>;

    /// Store the data base address in the core's well-known register so the
    /// core can locate its own table before it starts running
    fn write_base_register(
        &mut self,
        core: CoreCoordinate,
        address: Address,
    ) -> Result<(), TransportError>;

    /// Read back the address previously stored with
    /// [`write_base_register`](Transport::write_base_register)
    fn read_base_register(&mut self, core: CoreCoordinate) -> Result<Address, TransportError>;

    /// Current lifecycle state of each core, in the order given
    fn query_state(
        &mut self,
        cores: &[CoreCoordinate],
    ) -> Result<Vec<CoreState>, TransportError>;

    fn signal(&mut self, cores: &[CoreCoordinate], signal: Signal) -> Result<(), TransportError>;

    /// Switch on the auxiliary high-throughput routing path for bulk data
    /// transfer. Transports without one accept and ignore the request.
    fn enable_bulk_routing(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Restore the default routing state. Must be called on both the success
    /// and failure paths of whatever enabled the bulk path.
    fn disable_bulk_routing(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}
