//! Shared fakes: an in-memory grid machine and a pass-through executor

#![allow(dead_code)]

use gridload_host::executor::{ExecutedSpec, ExecuteError, SpecExecutor};
use gridload_host::transport::{Signal, Transport, TransportError};
use gridload_spec::{Address, CoreCoordinate, CoreState};
use std::collections::{BTreeMap, HashMap};

pub const ALLOC_BASE: Address = 0x6000_0000;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Byte-addressed fake of the remote machine, one sparse memory per core
#[derive(Default)]
pub struct FakeGrid {
    pub memory: HashMap<CoreCoordinate, BTreeMap<Address, u8>>,
    pub base_registers: HashMap<CoreCoordinate, Address>,
    /// Every allocation as `(core, size_bytes, tag)`
    pub allocations: Vec<(CoreCoordinate, u32, u32)>,
    /// Every write's target as `(core, address)`, in issue order
    pub writes: Vec<(CoreCoordinate, Address)>,
    next_base: Address,
    pub states: HashMap<CoreCoordinate, CoreState>,
    /// Every signal delivered, in order
    pub signals: Vec<(CoreCoordinate, Signal)>,
    /// Cores that flip to `Finished` after this many forcing signals;
    /// cores absent from the map ignore forcing entirely
    pub finish_after: HashMap<CoreCoordinate, u32>,
    /// Fail the next N state queries before recovering
    pub fail_queries_remaining: u32,
    pub fail_allocation: bool,
    pub fail_disable_routing: bool,
    /// "enable" / "disable" events in call order
    pub routing_events: Vec<&'static str>,
}

impl FakeGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&mut self, core: CoreCoordinate, state: CoreState) {
        self.states.insert(core, state);
    }

    pub fn read_bytes(&self, core: CoreCoordinate, address: Address, length: usize) -> Vec<u8> {
        let memory = self.memory.get(&core);
        (0..length as Address)
            .map(|i| {
                memory
                    .and_then(|m| m.get(&(address + i)))
                    .copied()
                    .unwrap_or(0)
            })
            .collect()
    }

    pub fn signals_to(&self, core: CoreCoordinate) -> usize {
        self.signals.iter().filter(|(c, _)| *c == core).count()
    }
}

impl Transport for FakeGrid {
    fn allocate(
        &mut self,
        core: CoreCoordinate,
        size_bytes: u32,
        tag: u32,
    ) -> Result<Address, TransportError> {
        if self.fail_allocation {
            return Err(TransportError::AllocationFailed {
                core,
                size_bytes,
                tag,
                message: "out of SDRAM".into(),
            });
        }
        let base = if self.next_base == 0 {
            ALLOC_BASE
        } else {
            self.next_base
        };
        // keep allocations apart so cross-core overlap bugs surface
        self.next_base = base + size_bytes.next_multiple_of(0x1000);
        self.allocations.push((core, size_bytes, tag));
        Ok(base)
    }

    fn write(
        &mut self,
        core: CoreCoordinate,
        address: Address,
        data: &[u8],
    ) -> Result<(), TransportError> {
        self.writes.push((core, address));
        let memory = self.memory.entry(core).or_default();
        for (i, &byte) in data.iter().enumerate() {
            memory.insert(address + i as Address, byte);
        }
        Ok(())
    }

    fn read(
        &mut self,
        core: CoreCoordinate,
        address: Address,
        length: usize,
    ) -> Result<Vec<u8>, TransportError> {
        Ok(self.read_bytes(core, address, length))
    }

    fn write_base_register(
        &mut self,
        core: CoreCoordinate,
        address: Address,
    ) -> Result<(), TransportError> {
        self.base_registers.insert(core, address);
        Ok(())
    }

    fn read_base_register(&mut self, core: CoreCoordinate) -> Result<Address, TransportError> {
        self.base_registers
            .get(&core)
            .copied()
            .ok_or_else(|| TransportError::Io {
                core,
                address: 0,
                message: "base register never written".into(),
            })
    }

    fn query_state(
        &mut self,
        cores: &[CoreCoordinate],
    ) -> Result<Vec<CoreState>, TransportError> {
        if self.fail_queries_remaining > 0 {
            self.fail_queries_remaining -= 1;
            return Err(TransportError::Unreachable {
                core: cores[0],
                message: "no response".into(),
            });
        }
        Ok(cores
            .iter()
            .map(|core| {
                self.states
                    .get(core)
                    .copied()
                    .unwrap_or(CoreState::NotStarted)
            })
            .collect())
    }

    fn signal(
        &mut self,
        cores: &[CoreCoordinate],
        signal: Signal,
    ) -> Result<(), TransportError> {
        for &core in cores {
            self.signals.push((core, signal));
            if signal == Signal::FlushProvenanceAndExit {
                if let Some(remaining) = self.finish_after.get_mut(&core) {
                    *remaining = remaining.saturating_sub(1);
                    if *remaining == 0 {
                        self.states.insert(core, CoreState::Finished);
                    }
                }
            }
        }
        Ok(())
    }

    fn enable_bulk_routing(&mut self) -> Result<(), TransportError> {
        self.routing_events.push("enable");
        Ok(())
    }

    fn disable_bulk_routing(&mut self) -> Result<(), TransportError> {
        self.routing_events.push("disable");
        if self.fail_disable_routing {
            return Err(TransportError::Routing {
                message: "default tables would not load".into(),
            });
        }
        Ok(())
    }
}

/// Executor whose "specification" is already the executed result; repeat
/// execution hands back a fresh copy each time
#[derive(Default)]
pub struct EchoExecutor {
    pub calls: Vec<CoreCoordinate>,
}

impl EchoExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpecExecutor for EchoExecutor {
    type Spec = ExecutedSpec;

    fn execute(
        &mut self,
        core: CoreCoordinate,
        spec: &Self::Spec,
    ) -> Result<ExecutedSpec, ExecuteError> {
        self.calls.push(core);
        Ok(spec.clone())
    }
}
