//! # Convergence Protocol
//!
//! Bounded-retry polling and forcing over a fixed core set. Used in two
//! modes: forcing stragglers to flush provenance and exit after a run, and
//! waiting for a target state before or after starting binaries. Transport
//! errors are retryable only here, inside the bounded loop; everywhere else
//! in the crate they are fatal.

use crate::error::{CoreList, HostError};
use crate::recovery::EmergencyRecovery;
use crate::transport::{Signal, Transport, TransportError};
use gridload_spec::{CoreCoordinate, CoreState};
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Retry and polling knobs
#[derive(Debug, Clone, Copy)]
pub struct ConvergenceConfig {
    /// Forcing rounds before giving up on stragglers
    pub round_limit: u32,
    /// Delay between state polls while waiting
    pub poll_interval: Duration,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            round_limit: 10,
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Drives a set of remote cores to an agreed state
pub struct ConvergenceProtocol<'a, T> {
    transport: &'a mut T,
    config: ConvergenceConfig,
}

impl<'a, T: Transport> ConvergenceProtocol<'a, T> {
    pub fn new(transport: &'a mut T) -> Self {
        Self {
            transport,
            config: ConvergenceConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ConvergenceConfig) -> Self {
        self.config = config;
        self
    }

    /// Force every core to flush provenance and exit, retrying up to the
    /// round limit. Non-convergence is a soft failure: it is logged and the
    /// still-stuck cores are returned, never raised, since the run's results
    /// may still be usable.
    pub fn force_finish(&mut self, cores: &[CoreCoordinate]) -> Vec<CoreCoordinate> {
        let mut pending = match self.unconverged(cores, CoreState::Finished) {
            Ok(pending) => pending,
            Err(err) => {
                debug!(%err, "initial state query failed; will retry");
                cores.to_vec()
            }
        };

        let mut attempts = 0;
        while !pending.is_empty() && attempts < self.config.round_limit {
            attempts += 1;
            for &core in &pending {
                if let Err(err) = self.transport.signal(&[core], Signal::FlushProvenanceAndExit) {
                    debug!(%core, %err, "forcing signal failed; will retry");
                }
            }
            match self.unconverged(cores, CoreState::Finished) {
                Ok(now) => {
                    let advanced = pending.len().saturating_sub(now.len());
                    if advanced > 0 {
                        debug!(advanced, remaining = now.len(), "cores finished");
                    }
                    pending = now;
                }
                Err(err) => debug!(%err, "state query failed; will retry"),
            }
        }

        if !pending.is_empty() {
            error!(
                stuck = %CoreList(pending.clone()),
                "Unable to finish forcing cores to exit. Abandoned after too many \
                 retries. Machine may be left in an unstable state!"
            );
        }
        pending
    }

    /// Poll until every core reports `state`. `None` waits forever. Timing
    /// out is a hard failure naming the cores still pending.
    pub fn wait_for_state(
        &mut self,
        cores: &[CoreCoordinate],
        state: CoreState,
        timeout: Option<Duration>,
    ) -> Result<(), HostError> {
        let started = Instant::now();
        loop {
            let pending = match self.unconverged(cores, state) {
                Ok(pending) if pending.is_empty() => return Ok(()),
                Ok(pending) => pending,
                Err(err) => {
                    debug!(%err, "state query failed; will retry until deadline");
                    cores.to_vec()
                }
            };

            let waited = started.elapsed();
            if let Some(limit) = timeout {
                if waited >= limit {
                    return Err(HostError::StateTimeout {
                        state,
                        waited,
                        pending: CoreList(pending),
                    });
                }
            }
            std::thread::sleep(self.config.poll_interval);
        }
    }

    /// Wait for every core to report ready, then release them together
    pub fn start_when_ready(
        &mut self,
        cores: &[CoreCoordinate],
        timeout: Option<Duration>,
    ) -> Result<(), HostError> {
        self.wait_for_state(cores, CoreState::Ready, timeout)?;
        self.transport.signal(cores, Signal::Start)?;
        Ok(())
    }

    /// Start-up variant of [`wait_for_state`](Self::wait_for_state): on
    /// timeout, capture diagnostic state through the recovery collaborator
    /// before the error propagates and the machine is disturbed further.
    pub fn wait_or_recover(
        &mut self,
        cores: &[CoreCoordinate],
        state: CoreState,
        timeout: Option<Duration>,
        recovery: &mut dyn EmergencyRecovery,
    ) -> Result<(), HostError> {
        let result = self.wait_for_state(cores, state, timeout);
        if matches!(&result, Err(HostError::StateTimeout { .. })) {
            recovery.capture(cores);
        }
        result
    }

    /// Check no core has crashed out of the run. Watchdog, runtime-exception
    /// and idle cores cannot be forced to finish, so forcing only starts
    /// after this passes.
    pub fn verify_no_failures(&mut self, cores: &[CoreCoordinate]) -> Result<(), HostError> {
        let states = self.transport.query_state(cores)?;
        let mut rte = Vec::new();
        let mut watchdog = Vec::new();
        let mut idle = Vec::new();
        for (&core, state) in cores.iter().zip(states) {
            match state {
                CoreState::RuntimeException => rte.push(core),
                CoreState::Watchdog => watchdog.push(core),
                CoreState::Idle => idle.push(core),
                _ => {}
            }
        }
        if rte.is_empty() && watchdog.is_empty() && idle.is_empty() {
            Ok(())
        } else {
            Err(HostError::CoresFaulted {
                rte: CoreList(rte),
                watchdog: CoreList(watchdog),
                idle: CoreList(idle),
            })
        }
    }

    fn unconverged(
        &mut self,
        cores: &[CoreCoordinate],
        target: CoreState,
    ) -> Result<Vec<CoreCoordinate>, TransportError> {
        let states = self.transport.query_state(cores)?;
        Ok(cores
            .iter()
            .zip(states)
            .filter(|(_, state)| *state != target)
            .map(|(&core, _)| core)
            .collect())
    }
}
