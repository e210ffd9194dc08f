//! # Emergency Recovery Hook
//!
//! When a start-up wait times out or an application-pass load fails with the
//! bulk routing path active, diagnostic state should be captured before the
//! machine is disturbed further. The capture itself is an external concern;
//! this is only the seam it plugs into.

use gridload_spec::CoreCoordinate;

/// Best-effort diagnostic capture, invoked before a fatal error propagates
pub trait EmergencyRecovery {
    fn capture(&mut self, cores: &[CoreCoordinate]);
}

/// Recovery hook that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRecovery;

impl EmergencyRecovery for NoRecovery {
    fn capture(&mut self, _cores: &[CoreCoordinate]) {}
}
