//! Domain services for Welcomarr.
//!
//! Abstractions the invitation lifecycle depends on but does not own.

pub mod clock;
pub mod provisioning;

pub use clock::{Clock, ManualClock, SystemClock};
pub use provisioning::{
    MediaProvisioner, MockProvisioner, ProvisioningRequest, ProvisioningResult,
};
