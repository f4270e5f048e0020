//! Domain models for Welcomarr.

pub mod invitation;
pub mod snapshot;
pub mod user;

pub use invitation::{
    CreateInvitationRequest, Invitation, InvitationStatus, InvitationView, PublicInvitationInfo,
    Rejection,
};
pub use snapshot::{AdminCredentials, Snapshot, SNAPSHOT_VERSION};
pub use user::{Identity, User};
