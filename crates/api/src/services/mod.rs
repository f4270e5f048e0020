//! Application services.

pub mod bootstrap;
pub mod invitations;
pub mod webhook;

pub use bootstrap::bootstrap_service;
pub use invitations::{InvitationError, InvitationService};
pub use webhook::{build_provisioner, WebhookProvisioner};
