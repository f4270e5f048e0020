//! Domain layer for the Welcomarr backend.
//!
//! This crate contains:
//! - Domain models (Invitation, User, Snapshot)
//! - The redeemability rules and rejection kinds
//! - Ports for time and for downstream account provisioning

pub mod models;
pub mod services;
