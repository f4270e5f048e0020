//! Shared utilities for the Welcomarr backend.
//!
//! This crate provides functionality used across the other crates:
//! - Password hashing with Argon2id for the admin credentials
//! - Common validation logic for user-supplied identity and labels

pub mod password;
pub mod validation;
