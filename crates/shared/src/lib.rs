//! Shared utilities for the Spectate backend.
//!
//! This crate provides common functionality used across all other crates:
//! - JWT access tokens identifying the acting user
//! - Common validation logic

pub mod jwt;
pub mod validation;
