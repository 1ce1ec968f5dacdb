//! Persistence layer for the Spectate backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - The Postgres-backed invite store

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
