// src/models/mod.rs

//! Domain models for the harvester.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod exhibitor;
mod rules;

// Re-export all public types
pub use config::{Config, ContactConfig, HarvestConfig, IndexConfig, OutputConfig};
pub use exhibitor::{ContactInfo, ExhibitorRecord, RawHit};
pub use rules::{ContactField, ContactRule, ContactRuleSet};
