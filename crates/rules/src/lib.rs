//! Compliance notification scheduling engine.
//!
//! This crate provides:
//! - Declarative notification rule schema with serde deserialization
//! - Recurrence resolution from frequency policies to firing descriptors
//! - A tenant-tagged job registry with idempotent reconciliation
//! - The compliance evaluator fired at job due time
//! - A polling scheduler runtime that drives evaluations
//! - Filesystem loader for YAML rule documents

pub mod evaluator;
pub mod loader;
pub mod materializer;
pub mod reconciler;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod scheduler;
pub mod stores;
pub mod validation;
