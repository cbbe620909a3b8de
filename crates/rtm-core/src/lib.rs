//! # rtm-core
//!
//! Core types, document model, key rules and ID allocation for the RTM engine.
//!
//! This crate provides the foundational types shared across all RTM crates:
//! - Entity structs for every persisted row (projects, components, requirements, ...)
//! - Requirement type, layer and change-kind enums
//! - The RTM document model and its normalization into a typed tree
//! - Requirement key suffix rules
//! - Injectable row identifier allocation
//! - Cross-cutting error types
//! - Requirement snapshots used for audit and change detection
//! - CLI response types

pub mod document;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod keys;
pub mod responses;
pub mod snapshot;
