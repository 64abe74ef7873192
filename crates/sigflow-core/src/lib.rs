//! Sigflow Core - module graphs compiled to flat, buffer-addressed scripts
//!
//! This crate turns a user-authored graph of signal-processing modules into a
//! single sequential program that runs sample by sample inside an external
//! script host. It does no signal processing itself: every module's
//! per-sample behaviour is an opaque code fragment supplied by its definition.
//!
//! # Core Abstractions
//!
//! - [`ModuleDefinition`] / [`Catalog`] - templates for modules, looked up by name
//! - [`Graph`] - a patch: the sink plus modules and their slot bindings
//! - [`Schedule`] - dependency order of the modules reachable from the sink
//! - [`StateLayout`] - per-module address ranges in the flat state array
//! - [`CompiledPatch`] - initial values and statement texts for one voice
//!
//! # Errors
//!
//! Every mutation and compilation failure is a [`GraphError`]. Failed calls
//! never leave a partially mutated graph behind.
//!
//! # Logging
//!
//! Mutations and compilation emit `tracing` events at `debug` level, and
//! per-module layout at `trace` level. No subscriber is installed here.

pub mod catalog;
pub mod error;
pub mod graph;

pub use catalog::{Catalog, MAX_CHANNELS, ModuleDefinition, SINK_DEFINITION};
pub use error::GraphError;
pub use graph::{
    CompiledPatch, Graph, Module, ModuleId, NodeLayout, ParamSlot, Schedule, StateLayout,
    format_literal,
};
