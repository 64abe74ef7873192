//! Module graph and the compiler that flattens it into a script.
//!
//! Edit the graph at mutation time (add/remove/connect), then compile it to a
//! [`CompiledPatch`]: an initial state array and a straight-line statement
//! sequence that a script host runs once per sample.
//!
//! # Pipeline
//!
//! 1. [`Schedule`] — depth-first walk from the sink, producers first. Shared
//!    producers are placed once; unreachable modules are dropped; feedback
//!    loops are rejected.
//! 2. [`StateLayout`] — decides which outputs must be persisted and assigns
//!    each scheduled module a contiguous range of the flat state array.
//! 3. [`emit`] — writes the initial values literal and the statements that
//!    wire producer outputs into consumer inputs and parameter cells.
//!
//! # Register Forwarding
//!
//! A module's output lives in the transient `l`/`r` registers. When its
//! consumer runs immediately after it, no memory traffic is emitted at all.
//! Only outputs with a later consumer are written to trailing output cells,
//! so a linear chain compiles to its fragments alone.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sigflow_core::{Catalog, Graph, GraphError, ModuleDefinition};
//!
//! let mut catalog = Catalog::with_sink();
//! catalog.register(ModuleDefinition::new("Oscillator/Sawtooth", 0, 1)
//!     .with_param("freq", 0.01)
//!     .with_workspace(1)
//!     .with_code("l=v[i+1]=(v[i+1]+v[i])%1;i+=2;"))?;
//! catalog.register(ModuleDefinition::new("Pan", 1, 2).with_code("r=l;"))?;
//!
//! let mut graph = Graph::new(Arc::new(catalog))?;
//! let osc = graph.add_module("Oscillator/Sawtooth")?;
//! let pan = graph.add_module("Pan")?;
//! graph.connect(osc, pan)?;
//! graph.connect(pan, graph.sink())?;
//!
//! let (values, code) = graph.generate_code()?;
//! assert_eq!(values, "[.01,0]");
//! assert!(code.contains("r=l;"));
//! # Ok::<(), GraphError>(())
//! ```

pub mod buffer;
pub mod emit;
pub mod module;
mod processing;
pub mod schedule;

pub use buffer::{NodeLayout, StateLayout};
pub use emit::{CompiledPatch, format_literal};
pub use module::{Module, ModuleId, ParamSlot};
pub use processing::Graph;
pub use schedule::Schedule;
