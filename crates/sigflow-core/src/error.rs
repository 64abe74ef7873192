//! Error type for graph mutation and compilation.

use thiserror::Error;

use crate::graph::ModuleId;

/// Errors that can occur during graph operations.
///
/// A single error kind covers catalog lookups, graph mutations, and
/// compilation. Every operation that returns a `GraphError` leaves the graph
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// No module definition with this name exists in the catalog.
    #[error("module definition '{0}' not found")]
    NotFound(String),

    /// The module handle does not refer to a current member of the graph.
    #[error("module {0} is not in the graph")]
    NotMember(ModuleId),

    /// The sending module has no output channels.
    #[error("module {0} has no output")]
    NoOutput(String),

    /// The receiving module has no main input.
    #[error("module {0} has no input")]
    NoInput(String),

    /// The channel counts of producer and consumer differ.
    #[error("module {module} needs {expected} input channels, got {found}")]
    ChannelMismatch {
        /// Display name of the receiving module.
        module: String,
        /// Input channels the receiver expects.
        expected: u8,
        /// Output channels the sender provides.
        found: u8,
    },

    /// The target slot already has a producer.
    #[error("{slot} of {module} is already connected")]
    SlotOccupied {
        /// Display name of the receiving module.
        module: String,
        /// Human-readable slot label (`input` or `param 'name'`).
        slot: String,
    },

    /// Only single-channel outputs may drive a parameter.
    #[error("module {0} needs 1 output channel to modulate a parameter")]
    NotMono(String),

    /// The module's definition has no parameter with this name.
    #[error("module {module} has no parameter '{param}'")]
    NoSuchParam {
        /// Display name of the module.
        module: String,
        /// The parameter name that failed to resolve.
        param: String,
    },

    /// A scheduled module requires a main input but none is connected.
    #[error("input of module {0} is not connected")]
    UnconnectedInput(String),

    /// A module reachable from the sink feeds back into itself.
    #[error("module {0} is part of a feedback cycle")]
    Cycle(String),

    /// The sink is a permanent member of every graph.
    #[error("the output module cannot be removed")]
    SinkRemoval,

    /// A module definition violates its structural constraints.
    #[error("invalid module definition '{name}': {reason}")]
    InvalidDefinition {
        /// Name of the rejected definition.
        name: String,
        /// Why the definition was rejected.
        reason: String,
    },
}

impl GraphError {
    pub(crate) fn slot_occupied(module: &str, param: Option<&str>) -> Self {
        let slot = match param {
            Some(name) => format!("param '{name}'"),
            None => "input".to_string(),
        };
        GraphError::SlotOccupied {
            module: module.to_string(),
            slot,
        }
    }

    pub(crate) fn no_such_param(module: &str, param: &str) -> Self {
        GraphError::NoSuchParam {
            module: module.to_string(),
            param: param.to_string(),
        }
    }

    pub(crate) fn invalid_definition(name: &str, reason: impl Into<String>) -> Self {
        GraphError::InvalidDefinition {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_mismatch_display() {
        let err = GraphError::ChannelMismatch {
            module: "Output".to_string(),
            expected: 2,
            found: 1,
        };
        assert_eq!(err.to_string(), "module Output needs 2 input channels, got 1");
    }

    #[test]
    fn slot_occupied_labels_input_and_param() {
        let input = GraphError::slot_occupied("Pan", None);
        assert_eq!(input.to_string(), "input of Pan is already connected");

        let param = GraphError::slot_occupied("Mul Stereo", Some("gain"));
        assert_eq!(
            param.to_string(),
            "param 'gain' of Mul Stereo is already connected"
        );
    }

    #[test]
    fn not_member_names_handle() {
        let err = GraphError::NotMember(ModuleId(7));
        assert_eq!(err.to_string(), "module ModuleId(7) is not in the graph");
    }

    #[test]
    fn no_such_param_display() {
        let err = GraphError::no_such_param("Sawtooth", "cutoff");
        assert_eq!(err.to_string(), "module Sawtooth has no parameter 'cutoff'");
    }
}
