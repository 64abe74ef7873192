//! Module definitions and the catalog they are resolved from.
//!
//! A [`ModuleDefinition`] describes one signal-processing unit: its channel
//! arity, named parameters with defaults, how many persistent scratch cells it
//! needs, and the opaque code fragment that implements it. The [`Catalog`] maps
//! definition names to definitions and is read-only once a graph is built on it.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Definition name reserved for the graph sink.
pub const SINK_DEFINITION: &str = "!out";

/// Maximum channel count for inputs and outputs (stereo).
pub const MAX_CHANNELS: u8 = 2;

/// Template for a signal-processing module.
///
/// Field names serialize in camelCase (`inChannels`, `paramNames`, ...) so
/// catalog files written for other tools deserialize unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDefinition {
    /// Definition name. May be a menu path such as `"Oscillator/Sawtooth"`.
    pub name: String,
    /// Number of main input channels (0, 1 or 2).
    pub in_channels: u8,
    /// Number of output channels (0, 1 or 2).
    pub out_channels: u8,
    /// Parameter names, unique within the definition.
    #[serde(default)]
    pub param_names: Vec<String>,
    /// Parameter defaults. When present, one entry per parameter name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_defaults: Option<Vec<f32>>,
    /// Persistent scratch cells the fragment owns (e.g. oscillator phase).
    #[serde(default)]
    pub workspace_size: usize,
    /// Script fragment executed once per sample.
    #[serde(default)]
    pub code: String,
}

impl ModuleDefinition {
    /// Creates a definition with no parameters, no workspace and no code.
    pub fn new(name: impl Into<String>, in_channels: u8, out_channels: u8) -> Self {
        Self {
            name: name.into(),
            in_channels,
            out_channels,
            param_names: Vec::new(),
            param_defaults: None,
            workspace_size: 0,
            code: String::new(),
        }
    }

    /// The stereo sink definition: two input channels, no output.
    pub fn sink() -> Self {
        Self::new(SINK_DEFINITION, 2, 0)
    }

    /// Appends a parameter with the given default value.
    pub fn with_param(mut self, name: impl Into<String>, default: f32) -> Self {
        let count = self.param_names.len();
        self.param_defaults
            .get_or_insert_with(|| vec![0.0; count])
            .push(default);
        self.param_names.push(name.into());
        self
    }

    /// Sets the number of workspace cells.
    pub fn with_workspace(mut self, size: usize) -> Self {
        self.workspace_size = size;
        self
    }

    /// Sets the code fragment.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Number of parameters.
    #[inline]
    pub fn param_count(&self) -> usize {
        self.param_names.len()
    }

    /// Position of a parameter in [`param_names`](Self::param_names).
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.param_names.iter().position(|n| n == name)
    }

    /// Default value of parameter `index`, zero when no defaults are given.
    pub fn default_value(&self, index: usize) -> f32 {
        self.param_defaults
            .as_ref()
            .and_then(|d| d.get(index).copied())
            .unwrap_or(0.0)
    }

    /// Last segment of the menu path (`"Oscillator/Sawtooth"` → `"Sawtooth"`).
    pub fn display_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Whether this is the reserved sink definition.
    pub fn is_sink(&self) -> bool {
        self.name == SINK_DEFINITION
    }

    /// Checks channel counts, default count, and parameter name uniqueness.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.in_channels > MAX_CHANNELS || self.out_channels > MAX_CHANNELS {
            return Err(GraphError::invalid_definition(
                &self.name,
                format!(
                    "channel counts must be 0, 1 or 2 (in={}, out={})",
                    self.in_channels, self.out_channels
                ),
            ));
        }
        if let Some(defaults) = &self.param_defaults
            && defaults.len() != self.param_names.len()
        {
            return Err(GraphError::invalid_definition(
                &self.name,
                format!(
                    "{} defaults for {} parameters",
                    defaults.len(),
                    self.param_names.len()
                ),
            ));
        }
        for (i, name) in self.param_names.iter().enumerate() {
            if self.param_names[..i].contains(name) {
                return Err(GraphError::invalid_definition(
                    &self.name,
                    format!("duplicate parameter '{name}'"),
                ));
            }
        }
        if self.is_sink() && self.out_channels != 0 {
            return Err(GraphError::invalid_definition(
                &self.name,
                "the sink must not have outputs",
            ));
        }
        Ok(())
    }
}

/// Immutable lookup table from definition name to [`ModuleDefinition`].
///
/// Populated by an external loader before any [`Graph`](crate::Graph) is
/// built, then shared read-only via `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    definitions: BTreeMap<String, Arc<ModuleDefinition>>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog containing only the default stereo sink.
    pub fn with_sink() -> Self {
        let mut catalog = Self::new();
        let sink = ModuleDefinition::sink();
        catalog.definitions.insert(sink.name.clone(), Arc::new(sink));
        catalog
    }

    /// Validates and registers a definition, replacing any previous
    /// definition of the same name.
    pub fn register(&mut self, definition: ModuleDefinition) -> Result<(), GraphError> {
        definition.validate()?;
        tracing::debug!(
            name = %definition.name,
            params = definition.param_count(),
            workspace = definition.workspace_size,
            "catalog_register"
        );
        self.definitions
            .insert(definition.name.clone(), Arc::new(definition));
        Ok(())
    }

    /// Registers every definition, stopping at the first invalid one.
    pub fn register_all<I>(&mut self, definitions: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = ModuleDefinition>,
    {
        definitions.into_iter().try_for_each(|d| self.register(d))
    }

    /// Looks up a definition by name.
    pub fn get(&self, name: &str) -> Option<&Arc<ModuleDefinition>> {
        self.definitions.get(name)
    }

    /// Looks up a definition, failing with [`GraphError::NotFound`].
    pub fn lookup(&self, name: &str) -> Result<Arc<ModuleDefinition>, GraphError> {
        self.definitions
            .get(name)
            .cloned()
            .ok_or_else(|| GraphError::NotFound(name.to_string()))
    }

    /// Whether a definition with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// All definitions, ordered by name.
    pub fn definitions(&self) -> impl Iterator<Item = &ModuleDefinition> {
        self.definitions.values().map(|d| d.as_ref())
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
