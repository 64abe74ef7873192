//! Module graph — membership, slot bindings, and the mutation API.
//!
//! [`Graph`] owns every module of one patch in an arena indexed by
//! [`ModuleId`]. Removed modules leave an empty arena slot behind so handles
//! stay stable. All mutations validate before touching any slot: a failed
//! call leaves the graph exactly as it was.

use core::fmt;
use std::sync::Arc;

use crate::catalog::{Catalog, SINK_DEFINITION};
use crate::error::GraphError;

use super::buffer::StateLayout;
use super::emit::{self, CompiledPatch};
use super::module::{Module, ModuleId};
use super::schedule::Schedule;

/// Display name given to the sink module.
const SINK_NAME: &str = "Output";

/// A patch: the sink module plus any number of other modules.
///
/// # Usage
///
/// 1. Build a [`Catalog`] and create the graph with [`new()`](Self::new)
/// 2. Add modules: [`add_module()`](Self::add_module)
/// 3. Wire them: [`connect()`](Self::connect), [`connect_param()`](Self::connect_param)
/// 4. Compile: [`compile()`](Self::compile) or [`generate_code()`](Self::generate_code)
///
/// Modules that are not reachable from the sink are legal; they simply do
/// not appear in the compiled program.
#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    catalog: Arc<Catalog>,
    modules: Vec<Option<Module>>,
    sink: ModuleId,
}

impl Graph {
    /// Creates a graph containing only the sink.
    ///
    /// Fails with [`GraphError::NotFound`] if the catalog has no
    /// [`SINK_DEFINITION`].
    pub fn new(catalog: Arc<Catalog>) -> Result<Self, GraphError> {
        let definition = catalog.lookup(SINK_DEFINITION)?;
        let sink = ModuleId(0);
        let mut module = Module::new(sink, definition);
        module.set_name(SINK_NAME.to_string());
        Ok(Self {
            name: String::new(),
            catalog,
            modules: vec![Some(module)],
            sink,
        })
    }

    /// Patch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the patch.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The catalog modules are resolved against.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Handle of the sink module.
    pub fn sink(&self) -> ModuleId {
        self.sink
    }

    // --- Module membership ---

    /// Instantiates a catalog definition and adds it to the graph.
    pub fn add_module(&mut self, definition: &str) -> Result<ModuleId, GraphError> {
        let definition = self.catalog.lookup(definition)?;
        let id = ModuleId(self.modules.len() as u32);
        let module = Module::new(id, definition);
        tracing::debug!("graph_add: {} as {id}", module);
        self.modules.push(Some(module));
        Ok(id)
    }

    /// Removes a module, clearing every slot in the graph that references it.
    pub fn remove_module(&mut self, id: ModuleId) -> Result<(), GraphError> {
        self.get(id)?;
        if id == self.sink {
            return Err(GraphError::SinkRemoval);
        }

        let mut cleared = 0;
        for module in self.modules.iter_mut().flatten() {
            cleared += module.clear_references_to(id);
        }
        self.modules[id.slot()] = None;

        tracing::debug!("graph_remove: {id} ({cleared} slots cleared)");
        Ok(())
    }

    /// Returns a module by handle, or `None` if it is not a member.
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id.slot())?.as_ref()
    }

    /// Whether `id` is a current member.
    pub fn contains(&self, id: ModuleId) -> bool {
        self.module(id).is_some()
    }

    /// Current members in insertion order. The sink comes first.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter().flatten()
    }

    /// Number of current members, including the sink.
    pub fn module_count(&self) -> usize {
        self.modules.iter().filter(|m| m.is_some()).count()
    }

    /// Renames a module.
    pub fn set_module_name(
        &mut self,
        id: ModuleId,
        name: impl Into<String>,
    ) -> Result<(), GraphError> {
        self.get_mut(id)?.set_name(name.into());
        Ok(())
    }

    // --- Parameters ---

    /// Current constant value of a parameter.
    pub fn param(&self, id: ModuleId, param: &str) -> Result<f32, GraphError> {
        let module = self.get(id)?;
        module
            .param(param)
            .map(|p| p.value())
            .ok_or_else(|| GraphError::no_such_param(module.name(), param))
    }

    /// Sets the constant value of a parameter.
    pub fn set_param(&mut self, id: ModuleId, param: &str, value: f32) -> Result<(), GraphError> {
        let index = self.resolve_param(id, param)?;
        self.get_mut(id)?.set_param_value(index, value);
        Ok(())
    }

    /// Producer bound to a module's main input.
    pub fn main_input(&self, id: ModuleId) -> Result<Option<ModuleId>, GraphError> {
        Ok(self.get(id)?.main_input())
    }

    /// Producer bound to a parameter slot.
    pub fn param_binding(&self, id: ModuleId, param: &str) -> Result<Option<ModuleId>, GraphError> {
        let index = self.resolve_param(id, param)?;
        Ok(self.get(id)?.params()[index].binding())
    }

    // --- Connections ---

    /// Connects the output of `from` to the main input of `to`.
    ///
    /// Returns an error if:
    /// - Either module is not in the graph
    /// - `from` has no output, or `to` has no input
    /// - The channel counts differ
    /// - The main input of `to` is already connected
    pub fn connect(&mut self, from: ModuleId, to: ModuleId) -> Result<(), GraphError> {
        let (sender, receiver) = self.endpoints(from, to)?;

        if receiver.in_channels() == 0 {
            return Err(GraphError::NoInput(receiver.name().to_string()));
        }
        if receiver.in_channels() != sender.out_channels() {
            return Err(GraphError::ChannelMismatch {
                module: receiver.name().to_string(),
                expected: receiver.in_channels(),
                found: sender.out_channels(),
            });
        }
        if receiver.main_input().is_some() {
            return Err(GraphError::slot_occupied(receiver.name(), None));
        }

        self.get_mut(to)?.set_main_input(Some(from));
        tracing::debug!("graph_connect: {from} → {to}");
        Ok(())
    }

    /// Connects the output of `from` to parameter `param` of `to`.
    ///
    /// Only single-channel producers may modulate a parameter.
    pub fn connect_param(
        &mut self,
        from: ModuleId,
        to: ModuleId,
        param: &str,
    ) -> Result<(), GraphError> {
        let (sender, receiver) = self.endpoints(from, to)?;

        if sender.out_channels() != 1 {
            return Err(GraphError::NotMono(sender.name().to_string()));
        }
        let index = receiver
            .param_index(param)
            .ok_or_else(|| GraphError::no_such_param(receiver.name(), param))?;
        if receiver.params()[index].binding().is_some() {
            return Err(GraphError::slot_occupied(receiver.name(), Some(param)));
        }

        self.get_mut(to)?.set_param_binding(index, Some(from));
        tracing::debug!("graph_connect: {from} → {to}.{param}");
        Ok(())
    }

    /// Clears the main input of `to`. Clearing an empty slot is a no-op.
    pub fn disconnect(&mut self, to: ModuleId) -> Result<(), GraphError> {
        let receiver = self.get(to)?;
        if receiver.in_channels() == 0 {
            return Err(GraphError::NoInput(receiver.name().to_string()));
        }
        self.get_mut(to)?.set_main_input(None);
        tracing::debug!("graph_disconnect: {to}");
        Ok(())
    }

    /// Clears parameter slot `param` of `to`. Clearing an empty slot is a no-op.
    pub fn disconnect_param(&mut self, to: ModuleId, param: &str) -> Result<(), GraphError> {
        let index = self.resolve_param(to, param)?;
        self.get_mut(to)?.set_param_binding(index, None);
        tracing::debug!("graph_disconnect: {to}.{param}");
        Ok(())
    }

    // --- Compilation ---

    /// Compiles the graph into a flat, buffer-addressed program.
    ///
    /// Schedules every module reachable from the sink, decides which outputs
    /// must be persisted, assigns state addresses, and emits the initial
    /// values and statement texts. The graph itself is not modified, and an
    /// unmodified graph always compiles to identical text.
    ///
    /// # Errors
    ///
    /// - [`GraphError::UnconnectedInput`] if a scheduled module that needs a
    ///   main input has none
    /// - [`GraphError::Cycle`] if a module reachable from the sink feeds back
    ///   into itself
    pub fn compile(&self) -> Result<CompiledPatch, GraphError> {
        let schedule = Schedule::build(self)?;
        let layout = StateLayout::allocate(self, &schedule)?;
        let patch = emit::emit(self, schedule, layout)?;

        tracing::debug!(
            "graph_compile: '{}' {} modules scheduled, {} buffered, {} state cells",
            self.name,
            patch.schedule().len(),
            patch.layout().buffered_count(),
            patch.state_len()
        );
        Ok(patch)
    }

    /// Compiles the graph and returns the `(values, code)` texts.
    pub fn generate_code(&self) -> Result<(String, String), GraphError> {
        Ok(self.compile()?.into_texts())
    }

    // --- Internal helpers ---

    pub(crate) fn get(&self, id: ModuleId) -> Result<&Module, GraphError> {
        self.module(id).ok_or(GraphError::NotMember(id))
    }

    fn get_mut(&mut self, id: ModuleId) -> Result<&mut Module, GraphError> {
        self.modules
            .get_mut(id.slot())
            .and_then(|m| m.as_mut())
            .ok_or(GraphError::NotMember(id))
    }

    /// Validates membership of both endpoints and that `from` has an output.
    fn endpoints(&self, from: ModuleId, to: ModuleId) -> Result<(&Module, &Module), GraphError> {
        let sender = self.get(from)?;
        let receiver = self.get(to)?;
        if sender.out_channels() == 0 {
            return Err(GraphError::NoOutput(sender.name().to_string()));
        }
        Ok((sender, receiver))
    }

    fn resolve_param(&self, id: ModuleId, param: &str) -> Result<usize, GraphError> {
        let module = self.get(id)?;
        module
            .param_index(param)
            .ok_or_else(|| GraphError::no_such_param(module.name(), param))
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.module_count())
    }
}
