//! Module instances and their input slots.
//!
//! A [`Module`] is one instantiation of a [`ModuleDefinition`] inside a graph.
//! It owns its parameter values and the bindings of its two slot roles: the
//! main input, and one modulation slot per parameter. Bindings are
//! [`ModuleId`] handles into the owning graph's arena, never owning references.

use core::fmt;
use std::sync::Arc;

use crate::catalog::ModuleDefinition;

/// Unique identifier for a module in a graph.
///
/// Module IDs are assigned sequentially and never reused within a graph
/// instance, so a handle to a removed module can never alias a new one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) u32);

impl ModuleId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }

    /// Arena slot of this module.
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({})", self.0)
    }
}

/// One named parameter of a module: its constant value and optional modulator.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSlot {
    name: String,
    value: f32,
    binding: Option<ModuleId>,
}

impl ParamSlot {
    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constant value, used when no modulator is bound.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// The module driving this parameter, if any.
    pub fn binding(&self) -> Option<ModuleId> {
        self.binding
    }
}

/// An instance of a [`ModuleDefinition`] inside a graph.
#[derive(Debug, Clone)]
pub struct Module {
    id: ModuleId,
    definition: Arc<ModuleDefinition>,
    name: String,
    main_input: Option<ModuleId>,
    params: Vec<ParamSlot>,
}

impl Module {
    /// Creates an unconnected module with default parameter values.
    pub(crate) fn new(id: ModuleId, definition: Arc<ModuleDefinition>) -> Self {
        let params = definition
            .param_names
            .iter()
            .enumerate()
            .map(|(i, name)| ParamSlot {
                name: name.clone(),
                value: definition.default_value(i),
                binding: None,
            })
            .collect();
        Self {
            id,
            name: definition.display_name().to_string(),
            definition,
            main_input: None,
            params,
        }
    }

    /// This module's handle.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// The definition this module instantiates.
    pub fn definition(&self) -> &ModuleDefinition {
        &self.definition
    }

    /// Display name, used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Main input channel count.
    #[inline]
    pub fn in_channels(&self) -> u8 {
        self.definition.in_channels
    }

    /// Output channel count.
    #[inline]
    pub fn out_channels(&self) -> u8 {
        self.definition.out_channels
    }

    /// Producer bound to the main input.
    pub fn main_input(&self) -> Option<ModuleId> {
        self.main_input
    }

    /// Parameter slots in definition order.
    pub fn params(&self) -> &[ParamSlot] {
        &self.params
    }

    /// Looks up a parameter slot by name.
    pub fn param(&self, name: &str) -> Option<&ParamSlot> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Producers in slot order: main input first, then parameters ascending.
    pub fn producers(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.main_input
            .into_iter()
            .chain(self.params.iter().filter_map(|p| p.binding))
    }

    /// Whether any slot is bound to `producer`.
    pub fn is_fed_by(&self, producer: ModuleId) -> bool {
        self.producers().any(|p| p == producer)
    }

    pub(crate) fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_param_value(&mut self, index: usize, value: f32) {
        self.params[index].value = value;
    }

    pub(crate) fn set_main_input(&mut self, producer: Option<ModuleId>) {
        self.main_input = producer;
    }

    pub(crate) fn set_param_binding(&mut self, index: usize, producer: Option<ModuleId>) {
        self.params[index].binding = producer;
    }

    /// Clears every slot bound to `target`. Returns how many were cleared.
    pub(crate) fn clear_references_to(&mut self, target: ModuleId) -> usize {
        let mut cleared = 0;
        if self.main_input == Some(target) {
            self.main_input = None;
            cleared += 1;
        }
        for param in &mut self.params {
            if param.binding == Some(target) {
                param.binding = None;
                cleared += 1;
            }
        }
        cleared
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.definition.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saw() -> Arc<ModuleDefinition> {
        Arc::new(
            ModuleDefinition::new("Oscillator/Sawtooth", 0, 1)
                .with_param("freq", 0.01)
                .with_param("amp", 1.0)
                .with_workspace(1),
        )
    }

    #[test]
    fn new_module_uses_defaults_and_display_name() {
        let module = Module::new(ModuleId(3), saw());
        assert_eq!(module.name(), "Sawtooth");
        assert_eq!(module.params().len(), 2);
        assert_eq!(module.param("freq").unwrap().value(), 0.01);
        assert!(module.producers().next().is_none());
        assert_eq!(module.to_string(), "Sawtooth: Oscillator/Sawtooth");
    }

    #[test]
    fn producers_are_in_slot_order() {
        let mut module = Module::new(ModuleId(0), saw());
        module.set_param_binding(1, Some(ModuleId(9)));
        module.set_param_binding(0, Some(ModuleId(4)));
        module.set_main_input(Some(ModuleId(2)));

        let producers: Vec<_> = module.producers().collect();
        assert_eq!(producers, vec![ModuleId(2), ModuleId(4), ModuleId(9)]);
    }

    #[test]
    fn clear_references_counts_every_slot() {
        let mut module = Module::new(ModuleId(0), saw());
        module.set_main_input(Some(ModuleId(5)));
        module.set_param_binding(0, Some(ModuleId(5)));
        module.set_param_binding(1, Some(ModuleId(6)));

        assert_eq!(module.clear_references_to(ModuleId(5)), 2);
        assert!(!module.is_fed_by(ModuleId(5)));
        assert!(module.is_fed_by(ModuleId(6)));
    }
}
