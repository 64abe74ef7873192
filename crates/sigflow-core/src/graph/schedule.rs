//! Dependency-ordered scheduling of the modules reachable from the sink.
//!
//! The traversal is a depth-first walk from the sink that visits a module's
//! main-input producer first, then its parameter producers in slot order, and
//! appends each module once all of its producers are placed. A module shared
//! by several consumers is scheduled exactly once, at the point the first
//! path reaches it. Modules that the walk never reaches are left out.
//!
//! The walk keeps an explicit stack instead of recursing, and marks modules
//! that are still on the current path so a feedback loop is reported as
//! [`GraphError::Cycle`] instead of recursing forever.

use std::collections::HashMap;

use crate::error::GraphError;

use super::module::ModuleId;
use super::processing::Graph;

/// Traversal state of a module.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// Entered, producers not yet all placed.
    OnPath,
    /// Placed in the schedule.
    Done,
}

/// A module on the traversal stack and the next producer to visit.
struct Frame {
    id: ModuleId,
    producers: Vec<ModuleId>,
    next: usize,
}

/// Execution order of the modules reachable from the sink.
///
/// Every producer precedes every module that consumes it; the sink is always
/// last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    order: Vec<ModuleId>,
    positions: HashMap<ModuleId, usize>,
}

impl Schedule {
    /// Walks the graph from its sink.
    pub(crate) fn build(graph: &Graph) -> Result<Self, GraphError> {
        let mut marks: HashMap<ModuleId, Mark> = HashMap::new();
        let mut stack: Vec<Frame> = Vec::new();
        let mut order = Vec::new();

        Self::enter(graph, graph.sink(), &mut marks, &mut stack)?;

        while let Some(frame) = stack.last_mut() {
            let Some(&producer) = frame.producers.get(frame.next) else {
                let id = frame.id;
                stack.pop();
                marks.insert(id, Mark::Done);
                order.push(id);
                continue;
            };
            frame.next += 1;

            match marks.get(&producer) {
                Some(Mark::Done) => {}
                Some(Mark::OnPath) => {
                    let name = graph.get(producer)?.name().to_string();
                    tracing::debug!("graph_schedule: cycle through {producer} ({name})");
                    return Err(GraphError::Cycle(name));
                }
                None => Self::enter(graph, producer, &mut marks, &mut stack)?,
            }
        }

        let positions = order.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        Ok(Self { order, positions })
    }

    /// Checks a module's main input and pushes it onto the traversal stack.
    fn enter(
        graph: &Graph,
        id: ModuleId,
        marks: &mut HashMap<ModuleId, Mark>,
        stack: &mut Vec<Frame>,
    ) -> Result<(), GraphError> {
        let module = graph.get(id)?;
        if module.in_channels() > 0 && module.main_input().is_none() {
            return Err(GraphError::UnconnectedInput(module.name().to_string()));
        }
        marks.insert(id, Mark::OnPath);
        stack.push(Frame {
            id,
            producers: module.producers().collect(),
            next: 0,
        });
        Ok(())
    }

    /// Scheduled modules in execution order.
    pub fn order(&self) -> &[ModuleId] {
        &self.order
    }

    /// Position of a module in the schedule, or `None` if it was not reached.
    pub fn position(&self, id: ModuleId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Whether a module was reached from the sink.
    pub fn contains(&self, id: ModuleId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Number of scheduled modules.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Always false for a built schedule (the sink is always scheduled).
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The module scheduled immediately before `id`.
    pub fn predecessor(&self, id: ModuleId) -> Option<ModuleId> {
        let pos = self.position(id)?;
        pos.checked_sub(1).map(|p| self.order[p])
    }
}
