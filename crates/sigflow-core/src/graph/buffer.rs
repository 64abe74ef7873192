//! Flat state-array allocation for a compiled schedule.
//!
//! Every scheduled module gets one contiguous range of cells in the per-voice
//! state array, laid out as:
//!
//! ```text
//! [ param 0 .. param n-1 | workspace 0 .. workspace w-1 | out L (, out R) ]
//!   ^ pos                                                 ^ only if out_buffer
//! ```
//!
//! Ranges are assigned by prefix sum over the schedule, so the end of one
//! module's range is the start of the next.
//!
//! A module's output normally travels to its consumer in the transient `l`/`r`
//! registers, which only works when that consumer runs immediately after it.
//! If any consumer (main input or parameter) is scheduled later than that,
//! the output is also written to trailing output cells and read back there.

use crate::error::GraphError;

use super::module::ModuleId;
use super::processing::Graph;
use super::schedule::Schedule;

/// Address range of one scheduled module in the state array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLayout {
    /// The module this range belongs to.
    pub module: ModuleId,
    /// First cell of the range.
    pub pos: usize,
    /// Number of parameter cells.
    pub param_count: usize,
    /// Number of workspace cells.
    pub workspace_size: usize,
    /// Output channel count of the module.
    pub out_channels: u8,
    /// Whether the output is persisted to trailing output cells.
    pub out_buffer: bool,
}

impl NodeLayout {
    /// Total number of cells in the range.
    #[inline]
    pub fn count(&self) -> usize {
        let outputs = if self.out_buffer {
            self.out_channels as usize
        } else {
            0
        };
        self.param_count + self.workspace_size + outputs
    }

    /// One past the last cell of the range.
    #[inline]
    pub fn end(&self) -> usize {
        self.pos + self.count()
    }

    /// Absolute address of parameter cell `index`.
    #[inline]
    pub fn param_cell(&self, index: usize) -> usize {
        self.pos + index
    }

    /// Absolute address of the first workspace cell.
    #[inline]
    pub fn workspace_cell(&self) -> usize {
        self.pos + self.param_count
    }

    /// Absolute address of the first output cell, if the output is buffered.
    #[inline]
    pub fn output_cell(&self) -> Option<usize> {
        self.out_buffer
            .then(|| self.pos + self.param_count + self.workspace_size)
    }
}

/// State-array layout of a whole schedule.
///
/// `nodes()[k]` describes the `k`-th scheduled module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    nodes: Vec<NodeLayout>,
    len: usize,
}

impl StateLayout {
    /// Marks buffered outputs and assigns address ranges in schedule order.
    pub(crate) fn allocate(graph: &Graph, schedule: &Schedule) -> Result<Self, GraphError> {
        let order = schedule.order();
        let mut out_buffer = vec![false; order.len()];

        for (consumer_pos, &id) in order.iter().enumerate() {
            for producer in graph.get(id)?.producers() {
                if let Some(producer_pos) = schedule.position(producer)
                    && producer_pos + 1 != consumer_pos
                {
                    out_buffer[producer_pos] = true;
                }
            }
        }

        let mut nodes = Vec::with_capacity(order.len());
        let mut len = 0;
        for (k, &id) in order.iter().enumerate() {
            let definition = graph.get(id)?.definition();
            let node = NodeLayout {
                module: id,
                pos: len,
                param_count: definition.param_count(),
                workspace_size: definition.workspace_size,
                out_channels: definition.out_channels,
                out_buffer: out_buffer[k],
            };
            tracing::trace!(
                "  layout[{k}]: {id} at {}..{} (buffered={})",
                node.pos,
                node.end(),
                node.out_buffer
            );
            len = node.end();
            nodes.push(node);
        }

        Ok(Self { nodes, len })
    }

    /// Per-module ranges in schedule order.
    pub fn nodes(&self) -> &[NodeLayout] {
        &self.nodes
    }

    /// Range of a scheduled module.
    pub fn get(&self, id: ModuleId) -> Option<&NodeLayout> {
        self.nodes.iter().find(|n| n.module == id)
    }

    /// Total number of state cells.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the state array is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of modules whose output is persisted.
    pub fn buffered_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.out_buffer).count()
    }
}
