//! Script emission for a scheduled, allocated graph.
//!
//! The generated statements run once per sample against a host-provided
//! environment:
//!
//! - `v` — the voice's flat state array
//! - `i` — a cursor into `v`, equal to the current module's `pos` on entry
//! - `l`, `r` — transient left/right signal registers
//!
//! # Fragment contract
//!
//! A module's code fragment is emitted verbatim. It reads its input from
//! `l`/`r`, leaves its output in `l`/`r`, and consumes exactly its parameter
//! and workspace cells through the cursor (typically with `v[i++]`). Output
//! persistence then advances `i` over the output cells, so on exit the cursor
//! sits at the start of the next module's range.
//!
//! All addresses in the emitted text are offsets from `i`, never absolute.

use crate::error::GraphError;

use super::buffer::{NodeLayout, StateLayout};
use super::module::Module;
use super::processing::Graph;
use super::schedule::Schedule;

/// A compiled graph: schedule, state layout, and the two script texts.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPatch {
    schedule: Schedule,
    layout: StateLayout,
    values: String,
    code: String,
}

impl CompiledPatch {
    /// Execution order of the scheduled modules.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// State-array layout.
    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    /// Number of cells in the voice's state array.
    pub fn state_len(&self) -> usize {
        self.layout.len()
    }

    /// Initial state array as an array literal, e.g. `[.01,0,.5]`.
    pub fn values(&self) -> &str {
        &self.values
    }

    /// Per-sample statement text.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Consumes the patch, returning `(values, code)`.
    pub fn into_texts(self) -> (String, String) {
        (self.values, self.code)
    }
}

/// Emits values and code for every scheduled module.
pub(crate) fn emit(
    graph: &Graph,
    schedule: Schedule,
    layout: StateLayout,
) -> Result<CompiledPatch, GraphError> {
    let mut literals: Vec<String> = Vec::with_capacity(layout.len());
    let mut code = String::new();

    for (k, node) in layout.nodes().iter().enumerate() {
        let module = graph.get(node.module)?;
        push_values(&mut literals, module, node, k, &schedule);
        emit_input(&mut code, module, node, &schedule, &layout);

        let fragment = &module.definition().code;
        if !fragment.is_empty() {
            code.push_str(fragment);
            if !fragment.ends_with('\n') {
                code.push('\n');
            }
        }

        if node.out_buffer {
            code.push_str("v[i++]=l;\n");
            if node.out_channels == 2 {
                code.push_str("v[i++]=r;\n");
            }
        }

        emit_fan_out(&mut code, graph, node, &layout)?;
    }

    debug_assert_eq!(literals.len(), layout.len());
    let values = format!("[{}]", literals.join(","));
    Ok(CompiledPatch {
        schedule,
        layout,
        values,
        code,
    })
}

/// Initial cells of one module: params, then zeroed workspace and outputs.
fn push_values(
    literals: &mut Vec<String>,
    module: &Module,
    node: &NodeLayout,
    k: usize,
    schedule: &Schedule,
) {
    for param in module.params() {
        let literal = match param.binding() {
            None => format_literal(param.value()),
            // Written at runtime before this module reads it.
            Some(producer) if schedule.position(producer).is_some_and(|p| p > k) => {
                String::new()
            }
            Some(_) => "0".to_string(),
        };
        literals.push(literal);
    }
    let zeros = node.count() - node.param_count;
    literals.extend(core::iter::repeat_n("0".to_string(), zeros));
}

/// Reads the main input back from the state array unless the producer ran
/// immediately before and its output is still in the registers.
fn emit_input(
    code: &mut String,
    module: &Module,
    node: &NodeLayout,
    schedule: &Schedule,
    layout: &StateLayout,
) {
    let Some(producer) = module.main_input() else {
        return;
    };
    if schedule.predecessor(node.module) == Some(producer) {
        return;
    }
    let source = layout.get(producer).and_then(NodeLayout::output_cell);
    debug_assert!(source.is_some(), "non-adjacent producer must be buffered");
    if let Some(cell) = source {
        let offset = relative(cell, node.pos);
        code.push_str(&format!("l=v[{}];\n", cursor_expr(offset)));
        if module.in_channels() == 2 {
            code.push_str(&format!("r=v[{}];\n", cursor_expr(offset + 1)));
        }
    }
}

/// Writes `l` into every parameter cell this module modulates.
///
/// Runs after output persistence, so `i` is at the end of the module's range.
fn emit_fan_out(
    code: &mut String,
    graph: &Graph,
    node: &NodeLayout,
    layout: &StateLayout,
) -> Result<(), GraphError> {
    for target in layout.nodes() {
        if target.module == node.module {
            continue;
        }
        let consumer = graph.get(target.module)?;
        for (index, param) in consumer.params().iter().enumerate() {
            if param.binding() == Some(node.module) {
                let offset = relative(target.param_cell(index), node.end());
                code.push_str(&format!("v[{}]=l;\n", cursor_expr(offset)));
            }
        }
    }
    Ok(())
}

fn relative(cell: usize, base: usize) -> isize {
    cell as isize - base as isize
}

/// `i`, `i+3`, or `i-5`.
fn cursor_expr(offset: isize) -> String {
    match offset {
        0 => "i".to_string(),
        o if o > 0 => format!("i+{o}"),
        o => format!("i{o}"),
    }
}

/// Formats a parameter value as a compact, locale-independent script literal.
///
/// A leading `0` before the decimal point is dropped (`0.5` → `.5`).
/// Non-finite values map to the script's `NaN` and `Infinity` globals.
pub fn format_literal(value: f32) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let text = value.to_string();
    match text.strip_prefix("0.") {
        Some(fraction) => format!(".{fraction}"),
        None => text,
    }
}
