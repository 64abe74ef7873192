//! Multi-voice linker for compiled sigflow graphs.
//!
//! Each active voice (or patch) is compiled independently by
//! [`sigflow_core`]. The [`Linker`] joins the per-voice texts into one host
//! script:
//!
//! - the values texts are comma-joined into one array of per-voice state blocks
//! - each code text is wrapped in a prologue that selects the voice's state
//!   array and resets the cursor, and an epilogue that adds the voice's
//!   `l`/`r` registers to the mix accumulators
//!
//! The two combined texts then replace the values and code markers of an
//! externally supplied template. Nothing else in the template is touched.
//!
//! # Example
//!
//! ```rust
//! use sigflow_link::{Linker, LinkError};
//!
//! let template = "values=[\n//!VALUES\n];\nfunction tick(){var ll=0,rr=0,l,r,i,v;\n//!CODE\n}";
//! let linker = Linker::default();
//! let script = linker.link(template, [("[.5]", "l=r=v[i++];\n")])?;
//!
//! assert!(script.contains("values=[\n[.5]\n];"));
//! assert!(script.contains("v=state[0];i=0;\nl=r=v[i++];\nll+=l;rr+=r;\n"));
//! # Ok::<(), LinkError>(())
//! ```

pub mod config;
pub mod error;

use core::ops::Range;

use sigflow_core::{CompiledPatch, Graph};

pub use config::{DEFAULT_CODE_MARKER, DEFAULT_VALUES_MARKER, LinkerConfig};
pub use error::LinkError;

/// Joins compiled voices and splices them into a host template.
#[derive(Debug, Clone, Default)]
pub struct Linker {
    config: LinkerConfig,
}

impl Linker {
    /// Creates a linker with the given configuration.
    pub fn new(config: LinkerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LinkerConfig {
        &self.config
    }

    /// Combines `(values, code)` pairs, one per voice, into the combined
    /// values and code texts.
    pub fn combine<'a, I>(&self, voices: I) -> (String, String)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let LinkerConfig {
            state_name,
            mix_left,
            mix_right,
            ..
        } = &self.config;

        let mut values = Vec::new();
        let mut code = String::new();
        for (c, (voice_values, voice_code)) in voices.into_iter().enumerate() {
            values.push(voice_values);
            code.push_str(&format!("v={state_name}[{c}];i=0;\n"));
            code.push_str(voice_code);
            if !voice_code.is_empty() && !voice_code.ends_with('\n') {
                code.push('\n');
            }
            code.push_str(&format!("{mix_left}+=l;{mix_right}+=r;\n"));
        }
        (values.join(","), code)
    }

    /// Replaces the values and code markers of `template`.
    ///
    /// Both markers are located in the original template before anything is
    /// inserted, so inserted text is never scanned for markers.
    pub fn substitute(&self, template: &str, values: &str, code: &str) -> Result<String, LinkError> {
        let values_at = Self::locate(template, &self.config.values_marker)?;
        let code_at = Self::locate(template, &self.config.code_marker)?;
        if values_at.start < code_at.end && code_at.start < values_at.end {
            return Err(LinkError::MarkerOverlap {
                values: self.config.values_marker.clone(),
                code: self.config.code_marker.clone(),
            });
        }

        let (first, first_text, second, second_text) = if values_at.start < code_at.start {
            (values_at, values, code_at, code)
        } else {
            (code_at, code, values_at, values)
        };

        let mut script = String::with_capacity(template.len() + values.len() + code.len());
        script.push_str(&template[..first.start]);
        script.push_str(first_text);
        script.push_str(&template[first.end..second.start]);
        script.push_str(second_text);
        script.push_str(&template[second.end..]);
        Ok(script)
    }

    /// Combines the voices and splices them into `template`.
    pub fn link<'a, I>(&self, template: &str, voices: I) -> Result<String, LinkError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let (values, code) = self.combine(voices);
        tracing::debug!(
            values_len = values.len(),
            code_len = code.len(),
            "link: substituting template markers"
        );
        self.substitute(template, &values, &code)
    }

    /// Links already compiled patches, one voice each.
    pub fn link_patches(
        &self,
        template: &str,
        patches: &[CompiledPatch],
    ) -> Result<String, LinkError> {
        tracing::debug!("link: {} voices", patches.len());
        self.link(template, patches.iter().map(|p| (p.values(), p.code())))
    }

    /// Compiles every graph and links the results, one voice per graph.
    ///
    /// The first graph that fails to compile aborts linking.
    pub fn link_graphs(&self, template: &str, graphs: &[&Graph]) -> Result<String, LinkError> {
        let patches = graphs
            .iter()
            .map(|g| g.compile())
            .collect::<Result<Vec<_>, _>>()?;
        self.link_patches(template, &patches)
    }

    fn locate(template: &str, marker: &str) -> Result<Range<usize>, LinkError> {
        if marker.is_empty() {
            return Err(LinkError::MissingMarker(String::new()));
        }
        template
            .find(marker)
            .map(|start| start..start + marker.len())
            .ok_or_else(|| LinkError::MissingMarker(marker.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "a\n//!VALUES\nb\n//!CODE\nc";

    #[test]
    fn combine_joins_voices_in_order() {
        let linker = Linker::default();
        let (values, code) = linker.combine([("[1]", "x;\n"), ("[2,3]", "y;")]);
        assert_eq!(values, "[1],[2,3]");
        assert_eq!(
            code,
            "v=state[0];i=0;\nx;\nll+=l;rr+=r;\nv=state[1];i=0;\ny;\nll+=l;rr+=r;\n"
        );
    }

    #[test]
    fn combine_of_no_voices_is_empty() {
        let (values, code) = Linker::default().combine(core::iter::empty());
        assert!(values.is_empty());
        assert!(code.is_empty());
    }

    #[test]
    fn substitute_replaces_both_markers_once() {
        let linker = Linker::default();
        let script = linker.substitute(TEMPLATE, "V", "C").unwrap();
        assert_eq!(script, "a\nV\nb\nC\nc");
    }

    #[test]
    fn substitute_handles_code_marker_first() {
        let linker = Linker::default();
        let script = linker
            .substitute("//!CODE|//!VALUES", "V", "C")
            .unwrap();
        assert_eq!(script, "C|V");
    }

    #[test]
    fn inserted_text_is_not_rescanned() {
        let linker = Linker::default();
        let script = linker.substitute(TEMPLATE, "//!CODE", "//!VALUES").unwrap();
        assert_eq!(script, "a\n//!CODE\nb\n//!VALUES\nc");
    }

    #[test]
    fn missing_marker_is_reported() {
        let linker = Linker::default();
        let result = linker.substitute("no markers here //!VALUES", "V", "C");
        assert!(matches!(result, Err(LinkError::MissingMarker(m)) if m == DEFAULT_CODE_MARKER));
    }

    #[test]
    fn identical_markers_overlap() {
        let linker = Linker::new(LinkerConfig {
            code_marker: DEFAULT_VALUES_MARKER.to_string(),
            ..LinkerConfig::default()
        });
        assert!(matches!(
            linker.substitute(TEMPLATE, "V", "C"),
            Err(LinkError::MarkerOverlap { .. })
        ));
    }

    #[test]
    fn custom_names_reach_prologue() {
        let linker = Linker::new(LinkerConfig {
            state_name: "voices".to_string(),
            mix_left: "outL".to_string(),
            mix_right: "outR".to_string(),
            ..LinkerConfig::default()
        });
        let (_, code) = linker.combine([("[]", "")]);
        assert_eq!(code, "v=voices[0];i=0;\noutL+=l;outR+=r;\n");
    }
}
