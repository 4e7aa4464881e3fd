//! Patch model - proposed field-level edits to variant content.

use serde::{Deserialize, Serialize};

/// One proposed edit to a single content field of a variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Which kind of field the patch rewrites
    pub kind: PatchKind,

    /// Field path, e.g. `stem`, `explanation`, `difficulty`,
    /// `alternative[2]` or `alternative[2].explanation`. Alternative
    /// indices are zero-based into the display-ordered alternatives.
    pub field: String,

    /// Current value, as seen by the fix generator
    pub original: Option<String>,

    /// Proposed replacement value
    pub proposed: String,

    /// Why the edit is proposed
    pub rationale: Option<String>,

    /// Confidence in this edit, in [0, 1]
    pub confidence: f64,
}

impl Patch {
    /// Alternative index extracted from the field path, when it
    /// addresses one (`alternative[N]...`).
    pub fn alternative_index(&self) -> Option<usize> {
        let start = self.field.find('[')?;
        let end = self.field[start..].find(']')? + start;
        self.field[start + 1..end].parse().ok()
    }
}

/// Content field kinds a patch can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatchKind {
    /// Variant stem text
    #[serde(rename = "stem")]
    Stem,
    /// An alternative's text
    #[serde(rename = "alternative")]
    Alternative,
    /// Global or per-alternative explanation, depending on the field path
    #[serde(rename = "explanation")]
    Explanation,
    /// Difficulty field
    #[serde(rename = "difficulty")]
    Difficulty,
}

impl PatchKind {
    /// Storage/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stem => "stem",
            Self::Alternative => "alternative",
            Self::Explanation => "explanation",
            Self::Difficulty => "difficulty",
        }
    }
}

impl std::fmt::Display for PatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of fix generation for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixProposal {
    /// Proposed edits; may be empty
    pub patches: Vec<Patch>,

    /// Overall confidence across the patch set, in [0, 1]
    pub overall_confidence: f64,

    /// Whether a domain expert must look at the item regardless of gating
    pub requires_expert_review: bool,

    /// Notes for the reviewer, e.g. why generation degraded
    pub review_notes: Option<String>,
}

impl FixProposal {
    /// A degraded proposal that routes the item to a human with a note.
    /// Used when fix generation fails; the item is never silently dropped.
    pub fn expert_review(note: impl Into<String>) -> Self {
        Self {
            patches: Vec::new(),
            overall_confidence: 0.0,
            requires_expert_review: true,
            review_notes: Some(note.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternative_index_parses_plain_and_nested_paths() {
        let mut patch = Patch {
            kind: PatchKind::Alternative,
            field: "alternative[2]".to_string(),
            original: None,
            proposed: "texto corregido".to_string(),
            rationale: None,
            confidence: 0.9,
        };
        assert_eq!(patch.alternative_index(), Some(2));

        patch.field = "alternative[0].explanation".to_string();
        assert_eq!(patch.alternative_index(), Some(0));

        patch.field = "stem".to_string();
        assert_eq!(patch.alternative_index(), None);

        patch.field = "alternative[x]".to_string();
        assert_eq!(patch.alternative_index(), None);
    }
}
