//! Data-structure kinds a template can be instantiated as

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    /// No valid directive was given
    #[default]
    Unknown,
    /// LIFO collection
    Stack,
    /// Binary min-heap
    Heap,
}

impl StructureKind {
    /// Every kind a template can exist for
    pub const ALL: [StructureKind; 2] = [StructureKind::Stack, StructureKind::Heap];

    pub fn name(self) -> &'static str {
        match self {
            StructureKind::Unknown => "Unknown",
            StructureKind::Stack => "Stack",
            StructureKind::Heap => "Heap",
        }
    }

    /// Case-insensitive lookup. `Unknown` is never returned.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// Name of the declaration a template of this kind instantiates
    pub fn structure_placeholder(self) -> String {
        format!("{}Template", self.name())
    }
}

impl std::fmt::Display for StructureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_ignores_case() {
        assert_eq!(StructureKind::from_name("stack"), Some(StructureKind::Stack));
        assert_eq!(StructureKind::from_name("HEAP"), Some(StructureKind::Heap));
        assert_eq!(StructureKind::from_name("Unknown"), None);
        assert_eq!(StructureKind::from_name("queue"), None);
    }

    #[test]
    fn test_structure_placeholder() {
        assert_eq!(StructureKind::Stack.structure_placeholder(), "StackTemplate");
        assert_eq!(StructureKind::Heap.structure_placeholder(), "HeapTemplate");
    }

    #[test]
    fn test_deserialize_lowercase_key() {
        #[derive(Deserialize)]
        struct Doc {
            kind: StructureKind,
        }
        let doc: Doc = toml::from_str("kind = \"heap\"").expect("Should parse");
        assert_eq!(doc.kind, StructureKind::Heap);
    }
}
