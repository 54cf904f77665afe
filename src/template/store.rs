//! Template store for caching template sources per data-structure kind

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::TemplateConfig;
use crate::kind::StructureKind;

/// Where the bytes of a template came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOrigin {
    /// Read from disk
    File(PathBuf),
    /// The file could not be used and the stub declaration stands in for it
    Fallback { path: PathBuf, reason: String },
    /// Supplied in memory
    Inline,
}

/// Why a template file could not be used
#[derive(Debug, Error)]
enum ReadFailure {
    #[error("cannot open file: {0}")]
    Open(std::io::Error),
    #[error("cannot read file metadata: {0}")]
    Metadata(std::io::Error),
    #[error("read failed: {0}")]
    Read(std::io::Error),
    #[error("file is empty")]
    Empty,
    #[error("short read ({read} of {expected} bytes)")]
    Short { read: usize, expected: u64 },
    #[error("file is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

#[derive(Debug, Clone)]
struct Entry {
    bytes: Vec<u8>,
    origin: TemplateOrigin,
}

/// A caller's own copy of a template
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCopy {
    pub kind: StructureKind,
    pub bytes: Vec<u8>,
    pub origin: TemplateOrigin,
}

impl TemplateCopy {
    /// Whether the copy is the stub that replaced an unusable file
    pub fn is_degraded(&self) -> bool {
        matches!(self.origin, TemplateOrigin::Fallback { .. })
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// Template sources indexed by kind. Populated once, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    entries: BTreeMap<StructureKind, Entry>,
}

impl TemplateStore {
    /// A store with no templates
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read every configured template from disk. A file that cannot be used
    /// is replaced by the stub declaration for its kind; the remaining kinds
    /// are still loaded.
    pub fn load_from(config: &TemplateConfig) -> Self {
        let mut entries = BTreeMap::new();
        for kind in StructureKind::ALL {
            let Some(path) = config.path_for(kind) else {
                continue;
            };
            info!(%kind, path = %path.display(), "loading template");
            let entry = match read_template(&path) {
                Ok(bytes) => Entry {
                    bytes,
                    origin: TemplateOrigin::File(path),
                },
                Err(failure) => {
                    warn!(
                        %kind,
                        path = %path.display(),
                        reason = %failure,
                        "template unusable, falling back to stub"
                    );
                    Entry {
                        bytes: fallback_stub(kind).into_bytes(),
                        origin: TemplateOrigin::Fallback {
                            path,
                            reason: failure.to_string(),
                        },
                    }
                }
            };
            entries.insert(kind, entry);
        }
        Self { entries }
    }

    /// Build a store from in-memory sources
    pub fn from_sources<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = (StructureKind, S)>,
        S: Into<String>,
    {
        let entries = sources
            .into_iter()
            .filter(|(kind, _)| *kind != StructureKind::Unknown)
            .map(|(kind, text)| {
                let entry = Entry {
                    bytes: text.into().into_bytes(),
                    origin: TemplateOrigin::Inline,
                };
                (kind, entry)
            })
            .collect();
        Self { entries }
    }

    /// An independent copy of the template for `kind`. `None` for `Unknown`
    /// and for kinds with nothing loaded.
    pub fn load(&self, kind: StructureKind) -> Option<TemplateCopy> {
        let entry = self.entries.get(&kind)?;
        Some(TemplateCopy {
            kind,
            bytes: entry.bytes.clone(),
            origin: entry.origin.clone(),
        })
    }

    pub fn origin(&self, kind: StructureKind) -> Option<&TemplateOrigin> {
        self.entries.get(&kind).map(|entry| &entry.origin)
    }

    /// Kinds with a loaded template
    pub fn kinds(&self) -> impl Iterator<Item = StructureKind> + '_ {
        self.entries.keys().copied()
    }

    /// Replace every entry with a fresh read of `config`
    pub fn reload(&mut self, config: &TemplateConfig) {
        *self = Self::load_from(config);
    }
}

/// Source standing in for a template that could not be read: a single
/// declaration named after the kind's placeholder
pub fn fallback_stub(kind: StructureKind) -> String {
    format!("pub struct {};\n", kind.structure_placeholder())
}

fn read_template(path: &Path) -> Result<Vec<u8>, ReadFailure> {
    let mut file = File::open(path).map_err(ReadFailure::Open)?;
    let expected = file.metadata().map_err(ReadFailure::Metadata)?.len();
    let mut bytes = Vec::with_capacity(expected as usize);
    file.read_to_end(&mut bytes).map_err(ReadFailure::Read)?;
    if bytes.is_empty() {
        return Err(ReadFailure::Empty);
    }
    if (bytes.len() as u64) < expected {
        return Err(ReadFailure::Short {
            read: bytes.len(),
            expected,
        });
    }
    std::str::from_utf8(&bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(dir: &Path) -> TemplateConfig {
        TemplateConfig {
            dir: dir.to_path_buf(),
            paths: [
                (StructureKind::Stack, PathBuf::from("stack.rs")),
                (StructureKind::Heap, PathBuf::from("heap.rs")),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("stack.rs"), "pub struct StackTemplate;\n").expect("write");
        std::fs::write(dir.path().join("heap.rs"), "pub struct HeapTemplate;\n").expect("write");

        let store = TemplateStore::load_from(&config_for(dir.path()));
        let copy = store.load(StructureKind::Stack).expect("stack loaded");
        assert_eq!(copy.text(), "pub struct StackTemplate;\n");
        assert!(!copy.is_degraded());
        assert_eq!(
            store.origin(StructureKind::Stack),
            Some(&TemplateOrigin::File(dir.path().join("stack.rs")))
        );
    }

    #[test]
    fn test_missing_file_falls_back_per_kind() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("stack.rs"), "pub struct StackTemplate;\n").expect("write");

        let store = TemplateStore::load_from(&config_for(dir.path()));
        assert!(!store.load(StructureKind::Stack).expect("stack").is_degraded());

        let heap = store.load(StructureKind::Heap).expect("heap falls back");
        assert!(heap.is_degraded());
        assert_eq!(heap.text(), "pub struct HeapTemplate;\n");
        assert!(matches!(
            store.origin(StructureKind::Heap),
            Some(TemplateOrigin::Fallback { reason, .. }) if reason.starts_with("cannot open")
        ));
    }

    #[test]
    fn test_empty_and_binary_files_fall_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("stack.rs"), "").expect("write");
        std::fs::write(dir.path().join("heap.rs"), [0xff, 0xfe, 0x00]).expect("write");

        let store = TemplateStore::load_from(&config_for(dir.path()));
        assert!(matches!(
            store.origin(StructureKind::Stack),
            Some(TemplateOrigin::Fallback { reason, .. }) if reason == "file is empty"
        ));
        assert!(store.load(StructureKind::Heap).expect("heap").is_degraded());
    }

    #[test]
    fn test_unconfigured_and_unknown_kinds_are_empty() {
        let config = TemplateConfig {
            dir: PathBuf::from("."),
            paths: BTreeMap::new(),
        };
        let store = TemplateStore::load_from(&config);
        assert_eq!(store.kinds().count(), 0);
        assert!(store.load(StructureKind::Stack).is_none());
        assert!(store.load(StructureKind::Unknown).is_none());
    }

    #[test]
    fn test_copies_are_independent() {
        let store = TemplateStore::from_sources([(StructureKind::Stack, "pub struct StackTemplate;")]);
        let mut first = store.load(StructureKind::Stack).expect("loaded");
        let second = store.load(StructureKind::Stack).expect("loaded");
        assert_eq!(first, second);

        first.bytes.clear();
        assert_ne!(first, second);
        assert_eq!(
            store.load(StructureKind::Stack).expect("loaded").bytes,
            second.bytes
        );
    }

    #[test]
    fn test_from_sources_skips_unknown() {
        let store = TemplateStore::from_sources([
            (StructureKind::Unknown, "x"),
            (StructureKind::Heap, "pub struct HeapTemplate;"),
        ]);
        assert_eq!(store.kinds().collect::<Vec<_>>(), vec![StructureKind::Heap]);
        assert_eq!(store.origin(StructureKind::Heap), Some(&TemplateOrigin::Inline));
    }

    #[test]
    fn test_reload_picks_up_new_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_for(dir.path());
        let mut store = TemplateStore::load_from(&config);
        assert!(store.load(StructureKind::Stack).expect("stub").is_degraded());

        std::fs::write(dir.path().join("stack.rs"), "pub struct StackTemplate(Vec<Element>);\n")
            .expect("write");
        store.reload(&config);
        assert!(!store.load(StructureKind::Stack).expect("file").is_degraded());
    }

    #[test]
    fn test_store_is_shareable() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<TemplateStore>();
    }
}
