use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use crate::corpus::loader::{build_corpus, CorpusError, CorpusSource};
use crate::corpus::{CorpusInfo, ReferenceCorpus};

/// Publishes the current corpus snapshot.
///
/// Readers take a cheap `Arc` clone with `snapshot()`; `reload()` builds a
/// complete replacement before swapping it in, so a reader never sees a
/// partially built corpus and keeps its own snapshot until it drops it.
pub struct CorpusStore {
    source: CorpusSource,
    current: RwLock<Arc<ReferenceCorpus>>,
    generation: AtomicU64,
    reload_lock: Mutex<()>,
}

impl CorpusStore {
    /// Load the initial snapshot (generation 1) from a source
    pub fn open(source: CorpusSource) -> Result<Self, CorpusError> {
        let corpus = build_corpus(source.read()?, 1)?;
        tracing::info!(
            "Opened corpus {} from {} source",
            corpus.version(),
            source.describe()
        );

        Ok(Self {
            source,
            current: RwLock::new(Arc::new(corpus)),
            generation: AtomicU64::new(1),
            reload_lock: Mutex::new(()),
        })
    }

    /// Store over the binary's embedded corpus
    pub fn embedded() -> Result<Self, CorpusError> {
        Self::open(CorpusSource::Embedded)
    }

    pub fn snapshot(&self) -> Arc<ReferenceCorpus> {
        Arc::clone(&self.current.read())
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn info(&self) -> CorpusInfo {
        self.snapshot().info()
    }

    /// Rebuild from the source and publish the new snapshot.
    ///
    /// On failure the previous snapshot stays published. Concurrent reloads
    /// are serialized; each successful one bumps the generation.
    pub fn reload(&self) -> Result<CorpusInfo, CorpusError> {
        let _guard = self.reload_lock.lock();
        let next_generation = self.generation.load(Ordering::SeqCst) + 1;

        let corpus = match self.source.read().and_then(|parts| build_corpus(parts, next_generation)) {
            Ok(corpus) => corpus,
            Err(e) => {
                tracing::error!("Corpus reload failed, keeping generation {}: {}", next_generation - 1, e);
                return Err(e);
            }
        };

        let info = corpus.info();
        *self.current.write() = Arc::new(corpus);
        self.generation.store(next_generation, Ordering::SeqCst);

        tracing::info!("Published corpus {} as generation {}", info.version, info.generation);
        Ok(info)
    }
}

impl std::fmt::Debug for CorpusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusStore")
            .field("source", &self.source.describe())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn copy_embedded_to(dir: &Path) {
        for name in [
            "manifest.json",
            "indications.json",
            "biomarkers.json",
            "procedures.json",
            "pharma_competitors.json",
            "device_competitors.json",
            "diagnostic_competitors.json",
            "partners.json",
            "pricing.json",
        ] {
            let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(name);
            std::fs::copy(source, dir.join(name)).unwrap();
        }
    }

    #[test]
    fn test_reload_bumps_generation() {
        let store = CorpusStore::embedded().unwrap();
        assert_eq!(store.generation(), 1);

        let before = store.snapshot();
        let info = store.reload().unwrap();
        assert_eq!(info.generation, 2);
        assert_eq!(store.generation(), 2);

        // Old readers keep their snapshot
        assert_eq!(before.generation(), 1);
        assert_eq!(store.snapshot().generation(), 2);
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        copy_embedded_to(dir.path());

        let store = CorpusStore::open(CorpusSource::Directory(dir.path().to_path_buf())).unwrap();
        let indications = store.snapshot().indications().len();

        std::fs::write(dir.path().join("indications.json"), "[{ not json").unwrap();
        let result = store.reload();
        assert!(matches!(result, Err(CorpusError::Parse { .. })));
        assert_eq!(store.generation(), 1);
        assert_eq!(store.snapshot().indications().len(), indications);
    }

    #[test]
    fn test_reload_picks_up_new_data() {
        let dir = tempfile::tempdir().unwrap();
        copy_embedded_to(dir.path());
        let store = CorpusStore::open(CorpusSource::Directory(dir.path().to_path_buf())).unwrap();

        let manifest = r#"{"version": "test-2", "as_of_year": 2025}"#;
        std::fs::write(dir.path().join("manifest.json"), manifest).unwrap();

        let info = store.reload().unwrap();
        assert_eq!(info.version, "test-2");
        assert_eq!(store.snapshot().manifest().as_of_year, 2025);
    }
}
