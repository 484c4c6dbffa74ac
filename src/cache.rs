//! Concurrent tree cache.
//!
//! Maps a request fingerprint to a built tree. Lookups of unrelated
//! fingerprints never block each other; builds are serialized through a
//! per-fingerprint build lock so a tree is computed at most once.

use crate::error::TreeError;
use crate::snapshot::{ViewType, VisualizationRequest};
use crate::tree::Tree;
use crate::types::SnapshotId;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a built tree. Read locks for lookups, a write lock for
/// synthetic node injection.
pub type SharedTree = Arc<RwLock<Tree>>;

/// Cache key identifying a unique (root, view, metric pair) request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeFingerprint {
    pub root_snapshot_id: SnapshotId,
    pub view_type: ViewType,
    pub footprint_metric_id: SnapshotId,
    pub height_metric_id: SnapshotId,
}

impl From<&VisualizationRequest> for TreeFingerprint {
    fn from(request: &VisualizationRequest) -> Self {
        TreeFingerprint {
            root_snapshot_id: request.root_snapshot_id,
            view_type: request.view_type,
            footprint_metric_id: request.footprint_metric_id,
            height_metric_id: request.height_metric_id,
        }
    }
}

impl fmt::Display for TreeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.root_snapshot_id, self.view_type, self.footprint_metric_id, self.height_metric_id
        )
    }
}

/// Process-lifetime store of built trees.
///
/// One instance is owned by the tree service; nothing here is global. The
/// build-lock table follows the double-checked get-or-create pattern so two
/// threads racing on a fresh fingerprint agree on one lock.
pub struct TreeCache {
    trees: RwLock<HashMap<TreeFingerprint, SharedTree>>,
    build_locks: RwLock<HashMap<TreeFingerprint, Arc<Mutex<()>>>>,
}

impl TreeCache {
    pub fn new() -> Self {
        TreeCache {
            trees: RwLock::new(HashMap::new()),
            build_locks: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached tree for `key`, building it if absent.
    ///
    /// Concurrent callers for the same fingerprint block on the build lock;
    /// exactly one of them runs `build`, the rest observe the published
    /// result. A failed build publishes nothing, so a later call retries
    /// cleanly.
    pub fn get_or_build<F>(&self, key: &TreeFingerprint, build: F) -> Result<SharedTree, TreeError>
    where
        F: FnOnce() -> Result<Tree, TreeError>,
    {
        if let Some(tree) = self.get(key) {
            return Ok(tree);
        }

        let lock = self.build_lock(key);
        let _guard = lock.lock();

        // Another caller may have finished the build while we waited.
        if let Some(tree) = self.get(key) {
            return Ok(tree);
        }

        let tree = Arc::new(RwLock::new(build()?));
        self.trees.write().insert(key.clone(), tree.clone());
        Ok(tree)
    }

    /// Non-building lookup.
    pub fn get(&self, key: &TreeFingerprint) -> Option<SharedTree> {
        self.trees.read().get(key).cloned()
    }

    pub fn contains(&self, key: &TreeFingerprint) -> bool {
        self.trees.read().contains_key(key)
    }

    /// Evict an entry, forcing recomputation on the next request.
    pub fn remove(&self, key: &TreeFingerprint) {
        self.trees.write().remove(key);
        self.build_locks.write().remove(key);
    }

    pub fn size(&self) -> usize {
        self.trees.read().len()
    }

    /// Cached fingerprints, for diagnostics.
    pub fn keys(&self) -> Vec<TreeFingerprint> {
        self.trees.read().keys().cloned().collect()
    }

    fn build_lock(&self, key: &TreeFingerprint) -> Arc<Mutex<()>> {
        {
            let map = self.build_locks.read();
            if let Some(lock) = map.get(key) {
                return lock.clone();
            }
        }

        let mut map = self.build_locks.write();
        map.entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for TreeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn fingerprint(root: SnapshotId) -> TreeFingerprint {
        TreeFingerprint {
            root_snapshot_id: root,
            view_type: ViewType::City,
            footprint_metric_id: 1,
            height_metric_id: 20,
        }
    }

    #[test]
    fn fingerprint_display_joins_components() {
        assert_eq!(fingerprint(100).to_string(), "100_CITY_1_20");
    }

    #[test]
    fn distinct_fingerprints_do_not_collide() {
        let a = fingerprint(100);
        let mut b = fingerprint(100);
        b.height_metric_id = 21;
        assert_ne!(a, b);
    }

    #[test]
    fn second_call_reuses_cached_tree() {
        let cache = TreeCache::new();
        let key = fingerprint(1);

        let first = cache.get_or_build(&key, || Ok(Tree::new(1))).unwrap();
        let second = cache
            .get_or_build(&key, || panic!("must not rebuild"))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn concurrent_identical_requests_build_once() {
        let cache = Arc::new(TreeCache::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for _ in 0..8 {
            let cache = cache.clone();
            let builds = builds.clone();
            handles.push(thread::spawn(move || {
                cache
                    .get_or_build(&fingerprint(7), || {
                        builds.fetch_add(1, Ordering::SeqCst);
                        Ok(Tree::new(7))
                    })
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn failed_build_leaves_no_entry_and_retries() {
        let cache = TreeCache::new();
        let key = fingerprint(3);

        let result = cache.get_or_build(&key, || {
            Err(TreeError::BuildFailure(anyhow::anyhow!("source down")))
        });
        assert!(result.is_err());
        assert!(!cache.contains(&key));

        cache.get_or_build(&key, || Ok(Tree::new(3))).unwrap();
        assert!(cache.contains(&key));
    }

    #[test]
    fn remove_evicts_entry() {
        let cache = TreeCache::new();
        let key = fingerprint(5);
        cache.get_or_build(&key, || Ok(Tree::new(5))).unwrap();

        cache.remove(&key);

        assert!(!cache.contains(&key));
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn unrelated_fingerprints_are_independent() {
        let cache = TreeCache::new();
        cache
            .get_or_build(&fingerprint(1), || Ok(Tree::new(1)))
            .unwrap();
        cache
            .get_or_build(&fingerprint(2), || Ok(Tree::new(2)))
            .unwrap();

        assert_eq!(cache.size(), 2);
        let mut roots: Vec<SnapshotId> =
            cache.keys().iter().map(|k| k.root_snapshot_id).collect();
        roots.sort_unstable();
        assert_eq!(roots, vec![1, 2]);
    }
}
