//! Project state store
//!
//! Owns one project's WBS tree and phase sequence and mirrors them to a
//! [`BlobStore`]. Every mutation goes through this type so that persistence
//! happens in one place.
//!
//! The tree is held as `Arc<WbsTree>`. Edits are applied to a copy, which is
//! saved (when autosaving) and only then swapped in. A failed save leaves the
//! store as it was, and a reader holding an earlier
//! [`tree_handle`](ProjectStateStore::tree_handle) keeps seeing the collection
//! as it was.

use crate::config::WorkspaceConfig;
use crate::error::{CoreError, Result};
use pm_model::{
    Methodology, NewNode, NewPhase, NodeId, NodePatch, Phase, PhaseId, PhasePatch, WbsCode,
    WbsNode,
};
use pm_phase::{InsertPosition, PhaseSequencer};
use pm_store::{validate_key, BlobStore, Fingerprint, ProjectSnapshot};
use pm_wbs::{MoveOutcome, RepairReport, WbsTree};
use std::fmt;
use std::sync::Arc;

/// One project's tree and phases, bound to a blob store
pub struct ProjectStateStore {
    project_key: String,
    tree: Arc<WbsTree>,
    phases: PhaseSequencer,
    blobs: Box<dyn BlobStore>,
    autosave: bool,
    pretty_json: bool,
    /// Fingerprint of the blob as last read or written by this instance
    observed: Option<Fingerprint>,
}

impl fmt::Debug for ProjectStateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectStateStore")
            .field("project_key", &self.project_key)
            .field("nodes", &self.tree.len())
            .field("phases", &self.phases.len())
            .field("blobs", &self.blobs)
            .field("autosave", &self.autosave)
            .field("observed", &self.observed.map(|fp| fp.short()))
            .finish()
    }
}

impl ProjectStateStore {
    /// Fresh, unsaved project
    ///
    /// # Errors
    /// Returns a store error if `project_key` is not a valid blob key
    pub fn new(
        blobs: Box<dyn BlobStore>,
        project_key: impl Into<String>,
        methodology: Methodology,
    ) -> Result<Self> {
        let project_key = project_key.into();
        validate_key(&project_key)?;
        Ok(Self {
            project_key,
            tree: Arc::new(WbsTree::new()),
            phases: PhaseSequencer::for_methodology(methodology),
            blobs,
            autosave: true,
            pretty_json: true,
            observed: None,
        })
    }

    /// Load `project_key` from `blobs`, or start a fresh project with `methodology`
    ///
    /// Loaded trees are repaired if their structural fields disagree.
    ///
    /// # Errors
    /// Returns a store error if the key is invalid or the blob is unreadable
    pub fn load(
        blobs: Box<dyn BlobStore>,
        project_key: impl Into<String>,
        methodology: Methodology,
    ) -> Result<Self> {
        let mut store = Self::new(blobs, project_key, methodology)?;

        let Some(bytes) = store.blobs.get(&store.project_key)? else {
            tracing::info!("Starting new {} project {}", methodology, store.project_key);
            return Ok(store);
        };

        let snapshot = ProjectSnapshot::from_bytes(&bytes)?;
        let mut tree = WbsTree::from_nodes(snapshot.nodes);
        tree.repair();

        store.tree = Arc::new(tree);
        store.phases = PhaseSequencer::new(
            snapshot.methodology.base_phases(),
            snapshot.custom_phases,
        );
        store.observed = Some(Fingerprint::of(&bytes));

        tracing::info!(
            "Loaded project {} ({} nodes, {} custom phases, saved {})",
            store.project_key,
            store.tree.len(),
            store.phases.custom_phases().len(),
            snapshot.saved_at
        );
        Ok(store)
    }

    /// Open the project named by `config` in its file-backed store
    ///
    /// # Errors
    /// Returns a store error if the directory or snapshot cannot be read
    pub fn open(config: &WorkspaceConfig) -> Result<Self> {
        let blobs = config.open_blob_store()?;
        let store = Self::load(Box::new(blobs), &config.project_key, config.methodology)?
            .with_autosave(config.autosave)
            .with_pretty_json(config.pretty_json);
        Ok(store)
    }

    /// With autosave after each mutation
    #[inline]
    #[must_use]
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// With indented snapshot JSON
    #[inline]
    #[must_use]
    pub fn with_pretty_json(mut self, pretty: bool) -> Self {
        self.pretty_json = pretty;
        self
    }

    /// Project key
    #[inline]
    #[must_use]
    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    /// Methodology of the base phases
    #[inline]
    #[must_use]
    pub fn methodology(&self) -> Methodology {
        self.phases.methodology()
    }

    /// Current tree
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &WbsTree {
        &self.tree
    }

    /// Shared handle to the current tree, unaffected by later edits
    #[inline]
    #[must_use]
    pub fn tree_handle(&self) -> Arc<WbsTree> {
        Arc::clone(&self.tree)
    }

    /// Current phases
    #[inline]
    #[must_use]
    pub fn phases(&self) -> &PhaseSequencer {
        &self.phases
    }

    /// Check if this project has been read from or written to the blob store
    #[inline]
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.observed.is_some()
    }

    /// Fingerprint of the blob last read or written
    #[inline]
    #[must_use]
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.observed
    }

    // ---------------------------------------------------------------------
    // Work packages
    // ---------------------------------------------------------------------

    /// Lookup a node by its code
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownCode`] if no node carries `code`
    pub fn node_by_code(&self, code: &WbsCode) -> Result<&WbsNode> {
        self.tree
            .find_by_code(code)
            .ok_or_else(|| CoreError::UnknownCode(code.clone()))
    }

    /// Parse a user-supplied code and resolve it to a node id
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidCode`] for malformed input or
    /// [`CoreError::UnknownCode`] if nothing matches
    pub fn resolve_code(&self, raw: &str) -> Result<NodeId> {
        let code = WbsCode::parse_strict(raw)?;
        Ok(self.node_by_code(&code)?.id)
    }

    /// Add a work package under `parent_id` (root if `None` or unknown)
    ///
    /// # Errors
    /// Returns a store error if autosave fails; the tree is then unchanged
    pub fn add_node(&mut self, data: NewNode, parent_id: Option<NodeId>) -> Result<NodeId> {
        let mut tree = Arc::clone(&self.tree);
        let id = Arc::make_mut(&mut tree).add_node(data, parent_id);
        self.commit_tree(tree)?;
        if let Some(node) = self.tree.get(id) {
            tracing::info!("Added work package {} ({})", node.code, node.name);
        }
        Ok(id)
    }

    /// Merge attributes into a work package
    ///
    /// # Errors
    /// Returns a store error if autosave fails; the tree is then unchanged
    pub fn update_node(&mut self, id: NodeId, patch: NodePatch) -> Result<bool> {
        if !self.tree.contains(id) {
            tracing::debug!("Update ignored for unknown node {}", id);
            return Ok(false);
        }
        let mut tree = Arc::clone(&self.tree);
        let updated = Arc::make_mut(&mut tree).update_node(id, patch);
        if updated {
            self.commit_tree(tree)?;
            tracing::info!("Updated work package {}", id);
        }
        Ok(updated)
    }

    /// Delete a work package and its subtree, returning the removed ids
    ///
    /// # Errors
    /// Returns a store error if autosave fails; the tree is then unchanged
    pub fn delete_node(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        if !self.tree.contains(id) {
            tracing::debug!("Delete ignored for unknown node {}", id);
            return Ok(Vec::new());
        }
        let mut tree = Arc::clone(&self.tree);
        let removed = Arc::make_mut(&mut tree).delete_node(id);
        self.commit_tree(tree)?;
        tracing::info!("Deleted {} work packages", removed.len());
        Ok(removed)
    }

    /// Re-home a work package and its subtree
    ///
    /// # Errors
    /// Returns a store error if autosave fails; the tree is then unchanged
    pub fn move_node(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<MoveOutcome> {
        let mut tree = Arc::clone(&self.tree);
        let outcome = Arc::make_mut(&mut tree).move_node(id, new_parent);
        if let MoveOutcome::Moved {
            old_code, new_code, ..
        } = &outcome
        {
            self.commit_tree(tree)?;
            tracing::info!("Moved work package {} to {}", old_code, new_code);
        }
        Ok(outcome)
    }

    /// Repair structural fields of the tree
    ///
    /// # Errors
    /// Returns a store error if autosave fails; the tree is then unchanged
    pub fn repair_tree(&mut self) -> Result<RepairReport> {
        if self.tree.is_consistent() {
            return Ok(RepairReport::default());
        }
        let mut tree = Arc::clone(&self.tree);
        let report = Arc::make_mut(&mut tree).repair();
        self.commit_tree(tree)?;
        Ok(report)
    }

    // ---------------------------------------------------------------------
    // Phases
    // ---------------------------------------------------------------------

    /// Lookup a phase by id
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownPhase`] if no phase carries `id`
    pub fn phase(&self, id: &PhaseId) -> Result<&Phase> {
        self.phases
            .get(id)
            .ok_or_else(|| CoreError::UnknownPhase(id.clone()))
    }

    /// Insert a custom phase
    ///
    /// # Errors
    /// Returns a store error if autosave fails; the phases are then unchanged
    pub fn add_custom_phase(&mut self, data: NewPhase, position: InsertPosition) -> Result<PhaseId> {
        let name = data.name.clone();
        let mut phases = self.phases.clone();
        let id = phases.add_custom_phase(data, position);
        self.commit_phases(phases)?;
        tracing::info!(
            "Added custom phase {} ({}) at position {}",
            id,
            name,
            self.phases.position_of(&id).unwrap_or_default()
        );
        Ok(id)
    }

    /// Merge attributes into a custom phase
    ///
    /// # Errors
    /// Returns a store error if autosave fails; the phases are then unchanged
    pub fn update_phase(&mut self, id: &PhaseId, patch: PhasePatch) -> Result<bool> {
        let mut phases = self.phases.clone();
        let updated = phases.update_phase(id, patch);
        if updated {
            self.commit_phases(phases)?;
            tracing::info!("Updated custom phase {}", id);
        }
        Ok(updated)
    }

    /// Remove a custom phase
    ///
    /// # Errors
    /// Returns a store error if autosave fails; the phases are then unchanged
    pub fn delete_phase(&mut self, id: &PhaseId) -> Result<Option<Phase>> {
        let mut phases = self.phases.clone();
        let removed = phases.delete_phase(id);
        if let Some(phase) = &removed {
            self.commit_phases(phases)?;
            tracing::info!("Deleted custom phase {} ({})", phase.id, phase.name);
        }
        Ok(removed)
    }

    /// Re-slot a custom phase
    ///
    /// # Errors
    /// Returns a store error if autosave fails; the phases are then unchanged
    pub fn move_custom_phase(&mut self, id: &PhaseId, position: InsertPosition) -> Result<bool> {
        let mut phases = self.phases.clone();
        let moved = phases.move_custom_phase(id, position);
        if moved {
            self.commit_phases(phases)?;
            tracing::info!("Moved custom phase {}", id);
        }
        Ok(moved)
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Current state as a snapshot
    #[must_use]
    pub fn snapshot(&self) -> ProjectSnapshot {
        self.snapshot_of(&self.tree, &self.phases)
    }

    fn snapshot_of(&self, tree: &WbsTree, phases: &PhaseSequencer) -> ProjectSnapshot {
        ProjectSnapshot::new(
            self.project_key.clone(),
            phases.methodology(),
            tree.to_nodes(),
            phases.custom_phases().to_vec(),
        )
    }

    /// Write the snapshot, overwriting whatever is stored
    ///
    /// If the stored blob changed since this instance last read or wrote it,
    /// the other writer's changes are lost; this is logged at `warn`.
    ///
    /// # Errors
    /// Returns a store error if encoding or writing fails
    pub fn save(&mut self) -> Result<Fingerprint> {
        let bytes = self.snapshot().to_bytes(self.pretty_json)?;
        self.write(&bytes)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<Fingerprint> {
        let stored = self.blobs.get(&self.project_key)?.map(|b| Fingerprint::of(&b));
        if stored.is_some() && stored != self.observed {
            tracing::warn!(
                "Project {} changed on disk since it was loaded ({} -> {}); overwriting",
                self.project_key,
                self.observed.map_or_else(|| "none".to_string(), |fp| fp.short()),
                stored.map_or_else(String::new, |fp| fp.short()),
            );
        }

        self.blobs.put(&self.project_key, bytes)?;
        let fingerprint = Fingerprint::of(bytes);
        self.observed = Some(fingerprint);

        tracing::debug!("Saved project {} as {}", self.project_key, fingerprint.short());
        Ok(fingerprint)
    }

    /// Persist `tree` if autosaving, then install it
    fn commit_tree(&mut self, tree: Arc<WbsTree>) -> Result<()> {
        if self.autosave {
            let bytes = self.snapshot_of(&tree, &self.phases).to_bytes(self.pretty_json)?;
            self.write(&bytes)?;
        }
        self.tree = tree;
        Ok(())
    }

    /// Persist `phases` if autosaving, then install them
    fn commit_phases(&mut self, phases: PhaseSequencer) -> Result<()> {
        if self.autosave {
            let bytes = self.snapshot_of(&self.tree, &phases).to_bytes(self.pretty_json)?;
            self.write(&bytes)?;
        }
        self.phases = phases;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pm_store::{MemoryBlobStore, StoreError};
    use pretty_assertions::assert_eq;

    fn open_demo(blobs: &MemoryBlobStore) -> ProjectStateStore {
        ProjectStateStore::load(Box::new(blobs.clone()), "demo", Methodology::Waterfall).unwrap()
    }

    #[test]
    fn fresh_project_is_unpersisted() {
        let blobs = MemoryBlobStore::new();
        let store = open_demo(&blobs);
        assert!(!store.is_persisted());
        assert!(store.tree().is_empty());
        assert_eq!(store.phases().len(), 5);
        assert!(blobs.is_empty());
    }

    #[test]
    fn rejects_bad_project_key() {
        let err = ProjectStateStore::new(Box::new(MemoryBlobStore::new()), "../x", Methodology::Agile)
            .unwrap_err();
        assert!(matches!(err, CoreError::Store(_)));
    }

    #[test]
    fn autosave_persists_each_mutation() {
        let blobs = MemoryBlobStore::new();
        let mut store = open_demo(&blobs);

        let root = store.add_node(NewNode::new("Website"), None).unwrap();
        assert!(store.is_persisted());
        let first = store.fingerprint();

        store.add_node(NewNode::new("Design"), Some(root)).unwrap();
        assert_ne!(store.fingerprint(), first);

        let reloaded = ProjectStateStore::load(Box::new(blobs), "demo", Methodology::Agile).unwrap();
        assert_eq!(reloaded.tree(), store.tree());
        assert_eq!(reloaded.methodology(), Methodology::Waterfall);
    }

    #[test]
    fn no_autosave_until_save() {
        let blobs = MemoryBlobStore::new();
        let mut store = open_demo(&blobs).with_autosave(false);

        store.add_node(NewNode::new("Draft"), None).unwrap();
        assert!(blobs.is_empty());

        store.save().unwrap();
        assert_eq!(blobs.len(), 1);
    }

    #[test]
    fn noops_do_not_write() {
        let blobs = MemoryBlobStore::new();
        let mut store = open_demo(&blobs);
        let ghost = NodeId::new();

        assert!(!store.update_node(ghost, NodePatch::new().name("x")).unwrap());
        assert!(store.delete_node(ghost).unwrap().is_empty());
        assert_eq!(store.move_node(ghost, None).unwrap(), MoveOutcome::NotFound);
        assert!(!store.update_phase(&PhaseId::new("planning"), PhasePatch::default()).unwrap());
        assert!(store.delete_phase(&PhaseId::new("planning")).unwrap().is_none());
        assert!(blobs.is_empty());
    }

    #[test]
    fn readers_keep_their_snapshot() {
        let blobs = MemoryBlobStore::new();
        let mut store = open_demo(&blobs);
        let root = store.add_node(NewNode::new("Root"), None).unwrap();

        let before = store.tree_handle();
        store.add_node(NewNode::new("Child"), Some(root)).unwrap();
        store.update_node(root, NodePatch::new().name("Renamed")).unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(before.get(root).unwrap().name, "Root");
        assert!(before.get(root).unwrap().children.is_empty());
        assert_eq!(store.tree().len(), 2);
    }

    #[test]
    fn resolve_code_errors() {
        let blobs = MemoryBlobStore::new();
        let mut store = open_demo(&blobs);
        let root = store.add_node(NewNode::new("Root"), None).unwrap();

        assert_eq!(store.resolve_code("1").unwrap(), root);
        assert!(matches!(store.resolve_code("9"), Err(CoreError::UnknownCode(_))));
        assert!(matches!(store.resolve_code("1..2"), Err(CoreError::InvalidCode(_))));
        assert!(store.resolve_code("9").unwrap_err().is_not_found());
    }

    #[test]
    fn phases_persist_with_positions() {
        let blobs = MemoryBlobStore::new();
        let mut store = open_demo(&blobs);

        let kickoff = store
            .add_custom_phase(NewPhase::new("Kickoff"), InsertPosition::after("initiation"))
            .unwrap();
        let reloaded = ProjectStateStore::load(Box::new(blobs), "demo", Methodology::Waterfall).unwrap();

        assert_eq!(reloaded.phase(&kickoff).unwrap().order, 2.0);
        assert_eq!(reloaded.phases().sequence(), store.phases().sequence());
        assert!(matches!(
            reloaded.phase(&PhaseId::new("nope")),
            Err(CoreError::UnknownPhase(_))
        ));
    }

    #[test]
    fn last_write_wins() {
        let blobs = MemoryBlobStore::new();
        let mut first = open_demo(&blobs);
        first.add_node(NewNode::new("Seed"), None).unwrap();

        let mut a = open_demo(&blobs);
        let mut b = open_demo(&blobs);
        a.add_node(NewNode::new("From A"), None).unwrap();
        b.add_node(NewNode::new("From B"), None).unwrap();

        let winner = open_demo(&blobs);
        let names: Vec<&str> = winner.tree().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Seed", "From B"]);
        assert_eq!(winner.fingerprint(), b.fingerprint());
    }

    /// Store whose writes always fail
    #[derive(Debug, Default)]
    struct ReadOnlyStore;

    impl BlobStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> std::result::Result<Option<Vec<u8>>, StoreError> {
            Ok(None)
        }

        fn put(&self, key: &str, _bytes: &[u8]) -> std::result::Result<(), StoreError> {
            Err(StoreError::Io {
                path: key.into(),
                source: std::io::Error::other("read-only"),
            })
        }

        fn delete(&self, _key: &str) -> std::result::Result<bool, StoreError> {
            Ok(false)
        }

        fn keys(&self) -> std::result::Result<Vec<String>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn failed_save_leaves_tree_unchanged() {
        let mut store =
            ProjectStateStore::new(Box::new(ReadOnlyStore), "demo", Methodology::Waterfall).unwrap();

        assert!(store.add_node(NewNode::new("A"), None).is_err());
        assert!(store.add_node(NewNode::new("A"), None).is_err());
        assert!(store.tree().is_empty());
        assert!(!store.is_persisted());

        let mut offline = store.with_autosave(false);
        let root = offline.add_node(NewNode::new("A"), None).unwrap();
        assert_eq!(offline.tree().get(root).unwrap().code.as_str(), "1");

        let mut store = offline.with_autosave(true);
        let before = store.tree().clone();
        assert!(store.update_node(root, NodePatch::new().name("B")).is_err());
        assert!(store.add_node(NewNode::new("Child"), Some(root)).is_err());
        assert!(store.move_node(root, None).is_ok());
        assert!(store.delete_node(root).is_err());
        assert_eq!(store.tree(), &before);
    }

    #[test]
    fn failed_save_leaves_phases_unchanged() {
        let mut store =
            ProjectStateStore::new(Box::new(ReadOnlyStore), "demo", Methodology::Waterfall).unwrap();
        let before = store.phases().clone();

        assert!(store
            .add_custom_phase(NewPhase::new("Kickoff"), InsertPosition::after("initiation"))
            .is_err());
        assert_eq!(store.phases(), &before);
        assert!(store.phases().custom_phases().is_empty());
    }
}
