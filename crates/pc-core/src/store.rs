use crate::model::{BoxId, OrientedBox3D};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// Failures surfaced to the user as transient notices. None of them mutate
/// the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("nothing to copy: no box is selected")]
    NothingToCopy,
    #[error("nothing to paste: the copy buffer is empty")]
    NothingToPaste,
    #[error("cannot paste: box {0} already exists")]
    DuplicateId(BoxId),
}

/// Selection input: a single id, a list of ids, or nothing (clears).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    One(BoxId),
    Many(Vec<BoxId>),
}

impl From<&str> for Selection {
    fn from(id: &str) -> Self {
        Selection::One(id.to_string())
    }
}

impl From<BoxId> for Selection {
    fn from(id: BoxId) -> Self {
        Selection::One(id)
    }
}

impl From<Vec<BoxId>> for Selection {
    fn from(ids: Vec<BoxId>) -> Self {
        Selection::Many(ids)
    }
}

impl From<&[&str]> for Selection {
    fn from(ids: &[&str]) -> Self {
        Selection::Many(ids.iter().map(|id| id.to_string()).collect())
    }
}

impl<T: Into<Selection>> From<Option<T>> for Selection {
    fn from(sel: Option<T>) -> Self {
        sel.map(Into::into).unwrap_or(Selection::None)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    cuboid: OrientedBox3D,
    generation: u64,
}

/// Single source of truth for box geometry, the selection and the copy
/// buffer. Every mutation goes through `&mut self`.
#[derive(Debug, Clone)]
pub struct BoxStore {
    boxes: HashMap<BoxId, Entry>,
    selected: HashSet<BoxId>,
    copy_buffer: Vec<OrientedBox3D>,
    next_generation: u64,
    valid: bool,
}

impl Default for BoxStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BoxStore {
    pub fn new() -> Self {
        Self {
            boxes: HashMap::new(),
            selected: HashSet::new(),
            copy_buffer: Vec::new(),
            next_generation: 1,
            valid: true,
        }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&OrientedBox3D> {
        self.boxes.get(id).map(|entry| &entry.cuboid)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.boxes.contains_key(id)
    }

    pub fn boxes(&self) -> impl Iterator<Item = &OrientedBox3D> {
        self.boxes.values().map(|entry| &entry.cuboid)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.boxes.keys().map(String::as_str)
    }

    /// Boxes sorted by id, for stable output.
    pub fn sorted_boxes(&self) -> Vec<&OrientedBox3D> {
        let mut boxes: Vec<_> = self.boxes().collect();
        boxes.sort_by(|a, b| a.id().cmp(b.id()));
        boxes
    }

    /// Geometry generation of `id`, bumped on every upsert.
    pub fn generation(&self, id: &str) -> Option<u64> {
        self.boxes.get(id).map(|entry| entry.generation)
    }

    /// Inserts `cuboid`, replacing any box with the same id. Returns the new
    /// generation.
    pub fn upsert(&mut self, cuboid: OrientedBox3D) -> u64 {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.saturating_add(1);
        self.boxes
            .insert(cuboid.id().to_string(), Entry { cuboid, generation });
        generation
    }

    pub fn remove(&mut self, id: &str) -> Option<OrientedBox3D> {
        self.selected.remove(id);
        self.boxes.remove(id).map(|entry| entry.cuboid)
    }

    /// Replaces the whole collection, e.g. when switching frames. Selected
    /// ids that no longer exist are dropped; the copy buffer survives.
    pub fn replace_all(&mut self, boxes: impl IntoIterator<Item = OrientedBox3D>) {
        self.boxes.clear();
        for cuboid in boxes {
            self.upsert(cuboid);
        }
        let boxes = &self.boxes;
        self.selected.retain(|id| boxes.contains_key(id));
    }

    /// Merges an asynchronously computed point count. Returns `false` and
    /// leaves the box alone when `generation` is stale or the box is gone.
    pub fn apply_point_count(&mut self, id: &str, generation: u64, num: u64) -> bool {
        match self.boxes.get_mut(id) {
            Some(entry) if entry.generation == generation => {
                entry.cuboid.set_point_count(num);
                true
            }
            _ => false,
        }
    }

    /// Replaces the selection. Duplicates collapse; unknown ids are ignored.
    pub fn select(&mut self, selection: impl Into<Selection>) {
        let ids = match selection.into() {
            Selection::None => Vec::new(),
            Selection::One(id) => vec![id],
            Selection::Many(ids) => ids,
        };
        self.selected.clear();
        for id in ids {
            if self.boxes.contains_key(&id) {
                self.selected.insert(id);
            } else {
                debug!(%id, "ignoring selection of unknown box");
            }
        }
    }

    /// Adds `id` to the selection, or removes it if already selected.
    pub fn toggle(&mut self, id: &str) {
        if !self.selected.remove(id) && self.boxes.contains_key(id) {
            self.selected.insert(id.to_string());
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.boxes.keys().cloned().collect();
    }

    pub fn selected_ids(&self) -> &HashSet<BoxId> {
        &self.selected
    }

    /// The selected id when exactly one box is selected.
    pub fn selected_id(&self) -> Option<&str> {
        if self.selected.len() == 1 {
            self.selected.iter().next().map(String::as_str)
        } else {
            None
        }
    }

    pub fn selected(&self) -> Option<&OrientedBox3D> {
        self.selected_id().and_then(|id| self.get(id))
    }

    pub fn selected_boxes(&self) -> Vec<&OrientedBox3D> {
        let mut boxes: Vec<_> = self.selected.iter().filter_map(|id| self.get(id)).collect();
        boxes.sort_by(|a, b| a.id().cmp(b.id()));
        boxes
    }

    pub fn copy_buffer(&self) -> &[OrientedBox3D] {
        &self.copy_buffer
    }

    /// Deep-copies the selected boxes into the copy buffer. An empty
    /// selection clears the buffer.
    pub fn copy_selected(&mut self) -> Result<usize, StoreError> {
        let copied: Vec<OrientedBox3D> = self.selected_boxes().into_iter().cloned().collect();
        if copied.is_empty() {
            self.copy_buffer.clear();
            return Err(StoreError::NothingToCopy);
        }
        self.copy_buffer = copied;
        Ok(self.copy_buffer.len())
    }

    /// Inserts every buffered box and empties the buffer.
    pub fn paste(&mut self) -> Result<Vec<BoxId>, StoreError> {
        if self.copy_buffer.is_empty() {
            return Err(StoreError::NothingToPaste);
        }
        if let Some(dup) = self.copy_buffer.iter().find(|b| self.contains(b.id())) {
            return Err(StoreError::DuplicateId(dup.id().to_string()));
        }
        let pasted = std::mem::take(&mut self.copy_buffer);
        let ids = pasted.iter().map(|b| b.id().to_string()).collect();
        for cuboid in pasted {
            self.upsert(cuboid);
        }
        Ok(ids)
    }

    /// Only an explicit `false` marks the annotation invalid.
    pub fn set_valid(&mut self, valid: Option<bool>) {
        self.valid = valid != Some(false);
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Point3;

    fn cuboid(id: &str) -> OrientedBox3D {
        OrientedBox3D::new(id, Point3::ZERO, 2.0, 4.0, 1.0, 0.0).unwrap()
    }

    fn store_with(ids: &[&str]) -> BoxStore {
        let mut store = BoxStore::new();
        for id in ids {
            store.upsert(cuboid(id));
        }
        store
    }

    #[test]
    fn upsert_replaces_same_id() {
        let mut store = store_with(&["a"]);
        let g1 = store.generation("a").unwrap();
        let mut moved = cuboid("a");
        moved.set_geometry(Point3::new(1.0, 0.0, 0.0), 2.0, 4.0, 1e-3);
        let g2 = store.upsert(moved);
        assert_eq!(store.len(), 1);
        assert!(g2 > g1);
        assert_eq!(store.get("a").unwrap().center().x, 1.0);
    }

    #[test]
    fn remove_missing_is_not_an_error() {
        let mut store = store_with(&["a"]);
        assert!(store.remove("zzz").is_none());
        store.select("a");
        assert!(store.remove("a").is_some());
        assert!(store.selected_ids().is_empty());
    }

    #[test]
    fn select_dedups() {
        let mut store = store_with(&["a", "b"]);
        store.select(&["a", "a", "b"][..]);
        let expected: HashSet<BoxId> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(store.selected_ids(), &expected);
        assert!(store.selected().is_none());
    }

    #[test]
    fn select_none_clears() {
        let mut store = store_with(&["a"]);
        store.select("a");
        assert_eq!(store.selected().map(|b| b.id()), Some("a"));
        store.select(Selection::None);
        assert!(store.selected_ids().is_empty());
        store.select("a");
        store.select(None::<&str>);
        assert!(store.selected_ids().is_empty());
    }

    #[test]
    fn toggle_twice_restores_selection() {
        let mut store = store_with(&["a", "b", "c"]);
        store.select(&["a", "b"][..]);
        let before = store.selected_ids().clone();
        store.toggle("c");
        assert_eq!(store.selected_ids().len(), 3);
        store.toggle("c");
        assert_eq!(store.selected_ids(), &before);
        store.toggle("a");
        store.toggle("a");
        assert_eq!(store.selected_ids(), &before);
    }

    #[test]
    fn select_all_picks_every_box() {
        let mut store = store_with(&["a", "b", "c"]);
        store.select_all();
        assert_eq!(store.selected_ids().len(), 3);
        assert!(store.ids().all(|id| store.selected_ids().contains(id)));
    }

    #[test]
    fn stale_point_count_is_discarded() {
        let mut store = store_with(&["a"]);
        let old = store.generation("a").unwrap();
        let new = store.upsert(cuboid("a"));
        assert!(!store.apply_point_count("a", old, 10));
        assert_eq!(store.get("a").unwrap().point_count(), 0);
        assert!(store.apply_point_count("a", new, 7));
        assert_eq!(store.get("a").unwrap().point_count(), 7);
        assert!(!store.apply_point_count("gone", new, 1));
    }

    #[test]
    fn copy_empty_selection_then_paste() {
        let mut store = store_with(&["a"]);
        assert_eq!(store.copy_selected(), Err(StoreError::NothingToCopy));
        assert!(store.copy_buffer().is_empty());
        assert_eq!(store.paste(), Err(StoreError::NothingToPaste));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn copy_is_independent_and_paste_clears_buffer() {
        let mut store = store_with(&["a", "b"]);
        store.select("a");
        assert_eq!(store.copy_selected(), Ok(1));

        let mut edited = cuboid("a");
        edited.set_geometry(Point3::new(5.0, 0.0, 0.0), 2.0, 4.0, 1e-3);
        store.upsert(edited);
        assert_eq!(store.copy_buffer()[0].center(), Point3::ZERO);

        assert_eq!(store.paste(), Err(StoreError::DuplicateId("a".to_string())));
        assert_eq!(store.copy_buffer().len(), 1);

        store.replace_all(vec![cuboid("b")]);
        assert_eq!(store.paste(), Ok(vec!["a".to_string()]));
        assert!(store.copy_buffer().is_empty());
        assert_eq!(store.get("a").unwrap().center(), Point3::ZERO);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn validity_only_false_is_invalid() {
        let mut store = BoxStore::new();
        store.set_valid(Some(false));
        assert!(!store.is_valid());
        store.set_valid(None);
        assert!(store.is_valid());
    }
}
