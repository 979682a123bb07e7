use std::collections::VecDeque;

use crate::layer::{Layer, LayerCommon, LayerId};

pub const DEFAULT_HISTORY_DEPTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

impl HistoryDirection {
    pub const fn applied_message(self) -> &'static str {
        match self {
            Self::Undo => "undo applied",
            Self::Redo => "redo applied",
        }
    }

    pub const fn empty_message(self) -> &'static str {
        match self {
            Self::Undo => "undo stack empty",
            Self::Redo => "redo stack empty",
        }
    }
}

/// Bounded undo/redo stacks of whole layer-list snapshots.
///
/// Layers hold their pixels behind `Arc`, so a snapshot clones layer values, never buffers.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Vec<Layer>>,
    redo_stack: Vec<Vec<Layer>>,
    depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl History {
    pub fn new(depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            depth: depth.max(1),
        }
    }

    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Records the pre-mutation layer list and discards the redo branch.
    pub fn snapshot(&mut self, current: &[Layer]) {
        self.undo_stack.push_back(current.to_vec());
        while self.undo_stack.len() > self.depth {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
    }

    /// Returns the previous layer list, or `None` when there is nothing to undo.
    pub fn undo(&mut self, current: &[Layer]) -> Option<Vec<Layer>> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push(current.to_vec());
        Some(previous)
    }

    pub fn redo(&mut self, current: &[Layer]) -> Option<Vec<Layer>> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push_back(current.to_vec());
        while self.undo_stack.len() > self.depth {
            self.undo_stack.pop_front();
        }
        Some(next)
    }

    pub fn step(&mut self, direction: HistoryDirection, current: &[Layer]) -> Option<Vec<Layer>> {
        match direction {
            HistoryDirection::Undo => self.undo(current),
            HistoryDirection::Redo => self.redo(current),
        }
    }

    /// Rewrites every stored copy of one layer, for changes that must not be versioned
    /// (a background pixel reload landing after the snapshot was taken).
    pub fn patch_layer(&mut self, id: LayerId, patch: impl Fn(&Layer) -> Option<Layer>) {
        let stacks = self.undo_stack.iter_mut().chain(self.redo_stack.iter_mut());
        for layers in stacks {
            for layer in layers.iter_mut().filter(|layer| layer.id() == id) {
                if let Some(patched) = patch(layer) {
                    *layer = patched;
                }
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Transform;
    use crate::layer::test_support::image_layer;

    fn layers(count: u64) -> Vec<Layer> {
        (0..count)
            .map(|id| image_layer(id, 4, 4, Transform::default(), id as i32))
            .collect()
    }

    #[test]
    fn undo_and_redo_walk_the_snapshot_stacks() {
        let mut history = History::default();
        let before = layers(1);
        let after = layers(2);
        history.snapshot(&before);

        let restored = history.undo(&after).expect("undo after snapshot");
        assert_eq!(restored, before);
        assert!(history.can_redo());

        let replayed = history.redo(&restored).expect("redo after undo");
        assert_eq!(replayed, after);
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn empty_stacks_are_no_ops() {
        let mut history = History::default();
        assert!(!history.can_undo());
        assert_eq!(history.undo(&layers(1)), None);
        assert_eq!(history.redo(&layers(1)), None);
        assert!(!history.can_redo());
    }

    #[test]
    fn new_snapshot_discards_redo_branch() {
        let mut history = History::default();
        history.snapshot(&layers(0));
        history.undo(&layers(1)).expect("undo");
        assert!(history.can_redo());

        history.snapshot(&layers(0));
        assert!(!history.can_redo());
        assert_eq!(history.redo(&layers(1)), None);
    }

    #[test]
    fn oldest_snapshot_is_evicted_past_depth() {
        let mut history = History::new(3);
        for count in 0..5 {
            history.snapshot(&layers(count));
        }
        assert_eq!(history.undo_len(), 3);

        let mut current = layers(5);
        let mut seen = Vec::new();
        while let Some(previous) = history.undo(&current) {
            seen.push(previous.len());
            current = previous;
        }
        assert_eq!(seen, vec![4, 3, 2]);
    }

    #[test]
    fn patch_layer_rewrites_both_stacks() {
        let mut history = History::default();
        history.snapshot(&layers(2));
        history.snapshot(&layers(3));
        history.undo(&layers(3)).expect("undo");

        history.patch_layer(LayerId::new(1), |layer| Some(layer.clone().with_visible(false)));

        let redo = history.redo(&layers(2)).expect("redo");
        assert!(!redo[1].visible());
        history.undo(&redo).expect("undo back");
        let oldest = history.undo(&layers(2)).expect("undo to first snapshot");
        assert!(!oldest[1].visible());
        assert!(oldest[0].visible());
    }

    #[test]
    fn step_dispatches_by_direction() {
        let mut history = History::default();
        history.snapshot(&layers(1));
        assert_eq!(
            history.step(HistoryDirection::Undo, &layers(2)).map(|l| l.len()),
            Some(1)
        );
        assert_eq!(
            history.step(HistoryDirection::Redo, &layers(1)).map(|l| l.len()),
            Some(2)
        );
        assert_eq!(HistoryDirection::Redo.empty_message(), "redo stack empty");
    }

    #[test]
    fn zero_depth_is_raised_to_one() {
        assert_eq!(History::new(0).depth(), 1);
    }
}
