//! Navigation state: cursor, selection, clock anchor and the variation
//! selector.
//!
//! Navigation never touches the tree; it only decides which node the
//! user is looking at. Stepping forward follows the only continuation
//! when there is one, and opens a selector over the children when the
//! position branches, so the user picks a line instead of being
//! silently routed down the mainline. Stepping back cancels an open
//! selector first; otherwise it climbs to the parent.

use tracing::trace;

use crate::tree::{AnalysisTree, NodeId};

/// Transient picker over one node's children, opened by stepping
/// forward at a branch point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariationSelector {
    /// The branching node whose children are on offer.
    pub node: NodeId,
    /// Highlighted slot in that node's child list.
    pub index: usize,
}

/// Where the user is in the tree.
#[derive(Clone, Debug)]
pub struct NavState {
    cursor: NodeId,
    selected: NodeId,
    anchor: NodeId,
    selector: Option<VariationSelector>,
}

impl NavState {
    pub fn new(root: NodeId) -> Self {
        Self {
            cursor: root,
            selected: root,
            anchor: root,
            selector: None,
        }
    }

    /// Node the user is standing on.
    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    /// Node highlighted for editing operations. Follows the cursor
    /// here; kept separate so callers can treat them differently.
    pub fn selected(&self) -> NodeId {
        self.selected
    }

    /// Node whose snapshot the clock display reads.
    ///
    /// Tracks the cursor while it stays on the mainline and freezes at
    /// the divergence point when the cursor wanders into a variation:
    /// variation nodes never had real time on them, so showing their
    /// clocks would invent history.
    pub fn clock_anchor(&self) -> NodeId {
        self.anchor
    }

    pub fn selector(&self) -> Option<VariationSelector> {
        self.selector
    }

    /// Moves cursor and selection to `id`, closing any open selector.
    /// The clock anchor follows only if `id` sits on the mainline.
    pub(crate) fn place(&mut self, tree: &AnalysisTree, id: NodeId) {
        if !tree.contains(id) {
            return;
        }
        self.cursor = id;
        self.selected = id;
        self.selector = None;
        if tree.is_on_mainline(id) {
            self.anchor = id;
        }
        trace!(cursor = %id, anchor = %self.anchor, "cursor placed");
    }

    /// Highlights `id` for editing without moving the cursor.
    pub(crate) fn select(&mut self, tree: &AnalysisTree, id: NodeId) -> bool {
        if !tree.contains(id) {
            return false;
        }
        self.selected = id;
        true
    }

    /// Steps to the parent. With the selector open this cancels it
    /// instead, leaving the cursor alone. Returns `false` at the root.
    pub fn back(&mut self, tree: &AnalysisTree) -> bool {
        if self.dismiss() {
            return true;
        }
        match tree.parent(self.cursor) {
            Some(parent) => {
                self.place(tree, parent);
                true
            }
            None => false,
        }
    }

    /// Steps forward: follows the only child, or opens the selector
    /// when the position branches. With the selector already open this
    /// accepts the highlighted line. Returns `false` at a leaf.
    pub fn forward(&mut self, tree: &AnalysisTree) -> bool {
        if self.selector.is_some() {
            return self.accept(tree);
        }
        match tree.children(self.cursor) {
            [] => false,
            [only] => {
                let only = *only;
                self.place(tree, only);
                true
            }
            children => {
                let index = tree
                    .main_child(self.cursor)
                    .and_then(|main| children.iter().position(|&child| child == main))
                    .unwrap_or(0);
                self.selector = Some(VariationSelector {
                    node: self.cursor,
                    index,
                });
                true
            }
        }
    }

    /// Moves the selector highlight by `delta`, wrapping around both
    /// ends of the child list.
    pub fn selector_move(&mut self, tree: &AnalysisTree, delta: i32) -> bool {
        let Some(selector) = self.selector.as_mut() else {
            return false;
        };
        let count = tree.children(selector.node).len();
        if count == 0 {
            self.selector = None;
            return false;
        }
        let next = (selector.index as i64 + i64::from(delta)).rem_euclid(count as i64) as usize;
        let changed = next != selector.index;
        selector.index = next;
        changed
    }

    /// Puts the selector highlight on `index`, clamped into range.
    pub fn selector_set(&mut self, tree: &AnalysisTree, index: usize) -> bool {
        let Some(selector) = self.selector.as_mut() else {
            return false;
        };
        let count = tree.children(selector.node).len();
        if count == 0 {
            self.selector = None;
            return false;
        }
        let next = index.min(count - 1);
        let changed = next != selector.index;
        selector.index = next;
        changed
    }

    /// Descends into the highlighted child and closes the selector.
    pub fn accept(&mut self, tree: &AnalysisTree) -> bool {
        let Some(selector) = self.selector else {
            return false;
        };
        let Some(&target) = tree.children(selector.node).get(selector.index) else {
            self.selector = None;
            return false;
        };
        self.place(tree, target);
        true
    }

    /// Closes the selector without moving. Returns `false` if none was
    /// open.
    pub fn dismiss(&mut self) -> bool {
        self.selector.take().is_some()
    }

    /// Re-derives the clock anchor from the cursor: the cursor itself
    /// when it stands on the mainline, otherwise its nearest mainline
    /// ancestor. Cursor, selection and selector are left alone.
    ///
    /// Used when the mainline changes shape, as it does on promotion.
    pub(crate) fn reanchor(&mut self, tree: &AnalysisTree) {
        let mut anchor = self.cursor;
        while !tree.is_on_mainline(anchor) {
            match tree.parent(anchor) {
                Some(parent) => anchor = parent,
                None => break,
            }
        }
        self.anchor = anchor;
    }

    /// Repairs dangling references after nodes were removed from the
    /// tree.
    pub(crate) fn heal(&mut self, tree: &AnalysisTree) {
        if !tree.contains(self.cursor) {
            self.cursor = tree.root_id();
        }
        if !tree.contains(self.selected) {
            self.selected = self.cursor;
        }
        if !tree.contains(self.anchor) || !tree.is_on_mainline(self.anchor) {
            self.reanchor(tree);
        }
        if let Some(selector) = self.selector {
            let children = tree.children(selector.node);
            if !tree.contains(selector.node) || selector.index >= children.len() {
                self.selector = None;
            }
        }
    }
}
