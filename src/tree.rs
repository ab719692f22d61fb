//! The analysis tree.
//!
//! Every position the user has visited lives in an arena keyed by
//! [`NodeId`]: one root holding the starting snapshot, and one node per
//! committed half-move, each owning the full snapshot that move
//! produced. Branching is free, the mainline is the chain of main
//! children, and because snapshots are self-contained, stepping around
//! the tree never replays anything.

use std::collections::HashMap;
use std::fmt;

use rand::Rng;
use tracing::{debug, info};

use crate::apply::{apply, ApplyOutcome};
use crate::board::PerBoard;
use crate::clock::{BoardTimeline, TimeControl};
use crate::error::{LoadError, MoveError};
use crate::moves::{MoveKey, PlayedMove};
use crate::notation::parse_move_text;
use crate::record::SequencedMove;
use crate::snapshot::PositionSnapshot;

/// Identifier of one tree node, unique within a session.
///
/// The sequence number comes from a per-session counter; the tag is a
/// factory-wide random stamp, so ids minted by different sessions do
/// not collide by accident when they meet in logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    seq: u64,
    tag: u16,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}-{:04x}", self.seq, self.tag)
    }
}

/// Mints [`NodeId`]s: a monotonic counter plus a per-factory tag.
///
/// Sessions default to a random tag; tests inject a fixed one to get
/// reproducible ids.
#[derive(Clone, Debug)]
pub struct NodeIdFactory {
    next_seq: u64,
    tag: u16,
}

impl NodeIdFactory {
    pub fn new() -> Self {
        Self::with_tag(rand::rng().random())
    }

    pub fn with_tag(tag: u16) -> Self {
        Self { next_seq: 0, tag }
    }

    pub fn mint(&mut self) -> NodeId {
        let id = NodeId {
            seq: self.next_seq,
            tag: self.tag,
        };
        self.next_seq += 1;
        id
    }
}

impl Default for NodeIdFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// One node of the analysis tree.
#[derive(Clone, Debug)]
pub struct AnalysisNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    /// The move that produced this position; `None` only at the root.
    pub incoming: Option<PlayedMove>,
    /// Full match state after `incoming`.
    pub position: PositionSnapshot,
    /// Children in the order their moves were first tried. Variation
    /// selectors index into this list, so it never reorders.
    pub children: Vec<NodeId>,
    /// Which child continues the mainline through this node.
    pub main_child: Option<NodeId>,
}

impl AnalysisNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena of [`AnalysisNode`]s with a distinguished root and mainline.
#[derive(Clone, Debug)]
pub struct AnalysisTree {
    nodes: HashMap<NodeId, AnalysisNode>,
    root: NodeId,
    initial: PositionSnapshot,
    ids: NodeIdFactory,
}

impl AnalysisTree {
    /// A tree holding only a root with the given starting snapshot.
    pub fn new(initial: PositionSnapshot) -> Self {
        Self::with_ids(initial, NodeIdFactory::new())
    }

    pub fn with_ids(initial: PositionSnapshot, mut ids: NodeIdFactory) -> Self {
        let root = ids.mint();
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            AnalysisNode {
                id: root,
                parent: None,
                incoming: None,
                position: initial.clone(),
                children: Vec::new(),
                main_child: None,
            },
        );
        Self {
            nodes,
            root,
            initial,
            ids,
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Snapshot the tree started from. The root node holds the same
    /// state; this accessor just cannot miss.
    pub fn root_position(&self) -> &PositionSnapshot {
        &self.initial
    }

    /// Clones the id factory state so a successor tree can carry on the
    /// same id sequence without reuse.
    pub(crate) fn fork_ids(&self) -> NodeIdFactory {
        self.ids.clone()
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&AnalysisNode> {
        self.nodes.get(&id)
    }

    pub fn position(&self, id: NodeId) -> Option<&PositionSnapshot> {
        self.nodes.get(&id).map(|node| &node.position)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn main_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|node| node.main_child)
    }

    /// Appends a new child under `parent`. The first child of a node
    /// becomes its main child; later ones are variations. Returns
    /// `None` if `parent` is not in the tree.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        played: PlayedMove,
        position: PositionSnapshot,
    ) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        Some(self.attach(parent, played, position))
    }

    fn attach(&mut self, parent: NodeId, played: PlayedMove, position: PositionSnapshot) -> NodeId {
        let id = self.ids.mint();
        self.nodes.insert(
            id,
            AnalysisNode {
                id,
                parent: Some(parent),
                incoming: Some(played),
                position,
                children: Vec::new(),
                main_child: None,
            },
        );
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(id);
            if node.main_child.is_none() {
                node.main_child = Some(id);
            }
        }
        id
    }

    /// Finds an existing child of `parent` reached by the same resolved
    /// move. Applying a move that is already in the tree advances to
    /// this child instead of growing a duplicate sibling.
    pub fn child_matching(&self, parent: NodeId, key: MoveKey) -> Option<NodeId> {
        self.children(parent).iter().copied().find(|&child| {
            self.nodes
                .get(&child)
                .and_then(|node| node.incoming.as_ref())
                .map_or(false, |incoming| incoming.key() == key)
        })
    }

    /// Node ids from the root to `id` inclusive. Empty if `id` is not
    /// in the tree.
    pub fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.nodes.get(&current) {
                Some(node) => {
                    path.push(current);
                    cursor = node.parent;
                }
                None => return Vec::new(),
            }
        }
        path.reverse();
        path
    }

    /// The committed moves leading from the root to `id`, in order.
    pub fn moves_from_root(&self, id: NodeId) -> Vec<PlayedMove> {
        self.path_from_root(id)
            .into_iter()
            .filter_map(|step| {
                self.nodes
                    .get(&step)
                    .and_then(|node| node.incoming.clone())
            })
            .collect()
    }

    /// Root-to-tip chain of main children, root included.
    pub fn mainline(&self) -> Vec<NodeId> {
        let mut line = vec![self.root];
        let mut cursor = self.root;
        while let Some(next) = self.main_child(cursor) {
            line.push(next);
            cursor = next;
        }
        line
    }

    pub fn mainline_tip(&self) -> NodeId {
        let mut cursor = self.root;
        while let Some(next) = self.main_child(cursor) {
            cursor = next;
        }
        cursor
    }

    /// True if every edge from the root to `id` follows a main child.
    /// The root itself is always on the mainline.
    pub fn is_on_mainline(&self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let mut cursor = id;
        while let Some(parent) = self.parent(cursor) {
            if self.main_child(parent) != Some(cursor) {
                return false;
            }
            cursor = parent;
        }
        cursor == self.root
    }

    /// Makes `id` the main child of its parent. Only the main-child
    /// pointer moves; siblings keep the order their moves were first
    /// tried. Returns `false` for the root or an unknown node.
    pub fn promote_to_main(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        let Some(node) = self.nodes.get_mut(&parent) else {
            return false;
        };
        if !node.children.contains(&id) {
            return false;
        }
        node.main_child = Some(id);
        debug!(node = %id, "variation promoted to mainline");
        true
    }

    /// Removes everything below `id`, keeping `id` itself. Returns the
    /// number of nodes removed.
    pub fn remove_descendants(&mut self, id: NodeId) -> usize {
        let doomed: Vec<NodeId> = self
            .children(id)
            .iter()
            .flat_map(|&child| self.collect_subtree(child))
            .collect();
        for node in &doomed {
            self.nodes.remove(node);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children.clear();
            node.main_child = None;
        }
        doomed.len()
    }

    /// Removes `id` and everything below it, unlinking it from its
    /// parent. The root cannot be removed. Returns the number of nodes
    /// removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> usize {
        let Some(parent) = self.parent(id) else {
            return 0;
        };
        let doomed = self.collect_subtree(id);
        for node in &doomed {
            self.nodes.remove(node);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|&child| child != id);
            if node.main_child == Some(id) {
                node.main_child = node.children.first().copied();
            }
        }
        doomed.len()
    }

    /// `id` and all its descendants, depth first.
    fn collect_subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut collected = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                collected.push(current);
                stack.extend(node.children.iter().copied());
            }
        }
        collected
    }

    /// Builds a fresh single-line tree by replaying a combined move
    /// sequence from the standard starting position, stamping clocks
    /// from the recorded timestamps as it goes.
    ///
    /// The first entry that fails to parse or apply aborts the whole
    /// build; nothing partial escapes. Swapping the result in wholesale
    /// is what keeps loading atomic for the session that asked.
    pub fn build_mainline(
        control: TimeControl,
        moves: &[SequencedMove],
        ids: NodeIdFactory,
    ) -> Result<AnalysisTree, LoadError> {
        let initial = PositionSnapshot::initial(control);
        let mut current = initial.clone();
        let mut tree = AnalysisTree::with_ids(initial, ids);
        let mut tip = tree.root;
        let mut timelines: PerBoard<BoardTimeline> = PerBoard::default();

        for (index, entry) in moves.iter().enumerate() {
            let fail = |source: MoveError| LoadError {
                index,
                board: entry.board,
                source,
            };

            // The recorded side must own the move, or the sequence has
            // been combined from a corrupt record.
            if entry.side != current.turn(entry.board) {
                return Err(fail(MoveError::IllegalMove {
                    board: entry.board,
                    text: entry.text.clone(),
                }));
            }

            let attempted =
                parse_move_text(entry.board, current.board(entry.board), &entry.text)
                    .map_err(&fail)?;
            let (mut snapshot, played) = match apply(&current, &attempted).map_err(&fail)? {
                ApplyOutcome::Applied { snapshot, played } => (snapshot, played),
                // Recorded promotions always carry their piece; text
                // that leaves it open cannot be replayed.
                ApplyOutcome::NeedsPromotion { .. } => {
                    return Err(fail(MoveError::IllegalMove {
                        board: entry.board,
                        text: entry.text.clone(),
                    }));
                }
            };

            let elapsed = timelines[entry.board].advance(entry.at_ms);
            snapshot.charge_clock(entry.board, played.side, elapsed, control.increment());

            current = snapshot.clone();
            tip = tree.attach(tip, played, snapshot);
        }

        info!(moves = moves.len(), nodes = tree.len(), "mainline built");
        Ok(tree)
    }
}
