//! The beach line: a binary tree whose leaves are parabola arcs and whose
//! internal nodes are the breakpoints between them.
//!
//! In-order traversal of the leaves gives the arcs in left-to-right order
//! along the beach line. Nodes live in an arena and point at each other by
//! [`NodeIdx`]; splicing a leaf out leaves its slot allocated but
//! unreachable, which keeps every outstanding index valid for the rest of
//! the sweep.

use crate::dcel::HalfEdgeIdx;
use crate::geom::{breakpoint_x, Site, SiteIdx};
use crate::queue::EventIdx;

/// An index into the beach tree's node arena.
#[derive(Clone, Copy, Hash, PartialEq, Eq, serde::Serialize)]
pub struct NodeIdx(usize);

impl std::fmt::Debug for NodeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A parabola arc: the payload of a leaf node.
#[derive(Clone, Debug)]
pub struct Arc {
    pub(crate) site: SiteIdx,
    // The circle events this arc participates in, by the role it plays.
    // These are back-references; the queue owns the events.
    pub(crate) events_left: Vec<EventIdx>,
    pub(crate) events_middle: Vec<EventIdx>,
    pub(crate) events_right: Vec<EventIdx>,
    // Half-edges currently being traced by the breakpoints on either side
    // of this arc.
    pub(crate) left_edges: Vec<HalfEdgeIdx>,
    pub(crate) right_edges: Vec<HalfEdgeIdx>,
}

impl Arc {
    fn new(site: SiteIdx) -> Arc {
        Arc {
            site,
            events_left: Vec::new(),
            events_middle: Vec::new(),
            events_right: Vec::new(),
            left_edges: Vec::new(),
            right_edges: Vec::new(),
        }
    }

    /// The focus of this arc's parabola.
    pub fn site(&self) -> SiteIdx {
        self.site
    }

    /// The half-edges being traced on the arc's left boundary.
    pub fn left_edges(&self) -> &[HalfEdgeIdx] {
        &self.left_edges
    }

    /// The half-edges being traced on the arc's right boundary.
    pub fn right_edges(&self) -> &[HalfEdgeIdx] {
        &self.right_edges
    }

    /// Empties all three event lists and returns their union.
    pub(crate) fn take_events(&mut self) -> Vec<EventIdx> {
        let mut events = std::mem::take(&mut self.events_left);
        events.append(&mut self.events_middle);
        events.append(&mut self.events_right);
        events
    }
}

/// What a beach node is: an arc, or the breakpoint between two subtrees.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// A leaf carrying an arc.
    Leaf(Arc),
    /// A breakpoint; its leaf neighbors in the two subtrees are the arcs
    /// meeting there.
    Internal {
        /// Subtree of arcs left of the breakpoint.
        left: NodeIdx,
        /// Subtree of arcs right of the breakpoint.
        right: NodeIdx,
    },
}

/// A node of the beach tree.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) parent: Option<NodeIdx>,
    pub(crate) kind: NodeKind,
}

impl Node {
    /// The parent node; `None` for the root.
    pub fn parent(&self) -> Option<NodeIdx> {
        self.parent
    }

    /// Leaf or breakpoint.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Whether this node is an arc.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }
}

/// The beach-line tree.
#[derive(Clone, Debug, Default)]
pub struct BeachTree {
    nodes: Vec<Node>,
    root: Option<NodeIdx>,
}

impl std::ops::Index<NodeIdx> for BeachTree {
    type Output = Node;

    fn index(&self, index: NodeIdx) -> &Node {
        &self.nodes[index.0]
    }
}

impl BeachTree {
    /// Creates an empty beach line.
    pub fn new() -> BeachTree {
        BeachTree::default()
    }

    /// Discards all nodes.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Whether the beach line has no arcs.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The root node, if any.
    pub fn root(&self) -> Option<NodeIdx> {
        self.root
    }

    /// The arc payload of a leaf.
    ///
    /// Panics on an internal node; callers hold leaves by construction.
    pub fn arc(&self, node: NodeIdx) -> &Arc {
        match &self.nodes[node.0].kind {
            NodeKind::Leaf(arc) => arc,
            NodeKind::Internal { .. } => panic!("beach node {node:?} is not an arc"),
        }
    }

    pub(crate) fn arc_mut(&mut self, node: NodeIdx) -> &mut Arc {
        match &mut self.nodes[node.0].kind {
            NodeKind::Leaf(arc) => arc,
            NodeKind::Internal { .. } => panic!("beach node {node:?} is not an arc"),
        }
    }

    fn alloc(&mut self, node: Node) -> NodeIdx {
        let idx = NodeIdx(self.nodes.len());
        self.nodes.push(node);
        idx
    }

    fn children_of(&self, node: NodeIdx) -> (NodeIdx, NodeIdx) {
        match self.nodes[node.0].kind {
            NodeKind::Internal { left, right } => (left, right),
            NodeKind::Leaf(_) => unreachable!("leaf {node:?} has no children"),
        }
    }

    /// Makes a single arc the whole beach line.
    pub(crate) fn insert_root(&mut self, site: SiteIdx) -> NodeIdx {
        debug_assert!(self.root.is_none());
        let root = self.alloc(Node {
            parent: None,
            kind: NodeKind::Leaf(Arc::new(site)),
        });
        self.root = Some(root);
        root
    }

    /// The leftmost arc of `node`'s subtree.
    pub fn first_arc(&self, mut node: NodeIdx) -> NodeIdx {
        while let NodeKind::Internal { left, .. } = self.nodes[node.0].kind {
            node = left;
        }
        node
    }

    /// The rightmost arc of `node`'s subtree.
    pub fn last_arc(&self, mut node: NodeIdx) -> NodeIdx {
        while let NodeKind::Internal { right, .. } = self.nodes[node.0].kind {
            node = right;
        }
        node
    }

    /// The arc immediately left of an internal node's breakpoint.
    pub fn prev_child_arc(&self, node: NodeIdx) -> NodeIdx {
        self.last_arc(self.children_of(node).0)
    }

    /// The arc immediately right of an internal node's breakpoint.
    pub fn next_child_arc(&self, node: NodeIdx) -> NodeIdx {
        self.first_arc(self.children_of(node).1)
    }

    /// The arc to the left of `leaf` on the beach line.
    pub fn prev_arc(&self, leaf: NodeIdx) -> Option<NodeIdx> {
        let mut node = leaf;
        loop {
            let parent = self.nodes[node.0].parent?;
            let (left, right) = self.children_of(parent);
            if node == right {
                return Some(self.last_arc(left));
            }
            node = parent;
        }
    }

    /// The arc to the right of `leaf` on the beach line.
    pub fn next_arc(&self, leaf: NodeIdx) -> Option<NodeIdx> {
        let mut node = leaf;
        loop {
            let parent = self.nodes[node.0].parent?;
            let (left, right) = self.children_of(parent);
            if node == left {
                return Some(self.first_arc(right));
            }
            node = parent;
        }
    }

    /// All arcs in beach-line order. Mainly for inspection and tests.
    pub fn arcs_in_order(&self) -> Vec<NodeIdx> {
        let mut arcs = Vec::new();
        let Some(root) = self.root else {
            return arcs;
        };
        let mut arc = Some(self.first_arc(root));
        while let Some(a) = arc {
            arcs.push(a);
            arc = self.next_arc(a);
        }
        arcs
    }

    /// The arc vertically above `x` with the sweep line at `sweep_y`.
    ///
    /// Descends from the root, steering by the breakpoint of each internal
    /// node. Panics if the beach line is empty or if two adjacent arcs
    /// have no breakpoint; both mean the tree invariants were broken
    /// earlier.
    pub fn locate_arc_above(&self, x: i32, sweep_y: i32, sites: &[Site]) -> NodeIdx {
        let mut node = self.root.expect("beach line is empty");
        loop {
            let NodeKind::Internal { left, right } = &self.nodes[node.0].kind else {
                return node;
            };
            let left_focus = sites[self.arc(self.prev_child_arc(node)).site.0].point();
            let right_focus = sites[self.arc(self.next_child_arc(node)).site.0].point();
            let breakpoint = match breakpoint_x(left_focus, right_focus, sweep_y) {
                Ok(bp) => bp.into_inner(),
                Err(err) => panic!(
                    "beach line corrupted: arcs at {left_focus:?} and {right_focus:?} \
                     have no breakpoint at y={sweep_y}: {err}"
                ),
            };
            node = if f64::from(x) < breakpoint {
                *left
            } else {
                *right
            };
        }
    }

    /// Splits `leaf` under a new site into three arcs.
    ///
    /// The leaf is rewritten in place into a breakpoint with the subtree
    ///
    /// ```text
    ///  (leaf, now internal)
    ///  ├── internal
    ///  │   ├── old_left   (copy of the old arc)
    ///  │   └── new_middle (the new site's arc)
    ///  └── old_right      (copy of the old arc)
    /// ```
    ///
    /// Both copies keep the old arc's event registrations; the old left
    /// and right edge lists move to the copy on their side. Returns
    /// `(old_left, new_middle, old_right)`.
    pub(crate) fn split_arc(
        &mut self,
        leaf: NodeIdx,
        new_site: SiteIdx,
    ) -> (NodeIdx, NodeIdx, NodeIdx) {
        let placeholder = NodeKind::Internal {
            left: leaf,
            right: leaf,
        };
        let mut old = match std::mem::replace(&mut self.nodes[leaf.0].kind, placeholder) {
            NodeKind::Leaf(arc) => arc,
            NodeKind::Internal { .. } => panic!("split target {leaf:?} is not an arc"),
        };

        let old_left = self.alloc(Node {
            parent: None,
            kind: NodeKind::Leaf(Arc {
                site: old.site,
                events_left: old.events_left.clone(),
                events_middle: old.events_middle.clone(),
                events_right: old.events_right.clone(),
                left_edges: std::mem::take(&mut old.left_edges),
                right_edges: Vec::new(),
            }),
        });
        let new_middle = self.alloc(Node {
            parent: None,
            kind: NodeKind::Leaf(Arc::new(new_site)),
        });
        let inner = self.alloc(Node {
            parent: Some(leaf),
            kind: NodeKind::Internal {
                left: old_left,
                right: new_middle,
            },
        });
        let old_right = self.alloc(Node {
            parent: Some(leaf),
            kind: NodeKind::Leaf(Arc {
                site: old.site,
                events_left: old.events_left,
                events_middle: old.events_middle,
                events_right: old.events_right,
                left_edges: Vec::new(),
                right_edges: old.right_edges,
            }),
        });

        self.nodes[old_left.0].parent = Some(inner);
        self.nodes[new_middle.0].parent = Some(inner);
        self.nodes[leaf.0].kind = NodeKind::Internal {
            left: inner,
            right: old_right,
        };
        (old_left, new_middle, old_right)
    }

    /// Splices `leaf` out of the tree, collapsing its parent breakpoint.
    ///
    /// The sibling takes the parent's place (or becomes the root). The
    /// spliced-out nodes stay allocated, so indices held elsewhere do not
    /// dangle.
    pub(crate) fn remove_arc(&mut self, leaf: NodeIdx) {
        let Some(parent) = self.nodes[leaf.0].parent else {
            self.root = None;
            return;
        };
        let (left, right) = self.children_of(parent);
        let sibling = if left == leaf { right } else { left };

        match self.nodes[parent.0].parent {
            None => {
                self.root = Some(sibling);
                self.nodes[sibling.0].parent = None;
            }
            Some(grandparent) => {
                match &mut self.nodes[grandparent.0].kind {
                    NodeKind::Internal { left, right } => {
                        if *left == parent {
                            *left = sibling;
                        } else {
                            *right = sibling;
                        }
                    }
                    NodeKind::Leaf(_) => unreachable!("parent node is a leaf"),
                }
                self.nodes[sibling.0].parent = Some(grandparent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point;

    fn sites(points: &[(i32, i32)]) -> Vec<Site> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Site::new(Point::new(x, y), i as u64))
            .collect()
    }

    fn focus_order(tree: &BeachTree) -> Vec<usize> {
        tree.arcs_in_order()
            .iter()
            .map(|&n| tree.arc(n).site().as_usize())
            .collect()
    }

    #[test]
    fn split_keeps_leaf_order() {
        let mut tree = BeachTree::new();
        let root = tree.insert_root(SiteIdx(0));
        let (old_left, new_middle, old_right) = tree.split_arc(root, SiteIdx(1));

        assert_eq!(focus_order(&tree), vec![0, 1, 0]);
        assert!(!tree[root].is_leaf());
        assert_eq!(tree.prev_arc(new_middle), Some(old_left));
        assert_eq!(tree.next_arc(new_middle), Some(old_right));
        assert_eq!(tree.prev_arc(old_left), None);
        assert_eq!(tree.next_arc(old_right), None);

        // Split one of the copies again.
        let (_, middle2, _) = tree.split_arc(old_right, SiteIdx(2));
        assert_eq!(focus_order(&tree), vec![0, 1, 0, 2, 0]);
        assert_eq!(
            tree.prev_arc(middle2).map(|n| tree.arc(n).site()),
            Some(SiteIdx(0))
        );
    }

    #[test]
    fn split_moves_edge_lists_to_the_matching_copies() {
        let mut tree = BeachTree::new();
        let root = tree.insert_root(SiteIdx(0));
        let (_, middle, _) = tree.split_arc(root, SiteIdx(1));
        tree.arc_mut(middle).left_edges.push(HalfEdgeIdx::test(7));
        tree.arc_mut(middle).right_edges.push(HalfEdgeIdx::test(8));

        let (left, _, right) = tree.split_arc(middle, SiteIdx(2));
        assert_eq!(tree.arc(left).left_edges(), &[HalfEdgeIdx::test(7)]);
        assert!(tree.arc(left).right_edges().is_empty());
        assert!(tree.arc(right).left_edges().is_empty());
        assert_eq!(tree.arc(right).right_edges(), &[HalfEdgeIdx::test(8)]);
    }

    #[test]
    fn remove_arc_splices_out_leaf_and_parent() {
        let mut tree = BeachTree::new();
        let root = tree.insert_root(SiteIdx(0));
        let (_, middle, old_right) = tree.split_arc(root, SiteIdx(1));
        let (_, middle2, _) = tree.split_arc(old_right, SiteIdx(2));

        // [0, 1, 0, 2, 0] -> drop the middle "2" arc.
        tree.remove_arc(middle2);
        assert_eq!(focus_order(&tree), vec![0, 1, 0, 0]);

        // Drop the "1" arc, whose parent is the tree root's left child.
        tree.remove_arc(middle);
        assert_eq!(focus_order(&tree), vec![0, 0, 0]);
    }

    #[test]
    fn remove_arc_of_root_leaf_empties_the_tree() {
        let mut tree = BeachTree::new();
        let root = tree.insert_root(SiteIdx(0));
        tree.remove_arc(root);
        assert!(tree.is_empty());
    }

    #[test]
    fn remove_arc_promotes_sibling_to_root() {
        let mut tree = BeachTree::new();
        let root = tree.insert_root(SiteIdx(0));
        let (_, middle, old_right) = tree.split_arc(root, SiteIdx(1));
        // The root's left child is the breakpoint holding [0, 1]; removing
        // the rightmost arc makes that subtree the whole beach line.
        tree.remove_arc(old_right);
        assert_eq!(focus_order(&tree), vec![0, 1]);
        assert_eq!(tree.prev_arc(middle).map(|n| tree.arc(n).site()), Some(SiteIdx(0)));
    }

    #[test]
    fn locate_descends_by_breakpoints() {
        // Two sites on the same row: every breakpoint between their arcs
        // sits on their bisector at x = 200, wherever the sweep line is.
        let sites = sites(&[(100, 100), (300, 100)]);
        let mut tree = BeachTree::new();
        let root = tree.insert_root(SiteIdx(0));
        let (old_left, _, old_right) = tree.split_arc(root, SiteIdx(1));

        assert_eq!(tree.locate_arc_above(150, 300, &sites), old_left);
        // At and right of the breakpoint, the descent goes right.
        assert_eq!(tree.locate_arc_above(200, 300, &sites), old_right);
        assert_eq!(tree.locate_arc_above(250, 300, &sites), old_right);
    }
}
