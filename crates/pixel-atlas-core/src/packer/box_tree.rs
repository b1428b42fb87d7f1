use crate::image_data::Uid;
use crate::model::Rect;

pub(crate) type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Free,
    Occupied(Uid),
    Split([NodeId; 2]),
    /// Slot on the free-list, not part of the tree.
    Vacant,
}

#[derive(Debug, Clone)]
struct Node {
    rect: Rect,
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// Binary box-packing tree over one square page.
///
/// Nodes live in a flat arena and refer to each other by index. The two
/// children of a split node always partition its rectangle exactly. Slots of
/// merged children go on a free-list and are reused by later splits.
#[derive(Debug, Clone)]
pub(crate) struct BoxTree {
    nodes: Vec<Node>,
    vacant: Vec<NodeId>,
}

impl BoxTree {
    pub fn new(size: u16) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            vacant: Vec::new(),
        };
        tree.reset(size);
        tree
    }

    pub fn reset(&mut self, size: u16) {
        self.nodes.clear();
        self.vacant.clear();
        self.nodes.push(Node {
            rect: Rect::new(0, 0, u32::from(size), u32::from(size)),
            parent: None,
            kind: NodeKind::Free,
        });
    }

    pub fn rect(&self, id: NodeId) -> Rect {
        self.nodes[id].rect
    }

    pub fn owner(&self, id: NodeId) -> Option<Uid> {
        match self.nodes.get(id)?.kind {
            NodeKind::Occupied(uid) => Some(uid),
            _ => None,
        }
    }

    /// Smallest free leaf that holds a `w`x`h` box, with its area. Ties go to
    /// the lower node index.
    pub fn best_fit(&self, w: u32, h: u32) -> Option<(NodeId, u64)> {
        let mut best: Option<(NodeId, u64)> = None;
        for (id, node) in self.nodes.iter().enumerate() {
            if node.kind != NodeKind::Free || !node.rect.fits(w, h) {
                continue;
            }
            let area = node.rect.area();
            if best.is_none_or(|(_, a)| area < a) {
                best = Some((id, area));
            }
        }
        best
    }

    /// Splits free leaf `id` until a leaf of exactly `w`x`h` remains, marks
    /// it occupied by `uid`, and returns it.
    ///
    /// Each split cuts along the axis with the larger leftover, so the first
    /// child keeps the requested extent on that axis and recursion continues
    /// into it.
    pub fn insert(&mut self, id: NodeId, w: u32, h: u32, uid: Uid) -> NodeId {
        let mut id = id;
        loop {
            let r = self.nodes[id].rect;
            debug_assert!(self.nodes[id].kind == NodeKind::Free && r.fits(w, h));
            if r.w == w && r.h == h {
                self.nodes[id].kind = NodeKind::Occupied(uid);
                return id;
            }
            let dw = r.w - w;
            let dh = r.h - h;
            let (first, second) = if dw > dh {
                (Rect::new(r.x, r.y, w, r.h), Rect::new(r.x + w, r.y, dw, r.h))
            } else {
                (Rect::new(r.x, r.y, r.w, h), Rect::new(r.x, r.y + h, r.w, dh))
            };
            let a = self.alloc(first, id);
            let b = self.alloc(second, id);
            self.nodes[id].kind = NodeKind::Split([a, b]);
            id = a;
        }
    }

    /// Frees occupied leaf `id`. With `merge`, split nodes whose children are
    /// both free collapse back into a single free leaf, walking up the tree.
    pub fn release(&mut self, id: NodeId, merge: bool) {
        if !matches!(self.nodes[id].kind, NodeKind::Occupied(_)) {
            return;
        }
        self.nodes[id].kind = NodeKind::Free;
        if !merge {
            return;
        }
        let mut cur = self.nodes[id].parent;
        while let Some(p) = cur {
            let NodeKind::Split([a, b]) = self.nodes[p].kind else {
                break;
            };
            if self.nodes[a].kind != NodeKind::Free || self.nodes[b].kind != NodeKind::Free {
                break;
            }
            self.dealloc(a);
            self.dealloc(b);
            self.nodes[p].kind = NodeKind::Free;
            cur = self.nodes[p].parent;
        }
    }

    pub fn occupied_area(&self) -> u64 {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Occupied(_)))
            .map(|n| n.rect.area())
            .sum()
    }

    pub fn free_leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Free).count()
    }

    /// True when the whole page is a single free leaf.
    pub fn is_empty(&self) -> bool {
        self.nodes[ROOT].kind == NodeKind::Free
    }

    fn alloc(&mut self, rect: Rect, parent: NodeId) -> NodeId {
        let node = Node {
            rect,
            parent: Some(parent),
            kind: NodeKind::Free,
        };
        match self.vacant.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn dealloc(&mut self, id: NodeId) {
        self.nodes[id].kind = NodeKind::Vacant;
        self.nodes[id].parent = None;
        self.vacant.push(id);
    }

    #[cfg(test)]
    fn leaves(&self) -> Vec<Rect> {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Free | NodeKind::Occupied(_)))
            .map(|n| n.rect)
            .collect()
    }

    #[cfg(test)]
    fn check_partition(&self, id: NodeId) {
        if let NodeKind::Split([a, b]) = self.nodes[id].kind {
            let (p, ra, rb) = (self.nodes[id].rect, self.nodes[a].rect, self.nodes[b].rect);
            assert!(p.contains(&ra) && p.contains(&rb));
            assert!(!ra.intersects(&rb));
            assert_eq!(ra.area() + rb.area(), p.area());
            assert_eq!(self.nodes[a].parent, Some(id));
            assert_eq!(self.nodes[b].parent, Some(id));
            self.check_partition(a);
            self.check_partition(b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_fit_needs_no_split() {
        let mut t = BoxTree::new(64);
        let (id, area) = t.best_fit(64, 64).unwrap();
        assert_eq!(area, 64 * 64);
        let leaf = t.insert(id, 64, 64, Uid::next());
        assert_eq!(leaf, ROOT);
        assert!(t.best_fit(1, 1).is_none());
    }

    #[test]
    fn split_follows_larger_leftover() {
        let mut t = BoxTree::new(100);
        let uid = Uid::next();
        // dw = 90 > dh = 50: vertical cut first
        let leaf = t.insert(ROOT, 10, 50, uid);
        assert_eq!(t.rect(leaf), Rect::new(0, 0, 10, 50));
        assert_eq!(t.owner(leaf), Some(uid));
        let mut leaves = t.leaves();
        leaves.sort_by_key(|r| (r.x, r.y));
        assert_eq!(
            leaves,
            vec![
                Rect::new(0, 0, 10, 50),
                Rect::new(0, 50, 10, 50),
                Rect::new(10, 0, 90, 100),
            ]
        );
        t.check_partition(ROOT);
    }

    #[test]
    fn best_fit_prefers_smallest_leaf() {
        let mut t = BoxTree::new(128);
        t.insert(ROOT, 100, 100, Uid::next());
        // free leaves are now 128x28 and 28x100
        let (id, _) = t.best_fit(20, 20).unwrap();
        assert_eq!(t.rect(id), Rect::new(100, 0, 28, 100));
    }

    #[test]
    fn release_merges_back_to_root() {
        let mut t = BoxTree::new(256);
        let a = t.insert(t.best_fit(30, 40).unwrap().0, 30, 40, Uid::next());
        let b = t.insert(t.best_fit(70, 20).unwrap().0, 70, 20, Uid::next());
        let c = t.insert(t.best_fit(5, 5).unwrap().0, 5, 5, Uid::next());
        t.check_partition(ROOT);
        for id in [b, a, c] {
            t.release(id, true);
            t.check_partition(ROOT);
        }
        assert!(t.is_empty());
        assert_eq!(t.free_leaf_count(), 1);
    }

    #[test]
    fn release_without_merge_keeps_leaves() {
        let mut t = BoxTree::new(256);
        let a = t.insert(ROOT, 30, 40, Uid::next());
        let before = t.free_leaf_count();
        t.release(a, false);
        assert_eq!(t.free_leaf_count(), before + 1);
        assert!(!t.is_empty());
        // the freed leaf is reused for an equal request
        assert_eq!(t.best_fit(30, 40).map(|(id, _)| id), Some(a));
    }

    #[test]
    fn vacant_slots_are_reused() {
        let mut t = BoxTree::new(64);
        let a = t.insert(ROOT, 10, 10, Uid::next());
        let len = t.nodes.len();
        t.release(a, true);
        t.insert(ROOT, 10, 10, Uid::next());
        assert_eq!(t.nodes.len(), len);
    }

    #[test]
    fn release_of_free_leaf_is_ignored() {
        let mut t = BoxTree::new(32);
        t.release(ROOT, true);
        assert!(t.is_empty());
    }
}
