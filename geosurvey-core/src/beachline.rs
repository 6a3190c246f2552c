//! The event-ordered beach line (C2): an arena-indexed binary tree whose
//! leaves are parabolic arcs and whose internal nodes are breakpoints,
//! ordered left-to-right by current x position. Arcs and breakpoints
//! live in one `Vec<BeachlineEntry>`; references between them are plain
//! `usize` indices into that arena, and the whole arena is dropped at
//! once when the sweep ends.

use ordered_float::OrderedFloat;

use crate::geometry::Point;
use crate::site::{Arc, BreakPoint, Site};

struct BeachlineEntry {
    left_child: Option<usize>,
    right_child: Option<usize>,
    parent: Option<usize>,
    data: BeachlineData,
}

impl BeachlineEntry {
    fn new(
        left_child: Option<usize>,
        right_child: Option<usize>,
        parent: Option<usize>,
        data: BeachlineData,
    ) -> Self {
        Self {
            left_child,
            right_child,
            parent,
            data,
        }
    }
}

enum BeachlineData {
    BreakPoint(BreakPoint),
    Arc(Arc),
}

/// A freshly split arc triple plus the two breakpoints now sitting
/// between them, and the indices the caller needs to check for new
/// circle events.
pub struct SplitResult {
    pub left_arc_idx: usize,
    pub right_arc_idx: usize,
}

pub struct Beachline {
    root: Option<usize>,
    nodes: Vec<BeachlineEntry>,
}

impl Beachline {
    pub fn new() -> Self {
        Self {
            root: None,
            nodes: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn add_first_parabola(&mut self, site: Site) {
        assert!(self.root.is_none(), "beach line already has a root arc");
        let entry = BeachlineEntry::new(None, None, None, BeachlineData::Arc(Arc::new(site)));
        self.root = Some(self.nodes.len());
        self.nodes.push(entry);
    }

    /// Locates the arc directly above `p.x` at sweep-line `yl`.
    pub fn arc_under_point(&self, p: &Point, yl: OrderedFloat<f64>) -> Option<(Arc, usize)> {
        self.root.map(|mut curr_idx| loop {
            let node = &self.nodes[curr_idx];
            match &node.data {
                BeachlineData::BreakPoint(bp) => {
                    let x = bp.position_at(yl);
                    if p.x < x {
                        curr_idx = node.left_child.unwrap();
                    } else {
                        curr_idx = node.right_child.unwrap();
                    }
                }
                BeachlineData::Arc(arc) => return (*arc, curr_idx),
            }
        })
    }

    /// Site-event insertion: split arc `arc_idx` into
    /// `A_left, new, A_right` and patch in the two new breakpoints. Both
    /// the degenerate (same-y) and general cases are handled by this one
    /// routine — when the sweep line sits exactly on both foci, the
    /// breakpoint formulas degenerate to a single vertical split and the
    /// two new breakpoints are born coincident, which behaves exactly
    /// like inserting one breakpoint between the old and new arc (the
    /// general formulas already subsume the degenerate case; see
    /// DESIGN.md).
    pub fn split_arc(
        &mut self,
        arc_idx: usize,
        a: Arc,
        xl: BreakPoint,
        b: Arc,
        xr: BreakPoint,
        c: Arc,
    ) -> SplitResult {
        let parent = self.nodes[arc_idx].parent;

        let a_idx = self.nodes.len();
        let xl_idx = a_idx + 1;
        let b_idx = a_idx + 2;
        let xr_idx = a_idx + 3;
        let c_idx = a_idx + 4;

        let a_entry = BeachlineEntry::new(None, None, Some(xl_idx), BeachlineData::Arc(a));
        let xl_entry = BeachlineEntry::new(
            Some(a_idx),
            Some(xr_idx),
            parent,
            BeachlineData::BreakPoint(xl),
        );
        let b_entry = BeachlineEntry::new(None, None, Some(xr_idx), BeachlineData::Arc(b));
        let xr_entry = BeachlineEntry::new(
            Some(b_idx),
            Some(c_idx),
            Some(xl_idx),
            BeachlineData::BreakPoint(xr),
        );
        let c_entry = BeachlineEntry::new(None, None, Some(xr_idx), BeachlineData::Arc(c));

        self.nodes.push(a_entry);
        self.nodes.push(xl_entry);
        self.nodes.push(b_entry);
        self.nodes.push(xr_entry);
        self.nodes.push(c_entry);

        if let Some(parent_idx) = parent {
            let parent_node = &mut self.nodes[parent_idx];
            if parent_node.left_child.unwrap() == arc_idx {
                parent_node.left_child = Some(xl_idx);
            } else {
                parent_node.right_child = Some(xl_idx);
            }
        } else {
            self.root = Some(xl_idx);
        }

        SplitResult {
            left_arc_idx: a_idx,
            right_arc_idx: c_idx,
        }
    }

    /// Circle-event removal: collapse the breakpoints either side
    /// of `arc_idx` into one merged breakpoint `x`, dropping `arc_idx`
    /// (and its surrounding breakpoints) out of the tree.
    pub fn collapse_arc(&mut self, arc_idx: usize, x: BreakPoint) {
        let (xl_idx, xr_idx) = (
            self.left_edge(arc_idx).expect("left edge not found").1,
            self.right_edge(arc_idx).expect("right edge not found").1,
        );

        let parent_idx = self.nodes[arc_idx]
            .parent
            .expect("collapse_arc: parent not found");

        let other_node = if parent_idx == xr_idx {
            &mut self.nodes[xl_idx]
        } else {
            &mut self.nodes[xr_idx]
        };
        other_node.data = BeachlineData::BreakPoint(x);

        let parent_node = &self.nodes[parent_idx];
        let sibling = if parent_node.left_child.unwrap() == arc_idx {
            parent_node.right_child
        } else if parent_node.right_child.unwrap() == arc_idx {
            parent_node.left_child
        } else {
            panic!("parent not claiming child")
        };

        let granny_idx = parent_node.parent.expect("collapse_arc: grandparent lost");
        let granny_node = &mut self.nodes[granny_idx];
        if granny_node.left_child.unwrap() == parent_idx {
            granny_node.left_child = sibling;
        } else if granny_node.right_child.unwrap() == parent_idx {
            granny_node.right_child = sibling;
        } else {
            panic!("grandparent not claiming parent")
        }
    }

    fn minimum(&self, mut curr_idx: usize) -> usize {
        loop {
            let node = &self.nodes[curr_idx];
            match &node.data {
                BeachlineData::BreakPoint(..) => curr_idx = node.left_child.unwrap(),
                BeachlineData::Arc(..) => return curr_idx,
            }
        }
    }

    fn maximum(&self, mut curr_idx: usize) -> usize {
        loop {
            let node = &self.nodes[curr_idx];
            match &node.data {
                BeachlineData::BreakPoint(..) => curr_idx = node.right_child.unwrap(),
                BeachlineData::Arc(..) => return curr_idx,
            }
        }
    }

    fn predecessor(&self, mut curr_idx: usize) -> Option<usize> {
        while self.nodes[curr_idx].parent.is_some()
            && self.nodes[self.nodes[curr_idx].parent.unwrap()]
                .left_child
                .unwrap()
                == curr_idx
        {
            curr_idx = self.nodes[curr_idx].parent.unwrap();
        }
        self.nodes[curr_idx].parent
    }

    fn successor(&self, mut curr_idx: usize) -> Option<usize> {
        while self.nodes[curr_idx].parent.is_some()
            && self.nodes[self.nodes[curr_idx].parent.unwrap()]
                .right_child
                .unwrap()
                == curr_idx
        {
            curr_idx = self.nodes[curr_idx].parent.unwrap();
        }
        self.nodes[curr_idx].parent
    }

    pub fn left_arc(&self, arc_idx: usize) -> Option<(Arc, usize)> {
        self.predecessor(arc_idx)
            .and_then(|pred| self.nodes[pred].left_child)
            .map(|left_idx| {
                let arc_idx = self.maximum(left_idx);
                (*self.arc(arc_idx), arc_idx)
            })
    }

    pub fn right_arc(&self, arc_idx: usize) -> Option<(Arc, usize)> {
        self.successor(arc_idx)
            .and_then(|succ| self.nodes[succ].right_child)
            .map(|right_idx| {
                let arc_idx = self.minimum(right_idx);
                (*self.arc(arc_idx), arc_idx)
            })
    }

    pub fn arc(&self, idx: usize) -> &Arc {
        match &self.nodes[idx].data {
            BeachlineData::BreakPoint(..) => panic!("beachline node {idx} is not an arc"),
            BeachlineData::Arc(arc) => arc,
        }
    }

    pub fn left_edge(&self, arc_idx: usize) -> Option<(BreakPoint, usize)> {
        self.predecessor(arc_idx)
            .and_then(|pred| match &self.nodes[pred].data {
                BeachlineData::BreakPoint(bp) => Some((*bp, pred)),
                _ => None,
            })
    }

    pub fn right_edge(&self, arc_idx: usize) -> Option<(BreakPoint, usize)> {
        self.successor(arc_idx)
            .and_then(|succ| match &self.nodes[succ].data {
                BeachlineData::BreakPoint(bp) => Some((*bp, succ)),
                _ => None,
            })
    }

    /// All breakpoints still present when the sweep ends, in tree order.
    /// `finish` extrapolates each of these to the bounding box.
    pub fn remaining_breakpoints(&self) -> Vec<BreakPoint> {
        let mut out = Vec::new();
        self.collect_breakpoints(self.root, &mut out);
        out
    }

    fn collect_breakpoints(&self, root: Option<usize>, out: &mut Vec<BreakPoint>) {
        if let Some(idx) = root {
            let node = &self.nodes[idx];
            if let BeachlineData::BreakPoint(bp) = &node.data {
                out.push(*bp);
            }
            self.collect_breakpoints(node.left_child, out);
            self.collect_breakpoints(node.right_child, out);
        }
    }
}

impl Default for Beachline {
    fn default() -> Self {
        Self::new()
    }
}
