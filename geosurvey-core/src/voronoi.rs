//! The Voronoi generator (C3): drives Fortune's sweep over two priority
//! queues — one for site events, one for circle events — and assembles
//! the Voronoi edges, the dual Delaunay edges and triangles, and a
//! per-site neighbor map.
//!
//! The two event kinds are kept in separate queues rather than folded
//! into one combined queue: a plain `BinaryHeap` for site events (they
//! are never removed once queued) and a keyed
//! `priority_queue::PriorityQueue` for circle events, which does need
//! removal — an arc's pending circle event must be dropped the instant
//! the arc is invalidated by a later site or circle event.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;

use crate::beachline::Beachline;
use crate::geometry::{
    bounded_segment, circumcenter, distance, normal_vector, point_on_arc_at_x, BoundingBox, Point,
    Segment,
};
use crate::site::{Arc, BreakPoint, Site};

/// The full output of one sweep: the Voronoi diagram's edges, and the
/// Delaunay dual needed by the mesh builder (C4).
#[derive(Debug, Default)]
pub struct Triangulation {
    pub voronoi_edges: Vec<Segment>,
    pub delaunay_edges: HashSet<(u32, u32)>,
    pub triangles: Vec<[u32; 3]>,
    pub neighbors: HashMap<u32, HashSet<u32>>,
}

impl Triangulation {
    pub fn has_edge(&self, a: u32, b: u32) -> bool {
        self.delaunay_edges.contains(&normalized_edge(a, b))
    }
}

fn normalized_edge(a: u32, b: u32) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn record_delaunay_edge(t: &mut Triangulation, a: u32, b: u32) {
    if a == b {
        return;
    }
    t.delaunay_edges.insert(normalized_edge(a, b));
    t.neighbors.entry(a).or_default().insert(b);
    t.neighbors.entry(b).or_default().insert(a);
}

/// Priority for the circle-event queue: ordered by y, ties broken by a
/// stable enqueue order (the earliest-enqueued circle event at a given y
/// wins).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CirclePriority(OrderedFloat<f64>, Reverse<u64>);

/// The circumcircle of an arc and its two current neighbors. `None`
/// when the arc has no neighbor on one side, when the two neighbors are
/// the same site (can happen right after a degenerate split), when the
/// three sites are collinear, or when the predicted vertex lies in the
/// sweep's past.
fn predict_circle_event(
    beachline: &Beachline,
    arc_idx: usize,
    yl: OrderedFloat<f64>,
) -> Option<(Point, OrderedFloat<f64>)> {
    let p = beachline.arc(arc_idx);
    let (l, _) = beachline.left_arc(arc_idx)?;
    let (r, _) = beachline.right_arc(arc_idx)?;
    if l.site == r.site {
        return None;
    }

    let center = circumcenter(&l.site.point, &p.site.point, &r.site.point)?;
    let radius = distance(&p.site.point, &center);
    let circle_top = center.y - radius;
    if circle_top > yl {
        return None;
    }
    Some((center, circle_top))
}

struct Sweep {
    circle_seq: u64,
}

impl Sweep {
    fn check(
        &mut self,
        beachline: &Beachline,
        arc_idx: usize,
        yl: OrderedFloat<f64>,
        circle_queue: &mut PriorityQueue<usize, CirclePriority>,
    ) {
        if let Some((_, y)) = predict_circle_event(beachline, arc_idx, yl) {
            self.circle_seq += 1;
            circle_queue.push(arc_idx, CirclePriority(y, Reverse(self.circle_seq)));
        }
    }

    fn add_site(
        &mut self,
        site: Site,
        yl: OrderedFloat<f64>,
        beachline: &mut Beachline,
        circle_queue: &mut PriorityQueue<usize, CirclePriority>,
        out: &mut Triangulation,
    ) {
        let Some((arc, arc_idx)) = beachline.arc_under_point(&site.point, yl) else {
            beachline.add_first_parabola(site);
            return;
        };

        circle_queue.remove(&arc_idx);

        let a = Arc::new(arc.site);
        let b = Arc::new(site);
        let c = Arc::new(arc.site);

        let edge_origin = point_on_arc_at_x(&arc.site.point, yl, site.point.x);
        let xl = BreakPoint::new(
            edge_origin,
            normal_vector(a.site.point - b.site.point),
            a.site,
            b.site,
        );
        let xr = BreakPoint::new(
            edge_origin,
            normal_vector(b.site.point - c.site.point),
            b.site,
            c.site,
        );

        let split = beachline.split_arc(arc_idx, a, xl, b, xr, c);
        record_delaunay_edge(out, arc.site.addr, site.addr);

        self.check(beachline, split.left_arc_idx, yl, circle_queue);
        self.check(beachline, split.right_arc_idx, yl, circle_queue);
    }

    fn remove_arc(
        &mut self,
        arc_idx: usize,
        yl: OrderedFloat<f64>,
        beachline: &mut Beachline,
        circle_queue: &mut PriorityQueue<usize, CirclePriority>,
        out: &mut Triangulation,
    ) {
        let p = *beachline.arc(arc_idx);
        let (l, l_idx) = beachline
            .left_arc(arc_idx)
            .expect("circle event fired without a left neighbor");
        let (r, r_idx) = beachline
            .right_arc(arc_idx)
            .expect("circle event fired without a right neighbor");

        circle_queue.remove(&arc_idx);
        circle_queue.remove(&l_idx);
        circle_queue.remove(&r_idx);

        let s = circumcenter(&l.site.point, &p.site.point, &r.site.point)
            .expect("circle event fired for collinear sites");

        let (xl, _) = beachline.left_edge(arc_idx).expect("missing left edge");
        let (xr, _) = beachline.right_edge(arc_idx).expect("missing right edge");

        out.voronoi_edges.push([xl.start, s]);
        out.voronoi_edges.push([xr.start, s]);

        record_delaunay_edge(out, l.site.addr, r.site.addr);
        out.triangles.push([l.site.addr, p.site.addr, r.site.addr]);

        let x = BreakPoint::new(s, normal_vector(l.site.point - r.site.point), l.site, r.site);
        beachline.collapse_arc(arc_idx, x);

        self.check(beachline, l_idx, yl, circle_queue);
        self.check(beachline, r_idx, yl, circle_queue);
    }
}

/// Runs Fortune's algorithm over `sites` (assumed already deduplicated —
/// duplicate coordinates are undefined behavior) and returns
/// the full triangulation. `bounding_box` only bounds the *Voronoi* edges
/// emitted at `finish`; it has no bearing on the Delaunay dual.
pub fn run(sites: &[Site], bounding_box: &BoundingBox) -> Triangulation {
    let mut out = Triangulation::default();
    if sites.is_empty() {
        return out;
    }

    let mut beachline = Beachline::new();
    let mut site_queue: BinaryHeap<Reverse<Site>> =
        sites.iter().copied().map(Reverse).collect();
    let mut circle_queue: PriorityQueue<usize, CirclePriority> = PriorityQueue::new();
    let mut sweep = Sweep { circle_seq: 0 };

    loop {
        let next_is_site = match (site_queue.peek(), circle_queue.peek()) {
            (None, None) => break,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some(Reverse(site)), Some((_, priority))) => site.point.y >= priority.0,
        };

        if next_is_site {
            let Reverse(site) = site_queue.pop().unwrap();
            let yl = site.point.y;
            sweep.add_site(site, yl, &mut beachline, &mut circle_queue, &mut out);
        } else {
            let (arc_idx, priority) = circle_queue.pop().unwrap();
            let yl = priority.0;
            sweep.remove_arc(arc_idx, yl, &mut beachline, &mut circle_queue, &mut out);
        }
    }

    for bp in beachline.remaining_breakpoints() {
        out.voronoi_edges
            .push(bounded_segment(&bp.start, &bp.direction, bounding_box));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(addr: u32, x: f64, y: f64) -> Site {
        Site::new(addr, Point::from_f64(x, y))
    }

    #[test]
    fn every_site_appears_in_delaunay_edges() {
        let sites = vec![
            site(0, 250.0, 250.0),
            site(1, 500.0, 750.0),
            site(2, 750.0, 250.0),
            site(3, 500.0, 400.0),
        ];
        let bbox = BoundingBox::new(0.0.into(), 1000.0.into(), 0.0.into(), 1000.0.into());
        let tri = run(&sites, &bbox);

        for s in &sites {
            let touches = tri
                .delaunay_edges
                .iter()
                .any(|(a, b)| *a == s.addr || *b == s.addr);
            assert!(touches, "site {} missing from delaunay edges", s.addr);
        }
        for [a, b, c] in &tri.triangles {
            for addr in [a, b, c] {
                assert!((*addr as usize) < sites.len());
            }
        }
    }

    #[test]
    fn voronoi_edges_are_finite() {
        let sites = vec![
            site(0, 250.0, 500.0),
            site(1, 750.0, 500.0),
            site(2, 500.0, 900.0),
        ];
        let bbox = BoundingBox::new(0.0.into(), 1000.0.into(), 0.0.into(), 1000.0.into());
        let tri = run(&sites, &bbox);
        assert!(!tri.voronoi_edges.is_empty());
        for seg in &tri.voronoi_edges {
            assert!(seg[0].is_finite());
            assert!(seg[1].is_finite());
        }
    }

    #[test]
    fn two_sites_produce_one_bisector_and_mutual_edge() {
        use crate::test_utils::compare_edges;

        let sites = vec![site(0, 250.0, 500.0), site(1, 750.0, 500.0)];
        let bbox = BoundingBox::new(0.0.into(), 1000.0.into(), 0.0.into(), 1000.0.into());
        let tri = run(&sites, &bbox);
        assert_eq!(tri.voronoi_edges.len(), 2);
        assert!(tri.has_edge(0, 1));
        assert!(tri.triangles.is_empty());

        let gold = [
            [Point::new(500.0.into(), 500.0.into()), Point::new(500.0.into(), 1000.0.into())],
            [Point::new(500.0.into(), 500.0.into()), Point::new(500.0.into(), 0.0.into())],
        ];
        assert!(compare_edges(&gold, &tri.voronoi_edges));
    }

    #[test]
    fn collinear_sites_yield_no_triangle() {
        // Distinct y values keep this in the general (non-same-sweep-line)
        // insertion path; collinearity only suppresses the circle event.
        let sites = vec![
            site(0, 100.0, 100.0),
            site(1, 500.0, 500.0),
            site(2, 900.0, 900.0),
        ];
        let bbox = BoundingBox::new(0.0.into(), 1000.0.into(), 0.0.into(), 1000.0.into());
        let tri = run(&sites, &bbox);
        assert!(tri.triangles.is_empty());
        for s in &sites {
            let touches = tri
                .delaunay_edges
                .iter()
                .any(|(a, b)| *a == s.addr || *b == s.addr);
            assert!(touches);
        }
    }
}
