//! The sweep engine: pops events in `(y, x)` order, maintains the beach
//! line and writes the diagram into the DCEL.

use log::{debug, trace};

use crate::beach::{BeachTree, NodeIdx};
use crate::dcel::{Dcel, FaceIdx};
use crate::geom::{circumcircle, round_coord, Parabola, Point, Rect, Site, SiteIdx};
use crate::queue::{EventKind, EventQueue};

/// A Voronoi diagram generator.
///
/// Construct one from a set of distinct sites, call [`Voronoi::generate`]
/// (or [`Voronoi::step`] repeatedly, for visualization), then read the
/// result out of [`Voronoi::dcel`]. The instance exclusively owns all of
/// its working state; it is single-threaded and runs each event to
/// completion on the calling thread.
#[derive(Clone, Debug)]
pub struct Voronoi {
    bounds: Rect,
    sites: Vec<Site>,
    queue: EventQueue,
    beach: BeachTree,
    sweep_y: i32,
    dcel: Dcel,
}

impl Voronoi {
    /// Creates a generator for `sites` within `bounds`.
    ///
    /// Sites are copied and assigned increasing ids in input order. Sites
    /// outside `bounds` are allowed (the core never clips), but duplicate
    /// sites make the numerics undefined; deduplicate first.
    pub fn new_from_sites(sites: &[Point], bounds: Rect) -> Voronoi {
        let sites = sites
            .iter()
            .enumerate()
            .map(|(i, &p)| Site::new(p, i as u64))
            .collect();
        let mut voronoi = Voronoi {
            bounds,
            sites,
            queue: EventQueue::new(),
            beach: BeachTree::new(),
            sweep_y: 0,
            dcel: Dcel::new(),
        };
        voronoi.reset();
        voronoi
    }

    /// Creates a generator from raw `(x, y)` pairs.
    pub fn new_from_points(points: &[(i32, i32)], bounds: Rect) -> Voronoi {
        let sites: Vec<Point> = points.iter().map(|&(x, y)| Point::new(x, y)).collect();
        Voronoi::new_from_sites(&sites, bounds)
    }

    /// Rewinds to the initial state: the event queue holds one site event
    /// per input site, the beach line and DCEL are empty and the sweep
    /// line is back at 0. The input sites and bounds are retained.
    pub fn reset(&mut self) {
        self.queue = EventQueue::new();
        for (i, site) in self.sites.iter_mut().enumerate() {
            site.face = None;
            self.queue.push(site.x, site.y, EventKind::Site(SiteIdx(i)));
        }
        self.beach.clear();
        self.sweep_y = 0;
        self.dcel = Dcel::new();
    }

    /// Runs the sweep to completion.
    pub fn generate(&mut self) {
        while !self.queue.is_empty() {
            self.step();
        }
    }

    /// Processes a single event; a no-op when the queue is empty.
    ///
    /// Events strictly above the sweep line are stale leftovers of
    /// cancelled circles and are discarded without advancing the sweep.
    pub fn step(&mut self) {
        let Some(idx) = self.queue.pop_min() else {
            return;
        };
        let event = self.queue[idx].clone();
        if event.y < self.sweep_y {
            trace!(
                "discarding stale event at ({}, {}) behind sweep line {}",
                event.x,
                event.y,
                self.sweep_y
            );
            return;
        }
        self.sweep_y = event.y;
        match event.kind {
            EventKind::Site(site) => self.handle_site_event(site),
            EventKind::Circle { node, radius } => {
                self.handle_circle_event(event.x, event.y, radius, node)
            }
        }
    }

    /// The diagram built so far. Complete once [`Voronoi::generate`]
    /// returns; safe to read between [`Voronoi::step`] calls.
    pub fn dcel(&self) -> &Dcel {
        &self.dcel
    }

    /// Mutable access to the diagram, for the link-rebuilding queries.
    pub fn dcel_mut(&mut self) -> &mut Dcel {
        &mut self.dcel
    }

    /// The input sites, in id order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// The bounds the diagram was requested over.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The current sweep-line position.
    pub fn sweep_line(&self) -> i32 {
        self.sweep_y
    }

    /// The beach line, for inspection between steps.
    pub fn beach_tree(&self) -> &BeachTree {
        &self.beach
    }

    /// Number of events still queued.
    pub fn event_queue_len(&self) -> usize {
        self.queue.len()
    }

    /// A new site enters the beach line.
    fn handle_site_event(&mut self, site_idx: SiteIdx) {
        let site = self.sites[site_idx.0].point();
        debug!("site event for {site:?}, sweep line at {}", self.sweep_y);

        let face = self.dcel.new_face(self.sites[site_idx.0].id, site_idx);
        self.sites[site_idx.0].face = Some(face);

        if self.beach.is_empty() {
            self.beach.insert_root(site_idx);
            return;
        }

        let above = self.beach.locate_arc_above(site.x, self.sweep_y, &self.sites);
        self.remove_circle_events(Some(above));

        // The point where the new (degenerate, vertical) arc first touches
        // the arc above becomes a vertex, and the two breakpoints that
        // will slide apart from it each trace an edge.
        let focus = self.sites[self.beach.arc(above).site().0].point();
        let touch_y = Parabola::from_focus(focus, self.sweep_y).eval(f64::from(site.x));
        let vertex = self.dcel.new_vertex(site.x, round_coord(touch_y));

        let (old_left, new_middle, old_right) = self.beach.split_arc(above, site_idx);

        let left_face = self.face_of(old_left);
        let middle_face = self.face_of(new_middle);
        let right_face = self.face_of(old_right);

        let (he1, he2) = self.dcel.new_edge(left_face, middle_face, vertex);
        self.beach.arc_mut(old_left).right_edges.push(he1);
        self.beach.arc_mut(new_middle).left_edges.push(he2);

        let (he3, he4) = self.dcel.new_edge(middle_face, right_face, vertex);
        self.beach.arc_mut(new_middle).right_edges.push(he3);
        self.beach.arc_mut(old_right).left_edges.push(he4);

        // The new arc can converge with its neighbors on either side.
        let prev = self.beach.prev_arc(new_middle);
        let prev_prev = prev.and_then(|n| self.beach.prev_arc(n));
        self.add_circle_event(prev_prev, prev, Some(new_middle));

        let next = self.beach.next_arc(new_middle);
        let next_next = next.and_then(|n| self.beach.next_arc(n));
        self.add_circle_event(Some(new_middle), next, next_next);
    }

    /// Three arcs have converged: the middle one vanishes into a vertex.
    fn handle_circle_event(&mut self, x: i32, y: i32, radius: i32, middle: NodeIdx) {
        debug!(
            "circle event at ({x}, {y}), r={radius}, sweep line at {}",
            self.sweep_y
        );
        if !self.beach[middle].is_leaf() {
            // Cancellation keeps events off split arcs, so this cannot
            // happen while the invariants hold.
            debug_assert!(false, "circle event on a non-arc node {middle:?}");
            return;
        }

        // The event fires at the circle's bottom tangent; the vertex is
        // the center.
        let vertex = self.dcel.new_vertex(x, y - radius);

        let left_edges = self.beach.arc(middle).left_edges().to_vec();
        self.dcel.close_twins(&left_edges, vertex);
        let right_edges = self.beach.arc(middle).right_edges().to_vec();
        self.dcel.close_twins(&right_edges, vertex);

        let left = self.beach.prev_arc(middle);
        let right = self.beach.next_arc(middle);
        self.beach.remove_arc(middle);

        self.remove_circle_events(left);
        self.remove_circle_events(Some(middle));
        self.remove_circle_events(right);

        // The boundaries that flanked the vanished arc also end here.
        if let Some(left) = left {
            let edges = self.beach.arc(left).right_edges().to_vec();
            self.dcel.close_twins(&edges, vertex);
        }
        if let Some(right) = right {
            let edges = self.beach.arc(right).left_edges().to_vec();
            self.dcel.close_twins(&edges, vertex);
        }

        let (Some(left), Some(right)) = (left, right) else {
            debug_assert!(false, "circle event without two flanking arcs");
            return;
        };

        // The two outer arcs are now adjacent; a fresh breakpoint leaves
        // the vertex between their faces.
        let left_face = self.face_of(left);
        let right_face = self.face_of(right);
        let (he1, he2) = self.dcel.new_edge(left_face, right_face, vertex);
        self.beach.arc_mut(left).right_edges.push(he1);
        self.beach.arc_mut(right).left_edges.push(he2);

        let left_left = self.beach.prev_arc(left);
        self.add_circle_event(left_left, Some(left), Some(right));
        let right_right = self.beach.next_arc(right);
        self.add_circle_event(Some(left), Some(right), right_right);
    }

    /// Schedules a circle event for three consecutive arcs, unless the
    /// triple has no circle or the circle is already behind the sweep.
    fn add_circle_event(&mut self, a: Option<NodeIdx>, b: Option<NodeIdx>, c: Option<NodeIdx>) {
        let (Some(a), Some(b), Some(c)) = (a, b, c) else {
            return;
        };
        let pa = self.sites[self.beach.arc(a).site().0].point();
        let pb = self.sites[self.beach.arc(b).site().0].point();
        let pc = self.sites[self.beach.arc(c).site().0].point();

        let circle = match circumcircle(pa, pb, pc) {
            Ok(circle) => circle,
            Err(err) => {
                trace!("no circle event for {pa:?} {pb:?} {pc:?}: {err}");
                return;
            }
        };
        // The event fires when the sweep line becomes tangent to the
        // circle's bottom.
        let Some(bottom_y) = circle.y.checked_add(circle.r) else {
            return;
        };
        if bottom_y <= self.sweep_y {
            return;
        }

        debug!("circle event for {pa:?} {pb:?} {pc:?} scheduled at y={bottom_y}");
        let event = self.queue.push(
            circle.x,
            bottom_y,
            EventKind::Circle {
                node: b,
                radius: circle.r,
            },
        );
        self.beach.arc_mut(a).events_left.push(event);
        self.beach.arc_mut(b).events_middle.push(event);
        self.beach.arc_mut(c).events_right.push(event);
    }

    /// Cancels every circle event the arc participates in, in any role,
    /// and clears the arc's event lists.
    fn remove_circle_events(&mut self, arc: Option<NodeIdx>) {
        let Some(arc) = arc else {
            return;
        };
        for event in self.beach.arc_mut(arc).take_events() {
            if self.queue[event].is_queued() {
                trace!("cancelling circle event {event:?}");
                self.queue.remove(event);
            }
        }
    }

    fn face_of(&self, arc: NodeIdx) -> FaceIdx {
        let site = self.beach.arc(arc).site();
        // expect: an arc's site always entered the beach line through its
        // own site event, which created the face.
        self.sites[site.0]
            .face
            .expect("beach arc's site has no face")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Rect {
        Rect::new(Point::new(0, 0), Point::new(600, 480))
    }

    #[test]
    fn empty_input_generates_nothing() {
        let mut v = Voronoi::new_from_points(&[], bounds());
        v.generate();
        assert_eq!(v.dcel().faces().len(), 0);
        assert_eq!(v.event_queue_len(), 0);
        assert_eq!(v.sweep_line(), 0);
    }

    #[test]
    fn sites_get_ids_and_faces_in_input_order() {
        let mut v = Voronoi::new_from_points(&[(200, 300), (100, 100)], bounds());
        v.generate();
        assert_eq!(v.sites()[0].id, 0);
        assert_eq!(v.sites()[1].id, 1);
        // The second input site is swept first, but face ids still equal
        // site ids.
        for site in v.sites() {
            let face = site.face().unwrap();
            assert_eq!(v.dcel()[face].id, site.id);
        }
    }

    #[test]
    fn sweep_line_is_monotone_while_stepping() {
        let mut v = Voronoi::new_from_points(&[(100, 100), (200, 300)], bounds());
        let mut last = 0;
        while v.event_queue_len() > 0 {
            v.step();
            assert!(v.sweep_line() >= last);
            last = v.sweep_line();
        }
    }
}
