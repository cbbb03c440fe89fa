//! The doubly-connected edge list the sweep writes its output into.
//!
//! Faces, vertices and half-edges live in indexed arenas and refer to each
//! other by index, so the cyclic twin/next/prev graph needs no shared
//! ownership. Records are only ever appended; a record's index is stable
//! for the lifetime of the diagram.

use crate::geom::SiteIdx;

/// An index into [`Dcel::faces`].
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct FaceIdx(usize);

/// An index into [`Dcel::vertices`].
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct VertexIdx(usize);

/// An index into [`Dcel::half_edges`].
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct HalfEdgeIdx(usize);

impl std::fmt::Debug for FaceIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "f{}", self.0)
    }
}

impl std::fmt::Debug for VertexIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl std::fmt::Debug for HalfEdgeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl FaceIdx {
    /// The index as a plain `usize`, for indexing [`Dcel::faces`].
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl VertexIdx {
    /// The index as a plain `usize`, for indexing [`Dcel::vertices`].
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl HalfEdgeIdx {
    /// The index as a plain `usize`, for indexing [`Dcel::half_edges`].
    pub fn as_usize(self) -> usize {
        self.0
    }
}

#[cfg(test)]
impl HalfEdgeIdx {
    pub(crate) fn test(i: usize) -> HalfEdgeIdx {
        HalfEdgeIdx(i)
    }
}

/// One cell of the diagram.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Face {
    /// The owning site's id.
    pub id: u64,
    /// Back-reference to the owning site.
    pub site: SiteIdx,
    /// A representative half-edge on this face's boundary, if any edge has
    /// been traced for it yet.
    pub half_edge: Option<HalfEdgeIdx>,
}

/// A corner of the diagram, with integer coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Vertex {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

/// One directed side of an edge.
///
/// A half-edge is *closed* once its `target` (the vertex at its head) is
/// set; edges on the outer boundary of the diagram can stay open forever
/// and consumers must tolerate a `None` target.
#[derive(Clone, Debug, serde::Serialize)]
pub struct HalfEdge {
    /// The oppositely-directed half of the same edge.
    pub twin: HalfEdgeIdx,
    /// The face this half-edge borders.
    pub face: FaceIdx,
    /// The vertex at the head, once known.
    pub target: Option<VertexIdx>,
    /// The next half-edge around the face, once linked.
    pub next: Option<HalfEdgeIdx>,
    /// The previous half-edge around the face, once linked.
    pub prev: Option<HalfEdgeIdx>,
}

/// The diagram store: indexed collections of faces, vertices and
/// half-edges, plus the factory operations the sweep uses to grow them.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct Dcel {
    faces: Vec<Face>,
    vertices: Vec<Vertex>,
    half_edges: Vec<HalfEdge>,
}

impl std::ops::Index<FaceIdx> for Dcel {
    type Output = Face;

    fn index(&self, index: FaceIdx) -> &Face {
        &self.faces[index.0]
    }
}

impl std::ops::Index<VertexIdx> for Dcel {
    type Output = Vertex;

    fn index(&self, index: VertexIdx) -> &Vertex {
        &self.vertices[index.0]
    }
}

impl std::ops::Index<HalfEdgeIdx> for Dcel {
    type Output = HalfEdge;

    fn index(&self, index: HalfEdgeIdx) -> &HalfEdge {
        &self.half_edges[index.0]
    }
}

impl Dcel {
    /// Creates an empty store.
    pub fn new() -> Dcel {
        Dcel::default()
    }

    /// All faces, indexable by [`FaceIdx`].
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// All vertices, indexable by [`VertexIdx`].
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// All half-edges, indexable by [`HalfEdgeIdx`].
    pub fn half_edges(&self) -> &[HalfEdge] {
        &self.half_edges
    }

    /// Allocates the face for a site's cell.
    pub(crate) fn new_face(&mut self, id: u64, site: SiteIdx) -> FaceIdx {
        let idx = FaceIdx(self.faces.len());
        self.faces.push(Face {
            id,
            site,
            half_edge: None,
        });
        idx
    }

    /// Allocates a vertex.
    pub(crate) fn new_vertex(&mut self, x: i32, y: i32) -> VertexIdx {
        let idx = VertexIdx(self.vertices.len());
        self.vertices.push(Vertex { x, y });
        idx
    }

    /// Allocates a twinned pair of half-edges between two faces, rooted at
    /// `origin`.
    ///
    /// The first half borders `face_left` and points away from `origin`
    /// (its target stays open until the traced breakpoint lands
    /// somewhere); the second borders `face_right` and points back into
    /// `origin`. Either face adopts its new half-edge as representative if
    /// it has none yet.
    pub(crate) fn new_edge(
        &mut self,
        face_left: FaceIdx,
        face_right: FaceIdx,
        origin: VertexIdx,
    ) -> (HalfEdgeIdx, HalfEdgeIdx) {
        let he1 = HalfEdgeIdx(self.half_edges.len());
        let he2 = HalfEdgeIdx(self.half_edges.len() + 1);
        self.half_edges.push(HalfEdge {
            twin: he2,
            face: face_left,
            target: None,
            next: None,
            prev: None,
        });
        self.half_edges.push(HalfEdge {
            twin: he1,
            face: face_right,
            target: Some(origin),
            next: None,
            prev: None,
        });

        if self.faces[face_left.0].half_edge.is_none() {
            self.faces[face_left.0].half_edge = Some(he1);
        }
        if self.faces[face_right.0].half_edge.is_none() {
            self.faces[face_right.0].half_edge = Some(he2);
        }
        (he1, he2)
    }

    /// Terminates the open end of each listed edge at `vertex`.
    ///
    /// For each half-edge, the twin's target is closed if it is still
    /// open, otherwise the half-edge's own target. Fully-closed pairs are
    /// left alone, so calling this repeatedly over the same lists is
    /// harmless.
    pub(crate) fn close_twins(&mut self, list: &[HalfEdgeIdx], vertex: VertexIdx) {
        for &he in list {
            let twin = self.half_edges[he.0].twin;
            if self.half_edges[twin.0].target.is_none() {
                self.half_edges[twin.0].target = Some(vertex);
            } else if self.half_edges[he.0].target.is_none() {
                self.half_edges[he.0].target = Some(vertex);
            }
        }
    }

    /// The boundary half-edges of `face`, sorted counter-clockwise, with
    /// their `next`/`prev` links rewritten to that cyclic order.
    ///
    /// The sweep itself only records twins and targets; the ring links are
    /// reconstructed here, on demand, by angle around the centroid of the
    /// face's closed targets. Open half-edges sort after all closed ones.
    /// Half-edges that duplicate another's target are dropped from the
    /// ring.
    pub fn face_half_edges(&mut self, face: FaceIdx) -> Vec<HalfEdgeIdx> {
        let mut edges: Vec<HalfEdgeIdx> = Vec::new();
        let mut seen: Vec<Option<VertexIdx>> = Vec::new();
        for (i, he) in self.half_edges.iter().enumerate() {
            if he.face == face && !seen.contains(&he.target) {
                seen.push(he.target);
                edges.push(HalfEdgeIdx(i));
            }
        }

        let centroid = self.centroid(edges.iter().filter_map(|&he| self.half_edges[he.0].target));
        edges.sort_by(|&a, &b| {
            let a = self.ccw_angle(self.half_edges[a.0].target, centroid);
            let b = self.ccw_angle(self.half_edges[b.0].target, centroid);
            match (a, b) {
                (None, None) => std::cmp::Ordering::Equal,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (Some(_), None) => std::cmp::Ordering::Less,
                // Descending angle sorts the ring counter-clockwise in
                // screen coordinates (y grows downward).
                (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal),
            }
        });

        self.relink_ring(&edges);
        edges
    }

    /// The boundary vertices of `face`, deduplicated by coordinate and
    /// sorted counter-clockwise around their centroid.
    pub fn face_vertices(&self, face: FaceIdx) -> Vec<VertexIdx> {
        let mut vertices: Vec<VertexIdx> = Vec::new();
        let mut seen: Vec<Vertex> = Vec::new();
        for he in self.half_edges.iter().filter(|he| he.face == face) {
            for target in [he.target, self.half_edges[he.twin.0].target] {
                if let Some(v) = target {
                    if !seen.contains(&self.vertices[v.0]) {
                        seen.push(self.vertices[v.0]);
                        vertices.push(v);
                    }
                }
            }
        }

        let centroid = self.centroid(vertices.iter().copied());
        vertices.sort_by(|&a, &b| {
            let a = self.ccw_angle(Some(a), centroid);
            let b = self.ccw_angle(Some(b), centroid);
            // unwrap: every entry has a vertex, so both angles exist.
            b.partial_cmp(&a).unwrap()
        });
        vertices
    }

    fn centroid(&self, vertices: impl Iterator<Item = VertexIdx>) -> (f64, f64) {
        let mut sum_x = 0i64;
        let mut sum_y = 0i64;
        let mut count = 0i64;
        for v in vertices {
            sum_x += i64::from(self.vertices[v.0].x);
            sum_y += i64::from(self.vertices[v.0].y);
            count += 1;
        }
        if count == 0 {
            (0.0, 0.0)
        } else {
            (sum_x as f64 / count as f64, sum_y as f64 / count as f64)
        }
    }

    fn ccw_angle(&self, vertex: Option<VertexIdx>, centroid: (f64, f64)) -> Option<f64> {
        let v = &self.vertices[vertex?.0];
        Some((f64::from(v.y) - centroid.1).atan2(f64::from(v.x) - centroid.0))
    }

    fn relink_ring(&mut self, edges: &[HalfEdgeIdx]) {
        if let [only] = edges {
            self.half_edges[only.0].prev = None;
            self.half_edges[only.0].next = None;
            return;
        }
        for i in 0..edges.len() {
            let next = edges[(i + 1) % edges.len()];
            self.half_edges[edges[i].0].next = Some(next);
            self.half_edges[next.0].prev = Some(edges[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_faces(n: usize) -> Dcel {
        let mut dcel = Dcel::new();
        for i in 0..n {
            dcel.new_face(i as u64, SiteIdx(i));
        }
        dcel
    }

    #[test]
    fn new_edge_wires_twins_and_representatives() {
        let mut dcel = store_with_faces(2);
        let v = dcel.new_vertex(10, 20);
        let (he1, he2) = dcel.new_edge(FaceIdx(0), FaceIdx(1), v);

        assert_eq!(dcel[he1].twin, he2);
        assert_eq!(dcel[he2].twin, he1);
        assert_eq!(dcel[he1].face, FaceIdx(0));
        assert_eq!(dcel[he2].face, FaceIdx(1));
        assert_eq!(dcel[he1].target, None);
        assert_eq!(dcel[he2].target, Some(v));
        assert_eq!(dcel[FaceIdx(0)].half_edge, Some(he1));
        assert_eq!(dcel[FaceIdx(1)].half_edge, Some(he2));

        // A second edge does not displace the representatives.
        let (he3, _) = dcel.new_edge(FaceIdx(0), FaceIdx(1), v);
        assert_ne!(dcel[FaceIdx(0)].half_edge, Some(he3));
    }

    #[test]
    fn close_twins_closes_the_open_end_first() {
        let mut dcel = store_with_faces(2);
        let origin = dcel.new_vertex(0, 0);
        let end = dcel.new_vertex(50, 50);
        let (he1, he2) = dcel.new_edge(FaceIdx(0), FaceIdx(1), origin);

        // he2 holds the origin, so closing via he2 fills in the twin.
        dcel.close_twins(&[he2], end);
        assert_eq!(dcel[he1].target, Some(end));
        assert_eq!(dcel[he2].target, Some(origin));

        // Both ends set: a further close is a no-op.
        let other = dcel.new_vertex(99, 99);
        dcel.close_twins(&[he1, he2], other);
        assert_eq!(dcel[he1].target, Some(end));
        assert_eq!(dcel[he2].target, Some(origin));
    }

    #[test]
    fn close_twins_falls_back_to_own_target() {
        let mut dcel = store_with_faces(2);
        let origin = dcel.new_vertex(0, 0);
        let end = dcel.new_vertex(50, 50);
        let (he1, _) = dcel.new_edge(FaceIdx(0), FaceIdx(1), origin);

        // he1's twin already has the origin, so he1 itself is closed.
        dcel.close_twins(&[he1], end);
        assert_eq!(dcel[he1].target, Some(end));
    }

    #[test]
    fn face_half_edges_orders_and_links_the_ring() {
        let mut dcel = store_with_faces(4);
        // Three edges of face 0, with targets at three corners around
        // (0, 0); one left open.
        let a = dcel.new_vertex(100, 0);
        let b = dcel.new_vertex(-100, -100);
        let c = dcel.new_vertex(-100, 100);
        let (e0, _) = dcel.new_edge(FaceIdx(0), FaceIdx(1), a);
        let (e1, _) = dcel.new_edge(FaceIdx(0), FaceIdx(2), b);
        let (e2, _) = dcel.new_edge(FaceIdx(0), FaceIdx(3), c);
        dcel.close_twins(&[e0], a);
        dcel.close_twins(&[e1], b);
        // e2 stays open.

        let ring = dcel.face_half_edges(FaceIdx(0));
        // Closed targets first, by descending angle around their centroid
        // (0, -50): a at ~0.46 rad, b at ~-2.68 rad; the open edge last.
        assert_eq!(ring, vec![e0, e1, e2]);
        assert_eq!(dcel[e0].next, Some(e1));
        assert_eq!(dcel[e1].next, Some(e2));
        assert_eq!(dcel[e2].next, Some(e0));
        assert_eq!(dcel[e0].prev, Some(e2));
    }

    #[test]
    fn face_vertices_walks_both_sides() {
        let mut dcel = store_with_faces(2);
        let origin = dcel.new_vertex(0, 0);
        let end = dcel.new_vertex(60, 0);
        let (he1, _) = dcel.new_edge(FaceIdx(0), FaceIdx(1), origin);
        dcel.close_twins(&[he1], end);

        // Face 0 only owns he1, but its twin's target is on the boundary
        // too.
        let vs = dcel.face_vertices(FaceIdx(0));
        assert_eq!(vs.len(), 2);
        assert!(vs.contains(&origin));
        assert!(vs.contains(&end));
    }
}
