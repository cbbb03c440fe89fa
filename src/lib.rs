#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod beach;
mod dcel;
mod geom;
mod queue;
mod voronoi;

pub use beach::{Arc, BeachTree, Node, NodeIdx, NodeKind};
pub use dcel::{Dcel, Face, FaceIdx, HalfEdge, HalfEdgeIdx, Vertex, VertexIdx};
pub use geom::{
    breakpoint_x, circumcircle, Circle, GeomError, Parabola, Point, Rect, Site, SiteIdx,
};
pub use queue::{Event, EventIdx, EventKind, EventQueue};
pub use voronoi::Voronoi;
