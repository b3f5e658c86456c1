#![warn(clippy::all, rust_2018_idioms)]

pub mod delaunay;
pub mod spatial;

pub use delaunay::{
    triangulate, DelaunayError, HullPolicy, PointSet, Triangulation, TriangulationConfig,
    VoronoiCell, VoronoiConfig, VoronoiDiagram,
};
