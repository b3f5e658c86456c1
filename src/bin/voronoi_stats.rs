//! 生成随机点集的 Voronoi 图并打印统计信息
//!
//! 用法: `voronoi_stats [点数] [种子]`，设置 `RUST_LOG=debug` 查看构建过程

use egui::{Pos2, Rect};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use terrain_voronoi::delaunay::{validate_delaunay, HullPolicy, PointSet, VoronoiConfig};
use terrain_voronoi::VoronoiDiagram;

const WIDTH: f32 = 1000.0;
const HEIGHT: f32 = 1000.0;

fn main() {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let mut args = std::env::args().skip(1);
    let count: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(5000);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);

    let mut rng = StdRng::seed_from_u64(seed);
    let points: Vec<Pos2> = (0..count)
        .map(|_| Pos2::new(rng.random_range(0.0..WIDTH), rng.random_range(0.0..HEIGHT)))
        .collect();

    println!("Generated {} points (seed {})", count, seed);

    for policy in [
        HullPolicy::Open,
        HullPolicy::Discard,
        HullPolicy::Clip(Rect::from_min_size(Pos2::ZERO, egui::vec2(WIDTH, HEIGHT))),
    ] {
        let config = VoronoiConfig {
            hull_policy: policy,
            ..Default::default()
        };
        let mut diagram = VoronoiDiagram::with_config(PointSet::new(points.clone()), config);

        let start = Instant::now();
        if let Err(err) = diagram.calculate() {
            eprintln!("{:?}: {}", policy, err);
            continue;
        }
        let elapsed = start.elapsed();

        let triangulation = diagram.triangulation();
        let valid = validate_delaunay(&triangulation.triangle_indices(), &triangulation.sites());

        let cells = diagram.cells();
        let bounded = diagram.bounded_cells().count();
        let edge_counts: Vec<usize> = diagram.bounded_cells().map(|c| c.edges().len()).collect();
        let mean_edges = if edge_counts.is_empty() {
            0.0
        } else {
            edge_counts.iter().sum::<usize>() as f32 / edge_counts.len() as f32
        };
        let area: f64 = diagram.bounded_cells().map(|c| c.area()).sum();

        println!("\n{:?}", policy);
        println!("  Time: {:.2?}", elapsed);
        println!(
            "  Triangles: {} (delaunay: {})",
            triangulation.triangles().len(),
            if valid { "ok" } else { "VIOLATED" }
        );
        println!("  Hull vertices: {}", triangulation.hull_vertices().len());
        println!("  Voronoi vertices: {}", diagram.vertices().len());
        println!("  Cells: {} ({} bounded)", cells.len(), bounded);
        println!("  Mean edges per bounded cell: {:.2}", mean_edges);
        println!("  Bounded area: {:.1}", area);
    }
}
