#[cfg(test)]
mod voronoi_validation {
    use super::super::edge::Edge;
    use super::super::error::DelaunayError;
    use super::super::points::PointSet;
    use super::super::voronoi::{HullPolicy, VoronoiConfig, VoronoiDiagram};
    use egui::{Pos2, Rect};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    /// 生成随机点集用于测试
    fn random_points(seed: u64, n: usize, width: f32, height: f32) -> Vec<Pos2> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|_| Pos2::new(rng.random_range(0.0..width), rng.random_range(0.0..height)))
            .collect()
    }

    fn grid_points(n: usize, spacing: f32) -> Vec<Pos2> {
        let mut points = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                points.push(Pos2::new(i as f32 * spacing, j as f32 * spacing));
            }
        }
        points
    }

    fn diagram_with_policy(points: Vec<Pos2>, hull_policy: HullPolicy) -> VoronoiDiagram {
        let config = VoronoiConfig {
            hull_policy,
            ..Default::default()
        };
        let mut diagram = VoronoiDiagram::with_config(PointSet::new(points), config);
        diagram.calculate().unwrap();
        diagram
    }

    fn cell_index(diagram: &VoronoiDiagram, site: Pos2) -> usize {
        diagram
            .cells()
            .iter()
            .position(|c| c.site() == site)
            .unwrap()
    }

    /// 验证 Voronoi 图的邻接关系
    ///
    /// - 每条边最多属于两个单元格
    /// - 邻接关系是对称的
    fn validate_adjacency(diagram: &VoronoiDiagram) {
        let mut owners: HashMap<Edge, Vec<usize>> = HashMap::new();
        for (idx, cell) in diagram.cells().iter().enumerate() {
            assert_eq!(cell.edges().len(), cell.neighbors().len());
            for edge in cell.edges() {
                let list = owners.entry(*edge).or_default();
                if !list.contains(&idx) {
                    list.push(idx);
                }
            }
        }
        for (edge, list) in &owners {
            assert!(list.len() <= 2, "边 {:?} 属于 {} 个单元格", edge, list.len());
        }

        for (idx, cell) in diagram.cells().iter().enumerate() {
            for (edge, neighbor) in cell.edges().iter().zip(cell.neighbors()) {
                if let Some(n) = *neighbor {
                    assert_ne!(n, idx);
                    assert!(diagram.cells()[n].edges().contains(edge));
                    assert_eq!(diagram.neighbor_across(n, edge), Some(idx));
                }
            }
        }
    }

    /// 有界单元格的边首尾相连
    fn assert_closed(diagram: &VoronoiDiagram) {
        for cell in diagram.bounded_cells() {
            let edges = cell.edges();
            assert!(edges.len() >= 3);
            for i in 0..edges.len() {
                assert_eq!(edges[i].end, edges[(i + 1) % edges.len()].start);
            }
        }
    }

    #[test]
    fn test_single_triangle() {
        // 等边三角形：三个站点都在凸包上，每个单元格只有一个外心
        let mut diagram = VoronoiDiagram::from_positions(vec![
            Pos2::new(0.0, 0.0),
            Pos2::new(10.0, 0.0),
            Pos2::new(5.0, 8.660254),
        ]);
        diagram.calculate().unwrap();

        assert_eq!(diagram.triangulation().triangles().len(), 1);
        assert_eq!(diagram.cells().len(), 3);
        assert_eq!(diagram.vertices().len(), 1);
        assert_eq!(diagram.bounded_cells().count(), 0);
        for cell in diagram.cells() {
            assert!(cell.is_on_hull());
            assert!(cell.edges().is_empty());
            assert!(cell.centroid().is_none());
        }
        assert!(diagram.edges().is_empty());
    }

    #[test]
    fn test_square_shares_one_center() {
        // 正方形的两个三角形外心重合，合并为一个顶点
        let diagram = diagram_with_policy(
            vec![
                Pos2::new(0.0, 0.0),
                Pos2::new(10.0, 0.0),
                Pos2::new(10.0, 10.0),
                Pos2::new(0.0, 10.0),
            ],
            HullPolicy::Open,
        );

        assert_eq!(diagram.vertices(), &[Pos2::new(5.0, 5.0)]);
        assert_eq!(diagram.cells().len(), 4);
        assert!(diagram.cells().iter().all(|c| c.edges().is_empty()));
    }

    #[test]
    fn test_grid_interior_cells_are_squares() {
        let spacing = 10.0;
        let diagram = diagram_with_policy(grid_points(5, spacing), HullPolicy::Open);

        assert_eq!(diagram.cells().len(), 25);
        assert_eq!(diagram.bounded_cells().count(), 9);
        validate_adjacency(&diagram);
        assert_closed(&diagram);

        for cell in diagram.bounded_cells() {
            let site = cell.site();
            assert_eq!(cell.edges().len(), 4, "内部单元格 {:?} 应该是四边形", site);
            assert!((cell.area() - 100.0).abs() < 1e-3);
            assert!(cell.contains(site));

            let centroid = cell.centroid().unwrap();
            assert!((centroid - site).length() < 1e-3);

            // 四个邻居恰好是上下左右的网格点
            let mut neighbor_sites: Vec<Pos2> = cell
                .neighbors()
                .iter()
                .map(|n| diagram.cells()[n.unwrap()].site())
                .collect();
            neighbor_sites.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
            let mut expected = vec![
                site + egui::vec2(-spacing, 0.0),
                site + egui::vec2(0.0, -spacing),
                site + egui::vec2(0.0, spacing),
                site + egui::vec2(spacing, 0.0),
            ];
            expected.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
            assert_eq!(neighbor_sites, expected);
        }

        // 边上的单元格有两个外心（来回两条边），角上的单元格只有一个
        let side = &diagram.cells()[cell_index(&diagram, Pos2::new(10.0, 0.0))];
        assert!(side.is_on_hull());
        assert!(!side.is_bounded());
        assert_eq!(side.edges().len(), 2);
        let inner = cell_index(&diagram, Pos2::new(10.0, 10.0));
        assert!(side.neighbors().iter().all(|&n| n == Some(inner)));

        let corner = &diagram.cells()[cell_index(&diagram, Pos2::new(0.0, 0.0))];
        assert!(corner.edges().is_empty());
    }

    #[test]
    fn test_discard_hull_cells() {
        let diagram = diagram_with_policy(grid_points(5, 10.0), HullPolicy::Discard);

        assert_eq!(diagram.cells().len(), 9);
        assert!(diagram.cells().iter().all(|c| !c.is_on_hull() && c.is_bounded()));
        validate_adjacency(&diagram);

        // 中心单元格的邻居都还在，靠外的单元格朝外的边没有邻居
        let center = &diagram.cells()[cell_index(&diagram, Pos2::new(20.0, 20.0))];
        assert!(center.neighbors().iter().all(|n| n.is_some()));
        let near_edge = &diagram.cells()[cell_index(&diagram, Pos2::new(10.0, 10.0))];
        assert_eq!(near_edge.neighbors().iter().filter(|n| n.is_none()).count(), 2);
    }

    #[test]
    fn test_clip_covers_rect() {
        let rect = Rect::from_min_max(Pos2::new(-5.0, -5.0), Pos2::new(45.0, 45.0));
        let diagram = diagram_with_policy(grid_points(5, 10.0), HullPolicy::Clip(rect));

        assert_eq!(diagram.cells().len(), 25);
        assert_eq!(diagram.bounded_cells().count(), 25);
        validate_adjacency(&diagram);
        assert_closed(&diagram);

        let total: f64 = diagram.cells().iter().map(|c| c.area()).sum();
        assert!((total - 2500.0).abs() < 1e-2, "面积之和 {}", total);

        for cell in diagram.cells() {
            assert!((cell.area() - 100.0).abs() < 1e-3);
            assert!(cell.contains(cell.site()));
            for (edge, neighbor) in cell.edges().iter().zip(cell.neighbors()) {
                assert!(rect.expand(1e-3).contains(edge.start));
                let on_border = (edge.start.x == edge.end.x
                    && (edge.start.x == rect.min.x || edge.start.x == rect.max.x))
                    || (edge.start.y == edge.end.y
                        && (edge.start.y == rect.min.y || edge.start.y == rect.max.y));
                assert_eq!(neighbor.is_none(), on_border, "边 {:?}", edge);
            }
        }
    }

    #[test]
    fn test_clip_partial_rect() {
        // 只有左下角的四个单元格与矩形相交
        let rect = Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(12.0, 12.0));
        let diagram = diagram_with_policy(grid_points(5, 10.0), HullPolicy::Clip(rect));

        assert_eq!(diagram.bounded_cells().count(), 4);
        let total: f64 = diagram.bounded_cells().map(|c| c.area()).sum();
        assert!((total - 144.0).abs() < 1e-2);

        let far = &diagram.cells()[cell_index(&diagram, Pos2::new(40.0, 40.0))];
        assert!(far.edges().is_empty());
        assert!(!far.is_bounded());
    }

    #[test]
    fn test_clip_triangle_closes_hull_cells() {
        let rect = Rect::from_min_max(Pos2::new(-20.0, -20.0), Pos2::new(30.0, 30.0));
        let diagram = diagram_with_policy(
            vec![
                Pos2::new(0.0, 0.0),
                Pos2::new(10.0, 0.0),
                Pos2::new(5.0, 8.660254),
            ],
            HullPolicy::Clip(rect),
        );

        assert_eq!(diagram.bounded_cells().count(), 3);
        let total: f64 = diagram.cells().iter().map(|c| c.area()).sum();
        assert!((total - 2500.0).abs() < 1e-1);
        for cell in diagram.cells() {
            assert!(cell.contains(cell.site()));
        }
    }

    #[test]
    fn test_random_points() {
        let points = random_points(42, 200, 1000.0, 1000.0);
        let diagram = diagram_with_policy(points.clone(), HullPolicy::Open);

        assert_eq!(diagram.cells().len(), points.len());
        validate_adjacency(&diagram);
        assert_closed(&diagram);

        let mesh = diagram.triangulation().mesh();
        for cell in diagram.cells().iter().filter(|c| !c.is_on_hull()) {
            assert!(cell.is_bounded());
            assert!(cell.contains(cell.site()));
            // 内部单元格每条边都有邻居，边数等于站点周围的三角形数
            assert!(cell.neighbors().iter().all(|n| n.is_some()));
            let v = mesh.find_vertex(cell.site()).unwrap();
            assert_eq!(
                cell.edges().len(),
                mesh.faces_around_vertex(v).unwrap().len()
            );
        }

        let hull = diagram.triangulation().hull_vertices().len();
        assert_eq!(
            diagram.cells().iter().filter(|c| c.is_on_hull()).count(),
            hull
        );
    }

    #[test]
    fn test_random_points_clipped() {
        let points = random_points(7, 150, 500.0, 300.0);
        let rect = Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(500.0, 300.0));
        let diagram = diagram_with_policy(points, HullPolicy::Clip(rect));

        assert_eq!(diagram.bounded_cells().count(), diagram.cells().len());
        validate_adjacency(&diagram);
        for cell in diagram.cells() {
            assert!(cell.contains(cell.site()));
        }
    }

    #[test]
    fn test_cell_at() {
        let points = random_points(3, 100, 200.0, 200.0);
        let diagram = diagram_with_policy(points.clone(), HullPolicy::Open);

        for (idx, cell) in diagram.cells().iter().enumerate() {
            assert_eq!(diagram.cell_at(cell.site()), Some(idx));
        }

        // 查询点落在最近站点的单元格中
        let query = Pos2::new(100.0, 100.0);
        let found = diagram.cell_at(query).unwrap();
        let best = diagram.cells()[found].site().distance_sq(query);
        assert!(points.iter().all(|p| p.distance_sq(query) >= best));
    }

    #[test]
    fn test_calculate_is_idempotent() {
        let mut diagram = VoronoiDiagram::from_positions(random_points(9, 60, 100.0, 100.0));
        assert!(!diagram.is_calculated());
        assert!(diagram.cell_at(Pos2::ZERO).is_none());

        diagram.calculate().unwrap();
        let cells = diagram.cells().to_vec();
        let vertices = diagram.vertices().to_vec();
        diagram.calculate().unwrap();

        assert!(diagram.is_calculated());
        assert_eq!(diagram.cells(), cells.as_slice());
        assert_eq!(diagram.vertices(), vertices.as_slice());
    }

    #[test]
    fn test_insufficient_points() {
        let mut diagram = VoronoiDiagram::from_positions(vec![Pos2::new(1.0, 1.0)]);
        let err = diagram.calculate().unwrap_err();

        assert_eq!(err, DelaunayError::InsufficientPoints { found: 1 });
        assert!(!diagram.is_calculated());
        assert!(diagram.cells().is_empty());
    }

    #[test]
    fn test_render_data() {
        let diagram = diagram_with_policy(grid_points(4, 5.0), HullPolicy::Open);
        let edges = diagram.edges();
        let (vertices, indices) = diagram.render_data();

        assert_eq!(indices.len(), edges.len() * 2);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
        // 3x3 个正方形的外心
        assert_eq!(vertices.len(), 9);
    }

    #[test]
    fn test_neighbors_view() {
        let diagram = diagram_with_policy(grid_points(4, 1.0), HullPolicy::Open);
        for idx in 0..diagram.cells().len() {
            let view: Vec<_> = diagram.neighbors(idx).collect();
            assert_eq!(view.as_slice(), diagram.cells()[idx].neighbors());
        }
        assert_eq!(diagram.neighbors(diagram.cells().len()).count(), 0);
        assert!(diagram.cell(diagram.cells().len()).is_none());
    }
}
