//! Delaunay 三角剖分工具函数模块
//!
//! 提供验证和辅助计算功能，主要用于测试和统计。

use crate::delaunay::edge::{point_key, Edge};
use crate::delaunay::predicates;
use crate::delaunay::triangle::Triangle;
use egui::Pos2;

// ============================================================================
// 公开 API
// ============================================================================

/// 验证三角剖分结果是否满足 Delaunay 性质
///
/// Delaunay 性质：任意三角形的外接圆内不包含其他点。
///
/// # 参数
/// - `indices`: 三角形索引列表，每3个索引构成一个三角形
/// - `points`: 点坐标列表
///
/// # 返回值
/// - `true`: 满足 Delaunay 性质
/// - `false`: 不满足或输入无效
///
/// # 示例
/// ```ignore
/// let valid = validate_delaunay(&triangulation.triangle_indices(), &triangulation.sites());
/// assert!(valid);
/// ```
pub fn validate_delaunay(indices: &[u32], points: &[Pos2]) -> bool {
    // 确保索引列表长度是3的倍数
    if indices.len() % 3 != 0 {
        return false;
    }

    for tri in indices.chunks_exact(3) {
        let Some(triangle) = triangle_at(tri, points) else {
            return false;
        };
        if first_violation(&triangle, points).is_some() {
            return false;
        }
    }

    true
}

/// 找出外接圆内包含其他点的三角形，返回 (三角形, 违规点)
pub fn delaunay_violations(triangles: &[Triangle], points: &[Pos2]) -> Vec<(Triangle, Pos2)> {
    triangles
        .iter()
        .filter_map(|t| first_violation(t, points).map(|p| (*t, p)))
        .collect()
}

/// 计算点集凸包的边界点数量
///
/// 使用 Graham 扫描算法计算凸包，共线的边界点不计入。
///
/// 理论上，对于 n 个点（其中 k 个在凸包边界上），
/// Delaunay 三角剖分产生的三角形数为 `2n - 2 - k`。
pub fn convex_hull_count(points: &[Pos2]) -> usize {
    convex_hull(points).len()
}

/// Graham 扫描求凸包，逆时针顺序
pub fn convex_hull(points: &[Pos2]) -> Vec<Pos2> {
    if points.len() < 3 {
        return points.to_vec();
    }

    // 找到最下方（其次最左）的点作为参考点
    let mut ref_idx = 0;
    for i in 1..points.len() {
        if points[i].y < points[ref_idx].y
            || (points[i].y == points[ref_idx].y && points[i].x < points[ref_idx].x)
        {
            ref_idx = i;
        }
    }
    let origin = points[ref_idx];

    // 按极角排序，极角相同时近的在前
    let mut others: Vec<Pos2> = points
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != ref_idx)
        .map(|(_, &p)| p)
        .collect();
    others.sort_by(|&a, &b| {
        let angle_a = ((a.y - origin.y) as f64).atan2((a.x - origin.x) as f64);
        let angle_b = ((b.y - origin.y) as f64).atan2((b.x - origin.x) as f64);
        angle_a
            .partial_cmp(&angle_b)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let da = (a - origin).length_sq();
                let db = (b - origin).length_sq();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
    });

    let mut hull = vec![origin];
    for p in others {
        // 只保留严格左转
        while hull.len() >= 2
            && predicates::orient_exact(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }

    hull
}

/// 检查边集中是否存在不共享端点的交叉
pub fn has_improper_crossing(edges: &[Edge]) -> bool {
    for (i, a) in edges.iter().enumerate() {
        for b in &edges[i + 1..] {
            if a.has_endpoint(b.start) || a.has_endpoint(b.end) {
                continue;
            }
            if a.intersects(b.start, b.end) {
                return true;
            }
        }
    }
    false
}

// ============================================================================
// 内部辅助函数
// ============================================================================

fn triangle_at(tri: &[u32], points: &[Pos2]) -> Option<Triangle> {
    let a = *points.get(tri[0] as usize)?;
    let b = *points.get(tri[1] as usize)?;
    let c = *points.get(tri[2] as usize)?;
    Some(Triangle::new([a, b, c]))
}

fn first_violation(triangle: &Triangle, points: &[Pos2]) -> Option<Pos2> {
    let vertex_keys = triangle.points.map(point_key);
    points
        .iter()
        .copied()
        .filter(|&p| !vertex_keys.contains(&point_key(p)))
        .find(|&p| triangle.contains_in_circumcircle(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convex_hull_skips_interior_and_collinear() {
        let points = vec![
            Pos2::new(0.0, 0.0),
            Pos2::new(5.0, 0.0), // 边上共线
            Pos2::new(10.0, 0.0),
            Pos2::new(10.0, 10.0),
            Pos2::new(0.0, 10.0),
            Pos2::new(5.0, 5.0), // 内部
        ];
        assert_eq!(convex_hull_count(&points), 4);
    }

    #[test]
    fn test_validate_detects_violation() {
        let points = vec![
            Pos2::new(0.0, 0.0),
            Pos2::new(10.0, 0.0),
            Pos2::new(10.0, 1.0),
            Pos2::new(0.0, 1.0),
        ];
        // 对角线 (0,0)-(10,1) 和 (10,0)-(0,1) 都合法（共圆）
        assert!(validate_delaunay(&[0, 1, 2, 0, 2, 3], &points));

        let skewed = vec![
            Pos2::new(0.0, 0.0),
            Pos2::new(10.0, 0.0),
            Pos2::new(12.0, 5.0),
            Pos2::new(1.0, 1.0),
        ];
        // 三角形 (0,1,2) 的外接圆包含 (1,1)
        assert!(!validate_delaunay(&[0, 1, 2, 0, 2, 3], &skewed));
        assert!(!validate_delaunay(&[0, 1], &skewed));
    }

    #[test]
    fn test_validate_thin_triangle_with_sharp_first_corner() {
        // 锐角顶点排在第一个的细长三角形，外接圆仍然有效
        let points = vec![
            Pos2::new(0.0, 0.0),
            Pos2::new(1000.0, 0.0),
            Pos2::new(1000.0, 1.0),
            Pos2::new(500.0, 100.0),
        ];
        assert!(!validate_delaunay(&[0, 1, 2], &points));
        let thin = Triangle::new([points[0], points[1], points[2]]);
        assert_eq!(delaunay_violations(&[thin], &points), vec![(thin, points[3])]);
    }

    #[test]
    fn test_crossing_detection() {
        let crossing = vec![
            Edge::new(Pos2::new(0.0, 0.0), Pos2::new(10.0, 10.0)),
            Edge::new(Pos2::new(0.0, 10.0), Pos2::new(10.0, 0.0)),
        ];
        assert!(has_improper_crossing(&crossing));

        let touching = vec![
            Edge::new(Pos2::new(0.0, 0.0), Pos2::new(10.0, 10.0)),
            Edge::new(Pos2::new(10.0, 10.0), Pos2::new(20.0, 0.0)),
        ];
        assert!(!has_improper_crossing(&touching));
    }
}
