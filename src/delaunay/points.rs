//! 输入点集
//!
//! 三角剖分的输入：去除完全重合的点、记录可选的边界提示，
//! 并根据点集的包围盒生成外围超级三角形。

use egui::{Pos2, Rect};
use log::warn;
use std::collections::HashSet;

use super::edge::point_key;

/// 超级三角形的默认放大倍数（相对于包围盒的最大边长）
pub const DEFAULT_SUPER_TRIANGLE_SCALE: f32 = 100.0;

/// 去重后的输入点集
///
/// 点的顺序与调用方给出的顺序一致（重复点只保留第一次出现的位置），
/// 三角剖分按这个顺序插入点，`Triangulation::sites()` 也按这个顺序返回。
#[derive(Debug, Clone, Default)]
pub struct PointSet {
    points: Vec<Pos2>,
    bounds: Option<Rect>,
    /// 被丢弃的重复点和非有限点数量
    dropped: usize,
}

impl PointSet {
    /// 从任意点序列构建点集，去除完全重合和非有限的点
    pub fn new(points: impl IntoIterator<Item = Pos2>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        let mut dropped = 0;

        for p in points {
            if !p.x.is_finite() || !p.y.is_finite() {
                dropped += 1;
                continue;
            }
            if seen.insert(point_key(p)) {
                kept.push(p);
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            warn!("点集中丢弃了 {} 个重复或非有限的点", dropped);
        }

        Self {
            points: kept,
            bounds: None,
            dropped,
        }
    }

    /// 带边界提示的点集
    ///
    /// 超级三角形会同时包住边界提示和所有点。
    pub fn with_bounds(points: impl IntoIterator<Item = Pos2>, bounds: Rect) -> Self {
        Self {
            bounds: Some(bounds),
            ..Self::new(points)
        }
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 调用方给出的边界提示
    pub fn bounds_hint(&self) -> Option<Rect> {
        self.bounds
    }

    /// 构建时丢弃的点数
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// 所有点与边界提示的并集包围盒
    ///
    /// 空点集且没有边界提示时返回 `Rect::NOTHING`。
    pub fn bounding_box(&self) -> Rect {
        let points_box = if self.points.is_empty() {
            Rect::NOTHING
        } else {
            Rect::from_points(&self.points)
        };
        match self.bounds {
            Some(hint) if hint.is_positive() => hint.union(points_box),
            _ => points_box,
        }
    }

    /// 生成包住整个点集的超级三角形（逆时针）
    ///
    /// 以包围盒中心为基准，`size = max(宽, 高, 1)`，三个顶点分别为
    /// `(cx - 2ks, cy - ks)`、`(cx + 2ks, cy - ks)`、`(cx, cy + 2ks)`。
    pub fn super_triangle(&self, scale: f32) -> [Pos2; 3] {
        let bbox = self.bounding_box();
        let (center, size) = if bbox.is_finite() && bbox.min.x <= bbox.max.x {
            (bbox.center(), bbox.width().max(bbox.height()).max(1.0))
        } else {
            (Pos2::ZERO, 1.0)
        };

        let ks = scale.max(2.0) * size;
        [
            Pos2::new(center.x - 2.0 * ks, center.y - ks),
            Pos2::new(center.x + 2.0 * ks, center.y - ks),
            Pos2::new(center.x, center.y + 2.0 * ks),
        ]
    }
}

impl From<Vec<Pos2>> for PointSet {
    fn from(points: Vec<Pos2>) -> Self {
        Self::new(points)
    }
}

impl From<&[Pos2]> for PointSet {
    fn from(points: &[Pos2]) -> Self {
        Self::new(points.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delaunay::predicates::point_in_triangle;

    #[test]
    fn test_duplicates_removed_in_order() {
        let set = PointSet::new(vec![
            Pos2::new(1.0, 1.0),
            Pos2::new(2.0, 2.0),
            Pos2::new(1.0, 1.0),
            Pos2::new(3.0, 3.0),
            Pos2::new(2.0, 2.0),
        ]);
        assert_eq!(
            set.points(),
            &[Pos2::new(1.0, 1.0), Pos2::new(2.0, 2.0), Pos2::new(3.0, 3.0)]
        );
        assert_eq!(set.dropped(), 2);
    }

    #[test]
    fn test_non_finite_points_dropped() {
        let set = PointSet::new(vec![Pos2::new(f32::NAN, 0.0), Pos2::new(1.0, f32::INFINITY)]);
        assert!(set.is_empty());
        assert_eq!(set.dropped(), 2);
    }

    #[test]
    fn test_bounds_hint_extends_box() {
        let hint = Rect::from_min_max(Pos2::new(-50.0, -50.0), Pos2::new(50.0, 50.0));
        let set = PointSet::with_bounds(vec![Pos2::new(0.0, 0.0), Pos2::new(100.0, 10.0)], hint);
        let bbox = set.bounding_box();
        assert_eq!(bbox.min, Pos2::new(-50.0, -50.0));
        assert_eq!(bbox.max, Pos2::new(100.0, 50.0));
    }

    #[test]
    fn test_super_triangle_contains_everything() {
        let set = PointSet::new(vec![
            Pos2::new(0.0, 0.0),
            Pos2::new(1000.0, 0.0),
            Pos2::new(1000.0, 1000.0),
            Pos2::new(0.0, 1000.0),
        ]);
        let [a, b, c] = set.super_triangle(DEFAULT_SUPER_TRIANGLE_SCALE);
        assert!(crate::delaunay::predicates::cross(a, b, c) > 0.0);
        for &p in set.points() {
            assert!(point_in_triangle(a, b, c, p));
        }
    }

    #[test]
    fn test_super_triangle_of_single_point() {
        let set = PointSet::new(vec![Pos2::new(5.0, 5.0)]);
        let [a, b, c] = set.super_triangle(DEFAULT_SUPER_TRIANGLE_SCALE);
        assert!(point_in_triangle(a, b, c, Pos2::new(5.0, 5.0)));
    }
}
