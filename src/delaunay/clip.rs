//! 凸多边形工具
//!
//! - Sutherland–Hodgman 矩形裁剪（用于把凸包单元格封闭到边界矩形内）
//! - 面积、质心、点包含测试

use egui::{Pos2, Rect};

use super::edge::point_key;

/// 裁剪边界
#[derive(Debug, Clone, Copy)]
enum Boundary {
    Left(f32),
    Right(f32),
    Top(f32),
    Bottom(f32),
}

impl Boundary {
    /// 有向距离，`<= 0` 表示在内侧
    fn distance(self, p: Pos2) -> f64 {
        match self {
            Boundary::Left(x) => x as f64 - p.x as f64,
            Boundary::Right(x) => p.x as f64 - x as f64,
            Boundary::Top(y) => y as f64 - p.y as f64,
            Boundary::Bottom(y) => p.y as f64 - y as f64,
        }
    }

    /// 交点落在边界上，被裁剪的坐标直接取边界值
    fn snap(self, p: Pos2) -> Pos2 {
        match self {
            Boundary::Left(x) | Boundary::Right(x) => Pos2::new(x, p.y),
            Boundary::Top(y) | Boundary::Bottom(y) => Pos2::new(p.x, y),
        }
    }
}

/// 用矩形裁剪多边形
///
/// 输入多边形需为凸多边形（顶点顺序任意但需一致），结果保持原有的顶点顺序。
/// 相邻两个单元格共享的边会得到位模式完全相同的交点，
/// 因为交点总是按端点的规范顺序计算。
pub fn clip_to_rect(polygon: &[Pos2], rect: Rect) -> Vec<Pos2> {
    let boundaries = [
        Boundary::Left(rect.min.x),
        Boundary::Right(rect.max.x),
        Boundary::Top(rect.min.y),
        Boundary::Bottom(rect.max.y),
    ];

    let mut result = polygon.to_vec();
    for boundary in boundaries {
        if result.is_empty() {
            break;
        }
        result = clip_by_boundary(&result, boundary);
    }

    result.dedup_by(|a, b| point_key(*a) == point_key(*b));
    if result.len() > 1 && point_key(result[0]) == point_key(result[result.len() - 1]) {
        result.pop();
    }
    result
}

fn clip_by_boundary(polygon: &[Pos2], boundary: Boundary) -> Vec<Pos2> {
    let Some(&last) = polygon.last() else {
        return Vec::new();
    };

    let mut result = Vec::with_capacity(polygon.len() + 2);
    let mut prev = last;
    let mut prev_dist = boundary.distance(prev);

    for &current in polygon {
        let curr_dist = boundary.distance(current);
        let curr_inside = curr_dist <= 0.0;
        let prev_inside = prev_dist <= 0.0;

        if curr_inside {
            if !prev_inside {
                result.push(intersect(prev, current, prev_dist, curr_dist, boundary));
            }
            result.push(current);
        } else if prev_inside {
            result.push(intersect(prev, current, prev_dist, curr_dist, boundary));
        }

        prev = current;
        prev_dist = curr_dist;
    }

    result
}

fn intersect(a: Pos2, b: Pos2, a_dist: f64, b_dist: f64, boundary: Boundary) -> Pos2 {
    // 规范顺序，保证 (a, b) 与 (b, a) 得到同一个交点
    let (start, end, start_dist, end_dist) = if point_key(a) <= point_key(b) {
        (a, b, a_dist, b_dist)
    } else {
        (b, a, b_dist, a_dist)
    };

    let denom = start_dist - end_dist;
    let t = if denom.abs() < f64::EPSILON {
        0.5
    } else {
        (start_dist / denom).clamp(0.0, 1.0)
    };
    let x = start.x as f64 + (end.x as f64 - start.x as f64) * t;
    let y = start.y as f64 + (end.y as f64 - start.y as f64) * t;
    boundary.snap(Pos2::new(x as f32, y as f32))
}

// ============================================================================
// 多边形度量
// ============================================================================

/// 有向面积（鞋带公式），逆时针为正
pub fn signed_area(polygon: &[Pos2]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..polygon.len() {
        let p = polygon[i];
        let q = polygon[(i + 1) % polygon.len()];
        sum += p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
    }
    sum * 0.5
}

/// 多边形质心，面积为 0 时退化为顶点平均值
pub fn centroid(polygon: &[Pos2]) -> Option<Pos2> {
    if polygon.is_empty() {
        return None;
    }

    let area = signed_area(polygon);
    if area.abs() < f64::EPSILON {
        let n = polygon.len() as f64;
        let (sx, sy) = polygon
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
        return Some(Pos2::new((sx / n) as f32, (sy / n) as f32));
    }

    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..polygon.len() {
        let p = polygon[i];
        let q = polygon[(i + 1) % polygon.len()];
        let cross = p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
        cx += (p.x as f64 + q.x as f64) * cross;
        cy += (p.y as f64 + q.y as f64) * cross;
    }
    let factor = 1.0 / (6.0 * area);
    Some(Pos2::new((cx * factor) as f32, (cy * factor) as f32))
}

/// 点是否在凸多边形内（含边界），顶点顺序可为顺时针或逆时针
pub fn convex_contains(polygon: &[Pos2], point: Pos2) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut sign = 0.0f64;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        let cross = super::predicates::cross(a, b, point);
        if cross.abs() <= super::predicates::ORIENTATION_EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}
