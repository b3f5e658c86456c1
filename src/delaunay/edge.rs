//! 无向边
//!
//! 三角形边和 Voronoi 单元格边共用的值类型。`(a, b)` 与 `(b, a)` 视为同一条边，
//! 相等性和哈希都基于坐标的位模式，保证可以直接作为 `HashMap` 的键。

use egui::Pos2;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// 坐标的位模式键，用于精确相等比较
#[inline]
pub(crate) fn point_key(p: Pos2) -> (u32, u32) {
    // -0.0 与 0.0 视为同一坐标
    let x = if p.x == 0.0 { 0.0f32 } else { p.x };
    let y = if p.y == 0.0 { 0.0f32 } else { p.y };
    (x.to_bits(), y.to_bits())
}

/// 一条有起点和终点的边，比较时忽略方向
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Edge {
    pub start: Pos2,
    pub end: Pos2,
}

impl Edge {
    pub fn new(start: Pos2, end: Pos2) -> Self {
        Self { start, end }
    }

    /// 方向无关的键，两个端点按位模式排序
    pub fn key(&self) -> ((u32, u32), (u32, u32)) {
        let a = point_key(self.start);
        let b = point_key(self.end);
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    pub fn midpoint(&self) -> Pos2 {
        self.start.lerp(self.end, 0.5)
    }

    /// 起点与终点重合
    pub fn is_degenerate(&self) -> bool {
        point_key(self.start) == point_key(self.end)
    }

    /// 是否以 p 为端点
    pub fn has_endpoint(&self, p: Pos2) -> bool {
        let key = point_key(p);
        point_key(self.start) == key || point_key(self.end) == key
    }

    /// 与线段 p1-p2 是否相交（含端点接触）
    pub fn intersects(&self, p1: Pos2, p2: Pos2) -> bool {
        let (x0, y0) = (self.start.x as f64, self.start.y as f64);
        let (s1x, s1y) = (self.end.x as f64 - x0, self.end.y as f64 - y0);
        let (x2, y2) = (p1.x as f64, p1.y as f64);
        let (s2x, s2y) = (p2.x as f64 - x2, p2.y as f64 - y2);

        let denom = -s2x * s1y + s1x * s2y;
        if denom == 0.0 {
            // 平行（含共线）不视为相交
            return false;
        }

        let s = (-s1y * (x0 - x2) + s1x * (y0 - y2)) / denom;
        let t = (s2x * (y0 - y2) - s2y * (x0 - x2)) / denom;
        (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t)
    }

    /// 点到线段上最近点的投影
    pub fn projected_point(&self, point: Pos2) -> Pos2 {
        let edge = self.end - self.start;
        let length_sq = edge.length_sq();
        if length_sq == 0.0 {
            return self.start;
        }
        let t = ((point - self.start).dot(edge) / length_sq).clamp(0.0, 1.0);
        self.start + t * edge
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}
