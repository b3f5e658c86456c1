use egui::Pos2;
use serde::{Deserialize, Serialize};

use super::edge::{point_key, Edge};
use super::predicates::{self, Circle};

/// 三角形结构，存储三个顶点坐标（逆时针）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub points: [Pos2; 3],
}

impl Triangle {
    /// 创建新的三角形
    pub fn new(points: [Pos2; 3]) -> Self {
        Self { points }
    }

    /// 三条无向边：(p0, p1), (p1, p2), (p2, p0)
    pub fn edges(&self) -> [Edge; 3] {
        let [a, b, c] = self.points;
        [Edge::new(a, b), Edge::new(b, c), Edge::new(c, a)]
    }

    /// 外接圆，近似共线时为零半径退化圆
    pub fn circumcircle(&self) -> Circle {
        let [a, b, c] = self.points;
        predicates::circumcircle(a, b, c)
    }

    /// 判断一个点是否严格在三角形的外接圆内（精确判定）
    pub fn contains_in_circumcircle(&self, point: Pos2) -> bool {
        let [a, b, c] = self.points;
        predicates::in_circumcircle(a, b, c, point)
    }

    /// 检查点是否在三角形内部（含边界，面积和法）
    pub fn contains_point(&self, point: Pos2) -> bool {
        let [a, b, c] = self.points;
        predicates::point_in_triangle(a, b, c, point)
    }

    /// 有向面积，逆时针为正
    pub fn signed_area(&self) -> f64 {
        let [a, b, c] = self.points;
        predicates::cross(a, b, c) * 0.5
    }

    pub fn centroid(&self) -> Pos2 {
        let [a, b, c] = self.points;
        Pos2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
    }

    /// 点是否是三角形的顶点之一（精确比较）
    pub fn has_vertex(&self, point: Pos2) -> bool {
        let key = point_key(point);
        self.points.iter().any(|&p| point_key(p) == key)
    }
}
