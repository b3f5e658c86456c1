//! 几何谓词
//!
//! 三角剖分与 Voronoi 生成所依赖的纯函数：
//! - 方向测试（点在有向线段的左侧/右侧/线上）
//! - 点在三角形内测试（面积和法）
//! - 外接圆计算与外接圆内测试
//! - 含无穷远点的符号谓词，供带超级三角形的增量构建使用
//!
//! 输入坐标为 `f32`（`Pos2`），内部统一转换为 `f64` 计算，
//! 所有退化情况都返回确定的回退值，不会产生 NaN。
//! 构建时做决策的谓词（方向、外接圆内）使用 `robust` 的精确行列式。

use egui::Pos2;
use serde::{Deserialize, Serialize};

// ============================================================================
// 常量
// ============================================================================

/// 方向测试的容差（叉积，面积单位）
pub const ORIENTATION_EPSILON: f64 = 1e-10;

/// 面积和法的相对容差
pub const AREA_EPSILON: f64 = 1e-6;

/// 共线判定容差，会乘以两条较短边的边长
pub const COLLINEAR_TOLERANCE: f64 = 1e-5;

/// 外接圆内测试的相对容差，保证共圆点不会被判为在圆内
pub const INCIRCLE_TOLERANCE: f64 = 1e-12;

// ============================================================================
// 方向测试
// ============================================================================

/// 点相对于有向直线 a→b 的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Left,
    Right,
    On,
}

/// 叉积 (b - a) × (p - a)
///
/// 正值表示 p 在 a→b 左侧（逆时针），负值表示右侧。
#[inline]
pub fn cross(a: Pos2, b: Pos2, p: Pos2) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (px, py) = (p.x as f64, p.y as f64);
    (bx - ax) * (py - ay) - (by - ay) * (px - ax)
}

/// 使用默认容差的方向测试
#[inline]
pub fn orientation(a: Pos2, b: Pos2, p: Pos2) -> Orientation {
    orientation_eps(a, b, p, ORIENTATION_EPSILON)
}

/// 使用指定容差的方向测试，`|cross| <= epsilon` 视为在线上
pub fn orientation_eps(a: Pos2, b: Pos2, p: Pos2, epsilon: f64) -> Orientation {
    let value = cross(a, b, p);
    if value > epsilon {
        Orientation::Left
    } else if value < -epsilon {
        Orientation::Right
    } else {
        Orientation::On
    }
}

/// p 在 a→b 右侧或线上
#[inline]
pub fn is_right_or_on(a: Pos2, b: Pos2, p: Pos2) -> bool {
    cross(a, b, p) <= ORIENTATION_EPSILON
}

/// p 在 a→b 左侧或线上
#[inline]
pub fn is_left_or_on(a: Pos2, b: Pos2, p: Pos2) -> bool {
    cross(a, b, p) >= -ORIENTATION_EPSILON
}

// ============================================================================
// 点在三角形内
// ============================================================================

/// 三角形面积（取绝对值）
#[inline]
pub fn triangle_area(a: Pos2, b: Pos2, c: Pos2) -> f64 {
    cross(a, b, c).abs() * 0.5
}

/// 面积和法判断点是否在三角形内（含边界）
///
/// 三个子三角形的面积之和等于原三角形面积（容差内）即为在内部。
pub fn point_in_triangle(a: Pos2, b: Pos2, c: Pos2, p: Pos2) -> bool {
    let area = triangle_area(a, b, c);
    let sum = triangle_area(p, b, c) + triangle_area(a, p, c) + triangle_area(a, b, p);
    (area - sum).abs() <= AREA_EPSILON * area.max(1.0)
}

// ============================================================================
// 外接圆
// ============================================================================

/// 外接圆
///
/// 圆心和半径平方以 `f64` 保存，外接圆内测试不会因为 `f32` 舍入而抖动。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    x: f64,
    y: f64,
    radius_sq: f64,
}

impl Circle {
    pub fn new(center: Pos2, radius: f32) -> Self {
        let radius = radius as f64;
        Self {
            x: center.x as f64,
            y: center.y as f64,
            radius_sq: radius * radius,
        }
    }

    /// 退化圆：圆心在给定点，半径为 0
    pub fn degenerate(at: Pos2) -> Self {
        Self::new(at, 0.0)
    }

    /// 除零回退：圆心在最大值处，半径无穷大
    pub fn unbounded() -> Self {
        Self {
            x: f32::MAX as f64,
            y: f32::MAX as f64,
            radius_sq: f64::INFINITY,
        }
    }

    pub fn center(&self) -> Pos2 {
        Pos2::new(self.x as f32, self.y as f32)
    }

    pub fn radius(&self) -> f32 {
        self.radius_sq.sqrt() as f32
    }

    pub fn radius_sq(&self) -> f64 {
        self.radius_sq
    }

    pub fn is_finite(&self) -> bool {
        self.radius_sq.is_finite()
    }

    pub fn is_degenerate(&self) -> bool {
        self.radius_sq == 0.0
    }

    /// 点是否严格在圆内
    ///
    /// 恰好在圆上的点不算在内，这对共圆输入（如规则网格）很重要。
    /// 非有限的圆永远返回 `false`。
    pub fn contains(&self, point: Pos2) -> bool {
        if !self.is_finite() {
            return false;
        }
        let dx = point.x as f64 - self.x;
        let dy = point.y as f64 - self.y;
        let dist_sq = dx * dx + dy * dy;
        dist_sq < self.radius_sq - INCIRCLE_TOLERANCE * self.radius_sq
    }
}

/// 计算三角形外接圆
///
/// 以 a 为原点平移后使用行列式公式，减小大坐标下的抵消误差。
/// - 近似共线时返回以 a 为圆心的零半径圆。共线程度按最长边所对的角判定：
///   叉积小于两条较短边长之积乘以容差
/// - 除数恰好为 0（如存在重合顶点）时返回 [`Circle::unbounded`]
///
/// 这里的圆心用于输出（Voronoi 顶点）。判断点是否在圆内请用
/// [`in_circumcircle`]，它不受这个回退影响。
pub fn circumcircle(a: Pos2, b: Pos2, c: Pos2) -> Circle {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64 - ax, b.y as f64 - ay);
    let (cx, cy) = (c.x as f64 - ax, c.y as f64 - ay);

    let det = bx * cy - by * cx;
    let b_sq = bx * bx + by * by;
    let c_sq = cx * cx + cy * cy;
    let bc_sq = (cx - bx) * (cx - bx) + (cy - by) * (cy - by);

    // 去掉最长边，剩下两条边长之积
    let mut sides = [b_sq, c_sq, bc_sq];
    sides.sort_by(f64::total_cmp);
    let shorter = (sides[0] * sides[1]).sqrt();
    if det.abs() < COLLINEAR_TOLERANCE * shorter {
        return Circle::degenerate(a);
    }

    let div = 2.0 * det;
    if div == 0.0 {
        return Circle::unbounded();
    }

    let ux = (cy * b_sq - by * c_sq) / div;
    let uy = (bx * c_sq - cx * b_sq) / div;

    Circle {
        x: ax + ux,
        y: ay + uy,
        radius_sq: ux * ux + uy * uy,
    }
}

// ============================================================================
// 精确谓词
// ============================================================================

#[inline]
fn coord(p: Pos2) -> robust::Coord<f64> {
    robust::Coord {
        x: p.x as f64,
        y: p.y as f64,
    }
}

/// 精确方向测试，符号与 [`cross`] 相同
#[inline]
pub fn orient_exact(a: Pos2, b: Pos2, p: Pos2) -> f64 {
    robust::orient2d(coord(a), coord(b), coord(p))
}

/// 点是否严格在三角形 abc 的外接圆内
///
/// 直接对提升行列式求精确符号，不经过圆心，顶点顺序任意。
/// 共圆的点不算在内；共线三角形的外接圆不包含任何点。
pub fn in_circumcircle(a: Pos2, b: Pos2, c: Pos2, p: Pos2) -> bool {
    let orient = orient_exact(a, b, c);
    if orient == 0.0 {
        return false;
    }
    let value = robust::incircle(coord(a), coord(b), coord(c), coord(p));
    if orient > 0.0 {
        value > 0.0
    } else {
        value < 0.0
    }
}

// ============================================================================
// 无穷远点
// ============================================================================

/// 超级三角形三个顶点的方向，顺序与 `PointSet::super_triangle` 相同
pub const SUPER_DIRECTIONS: [[f64; 2]; 3] = [[-2.0, -1.0], [2.0, -1.0], [0.0, 2.0]];

/// 谓词的输入点：普通点，或者沿方向 `u` 无穷远的点
///
/// 无穷远点按 `L·u`（L → ∞）代入行列式，行列式是 L 的多项式，
/// 结果取最高次非零系数的符号。超级三角形顶点因此永远不会落进
/// 真实三角形的外接圆，结果与超级三角形的实际尺寸无关。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SymbolicPoint {
    Finite(Pos2),
    AtInfinity([f64; 2]),
}

/// 一行按 L 的次数拆开后的分量：(次数, 行向量)，有效项数
type LiftedRow<const N: usize> = ([(usize, [f64; N]); 3], usize);

fn orientation_row(p: SymbolicPoint) -> LiftedRow<3> {
    match p {
        SymbolicPoint::Finite(p) => (
            [(0, [p.x as f64, p.y as f64, 1.0]), (0, [0.0; 3]), (0, [0.0; 3])],
            1,
        ),
        SymbolicPoint::AtInfinity([ux, uy]) => (
            [(1, [ux, uy, 0.0]), (0, [0.0, 0.0, 1.0]), (0, [0.0; 3])],
            2,
        ),
    }
}

fn incircle_row(p: SymbolicPoint) -> LiftedRow<4> {
    match p {
        SymbolicPoint::Finite(p) => {
            let (x, y) = (p.x as f64, p.y as f64);
            (
                [(0, [x, y, x * x + y * y, 1.0]), (0, [0.0; 4]), (0, [0.0; 4])],
                1,
            )
        }
        SymbolicPoint::AtInfinity([ux, uy]) => (
            [
                (2, [0.0, 0.0, ux * ux + uy * uy, 0.0]),
                (1, [ux, uy, 0.0, 0.0]),
                (0, [0.0, 0.0, 0.0, 1.0]),
            ],
            3,
        ),
    }
}

fn det3(m: [[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// 按第一行展开
fn det4(m: [[f64; 4]; 4]) -> f64 {
    let mut sum = 0.0;
    for col in 0..4 {
        if m[0][col] == 0.0 {
            continue;
        }
        let mut minor = [[0.0; 3]; 3];
        for (r, row) in m[1..].iter().enumerate() {
            let mut k = 0;
            for (c, &value) in row.iter().enumerate() {
                if c != col {
                    minor[r][k] = value;
                    k += 1;
                }
            }
        }
        let sign = if col % 2 == 0 { 1.0 } else { -1.0 };
        sum += sign * m[0][col] * det3(minor);
    }
    sum
}

/// 最高次非零系数的符号，全为 0 时返回 0
fn leading_sign(coeffs: &[f64]) -> f64 {
    coeffs
        .iter()
        .rev()
        .copied()
        .find(|&c| c != 0.0)
        .map_or(0.0, f64::signum)
}

/// 方向测试，允许输入无穷远点
pub fn symbolic_orientation(
    a: SymbolicPoint,
    b: SymbolicPoint,
    p: SymbolicPoint,
) -> Orientation {
    let value = match (a, b, p) {
        (SymbolicPoint::Finite(a), SymbolicPoint::Finite(b), SymbolicPoint::Finite(p)) => {
            orient_exact(a, b, p)
        }
        _ => {
            let rows = [orientation_row(a), orientation_row(b), orientation_row(p)];
            let mut coeffs = [0.0; 4];
            for &(d0, r0) in &rows[0].0[..rows[0].1] {
                for &(d1, r1) in &rows[1].0[..rows[1].1] {
                    for &(d2, r2) in &rows[2].0[..rows[2].1] {
                        coeffs[d0 + d1 + d2] += det3([r0, r1, r2]);
                    }
                }
            }
            leading_sign(&coeffs)
        }
    };

    if value > 0.0 {
        Orientation::Left
    } else if value < 0.0 {
        Orientation::Right
    } else {
        Orientation::On
    }
}

/// d 是否严格在 abc 的外接圆内，允许输入无穷远点
///
/// abc 必须是逆时针顺序（按无穷远点的极限位置）。
pub fn symbolic_in_circle(
    a: SymbolicPoint,
    b: SymbolicPoint,
    c: SymbolicPoint,
    d: SymbolicPoint,
) -> bool {
    let points = [a, b, c, d];
    let finite: Vec<Pos2> = points
        .iter()
        .filter_map(|p| match p {
            SymbolicPoint::Finite(p) => Some(*p),
            SymbolicPoint::AtInfinity(_) => None,
        })
        .collect();

    if let [pa, pb, pc, pd] = finite[..] {
        return robust::incircle(coord(pa), coord(pb), coord(pc), coord(pd)) > 0.0;
    }

    let rows = points.map(incircle_row);
    let mut coeffs = [0.0; 9];
    for &(d0, r0) in &rows[0].0[..rows[0].1] {
        for &(d1, r1) in &rows[1].0[..rows[1].1] {
            for &(d2, r2) in &rows[2].0[..rows[2].1] {
                for &(d3, r3) in &rows[3].0[..rows[3].1] {
                    coeffs[d0 + d1 + d2 + d3] += det4([r0, r1, r2, r3]);
                }
            }
        }
    }

    // 只有一个无穷远点时，最高次系数就是其余三点的方向，精确计算
    let infinite = points.iter().enumerate().find_map(|(i, point)| match point {
        SymbolicPoint::AtInfinity(u) => Some((i, *u)),
        SymbolicPoint::Finite(_) => None,
    });
    if let (Some((slot, [ux, uy])), [p, q, r]) = (infinite, &finite[..]) {
        let sign = if slot % 2 == 0 { 1.0 } else { -1.0 };
        coeffs[2] = sign * (ux * ux + uy * uy) * orient_exact(*p, *q, *r);
    }

    leading_sign(&coeffs) > 0.0
}
