//! Delaunay 三角剖分引擎
//!
//! 增量插入算法：
//! 1. 用超级三角形包住所有点
//! 2. 逐点插入：行走定位所在三角形 → 拆分为三个 → 边翻转修复 Delaunay 性质
//! 3. 删除所有与超级三角形顶点相连的三角形
//!
//! 超级三角形顶点在方向测试和外接圆测试中按无穷远点处理
//! （见 [`predicates::SymbolicPoint`]），所以删除之后剩下的正好是
//! 点集的 Delaunay 三角剖分，边界半边（没有对边）构成凸包。

use egui::Pos2;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

use super::edge::Edge;
use super::error::{DelaunayError, Result};
use super::half_edge::{EdgeId, FaceId, HalfEdgeMesh, VertexId};
use super::points::{PointSet, DEFAULT_SUPER_TRIANGLE_SCALE};
use super::predicates::{self, Orientation, SymbolicPoint, SUPER_DIRECTIONS};
use super::triangle::Triangle;

// ============================================================================
// 配置与状态
// ============================================================================

/// 三角剖分参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangulationConfig {
    /// 单个点定位的最大行走步数
    pub max_walk_steps: usize,
    /// 单个点插入后的最大翻转修复步数
    pub max_repair_steps: usize,
    /// 超级三角形相对于包围盒的放大倍数
    ///
    /// 只决定超级顶点在网格中存放的坐标，判定时它们总是按无穷远处理。
    pub super_triangle_scale: f32,
}

impl Default for TriangulationConfig {
    fn default() -> Self {
        Self {
            max_walk_steps: 1_000_000,
            max_repair_steps: 1_000_000,
            super_triangle_scale: DEFAULT_SUPER_TRIANGLE_SCALE,
        }
    }
}

/// 构建阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriangulationState {
    /// 尚未开始
    Empty,
    /// 超级三角形已就位
    Bootstrapped,
    /// 正在逐点插入
    Inserting,
    /// 超级三角形已移除，结果只读
    Finalized,
}

// ============================================================================
// Triangulation
// ============================================================================

/// 一个点集的 Delaunay 三角剖分
///
/// # 示例
/// ```ignore
/// let mut triangulation = Triangulation::new(PointSet::new(points));
/// triangulation.calculate()?;
/// for triangle in triangulation.triangles() {
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Triangulation {
    points: PointSet,
    config: TriangulationConfig,
    mesh: HalfEdgeMesh,
    state: TriangulationState,
    super_triangle: Option<[Pos2; 3]>,
    super_vertices: Option<[VertexId; 3]>,
}

impl Triangulation {
    pub fn new(points: PointSet) -> Self {
        Self::with_config(points, TriangulationConfig::default())
    }

    pub fn with_config(points: PointSet, config: TriangulationConfig) -> Self {
        Self {
            points,
            config,
            mesh: HalfEdgeMesh::new(),
            state: TriangulationState::Empty,
            super_triangle: None,
            super_vertices: None,
        }
    }

    /// 执行三角剖分
    ///
    /// 已经完成的三角剖分再次调用时直接返回。
    /// 失败时网格被清空，状态回到 [`TriangulationState::Empty`]。
    pub fn calculate(&mut self) -> Result<()> {
        if self.state == TriangulationState::Finalized {
            return Ok(());
        }

        let found = self.points.len();
        if found < 2 {
            return Err(DelaunayError::InsufficientPoints { found });
        }

        let start_time = Instant::now();
        debug!("三角剖分开始，处理 {} 个点", found);

        if let Err(err) = self.run() {
            self.reset();
            return Err(err);
        }

        info!(
            "三角剖分完成: {} 个点 → {} 个三角形, 耗时 {:.2?}",
            found,
            self.mesh.face_count(),
            start_time.elapsed()
        );
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        self.reset();
        self.bootstrap()?;

        let insert_start = Instant::now();
        self.state = TriangulationState::Inserting;
        let points = self.points.points().to_vec();
        for p in points {
            self.insert_point(p)?;
        }
        debug!("逐点插入完成，耗时 {:.2?}", insert_start.elapsed());

        self.finalize()
    }

    fn reset(&mut self) {
        self.mesh = HalfEdgeMesh::new();
        self.state = TriangulationState::Empty;
        self.super_triangle = None;
        self.super_vertices = None;
    }

    fn bootstrap(&mut self) -> Result<()> {
        let [a, b, c] = self.points.super_triangle(self.config.super_triangle_scale);
        self.mesh.add_face(a, b, c)?;
        let find = |p: Pos2| {
            self.mesh
                .find_vertex(p)
                .ok_or(DelaunayError::LocationFailure { point: p, steps: 0 })
        };
        self.super_vertices = Some([find(a)?, find(b)?, find(c)?]);
        self.super_triangle = Some([a, b, c]);
        self.state = TriangulationState::Bootstrapped;
        debug!("超级三角形: {:?}, {:?}, {:?}", a, b, c);
        Ok(())
    }

    /// 插入一个点并恢复 Delaunay 性质
    fn insert_point(&mut self, p: Pos2) -> Result<()> {
        let face = self.locate(p)?;
        let split = self.mesh.split_face(face, p)?;

        let mut stack: Vec<EdgeId> = Vec::with_capacity(16);
        for e in split {
            if let Some(o) = self.mesh.opposite(e)? {
                stack.push(o);
            }
        }

        let mut steps = 0;
        while let Some(e) = stack.pop() {
            steps += 1;
            if steps > self.config.max_repair_steps {
                return Err(DelaunayError::LocationFailure { point: p, steps });
            }

            // e 所在的三角形不含 p，对面的三角形含 p
            let [a, b, c] = self.mesh.face_vertices(self.mesh.face_of(e)?)?;
            let (a, b, c) = (self.symbolic(a)?, self.symbolic(b)?, self.symbolic(c)?);
            if !predicates::symbolic_in_circle(a, b, c, SymbolicPoint::Finite(p)) {
                continue;
            }

            let e_next = self.mesh.next(e)?;
            let e_prev = self.mesh.prev(e)?;
            self.mesh.flip_edge(e)?;

            // 翻转后这两条边正对 p
            for facing in [e_next, e_prev] {
                if let Some(o) = self.mesh.opposite(facing)? {
                    if !stack.contains(&o) {
                        stack.push(o);
                    }
                }
            }
        }

        Ok(())
    }

    /// 从最近创建的三角形出发，向 p 所在的方向行走
    fn locate(&self, p: Pos2) -> Result<FaceId> {
        let mut face = self
            .mesh
            .newest_face()
            .ok_or(DelaunayError::LocationFailure { point: p, steps: 0 })?;

        for step in 0..self.config.max_walk_steps {
            let mut crossed = None;
            for e in self.mesh.face_edges(face)? {
                let from = self.symbolic(self.mesh.origin(e)?)?;
                let to = self.symbolic(self.mesh.target(e)?)?;
                if predicates::symbolic_orientation(from, to, SymbolicPoint::Finite(p))
                    == Orientation::Right
                {
                    crossed = Some(e);
                    break;
                }
            }

            let Some(e) = crossed else {
                return Ok(face);
            };
            match self.mesh.opposite(e)? {
                Some(o) => face = self.mesh.face_of(o)?,
                // 走出了网格
                None => {
                    return Err(DelaunayError::LocationFailure {
                        point: p,
                        steps: step + 1,
                    })
                }
            }
        }

        Err(DelaunayError::LocationFailure {
            point: p,
            steps: self.config.max_walk_steps,
        })
    }

    /// 谓词使用的顶点坐标，超级顶点映射到无穷远
    fn symbolic(&self, v: VertexId) -> Result<SymbolicPoint> {
        if let Some(slot) = self
            .super_vertices
            .and_then(|supers| supers.iter().position(|&s| s == v))
        {
            return Ok(SymbolicPoint::AtInfinity(SUPER_DIRECTIONS[slot]));
        }
        Ok(SymbolicPoint::Finite(self.mesh.position(v)?))
    }

    /// 删除所有与超级三角形顶点相连的三角形
    fn finalize(&mut self) -> Result<()> {
        let super_vertices: Vec<VertexId> = self.super_vertices.into_iter().flatten().collect();

        let mut doomed = Vec::new();
        for f in self.mesh.face_ids() {
            let vertices = self.mesh.face_vertices(f)?;
            if vertices.iter().any(|v| super_vertices.contains(v)) {
                doomed.push(f);
            }
        }
        for &f in &doomed {
            self.mesh.remove_face(f, true)?;
        }

        debug!(
            "移除了 {} 个超级三角形相关的三角形，剩余 {}",
            doomed.len(),
            self.mesh.face_count()
        );
        debug_assert!(
            self.mesh.validate().is_ok(),
            "mesh invariants broken after finalize"
        );

        self.state = TriangulationState::Finalized;
        Ok(())
    }

    // ========================================================================
    // 只读访问
    // ========================================================================

    pub fn state(&self) -> TriangulationState {
        self.state
    }

    pub fn config(&self) -> &TriangulationConfig {
        &self.config
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }

    pub fn mesh(&self) -> &HalfEdgeMesh {
        &self.mesh
    }

    /// 构建时使用的超级三角形（失败或未计算时为 `None`）
    pub fn super_triangle(&self) -> Option<[Pos2; 3]> {
        self.super_triangle
    }

    /// 所有三角形（逆时针）
    pub fn triangles(&self) -> Vec<Triangle> {
        self.mesh
            .face_ids()
            .filter_map(|f| self.mesh.face_points(f).ok())
            .map(Triangle::new)
            .collect()
    }

    /// 参与三角剖分的点，按插入顺序
    ///
    /// 不属于任何三角形的点（例如全部共线的输入）不在其中。
    pub fn sites(&self) -> Vec<Pos2> {
        self.mesh
            .vertex_ids()
            .filter_map(|v| self.mesh.position(v).ok())
            .collect()
    }

    /// 扁平的三角形索引列表，每 3 个索引指向 [`Self::sites`] 中的一个三角形
    pub fn triangle_indices(&self) -> Vec<u32> {
        let index: HashMap<VertexId, u32> = self
            .mesh
            .vertex_ids()
            .enumerate()
            .map(|(i, v)| (v, i as u32))
            .collect();

        let mut indices = Vec::with_capacity(self.mesh.face_count() * 3);
        for f in self.mesh.face_ids() {
            if let Ok(vertices) = self.mesh.face_vertices(f) {
                indices.extend(vertices.iter().filter_map(|v| index.get(v)));
            }
        }
        indices
    }

    /// 所有唯一的无向边
    pub fn edges(&self) -> Vec<Edge> {
        self.mesh
            .edge_ids()
            .filter(|&e| match self.mesh.opposite(e) {
                Ok(Some(o)) => e < o,
                Ok(None) => true,
                Err(_) => false,
            })
            .filter_map(|e| self.mesh.edge_points(e).ok())
            .map(|(from, to)| Edge::new(from, to))
            .collect()
    }

    /// 凸包边（有向，内部在左侧）
    pub fn hull_edges(&self) -> Vec<Edge> {
        self.boundary_edges()
            .into_iter()
            .filter_map(|e| self.mesh.edge_points(e).ok())
            .map(|(from, to)| Edge::new(from, to))
            .collect()
    }

    /// 凸包顶点，逆时针顺序
    pub fn hull_vertices(&self) -> Vec<Pos2> {
        let mut by_origin: HashMap<VertexId, EdgeId> = HashMap::new();
        for e in self.boundary_edges() {
            if let Ok(v) = self.mesh.origin(e) {
                by_origin.insert(v, e);
            }
        }

        let Some(start) = by_origin.keys().min().copied() else {
            return Vec::new();
        };

        let mut hull = Vec::with_capacity(by_origin.len());
        let mut current = start;
        while hull.len() < by_origin.len() {
            let Ok(position) = self.mesh.position(current) else {
                break;
            };
            hull.push(position);
            let Some(next) = by_origin
                .get(&current)
                .and_then(|&e| self.mesh.target(e).ok())
            else {
                break;
            };
            if next == start {
                break;
            }
            current = next;
        }
        hull
    }

    /// 顶点是否在凸包上
    pub fn is_hull_vertex(&self, v: VertexId) -> bool {
        matches!(self.mesh.edges_around_vertex(v), Ok((fan, false)) if !fan.is_empty())
    }

    fn boundary_edges(&self) -> Vec<EdgeId> {
        self.mesh
            .edge_ids()
            .filter(|&e| self.mesh.is_boundary(e).unwrap_or(false))
            .collect()
    }
}

// ============================================================================
// 公开 API
// ============================================================================

/// 对点集执行 Delaunay 三角剖分
///
/// # 示例
/// ```ignore
/// let triangulation = triangulate(vec![
///     Pos2::new(0.0, 0.0),
///     Pos2::new(10.0, 0.0),
///     Pos2::new(5.0, 8.0),
/// ])?;
/// assert_eq!(triangulation.triangles().len(), 1);
/// ```
pub fn triangulate(points: impl Into<PointSet>) -> Result<Triangulation> {
    triangulate_with_config(points, TriangulationConfig::default())
}

pub fn triangulate_with_config(
    points: impl Into<PointSet>,
    config: TriangulationConfig,
) -> Result<Triangulation> {
    let mut triangulation = Triangulation::with_config(points.into(), config);
    triangulation.calculate()?;
    Ok(triangulation)
}

/// 并行处理多个互相独立的点集
///
/// 每个区域各自拥有网格，结果顺序与输入一致。
pub fn triangulate_regions(
    regions: Vec<PointSet>,
    config: &TriangulationConfig,
) -> Vec<Result<Triangulation>> {
    let start_time = Instant::now();
    let region_count = regions.len();

    let results: Vec<Result<Triangulation>> = regions
        .into_par_iter()
        .map(|points| triangulate_with_config(points, config.clone()))
        .collect();

    debug!(
        "{} 个区域的三角剖分完成，耗时 {:.2?}",
        region_count,
        start_time.elapsed()
    );
    results
}
