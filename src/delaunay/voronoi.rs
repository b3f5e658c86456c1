//! Voronoi 图生成模块
//!
//! 基于 Delaunay 三角剖分生成 Voronoi 图。
//! Voronoi 图是 Delaunay 图的对偶图，每个 Delaunay 三角形的外心
//! 成为 Voronoi 图的顶点，共享边的三角形外心之间形成 Voronoi 边。
//!
//! # 算法流程
//! 1. 并行计算每个三角形的外心
//! 2. 在整张图范围内合并距离小于容差的外心（同一个 Voronoi 顶点在每个单元格中坐标完全一致）
//! 3. 对每个站点收集周围三角形的外心，去重后按 `atan2` 排序
//! 4. 相邻外心首尾相连成边，少于 2 个外心的单元格没有边
//! 5. 按 [`HullPolicy`] 处理凸包上的单元格
//! 6. 通过无向边查找相邻单元格
//!
//! # 使用示例
//! ```ignore
//! let mut diagram = VoronoiDiagram::from_positions(points);
//! diagram.calculate()?;
//!
//! for cell in diagram.bounded_cells() {
//!     println!("{:?}: {} 条边", cell.site(), cell.edges().len());
//! }
//!
//! // 用于渲染
//! let (vertices, indices) = diagram.render_data();
//! ```

use egui::{Pos2, Rect, Vec2};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use super::clip;
use super::edge::{point_key, Edge};
use super::error::Result;
use super::half_edge::{FaceId, HalfEdgeMesh, VertexId};
use super::points::PointSet;
use super::predicates;
use super::triangulation::{Triangulation, TriangulationConfig};
use crate::spatial::SiteIndex;

// ============================================================================
// 配置
// ============================================================================

/// 外心合并的默认容差
pub const DEFAULT_CENTER_MERGE_TOLERANCE: f32 = 1e-3;

/// 凸包单元格的处理方式
///
/// 凸包上的站点对应的 Voronoi 单元格在数学上是无界的。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum HullPolicy {
    /// 保留外心围成的扇形多边形，朝外的边没有相邻单元格
    #[default]
    Open,
    /// 丢弃凸包单元格
    Discard,
    /// 用两条向外的射线封闭凸包单元格，并把所有单元格裁剪到矩形内
    Clip(Rect),
}

/// Voronoi 图参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoronoiConfig {
    /// 距离小于该值的外心视为同一个 Voronoi 顶点
    pub center_merge_tolerance: f32,
    pub hull_policy: HullPolicy,
    pub triangulation: TriangulationConfig,
}

impl Default for VoronoiConfig {
    fn default() -> Self {
        Self {
            center_merge_tolerance: DEFAULT_CENTER_MERGE_TOLERANCE,
            hull_policy: HullPolicy::default(),
            triangulation: TriangulationConfig::default(),
        }
    }
}

// ============================================================================
// VoronoiCell
// ============================================================================

/// Voronoi 单元格
///
/// 表示一个站点对应的 Voronoi 多边形区域。
/// 边首尾相连、按逆时针排列，`neighbors[i]` 是隔着 `edges[i]` 的单元格。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoronoiCell {
    site: Pos2,
    edges: Vec<Edge>,
    neighbors: Vec<Option<usize>>,
    on_hull: bool,
    bounded: bool,
}

impl VoronoiCell {
    pub fn site(&self) -> Pos2 {
        self.site
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// 与 [`Self::edges`] 一一对应的相邻单元格索引
    pub fn neighbors(&self) -> &[Option<usize>] {
        &self.neighbors
    }

    /// 站点是否位于输入点集的凸包上
    pub fn is_on_hull(&self) -> bool {
        self.on_hull
    }

    /// 单元格是否是有限的闭合多边形
    pub fn is_bounded(&self) -> bool {
        self.bounded
    }

    /// 多边形顶点（各条边的起点）
    pub fn vertices(&self) -> Vec<Pos2> {
        self.edges.iter().map(|e| e.start).collect()
    }

    /// 点是否在单元格多边形内（含边界）
    pub fn contains(&self, pos: Pos2) -> bool {
        clip::convex_contains(&self.vertices(), pos)
    }

    /// 多边形面积
    pub fn area(&self) -> f64 {
        clip::signed_area(&self.vertices()).abs()
    }

    /// 多边形质心，没有边时返回 `None`
    pub fn centroid(&self) -> Option<Pos2> {
        clip::centroid(&self.vertices())
    }
}

// ============================================================================
// VoronoiDiagram
// ============================================================================

/// Voronoi 图
///
/// 持有源三角剖分和全部单元格，`calculate()` 之后只读。
#[derive(Debug, Clone)]
pub struct VoronoiDiagram {
    triangulation: Triangulation,
    config: VoronoiConfig,
    cells: Vec<VoronoiCell>,
    /// 合并后的 Voronoi 顶点（三角形外心）
    vertices: Vec<Pos2>,
    site_index: Option<SiteIndex>,
}

impl VoronoiDiagram {
    pub fn new(points: PointSet) -> Self {
        Self::with_config(points, VoronoiConfig::default())
    }

    pub fn with_config(points: PointSet, config: VoronoiConfig) -> Self {
        let triangulation = Triangulation::with_config(points, config.triangulation.clone());
        Self {
            triangulation,
            config,
            cells: Vec::new(),
            vertices: Vec::new(),
            site_index: None,
        }
    }

    pub fn from_positions(points: Vec<Pos2>) -> Self {
        Self::new(PointSet::new(points))
    }

    /// 计算三角剖分和 Voronoi 单元格
    ///
    /// 重复调用不会重新计算。
    pub fn calculate(&mut self) -> Result<()> {
        if self.site_index.is_some() {
            return Ok(());
        }

        self.triangulation.calculate()?;

        let start_time = Instant::now();
        let built = build_cells(&self.triangulation, &self.config)?;

        let sites: Vec<Pos2> = built.cells.iter().map(|c| c.site).collect();
        let empty = built.cells.iter().filter(|c| c.edges.is_empty()).count();
        if empty > 0 {
            warn!("{} 个 Voronoi 单元格没有边", empty);
        }

        info!(
            "Voronoi 图生成完成: {} 顶点, {} 单元格 ({} 个有界), 耗时 {:.2?}",
            built.vertices.len(),
            built.cells.len(),
            built.cells.iter().filter(|c| c.bounded).count(),
            start_time.elapsed()
        );

        self.cells = built.cells;
        self.vertices = built.vertices;
        self.site_index = Some(SiteIndex::build_auto(&sites));
        Ok(())
    }

    pub fn is_calculated(&self) -> bool {
        self.site_index.is_some()
    }

    pub fn config(&self) -> &VoronoiConfig {
        &self.config
    }

    pub fn triangulation(&self) -> &Triangulation {
        &self.triangulation
    }

    pub fn cells(&self) -> &[VoronoiCell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&VoronoiCell> {
        self.cells.get(index)
    }

    /// 合并后的 Voronoi 顶点（三角形外心，裁剪前）
    pub fn vertices(&self) -> &[Pos2] {
        &self.vertices
    }

    /// 所有有界单元格
    pub fn bounded_cells(&self) -> impl Iterator<Item = &VoronoiCell> + '_ {
        self.cells.iter().filter(|c| c.bounded)
    }

    /// 单元格的邻接视图，顺序与单元格的边一致
    pub fn neighbors(&self, cell: usize) -> impl Iterator<Item = Option<usize>> + '_ {
        self.cells
            .get(cell)
            .into_iter()
            .flat_map(|c| c.neighbors.iter().copied())
    }

    /// 隔着指定边的相邻单元格
    pub fn neighbor_across(&self, cell: usize, edge: &Edge) -> Option<usize> {
        let cell = self.cells.get(cell)?;
        cell.edges
            .iter()
            .zip(&cell.neighbors)
            .find(|(e, _)| *e == edge)
            .and_then(|(_, &n)| n)
    }

    /// 包含给定位置的单元格（最近站点）
    pub fn cell_at(&self, pos: Pos2) -> Option<usize> {
        self.site_index
            .as_ref()?
            .find_nearest(pos)
            .map(|idx| idx as usize)
    }

    /// 所有唯一的 Voronoi 边
    pub fn edges(&self) -> Vec<Edge> {
        let mut seen = HashSet::new();
        self.cells
            .iter()
            .flat_map(|c| c.edges.iter().copied())
            .filter(|e| seen.insert(*e))
            .collect()
    }

    /// 生成用于渲染的数据
    ///
    /// # 返回值
    /// - `(vertices, indices)`: 顶点数组和边索引数组，每 2 个索引构成一条边
    pub fn render_data(&self) -> (Vec<Pos2>, Vec<u32>) {
        let edges = self.edges();
        let mut vertex_map: HashMap<(u32, u32), u32> = HashMap::new();
        let mut vertices = Vec::new();
        let mut indices = Vec::with_capacity(edges.len() * 2);

        for edge in edges {
            for p in [edge.start, edge.end] {
                let idx = *vertex_map.entry(point_key(p)).or_insert_with(|| {
                    vertices.push(p);
                    (vertices.len() - 1) as u32
                });
                indices.push(idx);
            }
        }

        (vertices, indices)
    }
}

// ============================================================================
// 内部实现
// ============================================================================

struct BuiltCells {
    cells: Vec<VoronoiCell>,
    vertices: Vec<Pos2>,
}

/// 一个站点周围的外心扇形
struct SiteFan {
    site: Pos2,
    /// 逆时针顺序的合并顶点索引（已去重）
    centers: Vec<u32>,
    on_hull: bool,
    /// 凸包站点两侧凸包边的外法线 (出边, 入边)
    hull_normals: Option<(Vec2, Vec2)>,
}

fn build_cells(triangulation: &Triangulation, config: &VoronoiConfig) -> Result<BuiltCells> {
    let mesh = triangulation.mesh();

    // Step 1: 并行计算每个三角形的外心
    let faces: Vec<FaceId> = mesh.face_ids().collect();
    let centers: Vec<Pos2> = faces
        .par_iter()
        .map(|&f| -> Result<Pos2> {
            let [a, b, c] = mesh.face_points(f)?;
            Ok(predicates::circumcircle(a, b, c).center())
        })
        .collect::<Result<Vec<_>>>()?;

    // Step 2: 全图范围合并外心
    let mut table = VertexTable::new(config.center_merge_tolerance);
    let face_vertex: HashMap<FaceId, u32> = faces
        .iter()
        .zip(&centers)
        .map(|(&f, &c)| (f, table.get_or_insert(c)))
        .collect();
    debug!(
        "{} 个外心合并为 {} 个 Voronoi 顶点",
        centers.len(),
        table.vertices.len()
    );

    // Step 3: 每个站点的外心扇形，跳过超级三角形顶点
    let super_keys: Vec<(u32, u32)> = triangulation
        .super_triangle()
        .iter()
        .flatten()
        .map(|&p| point_key(p))
        .collect();

    let mut fans = Vec::new();
    for v in mesh.vertex_ids() {
        let site = mesh.position(v)?;
        if super_keys.contains(&point_key(site)) {
            continue;
        }
        fans.push(site_fan(mesh, v, site, &face_vertex)?);
    }

    // Step 4: 按策略生成单元格多边形
    let clip_rect = match config.hull_policy {
        HullPolicy::Clip(rect) => Some(rect),
        _ => None,
    };
    let far = far_distance(triangulation, &table.vertices, clip_rect);
    let mut cells = Vec::with_capacity(fans.len());
    for fan in fans {
        let polygon = match config.hull_policy {
            HullPolicy::Open => sorted_polygon(&fan, &table.vertices),
            HullPolicy::Discard if fan.on_hull => continue,
            HullPolicy::Discard => sorted_polygon(&fan, &table.vertices),
            HullPolicy::Clip(rect) => {
                let polygon = match fan.hull_normals {
                    Some(normals) => closed_hull_polygon(&fan, &table.vertices, normals, far),
                    None => sorted_polygon(&fan, &table.vertices),
                };
                clip::clip_to_rect(&polygon, rect)
            }
        };

        let edges = polygon_edges(&polygon);
        let bounded = match config.hull_policy {
            HullPolicy::Clip(_) => polygon.len() >= 3,
            _ => !fan.on_hull && polygon.len() >= 3,
        };
        cells.push(VoronoiCell {
            site: fan.site,
            neighbors: vec![None; edges.len()],
            edges,
            on_hull: fan.on_hull,
            bounded,
        });
    }

    // Step 5: 通过共享边建立邻接关系
    link_neighbors(&mut cells);

    Ok(BuiltCells {
        cells,
        vertices: table.vertices,
    })
}

/// 收集站点周围三角形的外心（逆时针、去重）
fn site_fan(
    mesh: &HalfEdgeMesh,
    v: VertexId,
    site: Pos2,
    face_vertex: &HashMap<FaceId, u32>,
) -> Result<SiteFan> {
    let (fan_edges, closed) = mesh.edges_around_vertex(v)?;

    let mut centers: Vec<u32> = Vec::with_capacity(fan_edges.len());
    for &e in &fan_edges {
        if let Some(&id) = face_vertex.get(&mesh.face_of(e)?) {
            if !centers.contains(&id) {
                centers.push(id);
            }
        }
    }

    let on_hull = !closed && !fan_edges.is_empty();
    let hull_normals = match (on_hull, fan_edges.first(), fan_edges.last()) {
        (true, Some(&first), Some(&last)) => {
            // 第一条出边和最后一条出边的前一条都在凸包上
            let (from, to) = mesh.edge_points(first)?;
            let (into_from, into_to) = mesh.edge_points(mesh.prev(last)?)?;
            Some((outward_normal(from, to), outward_normal(into_from, into_to)))
        }
        _ => None,
    };

    Ok(SiteFan {
        site,
        centers,
        on_hull,
        hull_normals,
    })
}

/// 按相对站点的极角排序的外心多边形
fn sorted_polygon(fan: &SiteFan, vertices: &[Pos2]) -> Vec<Pos2> {
    let mut polygon: Vec<Pos2> = fan.centers.iter().map(|&i| vertices[i as usize]).collect();
    let site = fan.site;
    polygon.sort_by(|a, b| {
        let angle_a = ((a.y - site.y) as f64).atan2((a.x - site.x) as f64);
        let angle_b = ((b.y - site.y) as f64).atan2((b.x - site.x) as f64);
        angle_a
            .partial_cmp(&angle_b)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    polygon
}

/// 用两条外法线方向的射线封闭凸包单元格
///
/// 多边形为 `[c_1, …, c_k, c_k + L·n_in, 远端中点, c_1 + L·n_out]`，
/// 共享同一条凸包边的两个单元格会算出完全相同的射线端点。
fn closed_hull_polygon(
    fan: &SiteFan,
    vertices: &[Pos2],
    (n_out, n_in): (Vec2, Vec2),
    far: f32,
) -> Vec<Pos2> {
    let mut polygon: Vec<Pos2> = fan.centers.iter().map(|&i| vertices[i as usize]).collect();
    let (Some(&first), Some(&last)) = (polygon.first(), polygon.last()) else {
        return polygon;
    };

    let bisector = n_out + n_in;
    let direction = if bisector.length_sq() > f32::EPSILON {
        bisector.normalized()
    } else {
        n_out
    };

    polygon.push(last + far * n_in);
    polygon.push(fan.site + 2.0 * far * direction);
    polygon.push(first + far * n_out);
    polygon
}

/// 有向边 from → to 的右手单位法线（逆时针凸包的外侧）
fn outward_normal(from: Pos2, to: Pos2) -> Vec2 {
    let d = to - from;
    Vec2::new(d.y, -d.x).normalized()
}

/// 射线长度：远大于站点、外心和裁剪矩形的跨度
fn far_distance(triangulation: &Triangulation, centers: &[Pos2], clip_rect: Option<Rect>) -> f32 {
    let mut bbox = triangulation.points().bounding_box();
    if let Some(rect) = clip_rect {
        bbox = bbox.union(rect);
    }
    for &c in centers {
        if c.x.is_finite() && c.y.is_finite() && c.x.abs() < f32::MAX / 4.0 {
            bbox.extend_with(c);
        }
    }
    if !bbox.is_finite() {
        return 1.0;
    }
    4.0 * (bbox.width() + bbox.height() + 1.0)
}

/// 首尾相连的多边形边，少于 2 个顶点时没有边
fn polygon_edges(polygon: &[Pos2]) -> Vec<Edge> {
    if polygon.len() < 2 {
        return Vec::new();
    }
    (0..polygon.len())
        .map(|i| Edge::new(polygon[i], polygon[(i + 1) % polygon.len()]))
        .collect()
}

fn link_neighbors(cells: &mut [VoronoiCell]) {
    let mut edge_cells: HashMap<Edge, Vec<usize>> = HashMap::new();
    for (idx, cell) in cells.iter().enumerate() {
        for &edge in &cell.edges {
            let owners = edge_cells.entry(edge).or_default();
            if !owners.contains(&idx) {
                owners.push(idx);
            }
        }
    }

    for (idx, cell) in cells.iter_mut().enumerate() {
        for (edge, neighbor) in cell.edges.iter().zip(cell.neighbors.iter_mut()) {
            *neighbor = edge_cells
                .get(edge)
                .and_then(|owners| owners.iter().copied().find(|&o| o != idx));
        }
    }
}

/// 全图范围的 Voronoi 顶点表
///
/// 坐标按容差量化到格子里，查找时检查相邻 3x3 个格子，
/// 距离在容差内的外心复用第一次出现的坐标。
struct VertexTable {
    tolerance: f32,
    buckets: HashMap<(i64, i64), Vec<u32>>,
    vertices: Vec<Pos2>,
}

impl VertexTable {
    fn new(tolerance: f32) -> Self {
        Self {
            tolerance: tolerance.max(f32::MIN_POSITIVE),
            buckets: HashMap::new(),
            vertices: Vec::new(),
        }
    }

    fn bucket(&self, p: Pos2) -> (i64, i64) {
        let scale = self.tolerance as f64;
        (
            (p.x as f64 / scale).floor() as i64,
            (p.y as f64 / scale).floor() as i64,
        )
    }

    fn get_or_insert(&mut self, p: Pos2) -> u32 {
        let (bx, by) = self.bucket(p);
        let tolerance_sq = self.tolerance * self.tolerance;

        for dy in -1..=1 {
            for dx in -1..=1 {
                let Some(ids) = self.buckets.get(&(bx + dx, by + dy)) else {
                    continue;
                };
                for &id in ids {
                    if (self.vertices[id as usize] - p).length_sq() <= tolerance_sq {
                        return id;
                    }
                }
            }
        }

        let id = self.vertices.len() as u32;
        self.vertices.push(p);
        self.buckets.entry((bx, by)).or_default().push(id);
        id
    }
}
