//! Delaunay 三角剖分与 Voronoi 图模块
//!
//! 本模块提供地图几何基础的核心算法：
//! - **Delaunay 三角剖分**: 将点集划分为三角形网格（增量插入 + 边翻转）
//! - **Voronoi 图**: Delaunay 的对偶图，用于划分地理单元
//!
//! # 架构概览
//!
//! ```text
//! 输入点集 (PointSet)
//!        │
//!        ▼
//! ┌──────────────────┐
//! │  Triangulation   │  ── 超级三角形 → 行走定位 → 拆分 → 翻转修复 → 清理
//! └────────┬─────────┘
//!          │
//!          ▼
//!    HalfEdgeMesh（半边网格）
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  VoronoiDiagram  │  ── 外心 → 合并 → 排序 → 邻接
//! └────────┬─────────┘
//!          │
//!          ▼
//!   Vec<VoronoiCell>
//! ```
//!
//! # 使用示例
//!
//! ```ignore
//! use terrain_voronoi::delaunay::{VoronoiDiagram, triangulate};
//! use egui::Pos2;
//!
//! let points = vec![
//!     Pos2::new(0.0, 0.0),
//!     Pos2::new(100.0, 0.0),
//!     Pos2::new(50.0, 100.0),
//!     // ...
//! ];
//!
//! // 只需要三角形
//! let triangulation = triangulate(points.clone())?;
//! let indices = triangulation.triangle_indices();
//!
//! // 需要 Voronoi 单元格
//! let mut diagram = VoronoiDiagram::from_positions(points);
//! diagram.calculate()?;
//! let (vertices, indices) = diagram.render_data();
//! ```
//!
//! # 模块结构
//!
//! - `predicates`: 方向、点在三角形内、外接圆等几何谓词
//! - `half_edge`: 半边网格
//! - `triangulation`: 三角剖分引擎
//! - `voronoi`: Voronoi 图生成
//! - `clip`: 凸多边形裁剪与度量
//! - `utils`: 验证和辅助工具

mod clip;
mod edge;
mod error;
mod points;
mod triangle;
mod triangulation;
mod utils;

pub mod half_edge;
pub mod predicates;
pub mod voronoi;

#[cfg(test)]
mod voronoi_tests;

// ============================================================================
// 公开 API
// ============================================================================

/// 错误类型
pub use error::{DelaunayError, Result};

/// 输入点集
pub use points::{PointSet, DEFAULT_SUPER_TRIANGLE_SCALE};

/// 无向边和三角形
pub use edge::Edge;
pub use triangle::Triangle;

/// 三角剖分
pub use triangulation::{
    triangulate, triangulate_regions, triangulate_with_config, Triangulation,
    TriangulationConfig, TriangulationState,
};

/// Voronoi 图
pub use voronoi::{HullPolicy, VoronoiCell, VoronoiConfig, VoronoiDiagram};

/// 多边形裁剪
pub use clip::clip_to_rect;

/// 验证函数
///
/// 验证三角剖分结果是否满足 Delaunay 性质。
pub use utils::{
    convex_hull, convex_hull_count, delaunay_violations, has_improper_crossing, validate_delaunay,
};
