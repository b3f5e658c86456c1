//! 三角剖分与 Voronoi 构建过程中的错误类型

use egui::Pos2;

/// 构建失败的原因
///
/// 任何一种错误都会中止本次构建，不会返回部分结果。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DelaunayError {
    /// 去重后的点数不足 2 个，在任何计算开始之前就被拒绝
    #[error("insufficient points: need at least 2 distinct points, got {found}")]
    InsufficientPoints { found: usize },

    /// 点定位行走或边翻转修复超过了安全迭代上限，
    /// 通常意味着输入退化（大量共线/重合点）
    #[error("point location failed for ({}, {}) after {steps} steps", point.x, point.y)]
    LocationFailure { point: Pos2, steps: usize },

    /// 试图翻转一条凸包边（没有对边），属于内部不变量被破坏
    #[error("cannot flip hull edge {edge}: it has no opposite half-edge")]
    InvalidFlip { edge: u32 },

    /// 使用了已被删除的网格句柄
    #[error("stale mesh handle: {0}")]
    InvalidHandle(&'static str),
}

pub type Result<T> = std::result::Result<T, DelaunayError>;
