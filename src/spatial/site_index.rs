//! 站点空间索引
//!
//! 将空间划分为均匀的格子，快速查找离某个位置最近的站点，
//! 也就是该位置所在的 Voronoi 单元格。

use egui::{Pos2, Rect};

/// 站点网格索引
///
/// 将二维空间划分为均匀的格子，每个格子记录其中包含的站点索引。
/// 用于加速：
/// - 点击测试：查找某个位置对应的 Voronoi 单元格
/// - 范围查询：快速获取圆形范围内的站点
///
/// # 示例
/// ```ignore
/// let index = SiteIndex::build_auto(&sites);
///
/// if let Some(cell_idx) = index.find_nearest(query_pos) {
///     println!("位于单元格 {}", cell_idx);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SiteIndex {
    /// 站点坐标，索引即单元格编号
    sites: Vec<Pos2>,
    /// 每个格子的尺寸
    cell_size: f32,
    /// 网格列数
    grid_width: usize,
    /// 网格行数
    grid_height: usize,
    /// 边界框
    bounds: Rect,
    /// cells[y * grid_width + x] = 该格子内的站点索引列表
    cells: Vec<Vec<u32>>,
}

impl SiteIndex {
    /// 构建网格索引
    ///
    /// # 参数
    /// - `sites`: 需要索引的站点
    /// - `bounds`: 站点的边界框，超出边界的站点放入最近的格子
    /// - `cell_size`: 每个网格格子的尺寸（推荐使用站点平均间距的 2-4 倍）
    ///
    /// 格子尺寸不小于边界框最长边的 1/256，与坐标的绝对尺度无关。
    pub fn build(sites: &[Pos2], bounds: Rect, cell_size: f32) -> Self {
        let extent = bounds.width().max(bounds.height());
        let min_size = if extent.is_finite() && extent > 0.0 {
            extent / 256.0
        } else {
            1.0
        };
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size.max(min_size)
        } else {
            min_size.max(extent / 16.0)
        };

        let grid_width = ((bounds.width() / cell_size).ceil() as usize).max(1);
        let grid_height = ((bounds.height() / cell_size).ceil() as usize).max(1);

        let mut index = Self {
            sites: sites.to_vec(),
            cell_size,
            grid_width,
            grid_height,
            bounds,
            cells: vec![Vec::new(); grid_width * grid_height],
        };

        for (idx, &site) in sites.iter().enumerate() {
            let (gx, gy) = index.point_to_grid_coords(site);
            index.cells[gy * grid_width + gx].push(idx as u32);
        }

        index
    }

    /// 使用默认格子尺寸构建索引
    ///
    /// 边界框取站点的包围盒，格子尺寸根据站点密度自动计算。
    pub fn build_auto(sites: &[Pos2]) -> Self {
        if sites.is_empty() {
            return Self::build(sites, Rect::from_min_max(Pos2::ZERO, Pos2::ZERO), 1.0);
        }

        let bounds = Rect::from_points(sites);
        let area = bounds.width() * bounds.height();
        let avg_spacing = (area / sites.len() as f32).sqrt();

        // 平均间距的 3 倍，每个格子平均约 9 个站点；
        // 站点共线时面积为 0，退回到按最长边划分
        let extent = bounds.width().max(bounds.height());
        Self::build(sites, bounds, (avg_spacing * 3.0).max(extent / 256.0))
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// 查找离 `pos` 最近的站点
    ///
    /// 从所在格子开始逐圈向外搜索，直到更外圈不可能出现更近的站点。
    /// 站点为空时返回 `None`。
    pub fn find_nearest(&self, pos: Pos2) -> Option<u32> {
        if self.sites.is_empty() {
            return None;
        }

        let (gx, gy) = self.point_to_grid_coords(pos);
        let max_ring = self.grid_width.max(self.grid_height);
        let mut best: Option<(u32, f32)> = None;

        for ring in 0..=max_ring {
            for idx in self.ring_sites(gx, gy, ring) {
                let dist = (self.sites[idx as usize] - pos).length_sq();
                if best.is_none_or(|(_, d)| dist < d) {
                    best = Some((idx, dist));
                }
            }

            // 第 ring+1 圈内的站点距离至少为 ring * cell_size
            if let Some((_, d)) = best {
                let reach = ring as f32 * self.cell_size;
                if d <= reach * reach {
                    break;
                }
            }
        }

        best.map(|(idx, _)| idx)
    }

    /// 查询圆形范围内的所有站点
    pub fn query_radius(&self, center: Pos2, radius: f32) -> Vec<u32> {
        let (min_gx, min_gy) = self.point_to_grid_coords(center - egui::vec2(radius, radius));
        let (max_gx, max_gy) = self.point_to_grid_coords(center + egui::vec2(radius, radius));

        let radius_sq = radius * radius;
        let mut result = Vec::new();
        for gy in min_gy..=max_gy {
            for gx in min_gx..=max_gx {
                for &idx in &self.cells[gy * self.grid_width + gx] {
                    if (self.sites[idx as usize] - center).length_sq() <= radius_sq {
                        result.push(idx);
                    }
                }
            }
        }
        result
    }

    /// 获取格子尺寸
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// 获取网格尺寸
    pub fn grid_dimensions(&self) -> (usize, usize) {
        (self.grid_width, self.grid_height)
    }

    /// 获取边界框
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    // ========================================================================
    // 内部方法
    // ========================================================================

    /// 将点坐标转换为网格坐标，超出边界时夹到最近的格子
    fn point_to_grid_coords(&self, pos: Pos2) -> (usize, usize) {
        let x = ((pos.x - self.bounds.min.x) / self.cell_size)
            .floor()
            .max(0.0)
            .min((self.grid_width - 1) as f32) as usize;
        let y = ((pos.y - self.bounds.min.y) / self.cell_size)
            .floor()
            .max(0.0)
            .min((self.grid_height - 1) as f32) as usize;
        (x, y)
    }

    /// 与 (gx, gy) 切比雪夫距离恰好为 ring 的格子中的站点
    fn ring_sites(&self, gx: usize, gy: usize, ring: usize) -> impl Iterator<Item = u32> + '_ {
        let ring = ring as i64;
        let (gx, gy) = (gx as i64, gy as i64);
        (gy - ring..=gy + ring)
            .flat_map(move |y| (gx - ring..=gx + ring).map(move |x| (x, y)))
            .filter(move |&(x, y)| (x - gx).abs() == ring || (y - gy).abs() == ring)
            .filter(move |&(x, y)| {
                x >= 0 && y >= 0 && (x as usize) < self.grid_width && (y as usize) < self.grid_height
            })
            .flat_map(move |(x, y)| self.cells[y as usize * self.grid_width + x as usize].iter().copied())
    }
}
