//! 空间索引模块
//!
//! 提供站点的空间查询功能，用于：
//! - 点击测试（查找某个位置所在的 Voronoi 单元格）
//! - 邻居查询（查找某点附近的其他站点）
//!
//! # 主要类型
//! - [`SiteIndex`][]: 基于均匀网格的站点索引

mod site_index;

pub use site_index::SiteIndex;
