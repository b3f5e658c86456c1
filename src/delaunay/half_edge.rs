//! 半边数据结构 (Half-Edge / DCEL)
//!
//! 三角剖分在构建过程中需要反复拆分三角形、翻转边、删除三角形，
//! 本模块用 arena + 类型化句柄表示这种带环的网格拓扑：
//! - 顶点、半边、面分别存放在各自的数组中，互相之间只通过句柄引用
//! - 被删除的槽位置为 `None`，旧句柄访问时返回 [`DelaunayError::InvalidHandle`]
//! - 对边查找通过 `(起点, 终点)` 哈希表完成，O(1)
//!
//! # 核心概念
//!
//! ```text
//!        传统边                    半边表示
//!
//!     A ←──────→ B           A ─────→ B   (半边 e1)
//!                            A ←───── B   (半边 e2，e1 的 opposite)
//! ```
//!
//! 每条半边记录它**指向**的顶点，起点是 `prev` 指向的顶点。
//! 所有面都是逆时针的：面内部始终在半边的左侧。

use egui::Pos2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::edge::point_key;
use super::error::{DelaunayError, Result};
use super::predicates::{self, ORIENTATION_EPSILON};

// ============================================================================
// 句柄
// ============================================================================

macro_rules! mesh_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub(crate) u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

mesh_handle!(
    /// 顶点句柄
    VertexId
);
mesh_handle!(
    /// 半边句柄
    EdgeId
);
mesh_handle!(
    /// 面（三角形）句柄
    FaceId
);

// ============================================================================
// 记录
// ============================================================================

#[derive(Debug, Clone)]
struct Vertex {
    position: Pos2,
    /// 任意一条从该顶点出发的半边
    edge: Option<EdgeId>,
}

#[derive(Debug, Clone)]
struct HalfEdge {
    /// 半边指向的顶点
    vertex: VertexId,
    face: FaceId,
    next: EdgeId,
    prev: EdgeId,
    /// 凸包边界上的半边没有对边
    opposite: Option<EdgeId>,
}

#[derive(Debug, Clone)]
struct Face {
    edge: EdgeId,
}

/// 半边网格
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    vertices: Vec<Option<Vertex>>,
    edges: Vec<Option<HalfEdge>>,
    faces: Vec<Option<Face>>,

    /// 坐标位模式 → 顶点，保证相同位置只有一个顶点
    vertex_lookup: HashMap<(u32, u32), VertexId>,
    /// (起点, 终点) → 半边，用于对边查找
    edge_map: HashMap<(VertexId, VertexId), EdgeId>,

    live_vertices: usize,
    live_faces: usize,
    newest_face: Option<FaceId>,
}

impl HalfEdgeMesh {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // 基本查询
    // ========================================================================

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.live_vertices
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.live_faces
    }

    /// 存活的半边数量，总是面数的 3 倍
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.live_faces * 3
    }

    pub fn is_empty(&self) -> bool {
        self.live_faces == 0
    }

    /// 最近创建的面（点定位行走的起点）
    pub fn newest_face(&self) -> Option<FaceId> {
        self.newest_face.filter(|&f| self.contains_face(f))
    }

    pub fn contains_vertex(&self, v: VertexId) -> bool {
        matches!(self.vertices.get(v.index()), Some(Some(_)))
    }

    pub fn contains_edge(&self, e: EdgeId) -> bool {
        matches!(self.edges.get(e.index()), Some(Some(_)))
    }

    pub fn contains_face(&self, f: FaceId) -> bool {
        matches!(self.faces.get(f.index()), Some(Some(_)))
    }

    /// 按坐标精确查找顶点
    pub fn find_vertex(&self, position: Pos2) -> Option<VertexId> {
        self.vertex_lookup.get(&point_key(position)).copied()
    }

    /// 查找 from → to 的半边
    pub fn find_edge(&self, from: VertexId, to: VertexId) -> Option<EdgeId> {
        self.edge_map.get(&(from, to)).copied()
    }

    /// 存活顶点句柄（按创建顺序）
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_some())
            .map(|(i, _)| VertexId(i as u32))
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_some())
            .map(|(i, _)| EdgeId(i as u32))
    }

    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_some())
            .map(|(i, _)| FaceId(i as u32))
    }

    // ========================================================================
    // 半边导航
    // ========================================================================

    pub fn position(&self, v: VertexId) -> Result<Pos2> {
        Ok(self.vertex_rec(v)?.position)
    }

    /// 顶点的一条出边，孤立顶点返回 `None`
    pub fn vertex_edge(&self, v: VertexId) -> Result<Option<EdgeId>> {
        Ok(self.vertex_rec(v)?.edge)
    }

    /// 半边的终点
    #[inline]
    pub fn target(&self, e: EdgeId) -> Result<VertexId> {
        Ok(self.edge_rec(e)?.vertex)
    }

    /// 半边的起点（前一条半边的终点）
    #[inline]
    pub fn origin(&self, e: EdgeId) -> Result<VertexId> {
        let prev = self.edge_rec(e)?.prev;
        Ok(self.edge_rec(prev)?.vertex)
    }

    #[inline]
    pub fn next(&self, e: EdgeId) -> Result<EdgeId> {
        Ok(self.edge_rec(e)?.next)
    }

    #[inline]
    pub fn prev(&self, e: EdgeId) -> Result<EdgeId> {
        Ok(self.edge_rec(e)?.prev)
    }

    #[inline]
    pub fn opposite(&self, e: EdgeId) -> Result<Option<EdgeId>> {
        Ok(self.edge_rec(e)?.opposite)
    }

    #[inline]
    pub fn face_of(&self, e: EdgeId) -> Result<FaceId> {
        Ok(self.edge_rec(e)?.face)
    }

    /// 检查半边是否在边界上（没有对边）
    #[inline]
    pub fn is_boundary(&self, e: EdgeId) -> Result<bool> {
        Ok(self.edge_rec(e)?.opposite.is_none())
    }

    /// 半边两端的坐标 (起点, 终点)
    pub fn edge_points(&self, e: EdgeId) -> Result<(Pos2, Pos2)> {
        let from = self.position(self.origin(e)?)?;
        let to = self.position(self.target(e)?)?;
        Ok((from, to))
    }

    // ========================================================================
    // 面查询
    // ========================================================================

    /// 面的三条半边，从面记录的边开始沿 next 顺序
    pub fn face_edges(&self, f: FaceId) -> Result<[EdgeId; 3]> {
        let e0 = self.face_rec(f)?.edge;
        let e1 = self.next(e0)?;
        let e2 = self.next(e1)?;
        Ok([e0, e1, e2])
    }

    /// 面的三个顶点（逆时针），第 i 个顶点是第 i 条半边的起点
    pub fn face_vertices(&self, f: FaceId) -> Result<[VertexId; 3]> {
        let [e0, e1, e2] = self.face_edges(f)?;
        Ok([self.target(e2)?, self.target(e0)?, self.target(e1)?])
    }

    pub fn face_points(&self, f: FaceId) -> Result<[Pos2; 3]> {
        let [a, b, c] = self.face_vertices(f)?;
        Ok([self.position(a)?, self.position(b)?, self.position(c)?])
    }

    /// 与该面共享边的面（最多 3 个）
    pub fn adjacent_faces(&self, f: FaceId) -> Result<Vec<FaceId>> {
        let mut neighbors = Vec::with_capacity(3);
        for e in self.face_edges(f)? {
            if let Some(o) = self.opposite(e)? {
                neighbors.push(self.face_of(o)?);
            }
        }
        Ok(neighbors)
    }

    // ========================================================================
    // 顶点周围遍历
    // ========================================================================

    /// 遍历顶点周围的所有出边
    ///
    /// 按逆时针顺序返回从 v 出发的半边。
    /// - 内部顶点：完整的一圈，`is_closed == true`
    /// - 边界顶点：从出方向的边界半边开始，到入方向边界半边所在的面为止
    ///
    /// # 返回值
    /// - `(edges, is_closed)`: 半边列表和是否形成闭环
    pub fn edges_around_vertex(&self, v: VertexId) -> Result<(Vec<EdgeId>, bool)> {
        let Some(start) = self.vertex_rec(v)?.edge else {
            return Ok((Vec::new(), false));
        };
        let limit = self.edge_count();

        // 逆时针：prev 指回 v，它的对边就是下一条出边
        let mut forward = vec![start];
        let mut current = start;
        loop {
            match self.opposite(self.prev(current)?)? {
                None => break,
                Some(e) if e == start => return Ok((forward, true)),
                Some(e) => {
                    if forward.len() > limit {
                        return Err(DelaunayError::InvalidHandle("vertex fan"));
                    }
                    forward.push(e);
                    current = e;
                }
            }
        }

        // 遇到边界，从起点向顺时针方向补齐
        let mut backward = Vec::new();
        current = start;
        while let Some(o) = self.opposite(current)? {
            let e = self.next(o)?;
            if backward.len() + forward.len() > limit {
                return Err(DelaunayError::InvalidHandle("vertex fan"));
            }
            backward.push(e);
            current = e;
        }

        backward.reverse();
        backward.extend(forward);
        Ok((backward, false))
    }

    /// 顶点周围的所有面，顺序与 [`Self::edges_around_vertex`] 一致
    pub fn faces_around_vertex(&self, v: VertexId) -> Result<Vec<FaceId>> {
        let (edges, _) = self.edges_around_vertex(v)?;
        edges.into_iter().map(|e| self.face_of(e)).collect()
    }

    // ========================================================================
    // 修改操作
    // ========================================================================

    /// 添加一个三角形
    ///
    /// 相同坐标的顶点会被复用，三角形统一调整为逆时针，
    /// 与已有半边反向重合的半边会自动互为对边。
    pub fn add_face(&mut self, p1: Pos2, p2: Pos2, p3: Pos2) -> Result<FaceId> {
        let (p2, p3) = if predicates::cross(p1, p2, p3) < 0.0 {
            (p3, p2)
        } else {
            (p2, p3)
        };

        let a = self.get_or_insert_vertex(p1);
        let b = self.get_or_insert_vertex(p2);
        let c = self.get_or_insert_vertex(p3);

        let f = self.alloc_face();
        let e0 = self.next_edge_id(0);
        let e1 = self.next_edge_id(1);
        let e2 = self.next_edge_id(2);

        // e0: a→b, e1: b→c, e2: c→a
        self.edges.push(Some(HalfEdge::new(b, f, e1, e2)));
        self.edges.push(Some(HalfEdge::new(c, f, e2, e0)));
        self.edges.push(Some(HalfEdge::new(a, f, e0, e1)));
        self.faces[f.index()] = Some(Face { edge: e0 });

        for (from, to, e) in [(a, b, e0), (b, c, e1), (c, a, e2)] {
            self.link(from, to, e)?;
            let vertex = self.vertex_mut(from)?;
            if vertex.edge.is_none() {
                vertex.edge = Some(e);
            }
        }

        self.newest_face = Some(f);
        Ok(f)
    }

    /// 在面内插入一个新顶点，把一个三角形拆成三个
    ///
    /// 原来的三条半边保留，分别落在三个新三角形里，
    /// 返回值就是这三条半边（即新顶点对面的边）。
    pub fn split_face(&mut self, f: FaceId, p: Pos2) -> Result<[EdgeId; 3]> {
        let [e0, e1, e2] = self.face_edges(f)?;
        let [a, b, c] = self.face_vertices(f)?;
        let vp = self.get_or_insert_vertex(p);

        let f1 = self.alloc_face();
        let f2 = self.alloc_face();
        let n0 = self.next_edge_id(0);
        let m0 = self.next_edge_id(1);
        let n1 = self.next_edge_id(2);
        let m1 = self.next_edge_id(3);
        let n2 = self.next_edge_id(4);
        let m2 = self.next_edge_id(5);

        // f  = (a, b, p): e0 a→b, n0 b→p, m0 p→a
        // f1 = (b, c, p): e1 b→c, n1 c→p, m1 p→b
        // f2 = (c, a, p): e2 c→a, n2 a→p, m2 p→c
        self.edges.push(Some(HalfEdge::new(vp, f, m0, e0)));
        self.edges.push(Some(HalfEdge::new(a, f, e0, n0)));
        self.edges.push(Some(HalfEdge::new(vp, f1, m1, e1)));
        self.edges.push(Some(HalfEdge::new(b, f1, e1, n1)));
        self.edges.push(Some(HalfEdge::new(vp, f2, m2, e2)));
        self.edges.push(Some(HalfEdge::new(c, f2, e2, n2)));

        for (e, face, next, prev) in [(e0, f, n0, m0), (e1, f1, n1, m1), (e2, f2, n2, m2)] {
            let rec = self.edge_mut(e)?;
            rec.face = face;
            rec.next = next;
            rec.prev = prev;
        }

        self.faces[f.index()] = Some(Face { edge: e0 });
        self.faces[f1.index()] = Some(Face { edge: e1 });
        self.faces[f2.index()] = Some(Face { edge: e2 });

        self.link(b, vp, n0)?;
        self.link(vp, a, m0)?;
        self.link(c, vp, n1)?;
        self.link(vp, b, m1)?;
        self.link(a, vp, n2)?;
        self.link(vp, c, m2)?;

        self.vertex_mut(vp)?.edge = Some(m0);
        self.newest_face = Some(f2);
        Ok([e0, e1, e2])
    }

    /// 翻转一条内部边
    ///
    /// ```text
    ///        c                  c
    ///       / \                /|\
    ///      /   \              / | \
    ///     a --e- b    →      a  e  b
    ///      \   /              \ | /
    ///       \ /                \|/
    ///        d                  d
    /// ```
    ///
    /// 翻转前 e = a→b 位于 (a, b, c)，对边 t = b→a 位于 (b, a, d)；
    /// 翻转后 e = c→d 位于 (d, b, c)，t = d→c 位于 (c, a, d)。
    /// 半边和面的句柄都保持不变。
    pub fn flip_edge(&mut self, e: EdgeId) -> Result<()> {
        let t = self
            .opposite(e)?
            .ok_or(DelaunayError::InvalidFlip { edge: e.0 })?;

        let e_n = self.next(e)?;
        let e_p = self.prev(e)?;
        let t_n = self.next(t)?;
        let t_p = self.prev(t)?;
        let f1 = self.face_of(e)?;
        let f2 = self.face_of(t)?;

        let a = self.target(e_p)?;
        let b = self.target(e)?;
        let c = self.target(e_n)?;
        let d = self.target(t_n)?;

        // f1 = (d, b, c): t_p d→b, e_n b→c, e c→d
        self.set_links(e, d, f1, t_p, e_n)?;
        self.set_links(t_p, b, f1, e_n, e)?;
        self.set_links(e_n, c, f1, e, t_p)?;

        // f2 = (c, a, d): e_p c→a, t_n a→d, t d→c
        self.set_links(t, c, f2, e_p, t_n)?;
        self.set_links(e_p, a, f2, t_n, t)?;
        self.set_links(t_n, d, f2, t, e_p)?;

        self.face_mut(f1)?.edge = e;
        self.face_mut(f2)?.edge = t;

        self.vertex_mut(a)?.edge = Some(t_n);
        self.vertex_mut(b)?.edge = Some(e_n);
        self.vertex_mut(c)?.edge = Some(e_p);
        self.vertex_mut(d)?.edge = Some(t_p);

        self.edge_map.remove(&(a, b));
        self.edge_map.remove(&(b, a));
        self.edge_map.insert((c, d), e);
        self.edge_map.insert((d, c), t);
        Ok(())
    }

    /// 删除一个面及其三条半边
    ///
    /// 相邻面的对边链接被清空（它们变成边界边）。
    /// `remove_orphans` 为真时，同时删除不再被任何半边引用的顶点。
    pub fn remove_face(&mut self, f: FaceId, remove_orphans: bool) -> Result<()> {
        let face_edges = self.face_edges(f)?;
        let face_vertices = self.face_vertices(f)?;

        // 顶点 i 在本面内的出边是 face_edges[i]，
        // 先记下其他面里的候选出边
        let mut replacements = [[None; 2]; 3];
        for (i, &e) in face_edges.iter().enumerate() {
            let across_prev = self.opposite(self.prev(e)?)?;
            let across_self = match self.opposite(e)? {
                Some(o) => Some(self.next(o)?),
                None => None,
            };
            replacements[i] = [across_prev, across_self];
        }

        for (i, &e) in face_edges.iter().enumerate() {
            if let Some(o) = self.opposite(e)? {
                self.edge_mut(o)?.opposite = None;
            }
            let from = face_vertices[i];
            let to = face_vertices[(i + 1) % 3];
            self.edge_map.remove(&(from, to));
        }
        for e in face_edges {
            self.edges[e.index()] = None;
        }
        self.faces[f.index()] = None;
        self.live_faces -= 1;

        for (i, &v) in face_vertices.iter().enumerate() {
            let current = self.vertex_rec(v)?.edge;
            if current.is_some_and(|e| self.contains_edge(e)) {
                continue;
            }

            let replacement = replacements[i]
                .into_iter()
                .flatten()
                .find(|&e| self.contains_edge(e))
                .or_else(|| {
                    self.edge_map
                        .iter()
                        .find(|((from, _), _)| *from == v)
                        .map(|(_, &e)| e)
                });

            match replacement {
                Some(e) => self.vertex_mut(v)?.edge = Some(e),
                None if remove_orphans => self.remove_vertex(v)?,
                None => self.vertex_mut(v)?.edge = None,
            }
        }

        if self.newest_face == Some(f) {
            self.newest_face = self.face_ids().last();
        }
        Ok(())
    }

    // ========================================================================
    // 校验
    // ========================================================================

    /// 检查网格的所有结构不变量
    ///
    /// 返回发现的第一个问题的描述。
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut live_edges = 0;
        for e in self.edge_ids() {
            live_edges += 1;
            let rec = self.edge_rec(e).map_err(|err| err.to_string())?;
            let next = self
                .edge_rec(rec.next)
                .map_err(|_| format!("edge {:?}: dangling next", e))?;
            let prev = self
                .edge_rec(rec.prev)
                .map_err(|_| format!("edge {:?}: dangling prev", e))?;
            if next.prev != e || prev.next != e {
                return Err(format!("edge {:?}: next/prev mismatch", e));
            }
            if next.face != rec.face || prev.face != rec.face {
                return Err(format!("edge {:?}: face mismatch within cycle", e));
            }
            if next.next != rec.prev {
                return Err(format!("edge {:?}: face is not a triangle", e));
            }
            if !self.contains_vertex(rec.vertex) || !self.contains_face(rec.face) {
                return Err(format!("edge {:?}: dangling vertex or face", e));
            }

            let from = prev.vertex;
            if self.edge_map.get(&(from, rec.vertex)) != Some(&e) {
                return Err(format!("edge {:?}: missing from edge map", e));
            }
            match rec.opposite {
                Some(o) => {
                    let twin = self
                        .edge_rec(o)
                        .map_err(|_| format!("edge {:?}: dangling opposite", e))?;
                    if twin.opposite != Some(e) {
                        return Err(format!("edge {:?}: opposite is not symmetric", e));
                    }
                    if twin.vertex != from {
                        return Err(format!("edge {:?}: opposite has wrong endpoints", e));
                    }
                }
                None => {
                    if self.edge_map.contains_key(&(rec.vertex, from)) {
                        return Err(format!("edge {:?}: unlinked opposite", e));
                    }
                }
            }
        }

        if live_edges != self.edge_count() || self.edge_map.len() != live_edges {
            return Err(format!(
                "edge count mismatch: {} live, {} expected, {} mapped",
                live_edges,
                self.edge_count(),
                self.edge_map.len()
            ));
        }

        for f in self.face_ids() {
            let points = self.face_points(f).map_err(|err| err.to_string())?;
            if predicates::cross(points[0], points[1], points[2]) < -ORIENTATION_EPSILON {
                return Err(format!("face {:?}: clockwise", f));
            }
            let edge = self.face_rec(f).map_err(|err| err.to_string())?.edge;
            if self.face_of(edge).ok() != Some(f) {
                return Err(format!("face {:?}: boundary edge points elsewhere", f));
            }
        }

        for v in self.vertex_ids() {
            if let Ok(Some(e)) = self.vertex_edge(v) {
                if self.origin(e).ok() != Some(v) {
                    return Err(format!("vertex {:?}: edge is not outgoing", v));
                }
            }
        }

        Ok(())
    }

    // ========================================================================
    // 内部方法
    // ========================================================================

    fn vertex_rec(&self, v: VertexId) -> Result<&Vertex> {
        self.vertices
            .get(v.index())
            .and_then(Option::as_ref)
            .ok_or(DelaunayError::InvalidHandle("vertex"))
    }

    fn vertex_mut(&mut self, v: VertexId) -> Result<&mut Vertex> {
        self.vertices
            .get_mut(v.index())
            .and_then(Option::as_mut)
            .ok_or(DelaunayError::InvalidHandle("vertex"))
    }

    fn edge_rec(&self, e: EdgeId) -> Result<&HalfEdge> {
        self.edges
            .get(e.index())
            .and_then(Option::as_ref)
            .ok_or(DelaunayError::InvalidHandle("edge"))
    }

    fn edge_mut(&mut self, e: EdgeId) -> Result<&mut HalfEdge> {
        self.edges
            .get_mut(e.index())
            .and_then(Option::as_mut)
            .ok_or(DelaunayError::InvalidHandle("edge"))
    }

    fn face_rec(&self, f: FaceId) -> Result<&Face> {
        self.faces
            .get(f.index())
            .and_then(Option::as_ref)
            .ok_or(DelaunayError::InvalidHandle("face"))
    }

    fn face_mut(&mut self, f: FaceId) -> Result<&mut Face> {
        self.faces
            .get_mut(f.index())
            .and_then(Option::as_mut)
            .ok_or(DelaunayError::InvalidHandle("face"))
    }

    fn get_or_insert_vertex(&mut self, position: Pos2) -> VertexId {
        let key = point_key(position);
        if let Some(&v) = self.vertex_lookup.get(&key) {
            return v;
        }
        let v = VertexId(self.vertices.len() as u32);
        self.vertices.push(Some(Vertex {
            position,
            edge: None,
        }));
        self.vertex_lookup.insert(key, v);
        self.live_vertices += 1;
        v
    }

    fn remove_vertex(&mut self, v: VertexId) -> Result<()> {
        let position = self.vertex_rec(v)?.position;
        self.vertex_lookup.remove(&point_key(position));
        self.vertices[v.index()] = None;
        self.live_vertices -= 1;
        Ok(())
    }

    /// 预留一个面槽位，调用方负责写入记录
    fn alloc_face(&mut self) -> FaceId {
        let f = FaceId(self.faces.len() as u32);
        self.faces.push(None);
        self.live_faces += 1;
        f
    }

    #[inline]
    fn next_edge_id(&self, offset: usize) -> EdgeId {
        EdgeId((self.edges.len() + offset) as u32)
    }

    /// 登记 from → to 的半边，并与反向半边互相链接
    fn link(&mut self, from: VertexId, to: VertexId, e: EdgeId) -> Result<()> {
        self.edge_map.insert((from, to), e);
        if let Some(&o) = self.edge_map.get(&(to, from)) {
            self.edge_mut(e)?.opposite = Some(o);
            self.edge_mut(o)?.opposite = Some(e);
        }
        Ok(())
    }

    fn set_links(
        &mut self,
        e: EdgeId,
        vertex: VertexId,
        face: FaceId,
        next: EdgeId,
        prev: EdgeId,
    ) -> Result<()> {
        let rec = self.edge_mut(e)?;
        rec.vertex = vertex;
        rec.face = face;
        rec.next = next;
        rec.prev = prev;
        Ok(())
    }
}

impl HalfEdge {
    fn new(vertex: VertexId, face: FaceId, next: EdgeId, prev: EdgeId) -> Self {
        Self {
            vertex,
            face,
            next,
            prev,
            opposite: None,
        }
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mesh() -> (HalfEdgeMesh, FaceId, FaceId) {
        let mut mesh = HalfEdgeMesh::new();
        let f1 = mesh
            .add_face(Pos2::new(0.0, 0.0), Pos2::new(10.0, 0.0), Pos2::new(10.0, 10.0))
            .unwrap();
        let f2 = mesh
            .add_face(Pos2::new(0.0, 0.0), Pos2::new(10.0, 10.0), Pos2::new(0.0, 10.0))
            .unwrap();
        (mesh, f1, f2)
    }

    fn diagonal(mesh: &HalfEdgeMesh) -> EdgeId {
        mesh.edge_ids()
            .find(|&e| !mesh.is_boundary(e).unwrap())
            .unwrap()
    }

    #[test]
    fn test_add_face_shares_vertices_and_links_opposites() {
        let (mesh, _, _) = square_mesh();
        mesh.validate().unwrap();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.edge_count(), 6);

        let interior: Vec<_> = mesh
            .edge_ids()
            .filter(|&e| !mesh.is_boundary(e).unwrap())
            .collect();
        assert_eq!(interior.len(), 2); // 对角线的两条半边
    }

    #[test]
    fn test_add_face_orients_counter_clockwise() {
        let mut mesh = HalfEdgeMesh::new();
        let f = mesh
            .add_face(Pos2::new(0.0, 0.0), Pos2::new(0.0, 10.0), Pos2::new(10.0, 0.0))
            .unwrap();
        let [a, b, c] = mesh.face_points(f).unwrap();
        assert!(predicates::cross(a, b, c) > 0.0);
        mesh.validate().unwrap();
    }

    #[test]
    fn test_navigation() {
        let (mesh, f1, _) = square_mesh();
        let [e0, e1, e2] = mesh.face_edges(f1).unwrap();

        assert_eq!(mesh.next(e0).unwrap(), e1);
        assert_eq!(mesh.prev(e0).unwrap(), e2);
        assert_eq!(mesh.origin(e1).unwrap(), mesh.target(e0).unwrap());

        let [a, b, _] = mesh.face_vertices(f1).unwrap();
        assert_eq!(mesh.origin(e0).unwrap(), a);
        assert_eq!(mesh.target(e0).unwrap(), b);
        assert_eq!(mesh.find_edge(a, b), Some(e0));
    }

    #[test]
    fn test_split_face() {
        let mut mesh = HalfEdgeMesh::new();
        let f = mesh
            .add_face(Pos2::new(0.0, 0.0), Pos2::new(10.0, 0.0), Pos2::new(5.0, 10.0))
            .unwrap();
        let original = mesh.face_edges(f).unwrap();

        let p = Pos2::new(5.0, 3.0);
        let returned = mesh.split_face(f, p).unwrap();
        mesh.validate().unwrap();

        assert_eq!(returned, original);
        assert_eq!(mesh.face_count(), 3);
        assert_eq!(mesh.vertex_count(), 4);

        let vp = mesh.find_vertex(p).unwrap();
        for e in returned {
            let face = mesh.face_of(e).unwrap();
            assert!(mesh.face_vertices(face).unwrap().contains(&vp));
            assert!(mesh.is_boundary(e).unwrap());
        }

        let (fan, closed) = mesh.edges_around_vertex(vp).unwrap();
        assert!(closed);
        assert_eq!(fan.len(), 3);
    }

    #[test]
    fn test_flip_edge() {
        let (mut mesh, _, _) = square_mesh();
        let diag = diagonal(&mesh);
        let before = (mesh.origin(diag).unwrap(), mesh.target(diag).unwrap());

        mesh.flip_edge(diag).unwrap();
        mesh.validate().unwrap();

        let after = (mesh.origin(diag).unwrap(), mesh.target(diag).unwrap());
        assert_ne!(before, after);
        assert!(mesh.find_edge(before.0, before.1).is_none());

        let a = mesh.position(after.0).unwrap();
        let b = mesh.position(after.1).unwrap();
        // 新对角线连接 (10,0) 和 (0,10)
        let mut ends = [a, b];
        ends.sort_by(|p, q| p.x.partial_cmp(&q.x).unwrap());
        assert_eq!(ends, [Pos2::new(0.0, 10.0), Pos2::new(10.0, 0.0)]);

        // 翻转两次回到原状
        mesh.flip_edge(diag).unwrap();
        mesh.validate().unwrap();
        let restored = (mesh.origin(diag).unwrap(), mesh.target(diag).unwrap());
        assert!(restored == before || restored == (before.1, before.0));
    }

    #[test]
    fn test_flip_boundary_edge_fails() {
        let (mut mesh, _, _) = square_mesh();
        let hull = mesh
            .edge_ids()
            .find(|&e| mesh.is_boundary(e).unwrap())
            .unwrap();
        assert!(matches!(
            mesh.flip_edge(hull),
            Err(DelaunayError::InvalidFlip { .. })
        ));
    }

    #[test]
    fn test_remove_face() {
        let (mut mesh, f1, f2) = square_mesh();
        mesh.remove_face(f1, true).unwrap();
        mesh.validate().unwrap();

        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.vertex_count(), 3); // (10,0) 成为孤立顶点被删除
        assert!(mesh.find_vertex(Pos2::new(10.0, 0.0)).is_none());
        for e in mesh.face_edges(f2).unwrap() {
            assert!(mesh.is_boundary(e).unwrap());
        }

        // 旧句柄失效
        assert!(matches!(
            mesh.face_edges(f1),
            Err(DelaunayError::InvalidHandle(_))
        ));
    }

    #[test]
    fn test_remove_face_keeps_orphans_when_asked() {
        let (mut mesh, f1, _) = square_mesh();
        mesh.remove_face(f1, false).unwrap();
        let v = mesh.find_vertex(Pos2::new(10.0, 0.0)).unwrap();
        assert_eq!(mesh.vertex_edge(v).unwrap(), None);
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn test_edges_around_boundary_vertex() {
        let (mesh, _, _) = square_mesh();
        let v = mesh.find_vertex(Pos2::new(0.0, 0.0)).unwrap();
        let (fan, closed) = mesh.edges_around_vertex(v).unwrap();

        assert!(!closed);
        assert_eq!(fan.len(), 2);
        for &e in &fan {
            assert_eq!(mesh.origin(e).unwrap(), v);
        }
        // 逆时针：从出方向的边界边开始
        assert!(mesh.is_boundary(fan[0]).unwrap());
        let last_prev = mesh.prev(*fan.last().unwrap()).unwrap();
        assert!(mesh.is_boundary(last_prev).unwrap());

        let faces = mesh.faces_around_vertex(v).unwrap();
        assert_eq!(faces.len(), 2);
    }

    #[test]
    fn test_fan_order_is_counter_clockwise() {
        let mut mesh = HalfEdgeMesh::new();
        let f = mesh
            .add_face(Pos2::new(-10.0, -10.0), Pos2::new(10.0, -10.0), Pos2::new(0.0, 10.0))
            .unwrap();
        let center = Pos2::new(0.0, 0.0);
        mesh.split_face(f, center).unwrap();

        let v = mesh.find_vertex(center).unwrap();
        let (fan, _) = mesh.edges_around_vertex(v).unwrap();
        let angles: Vec<f32> = fan
            .iter()
            .map(|&e| {
                let (_, to) = mesh.edge_points(e).unwrap();
                (to.y - center.y).atan2(to.x - center.x)
            })
            .collect();

        // 相邻出边之间的转角都为正（逆时针）
        for i in 0..angles.len() {
            let a = angles[i];
            let b = angles[(i + 1) % angles.len()];
            let mut delta = b - a;
            if delta < 0.0 {
                delta += std::f32::consts::TAU;
            }
            assert!(delta > 0.0 && delta < std::f32::consts::PI);
        }
    }
}
