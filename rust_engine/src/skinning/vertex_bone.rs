//! 顶点骨骼绑定表

use crate::LoadError;

/// 每个顶点最多受影响的骨骼数
pub const MAX_BONES_PER_VERTEX: usize = 8;

/// 单个顶点的骨骼权重槽
///
/// 按从左到右顺序填充；权重为 0 的槽视为空槽。
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VertexBoneData {
    pub bone_ids: [u32; MAX_BONES_PER_VERTEX],
    pub weights: [f32; MAX_BONES_PER_VERTEX],
}

impl VertexBoneData {
    /// 写入第一个空槽；槽已满时返回 false
    pub fn add_bone_data(&mut self, bone_id: u32, weight: f32) -> bool {
        for slot in 0..MAX_BONES_PER_VERTEX {
            if self.weights[slot] == 0.0 {
                self.bone_ids[slot] = bone_id;
                self.weights[slot] = weight;
                return true;
            }
        }
        false
    }

    /// 已占用的槽数量
    pub fn influence_count(&self) -> usize {
        self.weights.iter().filter(|&&w| w != 0.0).count()
    }

    /// 遍历非零 (骨骼 ID, 权重)
    pub fn influences(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.bone_ids
            .iter()
            .zip(self.weights.iter())
            .filter(|(_, w)| **w != 0.0)
            .map(|(&id, &w)| (id, w))
    }
}

/// 场景级顶点 -> 骨骼映射
///
/// 骨骼权重列表引用网格内局部顶点索引，这里按各网格顶点数的累加偏移换算为全局索引。
#[derive(Clone, Debug, Default)]
pub struct VertexBoneBinding {
    vertices: Vec<VertexBoneData>,
    mesh_base: Vec<usize>,
}

impl VertexBoneBinding {
    /// 按各网格顶点数预分配
    pub fn new(mesh_vertex_counts: &[usize]) -> Self {
        let mut mesh_base = Vec::with_capacity(mesh_vertex_counts.len());
        let mut total = 0usize;
        for &count in mesh_vertex_counts {
            mesh_base.push(total);
            total += count;
        }
        Self {
            vertices: vec![VertexBoneData::default(); total],
            mesh_base,
        }
    }

    /// 网格局部顶点索引 -> 全局索引
    pub fn global_index(&self, mesh_index: usize, local_vertex: usize) -> Result<usize, LoadError> {
        let base = self.mesh_base.get(mesh_index).ok_or(LoadError::MeshIndexOutOfRange {
            mesh: mesh_index,
            count: self.mesh_base.len(),
        })?;
        let global = base + local_vertex;
        if global >= self.vertices.len() {
            return Err(LoadError::VertexIndexOutOfRange {
                vertex: global,
                total: self.vertices.len(),
            });
        }
        Ok(global)
    }

    /// 为网格顶点添加骨骼权重
    pub fn add_bone_data(
        &mut self,
        mesh_index: usize,
        local_vertex: usize,
        bone_id: u32,
        weight: f32,
    ) -> Result<(), LoadError> {
        let global = self.global_index(mesh_index, local_vertex)?;
        if !self.vertices[global].add_bone_data(bone_id, weight) {
            return Err(LoadError::TooManyBoneInfluences {
                vertex: global,
                max: MAX_BONES_PER_VERTEX,
            });
        }
        Ok(())
    }

    pub fn vertex(&self, global_index: usize) -> Option<&VertexBoneData> {
        self.vertices.get(global_index)
    }

    /// 指定网格的顶点槽切片
    pub fn mesh_vertices(&self, mesh_index: usize) -> &[VertexBoneData] {
        let Some(&start) = self.mesh_base.get(mesh_index) else {
            return &[];
        };
        let end = self
            .mesh_base
            .get(mesh_index + 1)
            .copied()
            .unwrap_or(self.vertices.len());
        &self.vertices[start..end]
    }

    pub fn mesh_base(&self, mesh_index: usize) -> Option<usize> {
        self.mesh_base.get(mesh_index).copied()
    }

    pub fn total_vertices(&self) -> usize {
        self.vertices.len()
    }
}
