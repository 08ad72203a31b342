//! 场景数据（外部导入器产出的内存形式）

mod graph;
mod gltf_import;

pub use graph::{Ancestors, Node, SceneGraph};
pub use gltf_import::{import_gltf, SYNTHETIC_ROOT_NAME};
#[cfg(test)]
pub(crate) use gltf_import::write_test_model;

use glam::{Mat4, Vec3};

use crate::animation::AnimationClip;

/// 单个顶点受某骨骼影响的权重（顶点索引为网格内局部索引）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexWeight {
    pub vertex_id: u32,
    pub weight: f32,
}

/// 网格中的骨骼
#[derive(Clone, Debug)]
pub struct MeshBone {
    pub name: String,
    /// 绑定姿态偏移矩阵（网格空间 -> 骨骼空间）
    pub offset: Mat4,
    pub weights: Vec<VertexWeight>,
}

/// 网格数据
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub bones: Vec<MeshBone>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn has_bones(&self) -> bool {
        !self.bones.is_empty()
    }
}

/// 完整场景
#[derive(Clone, Debug)]
pub struct Scene {
    pub graph: SceneGraph,
    pub meshes: Vec<MeshData>,
    pub animations: Vec<AnimationClip>,
}

impl Scene {
    pub fn new(graph: SceneGraph) -> Self {
        Self {
            graph,
            meshes: Vec::new(),
            animations: Vec::new(),
        }
    }
}
