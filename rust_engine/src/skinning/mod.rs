//! 顶点骨骼绑定与 CPU 蒙皮

mod skinning;
mod vertex_bone;

pub use skinning::compute_skinning;
pub use vertex_bone::{VertexBoneBinding, VertexBoneData, MAX_BONES_PER_VERTEX};

use glam::{Mat4, Vec3};

/// 蒙皮输入数据
pub struct SkinningInput<'a> {
    /// 原始顶点位置
    pub positions: &'a [Vec3],
    /// 原始顶点法线
    pub normals: &'a [Vec3],
    /// 顶点骨骼权重槽
    pub bone_data: &'a [VertexBoneData],
    /// 蒙皮矩阵（按骨骼 ID 索引）
    pub bone_matrices: &'a [Mat4],
}

/// 蒙皮输出数据
pub struct SkinningOutput {
    /// 变换后的顶点位置
    pub positions: Vec<Vec3>,
    /// 变换后的顶点法线
    pub normals: Vec<Vec3>,
}
