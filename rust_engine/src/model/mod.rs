//! 蒙皮模型运行时管理

mod loader;
mod runtime;

pub use loader::{bind_bones, load_model};
pub use runtime::SkinnedModel;

use glam::Vec3;

use crate::skinning::VertexBoneData;

/// 运行时顶点数据（上传到渲染端的顶点格式）
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SkinnedVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub bone_data: VertexBoneData,
}
