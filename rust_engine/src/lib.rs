//! Skin Engine - Rust 实现的骨骼动画运行时
//!
//! 提供：
//! - 场景图（节点竞技场）与 glTF 导入
//! - 骨骼注册表与顶点骨骼权重绑定
//! - 关键帧插值（缩放/旋转/平移）
//! - 单动画与双动画混合的层级求值
//! - 蒙皮矩阵输出与 CPU 参考蒙皮

pub mod animation;
pub mod config;
pub mod model;
pub mod scene;
pub mod skeleton;
pub mod skinning;

pub use animation::{AnimationClip, HierarchyEvaluator, NodeChannel, PlaybackState};
pub use config::EngineConfig;
pub use model::{load_model, SkinnedModel, SkinnedVertex};
pub use scene::{import_gltf, MeshBone, MeshData, Node, Scene, SceneGraph, VertexWeight};
pub use skeleton::{Bone, BoneRegistry, RequiredNodeSet};
pub use skinning::{compute_skinning, VertexBoneBinding, VertexBoneData, MAX_BONES_PER_VERTEX};

use thiserror::Error;

/// 加载期错误（模型构建失败，不可恢复）
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File path not set")]
    MissingFilePath,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Import error: {0}")]
    Import(#[from] gltf::Error),

    #[error("File contains no scene")]
    NoScene,

    #[error("Scene contains no mesh")]
    NoMesh,

    #[error("Vertex {vertex} already holds {max} bone weights")]
    TooManyBoneInfluences { vertex: usize, max: usize },

    #[error("Global vertex index {vertex} out of range (total {total})")]
    VertexIndexOutOfRange { vertex: usize, total: usize },

    #[error("Mesh index {mesh} out of range (count {count})")]
    MeshIndexOutOfRange { mesh: usize, count: usize },

    #[error("Bone '{0}' not found in node hierarchy")]
    BoneNotInHierarchy(String),

    #[error("Bone id {bone} out of range (count {count})")]
    BoneIdOutOfRange { bone: usize, count: usize },
}

/// 求值期错误（调用方错误或动画数据不一致）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    #[error("Animation index {index} out of range (count {count})")]
    ClipIndexOutOfRange { index: usize, count: usize },

    #[error("Blend factor {0} outside [0, 1]")]
    BlendFactorOutOfRange(f32),

    #[error("Node '{node}' has a channel in animation {present_in} but not in animation {missing_in}")]
    ChannelMismatch {
        node: String,
        present_in: usize,
        missing_in: usize,
    },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Animation error: {0}")]
    Animation(#[from] AnimationError),
}

impl EngineError {
    /// 是否为加载期错误
    pub fn is_load_error(&self) -> bool {
        matches!(self, EngineError::Load(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
