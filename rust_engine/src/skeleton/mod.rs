//! 骨骼系统：骨骼注册表与必需节点集合

mod bone;
mod registry;
mod required;

pub use bone::Bone;
pub use registry::BoneRegistry;
pub use required::RequiredNodeSet;

use glam::{Mat4, Quat, Vec3};

/// 骨骼本地变换数据
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl BoneTransform {
    /// 从矩阵分解
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// 组合为 T * R * S
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// 与另一变换混合：缩放/平移线性插值，旋转球面插值
    pub fn blend(&self, other: &BoneTransform, factor: f32) -> BoneTransform {
        BoneTransform {
            translation: self.translation.lerp(other.translation, factor),
            rotation: self.rotation.slerp(other.rotation, factor).normalize(),
            scale: self.scale.lerp(other.scale, factor),
        }
    }
}
