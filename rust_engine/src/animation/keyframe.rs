//! 动画关键帧

use glam::{Quat, Vec3};

/// 向量关键帧（缩放或平移）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VectorKey {
    /// 时间（tick）
    pub time: f32,
    pub value: Vec3,
}

impl VectorKey {
    pub fn new(time: f32, value: Vec3) -> Self {
        Self { time, value }
    }
}

/// 旋转关键帧
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuatKey {
    /// 时间（tick）
    pub time: f32,
    pub value: Quat,
}

impl QuatKey {
    pub fn new(time: f32, value: Quat) -> Self {
        Self { time, value }
    }
}

/// 带时间戳的关键帧
pub trait Keyframe {
    fn time(&self) -> f32;
}

impl Keyframe for VectorKey {
    fn time(&self) -> f32 {
        self.time
    }
}

impl Keyframe for QuatKey {
    fn time(&self) -> f32 {
        self.time
    }
}
