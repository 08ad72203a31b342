//! 骨骼

use glam::Mat4;

/// 骨骼
///
/// 只保存加载期确定的常量数据；每帧的最终变换写入调用方提供的输出缓冲区。
#[derive(Clone, Debug)]
pub struct Bone {
    pub id: usize,
    pub name: String,
    /// 绑定姿态偏移矩阵
    pub offset_matrix: Mat4,
}

impl Bone {
    pub fn new(id: usize, name: impl Into<String>, offset_matrix: Mat4) -> Self {
        Self {
            id,
            name: name.into(),
            offset_matrix,
        }
    }

    /// 蒙皮矩阵 = 全局逆变换 * 节点全局变换 * 偏移矩阵
    pub fn skinning_matrix(&self, global_inverse: &Mat4, node_global: &Mat4) -> Mat4 {
        *global_inverse * *node_global * self.offset_matrix
    }
}
