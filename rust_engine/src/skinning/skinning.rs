//! 顶点蒙皮计算

use glam::{Mat4, Vec3};
use rayon::prelude::*;

use super::{SkinningInput, SkinningOutput, VertexBoneData};

/// 计算蒙皮
///
/// 每个顶点按权重累加各骨骼矩阵变换后的位置与法线；没有任何权重的顶点保持原样。
pub fn compute_skinning(input: &SkinningInput) -> SkinningOutput {
    let (positions, normals): (Vec<Vec3>, Vec<Vec3>) = input
        .positions
        .par_iter()
        .enumerate()
        .map(|(i, &position)| {
            let normal = input.normals.get(i).copied().unwrap_or(Vec3::ZERO);
            match input.bone_data.get(i) {
                Some(data) => compute_single_vertex(position, normal, data, input.bone_matrices),
                None => (position, normal),
            }
        })
        .unzip();

    SkinningOutput { positions, normals }
}

/// 计算单个顶点的蒙皮
fn compute_single_vertex(
    position: Vec3,
    normal: Vec3,
    data: &VertexBoneData,
    matrices: &[Mat4],
) -> (Vec3, Vec3) {
    if data.influence_count() == 0 {
        return (position, normal);
    }

    let mut pos = Vec3::ZERO;
    let mut norm = Vec3::ZERO;
    for (bone, weight) in data.influences() {
        let m = get_matrix(matrices, bone);
        pos += m.transform_point3(position) * weight;
        norm += m.transform_vector3(normal) * weight;
    }

    (pos, norm.normalize_or_zero())
}

fn get_matrix(matrices: &[Mat4], index: u32) -> Mat4 {
    matrices.get(index as usize).copied().unwrap_or(Mat4::IDENTITY)
}
