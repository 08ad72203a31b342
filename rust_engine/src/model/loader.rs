//! 模型加载器

use std::path::Path;

use crate::config::get_config;
use crate::scene::{import_gltf, MeshData};
use crate::skeleton::BoneRegistry;
use crate::skinning::VertexBoneBinding;
use crate::{LoadError, Result};

use super::SkinnedModel;

/// 从 glTF 文件加载模型
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<SkinnedModel> {
    let scene = import_gltf(path)?;
    let model = SkinnedModel::from_scene(scene)?;
    Ok(model)
}

/// 为所有网格登记骨骼并写入顶点权重
///
/// 骨骼 ID 按首次出现顺序分配，同名骨骼在多个网格间共享同一个 ID。
pub fn bind_bones(meshes: &[MeshData]) -> std::result::Result<(BoneRegistry, VertexBoneBinding), LoadError> {
    let vertex_counts: Vec<usize> = meshes.iter().map(MeshData::vertex_count).collect();
    let mut registry = BoneRegistry::new();
    let mut binding = VertexBoneBinding::new(&vertex_counts);

    for (mesh_index, mesh) in meshes.iter().enumerate() {
        log::info!(
            "网格 {} '{}': {} 顶点, {} 索引, {} 骨骼",
            mesh_index,
            mesh.name,
            mesh.vertex_count(),
            mesh.indices.len(),
            mesh.bones.len()
        );

        for bone in &mesh.bones {
            let bone_id = registry.get_or_assign_id(&bone.name, bone.offset);
            log::debug!(
                "  骨骼 '{}' (ID {}): 影响 {} 个顶点",
                bone.name,
                bone_id,
                bone.weights.len()
            );
            for weight in &bone.weights {
                binding.add_bone_data(mesh_index, weight.vertex_id as usize, bone_id as u32, weight.weight)?;
            }
        }
    }

    log::info!(
        "骨骼绑定完成: {} 根骨骼, {} 个顶点",
        registry.len(),
        binding.total_vertices()
    );
    if get_config().debug_log {
        for bone in registry.iter() {
            log::debug!("骨骼 {} '{}' 偏移矩阵: {:?}", bone.id, bone.name, bone.offset_matrix);
        }
    }

    Ok((registry, binding))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MeshBone, VertexWeight};
    use glam::{Mat4, Vec3};

    fn mesh(name: &str, vertices: usize, bones: Vec<MeshBone>) -> MeshData {
        MeshData {
            name: name.to_string(),
            positions: vec![Vec3::ZERO; vertices],
            bones,
            ..Default::default()
        }
    }

    fn bone(name: &str, offset: Mat4, weights: &[(u32, f32)]) -> MeshBone {
        MeshBone {
            name: name.to_string(),
            offset,
            weights: weights
                .iter()
                .map(|&(vertex_id, weight)| VertexWeight { vertex_id, weight })
                .collect(),
        }
    }

    #[test]
    fn test_shared_bone_across_meshes() {
        let first_offset = Mat4::from_translation(Vec3::X);
        let meshes = vec![
            mesh("body", 3, vec![bone("hip", first_offset, &[(0, 1.0), (2, 0.5)])]),
            mesh(
                "legs",
                2,
                vec![
                    bone("knee", Mat4::IDENTITY, &[(0, 1.0)]),
                    bone("hip", Mat4::from_translation(Vec3::Y), &[(1, 1.0)]),
                ],
            ),
        ];

        let (registry, binding) = bind_bones(&meshes).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.find("hip"), Some(0));
        assert_eq!(registry.find("knee"), Some(1));
        assert_eq!(registry.bone(0).unwrap().offset_matrix, first_offset);

        assert_eq!(binding.total_vertices(), 5);
        // legs 的局部顶点 1 -> 全局顶点 4
        assert_eq!(binding.vertex(4).unwrap().bone_ids[0], 0);
        assert_eq!(binding.vertex(3).unwrap().bone_ids[0], 1);
        assert_eq!(binding.vertex(2).unwrap().weights[0], 0.5);
    }

    #[test]
    fn test_too_many_influences_fails() {
        let bones = (0..9)
            .map(|i| bone(&format!("b{i}"), Mat4::IDENTITY, &[(0, 0.1)]))
            .collect();
        let err = bind_bones(&[mesh("m", 1, bones)]).unwrap_err();
        assert!(matches!(err, LoadError::TooManyBoneInfluences { vertex: 0, max: 8 }));
    }

    #[test]
    fn test_weight_outside_mesh_fails() {
        let meshes = vec![
            mesh("a", 2, Vec::new()),
            mesh("b", 2, vec![bone("x", Mat4::IDENTITY, &[(2, 1.0)])]),
        ];
        let err = bind_bones(&meshes).unwrap_err();
        assert!(matches!(err, LoadError::VertexIndexOutOfRange { vertex: 4, total: 4 }));
    }
}
