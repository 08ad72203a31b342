//! glTF 导入
//!
//! 将 glTF 文档转换为内存场景：节点树、网格（每个图元一个）、骨骼权重和动画片段。
//! 关键帧时间从秒换算为 tick（见 `EngineConfig::import_ticks_per_second`）。

use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::animation::Interpolation;

use super::{MeshBone, MeshData, Scene, SceneGraph, VertexWeight};
use crate::animation::{AnimationClip, NodeChannel, QuatKey, VectorKey};
use crate::config::get_config;
use crate::skeleton::BoneTransform;
use crate::LoadError;

/// 场景有多个根节点时合成的根节点名
pub const SYNTHETIC_ROOT_NAME: &str = "RootNode";

/// JOINTS_n / WEIGHTS_n 组数，每组 4 个影响
const WEIGHT_SETS: u32 = 2;

type WeightSet = Vec<([u16; 4], [f32; 4])>;

/// 导入 glTF / glb 文件
pub fn import_gltf(path: impl AsRef<Path>) -> Result<Scene, LoadError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(LoadError::MissingFilePath);
    }
    log::info!("导入 glTF: {}", path.display());

    let (document, buffers, _images) = gltf::import(path)?;
    let gltf_scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(LoadError::NoScene)?;

    let mut scene = Scene::new(build_graph(&gltf_scene));
    scene.meshes = read_meshes(&document, &buffers)?;
    scene.animations = read_animations(&document, &buffers);

    log::info!(
        "glTF 导入完成: {} 个节点, {} 个网格, {} 个动画",
        scene.graph.len(),
        scene.meshes.len(),
        scene.animations.len()
    );
    if get_config().debug_log {
        for (index, depth) in scene.graph.iter_depth_first() {
            log::debug!("{}{}", "  ".repeat(depth), scene.graph.nodes()[index].name);
        }
    }

    Ok(scene)
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

fn node_matrix(node: &gltf::Node) -> Mat4 {
    Mat4::from_cols_array_2d(&node.transform().matrix())
}

fn node_rest_pose(node: &gltf::Node) -> BoneTransform {
    let (translation, rotation, scale) = node.transform().decomposed();
    BoneTransform {
        translation: Vec3::from(translation),
        rotation: Quat::from_array(rotation),
        scale: Vec3::from(scale),
    }
}

fn build_graph(scene: &gltf::Scene) -> SceneGraph {
    let roots: Vec<gltf::Node> = scene.nodes().collect();
    match roots.as_slice() {
        [root] => {
            let mut graph = SceneGraph::new(node_name(root), node_matrix(root));
            add_children(&mut graph, SceneGraph::ROOT, root);
            graph
        }
        _ => {
            let mut graph = SceneGraph::new(SYNTHETIC_ROOT_NAME, Mat4::IDENTITY);
            for root in &roots {
                add_subtree(&mut graph, SceneGraph::ROOT, root);
            }
            graph
        }
    }
}

fn add_subtree(graph: &mut SceneGraph, parent: usize, node: &gltf::Node) {
    if let Some(index) = graph.add_child(parent, node_name(node), node_matrix(node)) {
        add_children(graph, index, node);
    }
}

fn add_children(graph: &mut SceneGraph, index: usize, node: &gltf::Node) {
    for child in node.children() {
        add_subtree(graph, index, &child);
    }
}

/// 网格索引 -> 实例化它的第一个带蒙皮节点的蒙皮
fn mesh_skins<'a>(document: &'a gltf::Document) -> Vec<Option<gltf::Skin<'a>>> {
    let mut skins = vec![None; document.meshes().len()];
    for node in document.nodes() {
        if let (Some(mesh), Some(skin)) = (node.mesh(), node.skin()) {
            if let Some(slot) = skins.get_mut(mesh.index()) {
                if slot.is_none() {
                    *slot = Some(skin);
                }
            }
        }
    }
    skins
}

fn read_meshes(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<Vec<MeshData>, LoadError> {
    let skins = mesh_skins(document);
    let mut meshes = Vec::new();

    for mesh in document.meshes() {
        let base_name = mesh
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        let primitive_count = mesh.primitives().len();
        let skin = skins.get(mesh.index()).and_then(Option::as_ref);

        for primitive in mesh.primitives() {
            let name = if primitive_count > 1 {
                format!("{}_{}", base_name, primitive.index())
            } else {
                base_name.clone()
            };
            let data = read_primitive(name, &primitive, skin, buffers)?;
            log::debug!(
                "网格 '{}': {} 顶点, {} 索引, {} 骨骼",
                data.name,
                data.vertex_count(),
                data.indices.len(),
                data.bones.len()
            );
            meshes.push(data);
        }
    }

    Ok(meshes)
}

fn read_primitive(
    name: String,
    primitive: &gltf::Primitive,
    skin: Option<&gltf::Skin>,
    buffers: &[gltf::buffer::Data],
) -> Result<MeshData, LoadError> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<Vec3> = reader
        .read_positions()
        .map(|iter| iter.map(Vec3::from).collect())
        .unwrap_or_default();
    let normals: Vec<Vec3> = reader
        .read_normals()
        .map(|iter| iter.map(Vec3::from).collect())
        .unwrap_or_else(|| vec![Vec3::ZERO; positions.len()]);
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    let bones = match skin {
        Some(skin) => {
            let mut weight_sets: Vec<WeightSet> = Vec::new();
            for set in 0..WEIGHT_SETS {
                if let (Some(joints), Some(weights)) = (reader.read_joints(set), reader.read_weights(set)) {
                    weight_sets.push(joints.into_u16().zip(weights.into_f32()).collect());
                }
            }
            read_bones(skin, &weight_sets, buffers)?
        }
        None => Vec::new(),
    };

    Ok(MeshData {
        name,
        positions,
        normals,
        indices,
        bones,
    })
}

/// 蒙皮关节 -> 网格骨骼，偏移矩阵取逆绑定矩阵
fn read_bones(
    skin: &gltf::Skin,
    weight_sets: &[WeightSet],
    buffers: &[gltf::buffer::Data],
) -> Result<Vec<MeshBone>, LoadError> {
    let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
    let inverse_binds: Vec<Mat4> = reader
        .read_inverse_bind_matrices()
        .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
        .unwrap_or_default();

    let mut bones: Vec<MeshBone> = skin
        .joints()
        .enumerate()
        .map(|(i, joint)| MeshBone {
            name: node_name(&joint),
            offset: inverse_binds.get(i).copied().unwrap_or(Mat4::IDENTITY),
            weights: Vec::new(),
        })
        .collect();

    for set in weight_sets {
        for (vertex, (joints, weights)) in set.iter().enumerate() {
            for (&joint, &weight) in joints.iter().zip(weights.iter()) {
                if weight == 0.0 {
                    continue;
                }
                let count = bones.len();
                let bone = bones
                    .get_mut(joint as usize)
                    .ok_or(LoadError::BoneIdOutOfRange {
                        bone: joint as usize,
                        count,
                    })?;
                bone.weights.push(VertexWeight {
                    vertex_id: vertex as u32,
                    weight,
                });
            }
        }
    }

    Ok(bones)
}

/// 单个目标节点上正在收集的轨道
struct TrackBuilder {
    node_index: usize,
    channel: NodeChannel,
    rest: BoneTransform,
}

fn track_for<'t>(tracks: &'t mut Vec<TrackBuilder>, node: &gltf::Node) -> &'t mut TrackBuilder {
    let position = match tracks.iter().position(|t| t.node_index == node.index()) {
        Some(position) => position,
        None => {
            tracks.push(TrackBuilder {
                node_index: node.index(),
                channel: NodeChannel::new(node_name(node)),
                rest: node_rest_pose(node),
            });
            tracks.len() - 1
        }
    };
    &mut tracks[position]
}

/// CUBICSPLINE 输出为 (入切线, 值, 出切线) 三元组，只保留值
fn key_values<T>(values: Vec<T>, interpolation: Interpolation) -> Vec<T> {
    match interpolation {
        Interpolation::CubicSpline => values.into_iter().skip(1).step_by(3).collect(),
        _ => values,
    }
}

fn vector_keys(times: &[f32], values: Vec<Vec3>) -> Vec<VectorKey> {
    times
        .iter()
        .zip(values)
        .map(|(&time, value)| VectorKey::new(time, value))
        .collect()
}

fn read_animations(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<AnimationClip> {
    let ticks_per_second = get_config().import_ticks_per_second;
    document
        .animations()
        .map(|animation| read_animation(&animation, buffers, ticks_per_second))
        .collect()
}

fn read_animation(
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
    ticks_per_second: f32,
) -> AnimationClip {
    let name = animation
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("animation_{}", animation.index()));
    let mut tracks: Vec<TrackBuilder> = Vec::new();

    for channel in animation.channels() {
        let node = channel.target().node();
        let interpolation = channel.sampler().interpolation();
        match interpolation {
            Interpolation::Step => {
                log::warn!("动画 '{}' 节点 '{}': STEP 插值按线性处理", name, node_name(&node));
            }
            Interpolation::CubicSpline => {
                log::warn!("动画 '{}' 节点 '{}': CUBICSPLINE 切线被忽略", name, node_name(&node));
            }
            Interpolation::Linear => {}
        }

        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(inputs) = reader.read_inputs() else {
            log::warn!("动画 '{}' 节点 '{}': 缺少关键帧时间", name, node_name(&node));
            continue;
        };
        let times: Vec<f32> = inputs.map(|t| t * ticks_per_second).collect();

        match reader.read_outputs() {
            Some(ReadOutputs::Translations(values)) => {
                let values = key_values(values.map(Vec3::from).collect(), interpolation);
                track_for(&mut tracks, &node).channel.position_keys = vector_keys(&times, values);
            }
            Some(ReadOutputs::Rotations(values)) => {
                let values = key_values(values.into_f32().map(Quat::from_array).collect(), interpolation);
                track_for(&mut tracks, &node).channel.rotation_keys = times
                    .iter()
                    .zip(values)
                    .map(|(&time, value)| QuatKey::new(time, value))
                    .collect();
            }
            Some(ReadOutputs::Scales(values)) => {
                let values = key_values(values.map(Vec3::from).collect(), interpolation);
                track_for(&mut tracks, &node).channel.scaling_keys = vector_keys(&times, values);
            }
            Some(ReadOutputs::MorphTargetWeights(_)) => {
                log::debug!("动画 '{}': 跳过变形权重轨道", name);
            }
            None => {
                log::warn!("动画 '{}' 节点 '{}': 缺少关键帧数据", name, node_name(&node));
            }
        }
    }

    let channels: Vec<NodeChannel> = tracks
        .into_iter()
        .map(|track| {
            let TrackBuilder { mut channel, rest, .. } = track;
            // 缺少的分量用节点静态姿态补一个关键帧
            if channel.position_keys.is_empty() {
                channel.position_keys.push(VectorKey::new(0.0, rest.translation));
            }
            if channel.rotation_keys.is_empty() {
                channel.rotation_keys.push(QuatKey::new(0.0, rest.rotation));
            }
            if channel.scaling_keys.is_empty() {
                channel.scaling_keys.push(VectorKey::new(0.0, rest.scale));
            }
            channel
        })
        .collect();

    let duration = channels
        .iter()
        .map(NodeChannel::last_key_time)
        .fold(0.0f32, f32::max);

    log::info!("动画 '{}': {} 条轨道, 时长 {} tick", name, channels.len(), duration);

    AnimationClip {
        name,
        ticks_per_second,
        duration,
        channels,
    }
}

/// 测试用的最小蒙皮模型：Armature -> Hip -> Spine，Body 网格绑定 Hip/Spine，
/// 动画 "Bend" 在 1 秒内旋转 Hip（两个关键帧均为单位旋转）
#[cfg(test)]
pub(crate) fn write_test_model(dir: &Path) -> std::path::PathBuf {
    fn push_f32s(buf: &mut Vec<u8>, values: &[f32]) {
        for v in values {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }

    let mut bin = Vec::new();
    // 0..36 位置
    push_f32s(&mut bin, &[0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0]);
    // 36..48 关节
    bin.extend_from_slice(&[0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0]);
    // 48..96 权重
    push_f32s(&mut bin, &[1.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
    // 96..224 逆绑定矩阵
    push_f32s(&mut bin, &Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)).to_cols_array());
    push_f32s(&mut bin, &Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0)).to_cols_array());
    // 224..232 时间
    push_f32s(&mut bin, &[0.0, 1.0]);
    // 232..264 旋转
    push_f32s(&mut bin, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    assert_eq!(bin.len(), 264);

    let json = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [
    { "name": "Armature", "children": [1, 3] },
    { "name": "Hip", "translation": [0.0, 1.0, 0.0], "children": [2] },
    { "name": "Spine", "translation": [0.0, 1.0, 0.0] },
    { "name": "Body", "mesh": 0, "skin": 0 }
  ],
  "meshes": [{
    "name": "Body",
    "primitives": [{ "attributes": { "POSITION": 0, "JOINTS_0": 1, "WEIGHTS_0": 2 } }]
  }],
  "skins": [{ "joints": [1, 2], "inverseBindMatrices": 3 }],
  "animations": [{
    "name": "Bend",
    "channels": [{ "sampler": 0, "target": { "node": 1, "path": "rotation" } }],
    "samplers": [{ "input": 4, "output": 5, "interpolation": "LINEAR" }]
  }],
  "buffers": [{ "uri": "model.bin", "byteLength": 264 }],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 12 },
    { "buffer": 0, "byteOffset": 48, "byteLength": 48 },
    { "buffer": 0, "byteOffset": 96, "byteLength": 128 },
    { "buffer": 0, "byteOffset": 224, "byteLength": 8 },
    { "buffer": 0, "byteOffset": 232, "byteLength": 32 }
  ],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [0.0, 2.0, 0.0] },
    { "bufferView": 1, "componentType": 5121, "count": 3, "type": "VEC4" },
    { "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC4" },
    { "bufferView": 3, "componentType": 5126, "count": 2, "type": "MAT4" },
    { "bufferView": 4, "componentType": 5126, "count": 2, "type": "SCALAR",
      "min": [0.0], "max": [1.0] },
    { "bufferView": 5, "componentType": 5126, "count": 2, "type": "VEC4" }
  ]
}"#;

    std::fs::write(dir.join("model.bin"), &bin).unwrap();
    let path = dir.join("model.gltf");
    std::fs::write(&path, json).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_is_rejected() {
        assert!(matches!(import_gltf(""), Err(LoadError::MissingFilePath)));
    }

    #[test]
    fn test_missing_file_is_an_import_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_gltf(dir.path().join("absent.gltf")).unwrap_err();
        assert!(matches!(err, LoadError::Import(_)));
    }

    #[test]
    fn test_import_hierarchy() {
        let dir = tempfile::tempdir().unwrap();
        let scene = import_gltf(write_test_model(dir.path())).unwrap();

        let graph = &scene.graph;
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.root().name, "Armature");
        let hip = graph.find_by_name("Hip").unwrap();
        let spine = graph.find_by_name("Spine").unwrap();
        assert_eq!(graph.nodes()[spine].parent, Some(hip));
        assert!(graph.nodes()[hip]
            .transform
            .abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)), 1e-6));
    }

    #[test]
    fn test_import_mesh_and_weights() {
        let dir = tempfile::tempdir().unwrap();
        let scene = import_gltf(write_test_model(dir.path())).unwrap();

        assert_eq!(scene.meshes.len(), 1);
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.normals, vec![Vec3::ZERO; 3]);
        assert_eq!(mesh.indices, vec![0, 1, 2]);

        assert_eq!(mesh.bones.len(), 2);
        let hip = &mesh.bones[0];
        assert_eq!(hip.name, "Hip");
        assert_eq!(hip.offset, Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)));
        assert_eq!(
            hip.weights,
            vec![
                VertexWeight { vertex_id: 0, weight: 1.0 },
                VertexWeight { vertex_id: 1, weight: 0.5 },
            ]
        );
        let spine = &mesh.bones[1];
        assert_eq!(spine.name, "Spine");
        assert_eq!(
            spine.weights,
            vec![
                VertexWeight { vertex_id: 1, weight: 0.5 },
                VertexWeight { vertex_id: 2, weight: 1.0 },
            ]
        );
    }

    #[test]
    fn test_import_animation_in_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let scene = import_gltf(write_test_model(dir.path())).unwrap();

        assert_eq!(scene.animations.len(), 1);
        let clip = &scene.animations[0];
        assert_eq!(clip.name, "Bend");
        assert_eq!(clip.ticks_per_second, 1000.0);
        assert_eq!(clip.duration, 1000.0);
        assert_eq!(clip.channels.len(), 1);

        let channel = &clip.channels[0];
        assert_eq!(channel.node_name, "Hip");
        assert_eq!(channel.rotation_keys.len(), 2);
        assert_eq!(channel.rotation_keys[1].time, 1000.0);
        // 未动画的分量取节点静态值
        assert_eq!(channel.position_keys, vec![VectorKey::new(0.0, Vec3::new(0.0, 1.0, 0.0))]);
        assert_eq!(channel.scaling_keys, vec![VectorKey::new(0.0, Vec3::ONE)]);
    }

    #[test]
    fn test_cubic_spline_keeps_values() {
        let values = vec![1, 2, 3, 4, 5, 6];
        assert_eq!(key_values(values.clone(), Interpolation::CubicSpline), vec![2, 5]);
        assert_eq!(key_values(values.clone(), Interpolation::Linear), values);
    }
}
