//! 层级求值器
//!
//! 从根节点向下组合父子变换，在有动画轨道的节点上使用插值结果，
//! 并为每根骨骼写出蒙皮矩阵：全局逆变换 * 节点全局变换 * 偏移矩阵。
//!
//! 名称到索引的解析在构建时一次完成，每帧不做字符串查找。

use glam::Mat4;

use super::clip::AnimationClip;
use crate::scene::SceneGraph;
use crate::skeleton::{BoneRegistry, RequiredNodeSet};
use crate::{AnimationError, LoadError};

/// 双动画混合的单帧参数
struct BlendFrame {
    clip_a: usize,
    clip_b: usize,
    ticks_a: f32,
    ticks_b: f32,
    factor: f32,
}

/// 层级求值器
///
/// 构建后只读；求值结果写入调用方提供的缓冲区，多个线程可以共享同一个求值器。
#[derive(Clone, Debug)]
pub struct HierarchyEvaluator {
    graph: SceneGraph,
    clips: Vec<AnimationClip>,
    bones: BoneRegistry,
    required: RequiredNodeSet,
    /// 节点索引 -> 骨骼 ID
    node_bones: Vec<Option<usize>>,
    /// 片段索引 -> 节点索引 -> 轨道索引
    clip_channels: Vec<Vec<Option<usize>>>,
    /// 根节点静态变换的逆
    global_inverse: Mat4,
}

impl HierarchyEvaluator {
    /// 构建求值器
    ///
    /// 每根骨骼都必须在节点树中存在同名节点，否则返回 `BoneNotInHierarchy`。
    pub fn new(
        graph: SceneGraph,
        clips: Vec<AnimationClip>,
        bones: BoneRegistry,
    ) -> Result<Self, LoadError> {
        let mut required = RequiredNodeSet::new(&graph);
        for bone in bones.iter() {
            required.mark_path(&graph, &bone.name)?;
        }

        let node_bones = graph.nodes().iter().map(|node| bones.find(&node.name)).collect();

        let clip_channels = clips
            .iter()
            .map(|clip| {
                graph
                    .nodes()
                    .iter()
                    .map(|node| clip.find_channel(&node.name))
                    .collect()
            })
            .collect();

        let global_inverse = graph.root().transform.inverse();

        log::debug!(
            "层级求值器: {} 个节点, {} 个必需节点, {} 根骨骼, {} 个动画",
            graph.len(),
            required.required_count(),
            bones.len(),
            clips.len()
        );

        Ok(Self {
            graph,
            clips,
            bones,
            required,
            node_bones,
            clip_channels,
            global_inverse,
        })
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn bones(&self) -> &BoneRegistry {
        &self.bones
    }

    pub fn required_nodes(&self) -> &RequiredNodeSet {
        &self.required
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn global_inverse(&self) -> Mat4 {
        self.global_inverse
    }

    /// 节点对应的骨骼 ID
    pub fn bone_for_node(&self, node: usize) -> Option<usize> {
        self.node_bones.get(node).copied().flatten()
    }

    fn clip(&self, index: usize) -> Result<&AnimationClip, AnimationError> {
        self.clips.get(index).ok_or(AnimationError::ClipIndexOutOfRange {
            index,
            count: self.clips.len(),
        })
    }

    /// 单动画求值，结果按骨骼 ID 写入 `out`
    ///
    /// 出错时 `out` 保持不变。
    pub fn evaluate(
        &self,
        time_in_seconds: f64,
        clip_index: usize,
        out: &mut Vec<Mat4>,
    ) -> Result<(), AnimationError> {
        let clip = self.clip(clip_index)?;
        let ticks = clip.animation_time_ticks(time_in_seconds);

        out.resize(self.bones.len(), Mat4::ZERO);
        self.read_node_hierarchy(SceneGraph::ROOT, &Mat4::IDENTITY, clip_index, ticks, out);
        Ok(())
    }

    /// 双动画混合求值，只遍历必需节点
    ///
    /// 出错时 `out` 保持不变。
    pub fn evaluate_blended(
        &self,
        time_in_seconds: f64,
        clip_a: usize,
        clip_b: usize,
        blend_factor: f32,
        out: &mut Vec<Mat4>,
    ) -> Result<(), AnimationError> {
        let first = self.clip(clip_a)?;
        let second = self.clip(clip_b)?;
        if !(0.0..=1.0).contains(&blend_factor) {
            return Err(AnimationError::BlendFactorOutOfRange(blend_factor));
        }
        self.check_blend_channels(clip_a, clip_b)?;

        let frame = BlendFrame {
            clip_a,
            clip_b,
            ticks_a: first.animation_time_ticks(time_in_seconds),
            ticks_b: second.animation_time_ticks(time_in_seconds),
            factor: blend_factor,
        };

        out.resize(self.bones.len(), Mat4::ZERO);
        self.read_node_hierarchy_blended(SceneGraph::ROOT, &Mat4::IDENTITY, &frame, out);
        Ok(())
    }

    /// 单动画求值并返回新数组
    pub fn bone_transforms(
        &self,
        time_in_seconds: f64,
        clip_index: usize,
    ) -> Result<Vec<Mat4>, AnimationError> {
        let mut out = Vec::with_capacity(self.bones.len());
        self.evaluate(time_in_seconds, clip_index, &mut out)?;
        Ok(out)
    }

    /// 双动画混合求值并返回新数组
    pub fn bone_transforms_blended(
        &self,
        time_in_seconds: f64,
        clip_a: usize,
        clip_b: usize,
        blend_factor: f32,
    ) -> Result<Vec<Mat4>, AnimationError> {
        let mut out = Vec::with_capacity(self.bones.len());
        self.evaluate_blended(time_in_seconds, clip_a, clip_b, blend_factor, &mut out)?;
        Ok(out)
    }

    /// 混合遍历会经过的节点（根 + 必需节点）上，两个片段必须同时有或同时没有轨道
    fn check_blend_channels(&self, clip_a: usize, clip_b: usize) -> Result<(), AnimationError> {
        let channels_a = &self.clip_channels[clip_a];
        let channels_b = &self.clip_channels[clip_b];

        for (index, node) in self.graph.nodes().iter().enumerate() {
            if index != SceneGraph::ROOT && !self.required.is_required(index) {
                continue;
            }
            let (present_in, missing_in) = match (channels_a[index], channels_b[index]) {
                (Some(_), None) => (clip_a, clip_b),
                (None, Some(_)) => (clip_b, clip_a),
                _ => continue,
            };
            return Err(AnimationError::ChannelMismatch {
                node: node.name.clone(),
                present_in,
                missing_in,
            });
        }
        Ok(())
    }

    fn write_bone(&self, node_index: usize, global: &Mat4, out: &mut [Mat4]) {
        if let Some(bone_id) = self.node_bones[node_index] {
            if let Some(bone) = self.bones.bone(bone_id) {
                out[bone_id] = bone.skinning_matrix(&self.global_inverse, global);
            }
        }
    }

    fn read_node_hierarchy(
        &self,
        node_index: usize,
        parent_transform: &Mat4,
        clip_index: usize,
        ticks: f32,
        out: &mut [Mat4],
    ) {
        let node = &self.graph.nodes()[node_index];

        let local = match self.clip_channels[clip_index][node_index] {
            Some(channel) => self.clips[clip_index].channels[channel].sample(ticks).to_matrix(),
            None => node.transform,
        };

        let global = *parent_transform * local;
        self.write_bone(node_index, &global, out);

        for &child in &node.children {
            self.read_node_hierarchy(child, &global, clip_index, ticks, out);
        }
    }

    fn read_node_hierarchy_blended(
        &self,
        node_index: usize,
        parent_transform: &Mat4,
        frame: &BlendFrame,
        out: &mut [Mat4],
    ) {
        let node = &self.graph.nodes()[node_index];

        let channel_a = self.clip_channels[frame.clip_a][node_index];
        let channel_b = self.clip_channels[frame.clip_b][node_index];
        let local = match (channel_a, channel_b) {
            (Some(a), Some(b)) => {
                let pose_a = self.clips[frame.clip_a].channels[a].sample(frame.ticks_a);
                let pose_b = self.clips[frame.clip_b].channels[b].sample(frame.ticks_b);
                pose_a.blend(&pose_b, frame.factor).to_matrix()
            }
            // 单侧轨道已在 check_blend_channels 中拒绝
            _ => node.transform,
        };

        let global = *parent_transform * local;
        self.write_bone(node_index, &global, out);

        for &child in &node.children {
            if self.required.is_required(child) {
                self.read_node_hierarchy_blended(child, &global, frame, out);
            }
        }
    }
}
