//! 蒙皮模型运行时

use glam::{Mat4, Vec3};
use rayon::prelude::*;

use crate::animation::{HierarchyEvaluator, PlaybackState};
use crate::scene::Scene;
use crate::skinning::{compute_skinning, SkinningInput, SkinningOutput, VertexBoneBinding};
use crate::{AnimationError, LoadError};

use super::{bind_bones, SkinnedVertex};

/// 蒙皮模型
///
/// 持有第一个网格的几何、全部网格的顶点骨骼绑定和层级求值器。
/// 每次更新把蒙皮矩阵写入模型自己的缓冲区。
pub struct SkinnedModel {
    // 静态数据
    pub name: String,
    pub vertices: Vec<SkinnedVertex>,
    pub indices: Vec<u32>,
    binding: VertexBoneBinding,
    evaluator: HierarchyEvaluator,

    // 播放控制
    pub playback: PlaybackState,

    // 运行时数据
    skinning_matrices: Vec<Mat4>,
    /// 渲染端上传用的平铺缓冲区（每根骨骼 16 个 f32，列主序）
    skinning_matrices_raw: Vec<f32>,
}

impl SkinnedModel {
    /// 从导入的场景构建模型
    pub fn from_scene(scene: Scene) -> Result<Self, LoadError> {
        let Scene {
            graph,
            meshes,
            animations,
        } = scene;
        if meshes.is_empty() {
            return Err(LoadError::NoMesh);
        }

        let (registry, binding) = bind_bones(&meshes)?;
        let evaluator = HierarchyEvaluator::new(graph, animations, registry)?;

        let first = &meshes[0];
        let vertices: Vec<SkinnedVertex> = first
            .positions
            .iter()
            .zip(binding.mesh_vertices(0))
            .enumerate()
            .map(|(i, (&position, &bone_data))| SkinnedVertex {
                position,
                normal: first.normals.get(i).copied().unwrap_or(Vec3::ZERO),
                bone_data,
            })
            .collect();

        let bone_count = evaluator.bone_count();
        let model = Self {
            name: first.name.clone(),
            vertices,
            indices: first.indices.clone(),
            binding,
            playback: PlaybackState::new(evaluator.clip_count()),
            evaluator,
            skinning_matrices: vec![Mat4::IDENTITY; bone_count],
            skinning_matrices_raw: vec![0.0; bone_count * 16],
        };

        log::info!(
            "模型 '{}' 加载完成: {} 个网格, {} 顶点, {} 骨骼, 动画: {:?}",
            model.name,
            meshes.len(),
            model.vertices.len(),
            bone_count,
            model.animation_names()
        );
        Ok(model)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn bone_count(&self) -> usize {
        self.evaluator.bone_count()
    }

    pub fn evaluator(&self) -> &HierarchyEvaluator {
        &self.evaluator
    }

    /// 全部网格的顶点骨骼绑定
    pub fn binding(&self) -> &VertexBoneBinding {
        &self.binding
    }

    pub fn animation_names(&self) -> Vec<&str> {
        self.evaluator.clips().iter().map(|c| c.name.as_str()).collect()
    }

    /// 切换到下一个动画
    pub fn select_next_animation(&mut self) -> usize {
        let index = self.playback.select_next_clip();
        if let Some(clip) = self.evaluator.clips().get(index) {
            log::info!("切换动画: {} '{}'", index, clip.name);
        }
        index
    }

    /// 用当前动画求值蒙皮矩阵
    pub fn update(&mut self, time_in_seconds: f64) -> Result<(), AnimationError> {
        self.evaluator
            .evaluate(time_in_seconds, self.playback.active_clip, &mut self.skinning_matrices)?;
        self.sync_raw_matrices();
        Ok(())
    }

    /// 当前动画与 `clip_b` 混合求值
    pub fn update_blended(
        &mut self,
        time_in_seconds: f64,
        clip_b: usize,
        blend_factor: f32,
    ) -> Result<(), AnimationError> {
        self.evaluator.evaluate_blended(
            time_in_seconds,
            self.playback.active_clip,
            clip_b,
            blend_factor,
            &mut self.skinning_matrices,
        )?;
        self.sync_raw_matrices();
        Ok(())
    }

    /// 按播放状态中的第二动画和混合系数求值
    pub fn update_playback(&mut self, time_in_seconds: f64) -> Result<(), AnimationError> {
        let clip_b = self.playback.secondary_clip;
        let factor = self.playback.blend_factor;
        self.update_blended(time_in_seconds, clip_b, factor)
    }

    /// 当前动画在指定时间的蒙皮矩阵（新数组，不影响模型缓冲区）
    pub fn bone_transforms(&self, time_in_seconds: f64) -> Result<Vec<Mat4>, AnimationError> {
        self.evaluator
            .bone_transforms(time_in_seconds, self.playback.active_clip)
    }

    /// 最近一次更新的蒙皮矩阵，按骨骼 ID 索引
    pub fn skinning_matrices(&self) -> &[Mat4] {
        &self.skinning_matrices
    }

    pub fn skinning_matrices_raw(&self) -> &[f32] {
        &self.skinning_matrices_raw
    }

    /// 获取平铺矩阵数据指针
    pub fn skinning_matrices_ptr(&self) -> *const f32 {
        self.skinning_matrices_raw.as_ptr()
    }

    /// 用最近一次的蒙皮矩阵在 CPU 上变换第一个网格的顶点
    pub fn skin_vertices(&self) -> SkinningOutput {
        let positions: Vec<Vec3> = self.vertices.iter().map(|v| v.position).collect();
        let normals: Vec<Vec3> = self.vertices.iter().map(|v| v.normal).collect();
        compute_skinning(&SkinningInput {
            positions: &positions,
            normals: &normals,
            bone_data: self.binding.mesh_vertices(0),
            bone_matrices: &self.skinning_matrices,
        })
    }

    fn sync_raw_matrices(&mut self) {
        let raw_len = self.skinning_matrices.len() * 16;
        if self.skinning_matrices_raw.len() != raw_len {
            self.skinning_matrices_raw.resize(raw_len, 0.0);
        }
        self.skinning_matrices_raw
            .par_chunks_mut(16)
            .zip(self.skinning_matrices.par_iter())
            .for_each(|(chunk, matrix)| chunk.copy_from_slice(&matrix.to_cols_array()));
    }
}
