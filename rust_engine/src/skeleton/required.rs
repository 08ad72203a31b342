//! 必需节点集合
//!
//! 标记位于根到任意骨骼节点路径上的节点。混合求值时不含骨骼的子树整体跳过。

use crate::scene::SceneGraph;
use crate::LoadError;

#[derive(Clone, Debug, Default)]
pub struct RequiredNodeSet {
    required: Vec<bool>,
}

impl RequiredNodeSet {
    /// 所有节点初始为非必需
    pub fn new(graph: &SceneGraph) -> Self {
        Self {
            required: vec![false; graph.len()],
        }
    }

    /// 从骨骼同名节点向上标记到根
    pub fn mark_path(&mut self, graph: &SceneGraph, bone_name: &str) -> Result<(), LoadError> {
        let start = graph
            .find_by_name(bone_name)
            .ok_or_else(|| LoadError::BoneNotInHierarchy(bone_name.to_string()))?;
        for index in graph.ancestors(start) {
            if self.required[index] {
                // 上方路径已标记过
                break;
            }
            self.required[index] = true;
        }
        Ok(())
    }

    pub fn is_required(&self, node: usize) -> bool {
        self.required.get(node).copied().unwrap_or(false)
    }

    pub fn required_count(&self) -> usize {
        self.required.iter().filter(|&&r| r).count()
    }
}
