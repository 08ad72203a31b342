//! 骨骼注册表

use glam::Mat4;
use std::collections::HashMap;

use super::Bone;

/// 骨骼注册表
///
/// 骨骼 ID 按首次出现顺序分配，始终覆盖连续区间 [0, N)。同名骨骼（多个子网格共享）只登记一次。
#[derive(Clone, Debug, Default)]
pub struct BoneRegistry {
    bones: Vec<Bone>,
    name_to_id: HashMap<String, usize>,
}

impl BoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回已有 ID，或分配下一个 ID 并记录偏移矩阵
    ///
    /// 已登记骨骼的偏移矩阵保持首次登记时的值。
    pub fn get_or_assign_id(&mut self, name: &str, offset_matrix: Mat4) -> usize {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = self.bones.len();
        self.name_to_id.insert(name.to_string(), id);
        self.bones.push(Bone::new(id, name, offset_matrix));
        id
    }

    /// 通过名称查找骨骼
    pub fn find(&self, name: &str) -> Option<usize> {
        self.name_to_id.get(name).copied()
    }

    pub fn bone(&self, id: usize) -> Option<&Bone> {
        self.bones.get(id)
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_in_first_seen_order() {
        let mut registry = BoneRegistry::new();
        let names = ["hip", "spine", "hip", "neck", "spine", "head"];
        let ids: Vec<usize> = names
            .iter()
            .map(|n| registry.get_or_assign_id(n, Mat4::IDENTITY))
            .collect();
        assert_eq!(ids, vec![0, 1, 0, 2, 1, 3]);
        assert_eq!(registry.len(), 4);

        let mut seen: Vec<usize> = registry.iter().map(|b| b.id).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..registry.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_first_offset_wins() {
        let mut registry = BoneRegistry::new();
        let first = Mat4::from_translation(glam::Vec3::X);
        registry.get_or_assign_id("arm", first);
        registry.get_or_assign_id("arm", Mat4::IDENTITY);
        assert_eq!(registry.bone(0).unwrap().offset_matrix, first);
        assert_eq!(registry.find("arm"), Some(0));
        assert_eq!(registry.find("leg"), None);
    }
}
