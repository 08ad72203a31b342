//! 场景节点树（竞技场存储）

use glam::Mat4;
use std::collections::HashMap;

/// 场景节点
#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    /// 相对父节点的静态变换
    pub transform: Mat4,
    /// 父节点索引，根节点为 None
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// 场景图
///
/// 节点存放在连续数组中，父子关系用索引表示。索引 0 始终是根节点。
#[derive(Clone, Debug)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    name_to_index: HashMap<String, usize>,
}

impl SceneGraph {
    pub const ROOT: usize = 0;

    /// 创建只有根节点的场景图
    pub fn new(root_name: impl Into<String>, transform: Mat4) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            name_to_index: HashMap::new(),
        };
        graph.push_node(root_name.into(), transform, None);
        graph
    }

    /// 添加子节点，返回新节点索引；父索引不存在时返回 None
    ///
    /// 同名节点会覆盖名称索引（后注册者生效）。
    pub fn add_child(&mut self, parent: usize, name: impl Into<String>, transform: Mat4) -> Option<usize> {
        if parent >= self.nodes.len() {
            return None;
        }
        let index = self.push_node(name.into(), transform, Some(parent));
        self.nodes[parent].children.push(index);
        Some(index)
    }

    fn push_node(&mut self, name: String, transform: Mat4, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        self.name_to_index.insert(name.clone(), index);
        self.nodes.push(Node {
            name,
            transform,
            parent,
            children: Vec::new(),
        });
        index
    }

    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT]
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 通过名称查找节点
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// 从指定节点（含自身）向上遍历到根
    pub fn ancestors(&self, index: usize) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.nodes.get(index).map(|_| index),
        }
    }

    /// 前序深度优先遍历所有节点，返回 (索引, 深度)
    pub fn iter_depth_first(&self) -> Vec<(usize, usize)> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(Self::ROOT, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            order.push((index, depth));
            for &child in self.nodes[index].children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        order
    }
}

/// 向上遍历迭代器
pub struct Ancestors<'a> {
    graph: &'a SceneGraph,
    next: Option<usize>,
}

impl Iterator for Ancestors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.graph.nodes[current].parent;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> SceneGraph {
        let mut graph = SceneGraph::new("root", Mat4::IDENTITY);
        let a = graph.add_child(SceneGraph::ROOT, "a", Mat4::IDENTITY).unwrap();
        graph.add_child(a, "b", Mat4::IDENTITY).unwrap();
        graph.add_child(SceneGraph::ROOT, "c", Mat4::IDENTITY);
        graph
    }

    #[test]
    fn test_ancestors_walk_to_root() {
        let graph = chain();
        let b = graph.find_by_name("b").unwrap();
        let names: Vec<&str> = graph
            .ancestors(b)
            .map(|i| graph.node(i).unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["b", "a", "root"]);
        assert!(graph.root().parent.is_none());
    }

    #[test]
    fn test_depth_first_order() {
        let graph = chain();
        let order: Vec<(&str, usize)> = graph
            .iter_depth_first()
            .into_iter()
            .map(|(i, d)| (graph.node(i).unwrap().name.as_str(), d))
            .collect();
        assert_eq!(order, vec![("root", 0), ("a", 1), ("b", 2), ("c", 1)]);
    }

    #[test]
    fn test_duplicate_names_alias_to_last() {
        let mut graph = SceneGraph::new("root", Mat4::IDENTITY);
        graph.add_child(SceneGraph::ROOT, "dup", Mat4::IDENTITY);
        let second = graph.add_child(SceneGraph::ROOT, "dup", Mat4::IDENTITY);
        assert_eq!(graph.find_by_name("dup"), second);
        assert!(graph.add_child(42, "orphan", Mat4::IDENTITY).is_none());
        assert_eq!(graph.len(), 3);
    }
}
