//! 层级节点模块
//!
//! 提供自引用层级实体（部门、菜单）的节点定义与存储接口。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::path::{AncestorPath, NodeId, ROOT_ID};

/// 节点状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NodeStatus {
    /// 正常
    #[default]
    Active,
    /// 停用
    Disabled,
}

/// 层级节点
///
/// 以父引用加物化祖先路径的形式组织的树节点。路径由树管理器独占维护：
/// 创建时从父节点复制，换父时连同全部后代级联重写。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// 节点唯一标识（不可变）
    pub id: NodeId,
    /// 父节点 ID（[`ROOT_ID`] 表示根节点）
    pub parent_id: NodeId,
    /// 物化祖先路径（从根到直接父节点）
    ancestors: AncestorPath,
    /// 节点名称
    pub name: String,
    /// 同级展示顺序
    pub order_num: i32,
    /// 节点状态
    pub status: NodeStatus,
    /// 结构版本号，路径每次被改写时递增
    version: u64,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl TreeNode {
    /// 创建根节点（空祖先路径）
    pub fn root(id: NodeId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            parent_id: ROOT_ID,
            ancestors: AncestorPath::new(),
            name: name.into(),
            order_num: 0,
            status: NodeStatus::Active,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// 创建子节点，祖先路径在创建时从父节点复制
    ///
    /// # 示例
    ///
    /// ```rust
    /// use permrs::tree::TreeNode;
    ///
    /// let root = TreeNode::root(100, "总公司");
    /// let child = TreeNode::child_of(&root, 101, "研发部");
    /// assert_eq!(child.parent_id, 100);
    /// assert_eq!(child.ancestors().ids(), &[100]);
    /// ```
    pub fn child_of(parent: &TreeNode, id: NodeId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            parent_id: parent.id,
            ancestors: AncestorPath::child_of(&parent.ancestors, parent.id),
            name: name.into(),
            order_num: 0,
            status: NodeStatus::Active,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// 设置同级顺序
    pub fn with_order(mut self, order_num: i32) -> Self {
        self.order_num = order_num;
        self
    }

    /// 设置状态
    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = status;
        self
    }

    /// 获取祖先路径
    pub fn ancestors(&self) -> &AncestorPath {
        &self.ancestors
    }

    /// 获取结构版本号
    pub fn version(&self) -> u64 {
        self.version
    }

    /// 是否为根节点
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_ID
    }

    /// 是否为指定节点的后代
    pub fn is_descendant_of(&self, ancestor_id: NodeId) -> bool {
        self.ancestors.contains(ancestor_id)
    }

    /// 节点是否处于正常状态
    pub fn is_active(&self) -> bool {
        self.status == NodeStatus::Active
    }

    /// 停用节点
    pub fn disable(&mut self) {
        self.status = NodeStatus::Disabled;
        self.updated_at = Utc::now();
    }

    /// 启用节点
    pub fn enable(&mut self) {
        self.status = NodeStatus::Active;
        self.updated_at = Utc::now();
    }

    /// 节点换父时由树管理器调用，改写父引用与祖先路径
    pub(crate) fn apply_move(&mut self, new_parent_id: NodeId, new_path: AncestorPath) {
        self.parent_id = new_parent_id;
        self.ancestors = new_path;
        self.version = self.version.wrapping_add(1);
        self.updated_at = Utc::now();
    }

    /// 级联更新后代路径时由树管理器调用，父引用不变
    pub(crate) fn apply_path(&mut self, new_path: AncestorPath) {
        self.ancestors = new_path;
        self.version = self.version.wrapping_add(1);
        self.updated_at = Utc::now();
    }

    /// 设置祖先路径（入库前由树管理器归一化时使用）
    pub(crate) fn set_ancestors(&mut self, path: AncestorPath) {
        self.ancestors = path;
    }
}

// ============================================================================
// NodeStore Trait
// ============================================================================

/// 节点存储 trait
///
/// 定义层级节点持久化存储的接口。实现方需要保证 `save` 的原子性，
/// 事务范围由上层操作界定。
pub trait NodeStore {
    /// 根据 ID 获取节点
    fn get(&self, id: NodeId) -> Option<&TreeNode>;

    /// 获取直接子节点，按 `order_num`（其次按 ID）排序
    fn children(&self, parent_id: NodeId) -> Vec<&TreeNode>;

    /// 获取全部后代（祖先路径中包含指定 ID 的节点）
    fn descendants(&self, id: NodeId) -> Vec<&TreeNode>;

    /// 保存节点（插入或覆盖）
    fn save(&mut self, node: TreeNode);

    /// 删除节点
    fn remove(&mut self, id: NodeId) -> Option<TreeNode>;

    /// 列出所有节点
    fn list(&self) -> Vec<&TreeNode>;

    /// 检查节点是否存在
    fn exists(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }
}

// ============================================================================
// InMemoryNodeStore
// ============================================================================

/// 内存节点存储
///
/// 用于测试和开发环境
#[derive(Debug, Clone, Default)]
pub struct InMemoryNodeStore {
    nodes: HashMap<NodeId, TreeNode>,
}

impl InMemoryNodeStore {
    /// 创建新的内存存储
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// 获取节点数量
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 检查是否为空
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl NodeStore for InMemoryNodeStore {
    fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    fn children(&self, parent_id: NodeId) -> Vec<&TreeNode> {
        let mut children: Vec<&TreeNode> = self
            .nodes
            .values()
            .filter(|n| n.parent_id == parent_id)
            .collect();
        children.sort_by_key(|n| (n.order_num, n.id));
        children
    }

    fn descendants(&self, id: NodeId) -> Vec<&TreeNode> {
        self.nodes
            .values()
            .filter(|n| n.is_descendant_of(id))
            .collect()
    }

    fn save(&mut self, node: TreeNode) {
        self.nodes.insert(node.id, node);
    }

    fn remove(&mut self, id: NodeId) -> Option<TreeNode> {
        self.nodes.remove(&id)
    }

    fn list(&self) -> Vec<&TreeNode> {
        self.nodes.values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let root = TreeNode::root(100, "总公司");
        assert!(root.is_root());
        assert!(root.ancestors().is_empty());
        assert_eq!(root.version(), 0);

        let child = TreeNode::child_of(&root, 101, "研发部");
        assert_eq!(child.parent_id, 100);
        assert_eq!(child.ancestors().ids(), &[100]);

        let grandchild = TreeNode::child_of(&child, 102, "平台组");
        assert_eq!(grandchild.ancestors().ids(), &[100, 101]);
        assert!(grandchild.is_descendant_of(100));
        assert!(grandchild.is_descendant_of(101));
        assert!(!grandchild.is_descendant_of(102));
    }

    #[test]
    fn test_node_status() {
        let mut node = TreeNode::root(1, "root");
        assert!(node.is_active());

        node.disable();
        assert!(!node.is_active());

        node.enable();
        assert!(node.is_active());
    }

    #[test]
    fn test_children_ordering() {
        let mut store = InMemoryNodeStore::new();
        let root = TreeNode::root(1, "root");

        store.save(TreeNode::child_of(&root, 10, "b").with_order(2));
        store.save(TreeNode::child_of(&root, 11, "a").with_order(1));
        store.save(TreeNode::child_of(&root, 12, "c").with_order(2));
        store.save(root);

        let ids: Vec<_> = store.children(1).iter().map(|n| n.id).collect();
        // order_num 优先，order_num 相同时按 ID
        assert_eq!(ids, vec![11, 10, 12]);
    }

    #[test]
    fn test_descendants_by_path() {
        let mut store = InMemoryNodeStore::new();
        let root = TreeNode::root(1, "root");
        let a = TreeNode::child_of(&root, 2, "a");
        let b = TreeNode::child_of(&a, 3, "b");
        let other = TreeNode::root(9, "other");

        store.save(root);
        store.save(a);
        store.save(b);
        store.save(other);

        let mut ids: Vec<_> = store.descendants(1).iter().map(|n| n.id).collect();
        ids.sort();
        assert_eq!(ids, vec![2, 3]);

        assert!(store.descendants(9).is_empty());
    }

    #[test]
    fn test_node_serde_round_trip() {
        let root = TreeNode::root(100, "总公司");
        let child = TreeNode::child_of(&root, 101, "研发部").with_order(3);

        let json = serde_json::to_string(&child).unwrap();
        // 祖先路径以分隔字符串入库
        assert!(json.contains("\"ancestors\":\"100\""));

        let back: TreeNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, child);
    }
}
