//! 树管理器模块
//!
//! 维护层级节点的物化祖先路径：节点入库、换父级联、删除防护与
//! 路径完整性校验都从这里走，存储是唯一的事实来源。

use crate::cycle;
use crate::error::{ConflictError, ConsistencyError, CycleError, Error, Result, ValidationError};

use super::node::{InMemoryNodeStore, NodeStore, TreeNode};
use super::path::{AncestorPath, NodeId, ROOT_ID};

/// 树管理器
///
/// 对节点存储的所有结构性写入（插入、换父、删除）都经由管理器完成，
/// 保证每个节点的祖先路径始终等于「父节点路径 + 父节点 ID」。
///
/// # 示例
///
/// ```rust
/// use permrs::tree::{TreeManager, TreeNode};
///
/// let mut manager = TreeManager::new();
///
/// let hq = TreeNode::root(100, "总公司");
/// let dev = TreeNode::child_of(&hq, 101, "研发部");
/// let platform = TreeNode::child_of(&dev, 102, "平台组");
///
/// manager.insert(hq).unwrap();
/// manager.insert(dev).unwrap();
/// manager.insert(platform).unwrap();
///
/// // 平台组直接划归总公司，路径级联更新
/// manager.reparent(102, 100).unwrap();
/// assert_eq!(manager.get(102).unwrap().ancestors().ids(), &[100]);
/// ```
#[derive(Debug)]
pub struct TreeManager<S: NodeStore = InMemoryNodeStore> {
    store: S,
}

impl TreeManager<InMemoryNodeStore> {
    /// 创建使用内存存储的树管理器
    pub fn new() -> Self {
        Self {
            store: InMemoryNodeStore::new(),
        }
    }
}

impl Default for TreeManager<InMemoryNodeStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: NodeStore> TreeManager<S> {
    /// 基于外部存储创建树管理器
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    /// 获取底层存储的只读引用
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 取出底层存储
    pub fn into_store(self) -> S {
        self.store
    }

    /// 根据 ID 获取节点
    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.store.get(id)
    }

    /// 获取直接子节点，按同级顺序排序
    pub fn children(&self, parent_id: NodeId) -> Vec<&TreeNode> {
        self.store.children(parent_id)
    }

    /// 插入节点
    ///
    /// 祖先路径以存储中的父节点为准归一化，调用方传入的路径不被信任。
    ///
    /// # Errors
    ///
    /// - 节点 ID 为根哨兵或已存在 → [`ValidationError`]
    /// - 父节点不存在 → [`ValidationError::ParentNotFound`]
    pub fn insert(&mut self, mut node: TreeNode) -> Result<()> {
        if node.id == ROOT_ID {
            return Err(Error::validation("node id 0 is reserved for the root sentinel"));
        }
        if self.store.exists(node.id) {
            return Err(Error::validation(format!("node {} already exists", node.id)));
        }
        let path = self.parent_path(node.parent_id)?;
        node.set_ancestors(path);
        self.store.save(node);
        Ok(())
    }

    /// 节点换父，级联重写全部后代的祖先路径
    ///
    /// 返回被级联更新的后代数量。目标位置与当前位置相同时是 no-op，
    /// 返回 `Ok(0)`。
    ///
    /// 后代的旧路径全部先于任何写入被读取（整体快照），提交前复核
    /// 各后代的结构版本；版本不符说明子树被并发修改，整个操作被
    /// 放弃且不产生任何部分写入。
    ///
    /// # Errors
    ///
    /// - 节点或目标父节点不存在 → [`ValidationError`]
    /// - 目标父节点是自身或自身的后代 → [`CycleError::Structural`]
    /// - 子树被并发修改 → [`ConflictError::ConcurrentStructuralChange`]
    /// - 某个后代的路径中不含被移动节点 → [`ConsistencyError::BrokenAncestorPath`]
    pub fn reparent(&mut self, node_id: NodeId, new_parent_id: NodeId) -> Result<usize> {
        let node = self
            .store
            .get(node_id)
            .cloned()
            .ok_or(ValidationError::NodeNotFound(node_id))?;

        if new_parent_id != ROOT_ID && !self.store.exists(new_parent_id) {
            return Err(ValidationError::ParentNotFound(new_parent_id).into());
        }

        // 基于目标父节点当前的祖先路径做环检测
        {
            let store = &self.store;
            let expand = |id: &NodeId| -> Vec<NodeId> {
                store
                    .get(*id)
                    .map(|n| n.ancestors().ids().to_vec())
                    .unwrap_or_default()
            };
            if cycle::would_create_cycle(&new_parent_id, &node_id, expand) {
                return Err(CycleError::Structural {
                    node_id,
                    new_parent_id,
                }
                .into());
            }
        }

        let new_path = self.parent_path(new_parent_id)?;
        if node.parent_id == new_parent_id && node.ancestors() == &new_path {
            return Ok(0);
        }

        // 整体快照后代的旧路径与版本，所有读取先于任何写入
        let snapshot: Vec<TreeNode> = self
            .store
            .descendants(node_id)
            .into_iter()
            .cloned()
            .collect();

        let mut updates: Vec<(TreeNode, AncestorPath)> = Vec::with_capacity(snapshot.len());
        for d in snapshot {
            let rebased = d
                .ancestors()
                .rebase(node_id, &new_path)
                .ok_or(ConsistencyError::BrokenAncestorPath { node_id: d.id })?;
            updates.push((d, rebased));
        }

        // 提交前复核结构版本，子树被并发改动时放弃整个级联
        for (d, _) in &updates {
            match self.store.get(d.id) {
                Some(current) if current.version() == d.version() => {}
                _ => {
                    return Err(ConflictError::ConcurrentStructuralChange { node_id: d.id }.into());
                }
            }
        }

        let cascaded = updates.len();
        let mut moved = node;
        moved.apply_move(new_parent_id, new_path);
        self.store.save(moved);
        for (mut d, rebased) in updates {
            d.apply_path(rebased);
            self.store.save(d);
        }
        Ok(cascaded)
    }

    /// 删除节点
    ///
    /// 仍有后代的节点不能删除；外部依赖（挂在部门下的用户等）由
    /// 调用方在删除前自行检查。
    pub fn delete(&mut self, node_id: NodeId) -> Result<TreeNode> {
        if !self.store.exists(node_id) {
            return Err(ValidationError::NodeNotFound(node_id).into());
        }
        if !self.store.descendants(node_id).is_empty() {
            return Err(ValidationError::HasDescendants(node_id).into());
        }
        self.store
            .remove(node_id)
            .ok_or_else(|| ValidationError::NodeNotFound(node_id).into())
    }

    /// 校验节点的祖先路径与其父节点构成前缀扩展关系
    ///
    /// 路径损坏说明存储中的数据已被破坏，以 [`ConsistencyError`] 暴露。
    pub fn verify_path(&self, node_id: NodeId) -> Result<()> {
        let node = self
            .store
            .get(node_id)
            .ok_or(ValidationError::NodeNotFound(node_id))?;

        let expected = if node.parent_id == ROOT_ID {
            AncestorPath::new()
        } else {
            match self.store.get(node.parent_id) {
                Some(parent) => AncestorPath::child_of(parent.ancestors(), parent.id),
                None => return Err(ConsistencyError::BrokenAncestorPath { node_id }.into()),
            }
        };

        if node.ancestors() != &expected {
            return Err(ConsistencyError::BrokenAncestorPath { node_id }.into());
        }
        Ok(())
    }

    fn parent_path(&self, parent_id: NodeId) -> Result<AncestorPath> {
        if parent_id == ROOT_ID {
            return Ok(AncestorPath::new());
        }
        let parent = self
            .store
            .get(parent_id)
            .ok_or(ValidationError::ParentNotFound(parent_id))?;
        Ok(AncestorPath::child_of(parent.ancestors(), parent.id))
    }
}
