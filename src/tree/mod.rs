//! # 层级树模块
//!
//! 提供自引用层级实体（组织部门、导航菜单）的物化路径维护，包括：
//!
//! - **祖先路径**: 有序祖先 ID 列表，存储边界序列化为逗号分隔字符串
//! - **节点与存储接口**: 节点定义、状态，以及可替换的节点存储 trait
//! - **树管理器**: 入库归一化、换父级联、删除防护与完整性校验
//!
//! ## 基本概念
//!
//! - **物化路径**: 每个节点携带从根到直接父节点的祖先 ID 列表，后代
//!   查询与环检测都通过路径包含判断完成，无需递归查询
//! - **不变式**: 任意节点的路径恒等于「父节点路径 + 父节点 ID」；
//!   节点永远不会出现在自己的路径中
//!
//! ## 使用示例
//!
//! ### 构建部门树
//!
//! ```rust
//! use permrs::tree::{TreeManager, TreeNode};
//!
//! let mut manager = TreeManager::new();
//!
//! let hq = TreeNode::root(100, "总公司");
//! let dev = TreeNode::child_of(&hq, 101, "研发部");
//! let qa = TreeNode::child_of(&hq, 102, "测试部");
//!
//! manager.insert(hq).unwrap();
//! manager.insert(dev).unwrap();
//! manager.insert(qa).unwrap();
//!
//! assert_eq!(manager.children(100).len(), 2);
//! ```
//!
//! ### 换父与级联
//!
//! ```rust
//! use permrs::tree::{TreeManager, TreeNode};
//!
//! let mut manager = TreeManager::new();
//! let root = TreeNode::root(1, "root");
//! let mid = TreeNode::child_of(&root, 2, "mid");
//! let leaf = TreeNode::child_of(&mid, 3, "leaf");
//! manager.insert(root).unwrap();
//! manager.insert(mid).unwrap();
//! manager.insert(leaf).unwrap();
//!
//! // leaf 直接划归 root，路径由 [1, 2] 变为 [1]
//! manager.reparent(3, 1).unwrap();
//! assert_eq!(manager.get(3).unwrap().ancestors().ids(), &[1]);
//!
//! // 把 root 挂到自己的后代下面会被拒绝
//! assert!(manager.reparent(1, 3).is_err());
//! ```

mod manager;
mod node;
mod path;

pub use manager::TreeManager;
pub use node::{InMemoryNodeStore, NodeStatus, NodeStore, TreeNode};
pub use path::{AncestorPath, NodeId, ROOT_ID};
