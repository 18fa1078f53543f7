//! # PermRS
//!
//! 企业后台管理平台的层级授权核心库。
//!
//! ## 功能特性
//!
//! - **层级树维护**: 自引用层级实体（部门、菜单）的物化祖先路径，
//!   换父时级联重写全部后代
//! - **环检测**: 结构树与角色继承图共用的可达性守卫
//! - **角色权限解析**: 角色继承（完全/部分模式）下的有效权限计算，
//!   按角色缓存并在变更时同步失效
//! - **审计追踪**: 授权、回收、继承变更的不可变审计记录
//!
//! 本库不包含任何网络协议或 CLI，由外围的 CRUD 服务作为库引用；
//! 持久化、HTTP、认证等都在库外通过存储 trait 对接。
//!
//! ## 部门树示例
//!
//! ```rust
//! use permrs::tree::{TreeManager, TreeNode};
//!
//! let mut manager = TreeManager::new();
//!
//! let hq = TreeNode::root(100, "总公司");
//! let dev = TreeNode::child_of(&hq, 101, "研发部");
//! let platform = TreeNode::child_of(&dev, 102, "平台组");
//!
//! manager.insert(hq).unwrap();
//! manager.insert(dev).unwrap();
//! manager.insert(platform).unwrap();
//!
//! // 平台组直接划归总公司
//! manager.reparent(102, 100).unwrap();
//! assert_eq!(manager.get(102).unwrap().ancestors().ids(), &[100]);
//! ```
//!
//! ## 角色权限示例
//!
//! ```rust
//! use permrs::audit::{ActorContext, AuditFilter, AuditTrail};
//! use permrs::rbac::{AllowAllMenus, Grant, Permission, RoleBuilder, RoleGraph};
//!
//! let mut graph = RoleGraph::new();
//! let actor = ActorContext::new("u_1", "admin", "192.168.1.1");
//!
//! graph.add_role(RoleBuilder::new("r_viewer", "viewer").build()).unwrap();
//! graph.add_role(
//!     RoleBuilder::new("r_editor", "editor").inherit("r_viewer").build(),
//! ).unwrap();
//!
//! // 整体替换 viewer 的授权，差集自动写入审计
//! let grants = [Grant::new(Permission::new("posts", "read"))].into_iter().collect();
//! graph.update_grants("r_viewer", grants, &AllowAllMenus, &actor).unwrap();
//!
//! let effective = graph.resolve_effective_permissions("r_editor").unwrap();
//! assert!(effective.contains(&Permission::new("posts", "read")));
//!
//! let entries = graph.audit().query(&AuditFilter::new().role("r_viewer")).unwrap();
//! assert_eq!(entries.len(), 1);
//! ```

pub mod audit;
pub mod cycle;
pub mod error;
pub mod random;
pub mod rbac;
pub mod tree;

pub use error::{Error, Result};

// ============================================================================
// 层级树相关导出
// ============================================================================

pub use tree::{AncestorPath, InMemoryNodeStore, NodeId, NodeStatus, NodeStore, ROOT_ID, TreeManager, TreeNode};

// ============================================================================
// RBAC 相关导出
// ============================================================================

pub use rbac::{
    AllowAllMenus, Grant, GrantDiff, InMemoryRoleStore, InheritanceMode, MenuLookup, Permission,
    PermissionSet, Role, RoleBuilder, RoleGraph, RoleStore,
};

// ============================================================================
// 审计相关导出
// ============================================================================

pub use audit::{
    ActorContext, AuditEntry, AuditFilter, AuditTrail, AuditType, InMemoryAuditTrail,
};
