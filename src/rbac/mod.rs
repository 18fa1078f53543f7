//! # RBAC (Role-Based Access Control) 模块
//!
//! 提供角色权限管理功能，包括：
//!
//! - **权限与授权定义**: 权限标识、权限集合与可限定菜单的授权单元
//! - **角色定义**: 角色、继承模式与角色存储接口
//! - **角色图**: 有效权限解析、授权整体替换、继承关系维护与缓存失效
//!
//! ## 基本概念
//!
//! - **Permission（权限）**: 表示对特定资源的特定操作能力
//! - **Grant（授权）**: 角色的一条直接授权，可限定到某个菜单节点
//! - **有效权限**: 直接授权与沿继承图解析出的继承权限的并集
//! - **继承模式**: 完全继承合并被继承角色的全部有效权限；部分继承
//!   只合并允许清单内的部分，直接授权永远不被清单过滤
//!
//! ## 使用示例
//!
//! ### 基本权限检查
//!
//! ```rust
//! use permrs::rbac::{Permission, RoleBuilder};
//!
//! let editor = RoleBuilder::new("r_editor", "editor")
//!     .grant(Permission::new("posts", "read"))
//!     .grant(Permission::new("posts", "write"))
//!     .build();
//!
//! let direct = editor.direct_permissions();
//! assert!(direct.contains(&Permission::new("posts", "read")));
//! assert!(!direct.contains(&Permission::new("posts", "delete")));
//! ```
//!
//! ### 角色继承与有效权限
//!
//! ```rust
//! use permrs::rbac::{Permission, RoleBuilder, RoleGraph};
//!
//! let mut graph = RoleGraph::new();
//!
//! graph.add_role(
//!     RoleBuilder::new("r_viewer", "viewer")
//!         .grant(Permission::new("posts", "read"))
//!         .build(),
//! ).unwrap();
//! graph.add_role(
//!     RoleBuilder::new("r_editor", "editor")
//!         .grant(Permission::new("posts", "write"))
//!         .inherit("r_viewer")
//!         .build(),
//! ).unwrap();
//!
//! // editor 拥有继承的 read 权限和自己的 write 权限
//! let effective = graph.resolve_effective_permissions("r_editor").unwrap();
//! assert!(effective.contains(&Permission::new("posts", "read")));
//! assert!(effective.contains(&Permission::new("posts", "write")));
//! ```

mod graph;
mod permission;
mod role;

pub use graph::{AllowAllMenus, GrantDiff, MenuLookup, RoleGraph};
pub use permission::{Grant, Permission, PermissionSet, WILDCARD};
pub use role::{InMemoryRoleStore, InheritanceMode, Role, RoleBuilder, RoleStore};
