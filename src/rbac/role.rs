//! 角色定义模块
//!
//! 提供角色的定义、构建与存储接口。角色持有直接授权、继承的角色列表、
//! 继承模式与部分继承允许清单；有效权限的解析在角色图中完成。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::permission::{Grant, Permission, PermissionSet};

/// 继承模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InheritanceMode {
    /// 完全继承：获得被继承角色的全部有效权限
    #[default]
    Full,
    /// 部分继承：仅获得允许清单内的有效权限
    Partial,
}

/// 角色定义
///
/// 角色是一组直接授权的集合，并可继承其他角色的有效权限。
/// 继承关系构成的有向图必须保持无环，由角色图在每次变更前校验。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// 角色唯一标识符
    pub id: String,
    /// 角色编码（唯一）
    pub code: String,
    /// 角色名称
    pub name: String,
    /// 直接授权
    #[serde(default, skip_serializing_if = "HashSet::is_empty")]
    grants: HashSet<Grant>,
    /// 继承的角色 ID 列表
    #[serde(default, skip_serializing_if = "HashSet::is_empty")]
    inherits: HashSet<String>,
    /// 继承模式
    #[serde(default)]
    mode: InheritanceMode,
    /// 部分继承的允许清单（仅 Partial 模式下有意义）
    #[serde(default, skip_serializing_if = "PermissionSet::is_empty")]
    allow_list: PermissionSet,
    /// 角色是否启用
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

impl Role {
    /// 创建新角色（无继承，名称默认与编码相同）
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        let now = Utc::now();
        let code = code.into();
        Self {
            id: id.into(),
            name: code.clone(),
            code,
            grants: HashSet::new(),
            inherits: HashSet::new(),
            mode: InheritanceMode::Full,
            allow_list: PermissionSet::new(),
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// 获取角色 ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 获取角色编码
    pub fn code(&self) -> &str {
        &self.code
    }

    /// 获取直接授权
    pub fn grants(&self) -> &HashSet<Grant> {
        &self.grants
    }

    /// 直接授权的权限集合（忽略菜单限定）
    pub fn direct_permissions(&self) -> PermissionSet {
        self.grants.iter().map(|g| g.permission.clone()).collect()
    }

    /// 获取继承的角色列表
    pub fn inherits(&self) -> &HashSet<String> {
        &self.inherits
    }

    /// 检查是否直接继承自指定角色
    pub fn inherits_from(&self, role_id: &str) -> bool {
        self.inherits.contains(role_id)
    }

    /// 获取继承模式
    pub fn mode(&self) -> InheritanceMode {
        self.mode
    }

    /// 获取部分继承允许清单
    pub fn allow_list(&self) -> &PermissionSet {
        &self.allow_list
    }

    /// 启用角色
    pub fn enable(&mut self) {
        self.enabled = true;
        self.updated_at = Utc::now();
    }

    /// 停用角色
    pub fn disable(&mut self) {
        self.enabled = false;
        self.updated_at = Utc::now();
    }

    /// 检查角色是否启用
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 整体替换直接授权，由角色图在完成校验与差集审计后调用
    pub(crate) fn replace_grants(&mut self, grants: HashSet<Grant>) {
        self.grants = grants;
        self.updated_at = Utc::now();
    }

    /// 整体替换继承关系，由角色图在完成环校验后调用
    pub(crate) fn replace_inheritance(
        &mut self,
        inherits: HashSet<String>,
        mode: InheritanceMode,
        allow_list: PermissionSet,
    ) {
        self.inherits = inherits;
        self.mode = mode;
        self.allow_list = allow_list;
        self.updated_at = Utc::now();
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Role {}

impl std::hash::Hash for Role {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// ============================================================================
// RoleBuilder
// ============================================================================

/// 角色构建器
///
/// 提供流式 API 来创建角色
///
/// # 示例
///
/// ```rust
/// use permrs::rbac::{Permission, RoleBuilder};
///
/// let role = RoleBuilder::new("r_editor", "editor")
///     .name("内容编辑")
///     .grant(Permission::new("posts", "read"))
///     .grant_scoped(Permission::new("posts", "write"), 104)
///     .inherit("r_viewer")
///     .build();
///
/// assert_eq!(role.code(), "editor");
/// assert!(role.inherits_from("r_viewer"));
/// ```
pub struct RoleBuilder {
    id: String,
    code: String,
    name: Option<String>,
    grants: Vec<Grant>,
    inherits: Vec<String>,
    mode: InheritanceMode,
    allow_list: Vec<Permission>,
    enabled: bool,
}

impl RoleBuilder {
    /// 创建新的角色构建器
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: None,
            grants: Vec::new(),
            inherits: Vec::new(),
            mode: InheritanceMode::Full,
            allow_list: Vec::new(),
            enabled: true,
        }
    }

    /// 设置角色名称（默认与编码相同）
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 添加不限定菜单的直接授权
    pub fn grant(mut self, permission: Permission) -> Self {
        self.grants.push(Grant::new(permission));
        self
    }

    /// 添加限定到菜单的直接授权
    pub fn grant_scoped(mut self, permission: Permission, menu_id: crate::tree::NodeId) -> Self {
        self.grants.push(Grant::scoped(permission, menu_id));
        self
    }

    /// 添加继承角色
    pub fn inherit(mut self, role_id: impl Into<String>) -> Self {
        self.inherits.push(role_id.into());
        self
    }

    /// 设置继承模式
    pub fn mode(mut self, mode: InheritanceMode) -> Self {
        self.mode = mode;
        self
    }

    /// 添加部分继承允许清单中的权限
    pub fn allow(mut self, permission: Permission) -> Self {
        self.allow_list.push(permission);
        self
    }

    /// 设置是否启用
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// 构建角色
    pub fn build(self) -> Role {
        let now = Utc::now();
        let name = self.name.unwrap_or_else(|| self.code.clone());

        Role {
            id: self.id,
            code: self.code,
            name,
            grants: self.grants.into_iter().collect(),
            inherits: self.inherits.into_iter().collect(),
            mode: self.mode,
            allow_list: self.allow_list.into_iter().collect(),
            enabled: self.enabled,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// RoleStore Trait
// ============================================================================

/// 角色存储 trait
///
/// 定义角色持久化存储的接口
pub trait RoleStore {
    /// 保存角色
    fn save(&mut self, role: Role);

    /// 根据 ID 获取角色
    fn get(&self, id: &str) -> Option<&Role>;

    /// 根据 ID 获取可变角色引用
    fn get_mut(&mut self, id: &str) -> Option<&mut Role>;

    /// 删除角色
    fn delete(&mut self, id: &str) -> Option<Role>;

    /// 列出所有角色
    fn list(&self) -> Vec<&Role>;

    /// 检查角色是否存在
    fn exists(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

// ============================================================================
// InMemoryRoleStore
// ============================================================================

/// 内存角色存储
///
/// 用于测试和开发环境
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    roles: HashMap<String, Role>,
}

impl InMemoryRoleStore {
    /// 创建新的内存存储
    pub fn new() -> Self {
        Self {
            roles: HashMap::new(),
        }
    }

    /// 获取角色数量
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// 检查是否为空
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl RoleStore for InMemoryRoleStore {
    fn save(&mut self, role: Role) {
        self.roles.insert(role.id.clone(), role);
    }

    fn get(&self, id: &str) -> Option<&Role> {
        self.roles.get(id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Role> {
        self.roles.get_mut(id)
    }

    fn delete(&mut self, id: &str) -> Option<Role> {
        self.roles.remove(id)
    }

    fn list(&self) -> Vec<&Role> {
        self.roles.values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_new() {
        let role = Role::new("r_admin", "admin");
        assert_eq!(role.id(), "r_admin");
        assert_eq!(role.code(), "admin");
        assert_eq!(role.name, "admin");
        assert!(role.is_enabled());
        assert!(role.grants().is_empty());
        assert!(role.inherits().is_empty());
        assert_eq!(role.mode(), InheritanceMode::Full);
    }

    #[test]
    fn test_role_builder() {
        let role = RoleBuilder::new("r_editor", "editor")
            .name("内容编辑")
            .grant(Permission::new("posts", "read"))
            .grant_scoped(Permission::new("posts", "write"), 104)
            .inherit("r_viewer")
            .mode(InheritanceMode::Partial)
            .allow(Permission::new("posts", "read"))
            .build();

        assert_eq!(role.name, "内容编辑");
        assert_eq!(role.grants().len(), 2);
        assert!(role.inherits_from("r_viewer"));
        assert_eq!(role.mode(), InheritanceMode::Partial);
        assert!(role.allow_list().contains(&Permission::new("posts", "read")));
    }

    #[test]
    fn test_direct_permissions_drop_scope() {
        let role = RoleBuilder::new("r_editor", "editor")
            .grant_scoped(Permission::new("posts", "read"), 104)
            .grant_scoped(Permission::new("posts", "read"), 105)
            .build();

        // 两条授权限定到不同菜单，但权限标识相同
        assert_eq!(role.grants().len(), 2);
        assert_eq!(role.direct_permissions().len(), 1);
    }

    #[test]
    fn test_role_enable_disable() {
        let mut role = Role::new("r_test", "test");
        assert!(role.is_enabled());

        role.disable();
        assert!(!role.is_enabled());

        role.enable();
        assert!(role.is_enabled());
    }

    #[test]
    fn test_in_memory_store() {
        let mut store = InMemoryRoleStore::new();
        assert!(store.is_empty());

        store.save(Role::new("r_admin", "admin"));
        assert_eq!(store.len(), 1);
        assert!(store.exists("r_admin"));
        assert!(!store.exists("unknown"));

        let deleted = store.delete("r_admin");
        assert!(deleted.is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_role_serde_round_trip() {
        let role = RoleBuilder::new("r_editor", "editor")
            .grant(Permission::new("posts", "read"))
            .inherit("r_viewer")
            .build();

        let json = serde_json::to_string(&role).unwrap();
        let back: Role = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id(), role.id());
        assert_eq!(back.grants().len(), 1);
        assert!(back.inherits_from("r_viewer"));
    }
}
