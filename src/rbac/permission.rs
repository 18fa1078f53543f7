//! 权限定义模块
//!
//! 提供权限标识、权限集合与菜单授权单元的定义。

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::tree::NodeId;

/// 通配符常量，表示匹配所有
pub const WILDCARD: &str = "*";

/// 权限标识
///
/// 权限由资源和操作组成，格式为 `resource:action`
///
/// ## 特殊权限
///
/// - `*:*` - 匹配所有资源的所有操作（超级权限）
/// - `resource:*` - 匹配特定资源的所有操作
/// - `*:action` - 匹配所有资源的特定操作
///
/// ## 示例
///
/// ```rust
/// use permrs::rbac::Permission;
///
/// let read_users = Permission::new("users", "read");
/// let all_users = Permission::resource_wildcard("users"); // users:*
/// assert!(all_users.matches(&read_users));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    /// 资源标识符
    resource: String,
    /// 操作标识符
    action: String,
}

impl Permission {
    /// 创建新的权限
    ///
    /// # 示例
    ///
    /// ```rust
    /// use permrs::rbac::Permission;
    ///
    /// let perm = Permission::new("users", "read");
    /// assert_eq!(perm.resource(), "users");
    /// assert_eq!(perm.action(), "read");
    /// ```
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
        }
    }

    /// 创建通配符权限（匹配所有资源的所有操作）
    pub fn wildcard() -> Self {
        Self::new(WILDCARD, WILDCARD)
    }

    /// 创建资源通配符权限（匹配特定资源的所有操作）
    pub fn resource_wildcard(resource: impl Into<String>) -> Self {
        Self::new(resource, WILDCARD)
    }

    /// 创建操作通配符权限（匹配所有资源的特定操作）
    pub fn action_wildcard(action: impl Into<String>) -> Self {
        Self::new(WILDCARD, action)
    }

    /// 从字符串解析权限
    ///
    /// 格式：`resource:action`
    ///
    /// # 示例
    ///
    /// ```rust
    /// use permrs::rbac::Permission;
    ///
    /// let perm = Permission::parse("users:delete").unwrap();
    /// assert_eq!(perm.resource(), "users");
    /// assert_eq!(perm.action(), "delete");
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.splitn(2, ':').collect();
        if parts.len() == 2 && !parts[0].is_empty() && !parts[1].is_empty() {
            Some(Self::new(parts[0], parts[1]))
        } else {
            None
        }
    }

    /// 获取资源标识符
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// 获取操作标识符
    pub fn action(&self) -> &str {
        &self.action
    }

    /// 检查是否包含通配符
    pub fn has_wildcard(&self) -> bool {
        self.resource == WILDCARD || self.action == WILDCARD
    }

    /// 检查此权限是否匹配另一个权限
    ///
    /// 通配符权限可以匹配更具体的权限
    pub fn matches(&self, other: &Permission) -> bool {
        let resource_matches = self.resource == WILDCARD || self.resource == other.resource;
        let action_matches = self.action == WILDCARD || self.action == other.action;
        resource_matches && action_matches
    }
}

impl PartialEq for Permission {
    fn eq(&self, other: &Self) -> bool {
        self.resource == other.resource && self.action == other.action
    }
}

impl Eq for Permission {}

impl Hash for Permission {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.resource.hash(state);
        self.action.hash(state);
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

// ============================================================================
// Grant 类型
// ============================================================================

/// 授权单元
///
/// 角色的一条直接授权：一个权限标识，可选地限定到某个菜单节点。
/// 角色授权的整体替换以授权单元为粒度做差集比较。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grant {
    /// 权限标识
    pub permission: Permission,
    /// 可选的菜单限定
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_id: Option<NodeId>,
}

impl Grant {
    /// 创建不限定菜单的授权
    pub fn new(permission: Permission) -> Self {
        Self {
            permission,
            menu_id: None,
        }
    }

    /// 创建限定到菜单的授权
    pub fn scoped(permission: Permission, menu_id: NodeId) -> Self {
        Self {
            permission,
            menu_id: Some(menu_id),
        }
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.menu_id {
            Some(menu_id) => write!(f, "{}@{}", self.permission, menu_id),
            None => write!(f, "{}", self.permission),
        }
    }
}

// ============================================================================
// PermissionSet 类型
// ============================================================================

/// 权限集合
///
/// 用于管理一组权限，支持通配符匹配。有效权限解析的结果就是一个
/// 权限集合，重复的权限自然坍缩。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    permissions: HashSet<Permission>,
}

impl PermissionSet {
    /// 创建空的权限集合
    pub fn new() -> Self {
        Self {
            permissions: HashSet::new(),
        }
    }

    /// 添加权限
    pub fn add(&mut self, permission: Permission) -> bool {
        self.permissions.insert(permission)
    }

    /// 移除权限
    pub fn remove(&mut self, permission: &Permission) -> bool {
        self.permissions.remove(permission)
    }

    /// 检查是否包含特定权限
    ///
    /// 考虑通配符匹配
    pub fn contains(&self, permission: &Permission) -> bool {
        if self.permissions.contains(permission) {
            return true;
        }
        for p in &self.permissions {
            if p.matches(permission) {
                return true;
            }
        }
        false
    }

    /// 检查是否包含所有指定权限
    pub fn contains_all(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.contains(p))
    }

    /// 检查是否包含任意一个指定权限
    pub fn contains_any(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.contains(p))
    }

    /// 获取权限数量
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// 检查是否为空
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// 获取所有权限的迭代器
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    /// 合并另一个权限集合
    pub fn merge(&mut self, other: &PermissionSet) {
        for p in &other.permissions {
            self.permissions.insert(p.clone());
        }
    }

    /// 保留允许清单内的权限
    ///
    /// 返回本集合与允许清单的交集（允许清单按通配符语义匹配）。
    /// 部分继承模式下，继承来的有效权限用此操作过滤。
    pub fn restrict_to(&self, allow_list: &PermissionSet) -> PermissionSet {
        self.permissions
            .iter()
            .filter(|p| allow_list.contains(p))
            .cloned()
            .collect()
    }

    /// 获取权限的字符串列表
    pub fn to_string_list(&self) -> Vec<String> {
        self.permissions.iter().map(|p| p.to_string()).collect()
    }
}

impl IntoIterator for PermissionSet {
    type Item = Permission;
    type IntoIter = std::collections::hash_set::IntoIter<Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.permissions.into_iter()
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a Permission;
    type IntoIter = std::collections::hash_set::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.permissions.iter()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self {
            permissions: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_new() {
        let perm = Permission::new("users", "read");
        assert_eq!(perm.resource(), "users");
        assert_eq!(perm.action(), "read");
        assert!(!perm.has_wildcard());
    }

    #[test]
    fn test_permission_parse() {
        let perm = Permission::parse("users:delete").unwrap();
        assert_eq!(perm.resource(), "users");
        assert_eq!(perm.action(), "delete");

        assert!(Permission::parse("invalid").is_none());
        assert!(Permission::parse(":read").is_none());
    }

    #[test]
    fn test_permission_matches() {
        let all = Permission::wildcard();
        let users_all = Permission::resource_wildcard("users");
        let read_users = Permission::new("users", "read");
        let read_posts = Permission::new("posts", "read");

        assert!(all.matches(&read_users));
        assert!(users_all.matches(&read_users));
        assert!(!users_all.matches(&read_posts));
        assert!(read_users.matches(&read_users));
        assert!(!read_users.matches(&users_all));
    }

    #[test]
    fn test_grant_display() {
        let plain = Grant::new(Permission::new("users", "read"));
        assert_eq!(plain.to_string(), "users:read");

        let scoped = Grant::scoped(Permission::new("users", "read"), 104);
        assert_eq!(scoped.to_string(), "users:read@104");
    }

    #[test]
    fn test_grant_equality_includes_scope() {
        let plain = Grant::new(Permission::new("users", "read"));
        let scoped = Grant::scoped(Permission::new("users", "read"), 104);
        assert_ne!(plain, scoped);
    }

    #[test]
    fn test_permission_set_basics() {
        let mut set = PermissionSet::new();
        set.add(Permission::new("users", "read"));
        set.add(Permission::new("users", "write"));

        assert!(set.contains(&Permission::new("users", "read")));
        assert!(!set.contains(&Permission::new("users", "delete")));
        assert_eq!(set.len(), 2);

        set.remove(&Permission::new("users", "write"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_permission_set_wildcard_contains() {
        let mut set = PermissionSet::new();
        set.add(Permission::resource_wildcard("users"));

        assert!(set.contains(&Permission::new("users", "read")));
        assert!(set.contains(&Permission::new("users", "delete")));
        assert!(!set.contains(&Permission::new("posts", "read")));
    }

    #[test]
    fn test_permission_set_merge() {
        let mut set1 = PermissionSet::new();
        set1.add(Permission::new("users", "read"));

        let mut set2 = PermissionSet::new();
        set2.add(Permission::new("users", "read"));
        set2.add(Permission::new("posts", "read"));

        set1.merge(&set2);
        assert_eq!(set1.len(), 2);
    }

    #[test]
    fn test_restrict_to() {
        let full: PermissionSet = [
            Permission::new("users", "read"),
            Permission::new("users", "write"),
            Permission::new("posts", "read"),
        ]
        .into_iter()
        .collect();

        let mut allow = PermissionSet::new();
        allow.add(Permission::new("users", "read"));

        let restricted = full.restrict_to(&allow);
        assert_eq!(restricted.len(), 1);
        assert!(restricted.contains(&Permission::new("users", "read")));
    }

    #[test]
    fn test_restrict_to_wildcard_allow() {
        let full: PermissionSet = [
            Permission::new("users", "read"),
            Permission::new("users", "write"),
            Permission::new("posts", "read"),
        ]
        .into_iter()
        .collect();

        let mut allow = PermissionSet::new();
        allow.add(Permission::resource_wildcard("users"));

        let restricted = full.restrict_to(&allow);
        assert_eq!(restricted.len(), 2);
        assert!(!restricted.contains(&Permission::new("posts", "read")));
    }
}
