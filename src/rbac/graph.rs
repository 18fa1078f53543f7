//! 角色图模块
//!
//! 维护角色之间的继承关系并解析有效权限。所有改变授权状态的操作
//! （授权整体替换、继承关系变更）都在这里完成校验、写入审计条目并
//! 同步失效受影响角色的有效权限缓存。

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::audit::{ActorContext, AuditEntry, AuditTrail, InMemoryAuditTrail};
use crate::cycle;
use crate::error::{ConsistencyError, CycleError, Result, ValidationError};
use crate::tree::{InMemoryNodeStore, NodeId, NodeStore, TreeManager};

use super::permission::{Grant, Permission, PermissionSet};
use super::role::{InMemoryRoleStore, InheritanceMode, Role, RoleStore};

// ============================================================================
// MenuLookup Trait
// ============================================================================

/// 菜单查询 trait
///
/// 授权校验时用于确认限定菜单存在且未停用。任何节点存储以及树管理器
/// 都可以直接作为查询方。
pub trait MenuLookup {
    /// 菜单是否存在且处于正常状态
    fn menu_active(&self, menu_id: NodeId) -> bool;
}

impl MenuLookup for InMemoryNodeStore {
    fn menu_active(&self, menu_id: NodeId) -> bool {
        self.get(menu_id).map(|n| n.is_active()).unwrap_or(false)
    }
}

impl<S: NodeStore> MenuLookup for TreeManager<S> {
    fn menu_active(&self, menu_id: NodeId) -> bool {
        self.store().get(menu_id).map(|n| n.is_active()).unwrap_or(false)
    }
}

/// 放行所有菜单的查询方
///
/// 用于没有菜单树的场景（纯权限标识授权）或测试环境。
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllMenus;

impl MenuLookup for AllowAllMenus {
    fn menu_active(&self, _menu_id: NodeId) -> bool {
        true
    }
}

// ============================================================================
// GrantDiff
// ============================================================================

/// 授权整体替换产生的差集
///
/// `added`/`removed` 按显示形式排序，保证审计条目顺序稳定。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantDiff {
    /// 新增的授权
    pub added: Vec<Grant>,
    /// 被回收的授权
    pub removed: Vec<Grant>,
}

impl GrantDiff {
    /// 是否没有任何变更
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

// ============================================================================
// RoleGraph
// ============================================================================

/// 角色图
///
/// 持有角色存储、审计存储与按角色 ID 键控的有效权限缓存。
/// 缓存是显式组件：每个变更操作在返回前同步失效被变更角色及其
/// 全部传递依赖方的缓存条目。
///
/// # 示例
///
/// ```rust
/// use permrs::audit::ActorContext;
/// use permrs::rbac::{AllowAllMenus, Grant, Permission, RoleBuilder, RoleGraph};
///
/// let mut graph = RoleGraph::new();
/// let actor = ActorContext::system();
///
/// graph.add_role(RoleBuilder::new("r_viewer", "viewer").build()).unwrap();
/// graph.add_role(RoleBuilder::new("r_editor", "editor").inherit("r_viewer").build()).unwrap();
///
/// let grants = [Grant::new(Permission::new("posts", "read"))].into_iter().collect();
/// graph.update_grants("r_viewer", grants, &AllowAllMenus, &actor).unwrap();
///
/// let effective = graph.resolve_effective_permissions("r_editor").unwrap();
/// assert!(effective.contains(&Permission::new("posts", "read")));
/// ```
pub struct RoleGraph<S: RoleStore = InMemoryRoleStore, A: AuditTrail = InMemoryAuditTrail> {
    store: S,
    audit: A,
    cache: RwLock<HashMap<String, PermissionSet>>,
}

impl RoleGraph<InMemoryRoleStore, InMemoryAuditTrail> {
    /// 创建使用内存存储的角色图
    pub fn new() -> Self {
        Self::with_store(InMemoryRoleStore::new(), InMemoryAuditTrail::new())
    }
}

impl Default for RoleGraph<InMemoryRoleStore, InMemoryAuditTrail> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: RoleStore, A: AuditTrail> RoleGraph<S, A> {
    /// 基于外部存储创建角色图
    pub fn with_store(store: S, audit: A) -> Self {
        Self {
            store,
            audit,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// 获取角色存储的只读引用
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 获取审计存储的引用
    pub fn audit(&self) -> &A {
        &self.audit
    }

    // ========================================================================
    // 角色管理
    // ========================================================================

    /// 添加角色
    ///
    /// 角色 ID 与编码都必须唯一。创建时携带的继承角色必须已存在；
    /// 新角色尚不被任何角色继承，因此除自继承外不可能在此处形成环，
    /// 后续变更经 [`update_inheritance`](Self::update_inheritance) 做
    /// 完整的环校验。
    pub fn add_role(&mut self, role: Role) -> Result<()> {
        if self.store.exists(&role.id) {
            return Err(ValidationError::DuplicateRole(role.id.clone()).into());
        }
        if self.store.list().iter().any(|r| r.code() == role.code()) {
            return Err(ValidationError::DuplicateRole(role.code().to_string()).into());
        }
        if role.inherits_from(&role.id) {
            return Err(ValidationError::SelfInheritance(role.id.clone()).into());
        }
        for parent_id in role.inherits() {
            if !self.store.exists(parent_id) {
                return Err(ValidationError::RoleNotFound(parent_id.clone()).into());
            }
        }
        self.store.save(role);
        Ok(())
    }

    /// 获取角色
    pub fn get_role(&self, id: &str) -> Option<&Role> {
        self.store.get(id)
    }

    /// 列出所有角色
    pub fn list_roles(&self) -> Vec<&Role> {
        self.store.list()
    }

    /// 获取角色数量
    pub fn role_count(&self) -> usize {
        self.store.list().len()
    }

    /// 删除角色
    ///
    /// 仍被其他角色继承的角色不能删除。
    pub fn remove_role(&mut self, id: &str) -> Result<Role> {
        if !self.store.exists(id) {
            return Err(ValidationError::RoleNotFound(id.to_string()).into());
        }
        if let Some(dependent) = self.store.list().iter().find(|r| r.inherits_from(id)) {
            return Err(ValidationError::RoleInUse {
                role_id: id.to_string(),
                inherited_by: dependent.id.clone(),
            }
            .into());
        }
        self.invalidate(id);
        self.store
            .delete(id)
            .ok_or_else(|| ValidationError::RoleNotFound(id.to_string()).into())
    }

    // ========================================================================
    // 有效权限解析
    // ========================================================================

    /// 解析角色的有效权限集合
    ///
    /// 从直接授权出发，沿继承图递归合并被继承角色的有效权限：
    /// 完全继承合并全部，部分继承只合并允许清单内的部分（直接授权
    /// 永远不被允许清单过滤）。同一次解析内按角色记忆化，菱形继承
    /// 不会被重复展开。
    ///
    /// 操作是幂等的只读计算，成功的结果按角色 ID 缓存。
    ///
    /// # Errors
    ///
    /// - 角色不存在 → [`ValidationError::RoleNotFound`]
    /// - 解析途中遇到环（守卫之外的损坏数据）→
    ///   [`ConsistencyError::ResolutionCycle`]，缓存不会被写入
    /// - 继承的角色在存储中缺失 → [`ConsistencyError::MissingInheritedRole`]
    pub fn resolve_effective_permissions(&self, role_id: &str) -> Result<PermissionSet> {
        if !self.store.exists(role_id) {
            return Err(ValidationError::RoleNotFound(role_id.to_string()).into());
        }

        if let Some(cached) = self.cache.read().unwrap().get(role_id) {
            return Ok(cached.clone());
        }

        let mut resolved: HashMap<String, PermissionSet> = HashMap::new();
        let mut in_progress: HashSet<String> = HashSet::new();
        let result = self.resolve_into(role_id, &mut resolved, &mut in_progress)?;

        // 只有整体解析成功才写缓存；一致性错误的中间结果全部丢弃
        let mut cache = self.cache.write().unwrap();
        for (id, set) in resolved {
            cache.insert(id, set);
        }
        Ok(result)
    }

    fn resolve_into(
        &self,
        role_id: &str,
        resolved: &mut HashMap<String, PermissionSet>,
        in_progress: &mut HashSet<String>,
    ) -> Result<PermissionSet> {
        if let Some(done) = resolved.get(role_id) {
            return Ok(done.clone());
        }
        if let Some(cached) = self.cache.read().unwrap().get(role_id) {
            return Ok(cached.clone());
        }
        if !in_progress.insert(role_id.to_string()) {
            // 守卫保证不会走到这里；走到即说明存储中的继承图已损坏
            return Err(ConsistencyError::ResolutionCycle(role_id.to_string()).into());
        }

        let mut result = PermissionSet::new();
        if let Some(role) = self.store.get(role_id) {
            // 停用的角色不贡献任何权限，包括它继承来的部分
            if role.is_enabled() {
                result.merge(&role.direct_permissions());

                for parent_id in role.inherits() {
                    if !self.store.exists(parent_id) {
                        return Err(ConsistencyError::MissingInheritedRole {
                            role_id: role_id.to_string(),
                            missing: parent_id.clone(),
                        }
                        .into());
                    }
                    let parent_set = self.resolve_into(parent_id, resolved, in_progress)?;
                    match role.mode() {
                        InheritanceMode::Full => result.merge(&parent_set),
                        InheritanceMode::Partial => {
                            result.merge(&parent_set.restrict_to(role.allow_list()))
                        }
                    }
                }
            }
        }

        in_progress.remove(role_id);
        resolved.insert(role_id.to_string(), result.clone());
        Ok(result)
    }

    /// 检查角色（含继承）是否拥有指定权限
    pub fn role_has_permission(&self, role_id: &str, permission: &Permission) -> Result<bool> {
        Ok(self
            .resolve_effective_permissions(role_id)?
            .contains(permission))
    }

    /// 获取用户（多角色并集）的全部有效权限
    pub fn user_effective_permissions(&self, role_ids: &[&str]) -> Result<PermissionSet> {
        let mut permissions = PermissionSet::new();
        for role_id in role_ids {
            permissions.merge(&self.resolve_effective_permissions(role_id)?);
        }
        Ok(permissions)
    }

    /// 检查用户（多角色）是否拥有指定权限
    pub fn user_has_permission(&self, role_ids: &[&str], permission: &Permission) -> Result<bool> {
        for role_id in role_ids {
            if self.role_has_permission(role_id, permission)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ========================================================================
    // 授权变更
    // ========================================================================

    /// 整体替换角色的直接授权
    ///
    /// 以差集方式比较新旧授权：每条新增授权写一条授予条目、每条被
    /// 回收的授权写一条回收条目。差集为空时是 no-op，不产生审计。
    /// 提交后同步失效本角色与全部传递依赖方的缓存。
    ///
    /// # Errors
    ///
    /// - 角色不存在 → [`ValidationError::RoleNotFound`]
    /// - 权限标识为空 → [`ValidationError::EmptyField`]
    /// - 限定菜单不存在或已停用 → [`ValidationError::PermissionTargetNotFound`]
    pub fn update_grants(
        &mut self,
        role_id: &str,
        new_grants: HashSet<Grant>,
        menus: &impl MenuLookup,
        actor: &ActorContext,
    ) -> Result<GrantDiff> {
        let role = self
            .store
            .get(role_id)
            .ok_or_else(|| ValidationError::RoleNotFound(role_id.to_string()))?;

        for grant in &new_grants {
            if grant.permission.resource().is_empty() || grant.permission.action().is_empty() {
                return Err(ValidationError::EmptyField("permission".to_string()).into());
            }
            if let Some(menu_id) = grant.menu_id {
                if !menus.menu_active(menu_id) {
                    return Err(ValidationError::PermissionTargetNotFound { menu_id }.into());
                }
            }
        }

        let old_grants = role.grants().clone();
        let mut added: Vec<Grant> = new_grants.difference(&old_grants).cloned().collect();
        let mut removed: Vec<Grant> = old_grants.difference(&new_grants).cloned().collect();
        added.sort_by_key(|g| g.to_string());
        removed.sort_by_key(|g| g.to_string());

        let diff = GrantDiff { added, removed };
        if diff.is_empty() {
            return Ok(diff);
        }

        self.store
            .get_mut(role_id)
            .ok_or_else(|| ValidationError::RoleNotFound(role_id.to_string()))?
            .replace_grants(new_grants);

        // 每条变更恰好一条审计条目，与存储变更处于同一逻辑事务
        for grant in &diff.added {
            self.audit
                .append(AuditEntry::grant(role_id, grant.to_string(), actor))?;
        }
        for grant in &diff.removed {
            self.audit
                .append(AuditEntry::revoke(role_id, grant.to_string(), actor))?;
        }

        self.invalidate(role_id);
        Ok(diff)
    }

    /// 更新角色的继承关系
    ///
    /// 校验所有被继承角色存在、没有自继承，且任何新继承目标都不能
    /// 沿继承图传递回到本角色。成功后写一条继承变更审计条目并同步
    /// 失效缓存。
    ///
    /// # Errors
    ///
    /// - 角色或被继承角色不存在 → [`ValidationError::RoleNotFound`]
    /// - 自继承 → [`ValidationError::SelfInheritance`]
    /// - 会形成继承环 → [`CycleError::Inheritance`]
    pub fn update_inheritance(
        &mut self,
        role_id: &str,
        new_parents: HashSet<String>,
        mode: InheritanceMode,
        allow_list: PermissionSet,
        actor: &ActorContext,
    ) -> Result<()> {
        if !self.store.exists(role_id) {
            return Err(ValidationError::RoleNotFound(role_id.to_string()).into());
        }
        if new_parents.contains(role_id) {
            return Err(ValidationError::SelfInheritance(role_id.to_string()).into());
        }
        for parent_id in &new_parents {
            if !self.store.exists(parent_id) {
                return Err(ValidationError::RoleNotFound(parent_id.clone()).into());
            }
        }

        // 环检测：沿当前继承图检查每个新继承目标能否传递回到本角色
        {
            let store = &self.store;
            let target = role_id.to_string();
            let edges = |id: &String| -> Vec<String> {
                store
                    .get(id)
                    .map(|r| r.inherits().iter().cloned().collect())
                    .unwrap_or_default()
            };
            for parent_id in &new_parents {
                if cycle::would_create_cycle(parent_id, &target, &edges) {
                    return Err(CycleError::Inheritance {
                        role_id: role_id.to_string(),
                        via: parent_id.clone(),
                    }
                    .into());
                }
            }
        }

        let mut parent_list: Vec<&str> = new_parents.iter().map(|s| s.as_str()).collect();
        parent_list.sort_unstable();
        let mode_name = match mode {
            InheritanceMode::Full => "full",
            InheritanceMode::Partial => "partial",
        };
        let note = format!("inherits: [{}] mode: {}", parent_list.join(", "), mode_name);

        self.store
            .get_mut(role_id)
            .ok_or_else(|| ValidationError::RoleNotFound(role_id.to_string()))?
            .replace_inheritance(new_parents, mode, allow_list);

        self.audit
            .append(AuditEntry::inheritance_change(role_id, actor).with_note(note))?;

        self.invalidate(role_id);
        Ok(())
    }

    // ========================================================================
    // 缓存
    // ========================================================================

    /// 同步失效角色及其全部传递依赖方的缓存条目
    pub fn invalidate(&self, role_id: &str) {
        let mut affected = self.dependents_of(role_id);
        affected.insert(role_id.to_string());

        let mut cache = self.cache.write().unwrap();
        for id in &affected {
            cache.remove(id);
        }
    }

    /// 直接或传递继承指定角色的所有角色
    ///
    /// 通过对存储的反向扫描求传递闭包，不维护单独的闭包表。
    pub fn dependents_of(&self, role_id: &str) -> HashSet<String> {
        let mut reverse: HashMap<&str, Vec<&str>> = HashMap::new();
        for role in self.store.list() {
            for parent_id in role.inherits() {
                reverse.entry(parent_id.as_str()).or_default().push(role.id());
            }
        }

        let mut result = HashSet::new();
        let mut stack = vec![role_id];
        while let Some(current) = stack.pop() {
            if let Some(children) = reverse.get(current) {
                for &child in children {
                    if result.insert(child.to_string()) {
                        stack.push(child);
                    }
                }
            }
        }
        result
    }

    /// 角色的有效权限当前是否有缓存
    pub fn is_cached(&self, role_id: &str) -> bool {
        self.cache.read().unwrap().contains_key(role_id)
    }

    /// 缓存条目数量
    pub fn cache_len(&self) -> usize {
        self.cache.read().unwrap().len()
    }
}
