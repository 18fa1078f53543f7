//! 审计追踪模块
//!
//! 提供权限变更的不可变审计记录，包括：
//!
//! - **审计条目**: 授权、回收、继承变更三类记录
//! - **操作者上下文**: 由调用方提供的操作者与来源 IP
//! - **审计存储 Trait**: 追加与查询接口，本组件不存在更新或删除操作
//! - **内存实现**: 用于测试和开发的简单实现
//!
//! 每次改变角色授权状态的变更都必须在同一逻辑事务内写入恰好一条
//! 审计条目；条目一经追加，应用层永不修改或删除。
//!
//! ## 使用示例
//!
//! ### 基本用法
//!
//! ```rust
//! use permrs::audit::{ActorContext, AuditEntry, AuditFilter, AuditTrail, InMemoryAuditTrail};
//!
//! let trail = InMemoryAuditTrail::new();
//! let actor = ActorContext::new("u_1", "admin", "192.168.1.1");
//!
//! trail.append(AuditEntry::grant("editor", "posts:read", &actor)).unwrap();
//! trail.append(AuditEntry::revoke("editor", "posts:delete", &actor)).unwrap();
//!
//! let entries = trail.query(&AuditFilter::new().role("editor")).unwrap();
//! assert_eq!(entries.len(), 2);
//! ```
//!
//! ### 过滤查询
//!
//! ```rust
//! use permrs::audit::{ActorContext, AuditEntry, AuditFilter, AuditTrail, AuditType, InMemoryAuditTrail};
//!
//! let trail = InMemoryAuditTrail::new();
//! let actor = ActorContext::new("u_1", "admin", "10.0.0.1");
//!
//! trail.append(AuditEntry::grant("editor", "posts:read", &actor)).unwrap();
//! trail.append(AuditEntry::inheritance_change("editor", &actor)).unwrap();
//!
//! let changes = trail
//!     .query(&AuditFilter::new().audit_type(AuditType::InheritanceChange))
//!     .unwrap();
//! assert_eq!(changes.len(), 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::random::generate_random_hex;

/// 审计条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditType {
    /// 授予权限
    Grant,
    /// 回收权限
    Revoke,
    /// 继承关系变更
    InheritanceChange,
}

impl std::fmt::Display for AuditType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditType::Grant => write!(f, "grant"),
            AuditType::Revoke => write!(f, "revoke"),
            AuditType::InheritanceChange => write!(f, "inheritance_change"),
        }
    }
}

/// 操作者上下文
///
/// 审计条目的操作者信息由调用方提供，本库不做任何解析。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    /// 操作者 ID
    pub operator_id: String,
    /// 操作者名称
    pub operator_name: String,
    /// 来源 IP 地址
    pub ip_address: String,
}

impl ActorContext {
    /// 创建操作者上下文
    pub fn new(
        operator_id: impl Into<String>,
        operator_name: impl Into<String>,
        ip_address: impl Into<String>,
    ) -> Self {
        Self {
            operator_id: operator_id.into(),
            operator_name: operator_name.into(),
            ip_address: ip_address.into(),
        }
    }

    /// 系统内部操作使用的上下文
    pub fn system() -> Self {
        Self::new("system", "system", "127.0.0.1")
    }
}

/// 审计条目
///
/// 一条不可变的权限变更记录，追加后不再被修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// 条目 ID
    pub id: String,
    /// 被变更的角色
    pub role_id: String,
    /// 涉及的权限标识（继承变更没有单一权限）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    /// 条目类型
    pub audit_type: AuditType,
    /// 操作者 ID
    pub operator_id: String,
    /// 操作者名称
    pub operator_name: String,
    /// 来源 IP 地址
    pub ip_address: String,
    /// 备注
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// 记录时间
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    fn new(
        role_id: impl Into<String>,
        permission: Option<String>,
        audit_type: AuditType,
        actor: &ActorContext,
    ) -> Self {
        Self {
            id: generate_entry_id(),
            role_id: role_id.into(),
            permission,
            audit_type,
            operator_id: actor.operator_id.clone(),
            operator_name: actor.operator_name.clone(),
            ip_address: actor.ip_address.clone(),
            note: None,
            timestamp: Utc::now(),
        }
    }

    /// 创建授权条目
    pub fn grant(
        role_id: impl Into<String>,
        permission: impl Into<String>,
        actor: &ActorContext,
    ) -> Self {
        Self::new(role_id, Some(permission.into()), AuditType::Grant, actor)
    }

    /// 创建回收条目
    pub fn revoke(
        role_id: impl Into<String>,
        permission: impl Into<String>,
        actor: &ActorContext,
    ) -> Self {
        Self::new(role_id, Some(permission.into()), AuditType::Revoke, actor)
    }

    /// 创建继承变更条目
    pub fn inheritance_change(role_id: impl Into<String>, actor: &ActorContext) -> Self {
        Self::new(role_id, None, AuditType::InheritanceChange, actor)
    }

    /// 设置备注
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// 生成条目 ID
fn generate_entry_id() -> String {
    format!(
        "ent_{}",
        generate_random_hex(16).unwrap_or_else(|_| "unknown".to_string())
    )
}

// ============================================================================
// 查询过滤器
// ============================================================================

/// 审计查询过滤器
///
/// 所有条件为 AND 关系，未设置的条件不参与过滤。
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    role_id: Option<String>,
    audit_type: Option<AuditType>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
}

impl AuditFilter {
    /// 创建空过滤器（匹配所有条目）
    pub fn new() -> Self {
        Self::default()
    }

    /// 按角色过滤
    pub fn role(mut self, role_id: impl Into<String>) -> Self {
        self.role_id = Some(role_id.into());
        self
    }

    /// 按条目类型过滤
    pub fn audit_type(mut self, audit_type: AuditType) -> Self {
        self.audit_type = Some(audit_type);
        self
    }

    /// 过滤不早于指定时间的条目
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// 过滤不晚于指定时间的条目
    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// 判断条目是否匹配过滤器
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(role_id) = &self.role_id {
            if &entry.role_id != role_id {
                return false;
            }
        }
        if let Some(audit_type) = self.audit_type {
            if entry.audit_type != audit_type {
                return false;
            }
        }
        if let Some(since) = self.since {
            if entry.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if entry.timestamp > until {
                return false;
            }
        }
        true
    }
}

// ============================================================================
// AuditTrail Trait
// ============================================================================

/// 审计存储 trait
///
/// 只有追加与查询两个操作；更新和删除在设计上就不存在。
/// 追加失败只可能是底层存储不可用（瞬态 I/O 错误），不属于领域错误。
pub trait AuditTrail: Send + Sync {
    /// 追加一条审计条目
    fn append(&self, entry: AuditEntry) -> Result<()>;

    /// 按过滤器查询条目，按记录时间从新到旧排序
    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>>;
}

// ============================================================================
// InMemoryAuditTrail
// ============================================================================

/// 内存审计存储
///
/// 用于测试和开发环境，条目存储在内存中；`clone` 共享底层状态。
#[derive(Debug, Default)]
pub struct InMemoryAuditTrail {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl InMemoryAuditTrail {
    /// 创建新的内存审计存储
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// 获取条目数量
    pub fn entry_count(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// 获取最近 N 条条目（从新到旧）
    pub fn recent(&self, count: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read().unwrap();
        entries.iter().rev().take(count).cloned().collect()
    }

    /// 获取指定角色的全部条目（从新到旧）
    pub fn entries_for_role(&self, role_id: &str) -> Vec<AuditEntry> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .rev()
            .filter(|e| e.role_id == role_id)
            .cloned()
            .collect()
    }
}

impl AuditTrail for InMemoryAuditTrail {
    fn append(&self, entry: AuditEntry) -> Result<()> {
        self.entries.write().unwrap().push(entry);
        Ok(())
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }
}

impl Clone for InMemoryAuditTrail {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor() -> ActorContext {
        ActorContext::new("u_1", "admin", "192.168.1.1")
    }

    #[test]
    fn test_entry_creation() {
        let entry = AuditEntry::grant("editor", "posts:read", &actor());

        assert_eq!(entry.role_id, "editor");
        assert_eq!(entry.permission.as_deref(), Some("posts:read"));
        assert_eq!(entry.audit_type, AuditType::Grant);
        assert_eq!(entry.operator_name, "admin");
        assert_eq!(entry.ip_address, "192.168.1.1");
        assert!(entry.id.starts_with("ent_"));
    }

    #[test]
    fn test_inheritance_change_has_no_permission() {
        let entry = AuditEntry::inheritance_change("editor", &actor())
            .with_note("inherits: viewer (full)");

        assert_eq!(entry.permission, None);
        assert_eq!(entry.audit_type, AuditType::InheritanceChange);
        assert_eq!(entry.note.as_deref(), Some("inherits: viewer (full)"));
    }

    #[test]
    fn test_append_and_query() {
        let trail = InMemoryAuditTrail::new();

        trail.append(AuditEntry::grant("editor", "posts:read", &actor())).unwrap();
        trail.append(AuditEntry::revoke("editor", "posts:write", &actor())).unwrap();
        trail.append(AuditEntry::grant("viewer", "posts:read", &actor())).unwrap();

        assert_eq!(trail.entry_count(), 3);

        let editor = trail.query(&AuditFilter::new().role("editor")).unwrap();
        assert_eq!(editor.len(), 2);

        let grants = trail
            .query(&AuditFilter::new().audit_type(AuditType::Grant))
            .unwrap();
        assert_eq!(grants.len(), 2);
    }

    #[test]
    fn test_query_newest_first() {
        let trail = InMemoryAuditTrail::new();

        trail.append(AuditEntry::grant("editor", "first", &actor())).unwrap();
        trail.append(AuditEntry::grant("editor", "second", &actor())).unwrap();

        let entries = trail.query(&AuditFilter::new()).unwrap();
        assert_eq!(entries[0].permission.as_deref(), Some("second"));
        assert_eq!(entries[1].permission.as_deref(), Some("first"));
    }

    #[test]
    fn test_time_range_filter() {
        let trail = InMemoryAuditTrail::new();

        trail.append(AuditEntry::grant("editor", "posts:read", &actor())).unwrap();
        let cutoff = Utc::now();

        let before = trail.query(&AuditFilter::new().until(cutoff)).unwrap();
        assert_eq!(before.len(), 1);

        let after = trail
            .query(&AuditFilter::new().since(cutoff + chrono::Duration::seconds(1)))
            .unwrap();
        assert!(after.is_empty());
    }

    #[test]
    fn test_clone_shares_state() {
        let trail1 = InMemoryAuditTrail::new();
        let trail2 = trail1.clone();

        trail1.append(AuditEntry::grant("editor", "posts:read", &actor())).unwrap();

        // 两个句柄共享同一份条目
        assert_eq!(trail2.entry_count(), 1);
    }

    #[test]
    fn test_entry_serialization() {
        let entry = AuditEntry::grant("editor", "posts:read", &actor()).with_note("批量调整");

        let json = serde_json::to_string(&entry).unwrap();
        let back: AuditEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(back, entry);
    }
}
