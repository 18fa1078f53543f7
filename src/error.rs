//! 统一错误类型模块
//!
//! 提供 permrs 库中所有操作的错误类型定义。
//!
//! 错误按可恢复性分组：
//!
//! - [`ValidationError`]: 输入引用了不存在的节点/角色、自引用等，调用方修正输入后可重试
//! - [`CycleError`]: 结构树或继承图中检测到环，提交前被拒绝
//! - [`ConflictError`]: 并发结构变更冲突，调用方应基于最新状态重试整个操作
//! - [`ConsistencyError`]: 数据已损坏（守卫之外发现环、路径前缀断裂），请求内不可恢复
//! - [`StorageError`]: 底层存储不可用，属于瞬态 I/O 故障而非领域错误

use std::fmt;

use crate::tree::NodeId;

/// permrs 库的统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// permrs 库的错误类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// 校验错误（引用缺失、自引用、重复等）
    Validation(ValidationError),

    /// 环检测错误（结构树或继承图）
    Cycle(CycleError),

    /// 并发冲突错误
    Conflict(ConflictError),

    /// 一致性错误（数据损坏，请求内不可恢复）
    Consistency(ConsistencyError),

    /// 存储错误（瞬态 I/O 故障）
    Storage(StorageError),

    /// 内部错误
    Internal(String),
}

impl Error {
    /// 创建一个内部错误
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// 创建一个自定义校验错误
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(ValidationError::Custom(msg.into()))
    }

    /// 是否属于调用方修正输入或重试即可恢复的错误
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Cycle(_) | Error::Conflict(_)
        )
    }
}

/// 校验相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 节点不存在
    NodeNotFound(NodeId),
    /// 父节点不存在
    ParentNotFound(NodeId),
    /// 节点仍有后代，不能删除
    HasDescendants(NodeId),
    /// 角色不存在
    RoleNotFound(String),
    /// 角色 ID 或编码重复
    DuplicateRole(String),
    /// 角色不能继承自身
    SelfInheritance(String),
    /// 角色仍被其他角色继承，不能删除
    RoleInUse {
        /// 被删除的角色
        role_id: String,
        /// 仍在继承它的角色
        inherited_by: String,
    },
    /// 授权指向的菜单不存在或已停用
    PermissionTargetNotFound {
        /// 授权引用的菜单节点
        menu_id: NodeId,
    },
    /// 字段为空
    EmptyField(String),
    /// 自定义校验错误
    Custom(String),
}

/// 环检测相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    /// 将节点挂到自身或其后代之下会形成环
    Structural {
        /// 被移动的节点
        node_id: NodeId,
        /// 目标父节点
        new_parent_id: NodeId,
    },
    /// 新增继承关系会在角色继承图中形成环
    Inheritance {
        /// 被更新的角色
        role_id: String,
        /// 引入环的继承目标
        via: String,
    },
}

/// 并发冲突相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictError {
    /// 级联写入前发现子树被并发修改，整个操作被放弃
    ConcurrentStructuralChange {
        /// 冲突的节点
        node_id: NodeId,
    },
}

/// 一致性相关错误
///
/// 这一类错误意味着存储中的数据已经损坏，必须向外暴露而不是吞掉，
/// 且对应的缓存条目不得写入。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    /// 解析有效权限时遇到环（守卫之外的防御性检测）
    ResolutionCycle(String),
    /// 解析过程中继承的角色在存储中缺失
    MissingInheritedRole {
        /// 发起继承的角色
        role_id: String,
        /// 缺失的角色
        missing: String,
    },
    /// 节点的祖先路径与其父节点不构成前缀扩展关系
    BrokenAncestorPath {
        /// 路径损坏的节点
        node_id: NodeId,
    },
}

/// 存储相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// 存储不可用
    Unavailable(String),
    /// 操作失败
    OperationFailed(String),
}

// ============================================================================
// Display 实现
// ============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::Cycle(e) => write!(f, "Cycle error: {}", e),
            Error::Conflict(e) => write!(f, "Conflict error: {}", e),
            Error::Consistency(e) => write!(f, "Consistency error: {}", e),
            Error::Storage(e) => write!(f, "Storage error: {}", e),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NodeNotFound(id) => write!(f, "node {} not found", id),
            ValidationError::ParentNotFound(id) => write!(f, "parent node {} not found", id),
            ValidationError::HasDescendants(id) => {
                write!(f, "node {} still has descendants", id)
            }
            ValidationError::RoleNotFound(id) => write!(f, "role '{}' not found", id),
            ValidationError::DuplicateRole(id) => write!(f, "duplicate role '{}'", id),
            ValidationError::SelfInheritance(id) => {
                write!(f, "role '{}' cannot inherit itself", id)
            }
            ValidationError::RoleInUse {
                role_id,
                inherited_by,
            } => {
                write!(
                    f,
                    "role '{}' is still inherited by '{}'",
                    role_id, inherited_by
                )
            }
            ValidationError::PermissionTargetNotFound { menu_id } => {
                write!(f, "grant target menu {} not found or disabled", menu_id)
            }
            ValidationError::EmptyField(field) => {
                write!(f, "field '{}' cannot be empty", field)
            }
            ValidationError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::Structural {
                node_id,
                new_parent_id,
            } => {
                write!(
                    f,
                    "moving node {} under {} would create a cycle",
                    node_id, new_parent_id
                )
            }
            CycleError::Inheritance { role_id, via } => {
                write!(
                    f,
                    "inheriting '{}' would create a cycle back to '{}'",
                    via, role_id
                )
            }
        }
    }
}

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictError::ConcurrentStructuralChange { node_id } => {
                write!(
                    f,
                    "subtree of node {} changed concurrently, retry the operation",
                    node_id
                )
            }
        }
    }
}

impl fmt::Display for ConsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyError::ResolutionCycle(id) => {
                write!(f, "cycle reached role '{}' during resolution", id)
            }
            ConsistencyError::MissingInheritedRole { role_id, missing } => {
                write!(
                    f,
                    "role '{}' inherits '{}' which is missing from the store",
                    role_id, missing
                )
            }
            ConsistencyError::BrokenAncestorPath { node_id } => {
                write!(
                    f,
                    "ancestor path of node {} does not match its parent",
                    node_id
                )
            }
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable(msg) => write!(f, "storage unavailable: {}", msg),
            StorageError::OperationFailed(msg) => {
                write!(f, "storage operation failed: {}", msg)
            }
        }
    }
}

// ============================================================================
// std::error::Error 实现
// ============================================================================

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl std::error::Error for ValidationError {}
impl std::error::Error for CycleError {}
impl std::error::Error for ConflictError {}
impl std::error::Error for ConsistencyError {}
impl std::error::Error for StorageError {}

// ============================================================================
// From 实现 - 方便错误转换
// ============================================================================

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

impl From<CycleError> for Error {
    fn from(err: CycleError) -> Self {
        Error::Cycle(err)
    }
}

impl From<ConflictError> for Error {
    fn from(err: ConflictError) -> Self {
        Error::Conflict(err)
    }
}

impl From<ConsistencyError> for Error {
    fn from(err: ConsistencyError) -> Self {
        Error::Consistency(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Error::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Validation(ValidationError::RoleNotFound("editor".to_string()));
        assert_eq!(err.to_string(), "Validation error: role 'editor' not found");
    }

    #[test]
    fn test_cycle_error_display() {
        let err = CycleError::Structural {
            node_id: 3,
            new_parent_id: 7,
        };
        assert_eq!(err.to_string(), "moving node 3 under 7 would create a cycle");
    }

    #[test]
    fn test_error_from_validation() {
        let err: Error = ValidationError::NodeNotFound(42).into();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_consistency_not_recoverable() {
        let err: Error = ConsistencyError::ResolutionCycle("admin".to_string()).into();
        assert!(!err.is_recoverable());

        let storage: Error = StorageError::Unavailable("connection reset".to_string()).into();
        assert!(!storage.is_recoverable());
    }

    #[test]
    fn test_conflict_error_display() {
        let err = Error::Conflict(ConflictError::ConcurrentStructuralChange { node_id: 9 });
        assert_eq!(
            err.to_string(),
            "Conflict error: subtree of node 9 changed concurrently, retry the operation"
        );
    }
}
