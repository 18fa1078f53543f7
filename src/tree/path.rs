//! 祖先路径模块
//!
//! 提供物化路径（materialized path）的内存表示。路径在内存中是有序的
//! 祖先 ID 列表（从根到直接父节点），只有在进出存储层时才与逗号分隔的
//! 字符串互相转换，避免 ID 与分隔符混排带来的转义问题。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 层级节点的唯一标识
pub type NodeId = i64;

/// 根哨兵：`parent_id` 为该值的节点是根节点
pub const ROOT_ID: NodeId = 0;

/// 祖先路径
///
/// 从根到直接父节点的有序祖先 ID 列表。根节点的路径为空。
///
/// 持久化形态是逗号分隔的 ID 字符串（如 `"100,101"`），序列化/反序列化
/// 即是存储边界上的转换。
///
/// ## 示例
///
/// ```rust
/// use permrs::tree::AncestorPath;
///
/// let path: AncestorPath = "100,101".parse().unwrap();
/// assert_eq!(path.ids(), &[100, 101]);
/// assert_eq!(path.parent_id(), Some(101));
/// assert_eq!(path.to_string(), "100,101");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct AncestorPath {
    ids: Vec<NodeId>,
}

impl AncestorPath {
    /// 创建空路径（根节点）
    pub fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// 从 ID 列表创建路径
    pub fn from_ids(ids: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// 由父节点的路径派生子节点的路径
    ///
    /// 子节点路径恒等于父节点路径追加父节点自身的 ID。
    ///
    /// # 示例
    ///
    /// ```rust
    /// use permrs::tree::AncestorPath;
    ///
    /// let parent = AncestorPath::from_ids([100]);
    /// let child = AncestorPath::child_of(&parent, 101);
    /// assert_eq!(child.ids(), &[100, 101]);
    /// ```
    pub fn child_of(parent_path: &AncestorPath, parent_id: NodeId) -> Self {
        let mut ids = parent_path.ids.clone();
        ids.push(parent_id);
        Self { ids }
    }

    /// 获取路径中的祖先 ID 切片
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// 路径长度（即节点深度）
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// 是否为空路径（根节点）
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// 路径中是否包含指定祖先
    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    /// 直接父节点的 ID（路径最后一个元素）
    pub fn parent_id(&self) -> Option<NodeId> {
        self.ids.last().copied()
    }

    /// 是否以指定路径为前缀
    pub fn starts_with(&self, prefix: &AncestorPath) -> bool {
        self.ids.starts_with(&prefix.ids)
    }

    /// 以 `pivot` 为支点重写路径前缀
    ///
    /// 将路径中 `pivot` 及其之前的前缀整体替换为
    /// `new_pivot_path + [pivot]`，`pivot` 之后的后缀保持不变。
    /// 路径中不含 `pivot` 时返回 `None`。
    ///
    /// 这是节点换父时级联更新后代路径的核心操作。
    pub fn rebase(&self, pivot: NodeId, new_pivot_path: &AncestorPath) -> Option<AncestorPath> {
        let pos = self.ids.iter().position(|&id| id == pivot)?;
        let mut ids = new_pivot_path.ids.clone();
        ids.push(pivot);
        ids.extend_from_slice(&self.ids[pos + 1..]);
        Some(Self { ids })
    }

    /// 迭代路径中的祖先 ID
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids.iter().copied()
    }
}

// ============================================================================
// 存储边界转换：逗号分隔字符串
// ============================================================================

impl fmt::Display for AncestorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{}", joined)
    }
}

impl FromStr for AncestorPath {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::new());
        }
        let ids = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<NodeId>()
                    .map_err(|_| format!("invalid ancestor id '{}'", part))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { ids })
    }
}

impl From<AncestorPath> for String {
    fn from(path: AncestorPath) -> Self {
        path.to_string()
    }
}

impl TryFrom<String> for AncestorPath {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}
