//! 环检测模块
//!
//! 提供结构树与角色继承图共用的可达性检查：判断把 `moving` 挂到
//! `candidate_parent` 之下（或让角色继承另一角色）是否会让某个节点成为
//! 自己的祖先。
//!
//! 两类使用方传入不同的邻接展开：
//!
//! - 结构树直接展开目标父节点的物化祖先路径，一次展开即覆盖全部祖先；
//! - 角色继承图展开每个角色的直接继承列表，由 DFS 完成传递闭包。
//!
//! ## 使用示例
//!
//! ```rust
//! use permrs::cycle::would_create_cycle;
//!
//! // b 继承 a；把 a 改为继承 b 会形成环
//! let edges = |id: &&str| match *id {
//!     "b" => vec!["a"],
//!     _ => vec![],
//! };
//! assert!(would_create_cycle(&"b", &"a", edges));
//! assert!(!would_create_cycle(&"a", &"b", edges));
//! ```

use std::collections::HashSet;
use std::hash::Hash;

/// 判断从 `from` 出发沿邻接关系能否到达 `target`
///
/// 迭代式深度优先搜索，带 visited 集合：工作量被限制在
/// O(节点数 + 边数)，菱形结构（到同一祖先的多条路径）不会被重复访问。
pub fn is_reachable<I, F, N>(from: &I, target: &I, neighbors: F) -> bool
where
    I: Eq + Hash + Clone,
    F: Fn(&I) -> N,
    N: IntoIterator<Item = I>,
{
    let mut visited: HashSet<I> = HashSet::new();
    let mut stack = vec![from.clone()];

    while let Some(current) = stack.pop() {
        if &current == target {
            return true;
        }
        if !visited.insert(current.clone()) {
            continue;
        }
        for next in neighbors(&current) {
            if !visited.contains(&next) {
                stack.push(next);
            }
        }
    }

    false
}

/// 判断把 `moving` 挂到 `candidate_parent` 之下是否会形成环
///
/// 等价于「`moving` 是否能沿邻接关系从 `candidate_parent` 到达」，
/// 自引用（`candidate_parent == moving`）直接视为环。
///
/// # 参数
///
/// - `candidate_parent`: 目标父节点/被继承角色
/// - `moving`: 被移动的节点/发起继承的角色
/// - `neighbors`: 邻接展开。结构树传入祖先路径，继承图传入直接继承列表
pub fn would_create_cycle<I, F, N>(candidate_parent: &I, moving: &I, neighbors: F) -> bool
where
    I: Eq + Hash + Clone,
    F: Fn(&I) -> N,
    N: IntoIterator<Item = I>,
{
    if candidate_parent == moving {
        return true;
    }
    is_reachable(candidate_parent, moving, neighbors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn graph(edges: &[(&'static str, &'static str)]) -> HashMap<&'static str, Vec<&'static str>> {
        let mut map: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
        for &(from, to) in edges {
            map.entry(from).or_default().push(to);
        }
        map
    }

    #[test]
    fn test_self_reference_is_cycle() {
        assert!(would_create_cycle(&1, &1, |_| Vec::<i64>::new()));
    }

    #[test]
    fn test_direct_reachability() {
        let g = graph(&[("b", "a")]);
        let edges = |id: &&str| g.get(id).cloned().unwrap_or_default();

        assert!(is_reachable(&"b", &"a", edges));
        assert!(!is_reachable(&"a", &"b", edges));
    }

    #[test]
    fn test_transitive_reachability() {
        // c -> b -> a
        let g = graph(&[("c", "b"), ("b", "a")]);
        let edges = |id: &&str| g.get(id).cloned().unwrap_or_default();

        assert!(is_reachable(&"c", &"a", edges));
        // a 继承 c 会闭合成环
        assert!(would_create_cycle(&"c", &"a", edges));
        // c 再继承 a 不会（a 到不了 c）
        assert!(!would_create_cycle(&"a", &"c", edges));
    }

    #[test]
    fn test_diamond_shape_terminates() {
        // d -> b -> a, d -> c -> a：到 a 有两条路径
        let g = graph(&[("d", "b"), ("d", "c"), ("b", "a"), ("c", "a")]);
        let edges = |id: &&str| g.get(id).cloned().unwrap_or_default();

        assert!(is_reachable(&"d", &"a", edges));
        assert!(!is_reachable(&"d", &"x", edges));
    }

    #[test]
    fn test_ancestor_path_expansion() {
        // 结构树用法：邻接展开直接返回物化祖先路径
        let path_of = |id: &i64| -> Vec<i64> {
            match id {
                103 => vec![0, 100, 101],
                101 => vec![0, 100],
                _ => vec![],
            }
        };

        // 把 101 挂到自己的后代 103 下面
        assert!(would_create_cycle(&103, &101, path_of));
        // 把 103 挂到 100 下面是合法的
        assert!(!would_create_cycle(&100, &103, path_of));
    }
}
