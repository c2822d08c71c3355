//! Lookup structures derived from the member table and the identity model.
//!
//! Everything here is a pure function of its inputs. The engine keeps one
//! `Indexes` value and rebuilds it only when its dirty flag is set or the
//! identity model's revision moved.

use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;

use crate::model::{Circle, CircleId, GroupId, IdentityModel, MemberId, MemberTable};

/// Group membership restricted to loaded members.
#[derive(Debug, Clone, Default)]
pub struct GroupIndex {
    group_to_nodes: HashMap<GroupId, Vec<MemberId>>,
    node_to_group: HashMap<MemberId, GroupId>,
}

impl GroupIndex {
    pub fn build(table: &MemberTable, model: &IdentityModel) -> Self {
        let mut index = Self::default();
        for member in table.members() {
            let Some(group) = model.group_of(&member.id) else {
                continue;
            };
            index
                .group_to_nodes
                .entry(group.to_string())
                .or_default()
                .push(member.id.clone());
            index.node_to_group.insert(member.id.clone(), group.to_string());
        }
        // Sorted so the first member (the cohesion anchor) does not depend on load order.
        for members in index.group_to_nodes.values_mut() {
            members.sort_unstable();
        }
        index
    }

    #[inline]
    pub fn group_of(&self, member: &str) -> Option<&str> {
        self.node_to_group.get(member).map(String::as_str)
    }

    /// Sorted members of a group.
    pub fn members(&self, group: &str) -> &[MemberId] {
        self.group_to_nodes.get(group).map_or(&[], Vec::as_slice)
    }

    /// All members sharing `member`'s group, or just `member` when ungrouped.
    pub fn mates_of<'a>(&'a self, member: &'a str) -> Vec<&'a str> {
        match self.group_of(member) {
            Some(group) => self.members(group).iter().map(String::as_str).collect(),
            None => vec![member],
        }
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[MemberId])> {
        self.group_to_nodes
            .iter()
            .map(|(group, members)| (group.as_str(), members.as_slice()))
    }

    /// True when both ends belong to the same group.
    pub fn same_group(&self, a: &str, b: &str) -> bool {
        matches!((self.group_of(a), self.group_of(b)), (Some(x), Some(y)) if x == y)
    }
}

/// Direct circle membership restricted to loaded members and known circles.
#[derive(Debug, Clone, Default)]
pub struct CircleIndex {
    circle_to_nodes: HashMap<CircleId, Vec<MemberId>>,
    node_to_circles: HashMap<MemberId, Vec<CircleId>>,
}

impl CircleIndex {
    pub fn build(table: &MemberTable, model: &IdentityModel) -> Self {
        let mut index = Self::default();
        for member in table.members() {
            for circle in model.circles_of(&member.id) {
                if !model.circles().contains_key(circle) {
                    continue;
                }
                index
                    .circle_to_nodes
                    .entry(circle.to_string())
                    .or_default()
                    .push(member.id.clone());
                index
                    .node_to_circles
                    .entry(member.id.clone())
                    .or_default()
                    .push(circle.to_string());
            }
        }
        for members in index.circle_to_nodes.values_mut() {
            members.sort_unstable();
        }
        index
    }

    /// Members tagged directly with `circle`.
    pub fn members(&self, circle: &str) -> &[MemberId] {
        self.circle_to_nodes.get(circle).map_or(&[], Vec::as_slice)
    }

    /// Circles `member` is tagged with directly.
    pub fn circles_of(&self, member: &str) -> &[CircleId] {
        self.node_to_circles.get(member).map_or(&[], Vec::as_slice)
    }

    pub fn direct_count(&self, circle: &str) -> usize {
        self.members(circle).len()
    }

    pub fn circles(&self) -> impl Iterator<Item = (&str, &[MemberId])> {
        self.circle_to_nodes
            .iter()
            .map(|(circle, members)| (circle.as_str(), members.as_slice()))
    }
}

/// One row of the ordered circle forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestEntry {
    pub id: CircleId,
    pub depth: usize,
}

/// Parent/child view of the circles with a name-ordered depth-first listing.
#[derive(Debug, Clone, Default)]
pub struct CircleForest {
    ordered: Vec<ForestEntry>,
    parent_of: HashMap<CircleId, CircleId>,
    children_of: HashMap<CircleId, Vec<CircleId>>,
}

impl CircleForest {
    /// Build the forest. Children lists are filtered to known circles; a
    /// circle listed under several parents keeps the first one seen.
    pub fn build(circles: &std::collections::BTreeMap<CircleId, Circle>) -> Self {
        let mut forest = Self::default();
        for (id, circle) in circles {
            let children: Vec<CircleId> = circle
                .children
                .iter()
                .filter(|child| *child != id && circles.contains_key(*child))
                .cloned()
                .collect();
            for child in &children {
                forest
                    .parent_of
                    .entry(child.clone())
                    .or_insert_with(|| id.clone());
            }
            forest.children_of.insert(id.clone(), children);
        }

        let sort_key = |id: &CircleId| {
            let name = circles.get(id).map_or("", |c| c.name.as_str());
            let name = if name.is_empty() { id.as_str() } else { name };
            (name.to_lowercase(), id.clone())
        };
        let by_name = |ids: &mut Vec<CircleId>| ids.sort_by_cached_key(sort_key);

        let mut roots: Vec<CircleId> = circles
            .keys()
            .filter(|id| !forest.parent_of.contains_key(*id))
            .cloned()
            .collect();
        by_name(&mut roots);

        let mut visited = HashSet::with_capacity(circles.len());
        let mut stack: Vec<(CircleId, usize)> = roots.into_iter().rev().map(|id| (id, 0)).collect();
        loop {
            while let Some((id, depth)) = stack.pop() {
                if !visited.insert(id.clone()) {
                    continue;
                }
                let mut children = forest.children_of.get(&id).cloned().unwrap_or_default();
                by_name(&mut children);
                stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
                forest.ordered.push(ForestEntry { id, depth });
            }
            // Circles only reachable through a parent cycle (possible in
            // imported data) are listed as extra roots.
            let mut orphans: Vec<CircleId> = circles
                .keys()
                .filter(|id| !visited.contains(*id))
                .cloned()
                .collect();
            if orphans.is_empty() {
                break;
            }
            by_name(&mut orphans);
            stack.push((orphans.swap_remove(0), 0));
        }
        forest
    }

    /// Depth-first listing, siblings ordered by name.
    pub fn entries(&self) -> &[ForestEntry] {
        &self.ordered
    }

    pub fn parent_of(&self, circle: &str) -> Option<&str> {
        self.parent_of.get(circle).map(String::as_str)
    }

    pub fn children_of(&self, circle: &str) -> &[CircleId] {
        self.children_of.get(circle).map_or(&[], Vec::as_slice)
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self, circle: &str) -> Vec<CircleId> {
        let mut out: Vec<CircleId> = Vec::new();
        let mut current = self.parent_of(circle);
        while let Some(parent) = current {
            if parent == circle || out.iter().any(|seen| seen == parent) {
                break;
            }
            out.push(parent.to_string());
            current = self.parent_of(parent);
        }
        out
    }

    /// Every circle below `circle` (breadth-first over children).
    pub fn descendants(&self, circle: &str) -> HashSet<CircleId> {
        let mut result = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([circle]);
        while let Some(current) = queue.pop_front() {
            for child in self.children_of(current) {
                if result.insert(child.clone()) {
                    queue.push_back(child);
                }
            }
        }
        result
    }

    /// Selected circles plus all their descendants.
    pub fn expanded<'a>(&self, selected: impl IntoIterator<Item = &'a str>) -> HashSet<CircleId> {
        let mut expanded = HashSet::new();
        for id in selected {
            expanded.insert(id.to_string());
            expanded.extend(self.descendants(id));
        }
        expanded
    }
}

/// All derived lookups for one (member table, identity model revision) pair.
#[derive(Debug, Clone, Default)]
pub struct Indexes {
    pub groups: GroupIndex,
    pub circles: CircleIndex,
    pub forest: CircleForest,
}

impl Indexes {
    pub fn build(table: &MemberTable, model: &IdentityModel) -> Self {
        let indexes = Self {
            groups: GroupIndex::build(table, model),
            circles: CircleIndex::build(table, model),
            forest: CircleForest::build(model.circles()),
        };
        debug!(
            "rebuilt indexes: {} groups, {} tagged circles, {} circles in forest",
            indexes.groups.group_to_nodes.len(),
            indexes.circles.circle_to_nodes.len(),
            indexes.forest.ordered.len()
        );
        indexes
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::Member;

    fn circle(name: &str, children: &[&str]) -> Circle {
        Circle {
            name: name.to_string(),
            notes: String::new(),
            children: children.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn circles(entries: &[(&str, Circle)]) -> BTreeMap<CircleId, Circle> {
        entries
            .iter()
            .map(|(id, c)| (id.to_string(), c.clone()))
            .collect()
    }

    #[test]
    fn test_forest_order_by_name() {
        let map = circles(&[
            ("c1", circle("Zoo", &["c3", "c2"])),
            ("c2", circle("beta", &[])),
            ("c3", circle("Alpha", &[])),
            ("c4", circle("Middle", &[])),
        ]);
        let forest = CircleForest::build(&map);
        let listing: Vec<(&str, usize)> = forest
            .entries()
            .iter()
            .map(|e| (e.id.as_str(), e.depth))
            .collect();
        assert_eq!(listing, vec![("c4", 0), ("c1", 0), ("c3", 1), ("c2", 1)]);
        assert_eq!(forest.parent_of("c2"), Some("c1"));
    }

    #[test]
    fn test_forest_drops_unknown_and_self_children() {
        let map = circles(&[("c1", circle("A", &["c1", "ghost", "c2"])), ("c2", circle("B", &[]))]);
        let forest = CircleForest::build(&map);
        assert_eq!(forest.children_of("c1"), ["c2".to_string()]);
        assert_eq!(forest.parent_of("c1"), None);
    }

    #[test]
    fn test_ancestors_and_descendants() {
        let map = circles(&[
            ("root", circle("Root", &["mid"])),
            ("mid", circle("Mid", &["leaf"])),
            ("leaf", circle("Leaf", &[])),
        ]);
        let forest = CircleForest::build(&map);
        assert_eq!(forest.ancestors("leaf"), vec!["mid".to_string(), "root".to_string()]);
        assert!(forest.ancestors("root").is_empty());
        assert_eq!(
            forest.descendants("root"),
            HashSet::from(["mid".to_string(), "leaf".to_string()])
        );
        assert_eq!(forest.expanded(["mid"]), HashSet::from(["mid".to_string(), "leaf".to_string()]));
    }

    #[test]
    fn test_cyclic_import_terminates() {
        let map = circles(&[("a", circle("A", &["b"])), ("b", circle("B", &["a"]))]);
        let forest = CircleForest::build(&map);
        assert_eq!(forest.entries().len(), 2);
        assert!(forest.ancestors("a").len() <= 1);
        assert_eq!(forest.descendants("a").len(), 2);
    }

    #[test]
    fn test_group_and_circle_index() {
        let table = MemberTable::from_parts(
            vec![Member::new("4", "Dee"), Member::new("1", "Ann"), Member::new("5", "Eve")],
            Vec::new(),
        );
        let mut model = IdentityModel::new();
        let g = model.create_group("Same").unwrap();
        model.assign_group("4", Some(&g)).unwrap();
        model.assign_group("1", Some(&g)).unwrap();
        model.assign_group("99", Some(&g)).unwrap();
        let c = model.create_circle("Friends").unwrap();
        model.set_member_circle("5", &c, true).unwrap();

        let indexes = Indexes::build(&table, &model);
        assert_eq!(indexes.groups.members(&g), ["1".to_string(), "4".to_string()]);
        assert_eq!(indexes.groups.mates_of("4"), vec!["1", "4"]);
        assert_eq!(indexes.groups.mates_of("5"), vec!["5"]);
        assert!(indexes.groups.same_group("1", "4"));
        assert!(!indexes.groups.same_group("1", "5"));
        assert_eq!(indexes.circles.members(&c), ["5".to_string()]);
        assert_eq!(indexes.circles.circles_of("5"), [c.clone()]);
        assert_eq!(indexes.circles.direct_count("nope"), 0);
    }
}
