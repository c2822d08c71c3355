//! The user-editable identity model: groups, circles and pins.
//!
//! Groups partition members into merged identities (a member is in at most
//! one group). Circles are hierarchical social tags forming a forest; a
//! member may carry any number of them. Every mutation validates first and
//! then commits in full, bumping `revision` so index caches know to rebuild.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::member::MemberId;
use crate::error::ModelError;
use crate::graph::CircleForest;

pub type GroupId = String;
pub type CircleId = String;

/// A merged identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub name: String,
    pub notes: String,
}

/// A social tag node in the circle forest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Circle {
    pub name: String,
    pub notes: String,
    pub children: Vec<CircleId>,
}

/// Groups, circles, their member assignments and the pinned set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityModel {
    pub(crate) groups: BTreeMap<GroupId, Group>,
    pub(crate) circles: BTreeMap<CircleId, Circle>,
    pub(crate) node_to_group: BTreeMap<MemberId, GroupId>,
    pub(crate) node_to_circles: BTreeMap<MemberId, BTreeSet<CircleId>>,
    pub(crate) pinned: BTreeSet<MemberId>,
    revision: u64,
    next_id: u64,
}

fn base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn clean_name(name: &str) -> Result<String, ModelError> {
    let name = name.trim();
    if name.is_empty() {
        Err(ModelError::EmptyName)
    } else {
        Ok(name.to_string())
    }
}

impl IdentityModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter bumped by every committed mutation.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        loop {
            self.next_id += 1;
            let id = format!("{prefix}-{}", base36(self.next_id));
            if !self.groups.contains_key(&id) && !self.circles.contains_key(&id) {
                return id;
            }
        }
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn groups(&self) -> &BTreeMap<GroupId, Group> {
        &self.groups
    }

    pub fn circles(&self) -> &BTreeMap<CircleId, Circle> {
        &self.circles
    }

    pub fn node_to_group(&self) -> &BTreeMap<MemberId, GroupId> {
        &self.node_to_group
    }

    pub fn node_to_circles(&self) -> &BTreeMap<MemberId, BTreeSet<CircleId>> {
        &self.node_to_circles
    }

    pub fn pinned(&self) -> &BTreeSet<MemberId> {
        &self.pinned
    }

    pub fn group_of(&self, member: &str) -> Option<&str> {
        self.node_to_group.get(member).map(String::as_str)
    }

    /// Circles a member was explicitly tagged with.
    pub fn circles_of(&self, member: &str) -> impl Iterator<Item = &str> {
        self.node_to_circles
            .get(member)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn is_pinned(&self, member: &str) -> bool {
        self.pinned.contains(member)
    }

    /// Circles a member belongs to only through an explicitly tagged descendant.
    pub fn implied_circles(&self, member: &str) -> BTreeSet<CircleId> {
        let forest = CircleForest::build(&self.circles);
        self.circles_of(member)
            .flat_map(|circle| forest.ancestors(circle))
            .collect()
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// Create a group and return its id.
    pub fn create_group(&mut self, name: &str) -> Result<GroupId, ModelError> {
        let name = clean_name(name)?;
        let id = self.fresh_id("g");
        self.groups.insert(id.clone(), Group { name, notes: String::new() });
        self.touch();
        debug!("created group {id}");
        Ok(id)
    }

    pub fn rename_group(&mut self, id: &str, name: &str) -> Result<(), ModelError> {
        let name = clean_name(name)?;
        let group = self
            .groups
            .get_mut(id)
            .ok_or_else(|| ModelError::UnknownGroup(id.to_string()))?;
        group.name = name;
        self.touch();
        Ok(())
    }

    /// Delete a group and every assignment pointing at it.
    pub fn delete_group(&mut self, id: &str) -> Result<(), ModelError> {
        if self.groups.remove(id).is_none() {
            return Err(ModelError::UnknownGroup(id.to_string()));
        }
        self.node_to_group.retain(|_, group| group != id);
        self.touch();
        debug!("deleted group {id}");
        Ok(())
    }

    /// Put `member` into `group`, or take it out of any group with `None`.
    pub fn assign_group(&mut self, member: &str, group: Option<&str>) -> Result<(), ModelError> {
        match group {
            Some(group) => {
                if !self.groups.contains_key(group) {
                    return Err(ModelError::UnknownGroup(group.to_string()));
                }
                self.node_to_group.insert(member.to_string(), group.to_string());
            }
            None => {
                self.node_to_group.remove(member);
            }
        }
        self.touch();
        Ok(())
    }

    // =========================================================================
    // Circles
    // =========================================================================

    /// Create a root circle and return its id.
    pub fn create_circle(&mut self, name: &str) -> Result<CircleId, ModelError> {
        let name = clean_name(name)?;
        let id = self.fresh_id("c");
        self.circles.insert(
            id.clone(),
            Circle {
                name,
                ..Circle::default()
            },
        );
        self.touch();
        debug!("created circle {id}");
        Ok(id)
    }

    pub fn rename_circle(&mut self, id: &str, name: &str) -> Result<(), ModelError> {
        let name = clean_name(name)?;
        let circle = self
            .circles
            .get_mut(id)
            .ok_or_else(|| ModelError::UnknownCircle(id.to_string()))?;
        circle.name = name;
        self.touch();
        Ok(())
    }

    /// Delete a circle, unlinking it from its parent and from every member.
    /// Its children become roots.
    pub fn delete_circle(&mut self, id: &str) -> Result<(), ModelError> {
        if self.circles.remove(id).is_none() {
            return Err(ModelError::UnknownCircle(id.to_string()));
        }
        for circle in self.circles.values_mut() {
            circle.children.retain(|child| child != id);
        }
        self.node_to_circles.retain(|_, set| {
            set.remove(id);
            !set.is_empty()
        });
        self.touch();
        debug!("deleted circle {id}");
        Ok(())
    }

    /// Tag or untag `member` with `circle`.
    pub fn set_member_circle(&mut self, member: &str, circle: &str, tagged: bool) -> Result<(), ModelError> {
        if !self.circles.contains_key(circle) {
            return Err(ModelError::UnknownCircle(circle.to_string()));
        }
        if tagged {
            self.node_to_circles
                .entry(member.to_string())
                .or_default()
                .insert(circle.to_string());
        } else if let Some(set) = self.node_to_circles.get_mut(member) {
            set.remove(circle);
            if set.is_empty() {
                self.node_to_circles.remove(member);
            }
        }
        self.touch();
        Ok(())
    }

    /// Move `circle` under `parent`, or make it a root with `None`.
    ///
    /// Rejects a parent that is the circle itself or one of its descendants;
    /// the forest is left unchanged in that case.
    pub fn reparent_circle(&mut self, circle: &str, parent: Option<&str>) -> Result<(), ModelError> {
        if !self.circles.contains_key(circle) {
            return Err(ModelError::UnknownCircle(circle.to_string()));
        }
        if let Some(parent) = parent {
            if !self.circles.contains_key(parent) {
                return Err(ModelError::UnknownCircle(parent.to_string()));
            }
            let forest = CircleForest::build(&self.circles);
            if parent == circle || forest.descendants(circle).contains(parent) {
                warn!("rejected moving circle {circle} under its descendant {parent}");
                return Err(ModelError::CircleCycle {
                    circle: circle.to_string(),
                    parent: parent.to_string(),
                });
            }
        }

        for node in self.circles.values_mut() {
            node.children.retain(|child| child != circle);
        }
        if let Some(parent) = parent.and_then(|p| self.circles.get_mut(p)) {
            parent.children.push(circle.to_string());
        }
        self.touch();
        Ok(())
    }

    // =========================================================================
    // Pins
    // =========================================================================

    /// Flip the pinned state of `member`, returning the new state.
    pub fn toggle_pin(&mut self, member: &str) -> bool {
        let pinned = if self.pinned.remove(member) {
            false
        } else {
            self.pinned.insert(member.to_string());
            true
        };
        self.touch();
        debug!("member {member} pinned={pinned}");
        pinned
    }

    // =========================================================================
    // Merging
    // =========================================================================

    /// Union `other` into this model. Entries with the same id are replaced
    /// by `other`'s; nothing present only here is removed.
    pub fn merge(&mut self, other: IdentityModel) {
        self.groups.extend(other.groups);
        self.circles.extend(other.circles);
        self.node_to_group.extend(other.node_to_group);
        self.node_to_circles.extend(other.node_to_circles);
        self.pinned.extend(other.pinned);
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base36() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "z");
        assert_eq!(base36(36), "10");
    }

    #[test]
    fn test_group_lifecycle() {
        let mut model = IdentityModel::new();
        let g = model.create_group("  Alts ").unwrap();
        assert_eq!(model.groups()[&g].name, "Alts");

        model.assign_group("1", Some(&g)).unwrap();
        model.assign_group("4", Some(&g)).unwrap();
        assert_eq!(model.group_of("4"), Some(g.as_str()));

        model.rename_group(&g, "Same person").unwrap();
        assert_eq!(model.groups()[&g].name, "Same person");

        model.delete_group(&g).unwrap();
        assert!(model.node_to_group().is_empty());
        assert_eq!(model.delete_group(&g), Err(ModelError::UnknownGroup(g.clone())));
    }

    #[test]
    fn test_assignment_is_a_partition() {
        let mut model = IdentityModel::new();
        let a = model.create_group("A").unwrap();
        let b = model.create_group("B").unwrap();
        model.assign_group("1", Some(&a)).unwrap();
        model.assign_group("1", Some(&b)).unwrap();
        assert_eq!(model.group_of("1"), Some(b.as_str()));
        model.assign_group("1", None).unwrap();
        assert_eq!(model.group_of("1"), None);
        assert!(model.assign_group("1", Some("g-missing")).is_err());
    }

    #[test]
    fn test_empty_names_rejected() {
        let mut model = IdentityModel::new();
        assert_eq!(model.create_group("   "), Err(ModelError::EmptyName));
        assert_eq!(model.create_circle(""), Err(ModelError::EmptyName));
        assert_eq!(model.revision(), 0);
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut model = IdentityModel::new();
        let outer = model.create_circle("Outer").unwrap();
        let inner = model.create_circle("Inner").unwrap();
        let leaf = model.create_circle("Leaf").unwrap();
        model.reparent_circle(&inner, Some(&outer)).unwrap();
        model.reparent_circle(&leaf, Some(&inner)).unwrap();

        let before = model.clone();
        assert_eq!(
            model.reparent_circle(&outer, Some(&leaf)),
            Err(ModelError::CircleCycle { circle: outer.clone(), parent: leaf.clone() })
        );
        assert!(model.reparent_circle(&outer, Some(&outer)).is_err());
        assert_eq!(model, before);
    }

    #[test]
    fn test_reparent_moves_between_parents() {
        let mut model = IdentityModel::new();
        let a = model.create_circle("A").unwrap();
        let b = model.create_circle("B").unwrap();
        let c = model.create_circle("C").unwrap();
        model.reparent_circle(&c, Some(&a)).unwrap();
        model.reparent_circle(&c, Some(&b)).unwrap();
        assert!(model.circles()[&a].children.is_empty());
        assert_eq!(model.circles()[&b].children, vec![c.clone()]);

        model.reparent_circle(&c, None).unwrap();
        assert!(model.circles()[&b].children.is_empty());
    }

    #[test]
    fn test_implied_circles() {
        let mut model = IdentityModel::new();
        let outer = model.create_circle("Outer").unwrap();
        let inner = model.create_circle("Inner").unwrap();
        model.reparent_circle(&inner, Some(&outer)).unwrap();
        model.set_member_circle("5", &inner, true).unwrap();

        assert_eq!(model.circles_of("5").collect::<Vec<_>>(), vec![inner.as_str()]);
        assert_eq!(model.implied_circles("5"), BTreeSet::from([outer.clone()]));
    }

    #[test]
    fn test_delete_circle_cascades() {
        let mut model = IdentityModel::new();
        let outer = model.create_circle("Outer").unwrap();
        let inner = model.create_circle("Inner").unwrap();
        model.reparent_circle(&inner, Some(&outer)).unwrap();
        model.set_member_circle("5", &inner, true).unwrap();
        model.set_member_circle("6", &inner, true).unwrap();
        model.set_member_circle("6", &outer, true).unwrap();

        model.delete_circle(&inner).unwrap();
        assert!(model.circles()[&outer].children.is_empty());
        assert!(!model.node_to_circles().contains_key("5"));
        assert_eq!(model.circles_of("6").collect::<Vec<_>>(), vec![outer.as_str()]);
    }

    #[test]
    fn test_pins_and_revision() {
        let mut model = IdentityModel::new();
        assert!(model.toggle_pin("3"));
        assert!(model.is_pinned("3"));
        assert!(!model.toggle_pin("3"));
        let rev = model.revision();
        assert!(model.toggle_pin("3"));
        assert_eq!(model.revision(), rev + 1);
    }

    #[test]
    fn test_merge_is_additive() {
        let mut ours = IdentityModel::new();
        let g = ours.create_group("Ours").unwrap();
        ours.assign_group("1", Some(&g)).unwrap();
        ours.toggle_pin("1");

        let mut theirs = IdentityModel::new();
        theirs.groups.insert("g-x".into(), Group { name: "Theirs".into(), notes: String::new() });
        theirs.node_to_group.insert("2".into(), "g-x".into());
        theirs.pinned.insert("2".into());

        ours.merge(theirs);
        assert_eq!(ours.groups().len(), 2);
        assert_eq!(ours.group_of("1"), Some(g.as_str()));
        assert_eq!(ours.group_of("2"), Some("g-x"));
        assert_eq!(ours.pinned().len(), 2);
    }
}
