//! Members and the loaded member table.
//!
//! Profiles arrive as loosely typed records from the profile store. The
//! member table turns them into immutable members plus relation edges, and
//! synthesizes placeholder members for relation endpoints nobody knows about.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::{EdgeStats, GraphEdge};

/// Stable member id.
pub type MemberId = String;

/// Reference to another member inside a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationRef {
    #[serde(rename = "MemberNumber", default)]
    pub member_number: Value,
}

impl RelationRef {
    pub fn new(id: impl Into<Value>) -> Self {
        Self {
            member_number: id.into(),
        }
    }
}

/// One profile as produced by the profile store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileRecord {
    pub member_number: Value,
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub last_nick: Option<String>,
    pub title: Option<String>,
    #[serde(alias = "descriptionDecoded")]
    pub description: Option<String>,
    /// Last-seen timestamp, used when merging records.
    pub seen: Option<f64>,
    pub ownership: Option<RelationRef>,
    pub lovership: Option<Vec<RelationRef>>,
}

impl ProfileRecord {
    /// Member id of this record, if it has a usable one.
    pub fn id(&self) -> Option<MemberId> {
        id_from_value(&self.member_number)
    }
}

/// Ids are numbers in the store but strings everywhere else.
fn id_from_value(value: &Value) -> Option<MemberId> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// An immutable member snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Member {
    pub id: MemberId,
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub last_nick: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Synthesized for a relation endpoint missing from the data.
    pub placeholder: bool,
}

impl Member {
    pub fn new(id: impl Into<MemberId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Stand-in for an unknown relation endpoint.
    pub fn placeholder(id: impl Into<MemberId>) -> Self {
        Self {
            id: id.into(),
            placeholder: true,
            ..Self::default()
        }
    }

    fn from_record(id: MemberId, record: &ProfileRecord) -> Self {
        Self {
            id,
            name: record.name.clone(),
            nickname: record.nickname.clone(),
            last_nick: record.last_nick.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            placeholder: false,
        }
    }

    /// Display label: `name (#id)`, or `nickname (#id)` in nickname mode.
    pub fn label(&self, display_nickname: bool, unknown: &str) -> String {
        let nickname = self
            .nickname
            .as_deref()
            .or(self.last_nick.as_deref())
            .filter(|s| !s.is_empty());
        let name = self.name.as_deref().filter(|s| !s.is_empty()).unwrap_or(unknown);
        match nickname {
            Some(nick) if display_nickname => format!("{nick} (#{})", self.id),
            _ => format!("{name} (#{})", self.id),
        }
    }

    /// Title bucket for the title filter.
    pub fn title_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.title.as_deref().filter(|s| !s.is_empty()).unwrap_or(default)
    }

    /// Case-insensitive substring match over name, nickname and id.
    /// `query` must already be lower-cased; empty matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let contains = |s: &Option<String>| {
            s.as_deref()
                .is_some_and(|s| s.to_lowercase().contains(query))
        };
        contains(&self.name) || contains(&self.nickname) || self.id.contains(query)
    }

    /// Hover text: title and nickname on separate lines.
    pub fn tooltip(&self) -> String {
        let title = self.title.as_deref().unwrap_or("");
        let nickname = self.nickname.as_deref().unwrap_or("");
        format!("{title}\n{nickname}").trim().to_string()
    }
}

/// All members and relation edges of one data load.
#[derive(Debug, Clone, Default)]
pub struct MemberTable {
    members: Vec<Member>,
    by_id: HashMap<MemberId, usize>,
    edges: Vec<GraphEdge>,
    stats: EdgeStats,
    placeholders: usize,
}

impl MemberTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build members and edges from profile records.
    ///
    /// Records without an id are skipped. A repeated id keeps its first
    /// position but takes the later record's content.
    pub fn from_records(records: &[ProfileRecord]) -> Self {
        let mut members: Vec<Member> = Vec::with_capacity(records.len());
        let mut by_id: HashMap<MemberId, usize> = HashMap::with_capacity(records.len());
        let mut edges = Vec::new();

        for record in records {
            let Some(id) = record.id() else {
                continue;
            };
            let member = Member::from_record(id.clone(), record);
            match by_id.get(&id) {
                Some(&slot) => members[slot] = member,
                None => {
                    by_id.insert(id.clone(), members.len());
                    members.push(member);
                }
            }

            if let Some(owner) = record.ownership.as_ref().and_then(|o| id_from_value(&o.member_number)) {
                edges.push(GraphEdge::ownership(&owner, &id));
            }
            for lover in record.lovership.iter().flatten() {
                if let Some(lover) = id_from_value(&lover.member_number) {
                    edges.push(GraphEdge::romantic(&id, &lover));
                }
            }
        }

        Self::from_parts(members, edges)
    }

    /// Build a table from already-typed members and edges.
    pub fn from_parts(members: Vec<Member>, edges: Vec<GraphEdge>) -> Self {
        let mut table = Self::default();
        for member in members {
            match table.by_id.get(&member.id) {
                Some(&slot) => table.members[slot] = member,
                None => {
                    table.by_id.insert(member.id.clone(), table.members.len());
                    table.members.push(member);
                }
            }
        }

        let mut seen_edges = HashSet::with_capacity(edges.len());
        for edge in edges {
            if !edge.kind.is_relation() || !seen_edges.insert(edge.id.clone()) {
                continue;
            }
            for endpoint in [&edge.from, &edge.to] {
                if !table.by_id.contains_key(endpoint) {
                    warn!("relation {} references unknown member {endpoint}", edge.id);
                    table.by_id.insert(endpoint.clone(), table.members.len());
                    table.members.push(Member::placeholder(endpoint.clone()));
                    table.placeholders += 1;
                }
            }
            table.edges.push(edge);
        }

        table.stats = EdgeStats::count(&table.edges);
        info!(
            "loaded {} members ({} placeholders), {} ownership and {} romantic edges",
            table.members.len(),
            table.placeholders,
            table.stats.ownership,
            table.stats.romantic
        );
        table
    }

    #[inline]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    #[inline]
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    #[inline]
    pub fn stats(&self) -> EdgeStats {
        self.stats
    }

    #[inline]
    pub fn placeholder_count(&self) -> usize {
        self.placeholders
    }

    pub fn get(&self, id: &str) -> Option<&Member> {
        self.by_id.get(id).map(|&slot| &self.members[slot])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sorted distinct titles, for the title filter.
    pub fn titles(&self, default: &str) -> Vec<String> {
        self.members
            .iter()
            .filter(|m| !m.placeholder)
            .map(|m| m.title_or(default).to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Outcome of merging imported profiles into a profile list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Merge `incoming` into `existing`, keeping whichever copy of a profile was
/// seen more recently. Records without an id are skipped.
pub fn merge_profiles(existing: &mut Vec<ProfileRecord>, incoming: Vec<ProfileRecord>) -> MergeReport {
    let mut slots: HashMap<MemberId, usize> = existing
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.id().map(|id| (id, i)))
        .collect();
    let mut report = MergeReport::default();

    for record in incoming {
        let Some(id) = record.id() else {
            report.skipped += 1;
            continue;
        };
        match slots.get(&id) {
            None => {
                slots.insert(id, existing.len());
                existing.push(record);
                report.added += 1;
            }
            Some(&slot) => {
                let current = existing[slot].seen.unwrap_or(0.0);
                if record.seen.unwrap_or(0.0) > current {
                    existing[slot] = record;
                    report.updated += 1;
                } else {
                    report.skipped += 1;
                }
            }
        }
    }

    info!(
        "merged profiles: {} added, {} updated, {} skipped",
        report.added, report.updated, report.skipped
    );
    report
}
