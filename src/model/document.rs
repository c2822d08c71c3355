//! Identity import/export document.
//!
//! Reading is lenient: anything that parses as JSON becomes a valid model,
//! with wrong-typed sections treated as empty. Writing always produces the
//! current document version with a statistics block.

use std::collections::{BTreeMap, BTreeSet};

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::identity::{Circle, CircleId, Group, GroupId, IdentityModel};
use super::member::MemberId;
use crate::error::ImportError;

/// Version written by `export_document`.
pub const DOCUMENT_VERSION: u32 = 2;

/// Counts included in exported documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentStatistics {
    pub groups: usize,
    pub circles: usize,
    pub marked_nodes: usize,
    pub circle_nodes: usize,
    pub pinned_nodes: usize,
}

/// Serialized identity model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkDocument {
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<DocumentStatistics>,
    pub node_to_group: BTreeMap<MemberId, GroupId>,
    pub groups: BTreeMap<GroupId, Group>,
    pub node_to_circles: BTreeMap<MemberId, Vec<CircleId>>,
    pub circles: BTreeMap<CircleId, Circle>,
    pub pinned_nodes: Vec<MemberId>,
}

/// Render a JSON scalar as an id. Objects, arrays, null and empty strings
/// are not ids.
fn id_string(value: &Value) -> Option<String> {
    let id = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

fn object<'a>(root: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    root.get(key).and_then(Value::as_object)
}

fn text_field(entry: &Value, key: &str) -> String {
    entry
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Turn any parsed JSON value into a valid identity model.
///
/// A non-object yields an empty model. Circle `children` are cast to
/// strings and self-references dropped.
pub fn normalize(value: &Value) -> IdentityModel {
    let mut model = IdentityModel::new();
    let Some(root) = value.as_object() else {
        return model;
    };

    for (id, entry) in object(root, "groups").into_iter().flatten() {
        model.groups.insert(
            id.clone(),
            Group {
                name: text_field(entry, "name"),
                notes: text_field(entry, "notes"),
            },
        );
    }

    for (member, group) in object(root, "nodeToGroup").into_iter().flatten() {
        if let Some(group) = id_string(group) {
            model.node_to_group.insert(member.clone(), group);
        }
    }

    for (id, entry) in object(root, "circles").into_iter().flatten() {
        let children = entry
            .get("children")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(id_string)
            .filter(|child| child != id)
            .collect();
        model.circles.insert(
            id.clone(),
            Circle {
                name: text_field(entry, "name"),
                notes: text_field(entry, "notes"),
                children,
            },
        );
    }

    for (member, circles) in object(root, "nodeToCircles").into_iter().flatten() {
        let set: BTreeSet<CircleId> = circles
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(id_string)
            .collect();
        if !set.is_empty() {
            model.node_to_circles.insert(member.clone(), set);
        }
    }

    model.pinned = root
        .get("pinnedNodes")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(id_string)
        .collect();

    model
}

/// Parse identity JSON text. Only invalid JSON is an error.
pub fn from_json_str(text: &str) -> Result<IdentityModel, ImportError> {
    let value: Value = serde_json::from_str(text)?;
    let model = normalize(&value);
    info!(
        "imported {} groups, {} circles, {} pinned members",
        model.groups.len(),
        model.circles.len(),
        model.pinned.len()
    );
    Ok(model)
}

/// Build the export document for `model`.
pub fn export_document(model: &IdentityModel, export_date: Option<String>) -> MarkDocument {
    MarkDocument {
        version: DOCUMENT_VERSION,
        export_date,
        statistics: Some(DocumentStatistics {
            groups: model.groups.len(),
            circles: model.circles.len(),
            marked_nodes: model.node_to_group.len(),
            circle_nodes: model.node_to_circles.len(),
            pinned_nodes: model.pinned.len(),
        }),
        node_to_group: model.node_to_group.clone(),
        groups: model.groups.clone(),
        node_to_circles: model
            .node_to_circles
            .iter()
            .map(|(member, set)| (member.clone(), set.iter().cloned().collect()))
            .collect(),
        circles: model.circles.clone(),
        pinned_nodes: model.pinned.iter().cloned().collect(),
    }
}

/// Pretty-printed export JSON.
pub fn to_json(model: &IdentityModel, export_date: Option<String>) -> Result<String, ImportError> {
    Ok(serde_json::to_string_pretty(&export_document(model, export_date))?)
}
