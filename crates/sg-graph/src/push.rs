//! Flattening of graphs into key/property records for a graph store.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::attr::{AttrValue, Attributes};
use crate::graph::Graph;

/// Flat property bag; only scalar values.
pub type Properties = BTreeMap<String, AttrValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    /// Display id of the node.
    pub key: String,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipRecord {
    pub source: String,
    pub target: String,
    pub rel_type: String,
    pub properties: Properties,
}

impl RelationshipRecord {
    pub fn key(&self) -> (String, String, String) {
        (self.source.clone(), self.target.clone(), self.rel_type.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphRecords {
    pub nodes: Vec<NodeRecord>,
    pub relationships: Vec<RelationshipRecord>,
}

/// `PascalCase`/`camelCase` (and spaced or dashed) keys to `snake_case`.
///
/// Acronym runs stay together: `HTTPServer` becomes `http_server`.
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' || c == '-' || c == '_' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() && i > 0 && !out.is_empty() && !out.ends_with('_') {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

fn flatten_into(props: &mut Properties, attributes: &Attributes) {
    for (k, v) in attributes {
        if v.is_scalar() {
            props.insert(to_snake_case(k), v.clone());
        }
    }
}

/// Store records for every node and edge of `graph`.
///
/// Non-scalar attribute values are skipped. Built-in properties win over
/// attributes with the same converted key.
pub fn graph_records(graph: &Graph) -> GraphRecords {
    let nodes = graph
        .nodes()
        .map(|(i, n)| {
            let mut properties = Properties::new();
            flatten_into(&mut properties, &n.attributes);
            let p = n.position();
            properties.insert("x".into(), p.x.into());
            properties.insert("y".into(), p.y.into());
            properties.insert("z".into(), p.z.into());
            properties.insert("guid".into(), n.id().to_string().into());
            properties.insert("valence".into(), (graph.valence(i) as i64).into());
            properties.insert("naked".into(), graph.is_naked(i).into());
            properties.insert("node_type".into(), n.type_label().into());
            NodeRecord {
                key: n.display_id().to_owned(),
                properties,
            }
        })
        .collect();

    let relationships = graph
        .edge_indices()
        .filter_map(|e| {
            let loose = graph.loose_edge(e)?;
            let mut properties = Properties::new();
            flatten_into(&mut properties, &loose.edge.attributes);
            properties.insert("guid".into(), loose.edge.id().to_string().into());
            properties.insert("length".into(), loose.edge.length().into());
            properties.insert("naked".into(), graph.is_edge_naked(e).into());
            Some(RelationshipRecord {
                source: loose.source.display_id().to_owned(),
                target: loose.target.display_id().to_owned(),
                rel_type: loose.edge.type_label().to_owned(),
                properties,
            })
        })
        .collect();

    GraphRecords {
        nodes,
        relationships,
    }
}
