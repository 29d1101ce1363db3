//! JSON document shape for exchanging graphs with external tools.
//!
//! Edge curves are exported as the straight line between their ends; the
//! polyline shape is not carried.

use serde::{Deserialize, Serialize};
use sg_core::Point3;

use crate::algo::is_graph_fully_connected;
use crate::attr::{AttrValue, Attributes};
use crate::graph::{Graph, UNSET_TYPE};

pub const LINE_CURVE_TYPE: &str = "LineCurve";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PointDto {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<Point3> for PointDto {
    fn from(p: Point3) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CurveDto {
    #[serde(rename = "Type")]
    pub curve_type: String,
    pub start_point: PointDto,
    pub end_point: PointDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeDto {
    pub properties: Attributes,
    pub attributes: Attributes,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub point: Option<PointDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EdgeDto {
    pub properties: Attributes,
    pub attributes: Attributes,
    #[serde(rename = "SourceNodeID")]
    pub source_node_id: String,
    #[serde(rename = "TargetNodeID")]
    pub target_node_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub curve: Option<CurveDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GraphDto {
    pub properties: Attributes,
    pub attributes: Attributes,
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
}

/// `{ "Graph": ... }` wrapper, one per exported graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEnvelope {
    #[serde(rename = "Graph")]
    pub graph: GraphDto,
}

fn props<const N: usize>(pairs: [(&str, AttrValue); N]) -> Attributes {
    pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
}

fn graph_dto(graph: &Graph, include_geometry: bool) -> GraphDto {
    let nodes = graph
        .nodes()
        .map(|(i, n)| {
            let mut properties = props([
                ("ID", n.display_id().into()),
                ("GUID", n.id().to_string().into()),
                ("Type", n.type_label().into()),
                ("Valence", (graph.valence(i) as i64).into()),
                ("Naked", graph.is_naked(i).into()),
            ]);
            if let Some(angle) = graph.node_angle(i) {
                properties.insert("Angle".into(), angle.into());
            }
            NodeDto {
                properties,
                attributes: n.attributes.clone(),
                point: include_geometry.then(|| n.position().into()),
            }
        })
        .collect();

    let edges = graph
        .edge_indices()
        .filter_map(|e| {
            let loose = graph.loose_edge(e)?;
            let edge = &loose.edge;
            Some(EdgeDto {
                properties: props([
                    ("GUID", edge.id().to_string().into()),
                    ("Type", edge.type_label().into()),
                    ("Length", edge.length().into()),
                    ("Naked", graph.is_edge_naked(e).into()),
                ]),
                attributes: edge.attributes.clone(),
                source_node_id: loose.source.display_id().to_owned(),
                target_node_id: loose.target.display_id().to_owned(),
                curve: include_geometry.then(|| CurveDto {
                    curve_type: LINE_CURVE_TYPE.to_owned(),
                    start_point: edge.curve().start().into(),
                    end_point: edge.curve().end().into(),
                }),
            })
        })
        .collect();

    GraphDto {
        properties: props([
            ("GUID", graph.id().to_string().into()),
            (
                "Type",
                graph.graph_type.as_deref().unwrap_or(UNSET_TYPE).into(),
            ),
            ("NodeCount", (graph.node_count() as i64).into()),
            ("EdgeCount", (graph.edge_count() as i64).into()),
            ("IsFullyConnected", is_graph_fully_connected(graph).into()),
        ]),
        attributes: graph.attributes.clone(),
        nodes,
        edges,
    }
}

/// Export documents for `graphs`; geometry fields are dropped unless
/// `include_geometry` is set.
pub fn export_graphs(graphs: &[Graph], include_geometry: bool) -> Vec<GraphEnvelope> {
    graphs
        .iter()
        .map(|g| GraphEnvelope {
            graph: graph_dto(g, include_geometry),
        })
        .collect()
}

/// [`export_graphs`] rendered as pretty JSON text.
pub fn export_graphs_json(graphs: &[Graph], include_geometry: bool) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&export_graphs(graphs, include_geometry))
}

#[cfg(test)]
mod tests {
    use sg_core::{Point3, Polyline3};

    use super::{export_graphs, export_graphs_json};
    use crate::graph::{Edge, Graph, LooseEdge};

    fn sample() -> Graph {
        let mut g = Graph::new();
        let bent = Edge::new(Polyline3::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ]))
        .with_type("road")
        .with_attribute("lanes", 2_i64);
        g.add_loose_edge(&LooseEdge::new(bent));
        g.set_node_ids();
        g
    }

    #[test]
    fn document_shape_with_geometry() {
        let text = export_graphs_json(&[sample()], true).expect("serializable");
        let v: serde_json::Value = serde_json::from_str(&text).expect("valid json");

        let graph = &v[0]["Graph"];
        assert_eq!(graph["Properties"]["NodeCount"], 2);
        assert_eq!(graph["Properties"]["IsFullyConnected"], true);
        assert_eq!(graph["Nodes"][0]["Properties"]["ID"], "N0");
        assert_eq!(graph["Nodes"][1]["Point"]["X"], 2.0);

        let edge = &graph["Edges"][0];
        assert_eq!(edge["SourceNodeID"], "N0");
        assert_eq!(edge["TargetNodeID"], "N1");
        assert_eq!(edge["Attributes"]["lanes"], 2);
        assert_eq!(edge["Properties"]["Type"], "road");
        assert_eq!(edge["Curve"]["Type"], "LineCurve");
        assert_eq!(edge["Curve"]["EndPoint"]["X"], 2.0);
        assert_eq!(edge["Curve"]["EndPoint"]["Y"], 0.0);
    }

    #[test]
    fn geometry_can_be_omitted() {
        let docs = export_graphs(&[sample()], false);
        assert!(docs[0].graph.nodes.iter().all(|n| n.point.is_none()));
        assert!(docs[0].graph.edges.iter().all(|e| e.curve.is_none()));

        let text = export_graphs_json(&[sample()], false).expect("serializable");
        assert!(!text.contains("\"Point\""));
        assert!(!text.contains("\"Curve\""));
    }
}
