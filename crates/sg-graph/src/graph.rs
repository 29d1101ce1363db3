use std::collections::HashMap;

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};
use petgraph::visit::EdgeRef;
use serde_json::Value;
use sg_core::{EdgeKey, Point3, PointKey, Polyline3, Vec3};
use uuid::Uuid;

use crate::attr::{AttrValue, Attributes, merge_overwrite, merge_types};

/// Text shown for an element whose type was never set.
pub const UNSET_TYPE: &str = "unset";

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: Uuid,
    display_id: String,
    position: Point3,
    pub node_type: Option<String>,
    pub attributes: Attributes,
    /// Opaque caller payload, carried through copies untouched.
    pub linked: Vec<Value>,
    graph_id: Option<Uuid>,
}

impl Node {
    pub fn new(position: Point3) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_id: String::new(),
            position,
            node_type: None,
            attributes: Attributes::new(),
            linked: Vec::new(),
            graph_id: None,
        }
    }

    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn display_id(&self) -> &str {
        &self.display_id
    }

    pub fn position(&self) -> Point3 {
        self.position
    }

    pub fn key(&self) -> PointKey {
        PointKey::new(self.position)
    }

    /// Id of the graph holding this node, if any.
    pub fn graph_id(&self) -> Option<Uuid> {
        self.graph_id
    }

    pub fn type_label(&self) -> &str {
        self.node_type.as_deref().unwrap_or(UNSET_TYPE)
    }

    pub fn is_type_unset(&self) -> bool {
        self.type_label() == UNSET_TYPE
    }

    /// Detached copy with a fresh id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            graph_id: None,
            ..self.clone()
        }
    }

    /// Copy of `self` placed at `position`, detached, with a fresh id.
    pub fn relocated(&self, position: Point3) -> Self {
        Self {
            position,
            ..self.duplicate()
        }
    }

    /// Folds a coincident node into this one.
    pub fn absorb(&mut self, other: &Node) {
        merge_overwrite(&mut self.attributes, &other.attributes);
        self.node_type = merge_types(self.node_type.as_deref(), other.node_type.as_deref());
        for v in &other.linked {
            if !self.linked.contains(v) {
                self.linked.push(v.clone());
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    id: Uuid,
    curve: Polyline3,
    pub edge_type: Option<String>,
    pub attributes: Attributes,
    pub linked: Vec<Value>,
    graph_id: Option<Uuid>,
}

impl Edge {
    pub fn new(curve: Polyline3) -> Self {
        Self {
            id: Uuid::new_v4(),
            curve,
            edge_type: None,
            attributes: Attributes::new(),
            linked: Vec::new(),
            graph_id: None,
        }
    }

    pub fn line(from: Point3, to: Point3) -> Self {
        Self::new(Polyline3::line(from, to))
    }

    pub fn with_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn curve(&self) -> &Polyline3 {
        &self.curve
    }

    pub fn length(&self) -> f64 {
        self.curve.length()
    }

    pub fn graph_id(&self) -> Option<Uuid> {
        self.graph_id
    }

    pub fn type_label(&self) -> &str {
        self.edge_type.as_deref().unwrap_or(UNSET_TYPE)
    }

    /// Same type/attributes/payload on a different curve, with a fresh id.
    pub fn with_curve(&self, curve: Polyline3) -> Self {
        Self {
            id: Uuid::new_v4(),
            curve,
            graph_id: None,
            ..self.clone()
        }
    }

    pub fn absorb(&mut self, other: &Edge) {
        merge_overwrite(&mut self.attributes, &other.attributes);
        self.edge_type = merge_types(self.edge_type.as_deref(), other.edge_type.as_deref());
        for v in &other.linked {
            if !self.linked.contains(v) {
                self.linked.push(v.clone());
            }
        }
    }
}

/// An edge detached from any graph, carrying copies of its endpoint nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct LooseEdge {
    pub source: Node,
    pub target: Node,
    pub edge: Edge,
}

impl LooseEdge {
    /// Wraps `edge` with bare endpoint nodes at its curve ends.
    pub fn new(edge: Edge) -> Self {
        Self {
            source: Node::new(edge.curve.start()),
            target: Node::new(edge.curve.end()),
            edge,
        }
    }

    pub fn line(from: Point3, to: Point3) -> Self {
        Self::new(Edge::line(from, to))
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.source.position, self.target.position)
    }
}

/// Undirected, multigraph-free graph of positioned nodes and curve edges.
///
/// At most one node exists per rounded position and at most one edge per
/// unordered node pair. Nodes and edges record the graph's id as a
/// non-owning back-reference.
#[derive(Debug, Clone)]
pub struct Graph {
    id: Uuid,
    pub graph_type: Option<String>,
    pub attributes: Attributes,
    inner: StableUnGraph<Node, Edge>,
    by_position: HashMap<PointKey, NodeIndex>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            graph_type: None,
            attributes: Attributes::new(),
            inner: StableUnGraph::default(),
            by_position: HashMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Full copy under a fresh graph id.
    pub fn deep_copy(&self) -> Self {
        let mut out = self.clone();
        out.id = Uuid::new_v4();
        let gid = Some(out.id);
        let nodes: Vec<NodeIndex> = out.inner.node_indices().collect();
        for n in nodes {
            out.inner[n].graph_id = gid;
        }
        let edges: Vec<EdgeIndex> = out.inner.edge_indices().collect();
        for e in edges {
            out.inner[e].graph_id = gid;
        }
        out
    }

    pub(crate) fn inner(&self) -> &StableUnGraph<Node, Edge> {
        &self.inner
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    /// Inserts `node` unless its rounded position is taken; returns the index
    /// of the node now occupying that position.
    pub fn add_node(&mut self, mut node: Node) -> NodeIndex {
        let key = node.key();
        if let Some(&idx) = self.by_position.get(&key) {
            return idx;
        }
        node.graph_id = Some(self.id);
        let idx = self.inner.add_node(node);
        self.by_position.insert(key, idx);
        idx
    }

    /// Like [`Graph::add_node`], but folds `node` into an existing
    /// coincident node.
    pub fn upsert_node(&mut self, node: Node) -> NodeIndex {
        match self.by_position.get(&node.key()).copied() {
            Some(idx) => {
                self.inner[idx].absorb(&node);
                idx
            }
            None => self.add_node(node),
        }
    }

    /// Connects `a` and `b`. Returns `None` for a self-loop, a missing
    /// endpoint, or an existing edge between the pair.
    pub fn add_edge(&mut self, a: NodeIndex, b: NodeIndex, mut edge: Edge) -> Option<EdgeIndex> {
        if a == b || !self.inner.contains_node(a) || !self.inner.contains_node(b) {
            return None;
        }
        if self.inner.find_edge(a, b).is_some() {
            return None;
        }
        edge.graph_id = Some(self.id);
        Some(self.inner.add_edge(a, b, edge))
    }

    /// Adds both endpoints (reusing coincident nodes) and the edge.
    pub fn add_loose_edge(&mut self, loose: &LooseEdge) -> Option<EdgeIndex> {
        let a = self.add_node(loose.source.clone());
        let b = self.add_node(loose.target.clone());
        self.add_edge(a, b, loose.edge.clone())
    }

    /// Removes a node together with its incident edges.
    pub fn remove_node(&mut self, idx: NodeIndex) -> Option<Node> {
        let mut node = self.inner.remove_node(idx)?;
        if self.by_position.get(&node.key()) == Some(&idx) {
            self.by_position.remove(&node.key());
        }
        node.graph_id = None;
        Some(node)
    }

    pub fn remove_edge(&mut self, idx: EdgeIndex) -> Option<Edge> {
        let mut edge = self.inner.remove_edge(idx)?;
        edge.graph_id = None;
        Some(edge)
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&Node> {
        self.inner.node_weight(idx)
    }

    /// Mutable access for type/attribute edits; the position is fixed.
    pub fn node_mut(&mut self, idx: NodeIndex) -> Option<&mut Node> {
        self.inner.node_weight_mut(idx)
    }

    pub fn edge(&self, idx: EdgeIndex) -> Option<&Edge> {
        self.inner.edge_weight(idx)
    }

    pub fn edge_mut(&mut self, idx: EdgeIndex) -> Option<&mut Edge> {
        self.inner.edge_weight_mut(idx)
    }

    pub fn edge_endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.inner.edge_endpoints(idx)
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.node_indices()
    }

    pub fn edge_indices(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.inner.edge_indices()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> + '_ {
        self.inner.node_indices().map(|i| (i, &self.inner[i]))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, &Edge)> + '_ {
        self.inner.edge_indices().map(|i| (i, &self.inner[i]))
    }

    pub fn node_at(&self, p: Point3) -> Option<NodeIndex> {
        self.by_position.get(&PointKey::new(p)).copied()
    }

    pub fn find_node_by_id(&self, id: Uuid) -> Option<NodeIndex> {
        self.nodes().find(|(_, n)| n.id == id).map(|(i, _)| i)
    }

    pub fn find_edge(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.inner.find_edge(a, b)
    }

    pub fn incident_edges(&self, n: NodeIndex) -> Vec<EdgeIndex> {
        self.inner.edges(n).map(|e| e.id()).collect()
    }

    pub fn neighbors(&self, n: NodeIndex) -> Vec<NodeIndex> {
        self.inner.neighbors(n).collect()
    }

    pub fn valence(&self, n: NodeIndex) -> usize {
        self.inner.neighbors(n).count()
    }

    pub fn is_naked(&self, n: NodeIndex) -> bool {
        self.valence(n) <= 1
    }

    pub fn is_edge_naked(&self, e: EdgeIndex) -> bool {
        self.edge_endpoints(e)
            .is_some_and(|(a, b)| self.valence(a) == 1 || self.valence(b) == 1)
    }

    /// Endpoint of `e` opposite to `n`.
    pub fn opposite(&self, e: EdgeIndex, n: NodeIndex) -> Option<NodeIndex> {
        let (a, b) = self.edge_endpoints(e)?;
        if a == n {
            Some(b)
        } else if b == n {
            Some(a)
        } else {
            None
        }
    }

    /// Angle in degrees between the two incident edges of a valence-2 node,
    /// measured between their tangents leaving the node (180 = straight).
    pub fn node_angle(&self, n: NodeIndex) -> Option<f64> {
        let incident = self.incident_edges(n);
        let [e1, e2] = incident.as_slice() else {
            return None;
        };
        let d1 = self.leaving_direction(*e1, n)?;
        let d2 = self.leaving_direction(*e2, n)?;
        d1.angle_deg(d2)
    }

    fn leaving_direction(&self, e: EdgeIndex, n: NodeIndex) -> Option<Vec3> {
        let node = self.node(n)?;
        let pts = &self.edge(e)?.curve.points;
        let (first, last) = (*pts.first()?, *pts.last()?);
        if PointKey::new(first) == node.key() {
            Some(*pts.get(1)? - first)
        } else {
            Some(*pts.get(pts.len().checked_sub(2)?)? - last)
        }
    }

    /// Detached snapshot of an edge with copies of its endpoints.
    ///
    /// The source is the node at the curve's start so curve orientation is
    /// preserved.
    pub fn loose_edge(&self, e: EdgeIndex) -> Option<LooseEdge> {
        let (a, b) = self.edge_endpoints(e)?;
        let edge = self.edge(e)?.clone();
        let (na, nb) = (self.node(a)?.clone(), self.node(b)?.clone());
        let (source, target) = if PointKey::new(edge.curve.start()) == na.key() {
            (na, nb)
        } else {
            (nb, na)
        };
        Some(LooseEdge {
            source,
            target,
            edge,
        })
    }

    pub fn loose_edges(&self) -> Vec<LooseEdge> {
        self.edge_indices()
            .filter_map(|e| self.loose_edge(e))
            .collect()
    }

    pub fn node_list(&self) -> Vec<Node> {
        self.nodes().map(|(_, n)| n.clone()).collect()
    }

    /// Renumbers display ids `N0, N1, ...` in iteration order.
    pub fn set_node_ids(&mut self) {
        let order: Vec<NodeIndex> = self.inner.node_indices().collect();
        for (i, idx) in order.into_iter().enumerate() {
            self.inner[idx].display_id = format!("N{i}");
        }
    }

    /// Writes snapshot statistics into [`Graph::attributes`].
    pub fn refresh_summary(&mut self) {
        let connected = crate::algo::is_graph_fully_connected(self);
        let type_label = self.graph_type.clone().unwrap_or_else(|| UNSET_TYPE.to_owned());
        let a = &mut self.attributes;
        a.insert("NodeCount".into(), AttrValue::Int(self.inner.node_count() as i64));
        a.insert("EdgeCount".into(), AttrValue::Int(self.inner.edge_count() as i64));
        a.insert("Type".into(), AttrValue::Str(type_label));
        a.insert("IsFullyConnected".into(), AttrValue::Bool(connected));
    }
}
