//! Stateful push session against a graph store.
//!
//! The session owns the connection lifecycle (connect, push or clean, close)
//! and keeps a timestamped message log. Store failures are logged and turned
//! into a `false` result; they never escape as errors.

use core::fmt;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::graph::Graph;
use crate::push::{NodeRecord, RelationshipRecord, graph_records};

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// A graph store accepting merge-by-key writes.
pub trait GraphSink {
    type Error: fmt::Display;

    fn connect(&mut self, credentials: &Credentials) -> Result<(), Self::Error>;
    fn merge_node(&mut self, record: &NodeRecord) -> Result<(), Self::Error>;
    fn merge_relationship(&mut self, record: &RelationshipRecord) -> Result<(), Self::Error>;
    fn clear(&mut self) -> Result<(), Self::Error>;
    fn close(&mut self) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

pub struct Session<S> {
    sink: S,
    credentials: Option<Credentials>,
    connected: bool,
    log: Vec<LogEntry>,
}

impl<S: GraphSink> Session<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            credentials: None,
            connected: false,
            log: Vec::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Credentials of the last connection attempt.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn note(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(%message, "session");
        self.log.push(LogEntry {
            at: Utc::now(),
            message,
        });
    }

    /// Connects, reusing a live connection opened with the same credentials.
    pub fn connect(&mut self, credentials: Credentials) -> bool {
        if self.connected && self.credentials.as_ref() == Some(&credentials) {
            return true;
        }
        if self.connected {
            self.close();
        }

        let result = self.sink.connect(&credentials);
        self.credentials = Some(credentials);
        match result {
            Ok(()) => {
                self.connected = true;
                self.note("connected");
                true
            }
            Err(e) => {
                warn!(error = %e, "connect failed");
                self.note(format!("connect failed: {e}"));
                false
            }
        }
    }

    /// Merges every node and edge of `graphs` into the store.
    pub fn push(&mut self, graphs: &[Graph]) -> bool {
        if !self.connected {
            self.note("push skipped: not connected");
            return false;
        }

        let mut nodes = 0_usize;
        let mut relationships = 0_usize;
        for g in graphs {
            let records = graph_records(g);
            for r in &records.nodes {
                if let Err(e) = self.sink.merge_node(r) {
                    return self.fail("push", e);
                }
            }
            for r in &records.relationships {
                if let Err(e) = self.sink.merge_relationship(r) {
                    return self.fail("push", e);
                }
            }
            nodes += records.nodes.len();
            relationships += records.relationships.len();
        }
        self.note(format!("pushed {nodes} nodes and {relationships} relationships"));
        true
    }

    /// Deletes everything in the store.
    pub fn clean(&mut self) -> bool {
        if !self.connected {
            self.note("clean skipped: not connected");
            return false;
        }
        match self.sink.clear() {
            Ok(()) => {
                self.note("store cleaned");
                true
            }
            Err(e) => self.fail("clean", e),
        }
    }

    pub fn close(&mut self) -> bool {
        if !self.connected {
            return true;
        }
        self.connected = false;
        match self.sink.close() {
            Ok(()) => {
                self.note("closed");
                true
            }
            Err(e) => self.fail("close", e),
        }
    }

    fn fail(&mut self, op: &str, e: S::Error) -> bool {
        warn!(op, error = %e, "store operation failed");
        self.note(format!("{op} failed: {e}"));
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemorySinkError {
    #[error("not connected")]
    NotConnected,
    #[error("authentication failed for user {0}")]
    Unauthorized(String),
}

/// In-process store keyed like a real graph database.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    password: Option<String>,
    connected: bool,
    pub nodes: BTreeMap<String, NodeRecord>,
    pub relationships: BTreeMap<(String, String, String), RelationshipRecord>,
}

impl MemorySink {
    /// A sink that only accepts `password`.
    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
            ..Self::default()
        }
    }

    fn ensure_connected(&self) -> Result<(), MemorySinkError> {
        if self.connected {
            Ok(())
        } else {
            Err(MemorySinkError::NotConnected)
        }
    }
}

impl GraphSink for MemorySink {
    type Error = MemorySinkError;

    fn connect(&mut self, credentials: &Credentials) -> Result<(), Self::Error> {
        if self.password.as_ref().is_some_and(|p| p != &credentials.password) {
            return Err(MemorySinkError::Unauthorized(credentials.user.clone()));
        }
        self.connected = true;
        Ok(())
    }

    fn merge_node(&mut self, record: &NodeRecord) -> Result<(), Self::Error> {
        self.ensure_connected()?;
        self.nodes
            .entry(record.key.clone())
            .and_modify(|r| r.properties.extend(record.properties.clone()))
            .or_insert_with(|| record.clone());
        Ok(())
    }

    fn merge_relationship(&mut self, record: &RelationshipRecord) -> Result<(), Self::Error> {
        self.ensure_connected()?;
        self.relationships
            .entry(record.key())
            .and_modify(|r| r.properties.extend(record.properties.clone()))
            .or_insert_with(|| record.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.ensure_connected()?;
        self.nodes.clear();
        self.relationships.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.connected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sg_core::Point3;

    use super::{Credentials, MemorySink, Session};
    use crate::graph::{Graph, LooseEdge};

    fn creds(password: &str) -> Credentials {
        Credentials {
            uri: "mem://local".into(),
            user: "tester".into(),
            password: password.into(),
        }
    }

    fn sample() -> Graph {
        let mut g = Graph::new();
        g.add_loose_edge(&LooseEdge::line(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)));
        g.add_loose_edge(&LooseEdge::line(Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)));
        g.set_node_ids();
        g
    }

    #[test]
    fn push_is_idempotent() {
        let mut s = Session::new(MemorySink::default());
        assert!(s.connect(creds("pw")));
        assert!(s.push(&[sample()]));
        let g = sample();
        assert!(s.push(std::slice::from_ref(&g)));
        assert!(s.push(std::slice::from_ref(&g)));

        assert_eq!(s.sink().nodes.len(), 3);
        assert_eq!(s.sink().relationships.len(), 2);
        assert!(s.log().len() >= 4);

        assert!(s.clean());
        assert!(s.sink().nodes.is_empty());
        assert!(s.close());
        assert!(!s.is_connected());
    }

    #[test]
    fn failures_are_reported_not_raised() {
        let mut s = Session::new(MemorySink::with_password("secret"));
        assert!(!s.push(&[sample()]));
        assert!(!s.connect(creds("wrong")));
        assert!(!s.is_connected());
        assert_eq!(s.credentials().map(|c| c.user.as_str()), Some("tester"));

        assert!(s.connect(creds("secret")));
        assert!(s.connect(creds("secret")));
        assert!(s.push(&[sample()]));
        assert!(s.log().iter().any(|e| e.message.contains("connect failed")));
    }

    #[test]
    fn debug_output_hides_password() {
        let text = format!("{:?}", creds("hunter2"));
        assert!(!text.contains("hunter2"));
    }
}
