//! Single-process cluster used by the standalone node and tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use dashmap::{DashMap, DashSet};
use futures_util::future::{self, BoxFuture, FutureExt};
use serde_json::Value;

use crate::cluster::{AdminClient, ClusterService, FeatureService, TemplateKind};
use crate::error::ClientError;

/// In-memory cluster state: membership, features and stored templates.
#[derive(Debug)]
pub struct InMemoryCluster {
    node_id: String,
    master: AtomicBool,
    features: DashSet<String>,
    templates: DashMap<(TemplateKind, String), Value>,
    puts: AtomicUsize,
    reject_puts: AtomicBool,
}

impl InMemoryCluster {
    pub fn new(node_id: impl Into<String>, master: bool) -> Self {
        Self {
            node_id: node_id.into(),
            master: AtomicBool::new(master),
            features: DashSet::new(),
            templates: DashMap::new(),
            puts: AtomicUsize::new(0),
            reject_puts: AtomicBool::new(false),
        }
    }

    pub fn with_features<I, S>(self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for feature in features {
            self.features.insert(feature.into());
        }
        self
    }

    pub fn set_master(&self, master: bool) {
        self.master.store(master, Ordering::SeqCst);
    }

    pub fn add_feature(&self, feature: impl Into<String>) {
        self.features.insert(feature.into());
    }

    /// Make every subsequent put fail, simulating an unavailable master.
    pub fn set_reject_puts(&self, reject: bool) {
        self.reject_puts.store(reject, Ordering::SeqCst);
    }

    pub fn template(&self, kind: TemplateKind, name: &str) -> Option<Value> {
        self.templates
            .get(&(kind, name.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Number of accepted put requests.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl ClusterService for InMemoryCluster {
    fn local_node_id(&self) -> String {
        self.node_id.clone()
    }

    fn is_elected_master(&self) -> bool {
        self.master.load(Ordering::SeqCst)
    }
}

impl FeatureService for InMemoryCluster {
    fn cluster_has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }
}

impl AdminClient for InMemoryCluster {
    fn installed_version<'a>(
        &'a self,
        kind: TemplateKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<u64>, ClientError>> {
        let version = self
            .template(kind, name)
            .and_then(|body| body.get("version").and_then(Value::as_u64));
        future::ready(Ok(version)).boxed()
    }

    fn put_template<'a>(
        &'a self,
        kind: TemplateKind,
        name: &'a str,
        body: Value,
    ) -> BoxFuture<'a, Result<(), ClientError>> {
        let result = if self.reject_puts.load(Ordering::SeqCst) {
            Err(ClientError::Unavailable(format!("put {} [{}]", kind, name)))
        } else {
            self.templates.insert((kind, name.to_string()), body);
            self.puts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        future::ready(result).boxed()
    }
}
