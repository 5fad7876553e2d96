//! Mock cluster for testing.
//!
//! Holds namespaces and pods in memory, records every deletion, and lets
//! tests inject failures and transient emptiness.

use super::{ClusterClient, ClusterError, ClusterResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A deletion recorded by [`MockCluster`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletedPod {
    /// Namespace of the deleted pod.
    pub namespace: String,
    /// Name of the deleted pod.
    pub name: String,
    /// Grace period the caller asked for.
    pub grace_period_secs: u32,
}

/// In-memory cluster.
///
/// Clones share state, so a test can keep one handle for assertions while
/// the engine holds another.
#[derive(Debug, Default)]
pub struct MockCluster {
    inner: Arc<Mutex<MockClusterInner>>,
}

#[derive(Debug, Default)]
struct MockClusterInner {
    namespaces: BTreeMap<String, Vec<String>>,
    deleted: Vec<DeletedPod>,
    delete_attempts: usize,
    namespace_list_calls: usize,
    pod_list_calls: usize,
    /// Remaining listings that report the namespace as empty.
    empty_listings: HashMap<String, u32>,
    failing_pods: HashSet<(String, String)>,
    fail_list_namespaces: Option<String>,
    fail_list_pods: Option<String>,
    fail_next_delete: Option<String>,
    delete_latency: Duration,
}

impl MockCluster {
    /// Create an empty mock cluster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty namespace.
    pub fn add_namespace(&self, namespace: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.namespaces.entry(namespace.to_string()).or_default();
    }

    /// Add a pod, creating its namespace if needed.
    pub fn add_pod(&self, namespace: &str, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .namespaces
            .entry(namespace.to_string())
            .or_default()
            .push(name.to_string());
    }

    /// Add `count` pods named `{prefix}{i}` to `namespace`.
    pub fn add_pods(&self, namespace: &str, prefix: &str, count: usize) {
        for i in 0..count {
            self.add_pod(namespace, &format!("{prefix}{i}"));
        }
    }

    /// Report `namespace` as having no pods for its next `listings` listings.
    pub fn empty_for(&self, namespace: &str, listings: u32) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .empty_listings
            .insert(namespace.to_string(), listings);
    }

    /// Make every delete of `namespace/name` fail.
    pub fn fail_delete_of(&self, namespace: &str, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .failing_pods
            .insert((namespace.to_string(), name.to_string()));
    }

    /// Cause the next delete to fail with the given error.
    pub fn fail_next_delete(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_delete = Some(error.to_string());
    }

    /// Cause the next namespace listing to fail with the given error.
    pub fn fail_list_namespaces(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_list_namespaces = Some(error.to_string());
    }

    /// Cause the next pod listing to fail with the given error.
    pub fn fail_list_pods(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_list_pods = Some(error.to_string());
    }

    /// Make every delete take `latency` before it completes.
    pub fn set_delete_latency(&self, latency: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.delete_latency = latency;
    }

    /// Successful deletions, in completion order.
    pub fn deleted(&self) -> Vec<DeletedPod> {
        let inner = self.inner.lock().unwrap();
        inner.deleted.clone()
    }

    /// Delete calls made, successful or not.
    pub fn delete_attempts(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.delete_attempts
    }

    /// Number of `list_namespaces` calls made.
    pub fn namespace_list_calls(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.namespace_list_calls
    }

    /// Number of `list_pods` calls made.
    pub fn pod_list_calls(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.pod_list_calls
    }

    /// Pods currently present in `namespace`.
    pub fn pods(&self, namespace: &str) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.namespaces.get(namespace).cloned().unwrap_or_default()
    }
}

impl Clone for MockCluster {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl ClusterClient for MockCluster {
    async fn list_namespaces(&self) -> ClusterResult<Vec<String>> {
        let mut inner = self.inner.lock().unwrap();
        inner.namespace_list_calls += 1;

        if let Some(error) = inner.fail_list_namespaces.take() {
            return Err(ClusterError::Api(error));
        }

        Ok(inner.namespaces.keys().cloned().collect())
    }

    async fn list_pods(&self, namespace: &str) -> ClusterResult<Vec<String>> {
        let mut inner = self.inner.lock().unwrap();
        inner.pod_list_calls += 1;

        if let Some(error) = inner.fail_list_pods.take() {
            return Err(ClusterError::Api(error));
        }

        if let Some(remaining) = inner.empty_listings.get_mut(namespace) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(Vec::new());
            }
        }

        Ok(inner.namespaces.get(namespace).cloned().unwrap_or_default())
    }

    async fn delete_pod(
        &self,
        namespace: &str,
        name: &str,
        grace_period_secs: u32,
    ) -> ClusterResult<()> {
        let latency = {
            let mut inner = self.inner.lock().unwrap();
            inner.delete_attempts += 1;
            inner.delete_latency
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut inner = self.inner.lock().unwrap();

        if let Some(error) = inner.fail_next_delete.take() {
            return Err(ClusterError::Api(error));
        }

        if inner
            .failing_pods
            .contains(&(namespace.to_string(), name.to_string()))
        {
            return Err(ClusterError::Api(format!(
                "pods \"{name}\" is forbidden: injected failure"
            )));
        }

        let pods = inner.namespaces.get_mut(namespace);
        let position = pods
            .as_ref()
            .and_then(|pods| pods.iter().position(|pod| pod == name));
        match (pods, position) {
            (Some(pods), Some(index)) => {
                pods.remove(index);
            }
            _ => {
                return Err(ClusterError::NotFound {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                })
            }
        }

        inner.deleted.push(DeletedPod {
            namespace: namespace.to_string(),
            name: name.to_string(),
            grace_period_secs,
        });
        Ok(())
    }
}
