//! # monkaos-cluster
//!
//! Cluster API boundary for monkaos.
//!
//! The chaos engine only ever needs three calls against the cluster: list
//! namespaces, list the pods of one namespace, and delete a pod. This crate
//! defines them as the [`ClusterClient`] trait and ships two
//! implementations:
//! - [`KubeCluster`]: talks to a real API server through kube-rs
//!   (feature `kube`, on by default)
//! - [`MockCluster`]: in-memory, with failure injection and a deletion log
//!   for tests
//!
//! Implementations must be safe for concurrent use; every task executor of
//! a cycle shares the same client.

#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "kube")]
mod kubernetes;
mod mock;

#[cfg(feature = "kube")]
pub use kubernetes::KubeCluster;
pub use mock::{DeletedPod, MockCluster};

use async_trait::async_trait;
use thiserror::Error;

/// Cluster API errors.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The API server rejected or failed the request.
    #[error("cluster api error: {0}")]
    Api(String),

    /// The pod does not exist (already gone, or never did).
    #[error("pod not found: {namespace}/{name}")]
    NotFound {
        /// Namespace of the missing pod.
        namespace: String,
        /// Name of the missing pod.
        name: String,
    },

    /// Could not reach or authenticate against the API server.
    #[error("cluster connection failed: {0}")]
    Connection(String),
}

/// Result type alias for cluster operations.
pub type ClusterResult<T> = std::result::Result<T, ClusterError>;

/// The cluster operations the chaos engine consumes.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Names of every namespace in the cluster.
    async fn list_namespaces(&self) -> ClusterResult<Vec<String>>;

    /// Names of the candidate pods in `namespace`.
    async fn list_pods(&self, namespace: &str) -> ClusterResult<Vec<String>>;

    /// Delete one pod, allowing it `grace_period_secs` to shut down cleanly.
    async fn delete_pod(
        &self,
        namespace: &str,
        name: &str,
        grace_period_secs: u32,
    ) -> ClusterResult<()>;
}
