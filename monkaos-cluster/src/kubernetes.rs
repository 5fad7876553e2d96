//! Kubernetes-backed cluster client.

use super::{ClusterClient, ClusterError, ClusterResult};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::api::{DeleteParams, ListParams};
use kube::{Api, Client};

/// Cluster client backed by a kube-rs [`Client`].
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl std::fmt::Debug for KubeCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeCluster").finish_non_exhaustive()
    }
}

impl KubeCluster {
    /// Wrap an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the ambient configuration and verify the API server
    /// answers.
    ///
    /// In-cluster service-account configuration is tried first, then the
    /// local kubeconfig.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::Connection`] if no configuration can be
    /// inferred or the API server cannot be reached.
    pub async fn connect() -> ClusterResult<Self> {
        let client = Client::try_default()
            .await
            .map_err(|e| ClusterError::Connection(e.to_string()))?;

        let version = client
            .apiserver_version()
            .await
            .map_err(|e| ClusterError::Connection(format!("unable to verify api server: {e}")))?;

        tracing::info!(
            "Connected to Kubernetes API server {}.{} ({})",
            version.major,
            version.minor,
            version.git_version
        );

        Ok(Self::new(client))
    }
}

/// Whether a pod is a candidate for termination: running and not already
/// on its way out.
fn is_candidate(pod: &Pod) -> bool {
    let phase = pod.status.as_ref().and_then(|status| status.phase.as_deref());
    candidate_state(phase, pod.metadata.deletion_timestamp.is_some())
}

fn candidate_state(phase: Option<&str>, terminating: bool) -> bool {
    !terminating && phase == Some("Running")
}

fn api_error(err: kube::Error) -> ClusterError {
    ClusterError::Api(err.to_string())
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn list_namespaces(&self) -> ClusterResult<Vec<String>> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(api_error)?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect())
    }

    async fn list_pods(&self, namespace: &str) -> ClusterResult<Vec<String>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(api_error)?;

        Ok(list
            .items
            .into_iter()
            .filter(is_candidate)
            .filter_map(|pod| pod.metadata.name)
            .collect())
    }

    async fn delete_pod(
        &self,
        namespace: &str,
        name: &str,
        grace_period_secs: u32,
    ) -> ClusterResult<()> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = DeleteParams {
            grace_period_seconds: Some(grace_period_secs),
            ..DeleteParams::default()
        };

        match api.delete(name, &params).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(resp)) if resp.code == 404 => Err(ClusterError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            Err(e) => Err(api_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_pod_is_candidate() {
        assert!(candidate_state(Some("Running"), false));
    }

    #[test]
    fn terminating_pod_is_not_candidate() {
        assert!(!candidate_state(Some("Running"), true));
    }

    #[test]
    fn non_running_pods_are_not_candidates() {
        assert!(!candidate_state(Some("Pending"), false));
        assert!(!candidate_state(Some("Succeeded"), false));
        assert!(!candidate_state(None, false));
    }

    #[test]
    fn pod_without_status_is_not_candidate() {
        assert!(!is_candidate(&Pod::default()));
    }
}
