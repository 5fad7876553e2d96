//! Victim selection.
//!
//! Draws pods at random from the eligible (non-excluded) namespaces. A
//! namespace that comes back empty costs one retry from a budget shared by
//! the whole selection; once the budget is spent, whatever was collected so
//! far is returned.

use crate::config::Config;
use crate::error::{MonkeyError, Result};
use monkaos_cluster::ClusterClient;
use monkaos_core::{RetryPolicy, Strategy, Victim};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Picks victims from the cluster.
#[derive(Debug)]
pub struct VictimSelector<C> {
    cluster: Arc<C>,
    excluded: HashSet<String>,
    retry: RetryPolicy,
}

impl<C: ClusterClient> VictimSelector<C> {
    /// Create a selector.
    pub fn new(cluster: Arc<C>, excluded: HashSet<String>, retry: RetryPolicy) -> Self {
        Self {
            cluster,
            excluded,
            retry,
        }
    }

    /// Create a selector from the `chaos` and `selection` config sections.
    pub fn from_config(cluster: Arc<C>, config: &Config) -> Self {
        Self::new(
            cluster,
            config.chaos.excluded_set(),
            config.selection.retry_policy(),
        )
    }

    /// Namespaces that are not excluded.
    ///
    /// # Errors
    ///
    /// [`MonkeyError::NamespaceListEmpty`] if none remain, or
    /// [`MonkeyError::Cluster`] if the listing fails.
    pub async fn eligible_namespaces(&self) -> Result<Vec<String>> {
        let eligible: Vec<String> = self
            .cluster
            .list_namespaces()
            .await?
            .into_iter()
            .filter(|ns| !self.excluded.contains(ns))
            .collect();

        if eligible.is_empty() {
            return Err(MonkeyError::NamespaceListEmpty);
        }
        Ok(eligible)
    }

    /// Select up to `count` victims using `strategy`.
    ///
    /// The result may be shorter than `count` when the retry budget runs
    /// out, and may contain the same pod more than once.
    pub async fn select<R>(
        &self,
        count: usize,
        strategy: Strategy,
        rng: &mut R,
    ) -> Result<Vec<Victim>>
    where
        R: Rng + Send,
    {
        self.select_until(count, strategy, rng, &CancellationToken::new())
            .await
    }

    /// Like [`select`](Self::select), but a retry backoff is cut short when
    /// `shutdown` fires and the victims collected so far are returned.
    pub async fn select_until<R>(
        &self,
        count: usize,
        strategy: Strategy,
        rng: &mut R,
        shutdown: &CancellationToken,
    ) -> Result<Vec<Victim>>
    where
        R: Rng + Send,
    {
        match strategy {
            Strategy::RandomPodRandomNamespace => {
                self.random_pod_random_namespace(count, rng, shutdown).await
            }
        }
    }

    async fn random_pod_random_namespace<R>(
        &self,
        count: usize,
        rng: &mut R,
        shutdown: &CancellationToken,
    ) -> Result<Vec<Victim>>
    where
        R: Rng + Send,
    {
        let namespaces = self.eligible_namespaces().await?;
        let mut victims = Vec::new();
        let mut retries = 0;

        while victims.len() < count {
            let Some(namespace) = namespaces.choose(rng) else {
                return Err(MonkeyError::NamespaceListEmpty);
            };

            let pods = self.cluster.list_pods(namespace).await?;
            match pods.choose(rng) {
                Some(pod) => {
                    tracing::debug!(namespace = %namespace, pod = %pod, "Selected victim");
                    victims.push(Victim::new(namespace.clone(), pod.clone()));
                }
                None => {
                    // Checked before sleeping: a spent budget returns at once.
                    if self.retry.exhausted(retries) {
                        tracing::warn!(
                            "Retry budget exhausted after {} empty namespaces, returning {}/{} victims",
                            retries,
                            victims.len(),
                            count
                        );
                        return Ok(victims);
                    }
                    retries += 1;
                    tracing::debug!(
                        namespace = %namespace,
                        "No pods in namespace, retrying ({}/{})",
                        retries,
                        self.retry.max_retries
                    );
                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            tracing::info!(
                                "Selection interrupted by shutdown with {}/{} victims",
                                victims.len(),
                                count
                            );
                            return Ok(victims);
                        }
                        _ = tokio::time::sleep(self.retry.backoff) => {}
                    }
                }
            }
        }

        Ok(victims)
    }
}
