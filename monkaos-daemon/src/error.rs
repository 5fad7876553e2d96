//! Error types for monkaos.

use monkaos_cluster::ClusterError;

/// Main error type for chaos engine operations.
#[derive(Debug, thiserror::Error)]
pub enum MonkeyError {
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Configuration loaded but holds unusable values.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with it.
        reason: String,
    },

    /// Every namespace is excluded, or the cluster has none.
    #[error("no eligible namespaces: namespace list is empty after exclusions")]
    NamespaceListEmpty,

    /// A cluster listing call failed during selection.
    #[error("cluster error: {0}")]
    Cluster(#[from] ClusterError),
}

/// Result type alias for chaos engine operations.
pub type Result<T> = std::result::Result<T, MonkeyError>;
