use super::ConsensusError;
use crate::types::Address20;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The canonical internal peer record. Loader inputs use looser, historical
/// field names (`id`/`address`, `peer_target`/`p2pEndpoint`); this is the
/// normal form everything downstream of the loader actually works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rep {
    pub id: Address20,
    pub p2p_endpoint: String,
    pub order: Option<u32>,
}

/// Wire shape accepted from a peer file or REST response. Both `id`/`address`
/// and `peer_target`/`p2pEndpoint` spellings are accepted since both appear
/// across the corpus's channel-manage-data and get-reps fixtures.
#[derive(Debug, Deserialize)]
struct RepEntry {
    #[serde(alias = "address")]
    id: String,
    #[serde(alias = "p2pEndpoint")]
    peer_target: String,
    order: Option<u32>,
}

impl TryFrom<RepEntry> for Rep {
    type Error = ConsensusError;

    fn try_from(entry: RepEntry) -> Result<Self, Self::Error> {
        let id = entry
            .id
            .parse()
            .map_err(|e| ConsensusError::PeerLoad(format!("invalid rep address {:?}: {e}", entry.id)))?;
        Ok(Rep {
            id,
            p2p_endpoint: entry.peer_target,
            order: entry.order,
        })
    }
}

/// Yields the current ordered set of representatives. The network
/// transport behind a loader (filesystem, REST) is out of scope; only this
/// contract is.
#[async_trait]
pub trait RepLoader: Send + Sync {
    async fn load(&self) -> Result<Vec<Rep>, ConsensusError>;
}

/// Loads reps from a JSON file shaped like the channel-manage-data fixture:
/// `{"peers": [{"id", "peer_target", "order"}, ...]}`, or a bare array of
/// the same entries.
pub struct FileRepLoader {
    path: PathBuf,
}

impl FileRepLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileShape {
    Wrapped { peers: Vec<RepEntry> },
    Bare(Vec<RepEntry>),
}

#[async_trait]
impl RepLoader for FileRepLoader {
    async fn load(&self) -> Result<Vec<Rep>, ConsensusError> {
        load_from_path(&self.path).await
    }
}

async fn load_from_path(path: &Path) -> Result<Vec<Rep>, ConsensusError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConsensusError::PeerLoad(format!("reading {path:?}: {e}")))?;
    let shape: FileShape = serde_json::from_str(&contents)
        .map_err(|e| ConsensusError::PeerLoad(format!("parsing {path:?}: {e}")))?;
    let entries = match shape {
        FileShape::Wrapped { peers } => peers,
        FileShape::Bare(peers) => peers,
    };
    entries.into_iter().map(Rep::try_from).collect()
}

/// Interface-only stub for a REST-backed rep source. REST transport itself
/// is out of scope for this crate; this exists so `NodeConfig::RepSource`
/// has a non-file variant to construct against.
pub struct RestRepLoader {
    pub url: String,
}

impl RestRepLoader {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl RepLoader for RestRepLoader {
    async fn load(&self) -> Result<Vec<Rep>, ConsensusError> {
        Err(ConsensusError::PeerLoad(format!(
            "REST rep loading against {} is not implemented by this crate",
            self.url
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_wrapped_peer_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channel_manage_data.json");
        tokio::fs::write(
            &path,
            r#"{"peers": [{"id": "hx1111111111111111111111111111111111111111", "peer_target": "127.0.0.1:7100", "order": 1}]}"#,
        )
        .await
        .unwrap();

        let loader = FileRepLoader::new(path);
        let reps = loader.load().await.unwrap();
        assert_eq!(reps.len(), 1);
        assert_eq!(reps[0].p2p_endpoint, "127.0.0.1:7100");
        assert_eq!(reps[0].order, Some(1));
    }

    #[tokio::test]
    async fn loads_bare_array_with_alias_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("get_reps.json");
        tokio::fs::write(
            &path,
            r#"[{"address": "hx2222222222222222222222222222222222222222", "p2pEndpoint": "127.0.0.1:0"}]"#,
        )
        .await
        .unwrap();

        let loader = FileRepLoader::new(path);
        let reps = loader.load().await.unwrap();
        assert_eq!(reps.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_a_peer_load_error() {
        let loader = FileRepLoader::new("/nonexistent/channel_manage_data.json");
        assert!(loader.load().await.is_err());
    }
}
