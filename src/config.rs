//! Layered node configuration: compiled-in defaults overlaid with
//! `SPEED_CONSENSUS_*` environment variables, following the env-override
//! convention used for node configuration across the corpus.

use crate::consensus::ConsensusError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Where the current rep set is loaded from.
#[derive(Debug, Clone)]
pub enum RepSource {
    File(PathBuf),
    Rest { url: String, poll_interval: Duration },
}

impl Default for RepSource {
    fn default() -> Self {
        RepSource::File(PathBuf::from("channel_manage_data.json"))
    }
}

/// Voting ratios and round timing for the consensus core.
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    pub voting_ratio_block: f64,
    pub voting_ratio_leader: f64,
    pub rep_source: RepSource,
    pub channel_timeout: Duration,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            voting_ratio_block: 0.67,
            voting_ratio_leader: 0.51,
            rep_source: RepSource::default(),
            channel_timeout: Duration::from_secs(10),
        }
    }
}

/// Top-level node configuration. Fields for out-of-scope collaborators
/// (storage, REST) are modeled as inert so the core can be constructed
/// uniformly without this crate implementing those collaborators.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub consensus: ConsensusConfig,
    pub storage_path: PathBuf,
    pub rest_bind_addr: SocketAddr,
    pub log_level: Level,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            consensus: ConsensusConfig::default(),
            storage_path: PathBuf::from("./data"),
            rest_bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 9000),
            log_level: Level::INFO,
        }
    }
}

impl NodeConfig {
    /// Overlays `NodeConfig::default()` with `SPEED_CONSENSUS_*` environment
    /// variables. Invalid overrides are reported as `ConsensusError::Config`,
    /// never a panic.
    pub fn from_env() -> Result<Self, ConsensusError> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("SPEED_CONSENSUS_VOTING_RATIO_BLOCK") {
            config.consensus.voting_ratio_block = parse_ratio(&raw, "SPEED_CONSENSUS_VOTING_RATIO_BLOCK")?;
        }
        if let Ok(raw) = std::env::var("SPEED_CONSENSUS_VOTING_RATIO_LEADER") {
            config.consensus.voting_ratio_leader = parse_ratio(&raw, "SPEED_CONSENSUS_VOTING_RATIO_LEADER")?;
        }
        if let Ok(raw) = std::env::var("SPEED_CONSENSUS_CHANNEL_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                ConsensusError::Config(format!("SPEED_CONSENSUS_CHANNEL_TIMEOUT_SECS: not a number: {raw:?}"))
            })?;
            config.consensus.channel_timeout = Duration::from_secs(secs);
        }
        if let Ok(raw) = std::env::var("SPEED_CONSENSUS_REP_FILE") {
            config.consensus.rep_source = RepSource::File(PathBuf::from(raw));
        }

        Ok(config)
    }
}

fn parse_ratio(raw: &str, var_name: &str) -> Result<f64, ConsensusError> {
    let value: f64 = raw
        .parse()
        .map_err(|_| ConsensusError::Config(format!("{var_name}: not a number: {raw:?}")))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConsensusError::Config(format!(
            "{var_name}: voting ratio {value} out of range (0, 1]"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn default_config_has_spec_ratios() {
        let config = NodeConfig::default();
        assert_eq!(config.consensus.voting_ratio_block, 0.67);
        assert_eq!(config.consensus.voting_ratio_leader, 0.51);
    }

    #[test]
    #[serial]
    fn from_env_overrides_voting_ratio() {
        std::env::set_var("SPEED_CONSENSUS_VOTING_RATIO_BLOCK", "0.8");
        let config = NodeConfig::from_env().unwrap();
        assert_eq!(config.consensus.voting_ratio_block, 0.8);
        std::env::remove_var("SPEED_CONSENSUS_VOTING_RATIO_BLOCK");
    }

    #[test]
    #[serial]
    fn from_env_rejects_out_of_range_ratio() {
        std::env::set_var("SPEED_CONSENSUS_VOTING_RATIO_LEADER", "1.5");
        let err = NodeConfig::from_env().unwrap_err();
        assert!(matches!(err, ConsensusError::Config(_)));
        std::env::remove_var("SPEED_CONSENSUS_VOTING_RATIO_LEADER");
    }
}
