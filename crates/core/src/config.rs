//! Configuration management for tmesh.

use crate::error::{CoreError, CoreResult};
use crate::hashname::Hashname;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmeshConfig {
    pub node: NodeConfig,
    pub communities: Vec<CommunityConfig>,
    pub radio: RadioConfig,
    pub sim: SimConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Hex hashname of this node. Random when absent.
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityConfig {
    pub name: String,
    /// Lost-signal, own-signal and stream-default mediums, in that order.
    pub mediums: [u32; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Number of channels a medium hops across.
    pub channels: u32,
    /// Base cycles per tempo step.
    pub window: u32,
    /// Extra seed-derived cycles added to each step, inclusive.
    pub jitter: u32,
    /// Noise floor in dBm; simulated receptions report a level above it.
    pub noise_floor: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub nodes: usize,
    pub cycles: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of the human format.
    pub json: bool,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            channels: 8,
            window: 4,
            jitter: 3,
            noise_floor: -90,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            nodes: 2,
            cycles: 2_000,
        }
    }
}

impl Default for TmeshConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl TmeshConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(
            path = %path.display(),
            communities = config.communities.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn from_toml(content: &str) -> CoreResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            node: NodeConfig::default(),
            communities: vec![CommunityConfig {
                name: "tmesh".to_string(),
                mediums: [1, 2, 3],
            }],
            radio: RadioConfig::default(),
            sim: SimConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Resolve the configured identity, generating one when unset.
    pub fn hashname(&self) -> CoreResult<Hashname> {
        match &self.node.id {
            Some(id) => id.parse(),
            None => Ok(Hashname::random()),
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.radio.channels == 0 {
            return Err(CoreError::Config("radio.channels must be non-zero".to_string()));
        }
        for community in &self.communities {
            if community.name.is_empty() {
                return Err(CoreError::Config("community name must not be empty".to_string()));
            }
            if community.mediums.contains(&0) {
                return Err(CoreError::Config(format!(
                    "community {} has a zero medium",
                    community.name
                )));
            }
        }
        Ok(())
    }
}
