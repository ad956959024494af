//! Path offers advertised to the surrounding mesh runtime

use serde::{Deserialize, Serialize};

/// A `"tmesh"` path: how to find us in one community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathOffer {
    /// Always [`PathOffer::TYPE`]
    #[serde(rename = "type")]
    pub kind: String,
    /// Community name
    pub name: String,
    /// Lost-signal medium of the community
    pub medium: u32,
}

impl PathOffer {
    /// Path type handled here.
    pub const TYPE: &'static str = "tmesh";

    /// Offer for a community.
    pub fn new(name: &str, medium: u32) -> Self {
        Self {
            kind: Self::TYPE.to_string(),
            name: name.to_string(),
            medium,
        }
    }

    /// Parse an incoming offer. Malformed JSON and other path types give `None`.
    pub fn parse(json: &str) -> Option<Self> {
        let offer: PathOffer = serde_json::from_str(json).ok()?;
        (offer.kind == Self::TYPE && !offer.name.is_empty()).then_some(offer)
    }

    /// Serialize for the mesh runtime.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
