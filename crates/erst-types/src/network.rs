//! Networks and replay targets.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Stellar network a transaction can be replayed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
    Futurenet,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Testnet, Network::Mainnet, Network::Futurenet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
            Network::Futurenet => "futurenet",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" | "public" => Ok(Network::Mainnet),
            "futurenet" => Ok(Network::Futurenet),
            other => Err(format!(
                "unknown network '{}' (expected testnet, mainnet or futurenet)",
                other
            )),
        }
    }
}

/// What a replay branch runs against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Target {
    /// Ledger state of a network.
    Network(Network),
    /// A local WASM artifact substituted for the deployed contract code.
    Wasm(PathBuf),
}

impl Target {
    /// Short identifier used in branch labels and logs.
    pub fn id(&self) -> String {
        match self {
            Target::Network(n) => n.to_string(),
            Target::Wasm(path) => format!(
                "wasm:{}",
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            ),
        }
    }

    pub fn network(&self) -> Option<Network> {
        match self {
            Target::Network(n) => Some(*n),
            Target::Wasm(_) => None,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id())
    }
}
