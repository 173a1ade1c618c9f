//! Import configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tessera_primitives::Address;

/// Maps import paths to the addresses their contracts are deployed at
///
/// ```toml
/// [addresses]
/// "./FooContract.tes" = "0x01"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Import path to deployed address
    pub addresses: HashMap<String, Address>,
}

impl Configuration {
    /// Parse a configuration from TOML
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Address configured for `path`
    pub fn address_of(&self, path: &str) -> Option<Address> {
        self.addresses.get(path).copied()
    }

    /// Add a mapping
    pub fn with_address(mut self, path: impl Into<String>, address: Address) -> Self {
        self.addresses.insert(path.into(), address);
        self
    }
}
