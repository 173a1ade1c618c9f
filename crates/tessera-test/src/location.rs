//! Identity of importable code

use std::borrow::Cow;
use std::fmt;
use tessera_primitives::Address;

/// Where a program or import comes from
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    /// The test script under execution
    TestScript,
    /// A named built-in module (`import Test`)
    Identifier(Cow<'static, str>),
    /// A path, resolved by the embedder (`import "./Foo.tes"`)
    String(String),
    /// A contract deployed on the ledger (`import Foo from 0x01`)
    Address {
        /// Account holding the contract
        address: Address,
        /// Contract name
        name: String,
    },
}

impl Location {
    /// Built-in cryptography module
    pub const CRYPTO: Location = Location::Identifier(Cow::Borrowed("Crypto"));

    /// Built-in testing module
    pub const TEST: Location = Location::Identifier(Cow::Borrowed("Test"));

    /// Built-in blockchain helper module
    pub const BLOCKCHAIN_HELPERS: Location =
        Location::Identifier(Cow::Borrowed("BlockchainHelpers"));

    /// Identifier location with an arbitrary name
    pub fn identifier(name: impl Into<String>) -> Self {
        Location::Identifier(Cow::Owned(name.into()))
    }

    /// Address location
    pub fn address(address: Address, name: impl Into<String>) -> Self {
        Location::Address {
            address,
            name: name.into(),
        }
    }

    /// Whether this is an address-qualified location
    pub fn is_address(&self) -> bool {
        matches!(self, Location::Address { .. })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::TestScript => f.write_str("<test script>"),
            Location::Identifier(name) => f.write_str(name),
            Location::String(path) => f.write_str(path),
            Location::Address { address, name } if name.is_empty() => write!(f, "A.{}", address.hex()),
            Location::Address { address, name } => write!(f, "A.{}.{}", address.hex(), name),
        }
    }
}

/// Modules provided by the runtime rather than the embedder
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinModule {
    /// `Crypto`
    Crypto,
    /// `Test`
    Test,
    /// `BlockchainHelpers`
    BlockchainHelpers,
}

impl BuiltinModule {
    /// Built-in module at `location`, if any
    pub fn from_location(location: &Location) -> Option<Self> {
        match location {
            Location::Identifier(name) => match name.as_ref() {
                "Crypto" => Some(BuiltinModule::Crypto),
                "Test" => Some(BuiltinModule::Test),
                "BlockchainHelpers" => Some(BuiltinModule::BlockchainHelpers),
                _ => None,
            },
            _ => None,
        }
    }

    /// Location of this module
    pub fn location(&self) -> Location {
        match self {
            BuiltinModule::Crypto => Location::CRYPTO,
            BuiltinModule::Test => Location::TEST,
            BuiltinModule::BlockchainHelpers => Location::BLOCKCHAIN_HELPERS,
        }
    }

    /// Module name as written in an import
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinModule::Crypto => "Crypto",
            BuiltinModule::Test => "Test",
            BuiltinModule::BlockchainHelpers => "BlockchainHelpers",
        }
    }
}
