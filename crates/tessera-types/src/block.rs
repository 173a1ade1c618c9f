//! Blocks and events

use crate::value::Value;
use rlp::RlpStream;
use tessera_crypto::sha3_256;
use tessera_primitives::{BlockHeight, H256};

/// Committed block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Block height (genesis is 0)
    pub height: BlockHeight,
    /// Block id
    pub id: H256,
    /// Parent block id
    pub parent_id: H256,
    /// Transactions included, in execution order
    pub transaction_ids: Vec<H256>,
}

impl Block {
    /// Create a block, deriving its id from its contents
    pub fn new(height: BlockHeight, parent_id: H256, transaction_ids: Vec<H256>) -> Self {
        let mut s = RlpStream::new_list(3);
        s.append(&height);
        s.append(&parent_id);
        s.append_list::<H256, H256>(&transaction_ids);
        let id = sha3_256(&s.out());
        Self {
            height,
            id,
            parent_id,
            transaction_ids,
        }
    }

    /// Genesis block
    pub fn genesis() -> Self {
        Self::new(0, H256::ZERO, Vec::new())
    }
}

/// Event emitted by a transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// Event type identifier
    pub event_type: String,
    /// Emitting transaction
    pub transaction_id: H256,
    /// Position of the emitting transaction in its block
    pub transaction_index: u32,
    /// Position of the event within its transaction
    pub event_index: u32,
    /// Event value
    pub payload: Value,
}
