//! Transactions and their two-phase signing
//!
//! A transaction is signed twice. Authorizers other than the payer sign the
//! *payload* (script, arguments, proposal key, payer, authorizers); the payer
//! then signs the *envelope*, which is the payload together with the payload
//! signatures. Both messages are RLP-encoded and prefixed with a fixed domain
//! tag so that they can never be confused with other signed data.

use bytes::Bytes;
use rlp::{Encodable, RlpStream};
use tessera_crypto::{sha3_256, CryptoResult, Signer};
use tessera_primitives::{Address, SequenceNumber, H256};

/// Default computation limit for transactions built by the test backend
pub const DEFAULT_GAS_LIMIT: u64 = 9999;

const DOMAIN_TAG: &[u8] = b"TESSERA-V0.0-transaction";

/// Domain tag right-padded to 32 bytes
pub fn transaction_domain_tag() -> [u8; 32] {
    let mut tag = [0u8; 32];
    tag[..DOMAIN_TAG.len()].copy_from_slice(DOMAIN_TAG);
    tag
}

/// Key that proposes the transaction and whose sequence number it consumes
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ProposalKey {
    /// Proposer account
    pub address: Address,
    /// Key index on the proposer account
    pub key_index: u32,
    /// Expected sequence number of that key
    pub sequence_number: SequenceNumber,
}

/// Signature over the payload or envelope
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionSignature {
    /// Signing account
    pub address: Address,
    /// Key index on the signing account
    pub key_index: u32,
    /// Raw signature bytes
    pub signature: Vec<u8>,
}

impl Encodable for TransactionSignature {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.address);
        s.append(&self.key_index);
        s.append(&self.signature);
    }
}

/// Ledger transaction
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Transaction {
    /// Script source
    pub script: Bytes,
    /// Encoded arguments
    pub arguments: Vec<Vec<u8>>,
    /// Block the transaction was built against
    pub reference_block_id: H256,
    /// Computation limit
    pub gas_limit: u64,
    /// Proposal key
    pub proposal_key: ProposalKey,
    /// Fee payer
    pub payer: Address,
    /// Accounts whose `prepare` block receives authorized access
    pub authorizers: Vec<Address>,
    /// Signatures over the payload
    pub payload_signatures: Vec<TransactionSignature>,
    /// Signatures over the envelope
    pub envelope_signatures: Vec<TransactionSignature>,
}

impl Transaction {
    /// Create a transaction running `script`
    pub fn new(script: impl Into<Bytes>) -> Self {
        Self {
            script: script.into(),
            gas_limit: DEFAULT_GAS_LIMIT,
            ..Default::default()
        }
    }

    /// Set the proposal key
    pub fn with_proposal_key(
        mut self,
        address: Address,
        key_index: u32,
        sequence_number: SequenceNumber,
    ) -> Self {
        self.proposal_key = ProposalKey {
            address,
            key_index,
            sequence_number,
        };
        self
    }

    /// Set the payer
    pub fn with_payer(mut self, payer: Address) -> Self {
        self.payer = payer;
        self
    }

    /// Append an authorizer
    pub fn with_authorizer(mut self, authorizer: Address) -> Self {
        self.authorizers.push(authorizer);
        self
    }

    /// Append an encoded argument
    pub fn add_argument(&mut self, argument: Vec<u8>) {
        self.arguments.push(argument);
    }

    fn append_payload(&self, s: &mut RlpStream) {
        s.begin_list(9);
        s.append(&self.script.to_vec());
        s.begin_list(self.arguments.len());
        for argument in &self.arguments {
            s.append(argument);
        }
        s.append(&self.reference_block_id);
        s.append(&self.gas_limit);
        s.append(&self.proposal_key.address);
        s.append(&self.proposal_key.key_index);
        s.append(&self.proposal_key.sequence_number);
        s.append(&self.payer);
        s.append_list::<Address, Address>(&self.authorizers);
    }

    /// Canonical encoding of the payload
    pub fn payload_rlp(&self) -> Vec<u8> {
        let mut s = RlpStream::new();
        self.append_payload(&mut s);
        s.out().to_vec()
    }

    /// Canonical encoding of the envelope (payload plus payload signatures)
    pub fn envelope_rlp(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(2);
        self.append_payload(&mut s);
        s.append_list::<TransactionSignature, TransactionSignature>(&self.payload_signatures);
        s.out().to_vec()
    }

    /// Message signed by payload signers
    pub fn payload_message(&self) -> Vec<u8> {
        let mut message = transaction_domain_tag().to_vec();
        message.extend_from_slice(&self.payload_rlp());
        message
    }

    /// Message signed by the payer
    pub fn envelope_message(&self) -> Vec<u8> {
        let mut message = transaction_domain_tag().to_vec();
        message.extend_from_slice(&self.envelope_rlp());
        message
    }

    /// Sign the payload as `address`/`key_index`
    pub fn sign_payload(
        &mut self,
        address: Address,
        key_index: u32,
        signer: &Signer,
    ) -> CryptoResult<()> {
        let signature = signer.sign(&self.payload_message())?;
        self.payload_signatures.push(TransactionSignature {
            address,
            key_index,
            signature,
        });
        Ok(())
    }

    /// Sign the envelope as `address`/`key_index`
    ///
    /// Must come after all payload signatures, which the envelope covers.
    pub fn sign_envelope(
        &mut self,
        address: Address,
        key_index: u32,
        signer: &Signer,
    ) -> CryptoResult<()> {
        let signature = signer.sign(&self.envelope_message())?;
        self.envelope_signatures.push(TransactionSignature {
            address,
            key_index,
            signature,
        });
        Ok(())
    }

    /// Transaction id: hash of the fully signed encoding
    pub fn id(&self) -> H256 {
        let mut s = RlpStream::new_list(3);
        self.append_payload(&mut s);
        s.append_list::<TransactionSignature, TransactionSignature>(&self.payload_signatures);
        s.append_list::<TransactionSignature, TransactionSignature>(&self.envelope_signatures);
        sha3_256(&s.out())
    }

    /// Script source as text
    pub fn script_str(&self) -> String {
        String::from_utf8_lossy(&self.script).into_owned()
    }
}
