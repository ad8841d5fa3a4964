//! # Core Chain Entities
//!
//! Blocks and transactions as they are handed to the wallet state engine.
//!
//! ## Clusters
//!
//! - **Identity**: `Address`, `PublicKey`, address derivation
//! - **Chain**: `Block`, `BlockHeader`, `Transaction`, `TransactionAsset`
//!
//! Transactions arrive here already structurally and cryptographically
//! validated, so no signature material is carried.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use std::fmt;

use crate::errors::EntityError;

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte hash (SHA-256).
pub type Hash = [u8; 32];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// A 20-byte account address, derived from a public key.
pub type Address = [u8; 20];

/// Token amount in base units. Never negative, never wraps.
pub type Amount = U256;

/// Identifier of a block (hash of its header and transaction ids).
pub type BlockId = Hash;

/// Identifier of a transaction (hash of its contents).
pub type TransactionId = Hash;

/// Derives the address owning `public_key`.
///
/// The address is the last 20 bytes of `Keccak256(public_key)`.
pub fn address_from_public_key(public_key: &PublicKey) -> Address {
    let digest = Keccak256::digest(public_key);
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);
    address
}

/// Lowercase hex rendering used in logs and error messages.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

fn amount_bytes(amount: &Amount) -> [u8; 32] {
    let mut out = [0u8; 32];
    amount.to_big_endian(&mut out);
    out
}

// =============================================================================
// CLUSTER B: TRANSACTIONS
// =============================================================================

/// Transaction kind tag. Numbering follows the legacy wire protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum TransactionType {
    Transfer = 0,
    DelegateRegistration = 2,
    Vote = 3,
    MultiPayment = 6,
}

impl TransactionType {
    /// All known transaction kinds, in tag order.
    pub const ALL: [TransactionType; 4] = [
        TransactionType::Transfer,
        TransactionType::DelegateRegistration,
        TransactionType::Vote,
        TransactionType::MultiPayment,
    ];

    /// Returns the numeric wire tag.
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transfer => "transfer",
            Self::DelegateRegistration => "delegate-registration",
            Self::Vote => "vote",
            Self::MultiPayment => "multi-payment",
        };
        write!(f, "{}({})", name, self.as_u16())
    }
}

/// One leg of a multi-payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub recipient: Address,
    pub amount: Amount,
}

/// Vote payload. `unvote` must match the sender's current vote.
///
/// Carrying the previous vote makes a vote exactly revertible from the
/// transaction alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteAsset {
    pub unvote: Option<Address>,
    pub vote: Option<Address>,
}

/// Type-specific payload. The variant determines the transaction type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionAsset {
    Transfer { recipient: Address, amount: Amount },
    DelegateRegistration { username: String },
    Vote(VoteAsset),
    MultiPayment { payments: Vec<Payment> },
}

impl TransactionAsset {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Self::Transfer { .. } => TransactionType::Transfer,
            Self::DelegateRegistration { .. } => TransactionType::DelegateRegistration,
            Self::Vote(_) => TransactionType::Vote,
            Self::MultiPayment { .. } => TransactionType::MultiPayment,
        }
    }

    /// Amount moved away from the sender, excluding the fee.
    ///
    /// Returns `None` if the multi-payment sum overflows.
    pub fn amount(&self) -> Option<Amount> {
        match self {
            Self::Transfer { amount, .. } => Some(*amount),
            Self::MultiPayment { payments } => payments
                .iter()
                .try_fold(Amount::zero(), |acc, p| acc.checked_add(p.amount)),
            Self::DelegateRegistration { .. } | Self::Vote(_) => Some(Amount::zero()),
        }
    }

    fn write_bytes(&self, out: &mut Vec<u8>) {
        match self {
            Self::Transfer { recipient, amount } => {
                out.extend_from_slice(recipient);
                out.extend_from_slice(&amount_bytes(amount));
            }
            Self::DelegateRegistration { username } => {
                out.extend_from_slice(&(username.len() as u32).to_le_bytes());
                out.extend_from_slice(username.as_bytes());
            }
            Self::Vote(asset) => {
                for side in [&asset.unvote, &asset.vote] {
                    match side {
                        Some(address) => {
                            out.push(1);
                            out.extend_from_slice(address);
                        }
                        None => out.push(0),
                    }
                }
            }
            Self::MultiPayment { payments } => {
                out.extend_from_slice(&(payments.len() as u32).to_le_bytes());
                for payment in payments {
                    out.extend_from_slice(&payment.recipient);
                    out.extend_from_slice(&amount_bytes(&payment.amount));
                }
            }
        }
    }
}

/// A validated transaction ready to be applied to wallet state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Content hash (see [`Transaction::compute_id`]).
    pub id: TransactionId,
    /// Sender's public key.
    pub sender_public_key: PublicKey,
    /// Sender nonce; must equal the sender wallet's nonce when applied.
    pub nonce: u64,
    /// Fee paid to the forger of the including block.
    pub fee: Amount,
    /// Type-specific payload.
    pub asset: TransactionAsset,
}

impl Transaction {
    /// Creates a transaction and computes its id.
    pub fn new(sender_public_key: PublicKey, nonce: u64, fee: Amount, asset: TransactionAsset) -> Self {
        let mut tx = Self {
            id: [0u8; 32],
            sender_public_key,
            nonce,
            fee,
            asset,
        };
        tx.id = tx.compute_id();
        tx
    }

    /// SHA-256 over type tag, sender key, nonce, fee and asset bytes.
    pub fn compute_id(&self) -> TransactionId {
        let mut bytes = Vec::with_capacity(128);
        bytes.extend_from_slice(&self.transaction_type().as_u16().to_le_bytes());
        bytes.extend_from_slice(&self.sender_public_key);
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes.extend_from_slice(&amount_bytes(&self.fee));
        self.asset.write_bytes(&mut bytes);
        Sha256::digest(&bytes).into()
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.asset.transaction_type()
    }

    /// Address of the sending wallet.
    pub fn sender_address(&self) -> Address {
        address_from_public_key(&self.sender_public_key)
    }

    /// Hex form of the id, as used in error maps and logs.
    pub fn id_hex(&self) -> String {
        to_hex(&self.id)
    }

    /// Amount plus fee, or `None` on overflow.
    pub fn total_cost(&self) -> Option<Amount> {
        self.asset.amount()?.checked_add(self.fee)
    }
}

// =============================================================================
// CLUSTER C: BLOCKS
// =============================================================================

/// Block header as produced by the forging component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Protocol version for this block.
    pub version: u8,
    /// Block height in the chain. Genesis is height 1.
    pub height: u64,
    /// Id of the parent block; `None` only for genesis.
    pub previous_block: Option<BlockId>,
    /// Seconds since the network epoch.
    pub timestamp: u64,
    /// Public key of the forger credited with reward and fees.
    pub generator_public_key: PublicKey,
    /// Newly issued amount credited to the forger.
    pub reward: Amount,
}

/// A block: header plus ordered transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Creates a block and computes its id.
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        let mut block = Self {
            id: [0u8; 32],
            header,
            transactions,
        };
        block.id = block.compute_id();
        block
    }

    /// SHA-256 over the header fields followed by every transaction id.
    pub fn compute_id(&self) -> BlockId {
        let h = &self.header;
        let mut hasher = Sha256::new();
        hasher.update([h.version]);
        hasher.update(h.height.to_le_bytes());
        hasher.update(h.previous_block.unwrap_or([0u8; 32]));
        hasher.update(h.timestamp.to_le_bytes());
        hasher.update(h.generator_public_key);
        hasher.update(amount_bytes(&h.reward));
        for tx in &self.transactions {
            hasher.update(tx.id);
        }
        hasher.finalize().into()
    }

    /// True when the block id and every transaction id match their content.
    pub fn has_consistent_ids(&self) -> bool {
        self.id == self.compute_id() && self.transactions.iter().all(|tx| tx.id == tx.compute_id())
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Address of the forger wallet.
    pub fn generator_address(&self) -> Address {
        address_from_public_key(&self.header.generator_public_key)
    }

    pub fn id_hex(&self) -> String {
        to_hex(&self.id)
    }

    /// Sum of all transaction fees, or `None` on overflow.
    pub fn total_fee(&self) -> Option<Amount> {
        self.transactions
            .iter()
            .try_fold(Amount::zero(), |acc, tx| acc.checked_add(tx.fee))
    }

    /// Sum of all transferred amounts, or `None` on overflow.
    pub fn total_amount(&self) -> Option<Amount> {
        self.transactions
            .iter()
            .try_fold(Amount::zero(), |acc, tx| acc.checked_add(tx.asset.amount()?))
    }
}
