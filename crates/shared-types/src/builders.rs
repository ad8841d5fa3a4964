//! Builders for transactions and blocks.
//!
//! These stand in for the external forging and wallet tooling: they produce
//! entities with correct ids and chain linkage.

use crate::entities::{
    Address, Amount, Block, BlockHeader, Payment, PublicKey, Transaction, TransactionAsset,
    VoteAsset,
};
use crate::errors::EntityError;

/// Fluent transaction builder.
///
/// ```rust,ignore
/// let tx = TransactionBuilder::multi_payment()
///     .add_payment(carol, U256::from(100u64))
///     .add_payment(dave, U256::from(200u64))
///     .nonce(0)
///     .fee(U256::from(100u64))
///     .sender(alice_public_key)
///     .build()?;
/// ```
#[derive(Clone, Debug)]
pub struct TransactionBuilder {
    asset: TransactionAsset,
    sender: Option<PublicKey>,
    nonce: u64,
    fee: Amount,
}

impl TransactionBuilder {
    fn with_asset(asset: TransactionAsset) -> Self {
        Self {
            asset,
            sender: None,
            nonce: 0,
            fee: Amount::zero(),
        }
    }

    pub fn transfer(recipient: Address, amount: Amount) -> Self {
        Self::with_asset(TransactionAsset::Transfer { recipient, amount })
    }

    pub fn multi_payment() -> Self {
        Self::with_asset(TransactionAsset::MultiPayment { payments: Vec::new() })
    }

    pub fn delegate_registration(username: impl Into<String>) -> Self {
        Self::with_asset(TransactionAsset::DelegateRegistration {
            username: username.into(),
        })
    }

    /// Vote for `delegate`, optionally switching away from `unvote`.
    pub fn vote(unvote: Option<Address>, delegate: Address) -> Self {
        Self::with_asset(TransactionAsset::Vote(VoteAsset {
            unvote,
            vote: Some(delegate),
        }))
    }

    /// Withdraw the current vote for `delegate`.
    pub fn unvote(delegate: Address) -> Self {
        Self::with_asset(TransactionAsset::Vote(VoteAsset {
            unvote: Some(delegate),
            vote: None,
        }))
    }

    /// Appends a payment. No-op for non multi-payment builders.
    pub fn add_payment(mut self, recipient: Address, amount: Amount) -> Self {
        if let TransactionAsset::MultiPayment { payments } = &mut self.asset {
            payments.push(Payment { recipient, amount });
        }
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn fee(mut self, fee: Amount) -> Self {
        self.fee = fee;
        self
    }

    pub fn sender(mut self, public_key: PublicKey) -> Self {
        self.sender = Some(public_key);
        self
    }

    pub fn build(self) -> Result<Transaction, EntityError> {
        let sender = self.sender.ok_or(EntityError::MissingField("sender"))?;
        Ok(Transaction::new(sender, self.nonce, self.fee, self.asset))
    }
}

/// Block builder linking a new block onto its parent.
#[derive(Clone, Debug)]
pub struct BlockBuilder {
    generator: PublicKey,
    previous: Option<(u64, [u8; 32])>,
    timestamp: u64,
    reward: Amount,
    version: u8,
    transactions: Vec<Transaction>,
}

impl BlockBuilder {
    pub fn new(generator: PublicKey) -> Self {
        Self {
            generator,
            previous: None,
            timestamp: 0,
            reward: Amount::zero(),
            version: 0,
            transactions: Vec::new(),
        }
    }

    /// Chains the block onto `parent` (height and previous-block id).
    pub fn on_top_of(mut self, parent: &Block) -> Self {
        self.previous = Some((parent.height(), parent.id));
        self
    }

    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn reward(mut self, reward: Amount) -> Self {
        self.reward = reward;
        self
    }

    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn transaction(mut self, tx: Transaction) -> Self {
        self.transactions.push(tx);
        self
    }

    pub fn transactions(mut self, txs: impl IntoIterator<Item = Transaction>) -> Self {
        self.transactions.extend(txs);
        self
    }

    /// Builds the block. Without a parent this yields a genesis block.
    pub fn build(self) -> Block {
        let (height, previous_block) = match self.previous {
            Some((parent_height, parent_id)) => (parent_height + 1, Some(parent_id)),
            None => (1, None),
        };
        Block::new(
            BlockHeader {
                version: self.version,
                height,
                previous_block,
                timestamp: self.timestamp,
                generator_public_key: self.generator,
                reward: self.reward,
            },
            self.transactions,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{TransactionType, U256};

    #[test]
    fn test_builder_requires_sender() {
        let result = TransactionBuilder::transfer([1; 20], U256::one()).build();
        assert_eq!(result.unwrap_err(), EntityError::MissingField("sender"));
    }

    #[test]
    fn test_multi_payment_builder_collects_payments() {
        let tx = TransactionBuilder::multi_payment()
            .add_payment([3; 20], U256::from(100u64))
            .add_payment([4; 20], U256::from(200u64))
            .nonce(3)
            .fee(U256::from(100u64))
            .sender([2; 32])
            .build()
            .unwrap();
        assert_eq!(tx.transaction_type(), TransactionType::MultiPayment);
        assert_eq!(tx.nonce, 3);
        assert_eq!(tx.total_cost(), Some(U256::from(400u64)));
    }

    #[test]
    fn test_block_builder_links_parent() {
        let genesis = BlockBuilder::new([1; 32]).build();
        assert_eq!(genesis.height(), 1);
        assert!(genesis.header.previous_block.is_none());

        let next = BlockBuilder::new([2; 32])
            .on_top_of(&genesis)
            .timestamp(60)
            .reward(U256::from(100u64))
            .build();
        assert_eq!(next.height(), 2);
        assert_eq!(next.header.previous_block, Some(genesis.id));
    }
}
