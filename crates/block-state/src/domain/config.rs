use std::env;

/// Block state engine configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockStateConfig {
    /// Number of applied blocks kept for revert. Older blocks cannot be
    /// reverted through this engine.
    pub max_retained_blocks: usize,
    /// Upper bound on payments in one multi-payment transaction.
    pub multi_payment_limit: usize,
    /// Recompute every delegate's vote weight after each apply and revert.
    pub audit_vote_weights: bool,
}

impl Default for BlockStateConfig {
    fn default() -> Self {
        Self {
            max_retained_blocks: 256,
            multi_payment_limit: 256,
            audit_vote_weights: false,
        }
    }
}

impl BlockStateConfig {
    /// Small history with auditing enabled.
    pub fn for_testing() -> Self {
        Self {
            max_retained_blocks: 16,
            multi_payment_limit: 256,
            audit_vote_weights: true,
        }
    }

    /// Reads overrides from `LEDGER_MAX_RETAINED_BLOCKS`,
    /// `LEDGER_MULTI_PAYMENT_LIMIT` and `LEDGER_AUDIT_VOTE_WEIGHTS`.
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retained_blocks: parse_env("LEDGER_MAX_RETAINED_BLOCKS")
                .unwrap_or(defaults.max_retained_blocks)
                .max(1),
            multi_payment_limit: parse_env("LEDGER_MULTI_PAYMENT_LIMIT")
                .unwrap_or(defaults.multi_payment_limit)
                .max(2),
            audit_vote_weights: env::var("LEDGER_AUDIT_VOTE_WEIGHTS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.audit_vote_weights),
        }
    }
}

fn parse_env(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BlockStateConfig::default();
        assert_eq!(config.max_retained_blocks, 256);
        assert_eq!(config.multi_payment_limit, 256);
        assert!(!config.audit_vote_weights);
        assert!(BlockStateConfig::for_testing().audit_vote_weights);
    }
}
