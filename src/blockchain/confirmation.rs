//! Confirmation monitoring for submitted transactions.

use std::time::Duration;

use alloy::primitives::TxHash;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainReader, ConfirmationStatus};
use crate::config::NetworkConfig;

/// How long and how deep to wait for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    /// Blocks on top of the inclusion block (1 = included).
    pub confirmations: u32,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl ConfirmationPolicy {
    pub fn from_config(config: &NetworkConfig) -> Self {
        Self {
            confirmations: config.confirmation_blocks.max(1),
            timeout: Duration::from_secs(config.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(config.receipt_poll_interval_ms.max(1)),
        }
    }
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self::from_config(&NetworkConfig::default())
    }
}

/// Inspect the receipt once and report where the transaction stands.
pub async fn check_confirmation(
    reader: &dyn ChainReader,
    tx_hash: TxHash,
    required: u32,
) -> BlockchainResult<ConfirmationStatus> {
    let receipt = match reader.transaction_receipt(tx_hash).await? {
        Some(r) => r,
        None => return Ok(ConfirmationStatus::Pending),
    };

    if !receipt.success {
        return Ok(ConfirmationStatus::Failed(
            "Transaction reverted".to_string(),
        ));
    }

    let current_block = reader.block_number().await?;
    let tx_block = receipt.block_number.unwrap_or(current_block);
    // The inclusion block itself counts as the first confirmation.
    let confirmations = (current_block.saturating_sub(tx_block) + 1) as u32;

    if confirmations >= required {
        Ok(ConfirmationStatus::Confirmed {
            block_number: tx_block,
        })
    } else {
        Ok(ConfirmationStatus::Confirming {
            current: confirmations,
            required,
        })
    }
}

/// Wait for a transaction to be confirmed.
///
/// Returns the inclusion block on success, `Reverted` if the receipt reports
/// failure and `ConfirmationTimeout` when the policy's deadline passes.
pub async fn wait_for_confirmation(
    reader: &dyn ChainReader,
    tx_hash: TxHash,
    policy: ConfirmationPolicy,
) -> BlockchainResult<u64> {
    let result = timeout(policy.timeout, async {
        let mut ticker = interval(policy.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match check_confirmation(reader, tx_hash, policy.confirmations).await {
                Ok(ConfirmationStatus::Confirmed { block_number }) => return Ok(block_number),
                Ok(ConfirmationStatus::Failed(reason)) => {
                    return Err(BlockchainError::Reverted(reason))
                }
                Ok(ConfirmationStatus::Pending) => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                }
                Ok(ConfirmationStatus::Confirming { current, required }) => {
                    tracing::debug!(
                        tx_hash = %tx_hash,
                        confirmations = current,
                        required = required,
                        "Waiting for confirmations"
                    );
                }
                // Receipt lookups are retried until the deadline.
                Err(e) => tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt lookup failed"),
            }
        }
    })
    .await;

    match result {
        Ok(outcome) => outcome,
        Err(_) => Err(BlockchainError::ConfirmationTimeout(policy.timeout.as_secs())),
    }
}
