//! Token actions for the connected account.
//!
//! # Guards (checked in this order, before anything is sent)
//! - A connected account (`NotConnected`)
//! - Non-zero amounts and addresses (`InvalidArgument`)
//! - Enough balance for transfer / burn / transferFrom (`InsufficientBalance`)
//! - The wallet on the configured chain (`ChainError`)
//!
//! Every confirmed write returns its receipt together with a fresh view when
//! the refresh read succeeds.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;

use crate::blockchain::ChainId;
use crate::format::{format_token, parse_token};
use crate::observability::metrics;
use crate::session::{ConnectionSession, ConnectionState};
use crate::token::contract::{IToken, TokenContract};
use crate::token::types::{ContractError, TokenView, TokenWrite};
use crate::wallet::Eip1193Provider;

#[derive(Debug, Clone)]
pub struct TokenService {
    contract: TokenContract,
    session: ConnectionSession,
    chain_id: ChainId,
}

impl TokenService {
    pub fn new(contract: TokenContract, session: ConnectionSession, chain_id: ChainId) -> Self {
        Self {
            contract,
            session,
            chain_id,
        }
    }

    pub fn contract(&self) -> &TokenContract {
        &self.contract
    }

    /// Token view for the connected account.
    pub async fn info(&self) -> Result<TokenView, ContractError> {
        let account = self.account()?;
        self.contract.view(account).await
    }

    /// Convert a user-entered amount to base units using the token decimals.
    pub async fn parse_amount(&self, amount: &str) -> Result<U256, ContractError> {
        if amount.trim().is_empty() {
            return Err(ContractError::InvalidArgument("amount is required".to_string()));
        }
        let decimals = self.contract.decimals().await?;
        parse_token(amount, decimals)
            .ok_or_else(|| ContractError::InvalidArgument(format!("invalid amount: {}", amount)))
    }

    pub async fn mint(&self, amount: U256) -> Result<TokenWrite, ContractError> {
        self.account()?;
        require_amount(amount)?;
        self.submit(IToken::mintCall { amount }).await
    }

    pub async fn burn(&self, amount: U256) -> Result<TokenWrite, ContractError> {
        let account = self.account()?;
        require_amount(amount)?;
        self.ensure_balance(account, amount).await?;
        self.submit(IToken::burnCall { amount }).await
    }

    pub async fn approve(&self, spender: Address, amount: U256) -> Result<TokenWrite, ContractError> {
        self.account()?;
        require_address(spender, "spender")?;
        require_amount(amount)?;
        self.submit(IToken::approveCall { spender, amount }).await
    }

    pub async fn transfer(&self, recipient: Address, amount: U256) -> Result<TokenWrite, ContractError> {
        let account = self.account()?;
        require_address(recipient, "recipient")?;
        require_amount(amount)?;
        self.ensure_balance(account, amount).await?;
        self.submit(IToken::transferCall { recipient, amount }).await
    }

    pub async fn transfer_from(
        &self,
        sender: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<TokenWrite, ContractError> {
        self.account()?;
        require_address(sender, "sender")?;
        require_address(recipient, "recipient")?;
        require_amount(amount)?;
        self.ensure_balance(sender, amount).await?;
        self.submit(IToken::transferFromCall {
            sender,
            recipient,
            amount,
        })
        .await
    }

    pub async fn increase_allowance(
        &self,
        spender: Address,
        added_value: U256,
    ) -> Result<TokenWrite, ContractError> {
        self.account()?;
        require_address(spender, "spender")?;
        require_amount(added_value)?;
        self.submit(IToken::increaseAllowanceCall {
            spender,
            addedValue: added_value,
        })
        .await
    }

    pub async fn transfer_ownership(&self, new_owner: Address) -> Result<TokenWrite, ContractError> {
        self.account()?;
        require_address(new_owner, "new owner")?;
        self.submit(IToken::transferOwnershipCall { newOwner: new_owner }).await
    }

    fn account(&self) -> Result<Address, ContractError> {
        self.session.state().account().ok_or(ContractError::NotConnected)
    }

    /// Connected account and its signer, on the configured chain.
    fn signer(&self) -> Result<(Address, Arc<dyn Eip1193Provider>), ContractError> {
        let ConnectionState::Connected { account, chain_id, .. } = self.session.state() else {
            return Err(ContractError::NotConnected);
        };
        if chain_id != self.chain_id {
            return Err(ContractError::ChainError(format!(
                "wallet is on chain {}, expected {}",
                chain_id, self.chain_id
            )));
        }
        let provider = self
            .session
            .active_connector()
            .and_then(|connector| connector.provider())
            .ok_or(ContractError::NotConnected)?;
        Ok((account, provider))
    }

    async fn ensure_balance(&self, holder: Address, amount: U256) -> Result<(), ContractError> {
        let balance = self.contract.balance_of(holder).await?;
        if balance >= amount {
            return Ok(());
        }

        let decimals = self.contract.decimals().await?;
        let symbol = self.contract.symbol().await?;
        tracing::warn!(
            holder = %holder,
            balance = %balance,
            requested = %amount,
            "Insufficient token balance"
        );
        Err(ContractError::InsufficientBalance {
            balance: format_token(balance, decimals),
            symbol,
        })
    }

    async fn submit<C: SolCall>(&self, call: C) -> Result<TokenWrite, ContractError> {
        let method = method_label(C::SIGNATURE);
        let (account, signer) = self.signer()?;

        let result = self.contract.write(signer.as_ref(), account, call).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(ContractError::UserRejected) => "rejected",
            Err(_) => "failure",
        };
        metrics::record_transaction(method, outcome);

        let receipt = result.inspect_err(|e| {
            tracing::error!(method, error = %e, "Token transaction failed");
        })?;

        let view = match self.contract.view(account).await {
            Ok(view) => Some(view),
            Err(e) => {
                tracing::warn!(
                    method,
                    tx_hash = %receipt.tx_hash,
                    error = %e,
                    "Token refresh after confirmed write failed"
                );
                None
            }
        };
        Ok(TokenWrite { receipt, view })
    }
}

fn require_amount(amount: U256) -> Result<(), ContractError> {
    if amount.is_zero() {
        return Err(ContractError::InvalidArgument("amount must be greater than zero".to_string()));
    }
    Ok(())
}

fn require_address(address: Address, what: &str) -> Result<(), ContractError> {
    if address.is_zero() {
        return Err(ContractError::InvalidArgument(format!("{} address is required", what)));
    }
    Ok(())
}

/// `transfer(address,uint256)` → `transfer`.
fn method_label(signature: &'static str) -> &'static str {
    signature.split('(').next().unwrap_or(signature)
}
