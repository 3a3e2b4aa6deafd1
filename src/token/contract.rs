//! ERC20 token binding: fixed address + interface over the read and write seams.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::blockchain::{wait_for_confirmation, ChainReader, ConfirmationPolicy};
use crate::token::types::{ContractError, TokenView, TxReceipt};
use crate::wallet::eip1193::{Eip1193Ext, Eip1193Provider, TransactionCall};

sol! {
    /// Mintable, burnable, ownable ERC20.
    #[derive(Debug, PartialEq, Eq)]
    interface IToken {
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function owner() external view returns (address);
        /// Legacy owner accessor, same value as `owner()`.
        function getOwner() external view returns (address);

        function mint(uint256 amount) external returns (bool);
        function burn(uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address recipient, uint256 amount) external returns (bool);
        function transferFrom(address sender, address recipient, uint256 amount) external returns (bool);
        function increaseAllowance(address spender, uint256 addedValue) external returns (bool);
        function transferOwnership(address newOwner) external;
    }
}

#[derive(Clone)]
pub struct TokenContract {
    address: Address,
    reader: Arc<dyn ChainReader>,
    policy: ConfirmationPolicy,
}

impl TokenContract {
    pub fn new(address: Address, reader: Arc<dyn ChainReader>, policy: ConfirmationPolicy) -> Self {
        Self {
            address,
            reader,
            policy,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// `eth_call` the contract and decode the result.
    pub async fn read<C: SolCall>(&self, call: C) -> Result<C::Return, ContractError> {
        let data = Bytes::from(call.abi_encode());
        let raw = self.reader.call(self.address, data).await?;
        C::abi_decode_returns(&raw).map_err(|e| {
            ContractError::ChainError(format!("failed to decode {} result: {}", C::SIGNATURE, e))
        })
    }

    /// Submit `call` through the wallet and wait for confirmation.
    pub async fn write<C: SolCall>(
        &self,
        signer: &dyn Eip1193Provider,
        from: Address,
        call: C,
    ) -> Result<TxReceipt, ContractError> {
        let request = TransactionCall {
            from,
            to: self.address,
            data: Bytes::from(call.abi_encode()),
            value: None,
        };

        let tx_hash = signer.send_transaction(&request).await?;
        tracing::info!(tx_hash = %tx_hash, method = C::SIGNATURE, "Transaction submitted");

        let block_number = wait_for_confirmation(self.reader.as_ref(), tx_hash, self.policy).await?;
        tracing::info!(tx_hash = %tx_hash, block = block_number, "Transaction confirmed");

        Ok(TxReceipt {
            tx_hash,
            block_number,
        })
    }

    pub async fn name(&self) -> Result<String, ContractError> {
        self.read(IToken::nameCall {}).await
    }

    pub async fn symbol(&self) -> Result<String, ContractError> {
        self.read(IToken::symbolCall {}).await
    }

    pub async fn decimals(&self) -> Result<u8, ContractError> {
        self.read(IToken::decimalsCall {}).await
    }

    pub async fn total_supply(&self) -> Result<U256, ContractError> {
        self.read(IToken::totalSupplyCall {}).await
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256, ContractError> {
        self.read(IToken::balanceOfCall { account }).await
    }

    pub async fn owner(&self) -> Result<Address, ContractError> {
        self.read(IToken::ownerCall {}).await
    }

    pub async fn get_owner(&self) -> Result<Address, ContractError> {
        self.read(IToken::getOwnerCall {}).await
    }

    /// Everything shown for the token, read one call after another.
    pub async fn view(&self, account: Address) -> Result<TokenView, ContractError> {
        Ok(TokenView {
            name: self.name().await?,
            symbol: self.symbol().await?,
            decimals: self.decimals().await?,
            total_supply: self.total_supply().await?,
            balance: self.balance_of(account).await?,
            owner: self.owner().await?,
        })
    }
}

impl std::fmt::Debug for TokenContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenContract")
            .field("address", &self.address)
            .field("policy", &self.policy)
            .finish()
    }
}
