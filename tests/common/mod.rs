//! Shared fakes for integration tests: an in-memory chain hosting the token
//! and a browser-style wallet that submits transactions to it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{address, Address, Bytes, TxHash, B256, U256};
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use token_dapp::blockchain::{BlockchainError, BlockchainResult, ChainId, ChainReader, ReceiptInfo};
use token_dapp::config::DappConfig;
use token_dapp::session::{MemoryStore, SessionStore};
use token_dapp::token::IToken;
use token_dapp::wallet::eip1193::{
    TransactionCall, UNRECOGNIZED_CHAIN, USER_REJECTED,
};
use token_dapp::wallet::{Eip1193Provider, ProviderEvent, ProviderRpcError};
use token_dapp::DappContext;

pub const TOKEN: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
pub const ACCOUNT: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const OTHER: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
pub const SEPOLIA: u64 = 11_155_111;

pub fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18u64))
}

/// In-memory chain with one token deployed.
pub struct FakeChain {
    pub native: Mutex<HashMap<Address, U256>>,
    pub balances: Mutex<HashMap<Address, U256>>,
    pub total_supply: Mutex<U256>,
    pub owner: Mutex<Address>,
    receipts: Mutex<HashMap<TxHash, ReceiptInfo>>,
    block: AtomicU64,
    pub balance_calls: AtomicUsize,
    pub fail_balance: AtomicBool,
    pub revert_next: AtomicBool,
    /// Once a mined receipt has been looked up, every `eth_call` fails.
    pub fail_reads_after_receipt: AtomicBool,
    fail_calls: AtomicBool,
}

impl FakeChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            native: Mutex::new(HashMap::from([(ACCOUNT, U256::from(1_234_567_890_000_000_000u64))])),
            balances: Mutex::new(HashMap::from([(ACCOUNT, ether(100))])),
            total_supply: Mutex::new(ether(1_000)),
            owner: Mutex::new(ACCOUNT),
            receipts: Mutex::new(HashMap::new()),
            block: AtomicU64::new(100),
            balance_calls: AtomicUsize::new(0),
            fail_balance: AtomicBool::new(false),
            revert_next: AtomicBool::new(false),
            fail_reads_after_receipt: AtomicBool::new(false),
            fail_calls: AtomicBool::new(false),
        })
    }

    pub fn token_balance(&self, holder: Address) -> U256 {
        self.balances.lock().unwrap().get(&holder).copied().unwrap_or_default()
    }

    fn credit(&self, holder: Address, amount: U256) {
        *self.balances.lock().unwrap().entry(holder).or_default() += amount;
    }

    fn debit(&self, holder: Address, amount: U256) {
        *self.balances.lock().unwrap().entry(holder).or_default() -= amount;
    }

    /// Execute a token call from `from` and mine it into a new block.
    fn execute(&self, from: Address, data: &[u8]) -> TxHash {
        let reverted = self.revert_next.swap(false, Ordering::SeqCst);
        if !reverted {
            self.apply(from, data);
        }

        let block = self.block.fetch_add(1, Ordering::SeqCst) + 1;
        let tx_hash = TxHash::from(B256::from(U256::from(block)));
        self.receipts.lock().unwrap().insert(
            tx_hash,
            ReceiptInfo {
                success: !reverted,
                block_number: Some(block),
            },
        );
        tx_hash
    }

    fn apply(&self, from: Address, data: &[u8]) {
        let selector: [u8; 4] = data[..4].try_into().unwrap();
        match selector {
            IToken::mintCall::SELECTOR => {
                let call = IToken::mintCall::abi_decode(data).unwrap();
                self.credit(from, call.amount);
                *self.total_supply.lock().unwrap() += call.amount;
            }
            IToken::burnCall::SELECTOR => {
                let call = IToken::burnCall::abi_decode(data).unwrap();
                self.debit(from, call.amount);
                *self.total_supply.lock().unwrap() -= call.amount;
            }
            IToken::transferCall::SELECTOR => {
                let call = IToken::transferCall::abi_decode(data).unwrap();
                self.debit(from, call.amount);
                self.credit(call.recipient, call.amount);
            }
            IToken::transferFromCall::SELECTOR => {
                let call = IToken::transferFromCall::abi_decode(data).unwrap();
                self.debit(call.sender, call.amount);
                self.credit(call.recipient, call.amount);
            }
            IToken::transferOwnershipCall::SELECTOR => {
                let call = IToken::transferOwnershipCall::abi_decode(data).unwrap();
                *self.owner.lock().unwrap() = call.newOwner;
            }
            _ => {}
        }
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn chain_id(&self) -> BlockchainResult<ChainId> {
        Ok(ChainId(SEPOLIA))
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        Ok(self.block.load(Ordering::SeqCst))
    }

    async fn balance(&self, address: Address) -> BlockchainResult<U256> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_balance.load(Ordering::SeqCst) {
            return Err(BlockchainError::Rpc("connection refused".to_string()));
        }
        Ok(self.native.lock().unwrap().get(&address).copied().unwrap_or_default())
    }

    async fn call(&self, to: Address, data: Bytes) -> BlockchainResult<Bytes> {
        assert_eq!(to, TOKEN);
        if self.fail_calls.load(Ordering::SeqCst) {
            return Err(BlockchainError::Rpc("rpc flake".to_string()));
        }
        let selector: [u8; 4] = data[..4].try_into().unwrap();
        let encoded = match selector {
            IToken::nameCall::SELECTOR => "Test Token".to_string().abi_encode(),
            IToken::symbolCall::SELECTOR => "TST".to_string().abi_encode(),
            IToken::decimalsCall::SELECTOR => <alloy::sol_types::sol_data::Uint<8> as alloy::sol_types::SolType>::abi_encode(&18u8),
            IToken::totalSupplyCall::SELECTOR => self.total_supply.lock().unwrap().abi_encode(),
            IToken::balanceOfCall::SELECTOR => {
                let call = IToken::balanceOfCall::abi_decode(&data).unwrap();
                self.token_balance(call.account).abi_encode()
            }
            IToken::ownerCall::SELECTOR | IToken::getOwnerCall::SELECTOR => {
                self.owner.lock().unwrap().abi_encode()
            }
            _ => return Err(BlockchainError::Rpc("execution reverted".to_string())),
        };
        Ok(Bytes::from(encoded))
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<ReceiptInfo>> {
        let receipt = self.receipts.lock().unwrap().get(&tx_hash).copied();
        if receipt.is_some() && self.fail_reads_after_receipt.load(Ordering::SeqCst) {
            self.fail_calls.store(true, Ordering::SeqCst);
        }
        Ok(receipt)
    }
}

/// Extension-style wallet holding `ACCOUNT`.
pub struct FakeWallet {
    chain: Arc<FakeChain>,
    pub active_chain: Mutex<u64>,
    known_chains: Mutex<Vec<u64>>,
    pub authorized: AtomicBool,
    pub reject: AtomicBool,
    pub sent: AtomicUsize,
    events: broadcast::Sender<ProviderEvent>,
}

impl FakeWallet {
    pub fn new(chain: Arc<FakeChain>, chain_id: u64) -> Arc<Self> {
        Arc::new(Self {
            chain,
            active_chain: Mutex::new(chain_id),
            known_chains: Mutex::new(vec![chain_id]),
            authorized: AtomicBool::new(false),
            reject: AtomicBool::new(false),
            sent: AtomicUsize::new(0),
            events: broadcast::channel(16).0,
        })
    }

    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    fn rejected(&self) -> Result<(), ProviderRpcError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(ProviderRpcError::new(USER_REJECTED, "User rejected the request."));
        }
        Ok(())
    }

    fn accounts(&self) -> Value {
        if self.authorized.load(Ordering::SeqCst) {
            json!([ACCOUNT])
        } else {
            json!([])
        }
    }

    fn switch(&self, chain_id: u64) {
        *self.active_chain.lock().unwrap() = chain_id;
        self.emit(ProviderEvent::ChainChanged(ChainId(chain_id)));
    }
}

#[async_trait]
impl Eip1193Provider for FakeWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        match method {
            "eth_requestAccounts" => {
                self.rejected()?;
                self.authorized.store(true, Ordering::SeqCst);
                Ok(self.accounts())
            }
            "eth_accounts" => Ok(self.accounts()),
            "eth_chainId" => Ok(json!(ChainId(*self.active_chain.lock().unwrap()).to_hex())),
            "wallet_switchEthereumChain" => {
                self.rejected()?;
                let id = ChainId::from_hex(params[0]["chainId"].as_str().unwrap()).unwrap();
                if !self.known_chains.lock().unwrap().contains(&id.0) {
                    return Err(ProviderRpcError::new(UNRECOGNIZED_CHAIN, "Unrecognized chain"));
                }
                self.switch(id.0);
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                self.rejected()?;
                let id = ChainId::from_hex(params[0]["chainId"].as_str().unwrap()).unwrap();
                self.known_chains.lock().unwrap().push(id.0);
                self.switch(id.0);
                Ok(Value::Null)
            }
            "wallet_watchAsset" => Ok(Value::Bool(!self.reject.load(Ordering::SeqCst))),
            "wallet_revokePermissions" => {
                self.authorized.store(false, Ordering::SeqCst);
                Ok(Value::Null)
            }
            "personal_sign" => {
                self.rejected()?;
                Ok(json!(format!("0x{}", "11".repeat(65))))
            }
            "eth_sendTransaction" => {
                self.rejected()?;
                let call: TransactionCall = serde_json::from_value(params[0].clone()).unwrap();
                self.sent.fetch_add(1, Ordering::SeqCst);
                Ok(json!(self.chain.execute(call.from, &call.data)))
            }
            other => Err(ProviderRpcError::unsupported(other)),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

pub fn test_config() -> DappConfig {
    let mut config = DappConfig::default();
    config.contract.address = TOKEN.to_string();
    config.network.rpc_urls = vec!["http://127.0.0.1:1".to_string()];
    config.network.receipt_poll_interval_ms = 10;
    config.connectors.injected.private_key_env = "DAPP_TEST_KEY_NOT_SET".to_string();
    config
}

/// Context wired to the fakes and an in-memory store.
pub async fn context_with(
    chain: Arc<FakeChain>,
    wallet: Option<Arc<FakeWallet>>,
    store: Arc<dyn SessionStore>,
) -> DappContext {
    let mut builder = DappContext::builder(test_config())
        .reader(chain)
        .store(store);
    if let Some(wallet) = wallet {
        builder = builder.injected_provider(wallet);
    }
    builder.build().await.unwrap()
}

pub async fn context(chain: Arc<FakeChain>, wallet: Arc<FakeWallet>) -> DappContext {
    context_with(chain, Some(wallet), Arc::new(MemoryStore::new())).await
}
