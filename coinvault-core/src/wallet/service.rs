use crate::crypto::{self, KeyPair};
use crate::error::{Result, VaultError};
use crate::explorer::BalanceSource;
use crate::storage::WalletRepository;
use crate::types::{
    btc_to_sats, Transaction, TransactionKind, TransactionStatus, Wallet, WalletInfo,
    MAX_MONEY_SATS,
};
use crate::wallet::WalletConfig;

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// What happened to the receiver side of a send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorStatus {
    /// The destination address does not belong to a local wallet.
    NotLocal,
    /// The local receiver was credited.
    Credited { wallet_id: String },
    /// The local receiver exists but could not be credited. The send itself stands.
    Failed { wallet_id: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub transaction: Transaction,
    pub mirror: MirrorStatus,
}

/// Wallet lifecycle and the send/receive protocol on top of a repository.
///
/// Balance-changing operations are serialised by an internal ledger lock so
/// that two sends from the same wallet cannot both pass the balance check
/// against a stale copy.
pub struct WalletService<R: WalletRepository> {
    repository: Arc<R>,
    config: WalletConfig,
    ledger: Mutex<()>,
}

impl<R: WalletRepository> WalletService<R> {
    pub fn new(repository: Arc<R>, config: WalletConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            repository,
            config,
            ledger: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn create_wallet(&self, name: &str) -> Result<Wallet> {
        let name = validate_name(name)?;
        let key_pair = KeyPair::generate()?;
        let wallet = self.register(name, key_pair)?;

        tracing::info!("Created wallet '{}' with ID: {}", wallet.name, wallet.id);
        Ok(wallet)
    }

    pub fn import_wallet(&self, name: &str, private_key_hex: &str) -> Result<Wallet> {
        let name = validate_name(name)?;
        let key_pair = KeyPair::from_private_key_hex(private_key_hex)?;
        let wallet = self.register(name, key_pair)?;

        tracing::info!("Imported wallet '{}' with ID: {}", wallet.name, wallet.id);
        Ok(wallet)
    }

    fn register(&self, name: &str, key_pair: KeyPair) -> Result<Wallet> {
        let address = crypto::derive_address(
            key_pair.public_key(),
            self.config.address_format,
            self.config.network,
        )?;

        let wallet = Wallet::new(
            Uuid::new_v4().to_string(),
            name.to_string(),
            key_pair,
            address,
        );
        self.repository.save(&wallet)?;
        Ok(wallet)
    }

    pub fn get_wallet(&self, id: &str) -> Result<Wallet> {
        self.repository.find_by_id(id)
    }

    pub fn get_wallet_by_address(&self, address: &str) -> Result<Wallet> {
        self.repository.find_by_address(address)
    }

    pub fn list_wallets(&self) -> Result<Vec<WalletInfo>> {
        Ok(self
            .repository
            .find_all()?
            .iter()
            .map(Wallet::info)
            .collect())
    }

    pub fn get_balance(&self, id: &str) -> Result<f64> {
        Ok(self.repository.find_by_id(id)?.balance)
    }

    pub fn send(
        &self,
        from_id: &str,
        to_address: &str,
        amount: f64,
        fee: f64,
        note: Option<String>,
    ) -> Result<SendReceipt> {
        validate_amount(amount)?;
        validate_fee(fee)?;
        let to_address = validate_address(to_address)?;

        let _ledger = self.ledger.lock();

        let mut sender = self.repository.find_by_id(from_id)?;

        let need = btc_to_sats(amount)
            .checked_add(btc_to_sats(fee))
            .ok_or_else(|| {
                VaultError::invalid_amount(format!("Amount {} plus fee {} overflows", amount, fee))
            })?;
        if need > btc_to_sats(sender.balance) {
            return Err(VaultError::InsufficientBalance {
                need: amount + fee,
                available: sender.balance,
            });
        }

        let now = Utc::now();
        let id = crypto::fingerprint(&sender.address, to_address, amount, now.timestamp());
        let signature = crypto::sign(&id, &sender.key_pair.private_key_hex())?;
        if !crypto::verify(&id, &signature, &sender.key_pair.public_key_hex())? {
            return Err(VaultError::Signing(
                "signature does not verify against the sender's key".to_string(),
            ));
        }

        let transaction = Transaction {
            id,
            from: sender.address.clone(),
            to: to_address.to_string(),
            amount,
            fee,
            kind: TransactionKind::Send,
            status: TransactionStatus::Confirmed,
            timestamp: now,
            note,
            signature: Some(signature),
        };

        sender.add_transaction(transaction.clone())?;
        self.repository.update(&sender)?;

        tracing::info!(
            "Wallet {} sent {} BTC (fee {}) to {}",
            sender.id,
            amount,
            fee,
            to_address
        );

        let mirror = self.credit_local_receiver(&transaction);
        Ok(SendReceipt {
            transaction,
            mirror,
        })
    }

    /// Best-effort credit of a locally held destination. Callers hold the ledger lock.
    fn credit_local_receiver(&self, sent: &Transaction) -> MirrorStatus {
        let mut receiver = match self.repository.find_by_address(&sent.to) {
            Ok(wallet) => wallet,
            Err(_) => return MirrorStatus::NotLocal,
        };

        let credited = receiver.add_transaction(Transaction {
            id: sent.id.clone(),
            from: sent.from.clone(),
            to: sent.to.clone(),
            amount: sent.amount,
            fee: 0.0,
            kind: TransactionKind::Receive,
            status: TransactionStatus::Confirmed,
            timestamp: sent.timestamp,
            note: sent.note.clone(),
            signature: None,
        });

        match credited.and_then(|()| self.repository.update(&receiver)) {
            Ok(()) => MirrorStatus::Credited {
                wallet_id: receiver.id,
            },
            Err(e) => {
                tracing::warn!(
                    "Send {} succeeded but crediting local wallet {} failed: {}",
                    sent.id,
                    receiver.id,
                    e
                );
                MirrorStatus::Failed {
                    wallet_id: receiver.id,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Record an incoming transfer. Receive entries are unsigned.
    pub fn receive(
        &self,
        to_id: &str,
        from_address: &str,
        amount: f64,
        note: Option<String>,
    ) -> Result<Transaction> {
        validate_amount(amount)?;
        let from_address = validate_address(from_address)?;

        let _ledger = self.ledger.lock();

        let mut receiver = self.repository.find_by_id(to_id)?;

        let now = Utc::now();
        let transaction = Transaction {
            id: crypto::fingerprint(from_address, &receiver.address, amount, now.timestamp()),
            from: from_address.to_string(),
            to: receiver.address.clone(),
            amount,
            fee: 0.0,
            kind: TransactionKind::Receive,
            status: TransactionStatus::Confirmed,
            timestamp: now,
            note,
            signature: None,
        };

        receiver.add_transaction(transaction.clone())?;
        self.repository.update(&receiver)?;

        tracing::info!(
            "Wallet {} received {} BTC from {}",
            receiver.id,
            amount,
            from_address
        );
        Ok(transaction)
    }

    /// The most recent `limit` transactions; `limit <= 0` returns all of them.
    pub fn transaction_history(&self, id: &str, limit: i64) -> Result<Vec<Transaction>> {
        let wallet = self.repository.find_by_id(id)?;
        Ok(wallet.transaction_history(limit).to_vec())
    }

    pub fn delete_wallet(&self, id: &str) -> Result<()> {
        self.repository.delete(id)?;
        tracing::info!("Deleted wallet {}", id);
        Ok(())
    }

    pub fn export_private_key(&self, id: &str) -> Result<String> {
        Ok(self.repository.find_by_id(id)?.key_pair.private_key_hex())
    }

    pub fn export_wif(&self, id: &str, compressed: bool) -> Result<String> {
        let wallet = self.repository.find_by_id(id)?;
        Ok(wallet
            .key_pair
            .to_wif(compressed, self.config.is_test_network()))
    }

    /// Fetch the on-chain balance for a wallet's address and record it.
    ///
    /// The ledger balance is left alone; the remote figure goes to
    /// `chain_balance`. Nothing is written if the fetch fails.
    pub async fn sync_wallet(&self, id: &str, source: &dyn BalanceSource) -> Result<f64> {
        let address = self.repository.find_by_id(id)?.address;
        let chain_balance = source.fetch_balance(&address).await?;

        let _ledger = self.ledger.lock();
        let mut wallet = self.repository.find_by_id(id)?;
        let now = Utc::now();
        wallet.chain_balance = Some(chain_balance);
        wallet.synced_at = Some(now);
        wallet.updated_at = now;
        self.repository.update(&wallet)?;

        tracing::info!(
            "Synced wallet {}: chain balance {} BTC, ledger balance {} BTC",
            wallet.id,
            chain_balance,
            wallet.balance
        );
        Ok(chain_balance)
    }
}

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(VaultError::invalid_input("Wallet name cannot be empty"));
    }
    Ok(name)
}

fn validate_address(address: &str) -> Result<&str> {
    let address = address.trim();
    if address.is_empty() {
        return Err(VaultError::invalid_input("Address cannot be empty"));
    }
    Ok(address)
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || btc_to_sats(amount) <= 0 {
        return Err(VaultError::invalid_amount(format!(
            "Amount must be positive, got {}",
            amount
        )));
    }
    if btc_to_sats(amount) > MAX_MONEY_SATS {
        return Err(VaultError::invalid_amount(format!(
            "Amount {} exceeds the 21000000 BTC supply",
            amount
        )));
    }
    Ok(())
}

fn validate_fee(fee: f64) -> Result<()> {
    if !fee.is_finite() || fee < 0.0 {
        return Err(VaultError::invalid_amount(format!(
            "Fee cannot be negative, got {}",
            fee
        )));
    }
    if btc_to_sats(fee) > MAX_MONEY_SATS {
        return Err(VaultError::invalid_amount(format!(
            "Fee {} exceeds the 21000000 BTC supply",
            fee
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::AddressFormat;
    use crate::error::ErrorKind;
    use crate::storage::JsonWalletStore;
    use async_trait::async_trait;
    use bitcoin::Network;
    use tempfile::{tempdir, TempDir};

    const EXTERNAL: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    fn service() -> (TempDir, WalletService<JsonWalletStore>) {
        let temp_dir = tempdir().unwrap();
        let store = JsonWalletStore::open(temp_dir.path().join("wallets.json")).unwrap();
        let service = WalletService::new(Arc::new(store), WalletConfig::default()).unwrap();
        (temp_dir, service)
    }

    fn funded(service: &WalletService<JsonWalletStore>, name: &str, amount: f64) -> Wallet {
        let wallet = service.create_wallet(name).unwrap();
        service.receive(&wallet.id, "X", amount, None).unwrap();
        service.get_wallet(&wallet.id).unwrap()
    }

    #[test]
    fn test_send_receive_scenario() {
        let (_temp_dir, service) = service();

        let wallet = service.create_wallet("A").unwrap();
        assert_eq!(wallet.balance, 0.0);
        assert!(wallet.address.starts_with("bc1q"));

        service.receive(&wallet.id, "X", 0.5, None).unwrap();
        assert_eq!(service.get_balance(&wallet.id).unwrap(), 0.5);
        let history = service.transaction_history(&wallet.id, 0).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, TransactionKind::Receive);
        assert!(history[0].signature.is_none());

        let receipt = service
            .send(&wallet.id, EXTERNAL, 0.2, 0.0001, Some("rent".to_string()))
            .unwrap();
        assert_eq!(receipt.mirror, MirrorStatus::NotLocal);

        let wallet = service.get_wallet(&wallet.id).unwrap();
        assert_eq!(wallet.balance, 0.2999);
        assert_eq!(wallet.balance, wallet.replayed_balance());

        let sends: Vec<&Transaction> = wallet
            .transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Send)
            .collect();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].note.as_deref(), Some("rent"));

        let signature = sends[0].signature.as_deref().unwrap();
        assert!(crypto::verify(&sends[0].id, signature, &wallet.key_pair.public_key_hex()).unwrap());
    }

    #[test]
    fn test_send_balance_boundary() {
        let (_temp_dir, service) = service();
        let wallet = funded(&service, "A", 0.3);

        let err = service.send(&wallet.id, EXTERNAL, 0.3, 0.00000001, None).unwrap_err();
        assert!(matches!(err, VaultError::InsufficientBalance { .. }));
        assert_eq!(service.get_balance(&wallet.id).unwrap(), 0.3);

        service.send(&wallet.id, EXTERNAL, 0.2999, 0.0001, None).unwrap();
        let wallet = service.get_wallet(&wallet.id).unwrap();
        assert_eq!(wallet.balance, 0.0);
        assert_eq!(wallet.replayed_balance(), 0.0);
    }

    #[test]
    fn test_amounts_above_supply_cap() {
        let (_temp_dir, service) = service();
        let wallet = funded(&service, "A", 1.0);

        assert!(matches!(
            service.send(&wallet.id, EXTERNAL, 1e11, 1.0, None),
            Err(VaultError::InvalidAmount(_))
        ));
        assert!(matches!(
            service.send(&wallet.id, EXTERNAL, 0.1, 1e11, None),
            Err(VaultError::InvalidAmount(_))
        ));
        for _ in 0..2 {
            assert!(matches!(
                service.receive(&wallet.id, "X", 9.3e10, None),
                Err(VaultError::InvalidAmount(_))
            ));
        }
        assert_eq!(service.get_balance(&wallet.id).unwrap(), 1.0);
        assert_eq!(service.transaction_history(&wallet.id, 0).unwrap().len(), 1);

        service.receive(&wallet.id, "X", 21_000_000.0, None).unwrap();
        assert_eq!(service.get_balance(&wallet.id).unwrap(), 21_000_001.0);

        let err = service
            .send(&wallet.id, EXTERNAL, 21_000_000.0, 21_000_000.0, None)
            .unwrap_err();
        assert!(matches!(err, VaultError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_invalid_amounts() {
        let (_temp_dir, service) = service();
        let wallet = funded(&service, "A", 1.0);

        for amount in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                service.send(&wallet.id, EXTERNAL, amount, 0.0, None),
                Err(VaultError::InvalidAmount(_))
            ));
            assert!(matches!(
                service.receive(&wallet.id, "X", amount, None),
                Err(VaultError::InvalidAmount(_))
            ));
        }

        assert!(matches!(
            service.send(&wallet.id, EXTERNAL, 0.1, -0.0001, None),
            Err(VaultError::InvalidAmount(_))
        ));
        assert!(matches!(
            service.send("missing", EXTERNAL, 0.1, 0.0, None),
            Err(VaultError::WalletNotFound { .. })
        ));
        assert_eq!(
            service.send(&wallet.id, "  ", 0.1, 0.0, None).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(service.get_wallet(&wallet.id).unwrap().transactions.len(), 1);
    }

    #[test]
    fn test_send_to_local_wallet_credits_receiver() {
        let (_temp_dir, service) = service();
        let alice = funded(&service, "alice", 1.0);
        let bob = service.create_wallet("bob").unwrap();

        let receipt = service.send(&alice.id, &bob.address, 0.4, 0.001, None).unwrap();
        assert_eq!(
            receipt.mirror,
            MirrorStatus::Credited {
                wallet_id: bob.id.clone()
            }
        );

        let alice = service.get_wallet(&alice.id).unwrap();
        let bob = service.get_wallet(&bob.id).unwrap();
        assert_eq!(alice.balance, 0.599);
        assert_eq!(bob.balance, 0.4);
        assert_eq!(bob.transactions[0].id, receipt.transaction.id);
        assert_eq!(bob.transactions[0].fee, 0.0);
        assert_eq!(bob.balance, bob.replayed_balance());
    }

    #[test]
    fn test_send_to_self_nets_the_fee() {
        let (_temp_dir, service) = service();
        let alice = funded(&service, "alice", 1.0);

        let receipt = service.send(&alice.id, &alice.address, 0.5, 0.01, None).unwrap();
        assert!(matches!(receipt.mirror, MirrorStatus::Credited { .. }));

        let alice = service.get_wallet(&alice.id).unwrap();
        assert_eq!(alice.balance, 0.99);
        assert_eq!(alice.transactions.len(), 3);
        assert_eq!(alice.balance, alice.replayed_balance());
    }

    /// Store that refuses updates to one wallet id.
    struct RefusingStore {
        inner: JsonWalletStore,
        refused: Mutex<Option<String>>,
    }

    impl WalletRepository for RefusingStore {
        fn save(&self, wallet: &Wallet) -> Result<()> {
            self.inner.save(wallet)
        }

        fn find_by_id(&self, id: &str) -> Result<Wallet> {
            self.inner.find_by_id(id)
        }

        fn find_by_address(&self, address: &str) -> Result<Wallet> {
            self.inner.find_by_address(address)
        }

        fn find_all(&self) -> Result<Vec<Wallet>> {
            self.inner.find_all()
        }

        fn update(&self, wallet: &Wallet) -> Result<()> {
            if self.refused.lock().as_deref() == Some(wallet.id.as_str()) {
                return Err(VaultError::storage("disk full"));
            }
            self.inner.update(wallet)
        }

        fn delete(&self, id: &str) -> Result<()> {
            self.inner.delete(id)
        }
    }

    #[test]
    fn test_failed_mirror_is_reported_not_fatal() {
        let temp_dir = tempdir().unwrap();
        let store = RefusingStore {
            inner: JsonWalletStore::open(temp_dir.path().join("wallets.json")).unwrap(),
            refused: Mutex::new(None),
        };
        let service = WalletService::new(Arc::new(store), WalletConfig::default()).unwrap();

        let alice = service.create_wallet("alice").unwrap();
        service.receive(&alice.id, "X", 1.0, None).unwrap();
        let bob = service.create_wallet("bob").unwrap();
        *service.repository().refused.lock() = Some(bob.id.clone());

        let receipt = service.send(&alice.id, &bob.address, 0.25, 0.0, None).unwrap();
        match receipt.mirror {
            MirrorStatus::Failed { wallet_id, reason } => {
                assert_eq!(wallet_id, bob.id);
                assert!(reason.contains("disk full"));
            }
            other => panic!("unexpected mirror status: {:?}", other),
        }

        assert_eq!(service.get_balance(&alice.id).unwrap(), 0.75);
        assert_eq!(service.get_balance(&bob.id).unwrap(), 0.0);
    }

    #[test]
    fn test_delete_and_lookup() {
        let (_temp_dir, service) = service();

        assert_eq!(
            service.delete_wallet("missing").unwrap_err().kind(),
            ErrorKind::NotFound
        );

        let wallet = service.create_wallet("A").unwrap();
        assert_eq!(service.get_wallet_by_address(&wallet.address).unwrap().id, wallet.id);
        service.delete_wallet(&wallet.id).unwrap();
        assert_eq!(
            service.get_wallet(&wallet.id).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert!(service.list_wallets().unwrap().is_empty());
    }

    #[test]
    fn test_create_validation_and_listing() {
        let (_temp_dir, service) = service();
        assert_eq!(
            service.create_wallet("   ").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );

        let a = service.create_wallet("A").unwrap();
        let b = service.create_wallet("B").unwrap();
        assert_ne!(a.address, b.address);
        assert_ne!(a.key_pair, b.key_pair);

        let mut names: Vec<String> = service.list_wallets().unwrap().into_iter().map(|w| w.name).collect();
        names.sort();
        assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_import_and_export() {
        let temp_dir = tempdir().unwrap();
        let store = Arc::new(JsonWalletStore::open(temp_dir.path().join("wallets.json")).unwrap());
        let config = WalletConfig::new(Network::Testnet).with_address_format(AddressFormat::Legacy);
        let service = WalletService::new(store, config).unwrap();

        let private_key = "0c28fca386c7a227600b2fe50b7cae11ec86d3bf1fbe471be89827e19d72aa1d";
        let wallet = service.import_wallet("imported", private_key).unwrap();
        assert!(wallet.address.starts_with('1'));
        assert_eq!(service.export_private_key(&wallet.id).unwrap(), private_key);

        let wif = service.export_wif(&wallet.id, false).unwrap();
        assert!(wif.starts_with('9'));
        let wif = service.export_wif(&wallet.id, true).unwrap();
        assert!(wif.starts_with('c'));

        assert_eq!(
            service.import_wallet("bad", "xyz").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_history_limit() {
        let (_temp_dir, service) = service();
        let wallet = service.create_wallet("A").unwrap();
        for i in 1..=4 {
            service.receive(&wallet.id, "X", i as f64, None).unwrap();
        }

        let recent = service.transaction_history(&wallet.id, 2).unwrap();
        assert_eq!(recent.iter().map(|t| t.amount).collect::<Vec<_>>(), vec![3.0, 4.0]);
        assert_eq!(service.transaction_history(&wallet.id, -1).unwrap().len(), 4);
    }

    #[test]
    fn test_concurrent_sends_never_overdraw() {
        let (_temp_dir, service) = service();
        let wallet = funded(&service, "A", 1.0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let _ = service.send(&wallet.id, EXTERNAL, 0.25, 0.0, None);
                });
            }
        });

        let wallet = service.get_wallet(&wallet.id).unwrap();
        assert_eq!(wallet.balance, 0.0);
        assert_eq!(wallet.transactions.len(), 5);
        assert_eq!(wallet.balance, wallet.replayed_balance());
    }

    struct FixedBalance(f64);

    #[async_trait]
    impl BalanceSource for FixedBalance {
        async fn fetch_balance(&self, _address: &str) -> Result<f64> {
            Ok(self.0)
        }
    }

    struct Unreachable;

    #[async_trait]
    impl BalanceSource for Unreachable {
        async fn fetch_balance(&self, _address: &str) -> Result<f64> {
            Err(VaultError::network("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_sync_records_chain_balance() {
        let (_temp_dir, service) = service();
        let wallet = funded(&service, "A", 0.5);

        let balance = service.sync_wallet(&wallet.id, &FixedBalance(1.25)).await.unwrap();
        assert_eq!(balance, 1.25);

        let wallet = service.get_wallet(&wallet.id).unwrap();
        assert_eq!(wallet.chain_balance, Some(1.25));
        assert!(wallet.synced_at.is_some());
        assert_eq!(wallet.balance, 0.5);
        assert_eq!(wallet.balance, wallet.replayed_balance());
    }

    #[tokio::test]
    async fn test_failed_sync_leaves_state_unchanged() {
        let (_temp_dir, service) = service();
        let wallet = funded(&service, "A", 0.5);

        let err = service.sync_wallet(&wallet.id, &Unreachable).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteFailure);

        let after = service.get_wallet(&wallet.id).unwrap();
        assert_eq!(after.chain_balance, None);
        assert_eq!(after.synced_at, None);
        assert_eq!(after.updated_at, wallet.updated_at);

        assert_eq!(
            service
                .sync_wallet("missing", &FixedBalance(1.0))
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
    }
}
