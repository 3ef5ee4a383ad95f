use crate::crypto::KeyPair;
use crate::error::{Result, VaultError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SATS_PER_BTC: f64 = 100_000_000.0;

/// Upper bound for a single amount or fee: the 21M BTC supply.
pub const MAX_MONEY_SATS: i64 = 21_000_000 * 100_000_000;

/// Round a BTC figure to whole satoshis.
pub fn btc_to_sats(btc: f64) -> i64 {
    (btc * SATS_PER_BTC).round() as i64
}

pub fn sats_to_btc(sats: i64) -> f64 {
    sats as f64 / SATS_PER_BTC
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Send,
    Receive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub fee: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Sender's signature over `id`; only present on `send` entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Transaction {
    /// Signed effect on the owning wallet's balance, in satoshis.
    pub fn balance_delta_sats(&self) -> Result<i64> {
        let amount = btc_to_sats(self.amount);
        match self.kind {
            TransactionKind::Receive => Ok(amount),
            TransactionKind::Send => amount
                .checked_add(btc_to_sats(self.fee))
                .and_then(i64::checked_neg)
                .ok_or_else(|| {
                    VaultError::invalid_amount(format!(
                        "amount {} plus fee {} overflows",
                        self.amount, self.fee
                    ))
                }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub key_pair: KeyPair,
    pub address: String,
    pub balance: f64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Last balance reported by the block explorer, kept apart from the local ledger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl Wallet {
    pub fn new(id: String, name: String, key_pair: KeyPair, address: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            key_pair,
            address,
            balance: 0.0,
            transactions: Vec::new(),
            created_at: now,
            updated_at: now,
            chain_balance: None,
            synced_at: None,
        }
    }

    /// Append `tx` and apply it to the balance at satoshi precision.
    ///
    /// Nothing changes if the new balance would not fit in satoshis.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<()> {
        let balance = btc_to_sats(self.balance)
            .checked_add(tx.balance_delta_sats()?)
            .ok_or_else(|| {
                VaultError::invalid_amount(format!(
                    "balance of wallet {} would overflow",
                    self.id
                ))
            })?;

        self.balance = sats_to_btc(balance);
        self.updated_at = Utc::now();
        self.transactions.push(tx);
        Ok(())
    }

    /// Balance obtained by replaying every transaction from zero.
    pub fn replayed_balance(&self) -> f64 {
        let sats: i128 = self
            .transactions
            .iter()
            .map(|tx| {
                let amount = i128::from(btc_to_sats(tx.amount));
                match tx.kind {
                    TransactionKind::Receive => amount,
                    TransactionKind::Send => -(amount + i128::from(btc_to_sats(tx.fee))),
                }
            })
            .sum();
        sats as f64 / SATS_PER_BTC
    }

    /// The most recent `limit` transactions in insertion order; `limit <= 0` means all.
    pub fn transaction_history(&self, limit: i64) -> &[Transaction] {
        let len = self.transactions.len();
        if limit <= 0 || limit as u64 >= len as u64 {
            return &self.transactions;
        }
        &self.transactions[len - limit as usize..]
    }

    pub fn info(&self) -> WalletInfo {
        WalletInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            address: self.address.clone(),
            balance: self.balance,
            transaction_count: self.transactions.len(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletInfo {
    pub id: String,
    pub name: String,
    pub address: String,
    pub balance: f64,
    pub transaction_count: usize,
    pub created_at: DateTime<Utc>,
}
