// src/storage/transactions.rs

use super::{JsonStore, keys};
use crate::{
    error::AppError,
    models::transaction::{Transaction, TransactionStatus},
};

/// The `transactions` ledger.
#[derive(Clone)]
pub struct TransactionStore {
    json: JsonStore,
}

impl TransactionStore {
    pub fn new(json: JsonStore) -> Self {
        Self { json }
    }

    pub async fn list(&self) -> Result<Vec<Transaction>, AppError> {
        self.json.load_or_default(keys::TRANSACTIONS).await
    }

    pub async fn append(&self, txn: Transaction) -> Result<Transaction, AppError> {
        self.json
            .update(keys::TRANSACTIONS, move |list: &mut Vec<Transaction>| {
                list.push(txn.clone());
                Ok(txn)
            })
            .await
    }

    /// Applies `transition` to the stored status in place.
    /// The closure decides whether the move is allowed.
    pub async fn transition<F>(&self, id: &str, transition: F) -> Result<Transaction, AppError>
    where
        F: FnOnce(TransactionStatus) -> Result<TransactionStatus, AppError> + Send,
    {
        self.json
            .update(keys::TRANSACTIONS, |list: &mut Vec<Transaction>| {
                let txn = list
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or(AppError::NotFound("Transaction not found".to_string()))?;
                txn.status = transition(txn.status)?;
                Ok(txn.clone())
            })
            .await
    }
}
