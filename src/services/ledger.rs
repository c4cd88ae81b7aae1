use rust_decimal::Decimal;
use sqlx::PgPool;

use super::ServiceError;
use crate::models::categories::CategoryKind;
use crate::models::transactions::{NewTransaction, Transaction};
use crate::repositories::achievements::AchievementRepository;
use crate::repositories::categories::CategoryRepository;
use crate::repositories::transactions::TransactionRepository;
use crate::repositories::wallets::WalletRepository;

/// Monetary effect of a transaction on its wallet: income adds, expense
/// subtracts. The reversal is simply the negation.
pub fn signed_delta(kind: CategoryKind, amount: Decimal) -> Decimal {
    match kind {
        CategoryKind::Income => amount,
        CategoryKind::Expense => -amount,
    }
}

#[derive(Clone)]
pub struct LedgerService {
    transactions: TransactionRepository,
    wallets: WalletRepository,
    categories: CategoryRepository,
    achievements: AchievementRepository,
}

impl LedgerService {
    pub fn new(sql_conn: PgPool) -> Self {
        LedgerService {
            transactions: TransactionRepository::new(sql_conn.clone()),
            wallets: WalletRepository::new(sql_conn.clone()),
            categories: CategoryRepository::new(sql_conn.clone()),
            achievements: AchievementRepository::new(sql_conn),
        }
    }

    pub async fn create(
        &self,
        user_id: &str,
        req: &NewTransaction,
    ) -> Result<Transaction, ServiceError> {
        self.validate_amount(req.amount)?;

        // Ownership and kind checks happen before any mutation; a rejected
        // request must leave the wallet balance untouched.
        let wallet = self
            .wallets
            .get_wallet(&req.wallet_id, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Wallet not found"))?;
        let category = self
            .categories
            .get_category(&req.category_id, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category not found"))?;
        if category.kind != req.kind {
            return Err(ServiceError::bad_request(
                "Transaction kind does not match category kind",
            ));
        }

        let occurred_at = req
            .occurred_at
            .unwrap_or_else(|| chrono::Utc::now().naive_utc());
        let transaction = self
            .transactions
            .insert_with_balance(
                user_id,
                &wallet.id,
                &category.id,
                req.amount,
                req.kind,
                req.note.as_deref(),
                occurred_at,
                signed_delta(req.kind, req.amount),
            )
            .await?;

        if let Err(e) = self.unlock_first_transaction(user_id).await {
            log::warn!("Achievement unlock failed for {}: {}", user_id, e);
        }

        Ok(transaction)
    }

    pub async fn delete(&self, transaction_id: &str, user_id: &str) -> Result<(), ServiceError> {
        let existing = self
            .transactions
            .get_transaction(transaction_id, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Transaction not found"))?;

        self.transactions
            .delete_with_balance(
                &existing.id,
                &existing.wallet_id,
                -signed_delta(existing.kind, existing.amount),
            )
            .await?;

        Ok(())
    }

    /// Revert-then-reapply: the old delta is undone on the old wallet and the
    /// new delta applied (possibly to a different wallet) in one database
    /// transaction, so the balance invariant holds across edits.
    pub async fn update(
        &self,
        transaction_id: &str,
        user_id: &str,
        req: &NewTransaction,
    ) -> Result<Transaction, ServiceError> {
        self.validate_amount(req.amount)?;

        let existing = self
            .transactions
            .get_transaction(transaction_id, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Transaction not found"))?;
        let wallet = self
            .wallets
            .get_wallet(&req.wallet_id, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Wallet not found"))?;
        let category = self
            .categories
            .get_category(&req.category_id, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category not found"))?;
        if category.kind != req.kind {
            return Err(ServiceError::bad_request(
                "Transaction kind does not match category kind",
            ));
        }

        let occurred_at = req.occurred_at.unwrap_or(existing.occurred_at);
        let transaction = self
            .transactions
            .update_with_balance(
                &existing.id,
                &existing.wallet_id,
                -signed_delta(existing.kind, existing.amount),
                &wallet.id,
                &category.id,
                req.amount,
                req.kind,
                req.note.as_deref(),
                occurred_at,
                signed_delta(req.kind, req.amount),
            )
            .await?;

        Ok(transaction)
    }

    pub async fn list(
        &self,
        user_id: &str,
        wallet_id: Option<&str>,
    ) -> Result<Vec<Transaction>, ServiceError> {
        Ok(self.transactions.list_transactions(user_id, wallet_id).await?)
    }

    fn validate_amount(&self, amount: Decimal) -> Result<(), ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::validation("Amount must be positive"));
        }

        Ok(())
    }

    async fn unlock_first_transaction(&self, user_id: &str) -> Result<(), anyhow::Error> {
        if self.transactions.count_for_user(user_id).await? == 1 {
            self.achievements
                .unlock(user_id, "FIRST_TRANSACTION", "Recorded a first transaction")
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn income_adds_and_expense_subtracts() {
        let balance = Decimal::from(500_000);

        assert_eq!(
            balance + signed_delta(CategoryKind::Income, Decimal::from(50_000)),
            Decimal::from(550_000)
        );
        assert_eq!(
            balance + signed_delta(CategoryKind::Expense, Decimal::from(50_000)),
            Decimal::from(450_000)
        );
    }

    #[test]
    fn create_then_delete_is_a_balance_no_op() {
        let balance = Decimal::from(500_000);
        let amount = Decimal::from(50_000);

        for kind in [CategoryKind::Income, CategoryKind::Expense] {
            let posted = balance + signed_delta(kind, amount);
            let reverted = posted + -signed_delta(kind, amount);
            assert_eq!(reverted, balance);
        }
    }

    #[test]
    fn revert_then_reapply_moves_between_wallets_cleanly() {
        // An edit that changes wallet, kind and amount: the old wallet ends
        // where it started, the new wallet carries exactly the new delta.
        let old_wallet = Decimal::from(1_000);
        let new_wallet = Decimal::from(2_000);

        let old_wallet_posted = old_wallet + signed_delta(CategoryKind::Expense, Decimal::from(300));
        let old_wallet_reverted =
            old_wallet_posted + -signed_delta(CategoryKind::Expense, Decimal::from(300));
        let new_wallet_posted = new_wallet + signed_delta(CategoryKind::Income, Decimal::from(450));

        assert_eq!(old_wallet_reverted, old_wallet);
        assert_eq!(new_wallet_posted, Decimal::from(2_450));
    }
}
