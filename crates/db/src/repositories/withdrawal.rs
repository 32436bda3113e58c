//! Withdrawal repository: request handling and status updates.
//!
//! Both entry points run under the requesting user's lock, so the
//! "read available balance, decide, persist, debit" sequence cannot
//! interleave with another request or posting for the same user.

use chrono::{DateTime, Utc};
use souk_core::withdrawal::{
    ProcessingInfo, Withdrawal, WithdrawalError, WithdrawalFilter, WithdrawalPolicy,
    WithdrawalRequest, WithdrawalService, WithdrawalStatus, WithdrawalView,
};
use souk_shared::types::{PageRequest, PageResponse, UserId, WithdrawalId};

use crate::store::Database;

/// Produces a withdrawal code for the given instant.
pub type CodeGenerator = fn(DateTime<Utc>) -> String;

/// Withdrawal repository.
#[derive(Debug, Clone)]
pub struct WithdrawalRepository {
    db: Database,
    policy: WithdrawalPolicy,
    code_gen: CodeGenerator,
}

impl WithdrawalRepository {
    /// Creates a new withdrawal repository with the given policy.
    #[must_use]
    pub fn new(db: Database, policy: WithdrawalPolicy) -> Self {
        Self {
            db,
            policy,
            code_gen: WithdrawalService::generate_code,
        }
    }

    /// Replaces the code generator.
    #[must_use]
    pub fn with_code_generator(mut self, code_gen: CodeGenerator) -> Self {
        self.code_gen = code_gen;
        self
    }

    /// The policy in force.
    #[must_use]
    pub fn policy(&self) -> &WithdrawalPolicy {
        &self.policy
    }

    /// Creates a withdrawal.
    ///
    /// Checks, in order: the daily and pending caps, the request shape, the
    /// user, the fee, the available balance and the balance floor. Nothing
    /// is written unless every check passes. Auto-approved withdrawals are
    /// debited before the lock is released; if the debit fails the record is
    /// removed again.
    ///
    /// # Errors
    ///
    /// Returns the first failed check, `DuplicateWithdrawalCode` if the
    /// generated code is taken (retry with a fresh request), or
    /// `StorageTimeout` if the user's lock is not acquired in time.
    pub async fn create_withdrawal(
        &self,
        request: WithdrawalRequest,
    ) -> Result<WithdrawalView, WithdrawalError> {
        let user_id = request.user_id;
        let _guard = self.db.lock_user(user_id).await?;
        let now = self.db.now();

        let day = self.policy.rate_limit.day_window(now);
        let (today_count, pending_count) = self.db.withdrawal_counts(user_id, day);
        self.policy
            .rate_limit
            .check(now, today_count, pending_count)
            .inspect_err(|err| {
                tracing::info!(user_id = %user_id, error = %err, "withdrawal rate limited");
            })?;

        let bank_info = WithdrawalService::validate_request(&request, &self.policy)?;
        let account = self
            .db
            .user(user_id)
            .ok_or(WithdrawalError::UserNotFound(user_id))?;

        let active = self.db.active_withdrawal_fee_config(now);
        let quote = WithdrawalService::resolve_fee(
            active.as_ref(),
            account.tier,
            request.amount,
            request.withdrawal_fee,
            &self.policy,
        )?;
        let total_deduction = request.amount.checked_add(quote.fee).ok_or_else(|| {
            WithdrawalError::Validation("amount plus fee is out of range".to_string())
        })?;

        let available = self.db.available_balance(user_id)?;
        WithdrawalService::check_funds(&available, total_deduction, &self.policy)?;

        let code = (self.code_gen)(now);
        let withdrawal = WithdrawalService::build(
            &request,
            bank_info,
            account.balance,
            quote,
            &self.policy,
            code,
            now,
        )?;
        self.db.insert_withdrawal(withdrawal.clone())?;

        if withdrawal.status.is_settled() {
            let debit = self.db.apply_debit(
                user_id,
                total_deduction,
                "withdrawal",
                Some(withdrawal.withdrawal_code.clone()),
            );
            if let Err(err) = debit {
                self.db.remove_withdrawal(withdrawal.id);
                tracing::error!(
                    user_id = %user_id,
                    withdrawal_code = %withdrawal.withdrawal_code,
                    error = %err,
                    "withdrawal debit failed, record removed"
                );
                return Err(err.into());
            }
        }

        tracing::info!(
            user_id = %user_id,
            withdrawal_code = %withdrawal.withdrawal_code,
            amount = %withdrawal.amount,
            fee = %quote.fee,
            fee_source = ?quote.source,
            status = %withdrawal.status,
            "withdrawal created"
        );
        Ok(withdrawal.into())
    }

    /// Moves a withdrawal to `to`.
    ///
    /// Entering `completed` or `success` from an in-flight status debits the
    /// ledger; retrying a failed withdrawal re-checks the available balance.
    ///
    /// # Errors
    ///
    /// Returns `WithdrawalNotFound`, `InvalidStatusTransition`, a funds
    /// error on retry or settlement, or `StorageTimeout`. The record is
    /// unchanged on error.
    pub async fn update_status(
        &self,
        id: WithdrawalId,
        to: WithdrawalStatus,
        info: Option<ProcessingInfo>,
    ) -> Result<WithdrawalView, WithdrawalError> {
        let user_id = self.get_record(id)?.user_id;
        let _guard = self.db.lock_user(user_id).await?;
        let mut withdrawal = self.get_record(id)?;
        let from = withdrawal.status;
        let now = self.db.now();

        withdrawal.transition(to, info, now)?;

        if WithdrawalService::reserves_on(from, to) {
            let available = self.db.available_balance(user_id)?;
            WithdrawalService::check_funds(&available, withdrawal.total_deduction(), &self.policy)?;
        }
        if WithdrawalService::settles_on(from, to) {
            self.db.apply_debit(
                user_id,
                withdrawal.total_deduction(),
                "withdrawal settled",
                Some(withdrawal.withdrawal_code.clone()),
            )?;
        }
        self.db.replace_withdrawal(withdrawal.clone())?;

        tracing::info!(
            withdrawal_code = %withdrawal.withdrawal_code,
            from = %from,
            to = %to,
            "withdrawal status updated"
        );
        Ok(withdrawal.into())
    }

    /// Fetches a withdrawal by id.
    ///
    /// # Errors
    ///
    /// Returns `WithdrawalNotFound` if no withdrawal has this id.
    pub fn get(&self, id: WithdrawalId) -> Result<WithdrawalView, WithdrawalError> {
        self.get_record(id).map(Into::into)
    }

    /// Fetches a withdrawal by code.
    ///
    /// # Errors
    ///
    /// Returns `WithdrawalNotFound` if no withdrawal has this code.
    pub fn get_by_code(&self, code: &str) -> Result<WithdrawalView, WithdrawalError> {
        self.db
            .withdrawal_by_code(code)
            .map(Into::into)
            .ok_or_else(|| WithdrawalError::WithdrawalNotFound(code.to_string()))
    }

    /// Withdrawals matching `filter`, newest first, one page at a time.
    #[must_use]
    pub fn list(
        &self,
        filter: &WithdrawalFilter,
        page: PageRequest,
    ) -> PageResponse<WithdrawalView> {
        let views: Vec<WithdrawalView> = newest_first(self.db.withdrawals(), filter)
            .into_iter()
            .map(Into::into)
            .collect();
        PageResponse::from_items(&views, page)
    }

    /// One user's withdrawals matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user has no account.
    pub fn user_withdrawals(
        &self,
        user_id: UserId,
        filter: &WithdrawalFilter,
    ) -> Result<Vec<WithdrawalView>, WithdrawalError> {
        if self.db.user(user_id).is_none() {
            return Err(WithdrawalError::UserNotFound(user_id));
        }
        let filter = WithdrawalFilter {
            user_id: Some(user_id),
            ..filter.clone()
        };
        Ok(newest_first(self.db.user_withdrawals(user_id), &filter)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    fn get_record(&self, id: WithdrawalId) -> Result<Withdrawal, WithdrawalError> {
        self.db
            .withdrawal(id)
            .ok_or_else(|| WithdrawalError::WithdrawalNotFound(id.to_string()))
    }
}

fn newest_first(all: Vec<Withdrawal>, filter: &WithdrawalFilter) -> Vec<Withdrawal> {
    let mut matched: Vec<Withdrawal> = all.into_iter().filter(|w| filter.matches(w)).collect();
    matched.sort_by(|a, b| {
        b.requested_at
            .cmp(&a.requested_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    matched
}
