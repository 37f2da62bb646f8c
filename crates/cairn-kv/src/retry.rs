//! Caller-side transaction retry loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::warn;

use crate::config::RetryConfig;
use crate::error::KvError;
use crate::error::Retryable;
use crate::transaction::Database;
use crate::transaction::Transaction;

/// Run `body` in a fresh transaction and commit it, retrying on retryable
/// errors.
///
/// Each attempt gets a new transaction. If `body` or the commit fails with an
/// error whose [`Retryable::is_retryable`] is true, the loop sleeps with
/// exponential backoff and tries again, up to `config.max_attempts` attempts.
/// Any other error is returned immediately. After the last attempt the last
/// error is returned.
///
/// # Example
///
/// ```
/// use cairn_kv::{run, Database, KvError, MemoryDatabase, RetryConfig, Transaction};
///
/// # tokio_test_block_on(async {
/// let db = MemoryDatabase::new();
/// run(&db, &RetryConfig::default(), |tr| async move {
///     tr.set(b"hello", b"world")?;
///     Ok::<_, KvError>(())
/// })
/// .await
/// .unwrap();
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
/// # }
/// ```
pub async fn run<D, F, Fut, T, E>(db: &D, config: &RetryConfig, mut body: F) -> Result<T, E>
where
    D: Database + ?Sized,
    F: FnMut(Arc<D::Txn>) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<KvError> + Retryable + std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut backoff_ms = config.initial_backoff_ms;
    let mut attempt = 1u32;

    loop {
        let trx = Arc::new(db.create_transaction());
        let result = match body(Arc::clone(&trx)).await {
            Ok(value) => match trx.commit().await {
                Ok(()) => return Ok(value),
                Err(e) => E::from(e),
            },
            Err(e) => e,
        };

        if !result.is_retryable() {
            return Err(result);
        }

        if attempt >= max_attempts {
            warn!(attempts = attempt, error = %result, "transaction retry limit reached");
            return Err(result);
        }

        debug!(attempt, backoff_ms, error = %result, "retrying transaction");
        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        backoff_ms = config.next_backoff_ms(backoff_ms);
        attempt += 1;
    }
}
