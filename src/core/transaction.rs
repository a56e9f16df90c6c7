//! Commit-or-rollback for a finished unit of work

use crate::adapters::database::StoreSession;
use crate::domain::Result;

/// Finish a session according to the outcome of the work done in it
///
/// `Ok` commits; if the commit itself fails, that error is returned instead.
/// `Err` rolls back and returns the original error. A failed rollback is only
/// logged, since the work error is the one the caller needs.
pub async fn complete<T>(session: Box<dyn StoreSession>, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            session.commit().await?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = session.rollback().await {
                tracing::warn!(
                    error = %rollback_error,
                    original_error = %error,
                    "Rollback failed after error"
                );
            }
            Err(error)
        }
    }
}
