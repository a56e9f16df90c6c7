//! Result type alias for the practice store

use super::errors::PracticeError;

/// Result type alias for practice-store operations
///
/// # Examples
///
/// ```
/// use practice_store::domain::result::Result;
/// use practice_store::domain::errors::PracticeError;
///
/// fn failing_function() -> Result<()> {
///     Err(PracticeError::Validation("Invalid input".to_string()))
/// }
/// assert!(failing_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, PracticeError>;
