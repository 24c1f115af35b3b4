//! Shared primitive types used across the entire pipeline.

/// Account identifier as it appears in the event log.
pub type AccountId = String;

/// User identifier. Only unique within an account.
pub type UserId = String;

/// The canonical run identifier.
pub type RunId = String;

/// The (account, user) pair every stage keys on.
pub type UserKey = (AccountId, UserId);
