//! Account store trait.
//!
//! The credential store itself (OAuth flows, token persistence) is
//! external; the pipeline only enumerates handles and asks for
//! invalidation when a mail account reports expired credentials.

use async_trait::async_trait;

use crate::error::AccountResult;
use crate::types::account::AccountHandle;

/// Seam to the external credential/account store.
///
/// Read-only during a pipeline run except for [`invalidate`], which
/// is scoped to a single failing account. Zero accounts for a
/// platform is a normal outcome, not an error.
///
/// [`invalidate`]: AccountStore::invalidate
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// All authenticated handles for a user, across platforms.
    async fn list_accounts(&self, user_id: &str) -> AccountResult<Vec<AccountHandle>>;

    /// Drop stored credentials for one account.
    async fn invalidate(&self, account_id: &str) -> AccountResult<()>;
}
