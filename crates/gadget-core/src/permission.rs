//! Group-based permission checks.

use crate::route::WILDCARD;
use std::sync::Arc;
use tracing::instrument;
use user_store::{StoreError, User, UserStore, GLOBAL_ADMINS};

/// Decide whether an actor in `groups` may run a route requiring
/// `required`.
///
/// Members of the super-admin group may run anything. An empty
/// requirement or the wildcard opens the route to everyone. Otherwise the
/// actor needs at least one of the listed groups.
pub fn is_permitted<S: AsRef<str>>(groups: &[S], required: &[String]) -> bool {
    if groups.iter().any(|g| g.as_ref() == GLOBAL_ADMINS) {
        return true;
    }

    if required.is_empty() || required.iter().any(|p| p == WILDCARD) {
        return true;
    }

    groups
        .iter()
        .any(|g| required.iter().any(|p| p == g.as_ref()))
}

/// Evaluates permissions against memberships held in the user store.
#[derive(Clone)]
pub struct PermissionEvaluator {
    store: Arc<dyn UserStore>,
}

impl PermissionEvaluator {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Fetch the user's groups once and evaluate `required` against them.
    #[instrument(skip(self, user, required), fields(user = %user.id))]
    pub async fn can(&self, user: &User, required: &[String]) -> Result<bool, StoreError> {
        let groups = self.store.groups_of(user).await?;
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        Ok(is_permitted(&names, required))
    }
}
