//! Entry point bundling the user and organization facades
//!
//! The client is built once. The retry policy, the retryable-status set and
//! the observer given at construction are shared read-only by every call made
//! through it.

use std::sync::Arc;

use crate::backend::IdentityBackend;
use crate::config::ClientOptions;
use crate::http::HttpBackend;
use crate::observer::Observer;
use crate::organizations::OrganizationsApi;
use crate::retry::{Invoker, RetryPolicy, RetryableStatuses};
use crate::users::UsersApi;

/// Retrying, observable client for the identity platform
///
/// # Examples
///
/// ```no_run
/// use clerk_guard::client::ClerkClient;
/// use clerk_guard::config::ClientOptions;
/// use clerk_guard::observer::ConsoleObserver;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let clerk = ClerkClient::new(ClientOptions::from_env()?, Arc::new(ConsoleObserver))?;
/// let user = clerk.users.get_user("user_123").await?;
/// println!("{}", user.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ClerkClient {
    pub users: UsersApi,
    pub organizations: OrganizationsApi,
    invoker: Invoker,
}

impl ClerkClient {
    /// Creates a client over the hosted REST API with the default retry policy
    pub fn new(options: ClientOptions, observer: Arc<dyn Observer>) -> anyhow::Result<Self> {
        let backend = Arc::new(HttpBackend::new(&options)?);
        Ok(Self::with_backend(
            backend,
            observer,
            RetryPolicy::default(),
            RetryableStatuses::default(),
        ))
    }

    /// Creates a client over any backend with an explicit retry configuration
    pub fn with_backend(
        backend: Arc<dyn IdentityBackend>,
        observer: Arc<dyn Observer>,
        policy: RetryPolicy,
        retryable: RetryableStatuses,
    ) -> Self {
        let invoker = Invoker::new(policy, retryable, observer);
        Self {
            users: UsersApi::new(backend.clone(), invoker.clone()),
            organizations: OrganizationsApi::new(backend, invoker.clone()),
            invoker,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.invoker.policy()
    }

    pub fn retryable_statuses(&self) -> &RetryableStatuses {
        self.invoker.retryable()
    }
}

/// Shorthand for [`ClerkClient::new`]
pub fn create_clerk_client(
    options: ClientOptions,
    observer: Arc<dyn Observer>,
) -> anyhow::Result<ClerkClient> {
    ClerkClient::new(options, observer)
}
