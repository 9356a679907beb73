//! User management facade
//!
//! Each method names the call, captures its arguments for the observer and
//! hands the backend call to the shared retry loop. No validation happens
//! here; the platform rejects bad input itself.

use serde_json::json;
use std::sync::Arc;

use crate::backend::IdentityBackend;
use crate::error::ClerkError;
use crate::retry::Invoker;
use crate::sanitize::capture;
use crate::types::*;

#[derive(Clone)]
pub struct UsersApi {
    backend: Arc<dyn IdentityBackend>,
    invoker: Invoker,
}

impl UsersApi {
    /// Builds the facade over `backend`, sharing `invoker` with the other facades
    pub fn new(backend: Arc<dyn IdentityBackend>, invoker: Invoker) -> Self {
        Self { backend, invoker }
    }

    /// Fetches a single user by id
    ///
    /// # Arguments
    /// * `user_id` - The platform id of the user, e.g. `user_2abc`
    ///
    /// # Returns
    /// * `Result<User, ClerkError>` - The user as the platform returned it, or
    ///   the error of the last attempt
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn example(clerk: clerk_guard::ClerkClient) -> anyhow::Result<()> {
    /// let user = clerk.users.get_user("user_123").await?;
    /// println!("{:?}", user.first_name);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_user(&self, user_id: &str) -> Result<User, ClerkError> {
        self.invoker
            .call("clerk.users.getUser", json!([user_id]), || {
                self.backend.get_user(user_id)
            })
            .await
    }

    /// Creates a user. Credentials in `params` are redacted from observer events.
    pub async fn create_user(&self, params: CreateUserParams) -> Result<User, ClerkError> {
        self.invoker
            .call("clerk.users.createUser", json!([capture(&params)]), || {
                self.backend.create_user(&params)
            })
            .await
    }

    /// Lists users matching the filters, with the total count of all matches
    pub async fn get_user_list(
        &self,
        params: UserListParams,
    ) -> Result<PaginatedResourceResponse<User>, ClerkError> {
        self.invoker
            .call("clerk.users.getUserList", json!([capture(&params)]), || {
                self.backend.get_user_list(&params)
            })
            .await
    }

    /// Deletes a user and returns the deleted resource
    pub async fn delete_user(&self, user_id: &str) -> Result<User, ClerkError> {
        self.invoker
            .call("clerk.users.deleteUser", json!([user_id]), || {
                self.backend.delete_user(user_id)
            })
            .await
    }

    /// Lists the organizations a user belongs to
    ///
    /// The whole parameter struct is reported to the observer, not only the
    /// user id.
    pub async fn get_organization_membership_list(
        &self,
        params: UserOrganizationMembershipListParams,
    ) -> Result<PaginatedResourceResponse<OrganizationMembership>, ClerkError> {
        self.invoker
            .call(
                "clerk.users.getOrganizationMembershipList",
                json!([capture(&params)]),
                || self.backend.get_user_organization_membership_list(&params),
            )
            .await
    }
}
