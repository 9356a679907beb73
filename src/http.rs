//! HTTP backend for the hosted identity platform REST API
//!
//! This module provides the [`IdentityBackend`] implementation used by
//! [`ClerkClient::new`](crate::client::ClerkClient::new):
//! - Connection pooling and TCP keepalive for connection reuse
//! - Bearer authentication with the instance secret key
//! - One REST call per backend method, parameters passed through as JSON
//! - Ids and slugs escaped as single path segments
//! - Error classification: non-success replies keep their status, failures
//!   that never produced a reply carry none
//!
//! Retrying is not done here. The facades wrap every call in the shared
//! retry loop, which decides from the status whether to try again.

use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::backend::IdentityBackend;
use crate::config::ClientOptions;
use crate::error::{ApiErrorDetail, ClerkError};
use crate::types::*;

/// Reqwest-backed client for the identity platform
///
/// # Examples
///
/// ```
/// use clerk_guard::config::ClientOptions;
/// use clerk_guard::http::HttpBackend;
///
/// # fn example() -> anyhow::Result<()> {
/// let backend = HttpBackend::new(&ClientOptions::new("sk_test_123"))?;
/// assert_eq!(backend.base_url(), "https://api.clerk.com/v1");
/// # Ok(())
/// # }
/// ```
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    secret_key: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
    #[serde(default)]
    clerk_trace_id: Option<String>,
}

#[derive(Deserialize)]
struct TotalCount {
    total_count: u64,
}

impl HttpBackend {
    /// Creates a backend with pooled connections
    ///
    /// Initializes a client with:
    /// - The request timeout from `options`
    /// - 50 max idle connections per host
    /// - 30 second connection idle timeout
    /// - 60 second TCP keepalive
    pub fn new(options: &ClientOptions) -> anyhow::Result<Self> {
        let client = ClientBuilder::new()
            .timeout(options.timeout())
            .user_agent(options.user_agent.as_str())
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(&options.base_url())
            .with_context(|| format!("Invalid API URL: {}", options.base_url()))?;
        if base_url.cannot_be_a_base() {
            bail!("API URL cannot carry a path: {}", base_url);
        }

        Ok(Self {
            client,
            base_url,
            secret_key: options.secret_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends `segments` to the base URL, percent-encoding each one
    ///
    /// A `/`, `?` or `#` inside an id stays part of that segment and can never
    /// reach another resource.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        debug!("Sending {} request to {}", method, url.path());
        self.client
            .request(method, url)
            .bearer_auth(&self.secret_key)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClerkError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

/// Builds the error for a non-success reply, keeping whatever detail parses
fn api_error(status: StatusCode, body: &[u8]) -> ClerkError {
    let parsed = serde_json::from_slice::<ErrorBody>(body).ok();
    debug!("Identity platform replied with status {}", status);

    let (errors, trace_id) = match parsed {
        Some(body) => (body.errors, body.clerk_trace_id),
        None => (Vec::new(), None),
    };

    ClerkError::Api {
        status: status.as_u16(),
        errors,
        trace_id,
    }
}

/// Serializes `params` as a request body, dropping keys that went into the path
fn body<P: Serialize>(params: &P, path_keys: &[&str]) -> Result<Value, ClerkError> {
    let mut value = serde_json::to_value(params)?;
    if let Value::Object(map) = &mut value {
        for key in path_keys {
            map.remove(*key);
        }
    }
    Ok(value)
}

fn page_query(limit: Option<u32>, offset: Option<u32>) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(limit) = limit {
        query.push(("limit", limit.to_string()));
    }
    if let Some(offset) = offset {
        query.push(("offset", offset.to_string()));
    }
    query
}

fn user_filter_query(params: &UserListParams) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    for id in params.organization_id.iter().flatten() {
        query.push(("organization_id", id.clone()));
    }
    for email in params.email_address.iter().flatten() {
        query.push(("email_address", email.clone()));
    }
    query
}

#[async_trait]
impl IdentityBackend for HttpBackend {
    async fn get_user(&self, user_id: &str) -> Result<User, ClerkError> {
        self.send(self.request(Method::GET, &["users", user_id]))
            .await
    }

    async fn create_user(&self, params: &CreateUserParams) -> Result<User, ClerkError> {
        self.send(self.request(Method::POST, &["users"]).json(&body(params, &[])?))
            .await
    }

    async fn get_user_list(
        &self,
        params: &UserListParams,
    ) -> Result<PaginatedResourceResponse<User>, ClerkError> {
        let filter = user_filter_query(params);
        let mut query = filter.clone();
        query.extend(page_query(params.limit, params.offset));

        let data: Vec<User> = self
            .send(self.request(Method::GET, &["users"]).query(&query))
            .await?;
        let count: TotalCount = self
            .send(self.request(Method::GET, &["users", "count"]).query(&filter))
            .await?;

        Ok(PaginatedResourceResponse {
            data,
            total_count: count.total_count,
        })
    }

    async fn delete_user(&self, user_id: &str) -> Result<User, ClerkError> {
        self.send(self.request(Method::DELETE, &["users", user_id]))
            .await
    }

    async fn get_user_organization_membership_list(
        &self,
        params: &UserOrganizationMembershipListParams,
    ) -> Result<PaginatedResourceResponse<OrganizationMembership>, ClerkError> {
        let path = ["users", params.user_id.as_str(), "organization_memberships"];
        self.send(
            self.request(Method::GET, &path)
                .query(&page_query(params.limit, params.offset)),
        )
        .await
    }

    async fn get_organization(
        &self,
        params: &GetOrganizationParams,
    ) -> Result<Organization, ClerkError> {
        let path = ["organizations", params.organization_id.as_str()];
        self.send(self.request(Method::GET, &path)).await
    }

    async fn create_organization_invitation(
        &self,
        params: &CreateOrganizationInvitationParams,
    ) -> Result<OrganizationInvitation, ClerkError> {
        let path = ["organizations", params.organization_id.as_str(), "invitations"];
        self.send(
            self.request(Method::POST, &path)
                .json(&body(params, &["organization_id"])?),
        )
        .await
    }

    async fn get_organization_membership_list(
        &self,
        params: &OrganizationMembershipListParams,
    ) -> Result<PaginatedResourceResponse<OrganizationMembership>, ClerkError> {
        let path = ["organizations", params.organization_id.as_str(), "memberships"];
        self.send(
            self.request(Method::GET, &path)
                .query(&page_query(params.limit, params.offset)),
        )
        .await
    }

    async fn revoke_organization_invitation(
        &self,
        params: &RevokeOrganizationInvitationParams,
    ) -> Result<OrganizationInvitation, ClerkError> {
        let path = [
            "organizations",
            params.organization_id.as_str(),
            "invitations",
            params.invitation_id.as_str(),
            "revoke",
        ];
        self.send(
            self.request(Method::POST, &path)
                .json(&body(params, &["organization_id", "invitation_id"])?),
        )
        .await
    }

    async fn get_organization_invitation_list(
        &self,
        params: &OrganizationInvitationListParams,
    ) -> Result<PaginatedResourceResponse<OrganizationInvitation>, ClerkError> {
        let path = ["organizations", params.organization_id.as_str(), "invitations"];
        self.send(
            self.request(Method::GET, &path)
                .query(&page_query(params.limit, params.offset)),
        )
        .await
    }

    async fn delete_organization_membership(
        &self,
        params: &DeleteOrganizationMembershipParams,
    ) -> Result<OrganizationMembership, ClerkError> {
        let path = [
            "organizations",
            params.organization_id.as_str(),
            "memberships",
            params.user_id.as_str(),
        ];
        self.send(self.request(Method::DELETE, &path)).await
    }

    async fn update_organization_membership(
        &self,
        params: &UpdateOrganizationMembershipParams,
    ) -> Result<OrganizationMembership, ClerkError> {
        let path = [
            "organizations",
            params.organization_id.as_str(),
            "memberships",
            params.user_id.as_str(),
        ];
        self.send(
            self.request(Method::PATCH, &path)
                .json(&body(params, &["organization_id", "user_id"])?),
        )
        .await
    }

    async fn create_organization(
        &self,
        params: &CreateOrganizationParams,
    ) -> Result<Organization, ClerkError> {
        self.send(self.request(Method::POST, &["organizations"]).json(&body(params, &[])?))
            .await
    }

    async fn update_organization_logo(
        &self,
        organization_id: &str,
        params: &UpdateOrganizationLogoParams,
    ) -> Result<Organization, ClerkError> {
        let file = Part::bytes(params.file.bytes.clone())
            .file_name(params.file.file_name.clone())
            .mime_str(&params.file.content_type)
            .map_err(|err| {
                ClerkError::Other(format!(
                    "invalid logo content type {:?}: {}",
                    params.file.content_type, err
                ))
            })?;
        let mut form = Form::new().part("file", file);
        if let Some(uploader) = &params.uploader_user_id {
            form = form.text("uploader_user_id", uploader.clone());
        }

        let path = ["organizations", organization_id, "logo"];
        self.send(self.request(Method::PUT, &path).multipart(form))
            .await
    }

    async fn update_organization(
        &self,
        organization_id: &str,
        params: &UpdateOrganizationParams,
    ) -> Result<Organization, ClerkError> {
        let path = ["organizations", organization_id];
        self.send(self.request(Method::PATCH, &path).json(&body(params, &[])?))
            .await
    }

    async fn delete_organization(
        &self,
        organization_id: &str,
    ) -> Result<Organization, ClerkError> {
        let path = ["organizations", organization_id];
        self.send(self.request(Method::DELETE, &path)).await
    }

    async fn create_organization_membership(
        &self,
        params: &CreateOrganizationMembershipParams,
    ) -> Result<OrganizationMembership, ClerkError> {
        let path = ["organizations", params.organization_id.as_str(), "memberships"];
        self.send(
            self.request(Method::POST, &path)
                .json(&body(params, &["organization_id"])?),
        )
        .await
    }

    async fn get_organization_list(
        &self,
        params: &OrganizationListParams,
    ) -> Result<PaginatedResourceResponse<Organization>, ClerkError> {
        let mut query = Vec::new();
        if let Some(include) = params.include_members_count {
            query.push(("include_members_count", include.to_string()));
        }
        if let Some(search) = &params.query {
            query.push(("query", search.clone()));
        }
        query.extend(page_query(params.limit, params.offset));

        self.send(self.request(Method::GET, &["organizations"]).query(&query))
            .await
    }
}
