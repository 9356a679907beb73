//! The external identity platform, as seen by the facades
//!
//! Each method is one call to the platform. Implementations own all user and
//! organization semantics; nothing in this crate validates or transforms the
//! parameters on their way through.

use async_trait::async_trait;

use crate::error::ClerkError;
use crate::types::*;

/// One asynchronous method per platform operation
///
/// [`HttpBackend`](crate::http::HttpBackend) talks to the hosted REST API.
/// Tests and embedders can supply their own implementation to
/// [`ClerkClient::with_backend`](crate::client::ClerkClient::with_backend).
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<User, ClerkError>;

    async fn create_user(&self, params: &CreateUserParams) -> Result<User, ClerkError>;

    async fn get_user_list(
        &self,
        params: &UserListParams,
    ) -> Result<PaginatedResourceResponse<User>, ClerkError>;

    async fn delete_user(&self, user_id: &str) -> Result<User, ClerkError>;

    async fn get_user_organization_membership_list(
        &self,
        params: &UserOrganizationMembershipListParams,
    ) -> Result<PaginatedResourceResponse<OrganizationMembership>, ClerkError>;

    async fn get_organization(
        &self,
        params: &GetOrganizationParams,
    ) -> Result<Organization, ClerkError>;

    async fn create_organization_invitation(
        &self,
        params: &CreateOrganizationInvitationParams,
    ) -> Result<OrganizationInvitation, ClerkError>;

    async fn get_organization_membership_list(
        &self,
        params: &OrganizationMembershipListParams,
    ) -> Result<PaginatedResourceResponse<OrganizationMembership>, ClerkError>;

    async fn revoke_organization_invitation(
        &self,
        params: &RevokeOrganizationInvitationParams,
    ) -> Result<OrganizationInvitation, ClerkError>;

    async fn get_organization_invitation_list(
        &self,
        params: &OrganizationInvitationListParams,
    ) -> Result<PaginatedResourceResponse<OrganizationInvitation>, ClerkError>;

    async fn delete_organization_membership(
        &self,
        params: &DeleteOrganizationMembershipParams,
    ) -> Result<OrganizationMembership, ClerkError>;

    async fn update_organization_membership(
        &self,
        params: &UpdateOrganizationMembershipParams,
    ) -> Result<OrganizationMembership, ClerkError>;

    async fn create_organization(
        &self,
        params: &CreateOrganizationParams,
    ) -> Result<Organization, ClerkError>;

    async fn update_organization_logo(
        &self,
        organization_id: &str,
        params: &UpdateOrganizationLogoParams,
    ) -> Result<Organization, ClerkError>;

    async fn update_organization(
        &self,
        organization_id: &str,
        params: &UpdateOrganizationParams,
    ) -> Result<Organization, ClerkError>;

    async fn delete_organization(&self, organization_id: &str)
        -> Result<Organization, ClerkError>;

    async fn create_organization_membership(
        &self,
        params: &CreateOrganizationMembershipParams,
    ) -> Result<OrganizationMembership, ClerkError>;

    async fn get_organization_list(
        &self,
        params: &OrganizationListParams,
    ) -> Result<PaginatedResourceResponse<Organization>, ClerkError>;
}
