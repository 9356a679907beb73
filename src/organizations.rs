//! Organization management facade
//!
//! Same shape as [`UsersApi`](crate::users::UsersApi): a fixed operation name,
//! the captured arguments, and the backend call run through the retry loop.

use serde_json::{json, Value};
use std::sync::Arc;

use crate::backend::IdentityBackend;
use crate::error::ClerkError;
use crate::retry::Invoker;
use crate::sanitize::capture;
use crate::types::*;

#[derive(Clone)]
pub struct OrganizationsApi {
    backend: Arc<dyn IdentityBackend>,
    invoker: Invoker,
}

impl OrganizationsApi {
    /// Builds the facade over `backend`, sharing `invoker` with the other facades
    pub fn new(backend: Arc<dyn IdentityBackend>, invoker: Invoker) -> Self {
        Self { backend, invoker }
    }

    /// Fetches an organization by id or slug
    ///
    /// # Arguments
    /// * `params` - Holds the organization id or its slug
    ///
    /// # Returns
    /// * `Result<Organization, ClerkError>` - The organization, or the error of
    ///   the last attempt
    pub async fn get_organization(
        &self,
        params: GetOrganizationParams,
    ) -> Result<Organization, ClerkError> {
        self.invoker
            .call(
                "clerk.organizations.getOrganization",
                json!([capture(&params)]),
                || self.backend.get_organization(&params),
            )
            .await
    }

    /// Invites an email address into an organization with the given role
    pub async fn create_organization_invitation(
        &self,
        params: CreateOrganizationInvitationParams,
    ) -> Result<OrganizationInvitation, ClerkError> {
        self.invoker
            .call(
                "clerk.organizations.createOrganizationInvitation",
                json!([capture(&params)]),
                || self.backend.create_organization_invitation(&params),
            )
            .await
    }

    /// Lists the members of an organization
    pub async fn get_organization_membership_list(
        &self,
        params: OrganizationMembershipListParams,
    ) -> Result<PaginatedResourceResponse<OrganizationMembership>, ClerkError> {
        self.invoker
            .call(
                "clerk.organizations.getOrganizationMembershipList",
                json!([capture(&params)]),
                || self.backend.get_organization_membership_list(&params),
            )
            .await
    }

    /// Revokes a pending invitation
    pub async fn revoke_organization_invitation(
        &self,
        params: RevokeOrganizationInvitationParams,
    ) -> Result<OrganizationInvitation, ClerkError> {
        self.invoker
            .call(
                "clerk.organizations.revokeOrganizationInvitation",
                json!([capture(&params)]),
                || self.backend.revoke_organization_invitation(&params),
            )
            .await
    }

    /// Lists invitations of an organization, one page at a time
    pub async fn get_organization_invitation_list(
        &self,
        params: OrganizationInvitationListParams,
    ) -> Result<PaginatedResourceResponse<OrganizationInvitation>, ClerkError> {
        self.invoker
            .call(
                "clerk.organizations.getOrganizationInvitationList",
                json!([capture(&params)]),
                || self.backend.get_organization_invitation_list(&params),
            )
            .await
    }

    /// Removes a user from an organization
    pub async fn delete_organization_membership(
        &self,
        params: DeleteOrganizationMembershipParams,
    ) -> Result<OrganizationMembership, ClerkError> {
        self.invoker
            .call(
                "clerk.organizations.deleteOrganizationMembership",
                json!([capture(&params)]),
                || self.backend.delete_organization_membership(&params),
            )
            .await
    }

    /// Changes a member's role
    pub async fn update_organization_membership(
        &self,
        params: UpdateOrganizationMembershipParams,
    ) -> Result<OrganizationMembership, ClerkError> {
        self.invoker
            .call(
                "clerk.organizations.updateOrganizationMembership",
                json!([capture(&params)]),
                || self.backend.update_organization_membership(&params),
            )
            .await
    }

    /// Creates an organization
    pub async fn create_organization(
        &self,
        params: CreateOrganizationParams,
    ) -> Result<Organization, ClerkError> {
        self.invoker
            .call(
                "clerk.organizations.createOrganization",
                json!([capture(&params)]),
                || self.backend.create_organization(&params),
            )
            .await
    }

    /// Uploads a logo. Only the file's name, type and size are reported.
    pub async fn update_organization_logo(
        &self,
        organization_id: &str,
        params: UpdateOrganizationLogoParams,
    ) -> Result<Organization, ClerkError> {
        let arguments = json!([{
            "organization_id": organization_id,
            "file": params.file.describe(),
            "uploader_user_id": params.uploader_user_id,
        }]);

        self.invoker
            .call("clerk.organizations.updateOrganizationLogo", arguments, || {
                self.backend.update_organization_logo(organization_id, &params)
            })
            .await
    }

    /// Updates an organization's attributes
    ///
    /// The id is merged into the captured params, so the observer sees one
    /// object: `[{"organization_id": ..., ...params}]`.
    pub async fn update_organization(
        &self,
        organization_id: &str,
        params: UpdateOrganizationParams,
    ) -> Result<Organization, ClerkError> {
        let mut captured = capture(&params);
        if let Value::Object(map) = &mut captured {
            map.insert("organization_id".into(), json!(organization_id));
        }

        self.invoker
            .call("clerk.organizations.updateOrganization", json!([captured]), || {
                self.backend.update_organization(organization_id, &params)
            })
            .await
    }

    /// Deletes an organization
    pub async fn delete_organization(&self, organization_id: &str) -> Result<Organization, ClerkError> {
        self.invoker
            .call(
                "clerk.organizations.deleteOrganization",
                json!([{ "organization_id": organization_id }]),
                || self.backend.delete_organization(organization_id),
            )
            .await
    }

    /// Adds a user to an organization with the given role
    pub async fn create_organization_membership(
        &self,
        params: CreateOrganizationMembershipParams,
    ) -> Result<OrganizationMembership, ClerkError> {
        self.invoker
            .call(
                "clerk.organizations.createOrganizationMembership",
                json!([capture(&params)]),
                || self.backend.create_organization_membership(&params),
            )
            .await
    }

    /// Lists organizations of the instance
    pub async fn get_organization_list(
        &self,
        params: OrganizationListParams,
    ) -> Result<PaginatedResourceResponse<Organization>, ClerkError> {
        self.invoker
            .call(
                "clerk.organizations.getOrganizationList",
                json!([capture(&params)]),
                || self.backend.get_organization_list(&params),
            )
            .await
    }
}
