#![allow(dead_code)]

use async_trait::async_trait;
use clerk_guard::backend::IdentityBackend;
use clerk_guard::error::{ClerkError, Failure};
use clerk_guard::observer::{describe_failure, Observer, ObserverEvent};
use clerk_guard::types::*;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Observer that keeps every event for later inspection
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Event type names in order, e.g. `["input", "retryError", "output"]`
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events()
            .iter()
            .map(|event| match event {
                ObserverEvent::Input { .. } => "input",
                ObserverEvent::Output { .. } => "output",
                ObserverEvent::RetryError { .. } => "retryError",
                ObserverEvent::Error { .. } => "error",
            })
            .collect()
    }

    pub fn retry_attempts(&self) -> Vec<u32> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                ObserverEvent::RetryError { attempt_number, .. } => Some(*attempt_number),
                _ => None,
            })
            .collect()
    }

    pub fn inputs(&self) -> Vec<(String, Value)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ObserverEvent::Input {
                    operation_name,
                    arguments,
                } => Some((operation_name, arguments)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ObserverEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Observer for RecordingObserver {
    fn report_input(&self, operation_name: &str, arguments: &Value) {
        self.push(ObserverEvent::Input {
            operation_name: operation_name.to_string(),
            arguments: arguments.clone(),
        });
    }

    fn report_output(&self, operation_name: &str, result: &Value) {
        self.push(ObserverEvent::Output {
            operation_name: operation_name.to_string(),
            result: result.clone(),
        });
    }

    fn report_retry(&self, operation_name: &str, attempt_number: u32, error: &dyn Failure) {
        self.push(ObserverEvent::RetryError {
            operation_name: operation_name.to_string(),
            attempt_number,
            error: describe_failure(error),
        });
    }

    fn report_failure(&self, operation_name: &str, error: &dyn Failure) {
        self.push(ObserverEvent::Error {
            operation_name: operation_name.to_string(),
            error: describe_failure(error),
        });
    }
}

/// Backend that replays scripted replies and records which methods ran
///
/// Scripted replies are consumed in order by whichever method runs next. Once
/// the script is empty every method succeeds with a minimal resource.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<Value, ClerkError>>>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_fail(self, error: ClerkError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn then_reply(self, reply: Value) -> Self {
        self.script.lock().unwrap().push_back(Ok(reply));
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn answer<T: DeserializeOwned>(
        &self,
        method: &'static str,
        fallback: Value,
    ) -> Result<T, ClerkError> {
        self.calls.lock().unwrap().push(method);
        let reply = self.script.lock().unwrap().pop_front().unwrap_or(Ok(fallback))?;
        Ok(serde_json::from_value(reply)?)
    }
}

fn resource(id: &str) -> Value {
    json!({ "id": id })
}

fn empty_page() -> Value {
    json!({ "data": [], "total_count": 0 })
}

#[async_trait]
impl IdentityBackend for ScriptedBackend {
    async fn get_user(&self, user_id: &str) -> Result<User, ClerkError> {
        self.answer("get_user", resource(user_id))
    }

    async fn create_user(&self, _params: &CreateUserParams) -> Result<User, ClerkError> {
        self.answer("create_user", resource("user_new"))
    }

    async fn get_user_list(
        &self,
        _params: &UserListParams,
    ) -> Result<PaginatedResourceResponse<User>, ClerkError> {
        self.answer("get_user_list", empty_page())
    }

    async fn delete_user(&self, user_id: &str) -> Result<User, ClerkError> {
        self.answer("delete_user", resource(user_id))
    }

    async fn get_user_organization_membership_list(
        &self,
        _params: &UserOrganizationMembershipListParams,
    ) -> Result<PaginatedResourceResponse<OrganizationMembership>, ClerkError> {
        self.answer("get_user_organization_membership_list", empty_page())
    }

    async fn get_organization(
        &self,
        params: &GetOrganizationParams,
    ) -> Result<Organization, ClerkError> {
        self.answer("get_organization", resource(&params.organization_id))
    }

    async fn create_organization_invitation(
        &self,
        _params: &CreateOrganizationInvitationParams,
    ) -> Result<OrganizationInvitation, ClerkError> {
        self.answer("create_organization_invitation", resource("orginv_1"))
    }

    async fn get_organization_membership_list(
        &self,
        _params: &OrganizationMembershipListParams,
    ) -> Result<PaginatedResourceResponse<OrganizationMembership>, ClerkError> {
        self.answer("get_organization_membership_list", empty_page())
    }

    async fn revoke_organization_invitation(
        &self,
        params: &RevokeOrganizationInvitationParams,
    ) -> Result<OrganizationInvitation, ClerkError> {
        self.answer("revoke_organization_invitation", resource(&params.invitation_id))
    }

    async fn get_organization_invitation_list(
        &self,
        _params: &OrganizationInvitationListParams,
    ) -> Result<PaginatedResourceResponse<OrganizationInvitation>, ClerkError> {
        self.answer("get_organization_invitation_list", empty_page())
    }

    async fn delete_organization_membership(
        &self,
        _params: &DeleteOrganizationMembershipParams,
    ) -> Result<OrganizationMembership, ClerkError> {
        self.answer("delete_organization_membership", resource("orgmem_1"))
    }

    async fn update_organization_membership(
        &self,
        _params: &UpdateOrganizationMembershipParams,
    ) -> Result<OrganizationMembership, ClerkError> {
        self.answer("update_organization_membership", resource("orgmem_1"))
    }

    async fn create_organization(
        &self,
        _params: &CreateOrganizationParams,
    ) -> Result<Organization, ClerkError> {
        self.answer("create_organization", resource("org_new"))
    }

    async fn update_organization_logo(
        &self,
        organization_id: &str,
        _params: &UpdateOrganizationLogoParams,
    ) -> Result<Organization, ClerkError> {
        self.answer("update_organization_logo", resource(organization_id))
    }

    async fn update_organization(
        &self,
        organization_id: &str,
        _params: &UpdateOrganizationParams,
    ) -> Result<Organization, ClerkError> {
        self.answer("update_organization", resource(organization_id))
    }

    async fn delete_organization(&self, organization_id: &str) -> Result<Organization, ClerkError> {
        self.answer("delete_organization", resource(organization_id))
    }

    async fn create_organization_membership(
        &self,
        _params: &CreateOrganizationMembershipParams,
    ) -> Result<OrganizationMembership, ClerkError> {
        self.answer("create_organization_membership", resource("orgmem_1"))
    }

    async fn get_organization_list(
        &self,
        _params: &OrganizationListParams,
    ) -> Result<PaginatedResourceResponse<Organization>, ClerkError> {
        self.answer("get_organization_list", empty_page())
    }
}
