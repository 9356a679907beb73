mod common;

use anyhow::Result;
use clerk_guard::backend::IdentityBackend;
use clerk_guard::client::ClerkClient;
use clerk_guard::config::ClientOptions;
use clerk_guard::error::{ClerkError, Failure};
use clerk_guard::http::HttpBackend;
use clerk_guard::retry::{RetryPolicy, RetryableStatuses};
use clerk_guard::types::*;
use common::RecordingObserver;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> Result<HttpBackend> {
    let options = ClientOptions::new("sk_test_123")
        .with_api_url(server.uri())
        .with_timeout_ms(2000);
    HttpBackend::new(&options)
}

#[tokio::test]
async fn test_get_user_sends_authenticated_request() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users/user_1"))
        .and(header("authorization", "Bearer sk_test_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user_1",
            "username": "ada",
            "banned": false,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = backend_for(&server)?.get_user("user_1").await?;

    assert_eq!(user.id, "user_1");
    assert_eq!(user.username.as_deref(), Some("ada"));
    assert_eq!(user.attributes["banned"], json!(false));
    Ok(())
}

#[tokio::test]
async fn test_slash_in_id_is_escaped_into_one_segment() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users/a%2Fb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a/b"})))
        .expect(1)
        .mount(&server)
        .await;

    let user = backend_for(&server)?.get_user("a/b").await?;

    assert_eq!(user.id, "a/b");
    Ok(())
}

#[tokio::test]
async fn test_delete_organization_cannot_reach_a_membership() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/organizations/org_1/memberships/user_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "orgmem_1"})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/organizations/org_1%2Fmemberships%2Fuser_2"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"code": "resource_not_found", "message": "not found"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend_for(&server)?
        .delete_organization("org_1/memberships/user_2")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    Ok(())
}

#[tokio::test]
async fn test_error_reply_keeps_status_and_detail() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/organizations/org_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{
                "code": "resource_not_found",
                "message": "not found",
                "long_message": "Organization not found"
            }],
            "clerk_trace_id": "trace_1"
        })))
        .mount(&server)
        .await;

    let err = backend_for(&server)?
        .get_organization(&GetOrganizationParams {
            organization_id: "org_missing".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    match err {
        ClerkError::Api { errors, trace_id, .. } => {
            assert_eq!(errors[0].code, "resource_not_found");
            assert_eq!(errors[0].long_message.as_deref(), Some("Organization not found"));
            assert_eq!(trace_id.as_deref(), Some("trace_1"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_user_list_combines_page_and_count() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .and(query_param("organization_id", "org_1"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "user_1"},
            {"id": "user_2"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/users/count"))
        .and(query_param("organization_id", "org_1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"object": "total_count", "total_count": 7})),
        )
        .mount(&server)
        .await;

    let page = backend_for(&server)?
        .get_user_list(&UserListParams {
            organization_id: Some(vec!["org_1".into()]),
            limit: Some(2),
            ..Default::default()
        })
        .await?;

    assert_eq!(page.data.len(), 2);
    assert_eq!(page.total_count, 7);
    Ok(())
}

#[tokio::test]
async fn test_invitation_body_excludes_path_parameters() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/organizations/org_1/invitations"))
        .and(body_json(json!({
            "inviter_user_id": "user_1",
            "email_address": "new@example.com",
            "role": "org:member"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "orginv_1",
            "email_address": "new@example.com",
            "role": "org:member",
            "status": "pending"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let invitation = backend_for(&server)?
        .create_organization_invitation(&CreateOrganizationInvitationParams {
            organization_id: "org_1".into(),
            inviter_user_id: "user_1".into(),
            email_address: "new@example.com".into(),
            role: "org:member".into(),
            ..Default::default()
        })
        .await?;

    assert_eq!(invitation.status.as_deref(), Some("pending"));
    Ok(())
}

#[tokio::test]
async fn test_membership_update_uses_patch() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v1/organizations/org_1/memberships/user_1"))
        .and(body_json(json!({"role": "org:admin"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "orgmem_1", "role": "org:admin"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let membership = backend_for(&server)?
        .update_organization_membership(&UpdateOrganizationMembershipParams {
            organization_id: "org_1".into(),
            user_id: "user_1".into(),
            role: "org:admin".into(),
        })
        .await?;

    assert_eq!(membership.role.as_deref(), Some("org:admin"));
    Ok(())
}

#[tokio::test]
async fn test_logo_upload_is_multipart() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/organizations/org_1/logo"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "org_1"})))
        .expect(1)
        .mount(&server)
        .await;

    let organization = backend_for(&server)?
        .update_organization_logo(
            "org_1",
            &UpdateOrganizationLogoParams {
                file: LogoFile::new("logo.png", "image/png", vec![137, 80, 78, 71]),
                uploader_user_id: Some("user_1".into()),
            },
        )
        .await?;

    assert_eq!(organization.id, "org_1");
    let requests = server.received_requests().await.unwrap_or_default();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));
    Ok(())
}

#[tokio::test]
async fn test_undecodable_success_body_has_no_status() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/users/user_1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = backend_for(&server)?.delete_user("user_1").await.unwrap_err();

    assert!(matches!(err, ClerkError::Decode(_)));
    assert_eq!(err.status(), None);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_server_is_statusless() -> Result<()> {
    let options = ClientOptions::new("sk_test_123")
        .with_api_url("http://127.0.0.1:1")
        .with_timeout_ms(500);
    let backend = HttpBackend::new(&options)?;

    let err = backend.get_user("user_1").await.unwrap_err();

    assert!(matches!(err, ClerkError::Transport(_)));
    assert_eq!(err.status(), None);
    Ok(())
}

#[tokio::test]
async fn test_client_retries_rate_limited_reply() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users/user_1"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/users/user_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "user_1"})))
        .mount(&server)
        .await;

    let observer = Arc::new(RecordingObserver::default());
    let clerk = ClerkClient::with_backend(
        Arc::new(backend_for(&server)?),
        observer.clone(),
        RetryPolicy::default()
            .with_min_delay_ms(10)
            .with_max_delay_ms(20),
        RetryableStatuses::default(),
    );

    let user = clerk.users.get_user("user_1").await?;

    assert_eq!(user.id, "user_1");
    assert_eq!(observer.kinds(), vec!["input", "retryError", "retryError", "output"]);
    Ok(())
}

#[tokio::test]
async fn test_client_does_not_retry_client_errors() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/organizations"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": [{"code": "form_param_missing", "message": "name is missing"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let observer = Arc::new(RecordingObserver::default());
    let clerk = ClerkClient::with_backend(
        Arc::new(backend_for(&server)?),
        observer.clone(),
        RetryPolicy::default().with_min_delay_ms(10),
        RetryableStatuses::default(),
    );

    let err = clerk
        .organizations
        .create_organization(CreateOrganizationParams::default())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert_eq!(observer.kinds(), vec!["input", "error"]);
    Ok(())
}
