mod common;

use std::time::Duration;

use pms_core::auth::decode_claims;
use pms_core::models::{Registration, UserType};
use pms_core::{ApiClient, ApiError, Credentials};

use common::{Fixture, PASSWORD, TAKEN_EMAIL};

fn client(fixture: &Fixture) -> ApiClient {
    ApiClient::new(&fixture.base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn obtain_pair_with_valid_credentials() {
    let fixture = common::spawn().await;
    let api = client(&fixture);

    let pair = api
        .obtain_token_pair(&Credentials::new("amina@example.com", PASSWORD))
        .await
        .unwrap();

    assert_eq!(pair.refresh, "R1");
    let claims = decode_claims(&pair.access).unwrap();
    assert_eq!(claims.user_id, 1);
    assert_eq!(claims.user_type, UserType::Tenant);
    assert_eq!(claims.full_name(), "Amina Otieno");
}

#[tokio::test]
async fn obtain_pair_with_wrong_password_is_unauthorized() {
    let fixture = common::spawn().await;
    let api = client(&fixture);

    let err = api
        .obtain_token_pair(&Credentials::new("amina@example.com", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert!(err.is_rejection());
    assert_eq!(fixture.recorded(|r| r.token_requests), 1);
}

#[tokio::test]
async fn refresh_rotates_pair() {
    let fixture = common::spawn().await;
    let api = client(&fixture);

    let first = api
        .obtain_token_pair(&Credentials::new("amina@example.com", PASSWORD))
        .await
        .unwrap();
    let second = api.refresh_token_pair(&first.refresh).await.unwrap();

    assert_eq!(second.refresh, "R2");
    assert_ne!(second.access, first.access);
    assert_eq!(fixture.recorded(|r| r.refresh_tokens.clone()), vec!["R1"]);
}

#[tokio::test]
async fn refresh_with_revoked_token_is_unauthorized() {
    let fixture = common::spawn().await;
    fixture.revoke_refresh_tokens();

    let err = client(&fixture).refresh_token_pair("R9").await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn bearer_token_is_attached_when_present() {
    let fixture = common::spawn().await;
    let guest = client(&fixture);

    let err = guest.fetch_properties().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));

    let authed = guest.with_token(Some("A1".to_string()));
    let properties = authed.fetch_properties().await.unwrap();
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].rent_price, "15000.00");
    assert_eq!(properties[0].images().count(), 1);

    assert_eq!(
        fixture.recorded(|r| r.authorization.clone()),
        vec![None, Some("Bearer A1".to_string())]
    );
}

#[tokio::test]
async fn register_sends_form_fields() {
    let fixture = common::spawn().await;
    let api = client(&fixture);

    let registration = Registration {
        email: "joseph@example.com".to_string(),
        password: "pw-123456".to_string(),
        first_name: "Joseph".to_string(),
        last_name: "Kamau".to_string(),
        user_type: UserType::Landlord,
    };
    api.register(&registration).await.unwrap();

    let fields = fixture.recorded(|r| r.register_fields.clone());
    assert!(fields.contains(&("email".to_string(), "joseph@example.com".to_string())));
    assert!(fields.contains(&("user_type".to_string(), "landlord".to_string())));
    assert_eq!(fields.len(), 5);
}

#[tokio::test]
async fn register_with_taken_email_is_bad_request() {
    let fixture = common::spawn().await;
    let registration = Registration {
        email: TAKEN_EMAIL.to_string(),
        password: "pw".to_string(),
        first_name: "A".to_string(),
        last_name: "B".to_string(),
        user_type: UserType::Tenant,
    };

    let err = client(&fixture).register(&registration).await.unwrap_err();
    match err {
        ApiError::BadRequest(body) => assert!(body.contains("already exists")),
        other => panic!("expected BadRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn password_reset_round_trip() {
    let fixture = common::spawn().await;
    let api = client(&fixture);

    let confirmation = api
        .request_password_reset("amina@example.com", "http://localhost:5173/reset-password/")
        .await
        .unwrap();
    assert!(confirmation["success"].as_str().is_some());

    let done = api
        .complete_password_reset("new-password", "c1x2y3-abcdef", "MQ")
        .await
        .unwrap();
    assert!(done.is_null());

    let request = fixture.recorded(|r| r.reset_requests[0].clone());
    assert_eq!(request["email"], "amina@example.com");
    assert_eq!(request["redirect_url"], "http://localhost:5173/reset-password/");

    let completion = fixture.recorded(|r| r.reset_completions[0].clone());
    assert_eq!(completion["uidb64"], "MQ");
    assert_eq!(completion["token"], "c1x2y3-abcdef");
    assert_eq!(completion["password"], "new-password");
}

#[tokio::test]
async fn tenant_overview_combines_three_calls() {
    let fixture = common::spawn().await;
    let api = client(&fixture).with_token(Some("A1".to_string()));

    let overview = api.fetch_tenant_overview().await.unwrap();
    assert_eq!(overview.profile.user.full_name(), "Amina Otieno");
    assert!(overview.profile.property.is_none());
    assert_eq!(overview.notifications.len(), 1);
    assert_eq!(overview.maintenance_requests.len(), 1);
    assert!(overview.maintenance_requests[0].status.is_open());
    assert_eq!(fixture.recorded(|r| r.authorization.len()), 3);
}

#[tokio::test]
async fn mark_notification_read_patches_edit_endpoint() {
    let fixture = common::spawn().await;
    let api = client(&fixture).with_token(Some("A1".to_string()));

    let notifications = api.fetch_notifications().await.unwrap();
    let id = notifications[0].id.unwrap();
    let reply = api.mark_notification_read(id).await.unwrap();
    assert!(reply["message"].as_str().is_some());

    assert!(matches!(
        api.mark_notification_read(99).await,
        Err(ApiError::NotFound(ref body)) if body.contains("not found")
    ));

    let sent = fixture.recorded(|r| r.marked_read.clone());
    assert_eq!(sent, vec![serde_json::json!({ "notification": 7 }), serde_json::json!({ "notification": 99 })]);
    assert_eq!(
        fixture.recorded(|r| r.authorization.last().cloned().flatten()),
        Some("Bearer A1".to_string())
    );
}

#[tokio::test]
async fn error_statuses_map_to_api_errors() {
    let fixture = common::spawn().await;
    let api = client(&fixture).with_token(Some("A1".to_string()));

    assert!(matches!(
        api.fetch_landlord_dashboard().await,
        Err(ApiError::AccessDenied(ref body)) if body.contains("permission")
    ));
    assert!(matches!(
        api.fetch_applications().await,
        Err(ApiError::ServerError(_))
    ));
    // Route the fixture does not serve
    assert!(matches!(
        api.submit_vacate_notice(&pms_core::models::VacateNotice {
            vacate_date: chrono::NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            reason: "Moving".to_string(),
        })
        .await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = ApiClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
    let err = api
        .obtain_token_pair(&Credentials::new("a@b.c", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NetworkError(_)));
    assert!(!err.is_rejection());
}
