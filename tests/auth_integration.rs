// ABOUTME: Integration tests for the credential refresh flow
// ABOUTME: Exercises the token endpoint with wiremock and file persistence

use chrono::{Duration, Utc};
use nbsync::auth::{load_token, obtain_credential, refresh, save_token};
use nbsync::config::DriveConfig;
use nbsync::StoredToken;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn expired_token(token_uri: String) -> StoredToken {
    StoredToken {
        token: "ya29.stale".into(),
        refresh_token: Some("1//refresh".into()),
        token_uri,
        client_id: "client".into(),
        client_secret: "secret".into(),
        scopes: vec!["https://www.googleapis.com/auth/drive".into()],
        expiry: Some(Utc::now() - Duration::hours(1)),
    }
}

#[tokio::test]
async fn test_refresh_grants_new_access_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=1%2F%2Frefresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.fresh",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let token_uri = format!("{}/token", mock_server.uri());
    let refreshed = tokio::task::spawn_blocking(move || refresh(&expired_token(token_uri)))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(refreshed.token, "ya29.fresh");
    assert_eq!(refreshed.refresh_token.as_deref(), Some("1//refresh"));
    assert!(!refreshed.is_expired());
}

#[tokio::test]
async fn test_refresh_failure_is_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant"
        })))
        .mount(&mock_server)
        .await;

    let token_uri = format!("{}/token", mock_server.uri());
    let result = tokio::task::spawn_blocking(move || refresh(&expired_token(token_uri)))
        .await
        .unwrap();

    assert!(matches!(result, Err(nbsync::Error::Auth(_))));
}

#[tokio::test]
async fn test_obtain_refreshes_and_persists_expired_cached_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.persisted",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp = TempDir::new().unwrap();
    let token_path = temp.path().join("token.json");
    let token_uri = format!("{}/token", mock_server.uri());
    save_token(&token_path, &expired_token(token_uri)).unwrap();

    let cfg = DriveConfig {
        token_path: token_path.clone(),
        credentials_path: temp.path().join("credentials.json"),
        ..DriveConfig::default()
    };

    let obtained = tokio::task::spawn_blocking(move || obtain_credential(&cfg))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(obtained.token, "ya29.persisted");

    // The refreshed credential must be written back to the token file
    let persisted = load_token(&token_path).unwrap().unwrap();
    assert_eq!(persisted.token, "ya29.persisted");
    assert!(!persisted.is_expired());
}

#[test]
fn test_non_interactive_mode_uses_secret_token_env() {
    let temp = TempDir::new().unwrap();
    let cfg = DriveConfig {
        token_path: temp.path().join("token.json"),
        credentials_path: temp.path().join("credentials.json"),
        non_interactive: true,
        ..DriveConfig::default()
    };

    // Unset: non-interactive mode must fail rather than prompt
    std::env::remove_var("SECRET_TOKEN");
    let err = obtain_credential(&cfg).unwrap_err();
    assert!(matches!(err, nbsync::Error::Auth(_)));

    let env_token = StoredToken {
        token: "ya29.env".into(),
        refresh_token: Some("1//refresh".into()),
        token_uri: "https://oauth2.googleapis.com/token".into(),
        client_id: "client".into(),
        client_secret: "secret".into(),
        scopes: vec![],
        expiry: Some(Utc::now() + Duration::hours(1)),
    };
    std::env::set_var("SECRET_TOKEN", serde_json::to_string(&env_token).unwrap());

    let obtained = obtain_credential(&cfg).unwrap();
    assert_eq!(obtained.token, "ya29.env");

    std::env::remove_var("SECRET_TOKEN");
}
