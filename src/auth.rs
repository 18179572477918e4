// ABOUTME: Credential handling: cached token, refresh flow, consent flow
// ABOUTME: Persists the credential back to the token file after every grant

use crate::{
    config::{DriveConfig, DRIVE_SCOPES, SECRET_TOKEN_VAR},
    model::{ClientSecretsFile, StoredToken, TokenResponse},
    Error, Result,
};
use chrono::{Duration as ChronoDuration, Utc};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

/// Obtain a usable credential following the cached → refresh → consent
/// policy. Every successful refresh or consent writes the token file.
///
/// In non-interactive mode the credential comes from the `SECRET_TOKEN`
/// environment variable and the consent flow is never launched.
pub fn obtain_credential(cfg: &DriveConfig) -> Result<StoredToken> {
    let cached = if cfg.non_interactive {
        token_from_env()?
    } else {
        load_token(&cfg.token_path)?
    };

    if let Some(token) = cached {
        if !token.is_expired() {
            return Ok(token);
        }
        if token.refresh_token.is_some() {
            tracing::info!("access token expired, refreshing");
            let refreshed = refresh(&token)?;
            save_token(&cfg.token_path, &refreshed)?;
            return Ok(refreshed);
        }
        if cfg.non_interactive {
            return Err(Error::Auth(
                "token from environment is expired and has no refresh token".into(),
            ));
        }
    } else if cfg.non_interactive {
        return Err(Error::Auth(format!(
            "{} not set in non-interactive mode",
            SECRET_TOKEN_VAR
        )));
    }

    let token = run_consent_flow(&cfg.credentials_path)?;
    save_token(&cfg.token_path, &token)?;
    Ok(token)
}

fn token_from_env() -> Result<Option<StoredToken>> {
    match std::env::var(SECRET_TOKEN_VAR) {
        Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        Err(_) => Ok(None),
    }
}

pub fn load_token(path: &Path) -> Result<Option<StoredToken>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Non-atomic read-then-write: a concurrent second invocation can race on
/// this file. Known limitation.
pub fn save_token(path: &Path, token: &StoredToken) -> Result<()> {
    let json = serde_json::to_string_pretty(token)?;
    fs::write(path, json)?;
    Ok(())
}

/// Exchange a refresh token for a fresh access token at the token endpoint
/// recorded in the stored credential.
pub fn refresh(token: &StoredToken) -> Result<StoredToken> {
    let refresh_token = token
        .refresh_token
        .as_deref()
        .ok_or_else(|| Error::Auth("no refresh token available".into()))?;

    let client = http_client()?;
    let response = client
        .post(&token.token_uri)
        .form(&[
            ("client_id", token.client_id.as_str()),
            ("client_secret", token.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .send()?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(Error::Auth(format!(
            "token refresh failed with status {}: {}",
            status.as_u16(),
            body
        )));
    }

    let granted: TokenResponse = response.json()?;
    Ok(apply_grant(token.clone(), granted))
}

/// Fold a token-endpoint reply into the stored credential. The refresh
/// token is only replaced when the endpoint returns a new one.
fn apply_grant(mut token: StoredToken, granted: TokenResponse) -> StoredToken {
    token.token = granted.access_token;
    if granted.refresh_token.is_some() {
        token.refresh_token = granted.refresh_token;
    }
    let expires_in = granted.expires_in.unwrap_or(3600);
    token.expiry = Some(Utc::now() + ChronoDuration::seconds(expires_in));
    token
}

/// Installed-app consent flow: open the consent URL in the browser, catch
/// the redirect on a loopback listener, exchange the code for tokens.
fn run_consent_flow(credentials_path: &Path) -> Result<StoredToken> {
    let content = fs::read_to_string(credentials_path).map_err(|e| {
        Error::Auth(format!(
            "cannot read client secrets at {}: {}",
            credentials_path.display(),
            e
        ))
    })?;
    let secrets: ClientSecretsFile = serde_json::from_str(&content)?;
    let installed = secrets.installed;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    let redirect_uri = format!("http://127.0.0.1:{}", port);

    let scopes = DRIVE_SCOPES.join(" ");
    let mut auth_url = url::Url::parse(&installed.auth_uri)
        .map_err(|e| Error::Auth(format!("invalid auth URI: {}", e)))?;
    auth_url
        .query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &installed.client_id)
        .append_pair("redirect_uri", &redirect_uri)
        .append_pair("scope", &scopes)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent");

    println!("Opening browser for authorization...");
    println!("If it does not open, visit:\n{}", auth_url);
    if open::that(auth_url.as_str()).is_err() {
        tracing::warn!("could not launch browser, waiting for manual visit");
    }

    let code = wait_for_redirect(&listener)?;

    let client = http_client()?;
    let response = client
        .post(&installed.token_uri)
        .form(&[
            ("client_id", installed.client_id.as_str()),
            ("client_secret", installed.client_secret.as_str()),
            ("code", code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(Error::Auth(format!(
            "code exchange failed with status {}: {}",
            status.as_u16(),
            body
        )));
    }

    let granted: TokenResponse = response.json()?;
    let expires_in = granted.expires_in.unwrap_or(3600);
    Ok(StoredToken {
        token: granted.access_token,
        refresh_token: granted.refresh_token,
        token_uri: installed.token_uri,
        client_id: installed.client_id,
        client_secret: installed.client_secret,
        scopes: DRIVE_SCOPES.iter().map(|s| s.to_string()).collect(),
        expiry: Some(Utc::now() + ChronoDuration::seconds(expires_in)),
    })
}

/// Block on the loopback listener for the single OAuth redirect and pull
/// the authorization code out of its query string.
fn wait_for_redirect(listener: &TcpListener) -> Result<String> {
    let (mut stream, _) = listener.accept()?;
    let mut reader = BufReader::new(&mut stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    // "GET /?code=...&scope=... HTTP/1.1"
    let path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| Error::Auth("malformed redirect request".into()))?;
    let parsed = url::Url::parse(&format!("http://127.0.0.1{}", path))
        .map_err(|e| Error::Auth(format!("malformed redirect URL: {}", e)))?;

    let code = parsed
        .query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned());

    let body = match &code {
        Some(_) => "Authorization complete. You can close this tab.",
        None => "Authorization failed. You can close this tab.",
    };
    let reply = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(reply.as_bytes())?;

    code.ok_or_else(|| Error::Auth("redirect carried no authorization code".into()))
}

fn http_client() -> Result<reqwest::blocking::Client> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    Ok(client)
}
