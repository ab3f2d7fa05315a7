use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::keys::{
    generate_client_id, generate_client_secret, hash_client_secret, hash_token_sha256,
    verify_registration_token,
};
use crate::models::{
    Client, ClientDisplayMetadata, GrantType, ResponseType, SubjectType, TokenEndpointAuthMethod,
};
use crate::oidc::AppState;

use super::error::RegistrationError;
use super::validation::{validate_registration, ClientMetadataInput};

fn parse_enum<T: DeserializeOwned>(value: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).ok()
}

fn client_metadata_json(client: &Client) -> serde_json::Value {
    json!({
        "client_id": client.client_id,
        "redirect_uris": client.redirect_uris,
        "token_endpoint_auth_method": client.token_endpoint_auth_method,
        "grant_types": client.grant_types,
        "response_types": client.response_types,
        "scope": client.allowed_scopes.join(" "),
        "subject_type": client.subject_type,
        "jwks": client.jwks,
        "jwks_uri": client.jwks_uri,
        "client_name": client.display.client_name,
        "client_uri": client.display.client_uri,
        "logo_uri": client.display.logo_uri,
        "contacts": client.display.contacts,
        "tos_uri": client.display.tos_uri,
        "policy_uri": client.display.policy_uri,
        "client_secret_expires_at": client.client_secret_expires_at,
    })
}

/// `POST /register` (§4.4): unauthenticated, rate-limited (C2). Mints
/// `client_id`/`client_secret`/registration access token and stores only
/// their hashes; the plaintext values are returned exactly once.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<ClientMetadataInput>,
) -> Result<impl IntoResponse, RegistrationError> {
    validate_registration(&input, true)?;

    let auth_method = input
        .token_endpoint_auth_method
        .as_deref()
        .and_then(parse_enum::<TokenEndpointAuthMethod>)
        .unwrap_or_default();

    let grant_types: Vec<GrantType> = match &input.grant_types {
        Some(values) => values
            .iter()
            .filter_map(|v| parse_enum::<GrantType>(v))
            .collect(),
        None => vec![GrantType::AuthorizationCode],
    };
    let response_types: Vec<ResponseType> = match &input.response_types {
        Some(values) => values
            .iter()
            .filter_map(|v| parse_enum::<ResponseType>(v))
            .collect(),
        None => vec![ResponseType::Code],
    };
    let subject_type = input
        .subject_type
        .as_deref()
        .and_then(parse_enum::<SubjectType>)
        .unwrap_or_default();

    let scopes: Vec<String> = input
        .scope
        .as_deref()
        .unwrap_or("openid")
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let client_id = generate_client_id();
    let is_confidential = auth_method != TokenEndpointAuthMethod::None;
    let client_secret = is_confidential.then(generate_client_secret);
    let client_secret_hash = client_secret
        .as_deref()
        .map(hash_client_secret)
        .transpose()
        .map_err(|e| RegistrationError::ServerError(e.to_string()))?;

    let registration_access_token = generate_client_secret();
    let registration_access_token_hash = hash_token_sha256(&registration_access_token);

    let client = Client {
        client_id: client_id.clone(),
        client_secret_hash,
        redirect_uris: input.redirect_uris.clone().unwrap_or_default(),
        grant_types,
        response_types,
        token_endpoint_auth_method: auth_method,
        allowed_scopes: scopes.clone(),
        default_scopes: scopes,
        subject_type,
        jwks: input.jwks.clone(),
        jwks_uri: input.jwks_uri.clone(),
        require_pkce: false,
        code_challenge_required: false,
        display: ClientDisplayMetadata {
            client_name: input.client_name.clone(),
            client_uri: input.client_uri.clone(),
            logo_uri: input.logo_uri.clone(),
            contacts: input.contacts.clone().unwrap_or_default(),
            tos_uri: input.tos_uri.clone(),
            policy_uri: input.policy_uri.clone(),
        },
        registration_access_token_hash,
        client_secret_expires_at: 0,
        created_at: Utc::now(),
    };

    state
        .clients
        .create(client.clone())
        .await
        .map_err(|e| RegistrationError::ServerError(e.to_string()))?;

    let mut body = client_metadata_json(&client);
    if let Some(secret) = client_secret {
        body["client_secret"] = json!(secret);
    }
    body["registration_access_token"] = json!(registration_access_token);
    body["registration_client_uri"] = json!(format!(
        "{}/register/{}",
        state.config.external_url, client_id
    ));

    Ok((StatusCode::CREATED, Json(body)))
}

async fn authorize_registration_token(
    state: &AppState,
    client_id: &str,
    headers: &HeaderMap,
) -> Result<Client, RegistrationError> {
    let client = state
        .clients
        .get_by_client_id(client_id)
        .await
        .map_err(|e| RegistrationError::ServerError(e.to_string()))?
        .ok_or(RegistrationError::InvalidClient)?;

    let presented = extract_bearer_token(headers).ok_or(RegistrationError::InvalidToken)?;
    if !verify_registration_token(&presented, &client.registration_access_token_hash) {
        return Err(RegistrationError::InvalidToken);
    }

    Ok(client)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(|s| s.trim().to_string())
}

/// `GET /register/{client_id}` (§4.4): returns stored metadata, no plaintext
/// secret.
pub async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, RegistrationError> {
    let client = authorize_registration_token(&state, &client_id, &headers).await?;
    Ok(Json(client_metadata_json(&client)))
}

/// `PUT /register/{client_id}` (§4.4): overlays non-empty input fields onto
/// the stored client, leaving absent fields untouched, then re-validates.
pub async fn update_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<ClientMetadataInput>,
) -> Result<Json<serde_json::Value>, RegistrationError> {
    let mut client = authorize_registration_token(&state, &client_id, &headers).await?;

    validate_registration(&input, false)?;

    if let Some(redirect_uris) = input.redirect_uris {
        client.redirect_uris = redirect_uris;
    }
    if let Some(auth_method) = input.token_endpoint_auth_method.as_deref().and_then(parse_enum) {
        client.token_endpoint_auth_method = auth_method;
    }
    if let Some(values) = &input.grant_types {
        client.grant_types = values.iter().filter_map(|v| parse_enum(v)).collect();
    }
    if let Some(values) = &input.response_types {
        client.response_types = values.iter().filter_map(|v| parse_enum(v)).collect();
    }
    if let Some(scope) = &input.scope {
        let scopes: Vec<String> = scope.split_whitespace().map(str::to_string).collect();
        client.allowed_scopes = scopes.clone();
        client.default_scopes = scopes;
    }
    if let Some(subject_type) = input.subject_type.as_deref().and_then(parse_enum) {
        client.subject_type = subject_type;
    }
    if input.jwks.is_some() {
        client.jwks = input.jwks;
        client.jwks_uri = None;
    }
    if input.jwks_uri.is_some() {
        client.jwks_uri = input.jwks_uri;
        client.jwks = None;
    }
    if input.client_name.is_some() {
        client.display.client_name = input.client_name;
    }
    if input.client_uri.is_some() {
        client.display.client_uri = input.client_uri;
    }
    if input.logo_uri.is_some() {
        client.display.logo_uri = input.logo_uri;
    }
    if let Some(contacts) = input.contacts {
        client.display.contacts = contacts;
    }
    if input.tos_uri.is_some() {
        client.display.tos_uri = input.tos_uri;
    }
    if input.policy_uri.is_some() {
        client.display.policy_uri = input.policy_uri;
    }

    state
        .clients
        .update(client.clone())
        .await
        .map_err(|e| RegistrationError::ServerError(e.to_string()))?;

    Ok(Json(client_metadata_json(&client)))
}

/// `DELETE /register/{client_id}` (§4.4).
pub async fn delete_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, RegistrationError> {
    authorize_registration_token(&state, &client_id, &headers).await?;

    state
        .clients
        .delete(&client_id)
        .await
        .map_err(|e| RegistrationError::ServerError(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}
