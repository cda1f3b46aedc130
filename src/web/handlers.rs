//! HTTP handlers for the phonebook API

use askama::Template;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Local;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

use super::error::ApiError;
use super::state::AppState;
use crate::person::{Person, PersonId, PersonPatch};

/// Request body for create and update.
///
/// Both fields are optional at the wire level: create insists on them itself,
/// update leaves absent fields as they are. The outer `Option` is presence,
/// the inner one tells an explicit `null` apart from a value.
#[derive(Debug, Default, Deserialize)]
pub struct PersonPayload {
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub number: Option<Option<String>>,
}

fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl PersonPayload {
    /// Decode a request body.
    ///
    /// An empty body, or one not sent as JSON, reads as `{}` so the handler's
    /// own checks decide the outcome. Only a JSON body that fails to parse is
    /// malformed.
    pub fn from_body(headers: &HeaderMap, body: &[u8]) -> Result<Self, ApiError> {
        if !has_json_content_type(headers) || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|err| ApiError::MalformedBody(err.to_string()))
    }
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

#[async_trait]
impl<S> FromRequest<S> for PersonPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let headers = req.headers().clone();
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))?;
        Self::from_body(&headers, &body)
    }
}

impl From<PersonPayload> for PersonPatch {
    fn from(payload: PersonPayload) -> Self {
        // null clears the field, which the store rules then reject
        PersonPatch {
            name: payload.name.map(Option::unwrap_or_default),
            number: payload.number.map(Option::unwrap_or_default),
        }
    }
}

#[derive(Template)]
#[template(path = "info.html")]
struct InfoTemplate {
    count: usize,
    timestamp: String,
}

/// List every person
pub async fn list_persons(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Person>>, ApiError> {
    let persons = state.gateway.list_all().await?;
    Ok(Json(persons))
}

/// Entry count and the server's current time, rendered fresh on every call
pub async fn info(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let count = state.gateway.count().await?;
    let page = InfoTemplate {
        count,
        timestamp: Local::now().format("%a %b %d %Y %H:%M:%S GMT%z").to_string(),
    }
    .render()?;

    Ok(([(header::CACHE_CONTROL, "no-store")], Html(page)).into_response())
}

/// Get a specific person
pub async fn get_person(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.gateway.find_by_id(&id).await? {
        Some(person) => Ok(Json(person).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

/// Create a person.
///
/// Answers 200 rather than 201; existing clients depend on it.
pub async fn create_person(
    State(state): State<Arc<AppState>>,
    body: PersonPayload,
) -> Result<Json<Person>, ApiError> {
    let present =
        |field: Option<Option<String>>| field.flatten().filter(|value| !value.is_empty());
    let (Some(name), Some(number)) = (present(body.name), present(body.number)) else {
        return Err(ApiError::MissingField);
    };

    let person = state.gateway.create(name, number).await?;
    Ok(Json(person))
}

/// Delete a person. Succeeds whether or not the record existed.
pub async fn delete_person(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.gateway.delete_by_id(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Update a person in place
pub async fn update_person(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<PersonPayload, ApiError>,
) -> Result<Response, ApiError> {
    // A malformed id is reported ahead of a malformed body
    let patch = match payload {
        Ok(body) => PersonPatch::from(body),
        Err(err) => {
            PersonId::parse(&id)?;
            return Err(err);
        }
    };

    match state.gateway.update_by_id(&id, patch).await? {
        Some(person) => Ok(Json(person).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}
