use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use super::ApiError;
use crate::{
    repository::{Pagination, MAX_PAGE_LIMIT},
    validation::{check_body, BodySchema, FieldIssue},
};

/// JSON body checked against the payload's [`BodySchema`] before it is
/// deserialized.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + BodySchema,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Rejected {
                status: rejection.status(),
                detail: rejection.body_text(),
            })?;
        parse_body(&bytes).map(ValidJson)
    }
}

fn parse_body<T: DeserializeOwned + BodySchema>(bytes: &[u8]) -> Result<T, ApiError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|err| {
        ApiError::Validation(vec![FieldIssue::new(
            &["body"],
            "json_invalid",
            format!("JSON decode error: {err}"),
        )])
    })?;
    check_body(&value, T::RULES).map_err(ApiError::Validation)?;
    serde_json::from_value(value).map_err(|err| {
        ApiError::Validation(vec![FieldIssue::new(
            &["body"],
            "value_error",
            err.to_string(),
        )])
    })
}

/// `limit` and `offset` query parameters.
pub struct PageQuery(pub Pagination);

#[async_trait]
impl<S> FromRequestParts<S> for PageQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri).map_err(
            |rejection| ApiError::Rejected {
                status: rejection.status(),
                detail: rejection.body_text(),
            },
        )?;
        parse_pagination(&pairs)
            .map(PageQuery)
            .map_err(ApiError::Validation)
    }
}

fn parse_pagination(pairs: &[(String, String)]) -> Result<Pagination, Vec<FieldIssue>> {
    let last = |key: &str| {
        pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    let mut pagination = Pagination::default();
    let mut issues = Vec::new();

    if let Some(raw) = last("limit") {
        match parse_int("limit", raw) {
            Ok(limit) if limit <= 0 => issues.push(FieldIssue::new(
                &["query", "limit"],
                "greater_than",
                "Input should be greater than 0",
            )),
            Ok(limit) if limit > i64::from(MAX_PAGE_LIMIT) => issues.push(FieldIssue::new(
                &["query", "limit"],
                "less_than_equal",
                format!("Input should be less than or equal to {MAX_PAGE_LIMIT}"),
            )),
            Ok(limit) => pagination.limit = limit as u32,
            Err(issue) => issues.push(issue),
        }
    }

    if let Some(raw) = last("offset") {
        match parse_int("offset", raw) {
            Ok(offset) if offset < 0 => issues.push(FieldIssue::new(
                &["query", "offset"],
                "greater_than_equal",
                "Input should be greater than or equal to 0",
            )),
            Ok(offset) => pagination.offset = offset as u64,
            Err(issue) => issues.push(issue),
        }
    }

    if issues.is_empty() {
        Ok(pagination)
    } else {
        Err(issues)
    }
}

fn parse_int(name: &str, raw: &str) -> Result<i64, FieldIssue> {
    raw.trim().parse::<i64>().map_err(|_| {
        FieldIssue::new(
            &["query", name],
            "int_parsing",
            "Input should be a valid integer, unable to parse string as an integer",
        )
    })
}

/// The `:id` path segment as a UUID.
pub struct EntityId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::Rejected {
                status: rejection.status(),
                detail: rejection.body_text(),
            })?;
        parse_id(&raw).map(EntityId)
    }
}

/// Parse the `{id}` path segment.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|err| {
        ApiError::Validation(vec![FieldIssue::new(
            &["path", "id"],
            "uuid_parsing",
            format!("Input should be a valid UUID, {err}"),
        )])
    })
}
