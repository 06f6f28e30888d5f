use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, OptionalFromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::shared::validation::collect_field_errors;

/// JSON body that has been deserialized and validated. Every violated field is
/// reported at once; the handler only ever sees a fully valid payload.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        validate(&value)?;
        Ok(Self(value))
    }
}

/// Query string coerced into typed values (numbers, enums) and validated.
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = <Query<T> as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .map_err(query_rejection)?;
        validate(&value)?;
        Ok(Self(value))
    }
}

/// Path parameters, validated the same way as bodies.
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = <Path<T> as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .map_err(path_rejection)?;
        validate(&value)?;
        Ok(Self(value))
    }
}

fn validate<T: Validate>(value: &T) -> Result<(), AppError> {
    value
        .validate()
        .map_err(|e| AppError::Validation(collect_field_errors(&e)))
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    let (message, code) = match rejection {
        JsonRejection::JsonDataError(err) => (
            format!("Invalid JSON data: {}", err.body_text()),
            "invalid_type",
        ),
        JsonRejection::JsonSyntaxError(err) => {
            (format!("Invalid JSON syntax: {}", err.body_text()), "invalid_json")
        }
        JsonRejection::MissingJsonContentType(err) => (
            format!("Missing JSON content type: {}", err.body_text()),
            "invalid_content_type",
        ),
        _ => ("Failed to parse JSON body".to_string(), "invalid_body"),
    };
    AppError::validation("body", message, code)
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    AppError::validation("query", rejection.body_text(), "invalid_type")
}

fn path_rejection(rejection: PathRejection) -> AppError {
    AppError::validation("params", rejection.body_text(), "invalid_type")
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::AccessTokenRequired)
    }
}

/// Lets handlers behind the optional auth layer take `Option<AuthenticatedUser>`.
impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthenticatedUser>().cloned())
    }
}
