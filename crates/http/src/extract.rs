//! Request extractors whose rejections use the JSON envelope.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRef, FromRequest, FromRequestParts, Query, Request,
    },
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use libris_authz::{authorize, AuthError, Identity, Operation, TokenCodec};

use crate::error::AppError;

/// Authenticated caller, resolved from `Authorization: Bearer <token>`.
///
/// Handlers take a `Caller` and then call [`Caller::authorize`] with the
/// operation they implement, so the role check always precedes business logic.
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

impl Caller {
    pub fn authorize(&self, operation: Operation) -> Result<&Identity, AppError> {
        authorize(&self.0, operation)?;
        Ok(&self.0)
    }

    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidCredential)?;

    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
    Arc<TokenCodec>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let codec = Arc::<TokenCodec>::from_ref(state);
        let identity = codec.verify(bearer_token(parts)?)?;
        Ok(Caller(identity))
    }
}

/// `Json<T>` whose parse failures become validation errors.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `Query<T>` whose parse failures become validation errors.
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_authz::Role;
    use std::time::Duration;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("/api/books");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn valid_bearer_resolves_identity() {
        let codec = Arc::new(TokenCodec::new("secret", Duration::from_secs(3600)));
        let identity = Identity {
            id: "u1".to_string(),
            role: Role::Librarian,
        };
        let token = codec.issue(&identity).unwrap().token;

        let mut parts = parts(Some(&format!("Bearer {token}")));
        let caller = Caller::from_request_parts(&mut parts, &codec).await.unwrap();
        assert_eq!(caller.identity(), &identity);
        assert!(caller.authorize(Operation::AddBook).is_ok());
        assert!(caller.authorize(Operation::Borrow).is_err());
    }

    #[derive(Debug, serde::Deserialize)]
    struct Payload {
        title: String,
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let request = axum::http::Request::builder()
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{\"title\": 42"))
            .unwrap();
        let err = JsonBody::<Payload>::from_request(request, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let request = axum::http::Request::builder()
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{\"title\": \"Dune\"}"))
            .unwrap();
        let JsonBody(payload) = JsonBody::<Payload>::from_request(request, &()).await.unwrap();
        assert_eq!(payload.title, "Dune");
    }

    #[derive(Debug, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Filter {
        #[serde(default)]
        exclude_self: bool,
    }

    #[tokio::test]
    async fn bad_query_string_is_a_validation_error() {
        let mut parts = axum::http::Request::builder()
            .uri("/api/users?excludeSelf=maybe")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        let err = QueryParams::<Filter>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let mut parts = axum::http::Request::builder()
            .uri("/api/users?excludeSelf=true")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        let QueryParams(filter) = QueryParams::<Filter>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(filter.exclude_self);
    }

    #[tokio::test]
    async fn missing_or_malformed_header_is_unauthorized() {
        let codec = Arc::new(TokenCodec::new("secret", Duration::from_secs(3600)));

        for header in [None, Some("Basic abc"), Some("Bearer "), Some("Bearer nope")] {
            let mut parts = parts(header);
            let err = Caller::from_request_parts(&mut parts, &codec)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Unauthorized { .. }), "{header:?}");
        }
    }
}
