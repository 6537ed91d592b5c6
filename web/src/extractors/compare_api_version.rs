use crate::extractors::RejectionType;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use log::*;
use service::config::ApiVersion;

/// Checks the `x-version` request header against the API versions this
/// server exposes. Requests without the header get the default version.
pub(crate) struct CompareApiVersion(pub ApiVersion);

#[async_trait]
impl<S> FromRequestParts<S> for CompareApiVersion
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(ApiVersion::field_name()) else {
            return Ok(CompareApiVersion(ApiVersion::default()));
        };

        let requested = header.to_str().map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                format!("Malformed {} header", ApiVersion::field_name()),
            )
        })?;

        match ApiVersion::versions()
            .into_iter()
            .find(|version| *version == requested)
        {
            Some(version) => Ok(CompareApiVersion(ApiVersion::new(version))),
            None => {
                warn!("Rejecting request for unsupported API version {requested}");
                Err((
                    StatusCode::BAD_REQUEST,
                    format!("Unsupported API version: {requested}"),
                ))
            }
        }
    }
}
