use actix_web::{
    Error, HttpMessage, HttpRequest,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};

use crate::{
    ENV,
    api::error,
    utils::{Claims, TypeClaims},
};

/// Resolves the caller identity from a bearer access token.
pub fn claims_from_header(header: Option<&str>, secret: &[u8]) -> Result<Claims, error::Error> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| error::Error::unauthorized("Token Invalid or Expired"))?;

    let claims = Claims::decode(token, secret)
        .map_err(|_| error::Error::unauthorized("Token Invalid or Expired"))?;

    if !claims.is_type(TypeClaims::AccessToken) {
        return Err(error::Error::unauthorized("Token Invalid or Expired"));
    }

    Ok(claims)
}

pub async fn authentication<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let auth = req.headers().get("Authorization").and_then(|h| h.to_str().ok());
    let claims = claims_from_header(auth, ENV.jwt_secret.as_ref())?;

    req.extensions_mut().insert(claims);

    next.call(req).await
}

pub fn get_claims(req: &HttpRequest) -> Result<Claims, error::Error> {
    let extensions = req.extensions();

    let claims = extensions
        .get::<Claims>()
        .ok_or_else(|| error::Error::unauthorized("Unauthorized"))?
        .clone();

    Ok(claims)
}
