use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use log::debug;

use crate::auth::{self, model::Principal};

pub async fn authenticate(
    auth_service: State<auth::Service>,
    mut req: Request,
    next: Next,
) -> crate::Result<Response> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(auth::Error::Unauthenticated)?;

    let sub = auth_service
        .current_identity(token)
        .await
        .ok_or(auth::Error::Unauthenticated)?;

    debug!("authenticated request for {sub}");
    req.extensions_mut().insert(Principal(sub));

    Ok(next.run(req).await)
}
