use actix_web::{http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use subtle::ConstantTimeEq;

use crate::{errors::AppError, AppState};

/// Guard for admin routes: the request must carry
/// `Authorization: Bearer <admin_token>`.
/// When no admin token is configured (development and testing only) every
/// request passes.
#[derive(Debug)]
pub struct AdminToken;

impl FromRequest for AdminToken {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            return ready(Err(AppError::InternalError("Application state missing".into()).into()));
        };

        let Some(expected) = state.admin_token.as_ref() else {
            return ready(Ok(AdminToken));
        };

        let provided = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        match provided {
            Some(token) if tokens_match(token, expected) => {
                ready(Ok(AdminToken))
            }
            _ => {
                tracing::warn!(path = %req.path(), "rejected admin request without valid token");
                ready(Err(AppError::UnauthorizedAccess.into()))
            }
        }
    }
}

fn tokens_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}
