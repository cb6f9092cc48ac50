use std::fmt;

use actix_web::dev::Payload;
use actix_web::http::header::LOCATION;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::{Ready, ready};

use crate::presentation::middleware::RequestId;

/// Request id assigned by
/// [`RequestIdMiddleware`](crate::presentation::middleware::RequestIdMiddleware), or `unknown`
/// when the middleware is not mounted.
#[derive(Debug, Clone)]
pub struct CurrentRequestId(pub String);

impl fmt::Display for CurrentRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromRequest for CurrentRequestId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let id = req
            .extensions()
            .get::<RequestId>()
            .map(|rid| rid.0.clone())
            .unwrap_or_else(|| "unknown".into());
        ready(Ok(CurrentRequestId(id)))
    }
}

pub fn redirect_home() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, "/"))
        .finish()
}

pub fn html(page: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page)
}
