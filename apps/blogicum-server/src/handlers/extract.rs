//! Request body and query extractors shared by the handlers.

use std::future::Future;
use std::pin::Pin;

use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Form submission accepted as JSON or `application/x-www-form-urlencoded`.
pub struct FormBody<T>(pub T);

impl<T> FormBody<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> FromRequest for FormBody<T>
where
    T: DeserializeOwned + 'static,
{
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        if req.content_type() == "application/json" {
            let json = web::Json::<T>::from_request(req, payload);
            Box::pin(async move { Ok(FormBody(json.await?.into_inner())) })
        } else {
            let form = web::Form::<T>::from_request(req, payload);
            Box::pin(async move { Ok(FormBody(form.await?.into_inner())) })
        }
    }
}

/// `?page=` on the listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// `?next=` on the login page.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}
