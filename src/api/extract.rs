//! Request extractors that reject with [`DashError`] instead of axum's plain-text rejections.

use axum::{
    extract::{rejection::JsonRejection, Form, FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::{Result, DashError};

/// Text fields of a form body, sent either as `multipart/form-data` or
/// `application/x-www-form-urlencoded`.
#[derive(Debug, Clone, Default)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self(fields)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// A field that must be present
    pub fn required(&self, name: &str) -> Result<String> {
        self.get(name)
            .map(str::to_string)
            .ok_or_else(|| DashError::InvalidInput(format!("Field required: {}", name)))
    }

    /// A parsed field; absent or blank values take `default`
    pub fn parse_or<T>(&self, name: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(name).map(str::trim) {
            None | Some("") => Ok(default),
            Some(value) => value.parse().map_err(|e| {
                DashError::InvalidInput(format!("Invalid value for {}: {:?} ({})", name, value, e))
            }),
        }
    }
}

impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = DashError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| DashError::InvalidInput(e.body_text()))?;
            return Ok(FormFields(fields));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| DashError::InvalidInput(e.body_text()))?;

        let mut fields = HashMap::new();
        while let Some(field) = multipart.next_field().await.map_err(DashError::from)? {
            // File parts carry no parameters
            if field.file_name().is_some() {
                continue;
            }
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let value = field.text().await.map_err(DashError::from)?;
            fields.insert(name, value);
        }

        Ok(FormFields(fields))
    }
}

/// JSON body extractor rejecting malformed bodies with a 422 and the usual error body
#[derive(Debug, Clone, Copy)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = DashError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| DashError::InvalidInput(rejection.body_text()))?;
        Ok(JsonBody(inner))
    }
}
