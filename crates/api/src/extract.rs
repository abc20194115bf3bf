//! Form-field extractor accepting both urlencoded and multipart bodies.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Form;

use crate::error::AppError;

/// Text fields of a submitted form.
///
/// Browser clients post `multipart/form-data`; scripts usually post
/// `application/x-www-form-urlencoded`. Both land here. File parts are
/// ignored.
///
/// ```ignore
/// async fn handler(fields: FormFields) -> AppResult<Json<()>> {
///     let prompt = fields.required("prompt")?;
///     let count: u32 = fields.parse_or("count", 1)?;
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormFields(pub HashMap<String, String>);

impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return Ok(Self(fields));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let mut fields = HashMap::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            if field.file_name().is_some() {
                continue;
            }
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            fields.insert(name, value);
        }
        Ok(Self(fields))
    }
}

impl FormFields {
    /// A field that must be present and non-blank.
    pub fn required(&self, name: &str) -> Result<&str, AppError> {
        self.optional(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing required field '{name}'")))
    }

    /// A field value, treating blank input as absent.
    pub fn optional(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Parse a field, falling back to `default` when absent.
    pub fn parse_or<T: FromStr>(&self, name: &str, default: T) -> Result<T, AppError> {
        match self.optional(name) {
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Field '{name}' has an invalid value '{raw}'"))),
            None => Ok(default),
        }
    }
}
