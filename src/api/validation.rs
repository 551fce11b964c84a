use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use bson::oid::ObjectId;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::auth::Role;
use crate::error::{ApiError, FieldErrors};

/// JSON body that has been decoded and passed its field validation
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        value.validate().map_err(validation_error)?;
        Ok(Self(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "PAYLOAD_TOO_LARGE",
            "Request body is too large",
        );
    }
    ApiError::invalid_json(rejection)
}

/// One entry per invalid field, keyed by its wire name
pub fn validation_error(errors: ValidationErrors) -> ApiError {
    let mut details = FieldErrors::new();
    for (field, field_errors) in errors.field_errors() {
        let message = field_errors
            .iter()
            .find(|e| e.code == "required")
            .or_else(|| field_errors.first())
            .map(describe)
            .unwrap_or("Invalid value provided");
        details.insert(camel_case(&field), message.to_string());
    }
    ApiError::validation(details)
}

fn describe(error: &ValidationError) -> &'static str {
    match error.code.as_ref() {
        "required" => "This field is required",
        "email" => "Please provide a valid email address",
        "length" => {
            let len = error
                .params
                .get("value")
                .and_then(|v| v.as_str())
                .map(|s| s.chars().count() as u64);
            let min = error.params.get("min").and_then(|v| v.as_u64());
            match (len, min) {
                (Some(len), Some(min)) if len < min => "This field is too short",
                _ => "This field is too long",
            }
        }
        _ => "Invalid value provided",
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Field-level check: the value must not be blank
pub fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Field-level check: one of the known role names
pub fn known_role(value: &str) -> Result<(), ValidationError> {
    match Role::parse(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("oneof")),
    }
}

/// Parse a 24-hex-character object id, failing with the given 400 code
pub fn parse_id(value: &str, code: &'static str, message: &'static str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(value.trim()).map_err(|_| ApiError::invalid_id(code, message))
}

pub fn parse_ids(values: &[String], code: &'static str, message: &'static str) -> Result<Vec<ObjectId>, ApiError> {
    values.iter().map(|v| parse_id(v, code, message)).collect()
}

/// Path segments that look like an object id are looked up by id, anything else by name
pub fn looks_like_object_id(value: &str) -> bool {
    value.len() == 24 && value.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    struct Signup {
        #[validate(custom(function = "required"))]
        #[validate(length(min = 2, max = 5))]
        display_name: String,
        #[validate(email)]
        email: String,
        #[validate(custom(function = "known_role"))]
        role: String,
    }

    fn details(input: Signup) -> FieldErrors {
        let err = validation_error(input.validate().unwrap_err());
        assert_eq!(err.code(), "VALIDATION_ERROR");
        err.details().cloned().unwrap()
    }

    #[test]
    fn messages_follow_the_failed_rule() {
        let details = details(Signup {
            display_name: "a".into(),
            email: "nope".into(),
            role: "ROOT".into(),
        });
        assert_eq!(details["displayName"], "This field is too short");
        assert_eq!(details["email"], "Please provide a valid email address");
        assert_eq!(details["role"], "Invalid value provided");
    }

    #[test]
    fn required_wins_over_length() {
        let details = details(Signup {
            display_name: "".into(),
            email: "a@b.co".into(),
            role: "CLIENT".into(),
        });
        assert_eq!(details.len(), 1);
        assert_eq!(details["displayName"], "This field is required");
    }

    #[test]
    fn too_long_is_reported() {
        let details = details(Signup {
            display_name: "abcdefgh".into(),
            email: "a@b.co".into(),
            role: "ADMIN".into(),
        });
        assert_eq!(details["displayName"], "This field is too long");
    }

    #[test]
    fn object_id_shape() {
        assert!(looks_like_object_id("507f1f77bcf86cd799439011"));
        assert!(!looks_like_object_id("Acme Corp"));
        assert!(!looks_like_object_id("507f1f77bcf86cd79943901z"));
        assert!(parse_id("507f1f77bcf86cd799439011", "INVALID_COMPANY_ID", "Invalid company ID").is_ok());
        let err = parse_id("123", "INVALID_COMPANY_ID", "Invalid company ID").unwrap_err();
        assert_eq!(err.code(), "INVALID_COMPANY_ID");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
