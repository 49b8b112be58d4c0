use serde::Deserialize;

use crate::error::UserError;
use crate::users::repo_types::{NewUser, UserPatch};

/// Body of `POST /users`.
///
/// Every field is optional at the serde level so a missing one is reported by
/// [`CreateUserRequest::validate`] with the field name instead of a generic
/// deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<f64>,
    pub email: Option<String>,
    pub national_id: Option<i64>,
}

/// Body of `PUT /users/:id`. `nationalId` and `id` are not accepted.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<f64>,
    pub email: Option<String>,
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<NewUser, UserError> {
        Ok(NewUser {
            first_name: required_text("firstName", self.first_name)?,
            last_name: required_text("lastName", self.last_name)?,
            age: age(required("age", self.age)?)?,
            email: required_text("email", self.email)?,
            national_id: required("nationalId", self.national_id)?,
        })
    }
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<UserPatch, UserError> {
        Ok(UserPatch {
            first_name: self.first_name.map(|v| text("firstName", v)).transpose()?,
            last_name: self.last_name.map(|v| text("lastName", v)).transpose()?,
            age: self.age.map(age).transpose()?,
            email: self.email.map(|v| text("email", v)).transpose()?,
        })
    }
}

fn required<T>(field: &str, value: Option<T>) -> Result<T, UserError> {
    value.ok_or_else(|| UserError::validation(format!("{field} is required")))
}

fn required_text(field: &str, value: Option<String>) -> Result<String, UserError> {
    text(field, required(field, value)?)
}

fn text(field: &str, value: String) -> Result<String, UserError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(UserError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// JSON numbers arrive as `f64`, so `30` and `30.0` are both accepted.
fn age(value: f64) -> Result<i64, UserError> {
    // `i64::MAX as f64` rounds up to 2^63, which does not fit.
    if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value >= i64::MAX as f64 {
        return Err(UserError::validation("age must be a non-negative whole number"));
    }
    Ok(value as i64)
}
