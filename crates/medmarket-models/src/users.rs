//! Company staff accounts served by the user service.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ModelError;

/// Role of a user inside their company.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum CompanyRole {
    /// Regular staff.
    #[default]
    Operator,
    /// Manages the company and its staff.
    Director,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User identifier.
    pub id: u64,
    /// Given name.
    #[serde(default)]
    pub name: String,
    /// Family name.
    #[serde(default)]
    pub surname: String,
    /// Date of birth.
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    /// Login e-mail.
    pub email: String,
    /// Whether the account may sign in.
    #[serde(default)]
    pub availability: bool,
    /// Role name as reported by the backend.
    #[serde(default)]
    pub role: String,
    /// Employer, when the backend includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<u64>,
}

impl User {
    /// `"Name Surname"`, or the e-mail when both are blank.
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.name.trim(), self.surname.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }

    /// Whether the user directs their company.
    pub fn is_director(&self) -> bool {
        self.role.eq_ignore_ascii_case("DIRECTOR")
    }
}

/// Profile part of a [`RegisterUser`] request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
    /// Login e-mail.
    pub email: String,
    /// Employer.
    pub company_id: u64,
    /// Role in the company.
    pub role: CompanyRole,
}

/// Credential part of a [`RegisterUser`] request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    /// Login e-mail, same as the profile's.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Repetition of `password`.
    pub repeat_password: String,
    /// Granted roles.
    pub roles: Vec<CompanyRole>,
}

/// Body of `POST /user-service/users/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    /// Credentials.
    pub register_data: RegisterData,
    /// Profile.
    pub user: NewUser,
}

impl RegisterUser {
    /// Build a registration, rejecting differing passwords.
    pub fn new(user: NewUser, password: &str, repeat_password: &str) -> Result<Self, ModelError> {
        if password != repeat_password {
            return Err(ModelError::PasswordMismatch);
        }
        Ok(Self {
            register_data: RegisterData {
                email: user.email.clone(),
                password: password.to_string(),
                repeat_password: repeat_password.to_string(),
                roles: vec![user.role],
            },
            user,
        })
    }
}

/// Body of `PUT /user-service/users/{id}`. Absent fields are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    /// New given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    /// New date of birth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    /// New login e-mail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Body of `PUT /auth/password/{email}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    /// Current password.
    pub old_password: String,
    /// Replacement.
    pub new_password: String,
    /// Repetition of `new_password`.
    pub repeat_password: String,
}

impl PasswordChange {
    /// Build a change request, rejecting differing new passwords.
    pub fn new(old: &str, new: &str, repeat: &str) -> Result<Self, ModelError> {
        if new != repeat {
            return Err(ModelError::PasswordMismatch);
        }
        Ok(Self {
            old_password: old.to_string(),
            new_password: new.to_string(),
            repeat_password: repeat.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operator() -> NewUser {
        NewUser {
            name: "Ann".into(),
            surname: "Lee".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 4, 2),
            email: "ann@clinic.org".into(),
            company_id: 1,
            role: CompanyRole::Operator,
        }
    }

    #[test]
    fn registration_nests_credentials_and_profile() {
        let register = RegisterUser::new(operator(), "s3cret", "s3cret").unwrap();
        let json = serde_json::to_value(&register).unwrap();
        assert_eq!(
            json["registerData"],
            serde_json::json!({
                "email": "ann@clinic.org",
                "password": "s3cret",
                "repeatPassword": "s3cret",
                "roles": ["OPERATOR"]
            })
        );
        assert_eq!(json["user"]["birthDate"], "1990-04-02");
        assert_eq!(json["user"]["companyId"], 1);
        assert_eq!(json["user"]["role"], "OPERATOR");
    }

    #[test]
    fn mismatched_passwords_are_rejected() {
        assert_eq!(
            RegisterUser::new(operator(), "a", "b"),
            Err(ModelError::PasswordMismatch)
        );
        assert_eq!(
            PasswordChange::new("old", "new", "newer"),
            Err(ModelError::PasswordMismatch)
        );
        let change = PasswordChange::new("old", "new", "new").unwrap();
        assert_eq!(
            serde_json::to_string(&change).unwrap(),
            r#"{"oldPassword":"old","newPassword":"new","repeatPassword":"new"}"#
        );
    }

    #[test]
    fn user_from_backend_json() {
        let user: User = serde_json::from_str(
            r#"{"id": 4, "name": "", "surname": "", "email": "ops@acme.com",
                "availability": true, "role": "director"}"#,
        )
        .unwrap();
        assert!(user.is_director());
        assert_eq!(user.full_name(), "ops@acme.com");
        assert!(user.birth_date.is_none());
    }

    #[test]
    fn company_role_parses_case_insensitively() {
        assert_eq!("director".parse::<CompanyRole>(), Ok(CompanyRole::Director));
        assert_eq!(CompanyRole::Operator.to_string(), "OPERATOR");
    }
}
