//! Account login and registration against the backend's `auth` routes.

use serde::Serialize;
use serde_json::Value;

use crate::error::{CoreError, Result, StoreError, ValidationError};
use crate::session::SessionUser;
use crate::store::StoreClient;

/// Yes/no answers in the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Answer {
    #[serde(rename = "oui")]
    Yes,
    #[serde(rename = "non")]
    No,
}

/// Registration wizard data. Serialized as the signup request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
    pub blood_type: String,
    pub has_diabetes: Option<Answer>,
    pub diabetes_type: String,
    pub takes_medicine: Option<Answer>,
    pub medicine_type: String,
}

/// Number of wizard steps.
pub const REGISTRATION_STEPS: u8 = 4;

impl RegistrationForm {
    /// Check the fields belonging to one wizard step.
    pub fn validate_step(&self, step: u8) -> Result<(), ValidationError> {
        match step {
            1 => {
                require("name", &self.name)?;
                require("email", &self.email)?;
                require("phone", &self.phone)?;
                require("password", &self.password)?;
                require("confirmPassword", &self.confirm_password)?;
                if !is_valid_email(&self.email) {
                    return Err(ValidationError::invalid("email", "malformed email address"));
                }
                if !is_valid_phone(&self.phone) {
                    return Err(ValidationError::invalid("phone", "malformed phone number"));
                }
                if self.password != self.confirm_password {
                    return Err(ValidationError::PasswordMismatch);
                }
                Ok(())
            }
            2 => {
                require("bloodType", &self.blood_type)?;
                match self.has_diabetes {
                    None => Err(ValidationError::missing("hasDiabetes")),
                    Some(Answer::Yes) => require("diabetesType", &self.diabetes_type),
                    Some(Answer::No) => Ok(()),
                }
            }
            3 => match self.takes_medicine {
                None => Err(ValidationError::missing("takesMedicine")),
                Some(Answer::Yes) => require("medicineType", &self.medicine_type),
                Some(Answer::No) => Ok(()),
            },
            4 => Ok(()),
            other => Err(ValidationError::InvalidStep(other)),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        (1..=REGISTRATION_STEPS).try_for_each(|step| self.validate_step(step))
    }
}

fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::missing(field))
    } else {
        Ok(())
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// French numbers: `0` or `+33`, a digit 1-9, then four digit pairs, each
/// optionally preceded by `-`, `.` or a whitespace character.
pub fn is_valid_phone(phone: &str) -> bool {
    let rest = if let Some(r) = phone.strip_prefix("+33") {
        r
    } else if let Some(r) = phone.strip_prefix('0') {
        r
    } else {
        return false;
    };

    let mut chars = rest.chars().peekable();
    if !matches!(chars.next(), Some('1'..='9')) {
        return false;
    }
    for _ in 0..4 {
        if matches!(chars.peek(), Some(c) if *c == '-' || *c == '.' || c.is_whitespace()) {
            chars.next();
        }
        for _ in 0..2 {
            if !matches!(chars.next(), Some(c) if c.is_ascii_digit()) {
                return false;
            }
        }
    }
    chars.next().is_none()
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Client for `auth/login` and `auth/signup`. Shares the store's base URL
/// and timeout.
pub struct AccountClient {
    store: StoreClient,
}

impl AccountClient {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    /// Log in. Returns the user to place in the [`Session`](crate::Session).
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser> {
        require("email", email)?;
        require("password", password)?;

        let url = self.store.endpoint(&["auth", "login"])?;
        tracing::debug!(%url, "logging in");

        let body = self
            .post_json(url, &LoginRequest { email, password })
            .await?;

        let display_name = body
            .pointer("/user/name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or(email)
            .to_string();
        let id_token = body
            .get("idToken")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(SessionUser {
            display_name,
            id_token,
        })
    }

    /// Create an account, then log in with it. The automatic login must
    /// yield an id token.
    pub async fn signup(&self, form: &RegistrationForm) -> Result<SessionUser> {
        form.validate()?;

        let url = self.store.endpoint(&["auth", "signup"])?;
        tracing::debug!(%url, email = %form.email, "signing up");
        self.post_json(url, form).await?;

        let user = self.login(&form.email, &form.password).await?;
        if user.id_token.is_none() {
            return Err(CoreError::Store(StoreError::Decode(
                "token not received after login".into(),
            )));
        }
        Ok(user)
    }

    async fn post_json<T: Serialize + ?Sized>(&self, url: url::Url, body: &T) -> Result<Value> {
        let resp = self
            .store
            .http()
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.store.transport_error(e))?;
        let resp = self.store.ensure_success(resp).await?;
        Ok(resp.json().await.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    fn complete_form() -> RegistrationForm {
        RegistrationForm {
            name: "Awa Diallo".into(),
            email: "awa@example.fr".into(),
            phone: "06 12 34 56 78".into(),
            password: "s3cret".into(),
            confirm_password: "s3cret".into(),
            blood_type: "O+".into(),
            has_diabetes: Some(Answer::Yes),
            diabetes_type: "type 1".into(),
            takes_medicine: Some(Answer::No),
            medicine_type: String::new(),
        }
    }

    fn client(url: &str) -> AccountClient {
        AccountClient::new(StoreClient::new(url, Duration::from_secs(5)).unwrap())
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("@c.d"));
        assert!(!is_valid_email("a@@c.d"));
        assert!(!is_valid_email("a@.d"));
    }

    #[test]
    fn phone_shapes() {
        assert!(is_valid_phone("0612345678"));
        assert!(is_valid_phone("06 12 34 56 78"));
        assert!(is_valid_phone("+33 6.12.34.56.78"));
        assert!(is_valid_phone("01-23-45-67-89"));
        assert!(!is_valid_phone("0012345678"));
        assert!(!is_valid_phone("061234567"));
        assert!(!is_valid_phone("06123456789"));
        assert!(!is_valid_phone("6123456789"));
        assert!(!is_valid_phone("06  12 34 56 78"));
    }

    #[test]
    fn steps_validate_their_own_fields() {
        let form = complete_form();
        assert_eq!(form.validate(), Ok(()));

        let mut f = form.clone();
        f.confirm_password = "other".into();
        assert_eq!(f.validate_step(1), Err(ValidationError::PasswordMismatch));
        assert_eq!(f.validate_step(2), Ok(()));

        let mut f = form.clone();
        f.diabetes_type.clear();
        assert_eq!(
            f.validate_step(2),
            Err(ValidationError::MissingField {
                field: "diabetesType".into()
            })
        );

        let mut f = form.clone();
        f.takes_medicine = Some(Answer::Yes);
        assert!(f.validate_step(3).is_err());
        f.takes_medicine = None;
        assert!(f.validate_step(3).is_err());

        assert_eq!(form.validate_step(5), Err(ValidationError::InvalidStep(5)));
    }

    #[test]
    fn signup_body_uses_wire_names() {
        let json = serde_json::to_value(complete_form()).unwrap();
        assert_eq!(json["confirmPassword"], "s3cret");
        assert_eq!(json["hasDiabetes"], "oui");
        assert_eq!(json["takesMedicine"], "non");
    }

    #[tokio::test]
    async fn login_requires_both_fields_before_any_request() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/login")
            .expect(0)
            .create_async()
            .await;

        let err = client(&server.url()).login("", "pw").await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn login_uses_user_name_or_falls_back_to_email() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/auth/login")
            .match_body(Matcher::Json(
                serde_json::json!({ "email": "awa@example.fr", "password": "pw" }),
            ))
            .with_status(200)
            .with_body(r#"{"user":{"name":"Awa"},"idToken":"abc"}"#)
            .create_async()
            .await;

        let user = client(&server.url())
            .login("awa@example.fr", "pw")
            .await
            .unwrap();
        assert_eq!(user.display_name, "Awa");
        assert_eq!(user.id_token.as_deref(), Some("abc"));

        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let user = client(&server.url())
            .login("bob@example.fr", "pw")
            .await
            .unwrap();
        assert_eq!(user.display_name, "bob@example.fr");
    }

    #[tokio::test]
    async fn login_rejection_carries_server_message() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"message":"Identifiants invalides"}"#)
            .create_async()
            .await;

        let err = client(&server.url()).login("a@b.fr", "x").await.unwrap_err();
        match err {
            CoreError::Store(StoreError::Rejected { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Identifiants invalides");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn signup_then_auto_login() {
        let mut server = Server::new_async().await;
        let signup = server
            .mock("POST", "/auth/signup")
            .match_body(Matcher::PartialJson(
                serde_json::json!({ "email": "awa@example.fr", "bloodType": "O+" }),
            ))
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;
        let _login = server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(r#"{"idToken":"tok"}"#)
            .create_async()
            .await;

        let user = client(&server.url()).signup(&complete_form()).await.unwrap();
        assert_eq!(user.id_token.as_deref(), Some("tok"));
        signup.assert_async().await;
    }

    #[tokio::test]
    async fn signup_fails_without_token() {
        let mut server = Server::new_async().await;
        let _signup = server
            .mock("POST", "/auth/signup")
            .with_status(201)
            .create_async()
            .await;
        let _login = server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(r#"{"user":{"name":"Awa"}}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .signup(&complete_form())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Store(StoreError::Decode(ref message)) if message == "token not received after login"
        ));
        assert!(!err.is_remote());
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_signup() {
        let mut server = Server::new_async().await;
        let signup = server
            .mock("POST", "/auth/signup")
            .expect(0)
            .create_async()
            .await;

        let mut form = complete_form();
        form.email = "pas-un-email".into();
        assert!(client(&server.url()).signup(&form).await.is_err());
        signup.assert_async().await;
    }
}
