//! Reqwest-backed client for the hosted identity service.
//!
//! One client speaks both the auth API (sign-up, password grant, logout) and
//! the `profiles` table exposed through the REST gateway. Every request
//! carries the publishable `apikey` header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::dto::{AuthErrorDto, AuthResponseDto, CredentialsDto, NewProfileRowDto, ProfileRowDto};
use crate::domain::ports::{
    IdentityProvider, IdentityProviderError, ProfileStore, ProfileStoreError, SignInResult,
    SignUpResult,
};
use crate::domain::{AccessToken, LoginCredentials, Profile, UserId};

const API_KEY_HEADER: &str = "apikey";

/// Identity provider and profile store over HTTP.
#[derive(Debug, Clone)]
pub struct RestIdentityClient {
    client: Client,
    base: Url,
    api_key: String,
}

impl RestIdentityClient {
    /// Build a client for the service rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, api_key: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: with_trailing_slash(base),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, String> {
        self.base
            .join(path)
            .map_err(|err| format!("invalid endpoint `{path}`: {err}"))
    }

    fn profiles_url(&self, user_id: &UserId) -> Result<Url, String> {
        let mut url = self.endpoint("rest/v1/profiles")?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{user_id}"))
            .append_pair("select", "*");
        Ok(url)
    }

    fn authorised(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, self.api_key.as_str())
            .bearer_auth(self.api_key.as_str())
    }

    async fn auth_request(
        &self,
        url: Url,
        credentials: &LoginCredentials,
    ) -> Result<(StatusCode, Vec<u8>), IdentityProviderError> {
        let response = self
            .authorised(self.client.post(url))
            .json(&CredentialsDto {
                email: credentials.email(),
                password: credentials.password(),
            })
            .send()
            .await
            .map_err(|err| IdentityProviderError::transport(err.to_string()))?;
        read_body(response)
            .await
            .map_err(IdentityProviderError::transport)
    }
}

fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

async fn read_body(response: Response) -> Result<(StatusCode, Vec<u8>), String> {
    let status = response.status();
    let body = response.bytes().await.map_err(|err| err.to_string())?;
    Ok((status, body.to_vec()))
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, String> {
    serde_json::from_slice(body).map_err(|err| err.to_string())
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<AuthErrorDto>(body)
        .ok()
        .and_then(AuthErrorDto::into_message)
        .unwrap_or_else(|| format!("status {}", status.as_u16()))
}

fn map_sign_in_status(status: StatusCode, body: &[u8]) -> IdentityProviderError {
    let message = error_message(status, body);
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY => {
            IdentityProviderError::invalid_credentials(message)
        }
        _ => map_other_status(status, message),
    }
}

fn map_sign_up_status(status: StatusCode, body: &[u8]) -> IdentityProviderError {
    map_other_status(status, error_message(status, body))
}

fn map_other_status(status: StatusCode, message: String) -> IdentityProviderError {
    if status.is_client_error() {
        IdentityProviderError::rejected(message)
    } else {
        IdentityProviderError::transport(message)
    }
}

fn parse_user_id(raw: &str) -> Result<UserId, IdentityProviderError> {
    UserId::new(raw).map_err(|err| IdentityProviderError::decode(err.to_string()))
}

fn parse_token(raw: String) -> Result<AccessToken, IdentityProviderError> {
    AccessToken::new(raw).map_err(|err| IdentityProviderError::decode(err.to_string()))
}

fn parse_sign_up(body: &[u8]) -> Result<SignUpResult, IdentityProviderError> {
    let decoded: AuthResponseDto = decode(body).map_err(IdentityProviderError::decode)?;
    let user_id = decoded
        .user_id()
        .ok_or_else(|| IdentityProviderError::decode("sign-up response carried no user id"))
        .and_then(parse_user_id)?;
    let token = decoded.access_token.map(parse_token).transpose()?;
    Ok(SignUpResult { user_id, token })
}

fn parse_sign_in(body: &[u8], fallback_email: &str) -> Result<SignInResult, IdentityProviderError> {
    let decoded: AuthResponseDto = decode(body).map_err(IdentityProviderError::decode)?;
    let user_id = decoded
        .user_id()
        .ok_or_else(|| IdentityProviderError::decode("sign-in response carried no user id"))
        .and_then(parse_user_id)?;
    let email = decoded.user_email().unwrap_or(fallback_email).to_owned();
    let token = decoded
        .access_token
        .ok_or_else(|| IdentityProviderError::decode("sign-in response carried no access token"))
        .and_then(parse_token)?;
    Ok(SignInResult {
        user_id,
        email,
        token,
    })
}

fn parse_profile_rows(body: &[u8]) -> Result<Option<Profile>, ProfileStoreError> {
    let rows: Vec<ProfileRowDto> = decode(body).map_err(ProfileStoreError::decode)?;
    Ok(rows.into_iter().next().map(Profile::from))
}

#[async_trait]
impl IdentityProvider for RestIdentityClient {
    async fn sign_up(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<SignUpResult, IdentityProviderError> {
        let url = self
            .endpoint("auth/v1/signup")
            .map_err(IdentityProviderError::transport)?;
        let (status, body) = self.auth_request(url, credentials).await?;
        if !status.is_success() {
            return Err(map_sign_up_status(status, &body));
        }
        parse_sign_up(&body)
    }

    async fn sign_in(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<SignInResult, IdentityProviderError> {
        let mut url = self
            .endpoint("auth/v1/token")
            .map_err(IdentityProviderError::transport)?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let (status, body) = self.auth_request(url, credentials).await?;
        if !status.is_success() {
            return Err(map_sign_in_status(status, &body));
        }
        parse_sign_in(&body, credentials.email())
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), IdentityProviderError> {
        let url = self
            .endpoint("auth/v1/logout")
            .map_err(IdentityProviderError::transport)?;
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|err| IdentityProviderError::transport(err.to_string()))?;
        let (status, body) = read_body(response)
            .await
            .map_err(IdentityProviderError::transport)?;
        if status.is_success() {
            Ok(())
        } else {
            Err(map_other_status(status, error_message(status, &body)))
        }
    }
}

#[async_trait]
impl ProfileStore for RestIdentityClient {
    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileStoreError> {
        let url = self
            .profiles_url(user_id)
            .map_err(ProfileStoreError::transport)?;
        let response = self
            .authorised(self.client.get(url))
            .send()
            .await
            .map_err(|err| ProfileStoreError::transport(err.to_string()))?;
        let (status, body) = read_body(response)
            .await
            .map_err(ProfileStoreError::transport)?;
        if !status.is_success() {
            return Err(ProfileStoreError::query(error_message(status, &body)));
        }
        parse_profile_rows(&body)
    }

    async fn create_profile(
        &self,
        user_id: &UserId,
        email: &str,
        profile: &Profile,
    ) -> Result<(), ProfileStoreError> {
        let url = self
            .endpoint("rest/v1/profiles")
            .map_err(ProfileStoreError::transport)?;
        let row = NewProfileRowDto::new(user_id.as_ref(), email, profile);
        let response = self
            .authorised(self.client.post(url))
            .header("Prefer", "return=minimal")
            .json(&[row])
            .send()
            .await
            .map_err(|err| ProfileStoreError::transport(err.to_string()))?;
        let (status, body) = read_body(response)
            .await
            .map_err(ProfileStoreError::transport)?;
        if status.is_success() {
            Ok(())
        } else {
            Err(ProfileStoreError::query(error_message(status, &body)))
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network request and response handling.

    use super::*;
    use crate::domain::Role;
    use rstest::rstest;

    fn client(base: &str) -> RestIdentityClient {
        RestIdentityClient::new(
            Url::parse(base).expect("base url"),
            "anon-key",
            Duration::from_secs(5),
        )
        .expect("client")
    }

    #[rstest]
    #[case("https://project.example.co")]
    #[case("https://project.example.co/")]
    fn endpoints_resolve_under_base(#[case] base: &str) {
        let client = client(base);
        assert_eq!(
            client.endpoint("auth/v1/signup").expect("url").as_str(),
            "https://project.example.co/auth/v1/signup"
        );
    }

    #[rstest]
    fn base_paths_are_preserved() {
        let client = client("https://gateway.example/identity");
        assert_eq!(
            client.endpoint("auth/v1/logout").expect("url").as_str(),
            "https://gateway.example/identity/auth/v1/logout"
        );
    }

    #[rstest]
    fn profile_lookup_filters_by_id() {
        let client = client("https://project.example.co");
        let url = client
            .profiles_url(&UserId::new("3fa85f64").expect("id"))
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://project.example.co/rest/v1/profiles?id=eq.3fa85f64&select=*"
        );
    }

    #[rstest]
    #[case(StatusCode::BAD_REQUEST, r#"{"error_description":"Invalid login credentials"}"#, "Invalid login credentials")]
    #[case(StatusCode::UNAUTHORIZED, r#"{"msg":"Email not confirmed"}"#, "Email not confirmed")]
    #[case(StatusCode::UNPROCESSABLE_ENTITY, r#"{"message":"Password too short"}"#, "Password too short")]
    #[case(StatusCode::BAD_REQUEST, "not json", "status 400")]
    fn rejected_sign_ins_keep_provider_message(
        #[case] status: StatusCode,
        #[case] body: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(
            map_sign_in_status(status, body.as_bytes()),
            IdentityProviderError::invalid_credentials(expected)
        );
    }

    #[rstest]
    #[case(StatusCode::TOO_MANY_REQUESTS, true)]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, false)]
    fn other_statuses_split_by_class(#[case] status: StatusCode, #[case] rejected: bool) {
        let err = map_sign_up_status(status, br#"{"msg":"nope"}"#);
        assert_eq!(matches!(err, IdentityProviderError::Rejected { .. }), rejected);
        assert_eq!(matches!(err, IdentityProviderError::Transport { .. }), !rejected);
    }

    #[rstest]
    fn sign_in_response_yields_session() {
        let body = br#"{
            "access_token": "jwt-abc",
            "token_type": "bearer",
            "user": { "id": "u-1", "email": "ada@example.com" }
        }"#;
        let result = parse_sign_in(body, "fallback@example.com").expect("decoded");
        assert_eq!(result.user_id.as_ref(), "u-1");
        assert_eq!(result.email, "ada@example.com");
        assert_eq!(result.token.as_str(), "jwt-abc");
    }

    #[rstest]
    fn sign_in_without_token_is_malformed() {
        let body = br#"{ "user": { "id": "u-1" } }"#;
        let err = parse_sign_in(body, "a@b").expect_err("missing token");
        assert!(matches!(err, IdentityProviderError::Decode { .. }));
    }

    #[rstest]
    #[case(br#"{"access_token":"jwt","user":{"id":"u-2"}}"#.as_slice(), true)]
    #[case(br#"{"id":"u-2","email":"new@example.com","confirmation_sent_at":"2026-01-01T00:00:00Z"}"#.as_slice(), false)]
    fn sign_up_accepts_session_or_bare_user(#[case] body: &[u8], #[case] has_token: bool) {
        let result = parse_sign_up(body).expect("decoded");
        assert_eq!(result.user_id.as_ref(), "u-2");
        assert_eq!(result.token.is_some(), has_token);
    }

    #[rstest]
    fn profile_rows_decode_first_match() {
        let body = br#"[{"id":"u-1","full_name":"Ada","occupation":null,"company":"Acme","role":"admin"}]"#;
        let profile = parse_profile_rows(body).expect("decoded").expect("row");
        assert_eq!(profile.full_name.as_deref(), Some("Ada"));
        assert_eq!(profile.company.as_deref(), Some("Acme"));
        assert_eq!(profile.role, Some(Role::Admin));
        assert_eq!(parse_profile_rows(b"[]").expect("decoded"), None);
    }

    #[rstest]
    fn new_profile_rows_default_the_role() {
        let profile = Profile {
            full_name: Some("Grace".to_owned()),
            ..Profile::default()
        };
        let row = NewProfileRowDto::new("u-3", "grace@example.com", &profile);
        let json = serde_json::to_value([row]).expect("serialise");
        assert_eq!(
            json,
            serde_json::json!([{
                "id": "u-3",
                "email": "grace@example.com",
                "full_name": "Grace",
                "occupation": null,
                "company": null,
                "role": "user"
            }])
        );
    }
}
