//! LOGIN and CARS requests and their validation
//!
//! Requests return the raw [`ResponseRecord`]; validation records checks
//! through the current [`Group`] and turns a wrong status or body into a
//! fatal [`IterationError::Aborted`].

use crate::engine::{Group, HttpClient, IterationError, ResponseRecord, TransportError};

use super::body::{CarsBody, ExpectedBody, LoginBody, ResponseBody};

/// Header carrying the access token, both ways
pub const ACCESS_TOKEN_HEADER: &str = "Access-Token";

/// Tag attached to the response shape checks
const VALID_RESPONSE_TAG: (&str, &str) = ("myTag", "VALID_RESPONSE");

pub const CHECK_STATUS: &str = "status was 200";
pub const CHECK_BODY: &str = "valid body";
pub const CHECK_TOKEN_SENT: &str = "Access-Token was sent";

/// `POST /api/login.php` with the credentials as query parameters
pub async fn login(
    http: &HttpClient,
    api_root: &str,
    username: &str,
    password: &str,
) -> Result<ResponseRecord, TransportError> {
    let endpoint = format!("{}/api/login.php", api_root);
    let url = reqwest::Url::parse_with_params(
        &endpoint,
        &[("username", username), ("password", password)],
    )
    .map_err(|e| TransportError::new(crate::engine::Method::Post, &endpoint, e))?;

    http.post(url.as_str()).await
}

/// `GET /api/cars` authorized by the access token header
pub async fn get_cars(
    http: &HttpClient,
    api_root: &str,
    access_token: &str,
) -> Result<ResponseRecord, TransportError> {
    let url = format!("{}/api/cars", api_root);
    http.get(&url, &[(ACCESS_TOKEN_HEADER, access_token)]).await
}

/// Check status 200 and a deep-equal body, recording both checks
///
/// Both checks are always recorded, whatever the outcome. A body that is not
/// JSON fails the body check.
pub fn is_response_valid(group: &Group, response: &ResponseRecord, expected: &ExpectedBody) -> bool {
    let body = ResponseBody::parse(&response.body);
    if let ResponseBody::Malformed(reason) = &body {
        tracing::debug!(url = %response.url, %reason, "Response body is not valid JSON");
    }

    let status_ok = group.check(CHECK_STATUS, response.status == 200, &[VALID_RESPONSE_TAG]);
    let body_ok = group.check(CHECK_BODY, body.matches(expected), &[VALID_RESPONSE_TAG]);
    status_ok && body_ok
}

/// Fatal on a wrong login response; a missing token is only a failed check
pub fn validate_login(group: &Group, response: &ResponseRecord) -> Result<(), IterationError> {
    if !is_response_valid(group, response, &ExpectedBody::Login(LoginBody::authorized())) {
        return Err(IterationError::abort("Login failed"));
    }

    let token_sent = response
        .header(ACCESS_TOKEN_HEADER)
        .is_some_and(|token| !token.is_empty());
    group.check(CHECK_TOKEN_SENT, token_sent, &[]);

    Ok(())
}

/// Fatal unless the cars listing is exactly the expected one
pub fn validate_cars(group: &Group, response: &ResponseRecord) -> Result<(), IterationError> {
    if !is_response_valid(group, response, &ExpectedBody::Cars(CarsBody::expected())) {
        return Err(IterationError::abort("Getting cars failed"));
    }
    Ok(())
}
