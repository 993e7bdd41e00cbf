use std::time::Duration;

use log::{debug, info, warn};
use scraper::{Html, Selector};
use url::Url;

use crate::config::Portal;
use crate::errors::{AuthFailure, FetchFailure};
use crate::models::{Credentials, SessionToken};
use crate::utils::http::{HttpClient, Response};
use crate::utils::prompt::CredentialSource;

enum LoginState {
    AwaitingCredentials,
    Submitted(Response),
    Authenticated(SessionToken),
}

// The portal answers every login POST with 200, so only the redirect target tells success apart.
pub fn is_authenticated_uri(uri: &str, marker: &str) -> bool {
    uri.contains(marker)
}

/// Href of the first anchor on the interstitial page, resolved against `base`.
pub fn redirect_target(body: &str, base: &str) -> Result<String, AuthFailure> {
    let document = Html::parse_document(body);
    let anchor = Selector::parse("a").expect("static selector");
    let href = document
        .select(&anchor)
        .next()
        .ok_or_else(|| AuthFailure::MalformedResponse("no redirect link".to_string()))?
        .value()
        .attr("href")
        .ok_or_else(|| AuthFailure::MalformedResponse("redirect link has no href".to_string()))?;

    match Url::parse(base).and_then(|base| base.join(href)) {
        Ok(url) => Ok(url.to_string()),
        Err(_) => Url::parse(href)
            .map(|url| url.to_string())
            .map_err(|e| AuthFailure::MalformedResponse(format!("bad redirect href {:?}: {}", href, e))),
    }
}

/// Pulls the named cookie's value out of a response's `Set-Cookie` headers.
pub fn session_cookie(response: &Response, name: &str) -> Option<SessionToken> {
    response
        .header_values("set-cookie")
        .filter_map(|header| {
            let pair = header.split_whitespace().next()?;
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| value.trim_end_matches(';').to_string())
        })
        .filter_map(SessionToken::new)
        .last()
}

fn next_credentials<S: CredentialSource + ?Sized>(
    source: &mut S,
) -> Result<Option<Credentials>, AuthFailure> {
    let Some(username) = source.username().map_err(AuthFailure::Prompt)? else {
        return Ok(None);
    };
    let password = source.password().map_err(AuthFailure::Prompt)?;
    Ok(Some(Credentials { username, password }))
}

/// Logs in, re-asking `source` for credentials after every rejected attempt.
///
/// A timeout on the login POST ends the whole flow; it is never retried.
pub async fn authenticate<C, S>(
    client: &C,
    source: &mut S,
    portal: &Portal,
    timeout: Duration,
) -> Result<SessionToken, AuthFailure>
where
    C: HttpClient + ?Sized,
    S: CredentialSource + ?Sized,
{
    let mut state = LoginState::AwaitingCredentials;
    loop {
        state = match state {
            LoginState::AwaitingCredentials => {
                let Some(credentials) = next_credentials(source)? else {
                    return Err(AuthFailure::InvalidCredentials);
                };
                debug!("Submitting login for {}", credentials.username);
                let form = [
                    ("username", credentials.username.as_str()),
                    ("password", credentials.password.as_str()),
                    ("Submit", "login"),
                ];
                let response = client
                    .post_form(&portal.login_url, &form, Some(timeout))
                    .await
                    .map_err(|e| match e {
                        FetchFailure::Timeout => AuthFailure::Timeout,
                        other => AuthFailure::Network(other),
                    })?;
                LoginState::Submitted(response)
            }
            LoginState::Submitted(login) => {
                let base = if login.final_url.is_empty() { &portal.login_url } else { &login.final_url };
                let target = redirect_target(&login.body, base)?;
                let redirect = client.get(&target, &[], &[]).await.map_err(AuthFailure::Network)?;

                if is_authenticated_uri(&redirect.final_url, &portal.success_marker) {
                    info!("Login successful");
                    let token = session_cookie(&login, &portal.session_cookie)
                        .ok_or(AuthFailure::NoSessionCookie)?;
                    LoginState::Authenticated(token)
                } else {
                    warn!("Login failed, check your credentials and try again");
                    LoginState::AwaitingCredentials
                }
            }
            LoginState::Authenticated(token) => return Ok(token),
        };
    }
}
