/// Session lifecycle handlers: signup, login, logout, access-token refresh, me
use actix_middleware::{UserId, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::domain::models::Account;
use crate::domain::views::AccountProfile;
use crate::error::Result;
use crate::services::SignupInput;
use crate::state::{AppState, CookieSettings};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn session_cookie(name: &'static str, value: String, max_age_secs: i64, settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(settings.secure)
        .max_age(Duration::seconds(max_age_secs))
        .finish()
}

fn expired_cookie(name: &'static str, settings: &CookieSettings) -> Cookie<'static> {
    let mut cookie = session_cookie(name, String::new(), 0, settings);
    cookie.make_removal();
    cookie
}

/// Open a session and answer with the account profile plus both cookies
async fn start_session(
    state: &AppState,
    account: &Account,
    mut response: actix_web::HttpResponseBuilder,
) -> Result<HttpResponse> {
    let pair = state.sessions.open(account.id).await?;
    let settings = &state.cookies;
    Ok(response
        .cookie(session_cookie(
            ACCESS_TOKEN_COOKIE,
            pair.access_token,
            settings.access_max_age_secs,
            settings,
        ))
        .cookie(session_cookie(
            REFRESH_TOKEN_COOKIE,
            pair.refresh_token,
            settings.refresh_max_age_secs,
            settings,
        ))
        .json(AccountProfile::from(account)))
}

/// POST /api/auth/signup
pub async fn signup(state: web::Data<AppState>, body: web::Json<SignupInput>) -> Result<HttpResponse> {
    let account = state.accounts.signup(body.into_inner()).await?;
    start_session(&state, &account, HttpResponse::Created()).await
}

/// POST /api/auth/login
pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> Result<HttpResponse> {
    let account = state
        .accounts
        .authenticate(&body.username, &body.password)
        .await?;
    start_session(&state, &account, HttpResponse::Ok()).await
}

/// POST /api/auth/logout
///
/// Cookies are cleared even when the refresh record could not be removed.
pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let refresh = req.cookie(REFRESH_TOKEN_COOKIE);
    if let Err(e) = state.sessions.close(refresh.as_ref().map(|c| c.value())).await {
        tracing::error!(error = %e, "Failed to remove refresh token record");
    }

    let settings = &state.cookies;
    HttpResponse::Ok()
        .cookie(expired_cookie(ACCESS_TOKEN_COOKIE, settings))
        .cookie(expired_cookie(REFRESH_TOKEN_COOKIE, settings))
        .json(json!({ "success": true, "message": "Logged out successfully" }))
}

/// POST /api/auth/recreate-token
pub async fn recreate_token(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let refresh = req.cookie(REFRESH_TOKEN_COOKIE);
    let refreshed = state
        .sessions
        .refresh(refresh.as_ref().map(|c| c.value()))
        .await?;

    let settings = &state.cookies;
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(
            ACCESS_TOKEN_COOKIE,
            refreshed.access_token,
            settings.access_max_age_secs,
            settings,
        ))
        .json(json!({ "success": true, "message": "Token refreshed successfully" })))
}

/// GET /api/auth/me
pub async fn me(state: web::Data<AppState>, user: UserId) -> Result<HttpResponse> {
    let account = state.accounts.get(user.0).await?;
    Ok(HttpResponse::Ok().json(AccountProfile::from(&account)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let settings = CookieSettings {
            secure: true,
            access_max_age_secs: 900,
            refresh_max_age_secs: 3600,
        };
        let cookie = session_cookie(ACCESS_TOKEN_COOKIE, "t".into(), 900, &settings);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(900)));
    }

    #[test]
    fn test_expired_cookie_clears_value() {
        let settings = CookieSettings {
            secure: false,
            access_max_age_secs: 900,
            refresh_max_age_secs: 3600,
        };
        let cookie = expired_cookie(REFRESH_TOKEN_COOKIE, &settings);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
