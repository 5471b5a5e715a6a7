use askama::Template;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::{accounts, session};
use crate::error::{AppError, AppResult};
use crate::extractors::{cookie_value, MaybeUser};
use crate::flash::{self, Flash, FlashMessage};
use crate::routes::views::Viewer;
use crate::routes::{page, Html};
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/register.html")]
pub struct RegisterTemplate {
    pub current_user: Option<Viewer>,
    pub flash: Option<FlashMessage>,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub current_user: Option<Viewer>,
    pub flash: Option<FlashMessage>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// -- Cookie helpers --

fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

// -- Registration --

/// GET /register
pub async fn register_page(user: MaybeUser, flash: Flash) -> Response {
    page(
        RegisterTemplate {
            current_user: Viewer::of(&user),
            flash: flash.0.clone(),
        },
        &flash,
    )
}

/// POST /register — create the account, then send the user to log in
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> AppResult<Response> {
    let result = {
        let conn = state.db.get()?;
        accounts::register(
            &conn,
            &form.username,
            &form.password,
            state.config.auth.bcrypt_cost,
        )
    };

    match result {
        Ok(_) => Ok(flash::redirect(
            "/login",
            FlashMessage::success("Account created. Please log in."),
        )),
        Err(e) if e.is_recoverable() => {
            Ok(flash::redirect("/register", FlashMessage::error(e.to_string())))
        }
        Err(e) => Err(e),
    }
}

// -- Login / logout --

/// GET /login
pub async fn login_page(user: MaybeUser, flash: Flash) -> Response {
    page(
        LoginTemplate {
            current_user: Viewer::of(&user),
            flash: flash.0.clone(),
        },
        &flash,
    )
}

/// POST /login — verify credentials and start a session
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> AppResult<Response> {
    let conn = state.db.get()?;

    let user = match accounts::authenticate(&conn, &form.username, &form.password) {
        Ok(user) => user,
        Err(AppError::Unauthorized) => {
            // Bad credentials are shown on the form, not as a bare 401
            return Ok((
                StatusCode::UNAUTHORIZED,
                Html(LoginTemplate {
                    current_user: None,
                    flash: Some(FlashMessage::error("Invalid username or password.")),
                }),
            )
                .into_response());
        }
        Err(e) => return Err(e),
    };

    let token = session::create_session(&conn, user.id, state.config.auth.session_hours)?;
    tracing::info!(user_id = user.id, "User {} logged in", user.username);

    let welcome = FlashMessage::success(format!("Welcome, {}", user.username));
    Ok((
        AppendHeaders([
            (
                header::SET_COOKIE,
                session_cookie(
                    &state.config.auth.cookie_name,
                    &token,
                    state.config.auth.session_hours,
                ),
            ),
            (header::SET_COOKIE, welcome.set_cookie()),
        ]),
        Redirect::to("/"),
    )
        .into_response())
}

/// GET /logout — end the session; safe to call without one
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;

    if let Some(token) = cookie_value(&headers, cookie_name) {
        let conn = state.db.get()?;
        session::delete_session(&conn, token)?;
    }

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, clear_session_cookie(cookie_name)),
            (header::SET_COOKIE, FlashMessage::info("Signed out.").set_cookie()),
        ]),
        Redirect::to("/"),
    )
        .into_response())
}
