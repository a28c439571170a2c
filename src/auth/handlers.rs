use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{FieldErrors, OldInput, SigninForm, SignupForm},
        password::{hash_password, verify_credentials},
        repo::CreateUserError,
        services::{
            normalize_email, normalize_signup, validate_signin, validate_signup, EMAIL_TAKEN,
            INVALID_CREDENTIALS,
        },
        session::{self, INTENDED_COOKIE},
    },
    error::AppError,
    state::AppState,
    views,
};

type Cookies = Vec<(HeaderName, HeaderValue)>;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", get(show_signup).post(signup))
        .route("/signin", get(show_signin).post(signin))
        .route("/logout", get(logout))
}

#[instrument(skip_all)]
pub async fn show_signup(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    render_signup(&state, &headers, StatusCode::OK, &OldInput::default(), &FieldErrors::default())
}

#[instrument(skip_all)]
pub async fn show_signin(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    render_signin(&state, &headers, StatusCode::OK, &OldInput::default(), &FieldErrors::default())
}

#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(mut form): Form<SignupForm>,
) -> Result<Response, AppError> {
    if !session::csrf_matches(&headers, &form.token) {
        warn!("signup rejected: anti-forgery token mismatch");
        return Err(AppError::PageExpired);
    }

    normalize_signup(&mut form);
    let mut errors = validate_signup(&form);

    if !errors.has("email") && state.users.find_by_email(&form.email).await?.is_some() {
        errors.add("email", EMAIL_TAKEN);
    }

    let old = OldInput {
        name: form.name.clone(),
        email: form.email.clone(),
    };
    if !errors.is_empty() {
        warn!(email = %form.email, fields = ?errors.fields().collect::<Vec<_>>(), "signup validation failed");
        return render_signup(&state, &headers, StatusCode::UNPROCESSABLE_ENTITY, &old, &errors);
    }

    let hash = hash_password(&form.password)?;
    let user = match state.users.create(&form.name, &form.email, &hash).await {
        Ok(u) => u,
        // Lost a race with a concurrent signup for the same address.
        Err(CreateUserError::EmailTaken) => {
            warn!("signup hit unique constraint on email");
            errors.add("email", EMAIL_TAKEN);
            return render_signup(&state, &headers, StatusCode::UNPROCESSABLE_ENTITY, &old, &errors);
        }
        Err(CreateUserError::Other(e)) => return Err(e.into()),
    };

    let cookie = session::start_session(&state, &headers, &user).await?;
    info!(user_id = %user.id, "user registered");
    Ok(redirect_with("/dashboard", vec![(SET_COOKIE, cookie)]))
}

#[instrument(skip_all)]
pub async fn signin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(mut form): Form<SigninForm>,
) -> Result<Response, AppError> {
    if !session::csrf_matches(&headers, &form.token) {
        warn!("signin rejected: anti-forgery token mismatch");
        return Err(AppError::PageExpired);
    }

    form.email = normalize_email(&form.email);
    let old = OldInput {
        name: String::new(),
        email: form.email.clone(),
    };

    let errors = validate_signin(&form);
    if !errors.is_empty() {
        warn!("signin validation failed");
        return render_signin(&state, &headers, StatusCode::UNPROCESSABLE_ENTITY, &old, &errors);
    }

    let user = state.users.find_by_email(&form.email).await?;
    let known_email = user.is_some();
    let ok = verify_credentials(&form.password, user.as_ref().map(|u| u.password_hash.as_str()))?;
    let user = match user {
        Some(u) if ok => u,
        // One message for unknown email and wrong password alike.
        _ => {
            warn!(email = %form.email, known_email, "signin invalid credentials");
            let mut errors = FieldErrors::default();
            errors.add("email", INVALID_CREDENTIALS);
            return render_signin(&state, &headers, StatusCode::UNPROCESSABLE_ENTITY, &old, &errors);
        }
    };

    let session_cookie = session::start_session(&state, &headers, &user).await?;
    let destination = session::intended_path(&headers).unwrap_or_else(|| "/dashboard".into());
    let mut cookies = vec![(SET_COOKIE, session_cookie)];
    if session::read_cookie(&headers, INTENDED_COOKIE).is_some() {
        let cleared = session::clear_cookie(INTENDED_COOKIE, state.config.session.cookie_secure)
            .map_err(anyhow::Error::from)?;
        cookies.push((SET_COOKIE, cleared));
    }

    info!(user_id = %user.id, %destination, "user signed in");
    Ok(redirect_with(&destination, cookies))
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let cleared = session::end_session(&state, &headers).await?;
    let (_, csrf) = session::rotate_csrf(&state.config.session)?;
    info!("session ended");
    Ok(redirect_with("/signin", vec![(SET_COOKIE, cleared), (SET_COOKIE, csrf)]))
}

fn redirect_with(to: &str, cookies: Cookies) -> Response {
    (AppendHeaders(cookies), Redirect::to(to)).into_response()
}

fn render_signup(
    state: &AppState,
    headers: &HeaderMap,
    status: StatusCode,
    old: &OldInput,
    errors: &FieldErrors,
) -> Result<Response, AppError> {
    let (csrf, set) = session::csrf_token(headers, &state.config.session)?;
    let cookies: Cookies = set.map(|c| (SET_COOKIE, c)).into_iter().collect();
    let page = views::signup_page(&csrf, old, errors);
    Ok((status, AppendHeaders(cookies), Html(page)).into_response())
}

fn render_signin(
    state: &AppState,
    headers: &HeaderMap,
    status: StatusCode,
    old: &OldInput,
    errors: &FieldErrors,
) -> Result<Response, AppError> {
    let (csrf, set) = session::csrf_token(headers, &state.config.session)?;
    let cookies: Cookies = set.map(|c| (SET_COOKIE, c)).into_iter().collect();
    let page = views::signin_page(&csrf, old, errors);
    Ok((status, AppendHeaders(cookies), Html(page)).into_response())
}
