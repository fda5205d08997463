//! Post pages: feeds, post detail, and the new/edit forms.

use actix_web::{HttpResponse, http::header, web};

use postboard_core::PageRequest;
use postboard_core::services::{Flow, FormPage, PostForm};
use postboard_shared::ApiResponse;
use postboard_shared::dto::{PageQuery, PostFormRequest};

use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn redirect_to(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Show the form page, or follow the redirect the workflow decided on.
fn respond(state: &AppState, flow: Flow<FormPage>) -> HttpResponse {
    match flow {
        Flow::Redirect(redirect) => redirect_to(&redirect.location(&state.login_url)),
        Flow::Render(page) if page.errors.is_empty() => {
            HttpResponse::Ok().json(ApiResponse::ok(page))
        }
        Flow::Render(page) => {
            let message = page.errors.messages().collect::<Vec<_>>().join(" ");
            HttpResponse::UnprocessableEntity().json(ApiResponse::rejected(page, message))
        }
    }
}

/// Form bodies are parsed after the identity check, so the error stays in the extractor result.
type FormBody = Result<web::Form<PostFormRequest>, actix_web::Error>;

/// Callers who may not write get their redirect; the rest see why the body was rejected.
fn unreadable_body(state: &AppState, gate: Flow<FormPage>, err: actix_web::Error) -> HttpResponse {
    match gate {
        Flow::Redirect(redirect) => redirect_to(&redirect.location(&state.login_url)),
        Flow::Render(_) => {
            tracing::debug!(error = %err, "Rejected post form body");
            err.error_response()
        }
    }
}

fn post_form(body: PostFormRequest) -> PostForm {
    PostForm {
        text: body.text,
        group: body.group,
    }
}

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = PageRequest::parse(query.page.as_deref());
    let feed = state.feed.global_feed(page).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(feed)))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = PageRequest::parse(query.page.as_deref());
    let feed = state.feed.group_feed(&path, page).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(feed)))
}

/// GET /{username}/
pub async fn profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = PageRequest::parse(query.page.as_deref());
    let profile = state.feed.author_profile(&path, page).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(profile)))
}

/// GET /{username}/{post_id}/
pub async fn post_view(
    state: web::Data<AppState>,
    path: web::Path<(String, i64)>,
) -> AppResult<HttpResponse> {
    let (username, post_id) = path.into_inner();
    let detail = state.feed.post_detail(&username, post_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(detail)))
}

/// GET /new/
pub async fn new_post_form(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let flow = state.submission.new_post_form(identity.as_ref()).await?;
    Ok(respond(&state, flow))
}

/// POST /new/
pub async fn new_post(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    body: FormBody,
) -> AppResult<HttpResponse> {
    let body = match body {
        Ok(body) => body,
        Err(err) => {
            let gate = state.submission.new_post_form(identity.as_ref()).await?;
            return Ok(unreadable_body(&state, gate, err));
        }
    };

    let flow = state
        .submission
        .create_post(identity.as_ref(), post_form(body.into_inner()))
        .await?;
    Ok(respond(&state, flow))
}

/// GET /{username}/{post_id}/edit/
pub async fn post_edit_form(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<(String, i64)>,
) -> AppResult<HttpResponse> {
    let (username, post_id) = path.into_inner();
    let flow = state
        .submission
        .edit_post_form(identity.as_ref(), &username, post_id)
        .await?;
    Ok(respond(&state, flow))
}

/// POST /{username}/{post_id}/edit/
pub async fn post_edit(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<(String, i64)>,
    body: FormBody,
) -> AppResult<HttpResponse> {
    let (username, post_id) = path.into_inner();
    let body = match body {
        Ok(body) => body,
        Err(err) => {
            let gate = state
                .submission
                .edit_post_form(identity.as_ref(), &username, post_id)
                .await?;
            return Ok(unreadable_body(&state, gate, err));
        }
    };

    let flow = state
        .submission
        .edit_post(
            identity.as_ref(),
            &username,
            post_id,
            post_form(body.into_inner()),
        )
        .await?;
    Ok(respond(&state, flow))
}
