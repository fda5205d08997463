use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::Value;

use postboard_core::domain::{EMPTY_TEXT_MESSAGE, Group, NewGroup, NewPost, Post, PostText, User};
use postboard_core::ports::{
    BaseRepository, GroupRepository, PostRepository, TokenService, UserRepository,
};
use postboard_infra::{InMemoryDatabase, JwtConfig, JwtTokenService};
use postboard_shared::dto::PostFormRequest;

use super::configure_routes;
use crate::config::DEFAULT_LOGIN_URL;
use crate::middleware::auth::TOKEN_COOKIE;
use crate::observability::RequestIdMiddleware;
use crate::state::AppState;

struct Fixture {
    db: InMemoryDatabase,
    tokens: Arc<dyn TokenService>,
    author: User,
    other: User,
    group: Group,
    post: Post,
}

impl Fixture {
    fn bearer(&self, user: &User) -> (header::HeaderName, String) {
        let token = self.tokens.generate_token(user.id, &user.username).unwrap();
        (header::AUTHORIZATION, format!("Bearer {token}"))
    }

    async fn write_posts(&self, n: usize) {
        for _ in 0..n {
            self.db
                .posts()
                .create(NewPost {
                    author_id: self.author.id,
                    text: PostText::parse("Infinity text").unwrap(),
                    group_id: Some(self.group.id),
                })
                .await
                .unwrap();
        }
    }

    async fn stored_post(&self) -> Post {
        self.db.posts().find_by_id(self.post.id).await.unwrap().unwrap()
    }
}

async fn fixture() -> Fixture {
    let db = InMemoryDatabase::new();
    let author = db
        .users()
        .save(User::new("test_user").with_name("Name", "Surname"))
        .await
        .unwrap();
    let other = db.users().save(User::new("user_without_posts")).await.unwrap();
    let group = db
        .groups()
        .create(
            NewGroup::new("Test Group", "test-slug-of-group")
                .with_description("Test group description"),
        )
        .await
        .unwrap();
    db.groups()
        .create(NewGroup::new("Test Group without post", "test-slug-of-group-without-post"))
        .await
        .unwrap();
    let post = db
        .posts()
        .create(NewPost {
            author_id: author.id,
            text: PostText::parse("Test text").unwrap(),
            group_id: Some(group.id),
        })
        .await
        .unwrap();

    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(JwtConfig {
        secret: "test-secret".to_string(),
        expiration_hours: 1,
        issuer: "test".to_string(),
    }));

    Fixture {
        db,
        tokens,
        author,
        other,
        group,
        post,
    }
}

macro_rules! init_app {
    ($fixture:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new(AppState::in_memory(
                    &$fixture.db,
                    DEFAULT_LOGIN_URL,
                )))
                .app_data(web::Data::new($fixture.tokens.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn assert_login_redirect(location: &str, next: &str) {
    let (path, query) = location.split_once('?').unwrap();
    assert_eq!(path, DEFAULT_LOGIN_URL);
    let params: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap();
    assert_eq!(params, vec![("next".to_string(), next.to_string())]);
}

fn form(text: &str, group: Option<&str>) -> PostFormRequest {
    PostFormRequest {
        text: text.to_string(),
        group: group.map(str::to_string),
    }
}

#[actix_web::test]
async fn test_pages_open_to_guests() {
    let f = fixture().await;
    let app = init_app!(f);

    for uri in [
        "/".to_string(),
        "/group/test-slug-of-group/".to_string(),
        "/test_user/".to_string(),
        format!("/test_user/{}/", f.post.id),
        "/api/health".to_string(),
    ] {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }
}

#[actix_web::test]
async fn test_write_pages_open_to_author() {
    let f = fixture().await;
    let app = init_app!(f);

    for uri in ["/new/".to_string(), format!("/test_user/{}/edit/", f.post.id)] {
        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(f.bearer(&f.author))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["groups"].as_array().unwrap().len(), 2);
    }
}

#[actix_web::test]
async fn test_write_pages_redirect_guests_to_login() {
    let f = fixture().await;
    let app = init_app!(f);

    for uri in ["/new/".to_string(), format!("/test_user/{}/edit/", f.post.id)] {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{uri}");
        assert_login_redirect(&location(&resp), &uri);
    }

    let req = test::TestRequest::post()
        .uri("/new/")
        .set_form(form("Sneaky", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_login_redirect(&location(&resp), "/new/");
    assert_eq!(f.db.posts().count_by_author(f.author.id).await.unwrap(), 1);
}

#[actix_web::test]
async fn test_gate_runs_before_body_is_read() {
    let f = fixture().await;
    let app = init_app!(f);
    let edit_uri = format!("/test_user/{}/edit/", f.post.id);

    let req = test::TestRequest::post().uri("/new/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_login_redirect(&location(&resp), "/new/");

    let req = test::TestRequest::post().uri(&edit_uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_login_redirect(&location(&resp), &edit_uri);

    let req = test::TestRequest::post()
        .uri(&edit_uri)
        .insert_header(f.bearer(&f.other))
        .set_json(serde_json::json!({ "text": "Hijacked" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/test_user/{}/", f.post.id));
    assert_eq!(f.stored_post().await, f.post);

    let req = test::TestRequest::post()
        .uri("/new/")
        .insert_header(f.bearer(&f.author))
        .set_json(serde_json::json!({ "text": "Wrong encoding" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
    assert_eq!(f.db.posts().count_by_author(f.author.id).await.unwrap(), 1);
}

#[actix_web::test]
async fn test_edit_by_other_user_redirects_to_post() {
    let f = fixture().await;
    let app = init_app!(f);
    let edit_uri = format!("/test_user/{}/edit/", f.post.id);
    let post_uri = format!("/test_user/{}/", f.post.id);

    let req = test::TestRequest::get()
        .uri(&edit_uri)
        .insert_header(f.bearer(&f.other))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), post_uri);

    let req = test::TestRequest::post()
        .uri(&edit_uri)
        .insert_header(f.bearer(&f.other))
        .set_form(form("Hijacked", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), post_uri);
    assert_eq!(f.stored_post().await, f.post);
}

#[actix_web::test]
async fn test_new_post_appears_first_everywhere() {
    let f = fixture().await;
    let app = init_app!(f);

    let req = test::TestRequest::post()
        .uri("/new/")
        .insert_header(f.bearer(&f.author))
        .set_form(form("Brand new", Some("test-slug-of-group")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let first = &body["data"]["items"][0];
    assert_eq!(first["text"], "Brand new");
    assert_eq!(first["author"]["username"], "test_user");
    assert_eq!(first["group"]["slug"], "test-slug-of-group");

    let req = test::TestRequest::get()
        .uri("/group/test-slug-of-group/")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["page"]["items"][0]["text"], "Brand new");
    assert_eq!(body["data"]["group"]["title"], "Test Group");
    assert_eq!(body["data"]["group"]["description"], "Test group description");

    let req = test::TestRequest::get().uri("/test_user/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["page"]["items"][0]["text"], "Brand new");
    assert_eq!(body["data"]["post_count"], 2);
    assert_eq!(body["data"]["author"]["username"], "test_user");
}

#[actix_web::test]
async fn test_author_edit_updates_post() {
    let f = fixture().await;
    let app = init_app!(f);
    let edit_uri = format!("/test_user/{}/edit/", f.post.id);

    let req = test::TestRequest::get()
        .uri(&edit_uri)
        .insert_header(f.bearer(&f.author))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["form"]["text"], "Test text");
    assert_eq!(body["data"]["form"]["group"], "test-slug-of-group");
    assert_eq!(body["data"]["post"]["id"], f.post.id);

    let req = test::TestRequest::post()
        .uri(&edit_uri)
        .insert_header(f.bearer(&f.author))
        .set_form(form("Edited text", Some("")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/test_user/{}/", f.post.id));

    let stored = f.stored_post().await;
    assert_eq!(stored.text, "Edited text");
    assert_eq!(stored.group_id, None);
    assert_eq!(stored.pub_date, f.post.pub_date);
    assert_eq!(stored.author_id, f.author.id);
}

#[actix_web::test]
async fn test_empty_text_shows_form_again() {
    let f = fixture().await;
    let app = init_app!(f);

    let req = test::TestRequest::post()
        .uri("/new/")
        .insert_header(f.bearer(&f.author))
        .set_form(form("", Some("test-slug-of-group")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], EMPTY_TEXT_MESSAGE);
    assert_eq!(body["data"]["errors"]["text"][0], EMPTY_TEXT_MESSAGE);
    assert_eq!(body["data"]["form"]["group"], "test-slug-of-group");
    assert_eq!(f.db.posts().count_by_author(f.author.id).await.unwrap(), 1);

    let req = test::TestRequest::post()
        .uri(&format!("/test_user/{}/edit/", f.post.id))
        .insert_header(f.bearer(&f.author))
        .set_form(form("  ", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(f.stored_post().await, f.post);
}

#[actix_web::test]
async fn test_paginator_shows_ten_posts_per_page() {
    let f = fixture().await;
    f.write_posts(10).await;
    let app = init_app!(f);

    let cases = [
        ("/", "/data/items"),
        ("/group/test-slug-of-group/", "/data/page/items"),
        ("/test_user/", "/data/page/items"),
    ];
    for (uri, items) in cases {
        for (query, expected) in [("", 10), ("?page=2", 1), ("?page=abc", 10), ("?page=9", 0)] {
            let req = test::TestRequest::get()
                .uri(&format!("{uri}{query}"))
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            let count = body.pointer(items).unwrap().as_array().unwrap().len();
            assert_eq!(count, expected, "{uri}{query}");
        }
    }

    let req = test::TestRequest::get().uri("/test_user/?page=2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["post_count"], 11);
}

#[actix_web::test]
async fn test_group_without_posts_is_empty() {
    let f = fixture().await;
    let app = init_app!(f);

    let req = test::TestRequest::get()
        .uri("/group/test-slug-of-group-without-post/")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["data"]["page"]["items"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["page"]["total_count"], 0);
}

#[actix_web::test]
async fn test_unknown_resources_are_not_found() {
    let f = fixture().await;
    let app = init_app!(f);

    for uri in [
        "/group/no-such-group/".to_string(),
        "/ghost/".to_string(),
        format!("/user_without_posts/{}/", f.post.id),
        "/test_user/999/".to_string(),
        "/test_user/not-a-number/".to_string(),
    ] {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_web::test]
async fn test_post_page_shows_author_and_count() {
    let f = fixture().await;
    let app = init_app!(f);

    let req = test::TestRequest::get()
        .uri(&format!("/test_user/{}/", f.post.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["post"]["text"], "Test text");
    assert_eq!(body["data"]["author"]["first_name"], "Name");
    assert_eq!(body["data"]["post_count"], 1);
}

#[actix_web::test]
async fn test_cookie_token_identifies_user() {
    let f = fixture().await;
    let app = init_app!(f);
    let token = f
        .tokens
        .generate_token(f.author.id, &f.author.username)
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/new/")
        .cookie(actix_web::cookie::Cookie::new(TOKEN_COOKIE, token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/new/")
        .insert_header((header::AUTHORIZATION, "Bearer garbage"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_web::test]
async fn test_request_id_is_echoed() {
    let f = fixture().await;
    let app = init_app!(f);

    let req = test::TestRequest::get()
        .uri("/api/health")
        .insert_header(("x-request-id", "abc-123"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "abc-123");

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.headers().contains_key("x-request-id"));
}
