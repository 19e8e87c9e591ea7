use std::io::Cursor;
use std::sync::{Arc, Mutex};

use actix_web::cookie::Cookie;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::Value;

use yatube_core::Paginator;
use yatube_core::domain::{Group, NewGroup, NewPost, Post, PostScope, User};
use yatube_core::ports::{
    BaseRepository, CommentRepository, FollowRepository, GroupRepository, PasswordService,
    PostRepository, TokenService, UserRepository,
};
use yatube_infra::{
    Argon2PasswordService, InMemoryMediaStorage, JwtConfig, JwtTokenService, MemoryStore,
};

use super::configure_routes;
use crate::middleware::auth::SESSION_COOKIE;
use crate::render::{MiniJinjaRenderer, RenderError, Renderer};
use crate::state::AppState;

const BOUNDARY: &str = "yatube-test-boundary";

/// Records every render call and returns the template name as the body.
#[derive(Default)]
struct RecordingRenderer {
    calls: Mutex<Vec<(String, Value)>>,
}

impl Renderer for RecordingRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError> {
        self.calls
            .lock()
            .unwrap()
            .push((template.to_string(), context.clone()));
        Ok(template.to_string())
    }
}

struct Harness {
    store: MemoryStore,
    renderer: Arc<RecordingRenderer>,
    state: AppState,
    tokens: Arc<dyn TokenService>,
    passwords: Arc<dyn PasswordService>,
}

impl Harness {
    fn new() -> Self {
        let renderer = Arc::new(RecordingRenderer::default());
        Self::with_renderer(renderer.clone(), renderer)
    }

    /// Harness rendering through the real templates.
    fn rendering() -> Self {
        Self::with_renderer(
            Arc::new(RecordingRenderer::default()),
            Arc::new(MiniJinjaRenderer),
        )
    }

    fn with_renderer(recorder: Arc<RecordingRenderer>, renderer: Arc<dyn Renderer>) -> Self {
        let store = MemoryStore::new();
        let state = AppState::in_memory(
            &store,
            Arc::new(InMemoryMediaStorage::new()),
            renderer,
            Paginator::new(10),
        );

        Self {
            store,
            renderer: recorder,
            state,
            tokens: Arc::new(JwtTokenService::new(JwtConfig::default())),
            passwords: Arc::new(Argon2PasswordService::new()),
        }
    }

    async fn user(&self, username: &str) -> User {
        self.store
            .users()
            .save(User::new(username.to_string(), String::new(), "unusable".to_string()))
            .await
            .unwrap()
    }

    async fn group(&self, slug: &str) -> Group {
        self.store
            .groups()
            .create(NewGroup::new("Test group", slug, "Test description"))
            .await
            .unwrap()
    }

    async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.store
            .posts()
            .create(NewPost::new(author.id, text).with_group(group.map(|g| g.id)))
            .await
            .unwrap()
    }

    fn session(&self, user: &User) -> Cookie<'static> {
        let token = self.tokens.generate_token(user.id, &user.username).unwrap();
        Cookie::new(SESSION_COOKIE, token)
    }

    fn renders(&self) -> Vec<(String, Value)> {
        self.renderer.calls.lock().unwrap().clone()
    }

    fn last_render(&self) -> (String, Value) {
        self.renders().pop().expect("a page should have been rendered")
    }
}

macro_rules! init_app {
    ($h:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($h.state.clone()))
                .app_data(web::Data::new($h.tokens.clone()))
                .app_data(web::Data::new($h.passwords.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .expect("redirect should carry a location")
        .to_str()
        .unwrap()
        .to_string()
}

fn object_count(context: &Value) -> usize {
    context["page_obj"]["object_list"].as_array().unwrap().len()
}

fn png() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Multipart body with text fields and an optional `image` file.
fn multipart(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

fn post_form(
    uri: &str,
    cookie: Cookie<'static>,
    fields: &[(&str, &str)],
    image: Option<(&str, &[u8])>,
) -> test::TestRequest {
    let (content_type, body) = multipart(fields, image);
    test::TestRequest::post()
        .uri(uri)
        .cookie(cookie)
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
}

#[actix_web::test]
async fn test_listings_split_fifteen_posts_into_ten_and_five() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let group = h.group("test-slug").await;
    for i in 0..15 {
        h.post(&author, &format!("Post number {i}"), Some(&group)).await;
    }
    let app = init_app!(h);

    for base in ["/", "/group/test-slug/", "/profile/auth/"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(base).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{base}");
        assert_eq!(object_count(&h.last_render().1), 10, "{base} page 1");

        let uri = format!("{base}?page=2");
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        assert_eq!(object_count(&h.last_render().1), 5, "{base} page 2");
    }
}

#[actix_web::test]
async fn test_listing_resolves_odd_page_numbers() {
    let h = Harness::new();
    let author = h.user("auth").await;
    for i in 0..15 {
        h.post(&author, &format!("Post {i}"), None).await;
    }
    let app = init_app!(h);

    for (query, number) in [("abc", 1), ("0", 1), ("-3", 1), ("99", 2)] {
        let uri = format!("/?page={query}");
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(h.last_render().1["page_obj"]["number"], number, "{uri}");
    }
}

#[actix_web::test]
async fn test_index_is_newest_first_and_carries_page_values() {
    let h = Harness::new();
    let author = h.user("auth").await;
    h.post(&author, "first", None).await;
    h.post(&author, "second", None).await;
    let app = init_app!(h);

    let session = h.session(&author);
    let req = test::TestRequest::get().uri("/").cookie(session).to_request();
    test::call_service(&app, req).await;

    let (template, context) = h.last_render();
    assert_eq!(template, "posts/index.html");
    assert_eq!(context["page_obj"]["object_list"][0]["text"], "second");
    assert_eq!(context["current_user"], "auth");
    assert!(context["year"].as_i64().unwrap() >= 2024);
}

#[actix_web::test]
async fn test_group_page_shows_only_its_posts() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let group = h.group("cats").await;
    let other = h.group("dogs").await;
    h.post(&author, "meow", Some(&group)).await;
    h.post(&author, "woof", Some(&other)).await;
    h.post(&author, "plain", None).await;
    let app = init_app!(h);

    let req = test::TestRequest::get().uri("/group/cats/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let (template, context) = h.last_render();
    assert_eq!(template, "posts/group_list.html");
    assert_eq!(context["group"]["slug"], "cats");
    assert_eq!(object_count(&context), 1);
    assert_eq!(context["page_obj"]["object_list"][0]["text"], "meow");
}

#[actix_web::test]
async fn test_missing_records_are_404_without_rendering_a_page() {
    let h = Harness::new();
    let app = init_app!(h);

    for uri in [
        "/posts/999999/",
        "/posts/not-a-number/",
        "/group/missing/",
        "/profile/nobody/",
        "/no/such/route/",
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
    assert!(h.renders().is_empty());
}

#[actix_web::test]
async fn test_post_detail_context() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let reader = h.user("reader").await;
    let group = h.group("test-slug").await;
    let post = h.post(&author, "A text that is longer than fifteen", Some(&group)).await;
    h.post(&author, "another", None).await;
    let app = init_app!(h);

    let uri = format!("/posts/{}/", post.id);
    let req = test::TestRequest::get().uri(&uri).cookie(h.session(&reader)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let (template, context) = h.last_render();
    assert_eq!(template, "posts/post_detail.html");
    assert_eq!(context["post"]["label"], "A text that is ");
    assert_eq!(context["post"]["group"]["title"], "Test group");
    assert_eq!(context["posts_count"], 2);
    assert_eq!(context["can_edit"], false);
    assert_eq!(context["form"]["text"], "");
}

#[actix_web::test]
async fn test_create_post_redirects_to_profile_and_lists_it() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let app = init_app!(h);

    let req = post_form(
        "/create/",
        h.session(&author),
        &[("text", "Hello"), ("group", "")],
        None,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/auth/");

    let req = test::TestRequest::get().uri("/profile/auth/").to_request();
    test::call_service(&app, req).await;

    let (template, context) = h.last_render();
    assert_eq!(template, "posts/profile.html");
    assert_eq!(context["posts_count"], 1);
    assert_eq!(context["page_obj"]["object_list"][0]["label"], "Hello");
    assert!(context["page_obj"]["object_list"][0]["group"].is_null());
}

#[actix_web::test]
async fn test_create_post_with_group_and_image() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let group = h.group("test-slug").await;
    let app = init_app!(h);

    let image = png();
    let group_id = group.id.to_string();
    let req = post_form(
        "/create/",
        h.session(&author),
        &[("text", "With picture"), ("group", group_id.as_str())],
        Some(("small.png", image.as_slice())),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let entries = h
        .store
        .posts()
        .list(yatube_core::domain::PostScope::Group(group.id), 0, 10)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    let key = entries[0].post.image.clone().expect("image should be stored");
    assert!(key.ends_with(".png"));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&format!("/media/{key}")).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(test::read_body(resp).await.as_ref(), image.as_slice());
}

#[actix_web::test]
async fn test_invalid_create_rerenders_form_and_saves_nothing() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let app = init_app!(h);

    let cases: [(&[(&str, &str)], Option<(&str, &[u8])>, &str); 3] = [
        (&[("text", "   ")][..], None, "text"),
        (&[("text", "Hello"), ("group", "999")][..], None, "group"),
        (&[("text", "Hello")][..], Some(("fake.png", &b"not an image"[..])), "image"),
    ];

    for (fields, image, field) in cases {
        let req = post_form("/create/", h.session(&author), fields, image).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{field}");

        let (template, context) = h.last_render();
        assert_eq!(template, "posts/create_post.html");
        assert!(context["form"]["errors"][field].is_array(), "{field}");
        assert_eq!(context["is_edit"], false);
    }

    let count = h
        .store
        .posts()
        .count(yatube_core::domain::PostScope::All)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[actix_web::test]
async fn test_empty_upload_counts_as_no_image() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let app = init_app!(h);

    let req = post_form(
        "/create/",
        h.session(&author),
        &[("text", "No picture")],
        Some(("", &b""[..])),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let entries = h
        .store
        .posts()
        .list(yatube_core::domain::PostScope::All, 0, 10)
        .await
        .unwrap();
    assert!(entries[0].post.image.is_none());
}

#[actix_web::test]
async fn test_anonymous_users_are_sent_to_login() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let post = h.post(&author, "text", None).await;
    let app = init_app!(h);

    let edit = format!("/posts/{}/edit/", post.id);
    for uri in ["/create/", "/follow/", "/profile/auth/follow/", edit.as_str()] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{uri}");
        assert_eq!(
            location(&resp),
            format!("/auth/login/?next={}", urlencoding::encode(uri))
        );
    }

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .set_form([("text", "anonymous")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/?next="));
    assert!(h.store.comments().list_for_post(post.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_non_author_cannot_edit() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let intruder = h.user("intruder").await;
    let post = h.post(&author, "Original", None).await;
    let app = init_app!(h);

    let uri = format!("/posts/{}/edit/", post.id);
    let detail = format!("/posts/{}/", post.id);

    let req = test::TestRequest::get().uri(&uri).cookie(h.session(&intruder)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail);

    let req = post_form(&uri, h.session(&intruder), &[("text", "Hacked")], None).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail);

    let stored: Post = h.store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Original");
    assert!(h.renders().is_empty());
}

#[actix_web::test]
async fn test_author_edits_post() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let group = h.group("test-slug").await;
    let post = h.post(&author, "Original", None).await;
    let app = init_app!(h);

    let uri = format!("/posts/{}/edit/", post.id);

    let req = test::TestRequest::get().uri(&uri).cookie(h.session(&author)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let (template, context) = h.last_render();
    assert_eq!(template, "posts/create_post.html");
    assert_eq!(context["is_edit"], true);
    assert_eq!(context["form"]["text"], "Original");
    assert_eq!(context["groups"][0]["title"], "Test group");

    let group_id = group.id.to_string();
    let req = post_form(
        &uri,
        h.session(&author),
        &[("text", "Edited"), ("group", group_id.as_str())],
        None,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let stored: Post = h.store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Edited");
    assert_eq!(stored.group_id, Some(group.id));
    assert_eq!(stored.created_at, post.created_at);
}

#[actix_web::test]
async fn test_edit_without_new_image_keeps_the_old_one() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let post = h
        .store
        .posts()
        .create(NewPost::new(author.id, "Pictured").with_image(Some("posts/old.png".to_string())))
        .await
        .unwrap();
    let app = init_app!(h);

    let uri = format!("/posts/{}/edit/", post.id);
    let req = post_form(&uri, h.session(&author), &[("text", "Still pictured")], None).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let stored: Post = h.store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.image.as_deref(), Some("posts/old.png"));
}

#[actix_web::test]
async fn test_comments() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let reader = h.user("reader").await;
    let post = h.post(&author, "Discuss", None).await;
    let app = init_app!(h);

    let uri = format!("/posts/{}/comment/", post.id);
    let detail = format!("/posts/{}/", post.id);

    for text in ["Nice post", "   "] {
        let req = test::TestRequest::post()
            .uri(&uri)
            .cookie(h.session(&reader))
            .set_form([("text", text)])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), detail);
    }

    let comments = h.store.comments().list_for_post(post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].author, "reader");

    test::call_service(&app, test::TestRequest::get().uri(&detail).to_request()).await;
    let (_, context) = h.last_render();
    assert_eq!(context["comments"][0]["text"], "Nice post");

    let req = test::TestRequest::post()
        .uri("/posts/999999/comment/")
        .cookie(h.session(&reader))
        .set_form([("text", "lost")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_follow_rules() {
    let h = Harness::new();
    let user = h.user("follower").await;
    let author = h.user("auth").await;
    let app = init_app!(h);

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri("/profile/auth/follow/")
            .cookie(h.session(&user))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/profile/auth/");
    }

    let req = test::TestRequest::get()
        .uri("/profile/auth/")
        .cookie(h.session(&user))
        .to_request();
    test::call_service(&app, req).await;
    let (_, context) = h.last_render();
    assert_eq!(context["following"], true);
    assert_eq!(context["can_follow"], true);

    // Exactly one row existed.
    assert_eq!(h.store.follows().delete(user.id, author.id).await.unwrap(), 1);

    let req = test::TestRequest::get()
        .uri("/profile/auth/follow/")
        .cookie(h.session(&author))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(!h.store.follows().exists(author.id, author.id).await.unwrap());

    let req = test::TestRequest::get()
        .uri("/profile/auth/unfollow/")
        .cookie(h.session(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(!h.store.follows().exists(user.id, author.id).await.unwrap());

    let req = test::TestRequest::get()
        .uri("/profile/nobody/follow/")
        .cookie(h.session(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_own_profile_cannot_be_followed() {
    let h = Harness::new();
    let author = h.user("auth").await;
    let app = init_app!(h);

    let req = test::TestRequest::get()
        .uri("/profile/auth/")
        .cookie(h.session(&author))
        .to_request();
    test::call_service(&app, req).await;

    let (_, context) = h.last_render();
    assert_eq!(context["following"], false);
    assert_eq!(context["can_follow"], false);
}

#[actix_web::test]
async fn test_feed_shows_only_followed_authors() {
    let h = Harness::new();
    let user = h.user("follower").await;
    let followed = h.user("followed").await;
    let stranger = h.user("stranger").await;
    h.post(&followed, "from followed", None).await;
    h.post(&stranger, "from stranger", None).await;
    h.store.follows().insert(user.id, followed.id).await.unwrap();
    let app = init_app!(h);

    let req = test::TestRequest::get().uri("/follow/").cookie(h.session(&user)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let (template, context) = h.last_render();
    assert_eq!(template, "posts/follow.html");
    assert_eq!(object_count(&context), 1);
    assert_eq!(context["page_obj"]["object_list"][0]["author"], "followed");

    let req = test::TestRequest::get().uri("/follow/").cookie(h.session(&stranger)).to_request();
    test::call_service(&app, req).await;
    assert_eq!(object_count(&h.last_render().1), 0);
}

#[actix_web::test]
async fn test_signup_rejects_username_that_breaks_profile_urls() {
    let h = Harness::new();
    let app = init_app!(h);

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([("username", "a?b"), ("password", "long-enough")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!resp.response().cookies().any(|c| c.name() == SESSION_COOKIE));
    let (template, context) = h.last_render();
    assert_eq!(template, "users/signup.html");
    assert!(context["errors"]["username"].is_array());
    assert!(h.store.users().find_by_username("a?b").await.unwrap().is_none());
}

#[actix_web::test]
async fn test_session_of_unknown_user_is_sent_to_login() {
    let h = Harness::new();
    let app = init_app!(h);
    let ghost = User::new("ghost".to_string(), String::new(), "unusable".to_string());

    let req = post_form("/create/", h.session(&ghost), &[("text", "Hello")], None).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=%2Fcreate%2F");
    assert_eq!(h.store.posts().count(PostScope::All).await.unwrap(), 0);

    let req = test::TestRequest::get()
        .uri("/")
        .cookie(h.session(&ghost))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.last_render().1["current_user"], Value::Null);
}

#[actix_web::test]
async fn test_signup_login_logout() {
    let h = Harness::new();
    let app = init_app!(h);

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([("username", "newbie"), ("email", ""), ("password", "long-enough")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    assert!(resp.response().cookies().any(|c| c.name() == SESSION_COOKIE));

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([("username", "newbie"), ("password", "long-enough")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(h.last_render().1["errors"]["username"].is_array());

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", "newbie"), ("password", "wrong-password")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let (template, context) = h.last_render();
    assert_eq!(template, "users/login.html");
    assert!(context["errors"]["non_field"].is_array());

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", "newbie"), ("password", "long-enough"), ("next", "/create/")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/create/");
    let session = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("login should set the session cookie")
        .into_owned();

    let req = test::TestRequest::get().uri("/create/").cookie(session).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/auth/logout/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let removal = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("logout should clear the session cookie");
    assert_eq!(removal.value(), "");
}

#[actix_web::test]
async fn test_login_page_keeps_next() {
    let h = Harness::new();
    let app = init_app!(h);

    let req = test::TestRequest::get().uri("/auth/login/?next=%2Fcreate%2F").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.last_render().1["next"], "/create/");
}

#[actix_web::test]
async fn test_health() {
    let h = Harness::new();
    let app = init_app!(h);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "in-memory");
}

#[actix_web::test]
async fn test_templates_render_real_pages() {
    let h = Harness::rendering();
    let author = h.user("auth").await;
    let group = h.group("test-slug").await;
    let post = h.post(&author, "Rendered <text>", Some(&group)).await;
    h.store
        .comments()
        .create(yatube_core::domain::NewComment {
            post_id: post.id,
            author_id: author.id,
            text: "A comment".to_string(),
        })
        .await
        .unwrap();
    let app = init_app!(h);

    let detail = format!("/posts/{}/", post.id);
    let edit = format!("/posts/{}/edit/", post.id);
    let pages = [
        "/",
        "/group/test-slug/",
        "/profile/auth/",
        detail.as_str(),
        "/create/",
        edit.as_str(),
        "/follow/",
    ];
    for uri in pages {
        let req = test::TestRequest::get().uri(uri).cookie(h.session(&author)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");

        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("<html"), "{uri}");
        assert!(!body.contains("Rendered <text>"), "{uri} must escape post text");
    }

    let resp = test::call_service(&app, test::TestRequest::get().uri(&detail).to_request()).await;
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("Rendered &lt;text&gt;"));
    assert!(body.contains("A comment"));

    for uri in ["/auth/signup/", "/auth/login/", "/auth/logout/"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }

    let req = test::TestRequest::get().uri("/posts/999999/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("404"));
}
