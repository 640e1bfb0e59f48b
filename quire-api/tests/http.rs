use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use quire_api::server::{AUTHENTICATED_USER_HEADER, ServerState, app};
use quire_common::model::{
    group::{CreateGroup, Slug},
    user::{CreateUser, User, Username},
};
use quire_core::{FeedSettings, Services};
use quire_db::{EntityStore, MemoryStore};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    services: Arc<Services>,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let services = Arc::new(Services::new(
            Arc::new(MemoryStore::default()),
            FeedSettings::default(),
        ));
        let router = app(ServerState::new(Arc::clone(&services)));
        Self { services, router }
    }

    async fn user(&self, name: &str) -> User {
        self.services
            .store()
            .create_user(&CreateUser {
                username: Username::new(name.to_owned()).unwrap(),
            })
            .await
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, user: Option<&str>) -> Response {
        let mut request = Request::builder().method(Method::GET).uri(uri);
        if let Some(user) = user {
            request = request.header(&AUTHENTICATED_USER_HEADER, user);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, user: Option<&str>, form: &str) -> Response {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(user) = user {
            request = request.header(&AUTHENTICATED_USER_HEADER, user);
        }
        self.send(request.body(Body::from(form.to_owned())).unwrap())
            .await
    }
}

async fn json(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn create_post_redirects_home_and_shows_up() {
    let app = TestApp::new();
    app.user("leo").await;

    let response = app.post_form("/new", Some("leo"), "text=hello+world").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let home = json(app.get("/", None).await).await;
    assert_eq!(home["total_count"], 1);
    assert_eq!(home["items"][0]["text"], "hello world");
    assert_eq!(home["items"][0]["author"]["username"], "leo");
}

#[tokio::test]
async fn home_feed_is_cached() {
    let app = TestApp::new();
    app.user("leo").await;

    let before = json(app.get("/", None).await).await;
    app.post_form("/new", Some("leo"), "text=late").await;
    let after = json(app.get("/", None).await).await;

    assert_eq!(before, after);
    assert_eq!(after["total_count"], 0);

    let page_two = json(app.get("/?page=2", None).await).await;
    assert_eq!(page_two["total_count"], 1);
    assert_eq!(page_two["items"], Value::Array(Vec::new()));
}

#[tokio::test]
async fn writes_need_identity() {
    let app = TestApp::new();

    let anonymous = app.post_form("/new", None, "text=hello").await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let stranger = app.post_form("/new", Some("nobody"), "text=hello").await;
    assert_eq!(stranger.status(), StatusCode::UNAUTHORIZED);
    let body = json(stranger).await;
    assert_eq!(body["status"], 401);

    let following = app.get("/follow", None).await;
    assert_eq!(following.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn blank_post_is_unprocessable() {
    let app = TestApp::new();
    app.user("leo").await;

    let response = app.post_form("/new", Some("leo"), "text=+++").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn follow_and_unfollow_redirect_to_profile() {
    let app = TestApp::new();
    app.user("reader").await;
    app.user("author").await;
    app.post_form("/new", Some("author"), "text=followed+post").await;

    let response = app.post_form("/author/follow", Some("reader"), "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/author");
    app.post_form("/author/follow", Some("reader"), "").await;

    let profile = json(app.get("/author", Some("reader")).await).await;
    assert_eq!(profile["followers"], 1);
    assert_eq!(profile["follows"], true);

    let feed = json(app.get("/follow", Some("reader")).await).await;
    assert_eq!(feed["total_count"], 1);
    assert_eq!(feed["items"][0]["text"], "followed post");

    let own = app.post_form("/reader/follow", Some("reader"), "").await;
    assert_eq!(own.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&own), "/reader");

    app.post_form("/author/unfollow", Some("reader"), "").await;
    let profile = json(app.get("/author", None).await).await;
    assert_eq!(profile["followers"], 0);
    assert_eq!(profile["follows"], Value::Null);
}

#[tokio::test]
async fn non_author_edit_redirects_without_change() {
    let app = TestApp::new();
    let author = app.user("author").await;
    app.user("intruder").await;
    let post = app
        .services
        .authoring()
        .create_post(
            author.id,
            quire_core::authoring::PostDraft {
                text: "original".to_owned(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let post_uri = format!("/author/{}", post.id);

    let response = app
        .post_form(&format!("{post_uri}/edit"), Some("intruder"), "text=defaced")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), post_uri);

    let view = json(app.get(&post_uri, None).await).await;
    assert_eq!(view["post"]["text"], "original");

    let response = app
        .post_form(&format!("{post_uri}/edit"), Some("author"), "text=revised")
        .await;
    assert_eq!(location(&response), post_uri);
    let view = json(app.get(&post_uri, None).await).await;
    assert_eq!(view["post"]["text"], "revised");
}

#[tokio::test]
async fn comments_attach_to_post() {
    let app = TestApp::new();
    app.user("author").await;
    app.user("reader").await;
    app.post_form("/new", Some("author"), "text=discuss").await;
    let profile = json(app.get("/author", None).await).await;
    let post_id = profile["feed"]["items"][0]["id"].as_u64().unwrap();
    let post_uri = format!("/author/{post_id}");

    let response = app
        .post_form(&format!("{post_uri}/comment"), Some("reader"), "text=nice")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), post_uri);

    let empty = app
        .post_form(&format!("{post_uri}/comment"), Some("reader"), "text=")
        .await;
    assert_eq!(empty.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let view = json(app.get(&post_uri, None).await).await;
    assert_eq!(view["comments"].as_array().unwrap().len(), 1);
    assert_eq!(view["comments"][0]["author"]["username"], "reader");
}

#[tokio::test]
async fn unknown_resources_are_not_found() {
    let app = TestApp::new();
    app.user("leo").await;
    app.services
        .store()
        .create_group(&CreateGroup {
            title: "Cats".to_owned(),
            slug: Slug::new("cats".to_owned()).unwrap(),
            description: String::new(),
        })
        .await
        .unwrap();

    assert_eq!(app.get("/group/cats", None).await.status(), StatusCode::OK);
    assert_eq!(
        app.get("/group/dogs", None).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(app.get("/ghost", None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/leo/123", None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        app.get("/leo/not-a-number", None).await.status(),
        StatusCode::NOT_FOUND
    );

    let body = json(app.get("/a/b/c/d", None).await).await;
    assert_eq!(body["status"], 404);
}
