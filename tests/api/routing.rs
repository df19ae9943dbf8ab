use crate::helpers::{spawn_app, spawn_app_with_stores, stores_with_broken_newsletters};
use futures::future::join_all;
use reqwest::Method;

#[tokio::test]
async fn unknown_paths_return_404_for_every_method() {
    let app = spawn_app().await;

    for method in [Method::GET, Method::POST, Method::DELETE, Method::PUT] {
        let response = app.request(method.clone(), "/unknown").await;

        assert_eq!(
            response.status().as_u16(),
            404,
            "{} /unknown should not be found",
            method
        );
    }
}

#[tokio::test]
async fn wrong_method_on_a_known_path_returns_405() {
    let app = spawn_app().await;

    let response = app.request(Method::POST, "/getUsers").await;

    assert_eq!(response.status().as_u16(), 405);
    assert_eq!(response.headers()["Allow"], "GET");
}

#[tokio::test]
async fn get_users_returns_a_json_array() {
    let app = spawn_app().await;

    let users = app.get_json_array("/getUsers").await;

    assert!(users.is_empty());
}

#[tokio::test]
async fn trailing_slash_is_redirected_to_the_registered_route() {
    let app = spawn_app().await;

    let response = app.get("/getLetters/?type=monthly").await;
    assert_eq!(response.status().as_u16(), 301);
    assert_eq!(response.headers()["Location"], "/getLetters?type=monthly");

    let response = app.request(Method::POST, "/newuser/").await;
    assert_eq!(response.status().as_u16(), 308);
    assert_eq!(response.headers()["Location"], "/newuser");
}

#[tokio::test]
async fn concurrent_requests_never_see_each_others_parameters() {
    let app = spawn_app().await;
    for no in 1..=10 {
        let body = serde_json::json!({ "title": format!("Issue {}", no), "letterNo": no.to_string() });
        assert_eq!(app.upload_letter(&body).await.status().as_u16(), 201);
    }

    let requests = (1..=10)
        .cycle()
        .take(50)
        .map(|no| {
            let app = &app;
            async move { (no, app.get_json_array(&format!("/letters/{}", no)).await) }
        });
    let responses = join_all(requests).await;

    for (no, letters) in responses {
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0]["letterNo"], no.to_string());
    }
}

#[tokio::test]
async fn failing_database_returns_500_and_the_server_keeps_serving() {
    let app = spawn_app_with_stores(stores_with_broken_newsletters()).await;

    let response = app.get("/getLetters").await;
    assert_eq!(response.status().as_u16(), 500);

    let response = app.get("/health").await;
    assert_eq!(response.status().as_u16(), 200);
}
