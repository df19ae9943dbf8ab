use crate::helpers::spawn_app;
use reqwest::Method;

#[tokio::test]
async fn assets_are_served_with_their_content_type() {
    let app = spawn_app().await;

    let response = app.get("/assets/css/admin.css").await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers()["Content-Type"], "text/css");
}

#[tokio::test]
async fn admin_pages_are_served() {
    let app = spawn_app().await;

    for path in ["/admin", "/admin/", "/admin/index.html", "/login"] {
        let response = app.get(path).await;

        assert_eq!(response.status().as_u16(), 200, "GET {}", path);
        assert_eq!(
            response.headers()["Content-Type"],
            "text/html; charset=utf-8",
            "GET {}",
            path
        );
    }

    let login = app.get("/login").await.text().await.unwrap();
    assert!(login.contains("login-form"));
}

#[tokio::test]
async fn missing_or_escaping_files_return_404() {
    let app = spawn_app().await;

    for path in ["/assets/missing.css", "/assets/%2e%2e/Cargo.toml", "/assets/..%5CCargo.toml"] {
        let response = app.get(path).await;

        assert_eq!(response.status().as_u16(), 404, "GET {}", path);
    }
}

#[tokio::test]
async fn static_files_only_accept_get_and_head() {
    let app = spawn_app().await;

    let response = app.request(Method::POST, "/assets/css/admin.css").await;
    assert_eq!(response.status().as_u16(), 405);

    let response = app.request(Method::HEAD, "/assets/js/admin.js").await;
    assert_eq!(response.status().as_u16(), 200);
}
