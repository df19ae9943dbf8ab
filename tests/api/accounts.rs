use crate::helpers::{spawn_app, TestAccount};

#[tokio::test]
async fn new_admin_returns_201_without_the_password_hash() {
    // Arrange
    let app = spawn_app().await;
    let admin = TestAccount::generate();

    // Act
    let response = app.post_json("/newAdmin", &admin.payload()).await;

    // Assert
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], admin.username.as_str());
    assert_eq!(body["email"], admin.email.as_str());
    assert_eq!(body["role"], "admin");
    assert!(body.get("password_hash").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn created_accounts_are_listed_per_role() {
    let app = spawn_app().await;
    let admin = TestAccount::generate();
    let user = TestAccount::generate();
    app.post_json("/newAdmin", &admin.payload()).await;
    app.post_json("/newuser", &user.payload()).await;

    let admins = app.get_json_array("/getAdminUsers").await;
    let users = app.get_json_array("/getUsers").await;

    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0]["username"], admin.username.as_str());
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], user.username.as_str());
}

#[tokio::test]
async fn duplicate_username_returns_409() {
    let app = spawn_app().await;
    let user = TestAccount::generate();

    let first = app.post_json("/newuser", &user.payload()).await;
    let second = app.post_json("/newuser", &user.payload()).await;

    assert_eq!(first.status().as_u16(), 201);
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn invalid_account_payloads_return_400() {
    let app = spawn_app().await;
    let test_cases = vec![
        (
            serde_json::json!({"username": "ed", "email": "ed@example.com", "password": "pw"}),
            "a too short username",
        ),
        (
            serde_json::json!({"username": "editor", "email": "not-an-email", "password": "pw"}),
            "an invalid email",
        ),
        (
            serde_json::json!({"username": "editor", "email": "ed@example.com", "password": ""}),
            "an empty password",
        ),
        (
            serde_json::json!({"username": "editor", "email": "ed@example.com"}),
            "a missing password",
        ),
    ];

    for (body, description) in test_cases {
        let response = app.post_json("/newAdmin", &body).await;

        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not fail with 400 Bad Request when the payload had {}",
            description
        );
    }

    let response = app.post_raw("/newAdmin", "{\"username\": ").await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn admin_authentication_accepts_only_valid_admin_credentials() {
    let app = spawn_app().await;
    let admin = TestAccount::generate();
    let user = TestAccount::generate();
    app.post_json("/newAdmin", &admin.payload()).await;
    app.post_json("/newuser", &user.payload()).await;

    let response = app.post_json("/authAdmin", &admin.credentials()).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], admin.username.as_str());

    let wrong_password = serde_json::json!({
        "username": admin.username,
        "password": format!("{}-wrong", admin.password),
    });
    let response = app.post_json("/authAdmin", &wrong_password).await;
    assert_eq!(response.status().as_u16(), 401);

    // A plain user is not an admin
    let response = app.post_json("/authAdmin", &user.credentials()).await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn user_authentication_works() {
    let app = spawn_app().await;
    let user = TestAccount::generate();
    app.post_json("/newuser", &user.payload()).await;

    let response = app.post_json("/auth", &user.credentials()).await;
    assert_eq!(response.status().as_u16(), 200);

    let unknown = serde_json::json!({"username": "nobody", "password": "secret"});
    let response = app.post_json("/auth", &unknown).await;
    assert_eq!(response.status().as_u16(), 401);
}
