use crate::helpers::spawn_app;
use wiremock::matchers::{any, header, method, path_regex};
use wiremock::{Mock, ResponseTemplate};

// "hello" and "world" as inline images
const FRONT_IMAGE: &str = "data:image/png;base64,aGVsbG8=";
const BACK_IMAGE: &str = "data:image/jpeg;base64,d29ybGQ=";

fn letter(letter_no: &str, date: &str, kind: &str) -> serde_json::Value {
    serde_json::json!({
        "title": format!("Issue {}", letter_no),
        "description": "What happened this month",
        "date": date,
        "letterNo": letter_no,
        "type": kind,
    })
}

#[tokio::test]
async fn upload_letter_stores_both_images_in_the_bucket() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/newsletters/[0-9a-f-]{36}7$"))
        .and(header("Content-Type", "image/png"))
        .and(header("x-amz-acl", "public-read-write"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.bucket_server)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/newsletters/[0-9a-f-]{36}72$"))
        .and(header("Content-Type", "image/jpeg"))
        .and(header("x-amz-acl", "public-read-write"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.bucket_server)
        .await;
    let mut body = letter("7", "2023-07-01", "monthly");
    body["image"] = FRONT_IMAGE.into();
    body["backImage"] = BACK_IMAGE.into();

    // Act
    let response = app.upload_letter(&body).await;

    // Assert
    assert_eq!(response.status().as_u16(), 201);
    let created: serde_json::Value = response.json().await.unwrap();
    let image = created["image"].as_str().unwrap();
    let back_image = created["backImage"].as_str().unwrap();
    assert!(image.starts_with(&app.public_base_url));
    assert!(image.ends_with('7'));
    assert!(back_image.starts_with(&app.public_base_url));
    assert!(back_image.ends_with("72"));

    let stored = app.get_json_array("/letters/7").await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["image"], image);
    assert_eq!(stored[0]["type"], "monthly");
}

#[tokio::test]
async fn letter_number_cannot_move_the_upload_out_of_the_bucket() {
    let app = spawn_app().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/newsletters/[0-9a-f-]{36}\.\.%2F\.\.%2Fevil%23x$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.bucket_server)
        .await;
    let mut body = letter("../../evil#x", "2023-07-01", "monthly");
    body["image"] = FRONT_IMAGE.into();

    let response = app.upload_letter(&body).await;

    assert_eq!(response.status().as_u16(), 201);
    let created: serde_json::Value = response.json().await.unwrap();
    let image = created["image"].as_str().unwrap();
    assert!(image.starts_with(&format!("{}/", app.public_base_url)));
    assert!(image.ends_with("..%2F..%2Fevil%23x"));
}

#[tokio::test]
async fn hosted_images_are_kept_and_missing_date_is_filled() {
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.bucket_server)
        .await;
    let body = serde_json::json!({
        "title": "Spring",
        "letterNo": "3",
        "image": "https://cdn.example.com/front.png",
    });

    let response = app.upload_letter(&body).await;

    assert_eq!(response.status().as_u16(), 201);
    let created: serde_json::Value = response.json().await.unwrap();
    assert_eq!(created["image"], "https://cdn.example.com/front.png");
    assert_eq!(created["backImage"], "");
    let date = created["date"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(date).is_ok());
}

#[tokio::test]
async fn bucket_failure_returns_502_and_stores_nothing() {
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.bucket_server)
        .await;
    let mut body = letter("9", "2023-09-01", "monthly");
    body["image"] = FRONT_IMAGE.into();

    let response = app.upload_letter(&body).await;

    assert_eq!(response.status().as_u16(), 502);
    assert!(app.get_json_array("/getLetters").await.is_empty());
}

#[tokio::test]
async fn back_image_is_not_uploaded_when_the_front_upload_fails() {
    let app = spawn_app().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/newsletters/[0-9a-f-]{36}5$"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&app.bucket_server)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/newsletters/[0-9a-f-]{36}52$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.bucket_server)
        .await;
    let mut body = letter("5", "2023-05-01", "monthly");
    body["image"] = FRONT_IMAGE.into();
    body["backImage"] = BACK_IMAGE.into();

    let response = app.upload_letter(&body).await;

    assert_eq!(response.status().as_u16(), 502);
    assert!(app.get_json_array("/getLetters").await.is_empty());
}

#[tokio::test]
async fn invalid_uploads_return_400() {
    let app = spawn_app().await;

    let mut body = letter("1", "2023-01-01", "monthly");
    body["image"] = "data:image/png;base64,###".into();
    let response = app.upload_letter(&body).await;
    assert_eq!(response.status().as_u16(), 400);

    let response = app.post_raw("/uploadLetter", "{\"title\": \"unterminated").await;
    assert_eq!(response.status().as_u16(), 400);

    assert!(app.get_json_array("/getLetters").await.is_empty());
}

#[tokio::test]
async fn get_letters_lists_newest_first_and_filters_by_type() {
    let app = spawn_app().await;
    for (no, date, kind) in [
        ("1", "2023-01-05", "monthly"),
        ("2", "2023-03-01", "special"),
        ("3", "2023-02-10", "monthly"),
    ] {
        let response = app.upload_letter(&letter(no, date, kind)).await;
        assert_eq!(response.status().as_u16(), 201);
    }

    let all = app.get_json_array("/getLetters").await;
    let numbers: Vec<&str> = all.iter().map(|l| l["letterNo"].as_str().unwrap()).collect();
    assert_eq!(numbers, vec!["2", "3", "1"]);

    let monthly = app.get_json_array("/getLetters?type=monthly").await;
    let numbers: Vec<&str> = monthly
        .iter()
        .map(|l| l["letterNo"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, vec!["3", "1"]);

    assert!(app.get_json_array("/letters/42").await.is_empty());
}

#[tokio::test]
async fn letter_number_in_the_path_is_decoded() {
    let app = spawn_app().await;
    let response = app
        .upload_letter(&letter("spring issue", "2023-04-01", "special"))
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let found = app.get_json_array("/letters/spring%20issue").await;

    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["letterNo"], "spring issue");
}
