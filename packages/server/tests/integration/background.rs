use serde_json::json;

use crate::common::{TestApp, decode_data_url, jpeg, png, routes};

fn close(actual: [u8; 3], expected: [u8; 3]) -> bool {
    actual
        .iter()
        .zip(expected)
        .all(|(a, e)| a.abs_diff(e) <= 8)
}

#[tokio::test]
async fn uploaded_photo_is_placed_on_generated_background() {
    let app = TestApp::spawn().await;
    let id = app.upload_ok("mug.jpg", jpeg(500, 500, [200, 10, 10])).await;

    let res = app.generate(&id, Some("wood table")).await;

    assert_eq!(res.status, 200, "{}", res.text);
    let url = res.body["background"].as_str().unwrap();
    assert!(url.starts_with("data:image/png;base64,"));

    let composite = decode_data_url(url);
    assert_eq!(composite.dimensions(), (1024, 1024));
    assert!(close(composite.get_pixel(512, 512).0, [200, 10, 10]));
    assert_eq!(composite.get_pixel(5, 5).0, [40, 120, 60]);

    let prompts = app.fakes.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("with the following context: wood table."));
    assert_eq!(app.fakes.removal_count(), 1);
}

#[tokio::test]
async fn without_context_uses_default_prompt() {
    let app = TestApp::spawn().await;
    let id = app.upload_ok("mug.png", png(40, 40, [0, 0, 0])).await;

    let res = app.generate(&id, Some("   ")).await;

    assert_eq!(res.status, 200, "{}", res.text);
    let prompts = app.fakes.prompts();
    assert!(!prompts[0].contains("following context"));
    assert!(prompts[0].contains("neutral"));
}

#[tokio::test]
async fn canvas_grows_around_large_product() {
    let app = TestApp::spawn().await;
    let id = app.upload_ok("banner.png", png(1000, 400, [250, 250, 0])).await;

    let res = app.generate(&id, None).await;

    assert_eq!(res.status, 200, "{}", res.text);
    let composite = decode_data_url(res.body["background"].as_str().unwrap());
    assert_eq!(composite.dimensions(), (1100, 1024));
    // The product starts exactly PADDING in from the left edge.
    assert_eq!(composite.get_pixel(50, 512).0, [250, 250, 0]);
    assert_ne!(composite.get_pixel(49, 512).0, [250, 250, 0]);
}

#[tokio::test]
async fn missing_photo_id_is_bad_request() {
    let app = TestApp::spawn().await;

    let res = app
        .post_json(routes::GENERATE_BACKGROUND, &json!({ "context": "beach" }))
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["message"], "Photo ID not provided");
}

#[tokio::test]
async fn never_uploaded_photo_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app
        .generate("0192f5c8-7d1e-7abc-8000-000000000001", Some("beach"))
        .await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["message"], "Photo not found");
    assert_eq!(app.fakes.removal_count(), 0);
    assert!(app.fakes.prompts().is_empty());
}

#[tokio::test]
async fn removed_photo_is_not_found() {
    let app = TestApp::spawn().await;
    let id = app.upload_ok("mug.png", png(10, 10, [0, 0, 0])).await;
    app.delete_json(routes::REMOVE_PHOTO, &json!({ "photo_id": id }))
        .await;

    let res = app.generate(&id, None).await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["message"], "Photo not found");
}

#[tokio::test]
async fn unset_credential_is_configuration_error() {
    let app = TestApp::spawn_with_key(None).await;
    let id = app.upload_ok("mug.png", png(10, 10, [0, 0, 0])).await;

    let res = app.generate(&id, Some("wood table")).await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "CONFIGURATION_ERROR");
    assert_eq!(res.body["message"], "Configuration error");
    assert_eq!(
        res.body["error"],
        "OPENAI_API_KEY is not set in environment variables"
    );
    assert_eq!(app.fakes.removal_count(), 0);
}

#[tokio::test]
async fn rejected_credential_is_generation_error() {
    let app = TestApp::spawn_with_key(Some("wrong-key")).await;
    let id = app.upload_ok("mug.png", png(10, 10, [0, 0, 0])).await;

    let res = app.generate(&id, None).await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "INTERNAL_ERROR");
    assert_eq!(res.body["message"], "Error generating background");
    assert_eq!(res.body["error"], "Background generation service failed");
    assert!(!res.text.contains("Incorrect API key"));
}

#[tokio::test]
async fn trailing_slash_is_accepted() {
    let app = TestApp::spawn().await;
    let id = app.upload_ok("mug.gif", png(10, 10, [0, 0, 0])).await;

    let res = app
        .post_json("/api/v1/generate-background/", &json!({ "photo_id": id }))
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
}
