use std::io::Cursor;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use image::{ImageFormat, Rgb, RgbImage};
use reqwest::Client;
use serde_json::{Value, json};
use tempfile::TempDir;

use common::StorageConfig;
use pipeline::{FetchConfig, GeneratorConfig, RemoverConfig};
use server::config::{AppConfig, CorsConfig, ServerConfig};
use server::state::AppState;

pub const TEST_API_KEY: &str = "test-key";

pub mod routes {
    pub const ADD_PHOTO: &str = "/api/v1/add-photo";
    pub const REMOVE_PHOTO: &str = "/api/v1/remove-photo";
    pub const GENERATE_BACKGROUND: &str = "/api/v1/generate-background";
    pub const HEALTH: &str = "/health";
    pub const OPENAPI: &str = "/api-docs/openapi.json";
}

/// Stand-ins for the removal service, the image-generation API and the host
/// serving generated images, all on one local listener.
pub struct FakeServices {
    pub addr: SocketAddr,
    pub removals: Arc<AtomicUsize>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

#[derive(Clone)]
struct FakeState {
    addr: SocketAddr,
    removals: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

/// Echo the uploaded `file` back unchanged: every pixel stays foreground.
async fn fake_remove(State(state): State<FakeState>, mut multipart: Multipart) -> impl IntoResponse {
    state.removals.fetch_add(1, Ordering::SeqCst);
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            if let Ok(bytes) = field.bytes().await {
                return (StatusCode::OK, bytes.to_vec());
            }
        }
    }
    (StatusCode::BAD_REQUEST, Vec::new())
}

async fn fake_generate(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let expected = format!("Bearer {TEST_API_KEY}");
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "message": "Incorrect API key provided" } })),
        );
    }

    if let Some(prompt) = body["prompt"].as_str() {
        state.prompts.lock().unwrap().push(prompt.to_string());
    }
    (
        StatusCode::OK,
        Json(json!({
            "created": 0,
            "data": [{ "url": format!("http://{}/assets/background.png", state.addr) }]
        })),
    )
}

async fn fake_asset() -> impl IntoResponse {
    png(1024, 1024, [40, 120, 60])
}

impl FakeServices {
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake services");
        let addr = listener.local_addr().unwrap();

        let state = FakeState {
            addr,
            removals: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        };
        let services = Self {
            addr,
            removals: Arc::clone(&state.removals),
            prompts: Arc::clone(&state.prompts),
        };

        let router = Router::new()
            .route("/api/remove", post(fake_remove))
            .route("/v1/images/generations", post(fake_generate))
            .route("/assets/background.png", get(fake_asset))
            .with_state(state);
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        services
    }

    pub fn removal_count(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub fakes: FakeServices,
    photos: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_key(Some(TEST_API_KEY)).await
    }

    pub async fn spawn_with_key(api_key: Option<&str>) -> Self {
        let fakes = FakeServices::spawn().await;
        let photos = tempfile::tempdir().expect("Failed to create photos dir");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            storage: StorageConfig {
                photos_dir: photos.path().to_path_buf(),
                ..Default::default()
            },
            generator: GeneratorConfig {
                api_key: api_key.map(str::to_string),
                base_url: format!("http://{}/v1", fakes.addr),
                ..Default::default()
            },
            remover: RemoverConfig {
                url: format!("http://{}/api/remove", fakes.addr),
                ..Default::default()
            },
            fetch: FetchConfig::default(),
        };

        let state = AppState::init(app_config)
            .await
            .expect("Failed to build app state");
        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            fakes,
            photos,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn photos_dir(&self) -> &Path {
        self.photos.path()
    }

    pub fn stored_path(&self, photo_id: &str, extension: &str) -> PathBuf {
        self.photos_dir().join(format!("{photo_id}.{extension}"))
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form(&self, path: &str, form: reqwest::multipart::Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    /// Upload `file_bytes` as the `photo` field.
    pub async fn upload(&self, file_name: &str, file_bytes: Vec<u8>) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("photo", part);
        self.post_form(routes::ADD_PHOTO, form).await
    }

    /// Upload and return the new photo id.
    pub async fn upload_ok(&self, file_name: &str, file_bytes: Vec<u8>) -> String {
        let res = self.upload(file_name, file_bytes).await;
        assert_eq!(res.status, 200, "upload failed: {}", res.text);
        res.body["photo_id"].as_str().unwrap().to_string()
    }

    pub async fn generate(&self, photo_id: &str, context: Option<&str>) -> TestResponse {
        let mut body = json!({ "photo_id": photo_id });
        if let Some(context) = context {
            body["context"] = json!(context);
        }
        self.post_json(routes::GENERATE_BACKGROUND, &body).await
    }
}

fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn jpeg(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(&RgbImage::from_pixel(width, height, Rgb(color)), ImageFormat::Jpeg)
}

pub fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(&RgbImage::from_pixel(width, height, Rgb(color)), ImageFormat::Png)
}

/// Decode a `data:image/png;base64,...` URL.
pub fn decode_data_url(url: &str) -> RgbImage {
    use base64::Engine;

    let payload = url
        .strip_prefix("data:image/png;base64,")
        .expect("not a PNG data URL");
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .expect("invalid base64");
    image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .expect("invalid PNG")
        .to_rgb8()
}
