//! Local background removal with an ISNet-style segmentation model.

use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::imageops::FilterType;
use image::{GrayImage, ImageFormat, Luma, RgbaImage};
use ndarray::{Array4, Ix4};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Value;
use tracing::{debug, instrument};

use super::BackgroundRemover;
use crate::error::ProcessingError;

const INPUT_SIZE: u32 = 1024;
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [1.0, 1.0, 1.0];

pub struct OnnxRemover {
    session: Arc<Mutex<Session>>,
}

impl OnnxRemover {
    pub fn from_file(model_path: &Path) -> Result<Self, ProcessingError> {
        let threads = std::thread::available_parallelism()
            .map(std::num::NonZero::get)
            .unwrap_or(1);

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(threads))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| {
                ProcessingError::Removal(format!(
                    "Failed to load segmentation model {}: {e}",
                    model_path.display()
                ))
            })?;

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
        })
    }
}

fn to_tensor(image: &RgbaImage) -> Array4<f32> {
    let resized = image::imageops::resize(image, INPUT_SIZE, INPUT_SIZE, FilterType::Lanczos3);
    let mut tensor = Array4::zeros((1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            tensor[[0, c, y, x]] = (f32::from(pixel[c]) / 255.0 - MEAN[c]) / STD[c];
        }
    }
    tensor
}

/// Min-max normalize the first prediction channel into an 8-bit mask.
fn to_mask(prediction: &ndarray::ArrayView4<'_, f32>) -> GrayImage {
    let (_, _, height, width) = prediction.dim();
    let plane = prediction.slice(ndarray::s![0, 0, .., ..]);
    let (min, max) = plane
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = (max - min).max(f32::EPSILON);

    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        let v = (plane[[y as usize, x as usize]] - min) / range;
        Luma([(v * 255.0).round().clamp(0.0, 255.0) as u8])
    })
}

fn segment(session: &Mutex<Session>, data: &[u8]) -> Result<Vec<u8>, ProcessingError> {
    let image = image::load_from_memory(data)
        .map_err(|e| ProcessingError::Decode(e.to_string()))?
        .to_rgba8();
    let (width, height) = image.dimensions();

    let input = Value::from_array(to_tensor(&image))
        .map_err(|e| ProcessingError::Removal(format!("Failed to build input tensor: {e}")))?;

    let mask = {
        let mut session = session
            .lock()
            .map_err(|_| ProcessingError::Removal("Segmentation session poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| ProcessingError::Removal(format!("Inference failed: {e}")))?;

        let first = outputs
            .keys()
            .next()
            .map(str::to_string)
            .ok_or_else(|| ProcessingError::Removal("Model produced no outputs".into()))?;
        let prediction = outputs
            .get(&first)
            .ok_or_else(|| ProcessingError::Removal("Model output missing".into()))?
            .try_extract_array::<f32>()
            .map_err(|e| ProcessingError::Removal(format!("Unexpected output tensor: {e}")))?;
        let prediction = prediction
            .into_dimensionality::<Ix4>()
            .map_err(|e| ProcessingError::Removal(format!("Unexpected output shape: {e}")))?;
        to_mask(&prediction)
    };

    let mask = image::imageops::resize(&mask, width, height, FilterType::Triangle);
    let mut cutout = image;
    for (pixel, alpha) in cutout.pixels_mut().zip(mask.pixels()) {
        pixel[3] = alpha[0];
    }

    let mut buf = Cursor::new(Vec::new());
    cutout
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ProcessingError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}

#[async_trait]
impl BackgroundRemover for OnnxRemover {
    #[instrument(skip(self, image), fields(size = image.len()))]
    async fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>, ProcessingError> {
        let session = Arc::clone(&self.session);
        let data = image.to_vec();
        let out = tokio::task::spawn_blocking(move || segment(&session, &data)).await??;
        debug!(output_size = out.len(), "Background removed");
        Ok(out)
    }
}
