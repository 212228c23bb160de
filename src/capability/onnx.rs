//! ONNX-backed forgery classifier — behind the `onnx-classifier` feature.
//!
//! Loads a trained model from disk once at capability construction; `verify`
//! itself never touches the filesystem. Uses interior mutability (Mutex)
//! because `ort::Session::run` requires `&mut self` while `ForgeryClassifier`
//! exposes `&self` for shared usage across concurrent verifications.

use std::path::Path;
use std::sync::Mutex;

use image::imageops::FilterType;
use ort::session::Session;
use ort::value::TensorRef;
use tracing::info;

use super::{ClassifierError, ForgeryClassifier};
use crate::image::ImageBuffer;
use crate::types::ClassProbabilities;

/// Number of output classes: authentic, forged, tampered, screenshot.
const CLASS_COUNT: usize = 4;

pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_size: u32,
}

impl OnnxClassifier {
    /// Load the model from `model_path` (an `.onnx` file). `input_size` is
    /// the square input dimension the model was trained on.
    pub fn load(model_path: &Path, input_size: u32) -> Result<Self, ClassifierError> {
        if !model_path.exists() {
            return Err(ClassifierError::ModelNotFound(model_path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e: ort::Error| ClassifierError::ModelInit(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e: ort::Error| ClassifierError::ModelInit(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e: ort::Error| {
                ClassifierError::ModelInit(format!("ONNX load failed: {e}"))
            })?;

        info!("Forgery classifier loaded from {}", model_path.display());

        Ok(Self {
            session: Mutex::new(session),
            input_size,
        })
    }

    /// Resize to the model's input square and normalize to [0, 1] NHWC.
    fn to_input_tensor(&self, image: &ImageBuffer) -> ndarray::Array4<f32> {
        let size = self.input_size;
        let resized =
            image::imageops::resize(image.pixels(), size, size, FilterType::Triangle);

        let mut input =
            ndarray::Array4::<f32>::zeros((1, size as usize, size as usize, 3));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                input[[0, y as usize, x as usize, c]] = pixel.0[c] as f32 / 255.0;
            }
        }
        input
    }
}

impl ForgeryClassifier for OnnxClassifier {
    fn predict(&self, image: &ImageBuffer) -> Result<ClassProbabilities, ClassifierError> {
        let input = self.to_input_tensor(image);
        let tensor = TensorRef::from_array_view(&input)
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifierError::Inference("Session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| ClassifierError::Inference(format!("ONNX inference failed: {e}")))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("Output extraction: {e}")))?;

        let total: i64 = shape.iter().product();
        if total as usize != CLASS_COUNT {
            return Err(ClassifierError::Inference(format!(
                "Unexpected output shape: {shape:?}, expected {CLASS_COUNT} class probabilities"
            )));
        }

        Ok(ClassProbabilities {
            authentic: data[0].clamp(0.0, 1.0),
            forged: data[1].clamp(0.0, 1.0),
            tampered: data[2].clamp(0.0, 1.0),
            screenshot: data[3].clamp(0.0, 1.0),
        })
    }
}
