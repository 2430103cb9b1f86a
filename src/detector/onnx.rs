use super::LandmarkDetector;
use crate::config::DetectorConfig;
use crate::constants::NUM_HAND_LANDMARKS;
use crate::frame::Frame;
use crate::landmarks::{HandLandmarks, Landmark};
use crate::{Error, Result};
use image::imageops::{self, FilterType};
use ndarray::{Array4, CowArray};
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Values per landmark in the model output (x, y, z)
const LANDMARK_STRIDE: usize = 3;

/// Single-hand landmark model run with `ONNX` Runtime.
///
/// Expects a 21-point hand landmark network taking an NHWC RGB image in
/// [0, 1] and producing landmark coordinates in input pixels followed by a
/// hand presence score.
pub struct OnnxHandDetector {
    session: Session,
    input_size: u32,
    min_confidence: f32,
}

impl OnnxHandDetector {
    /// Load the model at `model_path`
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime environment cannot be created or the
    /// model cannot be loaded.
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32, min_confidence: f32) -> Result<Self> {
        log::info!(
            "Initializing OnnxHandDetector with model: {}",
            model_path.as_ref().display()
        );
        let environment = Arc::new(
            Environment::builder()
                .with_name("hand_landmarks")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        if session.outputs.len() < 2 {
            return Err(Error::ModelError(format!(
                "Expected landmark and presence outputs, model has {}",
                session.outputs.len()
            )));
        }

        Ok(Self {
            session,
            input_size,
            min_confidence,
        })
    }

    /// Load using detector configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded.
    pub fn from_config(config: &DetectorConfig) -> Result<Self> {
        Self::new(&config.model_path, config.input_size, config.min_hand_confidence)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn preprocess(&self, frame: &Frame) -> Result<Array4<f32>> {
        let size = self.input_size;
        let resized = imageops::resize(frame.image(), size, size, FilterType::Triangle);
        let data: Vec<f32> = resized.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect();

        let edge = size as usize;
        Array4::from_shape_vec((1, edge, edge, 3), data)
            .map_err(|e| Error::DetectionFailure(format!("Failed to create input tensor: {e}")))
    }

    fn forward(&self, input: Array4<f32>) -> Result<(Vec<f32>, f32)> {
        let cow_array = CowArray::from(input.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;

        let outputs = self.session.run(vec![input_tensor])?;
        if outputs.len() < 2 {
            return Err(Error::DetectionFailure("Model returned too few outputs".to_string()));
        }

        let marks_tensor = outputs[0].try_extract::<f32>()?;
        let marks_view = marks_tensor.view();
        let marks = marks_view
            .as_slice()
            .ok_or_else(|| Error::DetectionFailure("Failed to get landmark data".to_string()))?
            .to_vec();

        let score_tensor = outputs[1].try_extract::<f32>()?;
        let score = score_tensor
            .view()
            .iter()
            .next()
            .copied()
            .ok_or_else(|| Error::DetectionFailure("Empty presence output".to_string()))?;

        Ok((marks, presence_probability(score)))
    }

    #[allow(clippy::cast_precision_loss)]
    fn postprocess(&self, marks: &[f32]) -> Result<HandLandmarks> {
        if marks.len() < NUM_HAND_LANDMARKS * LANDMARK_STRIDE {
            return Err(Error::DetectionFailure(format!(
                "Expected {} landmark values, got {}",
                NUM_HAND_LANDMARKS * LANDMARK_STRIDE,
                marks.len()
            )));
        }

        // Coordinates are in input pixels; the input is the whole frame
        // stretched to a square, so dividing by the edge normalizes to the frame
        let scale = self.input_size as f32;
        let points = marks
            .chunks_exact(LANDMARK_STRIDE)
            .take(NUM_HAND_LANDMARKS)
            .map(|c| Landmark {
                x: c[0] / scale,
                y: c[1] / scale,
                z: c[2] / scale,
            })
            .collect();

        Ok(HandLandmarks::new(points))
    }
}

impl LandmarkDetector for OnnxHandDetector {
    fn detect(&self, frame: &Frame, _timestamp_ms: f64) -> Result<Option<HandLandmarks>> {
        let input = self.preprocess(frame)?;
        let (marks, presence) = self.forward(input)?;

        if presence < self.min_confidence {
            log::debug!("Hand presence {:.2} below threshold", presence);
            return Ok(None);
        }

        self.postprocess(&marks).map(Some)
    }
}

/// Some exports emit a raw logit for presence, others a probability
fn presence_probability(score: f32) -> f32 {
    if (0.0..=1.0).contains(&score) {
        score
    } else {
        1.0 / (1.0 + (-score).exp())
    }
}
