// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! EAST scene-text detector session

use anyhow::{bail, Context, Result};
use image::RgbImage;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use super::decode::{decode_predictions, is_geometry_shape, non_max_suppression, TextBox};
use super::preprocessing::preprocess_for_detection;
use crate::filter::config::{FilterThresholds, InputLayout};

/// Loaded EAST model, shared by all classifications
///
/// Inference is serialized through the session mutex.
pub struct EastTextDetector {
    session: Mutex<Session>,
    input_name: String,
    output_names: [String; 2],
    layout: InputLayout,
}

impl std::fmt::Debug for EastTextDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EastTextDetector")
            .field("input_name", &self.input_name)
            .field("output_names", &self.output_names)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl EastTextDetector {
    /// Load the detector from an ONNX file
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    /// - Model exposes fewer than two outputs (scores and geometry)
    pub fn load<P: AsRef<Path>>(model_path: P, layout: InputLayout) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            bail!("EAST model not found: {}", model_path.display());
        }

        info!("Loading EAST text detector from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load EAST model from {}", model_path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .context("EAST model has no inputs")?;

        if session.outputs.len() < 2 {
            bail!(
                "EAST model must expose score and geometry outputs, found {}",
                session.outputs.len()
            );
        }
        let output_names = [
            session.outputs[0].name.clone(),
            session.outputs[1].name.clone(),
        ];

        debug!(
            input = %input_name,
            outputs = ?output_names,
            ?layout,
            "EAST model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_names,
            layout,
        })
    }

    pub fn layout(&self) -> InputLayout {
        self.layout
    }

    /// Detect text regions, returning boxes that survive suppression
    pub fn detect(&self, image: &RgbImage, thresholds: &FilterThresholds) -> Result<Vec<TextBox>> {
        let input = preprocess_for_detection(image, thresholds.east_input_size, self.layout);
        let input_value = Value::from_array(input).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("EAST session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("EAST inference failed")?;

        let first = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract first output tensor")?;
        let second = outputs[1]
            .try_extract_array::<f32>()
            .context("Failed to extract second output tensor")?;

        let (scores, geometry) = if is_geometry_shape(first.shape()) {
            (second, first)
        } else {
            (first, second)
        };

        let candidates = decode_predictions(scores.view(), geometry.view(), thresholds.text_confidence)?;
        let candidate_count = candidates.len();
        let boxes = non_max_suppression(candidates, thresholds.nms_overlap);

        debug!(candidates = candidate_count, kept = boxes.len(), "EAST decode complete");
        Ok(boxes)
    }

    /// Number of text regions after suppression
    pub fn count_text_boxes(&self, image: &RgbImage, thresholds: &FilterThresholds) -> Result<usize> {
        self.detect(image, thresholds).map(|boxes| boxes.len())
    }
}
