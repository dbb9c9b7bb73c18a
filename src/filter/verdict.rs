// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classification verdict types

use serde::Serialize;
use std::fmt;

/// Strength of the QR evidence found in an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QrSignal {
    None,
    /// Soft flag, resolved by the decision cascade
    Prominent,
    /// Decoded QR covering most of the image
    Dominant,
}

/// Output of the QR sub-detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QrObservation {
    pub signal: QrSignal,
    /// QR quadrilateral area divided by image area, when a code was located
    pub area_ratio: Option<f64>,
    /// Whether a non-empty payload was decoded
    pub decoded: bool,
}

impl QrObservation {
    pub fn none() -> Self {
        Self {
            signal: QrSignal::None,
            area_ratio: None,
            decoded: false,
        }
    }

    /// True for both prominent and dominant signals
    pub fn is_flagged(&self) -> bool {
        self.signal != QrSignal::None
    }
}

/// Why an image was kept or discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictReason {
    ModelUnavailable,
    DominantQr,
    HighTextDensity,
    QrDominatedLowText,
    CardShapedModerateText,
    AdequateText,
    SparseTextWithLineDetail,
    LineRichNoText,
    DegenerateStrip,
    TooSparse,
}

impl VerdictReason {
    /// Whether this reason keeps the image
    pub fn keeps(&self) -> bool {
        matches!(
            self,
            Self::ModelUnavailable
                | Self::HighTextDensity
                | Self::AdequateText
                | Self::SparseTextWithLineDetail
                | Self::LineRichNoText
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModelUnavailable => "model unavailable",
            Self::DominantQr => "dominant QR code",
            Self::HighTextDensity => "high text density",
            Self::QrDominatedLowText => "QR-dominated, low text",
            Self::CardShapedModerateText => "card/QR-shaped, moderate text",
            Self::AdequateText => "adequate text",
            Self::SparseTextWithLineDetail => "sparse text with line detail",
            Self::LineRichNoText => "line-rich, no text",
            Self::DegenerateStrip => "degenerate strip",
            Self::TooSparse => "too sparse",
        }
    }
}

impl fmt::Display for VerdictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurements behind a verdict. Fields a branch never computed stay `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Evidence {
    pub text_box_count: Option<usize>,
    pub aspect_ratio: f64,
    pub edge_density: Option<f64>,
    pub qr_area_ratio: Option<f64>,
}

/// Keep/discard decision for one image
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationVerdict {
    pub keep: bool,
    pub reason: VerdictReason,
    pub evidence: Evidence,
}

impl ClassificationVerdict {
    pub fn new(reason: VerdictReason, evidence: Evidence) -> Self {
        Self {
            keep: reason.keeps(),
            reason,
            evidence,
        }
    }
}

impl fmt::Display for ClassificationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (aspect {:.2}", self.reason, self.evidence.aspect_ratio)?;
        if let Some(count) = self.evidence.text_box_count {
            write!(f, ", text boxes {}", count)?;
        }
        if let Some(density) = self.evidence.edge_density {
            write!(f, ", edge density {:.3}", density)?;
        }
        if let Some(ratio) = self.evidence.qr_area_ratio {
            write!(f, ", QR area {:.1}%", ratio * 100.0)?;
        }
        f.write_str(")")
    }
}
