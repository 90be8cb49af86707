//! SCRFD face detector.
//!
//! The image is scaled to fit a square canvas (anchored top-left), run through
//! the network, and per-stride anchor outputs are decoded into boxes and five
//! landmarks. Overlapping boxes are removed with NMS; survivors come back in
//! descending score order.

use super::session::{build_session, input_name};
use super::{BoundingBox, ExecutionContext, Face};
use crate::config::DetectionConfig;
use crate::error::{Result, SwapError};
use crate::logger::log;
use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::time::Instant;

/// Raw candidate before NMS, in canvas coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub bbox: [f32; 4],
    pub score: f32,
    pub landmarks: [[f32; 2]; 5],
}

/// Output layout of an SCRFD export
#[derive(Debug, Clone, PartialEq)]
struct Layout {
    strides: &'static [u32],
    anchors_per_cell: usize,
}

impl Layout {
    /// Only exports with keypoint heads are usable for alignment
    fn from_output_count(count: usize) -> Option<Layout> {
        match count {
            9 => Some(Layout {
                strides: &[8, 16, 32],
                anchors_per_cell: 2,
            }),
            15 => Some(Layout {
                strides: &[8, 16, 32, 64, 128],
                anchors_per_cell: 1,
            }),
            _ => None,
        }
    }

    fn max_stride(&self) -> u32 {
        self.strides.iter().copied().max().unwrap_or(32)
    }
}

pub struct ScrfdDetector {
    session: Session,
    input_name: String,
    layout: Layout,
    config: DetectionConfig,
}

impl ScrfdDetector {
    pub fn new(
        model_path: &Path,
        context: ExecutionContext,
        threads: usize,
        config: DetectionConfig,
    ) -> Result<Self> {
        let session = build_session(model_path, context, threads)?;
        let input_name = input_name(&session, 0)?;
        let layout = Layout::from_output_count(session.outputs.len()).ok_or_else(|| {
            SwapError::Model(format!(
                "{}: unsupported detector with {} outputs (keypoint head required)",
                model_path.display(),
                session.outputs.len()
            ))
        })?;
        validate_size(config.size, layout.max_stride())?;

        Ok(Self {
            session,
            input_name,
            layout,
            config,
        })
    }

    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<Face>> {
        let start = Instant::now();
        let size = self.config.size;
        let (blob, scale) = preprocess(image, size);

        let input = Tensor::from_array(blob)?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input])?;

        let fmc = self.layout.strides.len();
        let mut candidates = Vec::new();
        for (idx, &stride) in self.layout.strides.iter().enumerate() {
            let (_, scores) = outputs[idx].try_extract_tensor::<f32>()?;
            let (_, boxes) = outputs[idx + fmc].try_extract_tensor::<f32>()?;
            let (_, kps) = outputs[idx + 2 * fmc].try_extract_tensor::<f32>()?;

            candidates.extend(decode_stride(
                scores,
                boxes,
                kps,
                stride,
                size,
                self.layout.anchors_per_cell,
                self.config.score_threshold,
            ));
        }

        let kept = nms(candidates, self.config.nms_threshold);
        let faces: Vec<Face> = kept
            .into_iter()
            .map(|c| rescale(c, scale, image.width(), image.height()))
            .collect();

        log::debug!(
            "Detected {} face(s) in {}x{} image in {:?}",
            faces.len(),
            image.width(),
            image.height(),
            start.elapsed()
        );
        Ok(faces)
    }
}

/// Check that a detection canvas of `size` pixels lays out whole anchor
/// grids for every stride up to `max_stride`.
pub fn validate_size(size: u32, max_stride: u32) -> Result<u32> {
    if size < max_stride || size % max_stride != 0 {
        return Err(SwapError::Model(format!(
            "detection size {} must be a positive multiple of {}",
            size, max_stride
        )));
    }
    Ok(size)
}

/// Scale factor and resized dimensions that fit `width x height` inside a
/// `size x size` canvas.
pub fn letterbox(width: u32, height: u32, size: u32) -> (f32, u32, u32) {
    let ratio = height as f32 / width as f32;
    let (new_w, new_h) = if ratio > 1.0 {
        (((size as f32 / ratio) as u32).max(1), size)
    } else {
        (size, ((size as f32 * ratio) as u32).max(1))
    };
    (new_h as f32 / height as f32, new_w, new_h)
}

/// NCHW float blob normalised to roughly [-1, 1]; returns the scale applied
fn preprocess(image: &RgbImage, size: u32) -> (Array4<f32>, f32) {
    let (scale, new_w, new_h) = letterbox(image.width(), image.height(), size);
    let resized = image::imageops::resize(image, new_w, new_h, FilterType::Triangle);

    let side = size as usize;
    // padding is black, i.e. (0 - 127.5) / 128
    let mut blob = Array4::<f32>::from_elem((1, 3, side, side), -127.5 / 128.0);
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            blob[[0, c, y as usize, x as usize]] = (pixel[c] as f32 - 127.5) / 128.0;
        }
    }
    (blob, scale)
}

/// Turn one stride's raw outputs into candidates above `threshold`.
///
/// Anchor `i` sits at cell `i / anchors_per_cell`, cells laid out row-major
/// over a `size / stride` grid. Box and keypoint outputs are distances in
/// stride units from the cell origin.
pub fn decode_stride(
    scores: &[f32],
    boxes: &[f32],
    kps: &[f32],
    stride: u32,
    size: u32,
    anchors_per_cell: usize,
    threshold: f32,
) -> Vec<Candidate> {
    let grid_w = (size / stride.max(1)) as usize;
    if grid_w == 0 {
        return Vec::new();
    }
    let stride = stride as f32;
    let count = scores
        .len()
        .min(boxes.len() / 4)
        .min(kps.len() / 10);

    let mut out = Vec::new();
    for i in 0..count {
        let score = scores[i];
        if score < threshold {
            continue;
        }
        let cell = i / anchors_per_cell.max(1);
        let cx = (cell % grid_w) as f32 * stride;
        let cy = (cell / grid_w) as f32 * stride;

        let d = &boxes[i * 4..i * 4 + 4];
        let bbox = [
            cx - d[0] * stride,
            cy - d[1] * stride,
            cx + d[2] * stride,
            cy + d[3] * stride,
        ];

        let k = &kps[i * 10..i * 10 + 10];
        let mut landmarks = [[0.0f32; 2]; 5];
        for (j, point) in landmarks.iter_mut().enumerate() {
            *point = [cx + k[j * 2] * stride, cy + k[j * 2 + 1] * stride];
        }

        out.push(Candidate {
            bbox,
            score,
            landmarks,
        });
    }
    out
}

fn area(b: &[f32; 4]) -> f32 {
    (b[2] - b[0] + 1.0).max(0.0) * (b[3] - b[1] + 1.0).max(0.0)
}

/// Intersection over union with the inclusive-pixel convention
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let w = (a[2].min(b[2]) - a[0].max(b[0]) + 1.0).max(0.0);
    let h = (a[3].min(b[3]) - a[1].max(b[1]) + 1.0).max(0.0);
    let inter = w * h;
    let union = area(a) + area(b) - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Greedy non-maximum suppression; result is sorted by descending score
pub fn nms(mut candidates: Vec<Candidate>, threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if kept
            .iter()
            .all(|k| iou(&k.bbox, &candidate.bbox) <= threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}

/// Map a canvas-space candidate back to original image coordinates
fn rescale(c: Candidate, scale: f32, width: u32, height: u32) -> Face {
    let (w, h) = (width as f32, height as f32);
    let [x1, y1, x2, y2] = c.bbox.map(|v| v / scale);
    Face {
        bbox: BoundingBox {
            x1: x1.clamp(0.0, w),
            y1: y1.clamp(0.0, h),
            x2: x2.clamp(0.0, w),
            y2: y2.clamp(0.0, h),
        },
        score: c.score,
        landmarks: c.landmarks.map(|[x, y]| [x / scale, y / scale]),
        embedding: None,
    }
}
