//! InSwapper face swap model.
//!
//! The target face is aligned to a 128x128 crop, the source identity is
//! projected through the model's embedding map, and the generated crop is
//! warped back into the full target with a feathered mask.

use super::align::{self, Similarity};
use super::onnx_graph;
use super::session::{build_session, input_name};
use super::{ExecutionContext, Face, FaceSwapper};
use crate::constants::{EMBEDDING_DIM, SWAPPER_INPUT_SIZE};
use crate::error::{Result, SwapError};
use crate::logger::log;
use bytes::Bytes;
use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{warp_into, Interpolation};
use imageproc::morphology::erode;
use ndarray::{Array2, Array4, ArrayView1, Axis};
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::time::Instant;

pub struct InSwapper {
    session: Session,
    target_input: String,
    source_input: String,
    /// `EMBEDDING_DIM x EMBEDDING_DIM` identity projection
    emap: Array2<f32>,
}

impl InSwapper {
    pub fn new(model_path: &Path, context: ExecutionContext, threads: usize) -> Result<Self> {
        let emap = load_emap(model_path)?;
        let session = build_session(model_path, context, threads)?;
        let target_input = input_name(&session, 0)?;
        let source_input = input_name(&session, 1)?;

        Ok(Self {
            session,
            target_input,
            source_input,
            emap,
        })
    }

    /// Model-space identity vector for a recognizer embedding
    fn latent(&self, embedding: &[f32]) -> Result<Array2<f32>> {
        if embedding.len() != EMBEDDING_DIM {
            return Err(SwapError::Model(format!(
                "source embedding has {} values, expected {}",
                embedding.len(),
                EMBEDDING_DIM
            )));
        }
        Ok(project_identity(embedding, &self.emap))
    }
}

impl FaceSwapper for InSwapper {
    fn swap(
        &mut self,
        target: &RgbImage,
        target_face: &Face,
        source_face: &Face,
    ) -> Result<RgbImage> {
        let start = Instant::now();
        let embedding = source_face
            .embedding
            .as_deref()
            .ok_or_else(|| SwapError::Model("source face has no embedding".to_string()))?;
        let latent = self.latent(embedding)?;

        let (crop, transform) = align::crop(target, &target_face.landmarks, SWAPPER_INPUT_SIZE)
            .ok_or_else(|| SwapError::Model("degenerate target landmarks".to_string()))?;

        let target_tensor = Tensor::from_array(to_unit_blob(&crop))?;
        let source_tensor = Tensor::from_array(latent)?;
        let outputs = self.session.run(ort::inputs![
            self.target_input.as_str() => target_tensor,
            self.source_input.as_str() => source_tensor
        ])?;
        let (_, data) = outputs[0].try_extract_tensor::<f32>()?;
        let swapped = from_unit_blob(data, SWAPPER_INPUT_SIZE)?;

        let result = paste_back(target, &swapped, &transform)?;
        log::debug!("Swap inference and paste-back took {:?}", start.elapsed());
        Ok(result)
    }
}

fn load_emap(model_path: &Path) -> Result<Array2<f32>> {
    let bytes = Bytes::from(std::fs::read(model_path)?);
    let init = onnx_graph::last_initializer(bytes)?;
    if init.dims != [EMBEDDING_DIM, EMBEDDING_DIM] {
        return Err(SwapError::Model(format!(
            "{}: embedding map '{}' has shape {:?}",
            model_path.display(),
            init.name,
            init.dims
        )));
    }
    Ok(Array2::from_shape_vec((EMBEDDING_DIM, EMBEDDING_DIM), init.data)?)
}

/// `normalize(embedding · emap)` as a `1 x N` row
pub fn project_identity(embedding: &[f32], emap: &Array2<f32>) -> Array2<f32> {
    let mut latent = ArrayView1::from(embedding).dot(emap);
    let norm = latent.dot(&latent).sqrt();
    if norm > f32::EPSILON {
        latent /= norm;
    }
    latent.insert_axis(Axis(0))
}

/// NCHW blob scaled to [0, 1]
fn to_unit_blob(crop: &RgbImage) -> Array4<f32> {
    let (w, h) = crop.dimensions();
    Array4::from_shape_fn((1, 3, h as usize, w as usize), |(_, c, y, x)| {
        crop.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    })
}

/// Inverse of `to_unit_blob` for a `1 x 3 x size x size` output
fn from_unit_blob(data: &[f32], size: u32) -> Result<RgbImage> {
    let plane = (size * size) as usize;
    if data.len() != 3 * plane {
        return Err(SwapError::Model(format!(
            "swap model returned {} values, expected {}",
            data.len(),
            3 * plane
        )));
    }
    Ok(RgbImage::from_fn(size, size, |x, y| {
        let i = (y * size + x) as usize;
        let channel = |c: usize| (data[c * plane + i].clamp(0.0, 1.0) * 255.0).round() as u8;
        image::Rgb([channel(0), channel(1), channel(2)])
    }))
}

/// Erosion and blur radii for a pasted region `side` pixels across
pub fn feather_radii(side: f32) -> (u8, f32) {
    let erode_k = (side / 10.0).max(10.0);
    let blur_k = (side / 20.0).max(5.0);
    ((erode_k / 2.0).min(u8::MAX as f32) as u8, blur_k / 2.0)
}

/// Blend the generated crop back into `target` through the inverse of the
/// alignment transform.
pub fn paste_back(target: &RgbImage, crop: &RgbImage, transform: &Similarity) -> Result<RgbImage> {
    let inverse = transform
        .inverse()
        .ok_or_else(|| SwapError::Model("alignment transform is not invertible".to_string()))?;
    let (width, height) = target.dimensions();

    let warped = align::warp(crop, &inverse, width, height)
        .ok_or_else(|| SwapError::Model("invalid paste-back projection".to_string()))?;

    let projection = inverse
        .projection()
        .ok_or_else(|| SwapError::Model("invalid paste-back projection".to_string()))?;
    let white = GrayImage::from_pixel(crop.width(), crop.height(), Luma([255]));
    let mut mask = GrayImage::new(width, height);
    warp_into(&white, &projection, Interpolation::Bilinear, Luma([0]), &mut mask);

    // crop side as it appears in the target
    let side = crop.width() as f32 * inverse.scale();
    let (erode_radius, sigma) = feather_radii(side);
    let mask = gaussian_blur_f32(&erode(&mask, Norm::LInf, erode_radius), sigma);

    let mut out = target.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let alpha = mask.get_pixel(x, y)[0] as f32 / 255.0;
        if alpha <= 0.0 {
            continue;
        }
        let fake = warped.get_pixel(x, y);
        for c in 0..3 {
            let blended = alpha * fake[c] as f32 + (1.0 - alpha) * pixel[c] as f32;
            pixel[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(out)
}
