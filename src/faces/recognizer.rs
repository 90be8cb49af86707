//! ArcFace identity embeddings.

use super::align;
use super::session::{build_session, input_name};
use super::{l2_normalize, ExecutionContext, Face};
use crate::constants::{EMBEDDING_DIM, RECOGNIZER_INPUT_SIZE};
use crate::error::{Result, SwapError};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

pub struct ArcFaceRecognizer {
    session: Session,
    input_name: String,
}

impl ArcFaceRecognizer {
    pub fn new(model_path: &Path, context: ExecutionContext, threads: usize) -> Result<Self> {
        let session = build_session(model_path, context, threads)?;
        let input_name = input_name(&session, 0)?;
        Ok(Self {
            session,
            input_name,
        })
    }

    /// Unit-length embedding of the face at `face.landmarks`
    pub fn embed(&mut self, image: &RgbImage, face: &Face) -> Result<Vec<f32>> {
        let (crop, _) = align::crop(image, &face.landmarks, RECOGNIZER_INPUT_SIZE)
            .ok_or_else(|| SwapError::Model("degenerate face landmarks".to_string()))?;

        let input = Tensor::from_array(to_blob(&crop))?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input])?;
        let (_, data) = outputs[0].try_extract_tensor::<f32>()?;

        if data.len() != EMBEDDING_DIM {
            return Err(SwapError::Model(format!(
                "recognizer returned {} values, expected {}",
                data.len(),
                EMBEDDING_DIM
            )));
        }
        let mut embedding = data.to_vec();
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

/// NCHW blob with `(p - 127.5) / 127.5` normalisation
fn to_blob(crop: &RgbImage) -> Array4<f32> {
    let (w, h) = crop.dimensions();
    Array4::from_shape_fn((1, 3, h as usize, w as usize), |(_, c, y, x)| {
        (crop.get_pixel(x as u32, y as u32)[c] as f32 - 127.5) / 127.5
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_blob_range() {
        let mut crop = RgbImage::from_pixel(4, 2, Rgb([0, 255, 128]));
        crop.put_pixel(3, 1, Rgb([255, 0, 0]));
        let blob = to_blob(&crop);

        assert_eq!(blob.shape(), &[1, 3, 2, 4]);
        assert_eq!(blob[[0, 0, 0, 0]], -1.0);
        assert_eq!(blob[[0, 1, 0, 0]], 1.0);
        assert_eq!(blob[[0, 0, 1, 3]], 1.0);
    }
}
