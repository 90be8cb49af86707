//! Five-point face alignment.
//!
//! A similarity transform (rotation, uniform scale, translation) is fitted
//! from detected landmarks to the ArcFace reference layout and used to cut
//! square crops out of the full image, and inverted to paste results back.

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

/// Landmark positions of an aligned 112x112 ArcFace crop
pub const ARCFACE_TEMPLATE: [[f32; 2]; 5] = [
    [38.2946, 51.6963],
    [73.5318, 51.5014],
    [56.0252, 71.7366],
    [41.5493, 92.3655],
    [70.7299, 92.2041],
];

/// Reference landmarks for a `size x size` crop.
///
/// Multiples of 112 scale the ArcFace layout directly. Other sizes treat it
/// as centred in a 128 canvas: scale by `size / 128` and shift right by
/// `8 * size / 128`.
pub fn template_for(size: u32) -> [[f32; 2]; 5] {
    let (ratio, shift) = if size % 112 == 0 {
        (size as f32 / 112.0, 0.0)
    } else {
        let ratio = size as f32 / 128.0;
        (ratio, 8.0 * ratio)
    };
    ARCFACE_TEMPLATE.map(|[x, y]| [x * ratio + shift, y * ratio])
}

/// Maps `(x, y)` to `(a*x - b*y + tx, b*x + a*y + ty)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    pub a: f32,
    pub b: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Similarity {
    pub const IDENTITY: Similarity = Similarity {
        a: 1.0,
        b: 0.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Least-squares fit mapping `src` points onto `dst` points.
    ///
    /// Returns `None` when the source points are all identical.
    pub fn estimate(src: &[[f32; 2]], dst: &[[f32; 2]]) -> Option<Similarity> {
        let n = src.len().min(dst.len());
        if n == 0 {
            return None;
        }
        let nf = n as f64;
        let (mut sx, mut sy, mut dx, mut dy) = (0.0f64, 0.0, 0.0, 0.0);
        for i in 0..n {
            sx += src[i][0] as f64;
            sy += src[i][1] as f64;
            dx += dst[i][0] as f64;
            dy += dst[i][1] as f64;
        }
        let (sx, sy, dx, dy) = (sx / nf, sy / nf, dx / nf, dy / nf);

        let (mut num_a, mut num_b, mut denom) = (0.0f64, 0.0, 0.0);
        for i in 0..n {
            let (x, y) = (src[i][0] as f64 - sx, src[i][1] as f64 - sy);
            let (u, v) = (dst[i][0] as f64 - dx, dst[i][1] as f64 - dy);
            num_a += x * u + y * v;
            num_b += x * v - y * u;
            denom += x * x + y * y;
        }
        if denom <= f64::EPSILON {
            return None;
        }

        let a = num_a / denom;
        let b = num_b / denom;
        Some(Similarity {
            a: a as f32,
            b: b as f32,
            tx: (dx - (a * sx - b * sy)) as f32,
            ty: (dy - (b * sx + a * sy)) as f32,
        })
    }

    /// Transform mapping `landmarks` onto the reference layout of a
    /// `size x size` crop.
    pub fn to_template(landmarks: &[[f32; 2]; 5], size: u32) -> Option<Similarity> {
        Similarity::estimate(landmarks, &template_for(size))
    }

    pub fn apply(&self, [x, y]: [f32; 2]) -> [f32; 2] {
        [
            self.a * x - self.b * y + self.tx,
            self.b * x + self.a * y + self.ty,
        ]
    }

    /// Uniform scale factor
    pub fn scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    pub fn inverse(&self) -> Option<Similarity> {
        let det = self.a * self.a + self.b * self.b;
        if det <= f32::EPSILON {
            return None;
        }
        let a = self.a / det;
        let b = -self.b / det;
        Some(Similarity {
            a,
            b,
            tx: -(a * self.tx - b * self.ty),
            ty: -(b * self.tx + a * self.ty),
        })
    }

    pub(crate) fn projection(&self) -> Option<Projection> {
        Projection::from_matrix([
            self.a, -self.b, self.tx, //
            self.b, self.a, self.ty, //
            0.0, 0.0, 1.0,
        ])
    }
}

/// Resample `image` through `transform` into a new `width x height` image.
///
/// `transform` maps source coordinates to output coordinates; pixels with no
/// source are black.
pub fn warp(image: &RgbImage, transform: &Similarity, width: u32, height: u32) -> Option<RgbImage> {
    let projection = transform.projection()?;
    let mut out = RgbImage::new(width, height);
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut out,
    );
    Some(out)
}

/// Cut the aligned `size x size` crop for `landmarks` out of `image`
pub fn crop(
    image: &RgbImage,
    landmarks: &[[f32; 2]; 5],
    size: u32,
) -> Option<(RgbImage, Similarity)> {
    let transform = Similarity::to_template(landmarks, size)?;
    let crop = warp(image, &transform, size, size)?;
    Some((crop, transform))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 2], b: [f32; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-3 && (a[1] - b[1]).abs() < 1e-3
    }

    #[test]
    fn test_identity_fit() {
        let t = Similarity::estimate(&ARCFACE_TEMPLATE, &ARCFACE_TEMPLATE).unwrap();
        assert!((t.a - 1.0).abs() < 1e-5);
        assert!(t.b.abs() < 1e-5);
        assert!(t.tx.abs() < 1e-3 && t.ty.abs() < 1e-3);
    }

    #[test]
    fn test_recovers_known_transform() {
        let truth = Similarity {
            a: 1.8,
            b: 0.6,
            tx: 120.0,
            ty: -35.0,
        };
        let moved = ARCFACE_TEMPLATE.map(|p| truth.apply(p));
        let fitted = Similarity::estimate(&ARCFACE_TEMPLATE, &moved).unwrap();

        for p in ARCFACE_TEMPLATE {
            assert!(close(fitted.apply(p), truth.apply(p)));
        }
    }

    #[test]
    fn test_inverse_round_trips_points() {
        let t = Similarity {
            a: 0.7,
            b: -0.3,
            tx: 12.0,
            ty: 40.0,
        };
        let inv = t.inverse().unwrap();
        for p in [[0.0, 0.0], [10.0, -4.0], [300.0, 123.0]] {
            assert!(close(inv.apply(t.apply(p)), p));
        }
    }

    #[test]
    fn test_degenerate_points() {
        let same = [[5.0, 5.0]; 5];
        assert!(Similarity::estimate(&same, &ARCFACE_TEMPLATE).is_none());
        assert!(Similarity {
            a: 0.0,
            b: 0.0,
            tx: 1.0,
            ty: 1.0
        }
        .inverse()
        .is_none());
    }

    #[test]
    fn test_template_scales_with_crop_size() {
        let t = Similarity::to_template(&ARCFACE_TEMPLATE, 224).unwrap();
        assert!((t.scale() - 2.0).abs() < 1e-4);
        assert_eq!(template_for(112), ARCFACE_TEMPLATE);
    }

    #[test]
    fn test_swap_crop_template_is_shifted_not_scaled() {
        let template = template_for(128);
        for (point, reference) in template.iter().zip(ARCFACE_TEMPLATE.iter()) {
            assert!(close(*point, [reference[0] + 8.0, reference[1]]));
        }

        let t = Similarity::to_template(&ARCFACE_TEMPLATE, 128).unwrap();
        assert!((t.scale() - 1.0).abs() < 1e-4);
        assert!(close(t.apply(ARCFACE_TEMPLATE[0]), [46.2946, 51.6963]));

        let half = template_for(64);
        assert!(close(half[0], [38.2946 * 0.5 + 4.0, 51.6963 * 0.5]));
    }

    #[test]
    fn test_identity_warp_copies_pixels() {
        let image = RgbImage::from_pixel(8, 8, Rgb([200, 100, 50]));
        let out = warp(&image, &Similarity::IDENTITY, 8, 8).unwrap();
        assert_eq!(out.get_pixel(4, 4), &Rgb([200, 100, 50]));

        let shifted = Similarity {
            tx: 100.0,
            ty: 100.0,
            ..Similarity::IDENTITY
        };
        let out = warp(&image, &shifted, 8, 8).unwrap();
        assert_eq!(out.get_pixel(4, 4), &Rgb([0, 0, 0]));
    }
}
