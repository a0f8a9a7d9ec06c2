use std::path::Path;

use burn::prelude::*;
use image::{GrayImage, RgbImage, imageops::FilterType};

use crate::error::{AdversarialError, Result};

/// A `[batch, height, width, channels]` image or depth map.
pub type ImageTensor<B> = Tensor<B, 4>;

/// Converts packed RGB bytes into an image tensor.
///
/// The input slice must contain `width * height * 3` bytes in row-major order.
/// The output tensor is channel-last (`NHWC`) with a batch of one and values
/// scaled to `[0, 1]`.
pub fn rgb_to_image_tensor<B: Backend>(
    rgb: &[u8],
    width: usize,
    height: usize,
    device: &B::Device,
) -> Result<ImageTensor<B>> {
    let expected_len = width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or_else(|| {
            AdversarialError::InvalidImage(
                "image dimensions overflowed while preparing input".to_string(),
            )
        })?;

    if rgb.len() != expected_len {
        return Err(AdversarialError::InvalidImage(format!(
            "expected {expected_len} RGB bytes for {width}x{height}, got {}",
            rgb.len()
        )));
    }

    let data: Vec<f32> = rgb.iter().map(|&value| value as f32 / 255.0).collect();

    Ok(Tensor::from_data(
        TensorData::new(data, [1, height, width, 3]),
        device,
    ))
}

/// Opens an image file and converts it into an RGB image tensor.
///
/// When `size` is `Some((height, width))` the image is resized to exactly that
/// resolution first, so that images of different sizes produce comparable
/// tensors.
pub fn load_image_tensor<B: Backend>(
    path: &Path,
    size: Option<(usize, usize)>,
    device: &B::Device,
) -> Result<ImageTensor<B>> {
    let image = image::open(path).map_err(|source| AdversarialError::ImageIo {
        path: path.to_path_buf(),
        source,
    })?;

    let image = match size {
        Some((height, width)) if (image.height() as usize, image.width() as usize) != (height, width) => {
            let (height, width) = (to_u32(height)?, to_u32(width)?);
            image.resize_exact(width, height, FilterType::CatmullRom)
        }
        _ => image,
    };

    let rgb = image.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    log::debug!("loaded `{}` as {height}x{width}", path.display());

    rgb_to_image_tensor(rgb.as_raw(), width, height, device)
}

/// Fails unless `image` is a non-empty tensor with one or three channels.
pub fn validate_image_shape<B: Backend>(image: &ImageTensor<B>) -> Result<()> {
    let dims = image.dims();
    if dims.iter().any(|&dim| dim == 0) {
        return Err(AdversarialError::InvalidImage(format!(
            "image tensor has an empty dimension: {dims:?}"
        )));
    }
    if !matches!(dims[3], 1 | 3) {
        return Err(AdversarialError::InvalidImage(format!(
            "expected 1 or 3 channels, got {}",
            dims[3]
        )));
    }
    Ok(())
}

/// Reshapes a `[height, width, channels]` image to have three channels.
///
/// Three-channel images are returned unchanged; anything else keeps its first
/// channel and replicates it.
pub fn to_multichannel<B: Backend>(image: Tensor<B, 3>) -> Tensor<B, 3> {
    if image.dims()[2] == 3 {
        return image;
    }
    image.narrow(2, 0, 1).repeat_dim(2, 3)
}

/// Converts the first image of a batch into an 8-bit RGB image.
///
/// Values are clamped to `[0, 1]`; single-channel inputs are shown in gray.
pub fn image_tensor_to_rgb<B: Backend>(image: ImageTensor<B>) -> Result<RgbImage> {
    validate_image_shape(&image)?;
    let [_, height, width, channels] = image.dims();

    let image = to_multichannel(image.narrow(0, 0, 1).reshape([height, width, channels]));
    let values = image
        .clamp(0.0, 1.0)
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|err| AdversarialError::InvalidImage(format!("failed to read image tensor: {err:?}")))?;

    let pixels = values
        .into_iter()
        .map(|value| (value * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect();

    RgbImage::from_raw(to_u32(width)?, to_u32(height)?, pixels).ok_or_else(|| {
        AdversarialError::InvalidImage(format!("image tensor size mismatch {height}x{width}"))
    })
}

/// Converts channel 0 of the first depth map in a batch into a normalized
/// 8-bit grayscale image. Non-finite depths map to black.
pub fn depth_to_gray_image<B: Backend>(depth: ImageTensor<B>) -> Result<GrayImage> {
    let [batch, height, width, channels] = depth.dims();
    if batch == 0 || height == 0 || width == 0 || channels == 0 {
        return Err(AdversarialError::InvalidImage(format!(
            "depth tensor has an empty dimension: {:?}",
            depth.dims()
        )));
    }

    let values = depth
        .narrow(0, 0, 1)
        .narrow(3, 0, 1)
        .reshape([height * width])
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|err| AdversarialError::InvalidImage(format!("failed to read depth tensor values: {err:?}")))?;

    let (mut min_depth, mut max_depth) = (f32::INFINITY, f32::NEG_INFINITY);
    for &value in &values {
        if value.is_finite() {
            min_depth = min_depth.min(value);
            max_depth = max_depth.max(value);
        }
    }
    if !min_depth.is_finite() || !max_depth.is_finite() {
        min_depth = 0.0;
        max_depth = 1.0;
    }
    let range = (max_depth - min_depth).max(f32::EPSILON);
    let pixels: Vec<u8> = values
        .into_iter()
        .map(|value| {
            let normalized = if value.is_finite() {
                ((value - min_depth) / range).clamp(0.0, 1.0)
            } else {
                0.0
            };
            (normalized * 255.0).round().clamp(0.0, 255.0) as u8
        })
        .collect();

    GrayImage::from_raw(to_u32(width)?, to_u32(height)?, pixels).ok_or_else(|| {
        AdversarialError::InvalidImage(format!("depth tensor size mismatch {height}x{width}"))
    })
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        AdversarialError::InvalidImage(format!("dimension {value} exceeds supported image range"))
    })
}
