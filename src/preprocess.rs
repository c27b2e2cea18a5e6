// Image decoding and ImageNet-style normalization
use candle::{DType, Device, Tensor};
use image::imageops::FilterType;

use crate::error::ClassifyError;

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decodes `bytes` and turns them into a `(1, 3, height, width)` f32 tensor.
///
/// The image is stretched to the target size with bicubic filtering, kept in
/// RGB order, scaled to `[0, 1]` and normalized per channel with the ImageNet
/// mean/std. The result is planar: all red values, then green, then blue.
pub fn preprocess(bytes: &[u8], height: usize, width: usize) -> Result<Tensor, ClassifyError> {
    if bytes.is_empty() {
        return Err(ClassifyError::Decode("empty image buffer".into()));
    }
    let img = image::load_from_memory(bytes).map_err(|e| ClassifyError::Decode(e.to_string()))?;

    // the decoder yields RGB already, so no channel swap is needed
    let rgb = img
        .resize_exact(width as u32, height as u32, FilterType::CatmullRom)
        .to_rgb8();
    let pixels = rgb.into_raw();

    let device = Device::Cpu;
    let data = Tensor::from_vec(pixels, (height, width, 3), &device)?.permute((2, 0, 1))?;
    let mean = Tensor::new(&IMAGENET_MEAN, &device)?.reshape((3, 1, 1))?;
    let std = Tensor::new(&IMAGENET_STD, &device)?.reshape((3, 1, 1))?;
    let normalized = (data.to_dtype(DType::F32)? / 255.)?
        .broadcast_sub(&mean)?
        .broadcast_div(&std)?;
    Ok(normalized.unsqueeze(0)?)
}
