use bytes::{Bytes, BytesMut};
use image::imageops::FilterType;
use reqwest::Client;
use thiserror::Error;

pub const IMAGE_DIMENSIONS: (u32, u32, u32) = (224, 224, 3);

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to fetch image: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image is larger than {limit} bytes")]
    TooLarge { limit: usize },
}

/// A single-image batch in NHWC layout with values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub dims: [u64; 4],
    pub data: Vec<f32>,
}

/// Downloads at most `limit_bytes`; a larger body is rejected before it is
/// fully read.
pub async fn fetch_image(
    client: &Client,
    url: &str,
    limit_bytes: usize,
) -> Result<Bytes, ImageError> {
    let mut response = client.get(url).send().await?.error_for_status()?;

    let too_large = ImageError::TooLarge { limit: limit_bytes };
    if response
        .content_length()
        .is_some_and(|length| length > limit_bytes as u64)
    {
        return Err(too_large);
    }

    let mut body = BytesMut::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit_bytes {
            return Err(too_large);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

pub fn preprocess_image(image_data: &[u8]) -> Result<ImageTensor, ImageError> {
    let (width, height, channels) = IMAGE_DIMENSIONS;

    let img = image::load_from_memory(image_data)?;
    // to_rgb8 drops alpha and expands grayscale
    let rgb = img.resize_exact(width, height, FilterType::Triangle).to_rgb8();

    let mut data = Vec::with_capacity((width * height * channels) as usize);
    for pixel in rgb.pixels() {
        data.extend(pixel.0.iter().map(|&channel| channel as f32 / 255.0));
    }

    Ok(ImageTensor {
        dims: [1, height as u64, width as u64, channels as u64],
        data,
    })
}
