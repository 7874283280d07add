use std::path::{Path, PathBuf};

use thiserror::Error;

/// Pixel dimensions of an image asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    /// Height over width. Zero-width images report a square aspect.
    pub fn aspect(&self) -> f32 {
        if self.width == 0 {
            return 1.0;
        }
        self.height as f32 / self.width as f32
    }
}

/// Failure resolving an image asset.
#[derive(Debug, Error)]
pub enum AssetError {
    /// No file exists at the resolved path.
    #[error("image not found: {path}")]
    Missing { path: PathBuf },

    /// The file exists but is not a decodable image.
    #[error("image {path} is unreadable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The image header declares a zero-sized image.
    #[error("image {path} has invalid dimensions {width}x{height}")]
    InvalidDimensions {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

/// Image metadata source consulted before placement.
pub trait AssetLoader: Send + Sync {
    /// Read the dimensions of the image at `path`.
    fn probe(&self, path: &Path) -> Result<ImageInfo, AssetError>;
}

/// Reads image headers from the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsAssetLoader;

impl AssetLoader for FsAssetLoader {
    fn probe(&self, path: &Path) -> Result<ImageInfo, AssetError> {
        if !path.is_file() {
            return Err(AssetError::Missing {
                path: path.to_path_buf(),
            });
        }
        let (width, height) =
            image::image_dimensions(path).map_err(|source| AssetError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;
        if width == 0 || height == 0 {
            return Err(AssetError::InvalidDimensions {
                path: path.to_path_buf(),
                width,
                height,
            });
        }
        Ok(ImageInfo { width, height })
    }
}

/// Resolve a document-relative image path against `base_dir`.
pub fn resolve_asset_path(base_dir: Option<&Path>, path: &Path) -> PathBuf {
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

/// An image sized for placement in the content box.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedImage {
    pub path: PathBuf,
    pub info: ImageInfo,
    pub width: f32,
    pub height: f32,
    /// Shrunk below the preferred width to fit the available height.
    pub scaled: bool,
}

/// Size an image at `preferred_width` keeping its aspect ratio, shrinking it
/// to fit `max_height`.
pub fn fit_image(info: ImageInfo, preferred_width: f32, max_height: f32) -> (f32, f32, bool) {
    let width = preferred_width.max(1.0);
    let height = width * info.aspect();
    if height <= max_height || max_height <= 0.0 {
        return (width, height, false);
    }
    let scale = max_height / height;
    (width * scale, max_height, true)
}

/// Probe and size one image.
pub fn prepare_image(
    loader: &dyn AssetLoader,
    path: PathBuf,
    preferred_width: f32,
    max_height: f32,
) -> Result<PlacedImage, AssetError> {
    let info = loader.probe(&path)?;
    if info.width == 0 || info.height == 0 {
        return Err(AssetError::InvalidDimensions {
            path,
            width: info.width,
            height: info.height,
        });
    }
    let (width, height, scaled) = fit_image(info, preferred_width, max_height);
    Ok(PlacedImage {
        path,
        info,
        width,
        height,
        scaled,
    })
}
