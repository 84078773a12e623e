//! Image directories on disk.
//!
//! The session never decodes images itself; it hands out load tickets. The
//! CLI and the replay driver fulfil those tickets through an
//! [`ImageSource`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::BoxlabelError;
use crate::ir::ImageSize;

pub const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff"];

/// Answers "how big is this image" for load tickets.
pub trait ImageSource {
    fn dimensions(&mut self, image: &str) -> Result<ImageSize, BoxlabelError>;
}

/// Images stored as files directly inside one directory.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
    cache: HashMap<String, ImageSize>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, image: &str) -> PathBuf {
        self.root.join(image)
    }

    /// File names of the images in the directory, sorted.
    pub fn list(&self) -> Result<Vec<String>, BoxlabelError> {
        list_images(&self.root)
    }
}

impl ImageSource for DirectorySource {
    fn dimensions(&mut self, image: &str) -> Result<ImageSize, BoxlabelError> {
        if let Some(size) = self.cache.get(image) {
            return Ok(*size);
        }
        let size = read_image_dimensions(&self.path_of(image))?;
        self.cache.insert(image.to_string(), size);
        Ok(size)
    }
}

impl ImageSource for HashMap<String, ImageSize> {
    fn dimensions(&mut self, image: &str) -> Result<ImageSize, BoxlabelError> {
        self.get(image)
            .copied()
            .ok_or_else(|| BoxlabelError::DecodeFailure {
                path: PathBuf::from(image),
                message: "image not available".to_string(),
            })
    }
}

/// Image file names directly under `dir`, sorted by name.
pub fn list_images(dir: &Path) -> Result<Vec<String>, BoxlabelError> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| BoxlabelError::DecodeFailure {
            path: dir.to_path_buf(),
            message: format!("failed while listing images: {source}"),
        })?;
        if !entry.file_type().is_file() || !has_image_extension(entry.path()) {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

pub fn has_image_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    IMAGE_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
}

/// Reads width and height from the file header.
pub fn read_image_dimensions(path: &Path) -> Result<ImageSize, BoxlabelError> {
    let size = imagesize::size(path).map_err(|source| BoxlabelError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;

    let width: u32 = size.width.try_into().map_err(|_| BoxlabelError::DecodeFailure {
        path: path.to_path_buf(),
        message: format!("image width {} does not fit in u32", size.width),
    })?;
    let height: u32 = size.height.try_into().map_err(|_| BoxlabelError::DecodeFailure {
        path: path.to_path_buf(),
        message: format!("image height {} does not fit in u32", size.height),
    })?;

    Ok(ImageSize::new(width, height))
}
