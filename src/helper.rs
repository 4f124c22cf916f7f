use crate::error::Result;
use crate::matrix::StyledMatrix;
use crate::options::RenderOptions;

use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/*---- Utilities ----*/

/// Side used by the one-call helpers when no size is given.
pub const DEFAULT_SIZE: u32 = 512;

/// Prints a styled matrix to the console, dark modules as blocks, with a
/// four-module quiet zone.
pub fn print_matrix(matrix: &StyledMatrix) {
	let border: isize = 4;
	let size = matrix.size() as isize;
	for row in -border .. size + border {
		for col in -border .. size + border {
			let dark = row >= 0 && col >= 0 && row < size && col < size
				&& matrix.module(row as usize, col as usize).dark;
			let c: char = if dark { '█' } else { ' ' };
			print!("{0}{0}", c);
		}
		println!();
	}
	println!();
}

/// Saves a rendered image as PNG.
///
/// # Arguments
///
/// * `image` - The rendered image.
/// * `directory_path` - Optional. The directory the image is written to. Defaults to "generated".
/// * `filename` - Optional. File name without extension. Defaults to a timestamp.
///
/// # Errors
///
/// Returns [`crate::QrError::Asset`] if the directory cannot be created or the file cannot be written.
///
/// # Example
///
/// ```rust
/// use qrstyle::helper::{generate_image_buffer, save_png};
///
/// let img = generate_image_buffer("Hello, World!", Some(128)).unwrap();
/// let dir = std::env::temp_dir().join("qrstyle-doc");
/// let path = save_png(&img, dir.to_str(), Some("qr_code")).unwrap();
/// assert!(path.ends_with("qr_code.png"));
/// # std::fs::remove_dir_all(&dir).unwrap();
/// ```
pub fn save_png(image: &RgbaImage, directory_path: Option<&str>, filename: Option<&str>) -> Result<PathBuf> {
	let directory_path = directory_path.unwrap_or("generated");
	let filename = match filename {
		Some(name) => name.to_string(),
		None => {
			let since_the_epoch = SystemTime::now()
				.duration_since(UNIX_EPOCH)
				.unwrap_or_default();
			format!("{}", since_the_epoch.as_millis())
		}
	};

	if !Path::new(directory_path).exists() {
		fs::create_dir_all(directory_path)?;
	}

	let file_path = Path::new(directory_path).join(format!("{}.png", filename));
	image.save(&file_path)?;
	tracing::info!(path = %file_path.display(), "saved png");
	Ok(file_path)
}

/// Renders `content` with default styling.
///
/// # Arguments
///
/// * `content` - The content to encode.
/// * `size` - Optional. Image side in pixels. Defaults to [`DEFAULT_SIZE`].
///
/// # Example
///
/// ```
/// use qrstyle::helper::generate_image_buffer;
///
/// let img = generate_image_buffer("Hello, World!", None).unwrap();
/// assert_eq!(img.dimensions(), (512, 512));
/// ```
pub fn generate_image_buffer(content: &str, size: Option<u32>) -> Result<RgbaImage> {
	crate::render(content, &RenderOptions::new(size.unwrap_or(DEFAULT_SIZE)))
}

/// Renders `content` with default styling as an SVG document.
///
/// # Arguments
///
/// * `content` - The content to encode.
/// * `size` - Optional. Canvas side in pixels. Defaults to [`DEFAULT_SIZE`].
///
/// # Example
///
/// ```
/// use qrstyle::helper::generate_svg_string;
///
/// let svg = generate_svg_string("Hello, World!", None).unwrap();
/// assert!(svg.contains("<svg"));
/// ```
pub fn generate_svg_string(content: &str, size: Option<u32>) -> Result<String> {
	let vector = crate::render_vector(content, &RenderOptions::new(size.unwrap_or(DEFAULT_SIZE)))?;
	Ok(vector.to_svg_string())
}

// Tests
#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_generate_svg_string() {
		let svg = generate_svg_string("HELLO WORLD", Some(200)).unwrap();
		assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
		assert!(svg.contains("width=\"200\""));
	}

	#[test]
	fn test_generate_image_buffer() {
		let img = generate_image_buffer("Hello, world!", Some(290)).unwrap();
		assert_eq!(img.dimensions(), (290, 290));
	}

	#[test]
	fn test_empty_content_is_rejected() {
		assert!(generate_image_buffer("", None).is_err());
	}

	#[test]
	fn test_save_png() {
		let dir = std::env::temp_dir().join(format!("qrstyle-helper-{}", std::process::id()));
		let dir = dir.to_string_lossy().into_owned();
		let img = generate_image_buffer("save me", Some(100)).unwrap();
		let path = save_png(&img, Some(&dir), Some("code")).unwrap();
		assert!(path.exists());
		let reloaded = image::open(&path).unwrap().to_rgba8();
		assert_eq!(reloaded.dimensions(), (100, 100));
		fs::remove_dir_all(&dir).unwrap();
	}
}
