//! Inline media ingestion for rtboard.
//!
//! Decodes the `data:` URI a client attached to a submission, writes the bytes
//! under the uploads directory and reads the pixel dimensions from the image
//! header. Pure synchronous; callers on an async runtime should run
//! [`ingest`] on a blocking thread.
//!
//! Stored files are named after the submission's content id, never after the
//! client's file name, so uploads cannot overwrite each other or escape the
//! uploads directory.

pub mod data_url;
pub mod error;

use std::{
  fmt,
  fs::{self, File},
  io::BufReader,
  path::{Path, PathBuf},
};

use image::{ImageFormat, ImageReader};
use rtboard_core::submission::MediaUpload;

pub use error::{Error, Result};

// ─── Public types ────────────────────────────────────────────────────────────

/// Width and height in pixels. Renders as `<width>x<height>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dimensions {
  pub width:  u32,
  pub height: u32,
}

impl fmt::Display for Dimensions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}x{}", self.width, self.height)
  }
}

/// Where an upload ended up and what it measured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
  /// File name relative to the uploads directory.
  pub file_name:  String,
  pub path:       PathBuf,
  pub dimensions: Dimensions,
}

/// Raster formats whose headers we can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
  Jpeg,
  Png,
  Gif,
}

impl ImageKind {
  /// Map a client-declared MIME type to a decoder.
  pub fn from_mime(mime: &str) -> Option<Self> {
    match mime {
      "image/jpeg" => Some(Self::Jpeg),
      "image/png" => Some(Self::Png),
      "image/gif" => Some(Self::Gif),
      _ => None,
    }
  }

  pub fn extension(self) -> &'static str {
    match self {
      Self::Jpeg => "jpg",
      Self::Png => "png",
      Self::Gif => "gif",
    }
  }

  fn format(self) -> ImageFormat {
    match self {
      Self::Jpeg => ImageFormat::Jpeg,
      Self::Png => ImageFormat::Png,
      Self::Gif => ImageFormat::Gif,
    }
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Decode `upload`, write it to `uploads_dir/<content_id>.<ext>` and measure it.
///
/// The decoder is chosen from the declared MIME type; undeclared or
/// unsupported types are stored with a `.bin` extension and measure `0x0`.
/// On a header decode failure the written file is removed again.
pub fn ingest(
  uploads_dir: &Path,
  content_id: &str,
  upload: &MediaUpload,
) -> Result<StoredMedia> {
  let decoded = data_url::decode(&upload.data_uri)?;
  let kind = upload.mime.as_deref().and_then(ImageKind::from_mime);

  let extension = kind.map_or("bin", ImageKind::extension);
  let file_name = format!("{content_id}.{extension}");
  let path = uploads_dir.join(&file_name);

  fs::write(&path, &decoded.data).map_err(|source| Error::Io {
    path: path.clone(),
    source,
  })?;

  let dimensions = match read_dimensions(&path, kind) {
    Ok(d) => d,
    Err(e) => {
      let _ = fs::remove_file(&path);
      return Err(e);
    }
  };

  Ok(StoredMedia { file_name, path, dimensions })
}

/// Read only the image header at `path`. `None` yields zero dimensions
/// without touching the file.
pub fn read_dimensions(path: &Path, kind: Option<ImageKind>) -> Result<Dimensions> {
  let Some(kind) = kind else {
    return Ok(Dimensions::default());
  };

  let file = File::open(path).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let (width, height) =
    ImageReader::with_format(BufReader::new(file), kind.format()).into_dimensions()?;
  Ok(Dimensions { width, height })
}
