//! 图片的传输编码与解码
//!
//! 图片以 `data:image/<subtype>;base64,<payload>` 或者裸 base64 字符串的形式
//! 在系统边界上传递。

use std::path::Path;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use opencv::core::{Mat, Vector};
use opencv::imgcodecs;
use opencv::prelude::*;

use crate::error::SearchError;

/// 标准字母表，对结尾的 `=` 是否存在不做要求
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// 解码后的图片，统一为 8 位 BGR 三通道
///
/// 灰度图会被展开为三通道，透明通道会被丢弃。
#[derive(Debug)]
pub struct DecodedImage {
    pub mat: Mat,
    pub width: i32,
    pub height: i32,
}

impl DecodedImage {
    fn new(mat: Mat) -> Self {
        Self { width: mat.cols(), height: mat.rows(), mat }
    }
}

/// 编码图片时使用的格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// 根据文件后缀名猜测格式
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Png => ".png",
            Self::Jpeg => ".jpg",
            Self::Webp => ".webp",
        }
    }

    fn media_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }
}

/// 去掉 `data:...;base64,` 前缀，没有前缀时原样返回
pub fn strip_media_marker(input: &str) -> &str {
    let input = input.trim();
    if input.starts_with("data:") {
        if let Some((_, payload)) = input.split_once(',') {
            return payload;
        }
    }
    input
}

/// 将传输编码的图片解码为像素矩阵，通道顺序为 BGR
pub fn decode_image(input: &str) -> Result<DecodedImage, SearchError> {
    let payload: String =
        strip_media_marker(input).chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if payload.is_empty() {
        return Err(SearchError::InvalidImageFormat("empty payload".to_string()));
    }

    let bytes = BASE64
        .decode(payload.as_bytes())
        .map_err(|e| SearchError::InvalidImageFormat(format!("base64: {e}")))?;

    imdecode(&bytes)
}

/// 解码原始图片字节
pub fn imdecode(bytes: &[u8]) -> Result<DecodedImage, SearchError> {
    if bytes.is_empty() {
        return Err(SearchError::InvalidImageFormat("empty image data".to_string()));
    }
    let invalid = |e: opencv::Error| SearchError::InvalidImageFormat(e.to_string());

    let buf = Mat::from_slice(bytes).map_err(invalid)?;
    let mat = imgcodecs::imdecode(&buf, imgcodecs::IMREAD_COLOR).map_err(invalid)?;
    // OpenCV 解码失败时不会报错，而是返回一个空矩阵
    if mat.empty() {
        return Err(SearchError::InvalidImageFormat("not a decodable raster image".to_string()));
    }

    Ok(DecodedImage::new(mat))
}

/// 将像素矩阵编码为指定格式的图片字节
pub fn encode_image(mat: &Mat, format: ImageFormat) -> opencv::Result<Vec<u8>> {
    let mut buf = Vector::<u8>::new();
    let flags = Vector::<i32>::new();
    imgcodecs::imencode(format.extension(), mat, &mut buf, &flags)?;
    Ok(buf.to_vec())
}

/// 将图片字节包装为 data URI
pub fn to_data_uri(bytes: &[u8], format: ImageFormat) -> String {
    format!("data:{};base64,{}", format.media_type(), BASE64.encode(bytes))
}
