use ndarray::{Array1, Array2, Axis};
use opencv::core::{KeyPoint, Mat, Ptr, Vector};
use opencv::features2d::{ORB, ORB_ScoreType};
use opencv::prelude::*;

use crate::config::OrbOptions;
use crate::error::ExtractionError;
use crate::image::DecodedImage;
use crate::utils;

/// ORB 描述符的字节数，也是平均后描述符的维数
pub const DESCRIPTOR_LEN: usize = 32;

/// 一张图片的全局描述符：所有 ORB 局部描述符逐维取平均
pub type Descriptor = Array1<f32>;

/// 特征提取的结果
#[derive(Debug, Clone)]
pub enum Extraction {
    Descriptor(Descriptor),
    /// 特征点数量不足，附带实际检测到的数量
    InsufficientSignal(usize),
}

impl Extraction {
    pub fn into_descriptor(self) -> Option<Descriptor> {
        match self {
            Self::Descriptor(des) => Some(des),
            Self::InsufficientSignal(_) => None,
        }
    }
}

/// 特征提取器
///
/// 本身不持有 OpenCV 对象，可以在线程间共享，每次提取时创建新的 ORB 实例。
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    opts: OrbOptions,
}

impl FeatureExtractor {
    pub fn new(opts: OrbOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &OrbOptions {
        &self.opts
    }

    /// 该提取器产生的描述符维数
    pub fn descriptor_len(&self) -> usize {
        DESCRIPTOR_LEN
    }

    fn create_orb(&self) -> opencv::Result<Ptr<ORB>> {
        ORB::create(
            self.opts.orb_nfeatures as i32,
            self.opts.orb_scale_factor,
            self.opts.orb_nlevels as i32,
            self.opts.orb_patch_size as i32,
            0,
            2,
            ORB_ScoreType::HARRIS_SCORE,
            self.opts.orb_patch_size as i32,
            self.opts.orb_fast_threshold as i32,
        )
    }

    /// 将图片转为灰度并缩放到固定尺寸，然后检测特征点并计算描述符
    pub fn detect_and_compute(
        &self,
        image: &Mat,
    ) -> Result<(Vec<KeyPoint>, Array2<u8>), ExtractionError> {
        let gray = utils::to_grayscale(image)?;
        let gray = utils::resize_exact(&gray, self.opts.canonical_size)?;

        let mut orb = self.create_orb()?;
        let mask = Mat::default();
        let mut kps = Vector::<KeyPoint>::new();
        let mut des = Mat::default();
        orb.detect_and_compute(&gray, &mask, &mut kps, &mut des, false)?;

        Ok((kps.to_vec(), utils::descriptors_to_array(&des)?))
    }

    /// 提取一张已解码图片的描述符
    pub fn extract(&self, image: &DecodedImage) -> Result<Extraction, ExtractionError> {
        self.extract_mat(&image.mat)
    }

    pub fn extract_mat(&self, image: &Mat) -> Result<Extraction, ExtractionError> {
        let (_, des) = self.detect_and_compute(image)?;
        let count = des.nrows();
        if count < self.opts.min_keypoints as usize {
            return Ok(Extraction::InsufficientSignal(count));
        }
        match des.mapv(f32::from).mean_axis(Axis(0)) {
            Some(mean) => Ok(Extraction::Descriptor(mean)),
            None => Ok(Extraction::InsufficientSignal(0)),
        }
    }
}
