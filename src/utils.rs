use ndarray::Array2;
use opencv::core::{Mat, Size};
use opencv::imgproc;
use opencv::prelude::*;

use crate::error::ExtractionError;

/// 转换为单通道灰度图，已经是单通道时直接返回
pub fn to_grayscale(image: &Mat) -> opencv::Result<Mat> {
    let code = match image.channels() {
        1 => return image.try_clone(),
        4 => imgproc::COLOR_BGRA2GRAY,
        _ => imgproc::COLOR_BGR2GRAY,
    };
    let mut output = Mat::default();
    imgproc::cvt_color_def(image, &mut output, code)?;
    Ok(output)
}

/// 缩放到固定尺寸，不保留长宽比
pub fn resize_exact(image: &Mat, (width, height): (i32, i32)) -> opencv::Result<Mat> {
    if image.cols() == width && image.rows() == height {
        return image.try_clone();
    }
    let mut output = Mat::default();
    imgproc::resize(
        image,
        &mut output,
        Size::new(width, height),
        0.0,
        0.0,
        imgproc::InterpolationFlags::INTER_AREA as i32,
    )?;
    Ok(output)
}

/// 将 N x 32 的 ORB 描述符矩阵转换为 ndarray
pub fn descriptors_to_array(descriptors: &Mat) -> Result<Array2<u8>, ExtractionError> {
    let (rows, cols) = (descriptors.rows() as usize, descriptors.cols() as usize);
    if rows == 0 {
        return Ok(Array2::zeros((0, cols)));
    }
    let data = descriptors.data_bytes()?;
    Ok(Array2::from_shape_vec((rows, cols), data.to_vec())?)
}

/// 保留两位小数
pub fn round2(value: f32) -> f32 {
    (value * 100.).round() / 100.
}

#[cfg(test)]
mod tests {
    use opencv::core::{CV_8UC1, CV_8UC3, CV_8UC4, Scalar};

    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(87.654_32), 87.65);
        assert_eq!(round2(20.0), 20.0);
        assert_eq!(round2(99.999), 100.0);
    }

    #[test]
    fn test_grayscale_and_resize() {
        let color =
            Mat::new_rows_cols_with_default(120, 80, CV_8UC3, Scalar::new(10., 20., 30., 0.))
                .unwrap();
        let gray = to_grayscale(&color).unwrap();
        assert_eq!(gray.channels(), 1);

        let resized = resize_exact(&gray, (300, 300)).unwrap();
        assert_eq!((resized.cols(), resized.rows()), (300, 300));
    }

    #[test]
    fn test_grayscale_from_gray_and_bgra() {
        let gray = Mat::new_rows_cols_with_default(10, 10, CV_8UC1, Scalar::all(42.)).unwrap();
        let same = to_grayscale(&gray).unwrap();
        assert_eq!(same.channels(), 1);
        assert_eq!(*same.at_2d::<u8>(5, 5).unwrap(), 42);

        let bgra =
            Mat::new_rows_cols_with_default(10, 10, CV_8UC4, Scalar::new(50., 50., 50., 0.))
                .unwrap();
        let gray = to_grayscale(&bgra).unwrap();
        assert_eq!(gray.channels(), 1);
        assert_eq!(*gray.at_2d::<u8>(5, 5).unwrap(), 50);
    }

    #[test]
    fn test_descriptors_to_array() {
        let mat = Mat::new_rows_cols_with_default(3, 32, CV_8UC1, Scalar::all(7.)).unwrap();
        let arr = descriptors_to_array(&mat).unwrap();
        assert_eq!(arr.dim(), (3, 32));
        assert!(arr.iter().all(|&v| v == 7));

        let empty = descriptors_to_array(&Mat::default()).unwrap();
        assert_eq!(empty.nrows(), 0);
    }
}
