use std::path::Path;

use opencv::core::{self, KeyPoint, Mat, Ptr, Vector};
use opencv::features2d::{ORB, ORB_ScoreType};
use opencv::imgproc;
use opencv::prelude::*;
use thiserror::Error;

use crate::codec::{CodecError, Matrix};
use crate::config::ExtractOptions;
use crate::utils;

/// 每个特征点序列化后的属性列数，列序固定为
/// x, y, size, angle, response, octave, class_id
pub const KEYPOINT_COLS: usize = 7;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to decode image: {path}")]
    ImageLoad { path: String },
    #[error("descriptor rows {rows} do not match keypoint count {keypoints}")]
    RowMismatch { rows: usize, keypoints: usize },
    #[error("keypoint matrix has {cols} columns, expected {expected}")]
    KeypointShape { cols: usize, expected: usize },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

/// 单张图片的特征提取器，整个批次复用同一个 ORB 实例
pub struct FeatureExtractor {
    orb: Ptr<ORB>,
    opts: ExtractOptions,
}

impl FeatureExtractor {
    pub fn new(opts: &ExtractOptions) -> Result<Self, ExtractError> {
        let orb = ORB::create(
            opts.orb_nfeatures as i32,
            opts.orb_scale_factor,
            opts.orb_nlevels as i32,
            31,
            0,
            2,
            ORB_ScoreType::HARRIS_SCORE,
            31,
            opts.orb_fast_threshold as i32,
        )?;
        Ok(Self { orb, opts: opts.clone() })
    }

    /// 以灰度模式读取图片，解码失败或零尺寸都视为加载错误
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Mat, ExtractError> {
        let path = path.as_ref();
        let image = utils::imread(&path.to_string_lossy())?;
        if image.empty() {
            return Err(ExtractError::ImageLoad { path: path.display().to_string() });
        }
        Ok(image)
    }

    /// 降噪 → 检测特征点 → 计算描述符
    ///
    /// 零特征点是合法结果；描述符矩阵行数与特征点数量一一对应
    pub fn extract(&mut self, image: &Mat) -> Result<(Vector<KeyPoint>, Mat), ExtractError> {
        let image = self.denoise(image)?;

        let mask = Mat::default();
        let mut keypoints = Vector::new();
        self.orb.detect(&image, &mut keypoints, &mask)?;

        // compute 会原地丢弃无法计算描述符的特征点，保持行与点对齐
        let mut descriptors = Mat::default();
        self.orb.compute(&image, &mut keypoints, &mut descriptors)?;

        let rows = descriptors.rows() as usize;
        if rows != keypoints.len() {
            return Err(ExtractError::RowMismatch { rows, keypoints: keypoints.len() });
        }
        Ok((keypoints, descriptors))
    }

    fn denoise(&self, image: &Mat) -> opencv::Result<Mat> {
        if self.opts.no_denoise {
            return Ok(image.clone());
        }
        let mut output = Mat::default();
        imgproc::bilateral_filter(
            image,
            &mut output,
            self.opts.bilateral_d,
            self.opts.bilateral_sigma_color,
            self.opts.bilateral_sigma_space,
            core::BORDER_DEFAULT,
        )?;
        Ok(output)
    }
}

/// 将特征点集展开成 rows x 7 的 f32 矩阵，保持检测顺序
pub fn keypoints_to_matrix(keypoints: &Vector<KeyPoint>) -> Result<Matrix<f32>, ExtractError> {
    let mut data = Vec::with_capacity(keypoints.len() * KEYPOINT_COLS);
    for kp in keypoints.iter() {
        let pt = kp.pt();
        data.extend([
            pt.x,
            pt.y,
            kp.size(),
            kp.angle(),
            kp.response(),
            kp.octave() as f32,
            kp.class_id() as f32,
        ]);
    }
    Ok(Matrix::from_vec(keypoints.len(), KEYPOINT_COLS, data)?)
}

/// 从 f32 矩阵还原特征点集
pub fn matrix_to_keypoints(matrix: &Matrix<f32>) -> Result<Vector<KeyPoint>, ExtractError> {
    if matrix.cols() != KEYPOINT_COLS {
        return Err(ExtractError::KeypointShape { cols: matrix.cols(), expected: KEYPOINT_COLS });
    }
    let mut keypoints = Vector::with_capacity(matrix.rows());
    for n in 0..matrix.rows() {
        let row = matrix.row(n);
        keypoints.push(KeyPoint::new_coords(
            row[0],
            row[1],
            row[2],
            row[3],
            row[4],
            row[5] as i32,
            row[6] as i32,
        )?);
    }
    Ok(keypoints)
}

/// 将 CV_8U 描述符矩阵显式加宽为 i32 存储
pub fn descriptors_to_matrix(descriptors: &Mat) -> Result<Matrix<i32>, ExtractError> {
    let rows = descriptors.rows().max(0) as usize;
    let cols = descriptors.cols().max(0) as usize;
    if rows == 0 || cols == 0 {
        return Ok(Matrix::from_vec(rows, cols, vec![])?);
    }
    let bytes = descriptors.data_typed::<u8>()?;
    let data = bytes.iter().map(|&b| i32::from(b)).collect();
    Ok(Matrix::from_vec(rows, cols, data)?)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use opencv::core::{CV_8UC1, Scalar};

    use super::*;

    #[test]
    fn keypoint_matrix_round_trip() -> Result<()> {
        let mut kps = Vector::new();
        kps.push(KeyPoint::new_coords(1.5, 2.5, 31.0, 90.0, 0.5, 2, 7)?);
        kps.push(KeyPoint::new_coords(10.0, 20.0, 31.0, -1.0, 0.25, 0, -1)?);

        let matrix = keypoints_to_matrix(&kps)?;
        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.cols(), KEYPOINT_COLS);
        assert_eq!(matrix.row(0), &[1.5, 2.5, 31.0, 90.0, 0.5, 2.0, 7.0]);

        let back = matrix_to_keypoints(&matrix)?;
        assert_eq!(back.len(), 2);
        let kp = back.get(1)?;
        assert_eq!(kp.pt().x, 10.0);
        assert_eq!(kp.octave(), 0);
        assert_eq!(kp.class_id(), -1);
        Ok(())
    }

    #[test]
    fn matrix_to_keypoints_rejects_wrong_width() {
        let matrix = Matrix::from_vec(1, 3, vec![0.0f32; 3]).unwrap();
        let err = matrix_to_keypoints(&matrix).unwrap_err();
        assert!(matches!(err, ExtractError::KeypointShape { cols: 3, expected: KEYPOINT_COLS }));
    }

    #[test]
    fn flat_image_yields_empty_set() -> Result<()> {
        let mut extractor = FeatureExtractor::new(&ExtractOptions::default())?;
        let image = Mat::new_rows_cols_with_default(64, 64, CV_8UC1, Scalar::all(128.0))?;

        let (keypoints, descriptors) = extractor.extract(&image)?;
        assert_eq!(keypoints.len(), 0);
        assert_eq!(descriptors.rows(), 0);

        let matrix = descriptors_to_matrix(&descriptors)?;
        assert_eq!(matrix.rows(), 0);
        assert_eq!(matrix.encode(), Vec::<u8>::new());
        Ok(())
    }

    #[test]
    fn descriptor_rows_match_keypoints() -> Result<()> {
        let mut extractor = FeatureExtractor::new(&ExtractOptions::default())?;
        let mut image = Mat::new_rows_cols_with_default(240, 320, CV_8UC1, Scalar::all(32.0))?;
        for n in 0..6 {
            imgproc::rectangle(
                &mut image,
                core::Rect::new(20 + n * 45, 20 + n * 30, 36, 24),
                Scalar::all(220.0),
                imgproc::FILLED,
                imgproc::LINE_8,
                0,
            )?;
        }

        let (keypoints, descriptors) = extractor.extract(&image)?;
        assert_eq!(descriptors.rows() as usize, keypoints.len());
        let matrix = descriptors_to_matrix(&descriptors)?;
        assert_eq!(matrix.rows(), keypoints.len());
        Ok(())
    }
}
