use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use indicatif::ProgressStyle;
use opencv::core::{self, KeyPoint, Mat, Vector};
use opencv::features2d;
use opencv::imgcodecs;

use crate::codec::{Element, Matrix};

pub fn imread(filename: &str) -> opencv::Result<Mat> {
    imgcodecs::imread(filename, imgcodecs::IMREAD_GRAYSCALE)
}

pub fn imwrite(filename: &str, img: &impl core::ToInputArray) -> opencv::Result<bool> {
    let flags = Vector::<i32>::new();
    imgcodecs::imwrite(filename, img, &flags)
}

pub fn draw_keypoints(
    image: &impl core::ToInputArray,
    keypoints: &Vector<KeyPoint>,
) -> opencv::Result<Mat> {
    let mut output = Mat::default();
    features2d::draw_keypoints(
        image,
        keypoints,
        &mut output,
        core::Scalar::all(-1.0),
        features2d::DrawMatchesFlags::DEFAULT,
    )?;
    Ok(output)
}

/// 将矩阵写成每行一条的文本，仅供调试，格式不保证稳定
pub fn dump_matrix<T: Element + Display>(
    path: impl AsRef<Path>,
    matrix: &Matrix<T>,
) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for n in 0..matrix.rows() {
        let line = matrix.row(n).iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
        writeln!(writer, "{line}")?;
    }
    writer.flush()
}

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .unwrap()
        .progress_chars("#>-")
}
