use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use log::{info, warn};
use opencv::core::{KeyPoint, Mat, Vector};
use regex::Regex;
use walkdir::WalkDir;

use crate::codec::Matrix;
use crate::db::{self, Category, Database, FeatureRecord};
use crate::extract::{FeatureExtractor, descriptors_to_matrix, keypoints_to_matrix};
use crate::utils::{self, pb_style};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// 训练图片根目录，每个类别一个子目录
    pub images: PathBuf,
    /// 类别列表，每个类别对应一张表
    pub categories: Vec<Category>,
    /// 扫描的文件后缀名，逗号分隔
    pub suffix: String,
}

/// 一次批量导入的统计结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub scanned: usize,
    pub inserted: usize,
    pub failed: usize,
}

/// 调试产物观察者，失败只影响调试输出，不影响主流程
pub trait DebugSink {
    fn emit(
        &self,
        category: &Category,
        name: &str,
        image: &Mat,
        keypoints: &Vector<KeyPoint>,
        kp_matrix: &Matrix<f32>,
        desc_matrix: &Matrix<i32>,
    ) -> Result<()>;
}

/// 将标注图与矩阵文本写入指定目录
pub struct DebugDump {
    dir: PathBuf,
}

impl DebugDump {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DebugSink for DebugDump {
    fn emit(
        &self,
        category: &Category,
        name: &str,
        image: &Mat,
        keypoints: &Vector<KeyPoint>,
        kp_matrix: &Matrix<f32>,
        desc_matrix: &Matrix<i32>,
    ) -> Result<()> {
        let dir = self.dir.join(category.as_str());
        fs::create_dir_all(&dir)?;

        let annotated = utils::draw_keypoints(image, keypoints)?;
        utils::imwrite(&dir.join(name).to_string_lossy(), &annotated)?;
        utils::dump_matrix(dir.join(format!("key_{name}.txt")), kp_matrix)?;
        utils::dump_matrix(dir.join(format!("desc_{name}.txt")), desc_matrix)?;
        Ok(())
    }
}

/// 批量导入管线：建表 → 扫描目录 → 逐张提取并写入
pub struct Pipeline {
    db: Database,
    extractor: FeatureExtractor,
    opts: PipelineOptions,
    sink: Option<Box<dyn DebugSink>>,
}

impl Pipeline {
    pub fn new(db: Database, extractor: FeatureExtractor, opts: PipelineOptions) -> Self {
        Self { db, extractor, opts, sink: None }
    }

    pub fn with_sink(mut self, sink: Box<dyn DebugSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// 执行整个批次
    ///
    /// 建表失败会中止运行；单张图片的加载、提取、写入失败只记录并跳过
    pub async fn run(&mut self) -> Result<RunSummary> {
        let Self { db, extractor, opts, sink } = &mut *self;

        for category in &opts.categories {
            db::crud::create_table(&*db, category).await?;
        }

        let re_suf =
            opts.suffix.split(',').map(regex::escape).collect::<Vec<_>>().join("|");
        let re_suf = Regex::new(&format!("(?i)^({re_suf})$")).context("无效的后缀列表")?;

        let mut summary = RunSummary::default();
        for category in &opts.categories {
            let dir = opts.images.join(category.as_str());
            if !dir.is_dir() {
                warn!("类别 {} 的图片目录不存在: {}", category, dir.display());
                continue;
            }

            let mut files: Vec<PathBuf> = WalkDir::new(&dir)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|entry| {
                    entry.ok().and_then(|entry| {
                        let path = entry.into_path();
                        let ext = path.extension().unwrap_or_default().to_string_lossy();
                        (path.is_file() && re_suf.is_match(&ext)).then_some(path)
                    })
                })
                .collect();
            // 目录项顺序本身不稳定，排序保证批次可复现
            files.sort();

            info!("类别 {}: 共 {} 张图片", category, files.len());
            let pb = ProgressBar::new(files.len() as u64).with_style(pb_style());

            let mut tx = db.begin().await?;
            for path in &files {
                summary.scanned += 1;
                match process_image(&mut tx, extractor, sink.as_deref(), category, path).await {
                    Ok(name) => {
                        summary.inserted += 1;
                        pb.set_message(name);
                    }
                    Err(e) => {
                        summary.failed += 1;
                        warn!("跳过 {}: {:#}", path.display(), e);
                    }
                }
                pb.inc(1);
            }
            tx.commit().await?;
            pb.finish_with_message(format!("类别 {category} 完成"));
        }

        info!(
            "批次结束: 扫描 {}，写入 {}，失败 {}",
            summary.scanned, summary.inserted, summary.failed
        );
        Ok(summary)
    }
}

/// 单张图片的完整处理：加载 → 提取 → 编码 → 写入
async fn process_image(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    extractor: &mut FeatureExtractor,
    sink: Option<&dyn DebugSink>,
    category: &Category,
    path: &Path,
) -> Result<String> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("无法取得文件名")?;

    let image = extractor.load(path)?;
    let (keypoints, descriptors) = extractor.extract(&image)?;

    let kp_matrix = keypoints_to_matrix(&keypoints)?;
    let desc_matrix = descriptors_to_matrix(&descriptors)?;

    let record = FeatureRecord {
        name: name.clone(),
        rows: desc_matrix.rows() as i64,
        cols: desc_matrix.cols() as i64,
        keypoints: kp_matrix.encode(),
        descriptors: desc_matrix.encode(),
    };
    db::crud::insert(&mut **tx, category, &record).await?;

    // 记录已经落库，调试产物写不出来只告警，不算失败
    if let Some(sink) = sink
        && let Err(e) = sink.emit(category, &name, &image, &keypoints, &kp_matrix, &desc_matrix)
    {
        warn!("调试输出失败 {}: {:#}", name, e);
    }
    Ok(name)
}
