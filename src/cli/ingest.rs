use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use log::info;

use crate::cli::SubCommandExtend;
use crate::config::{ExtractOptions, Opts};
use crate::db::{self, Category};
use crate::extract::FeatureExtractor;
use crate::pipeline::{DebugDump, Pipeline, PipelineOptions};

#[derive(Parser, Debug, Clone)]
pub struct IngestCommand {
    #[command(flatten)]
    pub extract: ExtractOptions,
    /// 训练图片根目录，每个类别一个子目录
    #[arg(short, long, value_name = "DIR", default_value = "images")]
    pub images: PathBuf,
    /// 类别列表（对应子目录名与表名），逗号分隔
    #[arg(
        short,
        long,
        value_delimiter = ',',
        default_values_t = ["egypt_banknote_back".to_string(), "egypt_banknote_forward".to_string()]
    )]
    pub category: Vec<String>,
    /// 扫描的文件后缀名，多个后缀用逗号分隔
    #[arg(short, long, default_value = "jpg,png")]
    pub suffix: String,
    /// 调试输出目录，保存特征点标注图与矩阵文本
    #[arg(long, value_name = "DIR")]
    pub debug_dir: Option<PathBuf>,
}

impl SubCommandExtend for IngestCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let categories =
            self.category.iter().map(Category::new).collect::<Result<Vec<_>, _>>()?;

        let db = db::init_db(&opts.database).await?;
        let extractor = FeatureExtractor::new(&self.extract)?;

        let mut pipeline = Pipeline::new(
            db,
            extractor,
            PipelineOptions {
                images: self.images.clone(),
                categories,
                suffix: self.suffix.clone(),
            },
        );
        if let Some(dir) = &self.debug_dir {
            pipeline = pipeline.with_sink(Box::new(DebugDump::new(dir)));
        }

        let summary = pipeline.run().await?;
        info!(
            "特征提取完成: 扫描 {}，写入 {}，失败 {}",
            summary.scanned, summary.inserted, summary.failed
        );
        if summary.scanned > 0 && summary.inserted == 0 {
            bail!("没有任何图片成功写入数据库");
        }
        Ok(())
    }
}
