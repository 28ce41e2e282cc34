use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::*;

#[derive(Parser, Debug, Clone)]
pub struct ExtractOptions {
    /// ORB 特征点最大保留数量
    #[arg(short = 'n', long, value_name = "N", default_value_t = 500)]
    pub orb_nfeatures: u32,
    /// ORB 特征金字塔缩放因子
    #[arg(long, value_name = "SCALE", default_value_t = 1.2)]
    pub orb_scale_factor: f32,
    /// ORB 特征金字塔层数
    #[arg(long, value_name = "N", default_value_t = 8)]
    pub orb_nlevels: u32,
    /// ORB FAST 角点检测阈值
    #[arg(long, value_name = "THRESHOLD", default_value_t = 20)]
    pub orb_fast_threshold: u32,
    /// 双边滤波像素邻域直径
    #[arg(long, value_name = "D", default_value_t = 8)]
    pub bilateral_d: i32,
    /// 双边滤波颜色空间 sigma
    #[arg(long, value_name = "SIGMA", default_value_t = 8.0)]
    pub bilateral_sigma_color: f64,
    /// 双边滤波坐标空间 sigma
    #[arg(long, value_name = "SIGMA", default_value_t = 12.0)]
    pub bilateral_sigma_space: f64,
    /// 跳过降噪步骤
    #[arg(long)]
    pub no_denoise: bool,
}

// 注意：与上方 clap 的默认值保持一致
impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            orb_nfeatures: 500,
            orb_scale_factor: 1.2,
            orb_nlevels: 8,
            orb_fast_threshold: 20,
            bilateral_d: 8,
            bilateral_sigma_color: 8.0,
            bilateral_sigma_space: 12.0,
            no_denoise: false,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "featdb", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// 数据库文件路径
    #[arg(short, long, value_name = "FILE", default_value = "databases/features.db")]
    pub database: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 扫描训练图片目录，提取特征并写入数据库
    Ingest(IngestCommand),
    /// 提取单张图片的特征点并绘制到文件，调试用
    Show(ShowCommand),
}
