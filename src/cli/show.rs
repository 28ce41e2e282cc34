use anyhow::Result;
use clap::Parser;

use crate::cli::SubCommandExtend;
use crate::config::{ExtractOptions, Opts};
use crate::extract::FeatureExtractor;
use crate::utils;

#[derive(Parser, Debug, Clone)]
pub struct ShowCommand {
    #[command(flatten)]
    pub extract: ExtractOptions,
    /// 图片路径
    pub image: String,
    /// 输出文件路径
    #[arg(default_value = "keypoints.png")]
    pub output: String,
}

impl SubCommandExtend for ShowCommand {
    async fn run(&self, _opts: &Opts) -> Result<()> {
        let mut extractor = FeatureExtractor::new(&self.extract)?;
        let image = extractor.load(&self.image)?;
        let (keypoints, _) = extractor.extract(&image)?;

        let output = utils::draw_keypoints(&image, &keypoints)?;
        utils::imwrite(&self.output, &output)?;
        println!("{} 个特征点已绘制到 {}", keypoints.len(), self.output);
        Ok(())
    }
}
