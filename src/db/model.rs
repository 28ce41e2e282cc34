use sqlx::FromRow;

/// 特征记录，每张训练图片一行，写入后不再修改
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FeatureRecord {
    /// 图片文件名，表内主键
    pub name: String,
    /// 描述符矩阵行数，即特征点数量
    pub rows: i64,
    /// 描述符矩阵列数
    pub cols: i64,
    /// 特征点属性矩阵，rows x 7 的 f32 大端序列化
    pub keypoints: Vec<u8>,
    /// 描述符矩阵，rows x cols 的 i32 大端序列化
    pub descriptors: Vec<u8>,
}
