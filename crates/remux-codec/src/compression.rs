//! 数据包负载压缩.
//!
//! 目标容器支持对轨道负载做无损压缩 (内容编码). 打包器在发出数据包前按轨道设置压缩负载,
//! 并在数据包和轨道头部上记录所用算法, 供封装器写入对应的内容编码信息.

use std::fmt;
use std::io::Write;

use bytes::Bytes;
use flate2::write::ZlibEncoder;
use remux_core::RemuxResult;

/// 负载压缩算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionKind {
    /// zlib (deflate)
    Zlib,
}

impl CompressionKind {
    /// 压缩一段负载
    pub fn compress(&self, data: &[u8]) -> RemuxResult<Bytes> {
        match self {
            Self::Zlib => {
                let mut encoder = ZlibEncoder::new(
                    Vec::with_capacity(data.len() / 2 + 16),
                    flate2::Compression::default(),
                );
                encoder.write_all(data)?;
                Ok(Bytes::from(encoder.finish()?))
            }
        }
    }

    /// 算法名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Zlib => "zlib",
        }
    }
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    #[test]
    fn test_zlib_可解压还原() {
        let data = vec![0x42u8; 1000];
        let compressed = CompressionKind::Zlib.compress(&data).unwrap();
        assert!(compressed.len() < data.len());

        let mut decoder = ZlibDecoder::new(&compressed[..]);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }
}
