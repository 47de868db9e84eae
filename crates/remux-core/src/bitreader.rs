//! 比特流读取器.
//!
//! 按大端位序 (MSB first) 从字节切片中读取位字段, 用于解析 AC-3 等码流的帧头.
//! 帧头只有几个字节, 读取器直接在切片上按位偏移寻址, 不做缓存.

use crate::{RemuxError, RemuxResult};

/// 比特流读取器
///
/// # 示例
/// ```
/// use remux_core::bitreader::BitReader;
///
/// // AC-3 帧头第 5 字节: fscod=01, frmsizecod=001000
/// let data = [0x48];
/// let mut br = BitReader::new(&data);
/// assert_eq!(br.read_bits(2).unwrap(), 1);
/// assert_eq!(br.read_bits(6).unwrap(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// 已消耗的位数
    offset: usize,
}

impl<'a> BitReader<'a> {
    /// 创建新的比特流读取器
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// 剩余可读位数
    pub fn bits_left(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.offset)
    }

    /// 读取 1 个位
    pub fn read_bit(&mut self) -> RemuxResult<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// 读取 N 个位 (最多 32 位), 返回值的低 N 位有效
    pub fn read_bits(&mut self, n: u32) -> RemuxResult<u32> {
        if n > 32 {
            return Err(RemuxError::InvalidArgument(format!(
                "一次最多读取 32 位, 请求 {n} 位"
            )));
        }
        self.ensure(n)?;

        let value = (0..n).fold(0u32, |acc, _| {
            let byte = self.data[self.offset / 8];
            let bit = (byte >> (7 - self.offset % 8)) & 1;
            self.offset += 1;
            (acc << 1) | u32::from(bit)
        });
        Ok(value)
    }

    /// 跳过 N 个位
    pub fn skip_bits(&mut self, n: u32) -> RemuxResult<()> {
        self.ensure(n)?;
        self.offset += n as usize;
        Ok(())
    }

    /// 当前所在字节的索引
    pub fn byte_position(&self) -> usize {
        self.offset / 8
    }

    fn ensure(&self, n: u32) -> RemuxResult<()> {
        if n as usize > self.bits_left() {
            return Err(RemuxError::Eof);
        }
        Ok(())
    }
}
