//! AC-3 / E-AC-3 同步帧头解析.
//!
//! # AC-3 同步帧头 (bsid <= 10)
//! ```text
//! syncword    16 bits = 0x0B77
//! crc1        16 bits
//! fscod        2 bits   0=48kHz 1=44.1kHz 2=32kHz 3=保留
//! frmsizecod   6 bits   码率与帧长索引 (0..=37)
//! bsid         5 bits
//! bsmod        3 bits
//! acmod        3 bits   声道模式
//! [cmixlev 2] [surmixlev 2] [dsurmod 2]  视 acmod 而定
//! lfeon        1 bit
//! ```
//!
//! # E-AC-3 同步帧头 (11 <= bsid <= 16)
//! ```text
//! syncword 16 | strmtyp 2 | substreamid 3 | frmsiz 11 | fscod 2 | fscod2/numblkscod 2
//! acmod 3 | lfeon 1 | bsid 5 | ...
//! ```
//!
//! 两种帧头的 bsid 都位于第 5 字节的高 5 位, 据此分派.

use byteorder::{BigEndian, ByteOrder};
use remux_core::bitreader::BitReader;

use crate::codec_id::CodecId;

/// 同步字
pub const SYNC_WORD: u16 = 0x0B77;

/// 解析帧头所需的最少字节数
pub const HEADER_SIZE: usize = 8;

/// AC-3 每帧采样数 (6 个音频块 x 256)
pub const AC3_SAMPLES_PER_FRAME: u32 = 1536;

/// AC-3 码率表 (kbps), 以 frmsizecod / 2 为索引
const AC3_BITRATES: [u32; 19] = [
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 448, 512, 576, 640,
];

/// fscod 对应的采样率
const SAMPLE_RATES: [u32; 3] = [48000, 44100, 32000];

/// E-AC-3 降采样率 (fscod == 3 时由 fscod2 选择)
const EAC3_REDUCED_SAMPLE_RATES: [u32; 3] = [24000, 22050, 16000];

/// E-AC-3 每帧音频块数
const EAC3_BLOCKS: [u32; 4] = [1, 2, 3, 6];

/// acmod 对应的全带宽声道数
const ACMOD_CHANNELS: [u32; 8] = [2, 1, 2, 3, 3, 4, 4, 5];

/// 同步帧头信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ac3Header {
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 声道数 (含 LFE)
    pub channels: u32,
    /// 是否有 LFE 声道
    pub lfe: bool,
    /// 码流标识 (bsid)
    pub bsid: u8,
    /// 整帧字节数 (含帧头)
    pub frame_size: usize,
    /// 每帧采样数
    pub samples: u32,
    /// 码率 (kbps), E-AC-3 为 0
    pub bit_rate: u32,
    /// E-AC-3 码流类型: 0=独立 1=从属 2=由 AC-3 转换; AC-3 恒为 0
    pub strmtyp: u8,
    /// E-AC-3 子流编号, AC-3 恒为 0
    pub substreamid: u8,
}

impl Ac3Header {
    /// 是否为 E-AC-3 帧
    pub fn is_eac3(&self) -> bool {
        self.bsid > 10
    }

    /// 对应的编解码器
    pub fn codec_id(&self) -> CodecId {
        if self.is_eac3() {
            CodecId::Eac3
        } else {
            CodecId::Ac3
        }
    }

    /// 是否开始一个新的访问单元
    ///
    /// E-AC-3 的从属子流与非 0 号独立子流和前面的主帧属于同一时刻,
    /// 与主帧合并为一个数据包, 不单独占用时间轴.
    pub fn starts_access_unit(&self) -> bool {
        !self.is_eac3() || (self.strmtyp != 1 && self.substreamid == 0)
    }

    /// 与另一帧头的流参数 (采样率, 码流类型) 是否一致
    pub fn same_stream(&self, other: &Ac3Header) -> bool {
        self.sample_rate == other.sample_rate && self.is_eac3() == other.is_eac3()
    }
}

/// 解析 `data` 开头的同步帧头
///
/// 不足 [`HEADER_SIZE`] 字节、同步字不符或字段取值保留时返回 `None`.
pub fn parse_header(data: &[u8]) -> Option<Ac3Header> {
    if data.len() < HEADER_SIZE || BigEndian::read_u16(data) != SYNC_WORD {
        return None;
    }

    match data[5] >> 3 {
        0..=10 => parse_ac3(&data[..HEADER_SIZE]),
        11..=16 => parse_eac3(&data[..HEADER_SIZE]),
        _ => None,
    }
}

fn parse_ac3(data: &[u8]) -> Option<Ac3Header> {
    let mut br = BitReader::new(data);
    // 同步字 + crc1
    br.skip_bits(32).ok()?;
    let fscod = br.read_bits(2).ok()? as usize;
    let frmsizecod = br.read_bits(6).ok()? as usize;
    let bsid = br.read_bits(5).ok()? as u8;
    br.skip_bits(3).ok()?;
    let acmod = br.read_bits(3).ok()? as usize;

    if fscod == 3 || frmsizecod > 37 {
        return None;
    }

    if (acmod & 0x01) != 0 && acmod != 1 {
        br.skip_bits(2).ok()?;
    }
    if (acmod & 0x04) != 0 {
        br.skip_bits(2).ok()?;
    }
    if acmod == 2 {
        br.skip_bits(2).ok()?;
    }
    let lfe = br.read_bit().ok()?;

    let bit_rate = AC3_BITRATES[frmsizecod / 2];
    let words = match fscod {
        0 => bit_rate * 2,
        // 44.1kHz 下帧长非整数, 奇数 frmsizecod 多一个字
        1 => bit_rate * 320 / 147 + (frmsizecod as u32 & 0x01),
        _ => bit_rate * 3,
    };

    Some(Ac3Header {
        sample_rate: SAMPLE_RATES[fscod],
        channels: ACMOD_CHANNELS[acmod] + u32::from(lfe),
        lfe,
        bsid,
        frame_size: words as usize * 2,
        samples: AC3_SAMPLES_PER_FRAME,
        bit_rate,
        strmtyp: 0,
        substreamid: 0,
    })
}

fn parse_eac3(data: &[u8]) -> Option<Ac3Header> {
    let mut br = BitReader::new(data);
    br.skip_bits(16).ok()?;
    let strmtyp = br.read_bits(2).ok()? as u8;
    if strmtyp == 3 {
        return None;
    }
    let substreamid = br.read_bits(3).ok()? as u8;
    let frmsiz = br.read_bits(11).ok()? as usize;
    let fscod = br.read_bits(2).ok()? as usize;
    let (sample_rate, blocks) = if fscod == 3 {
        let fscod2 = br.read_bits(2).ok()? as usize;
        if fscod2 == 3 {
            return None;
        }
        (EAC3_REDUCED_SAMPLE_RATES[fscod2], 6)
    } else {
        let numblkscod = br.read_bits(2).ok()? as usize;
        (SAMPLE_RATES[fscod], EAC3_BLOCKS[numblkscod])
    };
    let acmod = br.read_bits(3).ok()? as usize;
    let lfe = br.read_bit().ok()?;
    let bsid = br.read_bits(5).ok()? as u8;

    let frame_size = (frmsiz + 1) * 2;
    if frame_size < HEADER_SIZE {
        return None;
    }

    Some(Ac3Header {
        sample_rate,
        channels: ACMOD_CHANNELS[acmod] + u32::from(lfe),
        lfe,
        bsid,
        frame_size,
        samples: blocks * 256,
        bit_rate: 0,
        strmtyp,
        substreamid,
    })
}

/// 查找第一个可解析的帧头
///
/// 返回帧头在 `data` 中的偏移与解析结果.
pub fn find_header(data: &[u8]) -> Option<(usize, Ac3Header)> {
    if data.len() < HEADER_SIZE {
        return None;
    }
    (0..=data.len() - HEADER_SIZE)
        .find_map(|pos| parse_header(&data[pos..]).map(|header| (pos, header)))
}

/// 查找连续 `num_headers` 个帧头的起始偏移
///
/// 从每个候选偏移开始, 沿着帧头声明的帧长向后跳转, 要求每个落点都是与首帧参数一致的有效帧头.
/// 单个同步字在任意二进制数据中很容易偶然出现, 连续多个长度自洽的帧头才能作为格式证据.
pub fn find_consecutive_headers(data: &[u8], num_headers: usize) -> Option<usize> {
    let wanted = num_headers.max(1);
    let mut start = 0;

    while let Some((offset, first)) = find_header(&data[start..]) {
        let pos = start + offset;
        let mut found = 1;
        let mut next = pos + first.frame_size;

        while found < wanted {
            match data.get(next..).and_then(parse_header) {
                Some(header) if header.same_stream(&first) => {
                    found += 1;
                    next += header.frame_size;
                }
                _ => break,
            }
        }

        if found >= wanted {
            return Some(pos);
        }
        start = pos + 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 构造一个 48kHz AC-3 帧: frmsizecod=8 (64kbps) → 256 字节, acmod=2 (立体声)
    fn build_ac3_frame(lfe: bool) -> Vec<u8> {
        let mut frame = vec![0u8; 256];
        frame[0] = 0x0B;
        frame[1] = 0x77;
        frame[4] = 8; // fscod=0, frmsizecod=8
        frame[5] = 8 << 3; // bsid=8, bsmod=0
        // acmod=010, dsurmod=00, lfeon
        frame[6] = 0b0100_0000 | if lfe { 0b0000_0100 } else { 0 };
        frame
    }

    /// 构造一个 E-AC-3 帧: 48kHz, 6 块, 5.1, 帧长 512 字节
    fn build_eac3_frame() -> Vec<u8> {
        build_eac3_substream(0, 0)
    }

    fn build_eac3_substream(strmtyp: u8, substreamid: u8) -> Vec<u8> {
        let frmsiz: u16 = 255; // (255 + 1) * 2 = 512
        let mut frame = vec![0u8; 512];
        frame[0] = 0x0B;
        frame[1] = 0x77;
        // strmtyp, substreamid, frmsiz 高 3 位
        frame[2] = (strmtyp << 6) | (substreamid << 3) | ((frmsiz >> 8) as u8 & 0x07);
        frame[3] = frmsiz as u8;
        // fscod=00, numblkscod=11, acmod=111, lfeon=1
        frame[4] = 0b0011_1111;
        frame[5] = 16 << 3;
        frame
    }

    #[test]
    fn test_parse_ac3_header() {
        let header = parse_header(&build_ac3_frame(false)).expect("应能解析");
        assert_eq!(header.sample_rate, 48000);
        assert_eq!(header.channels, 2);
        assert_eq!(header.bsid, 8);
        assert_eq!(header.frame_size, 256);
        assert_eq!(header.samples, 1536);
        assert_eq!(header.bit_rate, 64);
        assert_eq!(header.codec_id(), CodecId::Ac3);
    }

    #[test]
    fn test_parse_ac3_lfe() {
        let header = parse_header(&build_ac3_frame(true)).unwrap();
        assert!(header.lfe);
        assert_eq!(header.channels, 3);
    }

    #[test]
    fn test_parse_ac3_44100_帧长() {
        let mut frame = build_ac3_frame(false);
        // fscod=1, frmsizecod=1 (32kbps, 奇数)
        frame[4] = (1 << 6) | 1;
        let header = parse_header(&frame).unwrap();
        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.frame_size, 70 * 2);

        frame[4] = 1 << 6;
        assert_eq!(parse_header(&frame).unwrap().frame_size, 69 * 2);
    }

    #[test]
    fn test_parse_eac3_header() {
        let header = parse_header(&build_eac3_frame()).unwrap();
        assert!(header.is_eac3());
        assert_eq!(header.codec_id(), CodecId::Eac3);
        assert_eq!(header.sample_rate, 48000);
        assert_eq!(header.channels, 6);
        assert_eq!(header.frame_size, 512);
        assert_eq!(header.samples, 1536);
        assert_eq!(header.strmtyp, 0);
        assert!(header.starts_access_unit());
    }

    #[test]
    fn test_eac3_子流类型() {
        let dependent = parse_header(&build_eac3_substream(1, 0)).unwrap();
        assert_eq!(dependent.strmtyp, 1);
        assert!(!dependent.starts_access_unit());

        let extra = parse_header(&build_eac3_substream(0, 2)).unwrap();
        assert_eq!(extra.substreamid, 2);
        assert!(!extra.starts_access_unit());

        assert!(parse_header(&build_eac3_substream(3, 0)).is_none());
        assert!(parse_header(&build_ac3_frame(false)).unwrap().starts_access_unit());
    }

    #[test]
    fn test_parse_header_reject() {
        assert!(parse_header(&[0u8; 16]).is_none());
        assert!(parse_header(&[0x0B, 0x77, 0, 0]).is_none());

        let mut frame = build_ac3_frame(false);
        frame[4] = 0xC0 | 8; // fscod=3 保留
        assert!(parse_header(&frame).is_none());

        let mut frame = build_ac3_frame(false);
        frame[4] = 38; // frmsizecod 越界
        assert!(parse_header(&frame).is_none());

        let mut frame = build_ac3_frame(false);
        frame[5] = 20 << 3; // bsid 未知
        assert!(parse_header(&frame).is_none());
    }

    #[test]
    fn test_find_header_跳过垃圾() {
        let mut data = vec![0xFFu8; 13];
        data.extend_from_slice(&build_ac3_frame(false));
        let (pos, header) = find_header(&data).unwrap();
        assert_eq!(pos, 13);
        assert_eq!(header.frame_size, 256);
    }

    #[test]
    fn test_find_consecutive_headers() {
        let mut data = vec![0x55u8; 7];
        for _ in 0..4 {
            data.extend_from_slice(&build_ac3_frame(false));
        }
        assert_eq!(find_consecutive_headers(&data, 4), Some(7));
        assert_eq!(find_consecutive_headers(&data, 2), Some(7));
        assert_eq!(find_consecutive_headers(&data, 5), None);
    }

    #[test]
    fn test_find_consecutive_headers_参数不一致() {
        let mut data = build_ac3_frame(false);
        let mut other = build_ac3_frame(false);
        other[4] = (2 << 6) | 8; // 32kHz
        data.extend_from_slice(&other);
        assert_eq!(find_consecutive_headers(&data, 2), None);
    }
}
