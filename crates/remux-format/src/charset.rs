//! 文本字符集解码.
//!
//! 优先依据 BOM 判断编码 (UTF-8, UTF-16LE/BE), 其次使用调用方给出的字符集标签,
//! 都没有时按 UTF-8 解码. 无法解码的字节替换为 U+FFFD.

use encoding_rs::{Encoding, UTF_8};
use log::warn;

/// 解码结果
#[derive(Debug, Clone)]
pub struct DecodedText {
    /// 解码后的文本 (不含 BOM)
    pub text: String,
    /// 实际使用的编码
    pub encoding: &'static Encoding,
    /// 是否存在无法解码的字节
    pub had_errors: bool,
    /// 编码是否来自 BOM
    pub from_bom: bool,
}

/// 解码文本字节
///
/// `charset` 为 WHATWG 字符集标签 (如 "windows-1252", "gbk"), 未知标签按 UTF-8 处理.
pub fn decode_text(data: &[u8], charset: Option<&str>) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(data) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&data[bom_len..]);
        return DecodedText {
            text: text.into_owned(),
            encoding,
            had_errors,
            from_bom: true,
        };
    }

    let encoding = match charset {
        Some(label) => Encoding::for_label(label.trim().as_bytes()).unwrap_or_else(|| {
            warn!("未知字符集 '{label}', 按 UTF-8 解码");
            UTF_8
        }),
        None => UTF_8,
    };
    let (text, had_errors) = encoding.decode_without_bom_handling(data);
    DecodedText {
        text: text.into_owned(),
        encoding,
        had_errors,
        from_bom: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_bom() {
        let decoded = decode_text(b"\xEF\xBB\xBF1\n", None);
        assert_eq!(decoded.text, "1\n");
        assert_eq!(decoded.encoding, UTF_8);
        assert!(decoded.from_bom);
    }

    #[test]
    fn test_utf16le_bom() {
        let mut data = vec![0xFF, 0xFE];
        for unit in "Hé".encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        let decoded = decode_text(&data, Some("windows-1252"));
        assert_eq!(decoded.text, "Hé");
        assert_eq!(decoded.encoding, encoding_rs::UTF_16LE);
    }

    #[test]
    fn test_字符集标签() {
        let decoded = decode_text(b"caf\xE9", Some("windows-1252"));
        assert_eq!(decoded.text, "café");
        assert!(!decoded.had_errors);

        let decoded = decode_text(b"caf\xE9", None);
        assert!(decoded.had_errors);

        let decoded = decode_text(b"abc", Some("no-such-charset"));
        assert_eq!(decoded.encoding, UTF_8);
    }
}
