//! 基本流码流解析器.

pub mod ac3;
