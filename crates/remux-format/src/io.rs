//! 字节源抽象.
//!
//! 探测器与读取器通过 [`IoContext`] 访问可定位的只读字节源. 具体来源由实现了
//! [`ByteStream`] 的后端提供 (文件、内存缓冲区). 短读只表示接近流末尾, 不是错误.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use remux_core::{RemuxError, RemuxResult};

/// 字节源后端
///
/// 在标准库的 `Read + Seek` 之上补充总大小. 大小未知的流 (管道等) 返回 `None`,
/// 读取器此时无法给出精确进度.
pub trait ByteStream: Read + Seek + Send {
    /// 总字节数
    fn size(&self) -> Option<u64>;
}

/// 字节源上下文
///
/// 独占一个后端, 附带用于日志与识别报告的来源名.
pub struct IoContext {
    inner: Box<dyn ByteStream>,
    name: Option<String>,
}

impl IoContext {
    /// 从后端创建
    pub fn new(backend: Box<dyn ByteStream>) -> Self {
        Self {
            inner: backend,
            name: None,
        }
    }

    /// 从内存数据创建
    pub fn from_memory(data: impl Into<Vec<u8>>) -> Self {
        Self::new(Box::new(MemoryBackend::from_data(data.into())))
    }

    /// 以只读方式打开文件, 来源名取文件路径
    pub fn open_read(path: impl AsRef<Path>) -> RemuxResult<Self> {
        let path = path.as_ref();
        let backend = FileBackend::new(File::open(path)?)?;
        Ok(Self::new(Box::new(backend)).with_name(path.display().to_string()))
    }

    /// 设置来源名
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 来源名
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// 尽量读满 `buf`, 返回实际读取的字节数
    ///
    /// 返回值小于 `buf.len()` 表示已到达流末尾.
    pub fn read_up_to(&mut self, buf: &mut [u8]) -> RemuxResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    /// 读满 `buf`, 不足时返回 [`RemuxError::Eof`]
    pub fn read_exact(&mut self, buf: &mut [u8]) -> RemuxResult<()> {
        if self.read_up_to(buf)? < buf.len() {
            return Err(RemuxError::Eof);
        }
        Ok(())
    }

    /// 最多读取 `count` 字节
    pub fn read_bytes_up_to(&mut self, count: usize) -> RemuxResult<Vec<u8>> {
        let mut buf = vec![0u8; count];
        let n = self.read_up_to(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// 读取到流末尾
    pub fn read_to_end(&mut self) -> RemuxResult<Vec<u8>> {
        let remaining = self
            .size()
            .zip(self.position().ok())
            .map_or(0, |(size, pos)| size.saturating_sub(pos));
        let mut out = Vec::with_capacity(usize::try_from(remaining).unwrap_or(0));
        self.inner.read_to_end(&mut out)?;
        Ok(out)
    }

    /// 向前跳过 `count` 字节
    pub fn skip(&mut self, count: u64) -> RemuxResult<()> {
        let offset = i64::try_from(count)
            .map_err(|_| RemuxError::InvalidArgument(format!("跳过字节数过大: {count}")))?;
        self.inner.seek(SeekFrom::Current(offset))?;
        Ok(())
    }

    /// 定位
    pub fn seek(&mut self, pos: SeekFrom) -> RemuxResult<u64> {
        Ok(self.inner.seek(pos)?)
    }

    /// 回到流起始处
    pub fn rewind(&mut self) -> RemuxResult<()> {
        self.inner.rewind()?;
        Ok(())
    }

    /// 当前位置
    pub fn position(&mut self) -> RemuxResult<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// 总大小
    pub fn size(&self) -> Option<u64> {
        self.inner.size()
    }
}

/// 文件字节源, 带读缓冲
pub struct FileBackend {
    reader: BufReader<File>,
    size: Option<u64>,
}

impl FileBackend {
    /// 包装已打开的文件
    pub fn new(file: File) -> RemuxResult<Self> {
        let size = file.metadata()?.len();
        Ok(Self {
            reader: BufReader::new(file),
            size: Some(size),
        })
    }
}

impl Read for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Seek for FileBackend {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.reader.seek(pos)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        self.reader.stream_position()
    }
}

impl ByteStream for FileBackend {
    fn size(&self) -> Option<u64> {
        self.size
    }
}

/// 内存字节源
#[derive(Debug, Default)]
pub struct MemoryBackend {
    cursor: Cursor<Vec<u8>>,
}

impl MemoryBackend {
    /// 从已有数据创建
    pub fn from_data(data: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// 内部数据
    pub fn data(&self) -> &[u8] {
        self.cursor.get_ref()
    }
}

impl Read for MemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for MemoryBackend {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl ByteStream for MemoryBackend {
    fn size(&self) -> Option<u64> {
        Some(self.cursor.get_ref().len() as u64)
    }
}
