use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use dxfview_config::LoaderConfig;

/// 文档来源：远程 URL、本地路径或已在内存中的文件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceReference {
    Url(String),
    Path(PathBuf),
    Memory { name: String, bytes: Vec<u8> },
}

impl SourceReference {
    /// 以 `http://` 或 `https://` 开头视为 URL，否则视为路径。
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            SourceReference::Url(trimmed.to_string())
        } else {
            SourceReference::Path(PathBuf::from(trimmed))
        }
    }

    pub fn memory(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        SourceReference::Memory {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl fmt::Display for SourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceReference::Url(url) => f.write_str(url),
            SourceReference::Path(path) => write!(f, "{}", path.display()),
            SourceReference::Memory { name, bytes } => {
                write!(f, "memory:{name} ({} bytes)", bytes.len())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("请求 {url} 失败: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("请求 {url} 返回状态码 {status}")]
    Status { url: String, status: u16 },
    #[error("读取文件 {path:?} 失败: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("初始化加载器失败: {0}")]
    Runtime(String),
}

/// 加载结果的 future。不借用加载器，可以在视口之外独立等待。
pub type LoadFuture = Pin<Box<dyn Future<Output = Result<String, LoadError>> + Send + 'static>>;

/// 把来源解析为原始文档文本。每次调用恰好产生一个结果，不做重试。
pub trait SourceLoader {
    fn load(&self, source: SourceReference) -> LoadFuture;
}

/// 基于 `reqwest` 与 `tokio::fs` 的默认加载器。
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    client: reqwest::Client,
}

impl DocumentLoader {
    pub fn new(config: &LoaderConfig) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| LoadError::Runtime(err.to_string()))?;
        Ok(Self { client })
    }
}

impl SourceLoader for DocumentLoader {
    fn load(&self, source: SourceReference) -> LoadFuture {
        let client = self.client.clone();
        Box::pin(async move {
            match source {
                SourceReference::Url(url) => fetch_url(&client, url).await,
                SourceReference::Path(path) => read_path(path).await,
                SourceReference::Memory { name, bytes } => decode(bytes, name),
            }
        })
    }
}

async fn fetch_url(client: &reqwest::Client, url: String) -> Result<String, LoadError> {
    info!(url = %url, "开始下载 DXF");
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|source| LoadError::Network {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        warn!(url = %url, status = status.as_u16(), "下载 DXF 失败");
        return Err(LoadError::Status {
            url,
            status: status.as_u16(),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|source| LoadError::Network {
            url: url.clone(),
            source,
        })?;
    decode(bytes.to_vec(), url)
}

async fn read_path(path: PathBuf) -> Result<String, LoadError> {
    debug!(path = %path.display(), "读取本地 DXF");
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|source| LoadError::Read {
            path: path.clone(),
            source,
        })?;
    decode(bytes, path.display().to_string())
}

/// 按 UTF-8 有损解码，旧代码页的非 ASCII 字节会被替换而不是报错。
///
/// 空内容也是有效结果，由解析器判定为空文档。
fn decode(bytes: Vec<u8>, label: String) -> Result<String, LoadError> {
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            debug!(source_label = %label, "文档不是合法 UTF-8，按有损方式解码");
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    fn loader() -> DocumentLoader {
        DocumentLoader::new(&LoaderConfig::default()).expect("build loader")
    }

    /// 在本地端口上对单个请求回复固定的状态行与正文，返回请求地址。
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = stream.read(&mut buf).await.expect("read request");
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            stream.shutdown().await.ok();
        });
        format!("http://{addr}/drawing.dxf")
    }

    #[tokio::test]
    async fn url_source_returns_body_text() {
        let url = serve_once("200 OK", "0\nEOF\n").await;
        let text = loader()
            .load(SourceReference::parse(&url))
            .await
            .expect("download");
        assert_eq!(text, "0\nEOF\n");
    }

    #[tokio::test]
    async fn url_non_success_status_fails() {
        let url = serve_once("404 Not Found", "missing").await;
        let err = loader()
            .load(SourceReference::Url(url.clone()))
            .await
            .unwrap_err();
        match err {
            LoadError::Status { url: failed, status } => {
                assert_eq!(status, 404);
                assert_eq!(failed, url);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        // 绑定后立即释放，端口上不再有监听者
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let err = loader()
            .load(SourceReference::Url(format!("http://{addr}/drawing.dxf")))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Network { .. }));
    }

    #[test]
    fn parse_distinguishes_urls_from_paths() {
        assert_eq!(
            SourceReference::parse("https://example.com/a.dxf"),
            SourceReference::Url("https://example.com/a.dxf".to_string())
        );
        assert_eq!(
            SourceReference::parse("HTTP://host/b.dxf"),
            SourceReference::Url("HTTP://host/b.dxf".to_string())
        );
        assert_eq!(
            SourceReference::parse("drawings/c.dxf"),
            SourceReference::Path(PathBuf::from("drawings/c.dxf"))
        );
    }

    #[tokio::test]
    async fn reads_path_and_memory_sources() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(file, "0\nEOF\n").unwrap();

        let text = loader()
            .load(SourceReference::Path(file.path().to_path_buf()))
            .await
            .expect("read file");
        assert_eq!(text, "0\nEOF\n");

        let text = loader()
            .load(SourceReference::memory("inline.dxf", b"0\nEOF\n".to_vec()))
            .await
            .expect("decode memory");
        assert_eq!(text, "0\nEOF\n");
    }

    #[tokio::test]
    async fn missing_file_fails_and_empty_content_is_returned() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = loader()
            .load(SourceReference::Path(dir.path().join("absent.dxf")))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));

        let text = loader()
            .load(SourceReference::memory("empty.dxf", Vec::new()))
            .await
            .expect("empty memory source");
        assert!(text.is_empty());

        let empty = tempfile::NamedTempFile::new().expect("create temp file");
        let text = loader()
            .load(SourceReference::Path(empty.path().to_path_buf()))
            .await
            .expect("empty file");
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn non_utf8_bytes_are_decoded_lossily() {
        let bytes = b"0\nTEXT\n1\n\xb2\xe2\xca\xd4\n".to_vec();
        let text = loader()
            .load(SourceReference::memory("gbk.dxf", bytes))
            .await
            .expect("lossy decode");
        assert!(text.starts_with("0\nTEXT\n1\n"));
        assert!(text.contains('\u{fffd}'));
    }
}
