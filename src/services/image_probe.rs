use async_trait::async_trait;
use image::{ImageFormat, ImageReader};
use log::debug;
use reqwest::{Client, Response};
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::time::sleep;
use url::Url;

use crate::config::probe;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Empty image address")]
    EmptyUri,

    #[error("Unsupported image encoding")]
    UnsupportedFormat,

    #[error("Malformed image header")]
    MalformedHeader,

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a regular file: {path}")]
    NotAFile { path: String },

    #[error("Max retries exceeded for {uri}")]
    RetriesExhausted { uri: String },
}

/// Pixel size of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Resolves the pixel size of an image payload
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn probe(&self, uri: &str) -> Result<Dimensions, ProbeError>;
}

/// Probe reading `http(s)` URIs over the network and everything else from disk
pub struct HttpImageProbe {
    client: Client,
    retry_delay: Duration,
}

impl HttpImageProbe {
    const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

    pub fn new() -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(probe::TIMEOUT_SECS))
            .user_agent(probe::USER_AGENT)
            .build()?;

        Ok(HttpImageProbe {
            client,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
        })
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    // Download with retry, backing off on network errors and 429
    async fn download(&self, uri: &str) -> Result<Vec<u8>, ProbeError> {
        let mut last_error = None;

        for attempt in 1..=probe::MAX_RETRIES {
            match self.client.get(uri).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match read_body(response).await {
                            Ok(bytes) => return Ok(bytes),
                            Err(e) => last_error = Some(ProbeError::Network(e)),
                        }
                    } else if status.as_u16() == 429 {
                        last_error = Some(ProbeError::HttpError { status: 429 });
                    } else {
                        return Err(ProbeError::HttpError {
                            status: status.as_u16(),
                        });
                    }
                }
                Err(e) => last_error = Some(ProbeError::Network(e)),
            }

            if attempt < probe::MAX_RETRIES {
                sleep(self.retry_delay * 2_u32.pow(attempt - 1)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| ProbeError::RetriesExhausted {
            uri: uri.to_string(),
        }))
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn probe(&self, uri: &str) -> Result<Dimensions, ProbeError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(ProbeError::EmptyUri);
        }

        let bytes = match Url::parse(uri) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => self.download(uri).await?,
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| ProbeError::UnsupportedFormat)?;
                read_file(&path).await?
            }
            // Relative references and plain paths are read from disk
            _ => read_file(Path::new(uri)).await?,
        };

        let dimensions = sniff_dimensions(&bytes)?;
        debug!("Probed {uri}: {}x{}", dimensions.width, dimensions.height);
        Ok(dimensions)
    }
}

// Streams the body, stopping once the header cap is reached
async fn read_body(mut response: Response) -> Result<Vec<u8>, reqwest::Error> {
    let cap = probe::MAX_HEADER_BYTES as usize;
    let mut body = Vec::new();
    while body.len() < cap {
        match response.chunk().await? {
            Some(chunk) => body.extend_from_slice(&chunk),
            None => break,
        }
    }
    body.truncate(cap);
    Ok(body)
}

// Only regular files are opened; devices and pipes never reach `open`
async fn read_file(path: &Path) -> Result<Vec<u8>, ProbeError> {
    if !tokio::fs::metadata(path).await?.is_file() {
        return Err(ProbeError::NotAFile {
            path: path.display().to_string(),
        });
    }

    let mut bytes = Vec::new();
    File::open(path)
        .await?
        .take(probe::MAX_HEADER_BYTES)
        .read_to_end(&mut bytes)
        .await?;
    Ok(bytes)
}

/// Read the pixel size from an encoded image header.
///
/// GIF, JPEG, PNG and BMP go through `image`; JPEG2000 headers are parsed
/// directly since `image` has no decoder for them.
pub fn sniff_dimensions(bytes: &[u8]) -> Result<Dimensions, ProbeError> {
    if is_jpeg2000(bytes) {
        return jpeg2000_dimensions(bytes);
    }

    let format = image::guess_format(bytes).map_err(|_| ProbeError::UnsupportedFormat)?;
    match format {
        ImageFormat::Gif | ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Bmp => {
            let (width, height) =
                ImageReader::with_format(Cursor::new(bytes), format).into_dimensions()?;
            Ok(Dimensions { width, height })
        }
        _ => Err(ProbeError::UnsupportedFormat),
    }
}

const JP2_SIGNATURE: [u8; 12] = [
    0x00, 0x00, 0x00, 0x0C, b'j', b'P', b' ', b' ', 0x0D, 0x0A, 0x87, 0x0A,
];

// SOC marker followed by SIZ
const J2K_CODESTREAM: [u8; 4] = [0xFF, 0x4F, 0xFF, 0x51];

fn is_jpeg2000(bytes: &[u8]) -> bool {
    bytes.starts_with(&JP2_SIGNATURE) || bytes.starts_with(&J2K_CODESTREAM)
}

fn jpeg2000_dimensions(bytes: &[u8]) -> Result<Dimensions, ProbeError> {
    if bytes.starts_with(&J2K_CODESTREAM) {
        return codestream_dimensions(bytes).ok_or(ProbeError::MalformedHeader);
    }

    // ihdr holds HEIGHT then WIDTH inside the jp2h superbox
    let ihdr = find_box(bytes, b"jp2h")
        .and_then(|header| find_box(header, b"ihdr"))
        .ok_or(ProbeError::MalformedHeader)?;
    let height = read_u32(ihdr, 0).ok_or(ProbeError::MalformedHeader)?;
    let width = read_u32(ihdr, 4).ok_or(ProbeError::MalformedHeader)?;
    Ok(Dimensions { width, height })
}

// SIZ: Lsiz(2) Rsiz(2) Xsiz(4) Ysiz(4) XOsiz(4) YOsiz(4)
fn codestream_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    let x_size = read_u32(bytes, 8)?;
    let y_size = read_u32(bytes, 12)?;
    let x_offset = read_u32(bytes, 16)?;
    let y_offset = read_u32(bytes, 20)?;
    Some(Dimensions {
        width: x_size.checked_sub(x_offset)?,
        height: y_size.checked_sub(y_offset)?,
    })
}

fn find_box<'b>(mut data: &'b [u8], kind: &[u8; 4]) -> Option<&'b [u8]> {
    while data.len() >= 8 {
        let (header_len, box_len) = match read_u32(data, 0)? {
            0 => (8, data.len() as u64),
            1 => (16, read_u64(data, 8)?),
            n => (8, u64::from(n)),
        };
        if box_len < header_len as u64 || box_len > data.len() as u64 {
            return None;
        }
        let box_len = box_len as usize;
        if &data[4..8] == kind {
            return Some(&data[header_len..box_len]);
        }
        data = &data[box_len..];
    }
    None
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let raw = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes(raw.try_into().ok()?))
}

fn read_u64(data: &[u8], offset: usize) -> Option<u64> {
    let raw = data.get(offset..offset + 8)?;
    Some(u64::from_be_bytes(raw.try_into().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        // GIF frames are written from RGBA
        let img = match format {
            ImageFormat::Gif => image::DynamicImage::ImageRgba8(img.to_rgba8()),
            _ => img,
        };
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    fn jp2_file(width: u32, height: u32) -> Vec<u8> {
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&22u32.to_be_bytes());
        ihdr.extend_from_slice(b"ihdr");
        ihdr.extend_from_slice(&height.to_be_bytes());
        ihdr.extend_from_slice(&width.to_be_bytes());
        ihdr.extend_from_slice(&[0x00, 0x03, 0x07, 0x07, 0x00, 0x00]);

        let mut bytes = JP2_SIGNATURE.to_vec();
        // ftyp box
        bytes.extend_from_slice(&20u32.to_be_bytes());
        bytes.extend_from_slice(b"ftyp");
        bytes.extend_from_slice(b"jp2 ");
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(b"jp2 ");
        // jp2h superbox
        bytes.extend_from_slice(&(8 + ihdr.len() as u32).to_be_bytes());
        bytes.extend_from_slice(b"jp2h");
        bytes.extend_from_slice(&ihdr);
        bytes
    }

    #[test]
    fn test_sniff_png_and_bmp() {
        let png = encode(3, 2, ImageFormat::Png);
        assert_eq!(
            sniff_dimensions(&png).unwrap(),
            Dimensions { width: 3, height: 2 }
        );

        let bmp = encode(5, 4, ImageFormat::Bmp);
        assert_eq!(
            sniff_dimensions(&bmp).unwrap(),
            Dimensions { width: 5, height: 4 }
        );
    }

    #[test]
    fn test_sniff_gif_and_jpeg() {
        let gif = encode(6, 3, ImageFormat::Gif);
        assert_eq!(
            sniff_dimensions(&gif).unwrap(),
            Dimensions { width: 6, height: 3 }
        );

        let jpeg = encode(16, 10, ImageFormat::Jpeg);
        assert_eq!(
            sniff_dimensions(&jpeg).unwrap(),
            Dimensions { width: 16, height: 10 }
        );
    }

    #[test]
    fn test_sniff_jp2_container() {
        let bytes = jp2_file(640, 480);
        assert_eq!(
            sniff_dimensions(&bytes).unwrap(),
            Dimensions { width: 640, height: 480 }
        );
    }

    #[test]
    fn test_sniff_j2k_codestream() {
        let mut bytes = J2K_CODESTREAM.to_vec();
        bytes.extend_from_slice(&41u16.to_be_bytes()); // Lsiz
        bytes.extend_from_slice(&0u16.to_be_bytes()); // Rsiz
        bytes.extend_from_slice(&1034u32.to_be_bytes()); // Xsiz
        bytes.extend_from_slice(&778u32.to_be_bytes()); // Ysiz
        bytes.extend_from_slice(&10u32.to_be_bytes()); // XOsiz
        bytes.extend_from_slice(&10u32.to_be_bytes()); // YOsiz

        assert_eq!(
            sniff_dimensions(&bytes).unwrap(),
            Dimensions { width: 1024, height: 768 }
        );
    }

    #[test]
    fn test_sniff_rejects_unknown_and_truncated() {
        assert!(matches!(
            sniff_dimensions(b"<html>not an image</html>"),
            Err(ProbeError::UnsupportedFormat)
        ));
        assert!(matches!(
            sniff_dimensions(&JP2_SIGNATURE),
            Err(ProbeError::MalformedHeader)
        ));
    }

    #[tokio::test]
    async fn test_probe_local_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&encode(7, 9, ImageFormat::Png)).unwrap();

        let probe = HttpImageProbe::new().unwrap();
        let dims = probe.probe(&file.path().to_string_lossy()).await.unwrap();
        assert_eq!(dims, Dimensions { width: 7, height: 9 });
    }

    #[tokio::test]
    async fn test_probe_remote_image() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thumb.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(encode(12, 8, ImageFormat::Png)))
            .mount(&server)
            .await;

        let probe = HttpImageProbe::new().unwrap();
        let dims = probe
            .probe(&format!("{}/thumb.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(dims, Dimensions { width: 12, height: 8 });
    }

    #[tokio::test]
    async fn test_probe_remote_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let probe = HttpImageProbe::new()
            .unwrap()
            .with_retry_delay(Duration::from_millis(1));
        let result = probe.probe(&format!("{}/missing.jpg", server.uri())).await;
        assert!(matches!(result, Err(ProbeError::HttpError { status: 404 })));
    }

    #[tokio::test]
    async fn test_probe_empty_uri() {
        let probe = HttpImageProbe::new().unwrap();
        assert!(matches!(probe.probe("  ").await, Err(ProbeError::EmptyUri)));
    }

    #[tokio::test]
    async fn test_large_file_is_read_up_to_header_cap() {
        let cap = probe::MAX_HEADER_BYTES as usize;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&encode(4, 4, ImageFormat::Png)).unwrap();
        file.write_all(&vec![0u8; cap * 2]).unwrap();

        let bytes = read_file(file.path()).await.unwrap();
        assert_eq!(bytes.len(), cap);

        let probe = HttpImageProbe::new().unwrap();
        let dims = probe.probe(&file.path().to_string_lossy()).await.unwrap();
        assert_eq!(dims, Dimensions { width: 4, height: 4 });
    }

    #[tokio::test]
    async fn test_directory_is_not_read() {
        let dir = tempfile::tempdir().unwrap();
        let probe = HttpImageProbe::new().unwrap();
        let result = probe.probe(&dir.path().to_string_lossy()).await;
        assert!(matches!(result, Err(ProbeError::NotAFile { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_device_file_is_not_read() {
        let probe = HttpImageProbe::new().unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), probe.probe("/dev/zero"))
            .await
            .expect("reading /dev/zero must not hang");
        assert!(matches!(result, Err(ProbeError::NotAFile { .. })));
    }

    #[tokio::test]
    async fn test_remote_body_is_read_up_to_header_cap() {
        let mut body = encode(9, 5, ImageFormat::Png);
        body.extend(vec![0u8; probe::MAX_HEADER_BYTES as usize * 3]);

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/huge.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&server)
            .await;

        let probe = HttpImageProbe::new().unwrap();
        let dims = probe
            .probe(&format!("{}/huge.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(dims, Dimensions { width: 9, height: 5 });
    }

    #[tokio::test]
    async fn test_rate_limited_download_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy.png"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/busy.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(encode(2, 3, ImageFormat::Png)))
            .expect(1)
            .mount(&server)
            .await;

        let probe = HttpImageProbe::new()
            .unwrap()
            .with_retry_delay(Duration::from_millis(1));
        let dims = probe
            .probe(&format!("{}/busy.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(dims, Dimensions { width: 2, height: 3 });
    }

    #[tokio::test]
    async fn test_rate_limit_gives_up_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy.png"))
            .respond_with(ResponseTemplate::new(429))
            .expect(u64::from(probe::MAX_RETRIES))
            .mount(&server)
            .await;

        let probe = HttpImageProbe::new()
            .unwrap()
            .with_retry_delay(Duration::from_millis(1));
        let result = probe.probe(&format!("{}/busy.png", server.uri())).await;
        assert!(matches!(result, Err(ProbeError::HttpError { status: 429 })));
    }
}
