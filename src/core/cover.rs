// Cover art fetching and preparation
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use std::time::Duration;

use crate::error::{Result, SideStepError};

/// Longest edge of an embedded cover, in pixels
pub const MAX_COVER_EDGE: u32 = 1000;

pub const COVER_JPEG_QUALITY: u8 = 95;

pub const COVER_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Some image CDNs reject requests without a browser identity
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Where cover images come from
pub trait CoverSource {
    fn fetch_cover(&self, url: &str) -> std::result::Result<Vec<u8>, SideStepError>;
}

pub struct HttpCoverSource {
    client: reqwest::blocking::Client,
}

impl HttpCoverSource {
    pub fn new() -> Result<Self> {
        Self::from_builder(reqwest::blocking::Client::builder())
    }

    pub(crate) fn from_builder(builder: reqwest::blocking::ClientBuilder) -> Result<Self> {
        let client = builder
            .user_agent(BROWSER_USER_AGENT)
            .timeout(COVER_FETCH_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl CoverSource for HttpCoverSource {
    fn fetch_cover(&self, url: &str) -> std::result::Result<Vec<u8>, SideStepError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| SideStepError::cover(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SideStepError::cover(format!("HTTP {} for {}", status, url)));
        }

        log::debug!(
            "Thumbnail response: status={}, type={:?}, length={:?}",
            status,
            response.headers().get(reqwest::header::CONTENT_TYPE),
            response.content_length()
        );

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| SideStepError::cover(format!("reading body of {} failed: {}", url, e)))
    }
}

/// Scale `(width, height)` down so neither edge exceeds `max_edge`; never upscales
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_edge || longest == 0 {
        return (width, height);
    }
    let scale = |v: u32| {
        ((u64::from(v) * u64::from(max_edge)) / u64::from(longest)).max(1) as u32
    };
    (scale(width), scale(height))
}

/// Decode, downscale and re-encode a cover as baseline JPEG
pub fn prepare_cover(bytes: &[u8]) -> std::result::Result<Vec<u8>, SideStepError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| SideStepError::cover(format!("could not decode image: {}", e)))?;

    let (width, height) = decoded.dimensions();
    let (target_w, target_h) = fit_within(width, height, MAX_COVER_EDGE);
    let resized = if (target_w, target_h) == (width, height) {
        decoded
    } else {
        decoded.resize_exact(target_w, target_h, FilterType::Lanczos3)
    };

    let rgb = resized.to_rgb8();
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, COVER_JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| SideStepError::cover(format!("could not encode JPEG: {}", e)))?;

    log::debug!(
        "Cover processed: {}x{} -> {}x{}, {} bytes",
        width,
        height,
        target_w,
        target_h,
        encoded.len()
    );

    Ok(encoded)
}

/// One-shot HTTP server on loopback answering with `status` and `body`
#[cfg(test)]
pub(crate) fn serve_once(status: &'static str, body: Vec<u8>) -> String {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request);
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
        }
    });
    format!("http://{}/vi/abc/maxresdefault.jpg", addr)
}

/// Client that ignores proxy variables so loopback requests stay local
#[cfg(test)]
pub(crate) fn loopback_cover_source() -> HttpCoverSource {
    HttpCoverSource::from_builder(reqwest::blocking::Client::builder().no_proxy()).unwrap()
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    use image::{DynamicImage, ImageFormat, RgbImage};

    let pixel = image::Rgb([200, 10, 10]);
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, pixel));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}
