/// Output options that do not affect layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Deflate page content streams and embedded font programs.
    pub compress: bool,
    /// Written to the `/Producer` entry of the document information.
    pub producer: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            compress: true,
            producer: concat!("quire ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl RenderConfig {
    pub fn uncompressed() -> Self {
        Self {
            compress: false,
            ..Self::default()
        }
    }
}
