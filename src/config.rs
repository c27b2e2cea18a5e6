// Command line and environment configuration
use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "classify_server",
    version,
    about = "A web server with an ONNX image classification model"
)]
pub struct Config {
    /// Path to ONNX model
    #[arg(short, long, env = "CLASSIFY_MODEL_PATH")]
    pub model_path: PathBuf,

    /// Path to file with labels for the model, one per line
    #[arg(short, long, env = "CLASSIFY_LABELS_PATH")]
    pub labels_path: PathBuf,

    /// Listen address
    #[arg(long, env = "CLASSIFY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Listen port
    #[arg(short, long, env = "CLASSIFY_PORT", default_value_t = 80)]
    pub port: u16,

    /// strftime-style format for log timestamps
    #[arg(long, env = "CLASSIFY_DATE_FORMAT", default_value = "%Y-%m-%d %H:%M:%S")]
    pub format: String,

    /// Number of HTTP workers (defaults to one per core)
    #[arg(long, env = "CLASSIFY_WORKERS")]
    pub workers: Option<usize>,

    /// Largest accepted image upload in bytes
    #[arg(long, env = "CLASSIFY_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
