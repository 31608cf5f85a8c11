//! License verification against the code-hosting API.

pub mod classifier;
pub mod client;

pub use classifier::{LicenseClassifier, LicenseVerdict, OPEN_SOURCE_LICENSES};
pub use client::{ApiClient, ApiResponse};
