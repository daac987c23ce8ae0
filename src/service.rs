//! Interface to the external image generation/editing collaborator.
//!
//! The collaborator is opaque: given a request it returns an encoded image
//! or a service error whose message is surfaced to the user verbatim. No
//! transport lives here; integrations implement [`ImageService`].

use thiserror::Error;

use crate::artifact::EncodedImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpscaleTier {
    Standard,
    Premium,
}

impl UpscaleTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Premium => "Premium",
        }
    }

    /// Resolution label carried by artifacts produced at this tier.
    pub const fn result_label(self) -> &'static str {
        match self {
            Self::Standard => "Upscaled 2x",
            Self::Premium => "Upscaled 4x",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("image service credentials are missing")]
    MissingCredentials,
    #[error("image service resource not found: {resource}")]
    NotFound { resource: String },
    #[error("image service response carried no image")]
    EmptyResponse,
    #[error("image service request failed: {message}")]
    RequestFailed { message: String },
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

pub trait ImageService {
    fn generate(&self, prompt: &str) -> ServiceResult<EncodedImage>;
    fn edit(&self, source: &EncodedImage, instruction: &str) -> ServiceResult<EncodedImage>;
    fn edit_with_mask(
        &self,
        source: &EncodedImage,
        mask: &EncodedImage,
        instruction: &str,
    ) -> ServiceResult<EncodedImage>;
    fn upscale(&self, source: &EncodedImage, tier: UpscaleTier) -> ServiceResult<EncodedImage>;
}

/// Identity of one in-flight external call. A completion whose token no
/// longer matches the active request is discarded instead of applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

impl RequestToken {
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}
