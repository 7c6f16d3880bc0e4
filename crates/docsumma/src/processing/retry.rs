//! Two-step conversion policy: plain first, OCR once on failure

use std::fmt;

/// Which conversion attempt is being made for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionAttempt {
    /// Layout extraction only
    WithoutOcr,
    /// Page images through OCR; the last attempt
    WithOcr,
}

impl ConversionAttempt {
    pub fn first() -> Self {
        Self::WithoutOcr
    }

    pub fn ocr_enabled(self) -> bool {
        matches!(self, Self::WithOcr)
    }

    /// The attempt to make after a conversion failure, if any
    pub fn next(self) -> Option<Self> {
        match self {
            Self::WithoutOcr => Some(Self::WithOcr),
            Self::WithOcr => None,
        }
    }

    /// 1-based attempt number
    pub fn number(self) -> u32 {
        match self {
            Self::WithoutOcr => 1,
            Self::WithOcr => 2,
        }
    }
}

impl fmt::Display for ConversionAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WithoutOcr => f.write_str("without OCR"),
            Self::WithOcr => f.write_str("with OCR"),
        }
    }
}
