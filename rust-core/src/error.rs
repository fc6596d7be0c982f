//! Error types for front-end bootstrap
//!
//! Every failure is terminal for the init call that produced it. Partially
//! populated states keep whatever was allocated before the failing step.

use thiserror::Error;

/// Coarse failure category, for callers that only branch on the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A buffer could not be obtained from either pool
    AllocationFailure,

    /// The FFT library did not honor the scratch-memory contract
    LibraryContractViolation,
}

/// Ways an FFT library can break the two-phase scratch negotiation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("scratch sizing for transform length {transform_len} returned a usable plan")]
    SizingReturnedPlan { transform_len: usize },

    #[error("plan for transform length {transform_len} was not placed in the provided scratch buffer")]
    PlanOutsideScratch { transform_len: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrontendError {
    #[error("Failed to allocate {buffer} ({bytes} bytes)")]
    Allocation { buffer: &'static str, bytes: usize },

    #[error("FFT library contract violated: {0}")]
    LibraryContract(#[from] ContractViolation),
}

impl FrontendError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FrontendError::Allocation { .. } => ErrorKind::AllocationFailure,
            FrontendError::LibraryContract(_) => ErrorKind::LibraryContractViolation,
        }
    }
}

pub type Result<T> = std::result::Result<T, FrontendError>;
