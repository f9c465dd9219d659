//! Pipeline-level error: one variant per stage, each mapped to an exit code.

use crate::archive::ArchiveError;
use crate::path_env::RegistrationError;
use crate::release::ResolutionError;
use crate::transport::TransportError;
use crate::verify::VerificationError;
use std::fmt;

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Download,
    Extract,
    Verify,
    RegisterPath,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Resolve => "resolve",
            Stage::Download => "download",
            Stage::Extract => "extract",
            Stage::Verify => "verify",
            Stage::RegisterPath => "register-path",
        }
    }

    /// Process exit code for a failure in this stage.
    pub fn exit_code(self) -> i32 {
        match self {
            Stage::Resolve => 2,
            Stage::Download => 3,
            Stage::Extract => 4,
            Stage::Verify => 5,
            Stage::RegisterPath => 6,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("resolve failed: {0}")]
    Resolution(#[from] ResolutionError),
    #[error("download failed: {0}")]
    Transport(#[from] TransportError),
    #[error("extract failed: {0}")]
    Archive(#[from] ArchiveError),
    #[error("verify failed: {0}")]
    Verification(#[from] VerificationError),
    #[error("register-path failed: {0}")]
    Registration(#[from] RegistrationError),
}

impl InstallError {
    pub fn stage(&self) -> Stage {
        match self {
            InstallError::Resolution(_) => Stage::Resolve,
            InstallError::Transport(_) => Stage::Download,
            InstallError::Archive(_) => Stage::Extract,
            InstallError::Verification(_) => Stage::Verify,
            InstallError::Registration(_) => Stage::RegisterPath,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.stage().exit_code()
    }

    /// Timeouts surface as their own subtype in every stage that has one.
    pub fn is_timeout(&self) -> bool {
        match self {
            InstallError::Resolution(ResolutionError::Timeout { .. }) => true,
            InstallError::Transport(e) => e.is_timeout(),
            InstallError::Verification(VerificationError::Timeout { .. }) => true,
            _ => false,
        }
    }
}
