use std::{
    fmt,
    panic::Location,
    sync::{Arc, Mutex, PoisonError},
};

use itertools::Itertools;
use thiserror::Error;

/// Numeric failure code reported by a graphics device call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    pub const OUT_OF_MEMORY: Self = Self(0x8876_0001);
    pub const VALIDATION: Self = Self(0x8876_0002);
    pub const INTERNAL: Self = Self(0x8876_0003);
    pub const SHADER_COMPILATION: Self = Self(0x8876_0010);
    pub const INPUT_LAYOUT_MISMATCH: Self = Self(0x8876_0011);
    pub const SURFACE_LOST: Self = Self(0x8876_0020);
    pub const SURFACE_TIMEOUT: Self = Self(0x8876_0021);
    pub const DEVICE_REMOVED: Self = Self(0x8876_0030);

    /// Human readable translation of the code.
    pub fn describe(self) -> &'static str {
        match self {
            Self::OUT_OF_MEMORY => "The device ran out of memory while allocating a resource.",
            Self::VALIDATION => "The call was rejected by device validation.",
            Self::INTERNAL => "The device reported an internal error.",
            Self::SHADER_COMPILATION => "The shader source failed to compile.",
            Self::INPUT_LAYOUT_MISMATCH => {
                "The input layout does not match the vertex shader inputs."
            }
            Self::SURFACE_LOST => "The presentation surface was lost.",
            Self::SURFACE_TIMEOUT => "Acquiring the next frame timed out.",
            Self::DEVICE_REMOVED => "The graphics adapter was removed.",
            _ => "Unidentified error code",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X} ({})", self.0, self.0)
    }
}

/// Why the adapter went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalReason {
    Destroyed,
    Hung,
    Reset,
    DriverInternalError,
    InvalidCall,
    Unknown,
}

impl RemovalReason {
    pub fn code(self) -> u32 {
        match self {
            Self::Destroyed => 1,
            Self::Hung => 2,
            Self::Reset => 3,
            Self::DriverInternalError => 4,
            Self::InvalidCall => 5,
            Self::Unknown => 0xFF,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Destroyed => "device destroyed",
            Self::Hung => "device hung",
            Self::Reset => "device reset",
            Self::DriverInternalError => "driver internal error",
            Self::InvalidCall => "invalid call",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.describe(), self.code())
    }
}

/// Driver diagnostic messages attached to an error. Always empty in release builds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticInfo(Vec<String>);

impl DiagnosticInfo {
    pub fn new(messages: Vec<String>) -> Self {
        Self(messages)
    }

    pub fn single(message: impl Into<String>) -> Self {
        Self(vec![message.into()])
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn with(mut self, message: impl Into<String>) -> Self {
        self.0.push(message.into());
        self
    }
}

impl fmt::Display for DiagnosticInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<no diagnostic messages>");
        }

        write!(f, "{}", self.0.iter().join("\n\n"))
    }
}

/// Collects driver debug-layer messages between checkpoints.
///
/// Backends push into the log from device callbacks; error construction
/// takes everything recorded since the last [`DiagnosticLog::set`], which
/// discards older messages. Message retrieval is compiled out of release
/// builds.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    messages: Arc<Mutex<Vec<String>>>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("Driver diagnostic: {}", message);
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    /// Marks the point after which messages are reported.
    pub fn set(&self) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn messages(&self) -> DiagnosticInfo {
        if !cfg!(debug_assertions) {
            return DiagnosticInfo::default();
        }

        let messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        DiagnosticInfo::new(messages.clone())
    }

    /// Like [`DiagnosticLog::messages`], with `message` appended in debug builds.
    pub fn messages_with(&self, message: impl Into<String>) -> DiagnosticInfo {
        if !cfg!(debug_assertions) {
            return DiagnosticInfo::default();
        }

        self.messages().with(message)
    }
}

/// Programmer-contract violations in how binds are attached to drawables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("drawable already has an index buffer")]
    IndexBufferAlreadySet,
    #[error("shared binds already contain an index buffer")]
    SharedIndexBufferAlreadySet,
    #[error("shared binds do not contain an index buffer")]
    SharedIndexBufferMissing,
    #[error("shared index buffer was released with its registry")]
    SharedIndexBufferReleased,
    #[error("drawable has no index buffer")]
    MissingIndexBuffer,
}

#[derive(Debug, Error)]
pub enum GraphicsError {
    #[error(
        "graphics device error {code}\n[description] {}\n[info] {info}\n[origin] {location}",
        .code.describe()
    )]
    Device {
        code: ErrorCode,
        location: &'static Location<'static>,
        info: DiagnosticInfo,
    },

    #[error("graphics device removed, reason {reason}\n[info] {info}\n[origin] {location}")]
    DeviceRemoved {
        reason: RemovalReason,
        location: &'static Location<'static>,
        info: DiagnosticInfo,
    },

    #[error("graphics driver reported diagnostics\n[info] {info}\n[origin] {location}")]
    Diagnostic {
        location: &'static Location<'static>,
        info: DiagnosticInfo,
    },

    #[error(transparent)]
    Bind(#[from] BindError),
}

impl GraphicsError {
    #[track_caller]
    pub fn device(code: ErrorCode, info: DiagnosticInfo) -> Self {
        Self::Device {
            code,
            location: Location::caller(),
            info,
        }
    }

    #[track_caller]
    pub fn device_removed(reason: RemovalReason, info: DiagnosticInfo) -> Self {
        Self::DeviceRemoved {
            reason,
            location: Location::caller(),
            info,
        }
    }

    #[track_caller]
    pub fn diagnostic(info: DiagnosticInfo) -> Self {
        Self::Diagnostic {
            location: Location::caller(),
            info,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Device { code, .. } => Some(*code),
            Self::DeviceRemoved { .. } => Some(ErrorCode::DEVICE_REMOVED),
            Self::Diagnostic { .. } | Self::Bind(_) => None,
        }
    }

    pub fn info(&self) -> Option<&DiagnosticInfo> {
        match self {
            Self::Device { info, .. }
            | Self::DeviceRemoved { info, .. }
            | Self::Diagnostic { info, .. } => Some(info),
            Self::Bind(_) => None,
        }
    }

    pub fn location(&self) -> Option<&'static Location<'static>> {
        match self {
            Self::Device { location, .. }
            | Self::DeviceRemoved { location, .. }
            | Self::Diagnostic { location, .. } => Some(*location),
            Self::Bind(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_error_carries_code_and_origin() {
        let err = GraphicsError::device(ErrorCode::VALIDATION, DiagnosticInfo::default());

        assert_eq!(err.code(), Some(ErrorCode::VALIDATION));
        assert_eq!(err.location().map(|l| l.file()), Some(file!()));

        let text = err.to_string();
        assert!(text.contains("0x88760002"));
        assert!(text.contains(ErrorCode::VALIDATION.describe()));
    }

    #[test]
    fn device_removed_reports_reason_code() {
        let err = GraphicsError::device_removed(RemovalReason::Hung, DiagnosticInfo::default());

        assert_eq!(err.code(), Some(ErrorCode::DEVICE_REMOVED));
        assert!(err.to_string().contains("device hung (2)"));
    }

    #[test]
    fn unknown_codes_are_unidentified() {
        assert_eq!(ErrorCode(7).describe(), "Unidentified error code");
    }

    #[test]
    fn log_reports_messages_since_checkpoint() {
        let log = DiagnosticLog::new();
        log.push("stale");
        log.set();
        log.push("fresh");

        let info = log.messages();
        if cfg!(debug_assertions) {
            assert_eq!(info.messages(), ["fresh".to_string()]);
        } else {
            assert!(info.is_empty());
        }
    }

    #[test]
    fn checkpoint_discards_reported_messages() {
        let log = DiagnosticLog::new();
        let callback = log.clone();

        for frame in 0..100 {
            log.set();
            callback.push(format!("frame {}", frame));
        }

        assert_eq!(log.messages.lock().unwrap().len(), 1);
    }

    #[test]
    fn empty_info_displays_placeholder() {
        assert_eq!(
            DiagnosticInfo::default().to_string(),
            "<no diagnostic messages>"
        );
        assert_eq!(
            DiagnosticInfo::new(vec!["a".into(), "b".into()]).to_string(),
            "a\n\nb"
        );
    }
}
