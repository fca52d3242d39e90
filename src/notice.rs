//! Transient user notices (the toast/snackbar of a front end)

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new<S: Into<String>>(level: NoticeLevel, message: S) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info<S: Into<String>>(message: S) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success<S: Into<String>>(message: S) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning<S: Into<String>>(message: S) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "success",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{}] {}", label, self.message)
    }
}
