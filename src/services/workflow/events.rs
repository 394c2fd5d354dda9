// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

/// User-facing notifications emitted by the workflow controller. The
/// controller stays headless; a frontend decides how to render these
/// (toasts in a browser, log lines in the CLI).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    /// Block-explorer or dashboard link, when one applies.
    pub link: Option<String>,
    /// Sticky notices stay until dismissed (the "complete verification"
    /// affordance); transient ones auto-dismiss.
    pub sticky: bool,
}

impl Notice {
    pub fn transient(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            link: None,
            sticky: false,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn sticky(mut self) -> Self {
        self.sticky = true;
        self
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Default sink: renders notices as structured log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        let link = notice.link.as_deref().unwrap_or("");
        match notice.kind {
            NoticeKind::Success => {
                tracing::info!(target: "workflow", link, "{}", notice.text)
            }
            NoticeKind::Error => {
                tracing::error!(target: "workflow", link, "{}", notice.text)
            }
            NoticeKind::Warning => {
                tracing::warn!(target: "workflow", link, sticky = notice.sticky, "{}", notice.text)
            }
            NoticeKind::Info => {
                tracing::info!(target: "workflow", link, "{}", notice.text)
            }
        }
    }
}
