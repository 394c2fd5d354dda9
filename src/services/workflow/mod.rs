// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

pub mod actions;
pub mod controller;
pub mod events;
pub mod machine;

pub use actions::{LiquidityAction, PreparedCall, StageAction, SwapAction};
pub use controller::{Workflow, WorkflowSettings};
pub use events::{LogNotifier, Notice, NoticeKind, Notifier};
pub use machine::{ComplianceStep, Stage, StageTracker, StepStatus};
