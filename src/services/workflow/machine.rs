// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

/// Outer stages of every transaction workflow, in execution order.
/// Transitions are strictly forward; the only way back is closing the
/// workflow and opening a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Allowance = 0,
    Compliance = 1,
    Simulation = 2,
    Execution = 3,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Allowance,
        Stage::Compliance,
        Stage::Simulation,
        Stage::Execution,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn next(self) -> Option<Stage> {
        Stage::ALL.get(self.index() + 1).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    InProgress,
    Done,
    Failed,
}

/// Nested steps of the Compliance stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplianceStep {
    Signing = 0,
    Verifying = 1,
}

/// Stage/substage bookkeeping with the ordering invariant baked in: stages
/// before the active one are Done, stages after are Pending, and exactly
/// one stage is InProgress or most-recently-Failed. All mutation goes
/// through the named transitions below; there is no setter.
#[derive(Debug, Clone)]
pub struct StageTracker {
    stages: [StepStatus; 4],
    compliance: [StepStatus; 2],
    /// Set when the user forces past a failed simulation; the stage keeps
    /// its Failed badge for the audit trail even though the workflow moved
    /// on.
    simulation_overridden: bool,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTracker {
    pub fn new() -> Self {
        let mut stages = [StepStatus::Pending; 4];
        stages[Stage::Allowance.index()] = StepStatus::InProgress;
        Self {
            stages,
            compliance: [StepStatus::Pending; 2],
            simulation_overridden: false,
        }
    }

    pub fn status(&self, stage: Stage) -> StepStatus {
        self.stages[stage.index()]
    }

    pub fn compliance_status(&self, step: ComplianceStep) -> StepStatus {
        self.compliance[step as usize]
    }

    pub fn simulation_overridden(&self) -> bool {
        self.simulation_overridden
    }

    /// The stage currently owning control: the first one that is not Done.
    pub fn current(&self) -> Stage {
        for stage in Stage::ALL {
            if self.stages[stage.index()] != StepStatus::Done {
                return stage;
            }
        }
        Stage::Execution
    }

    pub fn is_complete(&self) -> bool {
        self.stages[Stage::Execution.index()] == StepStatus::Done
    }

    /// (Re-)enter a stage. Valid for the active stage only; used both for
    /// the first entry and for manual retries after a failure.
    pub fn begin(&mut self, stage: Stage) {
        debug_assert_eq!(self.active_stage(), stage);
        self.stages[stage.index()] = StepStatus::InProgress;
        if stage == Stage::Compliance && self.compliance[0] == StepStatus::Pending {
            self.compliance[ComplianceStep::Signing as usize] = StepStatus::InProgress;
        }
    }

    pub fn fail(&mut self, stage: Stage) {
        debug_assert_eq!(self.active_stage(), stage);
        self.stages[stage.index()] = StepStatus::Failed;
    }

    /// Complete a stage and hand control to the next one, which enters
    /// InProgress immediately.
    pub fn advance(&mut self, stage: Stage) {
        debug_assert_eq!(self.active_stage(), stage);
        self.stages[stage.index()] = StepStatus::Done;
        if let Some(next) = stage.next() {
            self.begin(next);
        }
    }

    pub fn complete(&mut self, stage: Stage) {
        debug_assert_eq!(self.active_stage(), stage);
        self.stages[stage.index()] = StepStatus::Done;
    }

    /// Explicit user override of a failed simulation: Execution becomes
    /// active while Simulation visibly stays Failed.
    pub fn override_simulation(&mut self) {
        debug_assert_eq!(self.stages[Stage::Simulation.index()], StepStatus::Failed);
        self.simulation_overridden = true;
        self.stages[Stage::Execution.index()] = StepStatus::InProgress;
    }

    pub fn begin_compliance_step(&mut self, step: ComplianceStep) {
        self.compliance[step as usize] = StepStatus::InProgress;
    }

    pub fn complete_compliance_step(&mut self, step: ComplianceStep) {
        self.compliance[step as usize] = StepStatus::Done;
    }

    pub fn fail_compliance_step(&mut self, step: ComplianceStep) {
        self.compliance[step as usize] = StepStatus::Failed;
    }

    /// Where the workflow currently sits, accounting for the override path:
    /// after `override_simulation` the current() pointer would still name
    /// Simulation (it is not Done), so Execution activity is checked first.
    pub fn active_stage(&self) -> Stage {
        if self.simulation_overridden
            && self.stages[Stage::Simulation.index()] == StepStatus::Failed
            && self.stages[Stage::Execution.index()] != StepStatus::Pending
        {
            return Stage::Execution;
        }
        self.current()
    }
}
