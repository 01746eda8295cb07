use std::fmt;

/// Number of recently processed items shown per job.
pub const RECENT_ITEMS_SHOWN: usize = 5;

/// The controllable backend jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// The full data-update job.
    Full,
    /// The independent task queue.
    Queue,
}

impl JobKind {
    pub const ALL: [JobKind; 2] = [JobKind::Full, JobKind::Queue];

    pub fn title(self) -> &'static str {
        match self {
            JobKind::Full => "Full update",
            JobKind::Queue => "Task queue",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Full => write!(f, "full"),
            JobKind::Queue => write!(f, "queue"),
        }
    }
}

/// Which poll produced a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollFamily {
    /// Fixed-cadence progress poll.
    Progress,
    /// On-demand poll for connection and summary info.
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunFlag {
    Running,
    Stopped,
    Idle,
}

impl RunFlag {
    pub fn label(self) -> &'static str {
        match self {
            RunFlag::Running => "Running",
            RunFlag::Stopped => "Stopped",
            RunFlag::Idle => "Idle",
        }
    }
}

/// Point-in-time status of one job as reported by the backend.
///
/// Snapshots are immutable values; a newer one replaces the old one whole.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobSnapshot {
    pub running: bool,
    pub paused: bool,
    pub stopped: bool,
    pub total_count: u64,
    pub updated_count: u64,
    pub current_item: Option<String>,
    /// Most recent first.
    pub recent_items: Vec<String>,
}

impl JobSnapshot {
    /// `running` wins over `stopped`; neither means idle. The flags are not
    /// assumed to be mutually exclusive.
    pub fn run_flag(&self) -> RunFlag {
        if self.running {
            RunFlag::Running
        } else if self.stopped {
            RunFlag::Stopped
        } else {
            RunFlag::Idle
        }
    }

    /// Rounded completion percentage, clamped to `0..=100`.
    pub fn percent(&self) -> u8 {
        if self.total_count == 0 {
            return 0;
        }
        let updated = u128::from(self.updated_count);
        let total = u128::from(self.total_count);
        // Round half up without going through floats.
        let rounded = (200 * updated + total) / (2 * total);
        rounded.min(100) as u8
    }
}

/// The backend's own data-store connection, as reported by it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionInfo {
    pub connected: bool,
    pub host: Option<String>,
    pub port: Option<String>,
    pub user: Option<String>,
    pub database: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataSummary {
    pub stock_basic_count: u64,
    pub finance_count: u64,
    pub latest_finance_date: Option<String>,
    pub latest_follow_time: Option<String>,
}

/// One decoded `/update/status` response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusReport {
    pub connection: ConnectionInfo,
    pub summary: DataSummary,
    pub full: JobSnapshot,
    pub queue: JobSnapshot,
}

impl StatusReport {
    pub fn job(&self, job: JobKind) -> &JobSnapshot {
        match job {
            JobKind::Full => &self.full,
            JobKind::Queue => &self.queue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(updated: u64, total: u64) -> JobSnapshot {
        JobSnapshot {
            updated_count: updated,
            total_count: total,
            ..JobSnapshot::default()
        }
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(snapshot(1, 8).percent(), 13);
        assert_eq!(snapshot(1, 3).percent(), 33);
        assert_eq!(snapshot(2, 3).percent(), 67);
        assert_eq!(snapshot(37, 100).percent(), 37);
    }

    #[test]
    fn percent_survives_huge_counts() {
        assert_eq!(snapshot(u64::MAX, u64::MAX).percent(), 100);
        assert_eq!(snapshot(u64::MAX, 1).percent(), 100);
    }

    #[test]
    fn run_flag_precedence() {
        let both = JobSnapshot {
            running: true,
            stopped: true,
            ..JobSnapshot::default()
        };
        assert_eq!(both.run_flag(), RunFlag::Running);

        let stopped = JobSnapshot {
            stopped: true,
            paused: true,
            ..JobSnapshot::default()
        };
        assert_eq!(stopped.run_flag(), RunFlag::Stopped);
        assert_eq!(JobSnapshot::default().run_flag(), RunFlag::Idle);
    }
}
