use crate::{CommandAck, ControlCommand, ControlIntent, JobSnapshot, RunFlag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleLabel {
    Pause,
    Resume,
}

impl ToggleLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ToggleLabel::Pause => "Pause",
            ToggleLabel::Resume => "Resume",
        }
    }
}

/// Per-job view of the backend controller.
///
/// Observations are ordered by sequence numbers drawn from one counter shared
/// by polls (taken when the request is issued) and control commands (taken
/// when the response arrives). A poll issued before a command response was
/// applied cannot override what that response confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerState {
    snapshot: Option<JobSnapshot>,
    snapshot_seq: u64,
    paused: bool,
    start_observed: bool,
    confirmed_seq: u64,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&JobSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn running(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|s| s.running)
    }

    pub fn run_flag(&self) -> Option<RunFlag> {
        self.snapshot.as_ref().map(JobSnapshot::run_flag)
    }

    pub fn percent(&self) -> u8 {
        self.snapshot.as_ref().map_or(0, JobSnapshot::percent)
    }

    /// Starting is refused locally while the job reports `running`.
    pub fn start_enabled(&self) -> bool {
        !self.running()
    }

    /// Pause/resume needs a running job or an observed start.
    pub fn toggle_enabled(&self) -> bool {
        self.running() || self.start_observed
    }

    pub fn stop_enabled(&self) -> bool {
        true
    }

    pub fn toggle_label(&self) -> ToggleLabel {
        if self.paused {
            ToggleLabel::Resume
        } else {
            ToggleLabel::Pause
        }
    }

    pub fn intent_enabled(&self, intent: ControlIntent) -> bool {
        match intent {
            ControlIntent::Start => self.start_enabled(),
            ControlIntent::PauseOrResume => self.toggle_enabled(),
            ControlIntent::Stop => self.stop_enabled(),
        }
    }

    /// The command a click issues right now. Label and command read the same
    /// `paused` field.
    pub fn resolve(&self, intent: ControlIntent) -> ControlCommand {
        intent.resolve(self.paused)
    }

    /// Apply a polled snapshot issued at `seq`. Returns false when the
    /// snapshot is older than the one already shown.
    pub(crate) fn apply_snapshot(&mut self, seq: u64, snapshot: JobSnapshot) -> bool {
        if self.snapshot.is_some() && seq <= self.snapshot_seq {
            return false;
        }
        if seq > self.confirmed_seq {
            self.paused = snapshot.paused;
            if !snapshot.running {
                self.start_observed = false;
            }
        }
        self.snapshot_seq = seq;
        self.snapshot = Some(snapshot);
        true
    }

    /// Apply a successful command response completed at `seq`. A snapshot
    /// issued after `seq` already reflects the command and is kept.
    pub(crate) fn apply_ack(&mut self, seq: u64, ack: &CommandAck) {
        if self.snapshot.is_some() && seq < self.snapshot_seq {
            return;
        }
        match ack {
            CommandAck::Started(_) => {
                self.start_observed = true;
                self.paused = false;
                self.confirmed_seq = self.confirmed_seq.max(seq);
            }
            CommandAck::PauseState { paused } => {
                self.paused = *paused;
                self.confirmed_seq = self.confirmed_seq.max(seq);
            }
            // Stop is never optimistic: only a later poll reports `stopped`.
            CommandAck::StopRequested => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(paused: bool) -> JobSnapshot {
        JobSnapshot {
            running: true,
            paused,
            ..JobSnapshot::default()
        }
    }

    #[test]
    fn fresh_controller_only_allows_start_and_stop() {
        let state = ControllerState::new();
        assert!(state.start_enabled());
        assert!(!state.toggle_enabled());
        assert!(state.stop_enabled());
        assert_eq!(state.toggle_label(), ToggleLabel::Pause);
        assert_eq!(state.run_flag(), None);
    }

    #[test]
    fn older_snapshot_is_ignored() {
        let mut state = ControllerState::new();
        assert!(state.apply_snapshot(5, running(true)));
        assert!(!state.apply_snapshot(4, running(false)));
        assert!(state.paused());
    }

    #[test]
    fn poll_issued_before_ack_keeps_confirmed_pause() {
        let mut state = ControllerState::new();
        state.apply_snapshot(1, running(false));
        state.apply_ack(3, &CommandAck::PauseState { paused: true });
        state.apply_snapshot(2, running(false));
        assert_eq!(state.toggle_label(), ToggleLabel::Resume);

        state.apply_snapshot(4, running(false));
        assert_eq!(state.toggle_label(), ToggleLabel::Pause);
    }

    #[test]
    fn start_observation_enables_toggle_until_fresh_idle_poll() {
        let mut state = ControllerState::new();
        state.apply_snapshot(1, JobSnapshot::default());
        state.apply_ack(2, &CommandAck::Started(crate::StartAck::default()));
        assert!(state.toggle_enabled());

        // Issued before the start response arrived: stays enabled.
        state.apply_snapshot(2, JobSnapshot::default());
        assert!(state.toggle_enabled());

        state.apply_snapshot(3, JobSnapshot::default());
        assert!(!state.toggle_enabled());
    }

    #[test]
    fn ack_older_than_shown_snapshot_is_ignored() {
        let mut state = ControllerState::new();
        state.apply_snapshot(5, running(false));
        state.apply_ack(4, &CommandAck::PauseState { paused: true });
        assert!(!state.paused());
        assert_eq!(state.toggle_label(), ToggleLabel::Pause);

        state.apply_ack(6, &CommandAck::PauseState { paused: true });
        assert!(state.paused());
    }

    #[test]
    fn stop_ack_changes_nothing() {
        let mut state = ControllerState::new();
        state.apply_snapshot(1, running(false));
        let before = state.clone();
        state.apply_ack(2, &CommandAck::StopRequested);
        assert_eq!(state, before);
    }
}
