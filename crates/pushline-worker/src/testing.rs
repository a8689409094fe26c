//! In-memory [`WorkerHost`] that records every call.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::descriptor::NotificationOptions;
use crate::error::HostError;
use crate::host::{ClientId, WindowClient, WorkerHost};
use crate::pending::PendingWork;

#[derive(Debug, Default)]
struct State {
    shown: Vec<(String, NotificationOptions)>,
    show_attempts: usize,
    fail_shows: usize,
    /// `in_flight()` of the observed [`PendingWork`] at each display attempt.
    pending_at_show: Vec<usize>,
    closed: Vec<String>,
    clients: Vec<WindowClient>,
    focused: Vec<ClientId>,
    opened: Vec<String>,
    fail_windows: bool,
    skip_waiting_calls: usize,
    claim_calls: usize,
}

/// Host double for worker tests.
#[derive(Debug, Default)]
pub struct RecordingHost {
    state: Mutex<State>,
    observed: Option<PendingWork>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pending-work count seen during each display attempt.
    pub fn observing(pending: PendingWork) -> Self {
        Self {
            state: Mutex::default(),
            observed: Some(pending),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }

    /// Make the next `n` display attempts fail.
    pub fn fail_next_shows(&self, n: usize) {
        self.with_state(|s| s.fail_shows = n);
    }

    /// Make focus and open-window calls fail.
    pub fn fail_windows(&self) {
        self.with_state(|s| s.fail_windows = true);
    }

    pub fn set_clients(&self, clients: Vec<WindowClient>) {
        self.with_state(|s| s.clients = clients);
    }

    pub fn shown(&self) -> Vec<(String, NotificationOptions)> {
        self.with_state(|s| s.shown.clone())
    }

    pub fn show_attempts(&self) -> usize {
        self.with_state(|s| s.show_attempts)
    }

    pub fn pending_at_show(&self) -> Vec<usize> {
        self.with_state(|s| s.pending_at_show.clone())
    }

    pub fn closed(&self) -> Vec<String> {
        self.with_state(|s| s.closed.clone())
    }

    pub fn focused(&self) -> Vec<ClientId> {
        self.with_state(|s| s.focused.clone())
    }

    pub fn opened(&self) -> Vec<String> {
        self.with_state(|s| s.opened.clone())
    }

    pub fn skip_waiting_calls(&self) -> usize {
        self.with_state(|s| s.skip_waiting_calls)
    }

    pub fn claim_calls(&self) -> usize {
        self.with_state(|s| s.claim_calls)
    }
}

#[async_trait]
impl WorkerHost for RecordingHost {
    async fn show_notification(
        &self,
        title: &str,
        options: &NotificationOptions,
    ) -> Result<(), HostError> {
        let in_flight = self.observed.as_ref().map(PendingWork::in_flight);
        self.with_state(|s| {
            s.show_attempts += 1;
            if let Some(n) = in_flight {
                s.pending_at_show.push(n);
            }
            if s.fail_shows > 0 {
                s.fail_shows -= 1;
                return Err(HostError::Display("injected failure".into()));
            }
            // Same tag replaces, different tags coexist.
            s.shown.retain(|(_, o)| o.tag != options.tag);
            s.shown.push((title.to_string(), options.clone()));
            Ok(())
        })
    }

    async fn close_notification(&self, tag: &str) {
        self.with_state(|s| {
            s.shown.retain(|(_, o)| o.tag != tag);
            s.closed.push(tag.to_string());
        });
    }

    async fn match_all_clients(
        &self,
        include_uncontrolled: bool,
    ) -> Result<Vec<WindowClient>, HostError> {
        Ok(self.with_state(|s| {
            s.clients
                .iter()
                .filter(|c| include_uncontrolled || c.controlled)
                .cloned()
                .collect()
        }))
    }

    async fn focus_client(&self, id: &ClientId) -> Result<(), HostError> {
        self.with_state(|s| {
            if s.fail_windows {
                return Err(HostError::Focus(id.to_string()));
            }
            s.focused.push(id.clone());
            Ok(())
        })
    }

    async fn open_window(&self, url: &str) -> Result<(), HostError> {
        self.with_state(|s| {
            if s.fail_windows {
                return Err(HostError::OpenWindow(url.to_string()));
            }
            s.opened.push(url.to_string());
            Ok(())
        })
    }

    async fn skip_waiting(&self) -> Result<(), HostError> {
        self.with_state(|s| s.skip_waiting_calls += 1);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), HostError> {
        self.with_state(|s| s.claim_calls += 1);
        Ok(())
    }
}
