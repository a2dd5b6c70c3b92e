//! Simulated co-editing presence on the generated document
//!
//! Nobody actually connects. A background task delivers a fixed roster a
//! moment after the panel mounts, then shuffles one collaborator's activity
//! every few seconds until the panel goes away.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::ViewScope;
use crate::config::scaled;

/// Delay before the roster shows up
pub const ROSTER_DELAY_MS: u64 = 1200;
/// Period of the random activity updates, counted from mount
pub const UPDATE_INTERVAL_MS: u64 = 8000;

/// Sections a collaborator can be seen editing
pub const SECTIONS: [&str; 4] = [
    "Security Requirements",
    "Performance Metrics",
    "User Interface",
    "Data Storage",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Editing,
    Viewing,
    Idle,
}

impl Activity {
    pub const ALL: [Activity; 3] = [Activity::Editing, Activity::Viewing, Activity::Idle];
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Editing => write!(f, "editing"),
            Activity::Viewing => write!(f, "viewing"),
            Activity::Idle => write!(f, "idle"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Collaborator {
    pub id: u32,
    pub name: String,
    pub initials: String,
    pub activity: Activity,
    /// Last section edited; kept while the collaborator views or idles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl Collaborator {
    fn new(id: u32, name: &str, initials: &str, activity: Activity) -> Self {
        Self {
            id,
            name: name.to_string(),
            initials: initials.to_string(),
            activity,
            section: None,
        }
    }

    /// Tooltip text, e.g. "Alex Kim (editing Security Requirements)"
    pub fn label(&self) -> String {
        match (&self.activity, &self.section) {
            (Activity::Editing, Some(section)) => {
                format!("{} ({} {})", self.name, self.activity, section)
            }
            _ => format!("{} ({})", self.name, self.activity),
        }
    }
}

/// The fixed roster
pub fn collaborators() -> Vec<Collaborator> {
    let mut alex = Collaborator::new(1, "Alex Kim", "AK", Activity::Editing);
    alex.section = Some(SECTIONS[0].to_string());
    vec![
        alex,
        Collaborator::new(2, "Rishi", "JD", Activity::Viewing),
        Collaborator::new(3, "Sarah Lee", "SL", Activity::Idle),
    ]
}

/// One collaborator switching activity. `section` only matters for
/// [`Activity::Editing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityUpdate {
    pub index: usize,
    pub activity: Activity,
    pub section: &'static str,
}

impl ActivityUpdate {
    /// Picks a collaborator, an activity and a section uniformly
    pub fn random<R: Rng>(roster_len: usize, rng: &mut R) -> Option<Self> {
        if roster_len == 0 {
            return None;
        }
        Some(Self {
            index: rng.random_range(0..roster_len),
            activity: Activity::ALL[rng.random_range(0..Activity::ALL.len())],
            section: SECTIONS[rng.random_range(0..SECTIONS.len())],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    Roster(Vec<Collaborator>),
    Update(ActivityUpdate),
}

/// Who is on the document and what they are doing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceState {
    pub active: Vec<Collaborator>,
}

impl PresenceState {
    /// Folds an event in. Updates for an unknown slot are ignored.
    pub fn apply(&mut self, event: PresenceEvent) {
        match event {
            PresenceEvent::Roster(roster) => self.active = roster,
            PresenceEvent::Update(update) => {
                let Some(user) = self.active.get_mut(update.index) else {
                    return;
                };
                user.activity = update.activity;
                if update.activity == Activity::Editing {
                    user.section = Some(update.section.to_string());
                }
            }
        }
    }

    /// Drives the "Document being edited" chip
    pub fn being_edited(&self) -> bool {
        self.active.iter().any(|u| u.activity == Activity::Editing)
    }
}

/// Running presence feed. Dropping the handle stops it.
#[derive(Debug)]
pub struct PresenceHandle {
    events: mpsc::UnboundedReceiver<PresenceEvent>,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PresenceHandle {
    /// Next event, or `None` once the feed was stopped
    pub async fn next(&mut self) -> Option<PresenceEvent> {
        self.events.recv().await
    }

    pub fn stop(&self) {
        self.token.cancel();
        self.task.abort();
    }
}

impl Drop for PresenceHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Starts the feed for a mounted view. `scale` stretches both delays;
/// unmounting the view stops it as well.
pub fn spawn_presence(scope: &ViewScope, scale: f64) -> PresenceHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let token = scope.token().child_token();

    let task_token = token.clone();
    let task = tokio::spawn(async move {
        let start = tokio::time::Instant::now();
        let roster = collaborators();
        let roster_len = roster.len();

        tokio::select! {
            _ = task_token.cancelled() => return,
            _ = tokio::time::sleep_until(start + scaled(ROSTER_DELAY_MS, scale)) => {}
        }
        if tx.send(PresenceEvent::Roster(roster)).is_err() {
            return;
        }

        // A zero period would spin; updates then stop after the roster
        let period = scaled(UPDATE_INTERVAL_MS, scale);
        if period.is_zero() {
            return;
        }
        let mut ticks = tokio::time::interval_at(start + period, period);
        loop {
            tokio::select! {
                _ = task_token.cancelled() => return,
                _ = ticks.tick() => {}
            }
            let update = {
                let mut rng = rand::rng();
                ActivityUpdate::random(roster_len, &mut rng)
            };
            let Some(update) = update else {
                return;
            };
            if tx.send(PresenceEvent::Update(update)).is_err() {
                return;
            }
        }
    });

    PresenceHandle {
        events: rx,
        token,
        task,
    }
}
