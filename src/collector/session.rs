use crate::analyzer::categorizer::{Category, CategoryRules, extract_domain};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Browser transition reported by the tab observer, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TabEvent {
    Startup {
        url: String,
    },
    TabActivated {
        url: String,
    },
    NavigationCompleted {
        url: String,
        #[serde(default = "default_active")]
        active: bool,
    },
    WindowFocusChanged {
        focused: bool,
    },
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTab {
    pub url: String,
    pub domain: String,
}

/// Request body for `POST /api/time-entry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDraft {
    pub domain: String,
    pub time_spent: i64,
    pub category: Category,
    pub timestamp: String,
    pub date: String,
}

/// The tab being timed and when its clock started. The clock is `None` while
/// the browser window is unfocused.
#[derive(Debug, Clone, Default)]
pub struct TrackingSession {
    active: Option<ActiveTab>,
    started_at: Option<DateTime<Local>>,
}

impl TrackingSession {
    pub fn active(&self) -> Option<&ActiveTab> {
        self.active.as_ref()
    }

    pub fn is_timing(&self) -> bool {
        self.active.is_some() && self.started_at.is_some()
    }

    /// Applies one transition. Returns the entry for the session that ended,
    /// if any; it is always produced before the next session starts.
    pub fn handle(
        &mut self,
        event: TabEvent,
        now: DateTime<Local>,
        rules: &CategoryRules,
    ) -> Option<EntryDraft> {
        match event {
            TabEvent::Startup { url } => {
                self.begin(url, now);
                None
            }
            TabEvent::TabActivated { url } => {
                let flushed = self.flush(now, rules);
                self.begin(url, now);
                flushed
            }
            TabEvent::NavigationCompleted { url, active } => {
                if !active {
                    return None;
                }

                let same_url = self.active.as_ref().is_some_and(|tab| tab.url == url);
                if same_url && self.started_at.is_some() {
                    return None;
                }

                let flushed = self.flush(now, rules);
                self.begin(url, now);
                flushed
            }
            TabEvent::WindowFocusChanged { focused: false } => {
                let flushed = self.flush(now, rules);
                self.started_at = None;
                flushed
            }
            TabEvent::WindowFocusChanged { focused: true } => {
                if self.active.is_some() && self.started_at.is_none() {
                    self.started_at = Some(now);
                }
                None
            }
        }
    }

    /// Flushes the running session and forgets the tab.
    pub fn close(&mut self, now: DateTime<Local>, rules: &CategoryRules) -> Option<EntryDraft> {
        let flushed = self.flush(now, rules);
        self.active = None;
        self.started_at = None;
        flushed
    }

    fn begin(&mut self, url: String, now: DateTime<Local>) {
        let domain = extract_domain(&url);
        self.active = Some(ActiveTab { url, domain });
        self.started_at = Some(now);
    }

    fn flush(&self, now: DateTime<Local>, rules: &CategoryRules) -> Option<EntryDraft> {
        let tab = self.active.as_ref()?;
        let started_at = self.started_at?;
        let elapsed = (now - started_at).num_milliseconds().max(0);

        Some(EntryDraft {
            domain: tab.domain.clone(),
            time_spent: elapsed,
            category: rules.categorize(&tab.domain),
            timestamp: now.to_rfc3339(),
            date: now.date_naive().format("%Y-%m-%d").to_string(),
        })
    }
}
