use std::collections::VecDeque;

use chrono::{DateTime, Local};

use crate::club::ClubRecord;
use crate::directory::ClubDirectory;
use crate::selection::{AddOutcome, MAX_SELECTED_CLUBS, PatchOutcome, SelectionSet};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Selection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    Idle,
    Pending { ticket: u64 },
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub directory: ClubDirectory,
    pub selection: SelectionSet,
    pub search_term: String,
    pub suggestion_selected: usize,
    pub selection_cursor: usize,
    pub focus: Focus,
    pub batch: BatchStatus,
    pub last_assessed_at: Option<DateTime<Local>>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub source_label: String,
    next_ticket: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            directory: ClubDirectory::new(),
            selection: SelectionSet::new(),
            search_term: String::new(),
            suggestion_selected: 0,
            selection_cursor: 0,
            focus: Focus::Search,
            batch: BatchStatus::Idle,
            last_assessed_at: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
            source_label: String::new(),
            next_ticket: 1,
        }
    }

    fn issue_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.suggestion_selected = 0;
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search_term.push(c);
        self.suggestion_selected = 0;
    }

    pub fn pop_search_char(&mut self) {
        self.search_term.pop();
        self.suggestion_selected = 0;
    }

    /// Suggestions only show while something is typed and the directory has
    /// finished loading.
    pub fn suggestions(&self) -> Vec<&str> {
        if self.search_term.is_empty() || self.directory.is_loading() {
            return Vec::new();
        }
        self.directory.search(&self.search_term)
    }

    pub fn highlighted_suggestion(&self) -> Option<String> {
        self.suggestions()
            .get(self.suggestion_selected)
            .map(|name| name.to_string())
    }

    pub fn suggestion_next(&mut self) {
        let total = self.suggestions().len();
        if total == 0 {
            self.suggestion_selected = 0;
            return;
        }
        self.suggestion_selected = (self.suggestion_selected + 1) % total;
    }

    pub fn suggestion_prev(&mut self) {
        let total = self.suggestions().len();
        if total == 0 {
            self.suggestion_selected = 0;
            return;
        }
        if self.suggestion_selected == 0 {
            self.suggestion_selected = total - 1;
        } else {
            self.suggestion_selected -= 1;
        }
    }

    /// Adds a pending placeholder and hands back the single-club fetch for it.
    /// Full or duplicate selections are a silent no-op.
    pub fn select_club(&mut self, name: &str) -> Option<ProviderCommand> {
        let ticket = self.next_ticket;
        match self.selection.add_placeholder(name, ticket) {
            AddOutcome::Added => {
                self.issue_ticket();
                self.set_search_term(String::new());
                Some(ProviderCommand::FetchClubRisk {
                    name: name.to_string(),
                    ticket,
                })
            }
            AddOutcome::Full | AddOutcome::Duplicate => None,
        }
    }

    pub fn select_highlighted(&mut self) -> Option<ProviderCommand> {
        let name = self.highlighted_suggestion()?;
        self.select_club(&name)
    }

    pub fn remove_club(&mut self, name: &str) -> bool {
        let removed = self.selection.remove(name);
        if removed {
            self.clamp_selection_cursor();
        }
        removed
    }

    pub fn remove_highlighted(&mut self) -> Option<String> {
        let name = self.selection.names().get(self.selection_cursor).cloned()?;
        self.remove_club(&name).then_some(name)
    }

    pub fn request_batch_assessment(&mut self) -> Option<ProviderCommand> {
        if self.is_batch_pending() {
            self.push_log("[INFO] Risk assessment already in progress");
            return None;
        }
        let names = self.selection.names();
        if names.is_empty() {
            self.push_log("[INFO] Select at least one club first");
            return None;
        }
        let ticket = self.issue_ticket();
        self.batch = BatchStatus::Pending { ticket };
        Some(ProviderCommand::FetchBatchRisk { names, ticket })
    }

    pub fn is_batch_pending(&self) -> bool {
        matches!(self.batch, BatchStatus::Pending { .. })
    }

    pub fn batch_error(&self) -> Option<&str> {
        match &self.batch {
            BatchStatus::Failed(msg) => Some(msg.as_str()),
            _ => None,
        }
    }

    pub fn max_reached(&self) -> bool {
        self.selection.len() == MAX_SELECTED_CLUBS
    }

    pub fn show_strategies(&self) -> bool {
        self.selection.records().any(ClubRecord::is_assessed)
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Search => Focus::Selection,
            Focus::Selection => Focus::Search,
        };
        self.clamp_selection_cursor();
    }

    pub fn selection_next(&mut self) {
        let total = self.selection.len();
        if total == 0 {
            self.selection_cursor = 0;
            return;
        }
        self.selection_cursor = (self.selection_cursor + 1) % total;
    }

    pub fn selection_prev(&mut self) {
        let total = self.selection.len();
        if total == 0 {
            self.selection_cursor = 0;
            return;
        }
        if self.selection_cursor == 0 {
            self.selection_cursor = total - 1;
        } else {
            self.selection_cursor -= 1;
        }
    }

    pub fn clamp_selection_cursor(&mut self) {
        let total = self.selection.len();
        if total == 0 {
            self.selection_cursor = 0;
        } else if self.selection_cursor >= total {
            self.selection_cursor = total - 1;
        }
    }

    pub fn highlighted_record(&self) -> Option<&ClubRecord> {
        self.selection.records().nth(self.selection_cursor)
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::info!(target: "clubrisk::console", "{msg}");
        self.logs.push_back(msg);
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    DirectoryLoaded(Vec<String>),
    DirectoryFailed(String),
    ClubRiskLoaded {
        name: String,
        ticket: u64,
        record: ClubRecord,
    },
    ClubRiskFailed {
        name: String,
        ticket: u64,
        error: String,
    },
    BatchLoaded {
        ticket: u64,
        records: Vec<ClubRecord>,
    },
    BatchFailed {
        ticket: u64,
        error: String,
    },
    Log(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    LoadDirectory,
    FetchClubRisk { name: String, ticket: u64 },
    FetchBatchRisk { names: Vec<String>, ticket: u64 },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::DirectoryLoaded(names) => {
            let count = names.len();
            state.directory.install(names);
            state.suggestion_selected = 0;
            state.push_log(format!("[INFO] Club directory loaded ({count} clubs)"));
        }
        Delta::DirectoryFailed(error) => {
            state.directory.mark_failed(error.clone());
            state.push_log(format!("[WARN] Club directory error: {error}"));
        }
        Delta::ClubRiskLoaded {
            name,
            ticket,
            record,
        } => {
            let summary = record_summary(&record);
            match state.selection.patch(&name, ticket, record) {
                PatchOutcome::Patched => {
                    state.last_assessed_at = Some(Local::now());
                    state.push_log(format!("[INFO] {name}: {summary}"));
                }
                PatchOutcome::Stale => {
                    state.push_log(format!("[INFO] Dropped stale risk result for {name}"));
                }
            }
        }
        Delta::ClubRiskFailed {
            name,
            ticket: _,
            error,
        } => {
            state.push_log(format!("[WARN] Risk fetch for {name} failed: {error}"));
        }
        Delta::BatchLoaded { ticket, records } => {
            if state.batch != (BatchStatus::Pending { ticket }) {
                state.push_log("[INFO] Dropped stale risk assessment");
                return;
            }
            let dropped = state.selection.replace_all(records, ticket);
            state.batch = BatchStatus::Idle;
            state.last_assessed_at = Some(Local::now());
            state.clamp_selection_cursor();
            state.push_log(format!(
                "[INFO] Risk assessment received ({} clubs)",
                state.selection.len()
            ));
            if dropped > 0 {
                state.push_log(format!(
                    "[WARN] Ignored {dropped} duplicate or surplus rows in risk response"
                ));
            }
        }
        Delta::BatchFailed { ticket, error } => {
            if state.batch != (BatchStatus::Pending { ticket }) {
                state.push_log(format!("[INFO] Dropped stale risk assessment error: {error}"));
                return;
            }
            state.push_log(format!("[WARN] Risk assessment failed: {error}"));
            state.batch = BatchStatus::Failed(error);
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

fn record_summary(record: &ClubRecord) -> String {
    match record.score {
        Some(score) => format!("{score:.1} ({})", record.category().label()),
        None => record.category().label().to_string(),
    }
}
