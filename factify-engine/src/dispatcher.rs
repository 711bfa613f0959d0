use factify_core::error::AnalysisError;
use factify_core::payload::{
    AiDetectionResult, FindSourcesResult, ManipulationResult, ResultPayload,
};
use factify_core::types::AnalysisKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

/// What the display layer currently shows. At most one result slot is filled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultSlots {
    pub active_kind: Option<AnalysisKind>,
    pub ai_detection: Option<AiDetectionResult>,
    pub manipulation: Option<ManipulationResult>,
    pub find_sources: Option<FindSourcesResult>,
    pub error: Option<String>,
    pub login_prompt: bool,
}

impl ResultSlots {
    pub fn populated(&self) -> usize {
        usize::from(self.ai_detection.is_some())
            + usize::from(self.manipulation.is_some())
            + usize::from(self.find_sources.is_some())
    }

    fn clear(&mut self) {
        self.ai_detection = None;
        self.manipulation = None;
        self.find_sources = None;
        self.error = None;
        self.login_prompt = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Shown(AnalysisKind),
    LoginPrompt,
    Error(String),
    /// A newer submission of the same kind owns the slots now.
    Stale,
}

/// Stops a poll loop once its submission is no longer the newest of its kind.
#[derive(Debug, Clone)]
pub struct CancelToken {
    watch: Option<(watch::Receiver<u64>, u64)>,
}

impl CancelToken {
    pub fn never() -> Self {
        Self { watch: None }
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.watch {
            None => false,
            Some((rx, generation)) => *rx.borrow() != *generation || rx.has_changed().is_err(),
        }
    }

    /// Resolves when the token is cancelled; never resolves for `never()`.
    pub async fn cancelled(&mut self) {
        let Some((rx, generation)) = self.watch.as_mut() else {
            return std::future::pending().await;
        };
        loop {
            if *rx.borrow_and_update() != *generation {
                return;
            }
            if rx.changed().await.is_err() {
                // Board dropped: the hosting context is gone.
                return;
            }
        }
    }
}

/// Proof of which submission is writing. Issued by `ResultBoard::begin`.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub kind: AnalysisKind,
    pub generation: u64,
    rx: watch::Receiver<u64>,
}

impl Ticket {
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken {
            watch: Some((self.rx.clone(), self.generation)),
        }
    }

    pub fn is_current(&self) -> bool {
        *self.rx.borrow() == self.generation
    }
}

/// Routes terminal outcomes into the three result slots.
///
/// Each kind has a generation counter; starting a submission bumps it so any
/// older loop of that kind can neither keep polling nor write its result.
#[derive(Debug)]
pub struct ResultBoard {
    slots: Mutex<ResultSlots>,
    generations: BTreeMap<AnalysisKind, watch::Sender<u64>>,
}

impl Default for ResultBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultBoard {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(ResultSlots::default()),
            generations: AnalysisKind::ALL
                .into_iter()
                .map(|k| (k, watch::Sender::new(0)))
                .collect(),
        }
    }

    fn slots(&self) -> MutexGuard<'_, ResultSlots> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn bump(&self, kind: AnalysisKind) -> Ticket {
        let tx = &self.generations[&kind];
        tx.send_modify(|g| *g += 1);
        Ticket {
            kind,
            generation: *tx.borrow(),
            rx: tx.subscribe(),
        }
    }

    /// Starts a submission: invalidates older loops of `kind` and clears the
    /// display.
    pub fn begin(&self, kind: AnalysisKind) -> Ticket {
        let ticket = self.bump(kind);
        let mut slots = self.slots();
        slots.clear();
        slots.active_kind = Some(kind);
        ticket
    }

    pub fn dispatch(
        &self,
        ticket: &Ticket,
        outcome: &Result<ResultPayload, AnalysisError>,
    ) -> Dispatch {
        let mut slots = self.slots();
        // Checked under the lock so a concurrent `begin` cannot interleave.
        if !ticket.is_current() || matches!(outcome, Err(AnalysisError::Superseded)) {
            log::debug!(
                "dropping stale {} outcome (generation {})",
                ticket.kind,
                ticket.generation
            );
            return Dispatch::Stale;
        }

        slots.clear();
        slots.active_kind = Some(ticket.kind);
        match outcome {
            Ok(payload) => {
                let kind = payload.kind();
                match payload.clone() {
                    ResultPayload::AiDetection(r) => slots.ai_detection = Some(r),
                    ResultPayload::Manipulation(r) => slots.manipulation = Some(r),
                    ResultPayload::FindSources(r) => slots.find_sources = Some(r),
                }
                Dispatch::Shown(kind)
            }
            Err(e) if e.needs_sign_in() => {
                slots.login_prompt = true;
                Dispatch::LoginPrompt
            }
            Err(e) => {
                let msg = e.user_message(ticket.kind.label());
                slots.error = Some(msg.clone());
                Dispatch::Error(msg)
            }
        }
    }

    /// Error raised before a submission starts (e.g. empty input). Displayed
    /// results are left alone.
    pub fn show_error(&self, message: impl Into<String>) {
        self.slots().error = Some(message.into());
    }

    pub fn snapshot(&self) -> ResultSlots {
        self.slots().clone()
    }

    /// Invalidates every in-flight loop. Used when the hosting context goes away.
    pub fn cancel_all(&self) {
        for kind in AnalysisKind::ALL {
            self.bump(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factify_core::payload::AiDetectionResult;
    use std::collections::BTreeMap;

    fn ai() -> ResultPayload {
        ResultPayload::AiDetection(AiDetectionResult {
            text: "t".into(),
            ai_probability: 12.0,
            human_probability: 88.0,
            segments: vec![],
        })
    }

    fn manipulation() -> ResultPayload {
        ResultPayload::Manipulation(ManipulationResult {
            text: "t".into(),
            result: BTreeMap::new(),
            user_id: None,
        })
    }

    #[test]
    fn completed_fills_exactly_one_slot() {
        let board = ResultBoard::new();
        let t = board.begin(AnalysisKind::AiDetection);
        assert_eq!(
            board.dispatch(&t, &Ok(ai())),
            Dispatch::Shown(AnalysisKind::AiDetection)
        );

        let t = board.begin(AnalysisKind::Manipulation);
        board.dispatch(&t, &Ok(manipulation()));

        let s = board.snapshot();
        assert_eq!(s.populated(), 1);
        assert!(s.ai_detection.is_none());
        assert!(s.manipulation.is_some());
        assert_eq!(s.active_kind, Some(AnalysisKind::Manipulation));
    }

    #[test]
    fn begin_clears_previous_results() {
        let board = ResultBoard::new();
        let t = board.begin(AnalysisKind::AiDetection);
        board.dispatch(&t, &Ok(ai()));

        board.begin(AnalysisKind::FindSources);
        assert_eq!(board.snapshot().populated(), 0);
    }

    #[test]
    fn stale_ticket_of_same_kind_is_ignored() {
        let board = ResultBoard::new();
        let old = board.begin(AnalysisKind::AiDetection);
        let new = board.begin(AnalysisKind::AiDetection);
        assert!(old.cancel_token().is_cancelled());
        assert!(!new.cancel_token().is_cancelled());

        board.dispatch(&new, &Err(AnalysisError::PollFailure("boom".into())));
        assert_eq!(board.dispatch(&old, &Ok(ai())), Dispatch::Stale);

        let s = board.snapshot();
        assert_eq!(s.populated(), 0);
        assert_eq!(s.error.as_deref(), Some("boom"));
    }

    #[test]
    fn other_kinds_keep_their_tickets() {
        let board = ResultBoard::new();
        let ai_ticket = board.begin(AnalysisKind::AiDetection);
        let _m = board.begin(AnalysisKind::Manipulation);
        assert!(ai_ticket.is_current());
    }

    #[test]
    fn auth_failures_raise_login_prompt_not_banner() {
        let board = ResultBoard::new();
        let t = board.begin(AnalysisKind::AiDetection);
        assert_eq!(
            board.dispatch(&t, &Err(AnalysisError::AuthRequired)),
            Dispatch::LoginPrompt
        );
        let s = board.snapshot();
        assert!(s.login_prompt);
        assert!(s.error.is_none());
        assert_eq!(s.populated(), 0);
    }

    #[test]
    fn timeout_reads_as_user_message() {
        let board = ResultBoard::new();
        let t = board.begin(AnalysisKind::AiDetection);
        let d = board.dispatch(&t, &Err(AnalysisError::Timeout { attempts: 30 }));
        assert_eq!(
            d,
            Dispatch::Error("AI detection analysis timed out. Please try again.".into())
        );
    }

    #[test]
    fn cancel_all_invalidates_every_ticket() {
        let board = ResultBoard::new();
        let tickets: Vec<_> = AnalysisKind::ALL.iter().map(|k| board.begin(*k)).collect();
        board.cancel_all();
        assert!(tickets.iter().all(|t| !t.is_current()));
    }

    #[tokio::test]
    async fn cancelled_wakes_on_newer_submission() {
        let board = std::sync::Arc::new(ResultBoard::new());
        let ticket = board.begin(AnalysisKind::FindSources);
        let mut token = ticket.cancel_token();

        let b = board.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            b.begin(AnalysisKind::FindSources);
        });

        tokio::time::timeout(std::time::Duration::from_secs(5), token.cancelled())
            .await
            .expect("token should be cancelled");
    }
}
