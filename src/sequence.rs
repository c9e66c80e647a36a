//! Secret-sequence detection
//!
//! Matches the normalized input token stream against the registered
//! secret sequences. Each sequence keeps its own cursor and they all
//! advance independently on the same stream; a single token can move
//! several cursors in one call. A repeated identical token inside the
//! dedupe window is dropped before any cursor sees it, which absorbs
//! touchstart + synthesized click pairs from a single physical tap.
//!
//! Mode gating is the caller's job: the detector only touches the
//! sequences it is told are active for this token, and the shell resets
//! every cursor on mode transitions.

use serde::{Deserialize, Serialize};

use crate::consts::DEDUPE_WINDOW_MS;

/// Identifies a registered sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceId {
    /// Primary mode-switch sequence, always active
    Konami,
    /// Instant win, valid during snake play
    InstantWin,
    /// Switch to breakout from the idle banner
    Tiles,
    /// Force a win in whatever is running
    CheatWin,
}

pub const KONAMI_TOKENS: &[&str] = &[
    "arrowup", "arrowup", "arrowdown", "arrowdown", "arrowleft", "arrowright", "arrowleft",
    "arrowright", "b", "a",
];
pub const INSTANT_WIN_TOKENS: &[&str] = &[
    "arrowup", "arrowup", "arrowdown", "arrowdown", "arrowleft", "arrowright", "arrowleft",
    "arrowright", "a", "b",
];
pub const TILES_TOKENS: &[&str] = &["arrowup", "arrowdown", "t", "l"];
pub const CHEAT_TOKENS: &[&str] = &["arrowdown", "arrowup", "l", "t"];

/// Outcome for one sequence after one token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedResult {
    NoMatch,
    Progressed,
    Completed,
}

#[derive(Debug, Clone)]
struct Tracked {
    id: SequenceId,
    tokens: &'static [&'static str],
    cursor: usize,
}

/// Stateful matcher over all registered sequences
#[derive(Debug, Clone)]
pub struct SequenceDetector {
    tracked: Vec<Tracked>,
    last_token: Option<String>,
    last_accepted_ms: f64,
}

impl Default for SequenceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceDetector {
    pub fn new() -> Self {
        let tracked = [
            (SequenceId::Konami, KONAMI_TOKENS),
            (SequenceId::InstantWin, INSTANT_WIN_TOKENS),
            (SequenceId::Tiles, TILES_TOKENS),
            (SequenceId::CheatWin, CHEAT_TOKENS),
        ]
        .into_iter()
        .map(|(id, tokens)| Tracked { id, tokens, cursor: 0 })
        .collect();

        Self {
            tracked,
            last_token: None,
            last_accepted_ms: f64::NEG_INFINITY,
        }
    }

    /// Feed one token at `now_ms`, advancing only the sequences in
    /// `active`. Matching is case-insensitive. Returns the per-sequence
    /// outcome for every active sequence; a debounced duplicate returns
    /// an empty report.
    pub fn feed(
        &mut self,
        token: &str,
        now_ms: f64,
        active: &[SequenceId],
    ) -> Vec<(SequenceId, FeedResult)> {
        let token = token.to_lowercase();

        // Duplicate events for the same key within the window are one
        // physical input; fast intentional taps stay outside it
        if self.last_token.as_deref() == Some(token.as_str())
            && now_ms - self.last_accepted_ms < DEDUPE_WINDOW_MS
        {
            return Vec::new();
        }
        self.last_token = Some(token.clone());
        self.last_accepted_ms = now_ms;

        let mut report = Vec::new();
        for seq in &mut self.tracked {
            if !active.contains(&seq.id) {
                continue;
            }
            let result = if token == seq.tokens[seq.cursor] {
                seq.cursor += 1;
                if seq.cursor == seq.tokens.len() {
                    seq.cursor = 0;
                    log::info!("sequence {:?} completed", seq.id);
                    FeedResult::Completed
                } else {
                    log::debug!(
                        "sequence {:?} progress: {}/{}",
                        seq.id,
                        seq.cursor,
                        seq.tokens.len()
                    );
                    FeedResult::Progressed
                }
            } else {
                seq.cursor = 0;
                FeedResult::NoMatch
            };
            report.push((seq.id, result));
        }
        report
    }

    /// Reset every cursor and the dedupe state. Called on each mode
    /// transition so no progress leaks into the next mode.
    pub fn reset_all(&mut self) {
        for seq in &mut self.tracked {
            seq.cursor = 0;
        }
        self.last_token = None;
        self.last_accepted_ms = f64::NEG_INFINITY;
    }

    /// Current cursor for a sequence
    pub fn progress(&self, id: SequenceId) -> usize {
        self.tracked
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.cursor)
            .unwrap_or(0)
    }
}
