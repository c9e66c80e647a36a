//! Mode register
//!
//! Owns the current mode as a tagged variant (idle banner, snake or
//! breakout), routes input tokens to the sequence detector and the
//! active engine, and drives engine ticks from a single accumulator.
//! Transitions replace the whole variant and reset the accumulator,
//! sequence cursors and held flags, so a stale tick source or leaked
//! input state for a dead mode cannot exist.

use serde::{Deserialize, Serialize};

use crate::consts;
use crate::draw::{DrawCmd, Rgba, TextAlign, TextBaseline};
use crate::layout::{self, Layout, PlacementMode, Viewport};
use crate::sequence::{FeedResult, SequenceDetector, SequenceId};
use crate::sim::{BreakoutGame, BreakoutStatus, Dir, PaddleHeld, SnakeGame, SnakeStatus};

/// Which mode is active, without the engine payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeKind {
    Banner,
    Snake,
    Breakout,
}

/// The idle banner: pulsing text, pixel cells on narrow viewports
#[derive(Debug, Clone)]
pub struct Banner {
    pulse: f32,
    layout: Option<Layout>,
}

impl Banner {
    fn new(viewport: &Viewport) -> Self {
        Self {
            pulse: 0.0,
            layout: layout::plan(consts::BANNER_TEXT, PlacementMode::Banner, viewport),
        }
    }

    /// Advance the pulse by one animation frame
    fn advance(&mut self) {
        self.pulse += consts::BANNER_PULSE_STEP;
    }

    /// Subtle pulse between 0.8 and 1.0
    fn alpha(&self) -> f32 {
        0.8 + self.pulse.sin() * 0.2
    }

    /// Re-plan after a viewport change, keeping the pulse phase
    fn replan(&mut self, viewport: &Viewport) {
        self.layout = layout::plan(consts::BANNER_TEXT, PlacementMode::Banner, viewport);
    }

    fn draw(&self, viewport: &Viewport) -> Vec<DrawCmd> {
        let color = Rgba::WHITE.with_alpha(self.alpha());
        let mut cmds = vec![DrawCmd::Clear { color: Rgba::BLACK }];

        match &self.layout {
            Some(layout) => {
                let tile = layout.tile as f32;
                let r = (tile * 0.42).floor();
                for &cell in &layout.grid.cells {
                    let (px, py) = layout.cell_px(cell);
                    cmds.push(DrawCmd::FillCircle {
                        cx: px as f32 + tile / 2.0,
                        cy: py as f32 + tile / 2.0,
                        r,
                        color,
                    });
                }
            }
            None => {
                cmds.push(DrawCmd::Text {
                    text: consts::BANNER_TEXT.to_string(),
                    x: viewport.width / 2.0,
                    y: viewport.height / 2.0,
                    px: (viewport.width / 8.0).min(120.0),
                    align: TextAlign::Center,
                    baseline: TextBaseline::Middle,
                    color,
                });
            }
        }
        cmds
    }
}

/// Active mode with its engine; replaced wholesale on every transition
#[derive(Debug, Clone)]
enum Mode {
    Banner(Banner),
    Snake(SnakeGame),
    Breakout(BreakoutGame),
}

/// Notifications for the platform glue, drained once per frame
#[derive(Debug, Clone, PartialEq)]
pub enum ShellEvent {
    ModeEntered(ModeKind),
    /// The active engine reached a terminal state: show the overlay and
    /// arm a one-shot restart trigger
    Terminal {
        message: &'static str,
        color: Rgba,
        score: Option<u32>,
    },
}

/// Top-level mode register
pub struct Shell {
    viewport: Viewport,
    mode: Mode,
    detector: SequenceDetector,
    held: PaddleHeld,
    last_update_ms: Option<f64>,
    acc_ms: f64,
    terminal_announced: bool,
    next_seed: u64,
    events: Vec<ShellEvent>,
}

impl Shell {
    pub fn new(viewport: Viewport, seed: u64) -> Self {
        Self {
            viewport,
            mode: Mode::Banner(Banner::new(&viewport)),
            detector: SequenceDetector::new(),
            held: PaddleHeld::default(),
            last_update_ms: None,
            acc_ms: 0.0,
            terminal_announced: false,
            next_seed: seed,
            events: Vec::new(),
        }
    }

    pub fn mode_kind(&self) -> ModeKind {
        match self.mode {
            Mode::Banner(_) => ModeKind::Banner,
            Mode::Snake(_) => ModeKind::Snake,
            Mode::Breakout(_) => ModeKind::Breakout,
        }
    }

    /// Whether the active engine sits in a terminal state awaiting the
    /// restart trigger
    pub fn is_terminal(&self) -> bool {
        self.terminal_announced
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn active_snake(&self) -> Option<&SnakeGame> {
        match &self.mode {
            Mode::Snake(g) => Some(g),
            _ => None,
        }
    }

    pub fn active_breakout(&self) -> Option<&BreakoutGame> {
        match &self.mode {
            Mode::Breakout(g) => Some(g),
            _ => None,
        }
    }

    /// Route one input token: always through the sequences active for
    /// the current mode, and to the snake's direction queue while in
    /// snake mode.
    pub fn handle_token(&mut self, token: &str, now_ms: f64) {
        let active: &[SequenceId] = match self.mode {
            Mode::Banner(_) => &[SequenceId::Konami, SequenceId::Tiles, SequenceId::CheatWin],
            Mode::Snake(_) => &[SequenceId::Konami, SequenceId::InstantWin, SequenceId::CheatWin],
            Mode::Breakout(_) => &[SequenceId::Konami, SequenceId::CheatWin],
        };

        let completed: Vec<SequenceId> = self
            .detector
            .feed(token, now_ms, active)
            .into_iter()
            .filter(|(_, r)| *r == FeedResult::Completed)
            .map(|(id, _)| id)
            .collect();

        for id in completed {
            match id {
                // Start from the banner, or restart into a fresh snake
                // game from anywhere else
                SequenceId::Konami => self.enter_snake(),
                SequenceId::Tiles => {
                    if matches!(self.mode, Mode::Banner(_)) {
                        self.enter_breakout();
                    }
                }
                SequenceId::InstantWin => {
                    if let Mode::Snake(game) = &mut self.mode {
                        game.force_win();
                    }
                }
                SequenceId::CheatWin => match &mut self.mode {
                    Mode::Snake(game) => game.force_win(),
                    Mode::Breakout(game) => game.force_win(),
                    Mode::Banner(_) => {}
                },
            }
        }

        if let Mode::Snake(game) = &mut self.mode {
            match token.to_lowercase().as_str() {
                "arrowup" => game.queue_direction(Dir::Up),
                "arrowdown" => game.queue_direction(Dir::Down),
                "arrowleft" => game.queue_direction(Dir::Left),
                "arrowright" => game.queue_direction(Dir::Right),
                _ => {}
            }
        }

        self.check_terminal();
    }

    /// Press/release for the held paddle directions. Only breakout
    /// consumes the flags; transitions clear them.
    pub fn hold_paddle(&mut self, dir: Dir, held: bool) {
        match dir {
            Dir::Left => self.held.left = held,
            Dir::Right => self.held.right = held,
            _ => {}
        }
    }

    /// Absolute paddle positioning from a pointer
    pub fn pointer_paddle(&mut self, x: f32) {
        if let Mode::Breakout(game) = &mut self.mode {
            game.move_paddle_to(x);
        }
    }

    /// Advance the world to `now_ms`. The banner pulses per frame; the
    /// active engine ticks at its own fixed period out of the single
    /// shell-owned accumulator.
    pub fn update(&mut self, now_ms: f64) {
        let dt = match self.last_update_ms {
            Some(prev) => (now_ms - prev).max(0.0),
            None => 0.0,
        };
        self.last_update_ms = Some(now_ms);

        match &mut self.mode {
            Mode::Banner(banner) => {
                banner.advance();
            }
            Mode::Snake(game) => {
                if game.status() == SnakeStatus::Running {
                    self.acc_ms += dt;
                    let mut steps = 0;
                    while self.acc_ms >= consts::SNAKE_TICK_MS && steps < consts::MAX_SUBSTEPS {
                        game.tick();
                        self.acc_ms -= consts::SNAKE_TICK_MS;
                        steps += 1;
                    }
                    if steps == consts::MAX_SUBSTEPS {
                        self.acc_ms = 0.0;
                    }
                } else {
                    self.acc_ms = 0.0;
                }
            }
            Mode::Breakout(game) => {
                if game.status() == BreakoutStatus::Running {
                    self.acc_ms += dt;
                    let mut steps = 0;
                    while self.acc_ms >= consts::BREAKOUT_TICK_MS && steps < consts::MAX_SUBSTEPS {
                        game.tick(self.held);
                        self.acc_ms -= consts::BREAKOUT_TICK_MS;
                        steps += 1;
                    }
                    if steps == consts::MAX_SUBSTEPS {
                        self.acc_ms = 0.0;
                    }
                } else {
                    self.acc_ms = 0.0;
                }
            }
        }

        self.check_terminal();
    }

    /// Emit the frame's draw list
    pub fn draw(&self) -> Vec<DrawCmd> {
        match &self.mode {
            Mode::Banner(banner) => banner.draw(&self.viewport),
            Mode::Snake(game) => game.draw(),
            Mode::Breakout(game) => game.draw(),
        }
    }

    /// React to a viewport change. The banner re-plans immediately;
    /// active games keep their playfield until the next transition.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Mode::Banner(banner) = &mut self.mode {
            banner.replan(&viewport);
        }
    }

    /// One-shot restart after a terminal state: re-enter the running
    /// state of the same mode with a fresh layout
    pub fn restart(&mut self) {
        match self.mode {
            Mode::Snake(_) => self.enter_snake(),
            Mode::Breakout(_) => self.enter_breakout(),
            Mode::Banner(_) => {}
        }
    }

    /// Drain pending notifications for the glue
    pub fn drain_events(&mut self) -> Vec<ShellEvent> {
        std::mem::take(&mut self.events)
    }

    fn enter_snake(&mut self) {
        let layout =
            layout::plan_playfield(consts::BANNER_TEXT, PlacementMode::Snake, &self.viewport);
        self.mode = Mode::Snake(SnakeGame::new(&self.viewport, &layout));
        self.after_transition(ModeKind::Snake);
    }

    fn enter_breakout(&mut self) {
        let layout =
            layout::plan_playfield(consts::BANNER_TEXT, PlacementMode::Breakout, &self.viewport);
        let seed = self.bump_seed();
        self.mode = Mode::Breakout(BreakoutGame::new(&self.viewport, &layout, seed));
        self.after_transition(ModeKind::Breakout);
    }

    /// Every transition resets the detector, held flags and the tick
    /// accumulator so nothing leaks into the next mode
    fn after_transition(&mut self, kind: ModeKind) {
        self.detector.reset_all();
        self.held = PaddleHeld::default();
        self.acc_ms = 0.0;
        self.terminal_announced = false;
        log::info!("entered {kind:?} mode");
        self.events.push(ShellEvent::ModeEntered(kind));
    }

    fn bump_seed(&mut self) -> u64 {
        let seed = self.next_seed;
        self.next_seed = self.next_seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        seed
    }

    fn check_terminal(&mut self) {
        if self.terminal_announced {
            return;
        }
        let terminal = match &self.mode {
            Mode::Snake(game) => match game.status() {
                SnakeStatus::Running => None,
                SnakeStatus::Over => Some(("WASTED", Rgba::RED, None)),
                SnakeStatus::Won => Some(("RESPECT++", Rgba::GREEN, Some(game.score()))),
            },
            Mode::Breakout(game) => match game.status() {
                BreakoutStatus::Running => None,
                BreakoutStatus::Lost => Some(("WASTED", Rgba::RED, None)),
                BreakoutStatus::Won => Some(("RESPECT++", Rgba::GREEN, Some(game.score()))),
            },
            Mode::Banner(_) => None,
        };
        if let Some((message, color, score)) = terminal {
            self.terminal_announced = true;
            self.held = PaddleHeld::default();
            self.events.push(ShellEvent::Terminal { message, color, score });
        }
    }
}
