//! Snake engine
//!
//! Discrete-tick state machine on the movement grid. The playfield is
//! toroidal: the head wraps at every edge instead of hitting a wall.
//! Collectibles are seeded from the current layout and spell out the
//! banner text; eating them all (when there are enough to matter) wins
//! the game.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::consts;
use crate::draw::{DrawCmd, Rgba, TextAlign, TextBaseline};
use crate::layout::{Layout, Viewport};

/// Movement direction; the head owns exactly one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }

    fn is_vertical(self) -> bool {
        matches!(self, Dir::Up | Dir::Down)
    }
}

/// Engine state; terminal states stop the tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnakeStatus {
    Running,
    /// Ran into itself
    Over,
    /// Every collectible eaten
    Won,
}

/// A position on the movement grid, in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

/// A capturable point seeded from the layout. Never removed once
/// eaten; the win check needs the total count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    pub pos: GridPos,
    pub eaten: bool,
}

/// Complete snake game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnakeGame {
    cols: i32,
    rows: i32,
    /// Head-first body segments
    body: VecDeque<GridPos>,
    dir: Dir,
    /// Queued direction, committed at the next tick; last write wins
    pending: Option<Dir>,
    dots: Vec<Collectible>,
    score: u32,
    status: SnakeStatus,
}

impl SnakeGame {
    /// Seed a new game from the current layout: a 3-segment snake
    /// centered on the grid moving right, collectibles on the cells the
    /// text occupies.
    pub fn new(viewport: &Viewport, layout: &Layout) -> Self {
        let cols = crate::grid_cells(viewport.width, consts::GRID_SIZE);
        let rows = crate::grid_cells(viewport.height, consts::GRID_SIZE);

        let center = GridPos { x: cols / 2, y: rows / 2 };
        let body: VecDeque<GridPos> = (0..consts::SNAKE_START_LEN as i32)
            .map(|i| GridPos { x: center.x - i, y: center.y })
            .collect();

        let mut dots = Vec::new();
        let mut seen = HashSet::new();
        for &cell in &layout.grid.cells {
            let (px, py) = layout.cell_px(cell);
            let pos = GridPos {
                x: (px as f32 / consts::GRID_SIZE as f32).round() as i32,
                y: (py as f32 / consts::GRID_SIZE as f32).round() as i32,
            };
            let pos = GridPos {
                x: pos.x.clamp(0, cols - 1),
                y: pos.y.clamp(0, rows - 1),
            };
            if seen.insert(pos) {
                dots.push(Collectible { pos, eaten: false });
            }
        }
        log::info!("seeded {} collectibles on a {}x{} grid", dots.len(), cols, rows);

        Self {
            cols,
            rows,
            body,
            dir: Dir::Right,
            pending: None,
            dots,
            score: 0,
            status: SnakeStatus::Running,
        }
    }

    /// Queue a direction change for the next tick. A turn back onto the
    /// current movement axis is silently dropped; within one tick
    /// period the last legal request wins.
    pub fn queue_direction(&mut self, dir: Dir) {
        let legal = if dir.is_vertical() {
            !self.dir.is_vertical()
        } else {
            self.dir.is_vertical()
        };
        if legal {
            self.pending = Some(dir);
        }
    }

    /// Advance one tick
    pub fn tick(&mut self) {
        if self.status != SnakeStatus::Running {
            return;
        }

        if let Some(dir) = self.pending.take() {
            self.dir = dir;
        }

        let (dx, dy) = self.dir.delta();
        let head = self.body[0];
        let new_head = GridPos {
            x: (head.x + dx).rem_euclid(self.cols),
            y: (head.y + dy).rem_euclid(self.rows),
        };

        if self.body.iter().any(|&seg| seg == new_head) {
            log::info!("snake hit itself at {:?}, score {}", new_head, self.score);
            self.status = SnakeStatus::Over;
            return;
        }

        self.body.push_front(new_head);

        let mut ate = false;
        for dot in &mut self.dots {
            if !dot.eaten && dot.pos == new_head {
                dot.eaten = true;
                self.score += 1;
                ate = true;
                break;
            }
        }
        if !ate {
            self.body.pop_back();
        }

        // Too-sparse fields never arm the win check; the fallback
        // pattern guarantees this only happens in degenerate setups
        if self.dots.len() >= consts::MIN_PLAYFIELD_CELLS && self.dots.iter().all(|d| d.eaten) {
            log::info!("snake cleared the field, score {}", self.score);
            self.status = SnakeStatus::Won;
        }
    }

    /// Force the winning terminal state (cheat sequences)
    pub fn force_win(&mut self) {
        self.status = SnakeStatus::Won;
    }

    pub fn status(&self) -> SnakeStatus {
        self.status
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total_dots(&self) -> usize {
        self.dots.len()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn head(&self) -> GridPos {
        self.body[0]
    }

    /// Emit the frame's draw list
    pub fn draw(&self) -> Vec<DrawCmd> {
        let grid = consts::GRID_SIZE as f32;
        // Slightly smaller than the cell for a visual gap
        let dot = grid - 2.0;

        let mut cmds = vec![DrawCmd::Clear { color: Rgba::BLACK }];

        for c in self.dots.iter().filter(|d| !d.eaten) {
            cmds.push(DrawCmd::FillRect {
                x: c.pos.x as f32 * grid,
                y: c.pos.y as f32 * grid,
                w: dot,
                h: dot,
                color: Rgba::WHITE,
            });
        }

        let len = self.body.len() as f32;
        for (i, seg) in self.body.iter().enumerate() {
            let color = if i == 0 {
                Rgba::GREEN
            } else {
                // Body fades toward the tail
                Rgba::GREEN.with_alpha(1.0 - (i as f32 / len) * 0.6)
            };
            cmds.push(DrawCmd::FillRect {
                x: seg.x as f32 * grid,
                y: seg.y as f32 * grid,
                w: dot,
                h: dot,
                color,
            });
        }

        cmds.push(DrawCmd::Text {
            text: format!("Score: {}/{}", self.score, self.dots.len()),
            x: 20.0,
            y: 30.0,
            px: 20.0,
            align: TextAlign::Left,
            baseline: TextBaseline::Alphabetic,
            color: Rgba::WHITE,
        });

        cmds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{self, PlacementMode};
    use proptest::prelude::*;

    const VP: Viewport = Viewport { width: 1280.0, height: 800.0 };

    fn new_game() -> SnakeGame {
        let layout = layout::plan_playfield(crate::consts::BANNER_TEXT, PlacementMode::Snake, &VP);
        SnakeGame::new(&VP, &layout)
    }

    /// A game with a single collectible at a chosen offset from the head
    fn game_with_dot_ahead() -> SnakeGame {
        let mut game = new_game();
        let head = game.head();
        game.dots = vec![Collectible {
            pos: GridPos { x: head.x + 1, y: head.y },
            eaten: false,
        }];
        game
    }

    #[test]
    fn test_initial_state() {
        let game = new_game();
        assert_eq!(game.status(), SnakeStatus::Running);
        assert_eq!(game.len(), 3);
        assert_eq!(game.score(), 0);
        assert!(game.total_dots() >= crate::consts::MIN_PLAYFIELD_CELLS);
    }

    #[test]
    fn test_eat_grows_and_scores() {
        // Collectible one step ahead of a rightward snake: one tick
        // later the snake is longer, the dot eaten, the score counted
        let mut game = game_with_dot_ahead();
        game.tick();
        assert_eq!(game.len(), 4);
        assert_eq!(game.score(), 1);
        assert!(game.dots[0].eaten);
    }

    #[test]
    fn test_constant_length_without_food() {
        let mut game = new_game();
        game.dots.clear();
        for _ in 0..10 {
            game.tick();
        }
        assert_eq!(game.len(), 3);
    }

    #[test]
    fn test_reversal_dropped() {
        let mut game = new_game();
        game.queue_direction(Dir::Left); // reversal onto current axis
        game.tick();
        assert_eq!(game.dir, Dir::Right);

        game.queue_direction(Dir::Up); // legal turn
        game.tick();
        assert_eq!(game.dir, Dir::Up);

        game.queue_direction(Dir::Down); // reversal again
        game.tick();
        assert_eq!(game.dir, Dir::Up);
    }

    #[test]
    fn test_last_queued_direction_wins() {
        let mut game = new_game();
        game.queue_direction(Dir::Up);
        game.queue_direction(Dir::Down);
        game.tick();
        assert_eq!(game.dir, Dir::Down);
    }

    #[test]
    fn test_wraps_at_edges() {
        let mut game = new_game();
        game.dots.clear();
        let cols = game.cols;
        // Walk right until past the edge; the head must wrap, not escape
        for _ in 0..=cols {
            game.tick();
            let head = game.head();
            assert!(head.x >= 0 && head.x < cols);
        }
        assert_eq!(game.status(), SnakeStatus::Running);
    }

    #[test]
    fn test_self_collision_is_over() {
        let mut game = game_with_dot_ahead();
        game.tick(); // eat: length 4
        assert_eq!(game.len(), 4);
        // Tight left turn circles back into the body
        game.queue_direction(Dir::Up);
        game.tick();
        game.queue_direction(Dir::Left);
        game.tick();
        game.queue_direction(Dir::Down);
        game.tick();
        assert_eq!(game.status(), SnakeStatus::Over);
    }

    #[test]
    fn test_terminal_state_stops_ticking() {
        let mut game = game_with_dot_ahead();
        game.force_win();
        let len = game.len();
        game.tick();
        assert_eq!(game.len(), len);
        assert_eq!(game.status(), SnakeStatus::Won);
    }

    #[test]
    fn test_win_requires_minimum_field() {
        // A single-dot field is below the threshold: eating everything
        // must not win
        let mut game = game_with_dot_ahead();
        game.tick();
        assert_eq!(game.score(), 1);
        assert_eq!(game.status(), SnakeStatus::Running);
    }

    #[test]
    fn test_win_when_field_cleared() {
        let mut game = new_game();
        let total = game.total_dots() as u32;
        for dot in &mut game.dots {
            dot.eaten = true;
        }
        game.score = total - 1;
        // Un-eat one dot and place it ahead of the head
        let head = game.head();
        game.dots[0].eaten = false;
        game.dots[0].pos = GridPos { x: head.x + 1, y: head.y };
        game.tick();
        assert_eq!(game.status(), SnakeStatus::Won);
        assert_eq!(game.score(), total);
    }

    #[test]
    fn test_draw_list_has_score_and_clear() {
        let game = new_game();
        let cmds = game.draw();
        assert!(matches!(cmds[0], DrawCmd::Clear { .. }));
        assert!(cmds.iter().any(|c| matches!(c, DrawCmd::Text { .. })));
    }

    #[test]
    fn test_state_serializes() {
        let game = new_game();
        let json = serde_json::to_string(&game).unwrap();
        let back: SnakeGame = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), game.len());
        assert_eq!(back.total_dots(), game.total_dots());
    }

    proptest! {
        #[test]
        fn prop_length_is_start_plus_eaten(turns in proptest::collection::vec(0u8..4, 0..200)) {
            let mut game = new_game();
            for t in turns {
                let dir = match t {
                    0 => Dir::Up,
                    1 => Dir::Down,
                    2 => Dir::Left,
                    _ => Dir::Right,
                };
                game.queue_direction(dir);
                game.tick();
                if game.status() != SnakeStatus::Running {
                    break;
                }
                prop_assert_eq!(game.len() as u32, 3 + game.score());
            }
        }

        #[test]
        fn prop_head_stays_in_bounds(turns in proptest::collection::vec(0u8..4, 0..300)) {
            let mut game = new_game();
            for t in turns {
                let dir = match t {
                    0 => Dir::Up,
                    1 => Dir::Down,
                    2 => Dir::Left,
                    _ => Dir::Right,
                };
                game.queue_direction(dir);
                game.tick();
                if game.status() != SnakeStatus::Running {
                    break;
                }
                let head = game.head();
                prop_assert!(head.x >= 0 && head.x < game.cols);
                prop_assert!(head.y >= 0 && head.y < game.rows);
            }
        }
    }
}
