//! Deterministic game engines
//!
//! All gameplay logic lives here. Both engines are pure and
//! deterministic:
//! - Fixed timestep only, driven by the shell
//! - Seeded RNG only
//! - No rendering or platform dependencies; output is a draw list

pub mod breakout;
pub mod snake;

pub use breakout::{Ball, Brick, BreakoutGame, BreakoutStatus, Paddle, PaddleHeld};
pub use snake::{Collectible, Dir, GridPos, SnakeGame, SnakeStatus};
