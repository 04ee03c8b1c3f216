//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - unit: базовые характеристики агента (faction, damage, health, player marker)
//! - movement: перемещение и цели (Velocity, MoveSpeed, CombatTarget, Destination)

pub mod movement;
pub mod unit;

// Re-exports для удобного импорта
pub use movement::*;
pub use unit::*;
