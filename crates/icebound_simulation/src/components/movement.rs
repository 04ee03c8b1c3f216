//! Movement компоненты: скорость, боевая цель, точка назначения

use bevy::prelude::*;

/// Текущая скорость юнита (px/сек)
///
/// Пишется state machine'ой (desired velocity после avoidance-фильтра),
/// читается интеграцией `translation += velocity * dt`.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Velocity(pub Vec2);

/// Крейсерская скорость юнита (px/сек)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct MoveSpeed {
    pub speed: f32,
}

impl Default for MoveSpeed {
    fn default() -> Self {
        Self { speed: 80.0 } // базовая скорость ходьбы
    }
}

/// Слабая ссылка на боевую цель (non-owning)
///
/// Цель может быть удалена в любой момент — все обращения через
/// `Query::get` и обязаны переживать «цели больше нет» как штатный случай.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct CombatTarget(pub Option<Entity>);

/// Радиус обнаружения врагов (px)
///
/// Юниты без этого компонента цели сами не захватывают —
/// им цель назначает сцена (player-controlled юниты).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct AggroRadius(pub f32);

/// Точка назначения (команда «идти сюда» от input collaborator)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Destination(pub Option<Vec2>);
