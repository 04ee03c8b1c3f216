//! AI/input events

use bevy::prelude::*;

/// Event: команда «идти в точку» (input collaborator)
///
/// Генерируется сценой из клика мыши по миру; one-shot, без ответа.
/// Если юнит уже удалён — команда тихо игнорируется.
#[derive(Event, Debug, Clone)]
pub struct SetDestination {
    pub unit: Entity,
    pub position: Vec2,
}
