//! Базовые компоненты юнитов: Unit, Health, BodyRadius, Player

use bevy::prelude::*;

use crate::components::{CombatTarget, MoveSpeed, Velocity};

/// Юнит — базовый компонент симулируемого агента (игрок или враг)
///
/// Автоматически добавляет Health, Velocity, MoveSpeed, CombatTarget,
/// BodyRadius через Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health, Velocity, MoveSpeed, CombatTarget, BodyRadius)]
pub struct Unit {
    /// Stable ID фракции (определяет «свой/чужой» при выборе целей)
    pub faction_id: u64,
    /// Базовый урон юнита (контактные атаки юнитов без оружия)
    pub damage: u32,
}

/// Здоровье юнита
///
/// Инвариант: 0 ≤ current ≤ max.
/// Health меняется только системами урона — юниты сами себя не опрашивают.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = (self.current + amount).min(self.max);
    }
}

/// Радиус тела юнита (px) — используется коллизиями снарядов
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct BodyRadius(pub f32);

impl Default for BodyRadius {
    fn default() -> Self {
        Self(12.0) // чуть меньше полутайла (tile 32px)
    }
}

/// Marker: юнит под управлением игрока
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Player;
