//! Combat module: оружие, контактные атаки, урон
//!
//! ECS ответственность:
//! - Weapon state: cooldown, магазин, решение о выстреле
//! - Контактные атаки юнитов без оружия
//! - Damage rules: HitLanded → Health, DamageDealt/EntityDied события
//!
//! Применение урона и despawn мёртвых регистрирует ProjectilePlugin:
//! урон ложится в фазе Projectiles, после резолва всех попаданий тика.

use bevy::prelude::*;

pub mod attacker;
pub mod damage;
pub mod weapon;

// Re-export основных типов
pub use attacker::{contact_attack_execution, ContactAttack};
pub use damage::{DamageDealt, DamageSource, EntityDied, HitLanded};
pub use weapon::{
    FireOutcome, ProjectileSpawn, ReloadWeapon, Weapon, WeaponConfig, WeaponFireIntent,
    WeaponFired, WeaponReloaded,
};

use crate::SimulationSet;

/// Combat Plugin
///
/// Порядок выполнения (фаза Combat):
/// 1. tick_weapon_cooldowns — таймеры оружия
/// 2. weapon_fire_intent — решение о выстреле (cooldown + цель в дальности)
/// 3. fire_weapons — исполнение: spawn снарядов менеджеру
/// 4. contact_attack_execution — укусы юнитов без оружия
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<WeaponFireIntent>()
            .add_event::<WeaponFired>()
            .add_event::<ReloadWeapon>()
            .add_event::<WeaponReloaded>()
            .add_event::<HitLanded>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>();

        // Внешние команды перезарядки — в фазе Commands
        app.add_systems(
            FixedUpdate,
            weapon::process_reload_commands.in_set(SimulationSet::Commands),
        );

        app.add_systems(
            FixedUpdate,
            (
                weapon::tick_weapon_cooldowns,
                weapon::weapon_fire_intent,
                weapon::fire_weapons,
                attacker::contact_attack_execution,
            )
                .chain() // Последовательное выполнение
                .in_set(SimulationSet::Combat),
        );
    }
}
