//! Контактные атаки юнитов без оружия (укус)

use bevy::prelude::*;

use crate::combat::damage::{DamageSource, HitLanded};
use crate::components::{CombatTarget, Health, Unit};

/// Контактная атака: радиус + cooldown
///
/// Урон берётся из `Unit::damage`. Используется врагами ближнего боя —
/// у них нет Weapon-компонента.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ContactAttack {
    /// Радиус атаки (px)
    pub radius: f32,
    /// Cooldown между атаками (секунды)
    pub cooldown: f32,
    /// Текущий cooldown timer (уменьшается до 0)
    pub timer: f32,
}

impl Default for ContactAttack {
    fn default() -> Self {
        Self {
            radius: 28.0,
            cooldown: 1.0,
            timer: 0.0,
        }
    }
}

impl ContactAttack {
    pub fn new(radius: f32, cooldown: f32) -> Self {
        Self {
            radius,
            cooldown,
            timer: 0.0,
        }
    }

    pub fn ready(&self) -> bool {
        self.timer <= 0.0
    }
}

/// Система: исполнение контактных атак
///
/// Цель жива ∧ в радиусе ∧ cooldown готов → HitLanded (урон применит
/// общая damage-система в фазе Projectiles этого же тика).
pub fn contact_attack_execution(
    mut attackers: Query<(Entity, &Unit, &Transform, &CombatTarget, &mut ContactAttack)>,
    targets: Query<(&Transform, &Health)>,
    mut hits: EventWriter<HitLanded>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, unit, transform, target, mut attack) in attackers.iter_mut() {
        if attack.timer > 0.0 {
            attack.timer = (attack.timer - delta).max(0.0);
        }

        let Some(target_entity) = target.0 else {
            continue;
        };
        let Ok((target_transform, target_health)) = targets.get(target_entity) else {
            continue; // цель уже удалена
        };
        if !target_health.is_alive() || !attack.ready() {
            continue;
        }

        let distance = transform
            .translation
            .truncate()
            .distance(target_transform.translation.truncate());
        if distance > attack.radius {
            continue;
        }

        hits.write(HitLanded {
            attacker: entity,
            target: target_entity,
            damage: unit.damage,
            source: DamageSource::Contact,
        });
        attack.timer = attack.cooldown;

        crate::log(&format!("🐾 Unit {:?} bit {:?}", entity, target_entity));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_attack_ready_cycle() {
        let mut attack = ContactAttack::new(28.0, 1.0);
        assert!(attack.ready());

        attack.timer = attack.cooldown;
        assert!(!attack.ready());

        attack.timer = (attack.timer - 0.5).max(0.0);
        assert!(!attack.ready());

        attack.timer = (attack.timer - 0.5).max(0.0);
        assert!(attack.ready());
    }
}
