//! Применение урона и обработка смерти
//!
//! Все источники урона (снаряды, контактные атаки) сводятся в HitLanded;
//! одна система применяет урон к Health и публикует DamageDealt/EntityDied.
//! Юнит с health == 0 удаляется из симуляции (deferred despawn).

use bevy::prelude::*;

use crate::components::Health;

/// Источник урона
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    Projectile,
    Contact,
}

/// Event: попадание зафиксировано (урон ещё не применён)
#[derive(Event, Debug, Clone)]
pub struct HitLanded {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub source: DamageSource,
}

/// Event: урон нанесён (для UI, звуков, эффектов)
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub source: DamageSource,
    pub target_died: bool,
}

/// Event: юнит погиб (health == 0)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Система: применение HitLanded → Health
pub fn apply_damage(
    mut hit_events: EventReader<HitLanded>,
    mut targets: Query<&mut Health>,
    mut dealt_events: EventWriter<DamageDealt>,
    mut died_events: EventWriter<EntityDied>,
) {
    for hit in hit_events.read() {
        // Self-hit исключён ещё при резолве; здесь — последний рубеж
        if hit.attacker == hit.target {
            crate::log_warning(&format!("⚠️ self-hit dropped for {:?}", hit.attacker));
            continue;
        }

        // Слабая ссылка: цель могла быть удалена этим же тиком
        let Ok(mut health) = targets.get_mut(hit.target) else {
            continue;
        };
        if !health.is_alive() {
            continue; // труп не добиваем
        }

        health.take_damage(hit.damage);
        let died = !health.is_alive();

        dealt_events.write(DamageDealt {
            attacker: hit.attacker,
            target: hit.target,
            damage: hit.damage,
            source: hit.source,
            target_died: died,
        });

        crate::log(&format!(
            "💥 {:?} hit {:?} for {} ({:?}, HP left {})",
            hit.attacker, hit.target, hit.damage, hit.source, health.current
        ));

        if died {
            died_events.write(EntityDied {
                entity: hit.target,
                killer: Some(hit.attacker),
            });
        }
    }
}

/// Система: удаление погибших юнитов
///
/// Смерть — удаление из симуляции, не состояние автомата. Despawn deferred
/// (Commands), держатели слабых ссылок переживут исчезновение на следующем
/// обращении.
pub fn despawn_dead_units(mut died_events: EventReader<EntityDied>, mut commands: Commands) {
    for event in died_events.read() {
        if let Ok(mut entity_commands) = commands.get_entity(event.entity) {
            entity_commands.despawn();
            crate::log_info(&format!(
                "☠️ Unit {:?} destroyed (killer: {:?})",
                event.entity, event.killer
            ));
        }
    }
}
