//! AI-системы: команды, выбор целей, тик автоматов, интеграция движения

use bevy::prelude::*;

use crate::ai::events::SetDestination;
use crate::ai::state_machine::{Perception, StateMachine};
use crate::ai::steering::SteeringContext;
use crate::components::{AggroRadius, CombatTarget, Destination, Health, MoveSpeed, Unit, Velocity};
use crate::world::BlockingMap;

/// Система: применение внешних команд назначения
///
/// One-shot команды от input collaborator; удалённый юнит — штатный no-op.
pub fn apply_destination_commands(
    mut commands: EventReader<SetDestination>,
    mut destinations: Query<&mut Destination>,
) {
    for command in commands.read() {
        let Ok(mut destination) = destinations.get_mut(command.unit) else {
            continue; // юнита уже нет
        };
        destination.0 = Some(command.position);
        crate::log(&format!(
            "Unit {:?} destination set to {:?}",
            command.unit, command.position
        ));
    }
}

/// Система: захват боевых целей
///
/// Юниты с AggroRadius берут ближайшего живого врага (другая фракция)
/// в радиусе. Текущая цель удерживается пока жива; мёртвая/удалённая цель
/// сбрасывается — слабая ссылка, «референта больше нет» это штатный случай.
pub fn acquire_targets(
    mut hunters: Query<(Entity, &Unit, &Transform, &AggroRadius, &mut CombatTarget)>,
    candidates: Query<(Entity, &Unit, &Transform, &Health)>,
) {
    for (entity, unit, transform, aggro, mut target) in hunters.iter_mut() {
        // Текущая цель ещё валидна?
        if let Some(current) = target.0 {
            let alive = candidates
                .get(current)
                .map(|(_, _, _, health)| health.is_alive())
                .unwrap_or(false);
            if alive {
                continue;
            }
            target.0 = None;
        }

        let position = transform.translation.truncate();
        let acquired = find_nearest_enemy(entity, unit.faction_id, position, &candidates, aggro.0);

        if let Some(new_target) = acquired {
            target.0 = Some(new_target);
            crate::log(&format!("⚔️ Unit {:?} acquired target {:?}", entity, new_target));
        }
    }
}

/// Система: тик конечных автоматов
///
/// Perception-снимок → переходы → steering (+avoidance) → Velocity.
/// Невалидная (не конечная) желаемая скорость отбрасывается, юнит
/// пропускает тик, ошибка логируется — симуляция не падает.
pub fn run_state_machines(
    mut agents: Query<(
        Entity,
        &Transform,
        &Health,
        &MoveSpeed,
        &CombatTarget,
        Option<&Destination>,
        &mut StateMachine,
        &mut Velocity,
    )>,
    transforms: Query<&Transform>,
    map: Res<BlockingMap>,
) {
    for (entity, transform, health, speed, target, destination, mut machine, mut velocity) in
        agents.iter_mut()
    {
        let position = transform.translation.truncate();

        // Слабая ссылка: позиция цели только если entity ещё существует
        let target_position = target
            .0
            .and_then(|t| transforms.get(t).ok())
            .map(|t| t.translation.truncate());
        let destination_point = destination.and_then(|d| d.0);

        let perception = Perception {
            health_fraction: health.current as f32 / health.max as f32,
            target_distance: target_position.map(|t| t.distance(position)),
            destination_distance: destination_point.map(|d| d.distance(position)),
        };
        let ctx = SteeringContext {
            position,
            velocity: velocity.0,
            speed: speed.speed,
            target_position,
            destination: destination_point,
        };

        let before = machine.current_state().to_owned();
        let desired = machine.tick(&perception, &ctx, &map);
        if machine.current_state() != before {
            crate::log(&format!(
                "Unit {:?}: {} → {}",
                entity,
                before,
                machine.current_state()
            ));
        }

        if !desired.is_finite() {
            crate::log_error(&format!(
                "Unit {:?}: non-finite desired velocity {:?}, skipping tick",
                entity, desired
            ));
            continue;
        }

        velocity.0 = desired;
    }
}

/// Система: интеграция скорости в позицию
///
/// `translation += velocity * dt`; z (визуальная глубина) не трогаем.
/// Невалидный dt отбрасывается ДО любой мутации состояния.
pub fn integrate_movement(
    mut movers: Query<(&Velocity, &mut Transform), With<Unit>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    if !delta.is_finite() {
        crate::log_error(&format!("integrate_movement: non-finite dt {}, tick skipped", delta));
        return;
    }

    for (velocity, mut transform) in movers.iter_mut() {
        transform.translation.x += velocity.0.x * delta;
        transform.translation.y += velocity.0.y * delta;
    }
}

/// Helper: ближайший живой враг (другая фракция) в радиусе
fn find_nearest_enemy(
    self_entity: Entity,
    self_faction: u64,
    self_position: Vec2,
    candidates: &Query<(Entity, &Unit, &Transform, &Health)>,
    max_range: f32,
) -> Option<Entity> {
    let mut nearest: Option<(Entity, f32)> = None;

    for (candidate, unit, transform, health) in candidates.iter() {
        // Не атакуем себя
        if candidate == self_entity {
            continue;
        }

        // Только враги (другая фракция)
        if unit.faction_id == self_faction {
            continue;
        }

        // Только живые
        if !health.is_alive() {
            continue;
        }

        let distance = self_position.distance(transform.translation.truncate());
        if distance > max_range {
            continue;
        }

        match nearest {
            Some((_, best)) if distance >= best => {}
            _ => nearest = Some((candidate, distance)),
        }
    }

    nearest.map(|(entity, _)| entity)
}
