//! Менеджер жизненного цикла снарядов
//!
//! Владеет live set'ом снарядов (entities с Projectile) и резолвит всю
//! снарядную физику один раз за тик, СТРОГО ПОСЛЕ перемещения агентов:
//! продвижение, swept-коллизии со статикой и юнитами, урон, удаление.
//!
//! Правила резолва:
//! - Путь за тик — отрезок; выигрывает ближайшее пересечение по ходу полёта
//! - При точном равенстве дистанций стена важнее юнита (стена блокирует
//!   всегда, даже ровно на краю тела)
//! - Снаряд никогда не задевает своего владельца (identity check)
//! - Удаление — deferred (Commands), никогда посреди итерации live set'а

use bevy::prelude::*;

use crate::combat::damage::{DamageSource, HitLanded};
use crate::components::{BodyRadius, Health, Unit};
use crate::world::BlockingMap;
use crate::SimulationSet;

/// Допуск исчерпания дальности: полёт ровно range/speed секунд,
/// без лишнего тика из-за накопленной float-ошибки
const RANGE_EPSILON: f32 = 1e-3;

/// Снаряд (владеется исключительно менеджером)
#[derive(Component, Debug, Clone)]
pub struct Projectile {
    /// Кто выстрелил (слабая ссылка — для исключения self-hit и attribution)
    pub shooter: Entity,
    /// Unit vector направления полёта
    pub direction: Vec2,
    /// Скорость (px/сек)
    pub speed: f32,
    /// Урон при попадании в юнита
    pub damage: u32,
    /// Остаток дальности (px); исчерпание — удаление без урона
    pub remaining_range: f32,
}

/// Визуальная глубина снарядов (z-слой, задаётся при композиции сцены)
#[derive(Resource, Debug, Clone, Copy)]
pub struct ProjectileDepth(pub f32);

/// Event: снаряд упёрся в статическую геометрию (VFX — искры по стене)
#[derive(Event, Debug, Clone)]
pub struct ProjectileBlocked {
    pub position: Vec2,
}

/// Projectile Plugin
///
/// `depth` — z-слой снарядов для rendering collaborator (one-time wiring,
/// как и блокирующие слои BlockingMap — не повторяется по тикам).
///
/// Порядок выполнения (фаза Projectiles):
/// 1. advance_and_resolve — продвижение + коллизии + события попаданий
/// 2. apply_damage — HitLanded → Health (снаряды этого тика и укусы)
/// 3. despawn_dead_units — удаление погибших
pub struct ProjectilePlugin {
    pub depth: f32,
}

impl Default for ProjectilePlugin {
    fn default() -> Self {
        Self { depth: 0.0 }
    }
}

impl Plugin for ProjectilePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ProjectileDepth(self.depth))
            .add_event::<ProjectileBlocked>();

        app.add_systems(
            FixedUpdate,
            (
                advance_and_resolve,
                crate::combat::damage::apply_damage,
                crate::combat::damage::despawn_dead_units,
            )
                .chain() // Последовательное выполнение
                .in_set(SimulationSet::Projectiles),
        );
    }
}

/// Система: продвижение снарядов + резолв коллизий
///
/// dt == 0 — полный no-op (позиции и live set не меняются).
/// Невалидный dt отбрасывается до любой мутации.
pub fn advance_and_resolve(
    mut projectiles: Query<(Entity, &mut Projectile, &mut Transform)>,
    units: Query<(Entity, &Transform, &BodyRadius, &Health), (With<Unit>, Without<Projectile>)>,
    map: Res<BlockingMap>,
    time: Res<Time<Fixed>>,
    mut hits: EventWriter<HitLanded>,
    mut blocked_events: EventWriter<ProjectileBlocked>,
    mut commands: Commands,
) {
    let delta = time.delta_secs();
    if !delta.is_finite() {
        crate::log_error(&format!("projectiles: non-finite dt {}, tick skipped", delta));
        return;
    }
    if delta <= 0.0 {
        return;
    }

    for (entity, mut projectile, mut transform) in projectiles.iter_mut() {
        let origin = transform.translation.truncate();
        let step = (projectile.speed * delta).min(projectile.remaining_range);

        // Ближайшая стена по пути
        let wall_hit = map.raycast(origin, projectile.direction, step);

        // Ближайший юнит по пути (мимо владельца и мёртвых)
        let mut unit_hit: Option<(Entity, f32)> = None;
        for (unit_entity, unit_transform, radius, health) in units.iter() {
            if unit_entity == projectile.shooter {
                continue; // свой выстрел не ранит владельца
            }
            if !health.is_alive() {
                continue;
            }
            let center = unit_transform.translation.truncate();
            let Some(t) =
                segment_circle_intersection(origin, projectile.direction, step, center, radius.0)
            else {
                continue;
            };
            if unit_hit.map_or(true, |(_, best)| t < best) {
                unit_hit = Some((unit_entity, t));
            }
        }

        // Ближе по ходу полёта — выигрывает; при равенстве стена важнее
        let resolution = match (wall_hit, unit_hit) {
            (Some(wall_t), Some((target, unit_t))) if unit_t < wall_t => {
                Some(Resolution::Unit { target, t: unit_t })
            }
            (Some(wall_t), _) => Some(Resolution::Wall { t: wall_t }),
            (None, Some((target, unit_t))) => Some(Resolution::Unit { target, t: unit_t }),
            (None, None) => None,
        };

        match resolution {
            Some(Resolution::Wall { t }) => {
                let impact = origin + projectile.direction * t;
                transform.translation.x = impact.x;
                transform.translation.y = impact.y;
                blocked_events.write(ProjectileBlocked { position: impact });
                commands.entity(entity).despawn();
            }
            Some(Resolution::Unit { target, t }) => {
                let impact = origin + projectile.direction * t;
                transform.translation.x = impact.x;
                transform.translation.y = impact.y;
                hits.write(HitLanded {
                    attacker: projectile.shooter,
                    target,
                    damage: projectile.damage,
                    source: DamageSource::Projectile,
                });
                commands.entity(entity).despawn();
            }
            None => {
                // Свободный полёт на полный шаг
                transform.translation.x += projectile.direction.x * step;
                transform.translation.y += projectile.direction.y * step;
                projectile.remaining_range -= step;

                if projectile.remaining_range <= RANGE_EPSILON {
                    commands.entity(entity).despawn(); // дальность исчерпана, урона нет
                }
            }
        }
    }
}

enum Resolution {
    Wall { t: f32 },
    Unit { target: Entity, t: f32 },
}

/// Пересечение отрезка (origin, dir — unit vector, длина len) с кругом
///
/// Возвращает дистанцию до первой точки входа вдоль dir.
/// Старт внутри круга — немедленное попадание (t = 0).
fn segment_circle_intersection(
    origin: Vec2,
    dir: Vec2,
    len: f32,
    center: Vec2,
    radius: f32,
) -> Option<f32> {
    let to_center = center - origin;
    let radius_sq = radius * radius;

    if to_center.length_squared() <= radius_sq {
        return Some(0.0);
    }

    let proj = to_center.dot(dir);
    if proj < 0.0 {
        return None; // круг позади
    }

    let closest_sq = to_center.length_squared() - proj * proj;
    if closest_sq > radius_sq {
        return None; // траектория проходит мимо
    }

    let t = proj - (radius_sq - closest_sq).sqrt();
    (t >= 0.0 && t <= len).then_some(t)
}
