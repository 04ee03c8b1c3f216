//! Weapon/emitter: конфиг-driven фабрика снарядов
//!
//! Архитектура:
//! - WeaponConfig — immutable value object (serde), шарится через Arc
//! - Weapon — per-unit состояние: cooldown timer + остаток магазина
//! - try_fire возвращает исход, а не Result: «ещё перезаряжается» и
//!   «магазин пуст» — штатные no-op, не ошибки

use std::sync::Arc;

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use crate::components::{CombatTarget, Health};
use crate::DeterministicRng;

/// Immutable конфигурация оружия
///
/// Read-only после конструирования; один конфиг переиспользуется всеми
/// юнитами с одинаковым оружием (Arc).
#[derive(Debug, Clone, Deserialize)]
pub struct WeaponConfig {
    pub id: String,
    pub name: String,
    pub damage: u32,
    #[serde(default)]
    pub cost: u32,
    /// Дальность полёта снаряда (px)
    pub range: f32,
    /// Снарядов за выстрел
    #[serde(default = "default_bullets_per_shot")]
    pub bullets_per_shot: u32,
    /// Cooldown между выстрелами (секунды)
    pub cooldown: f32,
    /// Смещение дула от центра юнита (px, в локальном фрейме «вправо»)
    #[serde(default)]
    pub muzzle_offset: [f32; 2],
    /// Полный угол разброса (радианы)
    #[serde(default)]
    pub spread: f32,
    /// Скорость снаряда (px/сек)
    #[serde(default = "default_projectile_speed")]
    pub projectile_speed: f32,
    /// Ёмкость магазина; 0 — без магазина (не требует перезарядки)
    #[serde(default)]
    pub magazine: u32,
}

fn default_bullets_per_shot() -> u32 {
    1
}

fn default_projectile_speed() -> f32 {
    800.0
}

impl WeaponConfig {
    pub fn muzzle_offset_vec(&self) -> Vec2 {
        Vec2::from_array(self.muzzle_offset)
    }
}

/// Параметры одного порождаемого снаряда
#[derive(Debug, Clone, Copy)]
pub struct ProjectileSpawn {
    pub position: Vec2,
    /// Unit vector направления полёта
    pub direction: Vec2,
    pub speed: f32,
    pub damage: u32,
    pub range: f32,
}

/// Исход попытки выстрела
#[derive(Debug, Clone)]
pub enum FireOutcome {
    /// Выстрел состоялся, снаряды порождены
    Fired(Vec<ProjectileSpawn>),
    /// Cooldown ещё не истёк — штатный no-op
    CoolingDown,
    /// Магазин пуст, нужна перезарядка — штатный no-op
    Empty,
}

/// Per-unit состояние оружия
#[derive(Component, Debug, Clone)]
pub struct Weapon {
    pub config: Arc<WeaponConfig>,
    /// Текущий cooldown timer (уменьшается до 0)
    pub cooldown_timer: f32,
    /// Остаток магазина (не используется при magazine == 0)
    pub rounds_left: u32,
}

impl Weapon {
    pub fn new(config: Arc<WeaponConfig>) -> Self {
        let rounds_left = config.magazine;
        Self {
            config,
            cooldown_timer: 0.0,
            rounds_left,
        }
    }

    /// Готово ли оружие к выстрелу (cooldown == 0)
    pub fn ready(&self) -> bool {
        self.cooldown_timer <= 0.0
    }

    /// Попытка выстрела из точки `origin` по точке прицеливания `aim`
    ///
    /// Смещение дула поворачивается во фрейм взгляда (origin → aim);
    /// снаряды летят от дула К точке прицеливания, так что перпендикулярная
    /// компонента смещения не уводит очередь мимо цели.
    /// Успешный выстрел порождает `bullets_per_shot` снарядов с
    /// детерминированным разбросом, сбрасывает cooldown и тратит заряд.
    pub fn try_fire(&mut self, origin: Vec2, aim: Vec2, rng: &mut ChaCha8Rng) -> FireOutcome {
        if !self.ready() {
            return FireOutcome::CoolingDown;
        }
        if self.config.magazine > 0 && self.rounds_left == 0 {
            return FireOutcome::Empty;
        }

        // Вырожденное направление взгляда заменяется +X
        let facing = (aim - origin).try_normalize().unwrap_or(Vec2::X);
        let muzzle = origin + facing.rotate(self.config.muzzle_offset_vec());
        let aim_dir = (aim - muzzle).try_normalize().unwrap_or(facing);

        let mut spawns = Vec::with_capacity(self.config.bullets_per_shot as usize);
        for _ in 0..self.config.bullets_per_shot {
            let jitter = if self.config.spread > 0.0 {
                let half = self.config.spread * 0.5;
                rng.gen_range(-half..=half)
            } else {
                0.0
            };
            spawns.push(ProjectileSpawn {
                position: muzzle,
                direction: Vec2::from_angle(jitter).rotate(aim_dir),
                speed: self.config.projectile_speed,
                damage: self.config.damage,
                range: self.config.range,
            });
        }

        if self.config.magazine > 0 {
            self.rounds_left -= 1; // один выстрел = один заряд (очередь за раз)
        }
        self.cooldown_timer = self.config.cooldown;

        FireOutcome::Fired(spawns)
    }

    /// Перезарядка: полный магазин, cooldown сброшен
    pub fn reload(&mut self) {
        self.rounds_left = self.config.magazine;
        self.cooldown_timer = 0.0;
    }
}

/// Event: юнит ХОЧЕТ выстрелить (cooldown готов, цель в дальности)
#[derive(Event, Debug, Clone)]
pub struct WeaponFireIntent {
    pub shooter: Entity,
}

/// Event: выстрел состоялся (для VFX/звука — дульная вспышка)
#[derive(Event, Debug, Clone)]
pub struct WeaponFired {
    pub shooter: Entity,
    pub muzzle: Vec2,
    pub rounds: u32,
}

/// Event: команда перезарядки (input collaborator)
#[derive(Event, Debug, Clone)]
pub struct ReloadWeapon {
    pub unit: Entity,
}

/// Event: перезарядка выполнена (для звука взвода)
#[derive(Event, Debug, Clone)]
pub struct WeaponReloaded {
    pub unit: Entity,
}

/// Система: обновление weapon cooldowns
pub fn tick_weapon_cooldowns(mut weapons: Query<&mut Weapon>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();
    for mut weapon in weapons.iter_mut() {
        if weapon.cooldown_timer > 0.0 {
            weapon.cooldown_timer = (weapon.cooldown_timer - delta).max(0.0);
        }
    }
}

/// Система: решение о выстреле
///
/// Условие триггера: cooldown готов ∧ боевая цель жива ∧ в дальности конфига.
/// Позиции юнитов на этот момент уже обновлены (фаза Agents прошла).
pub fn weapon_fire_intent(
    shooters: Query<(Entity, &Transform, &CombatTarget, &Weapon)>,
    targets: Query<(&Transform, &Health)>,
    mut intents: EventWriter<WeaponFireIntent>,
) {
    for (entity, transform, target, weapon) in shooters.iter() {
        if !weapon.ready() {
            continue;
        }

        let Some(target_entity) = target.0 else {
            continue;
        };
        // Слабая ссылка: цель могла быть удалена
        let Ok((target_transform, target_health)) = targets.get(target_entity) else {
            continue;
        };
        if !target_health.is_alive() {
            continue;
        }

        let distance = transform
            .translation
            .truncate()
            .distance(target_transform.translation.truncate());
        if distance > weapon.config.range {
            continue;
        }

        intents.write(WeaponFireIntent { shooter: entity });
    }
}

/// Система: исполнение выстрелов
///
/// Читает intents, порождает снаряды менеджеру (Commands → deferred spawn,
/// снаряды войдут в live set до фазы Projectiles этого же тика).
pub fn fire_weapons(
    mut intents: EventReader<WeaponFireIntent>,
    mut shooters: Query<(&Transform, &CombatTarget, &mut Weapon)>,
    transforms: Query<&Transform>,
    mut rng: ResMut<DeterministicRng>,
    depth: Res<crate::projectiles::ProjectileDepth>,
    mut fired_events: EventWriter<WeaponFired>,
    mut commands: Commands,
) {
    for intent in intents.read() {
        let Ok((transform, target, mut weapon)) = shooters.get_mut(intent.shooter) else {
            continue;
        };
        let Some(target_position) = target.0.and_then(|t| transforms.get(t).ok()) else {
            continue;
        };

        let origin = transform.translation.truncate();
        let aim = target_position.translation.truncate();
        if aim.distance_squared(origin) < 1e-6 {
            continue; // цель в той же точке — направление не определено
        }

        match weapon.try_fire(origin, aim, &mut rng.rng) {
            FireOutcome::Fired(spawns) => {
                let rounds = spawns.len() as u32;
                let muzzle = spawns.first().map(|s| s.position).unwrap_or(origin);

                for spawn in spawns {
                    commands.spawn((
                        Transform::from_translation(spawn.position.extend(depth.0)),
                        crate::projectiles::Projectile {
                            shooter: intent.shooter,
                            direction: spawn.direction,
                            speed: spawn.speed,
                            damage: spawn.damage,
                            remaining_range: spawn.range,
                        },
                    ));
                }

                fired_events.write(WeaponFired {
                    shooter: intent.shooter,
                    muzzle,
                    rounds,
                });

                crate::log(&format!(
                    "🔫 Unit {:?} fired {} ({} rounds)",
                    intent.shooter, weapon.config.name, rounds
                ));
            }
            // Штатные no-op исходы
            FireOutcome::CoolingDown | FireOutcome::Empty => {}
        }
    }
}

/// Система: обработка команд перезарядки
pub fn process_reload_commands(
    mut reload_commands: EventReader<ReloadWeapon>,
    mut weapons: Query<&mut Weapon>,
    mut reloaded_events: EventWriter<WeaponReloaded>,
) {
    for command in reload_commands.read() {
        let Ok(mut weapon) = weapons.get_mut(command.unit) else {
            continue; // юнита уже нет — no-op
        };
        weapon.reload();
        reloaded_events.write(WeaponReloaded { unit: command.unit });
        crate::log(&format!("Unit {:?} reloaded {}", command.unit, weapon.config.name));
    }
}
