//! ICEBOUND Simulation Core
//!
//! ECS-симуляция тайловой арены на Bevy 0.16: автономные агенты
//! (патрулирующие/преследующие враги, юнит игрока) и снаряды их оружия.
//!
//! Архитектура тика (FixedUpdate, 60Hz):
//! 1. Commands — внешние one-shot команды (set destination, reload)
//! 2. Agents — perception, state machine + steering, интеграция скорости
//! 3. Combat — weapon cooldowns, fire intents, spawn снарядов, контактные атаки
//! 4. Projectiles — продвижение снарядов, swept-коллизии, урон, смерть
//!
//! Снаряды резолвятся строго ПОСЛЕ всех перемещений агентов внутри тика.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod components;
pub mod logger;
pub mod projectiles;
pub mod units;
pub mod world;

// Re-export базовых типов для удобства
pub use ai::{
    AIPlugin, AvoidCollision, Condition, PatrolRoute, Perception, SetDestination, State,
    StateMachine, StateMachineError, Steering, SteeringContext, Transition,
};
pub use combat::{
    CombatPlugin, ContactAttack, DamageDealt, DamageSource, EntityDied, FireOutcome, HitLanded,
    ReloadWeapon, Weapon, WeaponConfig, WeaponFireIntent, WeaponFired, WeaponReloaded,
};
pub use components::*;
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_logger, LogLevel, LogPrinter};
pub use projectiles::{Projectile, ProjectileBlocked, ProjectileDepth, ProjectilePlugin};
pub use world::BlockingMap;

/// Частота симуляции (тиков в секунду)
pub const SIMULATION_TICK_HZ: f64 = 60.0;

/// Seed по умолчанию (если сцена не задала свой)
pub const DEFAULT_SEED: u64 = 42;

/// Фазы симуляционного тика (выполняются строго по порядку)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Внешние one-shot команды (input collaborator)
    Commands,
    /// Перемещение агентов (perception → FSM → steering → интеграция)
    Agents,
    /// Оружие и контактные атаки
    Combat,
    /// Снаряды: продвижение, коллизии, урон, удаление мёртвых
    Projectiles,
}

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// `projectile_depth` — визуальная глубина снарядов (z-слой для rendering
/// collaborator), задаётся один раз при композиции сцены.
pub struct SimulationPlugin {
    pub projectile_depth: f32,
}

impl Default for SimulationPlugin {
    fn default() -> Self {
        Self {
            projectile_depth: 0.0,
        }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Fixed timestep 60Hz для simulation tick (легче считать интервалы)
        app.insert_resource(Time::<Fixed>::from_hz(SIMULATION_TICK_HZ));

        // Детерминистичный RNG, если сцена не вставила свой (seeded)
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(DEFAULT_SEED));
        }

        // Порядок фаз тика: агенты двигаются до снарядов
        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Commands,
                SimulationSet::Agents,
                SimulationSet::Combat,
                SimulationSet::Projectiles,
            )
                .chain(),
        );

        // Подсистемы
        app.add_plugins((
            AIPlugin,
            CombatPlugin,
            ProjectilePlugin {
                depth: self.projectile_depth,
            },
        ));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время продвигается вручную ровно на один тик за `app.update()`
/// (TimeUpdateStrategy::ManualDuration) — прогоны воспроизводимы.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / SIMULATION_TICK_HZ,
        )))
        .insert_resource(Time::<Fixed>::from_hz(SIMULATION_TICK_HZ))
        .insert_resource(DeterministicRng::new(seed));

    app
}

/// Snapshot мира для сравнения детерминизма
///
/// Собирает все компоненты типа `T` в детерминированный байтовый формат
/// (сортировка по Entity ID, сериализация через Debug).
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
