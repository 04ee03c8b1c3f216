//! Архетипы юнитов: враг (патруль/преследование) и юнит игрока
//!
//! Таблицы состояний собираются здесь из общих кирпичей (Steering,
//! Condition); сцена задаёт только стартовые параметры и waypoint'ы.

use std::sync::Arc;

use bevy::prelude::*;
use serde::Deserialize;

use crate::ai::state_machine::{Condition, State, StateMachine, StateMachineError};
use crate::ai::steering::{AvoidCollision, PatrolRoute, Steering};
use crate::combat::{ContactAttack, Weapon, WeaponConfig};
use crate::components::{AggroRadius, CombatTarget, Destination, Health, MoveSpeed, Player, Unit};

/// Базовые статы юнита (конфиг сцены)
#[derive(Debug, Clone, Deserialize)]
pub struct UnitStats {
    pub health: u32,
    #[serde(default)]
    pub damage: u32,
}

/// Конфигурация враждебного юнита
#[derive(Debug, Clone)]
pub struct HostileConfig {
    pub stats: UnitStats,
    pub speed: f32,
    /// Радиус обнаружения целей
    pub aggro_radius: f32,
    /// Радиус контактной атаки
    pub attack_radius: f32,
    pub attack_cooldown: f32,
    /// Доля здоровья, ниже которой юнит отступает
    pub retreat_health_fraction: f32,
    pub patrol_points: Vec<Vec2>,
    pub patrol_arrival_radius: f32,
    pub avoid_lookahead: f32,
}

impl Default for HostileConfig {
    fn default() -> Self {
        Self {
            stats: UnitStats {
                health: 100,
                damage: 50,
            },
            speed: 80.0,
            aggro_radius: 200.0,
            attack_radius: 28.0,
            attack_cooldown: 1.0,
            retreat_health_fraction: 0.2, // 20% health
            patrol_points: Vec::new(),
            patrol_arrival_radius: 16.0,
            avoid_lookahead: 64.0,
        }
    }
}

/// Конфигурация юнита игрока
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub stats: UnitStats,
    pub speed: f32,
    /// Радиус прибытия к точке назначения
    pub arrival_radius: f32,
    pub avoid_lookahead: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            stats: UnitStats {
                health: 200,
                damage: 0,
            },
            speed: 120.0,
            arrival_radius: 8.0,
            avoid_lookahead: 64.0,
        }
    }
}

/// Таблица состояний врага: patrol → chase → attack, retreat при низком HP
///
/// Порядок переходов = приоритет: отступление проверяется раньше боя.
pub fn hostile_state_machine(config: &HostileConfig) -> Result<StateMachine, StateMachineError> {
    let avoidance = AvoidCollision::new(config.avoid_lookahead);
    let route = PatrolRoute::with_waypoints(
        config.patrol_points.clone(),
        config.patrol_arrival_radius,
    );

    let patrol = State::new(Steering::Patrol(route))
        .with_avoidance(avoidance)
        .with_transition(
            Condition::TargetWithin {
                radius: config.aggro_radius,
            },
            "chase",
        );

    let chase = State::new(Steering::Pursue)
        .with_avoidance(avoidance)
        .with_transition(
            Condition::HealthBelow {
                fraction: config.retreat_health_fraction,
            },
            "retreat",
        )
        .with_transition(Condition::TargetLost, "patrol")
        .with_transition(
            Condition::TargetWithin {
                radius: config.attack_radius,
            },
            "attack",
        );

    let attack = State::new(Steering::Hold)
        .with_transition(
            Condition::HealthBelow {
                fraction: config.retreat_health_fraction,
            },
            "retreat",
        )
        .with_transition(Condition::TargetLost, "patrol")
        .with_transition(
            Condition::TargetBeyond {
                radius: config.attack_radius,
            },
            "chase",
        );

    let retreat = State::new(Steering::Evade)
        .with_avoidance(avoidance)
        .with_transition(Condition::TargetLost, "patrol");

    StateMachine::new(
        vec![
            ("patrol".to_string(), patrol),
            ("chase".to_string(), chase),
            ("attack".to_string(), attack),
            ("retreat".to_string(), retreat),
        ],
        "patrol",
    )
}

/// Таблица состояний игрока: idle ↔ move_to (команды set destination)
pub fn player_state_machine(config: &PlayerConfig) -> Result<StateMachine, StateMachineError> {
    let idle = State::new(Steering::Hold).with_transition(
        Condition::DestinationSet {
            min_distance: config.arrival_radius,
        },
        "move_to",
    );

    let move_to = State::new(Steering::Seek {
        arrival_radius: config.arrival_radius,
    })
    .with_avoidance(AvoidCollision::new(config.avoid_lookahead))
    .with_transition(
        Condition::DestinationReached {
            radius: config.arrival_radius,
        },
        "idle",
    );

    StateMachine::new(
        vec![("idle".to_string(), idle), ("move_to".to_string(), move_to)],
        "idle",
    )
}

/// Spawn враждебного юнита
///
/// Ошибка таблицы состояний всплывает к композитору сцены (fail fast).
pub fn spawn_hostile(
    commands: &mut Commands,
    position: Vec2,
    depth: f32,
    faction_id: u64,
    config: &HostileConfig,
) -> Result<Entity, StateMachineError> {
    let machine = hostile_state_machine(config)?;

    let entity = commands
        .spawn((
            Transform::from_translation(position.extend(depth)),
            Unit {
                faction_id,
                damage: config.stats.damage,
            },
            Health::new(config.stats.health),
            MoveSpeed {
                speed: config.speed,
            },
            CombatTarget::default(),
            AggroRadius(config.aggro_radius),
            ContactAttack::new(config.attack_radius, config.attack_cooldown),
            machine,
        ))
        .id();

    Ok(entity)
}

/// Spawn юнита игрока (с оружием)
pub fn spawn_player(
    commands: &mut Commands,
    position: Vec2,
    depth: f32,
    faction_id: u64,
    config: &PlayerConfig,
    weapon: Arc<WeaponConfig>,
) -> Result<Entity, StateMachineError> {
    let machine = player_state_machine(config)?;

    let entity = commands
        .spawn((
            Transform::from_translation(position.extend(depth)),
            Player,
            Unit {
                faction_id,
                damage: config.stats.damage,
            },
            Health::new(config.stats.health),
            MoveSpeed {
                speed: config.speed,
            },
            CombatTarget::default(),
            Destination::default(),
            Weapon::new(weapon),
            machine,
        ))
        .id();

    Ok(entity)
}
