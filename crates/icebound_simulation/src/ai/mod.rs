//! AI module: steering-стратегии + конечные автоматы агентов
//!
//! Порядок систем (фаза Agents, последовательное выполнение):
//! 1. apply_destination_commands — внешние команды (фаза Commands)
//! 2. acquire_targets — захват/сброс боевых целей
//! 3. run_state_machines — переходы + steering → Velocity
//! 4. integrate_movement — Velocity → Transform

use bevy::prelude::*;

pub mod events;
pub mod state_machine;
pub mod steering;
pub mod systems;

// Re-export основных типов
pub use events::SetDestination;
pub use state_machine::{
    Condition, Perception, State, StateMachine, StateMachineError, Transition,
};
pub use steering::{AvoidCollision, PatrolRoute, Steering, SteeringContext};

use crate::SimulationSet;

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate; фаза Agents идёт строго до
/// Combat и Projectiles (см. SimulationPlugin).
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SetDestination>();

        app.add_systems(
            FixedUpdate,
            systems::apply_destination_commands.in_set(SimulationSet::Commands),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::acquire_targets,
                systems::run_state_machines,
                systems::integrate_movement,
            )
                .chain() // Последовательное выполнение для детерминизма
                .in_set(SimulationSet::Agents),
        );
    }
}
