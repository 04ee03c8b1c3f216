//! Конечный автомат агента
//!
//! Data-driven таблица именованных состояний: каждое состояние привязывает
//! одну steering-стратегию (плюс опциональный avoidance-фильтр) и список
//! переходов. Переходы проверяются раз в тик ДО расчёта steering — смена
//! состояния и её steering действуют в том же тике, без лага.
//!
//! Условия переходов — предикаты над perception-снимком агента; первый
//! сработавший переход в объявленном порядке выигрывает.
//!
//! Ошибки конфигурации (пустая таблица, неизвестные состояния) ловятся на
//! конструировании — это ошибки программиста, не runtime-случаи.

use std::collections::HashMap;

use bevy::prelude::*;
use thiserror::Error;

use crate::ai::steering::{AvoidCollision, Steering, SteeringContext};
use crate::world::BlockingMap;

/// Perception-снимок агента на текущий тик
#[derive(Debug, Clone, Copy)]
pub struct Perception {
    /// Доля здоровья: current / max
    pub health_fraction: f32,
    /// Дистанция до боевой цели; None — цели нет (не захвачена или умерла)
    pub target_distance: Option<f32>,
    /// Дистанция до точки назначения; None — назначение не задано
    pub destination_distance: Option<f32>,
}

/// Условие перехода (предикат над perception)
#[derive(Debug, Clone, Copy)]
pub enum Condition {
    /// Цель захвачена и ближе radius
    TargetWithin { radius: f32 },
    /// Цель захвачена, но дальше radius
    TargetBeyond { radius: f32 },
    /// Цели нет
    TargetLost,
    /// Здоровье ниже доли (0.0..1.0)
    HealthBelow { fraction: f32 },
    /// Назначение задано и дальше min_distance (есть куда идти)
    DestinationSet { min_distance: f32 },
    /// Назначение не задано либо уже в радиусе прибытия
    DestinationReached { radius: f32 },
}

impl Condition {
    pub fn holds(&self, perception: &Perception) -> bool {
        match self {
            Condition::TargetWithin { radius } => {
                perception.target_distance.is_some_and(|d| d <= *radius)
            }
            Condition::TargetBeyond { radius } => {
                perception.target_distance.is_some_and(|d| d > *radius)
            }
            Condition::TargetLost => perception.target_distance.is_none(),
            Condition::HealthBelow { fraction } => perception.health_fraction < *fraction,
            Condition::DestinationSet { min_distance } => perception
                .destination_distance
                .is_some_and(|d| d > *min_distance),
            Condition::DestinationReached { radius } => {
                perception.destination_distance.is_none_or(|d| d <= *radius)
            }
        }
    }
}

/// Переход: условие + имя следующего состояния
#[derive(Debug, Clone)]
pub struct Transition {
    pub condition: Condition,
    pub next: String,
}

impl Transition {
    pub fn new(condition: Condition, next: impl Into<String>) -> Self {
        Self {
            condition,
            next: next.into(),
        }
    }
}

/// Состояние автомата
///
/// Steering фиксирована на всё время жизни состояния; прогресс стратегии
/// (индекс Patrol) живёт внутри экземпляра и НЕ сбрасывается при повторном
/// входе в состояние.
#[derive(Debug, Clone)]
pub struct State {
    pub steering: Steering,
    /// Avoidance как пост-фильтр поверх сырого выхода steering
    pub avoidance: Option<AvoidCollision>,
    /// Переходы в объявленном порядке приоритета
    pub transitions: Vec<Transition>,
}

impl State {
    pub fn new(steering: Steering) -> Self {
        Self {
            steering,
            avoidance: None,
            transitions: Vec::new(),
        }
    }

    pub fn with_avoidance(mut self, avoidance: AvoidCollision) -> Self {
        self.avoidance = Some(avoidance);
        self
    }

    pub fn with_transition(mut self, condition: Condition, next: impl Into<String>) -> Self {
        self.transitions.push(Transition::new(condition, next));
        self
    }
}

/// Ошибки конфигурации таблицы состояний
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("state table is empty")]
    EmptyStateTable,
    #[error("initial state `{0}` not found in state table")]
    UnknownInitialState(String),
    #[error("transition from `{from}` references unknown state `{to}`")]
    UnknownTransitionTarget { from: String, to: String },
}

/// Конечный автомат (владеется ровно одним юнитом)
///
/// Инвариант: `current` всегда резолвится в существующее состояние,
/// активно ровно одно состояние.
#[derive(Component, Debug, Clone)]
pub struct StateMachine {
    states: HashMap<String, State>,
    current: String,
}

impl StateMachine {
    /// Собирает автомат, валидируя таблицу (fail fast на ошибках конфигурации)
    pub fn new(
        named_states: Vec<(String, State)>,
        initial: impl Into<String>,
    ) -> Result<Self, StateMachineError> {
        if named_states.is_empty() {
            return Err(StateMachineError::EmptyStateTable);
        }

        let states: HashMap<String, State> = named_states.into_iter().collect();

        let initial = initial.into();
        if !states.contains_key(&initial) {
            return Err(StateMachineError::UnknownInitialState(initial));
        }

        for (name, state) in &states {
            for transition in &state.transitions {
                if !states.contains_key(&transition.next) {
                    return Err(StateMachineError::UnknownTransitionTarget {
                        from: name.clone(),
                        to: transition.next.clone(),
                    });
                }
            }
        }

        Ok(Self {
            states,
            current: initial,
        })
    }

    /// Имя активного состояния
    pub fn current_state(&self) -> &str {
        &self.current
    }

    /// Один тик автомата: переходы, затем steering активного состояния
    ///
    /// Возвращает желаемую скорость (после avoidance-фильтра, если он задан
    /// у состояния).
    pub fn tick(
        &mut self,
        perception: &Perception,
        ctx: &SteeringContext,
        map: &BlockingMap,
    ) -> Vec2 {
        // Переходы: первый сработавший в объявленном порядке
        let state = self
            .states
            .get(&self.current)
            .expect("state machine invariant: current state exists");

        if let Some(next) = state
            .transitions
            .iter()
            .find(|t| t.condition.holds(perception))
            .map(|t| t.next.clone())
        {
            self.current = next;
        }

        // Steering активного (возможно нового) состояния — в том же тике
        let state = self
            .states
            .get_mut(&self.current)
            .expect("state machine invariant: current state exists");

        let desired = state.steering.desired_velocity(ctx);
        match &state.avoidance {
            Some(avoidance) => avoidance.filter(ctx.position, desired, map),
            None => desired,
        }
    }
}
