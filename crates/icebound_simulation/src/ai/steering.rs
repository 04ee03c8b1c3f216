//! Steering-стратегии: расчёт желаемой скорости агента
//!
//! Стратегия — чистая функция от kinematic-состояния агента и окружения,
//! единственное внутреннее состояние — индекс маршрута у Patrol
//! (двигается только вперёд и заворачивается). Диспетчеризация — closed enum.
//!
//! AvoidCollision — не состояние, а пост-фильтр поверх сырого выхода любой
//! стратегии; блокирующую геометрию не владеет, а получает ссылкой
//! (shared `BlockingMap` resource, внедряется при композиции сцены).

use bevy::prelude::*;

use crate::world::BlockingMap;

/// Kinematic-снимок агента для расчёта steering
#[derive(Debug, Clone, Copy)]
pub struct SteeringContext {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Крейсерская скорость агента (px/сек)
    pub speed: f32,
    /// Позиция боевой цели, если цель жива
    pub target_position: Option<Vec2>,
    /// Точка назначения (set destination), если задана
    pub destination: Option<Vec2>,
}

/// Steering-стратегия состояния
#[derive(Debug, Clone)]
pub enum Steering {
    /// Стоять на месте
    Hold,
    /// Обход маршрута по кругу
    Patrol(PatrolRoute),
    /// Идти к точке назначения, остановка в радиусе прибытия
    Seek { arrival_radius: f32 },
    /// Преследовать боевую цель
    Pursue,
    /// Уходить от боевой цели
    Evade,
}

impl Steering {
    /// Желаемая скорость на этот тик
    ///
    /// Мутирует только внутренний прогресс Patrol (advance/wrap индекса).
    pub fn desired_velocity(&mut self, ctx: &SteeringContext) -> Vec2 {
        match self {
            Steering::Hold => Vec2::ZERO,

            Steering::Patrol(route) => route.desired_velocity(ctx.position, ctx.speed),

            Steering::Seek { arrival_radius } => match ctx.destination {
                Some(dest) if dest.distance(ctx.position) > *arrival_radius => {
                    (dest - ctx.position).normalize_or_zero() * ctx.speed
                }
                // Нет назначения или уже на месте — стоим
                _ => Vec2::ZERO,
            },

            Steering::Pursue => ctx
                .target_position
                .map(|t| (t - ctx.position).normalize_or_zero() * ctx.speed)
                .unwrap_or(Vec2::ZERO),

            Steering::Evade => ctx
                .target_position
                .map(|t| (ctx.position - t).normalize_or_zero() * ctx.speed)
                .unwrap_or(Vec2::ZERO),
        }
    }
}

/// Маршрут патруля: упорядоченные waypoint'ы, зацикленный обход
///
/// Инвариант: индекс всегда валиден (wrap за последней точкой).
/// Пустой маршрут — легитимное «патруль не настроен», агент стоит.
#[derive(Debug, Clone)]
pub struct PatrolRoute {
    waypoints: Vec<Vec2>,
    current: usize,
    arrival_radius: f32,
}

impl PatrolRoute {
    pub fn new(arrival_radius: f32) -> Self {
        Self {
            waypoints: Vec::new(),
            current: 0,
            arrival_radius,
        }
    }

    pub fn with_waypoints(waypoints: Vec<Vec2>, arrival_radius: f32) -> Self {
        Self {
            waypoints,
            current: 0,
            arrival_radius,
        }
    }

    /// Добавить точку в конец маршрута
    pub fn add_patrol_point(&mut self, point: Vec2) {
        self.waypoints.push(point);
    }

    pub fn current_waypoint(&self) -> Option<Vec2> {
        self.waypoints.get(self.current).copied()
    }

    pub fn arrival_radius(&self) -> f32 {
        self.arrival_radius
    }

    fn desired_velocity(&mut self, position: Vec2, speed: f32) -> Vec2 {
        if self.waypoints.is_empty() {
            return Vec2::ZERO; // патруль не настроен — держим позицию
        }

        // Дошли до текущей точки — переключаемся на следующую (wrap)
        if position.distance(self.waypoints[self.current]) < self.arrival_radius {
            self.current = (self.current + 1) % self.waypoints.len();
        }

        (self.waypoints[self.current] - position).normalize_or_zero() * speed
    }
}

/// Пост-фильтр обхода статической геометрии
///
/// Сэмплирует блокирующую карту лучом вдоль желаемого направления на
/// фиксированную дистанцию lookahead. Без препятствия вход возвращается
/// БЕЗ ИЗМЕНЕНИЙ; при препятствии подмешивается боковой увод, тем сильнее,
/// чем ближе препятствие. Скорость (длина вектора) сохраняется.
#[derive(Debug, Clone, Copy)]
pub struct AvoidCollision {
    pub lookahead: f32,
}

impl AvoidCollision {
    pub fn new(lookahead: f32) -> Self {
        Self { lookahead }
    }

    pub fn filter(&self, position: Vec2, desired: Vec2, map: &BlockingMap) -> Vec2 {
        let Some(forward) = desired.try_normalize() else {
            return desired; // стоим — нечего уводить
        };

        let Some(hit) = map.raycast(position, forward, self.lookahead) else {
            return desired; // путь чист — вход проходит насквозь
        };

        // Ближе препятствие → сильнее увод
        let proximity = 1.0 - (hit / self.lookahead).clamp(0.0, 1.0);

        // Уводим в более свободную сторону (боковые пробы той же длины)
        let left = forward.perp();
        let right = -left;
        let left_clear = map.raycast(position, left, self.lookahead).unwrap_or(self.lookahead);
        let right_clear = map.raycast(position, right, self.lookahead).unwrap_or(self.lookahead);
        let lateral = if left_clear >= right_clear { left } else { right };

        (forward + lateral * proximity).normalize_or_zero() * desired.length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patrol_empty_route_holds_position() {
        let mut steering = Steering::Patrol(PatrolRoute::new(10.0));
        let ctx = SteeringContext {
            position: Vec2::new(100.0, 100.0),
            velocity: Vec2::ZERO,
            speed: 80.0,
            target_position: None,
            destination: None,
        };
        assert_eq!(steering.desired_velocity(&ctx), Vec2::ZERO);
    }

    #[test]
    fn test_patrol_moves_toward_current_waypoint() {
        let mut route = PatrolRoute::new(10.0);
        route.add_patrol_point(Vec2::new(600.0, 100.0));
        route.add_patrol_point(Vec2::new(600.0, 400.0));

        let desired = route.desired_velocity(Vec2::new(600.0, 300.0), 80.0);
        // Первая точка (600,100) — идём вверх по y
        assert!((desired.x).abs() < 1e-5);
        assert!(desired.y < 0.0);
        assert!((desired.length() - 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_patrol_advances_and_wraps() {
        let mut route = PatrolRoute::with_waypoints(
            vec![Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)],
            10.0,
        );

        // В радиусе первой точки — переключение на вторую
        route.desired_velocity(Vec2::new(1.0, 0.0), 80.0);
        assert_eq!(route.current_waypoint(), Some(Vec2::new(100.0, 0.0)));

        // В радиусе второй — wrap на первую
        route.desired_velocity(Vec2::new(99.0, 0.0), 80.0);
        assert_eq!(route.current_waypoint(), Some(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn test_seek_stops_inside_arrival_radius() {
        let mut steering = Steering::Seek { arrival_radius: 8.0 };
        let ctx = SteeringContext {
            position: Vec2::new(100.0, 100.0),
            velocity: Vec2::ZERO,
            speed: 120.0,
            target_position: None,
            destination: Some(Vec2::new(104.0, 100.0)),
        };
        assert_eq!(steering.desired_velocity(&ctx), Vec2::ZERO);
    }

    #[test]
    fn test_pursue_without_target_holds() {
        let mut steering = Steering::Pursue;
        let ctx = SteeringContext {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            speed: 80.0,
            target_position: None,
            destination: None,
        };
        assert_eq!(steering.desired_velocity(&ctx), Vec2::ZERO);
    }

    #[test]
    fn test_avoid_collision_passes_through_when_clear() {
        let map = BlockingMap::new(20, 20, 32.0);
        let avoid = AvoidCollision::new(64.0);
        let desired = Vec2::new(80.0, 13.0);
        let out = avoid.filter(Vec2::new(320.0, 320.0), desired, &map);
        // Без препятствий выход РАВЕН входу (бит в бит)
        assert_eq!(out, desired);
    }

    #[test]
    fn test_avoid_collision_deflects_near_wall() {
        let map = BlockingMap::from_rows(
            32.0,
            &[
                "........", //
                "....#...", //
                "........",
            ],
        );
        let avoid = AvoidCollision::new(96.0);
        // Стоим слева от стены (тайл 4,1), идём вправо прямо в неё
        let position = Vec2::new(80.0, 48.0);
        let desired = Vec2::new(80.0, 0.0);
        let out = avoid.filter(position, desired, &map);

        assert_ne!(out, desired);
        // Скорость сохраняется, появляется боковая составляющая
        assert!((out.length() - desired.length()).abs() < 1e-3);
        assert!(out.y.abs() > 1e-3);
    }
}
