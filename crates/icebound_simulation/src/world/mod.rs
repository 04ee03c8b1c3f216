//! Статическая блокирующая геометрия арены
//!
//! Tile grid с обстрелом лучом (Amanatides–Woo DDA). Resource вставляется
//! сценой один раз при композиции и дальше read-only: его читают
//! AvoidCollision-фильтр и менеджер снарядов. Отсутствие ресурса при первом
//! тике — ошибка программиста (Bevy паникует на Res<BlockingMap>).

use bevy::prelude::*;

/// Блокирующая тайловая карта (стены арены)
///
/// Координаты мира в px, тайлы квадратные `tile_size` px.
/// Всё вне границ карты считается заблокированным (арена замкнута).
#[derive(Resource, Debug, Clone)]
pub struct BlockingMap {
    width: usize,
    height: usize,
    tile_size: f32,
    blocked: Vec<bool>,
}

impl BlockingMap {
    /// Пустая (проходимая) карта width×height тайлов
    pub fn new(width: usize, height: usize, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_size,
            blocked: vec![false; width * height],
        }
    }

    /// Карта из ASCII-строк: `#` — стена, всё остальное — пол
    ///
    /// Удобно для тестов и демо-сцен.
    pub fn from_rows(tile_size: f32, rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut map = Self::new(width, height, tile_size);
        for (ty, row) in rows.iter().enumerate() {
            for (tx, ch) in row.chars().enumerate() {
                if ch == '#' {
                    map.set_blocked(tx, ty, true);
                }
            }
        }
        map
    }

    /// Поэлементное OR с другим слоем (демо передаёт несколько блокирующих слоёв)
    ///
    /// Размеры слоёв обязаны совпадать — расхождение это ошибка композиции сцены.
    pub fn merge(&mut self, other: &BlockingMap) {
        assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "blocking layers must have identical dimensions"
        );
        for (dst, src) in self.blocked.iter_mut().zip(other.blocked.iter()) {
            *dst |= *src;
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn set_blocked(&mut self, tx: usize, ty: usize, blocked: bool) {
        if tx < self.width && ty < self.height {
            self.blocked[ty * self.width + tx] = blocked;
        }
    }

    /// Заблокирован ли тайл (вне границ — заблокировано)
    pub fn is_tile_blocked(&self, tx: i32, ty: i32) -> bool {
        if tx < 0 || ty < 0 || tx as usize >= self.width || ty as usize >= self.height {
            return true;
        }
        self.blocked[ty as usize * self.width + tx as usize]
    }

    /// Заблокирована ли точка мира
    pub fn is_blocked_at(&self, point: Vec2) -> bool {
        let tx = (point.x / self.tile_size).floor() as i32;
        let ty = (point.y / self.tile_size).floor() as i32;
        self.is_tile_blocked(tx, ty)
    }

    /// Луч из `origin` вдоль `dir` (не обязан быть нормирован) до `max_dist`
    ///
    /// Возвращает дистанцию до первого заблокированного тайла, либо None.
    /// Traversal — Amanatides–Woo: шагаем по границам тайлов, без сэмплинга.
    pub fn raycast(&self, origin: Vec2, dir: Vec2, max_dist: f32) -> Option<f32> {
        if max_dist <= 0.0 {
            return None;
        }
        let Some(dir) = dir.try_normalize() else {
            return None;
        };
        if self.is_blocked_at(origin) {
            return Some(0.0);
        }

        let ts = self.tile_size;
        let mut tx = (origin.x / ts).floor() as i32;
        let mut ty = (origin.y / ts).floor() as i32;

        let step_x: i32 = if dir.x >= 0.0 { 1 } else { -1 };
        let step_y: i32 = if dir.y >= 0.0 { 1 } else { -1 };

        // t до ближайшей вертикальной/горизонтальной границы тайла
        let mut t_max_x = if dir.x != 0.0 {
            let next = if dir.x > 0.0 { (tx + 1) as f32 * ts } else { tx as f32 * ts };
            (next - origin.x) / dir.x
        } else {
            f32::INFINITY
        };
        let mut t_max_y = if dir.y != 0.0 {
            let next = if dir.y > 0.0 { (ty + 1) as f32 * ts } else { ty as f32 * ts };
            (next - origin.y) / dir.y
        } else {
            f32::INFINITY
        };

        let t_delta_x = if dir.x != 0.0 { ts / dir.x.abs() } else { f32::INFINITY };
        let t_delta_y = if dir.y != 0.0 { ts / dir.y.abs() } else { f32::INFINITY };

        loop {
            let t = t_max_x.min(t_max_y);
            if t > max_dist {
                return None;
            }
            if t_max_x < t_max_y {
                tx += step_x;
                t_max_x += t_delta_x;
            } else {
                ty += step_y;
                t_max_y += t_delta_y;
            }
            if self.is_tile_blocked(tx, ty) {
                return Some(t);
            }
        }
    }
}
