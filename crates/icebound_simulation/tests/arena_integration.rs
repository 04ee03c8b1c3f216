//! Arena integration tests
//!
//! Сценарии на headless App: патрульный цикл, команды назначения,
//! контактные атаки, стрельба, блокировка снарядов стеной, дальность.
//!
//! Время продвигается вручную: один app.update() == один тик 1/60 сек.

use std::sync::Arc;

use bevy::prelude::*;
use icebound_simulation::*;

/// Helper: headless App с симуляцией и открытой ареной 40×40 тайлов
fn create_arena_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin::default());
    app.insert_resource(BlockingMap::new(40, 40, 32.0));
    // Первый тик — инициализация времени
    app.update();
    app
}

fn test_gun() -> Arc<WeaponConfig> {
    Arc::new(WeaponConfig {
        id: "test-mg".to_string(),
        name: "Test Machine Gun".to_string(),
        damage: 40,
        cost: 3000,
        range: 400.0,
        bullets_per_shot: 4,
        cooldown: 0.2,
        muzzle_offset: [55.0, 20.0],
        spread: 0.06,
        projectile_speed: 800.0,
        magazine: 30,
    })
}

fn position_of(app: &mut App, entity: Entity) -> Vec2 {
    app.world()
        .get::<Transform>(entity)
        .expect("entity has transform")
        .translation
        .truncate()
}

fn projectile_count(app: &mut App) -> usize {
    app.world_mut()
        .query::<&Projectile>()
        .iter(app.world())
        .count()
}

/// Патруль: враг обходит обе точки по порядку и зацикливается
#[test]
fn test_hostile_patrols_waypoints_in_loop() {
    let mut app = create_arena_app(42);

    let dog = units::spawn_hostile(
        &mut app.world_mut().commands(),
        Vec2::new(600.0, 300.0),
        0.0,
        1,
        &units::HostileConfig {
            patrol_points: vec![Vec2::new(600.0, 100.0), Vec2::new(600.0, 400.0)],
            ..Default::default()
        },
    )
    .unwrap();
    app.update();

    let waypoint_a = Vec2::new(600.0, 100.0);
    let waypoint_b = Vec2::new(600.0, 400.0);

    // Фиксируем порядок посещений (0 = первая точка, 1 = вторая)
    let mut visits: Vec<usize> = Vec::new();
    for _ in 0..4000 {
        app.update();
        let position = position_of(&mut app, dog);

        if position.distance(waypoint_a) < 17.0 && visits.last() != Some(&0) {
            visits.push(0);
        } else if position.distance(waypoint_b) < 17.0 && visits.last() != Some(&1) {
            visits.push(1);
        }
        if visits.len() >= 4 {
            break;
        }
    }

    // Порядок сохранён, точки не пропускаются, цикл бесконечный
    assert!(visits.len() >= 4, "dog never looped the route: {:?}", visits);
    assert_eq!(&visits[..4], &[0, 1, 0, 1]);
}

/// Команда set destination: игрок доходит и останавливается в радиусе прибытия
#[test]
fn test_player_walks_to_destination_and_stops() {
    let mut app = create_arena_app(42);

    let config = units::PlayerConfig::default();
    let arrival = config.arrival_radius;
    let penguin = units::spawn_player(
        &mut app.world_mut().commands(),
        Vec2::new(100.0, 300.0),
        0.0,
        0,
        &config,
        test_gun(),
    )
    .unwrap();
    app.update();

    let destination = Vec2::new(400.0, 300.0);
    app.world_mut().send_event(SetDestination {
        unit: penguin,
        position: destination,
    });

    for _ in 0..600 {
        app.update();
    }

    let position = position_of(&mut app, penguin);
    assert!(
        position.distance(destination) <= arrival + 3.0,
        "player at {:?}, expected near {:?}",
        position,
        destination
    );

    // Дошёл — автомат вернулся в idle
    let machine = app.world().get::<StateMachine>(penguin).unwrap();
    assert_eq!(machine.current_state(), "idle");
}

/// Враг замечает игрока, догоняет, кусает до смерти и возвращается в патруль
#[test]
fn test_hostile_chases_and_kills_target() {
    let mut app = create_arena_app(42);

    let dog = units::spawn_hostile(
        &mut app.world_mut().commands(),
        Vec2::new(600.0, 300.0),
        0.0,
        1,
        &units::HostileConfig {
            aggro_radius: 600.0,
            ..Default::default()
        },
    )
    .unwrap();
    let penguin = units::spawn_player(
        &mut app.world_mut().commands(),
        Vec2::new(400.0, 300.0),
        0.0,
        0,
        &units::PlayerConfig::default(),
        test_gun(),
    )
    .unwrap();
    app.update();

    let mut saw_chase = false;
    for _ in 0..900 {
        app.update();
        if let Some(machine) = app.world().get::<StateMachine>(dog) {
            let state = machine.current_state();
            if state == "chase" || state == "attack" {
                saw_chase = true;
            }
        }
    }

    assert!(saw_chase, "dog never entered chase/attack");
    // 200 HP / 50 за укус — к этому моменту игрок мёртв и удалён
    assert!(
        app.world().get_entity(penguin).is_err(),
        "player should be despawned after lethal damage"
    );
    // Цель потеряна — враг вернулся в патруль
    let machine = app.world().get::<StateMachine>(dog).unwrap();
    assert_eq!(machine.current_state(), "patrol");
}

/// Игрок расстреливает врага: урон только через менеджер снарядов
#[test]
fn test_player_shoots_hostile_dead() {
    let mut app = create_arena_app(42);

    let dog = units::spawn_hostile(
        &mut app.world_mut().commands(),
        Vec2::new(300.0, 300.0),
        0.0,
        1,
        &units::HostileConfig {
            aggro_radius: 10.0,             // не реагирует на игрока
            retreat_health_fraction: 0.0,   // и не отступает
            ..Default::default()
        },
    )
    .unwrap();
    let penguin = units::spawn_player(
        &mut app.world_mut().commands(),
        Vec2::new(100.0, 300.0),
        0.0,
        0,
        &units::PlayerConfig::default(),
        test_gun(),
    )
    .unwrap();
    app.update();

    // Input collaborator назначает цель
    app.world_mut().get_mut::<CombatTarget>(penguin).unwrap().0 = Some(dog);

    for _ in 0..600 {
        app.update();
        if app.world().get_entity(dog).is_err() {
            break;
        }
    }

    assert!(
        app.world().get_entity(dog).is_err(),
        "hostile should be shot dead and despawned"
    );
    // Игрок цел
    let health = app.world().get::<Health>(penguin).unwrap();
    assert_eq!(health.current, health.max);
}

/// Стена ближе юнита: снаряд гибнет на геометрии, урон не наносится
#[test]
fn test_wall_blocks_projectile_before_unit() {
    let mut app = create_headless_app(42);
    app.add_plugins(SimulationPlugin::default());

    // Вертикальная стена на тайловой колонке x=10 (мир x в [320, 352))
    let mut map = BlockingMap::new(40, 40, 32.0);
    for ty in 0..40 {
        map.set_blocked(10, ty, true);
    }
    app.insert_resource(map);

    // Счётчик попаданий в стену
    #[derive(Resource, Default)]
    struct BlockedCount(usize);
    fn count_blocked(mut reader: EventReader<ProjectileBlocked>, mut count: ResMut<BlockedCount>) {
        count.0 += reader.read().count();
    }
    app.init_resource::<BlockedCount>();
    app.add_systems(Update, count_blocked);

    app.update();

    // Юнит позади стены, прямо на линии огня
    let target = app
        .world_mut()
        .spawn((
            Transform::from_translation(Vec3::new(500.0, 300.0, 0.0)),
            Unit {
                faction_id: 1,
                damage: 0,
            },
            Health::new(100),
        ))
        .id();

    // Снаряд летит сквозь стену в юнита
    app.world_mut().spawn((
        Transform::from_translation(Vec3::new(100.0, 300.0, 0.0)),
        Projectile {
            shooter: Entity::PLACEHOLDER,
            direction: Vec2::X,
            speed: 400.0,
            damage: 40,
            remaining_range: 600.0,
        },
    ));

    for _ in 0..120 {
        app.update();
    }

    // Снаряд погиб на стене, юнит не тронут
    assert_eq!(projectile_count(&mut app), 0);
    assert_eq!(app.world().resource::<BlockedCount>().0, 1);
    let health = app.world().get::<Health>(target).unwrap();
    assert_eq!(health.current, 100, "wall must absorb the projectile");
}

/// Исчерпание дальности: снаряд с range R и speed S живёт ровно R/S секунд
#[test]
fn test_projectile_range_exhaustion_is_exact() {
    let mut app = create_arena_app(42);

    // speed 120 px/s, range 50 px → 25 тиков при 60Hz
    app.world_mut().spawn((
        Transform::from_translation(Vec3::new(640.0, 640.0, 0.0)),
        Projectile {
            shooter: Entity::PLACEHOLDER,
            direction: Vec2::X,
            speed: 120.0,
            damage: 10,
            remaining_range: 50.0,
        },
    ));

    let mut removed_at = None;
    for tick in 1..=100 {
        app.update();
        if projectile_count(&mut app) == 0 {
            removed_at = Some(tick);
            break;
        }
    }

    assert_eq!(removed_at, Some(25), "projectile must die exactly at R/S seconds");
}

/// Снаряд не задевает своего владельца даже в упор
#[test]
fn test_projectile_never_hits_its_owner() {
    let mut app = create_arena_app(42);

    let shooter = app
        .world_mut()
        .spawn((
            Transform::from_translation(Vec3::new(640.0, 640.0, 0.0)),
            Unit {
                faction_id: 0,
                damage: 0,
            },
            Health::new(100),
        ))
        .id();

    // Снаряд стартует в центре тела владельца
    app.world_mut().spawn((
        Transform::from_translation(Vec3::new(640.0, 640.0, 0.0)),
        Projectile {
            shooter,
            direction: Vec2::X,
            speed: 200.0,
            damage: 40,
            remaining_range: 100.0,
        },
    ));

    for _ in 0..60 {
        app.update();
    }

    let health = app.world().get::<Health>(shooter).unwrap();
    assert_eq!(health.current, 100, "self-hit must be excluded");
    assert_eq!(projectile_count(&mut app), 0); // умер по дальности
}

/// Тик снарядов с dt == 0 — полный no-op (позиции и live set нетронуты)
#[test]
fn test_projectile_update_with_zero_dt_is_noop() {
    // Голый App без time-плагинов: Time<Fixed>.delta остаётся нулевым
    let mut app = App::new();
    app.insert_resource(Time::<Fixed>::from_hz(60.0));
    app.insert_resource(BlockingMap::new(10, 10, 32.0));
    app.add_event::<HitLanded>();
    app.add_event::<ProjectileBlocked>();
    app.add_systems(Update, projectiles::advance_and_resolve);

    let start = Vec3::new(100.0, 100.0, 0.0);
    let projectile = app
        .world_mut()
        .spawn((
            Transform::from_translation(start),
            Projectile {
                shooter: Entity::PLACEHOLDER,
                direction: Vec2::X,
                speed: 400.0,
                damage: 40,
                remaining_range: 200.0,
            },
        ))
        .id();

    for _ in 0..5 {
        app.update();
    }

    assert_eq!(projectile_count(&mut app), 1);
    let transform = app.world().get::<Transform>(projectile).unwrap();
    assert_eq!(transform.translation, start);
    let state = app.world().get::<Projectile>(projectile).unwrap();
    assert_eq!(state.remaining_range, 200.0);
}

/// AvoidCollision/снаряды до инъекции геометрии — ошибка программиста
#[test]
#[should_panic]
fn test_missing_blocking_map_fails_fast() {
    let mut app = create_headless_app(42);
    app.add_plugins(SimulationPlugin::default());
    // BlockingMap намеренно не вставлена
    app.update();
    app.update();
}

/// Health-инвариант на длинном прогоне боя
#[test]
fn test_health_invariants_soak() {
    let mut app = create_arena_app(123);

    let dog = units::spawn_hostile(
        &mut app.world_mut().commands(),
        Vec2::new(600.0, 300.0),
        0.0,
        1,
        &units::HostileConfig {
            aggro_radius: 600.0,
            ..Default::default()
        },
    )
    .unwrap();
    let penguin = units::spawn_player(
        &mut app.world_mut().commands(),
        Vec2::new(200.0, 300.0),
        0.0,
        0,
        &units::PlayerConfig::default(),
        test_gun(),
    )
    .unwrap();
    app.update();

    // Игрок отстреливается от приближающегося врага
    if let Some(mut target) = app.world_mut().get_mut::<CombatTarget>(penguin) {
        target.0 = Some(dog);
    }

    for tick in 0..500 {
        app.update();

        let mut query = app.world_mut().query::<(Entity, &Health)>();
        for (entity, health) in query.iter(app.world()) {
            assert!(
                health.current <= health.max,
                "tick {}: {:?} health invariant broken ({}/{})",
                tick,
                entity,
                health.current,
                health.max
            );
        }
    }
}
