//! Headless демо-арена ICEBOUND
//!
//! Запускает симуляцию без рендера: враг патрулирует между двумя точками,
//! юнит игрока получает команду «идти в точку» и отстреливается, когда
//! враг входит в аггро. Сцена здесь играет роль внешних коллабораторов:
//! карта, input-команды, конфиг оружия.

use std::sync::Arc;

use bevy::prelude::*;
use icebound_simulation::{
    create_headless_app, units, BlockingMap, CombatTarget, SetDestination, SimulationPlugin,
    WeaponConfig,
};

// Конфиг оружия в формате сценовых данных (JSON)
const GUN_JSON: &str = r#"{
    "id": "7b90d51a-13e6-4d5b-b1e6-af19a6c2e8d1",
    "name": "Red Banner Grandma's Machine Gun",
    "damage": 40,
    "cost": 3000,
    "range": 400.0,
    "bullets_per_shot": 4,
    "cooldown": 0.2,
    "muzzle_offset": [55.0, 20.0],
    "spread": 0.06,
    "projectile_speed": 800.0,
    "magazine": 30
}"#;

// Снаряды на нижнем слое (z = 0); поставить 11 — будут рисоваться над колонной
const BULLETS_DEPTH: f32 = 0.0;
const UNITS_DEPTH: f32 = 5.0;

fn main() {
    let seed = 42;
    println!("Starting ICEBOUND headless arena (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin {
        projectile_depth: BULLETS_DEPTH,
    });
    app.insert_resource(build_arena());

    let gun: WeaponConfig = serde_json::from_str(GUN_JSON).expect("valid gun config");
    let gun = Arc::new(gun);

    let mut commands = app.world_mut().commands();

    let dog = units::spawn_hostile(
        &mut commands,
        Vec2::new(600.0, 300.0),
        UNITS_DEPTH,
        1, // фракция врагов
        &units::HostileConfig {
            patrol_points: vec![Vec2::new(600.0, 100.0), Vec2::new(600.0, 400.0)],
            ..default()
        },
    )
    .expect("hostile state table");

    let penguin = units::spawn_player(
        &mut commands,
        Vec2::new(100.0, 300.0),
        UNITS_DEPTH,
        0, // фракция игрока
        &units::PlayerConfig::default(),
        gun,
    )
    .expect("player state table");

    // Первый тик применяет deferred spawn'ы
    app.update();

    // Input collaborator: клик по миру + назначение цели
    app.world_mut().send_event(SetDestination {
        unit: penguin,
        position: Vec2::new(400.0, 300.0),
    });
    if let Some(mut target) = app.world_mut().get_mut::<CombatTarget>(penguin) {
        target.0 = Some(dog);
    }

    for tick in 0..1000 {
        app.update();

        if tick % 100 == 0 {
            let world = app.world();
            let entity_count = world.entities().len();
            let dog_pos = world.get::<Transform>(dog).map(|t| t.translation.truncate());
            let penguin_pos = world
                .get::<Transform>(penguin)
                .map(|t| t.translation.truncate());
            println!(
                "Tick {}: {} entities, dog at {:?}, penguin at {:?}",
                tick, entity_count, dog_pos, penguin_pos
            );
        }
    }

    println!("Simulation complete!");
}

/// Арена 25×15 тайлов по 32px (800×480): внешние стены + колонна в центре
fn build_arena() -> BlockingMap {
    BlockingMap::from_rows(
        32.0,
        &[
            "#########################",
            "#.......................#",
            "#.......................#",
            "#.......................#",
            "#.......................#",
            "#.......................#",
            "#...........##..........#",
            "#...........##..........#",
            "#...........##..........#",
            "#.......................#",
            "#.......................#",
            "#.......................#",
            "#.......................#",
            "#.......................#",
            "#########################",
        ],
    )
}
