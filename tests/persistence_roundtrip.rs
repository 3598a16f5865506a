//! Save/load round trip for a running world

use wildgrove::core::config::SimulationConfig;
use wildgrove::entity::species::{AgentKind, AnimalKind, Race};
use wildgrove::persistence::WorldSnapshot;
use wildgrove::simulation::manager::EntityManager;
use wildgrove::world::terrain::generate;

#[test]
fn test_saved_world_resumes_identically() {
    let mut map = generate(40, 40, 31, false, 0.3).unwrap();
    let mut manager = EntityManager::new(SimulationConfig::default(), 31).unwrap();
    let mut placed = 0;
    for y in (2..38).step_by(5) {
        for x in (2..38).step_by(5) {
            let kind = if (x + y) % 3 == 0 {
                AgentKind::Creature(Race::Human)
            } else {
                AgentKind::Animal(AnimalKind::Deer)
            };
            placed += manager.spawn(kind, x as f32 + 0.5, y as f32 + 0.5, &map).is_some() as usize;
        }
    }
    assert!(placed > 0);
    for _ in 0..60 {
        manager.update(0.2, &mut map);
    }

    let path = std::env::temp_dir().join(format!("wildgrove-roundtrip-{}.json", std::process::id()));
    WorldSnapshot::capture(&map, &manager).save(&path).unwrap();
    let (mut loaded_map, mut loaded) = WorldSnapshot::load(&path).unwrap().restore().unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.tick(), manager.tick());
    assert_eq!(loaded.len(), manager.len());
    assert_eq!(loaded_map.tiles(), map.tiles());

    for _ in 0..40 {
        let expected = manager.update(0.2, &mut map);
        let actual = loaded.update(0.2, &mut loaded_map);
        assert_eq!(actual, expected);
    }
    assert_eq!(loaded.snapshot(), manager.snapshot());
}

#[test]
fn test_garbage_json_is_an_error() {
    assert!(WorldSnapshot::from_json("{\"version\": 1}").is_err());
    assert!(WorldSnapshot::load(std::path::Path::new("/definitely/not/here.json")).is_err());
}
