//! Fleet movement and grouping scenarios

use armada_ai::core::config::FleetConfig;
use armada_ai::core::types::{FactionId, MissionId, Point, UnitId};
use armada_ai::fleet::{FleetEvent, FleetOwner, FleetState, UnitManager};
use armada_ai::geometry::power_balance;
use armada_ai::mission::{MissionPlan, MissionStep};
use armada_ai::sandbox::{CommandBuffer, SandboxWorld};
use armada_ai::schedule::{ScheduledTask, Scheduler};
use armada_ai::world::{MoveOutcome, TickContext, UnitKind};

const US: FactionId = FactionId(1);

fn world_with_ships(count: usize) -> (SandboxWorld, Vec<UnitId>) {
    let mut world = SandboxWorld::new(100.0, 100.0);
    world.add_faction(US, false, Point::new(5.0, 5.0));
    let ships = (0..count)
        .map(|i| world.spawn_unit(US, UnitKind::Frigate, Point::new(10.0 + i as f64, 10.0), 100.0))
        .collect();
    (world, ships)
}

#[test]
fn test_half_ratio_arrives_with_one_ship_blocked() {
    let (world, ships) = world_with_ships(2);
    let config = FleetConfig::default();
    let mut units = UnitManager::new(US);
    let mut scheduler = Scheduler::new();
    let mut buffer = CommandBuffer::new(&world);
    let mut ctx = TickContext::new(0, &world, &mut buffer);

    let id = units.create_fleet(&ships, FleetOwner::Patrol);
    units
        .fleet_mut(id)
        .unwrap()
        .move_to(Point::new(50.0, 50.0).into(), 0.5, &config, &mut ctx, &mut scheduler)
        .unwrap();

    // The stuck ship alone meets the ratio
    let event = units.on_move_finished(ships[1], MoveOutcome::Blocked, &config, &mut ctx, &mut scheduler);
    assert_eq!(
        event,
        Some(FleetEvent::Arrived {
            fleet: id,
            owner: FleetOwner::Patrol
        })
    );
    assert_eq!(units.fleet(id).unwrap().state(), FleetState::Idle);

    // The late arrival is not reported again
    let late = units.on_move_finished(ships[0], MoveOutcome::Reached, &config, &mut ctx, &mut scheduler);
    assert_eq!(late, None);
}

#[test]
fn test_stuck_ships_meeting_ratio_arrive_on_next_drain() {
    let (mut world, ships) = world_with_ships(3);
    world.set_immobile(ships[0], true);
    let config = FleetConfig::default();
    let mut units = UnitManager::new(US);
    let mut scheduler = Scheduler::new();
    let mut buffer = CommandBuffer::new(&world);
    let mut ctx = TickContext::new(3, &world, &mut buffer);

    let id = units.create_fleet(&ships, FleetOwner::Mission(MissionId(1)));
    units
        .fleet_mut(id)
        .unwrap()
        .move_to(Point::new(50.0, 50.0).into(), 0.3, &config, &mut ctx, &mut scheduler)
        .unwrap();
    assert_eq!(units.fleet(id).unwrap().state(), FleetState::Idle);

    let due = scheduler.take_due(3);
    assert_eq!(due, vec![ScheduledTask::ReportArrival(id)]);
    let events: Vec<_> = due
        .into_iter()
        .filter_map(|task| units.run_task(task, &config, &mut ctx, &mut scheduler))
        .collect();
    assert_eq!(
        events,
        vec![FleetEvent::Arrived {
            fleet: id,
            owner: FleetOwner::Mission(MissionId(1))
        }]
    );
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn test_full_ratio_arrives_once_after_all_ships() {
    let (world, ships) = world_with_ships(3);
    let config = FleetConfig::default();
    let mut units = UnitManager::new(US);
    let mut scheduler = Scheduler::new();
    let mut buffer = CommandBuffer::new(&world);
    let mut ctx = TickContext::new(0, &world, &mut buffer);

    let id = units.create_fleet(&ships, FleetOwner::Mission(MissionId(4)));
    units
        .fleet_mut(id)
        .unwrap()
        .move_to(Point::new(60.0, 60.0).into(), 1.0, &config, &mut ctx, &mut scheduler)
        .unwrap();

    let mut arrivals = 0;
    for (i, ship) in ships.iter().enumerate() {
        let outcome = if i == 1 { MoveOutcome::Blocked } else { MoveOutcome::Reached };
        if units
            .on_move_finished(*ship, outcome, &config, &mut ctx, &mut scheduler)
            .is_some()
        {
            arrivals += 1;
            assert_eq!(i, ships.len() - 1, "arrived before every ship reported");
        }
    }
    assert_eq!(arrivals, 1);
}

#[test]
fn test_last_member_lost_destroys_fleet_once() {
    let (_world, ships) = world_with_ships(2);
    let mut units = UnitManager::new(US);
    let mut scheduler = Scheduler::new();
    let id = units.create_fleet(&ships, FleetOwner::Patrol);

    assert_eq!(units.on_unit_removed(ships[0], &mut scheduler), None);
    assert_eq!(units.fleet(id).map(|f| f.size()), Some(1));
    assert_eq!(
        units.on_unit_removed(ships[1], &mut scheduler),
        Some(FleetEvent::Destroyed {
            fleet: id,
            owner: FleetOwner::Patrol
        })
    );
    assert!(units.fleet(id).is_none());
    assert_eq!(units.on_unit_removed(ships[1], &mut scheduler), None);
}

#[test]
fn test_power_balance_scenario() {
    assert!((power_balance(&[100.0], &[50.0, 50.0]) - 0.5).abs() < 1e-12);
}

#[test]
fn test_mission_plan_lists_its_ships() {
    let (_world, ships) = world_with_ships(2);
    let plan = MissionPlan::PirateRoutine { ships: ships.clone() };
    assert_eq!(plan.ships(), ships.as_slice());
    assert!(!MissionStep::Continue.is_finished());
    assert!(MissionStep::Failure("x".into()).is_finished());
}
