//! Small deterministic world for driving the AI outside a full game
//!
//! Ships sail in straight lines, obstacles make destinations unreachable,
//! attacks deal fixed damage in range. Commands are buffered while the
//! factions think and applied afterwards, the way a real game queues them.

use std::collections::BTreeMap;

use rand::{Rng, RngCore};

use crate::core::error::MoveError;
use crate::core::types::{FactionId, Point, Tick, UnitId};
use crate::faction::FactionAi;
use crate::geometry::Shape;
use crate::world::{
    CommandSink, FactionStats, IslandId, MoveOutcome, Relation, TickContext, UnitInfo, UnitKind,
    WorldEvent, WorldView,
};

const ARRIVAL_TOLERANCE: f64 = 0.01;

/// An order as issued by a faction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Move { unit: UnitId, target: Shape },
    Stop { unit: UnitId },
    Attack { unit: UnitId, target: UnitId },
    SetRelation { a: FactionId, b: FactionId, relation: Relation },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Order {
    Sail(Point),
    Attack(UnitId),
}

#[derive(Debug, Clone)]
struct SandboxUnit {
    info: UnitInfo,
    speed: f64,
    order: Option<Order>,
    immobile: bool,
}

#[derive(Debug, Clone, Default)]
struct SandboxFaction {
    pirate: bool,
    home: Option<Point>,
    settlements: Vec<Point>,
    islands: Vec<IslandId>,
    stats: FactionStats,
}

#[derive(Debug, Clone)]
pub struct SandboxWorld {
    pub tick: Tick,
    width: f64,
    height: f64,
    units: BTreeMap<UnitId, SandboxUnit>,
    next_unit: u32,
    factions: BTreeMap<FactionId, SandboxFaction>,
    relations: BTreeMap<(FactionId, FactionId), Relation>,
    obstacles: Vec<Shape>,
    pub ship_speed: f64,
    pub attack_range: f64,
    pub attack_damage: f64,
    events: Vec<(FactionId, WorldEvent)>,
}

impl SandboxWorld {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            tick: 0,
            width,
            height,
            units: BTreeMap::new(),
            next_unit: 1,
            factions: BTreeMap::new(),
            relations: BTreeMap::new(),
            obstacles: Vec::new(),
            ship_speed: 1.0,
            attack_range: 3.0,
            attack_damage: 5.0,
            events: Vec::new(),
        }
    }

    pub fn add_faction(&mut self, id: FactionId, pirate: bool, home: Point) {
        self.factions.insert(
            id,
            SandboxFaction {
                pirate,
                home: Some(home),
                settlements: if pirate { Vec::new() } else { vec![home] },
                ..Default::default()
            },
        );
    }

    pub fn add_settlement(&mut self, faction: FactionId, position: Point) {
        if let Some(f) = self.factions.get_mut(&faction) {
            f.settlements.push(position);
        }
    }

    pub fn set_islands(&mut self, faction: FactionId, islands: Vec<IslandId>) {
        if let Some(f) = self.factions.get_mut(&faction) {
            f.islands = islands;
        }
    }

    pub fn set_stats(&mut self, faction: FactionId, stats: FactionStats) {
        if let Some(f) = self.factions.get_mut(&faction) {
            f.stats = stats;
        }
    }

    pub fn set_relation(&mut self, a: FactionId, b: FactionId, relation: Relation) {
        self.relations.insert(Self::relation_key(a, b), relation);
    }

    pub fn add_obstacle(&mut self, shape: Shape) {
        self.obstacles.push(shape);
    }

    pub fn spawn_unit(
        &mut self,
        owner: FactionId,
        kind: UnitKind,
        position: Point,
        health: f64,
    ) -> UnitId {
        let id = UnitId(self.next_unit);
        self.next_unit += 1;
        self.units.insert(
            id,
            SandboxUnit {
                info: UnitInfo {
                    id,
                    owner,
                    kind,
                    position,
                    health,
                    selectable: true,
                },
                speed: self.ship_speed,
                order: None,
                immobile: false,
            },
        );
        id
    }

    /// Remove a unit and notify its owner
    pub fn despawn_unit(&mut self, unit: UnitId) {
        if let Some(removed) = self.units.remove(&unit) {
            self.events
                .push((removed.info.owner, WorldEvent::UnitRemoved { unit }));
        }
    }

    /// Immobile units refuse every move order
    pub fn set_immobile(&mut self, unit: UnitId, immobile: bool) {
        if let Some(u) = self.units.get_mut(&unit) {
            u.immobile = immobile;
        }
    }

    /// Stop a sailing unit and report it as blocked
    pub fn block_unit(&mut self, unit: UnitId) {
        if let Some(u) = self.units.get_mut(&unit) {
            if matches!(u.order, Some(Order::Sail(_))) {
                u.order = None;
                self.events.push((
                    u.info.owner,
                    WorldEvent::MoveFinished {
                        unit,
                        outcome: MoveOutcome::Blocked,
                    },
                ));
            }
        }
    }

    pub fn set_position(&mut self, unit: UnitId, position: Point) {
        if let Some(u) = self.units.get_mut(&unit) {
            u.info.position = position;
        }
    }

    pub fn is_sailing(&self, unit: UnitId) -> bool {
        self.units
            .get(&unit)
            .is_some_and(|u| matches!(u.order, Some(Order::Sail(_))))
    }

    pub fn attack_target(&self, unit: UnitId) -> Option<UnitId> {
        match self.units.get(&unit)?.order {
            Some(Order::Attack(target)) => Some(target),
            _ => None,
        }
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Take the pending notifications for one faction
    pub fn drain_events(&mut self, faction: FactionId) -> Vec<WorldEvent> {
        let (mine, rest): (Vec<_>, Vec<_>) =
            self.events.drain(..).partition(|(owner, _)| *owner == faction);
        self.events = rest;
        mine.into_iter().map(|(_, event)| event).collect()
    }

    fn relation_key(a: FactionId, b: FactionId) -> (FactionId, FactionId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn reachable(&self, p: &Point) -> bool {
        p.x >= 0.0
            && p.y >= 0.0
            && p.x <= self.width
            && p.y <= self.height
            && !self.obstacles.iter().any(|o| o.contains(p))
    }

    /// Where inside `target` a given unit actually heads
    fn destination_for(unit: UnitId, target: &Shape) -> Point {
        match *target {
            Shape::Circle { center, radius } => {
                let angle = unit.0 as f64 * 2.399_963;
                center + Point::new(angle.cos(), angle.sin()) * (radius * 0.5)
            }
            other => other.center(),
        }
    }

    pub fn apply(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Move { unit, target } => {
                    if let Some(u) = self.units.get_mut(&unit) {
                        u.order = Some(Order::Sail(Self::destination_for(unit, &target)));
                    }
                }
                Command::Stop { unit } => {
                    if let Some(u) = self.units.get_mut(&unit) {
                        u.order = None;
                    }
                }
                Command::Attack { unit, target } => {
                    if let Some(u) = self.units.get_mut(&unit) {
                        u.order = Some(Order::Attack(target));
                    }
                }
                Command::SetRelation { a, b, relation } => self.set_relation(a, b, relation),
            }
        }
    }

    /// Advance movement and combat by one tick
    pub fn step(&mut self) {
        self.tick += 1;

        let ids: Vec<UnitId> = self.units.keys().copied().collect();
        let mut damage: BTreeMap<UnitId, f64> = BTreeMap::new();

        for id in ids {
            let Some(order) = self.units.get(&id).and_then(|u| u.order) else {
                continue;
            };
            match order {
                Order::Sail(destination) => {
                    let Some(unit) = self.units.get_mut(&id) else {
                        continue;
                    };
                    unit.info.position = unit.info.position.step_towards(&destination, unit.speed);
                    if unit.info.position.distance(&destination) <= ARRIVAL_TOLERANCE {
                        unit.order = None;
                        self.events.push((
                            unit.info.owner,
                            WorldEvent::MoveFinished {
                                unit: id,
                                outcome: MoveOutcome::Reached,
                            },
                        ));
                    }
                }
                Order::Attack(target) => {
                    let Some(target_pos) = self.units.get(&target).map(|t| t.info.position) else {
                        if let Some(unit) = self.units.get_mut(&id) {
                            unit.order = None;
                        }
                        continue;
                    };
                    let range = self.attack_range;
                    let dmg = self.attack_damage;
                    let Some(unit) = self.units.get_mut(&id) else {
                        continue;
                    };
                    if unit.info.position.distance(&target_pos) <= range {
                        *damage.entry(target).or_default() += dmg;
                    } else {
                        unit.info.position = unit.info.position.step_towards(&target_pos, unit.speed);
                    }
                }
            }
        }

        for (target, dmg) in damage {
            let dead = match self.units.get_mut(&target) {
                Some(t) => {
                    t.info.health -= dmg;
                    t.info.health <= 0.0
                }
                None => false,
            };
            if dead {
                self.despawn_unit(target);
            }
        }
    }
}

impl WorldView for SandboxWorld {
    fn unit(&self, id: UnitId) -> Option<UnitInfo> {
        self.units.get(&id).map(|u| u.info)
    }

    fn units_of(&self, faction: FactionId) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|u| u.info.owner == faction)
            .map(|u| u.info.id)
            .collect()
    }

    fn units_near(&self, position: Point, radius: f64) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|u| u.info.position.distance(&position) <= radius)
            .map(|u| u.info.id)
            .collect()
    }

    fn factions(&self) -> Vec<FactionId> {
        self.factions.keys().copied().collect()
    }

    fn relation(&self, a: FactionId, b: FactionId) -> Relation {
        if a == b {
            return Relation::Allied;
        }
        if self.is_pirate_faction(a) || self.is_pirate_faction(b) {
            return Relation::Enemy;
        }
        self.relations
            .get(&Self::relation_key(a, b))
            .copied()
            .unwrap_or(Relation::Neutral)
    }

    fn is_pirate_faction(&self, faction: FactionId) -> bool {
        self.factions.get(&faction).is_some_and(|f| f.pirate)
    }

    fn faction_islands(&self, faction: FactionId) -> Vec<IslandId> {
        self.factions
            .get(&faction)
            .map(|f| f.islands.clone())
            .unwrap_or_default()
    }

    fn faction_home(&self, faction: FactionId) -> Option<Point> {
        self.factions.get(&faction).and_then(|f| f.home)
    }

    fn settlement_positions(&self, faction: FactionId) -> Vec<Point> {
        self.factions
            .get(&faction)
            .map(|f| f.settlements.clone())
            .unwrap_or_default()
    }

    fn faction_stats(&self, faction: FactionId) -> FactionStats {
        self.factions
            .get(&faction)
            .map(|f| f.stats)
            .unwrap_or_default()
    }

    fn random_reachable_position(&self, rng: &mut dyn RngCore) -> Option<Point> {
        (0..20)
            .map(|_| Point::new(rng.gen_range(0.0..self.width), rng.gen_range(0.0..self.height)))
            .find(|p| self.reachable(p))
    }
}

/// Records orders against a read-only world
pub struct CommandBuffer<'a> {
    world: &'a SandboxWorld,
    commands: Vec<Command>,
}

impl<'a> CommandBuffer<'a> {
    pub fn new(world: &'a SandboxWorld) -> Self {
        Self {
            world,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}

impl CommandSink for CommandBuffer<'_> {
    fn move_unit(&mut self, unit: UnitId, target: Shape) -> Result<(), MoveError> {
        let Some(u) = self.world.units.get(&unit) else {
            return Err(MoveError::UnknownUnit(unit));
        };
        let destination = SandboxWorld::destination_for(unit, &target);
        if u.immobile || !self.world.reachable(&destination) {
            return Err(MoveError::NoPath(unit));
        }
        self.commands.push(Command::Move { unit, target });
        Ok(())
    }

    fn stop_unit(&mut self, unit: UnitId) {
        self.commands.push(Command::Stop { unit });
    }

    fn attack(&mut self, unit: UnitId, target: UnitId) {
        self.commands.push(Command::Attack { unit, target });
    }

    fn set_relation(&mut self, a: FactionId, b: FactionId, relation: Relation) {
        self.commands.push(Command::SetRelation { a, b, relation });
    }
}

/// One full simulation round: events, faction ticks in order, then world step
pub fn run_tick(world: &mut SandboxWorld, factions: &mut [FactionAi]) {
    let now = world.tick;
    let mut queued = Vec::new();

    for ai in factions.iter_mut() {
        let events = world.drain_events(ai.faction());
        let mut buffer = CommandBuffer::new(&*world);
        {
            let mut ctx = TickContext::new(now, &*world, &mut buffer);
            for event in events {
                ai.handle_event(event, &mut ctx);
            }
            ai.tick(&mut ctx);
        }
        queued.extend(buffer.into_commands());
    }

    world.apply(queued);
    world.step();
}
