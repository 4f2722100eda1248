//! End-of-day statistics.
//!
//! After disease progression and replenishment, a `DailySnapshot` of the world is recorded
//! in the context and emitted as an event for reporting.
use log::debug;
use serde::Serialize;

use crate::clock::ContextClockExt;
use crate::context::{Context, ExecutionPhase, SimulationEvent};
use crate::define_data_plugin;
use crate::world::{AgentId, ContextWorldExt, HumanState, LocationKind, MosquitoState, World};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DailySnapshot {
    pub day: u32,
    pub susceptible: usize,
    pub infectious: usize,
    pub recovered: usize,
    pub total_humans: usize,
    /// Live humans sleeping under a bed net.
    pub bed_net_humans: usize,
    /// Live humans under treatment.
    pub treated_humans: usize,
    pub susceptible_mosquitoes: usize,
    pub exposed_mosquitoes: usize,
    pub infectious_mosquitoes: usize,
    pub live_mosquitoes: usize,
    /// Mosquitoes revived on this day.
    pub mosquitoes_revived: usize,
    /// Occupancy insertions dropped since the start of the run.
    pub capacity_drops: usize,
    /// Infectious humans present in each household, by household index.
    pub household_infections: Vec<usize>,
}

impl SimulationEvent for DailySnapshot {}

/// Counts the world's state. `mosquitoes_revived` is supplied by the caller.
#[must_use]
pub fn take_snapshot(world: &World, day: u32, mosquitoes_revived: usize) -> DailySnapshot {
    let mut snapshot = DailySnapshot {
        day,
        susceptible: 0,
        infectious: 0,
        recovered: 0,
        total_humans: 0,
        bed_net_humans: 0,
        treated_humans: 0,
        susceptible_mosquitoes: 0,
        exposed_mosquitoes: 0,
        infectious_mosquitoes: 0,
        live_mosquitoes: 0,
        mosquitoes_revived,
        capacity_drops: world.locations().capacity_drops(),
        household_infections: Vec::new(),
    };

    for human in world.live_humans() {
        snapshot.total_humans += 1;
        match human.state {
            HumanState::Susceptible => snapshot.susceptible += 1,
            HumanState::Infectious => snapshot.infectious += 1,
            HumanState::Recovered => snapshot.recovered += 1,
        }
        if human.has_bed_net() {
            snapshot.bed_net_humans += 1;
        }
        if human.under_treatment {
            snapshot.treated_humans += 1;
        }
    }

    for mosquito in world.live_mosquitoes() {
        snapshot.live_mosquitoes += 1;
        match mosquito.state {
            MosquitoState::Susceptible => snapshot.susceptible_mosquitoes += 1,
            MosquitoState::Exposed => snapshot.exposed_mosquitoes += 1,
            MosquitoState::Infectious => snapshot.infectious_mosquitoes += 1,
        }
    }

    snapshot.household_infections = world
        .locations()
        .locations(LocationKind::Household)
        .iter()
        .map(|household| {
            household
                .occupants()
                .iter()
                .filter(|agent| match agent {
                    AgentId::Human(id) => world.human(*id).state == HumanState::Infectious,
                    AgentId::Mosquito(_) => false,
                })
                .count()
        })
        .collect();
    snapshot
}

#[derive(Default)]
struct StatisticsData {
    snapshots: Vec<DailySnapshot>,
    revivals_seen: usize,
}

define_data_plugin!(StatisticsPlugin, StatisticsData, StatisticsData::default());

pub trait ContextStatisticsExt {
    /// Every snapshot taken so far, one per completed day.
    fn get_daily_snapshots(&self) -> &[DailySnapshot];

    /// Takes a snapshot of the current day, records it and emits it as an event.
    fn record_daily_snapshot(&mut self);
}

impl ContextStatisticsExt for Context {
    fn get_daily_snapshots(&self) -> &[DailySnapshot] {
        self.try_get_data(StatisticsPlugin)
            .map(|data| data.snapshots.as_slice())
            .unwrap_or_default()
    }

    fn record_daily_snapshot(&mut self) {
        let day = self.current_day();
        let revivals_seen = self.get_data_mut(StatisticsPlugin).revivals_seen;
        let (snapshot, revivals) = {
            let world = self.world();
            let revivals = world.revivals();
            (
                take_snapshot(&world, day, revivals - revivals_seen),
                revivals,
            )
        };
        debug!(
            "day {day}: S={} I={} R={} E_mos={} I_mos={} humans={} mosquitoes={}",
            snapshot.susceptible,
            snapshot.infectious,
            snapshot.recovered,
            snapshot.exposed_mosquitoes,
            snapshot.infectious_mosquitoes,
            snapshot.total_humans,
            snapshot.live_mosquitoes
        );
        let data = self.get_data_mut(StatisticsPlugin);
        data.revivals_seen = revivals;
        data.snapshots.push(snapshot.clone());
        self.emit_event(snapshot);
    }
}

/// Registers the daily snapshot. Runs after replenishment.
pub fn init(context: &mut Context) {
    context.add_daily_plan(ExecutionPhase::Last, Context::record_daily_snapshot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{LocationId, MosquitoId};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn populated_world() -> World {
        let mut world = World::new(100);
        let open = world.add_location(LocationKind::Household, 0.0, 0.0, false);
        let netted = world.add_location(LocationKind::Household, 1.0, 1.0, true);
        let work = world.add_location(LocationKind::Workplace, 2.0, 2.0, false);
        let site = world.add_location(LocationKind::BreedingSite, 3.0, 3.0, false);

        let a = world.add_human(20, open, work).unwrap();
        let b = world.add_human(20, open, work).unwrap();
        let c = world.add_human(20, netted, work).unwrap();
        let d = world.add_human(20, netted, work).unwrap();
        let e = world.add_human(20, netted, work).unwrap();
        world.human_mut(a).infect(0);
        world.human_mut(c).infect(0);
        world.human_mut(c).start_treatment(0);
        world.human_mut(d).state = HumanState::Recovered;
        world.kill_human(e).unwrap();
        world.move_human(b, work).unwrap();

        for _ in 0..4 {
            world.add_mosquito(5, site).unwrap();
        }
        world.mosquito_mut(MosquitoId(1)).expose(0);
        world.mosquito_mut(MosquitoId(2)).state = MosquitoState::Infectious;
        world.kill_mosquito(MosquitoId(3)).unwrap();
        world
            .move_mosquito(MosquitoId(2), LocationId::new(LocationKind::Household, 0))
            .unwrap();
        world
    }

    #[test]
    fn counts_partition_live_agents() {
        let world = populated_world();
        let snapshot = take_snapshot(&world, 4, 0);
        assert_eq!(snapshot.day, 4);
        assert_eq!(
            (snapshot.susceptible, snapshot.infectious, snapshot.recovered),
            (1, 2, 1)
        );
        assert_eq!(snapshot.total_humans, 4);
        assert_eq!(snapshot.bed_net_humans, 2);
        assert_eq!(snapshot.treated_humans, 1);
        assert_eq!(
            (
                snapshot.susceptible_mosquitoes,
                snapshot.exposed_mosquitoes,
                snapshot.infectious_mosquitoes
            ),
            (1, 1, 1)
        );
        assert_eq!(snapshot.live_mosquitoes, 3);
        assert_eq!(snapshot.capacity_drops, 0);
    }

    #[test]
    fn household_infections_count_present_infectious_humans() {
        let world = populated_world();
        let snapshot = take_snapshot(&world, 0, 0);
        // Household 0 holds the infectious human and a mosquito; household 1 holds one
        // infectious and one recovered human.
        assert_eq!(snapshot.household_infections, vec![1, 1]);
    }

    #[test]
    fn daily_snapshots_are_recorded_and_emitted() {
        let mut context = Context::new();
        context.set_world(populated_world());
        context.add_plan(2.0, Context::shutdown);
        init(&mut context);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        context.subscribe_to_event(move |_context, snapshot: DailySnapshot| {
            seen_clone.borrow_mut().push(snapshot.day);
        });
        context.execute();

        let days: Vec<u32> = context.get_daily_snapshots().iter().map(|s| s.day).collect();
        assert_eq!(days, vec![0, 1]);
        assert_eq!(*seen.borrow(), vec![0, 1]);
    }

    #[test]
    fn revivals_are_reported_per_day() {
        let mut context = Context::new();
        let mut world = populated_world();
        let site = LocationId::new(LocationKind::BreedingSite, 0);
        world.revive_mosquito(MosquitoId(3), 1, site).unwrap();
        context.set_world(world);
        context.record_daily_snapshot();
        context.world_mut().kill_mosquito(MosquitoId(3)).unwrap();
        context.record_daily_snapshot();
        let revived: Vec<usize> = context
            .get_daily_snapshots()
            .iter()
            .map(|s| s.mosquitoes_revived)
            .collect();
        assert_eq!(revived, vec![1, 0]);
    }

    #[test]
    fn no_snapshots_before_first_day() {
        let context = Context::new();
        assert!(context.get_daily_snapshots().is_empty());
    }
}
