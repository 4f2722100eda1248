//! CSV output of the daily snapshots.
//!
//! `global_stats` has one row per day with population counts. `house_infected` has one row
//! per household per day with the number of infectious humans present at the end of the
//! day.
use log::warn;
use serde::Serialize;

use crate::context::Context;
use crate::define_report;
use crate::error::MalariaError;
use crate::report::ContextReportExt;
use crate::statistics::DailySnapshot;
use crate::world::{ContextWorldExt, LocationKind};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GlobalStatsRow {
    pub day: u32,
    #[serde(rename = "S")]
    pub susceptible: usize,
    #[serde(rename = "I")]
    pub infectious: usize,
    #[serde(rename = "R")]
    pub recovered: usize,
    #[serde(rename = "E_mos")]
    pub exposed_mosquitoes: usize,
    #[serde(rename = "I_mos")]
    pub infectious_mosquitoes: usize,
    #[serde(rename = "totalHumans")]
    pub total_humans: usize,
    pub itn_protected: usize,
    pub treated_humans: usize,
}

define_report!(GlobalStatsRow);

impl From<&DailySnapshot> for GlobalStatsRow {
    fn from(snapshot: &DailySnapshot) -> Self {
        GlobalStatsRow {
            day: snapshot.day,
            susceptible: snapshot.susceptible,
            infectious: snapshot.infectious,
            recovered: snapshot.recovered,
            exposed_mosquitoes: snapshot.exposed_mosquitoes,
            infectious_mosquitoes: snapshot.infectious_mosquitoes,
            total_humans: snapshot.total_humans,
            itn_protected: snapshot.bed_net_humans,
            treated_humans: snapshot.treated_humans,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HouseInfectedRow {
    pub day: u32,
    #[serde(rename = "houseID")]
    pub house_id: usize,
    #[serde(rename = "infectedHumans")]
    pub infected_humans: usize,
    /// Rounded to two decimals.
    pub x: String,
    pub y: String,
    #[serde(rename = "has_ITN")]
    pub has_itn: u8,
}

define_report!(HouseInfectedRow);

/// Writes the rows of both reports. Each row is attempted even if an earlier one failed;
/// every failure is returned.
fn write_snapshot(context: &Context, snapshot: &DailySnapshot) -> Vec<MalariaError> {
    let mut failures = Vec::new();
    if let Err(e) = context.send_report(GlobalStatsRow::from(snapshot)) {
        failures.push(e);
    }

    let rows: Vec<HouseInfectedRow> = {
        let world = context.world();
        world
            .locations()
            .locations(LocationKind::Household)
            .iter()
            .zip(&snapshot.household_infections)
            .map(|(house, &infected_humans)| HouseInfectedRow {
                day: snapshot.day,
                house_id: house.id().index,
                infected_humans,
                x: format!("{:.2}", house.x()),
                y: format!("{:.2}", house.y()),
                has_itn: u8::from(house.is_protected()),
            })
            .collect()
    };
    for row in rows {
        if let Err(e) = context.send_report(row) {
            failures.push(e);
        }
    }
    failures
}

/// Creates both report files and writes them at the end of every day.
///
/// # Errors
///
/// If a report file cannot be created.
pub fn init(context: &mut Context) -> Result<(), MalariaError> {
    context.add_report::<GlobalStatsRow>("global_stats")?;
    context.add_report::<HouseInfectedRow>("house_infected")?;

    context.subscribe_to_event(|context, snapshot: DailySnapshot| {
        for e in write_snapshot(context, &snapshot) {
            warn!("could not write a report row for day {}: {e}", snapshot.day);
        }
    });
    Ok(())
}
