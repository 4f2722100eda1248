//! Wall time, CPU time and peak memory of a simulation run.
// Loss of precision is acceptable for per-agent averages.
#![allow(clippy::cast_precision_loss)]

use std::time::{Duration, Instant};

use bytesize::ByteSize;
use humantime::format_duration;
use log::{debug, error, info, warn};
use serde::Serialize;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Minimum time between two memory polls.
const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Final statistics of a run. Per-agent figures are zero when there are no agents.
#[derive(Debug, Serialize)]
pub struct ExecutionStatistics {
    pub max_memory_usage: u64,
    pub cpu_time: Duration,
    pub wall_time: Duration,

    /// Humans plus mosquito slots.
    pub agents: usize,
    pub simulated_days: u32,
    pub cpu_time_per_agent: Duration,
    pub wall_time_per_agent: Duration,
    pub memory_per_agent: u64,

    /// Occupancy insertions dropped at full locations. Filled in by the caller.
    pub capacity_drops: usize,
}

pub struct ExecutionProfilingCollector {
    start_time: Instant,
    last_refresh: Instant,
    /// Accumulated CPU milliseconds of the process when collection started.
    start_cpu_time: u64,
    max_memory_usage: u64,
    system: System,
    /// `None` where the platform cannot report on the current process.
    process_id: Option<Pid>,
}

impl ExecutionProfilingCollector {
    #[must_use]
    pub fn new() -> ExecutionProfilingCollector {
        let process_id = sysinfo::get_current_pid().ok();
        let now = Instant::now();
        let mut collector = ExecutionProfilingCollector {
            start_time: now,
            last_refresh: now,
            start_cpu_time: 0,
            max_memory_usage: 0,
            system: System::new(),
            process_id,
        };
        if let Some(process_id) = process_id {
            debug!("process id: {process_id}");
            collector.update_system_info(ProcessRefreshKind::nothing().with_cpu().with_memory());
            if let Some(process) = collector.system.process(process_id) {
                collector.max_memory_usage = process.memory();
                collector.start_cpu_time = process.accumulated_cpu_time();
            }
        }
        collector
    }

    /// Polls memory use if at least `REFRESH_INTERVAL` has passed since the last poll. Cheap
    /// to call often.
    pub fn refresh(&mut self) {
        if self.last_refresh.elapsed() >= REFRESH_INTERVAL {
            self.poll_memory();
            self.last_refresh = Instant::now();
        }
    }

    fn poll_memory(&mut self) {
        if let Some(pid) = self.process_id {
            self.update_system_info(ProcessRefreshKind::nothing().with_memory());
            if let Some(process) = self.system.process(pid) {
                self.max_memory_usage = self.max_memory_usage.max(process.memory());
            }
        }
    }

    fn update_system_info(&mut self, process_refresh_kind: ProcessRefreshKind) {
        if let Some(pid) = self.process_id {
            if self.system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                true,
                process_refresh_kind,
            ) < 1
            {
                error!("could not refresh process statistics");
            }
        }
    }

    pub fn compute_final_statistics(
        &mut self,
        agents: usize,
        simulated_days: u32,
    ) -> ExecutionStatistics {
        let mut cpu_time_millis = 0;
        if let Some(pid) = self.process_id {
            self.update_system_info(ProcessRefreshKind::nothing().with_cpu().with_memory());
            if let Some(process) = self.system.process(pid) {
                self.max_memory_usage = self.max_memory_usage.max(process.memory());
                cpu_time_millis = process
                    .accumulated_cpu_time()
                    .saturating_sub(self.start_cpu_time);
            }
        }

        let cpu_time = Duration::from_millis(cpu_time_millis);
        let wall_time = self.start_time.elapsed();
        let (cpu_time_per_agent, wall_time_per_agent, memory_per_agent) = if agents > 0 {
            (
                Duration::from_secs_f64(cpu_time.as_secs_f64() / agents as f64),
                Duration::from_secs_f64(wall_time.as_secs_f64() / agents as f64),
                self.max_memory_usage / agents as u64,
            )
        } else {
            (Duration::ZERO, Duration::ZERO, 0)
        };

        ExecutionStatistics {
            max_memory_usage: self.max_memory_usage,
            cpu_time,
            wall_time,
            agents,
            simulated_days,
            cpu_time_per_agent,
            wall_time_per_agent,
            memory_per_agent,
            capacity_drops: 0,
        }
    }
}

impl Default for ExecutionProfilingCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints the statistics to stdout.
pub fn print_execution_statistics(summary: &ExecutionStatistics) {
    println!("━━━━ Execution Summary ━━━━");
    println!("{:<25}{}", "Simulated days:", summary.simulated_days);
    if summary.capacity_drops > 0 {
        println!("{:<25}{}", "Capacity drops:", summary.capacity_drops);
    }
    if summary.max_memory_usage == 0 {
        println!("Memory and CPU statistics are not available on your platform.");
    } else {
        println!(
            "{:<25}{}",
            "Max memory usage:",
            ByteSize::b(summary.max_memory_usage)
        );
        println!("{:<25}{}", "CPU time:", format_duration(summary.cpu_time));
    }
    println!("{:<25}{}", "Wall time:", format_duration(summary.wall_time));

    if summary.agents > 0 {
        println!("{:<25}{}", "Agents:", summary.agents);
        if summary.max_memory_usage > 0 {
            println!(
                "{:<25}{}",
                "Memory per agent:",
                ByteSize::b(summary.memory_per_agent)
            );
            println!(
                "{:<25}{}",
                "CPU time per agent:",
                format_duration(summary.cpu_time_per_agent)
            );
        }
        println!(
            "{:<25}{}",
            "Wall time per agent:",
            format_duration(summary.wall_time_per_agent)
        );
    }
}

/// Logs the statistics at `info` level.
pub fn log_execution_statistics(stats: &ExecutionStatistics) {
    info!("Execution complete after {} simulated days.", stats.simulated_days);
    if stats.capacity_drops > 0 {
        warn!(
            "{} occupancy insertions were dropped at full locations",
            stats.capacity_drops
        );
    }
    if stats.max_memory_usage > 0 {
        info!("Max memory usage: {}", ByteSize::b(stats.max_memory_usage));
        info!("CPU time: {}", format_duration(stats.cpu_time));
    }
    info!("Wall time: {}", format_duration(stats.wall_time));
    if stats.agents > 0 {
        info!(
            "Wall time per agent: {}",
            format_duration(stats.wall_time_per_agent)
        );
    }
}
