use crate::grid::Cell;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Planning and game events worth recording
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlanEvent {
    /// A route was computed to `target`
    Planned { from: Cell, target: Cell, length: usize },
    /// The danger zone blocked every route, so it was ignored
    FallbackIgnoredDanger { from: Cell, target: Cell },
    /// No route exists to `target` even without the danger zone
    Unreachable { from: Cell, target: Cell },
    /// A planned route was dropped before completion
    Invalidated { at: Cell, reason: String },
    PelletEaten { at: Cell, power: bool },
    Collision { at: Cell, lives_left: u32 },
}

/// Logged event with timestamp and simulation tick
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Milliseconds since start
    pub timestamp_ms: u64,
    pub tick: u64,
    pub event: PlanEvent,
}

/// Event logger
pub struct PlanLog {
    start_time: Instant,
    enabled: bool,
    events: Vec<LoggedEvent>,
}

impl Default for PlanLog {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanLog {
    pub fn new() -> Self {
        PlanLog {
            start_time: Instant::now(),
            enabled: true,
            events: Vec::new(),
        }
    }

    /// A log that drops everything
    pub fn disabled() -> Self {
        PlanLog {
            enabled: false,
            ..Self::new()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Log an event with current timestamp
    pub fn log(&mut self, tick: u64, event: PlanEvent) {
        if !self.enabled {
            return;
        }
        let timestamp_ms = self.start_time.elapsed().as_millis() as u64;
        self.events.push(LoggedEvent {
            timestamp_ms,
            tick,
            event,
        });
    }

    /// Get all logged events
    pub fn events(&self) -> &[LoggedEvent] {
        &self.events
    }

    /// Save log to JSON file
    pub fn save_to_file(&self, path: &str) -> Result<(), String> {
        let json = serde_json::to_string_pretty(&self.events)
            .map_err(|e| format!("Failed to serialize plan log: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write plan log {}: {}", path, e))?;
        Ok(())
    }

    /// Print log to console
    pub fn print(&self) {
        println!("\n=== Plan Log ({} events) ===", self.events.len());
        for (i, logged) in self.events.iter().enumerate() {
            println!("[{:6}ms] tick {:5} #{:3} {:?}", logged.timestamp_ms, logged.tick, i + 1, logged.event);
        }
        println!("=== End of Log ===\n");
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let mut planned = 0;
        let mut fallbacks = 0;
        let mut unreachable = 0;
        let mut invalidated = 0;
        let mut eaten = 0;
        let mut collisions = 0;

        for logged in &self.events {
            match &logged.event {
                PlanEvent::Planned { .. } => planned += 1,
                PlanEvent::FallbackIgnoredDanger { .. } => fallbacks += 1,
                PlanEvent::Unreachable { .. } => unreachable += 1,
                PlanEvent::Invalidated { .. } => invalidated += 1,
                PlanEvent::PelletEaten { .. } => eaten += 1,
                PlanEvent::Collision { .. } => collisions += 1,
            }
        }

        let last_tick = self.events.last().map(|e| e.tick).unwrap_or(0);

        format!(
            "Last Event Tick: {}\n\
             Plans: {} computed, {} via ignore-danger fallback, {} invalidated, {} unreachable\n\
             Game: {} pellets eaten, {} collisions",
            last_tick, planned, fallbacks, invalidated, unreachable, eaten, collisions
        )
    }
}
