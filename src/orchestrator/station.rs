//! The clock session: one owner for the controller, time source and sync
//! scheduler, shared by the console and the automatic loop.

use crate::command::{self, Command};
use crate::engine::driver::{StatusIndicator, StepDriver};
use crate::engine::sync::SyncScheduler;
use crate::engine::time_source::TimeSource;
use crate::engine::timing::Sleeper;
use crate::engine::ClockController;
use crate::model::TIMEZONE_EXAMPLES;
use crate::position::MINUTES_PER_DIAL;
use crate::status::{build_status, StatusView};
use crate::storage::PositionStore;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Interactive,
    Automatic,
}

/// What the console loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Continue,
    Run,
    Quit,
}

/// Lines to print plus the follow-up action.
#[derive(Debug)]
pub(crate) struct Reply {
    pub lines: Vec<String>,
    pub action: Action,
}

impl Reply {
    fn lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            action: Action::Continue,
        }
    }
}

pub(crate) struct Station<D, S, T, I, Z> {
    pub(super) controller: ClockController<D, S>,
    pub(super) time: T,
    pub(super) sync: SyncScheduler<I>,
    pub(super) sleeper: Z,
    /// Raised by the operator's stop signal; checked between ticks.
    pub(super) stop: Arc<AtomicBool>,
    pub(super) mode: Mode,
}

impl<D, S, T, I, Z> Station<D, S, T, I, Z>
where
    D: StepDriver,
    S: PositionStore,
    T: TimeSource,
    I: StatusIndicator,
    Z: Sleeper,
{
    pub fn new(
        controller: ClockController<D, S>,
        time: T,
        sync: SyncScheduler<I>,
        sleeper: Z,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            controller,
            time,
            sync,
            sleeper,
            stop,
            mode: Mode::Interactive,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn controller(&self) -> &ClockController<D, S> {
        &self.controller
    }

    pub fn status_lines(&self) -> Vec<String> {
        build_status(&StatusView {
            displayed: self.controller.displayed(),
            now: self.time.now(),
            timezone_url: self.controller.timezone_url(),
            timezone_unsaved: self.controller.has_unsaved_timezone(),
            sync: self.sync.status(),
        })
    }

    /// Parse and execute one console line.
    pub async fn handle_line(&mut self, line: &str) -> Reply {
        if line.trim().is_empty() {
            return Reply::lines(Vec::new());
        }
        match command::parse(line) {
            Ok(cmd) => self.execute(cmd).await,
            Err(e) => Reply::lines(vec![
                format!("Error: {e}"),
                "Type 'help' for available commands.".to_string(),
            ]),
        }
    }

    pub async fn execute(&mut self, cmd: Command) -> Reply {
        tracing::debug!(?cmd, mode = ?self.mode(), "console command");
        match cmd {
            Command::Status => Reply::lines(self.status_lines()),
            Command::Help => Reply::lines(help_lines()),
            Command::ListTimezones => Reply::lines(timezone_lines()),
            Command::SetTime(pos) => {
                self.controller.set_displayed(pos);
                let mut lines = vec![format!("Display time set to {pos}")];
                lines.extend(self.status_lines());
                Reply::lines(lines)
            }
            Command::Advance(n) => {
                let mut lines = vec![format!("Advancing clock by {n} minute(s)...")];
                match self.controller.advance_physical(n).await {
                    Ok(_) => lines.push("Done!".to_string()),
                    Err(e) => lines.push(format!(
                        "Stopped: {e}. Hands are at {}.",
                        self.controller.displayed()
                    )),
                }
                lines.extend(self.status_lines());
                Reply::lines(lines)
            }
            Command::SetBack(n) => {
                // Whole turns of the dial change nothing.
                let back = (n % MINUTES_PER_DIAL as u32) as i32;
                self.controller.adjust_memory(back);
                let mut lines = vec![format!("Display time record adjusted back by {n} minute(s)")];
                lines.extend(self.status_lines());
                Reply::lines(lines)
            }
            Command::SetTimezone(url) => {
                let lines = vec![
                    format!("Timezone URL set to: {url}"),
                    "Use 'sync' to synchronize with the new timezone, 'save' to keep it".to_string(),
                ];
                self.controller.set_timezone(url);
                Reply::lines(lines)
            }
            Command::Sync => {
                let url = self.controller.timezone_url().to_string();
                let mut lines = vec!["Synchronizing with online time service...".to_string()];
                if self.sync.refresh(&mut self.time, &url).await {
                    lines.push("Synchronization successful!".to_string());
                } else {
                    lines.push("Synchronization failed. Check connection and URL.".to_string());
                }
                lines.extend(self.status_lines());
                Reply::lines(lines)
            }
            Command::Save => {
                let line = match self.controller.save() {
                    Ok(()) => "Configuration saved successfully!".to_string(),
                    Err(e) => format!("Failed to save configuration: {e}"),
                };
                Reply::lines(vec![line])
            }
            Command::Run => Reply {
                lines: vec![
                    "Starting automatic clock mode...".to_string(),
                    "Press Ctrl+C to return to interactive mode".to_string(),
                ],
                action: Action::Run,
            },
            Command::Quit => Reply {
                lines: vec!["Exiting interactive mode...".to_string()],
                action: Action::Quit,
            },
        }
    }
}

fn help_lines() -> Vec<String> {
    [
        "Commands:",
        "  s, status     Show current clock status",
        "  t HH:MM       Set displayed time, no motion (e.g. t 14:30)",
        "  +N            Advance clock hands by N minutes (e.g. +5)",
        "  -N            Set back recorded time by N minutes, no motion",
        "  z URL         Set timezone URL (kept after 'save')",
        "  z list        Show timezone URL examples",
        "  sync          Force time synchronization",
        "  save          Save current configuration",
        "  run           Start automatic clock mode",
        "  h, help       Show this help",
        "  q, quit       Exit interactive mode",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn timezone_lines() -> Vec<String> {
    let mut lines = vec!["Available timezone examples (worldtimeapi.org):".to_string()];
    for (region, urls) in TIMEZONE_EXAMPLES {
        lines.push(format!("  {region}:"));
        lines.extend(urls.iter().map(|u| format!("    {u}")));
    }
    lines.push(String::new());
    lines.push("Full list: http://worldtimeapi.org/api/timezone".to_string());
    lines
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::ClockConfig;
    use crate::position::Position;
    use crate::testing::{
        CountingDriver, FakeTimeSource, InstantSleeper, MemoryStore, RecordingIndicator,
    };
    use time::macros::datetime;
    use time::OffsetDateTime;

    pub(crate) type TestStation =
        Station<CountingDriver, MemoryStore, FakeTimeSource, RecordingIndicator, InstantSleeper>;

    pub(crate) struct Rig {
        pub station: TestStation,
        pub driver: CountingDriver,
        pub store: MemoryStore,
        pub led: RecordingIndicator,
    }

    pub(crate) fn rig(displayed: i64, now: OffsetDateTime, sleeper: InstantSleeper, stop: Arc<AtomicBool>) -> Rig {
        let driver = CountingDriver::default();
        let store = MemoryStore::default();
        let led = RecordingIndicator::default();
        let config = ClockConfig {
            display: Position::new(displayed),
            ..ClockConfig::default()
        };
        let station = Station::new(
            ClockController::new(config, driver.clone(), store.clone()),
            FakeTimeSource::at(now),
            SyncScheduler::new(std::time::Duration::from_secs(3600), led.clone()),
            sleeper,
            stop,
        );
        Rig {
            station,
            driver,
            store,
            led,
        }
    }

    fn simple(displayed: i64) -> Rig {
        rig(
            displayed,
            datetime!(2024-01-15 14:30:00 +01:00),
            InstantSleeper::default(),
            Arc::default(),
        )
    }

    #[tokio::test]
    async fn set_time_command_overrides_without_motion() {
        let mut r = simple(0);
        let reply = r.station.handle_line("t 14:30").await;
        assert_eq!(reply.action, Action::Continue);
        assert_eq!(r.station.controller().displayed().minutes(), 150);
        assert_eq!(r.store.saved().map(|c| c.display.minutes()), Some(150));
        assert_eq!(r.driver.pulses(), 0);
    }

    #[tokio::test]
    async fn plus_command_wraps_with_physical_ticks() {
        let mut r = simple(715);
        r.station.handle_line("+5").await;
        assert_eq!(r.station.controller().displayed().minutes(), 0);
        assert_eq!(r.driver.pulses(), 5);
    }

    #[tokio::test]
    async fn minus_command_is_memory_only() {
        let mut r = simple(10);
        r.station.handle_line("-15").await;
        assert_eq!(r.station.controller().displayed().minutes(), 715);
        assert_eq!(r.store.saves(), 1);
        assert_eq!(r.driver.pulses(), 0);
    }

    #[tokio::test]
    async fn malformed_input_changes_nothing() {
        let mut r = simple(123);
        for bad in ["t 25:99", "+abc", "-", "z nowhere", "fly"] {
            let reply = r.station.handle_line(bad).await;
            assert_eq!(reply.action, Action::Continue);
            assert!(reply.lines[0].starts_with("Error:"), "{bad}");
        }
        assert_eq!(r.station.controller().displayed().minutes(), 123);
        assert_eq!(r.station.mode(), Mode::Interactive);
        assert_eq!(r.store.saves(), 0);
        assert_eq!(r.driver.pulses(), 0);
    }

    #[tokio::test]
    async fn failed_sync_keeps_status_target() {
        let mut r = simple(0);
        let before = r.station.status_lines();
        let reply = r.station.handle_line("sync").await;
        assert!(reply.lines.iter().any(|l| l.contains("Synchronization failed")));
        assert_eq!(r.led.current(), Some(false));

        let after = r.station.status_lines();
        let actual = |lines: &[String]| {
            lines
                .iter()
                .find(|l| l.contains("Actual Time"))
                .cloned()
                .unwrap()
        };
        assert_eq!(actual(&before), actual(&after));
        assert!(after.iter().any(|l| l.contains("Actual 02:30")));
    }

    #[tokio::test]
    async fn sync_uses_staged_timezone_and_save_persists_it() {
        let mut r = simple(0);
        r.station
            .handle_line("z http://worldtimeapi.org/api/timezone/Asia/Tokyo")
            .await;
        assert_eq!(r.store.saves(), 0);

        r.station.time.succeed_with(datetime!(2024-01-15 22:30:00 +09:00));
        let reply = r.station.handle_line("sync").await;
        assert!(reply.lines.iter().any(|l| l.contains("successful")));
        assert_eq!(
            r.station.time.urls(),
            ["http://worldtimeapi.org/api/timezone/Asia/Tokyo".to_string()]
        );
        assert_eq!(r.led.current(), Some(true));

        r.station.handle_line("save").await;
        assert_eq!(
            r.store.saved().unwrap().timezone_url,
            "http://worldtimeapi.org/api/timezone/Asia/Tokyo"
        );
    }

    #[tokio::test]
    async fn save_failure_is_reported() {
        let mut r = simple(0);
        r.store.fail_writes(true);
        let reply = r.station.handle_line("save").await;
        assert!(reply.lines[0].starts_with("Failed to save configuration"));
    }

    #[tokio::test]
    async fn informational_commands() {
        let mut r = simple(0);
        let help = r.station.handle_line("help").await;
        assert!(help.lines.iter().any(|l| l.contains("z list")));
        let zones = r.station.handle_line("z list").await;
        assert!(zones.lines.iter().any(|l| l.contains("Europe/Warsaw")));
        let status = r.station.handle_line("S").await;
        assert!(status.lines.iter().any(|l| l.contains("Display Time: 12:00")));
        assert!(r.station.handle_line("   ").await.lines.is_empty());
    }

    #[tokio::test]
    async fn run_and_quit_hand_control_back() {
        let mut r = simple(0);
        assert_eq!(r.station.handle_line("run").await.action, Action::Run);
        assert_eq!(r.station.handle_line("quit").await.action, Action::Quit);
        assert_eq!(r.driver.pulses(), 0);
    }
}
