//! Interactive console over line-oriented input.

use super::station::{Action, Station};
use crate::engine::driver::{StatusIndicator, StepDriver};
use crate::engine::time_source::TimeSource;
use crate::engine::timing::Sleeper;
use crate::storage::PositionStore;
use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Notify;

const PROMPT: &str = "clock> ";

/// Read commands until `quit` or end of input. A wake-up on `interrupts`
/// while waiting for input prints a hint instead of ending the session.
pub(crate) async fn run_console<D, S, T, I, Z, R, W>(
    station: &mut Station<D, S, T, I, Z>,
    input: R,
    out: &mut W,
    interrupts: &Notify,
) -> Result<()>
where
    D: StepDriver,
    S: PositionStore,
    T: TimeSource,
    I: StatusIndicator,
    Z: Sleeper,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let rule = "=".repeat(60);
    writeln!(out, "\n{rule}")?;
    writeln!(out, "  STATION CLOCK - Interactive Console")?;
    writeln!(out, "  Type 'help' for available commands")?;
    writeln!(out, "{rule}")?;
    write_lines(out, &station.status_lines())?;

    let mut lines = input.lines();
    loop {
        write!(out, "\n{PROMPT}")?;
        out.flush()?;

        let next = tokio::select! {
            biased;
            _ = interrupts.notified() => {
                writeln!(out, "\nInterrupted. Type 'quit' to exit or 'run' to start the clock.")?;
                continue;
            }
            next = lines.next_line() => next,
        };
        let Some(line) = next.context("failed to read console input")? else {
            break;
        };

        let reply = station.handle_line(&line).await;
        write_lines(out, &reply.lines)?;
        match reply.action {
            Action::Continue => {}
            Action::Run => {
                out.flush()?;
                station.run_automatic().await;
                writeln!(out, "\nClock stopped. Entering interactive mode...")?;
                write_lines(out, &station.status_lines())?;
            }
            Action::Quit => break,
        }
    }
    out.flush()?;
    Ok(())
}

fn write_lines<W: Write>(out: &mut W, lines: &[String]) -> Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::station::tests::rig;
    use crate::testing::InstantSleeper;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use time::macros::datetime;
    use tokio::io::AsyncWriteExt;

    async fn session(script: &str, displayed: i64) -> (String, crate::orchestrator::station::tests::Rig) {
        let stop = Arc::new(AtomicBool::new(false));
        let sleeper = InstantSleeper::stopping_after(1, stop.clone());
        let mut r = rig(displayed, datetime!(2024-01-15 14:30:00 +01:00), sleeper, stop);
        let mut out = Vec::new();
        run_console(&mut r.station, script.as_bytes(), &mut out, &Notify::new())
            .await
            .unwrap();
        (String::from_utf8(out).unwrap(), r)
    }

    #[tokio::test]
    async fn scripted_session_applies_commands_in_order() {
        let (out, r) = session("t 2:00\n+3\n-1\nstatus\nquit\nt 5:00\n", 0).await;
        assert!(out.contains("Interactive Console"));
        assert!(out.contains("Display time set to 02:00"));
        assert!(out.contains("Advancing clock by 3 minute(s)"));
        assert!(out.contains("Exiting interactive mode"));
        // Lines after quit are never read.
        assert_eq!(r.station.controller().displayed().minutes(), 122);
        assert_eq!(r.driver.pulses(), 3);
    }

    #[tokio::test]
    async fn run_returns_to_console_after_stop() {
        let (out, r) = session("run\ns\n", 140).await;
        assert!(out.contains("Starting automatic clock mode"));
        assert!(out.contains("Clock stopped. Entering interactive mode"));
        assert_eq!(r.station.controller().displayed().minutes(), 150);
        assert_eq!(r.driver.pulses(), 10);
    }

    #[tokio::test]
    async fn bad_input_prints_hint_and_keeps_going() {
        let (out, r) = session("+abc\nwhat\n", 7).await;
        assert!(out.contains("Error: invalid minute count 'abc'"));
        assert!(out.contains("Error: unknown command 'what'"));
        assert_eq!(out.matches("Type 'help'").count(), 3);
        assert_eq!(r.station.controller().displayed().minutes(), 7);
    }

    #[tokio::test]
    async fn interrupt_while_idle_prints_hint() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut r = rig(0, datetime!(2024-01-15 14:30:00 +01:00), InstantSleeper::default(), stop);
        let (mut operator, console_in) = tokio::io::duplex(64);
        let interrupts = Notify::new();
        let mut out = Vec::new();

        let session = run_console(
            &mut r.station,
            tokio::io::BufReader::new(console_in),
            &mut out,
            &interrupts,
        );
        let operator = async {
            tokio::task::yield_now().await;
            interrupts.notify_waiters();
            operator.write_all(b"quit\n").await.unwrap();
        };
        let (result, ()) = tokio::join!(session, operator);
        result.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Interrupted. Type 'quit' to exit or 'run' to start the clock."));
        assert!(out.contains("Exiting interactive mode"));
        assert_eq!(r.driver.pulses(), 0);
    }
}
