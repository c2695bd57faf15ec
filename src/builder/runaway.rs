//! Per-thread CPU times from the debugger's `!runaway` text.
//!
//! # Format (version 1)
//!
//! The text is split into sections by header lines containing `User Mode Time`,
//! `Kernel Mode Time` or `Elapsed Time`. Within a section, every line of the form
//!
//! ```text
//!    <index>:<hex os id>   <days> days <h>:<mm>:<ss>.<fff>
//! ```
//!
//! assigns that duration to the thread with the given OS id, and records the
//! debugger index. Any other line is skipped silently, as are timing lines that
//! appear before the first section header. Threads that are not in the thread
//! store are ignored.

use std::time::Duration;

use regex::Regex;

use crate::{error::structural_error, model::DumpThread, Result};

/// Version of the timing text grammar understood by [`RunawayParser`]
pub const RUNAWAY_FORMAT_VERSION: u32 = 1;

const LINE_PATTERN: &str =
    r"(?<index>\d+):(?<id>[0-9a-fA-F]+)\s*(?<days>\d+) days (?<time>\d+:\d{2}:\d{2}\.\d{3})";

/// Which accumulated time a section of the text reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeSection {
    /// Time spent in user mode
    User,
    /// Time spent in kernel mode
    Kernel,
    /// Time since the thread was created
    Elapsed,
}

impl TimeSection {
    fn from_header(line: &str) -> Option<Self> {
        if line.contains("User Mode Time") {
            Some(TimeSection::User)
        } else if line.contains("Kernel Mode Time") {
            Some(TimeSection::Kernel)
        } else if line.contains("Elapsed Time") {
            Some(TimeSection::Elapsed)
        } else {
            None
        }
    }
}

/// One parsed timing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadTime {
    /// Debugger thread index
    pub index: u32,
    /// OS thread id
    pub os_id: u32,
    /// The section the line appeared in
    pub section: TimeSection,
    /// The reported duration
    pub time: Duration,
}

/// Parser for the timing text.
#[derive(Debug, Clone)]
pub struct RunawayParser {
    line: Regex,
}

impl RunawayParser {
    /// Creates a parser for [`RUNAWAY_FORMAT_VERSION`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Structural`] if the line pattern fails to compile.
    pub fn new() -> Result<Self> {
        let line = Regex::new(LINE_PATTERN)
            .map_err(|e| structural_error!("invalid thread timing pattern: {}", e))?;
        Ok(RunawayParser { line })
    }

    /// Parses all timing lines of `text`, in order.
    pub fn parse(&self, text: &str) -> Vec<ThreadTime> {
        let mut section = None;
        let mut times = Vec::new();

        for line in text.lines() {
            if let Some(header) = TimeSection::from_header(line) {
                section = Some(header);
                continue;
            }

            let Some(section) = section else {
                continue;
            };

            if let Some(time) = self.parse_line(line, section) {
                times.push(time);
            }
        }

        times
    }

    fn parse_line(&self, line: &str, section: TimeSection) -> Option<ThreadTime> {
        let captures = self.line.captures(line)?;
        let index = captures["index"].parse().ok()?;
        let os_id = u32::from_str_radix(&captures["id"], 16).ok()?;
        let days: u64 = captures["days"].parse().ok()?;
        let clock = parse_clock(&captures["time"])?;
        let time = clock.checked_add(Duration::from_secs(days.checked_mul(86_400)?))?;

        Some(ThreadTime {
            index,
            os_id,
            section,
            time,
        })
    }

    /// Applies the times in `text` to `threads`.
    ///
    /// Returns the number of timing lines that matched a thread.
    pub(crate) fn apply(&self, text: &str, threads: &mut [DumpThread]) -> usize {
        let mut applied = 0;

        for time in self.parse(text) {
            let Some(thread) = threads.iter_mut().find(|t| t.os_id == time.os_id) else {
                tracing::debug!(
                    os_id = time.os_id,
                    "thread found in timing text but not in the thread store"
                );
                continue;
            };

            thread.debugger_index = Some(time.index);
            match time.section {
                TimeSection::User => thread.user_mode_time = Some(time.time),
                TimeSection::Kernel => thread.kernel_mode_time = Some(time.time),
                TimeSection::Elapsed => thread.elapsed_time = Some(time.time),
            }
            applied += 1;
        }

        applied
    }
}

/// Parses `h:mm:ss.fff`
fn parse_clock(text: &str) -> Option<Duration> {
    let (clock, millis) = text.split_once('.')?;
    let mut parts = clock.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: u64 = parts.next()?.parse().ok()?;
    let millis: u64 = millis.parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }

    let seconds = hours
        .checked_mul(3600)?
        .checked_add(minutes * 60 + seconds)?;
    Duration::from_secs(seconds).checked_add(Duration::from_millis(millis))
}
