//! Terminal rendering of a breakdown

use std::{fmt, str::FromStr};

use crate::breakdown::Breakdown;

/// A unit of the breakdown that can be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    /// Display order
    pub const ALL: [TimeUnit; 4] = [
        TimeUnit::Days,
        TimeUnit::Hours,
        TimeUnit::Minutes,
        TimeUnit::Seconds,
    ];

    fn value(&self, breakdown: &Breakdown) -> u64 {
        match self {
            TimeUnit::Days => breakdown.days,
            TimeUnit::Hours => breakdown.hours.into(),
            TimeUnit::Minutes => breakdown.minutes.into(),
            TimeUnit::Seconds => breakdown.seconds.into(),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "D" => Ok(TimeUnit::Days),
            "H" => Ok(TimeUnit::Hours),
            "M" => Ok(TimeUnit::Minutes),
            "S" => Ok(TimeUnit::Seconds),
            other => Err(format!("unknown time unit '{}', expected one of D, H, M, S", other)),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            TimeUnit::Days => "D",
            TimeUnit::Hours => "H",
            TimeUnit::Minutes => "M",
            TimeUnit::Seconds => "S",
        };
        f.write_str(letter)
    }
}

/// Label printed after each unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLabels {
    pub days: String,
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
}

impl TimeLabels {
    fn get(&self, unit: TimeUnit) -> &str {
        match unit {
            TimeUnit::Days => &self.days,
            TimeUnit::Hours => &self.hours,
            TimeUnit::Minutes => &self.minutes,
            TimeUnit::Seconds => &self.seconds,
        }
    }
}

impl Default for TimeLabels {
    fn default() -> Self {
        Self {
            days: "Days".to_string(),
            hours: "Hours".to_string(),
            minutes: "Minutes".to_string(),
            seconds: "Seconds".to_string(),
        }
    }
}

/// How a breakdown is laid out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    pub units: Vec<TimeUnit>,
    pub labels: Option<TimeLabels>,
    pub separator: bool,
}

impl DisplayOptions {
    fn shows(&self, unit: TimeUnit) -> bool {
        self.units.contains(&unit)
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            units: TimeUnit::ALL.to_vec(),
            labels: Some(TimeLabels::default()),
            separator: false,
        }
    }
}

/// Render the shown units as zero-padded digits
///
/// Units always appear in day-to-second order. A `:` separator goes only
/// between two neighbouring units that are both shown.
pub fn render_text(breakdown: &Breakdown, options: &DisplayOptions) -> String {
    let mut out = String::new();

    for (index, unit) in TimeUnit::ALL.iter().enumerate() {
        if !options.shows(*unit) {
            continue;
        }

        if !out.is_empty() {
            let adjacent = index > 0 && options.shows(TimeUnit::ALL[index - 1]);
            out.push_str(if options.separator && adjacent { " : " } else { "  " });
        }

        out.push_str(&format!("{:02}", unit.value(breakdown)));
        if let Some(labels) = &options.labels {
            out.push(' ');
            out.push_str(labels.get(*unit));
        }
    }

    out
}
