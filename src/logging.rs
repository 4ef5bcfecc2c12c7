// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! A small `fern`-backed logger, adapted from the standalone logger crate this project's
//! teacher ships alongside its node daemons, trimmed to a single stdout output since this tool
//! has no per-output routing needs.

use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::Dispatch;
use log::LevelFilter;

const DEFAULT_TARGET_WIDTH: usize = 30;
const DEFAULT_LEVEL_WIDTH: usize = 5;

/// Builder for a [`LoggerConfig`].
pub struct LoggerConfigBuilder {
    level_filter: LevelFilter,
    color_enabled: bool,
    target_width: usize,
    level_width: usize,
}

impl Default for LoggerConfigBuilder {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::Info,
            color_enabled: true,
            target_width: DEFAULT_TARGET_WIDTH,
            level_width: DEFAULT_LEVEL_WIDTH,
        }
    }
}

impl LoggerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level_filter(mut self, level: LevelFilter) -> Self {
        self.level_filter = level;
        self
    }

    pub fn color_enabled(mut self, enabled: bool) -> Self {
        self.color_enabled = enabled;
        self
    }

    pub fn finish(self) -> LoggerConfig {
        LoggerConfig {
            level_filter: self.level_filter,
            color_enabled: self.color_enabled,
            target_width: self.target_width,
            level_width: self.level_width,
        }
    }
}

/// Logger configuration: level filter, color, and column widths for the formatted output.
pub struct LoggerConfig {
    level_filter: LevelFilter,
    color_enabled: bool,
    target_width: usize,
    level_width: usize,
}

impl LoggerConfig {
    pub fn build() -> LoggerConfigBuilder {
        LoggerConfigBuilder::default()
    }
}

macro_rules! log_format {
    ($target:expr, $level:expr, $message:expr, $target_width:expr, $level_width:expr) => {
        format_args!(
            "{} {:target_width$} {:level_width$} {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            $target,
            $level,
            $message,
            target_width = $target_width,
            level_width = $level_width
        )
    };
}

/// Installs `config` as the process-wide `log` backend.
///
/// Fails if a logger backend has already been installed in this process (see
/// [`log::set_boxed_logger`]); calling this twice is a caller bug, not a retryable condition.
pub fn init(config: LoggerConfig) -> Result<(), crate::error::Error> {
    let target_width = config.target_width;
    let level_width = config.level_width;

    let dispatch = if config.color_enabled {
        let colors = ColoredLevelConfig::new()
            .trace(Color::BrightMagenta)
            .debug(Color::BrightBlue)
            .info(Color::BrightGreen)
            .warn(Color::BrightYellow)
            .error(Color::BrightRed);

        Dispatch::new().format(move |out, message, record| {
            out.finish(log_format!(
                record.target(),
                colors.color(record.level()),
                message,
                target_width,
                level_width
            ))
        })
    } else {
        Dispatch::new().format(move |out, message, record| {
            out.finish(log_format!(
                record.target(),
                record.level(),
                message,
                target_width,
                level_width
            ))
        })
    };

    dispatch
        .level(config.level_filter)
        .chain(std::io::stdout())
        .apply()
        .map_err(|err| {
            crate::error::Error::InvariantViolation(format!(
                "logger backend already initialized: {err}"
            ))
        })
}
