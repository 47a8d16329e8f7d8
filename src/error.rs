use poise::serenity_prelude::GuildId;

/// Errors produced by the schedule store and the announcement dispatch.
///
/// Bad command arguments and failed writes end up in front of the invoking
/// user via [`crate::core::handle_command_error`]; delivery errors are only
/// ever logged by the scheduler.
#[derive(thiserror::Error, Debug)]
pub enum WheelError {
    #[error("'{0}' is not a day of the week")]
    InvalidDay(String),

    #[error("Hour must be between 0 and 23 (got {0})")]
    InvalidHour(i64),

    #[error("Could not write settings: {0}")]
    SettingsWrite(#[from] std::io::Error),

    #[error("Could not encode settings: {0}")]
    SettingsEncode(#[from] serde_json::Error),

    #[error("No channel in guild {0} that we can send messages to")]
    NoWritableChannel(GuildId),
}
