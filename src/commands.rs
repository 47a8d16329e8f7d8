use chrono::Utc;
use crate::{scheduler, store, wheel, Context, Res};
use crate::core::handle_command_error;
use crate::error::WheelError;
use crate::store::{ScheduleRecord, DAY_NAMES};

/// Spin the wheel for a random Advent of Code challenge.
#[poise::command(slash_command, prefix_command, guild_only, on_error = "handle_command_error")]
pub async fn spin(ctx: Context<'_>) -> Res {
    let sel = wheel::select_challenge();
    ctx.say(format!(
        "🎄 **Let's do Year {} Day {} in {}!** 🎄\n{}",
        sel.year, sel.day, sel.language, sel.url()
    )).await?;
    Ok(())
}

/// Show when the next automatic announcement will happen.
#[poise::command(slash_command, prefix_command, guild_only, on_error = "handle_command_error")]
pub async fn schedule(ctx: Context<'_>) -> Res {
    if !scheduler::is_running() {
        ctx.say("⚠️ The announcement scheduler is not currently running.").await?;
        return Ok(());
    }

    // Safe because of guild_only.
    let guild = ctx.guild_id().unwrap();
    let record = store::get_schedule(guild).await;
    let next = scheduler::next_occurrence(Utc::now(), record);
    let mut msg = format!(
        "⏰ Announcements go out every {}.\nNext automatic announcement: {}",
        record.describe(),
        next.format("%Y-%m-%d %H:%M:%S %Z"),
    );
    if let Some(tick) = scheduler::next_tick_at() {
        msg.push_str(&format!("\nNext schedule check: {}", tick.format("%H:%M %Z")));
    }
    ctx.say(msg).await?;
    Ok(())
}

/// Set this server's announcement slot (administrators only).
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR",
    on_error = "handle_command_error"
)]
pub async fn setschedule(
    ctx: Context<'_>,
    #[description = "Day of the week, e.g. 'friday' or 'fri'"] day: String,
    #[description = "Hour of the day in UTC (0-23)"] hour: i64,
) -> Res {
    let day = parse_weekday(&day)?;
    if !(0..=23).contains(&hour) {
        return Err(WheelError::InvalidHour(hour).into());
    }

    let record = ScheduleRecord { day, hour: hour as u8 };
    store::set_schedule(ctx.guild_id().unwrap(), record).await?;
    ctx.say(format!("✅ Announcements will now go out every {}.", record.describe())).await?;
    Ok(())
}

/// Map a day name or abbreviation to 0..=6, Monday first. Any
/// case-insensitive prefix of at least three letters is accepted; three
/// letters is enough to tell all seven days apart.
pub fn parse_weekday(input: &str) -> Result<u8, WheelError> {
    let lower = input.trim().to_ascii_lowercase();
    if lower.len() < 3 {
        return Err(WheelError::InvalidDay(input.to_string()));
    }

    DAY_NAMES
        .iter()
        .position(|name| name.to_ascii_lowercase().starts_with(&lower))
        .map(|day| day as u8)
        .ok_or_else(|| WheelError::InvalidDay(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_names_and_abbreviations() {
        assert_eq!(parse_weekday("monday").unwrap(), 0);
        assert_eq!(parse_weekday("tues").unwrap(), 1);
        assert_eq!(parse_weekday("wed").unwrap(), 2);
        assert_eq!(parse_weekday("thursday").unwrap(), 3);
        assert_eq!(parse_weekday("fri").unwrap(), 4);
        assert_eq!(parse_weekday("sat").unwrap(), 5);
        assert_eq!(parse_weekday("sun").unwrap(), 6);
    }

    #[test]
    fn case_and_whitespace_are_forgiven() {
        assert_eq!(parse_weekday("FRIDAY").unwrap(), 4);
        assert_eq!(parse_weekday("  Tue ").unwrap(), 1);
    }

    #[test]
    fn junk_is_rejected() {
        assert!(parse_weekday("someday").is_err());
        assert!(parse_weekday("fridayyy").is_err());
        assert!(parse_weekday("").is_err());
        // Too short to be unambiguous.
        assert!(parse_weekday("fr").is_err());
        assert!(parse_weekday("s").is_err());
    }
}
