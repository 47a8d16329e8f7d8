use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;
use chrono::{DateTime, Datelike, Days, Timelike, Utc};
use poise::serenity_prelude as ser;
use crate::{err, info};
use crate::error::WheelError;
use crate::store::{self, ScheduleRecord};
use crate::wheel::{self, ChallengeSelection};
use crate::Res;

/// Ticks land this many seconds past the hour boundary, so a tick is
/// always safely inside the hour it is checking for.
const TICK_OFFSET_SECS: i64 = 60;

static RUNNING: AtomicBool = AtomicBool::new(false);
static NEXT_TICK: AtomicI64 = AtomicI64::new(0);

/// Whether the engine has been started.
pub fn is_running() -> bool {
    RUNNING.load(Ordering::SeqCst)
}

/// When the next tick will fire, if the engine is running.
pub fn next_tick_at() -> Option<DateTime<Utc>> {
    if !is_running() { return None; }
    DateTime::from_timestamp(NEXT_TICK.load(Ordering::SeqCst), 0)
}

/// Unix timestamp of the first tick strictly after `now_ts`.
pub fn next_tick_timestamp(now_ts: i64) -> i64 {
    let hour_start = now_ts - now_ts.rem_euclid(3600);
    let tick = hour_start + TICK_OFFSET_SECS;
    if tick > now_ts { tick } else { tick + 3600 }
}

/// Whether a schedule fires at the given UTC day-of-week and hour.
pub fn is_due(record: ScheduleRecord, day: u8, hour: u8) -> bool {
    record.day == day && record.hour == hour
}

/// Resolve the next occurrence of a schedule, for display by the
/// `schedule` command. Computed independently of the tick loop, but uses
/// the same hh:01 trigger point so the two never disagree.
pub fn next_occurrence(now: DateTime<Utc>, record: ScheduleRecord) -> DateTime<Utc> {
    let hour = u32::from(record.hour.min(23));
    let today = i64::from(now.weekday().num_days_from_monday());
    let mut days_until = (i64::from(record.day) - today).rem_euclid(7);

    let past_trigger = now.hour() > hour || (now.hour() == hour && now.minute() >= 1);
    if days_until == 0 && past_trigger {
        days_until = 7;
    }

    let date = now.date_naive() + Days::new(days_until as u64);
    // hour <= 23, so this is always a valid time.
    date.and_hms_opt(hour, 1, 0).unwrap().and_utc()
}

/// Run the due-check engine forever. Spawned once, on the first `ready`
/// event; there is no way to stop it short of process shutdown.
pub async fn run(ctx: ser::Context) {
    RUNNING.store(true, Ordering::SeqCst);
    info!("Announcement scheduler started");

    loop {
        let now = Utc::now().timestamp();
        let next = next_tick_timestamp(now);
        NEXT_TICK.store(next, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs((next - now).max(1) as u64)).await;

        tick(&ctx, Utc::now()).await;
    }
}

/// Evaluate one tick: check every guild we serve against `now` and
/// announce in the ones whose slot matches. `now` is read once for the
/// whole tick so every guild sees the same day and hour.
pub async fn tick(ctx: &ser::Context, now: DateTime<Utc>) {
    let day = now.weekday().num_days_from_monday() as u8;
    let hour = now.hour() as u8;

    for guild in ctx.cache.guilds() {
        let record = store::get_schedule(guild).await;
        if !is_due(record, day, hour) { continue; }

        let selection = wheel::select_challenge();
        info!(
            "Announcing year {} day {} ({}) in guild {}",
            selection.year, selection.day, selection.language, guild
        );

        // One guild failing to receive its announcement must not keep the
        // rest from getting theirs.
        if let Err(e) = announce(ctx, guild, &selection).await {
            err!("Failed to announce in guild {}: {}", guild, e);
        }
    }
}

/// Deliver an announcement to the first text channel (by position) that
/// the bot may send messages to. One channel per guild.
async fn announce(ctx: &ser::Context, guild: ser::GuildId, selection: &ChallengeSelection) -> Res {
    let me = ctx.cache.current_user().id;
    let member = guild.member(ctx, me).await?;

    let channel = {
        let Some(g) = ctx.cache.guild(guild) else {
            return Err(format!("Guild {} is not in the cache", guild).into());
        };

        let mut channels: Vec<_> = g
            .channels
            .values()
            .filter(|c| c.kind == ser::ChannelType::Text)
            .collect();
        channels.sort_by_key(|c| c.position);

        channels
            .iter()
            .find(|c| g.user_permissions_in(c, &member).send_messages())
            .map(|c| c.id)
    };

    let Some(channel) = channel else {
        return Err(WheelError::NoWritableChannel(guild).into());
    };

    channel.send_message(ctx, ser::CreateMessage::new().content(format!(
        "🎉 **It's Advent of Code time!** 🎉\n\
         🎄 **Let's do Year {} Day {} in {}!** 🎄\n{}",
        selection.year, selection.day, selection.language, selection.url(),
    ))).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 2024-12-06 was a Friday.
    fn friday_at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 6, hour, minute, 0).unwrap()
    }

    #[test]
    fn due_only_on_exact_match() {
        let record = ScheduleRecord { day: 4, hour: 18 };
        assert!(is_due(record, 4, 18));
        assert!(!is_due(record, 4, 19));
        assert!(!is_due(record, 4, 17));
        assert!(!is_due(record, 3, 18));
        assert!(!is_due(record, 5, 18));
    }

    #[test]
    fn ticks_land_just_past_the_hour() {
        // 10:00:00 -> 10:01:00
        assert_eq!(next_tick_timestamp(36_000), 36_060);
        // 10:00:59 -> 10:01:00
        assert_eq!(next_tick_timestamp(36_059), 36_060);
        // 10:01:00 -> 11:01:00, never the same instant twice
        assert_eq!(next_tick_timestamp(36_060), 39_660);
        // 10:30:00 -> 11:01:00
        assert_eq!(next_tick_timestamp(37_800), 39_660);
    }

    #[test]
    fn next_occurrence_later_today() {
        let now = friday_at(17, 30);
        let next = next_occurrence(now, ScheduleRecord { day: 4, hour: 18 });
        assert_eq!(next, friday_at(18, 1));
    }

    #[test]
    fn next_occurrence_at_the_boundary() {
        // At 18:00 sharp the 18:01 trigger hasn't passed yet.
        let next = next_occurrence(friday_at(18, 0), ScheduleRecord { day: 4, hour: 18 });
        assert_eq!(next, friday_at(18, 1));

        // At 18:01 it has, so we wait a week.
        let next = next_occurrence(friday_at(18, 1), ScheduleRecord { day: 4, hour: 18 });
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 12, 13, 18, 1, 0).unwrap());
    }

    #[test]
    fn next_occurrence_wraps_the_week() {
        // Friday evening, schedule is Monday morning -> the coming Monday.
        let next = next_occurrence(friday_at(20, 0), ScheduleRecord { day: 0, hour: 9 });
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 12, 9, 9, 1, 0).unwrap());
    }

    #[test]
    fn next_occurrence_clamps_bad_hours() {
        // A hand-edited settings file can hold junk; display must not panic.
        let next = next_occurrence(friday_at(12, 0), ScheduleRecord { day: 4, hour: 99 });
        assert_eq!(next.hour(), 23);
    }
}
