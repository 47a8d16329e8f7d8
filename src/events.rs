use std::sync::atomic::AtomicBool;
use poise::serenity_prelude::*;
use crate::{info_sync, scheduler};

pub struct WheelEvents;

#[async_trait]
impl EventHandler for WheelEvents {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info_sync!("Wheel running with id {}", ready.user.id);
        info_sync!("Serving {} guild(s)", ready.guilds.len());

        // `ready` fires again after a reconnect; only ever start one engine.
        static ENGINE_STARTED: AtomicBool = AtomicBool::new(false);
        if ENGINE_STARTED.compare_exchange(
            false,
            true,
            std::sync::atomic::Ordering::SeqCst,
            std::sync::atomic::Ordering::SeqCst,
        ).is_ok() {
            tokio::spawn(scheduler::run(ctx));
        }
    }
}
