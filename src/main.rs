mod core;
mod commands;
mod error;
mod events;
mod scheduler;
mod store;
mod wheel;

use std::sync::Arc;
use poise::serenity_prelude as ser;
use clap::Parser;
use crate::commands::{schedule, setschedule, spin};
use crate::core::{log_command, terminate};
use crate::events::WheelEvents;

/// Prefix for text commands, e.g. `aoc!spin`.
pub const COMMAND_PREFIX: &str = "aoc!";

/// Environment variable that holds the bot token.
pub const TOKEN_VAR: &str = "DISCORD_BOT_TOKEN";

/// Global state. Ugly, but this is the best way I can think
/// of to support graceful shutdown on Ctrl+C etc.
static mut __WHEEL_FRAMEWORK: Option<Arc<ser::ShardManager>> = None;
static mut __WHEEL_RUNTIME: Option<tokio::runtime::Handle> = None;

/// User data.
#[derive(Default)]
pub struct Data;

/// Basic types.
type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;
type Res = Result<(), Error>;

/// Clopts.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Whether to register the commands.
    #[clap(long, short)]
    register: bool,
}

/// Only to be called by [`terminate()`].
pub async unsafe fn __wheel_terminate_bot() {
    if let Some(fw) = __WHEEL_FRAMEWORK.as_ref() { fw.shutdown_all().await; }
}

/// This is called from a thread that is not part of the runtime.
unsafe fn __wheel_ctrlc_impl() {
    let handle = __WHEEL_RUNTIME.as_ref().unwrap();
    let _guard = handle.enter();
    handle.block_on(terminate());
}

/// Register bot commands. The bot serves many guilds, so registration
/// is global rather than per guild.
async fn register_impl(http: impl AsRef<ser::Http>, framework: &poise::Framework<Data, Error>) -> Res {
    info_sync!("Registering commands...");
    poise::builtins::register_globally(
        http,
        &framework.options().commands,
    ).await?;
    info_sync!("Commands registered.");
    Ok(())
}

#[tokio::main]
async fn main() {
    // Register a panic hook to tear down the bot in case of an error;
    // this is so the bot restarts on error instead of hanging.
    let old_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        old_panic(info);
        std::process::abort();
    }));

    // Save runtime.
    unsafe { __WHEEL_RUNTIME = Some(tokio::runtime::Handle::current()); }

    // Register the SIGINT handler.
    //
    // Do this *after* saving the runtime as the handler will
    // attempt to enter the runtime.
    ctrlc::set_handler(|| unsafe { __wheel_ctrlc_impl() }).expect("Failed to register SIGINT handler");

    let args = Args::parse();

    // The token is deployment configuration, not something we want
    // compiled in. Refusing to start without it is a diagnostic, not
    // a crash.
    let Ok(token) = std::env::var(TOKEN_VAR) else {
        err_sync!("{} environment variable not set!", TOKEN_VAR);
        err_sync!("Set it with your bot token: export {}='your-token-here'", TOKEN_VAR);
        return;
    };
    let fw = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            pre_command: |ctx| Box::pin(async move { log_command(ctx).await; }),
            commands: vec![
                spin(),
                schedule(),
                setschedule(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(COMMAND_PREFIX.into()),
                ..Default::default()
            },
            ..Default::default()
        })

        .setup(move |ctx, _, framework| {
            unsafe {
                __WHEEL_FRAMEWORK = Some(framework.shard_manager().clone());
            };

            Box::pin(async move {
                if args.register { register_impl(ctx, framework).await?; }
                info_sync!("Setup done");
                Ok(Default::default())
            })
        })
        .build();

    ser::ClientBuilder::new(token, ser::GatewayIntents::all())
        .framework(fw)
        .event_handler(WheelEvents)
        .await
        .unwrap()
        .start()
        .await
        .unwrap();
}
