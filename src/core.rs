use std::sync::atomic::AtomicBool;
use poise::CreateReply;
use crate::{__wheel_terminate_bot, Context, Error};

/// Logging macros. These macros log an informational or error
/// message to the terminal; the `sync` variants are for code
/// that runs outside the async runtime.
#[macro_export]
macro_rules! info {
    ($arg:expr) => { $crate::core::__wheel_log_internal(&*($arg)).await };
    ($fmt:literal $(,$arg:expr)*) => { $crate::core::__wheel_log_internal(format!($fmt $(,$arg)*).as_str()).await };
}

#[macro_export]
macro_rules! info_sync {
    ($arg:expr) => { $crate::core::__wheel_log_internal_sync(&*($arg)) };
    ($fmt:literal $(,$arg:expr)*) => { $crate::core::__wheel_log_internal_sync(format!($fmt $(,$arg)*).as_str()) };
}

#[macro_export]
macro_rules! err {
    ($arg:expr) => { $crate::core::__wheel_log_internal_error(&*($arg)).await };
    ($fmt:literal $(,$arg:expr)*) => { $crate::core::__wheel_log_internal_error(format!($fmt $(,$arg)*).as_str()).await };
}

#[macro_export]
macro_rules! err_sync {
    ($arg:expr) => { $crate::core::__wheel_log_internal_error_sync(&*($arg)) };
    ($fmt:literal $(,$arg:expr)*) => { $crate::core::__wheel_log_internal_error_sync(format!($fmt $(,$arg)*).as_str()) };
}

/// Logging.
pub async fn __wheel_log_internal_error(e: &str) { eprintln!("[Error]: {}", e); }

pub async fn __wheel_log_internal(e: &str) { eprintln!("[Info]: {}", e); }

pub fn __wheel_log_internal_error_sync(e: &str) { eprintln!("[Error]: {}", e); }

pub fn __wheel_log_internal_sync(e: &str) { eprintln!("[Info]: {}", e); }

pub async fn handle_command_error(e: poise::FrameworkError<'_, crate::Data, Error>) {
    // Reply with a message if possible. Otherwise, just log the error.
    let Some(ctx) = e.ctx() else {
        err!(e.to_string());
        return;
    };

    // Log the entire command string so we have a record of it.
    err!("In invocation of command: {}", ctx.invocation_string());

    // Not every error deserves to be echoed back verbatim; permission
    // failures in particular read like gibberish to a user.
    let message = match &e {
        poise::FrameworkError::Command { error, .. } => format!("Error: {}", error),
        poise::FrameworkError::ArgumentParse { error, .. } => format!("Error: {}", error),
        poise::FrameworkError::MissingUserPermissions { .. } =>
            "You must be a server administrator to use this command.".to_string(),
        other => format!("Error: {}", other),
    };

    // Log it in case sending it fails.
    err!(message);

    // Send a reply to the user, informing them of the error; if that in turn
    // causes an error, there is nothing we can do, so just log and ignore it.
    if let Err(e) = ctx.send(CreateReply::default()
        .ephemeral(true)
        .content(safe_truncate(message, 2000)),
    ).await {
        err!(e.to_string());
    }
}

pub async fn log_command(ctx: Context<'_>) {
    info!(
        "{} invoked command {}",
        ctx.author().name,
        ctx.invocation_string()
    );
}

/// Truncate a string w/o panicking.
pub fn safe_truncate(mut s: String, mut len: usize) -> String {
    if s.len() <= len { return s; }

    // Position 0 is always a boundary, so this terminates.
    while !s.is_char_boundary(len) { len -= 1; }
    s.truncate(len);
    s
}

/// Terminate the bot gracefully.
pub async fn terminate() {
    // Don't terminate twice.
    static TERMINATION_LOCK: AtomicBool = AtomicBool::new(false);
    if TERMINATION_LOCK.compare_exchange(
        false,
        true,
        std::sync::atomic::Ordering::SeqCst,
        std::sync::atomic::Ordering::SeqCst,
    ).is_err() { return; }

    // Shutdown asynchronously running code.
    unsafe {
        info_sync!("Shutting down bot...");
        __wheel_terminate_bot().await;
    }

    // Exit the process.
    info_sync!("Exiting...");
    std::process::exit(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_truncate_respects_char_boundaries() {
        assert_eq!(safe_truncate("hello".to_string(), 3), "hel");
        assert_eq!(safe_truncate("hello".to_string(), 10), "hello");
        assert_eq!(safe_truncate("hello".to_string(), 0), "");
        // 'é' is two bytes; truncating inside it must back off.
        assert_eq!(safe_truncate("é".to_string(), 1), "");
    }
}
