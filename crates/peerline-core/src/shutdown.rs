//! Graceful shutdown between batches.
//!
//! The first SIGINT/SIGTERM sets a flag that batch loops poll before starting
//! the next batch; already-flushed output stays valid. A second signal exits.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// Exit status used when a second signal forces termination
const FORCED_EXIT_CODE: i32 = 130;

/// Global shutdown flag
pub fn shutdown_flag() -> &'static AtomicBool {
    static FLAG: AtomicBool = AtomicBool::new(false);
    &FLAG
}

pub fn is_shutdown_requested() -> bool {
    shutdown_flag().load(Ordering::Relaxed)
}

pub fn request_shutdown() {
    shutdown_flag().store(true, Ordering::Relaxed);
}

/// Register SIGINT and SIGTERM handlers driving [`shutdown_flag`].
pub fn install_signal_handlers() -> io::Result<()> {
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        // SAFETY: the handler only touches an AtomicBool and calls _exit,
        // both async-signal-safe.
        unsafe {
            signal_hook::low_level::register(signal, || {
                if shutdown_flag().swap(true, Ordering::Relaxed) {
                    signal_hook::low_level::exit(FORCED_EXIT_CODE);
                }
            })?;
        }
    }
    Ok(())
}
