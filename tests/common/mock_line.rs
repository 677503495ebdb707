//! Mock GPIO Line for Testing

use async_trait::async_trait;
use butler::button::{InputLine, Level};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Reads high until `press()` is called; each press is low for one poll.
#[derive(Clone, Default)]
pub struct MockLine {
    presses: Arc<AtomicUsize>,
    unplugged: Arc<AtomicBool>,
    pub reads: Arc<AtomicUsize>,
}

impl MockLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self) {
        self.presses.fetch_add(1, Ordering::SeqCst);
    }

    /// Make every further read fail
    pub fn unplug(&self) {
        self.unplugged.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl InputLine for MockLine {
    async fn read(&mut self) -> io::Result<Level> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unplugged.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "gpio line gone"));
        }
        let pressed = self
            .presses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        Ok(if pressed { Level::Low } else { Level::High })
    }
}
