//! Character display output
//!
//! The controller produces raw messages with `\n` line breaks. This module
//! fits them to the physical display (two lines of fixed width) and writes
//! each frame to the display device.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Number of lines on the display
pub const DISPLAY_LINES: usize = 2;

/// Fit a raw message to the display: at most two lines, each truncated
/// and padded to `width` characters.
pub fn format_message(message: &str, width: usize) -> [String; DISPLAY_LINES] {
    let mut lines = message.split('\n').map(|line| line.trim_matches(&['\r', '\0'][..]));
    std::array::from_fn(|_| {
        let line = lines.next().unwrap_or("");
        let mut fitted: String = line.chars().take(width).collect();
        let len = fitted.chars().count();
        fitted.extend(std::iter::repeat(' ').take(width - len));
        fitted
    })
}

/// Worker that writes formatted frames to the display device
pub struct DisplayWorker<W> {
    writer: W,
    width: usize,
    message_rx: mpsc::Receiver<String>,
}

impl<W: AsyncWrite + Unpin> DisplayWorker<W> {
    pub fn new(writer: W, width: usize, message_rx: mpsc::Receiver<String>) -> Self {
        Self { writer, width, message_rx }
    }

    /// Run the worker, writing frames until the channel closes
    pub async fn run(mut self) -> W {
        info!(width = %self.width, "display_worker_started");

        while let Some(message) = self.message_rx.recv().await {
            let [top, bottom] = format_message(&message, self.width);
            debug!(top = %top, bottom = %bottom, "display_frame");

            let frame = format!("{top}\n{bottom}\n");
            if let Err(e) = self.writer.write_all(frame.as_bytes()).await {
                error!(error = %e, "display_write_failed");
                continue;
            }
            if let Err(e) = self.writer.flush().await {
                error!(error = %e, "display_flush_failed");
            }
        }

        info!("display_worker_stopped");
        self.writer
    }
}
