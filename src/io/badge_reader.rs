//! Serial badge reader
//!
//! Protocol:
//! - One card per line, terminated by CR and/or LF
//! - Magstripe readers wrap track 2 in `;` ... `?` sentinels, which are stripped
//! - Each complete line becomes a card-swipe event

use crate::domain::types::Event;
use crate::infra::config::Config;
use crate::io::event_channel::EventSender;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::watch;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, error, info, warn};

/// Longest line accepted before the buffer is discarded as noise
const MAX_LINE_LEN: usize = 64;

/// Delay before retrying a port that failed to open or read
const REOPEN_DELAY: Duration = Duration::from_secs(5);

pub struct BadgeReader {
    device: String,
    baud: u32,
    event_tx: EventSender,
    /// Persistent read buffer; a card id can arrive split across reads
    read_buffer: Vec<u8>,
}

impl BadgeReader {
    pub fn new(config: &Config, event_tx: EventSender) -> Self {
        Self {
            device: config.badge_reader_device().to_string(),
            baud: config.badge_reader_baud(),
            event_tx,
            read_buffer: Vec::with_capacity(MAX_LINE_LEN),
        }
    }

    /// Append raw bytes and return every complete card id now in the buffer
    fn extract_card_ids(&mut self, bytes: &[u8]) -> Vec<String> {
        self.read_buffer.extend_from_slice(bytes);

        let mut ids = Vec::new();
        while let Some(end) = self.read_buffer.iter().position(|&b| b == b'\n' || b == b'\r') {
            let line: Vec<u8> = self.read_buffer.drain(..=end).collect();
            let text = String::from_utf8_lossy(&line[..end]);
            let id = text.trim().trim_start_matches(';').trim_end_matches('?').trim();
            if !id.is_empty() {
                ids.push(id.to_string());
            }
        }

        if self.read_buffer.len() > MAX_LINE_LEN {
            warn!(discarded = self.read_buffer.len(), "badge_reader_line_too_long");
            self.read_buffer.clear();
        }

        ids
    }

    /// Start the reader loop
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(device = %self.device, baud = %self.baud, "badge_reader_started");

        loop {
            let port = tokio_serial::new(&self.device, self.baud).open_native_async();
            let mut port = match port {
                Ok(p) => {
                    info!(device = %self.device, "badge_reader_port_opened");
                    p
                }
                Err(e) => {
                    error!(device = %self.device, error = %e, "badge_reader_port_open_failed");
                    tokio::select! {
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                info!("badge_reader_shutdown");
                                return;
                            }
                        }
                        _ = tokio::time::sleep(REOPEN_DELAY) => {}
                    }
                    continue;
                }
            };

            let mut temp_buf = [0u8; 64];
            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            info!("badge_reader_shutdown");
                            return;
                        }
                    }
                    result = port.read(&mut temp_buf) => {
                        match result {
                            Ok(0) => {}
                            Ok(n) => {
                                for id in self.extract_card_ids(&temp_buf[..n]) {
                                    debug!(card = %id, "badge_swiped");
                                    if self.event_tx.send(Event::card_swipe(id)).await.is_err() {
                                        warn!("badge_reader_event_channel_closed");
                                        return;
                                    }
                                }
                            }
                            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                            Err(e) => {
                                warn!(error = %e, "badge_reader_read_error");
                                self.read_buffer.clear();
                                break;
                            }
                        }
                    }
                }
            }

            tokio::time::sleep(REOPEN_DELAY).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::event_channel::create_event_channel;

    fn reader() -> BadgeReader {
        let (tx, _queue) = create_event_channel(4);
        BadgeReader::new(&Config::default(), tx)
    }

    #[test]
    fn test_extract_single_line() {
        let mut reader = reader();
        assert_eq!(reader.extract_card_ids(b"12345\r\n"), vec!["12345"]);
        assert!(reader.read_buffer.is_empty());
    }

    #[test]
    fn test_extract_split_across_reads() {
        let mut reader = reader();
        assert!(reader.extract_card_ids(b"123").is_empty());
        assert_eq!(reader.extract_card_ids(b"45\n678\n"), vec!["12345", "678"]);
    }

    #[test]
    fn test_extract_strips_sentinels() {
        let mut reader = reader();
        assert_eq!(reader.extract_card_ids(b";0042?\r"), vec!["0042"]);
    }

    #[test]
    fn test_overlong_noise_is_discarded() {
        let mut reader = reader();
        let noise = vec![b'x'; MAX_LINE_LEN + 1];
        assert!(reader.extract_card_ids(&noise).is_empty());
        assert!(reader.read_buffer.is_empty());
        assert_eq!(reader.extract_card_ids(b"9\n"), vec!["9"]);
    }
}
