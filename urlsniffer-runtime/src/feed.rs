//! Event feed
//!
//! Reads JSON-lines honeypot events and hands each one to a running sniffer.
//! Lines are decoded lossily: attacker-typed commands may carry bytes that are
//! not UTF-8, and one such line must not end the feed.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use urlsniffer_core::Event;

use crate::UrlSniffer;

/// Feed every event in `reader` to `sniffer` until end of input.
///
/// Blank and malformed lines are skipped. Returns the number of events handled;
/// only a failing reader ends the feed early.
pub async fn pump<R>(sniffer: &UrlSniffer, mut reader: R) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut handled = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            debug!("End of input");
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match Event::from_json(line) {
            Ok(event) => event,
            Err(e) => {
                warn!("Skipping malformed event: {}", e);
                continue;
            }
        };

        let observation = sniffer.write(&event).await;
        handled += 1;
        if observation.candidates > 0 {
            info!(
                "{}: {} URLs ({} new, {} live)",
                event.id(),
                observation.candidates,
                observation.inserted,
                observation.live
            );
        }
    }

    Ok(handled)
}
