//! Scripted browser surfaces driven from standard input.

use mailgate_login::BrowserEvent;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::sync::mpsc;

/// Parses one scripted line into a browser event.
///
/// - `dismiss` closes the surface
/// - `error <description>` reports a load error
/// - anything else is a navigated URL
///
/// Blank lines produce nothing.
pub fn parse_line(line: &str) -> Option<BrowserEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.eq_ignore_ascii_case("dismiss") {
        return Some(BrowserEvent::Dismissed);
    }
    if let Some(description) = line.strip_prefix("error") {
        let description = description.trim();
        if description.is_empty() || line.as_bytes().get(5) == Some(&b' ') {
            return Some(BrowserEvent::LoadError {
                description: description.to_string(),
            });
        }
    }
    Some(BrowserEvent::navigated(line))
}

/// Streams events read line by line from `input`.
///
/// The channel closes at end of input, which the detector treats as the
/// surface going away.
pub fn spawn_reader<R>(input: R) -> mpsc::Receiver<BrowserEvent>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(input).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(event) = parse_line(&line)
                        && tx.send(event).await.is_err()
                    {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to read browser input: {e}");
                    break;
                }
            }
        }
    });
    rx
}

/// Reads the next line of user input, trimmed; `None` at end of input.
///
/// Takes the caller's line reader so input buffered past one answer is kept
/// for the next.
pub async fn read_answer<R: AsyncBufRead + Unpin>(
    input: &mut Lines<R>,
) -> std::io::Result<Option<String>> {
    Ok(input.next_line().await?.map(|line| line.trim().to_string()))
}
