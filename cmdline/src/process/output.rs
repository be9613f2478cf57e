//! Line-oriented output from a wrapped process.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use super::handlers::Handlers;
use crate::Error;

/// Which captured stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl Stream {
    /// Lowercase stream name, as used in log events.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }

    /// Wrap a line of text as output from this stream.
    pub const fn line(self, text: String) -> OutputLine {
        match self {
            Self::Stdout => OutputLine::Stdout(text),
            Self::Stderr => OutputLine::Stderr(text),
        }
    }
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One delivery to the output callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    /// Line from stdout, without its line terminator.
    Stdout(String),
    /// Line from stderr, without its line terminator.
    Stderr(String),
    /// The stream reached end of file. Sent once per stream, after its last line.
    Closed(Stream),
}

impl OutputLine {
    /// The stream this delivery belongs to.
    pub const fn stream(&self) -> Stream {
        match self {
            Self::Stdout(_) => Stream::Stdout,
            Self::Stderr(_) => Stream::Stderr,
            Self::Closed(stream) => *stream,
        }
    }

    /// The text of the line, or `None` for the end-of-stream marker.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Stdout(text) | Self::Stderr(text) => Some(text),
            Self::Closed(_) => None,
        }
    }

    /// Whether this is the end-of-stream marker.
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

/// Read `reader` to EOF, handing each line to the output callback.
///
/// Lines are split on `\n`; a trailing `\r` is dropped and invalid UTF-8 is
/// replaced rather than ending the stream. A read error is reported and
/// treated as end of stream. [`OutputLine::Closed`] is always delivered last.
pub(crate) async fn drain_lines<R>(reader: R, stream: Stream, handlers: Arc<Handlers>)
where
    R: AsyncRead + Unpin,
{
    let mut segments = BufReader::new(reader).split(b'\n');

    loop {
        match segments.next_segment().await {
            Ok(Some(mut bytes)) => {
                if bytes.last() == Some(&b'\r') {
                    bytes.pop();
                }
                let text = String::from_utf8_lossy(&bytes).into_owned();
                handlers.output(&stream.line(text));
            }
            Ok(None) => break,
            Err(source) => {
                let err = Error::Read { stream, source };
                tracing::warn!(%stream, error = %err, "stopped reading process output");
                handlers.report(&err);
                break;
            }
        }
    }

    handlers.output(&OutputLine::Closed(stream));
}
