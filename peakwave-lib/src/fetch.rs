//! Chunked byte loading with progress notifications.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use log::{debug, warn};

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Progress of a byte load.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Progress { loaded: u64, total: Option<u64> },
    Success(Vec<u8>),
    Error(String),
}

/// Read `reader` to the end in chunks.
///
/// Emits one `Progress` per chunk, then exactly one `Success` carrying all
/// bytes or one `Error`.
///
/// # Arguments
/// * `reader` - Byte source.
/// * `total` - Expected length, when known.
/// * `chunk_size` - Bytes per read; `0` selects [`DEFAULT_CHUNK_SIZE`].
/// * `on_event` - Receives every event in order.
pub fn read_source<R, F>(mut reader: R, total: Option<u64>, chunk_size: usize, mut on_event: F)
where
    R: Read,
    F: FnMut(FetchEvent),
{
    let chunk_size = if chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        chunk_size
    };
    let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = vec![0u8; chunk_size];

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => {
                bytes.extend_from_slice(&chunk[..read]);
                on_event(FetchEvent::Progress {
                    loaded: bytes.len() as u64,
                    total,
                });
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!("read failed after {} bytes: {}", bytes.len(), err);
                on_event(FetchEvent::Error(err.to_string()));
                return;
            }
        }
    }

    debug!("read {} bytes", bytes.len());
    on_event(FetchEvent::Success(bytes));
}

/// Read a file from disk, reporting its size as the expected total.
pub fn read_file<P, F>(path: P, mut on_event: F)
where
    P: AsRef<Path>,
    F: FnMut(FetchEvent),
{
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            warn!("failed to open {}: {}", path.display(), err);
            on_event(FetchEvent::Error(format!("{}: {}", path.display(), err)));
            return;
        }
    };
    let total = file.metadata().ok().map(|metadata| metadata.len());
    read_source(file, total, DEFAULT_CHUNK_SIZE, on_event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.served {
                return Err(std::io::Error::new(ErrorKind::BrokenPipe, "connection reset"));
            }
            self.served = true;
            buf[..2].copy_from_slice(&[1, 2]);
            Ok(2)
        }
    }

    #[test]
    fn reports_progress_per_chunk() {
        let mut events = Vec::new();
        read_source(Cursor::new(vec![7u8; 10]), Some(10), 4, |event| events.push(event));
        assert_eq!(
            events,
            vec![
                FetchEvent::Progress { loaded: 4, total: Some(10) },
                FetchEvent::Progress { loaded: 8, total: Some(10) },
                FetchEvent::Progress { loaded: 10, total: Some(10) },
                FetchEvent::Success(vec![7u8; 10]),
            ]
        );
    }

    #[test]
    fn empty_source_succeeds_with_no_bytes() {
        let mut events = Vec::new();
        read_source(Cursor::new(Vec::new()), None, 0, |event| events.push(event));
        assert_eq!(events, vec![FetchEvent::Success(Vec::new())]);
    }

    #[test]
    fn read_errors_end_the_load() {
        let mut events = Vec::new();
        read_source(FailingReader { served: false }, None, 8, |event| events.push(event));
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], FetchEvent::Error(ref message) if message.contains("reset")));
    }

    #[test]
    fn missing_file_is_an_error_event() {
        let mut events = Vec::new();
        read_file("/definitely/not/here.wav", |event| events.push(event));
        assert!(matches!(events.as_slice(), [FetchEvent::Error(_)]));
    }
}
