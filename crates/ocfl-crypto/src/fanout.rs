//! Fan-out ingestion pipe.
//!
//! One producer writes bytes into a [`FanOutWriter`]; every chunk is shared
//! (not copied) with N consumer threads, one per digest algorithm plus an
//! optional storage sink. [`FanOutWriter::close`] blocks until every consumer
//! has drained its channel and aggregates all consumer failures.
//!
//! A consumer that fails keeps draining its channel until the producer
//! closes, so a broken sink never blocks the producer or the digest
//! consumers.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver, Sender};
use ocfl_types::{DigestAlgorithm, ErrorList};
use tracing::debug;

use crate::error::{CryptoError, CryptoResult};
use crate::hasher::Hasher;

/// Chunks buffered per consumer before the producer blocks.
const CHANNEL_CAPACITY: usize = 16;

type Chunk = Arc<[u8]>;

/// What a consumer thread hands back on completion.
enum ConsumerOutput {
    Digest(DigestAlgorithm, String),
    Stored,
}

struct Consumer {
    label: String,
    sender: Sender<Chunk>,
    handle: JoinHandle<io::Result<ConsumerOutput>>,
}

/// Digests and byte count of one completed ingestion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FanOutResult {
    /// Lower-case hex digest per requested algorithm.
    pub digests: BTreeMap<DigestAlgorithm, String>,
    /// Number of bytes written by the producer.
    pub size: u64,
}

impl FanOutResult {
    /// Digest for `algorithm`, if it was requested.
    pub fn digest(&self, algorithm: DigestAlgorithm) -> Option<&str> {
        self.digests.get(&algorithm).map(String::as_str)
    }
}

/// Writer that copies every chunk to a set of concurrent consumers.
pub struct FanOutWriter {
    consumers: Vec<Consumer>,
    size: u64,
}

impl FanOutWriter {
    /// Create a writer that only computes digests.
    pub fn new(algorithms: &[DigestAlgorithm]) -> Self {
        Self::build(algorithms, None)
    }

    /// Create a writer that computes digests and streams the bytes to `sink`.
    pub fn with_sink(algorithms: &[DigestAlgorithm], sink: Box<dyn Write + Send>) -> Self {
        Self::build(algorithms, Some(sink))
    }

    fn build(algorithms: &[DigestAlgorithm], sink: Option<Box<dyn Write + Send>>) -> Self {
        let mut unique: Vec<DigestAlgorithm> = algorithms.to_vec();
        unique.sort();
        unique.dedup();

        let mut consumers: Vec<Consumer> = unique
            .into_iter()
            .map(|alg| {
                let (sender, receiver) = bounded::<Chunk>(CHANNEL_CAPACITY);
                let handle = thread::spawn(move || digest_consumer(alg, receiver));
                Consumer {
                    label: alg.name().to_string(),
                    sender,
                    handle,
                }
            })
            .collect();

        if let Some(sink) = sink {
            let (sender, receiver) = bounded::<Chunk>(CHANNEL_CAPACITY);
            let handle = thread::spawn(move || sink_consumer(sink, receiver));
            consumers.push(Consumer {
                label: "sink".to_string(),
                sender,
                handle,
            });
        }

        Self { consumers, size: 0 }
    }

    /// Close the pipe, wait for every consumer, and collect the results.
    ///
    /// All consumer errors are combined; the first failure does not stop
    /// the remaining consumers from being joined.
    pub fn close(self) -> CryptoResult<FanOutResult> {
        let mut result = FanOutResult {
            digests: BTreeMap::new(),
            size: self.size,
        };
        let mut errors = ErrorList::new();

        for consumer in self.consumers {
            drop(consumer.sender);
            match consumer.handle.join() {
                Ok(Ok(ConsumerOutput::Digest(alg, digest))) => {
                    result.digests.insert(alg, digest);
                }
                Ok(Ok(ConsumerOutput::Stored)) => {}
                Ok(Err(e)) => errors.push(e),
                Err(_) => errors.push(CryptoError::ConsumerPanicked(consumer.label)),
            }
        }

        debug!(
            size = result.size,
            digests = result.digests.len(),
            failures = errors.len(),
            "fan-out closed"
        );
        errors.into_result(result).map_err(CryptoError::Consumers)
    }
}

impl Write for FanOutWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let chunk: Chunk = Arc::from(buf);
        for consumer in &self.consumers {
            // A disconnected consumer has already finished; its outcome is
            // reported by `close`.
            let _ = consumer.sender.send(Arc::clone(&chunk));
        }
        self.size += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn digest_consumer(algorithm: DigestAlgorithm, receiver: Receiver<Chunk>) -> io::Result<ConsumerOutput> {
    let mut hasher = Hasher::new(algorithm);
    for chunk in receiver.iter() {
        hasher.update(&chunk);
    }
    Ok(ConsumerOutput::Digest(algorithm, hasher.finalize_hex()))
}

fn sink_consumer(mut sink: Box<dyn Write + Send>, receiver: Receiver<Chunk>) -> io::Result<ConsumerOutput> {
    let mut failure: Option<io::Error> = None;
    for chunk in receiver.iter() {
        if failure.is_none() {
            if let Err(e) = sink.write_all(&chunk) {
                failure = Some(e);
            }
        }
    }
    match failure {
        Some(e) => Err(e),
        None => {
            sink.flush()?;
            Ok(ConsumerOutput::Stored)
        }
    }
}

/// Stream `reader` through a fan-out pipe into `sink` (if any), computing
/// every digest in `algorithms`.
///
/// A read failure on the producer side is combined with any consumer
/// failures into one error.
pub fn ingest<R: Read>(
    mut reader: R,
    algorithms: &[DigestAlgorithm],
    sink: Option<Box<dyn Write + Send>>,
) -> CryptoResult<FanOutResult> {
    let mut writer = FanOutWriter::build(algorithms, sink);
    let copied = io::copy(&mut reader, &mut writer);
    let closed = writer.close();

    match (copied, closed) {
        (Ok(_), closed) => closed,
        (Err(read_err), Ok(_)) => Err(CryptoError::Io(read_err)),
        (Err(read_err), Err(CryptoError::Consumers(list))) => {
            let mut errors = ErrorList::new();
            errors.push(read_err);
            errors.combine(list);
            Err(CryptoError::Consumers(errors))
        }
        (Err(read_err), Err(other)) => {
            let mut errors = ErrorList::new();
            errors.push(read_err);
            errors.push(other);
            Err(CryptoError::Consumers(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::hasher::digest_bytes;

    /// Sink that records everything into a shared buffer.
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Sink that fails after accepting `limit` bytes.
    struct FailingSink {
        accepted: usize,
        limit: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.accepted + buf.len() > self.limit {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.accepted += buf.len();
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "source vanished"))
        }
    }

    #[test]
    fn digests_match_direct_hashing() {
        let data = vec![42u8; 300_000];
        let algs = [DigestAlgorithm::Sha512, DigestAlgorithm::Md5, DigestAlgorithm::Blake3];
        let result = ingest(data.as_slice(), &algs, None).unwrap();

        assert_eq!(result.size, data.len() as u64);
        for alg in algs {
            assert_eq!(result.digest(alg).unwrap(), digest_bytes(alg, &data));
        }
    }

    #[test]
    fn sink_receives_every_byte() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Box::new(SharedSink(Arc::clone(&buffer)));

        let result = ingest(data.as_slice(), &[DigestAlgorithm::Sha256], Some(sink)).unwrap();

        assert_eq!(*buffer.lock().unwrap(), data);
        assert_eq!(
            result.digest(DigestAlgorithm::Sha256).unwrap(),
            digest_bytes(DigestAlgorithm::Sha256, &data)
        );
    }

    #[test]
    fn duplicate_algorithms_collapse() {
        let result = ingest(
            &b"abc"[..],
            &[DigestAlgorithm::Sha1, DigestAlgorithm::Sha1],
            None,
        )
        .unwrap();
        assert_eq!(result.digests.len(), 1);
    }

    #[test]
    fn failing_sink_does_not_block_digests() {
        let data = vec![1u8; 1_000_000];
        let sink = Box::new(FailingSink {
            accepted: 0,
            limit: 10_000,
        });
        let err = ingest(data.as_slice(), &[DigestAlgorithm::Sha512], Some(sink)).unwrap_err();
        match err {
            CryptoError::Consumers(list) => {
                assert_eq!(list.len(), 1);
                assert!(list.to_string().contains("disk full"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn producer_failure_is_reported() {
        let err = ingest(FailingReader, &[DigestAlgorithm::Sha512], None).unwrap_err();
        assert!(err.to_string().contains("source vanished"));
    }

    #[test]
    fn empty_input_digests_empty_string() {
        let result = ingest(io::empty(), &[DigestAlgorithm::Sha256], None).unwrap();
        assert_eq!(result.size, 0);
        assert_eq!(
            result.digest(DigestAlgorithm::Sha256).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
