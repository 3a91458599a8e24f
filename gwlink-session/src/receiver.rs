//! Receive loop driving the frame assembler from a stream

use crate::assembler::{Assembled, FrameAssembler, Progress, ReceiveEvent};
use crate::error::GatewayResult;
use gwlink_transport::StreamAccessor;
use std::time::Duration;

/// Largest chunk taken from the socket in one read
pub const READ_CHUNK_SIZE: usize = 1024;

/// Reads one response frame from a stream
pub struct FrameReceiver;

impl FrameReceiver {
    /// Receive one frame, racing the reads against an overall deadline
    ///
    /// Each iteration reads whatever is available, feeds it to the assembler
    /// and re-evaluates. A read that completes in the same poll as the
    /// deadline wins. Dropping the returned future drops the deadline timer
    /// with it.
    ///
    /// # Errors
    /// - `Timeout` when `timeout` elapses before a complete frame
    /// - `IncompleteHeader` / `PrematureClose` when the stream ends early
    /// - `InvalidHeader` when the stream does not start with `FF FF`
    /// - `Connection` when the socket read itself fails
    pub async fn receive<S>(stream: &mut S, timeout: Duration) -> GatewayResult<Assembled>
    where
        S: StreamAccessor + ?Sized,
    {
        Self::receive_after(stream, &[], timeout).await
    }

    /// Receive one frame whose first bytes were already read from the stream
    ///
    /// `buffered` is fed to the assembler before the first read, so a frame
    /// that is already complete in it resolves without touching the stream.
    pub async fn receive_after<S>(
        stream: &mut S,
        buffered: &[u8],
        timeout: Duration,
    ) -> GatewayResult<Assembled>
    where
        S: StreamAccessor + ?Sized,
    {
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let mut assembler = FrameAssembler::with_capacity(READ_CHUNK_SIZE.max(buffered.len()));
        if !buffered.is_empty() {
            match assembler.advance(ReceiveEvent::BytesArrived(buffered)) {
                Progress::Pending(next) => assembler = next,
                Progress::Complete(assembled) => return Ok(assembled),
                Progress::Failed(e) => return Err(e),
            }
        }

        loop {
            let read = tokio::select! {
                biased;
                read = stream.read(&mut chunk) => Some(read),
                _ = &mut deadline => None,
            };

            let event = match read {
                Some(Ok(0)) => ReceiveEvent::StreamClosed,
                Some(Ok(n)) => ReceiveEvent::BytesArrived(&chunk[..n]),
                Some(Err(e)) => return Err(e),
                None => ReceiveEvent::TimeoutFired,
            };

            match assembler.advance(event) {
                Progress::Pending(next) => {
                    log::trace!("Awaiting more frame bytes ({} buffered)", next.received());
                    assembler = next;
                }
                Progress::Complete(assembled) => return Ok(assembled),
                Progress::Failed(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::frame::CommandFrame;
    use gwlink_transport::IoTransport;
    use tokio_test::io::Builder;

    fn firmware_response() -> Vec<u8> {
        CommandFrame::new(0x50u8, b"GW1100A_V2.3.4").unwrap().encode()
    }

    #[tokio::test]
    async fn test_receive_in_one_read() {
        let bytes = firmware_response();
        let mut stream = IoTransport::new(Builder::new().read(&bytes).build());
        let assembled = FrameReceiver::receive(&mut stream, Duration::from_secs(5)).await.unwrap();
        assert_eq!(assembled.frame.as_bytes(), &bytes[..]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_across_delayed_reads() {
        let bytes = firmware_response();
        let mut builder = Builder::new();
        for piece in bytes.chunks(3) {
            builder.read(piece).wait(Duration::from_millis(200));
        }
        let mut stream = IoTransport::new(builder.build());
        let assembled = FrameReceiver::receive(&mut stream, Duration::from_secs(5)).await.unwrap();
        assert_eq!(assembled.frame.payload(), b"GW1100A_V2.3.4");
    }

    #[tokio::test]
    async fn test_stream_closed_before_header() {
        let mut stream = IoTransport::new(Builder::new().read(&[0xFF, 0xFF, 0x50]).build());
        let result = FrameReceiver::receive(&mut stream, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(GatewayError::IncompleteHeader { received: 3 })));
    }

    #[tokio::test]
    async fn test_stream_closed_mid_body() {
        let partial = [0xFF, 0xFF, 0x3C, 0x00, 0x0A, 0x01, 0x02, 0x03, 0x04, 0x05];
        let mut stream = IoTransport::new(Builder::new().read(&partial).build());
        let result = FrameReceiver::receive(&mut stream, Duration::from_secs(5)).await;
        assert!(matches!(
            result,
            Err(GatewayError::PrematureClose { received: 10, expected: 16 })
        ));
    }

    #[tokio::test]
    async fn test_invalid_header() {
        let mut stream = IoTransport::new(Builder::new().read(b"HTTP/1.1 400").build());
        let result = FrameReceiver::receive(&mut stream, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(GatewayError::InvalidHeader(b'H', b'T'))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_partial_bytes() {
        let mut stream = IoTransport::new(
            Builder::new()
                .read(&[0xFF, 0xFF])
                .wait(Duration::from_secs(60))
                .build(),
        );
        let result = FrameReceiver::receive(&mut stream, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(GatewayError::Timeout { received: 2 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_and_data_at_same_instant_resolve_once() {
        let bytes = firmware_response();
        let mut stream = IoTransport::new(
            Builder::new()
                .wait(Duration::from_secs(5))
                .read(&bytes)
                .build(),
        );
        let result = FrameReceiver::receive(&mut stream, Duration::from_secs(5)).await;
        match result {
            Ok(assembled) => assert_eq!(assembled.frame.as_bytes(), &bytes[..]),
            Err(GatewayError::Timeout { received }) => {
                assert_eq!(received, 0);
                // The late frame is still queued; drain it so the mock is satisfied
                let mut rest = [0u8; READ_CHUNK_SIZE];
                let n = stream.read(&mut rest).await.unwrap();
                assert_eq!(&rest[..n], &bytes[..]);
            }
            Err(other) => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_receive_after_completes_from_buffered_bytes() {
        let bytes = firmware_response();
        let mut stream = IoTransport::new(Builder::new().build());
        let assembled = FrameReceiver::receive_after(&mut stream, &bytes, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(assembled.frame.as_bytes(), &bytes[..]);
        assert!(!stream.is_closed());
    }

    #[tokio::test]
    async fn test_receive_after_continues_from_stream() {
        let bytes = firmware_response();
        let mut stream = IoTransport::new(Builder::new().read(&bytes[4..]).build());
        let assembled = FrameReceiver::receive_after(&mut stream, &bytes[..4], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(assembled.frame.payload(), b"GW1100A_V2.3.4");
    }

    #[tokio::test]
    async fn test_trailing_bytes_in_same_read() {
        let mut bytes = firmware_response();
        bytes.extend_from_slice(&[0x00, 0x01]);
        let mut stream = IoTransport::new(Builder::new().read(&bytes).build());
        let assembled = FrameReceiver::receive(&mut stream, Duration::from_secs(5)).await.unwrap();
        assert_eq!(&assembled.trailing[..], &[0x00, 0x01]);
    }
}
