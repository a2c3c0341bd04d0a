use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use super::protocol::{LENGTH_PREFIX_SIZE, MAX_FRAME_PAYLOAD};
use super::stats::NetworkStats;

/// Non-blocking byte stream the framing layer runs on.
pub trait Transport {
    fn send(&mut self, data: &[u8]) -> io::Result<usize>;
    /// Copies pending bytes without consuming them. `Ok(0)` means the peer closed the stream.
    fn peek(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }
}

pub trait Listener {
    type Stream: Transport;

    /// Returns `Ok(None)` when no connection is pending.
    fn accept(&mut self) -> io::Result<Option<Self::Stream>>;
}

impl Transport for TcpStream {
    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        self.write(data)
    }

    fn peek(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        TcpStream::peek(self, buf)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        TcpStream::peer_addr(self).ok()
    }
}

impl Listener for TcpListener {
    type Stream = TcpStream;

    fn accept(&mut self) -> io::Result<Option<TcpStream>> {
        match TcpListener::accept(self) {
            Ok((stream, _)) => {
                configure_stream(&stream)?;
                Ok(Some(stream))
            }
            Err(e) if is_transient(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

pub fn bind_listener<A: ToSocketAddrs>(addr: A) -> io::Result<TcpListener> {
    let listener = TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}

/// Connects with a blocking handshake, then switches the stream to non-blocking mode.
pub fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<TcpStream> {
    let stream = TcpStream::connect(addr)?;
    configure_stream(&stream)?;
    Ok(stream)
}

fn configure_stream(stream: &TcpStream) -> io::Result<()> {
    stream.set_nodelay(true)?;
    stream.set_nonblocking(true)
}

pub(crate) fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    #[error("connection closed by peer")]
    Closed,
    #[error("short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },
    #[error("short write: expected {expected} bytes, wrote {written}")]
    ShortWrite { expected: usize, written: usize },
    #[error("payload of {0} bytes exceeds frame capacity")]
    TooLarge(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Sent,
    /// Nothing was written; the caller may try again on a later tick.
    WouldBlock,
}

/// Length-prefixed message boundaries over a `Transport`.
pub struct FramedStream<T> {
    inner: T,
    buffer: Box<[u8]>,
    stats: NetworkStats,
}

impl<T: Transport> FramedStream<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buffer: vec![0u8; LENGTH_PREFIX_SIZE + MAX_FRAME_PAYLOAD].into_boxed_slice(),
            stats: NetworkStats::default(),
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.peer_addr()
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn send_frame(&mut self, payload: &[u8]) -> Result<SendStatus, FrameError> {
        if payload.len() > MAX_FRAME_PAYLOAD {
            return Err(FrameError::TooLarge(payload.len()));
        }

        let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
        frame.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        frame.extend_from_slice(payload);

        match self.inner.send(&frame) {
            Ok(written) if written == frame.len() => {
                self.stats.frames_sent += 1;
                self.stats.bytes_sent += written as u64;
                log::trace!("sent frame of {} bytes", payload.len());
                Ok(SendStatus::Sent)
            }
            Ok(written) => Err(FrameError::ShortWrite {
                expected: frame.len(),
                written,
            }),
            Err(e) if is_transient(&e) => {
                self.stats.sends_deferred += 1;
                Ok(SendStatus::WouldBlock)
            }
            Err(e) => Err(FrameError::Io(e)),
        }
    }

    /// Consumes the next frame once it has fully arrived. Partial frames are left in the stream.
    pub fn recv_frame(&mut self) -> Result<Option<&[u8]>, FrameError> {
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        let Some(peeked) = self.peek_into_prefix(&mut prefix)? else {
            return Ok(None);
        };
        if peeked < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }

        let total = LENGTH_PREFIX_SIZE + u16::from_le_bytes(prefix) as usize;
        let frame = &mut self.buffer[..total];

        let peeked = match self.inner.peek(frame) {
            Ok(0) => return Err(FrameError::Closed),
            Ok(n) => n,
            Err(e) if is_transient(&e) => return Ok(None),
            Err(e) => return Err(FrameError::Io(e)),
        };
        if peeked < total {
            return Ok(None);
        }

        let received = self.inner.recv(frame)?;
        if received != total {
            return Err(FrameError::ShortRead {
                expected: total,
                got: received,
            });
        }

        self.stats.frames_received += 1;
        self.stats.bytes_received += total as u64;
        log::trace!("received frame of {} bytes", total - LENGTH_PREFIX_SIZE);

        Ok(Some(&self.buffer[LENGTH_PREFIX_SIZE..total]))
    }

    fn peek_into_prefix(
        &mut self,
        prefix: &mut [u8; LENGTH_PREFIX_SIZE],
    ) -> Result<Option<usize>, FrameError> {
        match self.inner.peek(prefix) {
            Ok(0) => Err(FrameError::Closed),
            Ok(n) => Ok(Some(n)),
            Err(e) if is_transient(&e) => Ok(None),
            Err(e) => Err(FrameError::Io(e)),
        }
    }
}
