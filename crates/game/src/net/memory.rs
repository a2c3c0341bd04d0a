//! In-process `Transport` and `Listener` doubles for deterministic tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use super::transport::{Listener, Transport};

#[derive(Debug, Default)]
struct Pipe {
    data: VecDeque<u8>,
    closed: bool,
}

#[derive(Debug, Clone)]
pub struct MemoryStream {
    incoming: Rc<RefCell<Pipe>>,
    outgoing: Rc<RefCell<Pipe>>,
    write_budget: Rc<Cell<Option<usize>>>,
}

impl MemoryStream {
    pub fn pair() -> (MemoryStream, MemoryStream) {
        let a_to_b = Rc::new(RefCell::new(Pipe::default()));
        let b_to_a = Rc::new(RefCell::new(Pipe::default()));

        let a = MemoryStream {
            incoming: Rc::clone(&b_to_a),
            outgoing: Rc::clone(&a_to_b),
            write_budget: Rc::new(Cell::new(None)),
        };
        let b = MemoryStream {
            incoming: a_to_b,
            outgoing: b_to_a,
            write_budget: Rc::new(Cell::new(None)),
        };
        (a, b)
    }

    /// Hangs up this end; the peer sees end-of-stream once it has drained pending bytes.
    pub fn close(&self) {
        self.outgoing.borrow_mut().closed = true;
        self.incoming.borrow_mut().closed = true;
    }

    /// Limits how many more bytes `send` accepts. `None` is unlimited.
    pub fn set_write_budget(&self, budget: Option<usize>) {
        self.write_budget.set(budget);
    }

    fn copy_front(&self, buf: &mut [u8], consume: bool) -> io::Result<usize> {
        let mut pipe = self.incoming.borrow_mut();
        if pipe.data.is_empty() {
            return if pipe.closed {
                Ok(0)
            } else {
                Err(io::ErrorKind::WouldBlock.into())
            };
        }

        let n = buf.len().min(pipe.data.len());
        for (dst, src) in buf.iter_mut().zip(pipe.data.iter()) {
            *dst = *src;
        }
        if consume {
            pipe.data.drain(..n);
        }
        Ok(n)
    }
}

impl Transport for MemoryStream {
    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut pipe = self.outgoing.borrow_mut();
        if pipe.closed {
            return Err(io::ErrorKind::BrokenPipe.into());
        }

        let n = match self.write_budget.get() {
            None => data.len(),
            Some(0) => return Err(io::ErrorKind::WouldBlock.into()),
            Some(budget) => {
                let n = budget.min(data.len());
                self.write_budget.set(Some(budget - n));
                n
            }
        };

        pipe.data.extend(&data[..n]);
        Ok(n)
    }

    fn peek(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.copy_front(buf, false)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.copy_front(buf, true)
    }
}

/// Hands out streams queued through `connect`.
#[derive(Debug, Clone, Default)]
pub struct MemoryListener {
    pending: Rc<RefCell<VecDeque<MemoryStream>>>,
}

impl MemoryListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a connection and returns the client end.
    pub fn connect(&self) -> MemoryStream {
        let (client, server) = MemoryStream::pair();
        self.pending.borrow_mut().push_back(server);
        client
    }

    /// Like `connect`, but also returns a handle sharing the server end's write budget.
    pub fn connect_with_handle(&self) -> (MemoryStream, MemoryStream) {
        let (client, server) = MemoryStream::pair();
        self.pending.borrow_mut().push_back(server.clone());
        (client, server)
    }
}

impl Listener for MemoryListener {
    type Stream = MemoryStream;

    fn accept(&mut self) -> io::Result<Option<MemoryStream>> {
        Ok(self.pending.borrow_mut().pop_front())
    }
}
