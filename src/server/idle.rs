// Idle timeout module
// Wraps a connection's stream and fails stalled reads or writes

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{sleep, Sleep};

/// Stream wrapper with per-operation deadlines
///
/// A read that stays pending for `idle` without any traffic in either
/// direction fails with `TimedOut`, as does a write the peer does not drain
/// within `stall`. Every read or write that makes progress restarts the
/// clock, so long transfers run as long as bytes keep moving.
#[derive(Debug)]
pub struct IdleTimeout<S> {
    inner: S,
    idle: Option<Duration>,
    stall: Option<Duration>,
    read_timer: Option<Pin<Box<Sleep>>>,
    write_timer: Option<Pin<Box<Sleep>>>,
}

impl<S> IdleTimeout<S> {
    /// Zero durations disable the matching deadline
    pub fn new(inner: S, idle: Duration, stall: Duration) -> Self {
        Self {
            inner,
            idle: (!idle.is_zero()).then_some(idle),
            stall: (!stall.is_zero()).then_some(stall),
            read_timer: None,
            write_timer: None,
        }
    }
}

/// Arm `timer` on first use and report whether it has fired
fn expired(timer: &mut Option<Pin<Box<Sleep>>>, limit: Option<Duration>, cx: &mut Context<'_>) -> bool {
    let Some(limit) = limit else {
        return false;
    };
    timer
        .get_or_insert_with(|| Box::pin(sleep(limit)))
        .as_mut()
        .poll(cx)
        .is_ready()
}

fn timed_out(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, format!("{what} timed out"))
}

impl<S: AsyncRead + Unpin> AsyncRead for IdleTimeout<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Pending => {
                if expired(&mut this.read_timer, this.idle, cx) {
                    this.read_timer = None;
                    Poll::Ready(Err(timed_out("idle connection")))
                } else {
                    Poll::Pending
                }
            }
            ready => {
                this.read_timer = None;
                ready
            }
        }
    }
}

impl<S: AsyncWrite + Unpin> IdleTimeout<S> {
    fn after_write<T>(&mut self, poll: Poll<io::Result<T>>, cx: &mut Context<'_>) -> Poll<io::Result<T>> {
        if poll.is_pending() {
            if expired(&mut self.write_timer, self.stall, cx) {
                self.write_timer = None;
                return Poll::Ready(Err(timed_out("write")));
            }
            return Poll::Pending;
        }
        self.write_timer = None;
        poll
    }

    fn after_send(&mut self, poll: Poll<io::Result<usize>>, cx: &mut Context<'_>) -> Poll<io::Result<usize>> {
        // Bytes going out count as activity for the read side too
        if matches!(&poll, Poll::Ready(Ok(n)) if *n > 0) {
            self.read_timer = None;
        }
        self.after_write(poll, cx)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for IdleTimeout<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        this.after_send(poll, cx)
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write_vectored(cx, bufs);
        this.after_send(poll, cx)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_flush(cx);
        this.after_write(poll, cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
