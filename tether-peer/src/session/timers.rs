use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TimerKind {
    RequestOffer,
    IceGrace,
    Recovery,
    DiagnosticsDetail,
    DiagnosticsStats,
    SourceEnded,
}

impl TimerKind {
    fn is_periodic(self) -> bool {
        matches!(
            self,
            TimerKind::RequestOffer | TimerKind::DiagnosticsDetail | TimerKind::DiagnosticsStats
        )
    }
}

#[derive(Debug)]
pub(crate) struct Wakeup {
    pub kind: TimerKind,
    seq: u64,
}

/// Every background task a session runs, keyed by purpose.
///
/// Tasks only post [`Wakeup`]s to the session; the session decides what to do.
/// A wakeup is honoured only if the task that sent it is still the armed one,
/// so cancelling or re-arming a timer also voids wakeups already in flight.
pub(crate) struct Timers {
    tx: mpsc::UnboundedSender<Wakeup>,
    armed: HashMap<TimerKind, (u64, JoinHandle<()>)>,
    next_seq: u64,
}

impl Timers {
    pub fn new(tx: mpsc::UnboundedSender<Wakeup>) -> Self {
        Self {
            tx,
            armed: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn once(&mut self, kind: TimerKind, delay: Duration) {
        self.arm(kind, move |waker| async move {
            tokio::time::sleep(delay).await;
            waker.fire();
        });
    }

    pub fn every(&mut self, kind: TimerKind, period: Duration) {
        self.arm(kind, move |waker| async move {
            loop {
                tokio::time::sleep(period).await;
                if !waker.fire() {
                    break;
                }
            }
        });
    }

    /// Fires `kind` once `until` completes, whatever the reason. Accepting the
    /// wakeup disarms it, so the handler checks whether the outcome matters.
    pub fn watch<F>(&mut self, kind: TimerKind, until: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.arm(kind, move |waker| async move {
            until.await;
            waker.fire();
        });
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.armed.contains_key(&kind)
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        if let Some((_, handle)) = self.armed.remove(&kind) {
            handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, (_, handle)) in self.armed.drain() {
            handle.abort();
        }
    }

    /// Whether a received wakeup should be acted on. One-shot timers are
    /// disarmed by their (accepted) wakeup.
    pub fn accept(&mut self, wakeup: &Wakeup) -> bool {
        let current = matches!(self.armed.get(&wakeup.kind), Some((seq, _)) if *seq == wakeup.seq);
        if current && !wakeup.kind.is_periodic() {
            self.armed.remove(&wakeup.kind);
        }
        current
    }

    fn arm<B, Fut>(&mut self, kind: TimerKind, body: B)
    where
        B: FnOnce(Waker) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel(kind);

        self.next_seq += 1;
        let waker = Waker {
            tx: self.tx.clone(),
            kind,
            seq: self.next_seq,
        };
        let handle = tokio::spawn(body(waker));

        self.armed.insert(kind, (self.next_seq, handle));
    }
}

struct Waker {
    tx: mpsc::UnboundedSender<Wakeup>,
    kind: TimerKind,
    seq: u64,
}

impl Waker {
    fn fire(&self) -> bool {
        self.tx
            .send(Wakeup {
                kind: self.kind,
                seq: self.seq,
            })
            .is_ok()
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
