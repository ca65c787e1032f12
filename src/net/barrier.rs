use log::trace;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{NetErr, Result},
    pending::PendingSet,
};

/// Waits until every unit of the network has reported exactly one finished cycle.
///
/// Reports are kept across a dropped `wait`, a round only resets once it completes.
pub(super) struct CompletionBarrier {
    completions: mpsc::Receiver<usize>,
    pending: PendingSet,
    rounds: u64,
}

impl CompletionBarrier {
    /// Creates a new `CompletionBarrier`.
    ///
    /// # Arguments
    /// * `completions` - The channel every unit reports its ordinal on.
    /// * `units` - The amount of units in the network.
    ///
    /// # Returns
    /// A new `CompletionBarrier` instance.
    pub fn new(completions: mpsc::Receiver<usize>, units: usize) -> Self {
        Self {
            completions,
            pending: PendingSet::new(units),
            rounds: 0,
        }
    }

    /// Blocks until one report per unit arrived.
    ///
    /// # Returns
    /// `Halted` if the network is cancelled first or a `Barrier` error if a unit reported twice.
    pub async fn wait(&mut self, token: &CancellationToken) -> Result<()> {
        while !self.pending.is_complete() {
            let ordinal = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(NetErr::Halted),
                msg = self.completions.recv() => msg.ok_or(NetErr::Halted)?,
            };

            if let Err(e) = self.pending.take(ordinal) {
                token.cancel();
                return Err(NetErr::Barrier(e));
            }
        }

        self.pending.reset();
        self.rounds += 1;
        trace!("barrier round {} complete", self.rounds);
        Ok(())
    }

    /// The amount of rounds completed so far.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pending::PendingErr;
    use futures::FutureExt;

    #[tokio::test]
    async fn completes_once_every_unit_reported() {
        let (tx, rx) = mpsc::channel(3);
        let token = CancellationToken::new();
        let mut barrier = CompletionBarrier::new(rx, 3);

        for round in 1..=2 {
            for ordinal in [2, 0, 1] {
                tx.send(ordinal).await.unwrap();
            }
            barrier.wait(&token).await.unwrap();
            assert_eq!(barrier.rounds(), round);
        }
    }

    #[tokio::test]
    async fn dropped_wait_keeps_the_reports() {
        let (tx, rx) = mpsc::channel(3);
        let token = CancellationToken::new();
        let mut barrier = CompletionBarrier::new(rx, 3);

        tx.send(0).await.unwrap();
        tx.send(2).await.unwrap();
        assert!(barrier.wait(&token).now_or_never().is_none());

        tx.send(1).await.unwrap();
        barrier.wait(&token).await.unwrap();
        assert_eq!(barrier.rounds(), 1);
    }

    #[tokio::test]
    async fn duplicate_report_cancels_the_network() {
        let (tx, rx) = mpsc::channel(3);
        let token = CancellationToken::new();
        let mut barrier = CompletionBarrier::new(rx, 3);

        tx.send(1).await.unwrap();
        tx.send(1).await.unwrap();

        assert_eq!(
            barrier.wait(&token).await,
            Err(NetErr::Barrier(PendingErr::Duplicate { slot: 1 }))
        );
        assert!(token.is_cancelled());
        assert_eq!(barrier.rounds(), 0);
    }

    #[tokio::test]
    async fn cancellation_halts_the_wait() {
        let (_tx, rx) = mpsc::channel(1);
        let token = CancellationToken::new();
        let mut barrier = CompletionBarrier::new(rx, 1);

        token.cancel();
        assert_eq!(barrier.wait(&token).await, Err(NetErr::Halted));
    }
}
