//! Hand-off between the thread reading the headset stream and the decision loop.
//!
//! The reader never waits on the loop: when the loop falls behind (a slow vehicle
//! acknowledgment, say) the oldest buffered frames are dropped, since only the
//! latest trend matters to the smoother.

use crossbeam_channel::{Receiver, Sender, TrySendError};

/// Producer end of a bounded channel that evicts its oldest item instead of blocking.
/// Dropping it closes the channel; the consumer drains what is left and then stops.
pub struct FrameQueue<T> {
    sender: Sender<T>,
    // Kept by the producer so it can evict from the front of a full channel.
    overflow: Receiver<T>,
    dropped: u64,
}

impl<T> FrameQueue<T> {
    /// Returns the producer end and the consumer's receiver.
    pub fn bounded(capacity: usize) -> (Self, Receiver<T>) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity.max(1));
        let queue = FrameQueue {
            sender,
            overflow: receiver.clone(),
            dropped: 0,
        };
        (queue, receiver)
    }

    /// Queues `item`, dropping the oldest queued item when full.
    pub fn push(&mut self, item: T) {
        let mut item = item;
        loop {
            match self.sender.try_send(item) {
                Ok(()) => return,
                Err(TrySendError::Full(back)) => {
                    if self.overflow.try_recv().is_ok() {
                        self.dropped += 1;
                        if self.dropped.is_power_of_two() {
                            log::warn!(
                                "Decision loop falling behind, {} frames dropped so far",
                                self.dropped
                            );
                        }
                    }
                    item = back;
                }
                // `overflow` keeps the channel connected for as long as `self` lives.
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.sender.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }
}
