//! Bounded scan queue
//!
//! FIFO between the capture loop and the dispatcher.
//! - `send` blocks while the queue is full (backpressure, never drops)
//! - `recv` blocks while it is empty
//! - closing the sender lets the receiver drain what is left, then end

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use crate::scan::Scan;

/// Create a queue holding up to `capacity` pending scans
pub fn scan_queue(capacity: usize) -> (ScanSender, ScanReceiver) {
    let (tx, rx) = sync_channel(capacity);
    (ScanSender { tx }, ScanReceiver { rx })
}

/// Producer half (owned by the capture loop)
pub struct ScanSender {
    tx: SyncSender<Scan>,
}

impl ScanSender {
    /// Enqueue, blocking while the queue is full
    ///
    /// Returns the scan back if the dispatcher has gone away.
    pub fn send(&self, scan: Scan) -> Result<(), Scan> {
        self.tx.send(scan).map_err(|e| e.0)
    }

    /// Close the queue; consuming self makes a second close impossible
    pub fn close(self) {
        drop(self);
    }
}

/// Consumer half (owned by the dispatcher)
pub struct ScanReceiver {
    rx: Receiver<Scan>,
}

impl ScanReceiver {
    /// Dequeue, blocking while empty
    ///
    /// Returns None once the sender is closed and the queue is drained.
    pub fn recv(&self) -> Option<Scan> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let (tx, rx) = scan_queue(8);
        for id in [5, 3, 9] {
            tx.send(Scan::now(id)).unwrap();
        }
        tx.close();
        let ids: Vec<u64> = std::iter::from_fn(|| rx.recv()).map(|s| s.id()).collect();
        assert_eq!(ids, vec![5, 3, 9]);
    }

    #[test]
    fn test_close_drains_before_ending() {
        let (tx, rx) = scan_queue(4);
        tx.send(Scan::now(1)).unwrap();
        tx.send(Scan::now(2)).unwrap();
        tx.close();
        assert_eq!(rx.recv().map(|s| s.id()), Some(1));
        assert_eq!(rx.recv().map(|s| s.id()), Some(2));
        assert!(rx.recv().is_none());
    }

    #[test]
    fn test_full_queue_blocks_producer() {
        let (tx, rx) = scan_queue(1);
        let (done_tx, done_rx) = mpsc::channel();

        let producer = thread::spawn(move || {
            for id in 0..3 {
                tx.send(Scan::now(id)).expect("receiver alive");
                done_tx.send(id).expect("done");
            }
        });

        // Only the first scan fits
        assert_eq!(done_rx.recv_timeout(Duration::from_secs(1)).unwrap(), 0);
        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());

        // Freeing a slot unblocks the producer; nothing is dropped
        let mut ids = Vec::new();
        while let Some(scan) = rx.recv() {
            ids.push(scan.id());
        }
        assert_eq!(ids, vec![0, 1, 2]);
        producer.join().expect("producer panicked");
    }

    #[test]
    fn test_send_fails_after_receiver_dropped() {
        let (tx, rx) = scan_queue(1);
        drop(rx);
        let result = tx.send(Scan::now(7));
        assert_eq!(result.map_err(|s| s.id()), Err(7));
    }

    #[test]
    fn test_recv_unblocks_on_close() {
        let (tx, rx) = scan_queue(1);
        let (done_tx, done_rx) = mpsc::channel();
        let consumer = thread::spawn(move || {
            done_tx.send(rx.recv().is_none()).expect("done");
        });
        thread::sleep(Duration::from_millis(20));
        tx.close();
        assert!(done_rx.recv_timeout(Duration::from_secs(1)).unwrap());
        consumer.join().expect("consumer panicked");
    }
}
