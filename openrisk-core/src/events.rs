//! Scan event sink: a single writer thread draining a multi-producer
//! channel, so structured events never interleave across detectors.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::thread::JoinHandle;
use tracing::info;

#[derive(Debug, Clone)]
pub enum ScanEvent {
    ScanStart { detector_count: usize },
    DetectorComplete { name: String, span_count: usize },
    DetectorFailed { name: String, reason: String },
    ScanComplete { total_spans: usize, degraded: bool },
}

/// A multi-producer sink whose single consumer thread logs every event
/// through `tracing`, serializing output regardless of how many
/// detector threads are emitting concurrently.
pub struct EventSink {
    sender: Sender<ScanEvent>,
    writer: Option<JoinHandle<()>>,
}

impl EventSink {
    pub fn new() -> Self {
        let (sender, receiver): (Sender<ScanEvent>, Receiver<ScanEvent>) = unbounded();
        let writer = std::thread::spawn(move || {
            while let Ok(event) = receiver.recv() {
                log_event(&event);
            }
        });
        EventSink { sender, writer: Some(writer) }
    }

    /// Forwards every event to a caller-supplied sink, in addition to
    /// the usual `tracing` logging -- the orchestrator's "emits
    /// structured events to a caller-supplied sink" contract. The
    /// writer thread is still the single point draining the internal
    /// multi-producer channel, so events from concurrent detectors
    /// reach `external` one at a time, never interleaved.
    pub fn with_external(external: Sender<ScanEvent>) -> Self {
        let (sender, receiver): (Sender<ScanEvent>, Receiver<ScanEvent>) = unbounded();
        let writer = std::thread::spawn(move || {
            while let Ok(event) = receiver.recv() {
                log_event(&event);
                let _ = external.send(event);
            }
        });
        EventSink { sender, writer: Some(writer) }
    }

    pub fn handle(&self) -> Sender<ScanEvent> {
        self.sender.clone()
    }

    pub fn emit(&self, event: ScanEvent) {
        let _ = self.sender.send(event);
    }
}

impl Drop for EventSink {
    fn drop(&mut self) {
        // Dropping the last sender clone closes the channel, which lets
        // the writer thread's `recv()` loop exit on its own.
        if let Some(handle) = self.writer.take() {
            let _ = handle.join();
        }
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}

fn log_event(event: &ScanEvent) {
    match event {
        ScanEvent::ScanStart { detector_count } => info!(detector_count, "scan_start"),
        ScanEvent::DetectorComplete { name, span_count } => info!(name, span_count, "detector_complete"),
        ScanEvent::DetectorFailed { name, reason } => tracing::warn!(name, reason, "detector_failed"),
        ScanEvent::ScanComplete { total_spans, degraded } => info!(total_spans, degraded, "scan_complete"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_accepts_events_without_panicking() {
        let sink = EventSink::new();
        sink.emit(ScanEvent::ScanStart { detector_count: 3 });
        sink.emit(ScanEvent::ScanComplete { total_spans: 10, degraded: false });
    }

    #[test]
    fn external_sink_receives_forwarded_events() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let sink = EventSink::with_external(tx);
        sink.emit(ScanEvent::ScanStart { detector_count: 2 });
        drop(sink);
        let received = rx.recv().unwrap();
        assert!(matches!(received, ScanEvent::ScanStart { detector_count: 2 }));
    }
}
