use std::thread;
use std::time::Instant;

use crate::command::Command;
use crate::config::PilotConfig;
use crate::error::{SinkError, StreamError};
use crate::flight::{FlightState, FlightStateMachine, Thresholds};
use crate::queue::FrameQueue;
use crate::recorder::Recorder;
use crate::sink::CommandSink;
use crate::smoother::{AxisSmoother, Sample};
use crate::stream::{LabelsFrame, MotionFrame, StreamFrame, StreamHandler, StreamSource, dispatch};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PilotStats {
    pub samples: u64,
    pub rejected_frames: u64,
    pub commands: u64,
    pub failed_dispatches: u64,
    pub dropped_frames: u64,
}

/// Owns the whole decision path for one vehicle: smoother, state machine and sink.
pub struct Pilot<S: CommandSink> {
    smoother: AxisSmoother,
    flight: FlightStateMachine,
    sink: S,
    motion_offsets: [usize; 3],
    recorder: Option<Recorder>,
    stats: PilotStats,
}

impl<S: CommandSink> Pilot<S> {
    pub fn new(config: &PilotConfig, sink: S) -> Self {
        Pilot {
            smoother: AxisSmoother::new(config.window_capacity, config.rounding_decimals),
            flight: FlightStateMachine::new(Thresholds::from(config)),
            sink,
            motion_offsets: config.motion_offsets,
            recorder: None,
            stats: PilotStats::default(),
        }
    }

    pub fn with_recorder(mut self, recorder: Recorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Puts the vehicle into command mode.
    pub fn initialize(&mut self) -> Result<(), SinkError> {
        self.sink.send(&Command::Initialize)?;
        log::info!("Vehicle accepted command mode");
        Ok(())
    }

    pub fn state(&self) -> FlightState {
        self.flight.state()
    }

    pub fn stats(&self) -> &PilotStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn motion_offsets(&self) -> [usize; 3] {
        self.motion_offsets
    }

    /// Smooths one sample, decides, and dispatches whatever was decided. Returns the
    /// decided commands whether or not the vehicle acknowledged them.
    pub fn on_motion_sample(&mut self, sample: Sample, now: Instant) -> Vec<Command> {
        self.stats.samples += 1;
        let signal = match self.smoother.ingest(sample) {
            Ok(signal) => signal,
            Err(e) => {
                log::warn!("Skipping sample: {}", e);
                return Vec::new();
            }
        };
        let commands = self.flight.decide(&signal, now);

        for command in &commands {
            self.send(command);
        }
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.record(&signal, self.flight.state(), &commands);
        }
        commands
    }

    /// Handles one item from the stream. Bad frames are counted and skipped.
    pub fn handle(&mut self, frame: Result<StreamFrame, StreamError>) {
        match frame {
            Ok(frame) => dispatch(&frame, self),
            Err(e) => self.reject(&e),
        }
    }

    // The state machine has already moved on; a failed send is reported, not undone.
    fn send(&mut self, command: &Command) {
        self.stats.commands += 1;
        match self.sink.send(command) {
            Ok(()) => log::info!("Sent `{}`, now {}", command, self.flight.state().name()),
            Err(e) => {
                self.stats.failed_dispatches += 1;
                log::error!(
                    "Failed to send `{}`: {}. Assuming {} anyway",
                    command,
                    e,
                    self.flight.state().name()
                );
            }
        }
    }

    fn reject(&mut self, error: &StreamError) {
        self.stats.rejected_frames += 1;
        log::warn!("Skipping frame: {}", error);
    }
}

impl<S: CommandSink> StreamHandler for Pilot<S> {
    fn on_motion(&mut self, frame: &MotionFrame) {
        match frame.sample(self.motion_offsets) {
            Ok(sample) => {
                self.on_motion_sample(sample, Instant::now());
            }
            Err(e) => self.reject(&e),
        }
    }

    fn on_labels(&mut self, labels: &LabelsFrame) {
        log::info!("{} labels are: {:?}", labels.stream, labels.labels);
        if let Some(offsets) = labels.motion_offsets() {
            if offsets != self.motion_offsets {
                log::info!(
                    "Motion axes moved from {:?} to {:?}",
                    self.motion_offsets,
                    offsets
                );
                self.motion_offsets = offsets;
            }
        }
    }
}

/// Runs `pilot` until `source` ends. The source is read on its own thread so a slow
/// vehicle never stalls the stream; frames are processed one at a time, in order.
pub fn fly<Src, S>(mut source: Src, pilot: &mut Pilot<S>, queue_capacity: usize)
where
    Src: StreamSource + Send,
    S: CommandSink,
{
    let (mut queue, frames) = FrameQueue::bounded(queue_capacity);

    let dropped = thread::scope(|scope| {
        // Dropping `queue` at the end of this thread ends the consumer loop below.
        let reader = scope.spawn(move || {
            while let Some(frame) = source.next_frame() {
                queue.push(frame);
            }
            queue.dropped()
        });

        for frame in frames.iter() {
            pilot.handle(frame);
        }
        reader.join().unwrap_or_else(|_| {
            log::error!("Stream reader thread panicked");
            0
        })
    });

    pilot.stats.dropped_frames = dropped;
    if let Some(recorder) = pilot.recorder.as_mut() {
        if let Err(e) = recorder.flush() {
            log::error!("Failed to flush {}: {}", recorder.path().display(), e);
        }
    }
}
