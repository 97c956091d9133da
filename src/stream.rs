//! Incoming side: headset frames, decoded into one variant per data category.
//!
//! Frames arrive as JSON objects, one per line, in the shape the headset service
//! publishes them: `{"mot": [...], "time": 1627457508.2588}` for motion,
//! `{"streamName": "mot", "labels": [...]}` for the column labels, and so on.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::{BufRead, ErrorKind};

use crate::error::StreamError;
use crate::smoother::Sample;

/// Labels of the three accelerometer axes in the motion stream.
pub const MOTION_AXIS_LABELS: [&str; 3] = ["ACCX", "ACCY", "ACCZ"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelsFrame {
    #[serde(rename = "streamName")]
    pub stream: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MotionFrame {
    #[serde(rename = "mot")]
    pub values: Vec<Value>,
    #[serde(default)]
    pub time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceFrame {
    #[serde(default)]
    pub signal: Option<f64>,
    #[serde(rename = "dev")]
    pub contact_quality: Vec<Value>,
    #[serde(default, rename = "batteryPercent")]
    pub battery_percent: Option<f64>,
    #[serde(default)]
    pub time: Option<f64>,
}

/// Values of a stream the pilot only logs (EEG, performance metrics, band power).
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub values: Vec<Value>,
    pub time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    Labels(LabelsFrame),
    Motion(MotionFrame),
    Eeg(Series),
    Device(DeviceFrame),
    Metrics(Series),
    Power(Series),
    Error(Value),
}

impl StreamFrame {
    pub fn from_json(line: &str) -> Result<Self, StreamError> {
        let mut map = match serde_json::from_str::<Value>(line)? {
            Value::Object(map) => map,
            _ => return Err(StreamError::UnknownFrame),
        };

        if map.contains_key("labels") {
            return Ok(StreamFrame::Labels(LabelsFrame::deserialize(Value::Object(map))?));
        }
        if let Some(error) = map.remove("error") {
            return Ok(StreamFrame::Error(error));
        }
        if map.contains_key("mot") {
            return Ok(StreamFrame::Motion(MotionFrame::deserialize(Value::Object(map))?));
        }
        if map.contains_key("dev") {
            return Ok(StreamFrame::Device(DeviceFrame::deserialize(Value::Object(map))?));
        }
        if map.contains_key("eeg") {
            return Ok(StreamFrame::Eeg(series(map, "eeg")?));
        }
        if map.contains_key("met") {
            return Ok(StreamFrame::Metrics(series(map, "met")?));
        }
        if map.contains_key("pow") {
            return Ok(StreamFrame::Power(series(map, "pow")?));
        }
        Err(StreamError::UnknownFrame)
    }

    pub fn name(&self) -> &'static str {
        match self {
            StreamFrame::Labels(_) => "labels",
            StreamFrame::Motion(_) => "mot",
            StreamFrame::Eeg(_) => "eeg",
            StreamFrame::Device(_) => "dev",
            StreamFrame::Metrics(_) => "met",
            StreamFrame::Power(_) => "pow",
            StreamFrame::Error(_) => "error",
        }
    }
}

fn series(mut map: Map<String, Value>, key: &str) -> Result<Series, StreamError> {
    let time = map.get("time").and_then(Value::as_f64);
    let values = serde_json::from_value(map.remove(key).unwrap_or(Value::Null))?;
    Ok(Series { values, time })
}

impl MotionFrame {
    /// Reads the x, y and z accelerations at `offsets`.
    pub fn sample(&self, offsets: [usize; 3]) -> Result<Sample, StreamError> {
        let mut axes = [0f32; 3];
        for (axis, offset) in axes.iter_mut().zip(offsets) {
            let value = self.values.get(offset).ok_or(StreamError::MissingAxis {
                offset,
                len: self.values.len(),
            })?;
            *axis = value
                .as_f64()
                .map(|v| v as f32)
                .filter(|v| v.is_finite())
                .ok_or(StreamError::NonFinite { offset })?;
        }
        Ok(Sample::new(axes[0], axes[1], axes[2]))
    }
}

impl LabelsFrame {
    /// Positions of ACCX, ACCY and ACCZ, if this frame labels the motion stream and has all three.
    pub fn motion_offsets(&self) -> Option<[usize; 3]> {
        if self.stream != "mot" {
            return None;
        }
        let position = |name: &str| self.labels.iter().position(|label| label == name);
        Some([
            position(MOTION_AXIS_LABELS[0])?,
            position(MOTION_AXIS_LABELS[1])?,
            position(MOTION_AXIS_LABELS[2])?,
        ])
    }
}

/// One method per data category. Only motion feeds the flight logic; the rest is
/// logged unless an implementor cares.
pub trait StreamHandler {
    fn on_motion(&mut self, frame: &MotionFrame);

    fn on_labels(&mut self, labels: &LabelsFrame) {
        log::info!("{} labels are: {:?}", labels.stream, labels.labels);
    }

    fn on_eeg(&mut self, series: &Series) {
        log::debug!("eeg data: {:?}", series.values);
    }

    fn on_device(&mut self, device: &DeviceFrame) {
        log::debug!(
            "dev data: signal {:?}, battery {:?}%",
            device.signal,
            device.battery_percent
        );
    }

    fn on_metrics(&mut self, series: &Series) {
        log::debug!("met data: {:?}", series.values);
    }

    fn on_power(&mut self, series: &Series) {
        log::debug!("pow data: {:?}", series.values);
    }

    fn on_error(&mut self, error: &Value) {
        log::warn!("headset service reported an error: {}", error);
    }
}

pub fn dispatch<H: StreamHandler + ?Sized>(frame: &StreamFrame, handler: &mut H) {
    match frame {
        StreamFrame::Labels(labels) => handler.on_labels(labels),
        StreamFrame::Motion(motion) => handler.on_motion(motion),
        StreamFrame::Eeg(series) => handler.on_eeg(series),
        StreamFrame::Device(device) => handler.on_device(device),
        StreamFrame::Metrics(series) => handler.on_metrics(series),
        StreamFrame::Power(series) => handler.on_power(series),
        StreamFrame::Error(error) => handler.on_error(error),
    }
}

pub trait StreamSource {
    /// The next frame, an error for a frame that could not be read, or `None` once the
    /// stream has ended. An error does not end the stream.
    fn next_frame(&mut self) -> Option<Result<StreamFrame, StreamError>>;
}

impl<S: StreamSource + ?Sized> StreamSource for Box<S> {
    fn next_frame(&mut self) -> Option<Result<StreamFrame, StreamError>> {
        (**self).next_frame()
    }
}

/// Frames from any line-oriented reader, such as stdin or a recorded session.
/// Reads one JSON frame per line. Undecodable lines come back as errors and are
/// skipped over; any other read failure is reported once and ends the stream.
pub struct JsonLinesSource<R> {
    reader: R,
    line: String,
    finished: bool,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        JsonLinesSource {
            reader,
            line: String::new(),
            finished: false,
        }
    }
}

impl<R: BufRead> StreamSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Option<Result<StreamFrame, StreamError>> {
        if self.finished {
            return None;
        }
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => {
                    self.finished = true;
                    return None;
                }
                Ok(_) if self.line.trim().is_empty() => continue,
                Ok(_) => return Some(StreamFrame::from_json(self.line.trim())),
                // The offending line has been consumed; carry on with the next one.
                Err(e) if e.kind() == ErrorKind::InvalidData => return Some(Err(e.into())),
                Err(e) => {
                    log::error!("Stream read failed, ending stream: {}", e);
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}
