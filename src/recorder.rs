//! This module simply records every processed motion sample to a csv file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::command::Command;
use crate::flight::FlightState;
use crate::smoother::SmoothedSignal;

pub struct Recorder {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl Recorder {
    /// Creates `<dir>/<YYYY-MM-DD_HH-MM-SS>.csv`, creating `dir` if needed.
    pub fn create(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "{}.csv",
            chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S")
        ));

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let mut recorder = Recorder {
            writer: BufWriter::new(file),
            path,
        };
        recorder.write_headers()?;
        Ok(recorder)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_headers(&mut self) -> io::Result<()> {
        writeln!(
            self.writer,
            "timestamp,state,raw_x,raw_y,raw_z,x,y,z,commands"
        )
    }

    /// Appends one row. Commands issued on the tick are joined with `;`.
    pub fn record(&mut self, signal: &SmoothedSignal, state: FlightState, commands: &[Command]) {
        let commands = commands
            .iter()
            .map(Command::to_string)
            .collect::<Vec<_>>()
            .join(";");
        if let Err(e) = writeln!(
            self.writer,
            "{},{},{},{},{},{},{},{},{}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            state.as_char(),
            signal.raw[0],
            signal.raw[1],
            signal.raw[2],
            signal.x,
            signal.y,
            signal.z,
            commands
        ) {
            log::error!("Failed to write to {}: {}", self.path.display(), e);
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Direction;

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = Recorder::create(dir.path().join("flights")).unwrap();
        let path = recorder.path().to_path_buf();

        let signal = SmoothedSignal::new(0.1, 0.3, -0.6);
        recorder.record(&signal, FlightState::Airborne, &[]);
        recorder.record(
            &signal,
            FlightState::Airborne,
            &[
                Command::movement(Direction::Back, 40),
                Command::movement(Direction::Left, 40),
            ],
        );
        recorder.flush().unwrap();

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,state,raw_x,raw_y,raw_z,x,y,z,commands");
        assert!(lines[1].ends_with(",A,0.1,0.3,-0.6,0.1,0.3,-0.6,"));
        assert!(lines[2].ends_with(",back 40;left 40"));
    }
}
