//! Outgoing side: anything that accepts a command and acknowledges it.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use serialport::SerialPort;

use crate::command::Command;
use crate::error::SinkError;

pub trait CommandSink {
    /// Sends one command and waits for the vehicle's acknowledgment.
    fn send(&mut self, command: &Command) -> Result<(), SinkError>;
}

impl<S: CommandSink + ?Sized> CommandSink for Box<S> {
    fn send(&mut self, command: &Command) -> Result<(), SinkError> {
        (**self).send(command)
    }
}

/// Accepts `ok` as success, anything else as a rejection of `command`.
fn check_reply(command: &Command, reply: &str) -> Result<(), SinkError> {
    let reply = reply.trim();
    if reply.eq_ignore_ascii_case("ok") {
        Ok(())
    } else {
        Err(SinkError::Rejected {
            command: command.to_string(),
            reply: reply.to_string(),
        })
    }
}

/// Text commands over UDP, one datagram per command, one datagram back.
pub struct UdpSink {
    socket: UdpSocket,
    vehicle: SocketAddr,
    ack_timeout: Duration,
}

impl UdpSink {
    pub fn new(address: &str, ack_timeout: Duration) -> Result<Self, SinkError> {
        let vehicle = address.to_socket_addrs()?.next().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} did not resolve to an address", address),
            )
        })?;
        let local = if vehicle.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(local)?;
        Ok(UdpSink {
            socket,
            vehicle,
            ack_timeout,
        })
    }

    /// Throws away anything already queued, such as a reply that arrived after
    /// an earlier command timed out.
    fn discard_stale(&self, buffer: &mut [u8]) -> Result<(), SinkError> {
        self.socket.set_nonblocking(true)?;
        let drained = loop {
            match self.socket.recv_from(buffer) {
                Ok((bytes_read, from)) => log::debug!(
                    "Discarding stale {:?} from {}",
                    String::from_utf8_lossy(&buffer[..bytes_read]),
                    from
                ),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        self.socket.set_nonblocking(false)?;
        drained?;
        Ok(())
    }
}

impl CommandSink for UdpSink {
    fn send(&mut self, command: &Command) -> Result<(), SinkError> {
        let mut buffer = [0u8; 512];
        self.discard_stale(&mut buffer)?;
        self.socket
            .send_to(command.to_string().as_bytes(), self.vehicle)?;

        let deadline = Instant::now() + self.ack_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("no reply to `{}` within {:?}", command, self.ack_timeout),
                )
                .into());
            }
            self.socket.set_read_timeout(Some(remaining))?;
            let (bytes_read, from) = self.socket.recv_from(&mut buffer)?;
            // Stray datagrams from other hosts are not acknowledgments.
            if from == self.vehicle {
                return check_reply(command, &String::from_utf8_lossy(&buffer[..bytes_read]));
            }
            log::debug!("Ignoring {} bytes from {}", bytes_read, from);
        }
    }
}

/// Text commands over a serial link, newline terminated, one reply line per command.
pub struct SerialSink {
    port: BufReader<Box<dyn SerialPort>>,
}

impl SerialSink {
    pub fn new(path: &str, baud_rate: u32, ack_timeout: Duration) -> Result<Self, SinkError> {
        let port = serialport::new(path, baud_rate)
            .timeout(ack_timeout)
            .open()?;
        Ok(SerialSink {
            port: BufReader::new(port),
        })
    }
}

impl CommandSink for SerialSink {
    fn send(&mut self, command: &Command) -> Result<(), SinkError> {
        let output = format!("{}\n", command);
        self.port.get_mut().write_all(output.as_bytes())?;
        self.port.get_mut().flush()?;

        let mut reply = String::new();
        self.port.read_line(&mut reply)?;
        check_reply(command, &reply)
    }
}

/// Logs commands instead of flying anything. Keeps every command it was handed.
#[derive(Default)]
pub struct DryRunSink {
    sent: Vec<Command>,
}

impl DryRunSink {
    pub fn new() -> Self {
        DryRunSink::default()
    }

    pub fn sent(&self) -> &[Command] {
        &self.sent
    }
}

impl CommandSink for DryRunSink {
    fn send(&mut self, command: &Command) -> Result<(), SinkError> {
        log::info!("[dry run] {}", command);
        self.sent.push(*command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Direction;
    use std::thread;

    #[test]
    fn reply_ok_is_accepted_case_insensitively() {
        assert!(check_reply(&Command::Takeoff, "ok").is_ok());
        assert!(check_reply(&Command::Takeoff, "OK\r\n").is_ok());
    }

    #[test]
    fn any_other_reply_is_a_rejection() {
        let err = check_reply(&Command::Land, "error Not joystick").unwrap_err();
        match err {
            SinkError::Rejected { command, reply } => {
                assert_eq!(command, "land");
                assert_eq!(reply, "error Not joystick");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn dry_run_records_commands() {
        let mut sink = DryRunSink::new();
        sink.send(&Command::Takeoff).unwrap();
        sink.send(&Command::movement(Direction::Left, 40)).unwrap();
        assert_eq!(
            sink.sent(),
            &[Command::Takeoff, Command::movement(Direction::Left, 40)]
        );
    }

    #[test]
    fn udp_sink_round_trips_with_a_fake_vehicle() {
        let vehicle = UdpSocket::bind("127.0.0.1:0").unwrap();
        let address = vehicle.local_addr().unwrap().to_string();

        let handle = thread::spawn(move || {
            let mut buffer = [0u8; 64];
            let mut received = Vec::new();
            for reply in ["ok", "error"] {
                let (n, from) = vehicle.recv_from(&mut buffer).unwrap();
                received.push(String::from_utf8_lossy(&buffer[..n]).to_string());
                vehicle.send_to(reply.as_bytes(), from).unwrap();
            }
            received
        });

        let mut sink = UdpSink::new(&address, Duration::from_secs(2)).unwrap();
        assert!(sink.send(&Command::Initialize).is_ok());
        assert!(matches!(
            sink.send(&Command::Takeoff),
            Err(SinkError::Rejected { .. })
        ));
        assert_eq!(handle.join().unwrap(), vec!["command", "takeoff"]);
    }

    #[test]
    fn udp_sink_times_out_without_a_reply() {
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let address = silent.local_addr().unwrap().to_string();
        let mut sink = UdpSink::new(&address, Duration::from_millis(50)).unwrap();
        assert!(matches!(sink.send(&Command::Land), Err(SinkError::Io(_))));
    }

    #[test]
    fn late_reply_is_not_taken_for_the_next_acknowledgment() {
        let vehicle = UdpSocket::bind("127.0.0.1:0").unwrap();
        let address = vehicle.local_addr().unwrap().to_string();
        let mut sink = UdpSink::new(&address, Duration::from_millis(50)).unwrap();

        assert!(matches!(sink.send(&Command::Land), Err(SinkError::Io(_))));

        // The vehicle answers the timed-out command only now.
        let mut buffer = [0u8; 64];
        let (n, from) = vehicle.recv_from(&mut buffer).unwrap();
        assert_eq!(&buffer[..n], b"land");
        vehicle.send_to(b"ok", from).unwrap();

        let handle = thread::spawn(move || {
            let mut buffer = [0u8; 64];
            let (n, from) = vehicle.recv_from(&mut buffer).unwrap();
            vehicle.send_to(b"error", from).unwrap();
            String::from_utf8_lossy(&buffer[..n]).to_string()
        });

        sink.ack_timeout = Duration::from_secs(2);
        assert!(matches!(
            sink.send(&Command::Takeoff),
            Err(SinkError::Rejected { .. })
        ));
        assert_eq!(handle.join().unwrap(), "takeoff");
    }

    #[test]
    fn stray_traffic_does_not_extend_the_wait() {
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let address = silent.local_addr().unwrap().to_string();
        let mut sink = UdpSink::new(&address, Duration::from_millis(100)).unwrap();
        let target = sink.socket.local_addr().unwrap();

        let stray = UdpSocket::bind("127.0.0.1:0").unwrap();
        let handle = thread::spawn(move || {
            for _ in 0..200 {
                let _ = stray.send_to(b"ok", target);
                thread::sleep(Duration::from_millis(10));
            }
        });

        let started = Instant::now();
        assert!(matches!(sink.send(&Command::Land), Err(SinkError::Io(_))));
        assert!(started.elapsed() < Duration::from_secs(1));
        handle.join().unwrap();
    }
}
