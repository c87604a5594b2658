use std::time::Instant;

use bytes::Bytes;
use htsbus_frame::{Command, Expect, FrameReader, FrameWriter, ServoId};
use htsbus_transport::{SerialConfig, SerialTransport, Transport, TransportError};
use tracing::debug;

use crate::config::BusConfig;
use crate::error::{Result, ServoError};

/// A half-duplex servo bus: one line, one transaction at a time.
///
/// The bus starts unconnected. [`connect`](Self::connect) opens a serial
/// port, [`attach`](Self::attach) takes any [`Transport`]. Every protocol
/// operation borrows the bus mutably, so a request and its reply can never
/// interleave with another transaction. Share a bus between threads by
/// wrapping it in a `Mutex`.
pub struct ServoBus {
    transport: Option<Box<dyn Transport>>,
    config: BusConfig,
}

impl ServoBus {
    /// An unconnected bus with default configuration.
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// An unconnected bus with explicit configuration.
    pub fn with_config(config: BusConfig) -> Self {
        Self {
            transport: None,
            config,
        }
    }

    /// Open a serial port and return a connected bus.
    pub fn open(serial: &SerialConfig) -> Result<Self> {
        let mut bus = Self::new();
        bus.connect(serial)?;
        Ok(bus)
    }

    /// Open a serial port for this bus.
    pub fn connect(&mut self, serial: &SerialConfig) -> Result<()> {
        if self.transport.is_some() {
            return Err(ServoError::AlreadyConnected);
        }
        let transport = SerialTransport::open(serial)?;
        self.attach(Box::new(transport))
    }

    /// Use an already open transport for this bus.
    pub fn attach(&mut self, transport: Box<dyn Transport>) -> Result<()> {
        if self.transport.is_some() {
            return Err(ServoError::AlreadyConnected);
        }
        debug!(transport = transport.name(), "servo bus connected");
        self.transport = Some(transport);
        Ok(())
    }

    /// Close the transport. The bus can be connected again afterwards.
    pub fn disconnect(&mut self) -> Result<()> {
        let mut transport = self.transport.take().ok_or(ServoError::NotConnected)?;
        transport.close()?;
        debug!(transport = transport.name(), "servo bus disconnected");
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Name of the attached transport, if any.
    pub fn transport_name(&self) -> Option<&str> {
        self.transport.as_deref().map(|transport| transport.name())
    }

    /// Write one request frame.
    ///
    /// Nothing is read back; writes (and anything sent to broadcast) get no
    /// reply. A failed write is reported with the command attached.
    pub fn send_command(
        &mut self,
        destination: ServoId,
        command: Command,
        payload: &[u8],
    ) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(ServoError::NotConnected)?;
        let mut writer = FrameWriter::new(transport);
        writer
            .send(destination, command, payload)
            .map_err(|err| ServoError::from_frame(Some(command), err))
    }

    /// Block for one reply frame and validate it.
    ///
    /// Polls the line until bytes arrive or the response timeout runs out,
    /// then reads exactly one frame. The reply must come from
    /// `expected_destination` (any sender when that is broadcast) and, when
    /// given, carry `expected_command`. No retry on failure.
    pub fn read_response(
        &mut self,
        expected_destination: ServoId,
        expected_command: Option<Command>,
    ) -> Result<(Command, Bytes)> {
        let transport = self.transport.as_mut().ok_or(ServoError::NotConnected)?;
        wait_for_reply(&**transport, &self.config).map_err(|source| {
            ServoError::Transport {
                command: expected_command,
                source,
            }
        })?;

        let expect = Expect {
            destination: expected_destination,
            command: expected_command,
        };
        let mut reader = FrameReader::new(transport);
        let frame = reader
            .read_frame(&expect)
            .map_err(|err| ServoError::from_frame(expected_command, err))?;
        Ok((frame.command, frame.payload))
    }

    /// Send one request and, for read commands, return the payload of the
    /// matching reply. Write commands get no reply and return an empty
    /// payload. A read sent to broadcast accepts the reply of any servo.
    pub fn transact(
        &mut self,
        destination: ServoId,
        command: Command,
        payload: &[u8],
    ) -> Result<Bytes> {
        self.send_command(destination, command, payload)?;
        if !command.expects_reply() {
            return Ok(Bytes::new());
        }
        let (_, reply) = self.read_response(destination, Some(command))?;
        Ok(reply)
    }
}

impl Default for ServoBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ServoBus {
    fn drop(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(err) = transport.close() {
                debug!(error = %err, "closing transport on drop failed");
            }
        }
    }
}

impl std::fmt::Debug for ServoBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServoBus")
            .field("transport", &self.transport_name())
            .field("config", &self.config)
            .finish()
    }
}

fn wait_for_reply(
    transport: &dyn Transport,
    config: &BusConfig,
) -> std::result::Result<(), TransportError> {
    let started = Instant::now();
    loop {
        if transport.bytes_available()? > 0 {
            return Ok(());
        }
        if let Some(limit) = config.response_timeout {
            if started.elapsed() >= limit {
                return Err(TransportError::Timeout(limit));
            }
        }
        std::thread::sleep(config.poll_interval);
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::time::Duration;

    use bytes::BytesMut;
    use htsbus_frame::{encode_reply, FrameError};
    use htsbus_transport::MemoryTransport;

    use super::*;

    fn id(raw: u8) -> ServoId {
        ServoId::new(raw).unwrap()
    }

    fn connected() -> (ServoBus, MemoryTransport) {
        let line = MemoryTransport::new();
        let mut bus = ServoBus::with_config(BusConfig {
            response_timeout: Some(Duration::from_millis(20)),
            ..BusConfig::default()
        });
        bus.attach(Box::new(line.clone())).unwrap();
        (bus, line)
    }

    fn push_reply(line: &MemoryTransport, source: u8, command: Command, payload: &[u8]) {
        let mut buf = BytesMut::new();
        encode_reply(id(source), command, payload, &mut buf).unwrap();
        line.push_incoming(&buf);
    }

    #[test]
    fn starts_unconnected() {
        let mut bus = ServoBus::new();
        assert!(!bus.is_connected());
        assert!(matches!(
            bus.send_command(id(1), Command::MoveStart, &[]),
            Err(ServoError::NotConnected)
        ));
        assert!(matches!(
            bus.read_response(id(1), None),
            Err(ServoError::NotConnected)
        ));
        assert!(matches!(bus.disconnect(), Err(ServoError::NotConnected)));
    }

    #[test]
    fn attach_twice_rejected() {
        let (mut bus, _line) = connected();
        let result = bus.attach(Box::new(MemoryTransport::new()));
        assert!(matches!(result, Err(ServoError::AlreadyConnected)));
        assert_eq!(bus.transport_name(), Some("memory"));
    }

    #[test]
    fn disconnect_closes_and_allows_reconnect() {
        let (mut bus, line) = connected();
        bus.disconnect().unwrap();

        assert!(line.is_closed());
        assert!(!bus.is_connected());
        assert!(matches!(
            bus.transact(id(1), Command::PosRead, &[]),
            Err(ServoError::NotConnected)
        ));

        bus.attach(Box::new(MemoryTransport::new())).unwrap();
        assert!(bus.is_connected());
    }

    #[test]
    fn drop_closes_transport() {
        let (bus, line) = connected();
        drop(bus);
        assert!(line.is_closed());
    }

    #[test]
    fn send_command_writes_one_frame() {
        let (mut bus, line) = connected();
        bus.send_command(ServoId::BROADCAST, Command::MoveStart, &[])
            .unwrap();

        let written = line.written();
        assert_eq!(written, vec![0x55, 0x55, 0xFE, 0x03, 0x0B, 0xF3]);
    }

    #[test]
    fn send_command_failure_carries_command() {
        let (mut bus, line) = connected();
        line.set_write_failure(Some(ErrorKind::BrokenPipe));

        let err = bus
            .send_command(id(1), Command::MoveStop, &[])
            .unwrap_err();
        assert!(matches!(
            err,
            ServoError::Transport {
                command: Some(Command::MoveStop),
                source: TransportError::Io(_)
            }
        ));
    }

    #[test]
    fn send_command_rejects_payload_size() {
        let (mut bus, line) = connected();
        let err = bus
            .send_command(id(1), Command::IdWrite, &[1, 2])
            .unwrap_err();
        assert!(matches!(
            err,
            ServoError::Protocol {
                source: FrameError::PayloadLength { .. },
                ..
            }
        ));
        assert!(line.written().is_empty());
    }

    #[test]
    fn read_response_returns_command_and_payload() {
        let (mut bus, line) = connected();
        push_reply(&line, 3, Command::VinRead, &[0x30, 0x2A]);

        let (command, payload) = bus.read_response(id(3), None).unwrap();
        assert_eq!(command, Command::VinRead);
        assert_eq!(payload.as_ref(), &[0x30, 0x2A]);
    }

    #[test]
    fn read_response_times_out() {
        let (mut bus, _line) = connected();
        let err = bus
            .read_response(id(1), Some(Command::PosRead))
            .unwrap_err();
        assert!(matches!(
            err,
            ServoError::Transport {
                command: Some(Command::PosRead),
                source: TransportError::Timeout(_)
            }
        ));
    }

    #[test]
    fn truncated_reply_is_transport_error() {
        let (mut bus, line) = connected();
        line.push_incoming(&[0x55, 0x55, 0x01, 0x05]);

        let err = bus
            .read_response(id(1), Some(Command::PosRead))
            .unwrap_err();
        assert!(matches!(err, ServoError::Transport { .. }));
    }

    #[test]
    fn reply_from_other_servo_is_protocol_error() {
        let (mut bus, line) = connected();
        push_reply(&line, 2, Command::TempRead, &[41]);

        let err = bus.transact(id(1), Command::TempRead, &[]).unwrap_err();
        assert!(matches!(
            err,
            ServoError::Protocol {
                source: FrameError::DestinationMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn transact_writes_request_then_reads_reply() {
        let (mut bus, line) = connected();
        push_reply(&line, 1, Command::TempRead, &[41]);

        let payload = bus.transact(id(1), Command::TempRead, &[]).unwrap();
        assert_eq!(payload.as_ref(), &[41]);
        assert_eq!(line.written(), vec![0x55, 0x55, 0x01, 0x03, 0x1A, 0xE1]);
    }

    #[test]
    fn transact_write_reads_nothing() {
        let (mut bus, line) = connected();
        line.push_incoming(&[0xAA]);

        let reply = bus.transact(id(1), Command::LoadWrite, &[1]).unwrap();
        assert!(reply.is_empty());
        assert_eq!(line.bytes_available().unwrap(), 1);
    }

    #[test]
    fn broadcast_read_accepts_any_sender() {
        let (mut bus, line) = connected();
        push_reply(&line, 7, Command::IdRead, &[7]);

        let reply = bus
            .transact(ServoId::BROADCAST, Command::IdRead, &[])
            .unwrap();
        assert_eq!(reply.as_ref(), &[7]);
    }

    #[test]
    fn bus_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ServoBus>();
    }
}
