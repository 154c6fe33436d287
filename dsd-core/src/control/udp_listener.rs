//! UDP retune listener: binds `INADDR_ANY:<port>`, parses the same 5-byte
//! frame as the RTL-UDP tuner, and invokes a user-supplied callback.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const FRAME_LEN: usize = 5;

/// Parse a datagram into a retune frequency, per the RTL tuner wire
/// layout. Any payload whose first byte isn't `0x00`, or whose length
/// isn't exactly 5 bytes, is ignored.
pub fn parse_frame(datagram: &[u8]) -> Option<u64> {
    if datagram.len() != FRAME_LEN || datagram[0] != 0x00 {
        return None;
    }
    let freq = u32::from_le_bytes([datagram[1], datagram[2], datagram[3], datagram[4]]);
    Some(freq as u64)
}

/// Binds and serves the retune listener until `stop_flag` is set. `on_retune`
/// is called with the parsed frequency for each valid packet.
pub struct UdpControlListener {
    socket: UdpSocket,
    stop_flag: Arc<AtomicBool>,
}

impl UdpControlListener {
    pub fn bind(port: u16, stop_flag: Arc<AtomicBool>) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port))?;
        Ok(Self { socket, stop_flag })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.socket.local_addr()
    }

    /// Clone the underlying socket handle so the caller can `shutdown` it
    /// from another thread to unblock a pending `recv`.
    pub fn try_clone_socket(&self) -> std::io::Result<UdpSocket> {
        self.socket.try_clone()
    }

    /// Run the receive loop. Returns when `stop_flag` is observed set
    /// (checked after every `recv_from`, including ones interrupted by a
    /// shutdown of a cloned socket handle).
    pub fn serve(&self, mut on_retune: impl FnMut(u64)) {
        let mut buf = [0u8; 64];
        while !self.stop_flag.load(Ordering::SeqCst) {
            match self.socket.recv_from(&mut buf) {
                Ok((n, _src)) => {
                    if let Some(freq_hz) = parse_frame(&buf[..n]) {
                        on_retune(freq_hz);
                    }
                }
                Err(_) => {
                    if self.stop_flag.load(Ordering::SeqCst) {
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_frame() {
        let frame = [0x00, 0x94, 0xC8, 0xBE, 0x32]; // 851012500 little-endian
        assert_eq!(parse_frame(&frame), Some(851_012_500));
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(parse_frame(&[0x00, 0x01, 0x02]), None);
    }

    #[test]
    fn rejects_nonzero_byte0() {
        assert_eq!(parse_frame(&[0x01, 0x94, 0xC8, 0xBE, 0x32]), None);
    }

    #[test]
    fn listener_invokes_callback_and_stops_cleanly() {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let listener = UdpControlListener::bind(0, stop_flag.clone()).expect("bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let shutdown_socket = listener.try_clone_socket().unwrap();

        let received = Arc::new(std::sync::Mutex::new(Vec::new()));
        let received_clone = received.clone();
        let handle = std::thread::spawn(move || {
            listener.serve(|freq| received_clone.lock().unwrap().push(freq));
        });

        let sender = UdpSocket::bind("0.0.0.0:0").unwrap();
        let frame = [0x00, 0x94, 0xC8, 0xBE, 0x32];
        sender.send_to(&frame, addr).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(100));

        stop_flag.store(true, Ordering::SeqCst);
        let _ = shutdown_socket.shutdown(std::net::Shutdown::Both);
        // UDP sockets ignore shutdown() on most platforms; send a sentinel
        // to unblock recv_from if the loop is still parked in it.
        let _ = sender.send_to(&[0x00, 0, 0, 0, 0], addr);
        handle.join().unwrap();

        assert_eq!(*received.lock().unwrap(), vec![851_012_500]);
    }
}
