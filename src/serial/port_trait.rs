//! Trait abstraction for serial port reads to enable testing

use async_trait::async_trait;
use std::io;

/// Trait for serial port input
#[async_trait]
pub trait SerialPortIO: Send {
    /// Read whatever is available into `buf`, returning the byte count
    ///
    /// `Ok(0)` means the port reached end of stream.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Wrapper around tokio_serial::SerialStream that implements SerialPortIO
pub struct TokioSerialPort {
    port: tokio_serial::SerialStream,
}

impl TokioSerialPort {
    pub fn new(port: tokio_serial::SerialStream) -> Self {
        Self { port }
    }
}

#[async_trait]
impl SerialPortIO for TokioSerialPort {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        use tokio::io::AsyncReadExt;
        self.port.read(buf).await
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Mock serial port replaying scripted reads
    ///
    /// Each queued chunk is returned by one `read` call (split if the caller's
    /// buffer is smaller). Once the script runs out the port reports end of
    /// stream.
    #[derive(Clone)]
    pub struct MockSerialPort {
        pub reads: Arc<Mutex<VecDeque<io::Result<Vec<u8>>>>>,
        pub read_calls: Arc<Mutex<usize>>,
    }

    impl MockSerialPort {
        pub fn new() -> Self {
            Self {
                reads: Arc::new(Mutex::new(VecDeque::new())),
                read_calls: Arc::new(Mutex::new(0)),
            }
        }

        pub fn push_chunk(&self, data: &[u8]) {
            self.reads.lock().unwrap().push_back(Ok(data.to_vec()));
        }

        pub fn push_error(&self, error: io::ErrorKind) {
            self.reads
                .lock()
                .unwrap()
                .push_back(Err(io::Error::new(error, "Mock read error")));
        }

        pub fn get_read_calls(&self) -> usize {
            *self.read_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl SerialPortIO for MockSerialPort {
        async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            *self.read_calls.lock().unwrap() += 1;

            let mut reads = self.reads.lock().unwrap();
            match reads.pop_front() {
                Some(Ok(mut data)) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    if n < data.len() {
                        reads.push_front(Ok(data.split_off(n)));
                    }
                    Ok(n)
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }
}
