//! PTY Handle
//!
//! OS-level pseudo-terminal pair abstraction built on `portable-pty`:
//! platform-specific underneath, uniform above. The follower side is handed
//! to the child exactly once at spawn time and never touched again; all
//! parent I/O goes through the controller side, bridged to async code by a
//! reader thread and a writer thread connected via channels.

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize, SlavePty};
use std::io::{Read, Write};
use std::sync::mpsc::{channel, Sender as StdSender};
use std::thread;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use crate::error::{Error, Result};

/// Controller side of a PTY pair plus its current size
pub struct PtyHandle {
    master: Box<dyn MasterPty + Send>,
    /// Follower side; consumed by `spawn_child` and never reused
    slave: Option<Box<dyn SlavePty + Send>>,
    /// Input channel to the writer thread; present once a child is spawned
    input_tx: Option<StdSender<Vec<u8>>>,
    cols: u16,
    rows: u16,
}

/// Receiving end of the output bridge; owned by the session's read loop
pub struct PtyReader {
    output_rx: UnboundedReceiver<Vec<u8>>,
}

impl PtyReader {
    /// Receive the next output chunk; `None` means end of stream
    pub async fn read_chunk(&mut self) -> Option<Vec<u8>> {
        self.output_rx.recv().await
    }

    /// Try to receive a chunk without waiting
    pub fn try_read_chunk(&mut self) -> Option<Vec<u8>> {
        self.output_rx.try_recv().ok()
    }
}

impl PtyHandle {
    /// Allocate a controller/follower pair at the given size
    ///
    /// Failure is fatal for the session being created and is reported to
    /// the caller; no partial handle is produced.
    pub fn open(cols: u16, rows: u16) -> Result<Self> {
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Error::PtyCreationFailed {
                reason: e.to_string(),
            })?;

        Ok(Self {
            master: pair.master,
            slave: Some(pair.slave),
            input_tx: None,
            cols,
            rows,
        })
    }

    /// Spawn a child on the follower side and start the I/O bridge threads
    ///
    /// Returns the child handle and the reader half for the session's read
    /// loop. The follower descriptor is released once the child holds it.
    pub fn spawn_child(
        &mut self,
        cmd: CommandBuilder,
    ) -> Result<(Box<dyn Child + Send + Sync>, PtyReader)> {
        let command = cmd.get_argv().first().cloned().unwrap_or_default();
        let slave = self.slave.take().ok_or_else(|| Error::Other(
            "PTY follower already consumed".to_string(),
        ))?;

        let child = slave
            .spawn_command(cmd)
            .map_err(|e| Error::CommandSpawnFailed {
                command: command.to_string_lossy().to_string(),
                reason: e.to_string(),
            })?;
        // Dropping the follower here leaves the child as its sole owner
        drop(slave);

        let mut master_reader =
            self.master
                .try_clone_reader()
                .map_err(|e| Error::PtyReaderCloneFailed {
                    reason: e.to_string(),
                })?;
        let mut master_writer =
            self.master
                .take_writer()
                .map_err(|e| Error::PtyWriterTakeFailed {
                    reason: e.to_string(),
                })?;

        // Channel: PTY output -> async consumer
        let (tx_out, rx_out) = unbounded_channel::<Vec<u8>>();
        // Channel: async producer (input) -> PTY writer thread
        let (tx_in, rx_in) = channel::<Vec<u8>>();

        // Reader thread: forward controller output until EOF
        thread::spawn(move || {
            let mut buf = [0u8; 4096];
            let mut consecutive_errors = 0;
            const MAX_CONSECUTIVE_ERRORS: u32 = 5;

            loop {
                match master_reader.read(&mut buf) {
                    Ok(0) => {
                        debug!("PTY read EOF, child released the terminal");
                        break;
                    }
                    Ok(n) => {
                        consecutive_errors = 0;
                        if tx_out.send(buf[..n].to_vec()).is_err() {
                            debug!("PTY output receiver dropped, stopping reader thread");
                            break;
                        }
                    }
                    Err(e) => {
                        if e.kind() == std::io::ErrorKind::Interrupted {
                            continue;
                        }
                        if e.kind() == std::io::ErrorKind::WouldBlock {
                            thread::sleep(std::time::Duration::from_millis(10));
                            continue;
                        }

                        // On Linux the controller read fails with EIO once
                        // the child side is closed; treat it as EOF.
                        if e.raw_os_error() == Some(5) {
                            debug!("PTY read EIO, treating as end of stream");
                            break;
                        }

                        consecutive_errors += 1;
                        warn!(
                            "PTY read error ({}): {} (attempt {}/{})",
                            e.kind(),
                            e,
                            consecutive_errors,
                            MAX_CONSECUTIVE_ERRORS
                        );
                        if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                            error!("PTY read: too many consecutive errors, stopping reader thread");
                            break;
                        }
                        thread::sleep(std::time::Duration::from_millis(50));
                    }
                }
            }
            debug!("PTY reader thread exiting");
        });

        // Writer thread: deliver input to the controller
        thread::spawn(move || {
            while let Ok(data) = rx_in.recv() {
                match master_writer.write_all(&data) {
                    Ok(()) => {
                        if let Err(e) = master_writer.flush() {
                            debug!("PTY flush error: {}", e);
                        }
                    }
                    Err(e) => {
                        if e.kind() == std::io::ErrorKind::Interrupted {
                            continue;
                        }
                        warn!("PTY write error ({}): {}, stopping writer thread", e.kind(), e);
                        break;
                    }
                }
            }
            debug!("PTY writer thread exiting");
        });

        self.input_tx = Some(tx_in);

        Ok((child, PtyReader { output_rx: rx_out }))
    }

    /// Queue input bytes for delivery to the child's terminal
    pub fn write(&self, data: &[u8]) -> Result<()> {
        let tx = self.input_tx.as_ref().ok_or_else(|| Error::WriteFailed {
            reason: "no child attached".to_string(),
        })?;
        tx.send(data.to_vec()).map_err(|e| Error::WriteFailed {
            reason: e.to_string(),
        })
    }

    /// Resize the terminal
    ///
    /// Idempotent: resizing to the current size is a no-op, so the child
    /// sees exactly one window-change notification per effective change.
    pub fn resize(&mut self, cols: u16, rows: u16) -> Result<()> {
        if cols == self.cols && rows == self.rows {
            return Ok(());
        }

        self.master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Error::ResizeFailed {
                reason: e.to_string(),
            })?;

        self.cols = cols;
        self.rows = rows;
        debug!("PTY resized to {}x{}", cols, rows);
        Ok(())
    }

    /// Current size as (cols, rows)
    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }
}
