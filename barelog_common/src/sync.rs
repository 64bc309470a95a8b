//! Cooperative mutex bytes in shared memory.
//!
//! The interconnect offers no atomic test-and-set, so a mutex is one byte
//! polled through the injected read primitive: zero means free. Correctness
//! relies on the device and the host touching a core's slice in disjoint
//! phases; the byte only catches the case where one side is still busy.

use crate::boundary::SharedMemoryIo;
use crate::consts::MUTEX_TRY_MAX;
use crate::error::{BarelogError, BarelogResult};
use crate::mem_space::Address;
use tracing::warn;

const LOCKED: [u8; 1] = [1];
const UNLOCKED: [u8; 1] = [0];

/// One mutex byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedMutex {
    address: Address,
}

impl SharedMutex {
    /// Mutex backed by the byte at `address`.
    pub const fn new(address: Address) -> Self {
        Self { address }
    }

    /// Address of the backing byte.
    #[inline]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Take the mutex.
    ///
    /// Polls the byte at most [`MUTEX_TRY_MAX`] times and takes it on the
    /// first zero read.
    ///
    /// # Errors
    /// - `MutexTimeout` if every poll found the byte set
    /// - the read or write error of the primitive, verbatim
    pub fn acquire<Io: SharedMemoryIo + ?Sized>(&self, io: &mut Io) -> BarelogResult<()> {
        let mut byte = [0u8; 1];
        for _ in 0..MUTEX_TRY_MAX {
            io.read(self.address, &mut byte)?;
            if byte[0] == 0 {
                return io.write(self.address, &LOCKED);
            }
            core::hint::spin_loop();
        }
        warn!(
            "Mutex byte at {:#x} still held after {} polls",
            self.address, MUTEX_TRY_MAX
        );
        Err(BarelogError::MutexTimeout {
            address: self.address,
            attempts: MUTEX_TRY_MAX,
        })
    }

    /// Give the mutex back, whoever holds it.
    pub fn release<Io: SharedMemoryIo + ?Sized>(&self, io: &mut Io) -> BarelogResult<()> {
        io.write(self.address, &UNLOCKED)
    }

    /// Run `f` holding the mutex. The mutex is released even if `f` fails;
    /// the error of `f` wins over a release error.
    pub fn guarded<Io, T, F>(&self, io: &mut Io, f: F) -> BarelogResult<T>
    where
        Io: SharedMemoryIo + ?Sized,
        F: FnOnce(&mut Io) -> BarelogResult<T>,
    {
        self.acquire(io)?;
        let result = f(io);
        let released = self.release(io);
        let value = result?;
        released?;
        Ok(value)
    }
}

/// Run `f` under `mutex` when one is configured, directly otherwise.
pub fn with_mutex<Io, T, F>(mutex: Option<SharedMutex>, io: &mut Io, f: F) -> BarelogResult<T>
where
    Io: SharedMemoryIo + ?Sized,
    F: FnOnce(&mut Io) -> BarelogResult<T>,
{
    match mutex {
        Some(m) => m.guarded(io, f),
        None => f(io),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
