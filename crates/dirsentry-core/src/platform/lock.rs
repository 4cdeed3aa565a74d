/// Advisory exclusive locks via `flock(2)`.
///
/// Used by the audit log so that several monitor processes appending to the
/// same file never interleave bytes within one record.
use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;

/// RAII guard that releases the lock when dropped.
#[derive(Debug)]
pub struct FlockGuard<'a> {
    file: &'a File,
}

impl FlockGuard<'_> {
    /// The locked file.
    pub fn file(&self) -> &File {
        self.file
    }
}

impl Drop for FlockGuard<'_> {
    fn drop(&mut self) {
        // SAFETY: flock with LOCK_UN is safe on a valid file descriptor.
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
    }
}

/// Block until an exclusive lock on `file` is held.
///
/// Retries on `EINTR`; any other failure is returned.
pub fn lock_exclusive(file: &File) -> io::Result<FlockGuard<'_>> {
    loop {
        // SAFETY: flock is safe on a valid file descriptor.
        let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
        if result == 0 {
            return Ok(FlockGuard { file });
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINTR) {
            return Err(err);
        }
    }
}
