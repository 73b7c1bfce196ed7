use super::errors::DeviceError;
use crate::assertion::{AssertionRequest, AssertionResponse};

/// Something that can open device sessions from a locator string.
pub trait Authenticator {
    type Session: DeviceSession;

    fn open(&self, path: &str) -> Result<Self::Session, DeviceError>;
}

/// An open channel to one authenticator.
///
/// One transaction runs at a time; `&mut self` enforces it.
pub trait DeviceSession {
    /// Switch the session to the legacy U2F profile.
    fn force_u2f(&mut self);

    /// Send a get-assertion transaction and collect every entry the device
    /// returns. On error no partial response is produced.
    fn get_assertion(
        &mut self,
        request: &AssertionRequest,
        pin: Option<&str>,
    ) -> Result<AssertionResponse, DeviceError>;

    /// Release the device. Calling it again is a no-op.
    fn close(&mut self) -> Result<(), DeviceError>;
}

/// Scoped device session: closed exactly once, either by [`OpenDevice::close`]
/// or when the guard is dropped.
pub struct OpenDevice<S: DeviceSession> {
    session: S,
    path: String,
    closed: bool,
}

impl<S: DeviceSession> OpenDevice<S> {
    pub fn open<A>(authenticator: &A, path: &str) -> Result<Self, DeviceError>
    where
        A: Authenticator<Session = S>,
    {
        let session = authenticator.open(path)?;
        tracing::debug!("Opened device {}", path);
        Ok(Self {
            session,
            path: path.to_string(),
            closed: false,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn force_u2f(&mut self) {
        tracing::debug!("Forcing U2F mode on {}", self.path);
        self.session.force_u2f();
    }

    pub fn get_assertion(
        &mut self,
        request: &AssertionRequest,
        pin: Option<&str>,
    ) -> Result<AssertionResponse, DeviceError> {
        self.session.get_assertion(request, pin)
    }

    /// Closes the session and reports the result.
    pub fn close(mut self) -> Result<(), DeviceError> {
        self.closed = true;
        let result = self.session.close();
        if result.is_ok() {
            tracing::debug!("Closed device {}", self.path);
        }
        result
    }
}

impl<S: DeviceSession> Drop for OpenDevice<S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.session.close() {
            tracing::warn!("Failed to close device {}: {}", self.path, e);
        }
    }
}
