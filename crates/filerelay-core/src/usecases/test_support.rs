//! Backend stand-ins for use case unit tests

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ports::{BackendError, ITransportBackend, ITransportSession};

/// Backend whose server can never be reached; counts connection attempts
#[derive(Debug, Default)]
pub(crate) struct UnreachableBackend {
    connects: AtomicUsize,
}

impl UnreachableBackend {
    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ITransportBackend for UnreachableBackend {
    fn server_address(&self) -> &str {
        "unreachable.test"
    }

    async fn connect(&self) -> Result<Box<dyn ITransportSession>, BackendError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Err(BackendError::Unavailable("connection refused".to_string()))
    }
}
