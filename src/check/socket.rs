//! Listening socket checks

use super::{Check, CheckFailure};
use crate::host::Host;

/// Asserts an address such as `tcp://127.0.0.1:5432` is listening
#[derive(Debug, Clone)]
pub struct SocketListeningCheck {
    pub name: String,
    pub address: String,
}

impl SocketListeningCheck {
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
        }
    }
}

impl Check for SocketListeningCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!("{} is listening", self.address)
    }

    fn run(&self, host: &dyn Host) -> Result<(), CheckFailure> {
        let socket = host.socket(&self.address)?;
        if socket.is_listening {
            Ok(())
        } else {
            Err(CheckFailure::assertion(
                socket.address,
                "listening",
                "not listening",
            ))
        }
    }
}
