// Bridge pairing
//
// Creating an application key requires the physical link button on the
// bridge to have been pressed in the last ~30 seconds. Until then the
// bridge answers with error type 101.

use std::time::Duration;

use serde_json::json;
use tracing::{debug, info};

use crate::client::HueClient;
use crate::error::Error;
use crate::models::PairingSuccess;

impl HueClient {
    /// Request a new application key.
    ///
    /// `POST /api` with `{"devicetype": "<app>#<instance>"}`. Returns
    /// [`Error::LinkButtonNotPressed`] until the button is pressed.
    pub async fn create_user(&self, devicetype: &str) -> Result<PairingSuccess, Error> {
        let url = self.root_url()?;
        debug!(devicetype, "requesting application key");

        let mut successes: Vec<PairingSuccess> = self
            .post(url, &json!({ "devicetype": devicetype }))
            .await?;

        successes.pop().ok_or_else(|| Error::Deserialization {
            message: "pairing response contained no success item".into(),
            body: String::new(),
        })
    }

    /// Poll [`create_user`](Self::create_user) until the link button is
    /// pressed or `window` elapses.
    ///
    /// `on_wait` is invoked with the remaining time after every rejected
    /// attempt so callers can show progress.
    pub async fn pair(
        &self,
        devicetype: &str,
        window: Duration,
        poll_interval: Duration,
        mut on_wait: impl FnMut(Duration) + Send,
    ) -> Result<PairingSuccess, Error> {
        let deadline = tokio::time::Instant::now() + window;

        loop {
            match self.create_user(devicetype).await {
                Ok(success) => {
                    info!("pairing succeeded");
                    return Ok(success);
                }
                Err(Error::LinkButtonNotPressed) => {
                    let now = tokio::time::Instant::now();
                    if now + poll_interval > deadline {
                        return Err(Error::LinkButtonNotPressed);
                    }
                    on_wait(deadline - now);
                    tokio::time::sleep(poll_interval).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
