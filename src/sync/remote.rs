// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::changeset::Changeset;
use crate::types::date::Date;

/// Older servers read the watermark from this header rather than the query
/// string, so both are sent.
const LAST_SYNC_HEADER: &str = "x-last-sync";

/// The authoritative copy of the data.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Every record updated since `last_sync`, or every record if `None`.
    async fn pull(&self, last_sync: Option<Date>) -> Fallible<Changeset>;

    /// Send local changes. The remote upserts them.
    async fn push(&self, changes: &Changeset) -> Fallible<()>;
}

/// A remote reached over HTTP.
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    pub fn new(base_url: &str, timeout: Duration) -> Fallible<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return fail(format!("invalid remote URL: {base_url:?}."));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn pull(&self, last_sync: Option<Date>) -> Fallible<Changeset> {
        let mut url = self.url("/sync/pull");
        if let Some(date) = last_sync {
            url = format!("{url}?lastSync={date}");
        }
        log::debug!("GET {url}");
        let mut request = self.client.get(&url);
        if let Some(date) = last_sync {
            request = request.header(LAST_SYNC_HEADER, date.to_string());
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ErrorReport::network(format!(
                "remote responded with {status}."
            )));
        }
        let body = response.bytes().await?;
        let changes: Changeset = serde_json::from_slice(&body)
            .map_err(|e| ErrorReport::network(format!("malformed response: {e}")))?;
        Ok(changes)
    }

    async fn push(&self, changes: &Changeset) -> Fallible<()> {
        let url = self.url("/sync/push");
        log::debug!("POST {url}");
        let body = serde_json::to_vec(changes)?;
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ErrorReport::network(format!(
                "remote responded with {status}."
            )));
        }
        Ok(())
    }
}
