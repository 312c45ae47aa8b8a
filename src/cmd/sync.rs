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

use crate::config::Config;
use crate::config::Workspace;
use crate::error::Fallible;
use crate::error::fail;
use crate::store::Store;
use crate::sync::SyncEngine;
use crate::sync::remote::HttpRemote;
use crate::sync::remote::Remote;
use crate::types::date::Date;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Both,
    PushOnly,
    PullOnly,
}

impl Direction {
    pub fn from_flags(push_only: bool, pull_only: bool) -> Fallible<Self> {
        match (push_only, pull_only) {
            (false, false) => Ok(Direction::Both),
            (true, false) => Ok(Direction::PushOnly),
            (false, true) => Ok(Direction::PullOnly),
            (true, true) => fail("--push-only and --pull-only are mutually exclusive."),
        }
    }
}

/// The `--remote` flag wins over the config file.
pub fn resolve_remote_url(config: &Config, remote: Option<String>) -> Fallible<String> {
    match remote.or_else(|| config.remote_url.clone()) {
        Some(url) => Ok(url),
        None => fail("no remote configured. Set remote_url in verselife.toml or pass --remote."),
    }
}

/// Sync in the given direction and return the report as pretty JSON.
pub async fn run_sync<S: Store, R: Remote>(
    engine: &SyncEngine<S, R>,
    direction: Direction,
    today: Date,
) -> Fallible<String> {
    let json = match direction {
        Direction::Both => serde_json::to_string_pretty(&engine.sync(today).await?)?,
        Direction::PushOnly => serde_json::to_string_pretty(&engine.push().await?)?,
        Direction::PullOnly => serde_json::to_string_pretty(&engine.pull(today).await?)?,
    };
    Ok(json)
}

pub async fn sync_workspace(
    workspace: &Workspace,
    remote: Option<String>,
    direction: Direction,
    today: Date,
) -> Fallible<()> {
    let url = resolve_remote_url(&workspace.config, remote)?;
    log::debug!("Syncing with {url}");
    let remote = HttpRemote::new(&url, workspace.config.timeout())?;
    let engine = SyncEngine::new(workspace.db.clone(), remote);
    let report = run_sync(&engine, direction, today).await?;
    println!("{report}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use axum::Json;
    use axum::Router;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::routing::post;
    use tokio::net::TcpListener;

    use super::*;
    use crate::catalogue::fixtures::catalogued_db;
    use crate::cmd::add::add_verse;
    use crate::db::Database;
    use crate::types::changeset::Changeset;
    use crate::types::timestamp::Timestamp;

    #[test]
    fn test_direction_flags() -> Fallible<()> {
        assert_eq!(Direction::from_flags(false, false)?, Direction::Both);
        assert_eq!(Direction::from_flags(true, false)?, Direction::PushOnly);
        assert_eq!(Direction::from_flags(false, true)?, Direction::PullOnly);
        assert!(Direction::from_flags(true, true).is_err());
        Ok(())
    }

    #[test]
    fn test_resolve_remote_url() -> Fallible<()> {
        let config = Config::parse("remote_url = \"http://config.test\"")?;
        assert_eq!(resolve_remote_url(&config, None)?, "http://config.test");
        assert_eq!(
            resolve_remote_url(&config, Some("http://flag.test".to_string()))?,
            "http://flag.test"
        );
        let err = resolve_remote_url(&Config::default(), None).unwrap_err();
        assert!(err.to_string().starts_with("error: no remote configured."));
        Ok(())
    }

    /// A server that stores whatever is pushed and serves it back on pull.
    async fn start_server() -> Fallible<String> {
        let stored: Arc<Mutex<Changeset>> = Arc::new(Mutex::new(Changeset::default()));
        async fn pull(State(stored): State<Arc<Mutex<Changeset>>>) -> Json<Changeset> {
            Json(stored.lock().unwrap().clone())
        }
        async fn push(
            State(stored): State<Arc<Mutex<Changeset>>>,
            Json(changes): Json<Changeset>,
        ) -> StatusCode {
            *stored.lock().unwrap() = changes;
            StatusCode::OK
        }
        let port = portpicker::pick_unused_port().unwrap();
        let app = Router::new()
            .route("/sync/pull", get(pull))
            .route("/sync/push", post(push))
            .with_state(stored);
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::spawn(async move { axum::serve(listener, app).await });
        Ok(format!("http://127.0.0.1:{port}"))
    }

    #[tokio::test]
    async fn test_sync_between_devices() -> Fallible<()> {
        let url = start_server().await?;
        let today = Date::parse("2025-06-01")?;
        let now = Timestamp::start_of(today);

        let laptop = catalogued_db().await?;
        add_verse(&laptop, "Psalms", "Ps 23:1", now).await?;
        let engine = SyncEngine::new(laptop, HttpRemote::new(&url, Config::default().timeout())?);
        let report = run_sync(&engine, Direction::PushOnly, today).await?;
        let report: serde_json::Value = serde_json::from_str(&report)?;
        assert_eq!(report["sent"]["cards"], 1);

        let phone = Database::new(":memory:")?;
        let engine = SyncEngine::new(phone.clone(), HttpRemote::new(&url, Config::default().timeout())?);
        let report = run_sync(&engine, Direction::PullOnly, today).await?;
        let report: serde_json::Value = serde_json::from_str(&report)?;
        assert_eq!(report["received"]["cardVerses"], 1);
        assert_eq!(report["watermark"], "2025-06-01");

        let collection = phone.collection_by_name("Psalms").await?.unwrap();
        let cards = phone.cards_in_collection(&collection.id).await?;
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].verse_id, "Ps 23:1");
        assert_eq!(phone.watermark().await?, Some(today));
        Ok(())
    }
}
