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

use std::env::current_dir;
use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;

const DATABASE_FILE: &str = "verselife.db";
const CONFIG_FILE: &str = "verselife.toml";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_VERSION: &str = "KJV";

/// Settings read from `verselife.toml` in the data directory.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL of the sync server.
    pub remote_url: Option<String>,
    /// Request timeout for the sync server, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// The translation verses are shown in during review.
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            version: default_version(),
        }
    }
}

impl Config {
    pub fn parse(content: &str) -> Fallible<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the config file in `directory`, if there is one.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE);
        if path.exists() {
            log::debug!("Loading configuration from {}", path.display());
            Config::parse(&read_to_string(path)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// The data directory: the database plus its configuration.
pub struct Workspace {
    pub directory: PathBuf,
    pub config: Config,
    pub db: Database,
}

impl Workspace {
    pub fn open(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        let directory = if directory.exists() {
            directory.canonicalize()?
        } else {
            return fail("directory does not exist.");
        };
        let config = Config::load(&directory)?;
        let db_path: PathBuf = directory.join(DATABASE_FILE);
        let db_path: &str = db_path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?;
        let db = Database::new(db_path)?;
        Ok(Self {
            directory,
            config,
            db,
        })
    }
}
