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

use std::io::stdin;
use std::io::stdout;
use std::path::PathBuf;

use clap::Parser;

use crate::catalogue::Language;
use crate::cmd::add::add_verse;
use crate::cmd::describe_verse;
use crate::cmd::due::print_due_cards;
use crate::cmd::find_collection;
use crate::cmd::import::import_translation;
use crate::cmd::review::review_collection;
use crate::cmd::sync::Direction;
use crate::cmd::sync::sync_workspace;
use crate::config::Workspace;
use crate::error::Fallible;
use crate::review::ReviewEngine;
use crate::types::timestamp::Timestamp;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Import a translation into the verse catalogue from a JSON file
    /// mapping references like "Genesis 1:1" to text.
    Import {
        file: PathBuf,
        /// Language of the translation.
        #[arg(long, default_value = "en")]
        language: String,
        /// Version name. Defaults to the configured version.
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        directory: Option<String>,
    },
    /// Add a verse to a collection, creating the collection if needed.
    Add {
        collection: String,
        /// A reference like "Ps 23:1" or "Psalms 23:1".
        verse: String,
        /// Path to the data directory. Defaults to the current directory.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Print the cards due today as JSON.
    Due {
        collection: String,
        #[arg(long)]
        directory: Option<String>,
    },
    /// Review the cards due today.
    Review {
        collection: String,
        #[arg(long)]
        directory: Option<String>,
    },
    /// Restart spaced repetition for every card in a collection.
    Reset {
        collection: String,
        #[arg(long)]
        directory: Option<String>,
    },
    /// Push local changes to the remote, then pull remote changes.
    Sync {
        #[arg(long)]
        directory: Option<String>,
        /// Remote base URL. Overrides the config file.
        #[arg(long)]
        remote: Option<String>,
        #[arg(long)]
        push_only: bool,
        #[arg(long)]
        pull_only: bool,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Import {
            file,
            language,
            version,
            directory,
        } => {
            let workspace = Workspace::open(directory)?;
            let version = version.unwrap_or_else(|| workspace.config.version.clone());
            let language = Language::new(language, version);
            let count =
                import_translation(&workspace.db, &file, &language, Timestamp::now()).await?;
            println!("Imported {count} verses of {}.", language.version);
            Ok(())
        }
        Command::Add {
            collection,
            verse,
            directory,
        } => {
            let workspace = Workspace::open(directory)?;
            let card = add_verse(&workspace.db, &collection, &verse, Timestamp::now()).await?;
            println!("Added {} to {collection}.", describe_verse(&card.verse_id));
            Ok(())
        }
        Command::Due {
            collection,
            directory,
        } => {
            let workspace = Workspace::open(directory)?;
            print_due_cards(&workspace.db, &collection, Timestamp::now().date()).await
        }
        Command::Review {
            collection,
            directory,
        } => {
            let workspace = Workspace::open(directory)?;
            let collection = find_collection(&workspace.db, &collection).await?;
            let engine = ReviewEngine::new(workspace.db.clone());
            review_collection(
                &engine,
                &workspace.db,
                &workspace.config.version,
                &collection.id,
                Timestamp::now(),
                &mut stdin().lock(),
                &mut stdout(),
            )
            .await?;
            Ok(())
        }
        Command::Reset {
            collection,
            directory,
        } => {
            let workspace = Workspace::open(directory)?;
            let collection = find_collection(&workspace.db, &collection).await?;
            let engine = ReviewEngine::new(workspace.db.clone());
            let count = engine.reset(&collection.id, Timestamp::now()).await?;
            println!("Reset {count} cards.");
            Ok(())
        }
        Command::Sync {
            directory,
            remote,
            push_only,
            pull_only,
        } => {
            let workspace = Workspace::open(directory)?;
            let direction = Direction::from_flags(push_only, pull_only)?;
            sync_workspace(&workspace, remote, direction, Timestamp::now().date()).await
        }
    }
}
