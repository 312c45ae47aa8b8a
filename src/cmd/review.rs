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

use std::io::BufRead;
use std::io::Write;

use crate::catalogue::Catalogue;
use crate::cmd::describe_verse;
use crate::error::Fallible;
use crate::review::Phase;
use crate::review::ReviewEngine;
use crate::review::ReviewSession;
use crate::store::Store;
use crate::types::quality::Quality;
use crate::types::timestamp::Timestamp;

/// Review a collection interactively, showing each verse in `version`.
/// Ratings are read from `input`, one per line. If the input runs out before
/// the session ends, the session is abandoned and nothing is saved.
pub async fn review_collection<S: Store, C: Catalogue>(
    engine: &ReviewEngine<S>,
    catalogue: &C,
    version: &str,
    collection_id: &str,
    now: Timestamp,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Fallible<ReviewSession> {
    let mut session = engine.start(collection_id, now.date()).await?;
    if session.is_ended() {
        writeln!(output, "No cards due.")?;
        return Ok(session);
    }
    writeln!(output, "{} cards due.", session.cards().len())?;
    while let Some(card) = session.current() {
        let progress = session.progress();
        let reference = describe_verse(&card.verse_id);
        let text = catalogue.verse_text(&card.verse_id, version).await?;
        match session.phase() {
            Phase::PhaseOne { .. } => writeln!(
                output,
                "[review {}/{}] {reference}",
                progress.reviewed + 1,
                progress.total
            )?,
            Phase::PhaseTwo { .. } => {
                writeln!(output, "[relearn] {reference} ({} left)", progress.lapsed)?
            }
            Phase::Ended => break,
        }
        match text {
            Some(text) => writeln!(output, "{text}")?,
            None => writeln!(output, "(no {version} text for this verse)")?,
        }
        let quality = match read_quality(input, output)? {
            Some(quality) => quality,
            None => {
                writeln!(output, "Session abandoned.")?;
                return Ok(session);
            }
        };
        engine.rate(&mut session, quality, now).await?;
    }
    writeln!(output, "Session complete.")?;
    Ok(session)
}

/// Prompt until a valid rating is entered. `None` on end of input.
fn read_quality(input: &mut impl BufRead, output: &mut impl Write) -> Fallible<Option<Quality>> {
    loop {
        write!(output, "Rating (0-5): ")?;
        output.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.parse::<Quality>() {
            Ok(quality) => return Ok(Some(quality)),
            Err(e) => writeln!(output, "{e}")?,
        }
    }
}
