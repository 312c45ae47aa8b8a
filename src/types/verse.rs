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

use std::fmt::Display;
use std::fmt::Formatter;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;

/// Book abbreviations and their full names, in canonical order.
const BOOKS: [(&str, &str); 66] = [
    ("Gen", "Genesis"),
    ("Exod", "Exodus"),
    ("Lev", "Leviticus"),
    ("Num", "Numbers"),
    ("Deut", "Deuteronomy"),
    ("Josh", "Joshua"),
    ("Judg", "Judges"),
    ("Ruth", "Ruth"),
    ("1 Sam", "1 Samuel"),
    ("2 Sam", "2 Samuel"),
    ("1 Kgs", "1 Kings"),
    ("2 Kgs", "2 Kings"),
    ("1 Chr", "1 Chronicles"),
    ("2 Chr", "2 Chronicles"),
    ("Ezra", "Ezra"),
    ("Neh", "Nehemiah"),
    ("Esth", "Esther"),
    ("Job", "Job"),
    ("Ps", "Psalms"),
    ("Prov", "Proverbs"),
    ("Eccl", "Ecclesiastes"),
    ("Song", "Song of Solomon"),
    ("Isa", "Isaiah"),
    ("Jer", "Jeremiah"),
    ("Lam", "Lamentations"),
    ("Ezek", "Ezekiel"),
    ("Dan", "Daniel"),
    ("Hos", "Hosea"),
    ("Joel", "Joel"),
    ("Amos", "Amos"),
    ("Obad", "Obadiah"),
    ("Jonah", "Jonah"),
    ("Mic", "Micah"),
    ("Nah", "Nahum"),
    ("Hab", "Habakkuk"),
    ("Zeph", "Zephaniah"),
    ("Hag", "Haggai"),
    ("Zech", "Zechariah"),
    ("Mal", "Malachi"),
    ("Matt", "Matthew"),
    ("Mark", "Mark"),
    ("Luke", "Luke"),
    ("John", "John"),
    ("Acts", "Acts"),
    ("Rom", "Romans"),
    ("1 Cor", "1 Corinthians"),
    ("2 Cor", "2 Corinthians"),
    ("Gal", "Galatians"),
    ("Eph", "Ephesians"),
    ("Phil", "Philippians"),
    ("Col", "Colossians"),
    ("1 Thess", "1 Thessalonians"),
    ("2 Thess", "2 Thessalonians"),
    ("1 Tim", "1 Timothy"),
    ("2 Tim", "2 Timothy"),
    ("Titus", "Titus"),
    ("Phlm", "Philemon"),
    ("Heb", "Hebrews"),
    ("Jas", "James"),
    ("1 Pet", "1 Peter"),
    ("2 Pet", "2 Peter"),
    ("1 John", "1 John"),
    ("2 John", "2 John"),
    ("3 John", "3 John"),
    ("Jude", "Jude"),
    ("Rev", "Revelation"),
];

/// The KJV text files name the Song of Solomon this way.
const SONG_ALIAS: &str = "Solomon's Song";

/// The abbreviation of a book, given either its abbreviation or its full
/// name.
pub fn abbreviate(book: &str) -> Option<&'static str> {
    if book == SONG_ALIAS {
        return Some("Song");
    }
    BOOKS
        .iter()
        .find(|(abbr, name)| *abbr == book || *name == book)
        .map(|(abbr, _)| *abbr)
}

pub fn verbose_book_name(abbreviation: &str) -> Option<&'static str> {
    BOOKS
        .iter()
        .find(|(abbr, _)| *abbr == abbreviation)
        .map(|(_, name)| *name)
}

/// A verse reference like `Ps 23:1`. Its display form doubles as the verse's
/// id in the catalogue, so ids agree across devices.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct VerseRef {
    book: &'static str,
    chapter: u32,
    verse: u32,
}

impl VerseRef {
    /// Parse `<book> <chapter>:<verse>`. The book may be abbreviated.
    pub fn parse(s: &str) -> Fallible<Self> {
        let s = s.trim();
        let invalid = || ErrorReport::new(format!("invalid verse reference: {s:?}."));
        let (book, location) = s.rsplit_once(' ').ok_or_else(invalid)?;
        let (chapter, verse) = location.split_once(':').ok_or_else(invalid)?;
        let chapter: u32 = chapter.parse().map_err(|_| invalid())?;
        let verse: u32 = verse.parse().map_err(|_| invalid())?;
        if chapter == 0 || verse == 0 {
            return Err(invalid());
        }
        match abbreviate(book.trim()) {
            Some(book) => Ok(Self {
                book,
                chapter,
                verse,
            }),
            None => fail(format!("unknown book: {book:?}.")),
        }
    }

    pub fn book(&self) -> &'static str {
        self.book
    }

    pub fn chapter(&self) -> u32 {
        self.chapter
    }

    pub fn verse(&self) -> u32 {
        self.verse
    }

    pub fn id(&self) -> String {
        self.to_string()
    }

    pub fn chapter_id(&self) -> String {
        format!("{} {}", self.book, self.chapter)
    }

    /// The reference with the book spelled out, e.g. `Psalms 23:1`.
    pub fn verbose(&self) -> String {
        let book = verbose_book_name(self.book).unwrap_or(self.book);
        format!("{book} {}:{}", self.chapter, self.verse)
    }
}

impl Display for VerseRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}:{}", self.book, self.chapter, self.verse)
    }
}
