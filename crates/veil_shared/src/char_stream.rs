use std::fmt;
use std::fmt::{Debug, Formatter};

pub const CHAR_LF: char = '\u{000A}';
pub const CHAR_CR: char = '\u{000D}';
pub const CHAR_FF: char = '\u{000C}';
pub const CHAR_BOM: char = '\u{FEFF}';

/// Defines a single element in the stream: either a decoded character, or the end of the
/// stream. The stream is always fully decoded before it is read, so there is no "empty but
/// not closed" state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Character {
    /// Standard UTF character
    Ch(char),
    /// Stream buffer exhausted
    StreamEnd,
}

use Character::*;

/// CSS whitespace: space, tab, line feed, carriage return and form feed
#[must_use]
pub fn is_css_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | CHAR_LF | CHAR_CR | CHAR_FF)
}

/// CSS newlines: line feed, carriage return and form feed
#[must_use]
pub fn is_css_newline(c: char) -> bool {
    matches!(c, CHAR_LF | CHAR_CR | CHAR_FF)
}

pub trait Stream {
    /// Read current character
    fn read(&self) -> Character;
    /// Read current character and advance to next
    fn read_and_next(&mut self) -> Character;
    /// Advance with 1 character
    fn next(&mut self);
    /// Location of the current character
    fn location(&self) -> Location;
}

/// A decoded character stream that keeps track of the line/column of each character
pub struct CharStream {
    /// Decoded characters
    buffer: Vec<char>,
    /// Current position in the buffer
    position: usize,
    /// Location tracking for the current position
    location_handler: LocationHandler,
}

impl CharStream {
    /// Creates a stream over the given string
    #[must_use]
    pub fn new(data: &str) -> Self {
        Self::with_limit(data, None)
    }

    /// Creates a stream over at most `limit` characters of the given string
    #[must_use]
    pub fn with_limit(data: &str, limit: Option<usize>) -> Self {
        let buffer: Vec<char> = match limit {
            Some(limit) => data.chars().take(limit).collect(),
            None => data.chars().collect(),
        };

        Self {
            buffer,
            position: 0,
            location_handler: LocationHandler::new(Location::default()),
        }
    }
}

impl Stream for CharStream {
    fn read(&self) -> Character {
        self.buffer.get(self.position).map_or(StreamEnd, |c| Ch(*c))
    }

    fn read_and_next(&mut self) -> Character {
        let c = self.read();
        self.next();
        c
    }

    fn next(&mut self) {
        let c = self.read();
        if c == StreamEnd {
            return;
        }
        self.location_handler.inc(c);
        self.position += 1;
    }

    fn location(&self) -> Location {
        self.location_handler.cur_location.clone()
    }
}

/// Location holds the position of a character in the data source
#[derive(Clone, PartialEq)]
pub struct Location {
    /// Line number, starting with 1
    pub line: usize,
    /// Column number, starting with 1
    pub column: usize,
    /// Character offset, starting with 0
    pub offset: usize,
}

impl Default for Location {
    /// Default to line 1, column 1
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl Location {
    /// Create a new Location
    #[must_use]
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl Debug for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{})", self.line, self.column)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// LocationHandler keeps track of line/column locations while a stream is consumed
pub struct LocationHandler {
    /// The current location of the stream
    pub cur_location: Location,
}

impl LocationHandler {
    /// Create a new LocationHandler. `start_location` can be set in case the stream is
    /// not starting at 1:1
    #[must_use]
    pub fn new(start_location: Location) -> Self {
        Self {
            cur_location: start_location,
        }
    }

    /// Will increase the current location based on the given character. A CR is counted as a
    /// line ending only when it is not followed by a LF, which the caller cannot know, so CR
    /// advances the column and LF starts the new line.
    pub fn inc(&mut self, ch: Character) {
        match ch {
            Ch(CHAR_LF) | Ch(CHAR_FF) => {
                self.cur_location.line += 1;
                self.cur_location.column = 1;
                self.cur_location.offset += 1;
            }
            Ch(_) => {
                self.cur_location.column += 1;
                self.cur_location.offset += 1;
            }
            StreamEnd => {}
        }
    }
}
