//! Text to tone/silence sequencing.
//!
//! The silence before each element is the gap owed since the last tone,
//! never a sum: a character boundary replaces the element gap and a word
//! boundary replaces the character gap, each at the current speed. Words written as
//! `<...>` are prosigns, sent with element gaps only so the letters run
//! together as one symbol.

use tracing::trace;

use crate::error::Result;
use crate::sink::Sink;
use crate::table::{lookup, Symbol};
use crate::Session;

/// A whitespace-delimited word, with prosign brackets already stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Word<'a> {
    Plain(&'a str),
    /// Text between `<` and the first `>`; anything after `>` is dropped.
    Prosign(&'a str),
}

impl<'a> Word<'a> {
    pub(crate) fn parse(word: &'a str) -> Self {
        match word.strip_prefix('<') {
            Some(rest) => Word::Prosign(rest.find('>').map_or(rest, |end| &rest[..end])),
            None => Word::Plain(word),
        }
    }

    fn text(self) -> &'a str {
        match self {
            Word::Plain(text) | Word::Prosign(text) => text,
        }
    }

    fn is_prosign(self) -> bool {
        matches!(self, Word::Prosign(_))
    }
}

impl<S: Sink> Session<S> {
    /// Send one character.
    ///
    /// The first call sets up the sink. Characters without a code produce
    /// nothing and leave the owed gap untouched.
    pub fn send_character(&mut self, ch: char) -> Result<()> {
        self.ensure_usable()?;
        if !self.is_setup() {
            self.commence()?;
        }

        let entry = lookup(ch);
        if entry.is_empty() {
            trace!(?ch, "no Morse code for character, skipped");
            return Ok(());
        }
        trace!(?ch, pattern = %entry.pattern(), gap = self.pending_gap, "sending character");

        for symbol in entry.symbols() {
            self.check_interrupt()?;

            let gap = std::mem::take(&mut self.pending_gap);
            self.emit_silence(gap)?;

            let len = match symbol {
                Symbol::Dit => self.timing.dit_time(),
                Symbol::Dah => self.timing.dah_time(),
            };
            self.emit_tone(len)?;
            self.pending_gap = self.timing.bit_time;
        }

        if !self.in_prosign {
            self.pending_gap = self.timing.char_delay;
        }
        Ok(())
    }

    /// Send one word followed by a word gap. `<SOS>` style words are sent
    /// as a single prosign.
    pub fn send_word(&mut self, word: &str) -> Result<()> {
        if word.is_empty() {
            return Ok(());
        }
        self.ensure_usable()?;

        let word = Word::parse(word);
        self.in_prosign = word.is_prosign();
        let sent = word
            .text()
            .chars()
            .try_for_each(|ch| self.send_character(ch));
        self.in_prosign = false;
        sent?;

        self.pending_gap = self.timing.word_delay;
        Ok(())
    }

    /// Send text word by word. Runs of whitespace separate words.
    pub fn send_string(&mut self, text: &str) -> Result<()> {
        for word in text.split_whitespace() {
            self.send_word(word)?;
        }
        Ok(())
    }
}

/// Render text as dots and dashes.
///
/// Letters are separated by a space, words by `" / "`. Prosign letters are
/// written together, and characters without a code are left out.
pub fn encode(text: &str) -> String {
    let mut words = Vec::new();

    for raw in text.split_whitespace() {
        let word = Word::parse(raw);
        let letters: Vec<String> = word
            .text()
            .chars()
            .map(lookup)
            .filter(|entry| !entry.is_empty())
            .map(|entry| entry.pattern())
            .collect();

        if letters.is_empty() {
            continue;
        }
        let separator = if word.is_prosign() { "" } else { " " };
        words.push(letters.join(separator));
    }

    words.join(" / ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_word() {
        assert_eq!(Word::parse("CQ"), Word::Plain("CQ"));
    }

    #[test]
    fn test_parse_prosign() {
        assert_eq!(Word::parse("<SOS>"), Word::Prosign("SOS"));
        assert_eq!(Word::parse("<AR"), Word::Prosign("AR"));
        assert_eq!(Word::parse("<SK>tail"), Word::Prosign("SK"));
        assert_eq!(Word::parse("<>"), Word::Prosign(""));
    }

    #[test]
    fn test_closing_bracket_alone_is_plain() {
        assert_eq!(Word::parse("AR>"), Word::Plain("AR>"));
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode("SOS"), "... --- ...");
        assert_eq!(encode("cq  de"), "-.-. --.- / -.. .");
        assert_eq!(encode("<SOS>"), "...---...");
        assert_eq!(encode("A @ B"), ".- / -...");
        assert_eq!(encode(""), "");
    }
}
