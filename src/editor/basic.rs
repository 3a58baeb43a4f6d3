//! Reference line editor for VT100 compatible terminals.
//!
//! Supported keys:
//!
//! | Key                         | Action                                   |
//! |-----------------------------|------------------------------------------|
//! | printable ASCII             | insert at the cursor                     |
//! | Enter                       | accept the line                          |
//! | Backspace, Ctrl-H           | delete before the cursor                 |
//! | Delete, Ctrl-D              | delete under the cursor (Ctrl-D on an empty line abandons it) |
//! | Left, Right, Ctrl-B, Ctrl-F | move the cursor                          |
//! | Home, End, Ctrl-A, Ctrl-E   | jump to the start or end                 |
//! | Up, Down, Ctrl-P, Ctrl-N    | walk the history                         |
//! | TAB                         | cycle through completions                |
//! | Ctrl-C                      | abandon the line                         |
//! | Ctrl-U                      | clear the line                           |
//! | Ctrl-K                      | delete to the end of the line            |
//! | Ctrl-W                      | delete the previous word                 |
//! | Ctrl-L                      | clear the screen                         |
//!
//! In dumb mode the editor only echoes, handles Backspace and Enter, and never
//! sends an escape sequence.
//!
//! In multi-line mode a line longer than the terminal is wide is drawn over as
//! many rows as it needs, and the editor tracks which row the cursor is on so
//! every redraw first clears all rows of the previous one.

use super::{
    Assist, Candidates, LineEditor, ReadOutcome, PROBE_POLL_INTERVAL_MS, PROBE_TIMEOUT_MS,
    STATUS_OK, STATUS_REQUEST,
};
use crate::config::{MAX_LINE_LENGTH, MAX_RENDERED_PROMPT_LEN};
use crate::history::Line;
use crate::transport::{IoError, SerialIo};
use core::fmt::Write as _;
use core::sync::atomic::{AtomicBool, Ordering};

const BELL: &str = "\x07";
const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";
const CLEAR_TO_END: &str = "\x1b[0K";
const CLEAR_ROW_UP: &str = "\r\x1b[0K\x1b[1A";
const ERASE_BACK: &str = "\x08 \x08";

/// Terminal width assumed until [`BasicEditor::with_columns`] says otherwise.
pub const DEFAULT_COLUMNS: usize = 80;

/// Narrowest terminal the multi-line redraw supports.
pub const MIN_COLUMNS: usize = 20;

/// Characters one redraw can put on screen: prompt, line and hint.
const MAX_DRAWN: usize = MAX_RENDERED_PROMPT_LEN + 2 * MAX_LINE_LENGTH;

/// Room for one full redraw, including clearing every row of the last one.
const REFRESH_CAPACITY: usize =
    MAX_DRAWN + 32 + CLEAR_ROW_UP.len() * (MAX_DRAWN / MIN_COLUMNS + 2);

type Refresh = heapless::String<REFRESH_CAPACITY>;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Escape {
    Normal,
    Esc,
    Csi(u8),
    Ss3,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Key {
    Char(u8),
    Enter,
    Backspace,
    Delete,
    Tab,
    Left,
    Right,
    Home,
    End,
    Up,
    Down,
    Interrupt,
    EndOfFile,
    ClearLine,
    KillToEnd,
    DeleteWord,
    ClearScreen,
}

/// Edit buffer with a cursor, both in bytes.
///
/// Only ASCII is typed in, but recalled entries may hold any UTF-8, so the
/// cursor always moves by whole characters.
struct Buffer {
    bytes: [u8; MAX_LINE_LENGTH],
    len: usize,
    cursor: usize,
    limit: usize,
}

impl Buffer {
    fn new(limit: usize) -> Self {
        Self {
            bytes: [0u8; MAX_LINE_LENGTH],
            len: 0,
            cursor: 0,
            limit: limit.min(MAX_LINE_LENGTH),
        }
    }

    fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len]).unwrap_or("")
    }

    fn column(&self) -> usize {
        core::str::from_utf8(&self.bytes[..self.cursor])
            .map(|s| s.chars().count())
            .unwrap_or(self.cursor)
    }

    fn width(&self) -> usize {
        self.as_str().chars().count()
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn set(&mut self, s: &str) {
        let mut end = s.len().min(self.limit);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        self.bytes[..end].copy_from_slice(&s.as_bytes()[..end]);
        self.len = end;
        self.cursor = end;
    }

    fn clear(&mut self) {
        self.len = 0;
        self.cursor = 0;
    }

    fn insert(&mut self, byte: u8) -> bool {
        if self.len >= self.limit {
            return false;
        }
        self.bytes.copy_within(self.cursor..self.len, self.cursor + 1);
        self.bytes[self.cursor] = byte;
        self.len += 1;
        self.cursor += 1;
        true
    }

    fn remove(&mut self, start: usize, end: usize) {
        self.bytes.copy_within(end..self.len, start);
        self.len -= end - start;
        self.cursor = start;
    }

    fn prev_boundary(&self) -> usize {
        let mut index = self.cursor.saturating_sub(1);
        while index > 0 && self.bytes[index] & 0xC0 == 0x80 {
            index -= 1;
        }
        index
    }

    fn next_boundary(&self) -> usize {
        let mut index = (self.cursor + 1).min(self.len);
        while index < self.len && self.bytes[index] & 0xC0 == 0x80 {
            index += 1;
        }
        index
    }

    fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let start = self.prev_boundary();
        self.remove(start, self.cursor);
        true
    }

    fn delete(&mut self) -> bool {
        if self.cursor == self.len {
            return false;
        }
        let end = self.next_boundary();
        let cursor = self.cursor;
        self.remove(cursor, end);
        true
    }

    fn left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = self.prev_boundary();
        true
    }

    fn right(&mut self) -> bool {
        if self.cursor == self.len {
            return false;
        }
        self.cursor = self.next_boundary();
        true
    }

    fn kill_to_end(&mut self) {
        self.len = self.cursor;
    }

    fn delete_word(&mut self) -> bool {
        let mut start = self.cursor;
        while start > 0 && self.bytes[start - 1] == b' ' {
            start -= 1;
        }
        while start > 0 && self.bytes[start - 1] != b' ' {
            start -= 1;
        }
        if start == self.cursor {
            return false;
        }
        self.remove(start, self.cursor);
        true
    }
}

/// Line editor with history, completion and hints.
///
/// Lines are redrawn on a single row unless multi-line mode is on.
#[derive(Debug)]
pub struct BasicEditor {
    dumb: bool,
    multiline: bool,
    max_len: usize,
    columns: usize,
    escape: Escape,
    /// Rows used by the tallest redraw of the current line.
    rows: usize,
    /// Row the cursor was left on, counted from 1 at the prompt.
    cursor_row: usize,
}

impl BasicEditor {
    /// An editor in full mode accepting lines up to [`MAX_LINE_LENGTH`] bytes.
    pub const fn new() -> Self {
        Self {
            dumb: false,
            multiline: false,
            max_len: MAX_LINE_LENGTH,
            columns: DEFAULT_COLUMNS,
            escape: Escape::Normal,
            rows: 1,
            cursor_row: 1,
        }
    }

    /// Set the terminal width used to wrap lines in multi-line mode. Widths
    /// below [`MIN_COLUMNS`] are raised to it.
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns.max(MIN_COLUMNS);
        self
    }

    /// Terminal width in characters.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Maximum accepted line length.
    pub fn max_line_len(&self) -> usize {
        self.max_len
    }

    fn decode(&mut self, byte: u8) -> Option<Key> {
        match self.escape {
            Escape::Normal => match byte {
                b'\r' | b'\n' => Some(Key::Enter),
                0x7F | 0x08 => Some(Key::Backspace),
                b'\t' => Some(Key::Tab),
                0x01 => Some(Key::Home),
                0x02 => Some(Key::Left),
                0x03 => Some(Key::Interrupt),
                0x04 => Some(Key::EndOfFile),
                0x05 => Some(Key::End),
                0x06 => Some(Key::Right),
                0x0B => Some(Key::KillToEnd),
                0x0C => Some(Key::ClearScreen),
                0x0E => Some(Key::Down),
                0x10 => Some(Key::Up),
                0x15 => Some(Key::ClearLine),
                0x17 => Some(Key::DeleteWord),
                0x1B => {
                    self.escape = Escape::Esc;
                    None
                }
                0x20..=0x7E => Some(Key::Char(byte)),
                _ => None,
            },
            Escape::Esc => {
                self.escape = match byte {
                    b'[' => Escape::Csi(0),
                    b'O' => Escape::Ss3,
                    _ => Escape::Normal,
                };
                None
            }
            Escape::Csi(param) => {
                if byte.is_ascii_digit() {
                    self.escape = Escape::Csi(param.saturating_mul(10).saturating_add(byte - b'0'));
                    return None;
                }
                self.escape = Escape::Normal;
                match byte {
                    b'~' => match param {
                        1 | 7 => Some(Key::Home),
                        3 => Some(Key::Delete),
                        4 | 8 => Some(Key::End),
                        _ => None,
                    },
                    _ => Self::cursor_key(byte),
                }
            }
            Escape::Ss3 => {
                self.escape = Escape::Normal;
                Self::cursor_key(byte)
            }
        }
    }

    fn cursor_key(byte: u8) -> Option<Key> {
        match byte {
            b'A' => Some(Key::Up),
            b'B' => Some(Key::Down),
            b'C' => Some(Key::Right),
            b'D' => Some(Key::Left),
            b'H' => Some(Key::Home),
            b'F' => Some(Key::End),
            _ => None,
        }
    }

    /// Redraw the prompt and `text` and place the cursor at character `column`
    /// of `text`. Hints are only drawn when `assist` is given.
    fn refresh<S: SerialIo + ?Sized>(
        &mut self,
        io: &mut S,
        prompt: &str,
        text: &str,
        column: usize,
        assist: Option<&Assist<'_>>,
    ) -> Result<(), IoError> {
        let mut hint: heapless::String<MAX_LINE_LENGTH> = heapless::String::new();
        if let Some(hinter) = assist.and_then(|assist| assist.hinter) {
            if !hinter.hint(text, &mut hint) {
                hint.clear();
            }
        }

        let mut seq = Refresh::new();
        if self.multiline {
            self.draw_rows(&mut seq, prompt, text, column, &hint, assist);
        } else {
            Self::draw_row(&mut seq, prompt, text, column, &hint, assist);
        }
        io.write_str(&seq)
    }

    fn push_hint(seq: &mut Refresh, hint: &str, assist: Option<&Assist<'_>>) {
        if let (false, Some(assist)) = (hint.is_empty(), assist) {
            let _ = write!(seq, "\x1b[{};{};49m", u8::from(assist.hint_bold), assist.hint_color);
            let _ = seq.push_str(hint);
            let _ = seq.push_str("\x1b[0m");
        }
    }

    fn draw_row(
        seq: &mut Refresh,
        prompt: &str,
        text: &str,
        column: usize,
        hint: &str,
        assist: Option<&Assist<'_>>,
    ) {
        let _ = seq.push('\r');
        let _ = seq.push_str(prompt);
        let _ = seq.push_str(text);
        Self::push_hint(seq, hint, assist);
        let _ = seq.push_str(CLEAR_TO_END);
        let _ = seq.push('\r');
        let offset = prompt.chars().count() + column;
        if offset > 0 {
            let _ = write!(seq, "\x1b[{}C", offset);
        }
    }

    fn draw_rows(
        &mut self,
        seq: &mut Refresh,
        prompt: &str,
        text: &str,
        column: usize,
        hint: &str,
        assist: Option<&Assist<'_>>,
    ) {
        let cols = self.columns;
        let prompt_len = prompt.chars().count();
        let text_len = text.chars().count();
        let mut rows = (prompt_len + text_len + hint.chars().count())
            .div_ceil(cols)
            .max(1);

        // Go to the last row of the previous redraw, then clear upwards
        let old_rows = self.rows;
        if old_rows > self.cursor_row {
            let _ = write!(seq, "\x1b[{}B", old_rows - self.cursor_row);
        }
        for _ in 1..old_rows {
            let _ = seq.push_str(CLEAR_ROW_UP);
        }
        let _ = seq.push('\r');
        let _ = seq.push_str(CLEAR_TO_END);

        let _ = seq.push_str(prompt);
        let _ = seq.push_str(text);
        Self::push_hint(seq, hint, assist);

        // A cursor right after the last column needs a row of its own
        let end = prompt_len + column;
        if column > 0 && column == text_len && end % cols == 0 && hint.is_empty() {
            let _ = seq.push('\n');
            rows += 1;
        }

        let cursor_row = end / cols + 1;
        if rows > cursor_row {
            let _ = write!(seq, "\x1b[{}A", rows - cursor_row);
        }
        let _ = seq.push('\r');
        if end % cols > 0 {
            let _ = write!(seq, "\x1b[{}C", end % cols);
        }

        self.rows = rows.max(old_rows);
        self.cursor_row = cursor_row;
    }

    fn reset_rows(&mut self) {
        self.rows = 1;
        self.cursor_row = 1;
    }

    fn wait_byte<S: SerialIo + ?Sized>(io: &mut S, cancel: &AtomicBool) -> Result<Option<u8>, IoError> {
        loop {
            if cancel.load(Ordering::Acquire) {
                return Ok(None);
            }
            match io.read_byte()? {
                Some(byte) => return Ok(Some(byte)),
                None => io.idle(),
            }
        }
    }

    fn read_dumb<S: SerialIo + ?Sized>(
        &mut self,
        io: &mut S,
        prompt: &str,
        cancel: &AtomicBool,
        line: &mut Line,
    ) -> Result<ReadOutcome, IoError> {
        let mut buffer = Buffer::new(self.max_len);
        io.write_str(prompt)?;

        loop {
            let Some(byte) = Self::wait_byte(io, cancel)? else {
                io.write_str("\n")?;
                return Ok(ReadOutcome::Cancelled);
            };
            match byte {
                b'\r' | b'\n' => {
                    io.write_str("\n")?;
                    let _ = line.push_str(buffer.as_str());
                    return Ok(ReadOutcome::Line);
                }
                0x03 => {
                    io.write_str("\n")?;
                    return Ok(ReadOutcome::Empty);
                }
                0x08 | 0x7F => {
                    if buffer.backspace() {
                        io.write_str(ERASE_BACK)?;
                    }
                }
                0x20..=0x7E => {
                    if buffer.insert(byte) {
                        io.write_all(&[byte])?;
                    }
                }
                _ => {}
            }
        }
    }
}

impl Default for BasicEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl LineEditor for BasicEditor {
    fn probe<S: SerialIo + ?Sized>(&mut self, io: &mut S) -> Result<bool, IoError> {
        io.write_str(STATUS_REQUEST)?;
        io.flush()?;

        let mut matched = 0;
        let mut waited_ms = 0;
        while waited_ms < PROBE_TIMEOUT_MS {
            match io.read_byte()? {
                Some(byte) if byte == STATUS_OK[matched] => {
                    matched += 1;
                    if matched == STATUS_OK.len() {
                        return Ok(true);
                    }
                }
                Some(byte) => matched = usize::from(byte == STATUS_OK[0]),
                None => {
                    io.delay_ms(PROBE_POLL_INTERVAL_MS);
                    waited_ms += PROBE_POLL_INTERVAL_MS;
                }
            }
        }
        debug!("no status report after {} ms", waited_ms);
        Ok(false)
    }

    fn set_dumb_mode(&mut self, dumb: bool) {
        self.dumb = dumb;
    }

    fn is_dumb_mode(&self) -> bool {
        self.dumb
    }

    fn set_max_line_len(&mut self, len: usize) {
        self.max_len = len.min(MAX_LINE_LENGTH);
    }

    fn set_multiline(&mut self, multiline: bool) {
        self.multiline = multiline;
    }

    fn is_multiline(&self) -> bool {
        self.multiline
    }

    fn read_line<'a, S: SerialIo + ?Sized>(
        &mut self,
        io: &mut S,
        prompt: &str,
        assist: &Assist<'a>,
        cancel: &AtomicBool,
        line: &mut Line,
    ) -> Result<ReadOutcome, IoError> {
        line.clear();
        self.escape = Escape::Normal;
        if cancel.load(Ordering::Acquire) {
            return Ok(ReadOutcome::Cancelled);
        }
        if self.dumb {
            return self.read_dumb(io, prompt, cancel, line);
        }

        let mut buffer = Buffer::new(self.max_len);
        let mut saved = Buffer::new(self.max_len);
        let mut history_index = 0usize;
        let mut candidates: Candidates<'a> = heapless::Vec::new();
        let mut completion: Option<usize> = None;

        self.reset_rows();
        self.refresh(io, prompt, "", 0, Some(assist))?;

        loop {
            let Some(byte) = Self::wait_byte(io, cancel)? else {
                io.write_str("\n")?;
                return Ok(ReadOutcome::Cancelled);
            };
            let Some(key) = self.decode(byte) else {
                continue;
            };

            if let Some(index) = completion {
                if key == Key::Tab {
                    let next = if index >= candidates.len() { 0 } else { index + 1 };
                    completion = Some(next);
                    match candidates.get(next) {
                        Some(candidate) => {
                            self.refresh(io, prompt, candidate, candidate.chars().count(), None)?
                        }
                        None => {
                            io.write_str(BELL)?;
                            self.refresh(io, prompt, buffer.as_str(), buffer.column(), Some(assist))?;
                        }
                    }
                    continue;
                }
                if let Some(candidate) = candidates.get(index) {
                    buffer.set(candidate);
                }
                completion = None;
            }

            let mut redraw = true;
            match key {
                Key::Enter => {
                    if assist.hinter.is_some() || self.multiline {
                        self.refresh(io, prompt, buffer.as_str(), buffer.width(), None)?;
                    }
                    io.write_str("\n")?;
                    let _ = line.push_str(buffer.as_str());
                    return Ok(ReadOutcome::Line);
                }
                Key::Interrupt => {
                    io.write_str("^C\n")?;
                    return Ok(ReadOutcome::Empty);
                }
                Key::EndOfFile if buffer.is_empty() => {
                    io.write_str("\n")?;
                    return Ok(ReadOutcome::Empty);
                }
                Key::EndOfFile | Key::Delete => redraw = buffer.delete(),
                Key::Backspace => redraw = buffer.backspace(),
                Key::Left => redraw = buffer.left(),
                Key::Right => redraw = buffer.right(),
                Key::Home => buffer.cursor = 0,
                Key::End => buffer.cursor = buffer.len,
                Key::ClearLine => buffer.clear(),
                Key::KillToEnd => buffer.kill_to_end(),
                Key::DeleteWord => redraw = buffer.delete_word(),
                Key::ClearScreen => {
                    io.write_str(CLEAR_SCREEN)?;
                    self.reset_rows();
                }
                Key::Char(byte) => redraw = buffer.insert(byte),
                Key::Up => {
                    redraw = false;
                    if let Some(history) = assist.history {
                        if history_index < history.len() {
                            if history_index == 0 {
                                saved.set(buffer.as_str());
                            }
                            history_index += 1;
                            if let Some(entry) = history.recent(history_index - 1) {
                                buffer.set(entry);
                            }
                            redraw = true;
                        }
                    }
                }
                Key::Down => {
                    redraw = false;
                    if let Some(history) = assist.history {
                        if history_index > 0 {
                            history_index -= 1;
                            match history_index {
                                0 => buffer.set(saved.as_str()),
                                back => {
                                    if let Some(entry) = history.recent(back - 1) {
                                        buffer.set(entry);
                                    }
                                }
                            }
                            redraw = true;
                        }
                    }
                }
                Key::Tab => {
                    redraw = false;
                    candidates.clear();
                    if let Some(completer) = assist.completer {
                        completer.complete(buffer.as_str(), &mut candidates);
                    }
                    match candidates.first() {
                        Some(candidate) => {
                            completion = Some(0);
                            self.refresh(io, prompt, candidate, candidate.chars().count(), None)?;
                        }
                        None => io.write_str(BELL)?,
                    }
                }
            }

            if redraw {
                self.refresh(io, prompt, buffer.as_str(), buffer.column(), Some(assist))?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Completer, Hinter};
    use crate::history::History;
    use core::fmt;

    struct Script {
        input: heapless::Deque<u8, 64>,
        output: heapless::String<4096>,
        cancel_when_drained: bool,
        slept_ms: u32,
    }

    impl Script {
        fn new(input: &[u8]) -> Self {
            let mut queue = heapless::Deque::new();
            for &byte in input {
                queue.push_back(byte).unwrap();
            }
            Self {
                input: queue,
                output: heapless::String::new(),
                cancel_when_drained: false,
                slept_ms: 0,
            }
        }
    }

    impl SerialIo for Script {
        fn read_byte(&mut self) -> Result<Option<u8>, IoError> {
            match self.input.pop_front() {
                Some(byte) => Ok(Some(byte)),
                None if self.cancel_when_drained => Ok(None),
                None => Err(IoError::Closed),
            }
        }

        fn write_all(&mut self, bytes: &[u8]) -> Result<(), IoError> {
            let text = core::str::from_utf8(bytes).map_err(|_| IoError::Write)?;
            self.output.push_str(text).map_err(|_| IoError::Write)
        }

        fn flush(&mut self) -> Result<(), IoError> {
            Ok(())
        }

        fn delay_ms(&mut self, ms: u32) {
            self.slept_ms += ms;
        }
    }

    struct Words(&'static [&'static str]);

    impl Completer for Words {
        fn complete<'a>(&'a self, partial: &str, candidates: &mut Candidates<'a>) {
            for word in self.0.iter().filter(|word| word.starts_with(partial)) {
                let _ = candidates.push(*word);
            }
        }
    }

    impl Hinter for Words {
        fn hint(&self, partial: &str, out: &mut dyn fmt::Write) -> bool {
            partial == "help" && out.write_str(" [<command>]").is_ok()
        }
    }

    fn read(editor: &mut BasicEditor, input: &[u8], assist: &Assist<'_>) -> (ReadOutcome, Line, Script) {
        let mut io = Script::new(input);
        let mut line = Line::new();
        let cancel = AtomicBool::new(false);
        let outcome = editor
            .read_line(&mut io, "> ", assist, &cancel, &mut line)
            .unwrap();
        (outcome, line, io)
    }

    #[test]
    fn typed_line_is_returned_on_enter() {
        let (outcome, line, _) = read(&mut BasicEditor::new(), b"echo hi\n", &Assist::none());
        assert_eq!(outcome, ReadOutcome::Line);
        assert_eq!(line.as_str(), "echo hi");
    }

    #[test]
    fn editing_keys_move_and_delete() {
        // "helo", Left, insert 'l', End, Backspace, '!'
        let (_, line, _) = read(&mut BasicEditor::new(), b"helo\x1b[Dl\x05\x08!\n", &Assist::none());
        assert_eq!(line.as_str(), "hell!");
    }

    #[test]
    fn home_and_delete_escape_sequences() {
        let (_, line, _) = read(&mut BasicEditor::new(), b"xabc\x1b[1~\x1b[3~\n", &Assist::none());
        assert_eq!(line.as_str(), "abc");
    }

    #[test]
    fn ctrl_c_abandons_the_line() {
        let (outcome, line, _) = read(&mut BasicEditor::new(), b"reboot\x03", &Assist::none());
        assert_eq!(outcome, ReadOutcome::Empty);
        assert!(line.is_empty());
    }

    #[test]
    fn ctrl_u_and_ctrl_w_clear_text() {
        let (_, line, _) = read(&mut BasicEditor::new(), b"junk\x15ls /tmp\x17\n", &Assist::none());
        assert_eq!(line.as_str(), "ls ");
    }

    #[test]
    fn line_length_is_capped() {
        let mut editor = BasicEditor::new();
        editor.set_max_line_len(4);
        let (_, line, _) = read(&mut editor, b"abcdef\n", &Assist::none());
        assert_eq!(line.as_str(), "abcd");
    }

    #[test]
    fn arrows_walk_the_history() {
        let mut history = History::new();
        history.push("first");
        history.push("second");
        let assist = Assist {
            history: Some(&history),
            ..Assist::none()
        };

        let (_, line, _) = read(&mut BasicEditor::new(), b"\x1b[A\x1b[A\n", &assist);
        assert_eq!(line.as_str(), "first");

        let (_, line, _) = read(&mut BasicEditor::new(), b"draft\x1b[A\x1b[B\n", &assist);
        assert_eq!(line.as_str(), "draft");
    }

    #[test]
    fn tab_cycles_through_completions() {
        let words = Words(&["help", "history"]);
        let assist = Assist {
            completer: Some(&words),
            ..Assist::none()
        };

        let (_, line, _) = read(&mut BasicEditor::new(), b"h\t\n", &assist);
        assert_eq!(line.as_str(), "help");

        let (_, line, _) = read(&mut BasicEditor::new(), b"h\t\t\n", &assist);
        assert_eq!(line.as_str(), "history");

        let (_, line, _) = read(&mut BasicEditor::new(), b"h\t\t\t\n", &assist);
        assert_eq!(line.as_str(), "h");
    }

    #[test]
    fn tab_without_candidates_rings_the_bell() {
        let words = Words(&["help"]);
        let assist = Assist {
            completer: Some(&words),
            ..Assist::none()
        };
        let (_, line, io) = read(&mut BasicEditor::new(), b"x\t\n", &assist);
        assert_eq!(line.as_str(), "x");
        assert!(io.output.contains(BELL));
    }

    #[test]
    fn hint_is_drawn_in_color() {
        let words = Words(&["help"]);
        let assist = Assist {
            hinter: Some(&words),
            hint_color: 35,
            hint_bold: true,
            ..Assist::none()
        };
        let (_, _, io) = read(&mut BasicEditor::new(), b"help\n", &assist);
        assert!(io.output.contains("\x1b[1;35;49m [<command>]\x1b[0m"));
    }

    #[test]
    fn dumb_mode_echoes_without_escapes() {
        let mut editor = BasicEditor::new();
        editor.set_dumb_mode(true);
        let (outcome, line, io) = read(&mut editor, b"lx\x08s\n", &Assist::none());
        assert_eq!(outcome, ReadOutcome::Line);
        assert_eq!(line.as_str(), "ls");
        assert_eq!(io.output.as_str(), "> lx\x08 \x08s\n");
        assert!(!io.output.contains('\x1b'));
    }

    #[test]
    fn raised_flag_cancels_the_read() {
        let mut io = Script::new(b"par");
        io.cancel_when_drained = true;
        let mut line = Line::new();
        let cancel = AtomicBool::new(true);
        let outcome = BasicEditor::new()
            .read_line(&mut io, "> ", &Assist::none(), &cancel, &mut line)
            .unwrap();
        assert_eq!(outcome, ReadOutcome::Cancelled);
    }

    #[test]
    fn probe_detects_status_report() {
        let mut io = Script::new(b"\x1b[0n");
        assert_eq!(BasicEditor::new().probe(&mut io), Ok(true));
        assert_eq!(io.output.as_str(), STATUS_REQUEST);

        let mut io = Script::new(b"");
        io.cancel_when_drained = true;
        assert_eq!(BasicEditor::new().probe(&mut io), Ok(false));
    }

    #[test]
    fn probe_waits_by_time_not_by_polls() {
        let mut io = Script::new(b"");
        io.cancel_when_drained = true;
        assert_eq!(BasicEditor::new().probe(&mut io), Ok(false));
        assert_eq!(io.slept_ms, PROBE_TIMEOUT_MS);

        // Bytes that arrive without a pause cost no time
        let mut io = Script::new(b"xyz\x1b[0n");
        assert_eq!(BasicEditor::new().probe(&mut io), Ok(true));
        assert_eq!(io.slept_ms, 0);
    }

    #[test]
    fn multiline_wraps_long_lines_over_rows() {
        // "> " plus 45 characters spans three rows of 20 columns
        let input = b"echo 0123456789 abcdefghij 0123456789 abcdefg\n";

        let mut single = BasicEditor::new().with_columns(20);
        let (_, single_line, single_io) = read(&mut single, input, &Assist::none());
        assert!(!single_io.output.contains("\x1b[1A"));

        let mut editor = BasicEditor::new().with_columns(20);
        editor.set_multiline(true);
        let (outcome, line, io) = read(&mut editor, input, &Assist::none());

        assert_eq!(outcome, ReadOutcome::Line);
        assert_eq!(line, single_line);
        assert_eq!(editor.rows, 3);
        assert!(io.output.contains(CLEAR_ROW_UP));
        assert_ne!(io.output, single_io.output);
    }

    #[test]
    fn multiline_places_cursor_by_row_and_column() {
        let mut editor = BasicEditor::new().with_columns(20);
        editor.set_multiline(true);
        // 30 characters, then Home and Enter
        let (_, line, io) = read(&mut editor, b"012345678901234567890123456789\x01\n", &Assist::none());

        assert_eq!(line.len(), 30);
        // Home: up from the second row to the first, right past the prompt
        assert!(io.output.contains("\x1b[1A\r\x1b[2C"));
        // Enter: down to the last row before clearing
        assert!(io.output.contains("\x1b[1B\r\x1b[0K\x1b[1A"));
        assert_eq!(editor.cursor_row, 2);
    }

    #[test]
    fn narrow_widths_are_raised() {
        assert_eq!(BasicEditor::new().with_columns(4).columns(), MIN_COLUMNS);
        assert_eq!(BasicEditor::new().columns(), DEFAULT_COLUMNS);
    }
}
