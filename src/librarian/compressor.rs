//! Semantic compression of Lua source
//!
//! Transforms large Lua files into a skeleton that keeps declarations and
//! the comments around them while hiding function bodies behind a fixed
//! placeholder. The model reads signatures and LDoc headers; it does not
//! need implementations.
//!
//! The scanner is a single line-oriented pass with a block-keyword depth
//! counter. String literals and comment blocks (including long-bracket
//! forms) are opaque to the counter. If the scan loses confidence the
//! original source is returned unmodified; compression never fails a
//! fetch.

/// Files at or below this many bytes are sent uncompressed
pub const COMPRESSION_THRESHOLD: usize = 10_000;

/// Placeholder substituted for every elided function body
pub const HIDDEN_BODY: &str = "    ... -- [Implementation Hidden]";

/// Lua source compressor
#[derive(Debug, Clone, Default)]
pub struct LuaCompressor {
    verbose: bool,
}

/// Scanner state carried across lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Plain code
    Code,
    /// Inside `--[=*[ ... ]=*]` with the given equals-sign level
    LongComment(usize),
    /// Inside `[=*[ ... ]=*]` with the given equals-sign level
    LongString(usize),
}

/// Block events extracted from code regions of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockEvent {
    /// `function` keyword: opens an end-terminated block we may elide
    OpenFunction,
    /// `if` or `do`: opens an end-terminated block we keep
    OpenOther,
    /// `end` keyword
    Close,
}

impl LuaCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Compression is applied only to Lua files above the size threshold
    pub fn should_compress(&self, path: &str, byte_len: usize) -> bool {
        path.ends_with(".lua") && byte_len > COMPRESSION_THRESHOLD
    }

    /// Produce the skeleton form of `source`.
    ///
    /// Falls back to returning the input untouched when block boundaries
    /// cannot be identified with confidence (unbalanced blocks,
    /// unterminated strings or comments).
    pub fn compress(&self, source: &str) -> String {
        match skeletonize(source) {
            Some(skeleton) => skeleton,
            None => {
                if self.verbose {
                    eprintln!("[COMPRESS] Boundary scan failed, returning raw source.");
                }
                source.to_string()
            }
        }
    }
}

/// Core transform. `None` means the scan lost confidence.
fn skeletonize(source: &str) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    let n = lines.len();

    let mut state = ScanState::Code;
    let mut stack: Vec<BlockEvent> = Vec::new();
    // (declaration line, stack depth owned by that function)
    let mut open_function: Option<(usize, usize)> = None;
    // Inclusive (declaration line, closing line) per top-most function
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let mut events = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        events.clear();
        state = scan_line(line, state, &mut events)?;

        for &event in &events {
            match event {
                BlockEvent::OpenFunction => {
                    stack.push(event);
                    if open_function.is_none() {
                        open_function = Some((idx, stack.len()));
                    }
                }
                BlockEvent::OpenOther => stack.push(event),
                BlockEvent::Close => {
                    stack.pop()?;
                    if let Some((decl, depth)) = open_function {
                        if stack.len() < depth {
                            ranges.push((decl, idx));
                            open_function = None;
                        }
                    }
                }
            }
        }
    }

    // Anything left open at EOF means the boundaries are not trustworthy
    if !stack.is_empty() || state != ScanState::Code {
        return None;
    }

    let mut skip = vec![false; n];
    let mut placeholder_after = vec![false; n];
    for &(start, end) in &ranges {
        if end > start + 1 {
            for line_skip in skip.iter_mut().take(end).skip(start + 1) {
                *line_skip = true;
            }
            placeholder_after[start] = true;
        }
    }

    let mut out = String::with_capacity(source.len() / 2);
    for (idx, line) in lines.iter().enumerate() {
        if skip[idx] {
            continue;
        }
        out.push_str(line);
        out.push('\n');
        if placeholder_after[idx] {
            out.push_str(HIDDEN_BODY);
            out.push('\n');
        }
    }
    if !source.ends_with('\n') && out.ends_with('\n') {
        out.pop();
    }

    Some(out)
}

/// Scan one line, appending block events from its code regions.
///
/// Returns the state carried into the next line, or `None` when the line
/// contains an unterminated short string (confidence lost).
fn scan_line(line: &str, start: ScanState, events: &mut Vec<BlockEvent>) -> Option<ScanState> {
    let bytes = line.as_bytes();
    let len = bytes.len();
    let mut state = start;
    let mut i = 0;

    while i < len {
        match state {
            ScanState::LongComment(level) | ScanState::LongString(level) => {
                match find_long_close(bytes, i, level) {
                    Some(after) => {
                        state = ScanState::Code;
                        i = after;
                    }
                    None => return Some(state), // rest of line is opaque
                }
            }
            ScanState::Code => {
                let b = bytes[i];
                if b == b'-' && i + 1 < len && bytes[i + 1] == b'-' {
                    // Comment: long-bracket form spans lines, otherwise
                    // the rest of the line is opaque
                    if let Some(level) = long_open_level(bytes, i + 2) {
                        state = ScanState::LongComment(level);
                        i += 2 + level + 2;
                    } else {
                        return Some(ScanState::Code);
                    }
                } else if b == b'[' {
                    if let Some(level) = long_open_level(bytes, i) {
                        state = ScanState::LongString(level);
                        i += level + 2;
                    } else {
                        i += 1;
                    }
                } else if b == b'"' || b == b'\'' {
                    i = skip_short_string(bytes, i)?;
                } else if is_word_byte(b) {
                    let start_word = i;
                    while i < len && is_word_byte(bytes[i]) {
                        i += 1;
                    }
                    match &line[start_word..i] {
                        "function" => events.push(BlockEvent::OpenFunction),
                        // `for`/`while` headers each carry exactly one
                        // `do`, so counting `do` covers all three forms
                        "if" | "do" => events.push(BlockEvent::OpenOther),
                        "end" => events.push(BlockEvent::Close),
                        _ => {}
                    }
                } else {
                    i += 1;
                }
            }
        }
    }

    Some(state)
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

/// Detect a long-bracket opener `[=*[` at `pos`; returns the level
fn long_open_level(bytes: &[u8], pos: usize) -> Option<usize> {
    if pos >= bytes.len() || bytes[pos] != b'[' {
        return None;
    }
    let mut level = 0;
    let mut i = pos + 1;
    while i < bytes.len() && bytes[i] == b'=' {
        level += 1;
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'[' {
        Some(level)
    } else {
        None
    }
}

/// Find the closing `]=*]` of the given level from `pos`; returns the
/// index just past it
fn find_long_close(bytes: &[u8], pos: usize, level: usize) -> Option<usize> {
    let mut i = pos;
    while i < bytes.len() {
        if bytes[i] == b']' {
            let mut j = i + 1;
            let mut eq = 0;
            while j < bytes.len() && bytes[j] == b'=' {
                eq += 1;
                j += 1;
            }
            if eq == level && j < bytes.len() && bytes[j] == b']' {
                return Some(j + 1);
            }
        }
        i += 1;
    }
    None
}

/// Skip a quoted string starting at `pos`; returns the index just past
/// the closing quote, or `None` when the line ends inside the string
fn skip_short_string(bytes: &[u8], pos: usize) -> Option<usize> {
    let quote = bytes[pos];
    let mut i = pos + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}
