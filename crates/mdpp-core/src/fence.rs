//! Code fence tracking.
//!
//! Directive comments inside fenced code blocks are literal text, not
//! directives. Fences use three or more backticks or tildes; the closing
//! fence must use the same character and be at least as long.

/// Line-by-line fence state tracker.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    fence_char: Option<char>,
    fence_len: usize,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed one line; returns `true` if the line belongs to a fenced block
    /// (including the delimiter lines themselves).
    pub(crate) fn feed(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();

        if let Some(open_char) = self.fence_char {
            if closes_fence(trimmed, open_char, self.fence_len) {
                self.fence_char = None;
                self.fence_len = 0;
            }
            // Content and both delimiters are fenced.
            true
        } else if let Some((ch, len)) = opens_fence(trimmed) {
            self.fence_char = Some(ch);
            self.fence_len = len;
            true
        } else {
            false
        }
    }
}

fn opens_fence(trimmed: &str) -> Option<(char, usize)> {
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let count = trimmed.chars().take_while(|&c| c == first).count();
    (count >= 3).then_some((first, count))
}

fn closes_fence(trimmed: &str, open_char: char, min_len: usize) -> bool {
    let count = trimmed.chars().take_while(|&c| c == open_char).count();
    count >= min_len && trimmed[count..].chars().all(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtick_fence_spans_lines() {
        let mut tracker = FenceTracker::new();
        assert!(tracker.feed("```rust"));
        assert!(tracker.feed("<!--#not-an-alias-->"));
        assert!(tracker.feed("```"));
        assert!(!tracker.feed("<!--#alias-->"));
    }

    #[test]
    fn test_closing_fence_must_match_char_and_length() {
        let mut tracker = FenceTracker::new();
        assert!(tracker.feed("````"));
        assert!(tracker.feed("~~~~")); // wrong char, still fenced
        assert!(tracker.feed("```")); // too short, still fenced
        assert!(tracker.feed("````"));
        assert!(!tracker.feed("text"));
    }

    #[test]
    fn test_short_runs_are_not_fences() {
        let mut tracker = FenceTracker::new();
        assert!(!tracker.feed("``inline``"));
        assert!(!tracker.feed("~ tilde"));
    }
}
