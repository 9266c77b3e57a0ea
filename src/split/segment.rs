// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Text segmentation on `#` delimiter runs

use regex::Regex;
use std::sync::OnceLock;

use super::naming::Heading;
use super::{SplitMode, SplitOptions};

/// A single example cut out of the monolithic source
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    /// 1-based position in the source
    pub index: usize,
    /// First `# N. Title` comment, if any
    pub heading: Option<Heading>,
    /// Text written to the example file
    pub body: String,
}

impl Example {
    fn new(index: usize, body: String) -> Self {
        let heading = Heading::find(&body);
        Self {
            index,
            heading,
            body,
        }
    }
}

/// Split source text into examples
pub fn split_text(content: &str, options: &SplitOptions) -> Vec<Example> {
    let segments = match options.mode {
        SplitMode::Trimmed => trimmed_segments(content, options.min_hashes, options.skip_preamble),
        SplitMode::Delimited => delimited_segments(content, options.min_hashes),
    };

    segments
        .into_iter()
        .enumerate()
        .map(|(i, body)| Example::new(i + 1, body))
        .collect()
}

/// A `#` run ending a line; runs shorter than `min_hashes` are ordinary text
fn delimiter_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#+\r?\n").expect("delimiter pattern is valid"))
}

/// Cut on every run of `min_hashes` or more `#` directly followed by a line
/// break, trimming each piece and dropping empty ones
fn trimmed_segments(content: &str, min_hashes: usize, skip_preamble: bool) -> Vec<String> {
    let min_hashes = min_hashes.max(1);
    let mut pieces = Vec::new();
    let mut start = 0;

    for m in delimiter_run().find_iter(content) {
        let run_len = m.as_str().trim_end_matches(|c| c == '\r' || c == '\n').len();
        if run_len >= min_hashes {
            pieces.push(&content[start..m.start()]);
            start = m.end();
        }
    }
    pieces.push(&content[start..]);

    if skip_preamble && !pieces.is_empty() {
        pieces.remove(0);
    }

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whole-line delimiters, kept at the head of each example; text before the
/// first delimiter is dropped
fn delimited_segments(content: &str, min_hashes: usize) -> Vec<String> {
    let mut examples = Vec::new();
    let mut current: Option<String> = None;

    for line in content.split_inclusive('\n') {
        if is_delimiter_line(line, min_hashes) {
            if let Some(done) = current.take() {
                examples.push(done);
            }
            current = Some(line.to_string());
        } else if let Some(ref mut body) = current {
            body.push_str(line);
        }
    }

    if let Some(done) = current {
        examples.push(done);
    }

    examples
}

/// A line made only of `#` characters, at least `min_hashes` of them
pub fn is_delimiter_line(line: &str, min_hashes: usize) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= min_hashes.max(1) && trimmed.bytes().all(|b| b == b'#')
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\"\"\"\nheader docstring\n\"\"\"\n\nfrom build123d import *\n\n\
##########################################\n\
# 1. Simple Rectangular Plate\n\nwith BuildPart() as ex1:\n    Box(80, 60, 10)\n\npart = ex1.part\n\n\
##########################################\n\
# 2. Plane with Hole\n\npart = ex2.part\n";

    fn options(mode: SplitMode) -> SplitOptions {
        SplitOptions {
            mode,
            ..SplitOptions::default()
        }
    }

    #[test]
    fn test_trimmed_keeps_preamble_by_default() {
        let examples = split_text(SOURCE, &options(SplitMode::Trimmed));
        assert_eq!(examples.len(), 3);
        assert!(examples[0].body.starts_with("\"\"\""));
        assert!(examples[0].body.ends_with("from build123d import *"));
        assert!(examples[1].body.starts_with("# 1. Simple Rectangular Plate"));
        assert!(examples[1].body.ends_with("part = ex1.part"));
        assert_eq!(examples[2].body, "# 2. Plane with Hole\n\npart = ex2.part");
        assert_eq!(
            examples.iter().map(|e| e.index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_trimmed_skip_preamble() {
        let opts = SplitOptions {
            skip_preamble: true,
            ..SplitOptions::default()
        };
        let examples = split_text(SOURCE, &opts);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].index, 1);
        assert_eq!(examples[0].heading.as_ref().unwrap().number, Some(1));
    }

    #[test]
    fn test_trimmed_drops_empty_segments() {
        let text = "###\n\n#####\n   \n###\nbody\n###\n";
        let examples = split_text(text, &options(SplitMode::Trimmed));
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].body, "body");
    }

    #[test]
    fn test_trimmed_run_must_end_line() {
        // two hashes, or hashes followed by text, never split
        let text = "a ## \n## b\n#### c\nx = 1  ###\ny\n";
        let examples = split_text(text, &options(SplitMode::Trimmed));
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].body, "a ## \n## b\n#### c\nx = 1");
        assert_eq!(examples[1].body, "y");
    }

    #[test]
    fn test_trimmed_accepts_crlf() {
        let text = "one\r\n###\r\ntwo\r\n";
        let examples = split_text(text, &options(SplitMode::Trimmed));
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[1].body, "two");
    }

    #[test]
    fn test_trimmed_short_runs_are_text() {
        let text = "a\n##\nb\n####\nc\n";
        let examples = split_text(text, &options(SplitMode::Trimmed));
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].body, "a\n##\nb");
        assert_eq!(examples[1].body, "c");

        let strict = SplitOptions {
            min_hashes: 5,
            ..SplitOptions::default()
        };
        assert_eq!(split_text(text, &strict).len(), 1);
    }

    #[test]
    fn test_no_delimiter_yields_single_example() {
        let examples = split_text("print('hi')\n", &options(SplitMode::Trimmed));
        assert_eq!(examples.len(), 1);
        assert!(split_text("  \n", &options(SplitMode::Trimmed)).is_empty());
    }

    #[test]
    fn test_delimited_ignores_preamble_and_keeps_separator() {
        let examples = split_text(SOURCE, &options(SplitMode::Delimited));
        assert_eq!(examples.len(), 2);
        assert!(examples[0]
            .body
            .starts_with("##########################################\n# 1."));
        assert!(examples[0].body.ends_with("part = ex1.part\n\n"));

        let rebuilt: String = examples.iter().map(|e| e.body.as_str()).collect();
        let from_first = &SOURCE[SOURCE.find("####").unwrap()..];
        assert_eq!(rebuilt, from_first);
    }

    #[test]
    fn test_delimited_consecutive_separators() {
        let text = "###\n###\nbody\n";
        let examples = split_text(text, &options(SplitMode::Delimited));
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].body, "###\n");
        assert_eq!(examples[1].body, "###\nbody\n");
    }

    #[test]
    fn test_delimiter_line_detection() {
        assert!(is_delimiter_line("###\n", 3));
        assert!(is_delimiter_line("   ##########  \n", 3));
        assert!(!is_delimiter_line("##\n", 3));
        assert!(!is_delimiter_line("### 1. Title\n", 3));
        assert!(!is_delimiter_line("\n", 3));
    }
}
