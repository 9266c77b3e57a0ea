// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Output file naming for split examples

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

use super::segment::Example;

/// How example files are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NamingScheme {
    /// `example-NN.ext`
    #[default]
    Numbered,
    /// `NN-Title-Words.ext` from the `# N. Title` comment
    Heading,
}

impl NamingScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingScheme::Numbered => "numbered",
            NamingScheme::Heading => "heading",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "numbered" | "number" => Some(NamingScheme::Numbered),
            "heading" | "title" => Some(NamingScheme::Heading),
            _ => None,
        }
    }
}

/// Numbered title comment such as `# 23. Revolve`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub number: Option<u32>,
    pub title: String,
}

fn heading_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*#+\s*(\d+)\.\s*(.*?)\s*$").expect("heading pattern is valid")
    })
}

impl Heading {
    /// First comment line in `body` that parses as a heading
    pub fn find(body: &str) -> Option<Self> {
        body.lines().find_map(Self::parse)
    }

    /// Parse `# 13. CounterBoreHoles, CounterSinkHoles and PolarLocations`
    pub fn parse(line: &str) -> Option<Self> {
        let caps = heading_pattern().captures(line)?;
        let title = caps.get(2)?.as_str();
        if title.is_empty() {
            return None;
        }

        Some(Self {
            number: caps.get(1).and_then(|m| m.as_str().parse().ok()),
            title: title.to_string(),
        })
    }

    /// Title with spaces turned into dashes and unsafe characters removed
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.title.len());
        for c in self.title.chars() {
            match c {
                ' ' | '\t' => {
                    if !slug.ends_with('-') {
                        slug.push('-');
                    }
                }
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => {}
                c if c.is_control() => {}
                c => slug.push(c),
            }
        }
        slug.trim_matches(|c| c == '-' || c == '.').to_string()
    }
}

/// Default numbered file stem
pub fn numbered_stem(index: usize) -> String {
    format!("example-{:02}", index)
}

impl Example {
    /// File name under `scheme`. A name already in `used` gets the index
    /// appended, then a counter until it is unique.
    pub fn file_name(
        &self,
        scheme: NamingScheme,
        extension: &str,
        used: &mut HashSet<String>,
    ) -> String {
        let heading_stem = match (scheme, &self.heading) {
            (NamingScheme::Heading, Some(heading)) => {
                let slug = heading.slug();
                let number = heading.number.map(|n| n as usize).unwrap_or(self.index);
                (!slug.is_empty()).then(|| format!("{:02}-{}", number, slug))
            }
            _ => None,
        };
        let stem = heading_stem.unwrap_or_else(|| numbered_stem(self.index));

        let mut name = format!("{}.{}", stem, extension);
        if used.contains(&name) {
            name = format!("{}-{}.{}", stem, self.index, extension);
        }
        let mut counter = 2;
        while used.contains(&name) {
            name = format!("{}-{}-{}.{}", stem, self.index, counter, extension);
            counter += 1;
        }

        used.insert(name.clone());
        name
    }
}
