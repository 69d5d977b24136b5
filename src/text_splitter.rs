use regex_lite::Regex;

/// Abbreviations that never terminate a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr.", "mrs.", "ms.", "dr.", "prof.", "sr.", "jr.", "e.g.", "i.e.", "etc.", "vs.", "fig.",
    "st.", "ave.", "no.", "inc.", "ltd.", "co.",
];

/// Regex-based splitter used to turn memory paragraphs into per-sentence
/// items.
pub struct SentenceSplitter {
    boundary: Regex,
}

impl SentenceSplitter {
    pub fn new() -> Self {
        // Sentence-ending punctuation followed by whitespace. Whether the
        // boundary is real is decided by the abbreviation check below.
        let boundary = Regex::new(r"[.!?]+\s+").expect("sentence boundary pattern is valid");
        Self { boundary }
    }

    /// Split text into sentences at `.`/`?`/`!` boundaries, keeping known
    /// abbreviations intact.
    pub fn split_sentences(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut sentences = Vec::new();
        let mut start = 0;
        for boundary in self.boundary.find_iter(text) {
            let punctuation_end = boundary.start() + boundary.as_str().trim_end().len();
            let candidate = &text[start..punctuation_end];
            if ends_in_abbreviation(candidate) {
                continue;
            }
            let candidate = candidate.trim();
            if !candidate.is_empty() {
                sentences.push(candidate.to_string());
            }
            start = boundary.end();
        }

        let tail = text[start..].trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }
        sentences
    }

    /// Split text into paragraphs on blank lines.
    pub fn split_paragraphs(&self, text: &str) -> Vec<String> {
        text.split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Split into paragraphs first, then sentences within each.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_paragraphs(text)
            .iter()
            .flat_map(|paragraph| self.split_sentences(paragraph))
            .collect()
    }
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self::new()
    }
}

fn ends_in_abbreviation(candidate: &str) -> bool {
    let last_token = candidate
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    ABBREVIATIONS.iter().any(|abbr| last_token == *abbr)
}
