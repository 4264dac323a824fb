//! Reader for the Princeton WordNet database files.
//!
//! Only what synonym lookup needs is loaded: the `index.*` files (lemma to
//! synset offsets), the raw `data.*` files (addressed by byte offset) and the
//! `*.exc` morphological exception lists.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use super::lexicon::SynonymLookup;
use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
}

impl PartOfSpeech {
    /// Order in which senses are gathered for a word.
    pub const SEARCH_ORDER: [PartOfSpeech; 4] = [
        PartOfSpeech::Noun,
        PartOfSpeech::Verb,
        PartOfSpeech::Adjective,
        PartOfSpeech::Adverb,
    ];

    #[must_use]
    pub const fn file_suffix(self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Adjective => "adj",
            PartOfSpeech::Adverb => "adv",
        }
    }

    /// Inflectional suffix rewrites tried when a form is not in the index.
    const fn substitutions(self) -> &'static [(&'static str, &'static str)] {
        match self {
            PartOfSpeech::Noun => &[
                ("s", ""),
                ("ses", "s"),
                ("ves", "f"),
                ("xes", "x"),
                ("zes", "z"),
                ("ches", "ch"),
                ("shes", "sh"),
                ("men", "man"),
                ("ies", "y"),
            ],
            PartOfSpeech::Verb => &[
                ("s", ""),
                ("ies", "y"),
                ("es", "e"),
                ("es", ""),
                ("ed", "e"),
                ("ed", ""),
                ("ing", "e"),
                ("ing", ""),
            ],
            PartOfSpeech::Adjective => &[("er", ""), ("est", ""), ("er", "e"), ("est", "e")],
            PartOfSpeech::Adverb => &[],
        }
    }
}

#[derive(Debug, Default)]
pub struct WordNet {
    index: HashMap<PartOfSpeech, HashMap<String, Vec<usize>>>,
    data: HashMap<PartOfSpeech, Vec<u8>>,
    exceptions: HashMap<PartOfSpeech, HashMap<String, Vec<String>>>,
}

impl WordNet {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads `index.*`, `data.*` and (when present) `*.exc` for every part of
    /// speech from a WordNet `dict/` directory.
    ///
    /// # Errors
    ///
    /// Returns `LexiconError` if an index or data file is missing, unreadable
    /// or malformed.
    pub fn load(dir: &Path) -> Result<Self, ServiceError> {
        let mut wordnet = Self::empty();

        for pos in PartOfSpeech::SEARCH_ORDER {
            let suffix = pos.file_suffix();
            let index_path = dir.join(format!("index.{suffix}"));
            let data_path = dir.join(format!("data.{suffix}"));
            let exc_path = dir.join(format!("{suffix}.exc"));

            let index_src = fs::read_to_string(&index_path).map_err(|e| {
                ServiceError::LexiconError(format!("{}: {e}", index_path.display()))
            })?;
            let data = fs::read(&data_path).map_err(|e| {
                ServiceError::LexiconError(format!("{}: {e}", data_path.display()))
            })?;
            let exc_src = fs::read_to_string(&exc_path).ok();
            if exc_src.is_none() {
                debug!(path = %exc_path.display(), "No exception list found");
            }

            wordnet.add_part_of_speech(pos, &index_src, data, exc_src.as_deref())?;
        }

        info!(
            dir = %dir.display(),
            lemmas = wordnet.lemma_count(),
            "WordNet database loaded"
        );

        Ok(wordnet)
    }

    /// Registers the database files of one part of speech.
    ///
    /// # Errors
    ///
    /// Returns `LexiconError` if an index line cannot be parsed.
    pub fn add_part_of_speech(
        &mut self,
        pos: PartOfSpeech,
        index_src: &str,
        data: Vec<u8>,
        exceptions_src: Option<&str>,
    ) -> Result<(), ServiceError> {
        let mut index = HashMap::new();
        for (line_no, line) in index_src.lines().enumerate() {
            // License header lines start with a space.
            if line.is_empty() || line.starts_with(' ') {
                continue;
            }
            let (lemma, offsets) = parse_index_line(line).ok_or_else(|| {
                ServiceError::LexiconError(format!(
                    "index.{}: malformed line {}",
                    pos.file_suffix(),
                    line_no + 1
                ))
            })?;
            index.insert(lemma, offsets);
        }

        let exceptions = exceptions_src
            .map(parse_exceptions)
            .unwrap_or_default();

        self.index.insert(pos, index);
        self.data.insert(pos, data);
        self.exceptions.insert(pos, exceptions);
        Ok(())
    }

    #[must_use]
    pub fn lemma_count(&self) -> usize {
        self.index.values().map(HashMap::len).sum()
    }

    /// Returns the base forms of `form` that exist in the index for `pos`.
    ///
    /// Exception lists win over rules; rules are applied repeatedly until a
    /// known form appears or no rule matches.
    #[must_use]
    pub fn morphy(&self, form: &str, pos: PartOfSpeech) -> Vec<String> {
        let Some(index) = self.index.get(&pos) else {
            return Vec::new();
        };

        let known = |forms: Vec<String>| -> Vec<String> {
            let mut seen = HashSet::new();
            forms
                .into_iter()
                .filter(|f| index.contains_key(f) && seen.insert(f.clone()))
                .collect()
        };

        if let Some(bases) = self.exceptions.get(&pos).and_then(|e| e.get(form)) {
            let mut forms = vec![form.to_string()];
            forms.extend(bases.iter().cloned());
            return known(forms);
        }

        let mut forms = apply_rules(&[form.to_string()], pos);
        let mut first_pass = vec![form.to_string()];
        first_pass.extend(forms.iter().cloned());
        let results = known(first_pass);
        if !results.is_empty() {
            return results;
        }

        while !forms.is_empty() {
            forms = apply_rules(&forms, pos);
            let results = known(forms.clone());
            if !results.is_empty() {
                return results;
            }
        }

        Vec::new()
    }

    /// Returns `(part of speech, data offset)` for every sense of `word`, in
    /// search order.
    #[must_use]
    pub fn senses(&self, word: &str) -> Vec<(PartOfSpeech, usize)> {
        let lemma = word.to_lowercase();
        let mut senses = Vec::new();

        for pos in PartOfSpeech::SEARCH_ORDER {
            let Some(index) = self.index.get(&pos) else {
                continue;
            };
            for form in self.morphy(&lemma, pos) {
                if let Some(offsets) = index.get(&form) {
                    senses.extend(offsets.iter().map(|&offset| (pos, offset)));
                }
            }
        }

        senses
    }

    /// Reads the first lemma name of the synset stored at `offset`.
    #[must_use]
    pub fn first_lemma(&self, pos: PartOfSpeech, offset: usize) -> Option<String> {
        let data = self.data.get(&pos)?;
        let tail = data.get(offset..)?;
        let end = tail.iter().position(|&b| b == b'\n').unwrap_or(tail.len());
        let line = std::str::from_utf8(&tail[..end]).ok()?;

        let mut fields = line.split_whitespace();
        let line_offset: usize = fields.next()?.parse().ok()?;
        if line_offset != offset {
            debug!(
                pos = pos.file_suffix(),
                offset, line_offset, "Synset offset mismatch"
            );
            return None;
        }

        // lex_filenum, ss_type, w_cnt, then the first word.
        let word = fields.nth(3)?;
        Some(strip_syntactic_marker(word).to_string())
    }
}

impl SynonymLookup for WordNet {
    fn synonyms(&self, word: &str) -> Vec<String> {
        self.senses(word)
            .into_iter()
            .filter_map(|(pos, offset)| self.first_lemma(pos, offset))
            .collect()
    }

    fn is_loaded(&self) -> bool {
        self.lemma_count() > 0
    }
}

fn apply_rules(forms: &[String], pos: PartOfSpeech) -> Vec<String> {
    let mut out = Vec::new();
    for form in forms {
        for (old, new) in pos.substitutions() {
            if let Some(stem) = form.strip_suffix(old) {
                out.push(format!("{stem}{new}"));
            }
        }
    }
    out
}

/// Parses `lemma pos synset_cnt p_cnt [ptr...] sense_cnt tagsense_cnt offset...`.
fn parse_index_line(line: &str) -> Option<(String, Vec<usize>)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let lemma = (*fields.first()?).to_string();
    let synset_cnt: usize = fields.get(2)?.parse().ok()?;
    let p_cnt: usize = fields.get(3)?.parse().ok()?;
    let start = 6 + p_cnt;
    if synset_cnt == 0 || fields.len() != start + synset_cnt {
        return None;
    }

    let offsets = fields[start..]
        .iter()
        .map(|f| f.parse::<usize>().ok())
        .collect::<Option<Vec<_>>>()?;

    Some((lemma, offsets))
}

fn parse_exceptions(src: &str) -> HashMap<String, Vec<String>> {
    src.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let inflected = fields.next()?.to_string();
            let bases: Vec<String> = fields.map(str::to_string).collect();
            (!bases.is_empty()).then_some((inflected, bases))
        })
        .collect()
}

/// Adjective lemmas may carry a syntactic marker: `galore(ip)`, `elect(p)`.
fn strip_syntactic_marker(word: &str) -> &str {
    match word.find('(') {
        Some(idx) if word.ends_with(')') => &word[..idx],
        _ => word,
    }
}
