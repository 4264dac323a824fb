use once_cell::sync::Lazy;
use regex::Regex;

// A sentence ends after a run of terminators followed by whitespace (or end of text).
static SENTENCE_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+\s+").expect("static regex compile"));

// Penn Treebank style splitting rules, applied in order to a space-padded sentence.
static PUNCT_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\.\.\.", " ... "),
        (r"([;@#$%&?!])", " ${1} "),
        (r"([:,])([^\d])", " ${1} ${2}"),
        (r"([:,])$", " ${1} "),
        (r"([\]\[(){}<>])", " ${1} "),
        (r#"""#, r#" " "#),
        (r"--", " -- "),
        (r#"([^.])(\.)([\]\)}>"']*)\s*$"#, "${1} ${2}${3} "),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("static regex compile"), replacement))
    .collect()
});

static CONTRACTION_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)([^' ])('s|'m|'d|') ", r"(?i)([^' ])('ll|'re|'ve|n't) "]
        .into_iter()
        .map(|pattern| Regex::new(pattern).expect("static regex compile"))
        .collect()
});

/// Splits text into sentences on `.`, `!` and `?`.
///
/// Terminators stay attached to their sentence; a terminator not followed by
/// whitespace (as in `3.14` or `e.g.x`) does not end a sentence. Empty
/// fragments are dropped.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_END_RE.find_iter(text) {
        let end = m.start() + m.as_str().trim_end().len();
        push_trimmed(&mut sentences, &text[start..end]);
        start = m.end();
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, fragment: &'a str) {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
        sentences.push(fragment);
    }
}

/// Splits text into word and punctuation tokens.
///
/// The text is first split into sentences so that each sentence-final period
/// becomes its own token. Contractions are split the Treebank way
/// (`don't` → `do`, `n't`).
#[must_use]
pub fn word_tokenize(text: &str) -> Vec<String> {
    split_sentences(text)
        .into_iter()
        .flat_map(tokenize_sentence)
        .collect()
}

fn tokenize_sentence(sentence: &str) -> Vec<String> {
    let mut padded = format!(" {sentence} ");

    for (re, replacement) in PUNCT_RULES.iter() {
        padded = re.replace_all(&padded, *replacement).into_owned();
    }

    // Contraction rules expect a trailing space after every token.
    padded.push(' ');
    for re in CONTRACTION_RULES.iter() {
        padded = re.replace_all(&padded, "${1} ${2} ").into_owned();
    }

    padded.split_whitespace().map(str::to_string).collect()
}
