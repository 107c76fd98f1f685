use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\b\w\w+\b").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","across","after","afterwards","again","against","all","almost","alone","along","already","also","although","always","am","among","amongst","an","and","another","any","anyhow","anyone","anything","anyway","anywhere","are","around","as","at",
            "be","became","because","become","becomes","been","before","beforehand","behind","being","below","beside","besides","between","beyond","both","but","by",
            "can","cannot","could",
            "did","do","does","doing","done","down","due","during",
            "each","eg","either","else","elsewhere","enough","etc","even","ever","every","everyone","everything","everywhere","except",
            "few","for","former","formerly","from","further",
            "had","has","have","having","he","hence","her","here","hereafter","hereby","herein","hers","herself","him","himself","his","how","however",
            "ie","if","in","indeed","into","is","it","its","itself",
            "just","last","latter","least","less","ltd",
            "many","may","me","meanwhile","might","more","moreover","most","mostly","much","must","my","myself",
            "namely","neither","never","nevertheless","next","no","nobody","none","nor","not","nothing","now","nowhere",
            "of","off","often","on","once","only","onto","or","other","others","otherwise","our","ours","ourselves","out","over","own",
            "per","perhaps","please","rather","re",
            "same","seem","seemed","seeming","seems","several","she","should","since","so","some","somehow","someone","something","sometime","sometimes","somewhere","still","such",
            "than","that","the","their","theirs","them","themselves","then","thence","there","thereafter","thereby","therefore","therein","these","they","this","those","though","through","throughout","thru","thus","to","together","too","toward","towards",
            "under","until","up","upon","us",
            "very","via",
            "was","we","well","were","what","whatever","when","whence","whenever","where","whereafter","whereas","whereby","wherein","whereupon","wherever","whether","which","while","whither","who","whoever","whole","whom","whose","why","will","with","within","without","would",
            "yet","you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Term extraction settings. Stored inside the vocabulary artifact so that
/// inference always tokenizes the way the vocabulary was fitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub lowercase: bool,
    pub stop_words: bool,
    pub stem: bool,
    /// Longest n-gram emitted; 1 means unigrams only.
    pub ngram_max: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { lowercase: true, stop_words: true, stem: false, ngram_max: 1 }
    }
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Split text into words of two or more word characters, drop stop words,
/// optionally stem, then emit every n-gram up to `ngram_max` over the
/// surviving words. N-gram parts are joined with a single space.
pub fn tokenize(text: &str, config: &TokenizerConfig) -> Vec<String> {
    let lowered;
    let text = if config.lowercase {
        lowered = text.to_lowercase();
        lowered.as_str()
    } else {
        text
    };

    let mut words = Vec::new();
    for mat in RE.find_iter(text) {
        let word = mat.as_str();
        if config.stop_words && is_stopword(word) { continue; }
        if config.stem {
            words.push(STEMMER.stem(word).into_owned());
        } else {
            words.push(word.to_string());
        }
    }

    let span = config.ngram_max.max(1);
    if span == 1 {
        return words;
    }
    let mut terms = Vec::with_capacity(words.len() * span);
    for n in 1..=span {
        for window in words.windows(n) {
            terms.push(window.join(" "));
        }
    }
    terms
}
