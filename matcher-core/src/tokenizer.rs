//! # Tokenizador "em branco" (sem modelo)
//!
//! Divide o texto bruto em tokens individuais (palavras, pontuações) sem
//! nenhum componente estatístico. Cada token preserva sua posição original no
//! texto (offset em bytes), o que permite reconstruir o texto de um span sem
//! cópias.
//!
//! ## Modos
//!
//! - **Standard**: palavras separadas por espaços e pontuações. Preserva
//!   abreviações comuns do inglês ("Dr.", "Mr.") e números decimais ("3.50").
//! - **UnicodeWords**: fronteiras de palavra do UAX #29 via `unicode-segmentation`.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use matcher_core::tokenizer::{tokenize_with_mode, TokenizerMode};
//!
//! let tokens = tokenize_with_mode("I love movies.", TokenizerMode::Standard);
//! let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, ["I", "love", "movies", "."]);
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Um token extraído do texto original.
///
/// É a unidade atômica sobre a qual os padrões do matcher são avaliados.
/// Imutável depois da tokenização.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// O texto do token (ex: "Movies", ",").
    pub text: String,
    /// Forma minúscula do texto, usada pelo atributo `LOWER`.
    pub lower: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista (0, 1, 2...).
    pub index: usize,
    /// Se o token é seguido de espaço em branco no texto original.
    pub whitespace: bool,
}

impl Token {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        let text = text.into();
        Self {
            lower: text.to_lowercase(),
            text,
            start,
            end,
            index: 0,
            whitespace: false,
        }
    }

    /// Comprimento em caracteres (não em bytes).
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_alpha(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_alphabetic)
    }

    pub fn is_ascii(&self) -> bool {
        self.text.is_ascii()
    }

    pub fn is_digit(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(|c| c.is_ascii_digit())
    }

    pub fn is_lower(&self) -> bool {
        self.has_cased() && !self.text.chars().any(char::is_uppercase)
    }

    pub fn is_upper(&self) -> bool {
        self.has_cased() && !self.text.chars().any(char::is_lowercase)
    }

    /// Primeira letra maiúscula e o restante minúsculo (ex: "Cinema").
    pub fn is_title(&self) -> bool {
        let mut chars = self.text.chars();
        match chars.next() {
            Some(first) if first.is_uppercase() => !chars.any(char::is_uppercase),
            _ => false,
        }
    }

    pub fn is_punct(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(|c| c.is_ascii_punctuation() || is_unicode_punct(c))
    }

    /// Parece um número: "10", "3.50", "1,000", "-7" ou um numeral por extenso.
    pub fn like_num(&self) -> bool {
        let stripped = self.text.trim_start_matches(['+', '-', '~', '±']);
        let digits: String = stripped.chars().filter(|c| *c != ',' && *c != '.').collect();
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return true;
        }
        if let Some((num, den)) = stripped.split_once('/') {
            if !num.is_empty()
                && !den.is_empty()
                && num.chars().all(|c| c.is_ascii_digit())
                && den.chars().all(|c| c.is_ascii_digit())
            {
                return true;
            }
        }
        NUMBER_WORDS.contains(&self.lower.as_str())
    }

    fn has_cased(&self) -> bool {
        self.text.chars().any(|c| c.is_uppercase() || c.is_lowercase())
    }
}

fn is_unicode_punct(c: char) -> bool {
    matches!(c, '“' | '”' | '‘' | '’' | '«' | '»' | '…' | '–' | '—' | '¡' | '¿')
}

/// Estratégias de Tokenização disponíveis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerMode {
    /// **Padrão**: separa por espaços e pontuações, preservando abreviações e decimais.
    #[default]
    Standard,
    /// **Unicode**: segmentação de palavras do UAX #29. Descarta segmentos de espaço.
    UnicodeWords,
}

/// Abreviações comuns em inglês que não devem ter o ponto separado
const ABBREVIATIONS: &[&str] = &[
    "Mr", "Mrs", "Ms", "Dr", "Prof", "St", "Jr", "Sr", "Mt", "Ft", "Gen", "Gov",
    "Sen", "Rep", "Capt", "Col", "Lt", "Sgt", "Inc", "Ltd", "Co", "Corp", "vs",
    "etc", "approx", "dept", "fig", "vol",
];

/// Numerais por extenso reconhecidos por `LIKE_NUM`
const NUMBER_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
    "ten", "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen",
    "seventeen", "eighteen", "nineteen", "twenty", "thirty", "forty", "fifty",
    "sixty", "seventy", "eighty", "ninety", "hundred", "thousand", "million",
    "billion", "trillion",
];

/// Tokeniza um texto usando o algoritmo padrão.
pub fn tokenize(text: &str) -> Vec<Token> {
    tokenize_with_mode(text, TokenizerMode::Standard)
}

/// Tokeniza um texto com o modo especificado.
pub fn tokenize_with_mode(text: &str, mode: TokenizerMode) -> Vec<Token> {
    let mut tokens = match mode {
        TokenizerMode::Standard => tokenize_standard(text),
        TokenizerMode::UnicodeWords => tokenize_unicode_words(text),
    };
    reindex(text, &mut tokens);
    tokens
}

/// Re-indexa os tokens e marca o espaço à direita de cada um.
///
/// Os offsets de `tokens` precisam apontar para fronteiras de caractere de `text`.
pub(crate) fn reindex(text: &str, tokens: &mut [Token]) {
    for (i, token) in tokens.iter_mut().enumerate() {
        token.index = i;
        token.whitespace = text[token.end..]
            .chars()
            .next()
            .is_some_and(char::is_whitespace);
    }
}

/// Tokeniza vários textos em paralelo, preservando a ordem de entrada.
pub fn tokenize_batch<S: AsRef<str> + Sync>(texts: &[S], mode: TokenizerMode) -> Vec<Vec<Token>> {
    texts
        .par_iter()
        .map(|text| tokenize_with_mode(text.as_ref(), mode))
        .collect()
}

fn tokenize_unicode_words(text: &str) -> Vec<Token> {
    text.split_word_bound_indices()
        .filter(|(_, segment)| !segment.trim().is_empty())
        .map(|(start, segment)| Token::new(segment, start, start + segment.len()))
        .collect()
}

fn tokenize_standard(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current_start = 0;
    let mut current_text = String::new();
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    for (i, &(byte_pos, ch)) in chars.iter().enumerate() {
        if ch.is_alphanumeric() || (ch == '-' && !current_text.is_empty()) {
            if current_text.is_empty() {
                current_start = byte_pos;
            }
            current_text.push(ch);
        } else if ch == '.' && !current_text.is_empty() {
            let is_abbrev = ABBREVIATIONS.contains(&current_text.as_str());
            let current_is_num = current_text.chars().all(|c| c.is_numeric());
            let next_is_num = chars
                .get(i + 1)
                .is_some_and(|(_, c)| c.is_numeric());

            if is_abbrev || (current_is_num && next_is_num) {
                current_text.push('.');
            } else {
                flush_token(&mut tokens, &mut current_text, current_start, byte_pos);
                tokens.push(Token::new(".", byte_pos, byte_pos + 1));
            }
        } else if (ch == '\'' || ch == '\u{2019}') && !current_text.is_empty() {
            // Contrações ficam no mesmo token: "don't", "director's"
            current_text.push(ch);
        } else if ch.is_whitespace() {
            flush_token(&mut tokens, &mut current_text, current_start, byte_pos);
        } else {
            flush_token(&mut tokens, &mut current_text, current_start, byte_pos);
            tokens.push(Token::new(ch.to_string(), byte_pos, byte_pos + ch.len_utf8()));
        }
    }

    flush_token(&mut tokens, &mut current_text, current_start, text.len());
    tokens
}

/// Fecha o token acumulado e adiciona à lista (se não vazio)
fn flush_token(tokens: &mut Vec<Token>, text: &mut String, start: usize, end: usize) {
    if !text.is_empty() {
        tokens.push(Token::new(text.as_str(), start, end));
        text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_standard_basic() {
        let tokens = tokenize("I love movies and film festivals");
        assert_eq!(texts(&tokens), ["I", "love", "movies", "and", "film", "festivals"]);
        assert_eq!(tokens[2].index, 2);
        assert!(tokens[2].whitespace);
        assert!(!tokens[5].whitespace);
    }

    #[test]
    fn test_offsets_point_into_text() {
        let text = "Cinema, films... and Movies!";
        for token in tokenize(text) {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }

    #[test]
    fn test_abbreviation_and_decimal() {
        let tokens = tokenize("Dr. Smith paid 3.50 dollars.");
        assert_eq!(texts(&tokens), ["Dr.", "Smith", "paid", "3.50", "dollars", "."]);
    }

    #[test]
    fn test_contraction_stays_together() {
        let tokens = tokenize("don't stop");
        assert_eq!(texts(&tokens), ["don't", "stop"]);
    }

    #[test]
    fn test_lowercase_attribute() {
        let tokens = tokenize("MOVIES Cinema");
        assert_eq!(tokens[0].lower, "movies");
        assert_eq!(tokens[1].lower, "cinema");
    }

    #[test]
    fn test_unicode_words_mode() {
        let tokens = tokenize_with_mode("Great film, truly.", TokenizerMode::UnicodeWords);
        assert_eq!(texts(&tokens), ["Great", "film", ",", "truly", "."]);
    }

    #[test]
    fn test_token_flags() {
        let tokens = tokenize("Cinema ABC abc 42 , twelve");
        assert!(tokens[0].is_title() && tokens[0].is_alpha());
        assert!(tokens[1].is_upper() && !tokens[1].is_lower());
        assert!(tokens[2].is_lower());
        assert!(tokens[3].is_digit() && tokens[3].like_num());
        assert!(tokens[4].is_punct());
        assert!(tokens[5].like_num());
    }

    #[test]
    fn test_tokenize_batch_keeps_order() {
        let batch = tokenize_batch(&["a film", "b", "the movie ends"], TokenizerMode::Standard);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].len(), 2);
        assert_eq!(batch[1].len(), 1);
        assert_eq!(batch[2][1].text, "movie");
    }

    #[test]
    fn test_empty_text() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }
}
